//! Prompter adapters. The interactive implementation lives in the CLI
//! crate; this module holds the scripted test double.

pub mod scripted;

pub use scripted::ScriptedPrompter;
