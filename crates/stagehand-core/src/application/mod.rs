//! Application layer - services and ports.
//!
//! Services orchestrate the domain through the ports; nothing in this
//! layer touches `std::fs` or spawns a process directly.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use services::{
    CollectionOutcome, DEFAULT_SCRIPT_TIMEOUT, EngineOptions, FormEngine, StageExecutor,
};
