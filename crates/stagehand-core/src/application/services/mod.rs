//! Application services - orchestration of domain logic via ports.

pub mod executor;
pub mod form;
pub mod manifest;
pub mod substitute;
pub mod templates;

pub use executor::{DEFAULT_SCRIPT_TIMEOUT, EngineOptions, StageExecutor};
pub use form::{CollectionOutcome, FormEngine, finalize, groups_for};
pub use manifest::merge_dependencies;
pub use substitute::substitute;
pub use templates::instantiate;
