//! Process-runner adapters implementing the core `ProcessRunner` port.

pub mod fake;
pub mod local;

pub use fake::FakeProcessRunner;
pub use local::LocalProcessRunner;
