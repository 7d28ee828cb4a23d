pub mod command;

// Trait-based abstraction for testability
pub mod executor;

pub use command::{CommandInvocation, EnvOverlay};
pub use executor::{CommandExecutor, RealExecutor};
