//! CLI utilities module
//!
//! Shared display formatting and error handling for CLI commands.

pub mod display;
pub mod error;

pub use display::*;
pub use error::*;
