//! Presentation layer: the command-line front end.

/// Command handlers.
pub mod cli;

pub use cli::App;
