//! artframe - artwork image delivery.
//!
//! Decides what to render for an artwork's image, loads it lazily with
//! bounded cache-busting retries, shows a blurred placeholder meanwhile,
//! falls back to deterministic procedural art when there is no image, and
//! aggregates load telemetry across every image on a page.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the pipeline services.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing the command-line front end.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "artframe";
