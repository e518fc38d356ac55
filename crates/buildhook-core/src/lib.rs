//! # Buildhook
//!
//! Build-completion notifier.
//!
//! When a build finishes successfully, Buildhook renders a JSON payload from a
//! template bound to the build's context, validates it, and POSTs it to a
//! configured webhook. Non-200 responses and malformed payloads fail the build.
//!
//! ## Architecture
//!
//! - **Resources**: compiled-in template prelude and default payload template
//! - **Renderer**: minijinja evaluation of prelude + template body
//! - **Validator**: JSON envelope and syntax checks
//! - **Delivery**: shared, pooled HTTP client with fixed timeouts
//! - **Notifier**: the pipeline tying the steps together for one build
//!
//! ## Quick Start
//!
//! ```bash
//! # Notify for a finished build
//! buildhook send --url https://hooks.example.com/ci --build build.json --inherit-env
//!
//! # Preview the payload without sending it
//! buildhook render --build build.json
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod resources;

pub use crate::config::Config;
pub use crate::error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::config::{Config, NotificationConfig};
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
    pub use crate::notify::{BuildLog, ConsoleLog, DeliveryClient, Notifier, RunOutcome};
    pub use crate::resources::Resources;
}
