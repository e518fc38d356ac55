//! Notification pipeline for finished builds
//!
//! Renders a payload template, validates it as JSON, and delivers it to a
//! webhook with a single POST.

mod client;
mod log;
mod pipeline;
mod renderer;
mod validator;

pub use client::{DeliveryClient, DeliveryError, JSON_CONTENT_TYPE};
pub use log::{BuildLog, ConsoleLog};
pub use pipeline::{Notifier, RunOutcome, SkipReason, Stage};
pub use renderer::TemplateRenderer;
pub use validator::{validate, ValidPayload, ValidationError};

/// Frames templates and payloads quoted in diagnostics
pub(crate) const SEPARATOR: &str = "\n---------------\n";
