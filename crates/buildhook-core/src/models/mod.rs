//! Data models for Buildhook

mod build;
mod host;

pub use build::*;
pub use host::*;
