//! Host-global context exposed to templates

use serde::{Deserialize, Serialize};

use crate::config::HostConfig;

/// Read-only view of the CI host that runs the builds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    /// Display name of the host
    pub name: String,

    /// Public root URL, e.g. `https://ci.example.com/`
    pub root_url: Option<String>,

    /// Version of the notifier serving the host
    pub version: String,
}

impl From<&HostConfig> for HostInfo {
    fn from(config: &HostConfig) -> Self {
        Self {
            name: config.name.clone(),
            root_url: config
                .root_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(String::from),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
