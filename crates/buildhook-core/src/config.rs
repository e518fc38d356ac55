//! Configuration management for Buildhook

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

/// Prefix for environment overrides, e.g. `BUILDHOOK__NOTIFIER__URL`
pub const ENV_PREFIX: &str = "BUILDHOOK";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Notifier configuration
    pub notifier: NotifierConfig,

    /// HTTP client configuration
    pub http: HttpConfig,

    /// Host facade exposed to templates
    pub host: HostConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from an optional file, then `BUILDHOOK__*` env vars.
    ///
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

/// Notifier configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Destination URL; blank disables notifications
    pub url: Option<String>,
    /// File holding the template body; the default template is used when unset
    pub template_path: Option<PathBuf>,
    /// Directory with `prelude.jinja` and `default-template.json` overriding the built-in assets
    pub resources_dir: Option<PathBuf>,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Time allowed to establish a connection
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Time allowed between reads of the response
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
    /// Time allowed for the whole request, including acquiring a pooled connection
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Display name of the CI host
    pub name: String,
    /// Public root URL of the CI host
    pub root_url: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name: "buildhook".to_string(),
            root_url: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Per-job notification settings.
///
/// `url` is either `None` or trimmed and non-empty; `template` is always
/// trimmed and non-empty, falling back to the default template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    url: Option<String>,
    template: String,
}

impl NotificationConfig {
    /// Normalize raw settings. `default_template` must not be blank.
    pub fn new(url: Option<&str>, template: Option<&str>, default_template: &str) -> Self {
        let url = url.map(str::trim).filter(|u| !u.is_empty()).map(String::from);
        let template = template
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| default_template.trim())
            .to_string();

        Self { url, template }
    }

    /// Destination URL, if configured
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Template body
    pub fn template(&self) -> &str {
        &self.template
    }
}

/// Result of the advisory destination URL check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlCheck {
    /// Blank, or an http(s) URL with a host
    Ok,
    /// Scheme is not `http` or `https`
    BadScheme,
    /// No host component
    MissingHost,
    /// Not parseable as a URL
    Invalid(String),
}

impl UrlCheck {
    /// Whether the URL passed
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Operator-facing explanation
    pub fn message(&self) -> String {
        match self {
            Self::Ok => "OK".to_string(),
            Self::BadScheme => "URL should start with 'http://' or 'https://'".to_string(),
            Self::MissingHost => "URL should contain a host".to_string(),
            Self::Invalid(reason) => format!("Invalid URL provided: {reason}"),
        }
    }
}

/// Check a destination URL the way an operator form would.
///
/// Only blank URLs are rejected at delivery time; this check is advisory.
pub fn check_notify_url(url: &str) -> UrlCheck {
    let url = url.trim();
    if url.is_empty() {
        return UrlCheck::Ok;
    }

    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => return UrlCheck::Invalid(e.to_string()),
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return UrlCheck::BadScheme;
    }

    match parsed.host_str() {
        Some(host) if !host.trim().is_empty() => UrlCheck::Ok,
        _ => UrlCheck::MissingHost,
    }
}
