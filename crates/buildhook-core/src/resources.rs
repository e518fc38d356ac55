//! Static template assets
//!
//! The prelude and the default payload template are loaded once at startup.
//! Any failure here is fatal: the notifier cannot run without both.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// File name of the helper prelude
pub const PRELUDE_FILE: &str = "prelude.jinja";

/// File name of the default payload template
pub const DEFAULT_TEMPLATE_FILE: &str = "default-template.json";

const EMBEDDED_PRELUDE: &str = include_str!("../resources/prelude.jinja");
const EMBEDDED_DEFAULT_TEMPLATE: &str = include_str!("../resources/default-template.json");

/// The two assets every notifier needs
#[derive(Debug, Clone)]
pub struct Resources {
    prelude: String,
    default_template: String,
}

impl Resources {
    /// Assets compiled into the binary
    pub fn embedded() -> Result<Self> {
        Ok(Self {
            prelude: not_blank(EMBEDDED_PRELUDE, PRELUDE_FILE)?.to_string(),
            default_template: not_blank(EMBEDDED_DEFAULT_TEMPLATE, DEFAULT_TEMPLATE_FILE)?
                .to_string(),
        })
    }

    /// Assets read from `dir`, using the same file names as the built-in ones
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            prelude: load(&dir.join(PRELUDE_FILE))?,
            default_template: load(&dir.join(DEFAULT_TEMPLATE_FILE))?,
        })
    }

    /// Assets from `dir` when given, otherwise the built-in ones
    pub fn resolve(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::embedded(),
        }
    }

    /// Helper prelude prepended to every template
    pub fn prelude(&self) -> &str {
        &self.prelude
    }

    /// Template used when none is configured
    pub fn default_template(&self) -> &str {
        &self.default_template
    }
}

/// Read a text asset. Blank paths, unreadable files and blank content fail.
pub fn load(path: &Path) -> Result<String> {
    if path.as_os_str().is_empty() || path.to_string_lossy().trim().is_empty() {
        return Err(Error::resource("Resource path must not be blank"));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        Error::resource(format!(
            "Failed to load resource '{}': {e}",
            path.display()
        ))
    })?;

    not_blank(&content, &path.display().to_string())?;
    debug!(path = %path.display(), bytes = content.len(), "Loaded resource");
    Ok(content)
}

fn not_blank<'a>(content: &'a str, name: &str) -> Result<&'a str> {
    if content.trim().is_empty() {
        return Err(Error::resource(format!(
            "Failed to load resource '{name}': content is blank"
        )));
    }
    Ok(content)
}
