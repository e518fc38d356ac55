//! Template rendering
//!
//! The effective template is the trusted helper prelude followed by the
//! configured body. Only three names are bound: `host`, `build` and `env`,
//! each a plain data facade with no access back into the host.

use std::collections::BTreeMap;

use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use tracing::debug;

use super::SEPARATOR;
use crate::error::{Error, Result};
use crate::models::{BuildContext, BuildInfo, HostInfo};

#[derive(Serialize)]
struct Bindings<'a> {
    host: &'a HostInfo,
    build: &'a BuildInfo,
    env: &'a BTreeMap<String, String>,
}

/// Renders notify templates against a [`BuildContext`]
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    prelude: String,
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// Create a renderer that prepends `prelude` to every template
    pub fn new(prelude: impl Into<String>) -> Self {
        let mut env = Environment::new();
        // Payloads are JSON; helpers do the escaping explicitly.
        env.set_auto_escape_callback(|_| AutoEscape::None);

        Self {
            prelude: prelude.into(),
            env,
        }
    }

    /// Prelude followed by `body`, exactly as handed to the engine
    pub fn effective_template(&self, body: &str) -> String {
        format!("{}\n{}", self.prelude.trim_end(), body)
    }

    /// Render `body` against `context`
    pub fn render(&self, body: &str, context: &BuildContext<'_>) -> Result<String> {
        let host = context
            .host
            .ok_or_else(|| Error::config("Host instance is not available"))?;

        let bindings = Bindings {
            host,
            build: context.build,
            env: context.env,
        };

        let template = self.effective_template(body);
        let rendered = self
            .env
            .render_str(&template, bindings)
            .map_err(|source| Error::Render {
                message: format!(
                    "Failed to render notify template:{SEPARATOR}{template}{SEPARATOR}"
                ),
                source,
            })?;

        debug!(bytes = rendered.len(), "Rendered notify template");
        Ok(rendered)
    }
}
