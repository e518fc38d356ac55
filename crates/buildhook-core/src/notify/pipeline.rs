//! Notification pipeline
//!
//! One run per finished build: check applicability, render, validate,
//! deliver. Each step short-circuits on failure and nothing is retried.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, error, info};

use super::client::DeliveryClient;
use super::log::BuildLog;
use super::renderer::TemplateRenderer;
use super::validator::{validate, ValidPayload};
use super::SEPARATOR;
use crate::config::NotificationConfig;
use crate::error::{Error, Result};
use crate::models::{BuildContext, BuildInfo, BuildResult, HostInfo};

/// Pipeline stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Deciding whether a notification is owed
    Applicability,
    /// Evaluating the template
    Rendering,
    /// Checking the rendered payload
    Validating,
    /// Sending the payload
    Delivering,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Applicability => "applicability",
            Self::Rendering => "rendering",
            Self::Validating => "validating",
            Self::Delivering => "delivering",
        })
    }
}

/// Why a build did not get a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Matrix or parameterized sub-build, not the final result
    Intermediate,
    /// No destination URL configured
    NoUrl,
    /// Result worse than SUCCESS
    Result(BuildResult),
}

/// Terminal state of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing was owed; not an error
    Skipped(SkipReason),
    /// Payload accepted by the endpoint
    Delivered {
        /// Response status, always 200
        status: u16,
    },
}

enum Gate<'a> {
    Proceed(&'a str),
    Skip(SkipReason),
}

/// Posts a rendered JSON payload for each successful build
#[derive(Debug, Clone)]
pub struct Notifier {
    config: NotificationConfig,
    renderer: TemplateRenderer,
    client: DeliveryClient,
    host: Option<HostInfo>,
}

impl Notifier {
    /// Create a notifier. `client` is normally a clone of a process-wide client.
    pub fn new(
        config: NotificationConfig,
        renderer: TemplateRenderer,
        client: DeliveryClient,
        host: Option<HostInfo>,
    ) -> Self {
        Self {
            config,
            renderer,
            client,
            host,
        }
    }

    /// Host entry point. Always returns `true` on success; failures are
    /// logged to `log` and returned as errors so the host fails the build.
    pub async fn perform(
        &self,
        build: &BuildInfo,
        log: &mut dyn BuildLog,
        env: &BTreeMap<String, String>,
    ) -> Result<bool> {
        self.run(build, log, env).await.map(|_| true)
    }

    /// Run the pipeline once for `build`
    pub async fn run(
        &self,
        build: &BuildInfo,
        log: &mut dyn BuildLog,
        env: &BTreeMap<String, String>,
    ) -> Result<RunOutcome> {
        debug!(stage = %Stage::Applicability, build = %build.url, "Notify pipeline started");

        let url = match self.gate(build) {
            Gate::Proceed(url) => url,
            Gate::Skip(reason) => {
                debug!(build = %build.url, ?reason, "No notification owed");
                return Ok(RunOutcome::Skipped(reason));
            }
        };

        log.info("Building notify JSON payload");
        let payload = self
            .render_payload(build, env)
            .map_err(|e| raise(log, e))?;

        log.info(&format!("Publishing notify JSON payload to {url}"));
        debug!(stage = %Stage::Delivering, url = %url);
        let status = self
            .client
            .post(url, &payload.text)
            .await
            .map_err(|source| {
                raise(
                    log,
                    Error::Delivery {
                        message: format!(
                            "Failed to publish notify request to '{url}', payload JSON was:{SEPARATOR}{}{SEPARATOR}",
                            payload.text
                        ),
                        source,
                    },
                )
            })?;

        info!(build = %build.url, url = %url, "Notification sent");
        Ok(RunOutcome::Delivered {
            status: status.as_u16(),
        })
    }

    /// Render and validate the payload for `build` without sending it
    pub fn render_payload(
        &self,
        build: &BuildInfo,
        env: &BTreeMap<String, String>,
    ) -> Result<ValidPayload> {
        let context = BuildContext::new(self.host.as_ref(), build, env);

        debug!(stage = %Stage::Rendering);
        let text = self.renderer.render(self.config.template(), &context)?;

        debug!(stage = %Stage::Validating);
        validate(&text).map_err(|source| Error::Validation {
            message: format!(
                "Failed to validate JSON payload (check it with a JSON linter):{SEPARATOR}{}{SEPARATOR}",
                text.trim()
            ),
            source,
        })
    }

    fn gate(&self, build: &BuildInfo) -> Gate<'_> {
        if build.is_intermediate() {
            return Gate::Skip(SkipReason::Intermediate);
        }

        let Some(url) = self.config.url() else {
            return Gate::Skip(SkipReason::NoUrl);
        };

        if !build.result.is_better_or_equal_to(BuildResult::Success) {
            return Gate::Skip(SkipReason::Result(build.result));
        }

        Gate::Proceed(url)
    }
}

/// Write `err` and its cause to the build log, then hand it back to be
/// returned. Every pipeline fault leaves through here.
fn raise(log: &mut dyn BuildLog, err: Error) -> Error {
    match err.cause() {
        Some(cause) => log.error(&format!("{err}: {cause}")),
        None => log.error(&err.to_string()),
    }
    error!(error = %err, "Notify pipeline failed");
    err
}
