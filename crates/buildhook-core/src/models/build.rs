//! Build data models

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::HostInfo;

/// Outcome of a finished build, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    /// Build completed without problems
    Success,
    /// Build completed but tests or checks reported problems
    Unstable,
    /// Build failed
    Failure,
    /// Build was never run
    NotBuilt,
    /// Build was interrupted
    Aborted,
}

impl BuildResult {
    /// Whether this outcome is at least as good as `other`
    pub fn is_better_or_equal_to(self, other: BuildResult) -> bool {
        self <= other
    }

    /// Canonical upper-case name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Unstable => "UNSTABLE",
            Self::Failure => "FAILURE",
            Self::NotBuilt => "NOT_BUILT",
            Self::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of the build that triggered a notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Name of the job the build belongs to
    pub job_name: String,

    /// Sequential build number
    pub number: u64,

    /// Human-readable name, usually `#<number>`
    #[serde(default)]
    pub display_name: String,

    /// Host-relative URL, e.g. `job/api/42/`
    pub url: String,

    /// Final outcome
    pub result: BuildResult,

    /// Wall-clock duration in milliseconds
    #[serde(default)]
    pub duration_ms: u64,

    /// When the build started
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    /// Free-form description set on the build
    #[serde(default)]
    pub description: Option<String>,
}

impl BuildInfo {
    /// Whether this build is an intermediate sub-configuration (matrix cell,
    /// parameterized axis) rather than the final result.
    ///
    /// Such builds carry an unresolved `$` placeholder in their URL.
    pub fn is_intermediate(&self) -> bool {
        self.url.contains('$')
    }
}

/// Everything a template can see: the host, the build, and its environment
#[derive(Debug, Clone, Serialize)]
pub struct BuildContext<'a> {
    /// Host-global facade; absent only when the host failed to provide one
    pub host: Option<&'a HostInfo>,

    /// The triggering build
    pub build: &'a BuildInfo,

    /// Environment variables resolved for the build
    pub env: &'a BTreeMap<String, String>,
}

impl<'a> BuildContext<'a> {
    /// Bind a context for one pipeline run
    pub fn new(
        host: Option<&'a HostInfo>,
        build: &'a BuildInfo,
        env: &'a BTreeMap<String, String>,
    ) -> Self {
        Self { host, build, env }
    }
}
