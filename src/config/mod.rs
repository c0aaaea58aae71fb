//! Configuration module for the job janitor.
//!
//! The janitor is configured via an optional TOML file, with support for
//! environment variable interpolation using `${VAR_NAME}` syntax. Command
//! line flags override values from the file.
//!
//! # Example
//!
//! ```toml
//! [cluster]
//! namespace = "reports"
//! label_selector = "app=nightly-report"
//! in_cluster = false
//! kubeconfig = "${HOME}/.kube/config"
//!
//! [retention]
//! max_count = 5
//! dry_run = false
//! ```

mod cluster;
mod observability;
mod report;
mod retention;

use std::path::{Path, PathBuf};

pub use cluster::*;
pub use observability::*;
pub use report::*;
pub use retention::*;
use serde::{Deserialize, Serialize};

/// Root configuration for the job janitor.
///
/// All sections are optional with defaults matching a dry run over every
/// Job in the `default` namespace, keeping the ten most recent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct JanitorConfig {
    /// Cluster connection and Job selection.
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Retention policy and execution mode.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Observability configuration (logging, metrics).
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Run report output.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Values supplied on the command line, applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub namespace: Option<String>,
    pub label_selector: Option<String>,
    pub max_count: Option<usize>,
    pub dry_run: Option<bool>,
    pub in_cluster: Option<bool>,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub fail_on_delete_error: bool,
    pub report_format: Option<ReportFormat>,
}

impl JanitorConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: JanitorConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command line overrides and re-validate.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(namespace) = overrides.namespace {
            self.cluster.namespace = namespace;
        }
        if let Some(label_selector) = overrides.label_selector {
            self.cluster.label_selector = label_selector;
        }
        if let Some(in_cluster) = overrides.in_cluster {
            self.cluster.in_cluster = in_cluster;
        }
        if let Some(kubeconfig) = overrides.kubeconfig {
            self.cluster.kubeconfig = Some(kubeconfig);
        }
        if let Some(context) = overrides.context {
            self.cluster.context = Some(context);
        }
        if let Some(max_count) = overrides.max_count {
            self.retention.max_count = max_count;
        }
        if let Some(dry_run) = overrides.dry_run {
            self.retention.dry_run = dry_run;
        }
        if overrides.fail_on_delete_error {
            self.retention.fail_on_delete_error = true;
        }
        if let Some(format) = overrides.report_format {
            self.report.format = format;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration for consistency and completeness.
    fn validate(&self) -> Result<(), ConfigError> {
        self.cluster.validate().map_err(ConfigError::Validation)?;
        self.observability
            .validate()
            .map_err(ConfigError::Validation)?;
        Ok(())
    }

    /// Generate the JSON schema for the configuration file.
    #[cfg(feature = "json-schema")]
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(JanitorConfig)
    }

    /// Generate the JSON schema as a pretty-printed JSON string.
    #[cfg(feature = "json-schema")]
    pub fn json_schema_string() -> String {
        serde_json::to_string_pretty(&Self::json_schema())
            .expect("schema serialization should not fail")
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Commented configuration written by `job-janitor init`.
pub fn default_config_toml() -> &'static str {
    r#"# Job janitor configuration

[cluster]
namespace = "default"
# Empty selects every Job in the namespace.
label_selector = ""
# Set to false to use a kubeconfig when running outside the cluster.
in_cluster = true
# kubeconfig = "${HOME}/.kube/config"
# context = "my-context"

[retention]
# Most recently started Jobs to always keep.
max_count = 10
# Only report what would be deleted.
dry_run = true
# Jobs without a start time: "oldest" or "exclude".
unstarted_jobs = "oldest"
# Exit with status 2 if any deletion fails.
fail_on_delete_error = false

[observability.logging]
level = "info"
format = "compact"

[report]
format = "text"
"#
}

/// Expand environment variables in the format `${VAR_NAME}`.
/// Variables inside TOML comments (after `#`) are not expanded.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("valid regex");
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let Some(whole) = cap.get(0) else {
                continue;
            };

            // Skip if this variable is inside a comment
            if let Some(pos) = comment_pos
                && whole.start() >= pos
            {
                continue;
            }

            result.push_str(&line[last_end..whole.start()]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            result.push_str(&value);

            last_end = whole.end();
        }

        result.push_str(&line[last_end..]);
        result.push('\n');
    }

    // Remove trailing newline if input didn't have one
    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}
