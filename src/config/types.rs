use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "report.batchSize")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Numbered list, one error per line.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalizerSettings {
    /// Joins structural path segments, composite lookup keys and nested table keys.
    pub key_separator: String,

    /// Prefix carried by API payloads in front of the JSON body (e.g. `svdata=`).
    /// Stripped before translation and restored afterwards.
    pub api_prefix: Option<String>,

    pub report: ReportSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportSettings {
    pub enabled: bool,

    /// Collector URL. Reporting stays off while this is unset.
    pub endpoint: Option<String>,

    /// Max items per submission.
    pub batch_size: usize,

    pub flush_interval_ms: u64,

    /// Queue bound; misses beyond it are dropped until the worker catches up.
    pub max_pending: usize,
}

impl ReportSettings {
    /// Whether misses should be queued at all.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.enabled && self.endpoint.is_some()
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            batch_size: 50,
            flush_interval_ms: 5000,
            max_pending: 1000,
        }
    }
}

impl Default for LocalizerSettings {
    fn default() -> Self {
        Self {
            key_separator: ".".to_string(),
            api_prefix: Some("svdata=".to_string()),
            report: ReportSettings::default(),
        }
    }
}

impl LocalizerSettings {
    /// # Errors
    /// - Required field is empty
    /// - Invalid endpoint URL
    /// - Inconsistent queue sizing
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.key_separator.is_empty() {
            errors.push(ValidationError::new(
                "keySeparator",
                "The separator cannot be empty. Please specify a separator, for example: \".\" (dot)",
            ));
        }

        if let Some(prefix) = &self.api_prefix
            && prefix.is_empty()
        {
            errors.push(ValidationError::new(
                "apiPrefix",
                "The prefix cannot be empty. Please specify a prefix (e.g., \"svdata=\"), or remove this field",
            ));
        }

        if let Some(endpoint) = &self.report.endpoint {
            match reqwest::Url::parse(endpoint) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                Ok(url) => errors.push(ValidationError::new(
                    "report.endpoint",
                    format!("Unsupported scheme '{}'. Use http or https", url.scheme()),
                )),
                Err(e) => errors.push(ValidationError::new(
                    "report.endpoint",
                    format!("Invalid URL '{endpoint}': {e}"),
                )),
            }
        }

        if self.report.batch_size == 0 {
            errors.push(ValidationError::new("report.batchSize", "Must be at least 1"));
        }

        if self.report.flush_interval_ms == 0 {
            errors.push(ValidationError::new("report.flushIntervalMs", "Must be at least 1"));
        }

        if self.report.max_pending < self.report.batch_size {
            errors.push(ValidationError::new(
                "report.maxPending",
                format!(
                    "Must be greater than or equal to report.batchSize ({})",
                    self.report.batch_size
                ),
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
