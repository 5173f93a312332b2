//! Configuration for template locations and output formatting.
//!
//! The built-in template directory is an explicit value resolved once at
//! process startup and threaded into the loader; library functions never
//! consult the environment themselves, which keeps resolution hermetic
//! under test.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration for the invex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Template location configuration.
    pub templates: TemplateConfig,

    /// Output formatting configuration.
    pub output: OutputConfig,
}

/// Where templates are found.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Built-in template directory. When unset, callers fall back to the
    /// `INVEX_TEMPLATE_DIR` environment variable and then the user config
    /// directory.
    pub builtin_dir: Option<PathBuf>,
}

/// Output rendering defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Date format used by writers and filename formatting.
    pub date_format: String,

    /// Destination filename pattern for copy/move actions.
    pub filename_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            date_format: "%Y-%m-%d".to_string(),
            filename_format: "{date} {invoice_number} {desc}.pdf".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
