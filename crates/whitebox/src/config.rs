//! Engine options
//!
//! Options can be configured in `whitebox.toml`:
//!
//! ```toml
//! [whitebox]
//! serialize_mutations = true
//! specificity_tie_break = true
//! statics_via_instance = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors raised while loading options
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Behavior switches of the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiteboxOptions {
    /// Serialize field writes and invocations made through one façade
    pub serialize_mutations: bool,
    /// Order compatible overloads by argument distance; when off every
    /// level with more than one compatible overload is ambiguous
    pub specificity_tie_break: bool,
    /// Let instance targets see static fields of their hierarchy
    pub statics_via_instance: bool,
}

impl Default for WhiteboxOptions {
    fn default() -> Self {
        Self {
            serialize_mutations: true,
            specificity_tie_break: true,
            statics_via_instance: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    whitebox: WhiteboxOptions,
}

impl WhiteboxOptions {
    /// Parse options from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse options from the `[whitebox]` table of a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.whitebox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = WhiteboxOptions::default();
        assert!(options.serialize_mutations);
        assert!(options.specificity_tie_break);
        assert!(options.statics_via_instance);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let options = WhiteboxOptions::from_toml_str("").unwrap();
        assert_eq!(options, WhiteboxOptions::default());
    }

    #[test]
    fn test_partial_table() {
        let options = WhiteboxOptions::from_toml_str(
            r#"
            [whitebox]
            specificity_tie_break = false
            "#,
        )
        .unwrap();
        assert!(!options.specificity_tie_break);
        assert!(options.serialize_mutations);
    }

    #[test]
    fn test_invalid_toml() {
        let err = WhiteboxOptions::from_toml_str("[whitebox\nx = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[whitebox]\nstatics_via_instance = false").unwrap();

        let options = WhiteboxOptions::from_file(file.path()).unwrap();
        assert!(!options.statics_via_instance);
    }

    #[test]
    fn test_missing_file() {
        let err = WhiteboxOptions::from_file(Path::new("/nonexistent/whitebox.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
