//! Configuration file support for lexical2pt CLI
//!
//! Loads settings from `_lexical2pt.toml` configuration file.

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "_lexical2pt.toml";

/// Schema URL for the configuration file
pub const SCHEMA_URL: &str = "https://raw.githubusercontent.com/lexical2pt/lexical2pt/main/crates/lexical2pt-cli/schema/lexical2pt.schema.json";

/// Root configuration structure
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Output format configuration
    #[serde(skip_serializing_if = "OutputConfig::is_empty")]
    pub output: OutputConfig,
    /// Block and span key configuration
    #[serde(skip_serializing_if = "KeysConfig::is_empty")]
    pub keys: KeysConfig,
    /// CSS classes per block style ("normal", "h1".."h6", "blockquote").
    /// Only used by the styled HTML mode.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<String, String>,
    /// CSS classes per decorator ("strong", "em", "underline", "strike-through", "code").
    /// Only used by the styled HTML mode.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub marks: BTreeMap<String, String>,
}

/// Output format configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" (Portable Text) or "html" (default: "json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Pretty-print JSON output (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,
    /// HTML rendering mode: "styled" (tags carry classes) or "plain" (default: "styled")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl OutputConfig {
    fn is_empty(&self) -> bool {
        self.format.is_none() && self.pretty.is_none() && self.mode.is_none()
    }
}

/// Key generation configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct KeysConfig {
    /// Generate deterministic keys ("<prefix>0", "<prefix>1", ...) instead of
    /// salted ones (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stable: Option<bool>,
    /// Prefix for deterministic keys (default: "k")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl KeysConfig {
    fn is_empty(&self) -> bool {
        self.stable.is_none() && self.prefix.is_none()
    }
}

impl Config {
    /// Load configuration from a specific file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Try to load configuration from a directory (looks for `_lexical2pt.toml`)
    ///
    /// Returns `Ok(None)` if the config file doesn't exist.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Generate JSON schema for the configuration
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }

    /// Generate JSON schema as a string
    pub fn json_schema_string() -> Result<String> {
        let schema = Self::json_schema();
        serde_json::to_string_pretty(&schema).context("Failed to serialize JSON schema")
    }

    /// Serialize configuration to TOML string with schema directive
    pub fn to_toml_with_schema(&self) -> Result<String> {
        let toml_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        Ok(format!("#:schema {}\n\n{}", SCHEMA_URL, toml_content))
    }

    /// Create a sample configuration with common defaults for `--init`
    pub fn sample() -> Self {
        Config {
            output: OutputConfig {
                format: Some("json".to_string()),
                pretty: Some(true),
                mode: Some("styled".to_string()),
            },
            keys: KeysConfig {
                stable: Some(false),
                prefix: None, // only used with stable keys
            },
            styles: BTreeMap::from([(
                "normal".to_string(),
                "mb-4 leading-relaxed".to_string(),
            )]),
            marks: BTreeMap::from([("code".to_string(), "font-mono text-sm".to_string())]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.output.format.is_none());
        assert!(config.keys.stable.is_none());
        assert!(config.styles.is_empty());
    }

    #[test]
    fn test_parse_output_section() {
        let config: Config = toml::from_str(
            r#"
            [output]
            format = "html"
            pretty = false
            mode = "plain"
            "#,
        )
        .unwrap();

        assert_eq!(config.output.format, Some("html".to_string()));
        assert_eq!(config.output.pretty, Some(false));
        assert_eq!(config.output.mode, Some("plain".to_string()));
    }

    #[test]
    fn test_parse_keys_section() {
        let config: Config = toml::from_str(
            r#"
            [keys]
            stable = true
            prefix = "blk"
            "#,
        )
        .unwrap();

        assert_eq!(config.keys.stable, Some(true));
        assert_eq!(config.keys.prefix, Some("blk".to_string()));
    }

    #[test]
    fn test_parse_class_tables() {
        let config: Config = toml::from_str(
            r#"
            [styles]
            normal = "prose"
            h1 = "title"

            [marks]
            strong = "bold"
            "strike-through" = "strike"
            "#,
        )
        .unwrap();

        assert_eq!(config.styles.get("normal").map(String::as_str), Some("prose"));
        assert_eq!(config.styles.get("h1").map(String::as_str), Some("title"));
        assert_eq!(config.marks.get("strike-through").map(String::as_str), Some("strike"));
        assert_eq!(config.marks.len(), 2);
    }

    #[test]
    fn test_partial_config() {
        // Only some sections specified
        let config: Config = toml::from_str(
            r#"
            [output]
            format = "html"
            "#,
        )
        .unwrap();

        assert_eq!(config.output.format, Some("html".to_string()));
        // Other sections should be default
        assert!(config.output.mode.is_none());
        assert!(config.keys.prefix.is_none());
        assert!(config.marks.is_empty());
    }

    #[test]
    fn test_unknown_value_type_is_error() {
        let result: Result<Config, _> = toml::from_str(
            r#"
            [output]
            pretty = "yes"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_empty_config() {
        let config = Config::default();
        let toml = config.to_toml_with_schema().unwrap();
        assert!(toml.starts_with("#:schema"));
        // Empty config should have minimal content
        assert!(!toml.contains("[output]"));
        assert!(!toml.contains("[styles]"));
    }

    #[test]
    fn test_serialize_sample_config() {
        let config = Config::sample();
        let toml = config.to_toml_with_schema().unwrap();
        assert!(toml.starts_with("#:schema"));
        assert!(toml.contains("[output]"));
        assert!(toml.contains("format = \"json\""));
        assert!(toml.contains("[styles]"));
    }

    #[test]
    fn test_json_schema_generation() {
        let schema = Config::json_schema_string().unwrap();
        assert!(schema.contains("\"title\""));
        assert!(schema.contains("OutputConfig"));
        assert!(schema.contains("KeysConfig"));
    }

    #[test]
    fn test_roundtrip() {
        let config = Config::sample();
        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.output.format, parsed.output.format);
        assert_eq!(config.styles, parsed.styles);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = std::env::temp_dir().join(format!("lexical2pt_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let _ = std::fs::remove_file(dir.join(CONFIG_FILE_NAME));

        assert!(Config::load_from_dir(&dir).unwrap().is_none());

        std::fs::write(dir.join(CONFIG_FILE_NAME), "[keys]\nstable = true\n").unwrap();
        let config = Config::load_from_dir(&dir).unwrap().unwrap();
        assert_eq!(config.keys.stable, Some(true));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
