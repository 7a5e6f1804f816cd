//! Configuration for the override tool
//!
//! Supports loading configuration from:
//! - Default values (including the built-in `terraform` target)
//! - Config file (overrides.toml)
//! - Environment variables (OVERRIDES__*)
//!
//! ## Example config file (overrides.toml):
//! ```toml
//! [target]
//! name = "ansible"
//!
//! [[targets.ansible.resource]]
//! name = "custom_code"
//!
//! [[targets.ansible.property]]
//! name = "aliases"
//!
//! [[targets.ansible.property]]
//! name = "is_set"
//! default = false
//! applies_to = ["Array", "Map"]
//!
//! [output]
//! format = "compact"
//!
//! [driver]
//! max_parallel_units = 8
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

use crate::overrides::{AttributeDef, AttributeSet, OverrideTarget};
use crate::schema::PropertyType;

/// Name of the target shipped with the tool
pub const DEFAULT_TARGET: &str = "terraform";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverridesConfig {
    /// Active output target
    #[serde(default)]
    pub target: TargetSelection,

    /// Attribute whitelists per output target
    #[serde(default = "default_targets")]
    pub targets: BTreeMap<String, TargetConfig>,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub driver: DriverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSelection {
    #[serde(default = "default_target_name")]
    pub name: String,
}

/// Whitelists for one output target
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Provider-only attributes legal on resource overrides
    #[serde(default)]
    pub resource: AttributeSet,

    /// Provider-only attributes legal on property overrides
    #[serde(default)]
    pub property: AttributeSet,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON format for merged graphs (pretty or compact)
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl OutputFormat {
    /// Serialize `value` in this format
    pub fn render<T: Serialize>(&self, value: &T) -> serde_json::Result<String> {
        match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
            OutputFormat::Compact => serde_json::to_string(value),
        }
    }
}

/// Batch compilation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Upper bound on units compiled at the same time
    #[serde(default = "default_max_parallel_units")]
    pub max_parallel_units: usize,
}

// Default value functions
fn default_target_name() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_max_parallel_units() -> usize {
    4
}

fn default_targets() -> BTreeMap<String, TargetConfig> {
    let mut targets = BTreeMap::new();
    targets.insert(DEFAULT_TARGET.to_string(), terraform_target());
    targets
}

/// Provider-only attributes of the Terraform provider overrides
pub fn terraform_target() -> TargetConfig {
    let resource = AttributeSet::new(vec![
        AttributeDef::new("id_format"),
        AttributeDef::new("import_format"),
        AttributeDef::new("custom_code"),
        AttributeDef::new("docs"),
        AttributeDef::new("examples"),
        AttributeDef::new("mutex"),
        AttributeDef::new("legacy_name"),
        AttributeDef::new("supports_indirect_user_project_override").with_default(json!(false)),
        AttributeDef::new("skip_delete").with_default(json!(false)),
        AttributeDef::new("skip_sweeper").with_default(json!(false)),
        AttributeDef::new("timeouts"),
        AttributeDef::new("async"),
    ]);

    let property = AttributeSet::new(vec![
        AttributeDef::new("sensitive").with_default(json!(false)),
        AttributeDef::new("default_from_api")
            .with_default(json!(false))
            .conflicts_with(&["default_value"]),
        AttributeDef::new("ignore_read").with_default(json!(false)),
        AttributeDef::new("validation"),
        AttributeDef::new("diff_suppress_func"),
        AttributeDef::new("state_func"),
        AttributeDef::new("set_hash_func").applies_to(&[PropertyType::Array]),
        AttributeDef::new("is_set")
            .with_default(json!(false))
            .applies_to(&[PropertyType::Array, PropertyType::Map]),
        AttributeDef::new("flatten_object")
            .with_default(json!(false))
            .applies_to(&[PropertyType::NestedObject]),
        AttributeDef::new("key_expander")
            .with_default(json!("expandString"))
            .applies_to(&[PropertyType::Map]),
        AttributeDef::new("key_diff_suppress_func").applies_to(&[PropertyType::Map]),
        AttributeDef::new("custom_flatten"),
        AttributeDef::new("custom_expand"),
        AttributeDef::new("unordered_list")
            .with_default(json!(false))
            .applies_to(&[PropertyType::Array]),
    ]);

    TargetConfig { resource, property }
}

impl Default for TargetSelection {
    fn default() -> Self {
        Self { name: default_target_name() }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: OutputFormat::Pretty }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { max_parallel_units: default_max_parallel_units() }
    }
}

impl Default for OverridesConfig {
    fn default() -> Self {
        Self {
            target: TargetSelection::default(),
            targets: default_targets(),
            output: OutputConfig::default(),
            driver: DriverConfig::default(),
        }
    }
}

impl OverridesConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["overrides.toml", ".overrides.toml", "config/overrides.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        let project = directories::ProjectDirs::from("dev", "schema-overrides", "schema-overrides");
        if let Some(dirs) = project {
            let xdg_config = dirs.config_dir().join("overrides.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("OVERRIDES")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: Self = builder.build()?.try_deserialize()?;
        // The built-in target stays available when a file declares others
        config
            .targets
            .entry(DEFAULT_TARGET.to_string())
            .or_insert_with(terraform_target);
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Whitelists of the named target
    pub fn target(&self, name: &str) -> Result<OverrideTarget, ConfigError> {
        let config = self.targets.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.targets.keys().map(String::as_str).collect();
            ConfigError::Message(format!(
                "unknown output target '{}' (known: {})",
                name,
                known.join(", ")
            ))
        })?;
        Ok(OverrideTarget::new(name, config.resource.clone(), config.property.clone()))
    }

    /// Whitelists of the active target
    pub fn active_target(&self) -> Result<OverrideTarget, ConfigError> {
        self.target(&self.target.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OverridesConfig::default();
        assert_eq!(config.target.name, "terraform");
        assert_eq!(config.driver.max_parallel_units, 4);
        assert_eq!(config.output.format, OutputFormat::Pretty);

        let target = config.active_target().unwrap();
        assert!(target.resource.contains("custom_code"));
        assert_eq!(target.property.default_for("key_expander"), Some(&json!("expandString")));
        assert!(!target.property.get("is_set").unwrap().applies(PropertyType::String));
    }

    #[test]
    fn test_unknown_target() {
        let config = OverridesConfig::default();
        assert!(config.target("puppet").is_err());
    }

    #[test]
    fn test_serialize_config() {
        let config = OverridesConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[target]"));
        assert!(toml_str.contains("[driver]"));
    }

    #[test]
    fn test_output_format_render() {
        let value = json!({ "a": 1 });
        assert_eq!(OutputFormat::Compact.render(&value).unwrap(), r#"{"a":1}"#);
        assert!(OutputFormat::Pretty.render(&value).unwrap().contains('\n'));
    }
}
