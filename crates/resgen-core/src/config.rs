use std::path::PathBuf;

use serde::Deserialize;

use crate::error::GeneratorError;

/// Top-level generation configuration, loaded from `.resgen.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// How fork specs compose.
    pub strategy: ForkStrategy,
    /// Group endpoints by OpenAPI tag vs. one flat module.
    pub module_per_tag: bool,
    #[serde(default)]
    pub include_tags: Vec<String>,
    #[serde(default)]
    pub exclude_tags: Vec<String>,
    /// Emit a markdown report when multi-fork inputs are supplied.
    pub generate_diff_report: bool,
    pub breaking_change_handling: BreakingChangeHandling,
    pub targets: Targets,
    /// Subdirectory for the shared base in `SharedBase` mode.
    pub base_instance_name: String,
    /// Qualifier prepended to cross-module references into the shared base.
    pub base_module_prefix: String,
    /// When present, endpoint descriptions consult override files indexed
    /// by `{module}/{operation}.md`.
    pub doc_override_dir: Option<PathBuf>,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            strategy: ForkStrategy::SharedBase,
            module_per_tag: true,
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            generate_diff_report: false,
            breaking_change_handling: BreakingChangeHandling::Warn,
            targets: Targets::default(),
            base_instance_name: "base".to_string(),
            base_module_prefix: "Base".to_string(),
            doc_override_dir: None,
        }
    }
}

/// How fork specs compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForkStrategy {
    /// Every fork is generated standalone.
    Separate,
    /// Forks share a base module and qualify references into it.
    SharedBase,
}

/// What to do when a fork drops endpoints the base declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakingChangeHandling {
    Error,
    Warn,
    Ignore,
}

/// Which emitters run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Targets {
    pub api: bool,
    pub wrapper: bool,
    pub dts: bool,
    pub ts_wrapper: bool,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            api: true,
            wrapper: true,
            dts: false,
            ts_wrapper: false,
        }
    }
}

impl Targets {
    pub fn any(&self) -> bool {
        self.api || self.wrapper || self.dts || self.ts_wrapper
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".resgen.yaml";

impl GenConfig {
    /// Reject configurations the generators cannot act on.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if !self.targets.any() {
            return Err(GeneratorError::InvalidConfig {
                message: "no targets enabled".to_string(),
            });
        }
        if let Some(tag) = self
            .include_tags
            .iter()
            .find(|t| self.exclude_tags.contains(t))
        {
            return Err(GeneratorError::InvalidConfig {
                message: format!("tag {tag:?} is both included and excluded"),
            });
        }
        if self.strategy == ForkStrategy::SharedBase {
            if self.base_instance_name.is_empty() {
                return Err(GeneratorError::InvalidConfig {
                    message: "base_instance_name must not be empty in shared_base mode"
                        .to_string(),
                });
            }
            if self.base_module_prefix.is_empty() {
                return Err(GeneratorError::InvalidConfig {
                    message: "base_module_prefix must not be empty in shared_base mode"
                        .to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Load config from a YAML string. The CLI owns the file read.
pub fn parse_config(content: &str) -> Result<GenConfig, GeneratorError> {
    let config: GenConfig =
        serde_yaml_ng::from_str(content).map_err(|e| GeneratorError::InvalidConfig {
            message: e.to_string(),
        })?;
    config.validate()?;
    Ok(config)
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# resgen configuration
strategy: shared_base        # separate | shared_base
module_per_tag: true
include_tags: []
exclude_tags: []
generate_diff_report: false
breaking_change_handling: warn   # error | warn | ignore

targets:
  api: true
  wrapper: true
  dts: false
  ts_wrapper: false

base_instance_name: base
base_module_prefix: Base
# doc_override_dir: docs/overrides
"#
}
