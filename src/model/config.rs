use serde::{Deserialize, Serialize};

/// Engine options, usually read from `gtd.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub inherit: InheritConfig,
    #[serde(default)]
    pub recurrence: RecurrenceConfig,
}

/// Which fields a new task copies from the project it is created under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritConfig {
    #[serde(default = "default_true")]
    pub context: bool,
    #[serde(default = "default_true")]
    pub goal: bool,
    #[serde(default = "default_true")]
    pub folder: bool,
    #[serde(default)]
    pub tags: bool,
}

impl Default for InheritConfig {
    fn default() -> Self {
        InheritConfig {
            context: true,
            goal: true,
            folder: true,
            tags: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    /// Set the completed original's pattern to `Norepeat` once its
    /// successor exists.
    #[serde(default = "default_true")]
    pub reset_original: bool,
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        RecurrenceConfig {
            reset_original: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.inherit.context);
        assert!(!config.inherit.tags);
        assert!(config.recurrence.reset_original);
    }

    #[test]
    fn test_partial_sections() {
        let config: EngineConfig = toml::from_str(
            r#"[inherit]
tags = true
goal = false

[recurrence]
reset_original = false
"#,
        )
        .unwrap();
        assert!(config.inherit.context);
        assert!(!config.inherit.goal);
        assert!(config.inherit.tags);
        assert!(!config.recurrence.reset_original);
    }
}
