//! Triage configuration loaded from TOML.
//!
//! The built-in rules are on by default. A config file can disable
//! individual built-ins by name and append custom rules, which are
//! evaluated after the built-ins in file order:
//!
//! ```toml
//! disabled_rules = ["warning"]
//!
//! [[rules]]
//! name = "vendor-deprecations"
//! severity = "E_DEPRECATED"
//! file_contains = "/vendor/"
//!
//! [logging]
//! level = "debug"
//! ```

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::logging::LoggingConfig;
use crate::severity::Severity;
use crate::triage::{RuleError, RuleSet, SuppressionRule};

/// Prefix for environment overrides, e.g. `ERRTRIAGE__DEFAULT_RULES=false`.
pub const ENV_PREFIX: &str = "ERRTRIAGE";

/// Errors that can occur when loading triage configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration file path is invalid.
    #[error("invalid configuration path: {0}")]
    InvalidPath(String),

    /// The layered configuration could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] config::ConfigError),

    /// An inline TOML document could not be parsed.
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A rule names a severity that is not in the table.
    #[error("rule '{rule}': unknown severity '{value}'")]
    UnknownSeverity { rule: String, value: String },

    /// A rule sets both the substring and the pattern form of a predicate.
    #[error("rule '{rule}': both {field}_contains and {field}_pattern are set")]
    ConflictingPredicates { rule: String, field: &'static str },

    /// `disabled_rules` names a rule that does not exist.
    #[error("cannot disable unknown rule: {0}")]
    UnknownRule(String),

    /// A rule is invalid.
    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// A severity given either by label or by raw code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SeverityRef {
    /// Raw numeric code; need not be in the table.
    Code(u32),
    /// Label such as `"E_NOTICE"` or `"notice"`.
    Label(String),
}

impl SeverityRef {
    /// Resolves to a numeric code.
    pub fn code(&self) -> Option<u32> {
        match self {
            SeverityRef::Code(code) => Some(*code),
            SeverityRef::Label(label) => Severity::from_label(label).map(Severity::code),
        }
    }
}

/// A custom suppression rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleConfig {
    /// Unique rule name.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Option<SeverityRef>,
    #[serde(default)]
    pub file_contains: Option<String>,
    #[serde(default)]
    pub file_pattern: Option<String>,
    #[serde(default)]
    pub message_contains: Option<String>,
    #[serde(default)]
    pub message_pattern: Option<String>,
}

impl RuleConfig {
    /// Compiles this entry into a rule.
    pub fn build(&self) -> Result<SuppressionRule, ConfigError> {
        let mut builder = SuppressionRule::builder(&self.name);
        if let Some(description) = &self.description {
            builder = builder.description(description);
        }

        if let Some(severity) = &self.severity {
            let code = severity
                .code()
                .ok_or_else(|| ConfigError::UnknownSeverity {
                    rule: self.name.clone(),
                    value: match severity {
                        SeverityRef::Code(code) => code.to_string(),
                        SeverityRef::Label(label) => label.clone(),
                    },
                })?;
            builder = builder.severity(code);
        }

        match (&self.file_contains, &self.file_pattern) {
            (Some(_), Some(_)) => return Err(self.conflict("file")),
            (Some(needle), None) => builder = builder.file_contains(needle),
            (None, Some(pattern)) => builder = builder.file_pattern(pattern),
            (None, None) => {}
        }

        match (&self.message_contains, &self.message_pattern) {
            (Some(_), Some(_)) => return Err(self.conflict("message")),
            (Some(needle), None) => builder = builder.message_contains(needle),
            (None, Some(pattern)) => builder = builder.message_pattern(pattern),
            (None, None) => {}
        }

        Ok(builder.build()?)
    }

    fn conflict(&self, field: &'static str) -> ConfigError {
        ConfigError::ConflictingPredicates {
            rule: self.name.clone(),
            field,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Root triage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TriageConfig {
    /// Whether the built-in rules are loaded.
    #[serde(default = "default_true")]
    pub default_rules: bool,

    /// Built-in rules to drop, by name.
    #[serde(default)]
    pub disabled_rules: Vec<String>,

    /// Custom rules, appended after the built-ins.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            default_rules: true,
            disabled_rules: Vec::new(),
            rules: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TriageConfig {
    /// Loads configuration from a TOML file with environment overrides.
    ///
    /// Environment variables use the `ERRTRIAGE` prefix and a double
    /// underscore between nested keys, e.g. `ERRTRIAGE__LOGGING__LEVEL=trace`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, the path is not valid
    /// UTF-8, or the contents cannot be parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::InvalidPath(format!("{:?}", path)))?;

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path_str.to_string()));
        }

        let config = Config::builder()
            .add_source(File::new(path_str, FileFormat::Toml))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let triage_config: TriageConfig = config.try_deserialize()?;
        debug!(
            path = path_str,
            custom_rules = triage_config.rules.len(),
            "loaded triage configuration"
        );

        Ok(triage_config)
    }

    /// Parses configuration from an in-memory TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Builds the rule set described by this configuration.
    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        let mut rules = if self.default_rules {
            RuleSet::builtin()
        } else {
            RuleSet::empty()
        };

        for name in &self.disabled_rules {
            if rules.remove(name).is_none() {
                return Err(ConfigError::UnknownRule(name.clone()));
            }
        }

        for rule in &self.rules {
            rules.push(rule.build()?)?;
        }

        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::logging::LogLevel;
    use crate::triage::rule::builtin;

    #[test]
    fn test_default_config_uses_builtin_rules() {
        let config = TriageConfig::default();
        let rules = config.rule_set().unwrap();
        assert_eq!(rules.names(), RuleSet::builtin().names());
    }

    #[test]
    fn test_empty_document_matches_default() {
        let config = TriageConfig::from_toml_str("").unwrap();
        assert!(config.default_rules);
        assert!(config.disabled_rules.is_empty());
        assert!(config.rules.is_empty());
        assert!(matches!(config.logging.level, LogLevel::Info));
    }

    #[test]
    fn test_custom_rules_are_appended() {
        let toml_str = r#"
            disabled_rules = ["warning"]

            [[rules]]
            name = "vendor-deprecations"
            severity = "E_DEPRECATED"
            file_contains = "/vendor/"

            [[rules]]
            name = "raw-code"
            severity = 8192
            message_pattern = "^Function .* is deprecated$"
        "#;

        let config = TriageConfig::from_toml_str(toml_str).unwrap();
        let rules = config.rule_set().unwrap();

        assert_eq!(
            rules.names(),
            vec![
                builtin::COMPILED_TEMPLATE_NOTICE,
                builtin::TEMPLATE_ENGINE_FILEMTIME,
                builtin::COMPILED_TEMPLATE_DIVISION_BY_ZERO,
                builtin::STRICT,
                builtin::NOTICE,
                "vendor-deprecations",
                "raw-code",
            ]
        );

        let condition = Condition::new(Severity::Deprecated, "x", "/app/vendor/lib.php", 1);
        assert_eq!(
            rules.first_match(&condition).map(|r| r.name()),
            Some("vendor-deprecations")
        );
    }

    #[test]
    fn test_without_default_rules() {
        let toml_str = r#"
            default_rules = false

            [[rules]]
            name = "only-notices"
            severity = "notice"
        "#;

        let config = TriageConfig::from_toml_str(toml_str).unwrap();
        let rules = config.rule_set().unwrap();
        assert_eq!(rules.names(), vec!["only-notices"]);
    }

    #[test]
    fn test_unknown_severity_label() {
        let toml_str = r#"
            [[rules]]
            name = "bad"
            severity = "E_LOUD"
        "#;

        let config = TriageConfig::from_toml_str(toml_str).unwrap();
        let err = config.rule_set().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSeverity { ref value, .. } if value == "E_LOUD"));
    }

    #[test]
    fn test_conflicting_predicates() {
        let rule = RuleConfig {
            name: "both".to_string(),
            file_contains: Some("/a/".to_string()),
            file_pattern: Some("/b/".to_string()),
            ..Default::default()
        };

        let err = rule.build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ConflictingPredicates { field: "file", .. }
        ));
    }

    #[test]
    fn test_rule_without_predicate() {
        let rule = RuleConfig {
            name: "nothing".to_string(),
            ..Default::default()
        };

        let err = rule.build().unwrap_err();
        assert!(matches!(err, ConfigError::Rule(RuleError::NoPredicate(_))));
    }

    #[test]
    fn test_duplicate_custom_rule() {
        let toml_str = r#"
            [[rules]]
            name = "notice"
            severity = "user_notice"
        "#;

        let config = TriageConfig::from_toml_str(toml_str).unwrap();
        let err = config.rule_set().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Rule(RuleError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_disable_unknown_rule() {
        let config = TriageConfig::from_toml_str(r#"disabled_rules = ["nope"]"#).unwrap();
        let err = config.rule_set().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRule(name) if name == "nope"));
    }

    #[test]
    fn test_logging_section() {
        let toml_str = r#"
            [logging]
            level = "trace"
            with_file = true
        "#;

        let config = TriageConfig::from_toml_str(toml_str).unwrap();
        assert!(matches!(config.logging.level, LogLevel::Trace));
        assert!(config.logging.with_file);
        assert!(config.logging.with_timestamps);
    }

    #[test]
    fn test_load_file_not_found() {
        let err = TriageConfig::load("/nonexistent/errtriage.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
        assert!(err.to_string().contains("configuration file not found"));
    }

    #[test]
    fn test_severity_ref_code() {
        assert_eq!(SeverityRef::Code(12345).code(), Some(12345));
        assert_eq!(SeverityRef::Label("E_STRICT".into()).code(), Some(2048));
        assert_eq!(SeverityRef::Label("bogus".into()).code(), None);
    }
}
