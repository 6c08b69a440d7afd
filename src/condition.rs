//! The raised-condition value object handed to the filter.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::severity::{severity_label, Severity};

/// One raised runtime condition.
///
/// Created by the host at the moment of the event, classified
/// synchronously, then dropped. The severity is kept as a raw code so
/// that values outside [`Severity`] can still be classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Raw severity code.
    pub severity: u32,
    /// Diagnostic message.
    pub message: String,
    /// Path of the file that raised the condition.
    pub origin_file: String,
    /// Line the condition was raised at.
    pub origin_line: u32,
    /// Opaque extra context supplied by the host.
    #[serde(default)]
    pub context: HashMap<String, Value>,
}

impl Condition {
    /// Creates a condition without context.
    pub fn new(
        severity: impl Into<u32>,
        message: impl Into<String>,
        origin_file: impl Into<String>,
        origin_line: u32,
    ) -> Self {
        Self {
            severity: severity.into(),
            message: message.into(),
            origin_file: origin_file.into(),
            origin_line,
            context: HashMap::new(),
        }
    }

    /// Adds a context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Returns the severity if the code is part of the closed enumeration.
    pub fn severity_kind(&self) -> Option<Severity> {
        Severity::from_code(self.severity)
    }

    /// Returns the display label for this condition's severity.
    pub fn severity_label(&self) -> Cow<'static, str> {
        severity_label(self.severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_new_accepts_severity() {
        let condition = Condition::new(Severity::Notice, "Undefined variable", "/app/a.php", 3);
        assert_eq!(condition.severity, 8);
        assert_eq!(condition.severity_kind(), Some(Severity::Notice));
        assert_eq!(condition.severity_label(), "E_NOTICE");
        assert!(condition.context.is_empty());
    }

    #[test]
    fn test_condition_with_raw_code() {
        let condition = Condition::new(12345u32, "odd", "", 0);
        assert_eq!(condition.severity_kind(), None);
        assert_eq!(condition.severity_label(), "12345");
    }

    #[test]
    fn test_condition_with_context() {
        let condition = Condition::new(Severity::Warning, "w", "/x.php", 1)
            .with_context("request_id", "abc")
            .with_context("attempt", 2);

        assert_eq!(condition.context.len(), 2);
        assert_eq!(condition.context["request_id"], Value::from("abc"));
        assert_eq!(condition.context["attempt"], Value::from(2));
    }

    #[test]
    fn test_condition_deserializes_without_context() {
        let json = r#"{
            "severity": 256,
            "message": "boom",
            "origin_file": "/x.php",
            "origin_line": 10
        }"#;

        let condition: Condition = serde_json::from_str(json).unwrap();
        assert_eq!(condition.severity_kind(), Some(Severity::UserError));
        assert_eq!(condition.origin_line, 10);
        assert!(condition.context.is_empty());
    }
}
