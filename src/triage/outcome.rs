//! Classification outcomes and the escalation error.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::condition::Condition;
use crate::severity::Severity;

/// Why a condition was ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IgnoreReason {
    /// Reporting was silenced when the condition was raised.
    Silenced,
    /// A suppression rule matched. Holds the rule name.
    Rule(String),
}

/// A condition converted into a propagating error.
///
/// Carries exactly the original message, the numeric severity, the origin
/// file and the origin line. The label is only used for display.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{severity_label}: {message} in {file} on line {line}")]
pub struct EscalatedCondition {
    /// The original message, verbatim.
    pub message: String,
    /// The numeric severity code.
    pub code: u32,
    /// Display label for `code`.
    pub severity_label: String,
    /// Origin file of the condition.
    pub file: String,
    /// Origin line of the condition.
    pub line: u32,
}

impl EscalatedCondition {
    pub(crate) fn new(condition: &Condition, severity_label: Cow<'static, str>) -> Self {
        Self {
            message: condition.message.clone(),
            code: condition.severity,
            severity_label: severity_label.into_owned(),
            file: condition.origin_file.clone(),
            line: condition.origin_line,
        }
    }

    /// Returns the severity if `code` is part of the closed enumeration.
    pub fn severity(&self) -> Option<Severity> {
        Severity::from_code(self.code)
    }
}

impl From<&Condition> for EscalatedCondition {
    fn from(condition: &Condition) -> Self {
        Self::new(condition, condition.severity_label())
    }
}

/// The decision for one condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The condition is absorbed.
    Ignore(IgnoreReason),
    /// The condition halts the caller with an error.
    Escalate(EscalatedCondition),
}

impl Outcome {
    /// Returns true if the condition is ignored.
    pub fn is_ignored(&self) -> bool {
        matches!(self, Outcome::Ignore(_))
    }

    /// Returns true if the condition escalates.
    pub fn is_escalated(&self) -> bool {
        matches!(self, Outcome::Escalate(_))
    }

    /// Returns the name of the suppressing rule, if one matched.
    pub fn rule(&self) -> Option<&str> {
        match self {
            Outcome::Ignore(IgnoreReason::Rule(name)) => Some(name),
            _ => None,
        }
    }

    /// Converts into the host-facing result: ignored conditions are handled.
    pub fn into_result(self) -> Result<(), EscalatedCondition> {
        match self {
            Outcome::Ignore(_) => Ok(()),
            Outcome::Escalate(escalated) => Err(escalated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalated_condition_display() {
        let condition = Condition::new(Severity::UserError, "boom", "/x.php", 10);
        let escalated = EscalatedCondition::from(&condition);

        assert_eq!(
            escalated.to_string(),
            "E_USER_ERROR: boom in /x.php on line 10"
        );
        assert_eq!(escalated.severity(), Some(Severity::UserError));
    }

    #[test]
    fn test_escalated_condition_unknown_code() {
        let condition = Condition::new(99u32, "odd", "/y.php", 2);
        let escalated = EscalatedCondition::from(&condition);

        assert_eq!(escalated.code, 99);
        assert_eq!(escalated.severity_label, "99");
        assert_eq!(escalated.severity(), None);
        assert_eq!(escalated.to_string(), "99: odd in /y.php on line 2");
    }

    #[test]
    fn test_escalated_condition_is_std_error() {
        let condition = Condition::new(Severity::Error, "fatal", "/z.php", 1);
        let err: Box<dyn std::error::Error> = Box::new(EscalatedCondition::from(&condition));
        assert!(err.to_string().contains("fatal"));
    }

    #[test]
    fn test_outcome_predicates() {
        let ignored = Outcome::Ignore(IgnoreReason::Rule("notice".to_string()));
        assert!(ignored.is_ignored());
        assert!(!ignored.is_escalated());
        assert_eq!(ignored.rule(), Some("notice"));

        let silenced = Outcome::Ignore(IgnoreReason::Silenced);
        assert_eq!(silenced.rule(), None);
        assert!(silenced.into_result().is_ok());
    }

    #[test]
    fn test_outcome_into_result() {
        let condition = Condition::new(Severity::Error, "fatal", "/z.php", 1);
        let outcome = Outcome::Escalate(EscalatedCondition::from(&condition));

        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.message, "fatal");
        assert_eq!(err.line, 1);
    }
}
