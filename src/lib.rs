//! errtriage - error interception and triage.
//!
//! A host runtime hands every raised condition (severity, message, origin
//! file, origin line, context) to a [`TriageFilter`]. The filter either
//! ignores it, because reporting is silenced or a suppression rule
//! matches, or escalates it as an [`EscalatedCondition`] error that
//! unwinds through the host's normal error path.
//!
//! ```
//! use errtriage::{Condition, ConditionHandler, ReportingMask, Severity, TriageFilter};
//!
//! let filter = TriageFilter::with_defaults(ReportingMask::ALL);
//!
//! let notice = Condition::new(Severity::Notice, "Undefined variable", "/app/Foo.php", 12);
//! assert!(filter.handle(&notice).is_ok());
//!
//! let fatal = Condition::new(Severity::UserError, "boom", "/x.php", 10);
//! let err = filter.handle(&fatal).unwrap_err();
//! assert_eq!(err.to_string(), "E_USER_ERROR: boom in /x.php on line 10");
//! ```

pub mod condition;
pub mod config;
pub mod install;
pub mod logging;
pub mod mask;
pub mod severity;
pub mod triage;

pub use condition::Condition;
pub use config::{ConfigError, TriageConfig};
pub use mask::{MaskSource, ReportingMask, SharedMask};
pub use severity::{severity_label, Severity};
pub use triage::{
    ConditionHandler, EscalatedCondition, IgnoreReason, Outcome, Registration, RuleSet,
    SuppressionRule, TriageFilter,
};
