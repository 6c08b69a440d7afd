//! Condition triage: suppression rules, outcomes, and the filter.
//!
//! This module decides, for each raised condition, whether it is absorbed
//! (reporting silenced or a suppression rule matched) or escalated into an
//! [`EscalatedCondition`] that unwinds through the host's error path.

pub mod filter;
pub mod outcome;
pub mod rule;

pub use filter::{ConditionHandler, Registration, TriageFilter};
pub use outcome::{EscalatedCondition, IgnoreReason, Outcome};
pub use rule::{RuleBuilder, RuleError, RuleSet, SuppressionRule, TextMatcher};
