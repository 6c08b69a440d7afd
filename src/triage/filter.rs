//! The diagnostic triage filter.
//!
//! [`TriageFilter::classify`] decides, for one condition at a time, whether
//! the condition is ignored or escalated:
//!
//! 1. resolve the severity label (total, unknown codes use their value)
//! 2. ignore if the host's reporting mask is silenced right now
//! 3. ignore if a suppression rule matches (first match wins)
//! 4. otherwise escalate with message, code, file and line
//!
//! Classification is pure and bounded. It performs no I/O and never raises
//! a condition itself, so it cannot re-enter the host's handler chain.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, trace};

use crate::condition::Condition;
use crate::config::{ConfigError, TriageConfig};
use crate::mask::MaskSource;

use super::outcome::{EscalatedCondition, IgnoreReason, Outcome};
use super::rule::RuleSet;

/// A handler the host invokes once per raised condition.
pub trait ConditionHandler: Send + Sync {
    /// Returns `Ok` when the condition is handled, or the escalation error
    /// that must unwind through the host's normal error path.
    fn handle(&self, condition: &Condition) -> Result<(), EscalatedCondition>;
}

/// Result of [`TriageFilter::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// This call registered the filter.
    Installed,
    /// The filter was already registered; nothing changed.
    AlreadyRegistered,
}

/// Classifies conditions against a rule set and a reporting mask.
pub struct TriageFilter {
    rules: RuleSet,
    mask: Arc<dyn MaskSource>,
    /// Set exactly once by `register`. Holds the handler that was active
    /// before this filter, if any.
    previous: OnceLock<Option<Arc<dyn ConditionHandler>>>,
}

impl fmt::Debug for TriageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriageFilter")
            .field("rules", &self.rules.names())
            .field("mask", &self.mask.current())
            .field("registered", &self.is_registered())
            .finish()
    }
}

impl TriageFilter {
    /// Creates a filter with the given rules and mask accessor.
    pub fn new(rules: RuleSet, mask: impl MaskSource + 'static) -> Self {
        Self {
            rules,
            mask: Arc::new(mask),
            previous: OnceLock::new(),
        }
    }

    /// Creates a filter with the built-in rules.
    pub fn with_defaults(mask: impl MaskSource + 'static) -> Self {
        Self::new(RuleSet::builtin(), mask)
    }

    /// Creates a filter from loaded configuration.
    pub fn from_config(
        config: &TriageConfig,
        mask: impl MaskSource + 'static,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(config.rule_set()?, mask))
    }

    /// Returns the rule set.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Registers the filter, remembering the previously active handler.
    ///
    /// Only the first call has an effect; later calls return
    /// [`Registration::AlreadyRegistered`] and drop their argument. The
    /// transition is guarded by a set-once cell, so concurrent callers
    /// agree on a single winner.
    pub fn register(&self, previous: Option<Arc<dyn ConditionHandler>>) -> Registration {
        let chained = previous.is_some();
        match self.previous.set(previous) {
            Ok(()) => {
                debug!(
                    rules = self.rules.len(),
                    chained,
                    "triage filter registered"
                );
                Registration::Installed
            }
            Err(_) => {
                trace!("triage filter already registered");
                Registration::AlreadyRegistered
            }
        }
    }

    /// Returns true once [`TriageFilter::register`] has been called.
    pub fn is_registered(&self) -> bool {
        self.previous.get().is_some()
    }

    /// Returns the handler that was active before registration.
    ///
    /// Retained for chaining; classification never calls it.
    pub fn previous_handler(&self) -> Option<&Arc<dyn ConditionHandler>> {
        self.previous.get().and_then(Option::as_ref)
    }

    /// Decides whether `condition` is ignored or escalated.
    ///
    /// Ignored conditions are absorbed without emitting any event. Only an
    /// escalation is traced.
    pub fn classify(&self, condition: &Condition) -> Outcome {
        let label = condition.severity_label();

        if self.mask.current().is_silenced() {
            return Outcome::Ignore(IgnoreReason::Silenced);
        }

        if let Some(rule) = self.rules.first_match(condition) {
            return Outcome::Ignore(IgnoreReason::Rule(rule.name().to_string()));
        }

        trace!(
            severity = %label,
            file = %condition.origin_file,
            line = condition.origin_line,
            "condition escalated"
        );
        Outcome::Escalate(EscalatedCondition::new(condition, label))
    }
}

impl ConditionHandler for TriageFilter {
    fn handle(&self, condition: &Condition) -> Result<(), EscalatedCondition> {
        self.classify(condition).into_result()
    }
}
