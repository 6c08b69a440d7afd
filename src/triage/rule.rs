//! Suppression rules and the ordered rule set.
//!
//! A [`SuppressionRule`] is a conjunction of optional predicates over a
//! [`Condition`]: severity equality, a match on the origin file, and a
//! match on the message. A [`RuleSet`] evaluates its rules in order and
//! stops at the first match, so rules are data that can be reordered,
//! added or removed without touching the filter.

use regex::Regex;
use thiserror::Error;

use crate::condition::Condition;
use crate::severity::Severity;

/// Path fragment of the compiled-template cache directory.
pub const COMPILED_TEMPLATE_DIR: &str = "cache/templates/compile/";

/// Path fragment of the bundled template engine.
pub const TEMPLATE_ENGINE_DIR: &str = "Library/Smarty/";

/// Message fragment of the template engine's stat warning.
pub const FILEMTIME_STAT_FAILED: &str = "filemtime(): stat failed for";

/// Message fragment of arithmetic division warnings.
pub const DIVISION_BY_ZERO: &str = "Division by zero";

/// Names of the built-in rules, in evaluation order.
pub mod builtin {
    /// Notices raised from compiled template output.
    pub const COMPILED_TEMPLATE_NOTICE: &str = "compiled-template-notice";
    /// Stat failures inside the template engine.
    pub const TEMPLATE_ENGINE_FILEMTIME: &str = "template-engine-filemtime";
    /// Division by zero inside compiled template output.
    pub const COMPILED_TEMPLATE_DIVISION_BY_ZERO: &str = "compiled-template-division-by-zero";
    /// Every strict-mode suggestion.
    pub const STRICT: &str = "strict";
    /// Every generic notice.
    pub const NOTICE: &str = "notice";
    /// Every generic warning.
    pub const WARNING: &str = "warning";
}

/// Errors raised while building rules.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A substring predicate was given an empty needle.
    #[error("rule '{0}': substring to match must not be empty")]
    EmptyNeedle(String),

    /// A regex predicate failed to compile.
    #[error("rule '{rule}': invalid pattern: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// The rule has no predicate and would match every condition.
    #[error("rule '{0}' has no predicate")]
    NoPredicate(String),

    /// A rule with the same name already exists in the set.
    #[error("duplicate rule name: {0}")]
    DuplicateName(String),
}

/// A compiled text predicate.
#[derive(Debug, Clone)]
pub struct TextMatcher {
    regex: Regex,
}

impl TextMatcher {
    /// Case-insensitive literal substring match.
    pub fn contains(needle: &str) -> Result<Self, regex::Error> {
        Regex::new(&format!("(?i){}", regex::escape(needle))).map(|regex| Self { regex })
    }

    /// Raw regular expression match.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(|regex| Self { regex })
    }

    /// Returns the compiled expression.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Checks the text. Empty text never matches.
    pub fn is_match(&self, text: &str) -> bool {
        !text.is_empty() && self.regex.is_match(text)
    }
}

/// A predicate over a condition whose match means "ignore".
#[derive(Debug, Clone)]
pub struct SuppressionRule {
    name: String,
    description: String,
    severity: Option<u32>,
    file: Option<TextMatcher>,
    message: Option<TextMatcher>,
}

impl SuppressionRule {
    /// Starts building a rule with the given name.
    pub fn builder(name: impl Into<String>) -> RuleBuilder {
        RuleBuilder {
            name: name.into(),
            description: String::new(),
            severity: None,
            file: None,
            message: None,
            error: None,
        }
    }

    /// Returns the rule name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the severity code this rule is restricted to, if any.
    pub fn severity(&self) -> Option<u32> {
        self.severity
    }

    /// Returns the origin-file matcher, if any.
    pub fn file(&self) -> Option<&TextMatcher> {
        self.file.as_ref()
    }

    /// Returns the message matcher, if any.
    pub fn message(&self) -> Option<&TextMatcher> {
        self.message.as_ref()
    }

    /// Returns true when every predicate of this rule holds.
    pub fn matches(&self, condition: &Condition) -> bool {
        let severity_ok = match self.severity {
            Some(code) => code == condition.severity,
            None => true,
        };
        let file_ok = match &self.file {
            Some(matcher) => matcher.is_match(&condition.origin_file),
            None => true,
        };
        let message_ok = match &self.message {
            Some(matcher) => matcher.is_match(&condition.message),
            None => true,
        };
        severity_ok && file_ok && message_ok
    }
}

/// Builder for [`SuppressionRule`].
///
/// The first invalid predicate is remembered and reported by
/// [`RuleBuilder::build`].
#[derive(Debug)]
pub struct RuleBuilder {
    name: String,
    description: String,
    severity: Option<u32>,
    file: Option<TextMatcher>,
    message: Option<TextMatcher>,
    error: Option<RuleError>,
}

impl RuleBuilder {
    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Restricts the rule to one severity code.
    pub fn severity(mut self, severity: impl Into<u32>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    /// Requires the origin file to contain `needle` (case-insensitive).
    pub fn file_contains(mut self, needle: &str) -> Self {
        self.file = self.literal(needle);
        self
    }

    /// Requires the message to contain `needle` (case-insensitive).
    pub fn message_contains(mut self, needle: &str) -> Self {
        self.message = self.literal(needle);
        self
    }

    /// Requires the origin file to match a regular expression.
    pub fn file_pattern(mut self, pattern: &str) -> Self {
        self.file = self.regex(pattern);
        self
    }

    /// Requires the message to match a regular expression.
    pub fn message_pattern(mut self, pattern: &str) -> Self {
        self.message = self.regex(pattern);
        self
    }

    /// Finishes the rule.
    pub fn build(self) -> Result<SuppressionRule, RuleError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.severity.is_none() && self.file.is_none() && self.message.is_none() {
            return Err(RuleError::NoPredicate(self.name));
        }
        Ok(SuppressionRule {
            name: self.name,
            description: self.description,
            severity: self.severity,
            file: self.file,
            message: self.message,
        })
    }

    fn literal(&mut self, needle: &str) -> Option<TextMatcher> {
        if needle.is_empty() {
            self.fail(RuleError::EmptyNeedle(self.name.clone()));
            return None;
        }
        self.compiled(TextMatcher::contains(needle))
    }

    fn regex(&mut self, pattern: &str) -> Option<TextMatcher> {
        if pattern.is_empty() {
            self.fail(RuleError::EmptyNeedle(self.name.clone()));
            return None;
        }
        self.compiled(TextMatcher::pattern(pattern))
    }

    fn compiled(&mut self, result: Result<TextMatcher, regex::Error>) -> Option<TextMatcher> {
        match result {
            Ok(matcher) => Some(matcher),
            Err(source) => {
                let rule = self.name.clone();
                self.fail(RuleError::InvalidPattern { rule, source });
                None
            }
        }
    }

    fn fail(&mut self, error: RuleError) {
        self.error.get_or_insert(error);
    }
}

/// An ordered, first-match-wins sequence of suppression rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<SuppressionRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleSet {
    /// Creates a set with no rules; every condition escalates.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Creates a set from rules in evaluation order.
    pub fn with_rules(rules: Vec<SuppressionRule>) -> Result<Self, RuleError> {
        let mut set = Self::empty();
        for rule in rules {
            set.push(rule)?;
        }
        Ok(set)
    }

    /// The built-in rules.
    ///
    /// The generic notice rule subsumes `compiled-template-notice`, so the
    /// latter never decides an outcome on its own. Both are kept so the
    /// order is preserved when either one is removed.
    pub fn builtin() -> Self {
        let rules = vec![
            SuppressionRule::builder(builtin::COMPILED_TEMPLATE_NOTICE)
                .description("Uninitialized variable access in compiled templates")
                .severity(Severity::Notice)
                .file_contains(COMPILED_TEMPLATE_DIR),
            SuppressionRule::builder(builtin::TEMPLATE_ENGINE_FILEMTIME)
                .description("Template engine stat on a missing compiled file")
                .file_contains(TEMPLATE_ENGINE_DIR)
                .message_contains(FILEMTIME_STAT_FAILED),
            SuppressionRule::builder(builtin::COMPILED_TEMPLATE_DIVISION_BY_ZERO)
                .description("Division by zero in compiled templates")
                .file_contains(COMPILED_TEMPLATE_DIR)
                .message_contains(DIVISION_BY_ZERO),
            SuppressionRule::builder(builtin::STRICT)
                .description("Strict-mode suggestions")
                .severity(Severity::Strict),
            SuppressionRule::builder(builtin::NOTICE)
                .description("Generic notices")
                .severity(Severity::Notice),
            SuppressionRule::builder(builtin::WARNING)
                .description("Generic warnings")
                .severity(Severity::Warning),
        ];

        Self {
            rules: rules
                .into_iter()
                .map(|rule| rule.build().expect("built-in rule must be valid"))
                .collect(),
        }
    }

    /// Returns the first rule matching the condition.
    pub fn first_match(&self, condition: &Condition) -> Option<&SuppressionRule> {
        self.rules.iter().find(|rule| rule.matches(condition))
    }

    /// Appends a rule after every existing one.
    pub fn push(&mut self, rule: SuppressionRule) -> Result<(), RuleError> {
        self.ensure_unique(rule.name())?;
        self.rules.push(rule);
        Ok(())
    }

    /// Inserts a rule at `index`, clamped to the end of the set.
    pub fn insert(&mut self, index: usize, rule: SuppressionRule) -> Result<(), RuleError> {
        self.ensure_unique(rule.name())?;
        let index = index.min(self.rules.len());
        self.rules.insert(index, rule);
        Ok(())
    }

    /// Removes a rule by name.
    pub fn remove(&mut self, name: &str) -> Option<SuppressionRule> {
        let position = self.rules.iter().position(|rule| rule.name() == name)?;
        Some(self.rules.remove(position))
    }

    /// Looks up a rule by name.
    pub fn get(&self, name: &str) -> Option<&SuppressionRule> {
        self.rules.iter().find(|rule| rule.name() == name)
    }

    /// Rule names in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Iterates over rules in evaluation order.
    pub fn iter(&self) -> std::slice::Iter<'_, SuppressionRule> {
        self.rules.iter()
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true when there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn ensure_unique(&self, name: &str) -> Result<(), RuleError> {
        if self.get(name).is_some() {
            return Err(RuleError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a SuppressionRule;
    type IntoIter = std::slice::Iter<'a, SuppressionRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
