//! Severity taxonomy for raised runtime conditions.
//!
//! Severities are a closed set of bit-flag codes (error, warning, notice,
//! strict, deprecated, their engine and user-triggered variants, and the
//! `All` aggregate). Conditions carry the raw code so that values outside
//! the enumeration stay representable; [`severity_label`] is the total
//! name lookup used for diagnostic text.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A severity level from the closed enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Fatal run-time error. Execution cannot continue.
    Error,
    /// Run-time warning (non-fatal).
    Warning,
    /// Compile-time parse error.
    Parse,
    /// Run-time notice, e.g. access to an uninitialized variable.
    Notice,
    /// Fatal error raised during engine start-up.
    CoreError,
    /// Warning raised during engine start-up.
    CoreWarning,
    /// Fatal compile-time error.
    CompileError,
    /// Compile-time warning.
    CompileWarning,
    /// User-triggered error.
    UserError,
    /// User-triggered warning.
    UserWarning,
    /// User-triggered notice.
    UserNotice,
    /// Strict-mode suggestion for forward compatibility.
    Strict,
    /// Catchable fatal error.
    RecoverableError,
    /// Use of a feature scheduled for removal.
    Deprecated,
    /// User-triggered deprecation.
    UserDeprecated,
    /// Aggregate of every level.
    All,
}

impl Severity {
    /// Every severity, in name-table order.
    pub const ALL: [Severity; 16] = [
        Severity::Error,
        Severity::Warning,
        Severity::Parse,
        Severity::Notice,
        Severity::CoreError,
        Severity::CoreWarning,
        Severity::CompileError,
        Severity::CompileWarning,
        Severity::UserError,
        Severity::UserWarning,
        Severity::UserNotice,
        Severity::Strict,
        Severity::RecoverableError,
        Severity::Deprecated,
        Severity::UserDeprecated,
        Severity::All,
    ];

    /// Returns the numeric bit code.
    pub const fn code(self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Parse => 4,
            Severity::Notice => 8,
            Severity::CoreError => 16,
            Severity::CoreWarning => 32,
            Severity::CompileError => 64,
            Severity::CompileWarning => 128,
            Severity::UserError => 256,
            Severity::UserWarning => 512,
            Severity::UserNotice => 1024,
            Severity::Strict => 2048,
            Severity::RecoverableError => 4096,
            Severity::Deprecated => 8192,
            Severity::UserDeprecated => 16384,
            Severity::All => 32767,
        }
    }

    /// Returns the human-readable label, e.g. `E_NOTICE`.
    pub const fn label(self) -> &'static str {
        match self {
            Severity::Error => "E_ERROR",
            Severity::Warning => "E_WARNING",
            Severity::Parse => "E_PARSE",
            Severity::Notice => "E_NOTICE",
            Severity::CoreError => "E_CORE_ERROR",
            Severity::CoreWarning => "E_CORE_WARNING",
            Severity::CompileError => "E_COMPILE_ERROR",
            Severity::CompileWarning => "E_COMPILE_WARNING",
            Severity::UserError => "E_USER_ERROR",
            Severity::UserWarning => "E_USER_WARNING",
            Severity::UserNotice => "E_USER_NOTICE",
            Severity::Strict => "E_STRICT",
            Severity::RecoverableError => "E_RECOVERABLE_ERROR",
            Severity::Deprecated => "E_DEPRECATED",
            Severity::UserDeprecated => "E_USER_DEPRECATED",
            Severity::All => "E_ALL",
        }
    }

    /// Looks up a severity by its exact code.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|severity| severity.code() == code)
    }

    /// Looks up a severity by label.
    ///
    /// Matching is case-insensitive and the `E_` prefix is optional, so
    /// `"E_NOTICE"`, `"e_notice"` and `"notice"` all resolve to
    /// [`Severity::Notice`].
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_uppercase();
        let label = if label.starts_with("E_") {
            label
        } else {
            format!("E_{}", label)
        };
        Self::ALL
            .into_iter()
            .find(|severity| severity.label() == label)
    }

    /// Returns true for levels that halt execution when unhandled.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            Severity::Error
                | Severity::Parse
                | Severity::CoreError
                | Severity::CompileError
                | Severity::UserError
                | Severity::RecoverableError
        )
    }

    /// Returns true for the levels raised explicitly by user code.
    pub fn is_user_triggered(self) -> bool {
        matches!(
            self,
            Severity::UserError
                | Severity::UserWarning
                | Severity::UserNotice
                | Severity::UserDeprecated
        )
    }
}

impl From<Severity> for u32 {
    fn from(severity: Severity) -> Self {
        severity.code()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Severity::from_label(&label)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown severity: {}", label)))
    }
}

/// Resolves a display label for any severity code.
///
/// Known codes map to their table label; anything else falls back to the
/// decimal code itself, so the lookup never fails.
pub fn severity_label(code: u32) -> Cow<'static, str> {
    match Severity::from_code(code) {
        Some(severity) => Cow::Borrowed(severity.label()),
        None => Cow::Owned(code.to_string()),
    }
}
