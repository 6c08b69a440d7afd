//! Reporting mask: the host's "is reporting currently silenced" state.
//!
//! The filter never caches the mask. It asks its [`MaskSource`] for the
//! current value on every classification, because the host may change the
//! mask between registration and any individual condition (for example
//! while running code under an error-suppression operator).

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::severity::Severity;

/// Bit mask of the severities the host currently reports.
///
/// A mask with no bits set means reporting is silenced and every
/// condition is ignored regardless of any rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReportingMask(pub u32);

impl ReportingMask {
    /// Reporting is silenced.
    pub const SILENCED: ReportingMask = ReportingMask(0);

    /// Every severity is reported.
    pub const ALL: ReportingMask = ReportingMask(Severity::All.code());

    /// Returns true when no bits are set.
    pub fn is_silenced(self) -> bool {
        self.0 == 0
    }

    /// Returns true when any bit of `code` is reported.
    pub fn reports(self, code: u32) -> bool {
        self.0 & code != 0
    }
}

impl Default for ReportingMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Accessor the host provides for reading the current mask.
pub trait MaskSource: Send + Sync {
    /// Returns the mask in effect right now.
    fn current(&self) -> ReportingMask;
}

impl MaskSource for ReportingMask {
    fn current(&self) -> ReportingMask {
        *self
    }
}

impl<F> MaskSource for F
where
    F: Fn() -> ReportingMask + Send + Sync,
{
    fn current(&self) -> ReportingMask {
        self()
    }
}

/// A mask shared between the host and the filter.
///
/// Clones observe the same underlying value.
#[derive(Debug, Clone)]
pub struct SharedMask {
    bits: Arc<AtomicU32>,
}

impl Default for SharedMask {
    fn default() -> Self {
        Self::new(ReportingMask::ALL)
    }
}

impl SharedMask {
    /// Creates a shared mask with the given initial value.
    pub fn new(mask: ReportingMask) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(mask.0)),
        }
    }

    /// Returns the current value.
    pub fn get(&self) -> ReportingMask {
        ReportingMask(self.bits.load(Ordering::Acquire))
    }

    /// Replaces the value and returns the previous one.
    pub fn set(&self, mask: ReportingMask) -> ReportingMask {
        ReportingMask(self.bits.swap(mask.0, Ordering::AcqRel))
    }

    /// Silences reporting until the returned guard is dropped.
    ///
    /// The previous mask is restored on drop, so nested guards unwind in
    /// order.
    pub fn silence(&self) -> SilenceGuard {
        let previous = self.set(ReportingMask::SILENCED);
        SilenceGuard {
            mask: self.clone(),
            previous,
        }
    }
}

impl MaskSource for SharedMask {
    fn current(&self) -> ReportingMask {
        self.get()
    }
}

/// Restores the previous mask when dropped.
#[derive(Debug)]
#[must_use = "reporting is restored as soon as the guard is dropped"]
pub struct SilenceGuard {
    mask: SharedMask,
    previous: ReportingMask,
}

impl Drop for SilenceGuard {
    fn drop(&mut self) {
        self.mask.set(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silenced_mask() {
        assert!(ReportingMask::SILENCED.is_silenced());
        assert!(!ReportingMask::ALL.is_silenced());
        assert!(!ReportingMask(Severity::Notice.code()).is_silenced());
    }

    #[test]
    fn test_reports() {
        let mask = ReportingMask(Severity::Error.code() | Severity::Warning.code());
        assert!(mask.reports(Severity::Error.code()));
        assert!(mask.reports(Severity::Warning.code()));
        assert!(!mask.reports(Severity::Notice.code()));
    }

    #[test]
    fn test_closure_source() {
        let source = || ReportingMask::SILENCED;
        assert!(source.current().is_silenced());
    }

    #[test]
    fn test_shared_mask_clones_share_state() {
        let mask = SharedMask::default();
        let other = mask.clone();

        mask.set(ReportingMask(Severity::Error.code()));
        assert_eq!(other.get(), ReportingMask(1));
    }

    #[test]
    fn test_silence_guard_restores_previous() {
        let mask = SharedMask::new(ReportingMask(Severity::Warning.code()));
        {
            let _guard = mask.silence();
            assert!(mask.current().is_silenced());
        }
        assert_eq!(mask.current(), ReportingMask(Severity::Warning.code()));
    }

    #[test]
    fn test_nested_silence_guards() {
        let mask = SharedMask::default();
        let outer = mask.silence();
        let inner = mask.silence();
        drop(inner);
        assert!(mask.current().is_silenced());
        drop(outer);
        assert_eq!(mask.current(), ReportingMask::ALL);
    }
}
