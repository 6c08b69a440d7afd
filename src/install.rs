//! Process-wide installation of a single active filter.
//!
//! Hosts call [`install`] from their start-up hook. The first call wins and
//! every later call returns the filter that is already active, so invoking
//! it from several lifecycle hooks is harmless.

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::triage::{ConditionHandler, Registration, TriageFilter};

static ACTIVE: OnceLock<Arc<TriageFilter>> = OnceLock::new();

/// Installs `filter` as the process-wide filter and registers it.
///
/// If a filter is already active, `filter` is dropped and the active one is
/// returned unchanged.
pub fn install(
    filter: TriageFilter,
    previous: Option<Arc<dyn ConditionHandler>>,
) -> Arc<TriageFilter> {
    let active = Arc::clone(ACTIVE.get_or_init(|| Arc::new(filter)));
    if active.register(previous) == Registration::AlreadyRegistered {
        debug!("triage filter already installed for this process");
    }
    active
}

/// Returns the process-wide filter, if one has been installed.
pub fn active() -> Option<Arc<TriageFilter>> {
    ACTIVE.get().cloned()
}
