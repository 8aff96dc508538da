//! Log-once bookkeeping for query codes the dispatcher does not handle.
//!
//! The process-wide instance ([`unknown_queries`]) is created on first use and
//! lives until the process exits. It is never reset implicitly; in particular
//! unloading a module does not clear it. [`UnknownQueryLog::reset`] is the only
//! way back to a clean slate.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use tracing::warn;

static UNKNOWN_QUERIES: Lazy<UnknownQueryLog> = Lazy::new(UnknownQueryLog::new);

/// Process-wide log-once registry used by the query dispatcher.
#[must_use]
pub fn unknown_queries() -> &'static UnknownQueryLog
{
    &UNKNOWN_QUERIES
}

/// Set of raw query codes that have already been logged.
#[derive(Debug, Default)]
pub struct UnknownQueryLog
{
    seen: Mutex<HashSet<u32>>,
    emitted: AtomicUsize,
}

impl UnknownQueryLog
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Log `code` unless it was logged before. Returns `true` when a line was emitted.
    pub fn report(&self, code: u32, tag: &str) -> bool
    {
        // A poisoned lock still holds a valid set; keep using it.
        let mut seen = self.seen.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !seen.insert(code) {
            return false;
        }
        drop(seen);
        self.emitted.fetch_add(1, Ordering::Relaxed);
        warn!(query = code, node = tag, "unsupported type info query");
        true
    }

    /// Whether `code` has been logged already.
    #[must_use]
    pub fn has_warned(&self, code: u32) -> bool
    {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(&code)
    }

    /// Number of lines emitted since creation or the last [`reset`](Self::reset).
    #[must_use]
    pub fn emitted(&self) -> usize
    {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Forget every logged code.
    pub fn reset(&self)
    {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
        self.emitted.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_each_code_is_logged_once()
    {
        let log = UnknownQueryLog::new();
        assert!(log.report(19, "SymTagUDT"));
        assert!(!log.report(19, "SymTagEnum"));
        assert!(log.report(40, "SymTagUDT"));
        assert_eq!(log.emitted(), 2);
        assert!(log.has_warned(19));
        assert!(!log.has_warned(25));
    }

    #[test]
    fn test_reset_allows_logging_again()
    {
        let log = UnknownQueryLog::new();
        log.report(25, "SymTagData");
        log.reset();
        assert_eq!(log.emitted(), 0);
        assert!(log.report(25, "SymTagData"));
    }
}
