//! Test-only hooks for observing resource teardown.

use std::cell::RefCell;

thread_local! {
    static RELEASES: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

/// Record that a resource named `what` was torn down on this thread.
pub(crate) fn record_release(what: &'static str) {
    RELEASES.with(|log| log.borrow_mut().push(what));
}

/// Drain and return the releases recorded on this thread so far.
pub(crate) fn take_releases() -> Vec<&'static str> {
    RELEASES.with(|log| std::mem::take(&mut *log.borrow_mut()))
}
