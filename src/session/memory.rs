//! In-memory session store.

use arc_swap::ArcSwapOption;
use std::sync::Arc;

use super::{Session, SessionStore};

/// Session held in memory behind an atomically swapped pointer.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: ArcSwapOption<Session>,
}

impl MemorySessionStore {
    /// Create an empty (logged out) store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding a session.
    pub fn with_session(session: Session) -> Self {
        Self {
            inner: ArcSwapOption::from_pointee(session),
        }
    }

    /// Compare-and-swap on the token: store `new` if `expected` is current.
    fn swap_if(&self, expected: &str, new: Option<Arc<Session>>) -> bool {
        loop {
            let current = self.inner.load();
            let matches = Option::as_ref(&*current).is_some_and(|s| s.token == expected);
            if !matches {
                return false;
            }
            let previous = self.inner.compare_and_swap(&current, new.clone());
            if Option::as_ref(&*previous).map(Arc::as_ptr) == Option::as_ref(&*current).map(Arc::as_ptr) {
                return true;
            }
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn current(&self) -> Option<Session> {
        self.inner.load_full().map(|s| Session::clone(&s))
    }

    fn replace(&self, session: Session) {
        self.inner.store(Some(Arc::new(session)));
    }

    fn clear(&self) {
        self.inner.store(None);
    }

    fn replace_if_current(&self, expected: &str, session: Session) -> bool {
        self.swap_if(expected, Some(Arc::new(session)))
    }

    fn clear_if_current(&self, expected: &str) -> bool {
        self.swap_if(expected, None)
    }
}
