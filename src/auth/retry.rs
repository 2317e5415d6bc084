//! One-shot refresh-and-replay budget.

/// Per-request permission to run the refresh-and-replay path.
///
/// Each outbound call owns one. `claim` succeeds at most once, so a request
/// is replayed at most once no matter how many 401s it collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRetry {
    available: bool,
}

impl AuthRetry {
    /// A fresh budget: one refresh-and-replay allowed.
    pub fn once() -> Self {
        Self { available: true }
    }

    /// An exhausted budget: auth failures go straight to the caller.
    pub fn spent() -> Self {
        Self { available: false }
    }

    /// Take the single retry. Returns `false` if it was already taken.
    pub fn claim(&mut self) -> bool {
        std::mem::replace(&mut self.available, false)
    }

    pub fn is_spent(&self) -> bool {
        !self.available
    }
}

impl Default for AuthRetry {
    fn default() -> Self {
        Self::once()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_once() {
        let mut retry = AuthRetry::once();
        assert!(!retry.is_spent());
        assert!(retry.claim());
        assert!(retry.is_spent());
        assert!(!retry.claim());
        assert!(!retry.claim());
    }

    #[test]
    fn test_spent_never_claims() {
        let mut retry = AuthRetry::spent();
        assert!(!retry.claim());
    }

    #[test]
    fn test_copies_are_independent() {
        let template = AuthRetry::once();
        let mut first = template;
        let mut second = template;
        assert!(first.claim());
        assert!(second.claim());
    }
}
