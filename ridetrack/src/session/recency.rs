//! Monotonic request tokens for last-request-wins reconciliation.

/// Identifies one issued request. Later requests have larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Issues tokens and tells whether a response is still wanted.
///
/// Responses are accepted only if their token is the latest issued,
/// regardless of the order in which they arrive.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token, superseding every earlier one.
    pub fn next(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }

    /// Make every outstanding token stale without issuing a new request.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_is_current() {
        let mut seq = RequestSequencer::new();
        let q1 = seq.next();
        let q2 = seq.next();

        assert!(q2 > q1);
        assert!(!seq.is_current(q1));
        assert!(seq.is_current(q2));
    }

    #[test]
    fn test_invalidate() {
        let mut seq = RequestSequencer::new();
        let q = seq.next();
        seq.invalidate();
        assert!(!seq.is_current(q));
        let fresh = seq.next();
        assert!(seq.is_current(fresh));
    }
}
