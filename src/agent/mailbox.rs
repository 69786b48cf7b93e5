//! Single-slot mailbox for manually injected trends.

use parking_lot::Mutex;

/// Holds at most one pending trend. A later `put` replaces an unconsumed one;
/// `take` empties the slot atomically, so each injected trend is consumed at
/// most once.
#[derive(Debug, Default)]
pub struct TrendMailbox {
    slot: Mutex<Option<String>>,
}

impl TrendMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `trend`, returning the unconsumed trend it displaced, if any.
    pub fn put(&self, trend: impl Into<String>) -> Option<String> {
        self.slot.lock().replace(trend.into())
    }

    /// Remove and return the pending trend.
    pub fn take(&self) -> Option<String> {
        self.slot.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_clears_slot() {
        let mailbox = TrendMailbox::new();
        assert!(mailbox.put("Mycelial Networks").is_none());
        assert_eq!(mailbox.take().as_deref(), Some("Mycelial Networks"));
        assert!(mailbox.take().is_none());
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let mailbox = TrendMailbox::new();
        mailbox.put("first");
        let displaced = mailbox.put("second");
        assert_eq!(displaced.as_deref(), Some("first"));
        assert_eq!(mailbox.take().as_deref(), Some("second"));
    }
}
