//! Cache entry with expiry and access tracking

use crate::lfu::buckets::BucketId;
use std::time::Instant;

/// A value held by the LFU engine together with its bookkeeping
#[derive(Debug, Clone)]
pub struct LfuEntry<V> {
    /// The cached value
    pub value: V,

    /// When the entry expires; `None` never expires
    pub expires_at: Option<Instant>,

    /// Last time the entry was read or written
    pub accessed_at: Instant,

    /// Bucket currently holding the entry's key
    pub(crate) bucket: Option<BucketId>,
}

impl<V> LfuEntry<V> {
    /// Create an entry, accessed at `now`, that is not yet in any frequency bucket
    pub fn new(value: V, expires_at: Option<Instant>, now: Instant) -> Self {
        Self {
            value,
            expires_at,
            accessed_at: now,
            bucket: None,
        }
    }

    /// Check if the entry has expired as of `now`
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// True if nobody touched the entry since `cutoff`
    pub fn is_stale_since(&self, cutoff: Instant) -> bool {
        self.accessed_at < cutoff
    }

    /// Record a read or write at `now`
    pub fn mark_accessed_at(&mut self, now: Instant) {
        self.accessed_at = now;
    }

    /// Replace the value and expiry in place
    pub fn update(&mut self, value: V, expires_at: Option<Instant>) {
        self.value = value;
        self.expires_at = expires_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_entry_without_expiry_never_expires() {
        let now = Instant::now();
        let entry = LfuEntry::new("value", None, now);
        assert!(!entry.is_expired_at(now + Duration::from_secs(86_400)));
        assert!(entry.bucket.is_none());
    }

    #[test]
    fn test_entry_expiration() {
        let now = Instant::now();
        let expiry = now + Duration::from_millis(50);
        let entry = LfuEntry::new("value", Some(expiry), now);

        assert!(!entry.is_expired_at(now));
        assert!(entry.is_expired_at(expiry));
        assert!(entry.is_expired_at(expiry + Duration::from_millis(1)));
    }

    #[test]
    fn test_mark_accessed_at() {
        let start = Instant::now();
        let mut entry = LfuEntry::new("value", None, start);

        let later = start + Duration::from_millis(10);
        entry.mark_accessed_at(later);

        assert_eq!(entry.accessed_at, later);
        assert!(!entry.is_stale_since(later));
    }

    #[test]
    fn test_staleness() {
        let start = Instant::now();
        let entry = LfuEntry::new("value", None, start);

        assert!(entry.is_stale_since(start + Duration::from_millis(10)));
        assert!(!entry.is_stale_since(start));
    }

    #[test]
    fn test_update() {
        let now = Instant::now();
        let mut entry = LfuEntry::new("old", None, now);
        let expiry = now + Duration::from_secs(10);
        entry.update("new", Some(expiry));

        assert_eq!(entry.value, "new");
        assert_eq!(entry.expires_at, Some(expiry));
    }
}
