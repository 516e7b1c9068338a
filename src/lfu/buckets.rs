//! Frequency bucket list
//!
//! Buckets live in an arena and are linked by index in ascending frequency
//! order. Each key sits in exactly one bucket; moving a key to the next
//! frequency touches only its current bucket and that bucket's successor,
//! so promotion is O(1). A bucket is unlinked and its slot recycled the
//! moment its member set becomes empty.

use std::collections::HashSet;
use std::hash::Hash;

/// Stable handle to a bucket slot in the arena
pub type BucketId = usize;

#[derive(Debug)]
struct Bucket<K> {
    freq: u64,
    members: HashSet<K>,
    prev: Option<BucketId>,
    next: Option<BucketId>,
}

/// Ascending list of frequency buckets
#[derive(Debug)]
pub struct FrequencyBuckets<K> {
    slots: Vec<Option<Bucket<K>>>,
    free: Vec<BucketId>,
    head: Option<BucketId>,
    live: usize,
}

impl<K: Eq + Hash + Clone> FrequencyBuckets<K> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            live: 0,
        }
    }

    /// Number of live buckets
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Frequency of a live bucket
    pub fn frequency(&self, id: BucketId) -> Option<u64> {
        self.bucket(id).map(|b| b.freq)
    }

    /// Move `key` one frequency step up.
    ///
    /// `current` is the bucket the key sits in, or `None` for a key that is
    /// not in any bucket yet (it lands at frequency 1). Returns the bucket
    /// now holding the key.
    pub fn promote(&mut self, key: &K, current: Option<BucketId>) -> BucketId {
        let (next_freq, candidate) = match current.and_then(|id| self.bucket(id)) {
            Some(bucket) => (bucket.freq + 1, bucket.next),
            None => (1, self.head),
        };

        let target = match candidate {
            Some(id) if self.frequency(id) == Some(next_freq) => id,
            _ => match current {
                Some(after) if self.bucket(after).is_some() => self.insert_after(after, next_freq),
                _ => self.push_front(next_freq),
            },
        };

        if let Some(bucket) = self.bucket_mut(target) {
            bucket.members.insert(key.clone());
        }
        if let Some(current) = current {
            self.remove(key, current);
        }
        target
    }

    /// Drop `key` from bucket `id`, unlinking the bucket if it empties
    pub fn remove(&mut self, key: &K, id: BucketId) {
        let emptied = match self.bucket_mut(id) {
            Some(bucket) => {
                bucket.members.remove(key);
                bucket.members.is_empty()
            }
            None => false,
        };
        if emptied {
            self.unlink(id);
        }
    }

    /// Remove up to `count` keys, lowest frequency first, unlinking every
    /// bucket that empties. Which keys go among equal frequencies is
    /// unspecified.
    ///
    /// Each bucket is visited once: a bucket that goes entirely has its
    /// member set moved out whole, and a partially trimmed one is scanned a
    /// single time.
    pub fn take_lowest(&mut self, count: usize) -> Vec<K> {
        let mut taken = Vec::new();
        while taken.len() < count {
            let Some(head) = self.head else {
                break;
            };
            let wanted = count - taken.len();
            let Some(bucket) = self.bucket_mut(head) else {
                break;
            };

            if bucket.members.len() <= wanted {
                taken.extend(std::mem::take(&mut bucket.members));
                self.unlink(head);
            } else {
                let picked: Vec<K> = bucket.members.iter().take(wanted).cloned().collect();
                for key in &picked {
                    bucket.members.remove(key);
                }
                taken.extend(picked);
            }
        }
        taken
    }

    /// Frequencies of all live buckets in list order
    pub fn frequencies(&self) -> Vec<u64> {
        let mut out = Vec::with_capacity(self.live);
        let mut cursor = self.head;
        while let Some(id) = cursor {
            match self.bucket(id) {
                Some(bucket) => {
                    out.push(bucket.freq);
                    cursor = bucket.next;
                }
                None => break,
            }
        }
        out
    }

    /// Total keys across all buckets
    pub fn member_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .map(|bucket| bucket.members.len())
            .sum()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.live = 0;
    }

    fn bucket(&self, id: BucketId) -> Option<&Bucket<K>> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    fn bucket_mut(&mut self, id: BucketId) -> Option<&mut Bucket<K>> {
        self.slots.get_mut(id).and_then(Option::as_mut)
    }

    fn allocate(&mut self, bucket: Bucket<K>) -> BucketId {
        self.live += 1;
        match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(bucket);
                id
            }
            None => {
                self.slots.push(Some(bucket));
                self.slots.len() - 1
            }
        }
    }

    fn push_front(&mut self, freq: u64) -> BucketId {
        let old_head = self.head;
        let id = self.allocate(Bucket {
            freq,
            members: HashSet::new(),
            prev: None,
            next: old_head,
        });
        if let Some(old) = old_head.and_then(|h| self.bucket_mut(h)) {
            old.prev = Some(id);
        }
        self.head = Some(id);
        id
    }

    fn insert_after(&mut self, after: BucketId, freq: u64) -> BucketId {
        let next = self.bucket(after).and_then(|b| b.next);
        let id = self.allocate(Bucket {
            freq,
            members: HashSet::new(),
            prev: Some(after),
            next,
        });
        if let Some(bucket) = self.bucket_mut(after) {
            bucket.next = Some(id);
        }
        if let Some(bucket) = next.and_then(|n| self.bucket_mut(n)) {
            bucket.prev = Some(id);
        }
        id
    }

    fn unlink(&mut self, id: BucketId) {
        let Some(bucket) = self.slots.get_mut(id).and_then(Option::take) else {
            return;
        };
        match bucket.prev {
            Some(prev) => {
                if let Some(p) = self.bucket_mut(prev) {
                    p.next = bucket.next;
                }
            }
            None => self.head = bucket.next,
        }
        if let Some(n) = bucket.next.and_then(|n| self.bucket_mut(n)) {
            n.prev = bucket.prev;
        }
        self.free.push(id);
        self.live -= 1;
    }
}

impl<K: Eq + Hash + Clone> Default for FrequencyBuckets<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn test_new_key_lands_at_frequency_one() {
        let mut buckets = FrequencyBuckets::new();
        let id = buckets.promote(&key("a"), None);

        assert_eq!(buckets.frequency(id), Some(1));
        assert_eq!(buckets.frequencies(), vec![1]);
        assert_eq!(buckets.len(), 1);
    }

    #[test]
    fn test_promote_reuses_existing_next_bucket() {
        let mut buckets = FrequencyBuckets::new();
        let a = buckets.promote(&key("a"), None);
        let b = buckets.promote(&key("b"), None);
        assert_eq!(a, b);

        let a2 = buckets.promote(&key("a"), Some(a));
        let b2 = buckets.promote(&key("b"), Some(b));

        assert_eq!(a2, b2);
        assert_eq!(buckets.frequencies(), vec![2]);
        assert_eq!(buckets.member_count(), 2);
    }

    #[test]
    fn test_empty_bucket_is_unlinked() {
        let mut buckets = FrequencyBuckets::new();
        let a = buckets.promote(&key("a"), None);
        let a = buckets.promote(&key("a"), Some(a));
        let _ = buckets.promote(&key("a"), Some(a));

        assert_eq!(buckets.frequencies(), vec![3]);
        assert_eq!(buckets.len(), 1);
    }

    #[test]
    fn test_new_bucket_spliced_between_neighbours() {
        let mut buckets = FrequencyBuckets::new();
        // a at 3, b at 1, c at 1
        let mut a = buckets.promote(&key("a"), None);
        a = buckets.promote(&key("a"), Some(a));
        buckets.promote(&key("a"), Some(a));
        let b = buckets.promote(&key("b"), None);
        buckets.promote(&key("c"), None);
        assert_eq!(buckets.frequencies(), vec![1, 3]);

        // b moves to 2, which must sit between 1 and 3
        buckets.promote(&key("b"), Some(b));
        assert_eq!(buckets.frequencies(), vec![1, 2, 3]);
    }

    #[test]
    fn test_frequency_one_pushed_in_front() {
        let mut buckets = FrequencyBuckets::new();
        let a = buckets.promote(&key("a"), None);
        buckets.promote(&key("a"), Some(a));
        assert_eq!(buckets.frequencies(), vec![2]);

        buckets.promote(&key("b"), None);
        assert_eq!(buckets.frequencies(), vec![1, 2]);
    }

    #[test]
    fn test_take_lowest_walks_up_the_list() {
        let mut buckets = FrequencyBuckets::new();
        let a = buckets.promote(&key("a"), None);
        buckets.promote(&key("a"), Some(a));
        buckets.promote(&key("b"), None);
        buckets.promote(&key("c"), None);

        let mut taken = buckets.take_lowest(2);
        taken.sort();
        assert_eq!(taken, vec![key("b"), key("c")]);
        assert_eq!(buckets.frequencies(), vec![2]);

        assert_eq!(buckets.take_lowest(5), vec![key("a")]);
        assert!(buckets.is_empty());
        assert!(buckets.take_lowest(1).is_empty());
    }

    #[test]
    fn test_take_lowest_trims_part_of_a_bucket() {
        let mut buckets = FrequencyBuckets::new();
        for i in 0..10 {
            buckets.promote(&i.to_string(), None);
        }

        assert_eq!(buckets.take_lowest(4).len(), 4);
        assert_eq!(buckets.member_count(), 6);
        assert_eq!(buckets.frequencies(), vec![1]);
        assert!(buckets.take_lowest(0).is_empty());
    }

    #[test]
    fn test_slots_are_recycled() {
        let mut buckets = FrequencyBuckets::new();
        let mut id = buckets.promote(&key("a"), None);
        for _ in 0..100 {
            id = buckets.promote(&key("a"), Some(id));
        }
        assert_eq!(buckets.len(), 1);
        assert!(buckets.slots.len() <= 2);
        assert_eq!(buckets.frequency(id), Some(101));
    }

    #[test]
    fn test_clear() {
        let mut buckets = FrequencyBuckets::new();
        buckets.promote(&key("a"), None);
        buckets.clear();
        assert!(buckets.is_empty());
        assert!(buckets.take_lowest(1).is_empty());
    }
}
