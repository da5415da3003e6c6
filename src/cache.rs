//! Bounded least-recently-used answer cache.
//!
//! Keys are normalized question text, values are final answers. Capacity
//! is small and fixed, so recency is a plain deque — front is most recent,
//! eviction pops the back. Both reads and writes count as use. No time
//! expiry; only capacity pressure evicts.

use std::collections::VecDeque;

/// Maximum number of cached answers.
pub const CACHE_CAPACITY: usize = 10;

pub struct AnswerCache {
    entries: VecDeque<(String, String)>,
    capacity: usize,
}

impl AnswerCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Look up an answer, refreshing the key's recency on a hit.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        let entry = self.entries.remove(pos).unwrap();
        let answer = entry.1.clone();
        self.entries.push_front(entry);
        Some(answer)
    }

    /// Insert or replace, evicting the least-recently-used entry when full.
    pub fn put(&mut self, key: String, answer: String) {
        if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
            self.entries.remove(pos);
        } else if self.entries.len() >= self.capacity {
            if let Some((evicted, _)) = self.entries.pop_back() {
                log::debug!("[CACHE] evicted LRU entry ({} chars)", evicted.len());
            }
        }
        self.entries.push_front((key, answer));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AnswerCache {
    fn default() -> Self {
        Self::new(CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_the_ten_most_recent_of_many_inserts() {
        let mut cache = AnswerCache::default();
        for i in 0..25 {
            cache.put(format!("question {}", i), format!("answer {}", i));
        }
        assert_eq!(cache.len(), 10);
        for i in 0..15 {
            assert!(cache.get(&format!("question {}", i)).is_none());
        }
        for i in 15..25 {
            assert_eq!(cache.get(&format!("question {}", i)).unwrap(), format!("answer {}", i));
        }
    }

    #[test]
    fn get_refreshes_recency() {
        let mut cache = AnswerCache::new(2);
        cache.put("a".into(), "1".into());
        cache.put("b".into(), "2".into());
        // Touch "a" so "b" becomes the LRU entry.
        assert_eq!(cache.get("a").unwrap(), "1");
        cache.put("c".into(), "3".into());
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn put_replaces_existing_key_without_growth() {
        let mut cache = AnswerCache::new(2);
        cache.put("a".into(), "1".into());
        cache.put("a".into(), "updated".into());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").unwrap(), "updated");
    }

    #[test]
    fn miss_returns_none() {
        let mut cache = AnswerCache::default();
        assert!(cache.get("never seen").is_none());
        assert!(cache.is_empty());
    }
}
