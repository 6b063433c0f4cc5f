//! SM-2 spaced-repetition queue for missed kanji.
//!
//! Records persist as a JSON array under the original `krb_review_queue` key;
//! the serde field names (`eFactor`, `nextReviewAt`) keep old browser saves
//! readable. Corrupt persisted state degrades to an empty queue with a logged
//! warning. Every mutating operation is a single synchronous
//! read-modify-write step followed by a save, so concurrent flows (battle
//! misses and the review drill) cannot interleave mid-update.

use serde::{Deserialize, Serialize};

use crate::store::KvStore;

pub const STORAGE_KEY: &str = "krb_review_queue";

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
/// SM-2 ease factor floor.
const MIN_EASE: f64 = 1.3;
const INITIAL_EASE: f64 = 2.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: String,
    pub repetition: u32,
    /// Days until the next review.
    pub interval: u32,
    #[serde(rename = "eFactor")]
    pub ease_factor: f64,
    #[serde(rename = "nextReviewAt")]
    pub next_review_at: i64,
}

/// The review queue plus its backing store.
pub struct ReviewScheduler {
    store: Box<dyn KvStore>,
    items: Vec<ReviewRecord>,
}

impl ReviewScheduler {
    /// Loads the persisted queue. Non-array payloads and malformed entries
    /// are discarded (a top-level parse failure empties the whole queue; a
    /// bad element is skipped individually, matching the defensive filtering
    /// of the original).
    pub fn open(store: Box<dyn KvStore>) -> Self {
        let items = match store.get(STORAGE_KEY) {
            Some(raw) => match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
                Ok(values) => values
                    .into_iter()
                    .filter_map(|v| match serde_json::from_value::<ReviewRecord>(v) {
                        Ok(rec) => Some(rec),
                        Err(err) => {
                            log::warn!("skipping malformed review entry: {err}");
                            None
                        }
                    })
                    .collect(),
                Err(err) => {
                    log::warn!("review queue is corrupt, starting empty: {err}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        Self { store, items }
    }

    fn save(&mut self) {
        match serde_json::to_string(&self.items) {
            Ok(raw) => self.store.set(STORAGE_KEY, &raw),
            Err(err) => log::warn!("failed to serialize review queue: {err}"),
        }
    }

    /// SM-2 ease factor update. Quality is clamped to 0..=5.
    fn calc_ease(old: f64, quality: i32) -> f64 {
        let q = f64::from(quality.clamp(0, 5));
        let updated = old + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
        updated.max(MIN_EASE)
    }

    /// Registers a kanji for review. Idempotent: an existing record is left
    /// untouched. Fresh records are due immediately.
    pub fn add(&mut self, id: &str, now: i64) {
        if self.items.iter().any(|i| i.id == id) {
            return;
        }
        self.items.push(ReviewRecord {
            id: id.to_string(),
            repetition: 0,
            interval: 0,
            ease_factor: INITIAL_EASE,
            next_review_at: now,
        });
        self.save();
    }

    /// Applies one review result. Quality below 3 is a failed recall: the
    /// repetition streak resets and the item comes back tomorrow. The ease
    /// factor is recomputed on both branches (floor 1.3).
    pub fn update_review(&mut self, id: &str, quality: i32, now: i64) {
        let Some(entry) = self.items.iter_mut().find(|i| i.id == id) else {
            return;
        };
        if quality < 3 {
            entry.repetition = 0;
            entry.interval = 1;
        } else {
            entry.repetition += 1;
            entry.interval = match entry.repetition {
                1 => 1,
                2 => 6,
                _ => (f64::from(entry.interval) * entry.ease_factor).round() as u32,
            };
        }
        entry.ease_factor = Self::calc_ease(entry.ease_factor, quality);
        entry.next_review_at = now + i64::from(entry.interval) * MS_PER_DAY;
        self.save();
    }

    /// Records whose review time has arrived.
    pub fn due(&self, now: i64) -> Vec<&ReviewRecord> {
        self.items.iter().filter(|i| i.next_review_at <= now).collect()
    }

    /// Pops up to `n` due record ids, removing them from the queue.
    /// At-most-once delivery: a popped id only comes back if the caller
    /// re-registers it via `add` or `update_review`.
    pub fn pop_batch(&mut self, n: usize, now: i64) -> Vec<String> {
        let ids: Vec<String> = self
            .due(now)
            .into_iter()
            .take(n)
            .map(|r| r.id.clone())
            .collect();
        self.items.retain(|i| !ids.contains(&i.id));
        self.save();
        ids
    }

    /// Count of currently-due records (not total records).
    pub fn size(&self, now: i64) -> usize {
        self.due(now).len()
    }

    pub fn record(&self, id: &str) -> Option<&ReviewRecord> {
        self.items.iter().find(|i| i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn scheduler() -> ReviewScheduler {
        ReviewScheduler::open(Box::new(MemoryStore::new()))
    }

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn add_is_idempotent_and_immediately_due() {
        let mut q = scheduler();
        q.add("k1", NOW);
        q.add("k1", NOW);
        assert_eq!(q.size(NOW), 1);
        let rec = q.record("k1").unwrap();
        assert_eq!(rec.repetition, 0);
        assert_eq!(rec.interval, 0);
        assert!((rec.ease_factor - 2.5).abs() < 1e-9);
        assert_eq!(rec.next_review_at, NOW);
    }

    #[test]
    fn failed_recall_resets_to_one_day() {
        let mut q = scheduler();
        q.add("k1", NOW);
        q.update_review("k1", 5, NOW);
        q.update_review("k1", 5, NOW);
        q.update_review("k1", 1, NOW);
        let rec = q.record("k1").unwrap();
        assert_eq!(rec.repetition, 0);
        assert_eq!(rec.interval, 1);
        assert_eq!(rec.next_review_at, NOW + 24 * 60 * 60 * 1000);
    }

    #[test]
    fn successful_intervals_follow_sm2_steps() {
        let mut q = scheduler();
        q.add("k1", NOW);
        q.update_review("k1", 4, NOW);
        assert_eq!(q.record("k1").unwrap().interval, 1);
        q.update_review("k1", 4, NOW);
        assert_eq!(q.record("k1").unwrap().interval, 6);
        q.update_review("k1", 4, NOW);
        // Third repetition: round(6 * ef) with ef still >= 1.3.
        assert!(q.record("k1").unwrap().interval >= 6);
    }

    #[test]
    fn interval_is_monotone_across_successful_reviews() {
        let mut q = scheduler();
        q.add("k1", NOW);
        let mut last = 0u32;
        for _ in 0..8 {
            q.update_review("k1", 5, NOW);
            let interval = q.record("k1").unwrap().interval;
            assert!(interval >= last);
            last = interval;
        }
    }

    #[test]
    fn ease_factor_never_drops_below_floor() {
        let mut q = scheduler();
        q.add("k1", NOW);
        for _ in 0..50 {
            q.update_review("k1", 0, NOW);
        }
        assert!(q.record("k1").unwrap().ease_factor >= 1.3);
    }

    #[test]
    fn ease_factor_updates_even_on_failed_recall() {
        let mut q = scheduler();
        q.add("k1", NOW);
        q.update_review("k1", 0, NOW);
        let ef = q.record("k1").unwrap().ease_factor;
        assert!(ef < 2.5, "failure must lower the ease factor, got {ef}");
    }

    #[test]
    fn update_review_on_unknown_id_is_a_no_op() {
        let mut q = scheduler();
        q.update_review("ghost", 5, NOW);
        assert_eq!(q.size(NOW), 0);
    }

    #[test]
    fn pop_batch_removes_and_respects_limit() {
        let mut q = scheduler();
        for i in 0..7 {
            q.add(&format!("k{i}"), NOW);
        }
        let first = q.pop_batch(5, NOW);
        assert_eq!(first.len(), 5);
        let second = q.pop_batch(5, NOW);
        assert_eq!(second.len(), 2);
        assert!(q.pop_batch(5, NOW).is_empty());
    }

    #[test]
    fn future_items_are_not_due() {
        let mut q = scheduler();
        q.add("k1", NOW);
        q.update_review("k1", 5, NOW);
        // Next review is a day out.
        assert_eq!(q.size(NOW), 0);
        assert_eq!(q.size(NOW + 24 * 60 * 60 * 1000), 1);
    }

    #[test]
    fn corrupt_store_degrades_to_empty_queue() {
        let mut store = MemoryStore::new();
        use crate::store::KvStore;
        store.set(STORAGE_KEY, "{\"not\": \"an array\"}");
        let q = ReviewScheduler::open(Box::new(store));
        assert_eq!(q.size(NOW), 0);
    }

    #[test]
    fn malformed_entries_are_skipped_individually() {
        let mut store = MemoryStore::new();
        use crate::store::KvStore;
        store.set(
            STORAGE_KEY,
            "[{\"id\":\"k1\",\"repetition\":0,\"interval\":0,\"eFactor\":2.5,\"nextReviewAt\":0},null,42]",
        );
        let q = ReviewScheduler::open(Box::new(store));
        assert_eq!(q.size(NOW), 1);
    }

    #[test]
    fn queue_persists_across_reopen() {
        let mut q = scheduler();
        q.add("k1", NOW);
        q.update_review("k1", 5, NOW);
        // Rebuild a scheduler over the same serialized payload.
        let raw = serde_json::to_string(&q.items).unwrap();
        let mut store = MemoryStore::new();
        use crate::store::KvStore;
        store.set(STORAGE_KEY, &raw);
        let reopened = ReviewScheduler::open(Box::new(store));
        let rec = reopened.record("k1").unwrap();
        assert_eq!(rec.repetition, 1);
        assert_eq!(rec.interval, 1);
    }
}
