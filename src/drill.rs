//! Between-stage review drill: replays a small batch of due SM-2 items as
//! plain reading questions, outside of combat.

use crate::model::KanjiEntry;
use crate::reading;
use crate::review::ReviewScheduler;

/// Cards per drill round.
pub const DRILL_BATCH_SIZE: usize = 5;

const QUALITY_WRONG: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrillAnswer {
    pub correct: bool,
    /// Cards left after this one, including none for a finished round.
    pub remaining: usize,
}

/// One round of review questions popped from the scheduler.
///
/// Popped ids with no matching kanji in the lookup pool are dropped up front
/// with a warning (stale queue entries from an older dataset), so `current`
/// always refers to a presentable card.
pub struct ReviewDrill {
    cards: Vec<KanjiEntry>,
    position: usize,
    correct: u32,
    wrong: u32,
}

impl ReviewDrill {
    /// Pops up to [`DRILL_BATCH_SIZE`] due items and resolves them against
    /// `pool`. An empty drill (nothing due) is valid; callers check
    /// [`is_finished`](Self::is_finished).
    pub fn start(pool: &[KanjiEntry], review: &mut ReviewScheduler, now: i64) -> Self {
        let cards = review
            .pop_batch(DRILL_BATCH_SIZE, now)
            .into_iter()
            .filter_map(|id| match pool.iter().find(|k| k.id == id) {
                Some(k) => Some(k.clone()),
                None => {
                    log::warn!("review id {id} has no kanji data, dropping");
                    None
                }
            })
            .collect();
        Self {
            cards,
            position: 0,
            correct: 0,
            wrong: 0,
        }
    }

    pub fn current(&self) -> Option<&KanjiEntry> {
        self.cards.get(self.position)
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.cards.len()
    }

    /// Cards not yet answered, including the current one.
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.position
    }

    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    pub fn wrong_count(&self) -> u32 {
        self.wrong
    }

    /// Grades the current card. Popping the batch already removed the records,
    /// so a passed card simply stays gone, while a missed one is re-registered
    /// and reviewed at quality 1 (due again tomorrow, ease factor lowered).
    /// Returns `None` when the round is already finished.
    pub fn answer(
        &mut self,
        review: &mut ReviewScheduler,
        input: &str,
        now: i64,
    ) -> Option<DrillAnswer> {
        let kanji = self.cards.get(self.position)?;
        let answer = reading::normalize(input);
        let correct =
            !answer.is_empty() && reading::reading_set(kanji).contains(&answer.as_str());
        if correct {
            self.correct += 1;
        } else {
            let id = kanji.id.clone();
            review.add(&id, now);
            review.update_review(&id, QUALITY_WRONG, now);
            self.wrong += 1;
        }
        self.position += 1;
        Some(DrillAnswer {
            correct,
            remaining: self.cards.len() - self.position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const NOW: i64 = 1_700_000_000_000;
    const DAY: i64 = 24 * 60 * 60 * 1000;

    fn pool() -> Vec<KanjiEntry> {
        crate::GRADE1_KANJI
            .iter()
            .map(KanjiEntry::from_row)
            .collect()
    }

    fn scheduler_with(ids: &[&str]) -> ReviewScheduler {
        let mut q = ReviewScheduler::open(Box::new(MemoryStore::new()));
        for id in ids {
            q.add(id, NOW);
        }
        q
    }

    #[test]
    fn drill_pops_at_most_a_batch() {
        let pool = pool();
        let ids: Vec<&str> = pool.iter().take(7).map(|k| k.id.as_str()).collect();
        let mut review = scheduler_with(&ids);
        let drill = ReviewDrill::start(&pool, &mut review, NOW);
        assert_eq!(drill.cards.len(), DRILL_BATCH_SIZE);
        // The two overflow items stay queued for the next round.
        assert_eq!(review.size(NOW), 2);
    }

    #[test]
    fn empty_queue_yields_a_finished_drill() {
        let pool = pool();
        let mut review = scheduler_with(&[]);
        let drill = ReviewDrill::start(&pool, &mut review, NOW);
        assert!(drill.is_finished());
        assert!(drill.current().is_none());
    }

    #[test]
    fn correct_answer_clears_the_item_from_the_queue() {
        let pool = pool();
        let mut review = scheduler_with(&["g1-yama"]);
        let mut drill = ReviewDrill::start(&pool, &mut review, NOW);
        let result = drill.answer(&mut review, "やま", NOW).unwrap();
        assert!(result.correct);
        assert_eq!(result.remaining, 0);
        assert!(drill.is_finished());
        assert!(review.record("g1-yama").is_none());
    }

    #[test]
    fn wrong_answer_requeues_for_tomorrow() {
        let pool = pool();
        let mut review = scheduler_with(&["g1-yama"]);
        let mut drill = ReviewDrill::start(&pool, &mut review, NOW);
        let result = drill.answer(&mut review, "うみ", NOW).unwrap();
        assert!(!result.correct);
        let rec = review.record("g1-yama").unwrap();
        assert_eq!(rec.interval, 1);
        assert_eq!(rec.next_review_at, NOW + DAY);
        assert!(rec.ease_factor < 2.5);
    }

    #[test]
    fn onyomi_answers_count_too() {
        let pool = pool();
        let mut review = scheduler_with(&["g1-mizu"]);
        let mut drill = ReviewDrill::start(&pool, &mut review, NOW);
        // 水 answered with the (katakana) onyomi; normalization handles it.
        let result = drill.answer(&mut review, "スイ", NOW).unwrap();
        assert!(result.correct);
    }

    #[test]
    fn unknown_ids_are_dropped_from_the_round() {
        let pool = pool();
        let mut review = scheduler_with(&["g1-yama", "ghost-id"]);
        let drill = ReviewDrill::start(&pool, &mut review, NOW);
        assert_eq!(drill.cards.len(), 1);
        assert_eq!(drill.cards[0].id, "g1-yama");
    }

    #[test]
    fn answering_past_the_end_is_a_no_op() {
        let pool = pool();
        let mut review = scheduler_with(&["g1-yama"]);
        let mut drill = ReviewDrill::start(&pool, &mut review, NOW);
        drill.answer(&mut review, "やま", NOW).unwrap();
        assert!(drill.answer(&mut review, "やま", NOW).is_none());
        assert_eq!(drill.correct_count(), 1);
        assert_eq!(drill.wrong_count(), 0);
    }
}
