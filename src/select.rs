//! Question selection: biased toward the current enemy's weakness so players
//! get to practice the reading type that actually deals bonus damage, while a
//! small FIFO of recent ids keeps prompts from repeating back-to-back.

use crate::model::{KanjiEntry, ReadingKind, StageDataError};
use crate::rng::SimpleRng;

/// How many recently-asked kanji are excluded from selection.
pub const RECENT_BUFFER_SIZE: usize = 5;

/// Pool indices partitioned by reading capability, computed once per stage.
pub struct PartitionedPools {
    pub onyomi: Vec<usize>,
    pub kunyomi: Vec<usize>,
}

pub fn partition_pools(pool: &[KanjiEntry]) -> PartitionedPools {
    PartitionedPools {
        onyomi: pool
            .iter()
            .enumerate()
            .filter(|(_, k)| k.has_reading(ReadingKind::Onyomi))
            .map(|(i, _)| i)
            .collect(),
        kunyomi: pool
            .iter()
            .enumerate()
            .filter(|(_, k)| k.has_reading(ReadingKind::Kunyomi))
            .map(|(i, _)| i)
            .collect(),
    }
}

/// Picks from one candidate pool, avoiding recent ids; when every candidate
/// is recent the recency rule is dropped rather than failing.
fn pick_from_pool(
    pool: &[KanjiEntry],
    candidates: &[usize],
    recent: &[String],
    rng: &mut SimpleRng,
) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }
    let fresh: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&i| !recent.iter().any(|r| *r == pool[i].id))
        .collect();
    let chosen = if fresh.is_empty() {
        log::debug!("all candidates recently asked, relaxing recency filter");
        candidates[rng.range_usize(candidates.len())]
    } else {
        fresh[rng.range_usize(fresh.len())]
    };
    Some(chosen)
}

/// Chooses the next kanji to quiz.
///
/// Order: weakness-side pool under the recency rule, then the complementary
/// pool, then the full stage pool as a last resort — a question is always
/// produced for a non-empty pool. The chosen id is pushed onto `recent` with
/// FIFO eviction at [`RECENT_BUFFER_SIZE`].
pub fn pick_next(
    pool: &[KanjiEntry],
    pools: &PartitionedPools,
    weakness: ReadingKind,
    recent: &mut Vec<String>,
    rng: &mut SimpleRng,
) -> Result<usize, StageDataError> {
    if pool.is_empty() {
        return Err(StageDataError::EmptyKanjiPool(String::new()));
    }
    let (primary, fallback) = match weakness {
        ReadingKind::Onyomi => (&pools.onyomi, &pools.kunyomi),
        ReadingKind::Kunyomi => (&pools.kunyomi, &pools.onyomi),
    };
    let all: Vec<usize> = (0..pool.len()).collect();
    let chosen = pick_from_pool(pool, primary, recent, rng)
        .or_else(|| {
            log::debug!("primary pool exhausted, trying fallback reading type");
            pick_from_pool(pool, fallback, recent, rng)
        })
        .or_else(|| pick_from_pool(pool, &all, recent, rng));
    // The full-pool branch cannot miss for a non-empty pool.
    let idx = chosen.unwrap_or(0);
    recent.push(pool[idx].id.clone());
    if recent.len() > RECENT_BUFFER_SIZE {
        recent.remove(0);
    }
    Ok(idx)
}
