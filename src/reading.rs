//! Reading normalization and answer matching.
//!
//! Answers are compared in hiragana only: katakana input is shifted down by
//! 0x60 (U+30A1..=U+30F6 maps onto U+3041..=U+3096) and all whitespace is
//! stripped. No partial matches; exact string equality against the kanji's
//! reading set decides correctness.

use crate::model::{KanjiEntry, ReadingKind};

/// Katakana block that maps 1:1 onto hiragana by a fixed code point offset.
const KATA_FIRST: char = '\u{30a1}';
const KATA_LAST: char = '\u{30f6}';
const KATA_TO_HIRA: u32 = 0x60;

fn to_hiragana_char(c: char) -> char {
    if (KATA_FIRST..=KATA_LAST).contains(&c) {
        // The offset stays inside the hiragana block, so the unwrap path of
        // from_u32 cannot be hit; fall back to the input char regardless.
        char::from_u32(c as u32 - KATA_TO_HIRA).unwrap_or(c)
    } else {
        c
    }
}

/// Strips all whitespace (ASCII and ideographic) and converts katakana to
/// hiragana. Idempotent.
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(to_hiragana_char)
        .collect()
}

/// The union of a kanji's onyomi and kunyomi readings, deduplicated.
/// Entries are already normalized at load time.
pub fn reading_set(kanji: &KanjiEntry) -> Vec<&str> {
    let mut set: Vec<&str> = Vec::new();
    for r in kanji.kunyomi.iter().chain(kanji.onyomi.iter()) {
        if !r.is_empty() && !set.contains(&r.as_str()) {
            set.push(r);
        }
    }
    set
}

/// True iff the normalized input is one of the kanji's valid readings.
pub fn is_correct(kanji: &KanjiEntry, input: &str) -> bool {
    let answer = normalize(input);
    !answer.is_empty() && reading_set(kanji).contains(&answer.as_str())
}

/// Classifies which reading family a (normalized, known-correct) answer used.
///
/// A reading that exists in both lists is ambiguous and resolves to the
/// enemy's declared weakness, so an ambiguous answer always counts as a
/// weakness hit.
pub fn answered_kind(
    kanji: &KanjiEntry,
    answer: &str,
    enemy_weakness: ReadingKind,
) -> Option<ReadingKind> {
    let in_kunyomi = kanji.kunyomi.iter().any(|r| r == answer);
    let in_onyomi = kanji.onyomi.iter().any(|r| r == answer);
    match (in_onyomi, in_kunyomi) {
        (true, false) => Some(ReadingKind::Onyomi),
        (false, true) => Some(ReadingKind::Kunyomi),
        (true, true) => Some(enemy_weakness),
        (false, false) => None,
    }
}
