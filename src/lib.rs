//! Kanji Quest core crate.
//!
//! Turn-based kanji reading battles: the player answers onyomi/kunyomi reading
//! prompts to attack monsters, and missed kanji flow into an SM-2 spaced
//! repetition queue for later drilling. This crate owns the battle resolution
//! engine, question selection, progression math and the review scheduler;
//! rendering, audio and persistence backends live on the host side and are
//! injected through the collaborator traits in [`store`], [`notify`] and
//! [`clock`].

use wasm_bindgen::prelude::*;

pub mod battle;
pub mod clock;
pub mod drill;
pub mod model;
pub mod notify;
pub mod progress;
pub mod reading;
pub mod review;
pub mod rng;
pub mod select;
pub mod store;

mod wasm_api;

pub use wasm_api::*;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// -----------------------------------------------------------------------------
// Built-in demo datasets (grade 1 kanji + a three-enemy demo stage).
// Real deployments feed stage data from an external loader; these tables keep
// the cdylib playable stand-alone and give the tests realistic entries.
// Onyomi are listed in katakana and kunyomi in hiragana, as raw data sources
// deliver them; `KanjiEntry::new` normalizes everything to hiragana.
// -----------------------------------------------------------------------------

/// One row of the static kanji table: (id, glyph, onyomi, kunyomi, strokes, meaning).
pub type KanjiRow = (
    &'static str,
    &'static str,
    &'static [&'static str],
    &'static [&'static str],
    u8,
    &'static str,
);

pub const GRADE1_KANJI: &[KanjiRow] = &[
    ("g1-yama", "山", &["サン"], &["やま"], 3, "mountain"),
    ("g1-kawa", "川", &["セン"], &["かわ"], 3, "river"),
    ("g1-hi", "日", &["ニチ", "ジツ"], &["ひ", "か"], 4, "sun, day"),
    ("g1-tsuki", "月", &["ゲツ", "ガツ"], &["つき"], 4, "moon, month"),
    ("g1-ka", "火", &["カ"], &["ひ"], 4, "fire"),
    ("g1-mizu", "水", &["スイ"], &["みず"], 4, "water"),
    ("g1-ki", "木", &["モク", "ボク"], &["き"], 4, "tree"),
    ("g1-kane", "金", &["キン", "コン"], &["かね"], 8, "gold, money"),
    ("g1-tsuchi", "土", &["ド", "ト"], &["つち"], 3, "earth, soil"),
    ("g1-sora", "空", &["クウ"], &["そら", "から"], 8, "sky, empty"),
    ("g1-te", "手", &["シュ"], &["て"], 4, "hand"),
    ("g1-chikara", "力", &["リョク", "リキ"], &["ちから"], 2, "power"),
];

/// Demo enemy roster: (id, name, max_hp, attack, exp, level, weakness, is_boss, shield_hp).
pub type EnemyRow = (
    &'static str,
    &'static str,
    i32,
    i32,
    i64,
    u32,
    model::ReadingKind,
    bool,
    u32,
);

pub const DEMO_ENEMIES: &[EnemyRow] = &[
    ("e-slime", "もりのスライム", 30, 5, 30, 1, model::ReadingKind::Kunyomi, false, 0),
    ("e-golem", "いわゴーレム", 50, 7, 40, 2, model::ReadingKind::Onyomi, false, 0),
    ("b-nushi", "やまのぬし", 80, 9, 60, 3, model::ReadingKind::Onyomi, true, 3),
];

/// Builds the built-in demo stage from the static tables above.
pub fn demo_stage() -> model::Stage {
    model::Stage {
        stage_id: "demo_area1".to_string(),
        enemies: DEMO_ENEMIES.iter().map(model::Enemy::from_row).collect(),
        kanji_pool: GRADE1_KANJI.iter().map(model::KanjiEntry::from_row).collect(),
    }
}
