//! Shared data model: kanji entries, enemies, stages and the persistent
//! player record. Field names in the serde layer match the original save
//! format so existing browser saves keep loading.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reading::normalize;
use crate::store::KvStore;
use crate::{EnemyRow, KanjiRow};

/// localStorage key for the player save blob.
pub const SAVE_KEY: &str = "kanjiGameSave";

/// Fatal stage configuration problems. These are surfaced to the caller so it
/// can bail back to a safe screen instead of entering a broken battle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StageDataError {
    #[error("stage `{0}` has no kanji pool")]
    EmptyKanjiPool(String),
    #[error("stage `{0}` has no enemies")]
    NoEnemies(String),
}

/// The two Japanese reading families. Enemy weaknesses and answer
/// classification both use this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingKind {
    Onyomi,
    Kunyomi,
}

/// Battle pacing mode. `Careful` is untimed; `Challenge` runs the real-time
/// countdown and punishes failed heals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Careful,
    Challenge,
}

/// One quiz unit. Readings are normalized to hiragana at construction time so
/// answer checks are a plain membership test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KanjiEntry {
    pub id: String,
    pub character: String,
    pub onyomi: Vec<String>,
    pub kunyomi: Vec<String>,
    pub strokes: u8,
    pub meaning: String,
    #[serde(default)]
    pub grade: u8,
    // Per-kanji answer statistics; informational only.
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub incorrect_count: u32,
}

impl KanjiEntry {
    pub fn new(
        id: impl Into<String>,
        character: impl Into<String>,
        onyomi: &[&str],
        kunyomi: &[&str],
        strokes: u8,
        meaning: impl Into<String>,
    ) -> Self {
        let norm = |rs: &[&str]| {
            rs.iter()
                .map(|r| normalize(r))
                .filter(|r| !r.is_empty())
                .collect()
        };
        Self {
            id: id.into(),
            character: character.into(),
            onyomi: norm(onyomi),
            kunyomi: norm(kunyomi),
            strokes,
            meaning: meaning.into(),
            grade: 1,
            correct_count: 0,
            incorrect_count: 0,
        }
    }

    pub fn from_row(row: &KanjiRow) -> Self {
        let (id, character, onyomi, kunyomi, strokes, meaning) = *row;
        Self::new(id, character, onyomi, kunyomi, strokes, meaning)
    }

    pub fn has_reading(&self, kind: ReadingKind) -> bool {
        match kind {
            ReadingKind::Onyomi => !self.onyomi.is_empty(),
            ReadingKind::Kunyomi => !self.kunyomi.is_empty(),
        }
    }
}

/// A battle opponent instance. `hp` is reset to `max_hp` when the stage
/// spawns its enemy list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enemy {
    pub id: String,
    pub name: String,
    pub max_hp: i32,
    #[serde(default)]
    pub hp: i32,
    #[serde(default = "default_enemy_attack", rename = "atk")]
    pub attack: i32,
    #[serde(default = "default_enemy_exp")]
    pub exp: i64,
    #[serde(default)]
    pub level: u32,
    pub weakness: ReadingKind,
    #[serde(default)]
    pub is_boss: bool,
    #[serde(default)]
    pub shield_hp: u32,
}

fn default_enemy_attack() -> i32 {
    5
}

fn default_enemy_exp() -> i64 {
    30
}

impl Enemy {
    pub fn from_row(row: &EnemyRow) -> Self {
        let (id, name, max_hp, attack, exp, level, weakness, is_boss, shield_hp) = *row;
        Self {
            id: id.to_string(),
            name: name.to_string(),
            max_hp,
            hp: max_hp,
            attack,
            exp,
            level,
            weakness,
            is_boss,
            shield_hp,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

/// A themed encounter: ordered enemy list plus the kanji question pool.
#[derive(Debug, Clone)]
pub struct Stage {
    pub stage_id: String,
    pub enemies: Vec<Enemy>,
    pub kanji_pool: Vec<KanjiEntry>,
}

impl Stage {
    /// Both lists must be non-empty for a stage to be playable.
    pub fn validate(&self) -> Result<(), StageDataError> {
        if self.kanji_pool.is_empty() {
            return Err(StageDataError::EmptyKanjiPool(self.stage_id.clone()));
        }
        if self.enemies.is_empty() {
            return Err(StageDataError::NoEnemies(self.stage_id.clone()));
        }
        Ok(())
    }
}

/// Persistent progression record, including the achievement counters the
/// status screens read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStats {
    pub level: u32,
    pub exp: i64,
    pub next_level_exp: i64,
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub heal_count: u32,
    pub skill_points: u32,
    pub total_correct: u32,
    pub total_incorrect: u32,
    pub combo_count: u32,
    pub weakness_hits: u32,
    pub heals_successful: u32,
    pub skill_points_used: u32,
    pub enemies_defeated: u32,
    pub bosses_defeated: u32,
    pub stages_cleared: u32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            level: 1,
            exp: 0,
            next_level_exp: 100,
            hp: 100,
            max_hp: 100,
            attack: 10,
            heal_count: 3,
            skill_points: 0,
            total_correct: 0,
            total_incorrect: 0,
            combo_count: 0,
            weakness_hits: 0,
            heals_successful: 0,
            skill_points_used: 0,
            enemies_defeated: 0,
            bosses_defeated: 0,
            stages_cleared: 0,
        }
    }
}

/// Save blob layout; mirrors the original browser save.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerSave {
    pub player_name: String,
    pub player_stats: PlayerStats,
}

impl Default for PlayerSave {
    fn default() -> Self {
        Self {
            player_name: String::new(),
            player_stats: PlayerStats::default(),
        }
    }
}

/// Loads the player save, degrading to defaults on missing or corrupt data.
pub fn load_player_save(store: &dyn KvStore) -> PlayerSave {
    match store.get(SAVE_KEY) {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(save) => save,
            Err(err) => {
                log::warn!("player save is corrupt, starting fresh: {err}");
                PlayerSave::default()
            }
        },
        None => PlayerSave::default(),
    }
}

pub fn save_player(store: &mut dyn KvStore, save: &PlayerSave) {
    match serde_json::to_string(save) {
        Ok(raw) => store.set(SAVE_KEY, &raw),
        Err(err) => log::warn!("failed to serialize player save: {err}"),
    }
}
