//! wasm-bindgen surface for the browser host.
//!
//! A single battle session lives in a thread-local slot (wasm is
//! single-threaded) and the page drives it through free functions: start a
//! battle, feed answers, tick from `requestAnimationFrame`, poll status as
//! JSON. Side effects (sound cues, screen changes) are queued as events the
//! host drains each frame; battle-log lines additionally go to the console.

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

use crate::battle::{AttackOutcome, BattleSession, HealOutcome, Phase};
use crate::clock::{Clock, SystemClock};
use crate::drill::ReviewDrill;
use crate::model::{self, GameMode, PlayerSave};
use crate::notify::{Notifier, ScreenRequest, Sfx};
use crate::review::ReviewScheduler;
use crate::rng::SimpleRng;
use crate::store::LocalStorageStore;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    fn console_log(s: &str);
}

#[cfg(not(target_arch = "wasm32"))]
fn console_log(s: &str) {
    log::info!("{s}");
}

thread_local! {
    static SESSION: RefCell<Option<BattleSession>> = RefCell::new(None);
    static DRILL: RefCell<Option<ReviewDrill>> = RefCell::new(None);
    static EVENTS: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

/// Forwards core notifications to the host: events are queued for
/// [`drain_events`], log lines echo to the console.
struct HostNotifier;

impl Notifier for HostNotifier {
    fn play_se(&mut self, sfx: Sfx) {
        let name = match sfx {
            Sfx::Appear => "appear",
            Sfx::Correct => "correct",
            Sfx::Wrong => "wrong",
            Sfx::Damage => "damage",
            Sfx::Heal => "heal",
            Sfx::Defeat => "defeat",
            Sfx::LevelUp => "levelup",
        };
        push_event(&serde_json::json!({ "type": "se", "name": name }).to_string());
    }

    fn change_screen(&mut self, req: ScreenRequest) {
        let screen = match req {
            ScreenRequest::GameOver => "gameover",
            ScreenRequest::StageClear => "stageclear",
        };
        push_event(&serde_json::json!({ "type": "screen", "name": screen }).to_string());
    }

    fn log_line(&mut self, line: &str) {
        console_log(line);
        push_event(&serde_json::json!({ "type": "log", "line": line }).to_string());
    }
}

fn push_event(event: &str) {
    EVENTS.with(|e| e.borrow_mut().push(event.to_string()));
}

fn now_ms() -> i64 {
    SystemClock.now_ms()
}

fn open_review() -> ReviewScheduler {
    ReviewScheduler::open(Box::new(LocalStorageStore::new()))
}

/// Starts a battle on the built-in demo stage with the persisted player save.
/// `seed` feeds the damage-variance and question-pick RNG.
#[wasm_bindgen]
pub fn start_battle(player_name: &str, challenge: bool, seed: u32) -> Result<(), JsValue> {
    let store = LocalStorageStore::new();
    let mut save = model::load_player_save(&store);
    if !player_name.is_empty() {
        save.player_name = player_name.to_string();
    }
    let mode = if challenge {
        GameMode::Challenge
    } else {
        GameMode::Careful
    };
    let session = BattleSession::new(
        crate::demo_stage(),
        save.player_name,
        save.player_stats,
        mode,
        open_review(),
        Box::new(HostNotifier),
        SimpleRng::new(u64::from(seed)),
        now_ms(),
    )
    .map_err(|e| JsValue::from_str(&e.to_string()))?;
    SESSION.with(|s| *s.borrow_mut() = Some(session));
    Ok(())
}

/// Frame tick; call from `requestAnimationFrame` with a millisecond clock.
#[wasm_bindgen]
pub fn battle_tick(now: f64) {
    SESSION.with(|s| {
        if let Some(session) = s.borrow_mut().as_mut() {
            session.tick(now as i64);
        }
    });
}

fn attack_outcome_json(outcome: AttackOutcome) -> String {
    match outcome {
        AttackOutcome::Ignored => serde_json::json!({ "result": "ignored" }),
        AttackOutcome::Hit {
            damage,
            weakness_hit,
        } => serde_json::json!({ "result": "hit", "damage": damage, "weakness": weakness_hit }),
        AttackOutcome::ShieldChipped { shield_left } => {
            serde_json::json!({ "result": "shield", "shieldLeft": shield_left })
        }
        AttackOutcome::EnemyDefeated {
            damage,
            exp,
            leveled_up,
            stage_cleared,
        } => serde_json::json!({
            "result": "defeated",
            "damage": damage,
            "exp": exp,
            "leveledUp": leveled_up,
            "stageCleared": stage_cleared,
        }),
        AttackOutcome::Missed => serde_json::json!({ "result": "miss" }),
    }
    .to_string()
}

fn heal_outcome_json(outcome: HealOutcome) -> String {
    match outcome {
        HealOutcome::Ignored => serde_json::json!({ "result": "ignored" }),
        HealOutcome::Unavailable => serde_json::json!({ "result": "unavailable" }),
        HealOutcome::Healed { amount } => {
            serde_json::json!({ "result": "healed", "amount": amount })
        }
        HealOutcome::Missed => serde_json::json!({ "result": "miss" }),
        HealOutcome::MissedAndHurt { damage, game_over } => {
            serde_json::json!({ "result": "miss", "damage": damage, "gameOver": game_over })
        }
    }
    .to_string()
}

/// Submits a reading as an attack. Returns an outcome object as JSON.
#[wasm_bindgen]
pub fn submit_attack(input: &str) -> String {
    SESSION.with(|s| match s.borrow_mut().as_mut() {
        Some(session) => attack_outcome_json(session.attack(input, now_ms())),
        None => attack_outcome_json(AttackOutcome::Ignored),
    })
}

/// Submits a reading as a heal. Returns an outcome object as JSON.
#[wasm_bindgen]
pub fn submit_heal(input: &str) -> String {
    SESSION.with(|s| match s.borrow_mut().as_mut() {
        Some(session) => heal_outcome_json(session.heal(input, now_ms())),
        None => heal_outcome_json(HealOutcome::Ignored),
    })
}

/// Cycles the hint level and returns the new level (0..=3).
#[wasm_bindgen]
pub fn cycle_hint() -> u8 {
    SESSION.with(|s| {
        s.borrow_mut()
            .as_mut()
            .map(|session| session.cycle_hint())
            .unwrap_or(0)
    })
}

/// Snapshot of everything the battle screen renders, as JSON. Empty object
/// when no battle is active.
#[wasm_bindgen]
pub fn battle_status() -> String {
    SESSION.with(|s| {
        let borrow = s.borrow();
        let Some(session) = borrow.as_ref() else {
            return "{}".to_string();
        };
        let phase = match session.phase() {
            Phase::PlayerTurn { .. } => "player",
            Phase::EnemyTurn => "enemy",
            Phase::StageClearPending => "stageclear",
            Phase::GameOver => "gameover",
        };
        let stats = session.stats();
        let enemy = session.current_enemy();
        let kanji = session.current_kanji();
        serde_json::json!({
            "phase": phase,
            "inputEnabled": session.input_enabled(),
            "combo": session.combo(),
            "timeRemaining": session.time_remaining(),
            "hintLevel": session.hint_level(),
            "player": { "hp": stats.hp, "maxHp": stats.max_hp, "level": stats.level,
                        "exp": stats.exp, "nextLevelExp": stats.next_level_exp,
                        "healCount": stats.heal_count },
            "enemy": { "name": enemy.name, "hp": enemy.hp, "maxHp": enemy.max_hp,
                       "weakness": enemy.weakness, "isBoss": enemy.is_boss,
                       "shieldHp": enemy.shield_hp },
            "question": { "id": kanji.id, "character": kanji.character,
                          "strokes": kanji.strokes, "meaning": kanji.meaning },
        })
        .to_string()
    })
}

/// Drains queued side-effect events (sound cues, screen changes, log lines)
/// as a JSON array of objects, oldest first.
#[wasm_bindgen]
pub fn drain_events() -> String {
    EVENTS.with(|e| {
        let drained: Vec<String> = e.borrow_mut().drain(..).collect();
        format!("[{}]", drained.join(","))
    })
}

/// Persists the active session's player progress and ends the battle. Call on
/// stage clear or game over once the host leaves the battle screen.
#[wasm_bindgen]
pub fn end_battle_and_save(player_name: &str) {
    let Some(session) = SESSION.with(|s| s.borrow_mut().take()) else {
        return;
    };
    let mut store = LocalStorageStore::new();
    let save = PlayerSave {
        player_name: player_name.to_string(),
        player_stats: session.stats().clone(),
    };
    model::save_player(&mut store, &save);
}

/// Number of review items currently due.
#[wasm_bindgen]
pub fn due_review_count() -> usize {
    open_review().size(now_ms())
}

/// Starts a review drill round from the due queue. Returns the card count.
#[wasm_bindgen]
pub fn start_review_drill() -> usize {
    let pool: Vec<model::KanjiEntry> = crate::GRADE1_KANJI
        .iter()
        .map(model::KanjiEntry::from_row)
        .collect();
    let mut review = open_review();
    let drill = ReviewDrill::start(&pool, &mut review, now_ms());
    let remaining = drill.remaining();
    DRILL.with(|d| *d.borrow_mut() = Some(drill));
    remaining
}

/// The current drill card as JSON, or an empty object when the round is done.
#[wasm_bindgen]
pub fn drill_current() -> String {
    DRILL.with(|d| {
        d.borrow()
            .as_ref()
            .and_then(|drill| drill.current())
            .map(|k| {
                serde_json::json!({ "id": k.id, "character": k.character,
                                    "strokes": k.strokes, "meaning": k.meaning })
                .to_string()
            })
            .unwrap_or_else(|| "{}".to_string())
    })
}

/// Grades the current drill card. Returns a JSON outcome with `correct` and
/// `remaining`, or an empty object when no round is active.
#[wasm_bindgen]
pub fn drill_answer(input: &str) -> String {
    DRILL.with(|d| {
        let mut borrow = d.borrow_mut();
        let Some(drill) = borrow.as_mut() else {
            return "{}".to_string();
        };
        let mut review = open_review();
        match drill.answer(&mut review, input, now_ms()) {
            Some(result) => serde_json::json!({
                "correct": result.correct,
                "remaining": result.remaining,
            })
            .to_string(),
            None => "{}".to_string(),
        }
    })
}

/// Spends one skill point on `"maxhp"` or `"attack"`. Persists the save and
/// returns whether the upgrade was applied.
#[wasm_bindgen]
pub fn spend_skill(upgrade: &str) -> bool {
    let upgrade = match upgrade {
        "maxhp" => crate::progress::SkillUpgrade::MaxHp,
        "attack" => crate::progress::SkillUpgrade::Attack,
        _ => return false,
    };
    let mut store = LocalStorageStore::new();
    let mut save = model::load_player_save(&store);
    let applied = crate::progress::spend_skill_point(&mut save.player_stats, upgrade);
    if applied {
        model::save_player(&mut store, &save);
    }
    applied
}

/// The persisted player save as JSON (defaults when none exists).
#[wasm_bindgen]
pub fn load_save() -> String {
    let save = model::load_player_save(&LocalStorageStore::new());
    serde_json::to_string(&save).unwrap_or_else(|_| "{}".to_string())
}
