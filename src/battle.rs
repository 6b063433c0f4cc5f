//! The turn-based combat state machine.
//!
//! A [`BattleSession`] owns all per-encounter state and is driven by two
//! entry points: player actions (`attack`, `heal`, `cycle_hint`) and the
//! host's frame `tick`. Actions lock input immediately; the follow-up
//! sequence (enemy counter-attack, next question, re-enabling input) runs as
//! due-timestamped steps drained by `tick`, which preserves the original
//! pacing delays without owning any timer resources. The challenge-mode
//! countdown ticks once per real second independently of pending steps.

use crate::model::{Enemy, GameMode, KanjiEntry, PlayerStats, Stage, StageDataError};
use crate::notify::{Notifier, ScreenRequest, Sfx};
use crate::progress;
use crate::reading;
use crate::review::ReviewScheduler;
use crate::rng::SimpleRng;
use crate::select::{self, PartitionedPools};

pub const HEAL_AMOUNT: i32 = 30;
/// Combo length at which the one-shot damage burst fires (and the counter
/// resets, so every fifth consecutive correct answer re-triggers it).
pub const COMBO_BONUS_AT: u32 = 5;
/// Consecutive answers must land within this window to keep the combo alive.
pub const COMBO_WINDOW_MS: i64 = 5_000;
pub const CHALLENGE_START_SECONDS: i32 = 60;
pub const CHALLENGE_TIME_BONUS_SECONDS: i32 = 5;

const WEAKNESS_MULTIPLIER: f64 = 1.5;
const COMBO_MULTIPLIER: f64 = 1.5;
const DAMAGE_VARIANCE: f64 = 0.1;

// Pacing delays, matching the original animation schedule.
const ENEMY_TURN_DELAY_MS: i64 = 1_000;
const NEXT_QUESTION_DELAY_MS: i64 = 1_500;
const REENABLE_DELAY_MS: i64 = 500;
const ADVANCE_DELAY_MS: i64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PlayerTurn { input_enabled: bool },
    EnemyTurn,
    StageClearPending,
    GameOver,
}

/// What happens after the enemy's counter-attack; encodes the pacing
/// differences between the attack and heal paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterStrike {
    /// Draw the next question after a beat; `enable_delay` of `None` enables
    /// input in the same step (correct-attack path), `Some` waits a little
    /// longer (incorrect-attack path).
    PickDelayed { enable_delay: Option<i64> },
    /// Question is drawn together with the strike (heal path).
    PickImmediately,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    EnemyStrike { after: AfterStrike },
    PickQuestion { enable_delay: Option<i64> },
    EnablePlayer,
    AdvanceEnemy,
    StageClear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    /// Submission arrived while input was locked; silently dropped.
    Ignored,
    Hit { damage: i32, weakness_hit: bool },
    /// Boss shield absorbed a weakness hit; no HP damage this turn.
    ShieldChipped { shield_left: u32 },
    EnemyDefeated {
        damage: i32,
        exp: i64,
        leveled_up: bool,
        stage_cleared: bool,
    },
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealOutcome {
    Ignored,
    /// No heal charges left; input stays enabled.
    Unavailable,
    Healed { amount: i32 },
    Missed,
    /// Challenge mode punishes a failed heal with immediate damage.
    MissedAndHurt { damage: i32, game_over: bool },
}

pub struct BattleSession {
    mode: GameMode,
    player_name: String,
    stats: PlayerStats,
    enemies: Vec<Enemy>,
    enemy_index: usize,
    pool: Vec<KanjiEntry>,
    pools: PartitionedPools,
    current_kanji: usize,
    recent_ids: Vec<String>,
    phase: Phase,
    combo: u32,
    combo_deadline_ms: i64,
    mistakes_this_stage: u32,
    hint_level: u8,
    time_remaining: i32,
    last_countdown_ms: i64,
    pending: Vec<(i64, Step)>,
    review: ReviewScheduler,
    notifier: Box<dyn Notifier>,
    rng: SimpleRng,
}

impl BattleSession {
    pub fn new(
        stage: Stage,
        player_name: impl Into<String>,
        mut stats: PlayerStats,
        mode: GameMode,
        review: ReviewScheduler,
        notifier: Box<dyn Notifier>,
        rng: SimpleRng,
        now: i64,
    ) -> Result<Self, StageDataError> {
        stage.validate()?;
        let mut enemies = stage.enemies;
        for e in &mut enemies {
            e.hp = e.max_hp;
        }
        stats.hp = stats.max_hp;
        stats.combo_count = 0;
        let pools = select::partition_pools(&stage.kanji_pool);
        let mut session = Self {
            mode,
            player_name: player_name.into(),
            stats,
            enemies,
            enemy_index: 0,
            pool: stage.kanji_pool,
            pools,
            current_kanji: 0,
            recent_ids: Vec::new(),
            phase: Phase::PlayerTurn {
                input_enabled: true,
            },
            combo: 0,
            combo_deadline_ms: 0,
            mistakes_this_stage: 0,
            hint_level: 0,
            time_remaining: CHALLENGE_START_SECONDS,
            last_countdown_ms: now,
            pending: Vec::new(),
            review,
            notifier,
            rng,
        };
        session.spawn_current_enemy();
        session.pick_question();
        Ok(session)
    }

    // --- accessors ----------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn input_enabled(&self) -> bool {
        matches!(
            self.phase,
            Phase::PlayerTurn {
                input_enabled: true
            }
        )
    }

    pub fn current_kanji(&self) -> &KanjiEntry {
        &self.pool[self.current_kanji]
    }

    pub fn current_enemy(&self) -> &Enemy {
        &self.enemies[self.enemy_index]
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut PlayerStats {
        &mut self.stats
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn mistakes_this_stage(&self) -> u32 {
        self.mistakes_this_stage
    }

    pub fn hint_level(&self) -> u8 {
        self.hint_level
    }

    pub fn time_remaining(&self) -> i32 {
        self.time_remaining
    }

    pub fn review(&self) -> &ReviewScheduler {
        &self.review
    }

    pub fn review_mut(&mut self) -> &mut ReviewScheduler {
        &mut self.review
    }

    // --- internals ----------------------------------------------------------

    fn log(&mut self, line: &str) {
        self.notifier.log_line(line);
    }

    fn schedule(&mut self, due: i64, step: Step) {
        self.pending.push((due, step));
    }

    fn spawn_current_enemy(&mut self) {
        let name = self.enemies[self.enemy_index].name.clone();
        self.log(&format!("{name} があらわれた！"));
        self.notifier.play_se(Sfx::Appear);
        self.hint_level = 0;
    }

    fn pick_question(&mut self) {
        self.hint_level = 0;
        let weakness = self.enemies[self.enemy_index].weakness;
        match select::pick_next(
            &self.pool,
            &self.pools,
            weakness,
            &mut self.recent_ids,
            &mut self.rng,
        ) {
            Ok(idx) => {
                self.current_kanji = idx;
                let character = self.pool[idx].character.clone();
                self.log(&format!("「{character}」をよもう！"));
            }
            // Unreachable for a validated stage; keep the previous prompt.
            Err(err) => log::warn!("question selection failed: {err}"),
        }
    }

    fn enable_player(&mut self) {
        self.phase = Phase::PlayerTurn {
            input_enabled: true,
        };
    }

    fn reading_message(kanji: &KanjiEntry) -> String {
        format!(
            "正しいよみ: 音「{}」訓「{}」",
            kanji.onyomi.join("、"),
            kanji.kunyomi.join("、")
        )
    }

    fn register_correct(&mut self, now: i64) {
        self.pool[self.current_kanji].correct_count += 1;
        self.stats.total_correct += 1;
        self.stats.combo_count += 1;
        self.combo += 1;
        self.combo_deadline_ms = now + COMBO_WINDOW_MS;
        if self.mode == GameMode::Challenge {
            self.time_remaining += CHALLENGE_TIME_BONUS_SECONDS;
        }
        self.notifier.play_se(Sfx::Correct);
    }

    fn register_incorrect(&mut self, now: i64) {
        self.pool[self.current_kanji].incorrect_count += 1;
        let id = self.pool[self.current_kanji].id.clone();
        self.stats.total_incorrect += 1;
        self.stats.combo_count = 0;
        self.mistakes_this_stage += 1;
        self.combo = 0;
        self.combo_deadline_ms = 0;
        self.review.add(&id, now);
        self.notifier.play_se(Sfx::Wrong);
    }

    fn game_over(&mut self) {
        self.phase = Phase::GameOver;
        // Drop every pending step so no orphaned transition fires afterwards;
        // the countdown stops with the phase check in `tick`.
        self.pending.clear();
        self.notifier.change_screen(ScreenRequest::GameOver);
    }

    // --- player actions -----------------------------------------------------

    /// Processes an attack answer. No-op unless it is the player's turn and
    /// input is enabled (double submissions are debounced, not errors).
    pub fn attack(&mut self, input: &str, now: i64) -> AttackOutcome {
        if !self.input_enabled() {
            return AttackOutcome::Ignored;
        }
        self.phase = Phase::PlayerTurn {
            input_enabled: false,
        };

        let kanji = self.pool[self.current_kanji].clone();
        let answer = reading::normalize(input);
        let reading_msg = Self::reading_message(&kanji);
        let correct =
            !answer.is_empty() && reading::reading_set(&kanji).contains(&answer.as_str());

        if !correct {
            self.register_incorrect(now);
            self.log(&format!("こうげきしっぱい！{reading_msg}"));
            self.phase = Phase::EnemyTurn;
            self.schedule(
                now + ENEMY_TURN_DELAY_MS,
                Step::EnemyStrike {
                    after: AfterStrike::PickDelayed {
                        enable_delay: Some(REENABLE_DELAY_MS),
                    },
                },
            );
            return AttackOutcome::Missed;
        }

        self.register_correct(now);

        // Base damage with ±10% variance.
        let variance = self.rng.next_f64() * 2.0 * DAMAGE_VARIANCE - DAMAGE_VARIANCE;
        let mut damage = (f64::from(self.stats.attack) * (1.0 + variance)).round() as i32;

        let weakness = self.enemies[self.enemy_index].weakness;
        let weakness_hit = reading::answered_kind(&kanji, &answer, weakness) == Some(weakness);
        if weakness_hit {
            damage = (f64::from(damage) * WEAKNESS_MULTIPLIER).floor() as i32;
            self.stats.weakness_hits += 1;
            self.log("弱点にヒット！大ダメージ！");
        }

        if self.combo == COMBO_BONUS_AT {
            damage = (f64::from(damage) * COMBO_MULTIPLIER).floor() as i32;
            self.log("れんぞくせいかいボーナス！");
            self.combo = 0;
        }

        let enemy = &mut self.enemies[self.enemy_index];
        let enemy_name = enemy.name.clone();
        if enemy.is_boss && enemy.shield_hp > 0 {
            if weakness_hit {
                // Shield absorbs the whole hit.
                enemy.shield_hp -= 1;
                let shield_left = enemy.shield_hp;
                self.log(&format!("せいかい！{reading_msg}"));
                self.log("シールドにヒビが入った！");
                if shield_left == 0 {
                    self.log("ボスの防御が崩れた！");
                }
                self.phase = Phase::EnemyTurn;
                self.schedule(
                    now + ENEMY_TURN_DELAY_MS,
                    Step::EnemyStrike {
                        after: AfterStrike::PickDelayed { enable_delay: None },
                    },
                );
                return AttackOutcome::ShieldChipped { shield_left };
            }
            damage = 1;
            self.log(&format!(
                "せいかい！{reading_msg}、しかし{enemy_name}の防御は固い！"
            ));
        } else {
            self.log(&format!(
                "せいかい！{reading_msg}、{enemy_name}に{damage}のダメージ！"
            ));
        }

        let enemy = &mut self.enemies[self.enemy_index];
        enemy.hp = (enemy.hp - damage).max(0);
        if enemy.hp > 0 {
            self.phase = Phase::EnemyTurn;
            self.schedule(
                now + ENEMY_TURN_DELAY_MS,
                Step::EnemyStrike {
                    after: AfterStrike::PickDelayed { enable_delay: None },
                },
            );
            return AttackOutcome::Hit {
                damage,
                weakness_hit,
            };
        }

        // Enemy defeated.
        let (is_boss, exp) = {
            let e = &self.enemies[self.enemy_index];
            (e.is_boss, e.exp)
        };
        let player = self.player_name.clone();
        self.log(&format!("{player}は{enemy_name}をたおした！"));
        self.notifier.play_se(Sfx::Defeat);
        self.stats.enemies_defeated += 1;
        if is_boss {
            self.stats.bosses_defeated += 1;
        }
        self.log(&format!("{exp}の経験値を獲得した！"));
        let result = progress::award_exp(&mut self.stats, exp);
        if result.leveled_up {
            self.notifier.play_se(Sfx::LevelUp);
            self.log(&format!("レベルが{}に上がった！", result.new_level));
        }

        let stage_cleared = self.enemy_index + 1 >= self.enemies.len();
        if stage_cleared {
            self.schedule(now + ADVANCE_DELAY_MS, Step::StageClear);
        } else {
            self.schedule(now + ADVANCE_DELAY_MS, Step::AdvanceEnemy);
        }
        AttackOutcome::EnemyDefeated {
            damage,
            exp,
            leveled_up: result.leveled_up,
            stage_cleared,
        }
    }

    /// Processes a heal answer. Requires a heal charge; a correct reading
    /// restores HP, an incorrect one costs HP in challenge mode. Either way
    /// the enemy still takes its turn (the challenge-mode damage substitutes
    /// for it, it does not stack on top).
    pub fn heal(&mut self, input: &str, now: i64) -> HealOutcome {
        if !self.input_enabled() {
            return HealOutcome::Ignored;
        }
        if self.stats.heal_count == 0 {
            self.log("回復はもう使えません！");
            return HealOutcome::Unavailable;
        }
        self.phase = Phase::PlayerTurn {
            input_enabled: false,
        };

        let kanji = self.pool[self.current_kanji].clone();
        let answer = reading::normalize(input);
        let reading_msg = Self::reading_message(&kanji);
        let correct =
            !answer.is_empty() && reading::reading_set(&kanji).contains(&answer.as_str());

        let outcome = if correct {
            self.register_correct(now);
            self.notifier.play_se(Sfx::Heal);
            let healed_to = (self.stats.hp + HEAL_AMOUNT).min(self.stats.max_hp);
            let amount = healed_to - self.stats.hp;
            self.stats.hp = healed_to;
            self.stats.heal_count -= 1;
            self.stats.heals_successful += 1;
            self.log(&format!("かいふくせいこう！{reading_msg}"));
            HealOutcome::Healed { amount }
        } else {
            self.register_incorrect(now);
            self.log(&format!("かいふくしっぱい！{reading_msg}"));
            if self.mode == GameMode::Challenge {
                let damage = self.enemies[self.enemy_index].attack;
                self.stats.hp = (self.stats.hp - damage).max(0);
                if self.stats.hp == 0 {
                    self.game_over();
                    return HealOutcome::MissedAndHurt {
                        damage,
                        game_over: true,
                    };
                }
                HealOutcome::MissedAndHurt {
                    damage,
                    game_over: false,
                }
            } else {
                HealOutcome::Missed
            }
        };

        self.phase = Phase::EnemyTurn;
        self.schedule(
            now + ENEMY_TURN_DELAY_MS,
            Step::EnemyStrike {
                after: AfterStrike::PickImmediately,
            },
        );
        outcome
    }

    /// Cycles the hint level 0→1→2→3→0 and logs the matching hint. Free:
    /// consumes no turn, no resource.
    pub fn cycle_hint(&mut self) -> u8 {
        if self.phase == Phase::GameOver {
            return self.hint_level;
        }
        self.hint_level = (self.hint_level + 1) % 4;
        let kanji = self.pool[self.current_kanji].clone();
        match self.hint_level {
            0 => self.log("ヒントを非表示にした"),
            1 => self.log(&format!("ヒント（基本）: 画数は{}", kanji.strokes)),
            2 => {
                let use_onyomi = self.rng.next_bool();
                let (readings, label, other) = if use_onyomi {
                    (&kanji.onyomi, "音読み", "訓読み")
                } else {
                    (&kanji.kunyomi, "訓読み", "音読み")
                };
                if let Some(first) = readings.first().and_then(|r| r.chars().next()) {
                    self.log(&format!("ヒント（読み）: {label}は「{first}○○」から始まる"));
                } else {
                    self.log(&format!("ヒント（読み）: {other}で読むことが多い"));
                }
            }
            _ => self.log(&format!("ヒント（意味）: {}", kanji.meaning)),
        }
        self.hint_level
    }

    // --- frame tick ---------------------------------------------------------

    /// Advances real-time machinery: the challenge countdown, the combo
    /// window, and any due deferred steps (in due order). Hosts call this
    /// from their frame loop.
    pub fn tick(&mut self, now: i64) {
        if self.phase == Phase::GameOver {
            return;
        }

        // Countdown ticks independently of pending transitions.
        if self.mode == GameMode::Challenge {
            while now - self.last_countdown_ms >= 1_000 {
                self.last_countdown_ms += 1_000;
                self.time_remaining -= 1;
                if self.time_remaining <= 0 {
                    self.time_remaining = 0;
                    self.log("じかんぎれ！");
                    self.game_over();
                    return;
                }
            }
        }

        if self.combo > 0 && now >= self.combo_deadline_ms {
            self.combo = 0;
        }

        // Drain due steps in due order; a step may schedule followers.
        loop {
            let next = self
                .pending
                .iter()
                .enumerate()
                .filter(|(_, (due, _))| *due <= now)
                .min_by_key(|(_, (due, _))| *due)
                .map(|(i, _)| i);
            let Some(i) = next else { break };
            let (_, step) = self.pending.remove(i);
            self.run_step(step, now);
            if self.phase == Phase::GameOver {
                return;
            }
        }
    }

    fn run_step(&mut self, step: Step, now: i64) {
        match step {
            Step::EnemyStrike { after } => {
                self.enemy_strike();
                if self.phase == Phase::GameOver {
                    return;
                }
                match after {
                    AfterStrike::PickDelayed { enable_delay } => self.schedule(
                        now + NEXT_QUESTION_DELAY_MS,
                        Step::PickQuestion { enable_delay },
                    ),
                    AfterStrike::PickImmediately => {
                        self.pick_question();
                        self.schedule(now + REENABLE_DELAY_MS, Step::EnablePlayer);
                    }
                }
            }
            Step::PickQuestion { enable_delay } => {
                self.pick_question();
                match enable_delay {
                    None => self.enable_player(),
                    Some(d) => self.schedule(now + d, Step::EnablePlayer),
                }
            }
            Step::EnablePlayer => self.enable_player(),
            Step::AdvanceEnemy => {
                self.enemy_index += 1;
                self.spawn_current_enemy();
                self.pick_question();
                self.enable_player();
            }
            Step::StageClear => {
                self.stats.stages_cleared += 1;
                self.phase = Phase::StageClearPending;
                self.notifier.change_screen(ScreenRequest::StageClear);
            }
        }
    }

    fn enemy_strike(&mut self) {
        let (name, atk) = {
            let e = &self.enemies[self.enemy_index];
            (e.name.clone(), e.attack)
        };
        let player = self.player_name.clone();
        self.log(&format!("{name} のこうげき！{player}に{atk}のダメージ！"));
        self.stats.hp = (self.stats.hp - atk).max(0);
        self.notifier.play_se(Sfx::Damage);
        if self.stats.hp == 0 {
            self.game_over();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlayerSave;
    use crate::notify::NullNotifier;
    use crate::store::MemoryStore;

    const T0: i64 = 1_700_000_000_000;

    fn stage() -> Stage {
        crate::demo_stage()
    }

    fn session(mode: GameMode) -> BattleSession {
        BattleSession::new(
            stage(),
            "テスト",
            PlayerSave::default().player_stats,
            mode,
            ReviewScheduler::open(Box::new(MemoryStore::new())),
            Box::new(NullNotifier),
            SimpleRng::new(42),
            T0,
        )
        .unwrap()
    }

    fn correct_answer(s: &BattleSession) -> String {
        let k = s.current_kanji();
        k.kunyomi
            .first()
            .or_else(|| k.onyomi.first())
            .cloned()
            .unwrap()
    }

    /// Runs the deferred chain to completion after an action at `t`.
    fn settle(s: &mut BattleSession, t: &mut i64) {
        for _ in 0..10 {
            *t += 500;
            s.tick(*t);
            if s.input_enabled()
                || matches!(s.phase(), Phase::StageClearPending | Phase::GameOver)
            {
                break;
            }
        }
    }

    #[test]
    fn battle_starts_on_player_turn_with_input_enabled() {
        let s = session(GameMode::Careful);
        assert!(s.input_enabled());
        assert_eq!(s.current_enemy().hp, s.current_enemy().max_hp);
        assert_eq!(s.stats().hp, s.stats().max_hp);
    }

    #[test]
    fn attack_locks_input_and_ignores_double_submission() {
        let mut s = session(GameMode::Careful);
        let answer = correct_answer(&s);
        let first = s.attack(&answer, T0);
        assert_ne!(first, AttackOutcome::Ignored);
        assert!(!s.input_enabled());
        assert_eq!(s.attack(&answer, T0), AttackOutcome::Ignored);
        assert_eq!(s.heal(&answer, T0), HealOutcome::Ignored);
    }

    #[test]
    fn deferred_chain_restores_input_in_order() {
        let mut s = session(GameMode::Careful);
        let answer = correct_answer(&s);
        let hp_before = s.stats().hp;
        s.attack(&answer, T0);
        // Nothing due yet.
        s.tick(T0 + 500);
        assert_eq!(s.stats().hp, hp_before);
        assert!(!s.input_enabled());
        // Enemy strike at +1000.
        s.tick(T0 + 1_000);
        assert!(s.stats().hp < hp_before);
        assert!(!s.input_enabled());
        // Next question + re-enable at +2500.
        s.tick(T0 + 2_500);
        assert!(s.input_enabled());
    }

    #[test]
    fn incorrect_attack_resets_combo_and_enqueues_review() {
        let mut s = session(GameMode::Careful);
        let mut t = T0;
        let answer = correct_answer(&s);
        s.attack(&answer, t);
        settle(&mut s, &mut t);
        assert_eq!(s.combo(), 1);

        let id = s.current_kanji().id.clone();
        let outcome = s.attack("でたらめ", t);
        assert_eq!(outcome, AttackOutcome::Missed);
        assert_eq!(s.combo(), 0);
        assert_eq!(s.mistakes_this_stage(), 1);
        assert!(s.review().record(&id).is_some());
    }

    #[test]
    fn combo_window_expiry_resets_combo() {
        let mut s = session(GameMode::Careful);
        let mut t = T0;
        let answer = correct_answer(&s);
        s.attack(&answer, t);
        settle(&mut s, &mut t);
        assert_eq!(s.combo(), 1);
        t += COMBO_WINDOW_MS + 1_000;
        s.tick(t);
        assert_eq!(s.combo(), 0);
    }

    #[test]
    fn heal_restores_hp_and_consumes_a_charge() {
        let mut s = session(GameMode::Careful);
        s.stats_mut().hp = 50;
        let answer = correct_answer(&s);
        let outcome = s.heal(&answer, T0);
        assert_eq!(outcome, HealOutcome::Healed { amount: HEAL_AMOUNT });
        assert_eq!(s.stats().hp, 80);
        assert_eq!(s.stats().heal_count, 2);
    }

    #[test]
    fn heal_caps_at_max_hp() {
        let mut s = session(GameMode::Careful);
        s.stats_mut().hp = s.stats().max_hp - 10;
        let answer = correct_answer(&s);
        let outcome = s.heal(&answer, T0);
        assert_eq!(outcome, HealOutcome::Healed { amount: 10 });
        assert_eq!(s.stats().hp, s.stats().max_hp);
    }

    #[test]
    fn heal_without_charges_is_unavailable_and_keeps_input_enabled() {
        let mut s = session(GameMode::Careful);
        s.stats_mut().heal_count = 0;
        let answer = correct_answer(&s);
        assert_eq!(s.heal(&answer, T0), HealOutcome::Unavailable);
        assert!(s.input_enabled());
    }

    #[test]
    fn failed_heal_hurts_only_in_challenge_mode() {
        let mut careful = session(GameMode::Careful);
        let hp = careful.stats().hp;
        assert_eq!(careful.heal("でたらめ", T0), HealOutcome::Missed);
        assert_eq!(careful.stats().hp, hp);

        let mut challenge = session(GameMode::Challenge);
        let atk = challenge.current_enemy().attack;
        let hp = challenge.stats().hp;
        assert_eq!(
            challenge.heal("でたらめ", T0),
            HealOutcome::MissedAndHurt {
                damage: atk,
                game_over: false
            }
        );
        assert_eq!(challenge.stats().hp, hp - atk);
    }

    #[test]
    fn hint_cycles_without_consuming_the_turn() {
        let mut s = session(GameMode::Careful);
        assert_eq!(s.hint_level(), 0);
        assert_eq!(s.cycle_hint(), 1);
        assert_eq!(s.cycle_hint(), 2);
        assert_eq!(s.cycle_hint(), 3);
        assert_eq!(s.cycle_hint(), 0);
        assert!(s.input_enabled());
    }

    #[test]
    fn challenge_countdown_forces_game_over_and_cancels_pending() {
        let mut s = session(GameMode::Challenge);
        let answer = correct_answer(&s);
        s.attack(&answer, T0);
        // Let the whole countdown elapse while the enemy turn is pending.
        // The correct answer added 5 bonus seconds.
        let expiry = T0 + i64::from(CHALLENGE_START_SECONDS + 5) * 1_000;
        s.tick(expiry);
        assert_eq!(s.phase(), Phase::GameOver);
        // Later ticks must not resurrect the session.
        s.tick(expiry + 10_000);
        assert_eq!(s.phase(), Phase::GameOver);
        assert_eq!(s.attack(&answer, expiry + 10_000), AttackOutcome::Ignored);
    }

    #[test]
    fn correct_answer_extends_challenge_timer() {
        let mut s = session(GameMode::Challenge);
        let before = s.time_remaining();
        let answer = correct_answer(&s);
        s.attack(&answer, T0);
        assert_eq!(s.time_remaining(), before + CHALLENGE_TIME_BONUS_SECONDS);
    }

    #[test]
    fn player_death_by_counter_attack_is_terminal() {
        let mut s = session(GameMode::Careful);
        s.stats_mut().hp = 1;
        // Miss so the enemy strikes back; 1 HP cannot survive any attack.
        s.attack("でたらめ", T0);
        s.tick(T0 + 1_000);
        assert_eq!(s.phase(), Phase::GameOver);
        // No deferred step may re-enable input afterwards.
        s.tick(T0 + 10_000);
        assert!(!s.input_enabled());
    }
}
