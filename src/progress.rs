//! Player progression: the experience curve, level-up resolution and
//! skill-point spending.

use crate::model::PlayerStats;

const SKILL_UPGRADE_COST: u32 = 1;
const LEVEL_UP_HP_GAIN: i32 = 10;
const LEVEL_UP_ATTACK_GAIN: i32 = 2;
const LEVEL_UP_HEAL_COUNT: u32 = 3;

/// Experience required to clear level `n`: 100 at level 1, then
/// `floor(prev * 1.2) + 20`. Non-positive input returns the level-1 value
/// instead of propagating garbage into damage/exp math.
pub fn exp_for_level(level: i32) -> i64 {
    if level <= 1 {
        return 100;
    }
    (exp_for_level(level - 1) as f64 * 1.2).floor() as i64 + 20
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUpResult {
    pub leveled_up: bool,
    pub old_level: u32,
    pub new_level: u32,
}

/// Adds experience and resolves level-ups.
///
/// Loops until `exp` drops under the threshold so one large award can span
/// several levels in a single call; overflow carries forward each step. Each
/// level grants +10 max HP (with a full heal), +2 attack, one skill point,
/// and restocks heals.
pub fn award_exp(stats: &mut PlayerStats, exp: i64) -> LevelUpResult {
    let old_level = stats.level;
    stats.exp += exp.max(0);
    while stats.exp >= stats.next_level_exp {
        stats.exp -= stats.next_level_exp;
        stats.level += 1;
        stats.skill_points += 1;
        stats.max_hp += LEVEL_UP_HP_GAIN;
        stats.hp = stats.max_hp;
        stats.attack += LEVEL_UP_ATTACK_GAIN;
        stats.heal_count = LEVEL_UP_HEAL_COUNT;
        stats.next_level_exp = exp_for_level(stats.level as i32);
    }
    LevelUpResult {
        leveled_up: stats.level > old_level,
        old_level,
        new_level: stats.level,
    }
}

/// Spendable stat upgrades, one skill point each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillUpgrade {
    /// +10 max HP, and the same amount of current HP.
    MaxHp,
    /// +2 attack.
    Attack,
}

/// Spends one skill point on the chosen upgrade. Returns false (and changes
/// nothing) when no points are available.
pub fn spend_skill_point(stats: &mut PlayerStats, upgrade: SkillUpgrade) -> bool {
    if stats.skill_points < SKILL_UPGRADE_COST {
        return false;
    }
    stats.skill_points -= SKILL_UPGRADE_COST;
    stats.skill_points_used += SKILL_UPGRADE_COST;
    match upgrade {
        SkillUpgrade::MaxHp => {
            stats.max_hp += LEVEL_UP_HP_GAIN;
            stats.hp += LEVEL_UP_HP_GAIN;
        }
        SkillUpgrade::Attack => stats.attack += LEVEL_UP_ATTACK_GAIN,
    }
    true
}
