use serde::{Deserialize, Serialize};

use crate::aggregate::ModStack;
use crate::content::Rules;
use crate::expr::{DiceExpr, RollResult};
use crate::unit::{Role, Unit};
use crate::Dice;

pub const EXPERIENCE_STEP: i32 = 7;
pub const EQUIPMENT_STEP: i32 = 5;
pub const LOW_MORALE_RATIO: f64 = 0.30;
pub const LOW_MORALE_PENALTY: i32 = 10;
pub const ZERO_HP_PENALTY: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Melee,
    Ranged,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Melee => "Melee",
            ActionKind::Ranged => "Ranged",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Average,
    Hard,
}

impl Difficulty {
    pub fn modifier(self) -> i32 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Average => -10,
            Difficulty::Hard => -20,
        }
    }
}

/// Accuracy and damage dice a role adds to an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleBonus {
    pub acc: DiceExpr,
    pub dmg: DiceExpr,
}

pub fn role_bonus(role: Role, action: ActionKind) -> RoleBonus {
    let (acc, dmg) = match (role, action) {
        (Role::Infantry | Role::Mounted, ActionKind::Melee) => (DiceExpr::dice(1, 10), DiceExpr::dice(1, 10)),
        (Role::Ranged, ActionKind::Ranged) => (DiceExpr::dice(1, 10), DiceExpr::dice(1, 10)),
        (Role::Ranged, ActionKind::Melee) => (DiceExpr::dice(-1, 20), DiceExpr::dice(-1, 20)),
        _ => (DiceExpr::zero(), DiceExpr::zero()),
    };
    RoleBonus { acc, dmg }
}

/// Every contribution to one target number, kept for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TnBreakdown {
    /// Base TN plus experience and equipment steps.
    pub base: i32,
    pub weapon: RollResult,
    pub role: RollResult,
    pub effects: RollResult,
    pub hybrid_penalty: i32,
    pub difficulty: i32,
    pub situational: i32,
    pub tn: i32,
}

fn base_tn(rules: &Rules, unit: &Unit) -> i32 {
    let base = i64::from(rules.roll.base_tn)
        + i64::from(unit.experience_tier) * i64::from(EXPERIENCE_STEP)
        + i64::from(unit.equipment_tier) * i64::from(EQUIPMENT_STEP);
    i32::try_from(base).unwrap_or(i32::MAX)
}

/// Penalties for shaken morale and a unit at 0 HP.
pub fn situational_penalty(unit: &Unit) -> i32 {
    let mut adj = 0;
    if unit.morale_ratio().is_some_and(|r| r < LOW_MORALE_RATIO) {
        adj -= LOW_MORALE_PENALTY;
    }
    if unit.hp <= 0 {
        adj -= ZERO_HP_PENALTY;
    }
    adj
}

fn hybrid_penalty(dice: &mut Dice, rules: &Rules, unit: &Unit) -> i32 {
    if rules.role(unit.role).hybrid_penalty {
        DiceExpr::dice(-1, 10).roll(dice).total as i32
    } else {
        0
    }
}

fn finish(rules: &Rules, mut b: TnBreakdown) -> TnBreakdown {
    let raw = b.base as f64
        + b.weapon.total
        + b.role.total
        + b.effects.total
        + (b.hybrid_penalty + b.difficulty + b.situational) as f64;
    b.tn = (raw.floor() as i32).clamp(rules.roll.min_tn, rules.roll.max_tn);
    b
}

/// TN for a melee or ranged attack. Draw order: weapon accuracy, role accuracy,
/// effect TN stack, hybrid penalty.
pub fn attack_tn(dice: &mut Dice, rules: &Rules, unit: &Unit, action: ActionKind, effects: &ModStack) -> TnBreakdown {
    let weapon = rules.weapon(unit.weapon).accuracy_dice.roll(dice);
    let role = role_bonus(unit.role, action).acc.roll(dice);
    let effects = effects.roll(dice);
    let hybrid_penalty = hybrid_penalty(dice, rules, unit);
    finish(
        rules,
        TnBreakdown {
            base: base_tn(rules, unit),
            weapon,
            role,
            effects,
            hybrid_penalty,
            difficulty: 0,
            situational: situational_penalty(unit),
            tn: 0,
        },
    )
}

/// TN for a maneuver: flat difficulty instead of weapon/role dice. The hybrid
/// penalty applies to every maneuver a hybrid unit attempts.
pub fn maneuver_tn(dice: &mut Dice, rules: &Rules, unit: &Unit, difficulty: Difficulty, effects: &ModStack) -> TnBreakdown {
    let effects = effects.roll(dice);
    let hybrid_penalty = hybrid_penalty(dice, rules, unit);
    finish(
        rules,
        TnBreakdown {
            base: base_tn(rules, unit),
            weapon: RollResult::zero(),
            role: RollResult::zero(),
            effects,
            hybrid_penalty,
            difficulty: difficulty.modifier(),
            situational: situational_penalty(unit),
            tn: 0,
        },
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub roll: i32,
    pub tn: i32,
    pub success: bool,
    pub margin: i32,
    pub double: bool,
}

/// 11, 22, ... 99.
pub fn is_double(roll: i32) -> bool {
    (11..=99).contains(&roll) && roll % 11 == 0
}

/// Roll d100; success when the roll is at or under the TN.
pub fn percentile_check(dice: &mut Dice, tn: i32) -> CheckResult {
    let roll = dice.d100();
    CheckResult {
        roll,
        tn,
        success: roll <= tn,
        margin: tn - roll,
        double: is_double(roll),
    }
}
