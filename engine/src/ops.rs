//! Catalog entries carry lists of `Op`s instead of closures; `apply_op` is the single
//! dispatch point that turns them into unit mutations.

use serde::{Deserialize, Serialize};

use crate::effects::{self, Effect};
use crate::expr::DiceExpr;
use crate::life;
use crate::unit::Unit;
use crate::Dice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    #[default]
    Actor,
    Target,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    AddEffect {
        #[serde(default)]
        to: Recipient,
        effect: Effect,
    },
    GainMorale {
        #[serde(default)]
        to: Recipient,
        dice: DiceExpr,
    },
    LoseMorale {
        #[serde(default)]
        to: Recipient,
        dice: DiceExpr,
    },
    GainHp {
        #[serde(default)]
        to: Recipient,
        dice: DiceExpr,
    },
    LoseHp {
        #[serde(default)]
        to: Recipient,
        dice: DiceExpr,
    },
    ClearNegative {
        #[serde(default)]
        to: Recipient,
    },
    RemoveTagged {
        #[serde(default)]
        to: Recipient,
        tags: Vec<String>,
    },
}

impl Op {
    pub fn recipient(&self) -> Recipient {
        match self {
            Op::AddEffect { to, .. }
            | Op::GainMorale { to, .. }
            | Op::LoseMorale { to, .. }
            | Op::GainHp { to, .. }
            | Op::LoseHp { to, .. }
            | Op::ClearNegative { to }
            | Op::RemoveTagged { to, .. } => *to,
        }
    }

    pub fn targets_enemy(&self) -> bool {
        self.recipient() == Recipient::Target
    }
}

/// Apply one op. Returns a short summary such as `+7 Morale`. Ops aimed at a missing
/// target are skipped and return `None`.
pub fn apply_op(
    dice: &mut Dice,
    op: &Op,
    actor: &mut Unit,
    target: Option<&mut Unit>,
    mut log: impl FnMut(String),
) -> Option<String> {
    let unit = match op.recipient() {
        Recipient::Actor => actor,
        Recipient::Target => match target {
            Some(t) => t,
            None => {
                tracing::warn!(?op, "op needs a target but none is selected");
                return None;
            }
        },
    };

    let summary = match op {
        Op::AddEffect { effect, .. } => {
            let label = effect.label.clone();
            let rounds = effect.duration;
            effects::add_effect(&mut unit.effects, effect.clone());
            log(format!("[COND][{}] gains {} ({} round(s))", unit.name, label, rounds));
            format!("{} ({} round(s))", label, rounds)
        }
        Op::GainMorale { dice: expr, .. } => {
            let amount = expr.roll(dice).total as i32;
            life::gain_morale(unit, amount, &mut log);
            format!("+{} Morale", amount)
        }
        Op::LoseMorale { dice: expr, .. } => {
            let amount = expr.roll(dice).total as i32;
            life::lose_morale(unit, amount, &mut log);
            format!("-{} Morale", amount)
        }
        Op::GainHp { dice: expr, .. } => {
            let amount = expr.roll(dice).total as i32;
            life::heal(unit, amount, &mut log);
            format!("+{} HP", amount)
        }
        Op::LoseHp { dice: expr, .. } => {
            let amount = expr.roll(dice).total as i32;
            life::apply_damage(unit, amount, &mut log);
            format!("-{} HP", amount)
        }
        Op::ClearNegative { .. } => {
            let removed = effects::clear_negative(&mut unit.effects);
            for e in &removed {
                log(format!("[COND][{}] is no longer {}", unit.name, e.label));
            }
            format!("cleared {} negative effect(s)", removed.len())
        }
        Op::RemoveTagged { tags, .. } => {
            let removed = effects::remove_tagged(&mut unit.effects, tags);
            for e in &removed {
                log(format!("[COND][{}] is no longer {}", unit.name, e.label));
            }
            format!("removed {} effect(s)", removed.len())
        }
    };
    Some(summary)
}

pub fn apply_ops(
    dice: &mut Dice,
    ops: &[Op],
    actor: &mut Unit,
    mut target: Option<&mut Unit>,
    mut log: impl FnMut(String),
) -> Vec<String> {
    ops.iter()
        .filter_map(|op| apply_op(dice, op, actor, target.as_deref_mut(), &mut log))
        .collect()
}
