//! Folding a unit's active effects into per-consumer modifier bundles.
//!
//! Dice fields are collected as ordered stacks of expressions and rolled term by term;
//! tags merge in effect order, so a later effect overwrites the same key from an
//! earlier one.

use crate::checks::ActionKind;
use crate::effects::{tag, tag_flag, Effect, Tags};
use crate::expr::{DiceExpr, RollResult};
use crate::unit::WeaponKind;
use crate::Dice;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModStack(Vec<DiceExpr>);

impl ModStack {
    pub fn push(&mut self, expr: &DiceExpr) {
        if !expr.is_zero() {
            self.0.push(expr.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn exprs(&self) -> &[DiceExpr] {
        &self.0
    }

    /// True when any entry is the `-1/2` marker. The marker halves whatever the stack
    /// modifies and never enters the sum.
    pub fn halves(&self) -> bool {
        self.0.iter().any(|e| *e == DiceExpr::Halve)
    }

    fn additive(&self) -> impl Iterator<Item = &DiceExpr> {
        self.0.iter().filter(|e| **e != DiceExpr::Halve)
    }

    /// The additive entries written out as one expression, e.g. `1d20 + 2d10 -1d10`.
    pub fn formula(&self) -> String {
        let mut out = String::new();
        for expr in self.additive() {
            let rendered = expr.to_string();
            if out.is_empty() {
                out = rendered;
            } else if rendered.starts_with('-') {
                out.push(' ');
                out.push_str(&rendered);
            } else {
                out.push_str(" + ");
                out.push_str(&rendered);
            }
        }
        if out.is_empty() { "0".to_string() } else { out }
    }

    /// Sum of the additive entries rolled in order.
    pub fn roll(&self, dice: &mut Dice) -> RollResult {
        if self.additive().next().is_none() {
            return RollResult::zero();
        }
        let total = self.additive().map(|e| e.roll(dice).total).sum();
        RollResult { total, formula: self.formula() }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttackMods {
    pub tn: ModStack,
    pub dmg: ModStack,
    pub tags: Tags,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefenseMods {
    pub soak: ModStack,
    pub penalty: ModStack,
    pub ranged_resist: ModStack,
    pub tags: Tags,
}

fn merge_tags(into: &mut Tags, from: &Tags) {
    for (k, v) in from {
        into.insert(k.clone(), v.clone());
    }
}

/// Bows and crossbows lose `1d10` TN on ranged shots while a `tired` effect without
/// its own TN dice is active.
pub fn aggregate_attack(effects: &[Effect], action: ActionKind, weapon: WeaponKind) -> AttackMods {
    let mut agg = AttackMods::default();
    let mut tired = false;
    for eff in effects {
        let mods = &eff.mods;
        if let Some(d) = &mods.tn_dice {
            agg.tn.push(d);
        }
        if let Some(d) = &mods.dmg_dice {
            agg.dmg.push(d);
        }
        if tag_flag(&mods.tags, tag::TIRED) && mods.tn_dice.is_none() {
            tired = true;
        }
        merge_tags(&mut agg.tags, &mods.tags);
    }
    if tired && action == ActionKind::Ranged && weapon.is_bow_like() {
        agg.tn.push(&DiceExpr::dice(-1, 10));
    }
    agg
}

pub fn aggregate_defense(effects: &[Effect]) -> DefenseMods {
    let mut agg = DefenseMods::default();
    for eff in effects {
        let mods = &eff.mods;
        if let Some(d) = &mods.def_soak_dice {
            agg.soak.push(d);
        }
        if let Some(d) = &mods.def_penalty_dice {
            agg.penalty.push(d);
        }
        if let Some(d) = &mods.ranged_resist_dice {
            agg.ranged_resist.push(d);
        }
        merge_tags(&mut agg.tags, &mods.tags);
    }
    agg
}

pub fn aggregate_maneuver(effects: &[Effect]) -> ModStack {
    let mut stack = ModStack::default();
    for d in effects.iter().filter_map(|e| e.mods.maneuver_tn_dice.as_ref()) {
        stack.push(d);
    }
    stack
}
