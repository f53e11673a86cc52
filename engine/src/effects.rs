use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::expr::DiceExpr;

/// Free-form effect tags. Insertion order is kept so later effects overwrite earlier ones.
pub type Tags = IndexMap<String, Value>;

/// Tag keys the engine reads.
pub mod tag {
    pub const CHARGED: &str = "charged";
    pub const BRACED: &str = "braced";
    pub const PIERCE_ARMOR: &str = "pierce_armor";
    pub const ARMOR_IGNORE_PCT: &str = "armor_ignore_pct";
    pub const HALF_DAMAGE: &str = "half_damage";
    pub const MULTI_SHOT: &str = "multi_shot";
    pub const MULTI_SHOT_HALF: &str = "multi_shot_half";
    pub const NEXT_ROUND_BUFF: &str = "next_round_buff";
    pub const TIRED: &str = "tired";
    pub const DISORGANIZED: &str = "disorganized";
    pub const FLANKED: &str = "flanked";
    pub const ENCIRCLED: &str = "encircled";
    pub const SKIP_TURN: &str = "skip_turn";
    pub const DISENGAGED: &str = "disengaged";
}

const NEGATIVE_TAGS: [&str; 6] = [
    tag::TIRED,
    tag::DISORGANIZED,
    tag::FLANKED,
    tag::ENCIRCLED,
    tag::SKIP_TURN,
    tag::HALF_DAMAGE,
];

pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn tag_flag(tags: &Tags, key: &str) -> bool {
    tags.get(key).is_some_and(truthy)
}

pub fn tag_number(tags: &Tags, key: &str) -> Option<f64> {
    match tags.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::Bool(true) => Some(1.0),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectMods {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tn_dice: Option<DiceExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dmg_dice: Option<DiceExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub def_soak_dice: Option<DiceExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub def_penalty_dice: Option<DiceExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranged_resist_dice: Option<DiceExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maneuver_tn_dice: Option<DiceExpr>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub tags: Tags,
}

impl EffectMods {
    fn dice_fields(&self) -> [Option<&DiceExpr>; 6] {
        [
            self.tn_dice.as_ref(),
            self.dmg_dice.as_ref(),
            self.def_soak_dice.as_ref(),
            self.def_penalty_dice.as_ref(),
            self.ranged_resist_dice.as_ref(),
            self.maneuver_tn_dice.as_ref(),
        ]
    }
}

/// A timed modifier bundle. `duration` counts remaining combat rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "one_round")]
    pub duration: u32,
    #[serde(default)]
    pub mods: EffectMods,
}

fn one_round() -> u32 {
    1
}

impl Effect {
    pub fn new(key: impl Into<String>, label: impl Into<String>, duration: u32, mods: EffectMods) -> Self {
        Self { key: key.into(), label: label.into(), duration, mods }
    }

    pub fn has_tag(&self, key: &str) -> bool {
        tag_flag(&self.mods.tags, key)
    }

    pub fn polarity(&self) -> Polarity {
        if NEGATIVE_TAGS.iter().any(|t| self.has_tag(t)) {
            return Polarity::Negative;
        }
        if self.mods.dice_fields().into_iter().flatten().any(DiceExpr::leads_negative) {
            return Polarity::Negative;
        }
        let label = self.label.to_lowercase();
        if label.contains("penalty") || label.contains("disorganized") {
            return Polarity::Negative;
        }
        Polarity::Positive
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
}

/// Append an effect. An effect already holding the same key is replaced and the
/// new one goes to the end of the list.
pub fn add_effect(effects: &mut Vec<Effect>, mut effect: Effect) {
    if effect.key.is_empty() {
        let mut n = effects.len() + 1;
        while effects.iter().any(|e| e.key == format!("effect-{}", n)) {
            n += 1;
        }
        effect.key = format!("effect-{}", n);
    }
    effects.retain(|e| e.key != effect.key);
    effects.push(effect);
}

/// Returns true when something was removed.
pub fn remove_by_key(effects: &mut Vec<Effect>, key: &str) -> bool {
    let before = effects.len();
    effects.retain(|e| e.key != key);
    effects.len() != before
}

pub fn by_polarity(effects: &[Effect], polarity: Polarity) -> Vec<&Effect> {
    effects.iter().filter(|e| e.polarity() == polarity).collect()
}

/// Drop every negative effect. Returns the removed effects.
pub fn clear_negative(effects: &mut Vec<Effect>) -> Vec<Effect> {
    let (removed, kept): (Vec<_>, Vec<_>) = effects
        .drain(..)
        .partition(|e| e.polarity() == Polarity::Negative || e.key.contains("disorg"));
    *effects = kept;
    removed
}

/// Drop every effect carrying any of `tags`. Returns the removed effects.
pub fn remove_tagged(effects: &mut Vec<Effect>, tags: &[String]) -> Vec<Effect> {
    let (removed, kept): (Vec<_>, Vec<_>) = effects
        .drain(..)
        .partition(|e| tags.iter().any(|t| e.has_tag(t)));
    *effects = kept;
    removed
}

/// One round of decay. Effects whose remaining duration was `<= 1` expire; an
/// expiring effect tagged `next_round_buff` leaves a one-round follow-up behind.
pub fn tick_effects(unit_name: &str, effects: &mut Vec<Effect>, mut log: impl FnMut(String)) {
    let mut next = Vec::with_capacity(effects.len());
    for eff in effects.drain(..) {
        if eff.duration > 1 {
            next.push(Effect { duration: eff.duration - 1, ..eff });
            continue;
        }
        log(format!("[COND][{}] {} expires", unit_name, eff.label));
        let Some(buff) = eff.mods.tags.get(tag::NEXT_ROUND_BUFF).filter(|v| truthy(v)) else {
            continue;
        };
        match serde_json::from_value::<EffectMods>(buff.clone()) {
            Ok(mods) => {
                let label = if eff.label.is_empty() { "Follow-up".to_string() } else { eff.label.clone() };
                log(format!("[COND][{}] gains {} (follow-up)", unit_name, label));
                next.push(Effect::new(format!("{}-next", eff.key), label, 1, mods));
            }
            Err(err) => {
                tracing::warn!(effect = %eff.key, %err, "dropping malformed next_round_buff");
            }
        }
    }
    *effects = next;
}
