use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate_maneuver;
use crate::checks::{maneuver_tn, percentile_check, Difficulty};
use crate::content::Rules;
use crate::effects::{self, tag, Effect, EffectMods};
use crate::error::EngineError;
use crate::expr::DiceExpr;
use crate::hob;
use crate::ops::{apply_ops, Op};
use crate::report::ActionReport;
use crate::unit::{Role, Unit, WeaponKind};
use crate::Dice;

pub const FAIL_DISORG_KEY: &str = "fail-disorg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Universal,
    Weapon,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverTarget {
    #[serde(rename = "self")]
    SelfUnit,
    Enemy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManeuverDef {
    pub key: String,
    pub name: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon_type: Option<WeaponKind>,
    pub difficulty: Difficulty,
    pub target: ManeuverTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<u32>,
    #[serde(default)]
    pub ops: Vec<Op>,
}

impl ManeuverDef {
    /// Universal maneuvers suit everyone, weapon maneuvers need the matching weapon,
    /// hybrid maneuvers need the hybrid role.
    pub fn is_available_to(&self, unit: &Unit) -> bool {
        match self.category {
            Category::Universal => true,
            Category::Weapon => self.weapon_type == Some(unit.weapon),
            Category::Hybrid => unit.role == Role::Hybrid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManeuverListing {
    pub key: String,
    pub name: String,
    pub category: Category,
    pub difficulty: Difficulty,
    pub target: ManeuverTarget,
    /// Rounds left before the maneuver can be used again.
    pub cooldown: u32,
    pub executable: bool,
}

/// Maneuvers the unit may see, in catalog order. Those on cooldown are listed but
/// not executable.
pub fn available_maneuvers(rules: &Rules, unit: &Unit) -> Vec<ManeuverListing> {
    rules
        .maneuvers
        .iter()
        .filter(|m| m.is_available_to(unit))
        .map(|m| {
            let cooldown = unit.cooldowns.remaining(&m.key);
            ManeuverListing {
                key: m.key.clone(),
                name: m.name.clone(),
                category: m.category,
                difficulty: m.difficulty,
                target: m.target,
                cooldown,
                executable: cooldown == 0,
            }
        })
        .collect()
}

/// Debuff every failed maneuver leaves on the actor.
pub fn failure_effect() -> Effect {
    let mut tags = effects::Tags::new();
    tags.insert(tag::DISORGANIZED.to_string(), serde_json::Value::Bool(true));
    Effect {
        key: FAIL_DISORG_KEY.to_string(),
        label: "Disorganized (Failed Maneuver)".to_string(),
        duration: 1,
        mods: EffectMods {
            def_penalty_dice: Some(DiceExpr::dice(-1, 20)),
            tags,
            ..EffectMods::default()
        },
    }
}

/// Attempt the maneuver `key`.
///
/// Enemy-targeted maneuvers need `target`; nothing is rolled when it is missing.
/// A failed check disorganizes the actor and spends no cooldown.
pub fn resolve_maneuver(
    dice: &mut Dice,
    rules: &Rules,
    key: &str,
    actor: &mut Unit,
    mut target: Option<&mut Unit>,
) -> Result<ActionReport, EngineError> {
    let def = rules
        .maneuver(key)
        .ok_or_else(|| EngineError::UnknownManeuver(key.to_string()))?;
    if !def.is_available_to(actor) {
        return Err(EngineError::ManeuverUnavailable {
            key: def.key.clone(),
            unit: actor.name.clone(),
        });
    }
    let rounds = actor.cooldowns.remaining(&def.key);
    if rounds > 0 {
        return Err(EngineError::AbilityOnCooldown { key: def.key.clone(), rounds });
    }
    if def.target == ManeuverTarget::Enemy && target.is_none() {
        return Err(EngineError::NoTargetSelected { maneuver: def.key.clone() });
    }

    let mut lines = Vec::new();
    let stack = aggregate_maneuver(&actor.effects);
    let breakdown = maneuver_tn(dice, rules, actor, def.difficulty, &stack);
    lines.push(format!(
        "[TN][{}] {}: base {} {:+} difficulty {:+} effects ({}) {:+} situational → TN {}",
        actor.name,
        def.name,
        breakdown.base,
        breakdown.difficulty,
        breakdown.effects.total,
        breakdown.effects.formula,
        breakdown.situational,
        breakdown.tn
    ));

    let check = percentile_check(dice, breakdown.tn);
    lines.push(format!(
        "[ROLL][{}] d100={} vs TN {} → {}",
        actor.name,
        check.roll,
        check.tn,
        if check.success { "SUCCESS ✔" } else { "FAILURE ✖" }
    ));

    let events = if rules.settings.enable_heat_of_battle {
        hob::trigger(dice, &rules.heat_of_battle, actor, &check, |m| lines.push(m))
    } else {
        Vec::new()
    };

    let mut applied = Vec::new();
    if check.success {
        let enemy = match def.target {
            ManeuverTarget::Enemy => target.as_deref_mut(),
            ManeuverTarget::SelfUnit => None,
        };
        applied = apply_ops(dice, &def.ops, actor, enemy, |m| lines.push(m));
        if let Some(cd) = def.cooldown {
            actor.cooldowns.set(&def.key, cd);
            lines.push(format!("[CD][{}] {} on cooldown for {} round(s)", actor.name, def.name, cd));
        }
    } else {
        let fail = failure_effect();
        applied.push(format!("{} ({} round(s))", fail.label, fail.duration));
        lines.push(format!("[COND][{}] gains {}", actor.name, fail.label));
        effects::add_effect(&mut actor.effects, fail);
    }

    tracing::debug!(unit = %actor.name, maneuver = %def.key, success = check.success, "maneuver resolved");
    Ok(ActionReport {
        actor: actor.name.clone(),
        label: def.name.clone(),
        target: match def.target {
            ManeuverTarget::Enemy => target.map(|t| t.name.clone()),
            ManeuverTarget::SelfUnit => None,
        },
        tn: breakdown.tn,
        tn_breakdown: breakdown,
        roll: check.roll,
        success: check.success,
        margin: check.margin,
        damage: None,
        hits: 0,
        morale_loss: None,
        soak: None,
        events,
        applied,
        log: lines,
    })
}
