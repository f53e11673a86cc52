use crate::aggregate::aggregate_attack;
use crate::checks::{attack_tn, percentile_check, role_bonus, ActionKind};
use crate::combat::morale::apply_hit;
use crate::combat::soak::defender_soak;
use crate::content::Rules;
use crate::effects::{tag, tag_flag, tag_number, tick_effects};
use crate::expr::{DiceExpr, DiceTerm};
use crate::hob;
use crate::life;
use crate::report::ActionReport;
use crate::unit::Unit;
use crate::Dice;

fn base_damage(experience_dice: u32) -> DiceExpr {
    DiceExpr::Terms(vec![
        DiceTerm::Dice { count: 1, sides: 20, negative: false },
        DiceTerm::Dice { count: experience_dice, sides: 10, negative: false },
    ])
}

/// `hp_floor + (1 - hp_floor) * hp_ratio`: a wrecked unit still hits for a fifth.
fn hp_scale(rules: &Rules, unit: &Unit) -> f64 {
    let floor = rules.scaling.hp_floor;
    floor + (1.0 - floor) * unit.hp_ratio()
}

/// Resolve one melee or ranged attack.
///
/// `target` is the single selected enemy, if any. Without one the attack still rolls
/// and decays the actor's effects, but nothing is damaged or soaked.
///
/// Draw order: TN dice, d100, Heat of Battle, chip 1d10; on a hit also
/// `1d20 + EXPd10`, weapon, role and effect damage (a `-1/2` effect entry halves
/// the base, weapon and role subtotal before the other effect dice are added), then the defender's soak and
/// one morale roll per landed hit.
pub fn resolve_attack(
    dice: &mut Dice,
    rules: &Rules,
    actor: &mut Unit,
    mut target: Option<&mut Unit>,
    action: ActionKind,
) -> ActionReport {
    let mut lines = Vec::new();
    let weapon = rules.weapon(actor.weapon);
    let mods = aggregate_attack(&actor.effects, action, actor.weapon);

    let breakdown = attack_tn(dice, rules, actor, action, &mods.tn);
    lines.push(format!(
        "[TN][{}] {}: base {} weapon {:+} role {:+} effects ({}) {:+} hybrid {:+} situational {:+} → TN {}",
        actor.name,
        action.label(),
        breakdown.base,
        breakdown.weapon.total,
        breakdown.role.total,
        breakdown.effects.formula,
        breakdown.effects.total,
        breakdown.hybrid_penalty,
        breakdown.situational,
        breakdown.tn
    ));

    let check = percentile_check(dice, breakdown.tn);
    lines.push(format!(
        "[ROLL][{}] d100={} vs TN {} → {}",
        actor.name,
        check.roll,
        check.tn,
        if check.success { "HIT ✔" } else { "MISS ✖" }
    ));

    let events = if rules.settings.enable_heat_of_battle {
        hob::trigger(dice, &rules.heat_of_battle, actor, &check, |m| lines.push(m))
    } else {
        Vec::new()
    };

    if let Some(t) = target.as_deref() {
        actor.last_target = Some(t.name.clone());
    }

    let chip = DiceExpr::dice(1, 10).roll(dice).total as i32;

    let mut report = ActionReport {
        actor: actor.name.clone(),
        label: action.label().to_string(),
        target: target.as_deref().map(|t| t.name.clone()),
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
        applied: Vec::new(),
        log: Vec::new(),
    };

    if !check.success {
        report.damage = Some(chip);
        if let Some(t) = target.as_deref_mut() {
            lines.push(format!("[DMG][{}] chip damage {}", t.name, chip));
            report.morale_loss = apply_hit(dice, actor, t, chip, |m| lines.push(m));
            report.hits = 1;
        }
        finish_turn(actor, &mut lines);
        report.log = lines;
        tracing::debug!(unit = %report.actor, roll = report.roll, tn = report.tn, "attack missed");
        return report;
    }

    let base = base_damage(actor.experience_dice()).roll(dice);
    let weapon_dmg = weapon.dmg_dice.roll(dice);
    let role_dmg = role_bonus(actor.role, action).dmg.roll(dice);
    let effect_dmg = mods.dmg.roll(dice);

    let mut raw = base.total + weapon_dmg.total + role_dmg.total;
    if mods.dmg.halves() {
        raw /= 2.0;
    }
    raw += effect_dmg.total;
    let scaled = raw * hp_scale(rules, actor);
    lines.push(format!(
        "[DMG][{}] {} ({}) {:+} weapon {:+} role{} {:+} effects ({}) ×{:.2} HP scale = {:.1}",
        actor.name,
        base.total,
        base.formula,
        weapon_dmg.total,
        role_dmg.total,
        if mods.dmg.halves() { " halved" } else { "" },
        effect_dmg.total,
        effect_dmg.formula,
        hp_scale(rules, actor),
        scaled
    ));

    let soak = match target.as_deref() {
        Some(t) => defender_soak(dice, action, actor, &weapon, &mods, t, |m| lines.push(m)),
        None => Default::default(),
    };
    if soak.counter_charge > 0 {
        life::apply_damage(actor, soak.counter_charge, |m| lines.push(m));
    }

    let mut final_damage = chip.max((scaled - soak.total).floor() as i32);
    if tag_flag(&mods.tags, tag::HALF_DAMAGE) {
        final_damage = final_damage.div_euclid(2);
    }
    report.damage = Some(final_damage);

    if let Some(t) = target.as_deref_mut() {
        let (shots, per_shot) = if tag_flag(&mods.tags, tag::MULTI_SHOT) {
            let shots = tag_number(&mods.tags, tag::MULTI_SHOT).map_or(1, |n| (n as u32).max(1));
            let per = if tag_flag(&mods.tags, tag::MULTI_SHOT_HALF) {
                (final_damage / 2).max(1)
            } else {
                final_damage
            };
            (shots, per)
        } else {
            (1, final_damage)
        };
        for _ in 0..shots {
            report.morale_loss = apply_hit(dice, actor, t, per_shot, |m| lines.push(m));
        }
        report.hits = shots;
        report.soak = Some(soak);
    }

    finish_turn(actor, &mut lines);
    report.log = lines;
    tracing::debug!(unit = %report.actor, damage = final_damage, hits = report.hits, "attack hit");
    report
}

/// Effects and cooldowns decay once the actor's action is done.
fn finish_turn(actor: &mut Unit, lines: &mut Vec<String>) {
    tick_effects(&actor.name, &mut actor.effects, |m| lines.push(m));
    actor.cooldowns.tick();
}
