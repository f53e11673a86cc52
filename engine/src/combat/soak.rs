use crate::aggregate::{aggregate_defense, AttackMods};
use crate::checks::ActionKind;
use crate::content::WeaponDef;
use crate::effects::{tag, tag_flag, tag_number};
use crate::expr::DiceExpr;
use crate::report::SoakBreakdown;
use crate::unit::{Role, Unit, WeaponKind};
use crate::Dice;

const MAX_ARMOR_DICE: u32 = 10;

/// Roll the defender's soak against one successful hit.
///
/// Draw order: experience d6s, effect soak, effect penalty, armor d3s, polearm d20,
/// ranged resist, counter-charge 2d20.
pub fn defender_soak(
    dice: &mut Dice,
    action: ActionKind,
    attacker: &Unit,
    weapon: &WeaponDef,
    attack: &AttackMods,
    defender: &Unit,
    mut log: impl FnMut(String),
) -> SoakBreakdown {
    let def = aggregate_defense(&defender.effects);
    let mut soak = SoakBreakdown::default();
    let mut defense = 0.0;

    let experience_dice = defender.experience_dice();
    if experience_dice > 0 {
        let roll = DiceExpr::dice(experience_dice as i32, 6).roll(dice);
        soak.base_defense = roll.total as i32;
        defense += roll.total;
    }

    soak.defense_effect = def.soak.roll(dice).total;
    defense += soak.defense_effect;
    soak.defense_penalty = def.penalty.roll(dice).total;
    defense += soak.defense_penalty;

    let mut armor = 0;
    if weapon.pierce_armor || tag_flag(&attack.tags, tag::PIERCE_ARMOR) {
        soak.armor_pierced = true;
    } else {
        let armor_dice = defender.equipment_tier.min(MAX_ARMOR_DICE);
        if armor_dice > 0 {
            armor = DiceExpr::dice(armor_dice as i32, 3).roll(dice).total as i32;
            soak.armor_rolled = armor;
            let pct = tag_number(&attack.tags, tag::ARMOR_IGNORE_PCT).unwrap_or(0.0);
            if pct > 0.0 {
                let cut = (armor as f64 * pct).floor() as i32;
                armor = (armor - cut).max(0);
                soak.armor_cut = cut;
            }
        }
    }

    if defender.weapon == WeaponKind::Polearm {
        soak.polearm = DiceExpr::dice(1, 20).roll(dice).total as i32;
        defense += soak.polearm as f64;
    }

    if action == ActionKind::Ranged {
        if attacker.weapon.is_bow_like() {
            let reduce = (defense / 2.0).floor();
            defense = (defense - reduce).max(0.0);
            soak.bow_reduction = reduce as i32;
        }
        if attacker.weapon.is_gunpowder() {
            soak.firearm_ignored = defense;
            defense = 0.0;
        }
        soak.ranged_resist = def.ranged_resist.roll(dice).total;
    }

    if action == ActionKind::Melee
        && attacker.role == Role::Mounted
        && tag_flag(&attack.tags, tag::CHARGED)
        && tag_flag(&def.tags, tag::BRACED)
        && defender.weapon == WeaponKind::Polearm
    {
        soak.counter_charge = DiceExpr::dice(2, 20).roll(dice).total as i32;
        log(format!(
            "[DEF][{}] braced polearms meet the charge: {} back to {}",
            defender.name, soak.counter_charge, attacker.name
        ));
    }

    soak.total = defense.max(0.0) + armor.max(0) as f64 + soak.ranged_resist.max(0.0);
    log(format!(
        "[DEF][{}] defense {:+} armor {} resist {:+} = soak {}",
        defender.name, defense, armor, soak.ranged_resist, soak.total
    ));
    soak
}
