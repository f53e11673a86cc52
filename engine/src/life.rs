use crate::unit::Unit;

/// Apply HP damage, clamped at 0. Returns the HP actually lost.
pub fn apply_damage(unit: &mut Unit, dmg: i32, mut log: impl FnMut(String)) -> i32 {
    let before = unit.hp;
    unit.set_hp(before - dmg.max(0));
    log(format!(
        "[DMG][{}] {} → {} (−{})",
        unit.name, before, unit.hp, dmg
    ));
    if before > 0 && unit.hp == 0 {
        log(format!("[STATE][{}] is wiped out (0 HP)", unit.name));
    }
    before - unit.hp
}

/// Healing, clamped at `hp_max`.
pub fn heal(unit: &mut Unit, amount: i32, mut log: impl FnMut(String)) -> i32 {
    if amount <= 0 {
        return 0;
    }
    let before = unit.hp;
    unit.set_hp(before + amount);
    log(format!(
        "[HEAL][{}] +{} HP ({} → {})",
        unit.name, amount, before, unit.hp
    ));
    unit.hp - before
}

pub fn lose_morale(unit: &mut Unit, amount: i32, mut log: impl FnMut(String)) -> i32 {
    let before = unit.morale;
    unit.set_morale(before - amount.max(0));
    log(format!(
        "[MORALE][{}] {} → {} (−{})",
        unit.name, before, unit.morale, amount
    ));
    if before > 0 && unit.morale == 0 {
        log(format!("[STATE][{}] breaks (0 morale)", unit.name));
    }
    before - unit.morale
}

pub fn gain_morale(unit: &mut Unit, amount: i32, mut log: impl FnMut(String)) -> i32 {
    if amount <= 0 {
        return 0;
    }
    let before = unit.morale;
    unit.set_morale(before + amount);
    log(format!(
        "[MORALE][{}] +{} ({} → {})",
        unit.name, amount, before, unit.morale
    ));
    unit.morale - before
}
