use serde_json::json;
use squad_engine::combat::resolve_attack;
use squad_engine::hob::EventPool;
use squad_engine::{ActionKind, Dice, Effect, Role, Rules, Unit, WeaponKind};

fn rules() -> Rules {
    Rules::builtin().unwrap()
}

fn effect(value: serde_json::Value) -> Effect {
    serde_json::from_value(value).unwrap()
}

#[test]
fn infantry_sword_hit_lands_damage_and_morale() {
    let rules = rules();
    let mut actor = Unit::new("Alpha", Role::Infantry, WeaponKind::Sword);
    let mut target = Unit::new("Bravo", Role::Infantry, WeaponKind::Sword);
    // role acc, d100, chip, 1d20 base, sword 1d10, role 1d10, morale 1d20
    let mut dice = Dice::from_scripted(vec![5, 30, 4, 10, 6, 3, 7]);

    let report = resolve_attack(&mut dice, &rules, &mut actor, Some(&mut target), ActionKind::Melee);

    assert_eq!(report.tn, 45);
    assert_eq!(report.roll, 30);
    assert!(report.success);
    assert_eq!(report.margin, 15);
    assert_eq!(report.damage, Some(19));
    assert_eq!(report.hits, 1);
    assert_eq!(report.morale_loss, Some(26));
    assert_eq!(target.hp, 81);
    assert_eq!(target.morale, 24);
    assert_eq!(actor.last_target.as_deref(), Some("Bravo"));
    assert_eq!(report.soak.as_ref().map(|s| s.total), Some(0.0));
    assert!(report.events.is_empty());
    assert!(report.log.iter().any(|l| l.starts_with("[DMG][Bravo] 100 → 81")));
}

#[test]
fn miss_still_chips_the_target() {
    let rules = rules();
    let mut actor = Unit::new("Alpha", Role::Infantry, WeaponKind::Sword);
    let mut target = Unit::new("Bravo", Role::Infantry, WeaponKind::Sword);
    let mut dice = Dice::from_scripted(vec![5, 80, 4, 9]);

    let report = resolve_attack(&mut dice, &rules, &mut actor, Some(&mut target), ActionKind::Melee);

    assert!(!report.success);
    assert_eq!(report.damage, Some(4));
    assert_eq!(report.morale_loss, Some(13));
    assert_eq!(target.hp, 96);
    assert_eq!(target.morale, 37);
    assert!(report.soak.is_none());
}

#[test]
fn no_target_means_no_damage_applied() {
    let rules = rules();
    let mut actor = Unit::new("Alpha", Role::Infantry, WeaponKind::Sword);
    actor.effects.push(effect(json!({ "key": "brief", "label": "Brief" })));
    actor.cooldowns.set("mordhau", 2);
    let mut dice = Dice::from_scripted(vec![5, 30, 4, 10, 6, 3]);

    let report = resolve_attack(&mut dice, &rules, &mut actor, None, ActionKind::Melee);

    assert!(report.success);
    assert_eq!(report.target, None);
    assert_eq!(report.hits, 0);
    assert_eq!(report.morale_loss, None);
    assert!(report.soak.is_none());
    assert_eq!(actor.last_target, None);
    assert!(actor.effects.is_empty());
    assert_eq!(actor.cooldowns.remaining("mordhau"), 1);
}

#[test]
fn firearm_pierces_armor_and_ignores_defense() {
    let rules = rules();
    let mut actor = Unit::new("Musketeers", Role::Ranged, WeaponKind::Firearm);
    let mut target = Unit::new("Knights", Role::Infantry, WeaponKind::Sword);
    target.equipment_tier = 3;
    // role acc, d100, chip, base d20, firearm 1d20, role dmg, morale
    let mut dice = Dice::from_scripted(vec![5, 20, 3, 10, 15, 4, 2]);

    let report = resolve_attack(&mut dice, &rules, &mut actor, Some(&mut target), ActionKind::Ranged);

    let soak = report.soak.clone().unwrap();
    assert!(soak.armor_pierced);
    assert_eq!(soak.armor_rolled, 0);
    assert_eq!(soak.total, 0.0);
    assert_eq!(report.damage, Some(29));
    assert_eq!(target.hp, 71);
    assert_eq!(target.morale, 19);
}

#[test]
fn bows_halve_defense_only() {
    let rules = rules();
    let mut actor = Unit::new("Archers", Role::Ranged, WeaponKind::Bow);
    let mut target = Unit::new("Veterans", Role::Infantry, WeaponKind::Sword);
    target.experience_tier = 3;
    // role acc, d100, chip, base d20, role dmg, 3d6 defense, morale
    let mut dice = Dice::from_scripted(vec![5, 20, 1, 10, 4, 3, 3, 4, 2]);

    let report = resolve_attack(&mut dice, &rules, &mut actor, Some(&mut target), ActionKind::Ranged);

    let soak = report.soak.clone().unwrap();
    assert_eq!(soak.base_defense, 10);
    assert_eq!(soak.bow_reduction, 5);
    assert_eq!(soak.total, 5.0);
    assert_eq!(report.damage, Some(9));
    assert_eq!(report.morale_loss, Some(11));
    assert_eq!(target.hp, 91);
}

#[test]
fn armor_rolls_d3_per_equipment_tier_and_can_be_cut() {
    let rules = rules();
    let mut actor = Unit::new("Pikes", Role::Infantry, WeaponKind::Polearm);
    actor.effects.push(effect(json!({ "key": "pole-prec", "label": "Precise Hits", "mods": { "dmg_dice": "+1d10", "tags": { "armor_ignore_pct": 0.25 } } })));
    let mut target = Unit::new("Plate", Role::Infantry, WeaponKind::Sword);
    target.equipment_tier = 4;
    // role acc, d100, chip, base d20, role dmg, effect dmg, 4d3 armor, morale
    let mut dice = Dice::from_scripted(vec![5, 30, 2, 18, 8, 6, 3, 3, 3, 3, 1]);

    let report = resolve_attack(&mut dice, &rules, &mut actor, Some(&mut target), ActionKind::Melee);

    let soak = report.soak.clone().unwrap();
    assert_eq!(soak.armor_rolled, 12);
    assert_eq!(soak.armor_cut, 3);
    assert_eq!(soak.total, 9.0);
    assert_eq!(report.damage, Some(23));
}

#[test]
fn braced_polearms_punish_a_mounted_charge() {
    let rules = rules();
    let mut actor = Unit::new("Lancers", Role::Mounted, WeaponKind::Lance);
    actor.effects.push(effect(json!({
        "key": "charge", "label": "Charge",
        "mods": { "tn_dice": "+1d20", "dmg_dice": "+1d20", "tags": { "charged": true } }
    })));
    let mut target = Unit::new("Pikes", Role::Infantry, WeaponKind::Polearm);
    target.effects.push(effect(json!({
        "key": "brace", "label": "Brace",
        "mods": { "def_soak_dice": "+1d10", "tags": { "braced": true } }
    })));
    // role acc, charge tn, d100, chip, base, role dmg, charge dmg,
    // brace soak, polearm d20, counter 2d20, morale
    let mut dice = Dice::from_scripted(vec![5, 10, 30, 2, 15, 5, 10, 4, 6, 7, 8, 5]);

    let report = resolve_attack(&mut dice, &rules, &mut actor, Some(&mut target), ActionKind::Melee);

    let soak = report.soak.clone().unwrap();
    assert_eq!(report.tn, 55);
    assert_eq!(soak.defense_effect, 4.0);
    assert_eq!(soak.polearm, 6);
    assert_eq!(soak.counter_charge, 15);
    assert_eq!(soak.total, 10.0);
    assert_eq!(report.damage, Some(20));
    assert_eq!(actor.hp, 85);
    assert_eq!(target.hp, 80);
    assert_eq!(target.morale, 25);
    assert!(actor.effects.is_empty());
}

#[test]
fn feint_halves_the_running_subtotal() {
    let rules = rules();
    let mut actor = Unit::new("Raiders", Role::Hybrid, WeaponKind::Sword);
    actor.effects.push(effect(json!({
        "key": "feint", "label": "Feint & Retreat",
        "mods": { "dmg_dice": "-1/2", "tags": { "disengaged": true } }
    })));
    let mut target = Unit::new("Bravo", Role::Infantry, WeaponKind::Sword);
    // hybrid penalty, d100, chip, base, sword dmg, morale
    let mut dice = Dice::from_scripted(vec![5, 20, 1, 15, 6, 3]);

    let report = resolve_attack(&mut dice, &rules, &mut actor, Some(&mut target), ActionKind::Melee);

    assert_eq!(report.tn, 35);
    assert_eq!(report.damage, Some(10));
    assert_eq!(target.hp, 90);
    assert_eq!(target.morale, 37);
}

#[test]
fn feint_halves_before_other_effect_dice_are_added() {
    let rules = rules();
    let mut actor = Unit::new("Raiders", Role::Hybrid, WeaponKind::Sword);
    actor.effects.push(effect(json!({
        "key": "feint", "label": "Feint & Retreat",
        "mods": { "dmg_dice": "-1/2", "tags": { "disengaged": true } }
    })));
    actor.effects.push(effect(json!({
        "key": "hob-killer-instinct", "label": "Killer Instinct",
        "mods": { "dmg_dice": "+2d10" }
    })));
    let mut target = Unit::new("Bravo", Role::Infantry, WeaponKind::Sword);
    // hybrid penalty, d100, chip, base, sword dmg, 2d10 effect, morale
    let mut dice = Dice::from_scripted(vec![5, 20, 1, 15, 6, 4, 4, 3]);

    let report = resolve_attack(&mut dice, &rules, &mut actor, Some(&mut target), ActionKind::Melee);

    // (15 + 6) / 2 + 8
    assert_eq!(report.damage, Some(18));
    assert_eq!(target.hp, 82);
    assert_eq!(target.morale, 29);
    assert!(report.log.iter().any(|l| l.contains("role halved")));
}

#[test]
fn huge_experience_tiers_resolve() {
    let rules = rules();
    let mut actor = Unit::new("Ancients", Role::Infantry, WeaponKind::Sword);
    actor.experience_tier = u32::MAX;
    actor.equipment_tier = u32::MAX;
    let mut target = Unit::new("Elders", Role::Infantry, WeaponKind::Sword);
    target.experience_tier = u32::MAX;
    target.equipment_tier = u32::MAX;
    let mut dice = Dice::from_seed(11);

    let report = resolve_attack(&mut dice, &rules, &mut actor, Some(&mut target), ActionKind::Melee);

    assert_eq!(report.tn, 125);
    assert!(report.damage.is_some_and(|d| d >= 1));
    assert!((0..=100).contains(&target.hp));
}

#[test]
fn low_hp_scales_damage_down() {
    let rules = rules();
    let mut actor = Unit::new("Alpha", Role::Infantry, WeaponKind::Sword);
    actor.set_hp(50);
    let mut target = Unit::new("Bravo", Role::Infantry, WeaponKind::Sword);
    let mut dice = Dice::from_scripted(vec![5, 30, 4, 10, 6, 4, 1]);

    let report = resolve_attack(&mut dice, &rules, &mut actor, Some(&mut target), ActionKind::Melee);

    // 20 raw × (0.2 + 0.8 × 0.5)
    assert_eq!(report.damage, Some(12));
}

#[test]
fn crossbow_volley_lands_two_half_hits() {
    let rules = rules();
    let mut actor = Unit::new("Arbalests", Role::Ranged, WeaponKind::Crossbow);
    actor.effects.push(effect(json!({
        "key": "xbow-volley", "label": "Volley Fire",
        "mods": { "tags": { "multi_shot": 2, "multi_shot_half": true } }
    })));
    let mut target = Unit::new("Bravo", Role::Infantry, WeaponKind::Sword);
    let mut dice = Dice::from_scripted(vec![5, 20, 1, 14, 6, 2, 3]);

    let report = resolve_attack(&mut dice, &rules, &mut actor, Some(&mut target), ActionKind::Ranged);

    assert_eq!(report.damage, Some(20));
    assert_eq!(report.hits, 2);
    assert_eq!(target.hp, 80);
    assert_eq!(report.morale_loss, Some(13));
    assert_eq!(target.morale, 25);
}

#[test]
fn continuous_fire_halves_final_damage() {
    let rules = rules();
    let mut actor = Unit::new("Guns", Role::Ranged, WeaponKind::Firearm);
    actor.effects.push(effect(json!({
        "key": "cont", "label": "Continuous Fire", "duration": 3,
        "mods": { "tags": { "half_damage": true } }
    })));
    let mut target = Unit::new("Bravo", Role::Infantry, WeaponKind::Sword);
    let mut dice = Dice::from_scripted(vec![5, 20, 3, 10, 15, 4, 2]);

    let report = resolve_attack(&mut dice, &rules, &mut actor, Some(&mut target), ActionKind::Ranged);

    assert_eq!(report.damage, Some(14));
    assert_eq!(actor.effects[0].duration, 2);
}

#[test]
fn double_on_a_hit_fires_one_good_event() {
    let rules = rules();
    let mut actor = Unit::new("Alpha", Role::Infantry, WeaponKind::Sword);
    let mut target = Unit::new("Bravo", Role::Infantry, WeaponKind::Sword);
    // role acc, d100=44, pool pick, immediate tn 2d10, immediate dmg 2d10, chip, base, sword, role, morale
    let mut dice = Dice::from_scripted(vec![5, 44, 1, 3, 4, 5, 6, 2, 10, 6, 3, 7]);

    let report = resolve_attack(&mut dice, &rules, &mut actor, Some(&mut target), ActionKind::Melee);

    assert!(report.success);
    assert_eq!(report.events.len(), 1);
    let event = &report.events[0];
    assert_eq!(event.pool, EventPool::Good);
    assert_eq!(event.key, "critical_push");
    assert_eq!(event.immediate_tn.as_ref().map(|r| r.total), Some(7.0));
    assert_eq!(event.immediate_damage.as_ref().map(|r| r.total), Some(11.0));
    assert_eq!(report.damage, Some(19));
}

#[test]
fn heat_of_battle_can_be_switched_off() {
    let mut rules = rules();
    rules.settings.enable_heat_of_battle = false;
    let mut actor = Unit::new("Alpha", Role::Infantry, WeaponKind::Sword);
    actor.set_hp(10);
    let mut target = Unit::new("Bravo", Role::Infantry, WeaponKind::Sword);
    let mut dice = Dice::from_scripted(vec![5, 44, 4, 10, 6, 3, 7]);

    let report = resolve_attack(&mut dice, &rules, &mut actor, Some(&mut target), ActionKind::Melee);

    assert!(report.events.is_empty());
    assert!(actor.triggered.is_empty());
}
