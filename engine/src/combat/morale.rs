use crate::expr::DiceExpr;
use crate::life;
use crate::unit::Unit;
use crate::Dice;

/// Morale a defender loses from `damage`, or `None` when the defender is unbreakable.
///
/// `damage + 1d20`, then `+1d10` for a fearsome attacker, `+3d10` for a terrifying
/// one, and a further `+1d10` when a terrifying defender faces a merely fearsome
/// attacker. That last term adds to the defender's loss as written.
pub fn morale_loss_for(dice: &mut Dice, attacker: &Unit, defender: &Unit, damage: i32) -> Option<i32> {
    if defender.unbreakable {
        return None;
    }
    let mut total = damage + DiceExpr::dice(1, 20).roll(dice).total as i32;
    if attacker.fear {
        total += DiceExpr::dice(1, 10).roll(dice).total as i32;
    }
    if attacker.terror {
        total += DiceExpr::dice(3, 10).roll(dice).total as i32;
    }
    if defender.terror && attacker.fear && !attacker.terror {
        total += DiceExpr::dice(1, 10).roll(dice).total as i32;
    }
    Some(total)
}

/// Land one hit: HP first, then the morale loss it causes.
pub fn apply_hit(
    dice: &mut Dice,
    attacker: &Unit,
    defender: &mut Unit,
    damage: i32,
    mut log: impl FnMut(String),
) -> Option<i32> {
    life::apply_damage(defender, damage, &mut log);
    let loss = morale_loss_for(dice, attacker, defender, damage);
    match loss {
        Some(loss) => {
            life::lose_morale(defender, loss, &mut log);
        }
        None => log(format!("[MORALE][{}] unbreakable, holds firm", defender.name)),
    }
    loss
}
