//! Commander orders paid for with command points.

use serde::{Deserialize, Serialize};

use crate::checks::ActionKind;
use crate::combat::resolve_attack;
use crate::content::Rules;
use crate::effects::{tag, Effect, EffectMods, Tags};
use crate::error::EngineError;
use crate::expr::DiceExpr;
use crate::ops::{apply_ops, Op, Recipient};
use crate::report::ActionReport;
use crate::unit::{CommandPoints, StandingOrder, Unit};
use crate::Dice;

pub const RANGED_PREEMPT_COOLDOWN: &str = "cmd_ranged_preempt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpTarget {
    Value(i32),
    Cap,
}

impl CommandPoints {
    fn bounded(&self, value: i32) -> i32 {
        if self.cap > 0 { value.clamp(0, self.cap) } else { value.max(0) }
    }

    pub fn can_afford(&self, amount: i32) -> bool {
        self.current >= amount
    }

    /// Pay `amount`, or leave the wallet untouched and report the shortfall.
    pub fn spend(&mut self, amount: i32) -> Result<(), EngineError> {
        if !self.can_afford(amount) {
            return Err(EngineError::InsufficientCommandPoints {
                needed: amount,
                available: self.current,
            });
        }
        self.current = (self.current - amount).max(0);
        Ok(())
    }

    pub fn adjust(&mut self, delta: i32) {
        self.current = self.bounded(self.current.saturating_add(delta));
    }

    pub fn set_to(&mut self, target: CpTarget) {
        let value = match target {
            CpTarget::Value(v) => v,
            CpTarget::Cap => self.cap,
        };
        self.current = self.bounded(value);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// The squad looses a ranged attack at once.
    RangedFire,
    Orders { order: StandingOrder },
    Reorganize,
    Rally,
    Withdraw,
    Special { note: String },
    Formation,
}

impl Command {
    pub fn key(&self) -> &'static str {
        match self {
            Command::RangedFire => "ranged_fire",
            Command::Orders { .. } => "orders",
            Command::Reorganize => "reorganize",
            Command::Rally => "rally",
            Command::Withdraw => "withdraw",
            Command::Special { .. } => "special",
            Command::Formation => "formation",
        }
    }

    pub fn cost(&self) -> i32 {
        match self {
            Command::RangedFire | Command::Formation => 2,
            _ => 1,
        }
    }

    /// Unit changes the command makes on the squad.
    pub fn ops(&self) -> Vec<Op> {
        let to = Recipient::Actor;
        match self {
            Command::Reorganize => vec![
                Op::ClearNegative { to },
                Op::GainMorale { to, dice: DiceExpr::dice(2, 20) },
            ],
            Command::Rally => vec![Op::GainMorale { to, dice: DiceExpr::dice(1, 20) }],
            Command::Withdraw => {
                let mut tags = Tags::new();
                tags.insert(tag::DISENGAGED.to_string(), serde_json::Value::Bool(true));
                let mods = EffectMods {
                    def_soak_dice: Some(DiceExpr::dice(1, 10)),
                    tags,
                    ..EffectMods::default()
                };
                vec![
                    Op::RemoveTagged {
                        to,
                        tags: vec![tag::FLANKED.to_string(), tag::ENCIRCLED.to_string()],
                    },
                    Op::AddEffect { to, effect: Effect::new("cmd-withdraw", "Withdraw", 1, mods) },
                ]
            }
            Command::Formation => {
                let mods = EffectMods {
                    maneuver_tn_dice: Some(DiceExpr::dice(8, 10)),
                    ..EffectMods::default()
                };
                vec![Op::AddEffect {
                    to,
                    effect: Effect::new("cmd-formation", "Get in Formation!", 1, mods),
                }]
            }
            Command::RangedFire | Command::Orders { .. } | Command::Special { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub squad: String,
    pub cost: i32,
    /// Commander's command points after paying.
    pub cp_left: i32,
    pub applied: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack: Option<ActionReport>,
    pub log: Vec<String>,
}

/// Carry out `command` on `squad`. Paying for it is the caller's job.
pub fn execute_command(
    dice: &mut Dice,
    rules: &Rules,
    command: &Command,
    squad: &mut Unit,
    target: Option<&mut Unit>,
) -> CommandReport {
    let mut lines = vec![format!("[CMD][{}] {} ({} CP)", squad.name, command.key(), command.cost())];
    let mut applied = Vec::new();
    let mut attack = None;

    match command {
        Command::RangedFire => {
            let report = resolve_attack(dice, rules, squad, target, ActionKind::Ranged);
            lines.extend(report.log.iter().cloned());
            squad.cooldowns.set(RANGED_PREEMPT_COOLDOWN, 1);
            applied.push(format!("{} (1 round)", RANGED_PREEMPT_COOLDOWN));
            attack = Some(report);
        }
        Command::Orders { order } => {
            squad.standing_order = Some(*order);
            lines.push(format!("[CMD][{}] standing order: {:?}", squad.name, order));
            applied.push(format!("order {:?}", order).to_lowercase());
        }
        Command::Special { note } => {
            lines.push(format!("[CMD][{}] special action: {}", squad.name, note));
            applied.push(note.clone());
        }
        _ => {
            applied = apply_ops(dice, &command.ops(), squad, None, |m| lines.push(m));
        }
    }

    tracing::debug!(squad = %squad.name, command = command.key(), "command executed");
    CommandReport {
        command: command.key().to_string(),
        squad: squad.name.clone(),
        cost: command.cost(),
        cp_left: 0,
        applied,
        attack,
        log: lines,
    }
}
