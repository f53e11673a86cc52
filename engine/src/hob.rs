//! Heat of Battle: random battlefield events layered over percentile checks.

use serde::{Deserialize, Serialize};

use crate::checks::CheckResult;
use crate::expr::DiceExpr;
use crate::ops::{apply_ops, Op};
use crate::report::EventReport;
use crate::unit::{ThresholdEvent, Unit};
use crate::Dice;

/// Ratio at or under which the one-shot low HP / low morale events fire.
pub const LOW_THRESHOLD: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPool {
    Good,
    Bad,
    LowHp,
    LowMorale,
}

impl EventPool {
    pub fn heading(self) -> &'static str {
        match self {
            EventPool::Good => "Heat of Battle!",
            EventPool::Bad => "Heat of Battle: Setback",
            EventPool::LowHp => "Heat of Battle: Desperate Hour",
            EventPool::LowMorale => "Heat of Battle: Wavering Line",
        }
    }
}

/// Dice rolled for display when an event fires. They never feed back into the check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Immediate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tn: Option<DiceExpr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage: Option<DiceExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HobEvent {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ops: Vec<Op>,
    #[serde(default)]
    pub immediate: Immediate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HobPools {
    pub good: Vec<HobEvent>,
    pub bad: Vec<HobEvent>,
    pub low_hp: Vec<HobEvent>,
    pub low_morale: Vec<HobEvent>,
}

impl HobPools {
    pub fn pool(&self, pool: EventPool) -> &[HobEvent] {
        match pool {
            EventPool::Good => &self.good,
            EventPool::Bad => &self.bad,
            EventPool::LowHp => &self.low_hp,
            EventPool::LowMorale => &self.low_morale,
        }
    }
}

fn fire(
    dice: &mut Dice,
    pools: &HobPools,
    pool: EventPool,
    actor: &mut Unit,
    log: &mut impl FnMut(String),
) -> Option<EventReport> {
    let entries = pools.pool(pool);
    if entries.is_empty() {
        return None;
    }
    let event = &entries[dice.pick(entries.len())];
    log(format!("[HOB][{}] {}: {}", actor.name, pool.heading(), event.title));
    let summary = apply_ops(dice, &event.ops, actor, None, &mut *log);
    let immediate_tn = event.immediate.tn.as_ref().map(|e| e.roll(dice));
    let immediate_damage = event.immediate.damage.as_ref().map(|e| e.roll(dice));
    tracing::debug!(unit = %actor.name, event = %event.key, ?pool, "heat of battle");
    Some(EventReport {
        pool,
        key: event.key.clone(),
        title: event.title.clone(),
        text: event.text.clone(),
        summary,
        immediate_tn,
        immediate_damage,
    })
}

/// Fire every event the check earns. A double (11, 22, ... 99) draws from the good
/// pool on success and the bad pool on failure; then the low HP and low morale pools
/// fire once per unit, the first time each ratio is at or under 30%.
pub fn trigger(
    dice: &mut Dice,
    pools: &HobPools,
    actor: &mut Unit,
    check: &CheckResult,
    mut log: impl FnMut(String),
) -> Vec<EventReport> {
    let mut events = Vec::new();

    if check.double {
        let pool = if check.success { EventPool::Good } else { EventPool::Bad };
        events.extend(fire(dice, pools, pool, actor, &mut log));
    }

    let low_hp = actor.hp_max > 0 && actor.hp_ratio() <= LOW_THRESHOLD;
    if low_hp && actor.triggered.insert(ThresholdEvent::LowHp) {
        events.extend(fire(dice, pools, EventPool::LowHp, actor, &mut log));
    }

    let low_morale = actor.morale_ratio().is_some_and(|r| r <= LOW_THRESHOLD);
    if low_morale && actor.triggered.insert(ThresholdEvent::LowMorale) {
        events.extend(fire(dice, pools, EventPool::LowMorale, actor, &mut log));
    }

    events
}
