use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::cooldowns::Cooldowns;
use crate::effects::Effect;

/// Experience dice rolled for damage and defense stop growing past this tier.
pub const MAX_EXPERIENCE_DICE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Infantry,
    Ranged,
    Mounted,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    #[default]
    Sword,
    Axe,
    Polearm,
    Bow,
    Crossbow,
    Firearm,
    Artillery,
    Lance,
}

impl WeaponKind {
    pub fn is_bow_like(self) -> bool {
        matches!(self, WeaponKind::Bow | WeaponKind::Crossbow)
    }

    pub fn is_gunpowder(self) -> bool {
        matches!(self, WeaponKind::Firearm | WeaponKind::Artillery)
    }
}

/// One-shot Heat-of-Battle thresholds a unit has already crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThresholdEvent {
    #[serde(rename = "hob_hp30")]
    LowHp,
    #[serde(rename = "hob_mo30")]
    LowMorale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandingOrder {
    Melee,
    Ranged,
    Maneuver,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPoints {
    pub current: i32,
    pub cap: i32,
}

impl Default for CommandPoints {
    fn default() -> Self {
        Self { current: 3, cap: 6 }
    }
}

/// A squad record. Field writes that go through the setters keep
/// `0 <= hp <= hp_max` and `0 <= morale <= morale_max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Unit {
    pub name: String,
    pub hp: i32,
    pub hp_max: i32,
    pub morale: i32,
    pub morale_max: i32,
    pub experience_tier: u32,
    pub equipment_tier: u32,
    pub role: Role,
    pub weapon: WeaponKind,
    pub fear: bool,
    pub terror: bool,
    pub unbreakable: bool,
    pub is_commander: bool,
    pub effects: Vec<Effect>,
    pub cooldowns: Cooldowns,
    pub cp: CommandPoints,
    pub triggered: IndexSet<ThresholdEvent>,
    pub standing_order: Option<StandingOrder>,
    pub last_target: Option<String>,
}

impl Default for Unit {
    fn default() -> Self {
        Self {
            name: "Squad".to_string(),
            hp: 100,
            hp_max: 100,
            morale: 50,
            morale_max: 100,
            experience_tier: 0,
            equipment_tier: 0,
            role: Role::Infantry,
            weapon: WeaponKind::Sword,
            fear: false,
            terror: false,
            unbreakable: false,
            is_commander: false,
            effects: Vec::new(),
            cooldowns: Cooldowns::default(),
            cp: CommandPoints::default(),
            triggered: IndexSet::new(),
            standing_order: None,
            last_target: None,
        }
    }
}

impl Unit {
    pub fn new(name: impl Into<String>, role: Role, weapon: WeaponKind) -> Self {
        Self { name: name.into(), role, weapon, ..Self::default() }
    }

    pub fn experience_dice(&self) -> u32 {
        self.experience_tier.min(MAX_EXPERIENCE_DICE)
    }

    pub fn set_hp(&mut self, value: i32) {
        self.hp = value.clamp(0, self.hp_max.max(0));
    }

    pub fn set_morale(&mut self, value: i32) {
        self.morale = value.clamp(0, self.morale_max.max(0));
    }

    /// `hp / hp_max` in `[0, 1]`; 0 when `hp_max` is 0.
    pub fn hp_ratio(&self) -> f64 {
        if self.hp_max > 0 {
            (self.hp as f64 / self.hp_max as f64).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// `morale / morale_max`; `None` when `morale_max` is 0.
    pub fn morale_ratio(&self) -> Option<f64> {
        (self.morale_max > 0).then(|| self.morale as f64 / self.morale_max as f64)
    }
}
