use std::{collections::HashMap, collections::HashSet, fs, path::Path};

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::expr::DiceExpr;
use crate::hob::{EventPool, HobPools};
use crate::maneuvers::{Category, ManeuverDef};
use crate::unit::{Role, WeaponKind};

pub fn builtin_content() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("rules", include_str!("../content/rules.yaml")),
        ("maneuvers", include_str!("../content/maneuvers.yaml")),
        ("heat_of_battle", include_str!("../content/heat_of_battle.yaml")),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollConstants {
    pub base_tn: i32,
    pub min_tn: i32,
    pub max_tn: i32,
}

impl Default for RollConstants {
    fn default() -> Self {
        Self { base_tn: 40, min_tn: 5, max_tn: 125 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scaling {
    /// Share of damage a unit at 0 HP still deals.
    pub hp_floor: f64,
}

impl Default for Scaling {
    fn default() -> Self {
        Self { hp_floor: 0.20 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "enabled")]
    pub enable_heat_of_battle: bool,
}

fn enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self { enable_heat_of_battle: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeaponDef {
    pub label: String,
    #[serde(default)]
    pub accuracy_dice: DiceExpr,
    #[serde(default)]
    pub dmg_dice: DiceExpr,
    #[serde(default)]
    pub pierce_armor: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleDef {
    pub label: String,
    #[serde(default)]
    pub hybrid_penalty: bool,
}

#[derive(Debug, Deserialize)]
struct CoreFile {
    #[serde(default)]
    roll: RollConstants,
    #[serde(default)]
    scaling: Scaling,
    #[serde(default)]
    settings: Settings,
    weapons: IndexMap<WeaponKind, WeaponDef>,
    roles: IndexMap<Role, RoleDef>,
}

#[derive(Debug, Deserialize)]
struct ManeuverFile {
    maneuvers: Vec<ManeuverDef>,
}

/// Every static table the pipelines read: roll constants, weapon and role tables,
/// the maneuver catalog and the Heat of Battle pools.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rules {
    pub roll: RollConstants,
    pub scaling: Scaling,
    pub settings: Settings,
    pub weapons: IndexMap<WeaponKind, WeaponDef>,
    pub roles: IndexMap<Role, RoleDef>,
    pub maneuvers: Vec<ManeuverDef>,
    pub heat_of_battle: HobPools,
}

impl Rules {
    /// Catalogs compiled into the crate.
    pub fn builtin() -> Result<Self> {
        let content = builtin_content();
        Self::from_yaml_strs(
            content["rules"],
            content["maneuvers"],
            content["heat_of_battle"],
        )
        .context("builtin content is invalid")
    }

    pub fn from_yaml_strs(core: &str, maneuvers: &str, heat_of_battle: &str) -> Result<Self> {
        let core: CoreFile = serde_yaml::from_str(core).context("failed to parse rules YAML")?;
        let maneuvers: ManeuverFile =
            serde_yaml::from_str(maneuvers).context("failed to parse maneuvers YAML")?;
        let heat_of_battle: HobPools =
            serde_yaml::from_str(heat_of_battle).context("failed to parse heat of battle YAML")?;
        let rules = Rules {
            roll: core.roll,
            scaling: core.scaling,
            settings: core.settings,
            weapons: core.weapons,
            roles: core.roles,
            maneuvers: maneuvers.maneuvers,
            heat_of_battle,
        };
        rules.validate()?;
        Ok(rules)
    }

    pub fn from_paths(
        core: impl AsRef<Path>,
        maneuvers: impl AsRef<Path>,
        heat_of_battle: impl AsRef<Path>,
    ) -> Result<Self> {
        let read = |path: &Path| {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        };
        Self::from_yaml_strs(
            &read(core.as_ref())?,
            &read(maneuvers.as_ref())?,
            &read(heat_of_battle.as_ref())?,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.roll.min_tn > self.roll.max_tn {
            bail!("min_tn {} exceeds max_tn {}", self.roll.min_tn, self.roll.max_tn);
        }
        if !(0.0..=1.0).contains(&self.scaling.hp_floor) {
            bail!("hp_floor {} is outside 0..=1", self.scaling.hp_floor);
        }
        let mut seen = HashSet::new();
        for m in &self.maneuvers {
            if !seen.insert(m.key.as_str()) {
                bail!("duplicate maneuver key '{}'", m.key);
            }
            if m.category == Category::Weapon && m.weapon_type.is_none() {
                bail!("weapon maneuver '{}' names no weapon_type", m.key);
            }
        }
        for pool in [EventPool::Good, EventPool::Bad, EventPool::LowHp, EventPool::LowMorale] {
            if self.heat_of_battle.pool(pool).is_empty() {
                bail!("heat of battle pool {:?} is empty", pool);
            }
        }
        Ok(())
    }

    /// Unknown weapons fall back to the sword entry.
    pub fn weapon(&self, kind: WeaponKind) -> WeaponDef {
        self.weapons
            .get(&kind)
            .or_else(|| self.weapons.get(&WeaponKind::Sword))
            .cloned()
            .unwrap_or_default()
    }

    /// Unknown roles fall back to the infantry entry.
    pub fn role(&self, role: Role) -> RoleDef {
        self.roles
            .get(&role)
            .or_else(|| self.roles.get(&Role::Infantry))
            .cloned()
            .unwrap_or_default()
    }

    pub fn maneuver(&self, key: &str) -> Option<&ManeuverDef> {
        self.maneuvers.iter().find(|m| m.key == key)
    }
}
