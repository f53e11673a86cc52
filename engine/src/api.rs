use std::fs;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::checks::ActionKind;
use crate::combat::resolve_attack;
use crate::command::{execute_command, Command, CommandReport, CpTarget};
use crate::content::Rules;
use crate::effects::tick_effects;
use crate::error::EngineError;
use crate::maneuvers::{available_maneuvers, resolve_maneuver, ManeuverListing};
use crate::report::{ActionReport, CollectingRenderer, Renderer};
use crate::unit::{CommandPoints, Role, Unit};
use crate::Dice;

const DEFAULT_MAX_ROUNDS: u32 = 30;

pub type UnitId = String;

/// Where unit records live between resolutions.
pub trait UnitStore {
    fn load(&self, id: &str) -> Result<Unit, EngineError>;
    fn save(&mut self, id: &str, unit: Unit);
    fn ids(&self) -> Vec<UnitId>;
}

/// Insertion-ordered store that round-trips through JSON as `{ id: unit }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStore {
    units: IndexMap<UnitId, Unit>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<UnitId>, unit: Unit) {
        self.units.insert(id.into(), unit);
    }

    pub fn get(&self, id: &str) -> Option<&Unit> {
        self.units.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Unit)> {
        self.units.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse roster JSON")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize roster")
    }
}

impl UnitStore for MemoryStore {
    fn load(&self, id: &str) -> Result<Unit, EngineError> {
        self.units
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownUnit(id.to_string()))
    }

    fn save(&mut self, id: &str, unit: Unit) {
        self.units.insert(id.to_string(), unit);
    }

    fn ids(&self) -> Vec<UnitId> {
        self.units.keys().cloned().collect()
    }
}

/// The enemies currently picked by whoever drives the engine.
pub trait TargetResolver {
    fn current_selection(&self) -> Vec<UnitId>;
}

/// Nothing selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSelection;

impl TargetResolver for NoSelection {
    fn current_selection(&self) -> Vec<UnitId> {
        Vec::new()
    }
}

impl<T: AsRef<str>> TargetResolver for [T] {
    fn current_selection(&self) -> Vec<UnitId> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<T: AsRef<str>, const N: usize> TargetResolver for [T; N] {
    fn current_selection(&self) -> Vec<UnitId> {
        self.as_slice().current_selection()
    }
}

impl<T: AsRef<str>> TargetResolver for Vec<T> {
    fn current_selection(&self) -> Vec<UnitId> {
        self.as_slice().current_selection()
    }
}

/// Entry point tying the pipelines to their collaborators.
///
/// Every call loads the units it touches, runs on those copies and saves them back
/// only when the pipeline succeeds, so a rejected action leaves the store untouched.
pub struct Engine<S, R> {
    pub rules: Rules,
    pub dice: Dice,
    pub store: S,
    pub renderer: R,
}

impl<S: UnitStore, R: Renderer> Engine<S, R> {
    pub fn new(rules: Rules, dice: Dice, store: S, renderer: R) -> Self {
        Self { rules, dice, store, renderer }
    }

    pub fn unit(&self, id: &str) -> Result<Unit, EngineError> {
        self.store.load(id)
    }

    /// The selected enemy when exactly one other unit is selected.
    fn single_target<T>(&self, actor_id: &str, selection: &T) -> Result<Option<(UnitId, Unit)>, EngineError>
    where
        T: TargetResolver + ?Sized,
    {
        let picked = selection.current_selection();
        match picked.as_slice() {
            [only] if only != actor_id => {
                let unit = self.store.load(only)?;
                Ok(Some((only.clone(), unit)))
            }
            _ => Ok(None),
        }
    }

    fn save_target(&mut self, target: Option<(UnitId, Unit)>) {
        if let Some((id, unit)) = target {
            self.store.save(&id, unit);
        }
    }

    pub fn attack<T>(&mut self, actor_id: &str, selection: &T, action: ActionKind) -> Result<ActionReport, EngineError>
    where
        T: TargetResolver + ?Sized,
    {
        let mut actor = self.store.load(actor_id)?;
        let mut target = self.single_target(actor_id, selection)?;
        let report = resolve_attack(
            &mut self.dice,
            &self.rules,
            &mut actor,
            target.as_mut().map(|(_, u)| u),
            action,
        );
        self.store.save(actor_id, actor);
        self.save_target(target);
        self.renderer.render(&report);
        Ok(report)
    }

    pub fn maneuver<T>(&mut self, actor_id: &str, key: &str, selection: &T) -> Result<ActionReport, EngineError>
    where
        T: TargetResolver + ?Sized,
    {
        let mut actor = self.store.load(actor_id)?;
        let mut target = self.single_target(actor_id, selection)?;
        let report = resolve_maneuver(
            &mut self.dice,
            &self.rules,
            key,
            &mut actor,
            target.as_mut().map(|(_, u)| u),
        )?;
        self.store.save(actor_id, actor);
        self.save_target(target);
        self.renderer.render(&report);
        Ok(report)
    }

    pub fn list_maneuvers(&self, actor_id: &str) -> Result<Vec<ManeuverListing>, EngineError> {
        let actor = self.store.load(actor_id)?;
        Ok(available_maneuvers(&self.rules, &actor))
    }

    /// Spend the commander's points and carry out `command` on `squad_id`.
    ///
    /// The wallet is checked before anything moves; the commander is reloaded before
    /// paying so a commander that is also the squad keeps the command's changes.
    pub fn issue_command<T>(
        &mut self,
        commander_id: &str,
        squad_id: &str,
        command: &Command,
        selection: &T,
    ) -> Result<CommandReport, EngineError>
    where
        T: TargetResolver + ?Sized,
    {
        let cost = command.cost();
        let commander = self.store.load(commander_id)?;
        if !commander.cp.can_afford(cost) {
            return Err(EngineError::InsufficientCommandPoints {
                needed: cost,
                available: commander.cp.current,
            });
        }

        let mut squad = self.store.load(squad_id)?;
        let mut target = self.single_target(squad_id, selection)?;
        let mut report = execute_command(
            &mut self.dice,
            &self.rules,
            command,
            &mut squad,
            target.as_mut().map(|(_, u)| u),
        );
        self.store.save(squad_id, squad);
        self.save_target(target);

        let mut commander = self.store.load(commander_id)?;
        commander.cp.spend(cost)?;
        report.cp_left = commander.cp.current;
        report.log.push(format!(
            "[CP][{}] spent {} ({} left)",
            commander.name, cost, commander.cp.current
        ));
        self.store.save(commander_id, commander);

        if let Some(attack) = &report.attack {
            self.renderer.render(attack);
        }
        tracing::info!(command = %report.command, squad = %report.squad, cp_left = report.cp_left, "command issued");
        Ok(report)
    }

    /// Round tick for every stored unit: effects and cooldowns decay by one.
    pub fn advance_round(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        for id in self.store.ids() {
            let Ok(mut unit) = self.store.load(&id) else {
                continue;
            };
            tick_effects(&unit.name, &mut unit.effects, |m| lines.push(m));
            unit.cooldowns.tick();
            self.store.save(&id, unit);
        }
        lines
    }

    pub fn adjust_cp(&mut self, id: &str, delta: i32) -> Result<CommandPoints, EngineError> {
        let mut unit = self.store.load(id)?;
        unit.cp.adjust(delta);
        let cp = unit.cp;
        self.store.save(id, unit);
        Ok(cp)
    }

    pub fn set_cp(&mut self, id: &str, target: CpTarget) -> Result<CommandPoints, EngineError> {
        let mut unit = self.store.load(id)?;
        unit.cp.set_to(target);
        let cp = unit.cp;
        self.store.save(id, unit);
        Ok(cp)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SkirmishConfig {
    pub attacker_path: String,
    pub defender_path: String,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub max_rounds: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SkirmishResult {
    pub winner: String,
    pub rounds: u32,
    pub attacker_hp_end: i32,
    pub defender_hp_end: i32,
    pub attacker_morale_end: i32,
    pub defender_morale_end: i32,
    pub log: Vec<String>,
}

pub fn load_unit(path: &str) -> Result<Unit> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read unit JSON: {}", path))?;
    let unit = serde_json::from_str(&text).with_context(|| format!("failed to parse unit JSON: {}", path))?;
    Ok(unit)
}

/// Ranged troops and missile weapons shoot; everyone else closes in.
pub fn preferred_action(unit: &Unit) -> ActionKind {
    if unit.role == Role::Ranged || unit.weapon.is_bow_like() || unit.weapon.is_gunpowder() {
        ActionKind::Ranged
    } else {
        ActionKind::Melee
    }
}

fn routed(unit: &Unit) -> bool {
    unit.hp <= 0 || (unit.morale <= 0 && !unit.unbreakable)
}

/// Two units trade attacks, attacker first, until one is wiped out or broken.
pub fn simulate_skirmish(cfg: SkirmishConfig) -> Result<SkirmishResult> {
    let attacker = load_unit(&cfg.attacker_path)?;
    let defender = load_unit(&cfg.defender_path)?;
    let mut store = MemoryStore::new();
    store.insert("attacker", attacker);
    store.insert("defender", defender);
    let mut engine = Engine::new(
        Rules::builtin()?,
        Dice::from_seed(cfg.seed),
        store,
        CollectingRenderer::default(),
    );

    let mut logs = Vec::new();
    let max_rounds = cfg.max_rounds.unwrap_or(DEFAULT_MAX_ROUNDS);
    let mut rounds = 0;
    {
        let a = engine.unit("attacker")?;
        let d = engine.unit("defender")?;
        logs.push(format!(
            "[START] {} (HP {}, Morale {}) vs {} (HP {}, Morale {})",
            a.name, a.hp, a.morale, d.name, d.hp, d.morale
        ));
    }

    while rounds < max_rounds {
        rounds += 1;
        logs.push(format!("[ROUND] {}", rounds));
        for (actor, target) in [("attacker", "defender"), ("defender", "attacker")] {
            let unit = engine.unit(actor)?;
            if routed(&unit) {
                continue;
            }
            let report = engine.attack(actor, &[target], preferred_action(&unit))?;
            logs.extend(report.log);
            if routed(&engine.unit(target)?) {
                break;
            }
        }
        logs.extend(engine.advance_round());
        if routed(&engine.unit("attacker")?) || routed(&engine.unit("defender")?) {
            break;
        }
    }

    let a = engine.unit("attacker")?;
    let d = engine.unit("defender")?;
    let winner = match (routed(&a), routed(&d)) {
        (false, true) => "attacker",
        (true, false) => "defender",
        _ => "draw",
    };
    logs.push(format!(
        "[END] winner={} attacker_hp={} defender_hp={} rounds={}",
        winner, a.hp, d.hp, rounds
    ));

    Ok(SkirmishResult {
        winner: winner.to_string(),
        rounds,
        attacker_hp_end: a.hp,
        defender_hp_end: d.hp,
        attacker_morale_end: a.morale,
        defender_morale_end: d.morale,
        log: logs,
    })
}
