use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub mod aggregate;
pub mod api;
pub mod checks;
pub mod combat;
pub mod command;
pub mod content;
pub mod cooldowns;
pub mod effects;
pub mod error;
pub mod expr;
pub mod hob;
pub mod life;
pub mod maneuvers;
pub mod ops;
pub mod report;
pub mod unit;

pub use aggregate::{AttackMods, DefenseMods, ModStack};
pub use api::{Engine, MemoryStore, NoSelection, TargetResolver, UnitId, UnitStore};
pub use checks::{ActionKind, CheckResult, Difficulty, TnBreakdown};
pub use command::{Command, CommandReport, CpTarget};
pub use content::Rules;
pub use cooldowns::Cooldowns;
pub use effects::{Effect, EffectMods, Polarity, Tags};
pub use error::EngineError;
pub use expr::{DiceExpr, DiceTerm, RollResult};
pub use maneuvers::{ManeuverDef, ManeuverListing};
pub use report::{ActionReport, CollectingRenderer, EventReport, Renderer, SoakBreakdown, TracingRenderer};
pub use unit::{CommandPoints, Role, StandingOrder, ThresholdEvent, Unit, WeaponKind};

enum Source {
    Seeded(ChaCha8Rng),
    Scripted { values: Vec<i32>, next: usize },
}

/// Random source for every draw the engine makes.
///
/// A scripted source replays its values in order and wraps around when exhausted,
/// which lets tests pin each die face of a whole resolution.
pub struct Dice {
    source: Source,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self { source: Source::Seeded(ChaCha8Rng::seed_from_u64(seed)) }
    }

    pub fn from_scripted(values: Vec<i32>) -> Self {
        Self { source: Source::Scripted { values, next: 0 } }
    }

    fn scripted_next(values: &[i32], next: &mut usize) -> i32 {
        if values.is_empty() {
            return 1;
        }
        let v = values[*next % values.len()];
        *next += 1;
        v
    }

    /// One face of an `sides`-sided die.
    pub fn roll_die(&mut self, sides: u32) -> i32 {
        match &mut self.source {
            Source::Seeded(rng) => rng.gen_range(1..=sides.max(1)) as i32,
            Source::Scripted { values, next } => Self::scripted_next(values, next),
        }
    }

    pub fn d100(&mut self) -> i32 {
        self.roll_die(100)
    }

    /// Uniform index into a pool of `len` entries. Scripted values are 1-based.
    pub fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        match &mut self.source {
            Source::Seeded(rng) => rng.gen_range(0..len),
            Source::Scripted { values, next } => {
                let v = Self::scripted_next(values, next) as i64;
                (v - 1).rem_euclid(len as i64) as usize
            }
        }
    }
}
