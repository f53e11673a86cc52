use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use encoding_rs::Encoding;
use serde::Serialize;
use squad_engine::expr::roll_expr;
use squad_engine::{
    ActionKind, Command, CpTarget, Dice, Engine, MemoryStore, Rules, StandingOrder, TracingRenderer,
};
use std::{fs, path::Path, path::PathBuf};

#[derive(Copy, Clone, ValueEnum)]
enum Order {
    Melee,
    Ranged,
    Maneuver,
    Hold,
}

impl From<Order> for StandingOrder {
    fn from(o: Order) -> Self {
        match o {
            Order::Melee => StandingOrder::Melee,
            Order::Ranged => StandingOrder::Ranged,
            Order::Maneuver => StandingOrder::Maneuver,
            Order::Hold => StandingOrder::Hold,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum CommandKind {
    RangedFire,
    Orders,
    Reorganize,
    Rally,
    Withdraw,
    Special,
    Formation,
}

#[derive(Subcommand)]
enum Cmd {
    /// Roll a dice expression such as "2d10+5"
    Roll {
        expr: String,
        /// Number of rolls
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
    /// Melee or ranged attack from one unit against another
    Attack {
        #[arg(long)]
        actor: String,
        /// Selected enemy; omit to attack with nothing selected
        #[arg(long)]
        target: Option<String>,
        #[arg(long, default_value_t = false)]
        ranged: bool,
    },
    /// Attempt a maneuver from the catalog
    Maneuver {
        #[arg(long)]
        actor: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        target: Option<String>,
    },
    /// List the maneuvers a unit can see, with cooldowns
    Maneuvers {
        #[arg(long)]
        actor: String,
    },
    /// Spend a commander's CP on a squad
    Command {
        #[arg(long)]
        commander: String,
        #[arg(long)]
        squad: String,
        #[arg(long, value_enum)]
        kind: CommandKind,
        /// Standing order for `orders`
        #[arg(long, value_enum)]
        order: Option<Order>,
        /// Free text for `special`
        #[arg(long)]
        note: Option<String>,
        /// Enemy for `ranged-fire`
        #[arg(long)]
        target: Option<String>,
    },
    /// End the round: effects and cooldowns of every unit decay
    Tick,
    /// Adjust or set a unit's command points
    Cp {
        #[arg(long)]
        unit: String,
        #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["set", "refill"])]
        add: Option<i32>,
        #[arg(long, conflicts_with = "refill")]
        set: Option<i32>,
        /// Fill up to the cap
        #[arg(long, default_value_t = false)]
        refill: bool,
    },
}

#[derive(Parser)]
#[command(name = "squad-cli")]
#[command(about = "Squad combat resolution over a JSON roster")]
struct Cli {
    /// Roster JSON (`{ id: unit }`), rewritten in place after each action
    #[arg(long, global = true)]
    roster: Option<PathBuf>,
    /// RNG seed for determinism
    #[arg(long, global = true, default_value_t = 42)]
    seed: u64,
    /// Print reports as JSON instead of log lines
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    /// Debug-level tracing on stderr
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_text_auto(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

fn emit<T: Serialize>(json: bool, value: &T, lines: &[String]) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        for line in lines {
            println!("{}", line);
        }
    }
    Ok(())
}

fn build_command(kind: CommandKind, order: Option<Order>, note: Option<String>) -> anyhow::Result<Command> {
    Ok(match kind {
        CommandKind::RangedFire => Command::RangedFire,
        CommandKind::Orders => Command::Orders {
            order: order.context("--order is required for orders")?.into(),
        },
        CommandKind::Reorganize => Command::Reorganize,
        CommandKind::Rally => Command::Rally,
        CommandKind::Withdraw => Command::Withdraw,
        CommandKind::Special => Command::Special {
            note: note.context("--note is required for special")?,
        },
        CommandKind::Formation => Command::Formation,
    })
}

fn selection(target: Option<String>) -> Vec<String> {
    target.into_iter().collect()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Cmd::Roll { expr, times } => {
            let mut dice = Dice::from_seed(cli.seed);
            for _ in 0..times {
                let r = roll_expr(&mut dice, &expr)?;
                if cli.json {
                    println!("{}", serde_json::json!({ "formula": r.formula, "total": r.total }));
                } else {
                    println!("{} → {}", r.formula, r.total);
                }
            }
            Ok(())
        }
        cmd => {
            let roster_path = cli.roster.context("--roster is required for this command")?;
            run_on_roster(&roster_path, cli.seed, cli.json, cmd)
        }
    }
}

fn run_on_roster(roster_path: &Path, seed: u64, json: bool, cmd: Cmd) -> anyhow::Result<()> {
    let store = MemoryStore::from_json(&read_text_auto(roster_path)?)
        .with_context(|| format!("roster {}", roster_path.display()))?;
    let mut engine = Engine::new(Rules::builtin()?, Dice::from_seed(seed), store, TracingRenderer);

    match cmd {
        Cmd::Roll { .. } => return Ok(()),
        Cmd::Attack { actor, target, ranged } => {
            let action = if ranged { ActionKind::Ranged } else { ActionKind::Melee };
            let report = engine.attack(&actor, &selection(target), action)?;
            emit(json, &report, &report.log)?;
        }
        Cmd::Maneuver { actor, key, target } => {
            let report = engine.maneuver(&actor, &key, &selection(target))?;
            emit(json, &report, &report.log)?;
        }
        Cmd::Maneuvers { actor } => {
            let listing = engine.list_maneuvers(&actor)?;
            let lines: Vec<String> = listing
                .iter()
                .map(|m| {
                    let state = if m.executable {
                        "ready".to_string()
                    } else {
                        format!("cooldown {}", m.cooldown)
                    };
                    format!("{:<16} {:<28} {:?} {:?} {}", m.key, m.name, m.difficulty, m.target, state)
                })
                .collect();
            emit(json, &listing, &lines)?;
        }
        Cmd::Command { commander, squad, kind, order, note, target } => {
            let command = build_command(kind, order, note)?;
            let report = engine.issue_command(&commander, &squad, &command, &selection(target))?;
            emit(json, &report, &report.log)?;
        }
        Cmd::Tick => {
            let lines = engine.advance_round();
            emit(json, &lines, &lines)?;
        }
        Cmd::Cp { unit, add, set, refill } => {
            let cp = match (add, set) {
                (Some(delta), _) => engine.adjust_cp(&unit, delta)?,
                (None, Some(value)) => engine.set_cp(&unit, CpTarget::Value(value))?,
                (None, None) if refill => engine.set_cp(&unit, CpTarget::Cap)?,
                (None, None) => engine.unit(&unit)?.cp,
            };
            let line = format!("[CP][{}] {}/{}", unit, cp.current, cp.cap);
            emit(json, &cp, &[line])?;
        }
    }

    fs::write(roster_path, engine.store.to_json()?)
        .with_context(|| format!("failed to write {}", roster_path.display()))?;
    Ok(())
}
