use clap::Parser;
use squad_engine::api::{simulate_skirmish, SkirmishConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "simulate-skirmish")]
#[command(about = "Monte Carlo sim: many seeded skirmishes between two unit files")]
struct Args {
    /// Attacking unit JSON
    #[arg(long)]
    attacker: PathBuf,

    /// Defending unit JSON
    #[arg(long)]
    defender: PathBuf,

    /// Number of trials
    #[arg(long, default_value_t = 1000)]
    trials: u32,

    /// Safety cap on rounds per trial
    #[arg(long, default_value_t = 30)]
    max_rounds: u32,

    /// RNG base seed (trial i uses seed+i)
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Print the full log of the first trial
    #[arg(long, default_value_t = false)]
    show_log: bool,
}

fn median(sorted: &[u32]) -> u32 {
    if sorted.is_empty() {
        return 0;
    }
    let m = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[m]
    } else {
        (sorted[m - 1] + sorted[m]) / 2
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let mut attacker_wins = 0u32;
    let mut defender_wins = 0u32;
    let mut draws = 0u32;
    let mut attacker_hp_total = 0i64;
    let mut defender_hp_total = 0i64;
    let mut rounds_vec: Vec<u32> = Vec::with_capacity(args.trials as usize);

    for i in 0..args.trials {
        let res = simulate_skirmish(SkirmishConfig {
            attacker_path: args.attacker.to_string_lossy().into_owned(),
            defender_path: args.defender.to_string_lossy().into_owned(),
            seed: args.seed.wrapping_add(i as u64),
            max_rounds: Some(args.max_rounds),
        })?;
        if i == 0 && args.show_log {
            for line in &res.log {
                println!("{}", line);
            }
            println!();
        }
        match res.winner.as_str() {
            "attacker" => attacker_wins += 1,
            "defender" => defender_wins += 1,
            _ => draws += 1,
        }
        attacker_hp_total += res.attacker_hp_end as i64;
        defender_hp_total += res.defender_hp_end as i64;
        rounds_vec.push(res.rounds);
    }

    rounds_vec.sort_unstable();
    let trials_f = args.trials.max(1) as f64;
    let avg_rounds = rounds_vec.iter().map(|&r| r as u64).sum::<u64>() as f64 / trials_f;

    println!("simulate-skirmish results");
    println!("-------------------------");
    println!("trials:             {}", args.trials);
    println!("attacker:           {}", args.attacker.display());
    println!("defender:           {}", args.defender.display());
    println!();
    println!("attacker wins:      {:.1}%", attacker_wins as f64 / trials_f * 100.0);
    println!("defender wins:      {:.1}%", defender_wins as f64 / trials_f * 100.0);
    println!("draws:              {:.1}%", draws as f64 / trials_f * 100.0);
    println!("avg attacker HP:    {:.1}", attacker_hp_total as f64 / trials_f);
    println!("avg defender HP:    {:.1}", defender_hp_total as f64 / trials_f);
    println!("avg rounds:         {:.2}", avg_rounds);
    println!("median rounds:      {}", median(&rounds_vec));

    Ok(())
}
