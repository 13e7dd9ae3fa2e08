//! Weapon Balls command line
//!
//! Lists weapons, runs single battles (paced or unthrottled) and headless
//! batches for win-rate statistics.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use weapon_balls::best_of::DEFAULT_BEST_OF;
use weapon_balls::driver::RealtimeDriver;
use weapon_balls::headless::{matrix, run_batch, run_battle, BatchReport};
use weapon_balls::settings::PhysicsPreset;
use weapon_balls::sim::rng::generate_seed;
use weapon_balls::sim::{weapon, TickEvent};
use weapon_balls::{Settings, SimError};

#[derive(Parser)]
#[command(name = "weapon-balls")]
#[command(about = "Deterministic ball-vs-ball weapon battles", long_about = None)]
struct Cli {
    /// Settings JSON file (missing fields use defaults)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Physics preset applied on top of the settings (classic, gravity, arena)
    #[arg(long, global = true)]
    preset: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered weapons and their packs
    Weapons,

    /// Run a single battle
    Battle {
        left: String,
        right: String,

        /// Battle seed (random if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Pace ticks in real time instead of running flat out
        #[arg(long, default_value = "false")]
        realtime: bool,
    },

    /// Run many headless battles of one pairing
    Batch {
        left: String,
        right: String,

        #[arg(long, default_value = "100")]
        count: u32,

        /// First seed; battle i uses seed + i
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Size of the best-of table
        #[arg(long, default_value_t = DEFAULT_BEST_OF)]
        top: usize,

        /// Print the report as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Round-robin win rates across registered weapons
    Matrix {
        #[arg(long, default_value = "20")]
        count: u32,

        #[arg(long, default_value = "1")]
        seed: u64,

        /// Limit to one weapon pack
        #[arg(long)]
        pack: Option<String>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), SimError> {
    let settings = load_settings(cli.settings.as_ref(), cli.preset.as_deref())?;
    let cancel = AtomicBool::new(false);

    match cli.command {
        Commands::Weapons => {
            for pack in weapon::packs() {
                println!("{}:", pack);
                for kind in weapon::kinds(Some(pack)) {
                    println!("  {}", kind);
                }
            }
        }
        Commands::Battle {
            left,
            right,
            seed,
            realtime,
        } => {
            let seed = seed.unwrap_or_else(generate_seed);
            if realtime {
                run_realtime(&left, &right, seed, settings)?;
            } else {
                let summary = run_battle(&left, &right, seed, &settings)?;
                println!("{}", describe(&summary.result));
                println!(
                    "hits {}  parries {}  supers {}  projectiles {}",
                    summary.stats.total_hits,
                    summary.stats.parries,
                    summary.stats.supers,
                    summary.stats.projectiles_fired
                );
                if let Some(score) = summary.excitement {
                    println!("excitement {:.1}/115", score.total);
                }
            }
        }
        Commands::Batch {
            left,
            right,
            count,
            seed,
            top,
            json,
        } => {
            let report = run_batch(&left, &right, seed, count, &settings, top, &cancel)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Matrix { count, seed, pack } => {
            let kinds = weapon::kinds(pack.as_deref());
            if kinds.is_empty() {
                return Err(SimError::InvalidSettings(format!(
                    "no weapons in pack {}",
                    pack.unwrap_or_default()
                )));
            }
            let cells = matrix(&kinds, seed, count, &settings, &cancel)?;
            print!("{:>12}", "");
            for right in &kinds {
                print!("{:>10}", right);
            }
            println!();
            for row in cells.chunks(kinds.len()) {
                print!("{:>12}", row[0].left);
                for cell in row {
                    print!("{:>9.0}%", cell.left_win_rate * 100.0);
                }
                println!();
            }
        }
    }
    Ok(())
}

fn load_settings(path: Option<&PathBuf>, preset: Option<&str>) -> Result<Settings, SimError> {
    let mut settings = match path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(name) = preset {
        let preset = PhysicsPreset::from_str(name)
            .ok_or_else(|| SimError::InvalidSettings(format!("unknown preset {}", name)))?;
        settings.apply_preset(preset);
    }
    settings.validate()?;
    Ok(settings)
}

fn run_realtime(left: &str, right: &str, seed: u64, settings: Settings) -> Result<(), SimError> {
    let mut driver = RealtimeDriver::start(left, right, seed, settings)?;
    let frame = Duration::from_secs_f32(driver.timestep());
    let mut last = Instant::now();

    while !driver.is_finished() {
        thread::sleep(frame);
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;
        for event in driver.advance(dt) {
            log_event(&event);
        }
    }

    if let Some(result) = driver.result() {
        println!("{}", describe(result));
    }
    Ok(())
}

fn log_event(event: &TickEvent) {
    match event {
        TickEvent::Hit {
            attacker,
            target,
            damage,
            source,
            ..
        } => log::debug!("{:?} hit {:?} for {:.1} ({:?})", attacker, target, damage, source),
        TickEvent::Parry { a, b, .. } => log::info!("Parry {:?} / {:?}", a, b),
        TickEvent::SuperActivated { ball, weapon, .. } => log::info!("{} super ({:?})", weapon, ball),
        TickEvent::Split { parent, clone } => log::info!("{:?} split into {:?}", parent, clone),
        TickEvent::Death { ball, side, .. } => log::info!("{:?} ({}) down", ball, side.as_str()),
        _ => {}
    }
}

fn describe(result: &weapon_balls::sim::BattleResult) -> String {
    let verdict = match (result.winner_side, result.is_draw, result.timed_out) {
        (_, _, true) => "draw (time limit)".to_string(),
        (Some(side), true, false) => format!("double KO, {} takes the tie-break", side.as_str()),
        (Some(side), false, false) => format!("{} wins", result.winner_weapon().unwrap_or(side.as_str())),
        (None, _, false) => "draw".to_string(),
    };
    format!(
        "{} vs {} (seed {}): {} after {} ticks",
        result.left_weapon, result.right_weapon, result.seed, verdict, result.ticks
    )
}

fn print_report(report: &BatchReport) {
    println!(
        "{} vs {}: {} battles, avg {:.0} ticks, {:.1} hits",
        report.left_weapon, report.right_weapon, report.battles, report.avg_ticks, report.avg_hits
    );
    println!("  {:<10} {:>5} {:>6.1}%", report.left_weapon, report.left_wins, report.left_win_rate() * 100.0);
    println!("  {:<10} {:>5} {:>6.1}%", report.right_weapon, report.right_wins, report.right_win_rate() * 100.0);
    println!("  {:<10} {:>5} {:>6.1}%  ({} timeouts)", "draw", report.draws, report.draw_rate() * 100.0, report.timeouts);

    if report.best_of.is_empty() {
        return;
    }
    println!("Best of:");
    for (rank, entry) in report.best_of.entries.iter().enumerate() {
        println!(
            "  {:>2}. {:>5.1}  seed {:<12} {} ticks",
            rank + 1,
            entry.score,
            entry.seed,
            entry.ticks
        );
    }
}
