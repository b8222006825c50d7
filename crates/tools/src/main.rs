use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use quest_core::{SessionScript, replay_script};
use quest_tools::{init_logging, load_config, load_pack, summarize_pack};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Build every mission of a level pack and print what was placed
    Validate {
        /// Path to the level pack JSON
        #[arg(short, long)]
        levels: PathBuf,
        /// Seed used for random placements
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Engine config TOML
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay a session script and print the final snapshot hash
    Replay {
        /// Path to the level pack JSON
        #[arg(short, long)]
        levels: PathBuf,
        /// Path to the session script JSON
        #[arg(short, long)]
        script: PathBuf,
        /// Engine config TOML
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    match args.command {
        Cmd::Validate { levels, seed, config, json } => {
            let config = load_config(config.as_deref())?;
            let pack = load_pack(&levels)?;
            let summary = summarize_pack(&pack, &config, seed);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                for mission in &summary {
                    println!(
                        "#{} {:<16} {}x{} goal=({}, {}) obstacles={} pickups={} enemies={} cap={} life={}",
                        mission.index,
                        mission.id,
                        mission.width,
                        mission.height,
                        mission.goal.0,
                        mission.goal.1,
                        mission.obstacles,
                        mission.pickups,
                        mission.enemies,
                        mission.command_cap,
                        mission.life,
                    );
                    if let Some(problem) = &mission.problem {
                        println!("    unplayable: {problem}");
                    }
                }
            }

            let broken = summary.iter().filter(|mission| mission.problem.is_some()).count();
            if broken > 0 {
                bail!("{broken} of {} missions are unplayable", summary.len());
            }
            info!(missions = summary.len(), "level pack ok");
        }
        Cmd::Replay { levels, script, config } => {
            let config = load_config(config.as_deref())?;
            let pack = load_pack(&levels)?;
            let script = SessionScript::load(&script)
                .with_context(|| format!("failed to load script {}", script.display()))?;

            let result = replay_script(&pack, &config, &script).context("replay failed")?;

            println!("Replay complete.");
            println!("Mission: {}", result.mission_index);
            println!("Attempt: {}", result.attempt);
            println!("Level ticks: {}", result.level_ticks);
            println!("Missions cleared: {}", result.missions_cleared);
            println!("Missions failed: {}", result.missions_failed);
            println!("Snapshot Hash: 0x{:016x}", result.final_snapshot_hash);
        }
    }

    Ok(())
}
