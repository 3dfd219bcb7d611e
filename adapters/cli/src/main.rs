#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for tower defense matches.
//!
//! Plays a level against a scripted command log with a fixed seed and prints
//! the terminal summary as JSON, optionally folding it into a profile file.

mod config;
mod profile_store;
mod script;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tower_defense_core::{MapId, PlayerCommand, SessionStatus, SessionSummary, Tuning};
use tower_defense_session::{
    profile::{PlayerProfile, ProfileStore},
    SessionHost, SessionId,
};
use tower_defense_world::levels::LevelCatalog;
use tracing::{debug, info, warn};

use crate::{config::GameConfig, profile_store::JsonFileProfileStore, script::Script};

/// Command-line arguments accepted by the runner.
#[derive(Debug, Parser)]
#[command(name = "tower-defense", about = "Runs tower defense matches headlessly")]
struct Cli {
    /// TOML file with tuning overrides and extra levels.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Lists the playable levels.
    Levels,
    /// Plays one match to completion.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Level to play.
    #[arg(long, default_value = "meadow")]
    map: String,
    /// JSON command log. Without one, every wave is started as soon as allowed.
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,
    /// Seed for every random draw of the match.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Coins added to the starting balance.
    #[arg(long, default_value_t = 0)]
    bonus: u32,
    /// Profile file supplying the deck and receiving the summary.
    #[arg(long, value_name = "PATH")]
    profile: Option<PathBuf>,
    /// Simulated ticks after which the match is abandoned.
    #[arg(long, default_value_t = 200_000)]
    max_ticks: u64,
}

/// Entry point for the tower defense command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let (tuning, catalog) = GameConfig::load(cli.config.as_deref())?.into_parts()?;

    match cli.command {
        Command::Levels => list_levels(&catalog),
        Command::Run(args) => run(args, tuning, catalog),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .init();
    }
}

fn list_levels(catalog: &LevelCatalog) -> Result<()> {
    for level in catalog.iter() {
        let map = level
            .build_map()
            .with_context(|| format!("level {} is invalid", level.id))?;
        println!(
            "{:<12} {:<16} {:>2}x{:<2} waves {:>2}  path {:.1}",
            level.id.as_str(),
            level.name,
            level.columns,
            level.rows,
            level.waves.len(),
            map.path_length(),
        );
    }
    Ok(())
}

fn run(args: RunArgs, tuning: Tuning, catalog: LevelCatalog) -> Result<()> {
    let mut store = args.profile.map(JsonFileProfileStore::new);
    let mut profile = match &store {
        Some(store) => store.load()?,
        None => PlayerProfile::default(),
    };
    let mut script = match &args.script {
        Some(path) => Some(Script::load(path)?),
        None => None,
    };

    let tick = tuning.tick_duration();
    let mut host = SessionHost::new(catalog, tuning)?;
    let id = host.start_session(profile.session_request(
        MapId::new(args.map),
        args.bonus,
        args.seed,
    ))?;

    let summary = play(&mut host, id, script.as_mut(), tick, args.max_ticks)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(store) = store.as_mut() {
        profile.record_summary(&summary);
        store.save(&profile)?;
        info!(
            profile = %store.path().display(),
            games = profile.total_games_played,
            coins = profile.coins,
            "profile updated"
        );
    }
    Ok(())
}

/// Drives a session until it ends, abandoning it once `max_ticks` have run.
fn play(
    host: &mut SessionHost,
    id: SessionId,
    mut script: Option<&mut Script>,
    tick: Duration,
    max_ticks: u64,
) -> Result<SessionSummary> {
    let mut status = host.snapshot(id)?.status;
    for step in 0..max_ticks {
        match script.as_deref_mut() {
            Some(script) => {
                for entry in script.due(step) {
                    host.queue_command(id, entry.command)?;
                }
            }
            None if matches!(status, SessionStatus::Setup | SessionStatus::WaveIntermission) => {
                host.queue_command(id, PlayerCommand::StartWave)?;
            }
            None => {}
        }

        let snapshot = host.tick(id, tick)?;
        for event in host.drain_events(id)? {
            debug!(?event, "session event");
        }
        status = snapshot.status;
        if status.is_terminal() {
            return Ok(host.summary(id)?);
        }
    }

    warn!(max_ticks, "tick limit reached, abandoning match");
    let _ = host.submit_command(id, PlayerCommand::Quit)?;
    Ok(host.summary(id)?)
}
