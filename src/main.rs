use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use slither_snake::game::{GameConfig, GameMode, RivalProfile};
use slither_snake::modes::{PlayMode, SimulateConfig, SimulateMode};
use slither_snake::storage::Storage;

#[derive(Parser)]
#[command(name = "slither")]
#[command(version, about = "Continuous-space snake with a rival snake and power balls")]
struct Cli {
    /// Play in the terminal or run headless rounds
    #[arg(long, value_enum, default_value = "play")]
    mode: Mode,

    /// Round rules
    #[arg(long, value_enum, default_value = "classic")]
    game_mode: GameModeArg,

    /// Difficulty level (speed, obstacle count, points per food)
    #[arg(long, default_value = "1")]
    level: u32,

    /// Rival behaviour preset
    #[arg(long, value_enum, default_value = "duel")]
    rival: RivalArg,

    /// Seed for reproducible rounds
    #[arg(long)]
    seed: Option<u64>,

    /// Number of rounds in simulate mode
    #[arg(long, default_value = "10")]
    rounds: usize,

    /// Settings and stats file (defaults to the platform config directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log file for play mode
    #[arg(long, default_value = "slither.log")]
    log_file: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Play with keyboard controls
    Play,
    /// Run headless rounds with a scripted pilot
    Simulate,
}

#[derive(Clone, Copy, ValueEnum)]
enum GameModeArg {
    Classic,
    TimeAttack,
    Obstacle,
}

impl From<GameModeArg> for GameMode {
    fn from(arg: GameModeArg) -> Self {
        match arg {
            GameModeArg::Classic => GameMode::Classic,
            GameModeArg::TimeAttack => GameMode::TimeAttack,
            GameModeArg::Obstacle => GameMode::Obstacle,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RivalArg {
    /// Lethal contact, no projectiles
    Classic,
    /// Pass-through contact, settled with power balls
    Duel,
    None,
}

impl RivalArg {
    fn profile(self) -> Option<RivalProfile> {
        match self {
            RivalArg::Classic => Some(RivalProfile::Classic),
            RivalArg::Duel => Some(RivalProfile::Duel),
            RivalArg::None => None,
        }
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .with_context(|| format!("Invalid log level: {}", cli.log_level))?;

    match cli.mode {
        // The TUI owns the terminal, so logs go to a file
        Mode::Play => {
            let file = File::create(&cli.log_file)
                .with_context(|| format!("Failed to create log file {:?}", cli.log_file))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        Mode::Simulate => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let storage = match &cli.settings {
        Some(path) => Storage::new(path),
        None => Storage::default_location()?,
    };
    let save = storage.load();

    // Create game configuration from CLI arguments and saved settings
    let mut config =
        GameConfig::new(cli.game_mode.into(), cli.level).with_rival(cli.rival.profile());
    let factor = save.settings.speed.factor();
    config.player.base_speed *= factor;
    config.player.level_speed_bonus *= factor;
    config
        .validate()
        .map_err(|msg| anyhow!(msg))
        .context("Invalid game configuration")?;

    info!(
        mode = config.mode.name(),
        level = config.level,
        rival = config.rival.is_some(),
        settings = %storage.path().display(),
        "Starting"
    );

    // Dispatch to appropriate mode
    match cli.mode {
        Mode::Play => {
            let mut play_mode = PlayMode::new(config, storage, save, cli.seed);
            play_mode.run().await?;
        }
        Mode::Simulate => {
            let sim_config = SimulateConfig {
                rounds: cli.rounds,
                seed: cli.seed,
                ..SimulateConfig::default()
            };
            SimulateMode::new(sim_config, config).run()?;
        }
    }

    Ok(())
}
