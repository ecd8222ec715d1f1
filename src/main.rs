//! Blocklands headless shell
//!
//! Plays one session with an autoplay strategy, prints the final snapshot
//! as JSON and records the outcome in the progress store.

use blocklands::bot::{GreedyBot, Strategy};
use blocklands::combo::Hero;
use blocklands::game::{GameSession, Outcome};
use blocklands::level::{GameMode, LevelConfig};
use blocklands::settings::Settings;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// Simulated time between two moves
const MOVE_INTERVAL_MS: u64 = 1500;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Casual,
    Adventure,
    Bonus,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Casual => GameMode::Casual,
            ModeArg::Adventure => GameMode::Adventure,
            ModeArg::Bonus => GameMode::Bonus,
        }
    }
}

#[derive(Parser)]
#[command(name = "blocklands", about = "Play a Blocklands session headlessly")]
struct Cli {
    /// Game mode
    #[arg(short, long, value_enum, default_value = "casual")]
    mode: ModeArg,

    /// Level file (TOML), required in adventure mode
    #[arg(short, long)]
    level: Option<PathBuf>,

    /// Seed for pieces and boss rolls (default: random)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Stop after this many moves
    #[arg(long, default_value = "500")]
    max_moves: u32,

    /// Settings file (default: platform config dir)
    #[arg(long, env = "BLOCKLANDS_SETTINGS")]
    settings: Option<PathBuf>,

    /// Do not record the outcome
    #[arg(long)]
    no_save: bool,
}

/// Get the blocklands temp directory, creating it if needed
fn blocklands_temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("blocklands");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn load_level(
    mode: GameMode,
    path: Option<&Path>,
) -> Result<LevelConfig, Box<dyn std::error::Error>> {
    Ok(match mode {
        GameMode::Casual => LevelConfig::casual(),
        GameMode::Bonus => LevelConfig::bonus(),
        GameMode::Adventure => {
            let path = path.ok_or("--level is required in adventure mode")?;
            LevelConfig::load(path)?
        }
    })
}

/// First clearable cell on the board, as a hero target
fn hero_target(session: &GameSession) -> Option<(i32, i32)> {
    session.board().rows().enumerate().find_map(|(row, cells)| {
        let col = cells
            .iter()
            .position(|cell| cell.block().is_some_and(|block| !block.is_terrain()))?;
        Some((row as i32, col as i32))
    })
}

/// Spend every armed hero. The X slash is completed once its delay has passed.
fn summon_heroes(session: &mut GameSession, now_ms: &mut u64) {
    for hero in Hero::all() {
        if !session.heroes().is_unlocked(hero) || session.outcome().is_terminal() {
            continue;
        }
        let Some((row, col)) = hero_target(session) else {
            return;
        };
        let Some(report) = session.use_hero(hero, row, col, *now_ms) else {
            continue;
        };
        tracing::debug!("{} struck {} cells", hero.name(), report.cleared.cells.len());
        if let Some(pending) = report.pending {
            *now_ms = pending.due_ms;
            session.advance_second_phase(*now_ms);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Generate session ID for this run
    let session_id: u32 = rand::random();
    let log_dir = blocklands_temp_dir();
    let log_file = format!("{:08x}.log", session_id);

    // Setup tracing to log file
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("blocklands=debug".parse()?),
        )
        .with_ansi(false)
        .init();

    tracing::info!(
        "Blocklands starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let mut settings = match &cli.settings {
        Some(path) if path.exists() => Settings::load_from(path)?,
        Some(_) => Settings::default(),
        None => Settings::load(),
    };

    let mode = GameMode::from(cli.mode);
    let level = load_level(mode, cli.level.as_deref())?;
    if mode == GameMode::Adventure && level.id > settings.progress.max_unlocked_level {
        tracing::warn!(
            "Level {} is locked (max unlocked {}), playing anyway",
            level.id,
            settings.progress.max_unlocked_level
        );
    }

    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut session = GameSession::with_seed(
        mode,
        level,
        settings.rules.clone(),
        settings.progress.inventory.clone(),
        seed,
    );

    let strategy = GreedyBot;
    let mut now_ms = 0;
    while session.moves() < cli.max_moves && !session.outcome().is_terminal() {
        let Some(placement) = strategy.choose(&session) else {
            break;
        };
        if session
            .place(placement.slot, placement.row, placement.col, now_ms)
            .is_none()
        {
            tracing::warn!("Strategy chose an illegal placement: {:?}", placement);
            break;
        }
        if mode.has_heroes() {
            summon_heroes(&mut session, &mut now_ms);
        }
        now_ms += MOVE_INTERVAL_MS;
    }

    println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
    println!("{}", serde_json::to_string_pretty(session.outcome())?);

    let progress = &mut settings.progress;
    progress.inventory = session.inventory().clone();
    match session.outcome() {
        Outcome::Victory(victory) => {
            if let Some(next) = victory.next_level {
                progress.unlock(next);
            }
            for reward in &victory.rewards {
                if !progress.grant_reward(reward) {
                    tracing::info!("{} is at its cap, reward not stored", reward);
                }
            }
        }
        Outcome::Defeat(_) | Outcome::Continue => {}
    }
    if mode == GameMode::Casual && progress.record_casual_score(session.score().points) {
        tracing::info!("New casual best: {}", session.score().points);
    }

    if !cli.no_save {
        match &cli.settings {
            Some(path) => settings.save_to(path)?,
            None => settings.save()?,
        }
    }

    Ok(())
}
