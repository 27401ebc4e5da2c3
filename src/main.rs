//! puzzle-boss-battle: tile-matching puzzle with a boss campaign, played on the console.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use puzzle_boss_battle::ai::{self, Strategy};
use puzzle_boss_battle::console::{self, ConsoleObserver};
use puzzle_boss_battle::game::logic::GameSession;
use puzzle_boss_battle::game::types::GameMode;
use puzzle_boss_battle::i18n::I18n;
use puzzle_boss_battle::storage::{self, JsonStore, MemoryStore, RecordStore, Settings};

/// Tile-matching puzzle with a classic mode and a boss-battle campaign.
#[derive(Debug, Parser)]
#[command(
    name = "puzzle-boss-battle",
    version,
    about = "Swap adjacent tiles to line up three or more. Classic mode counts points within a move budget; boss mode fights a 70-level campaign.",
    long_about = "Swap adjacent tiles to line up three or more of the same shape and colour.\n\n\
        COMMANDS:\n  swap R1 C1 R2 C2   Swap two cells      item ID      Use an item\n  \
        level N            Jump to a level     retry        Replay a lost level\n  \
        mode classic|boss  Switch mode         restart      New game\n  \
        records            Leaderboard         save [NAME]  Save score\n  \
        board              Redraw              quit         Leave\n\n\
        Set RUST_LOG=debug to trace cascades on stderr."
)]
struct Args {
    /// Game mode: classic (score within a move budget) or boss (level campaign).
    #[arg(short, long, default_value = "classic")]
    mode: GameMode,

    /// Seed for tile generation and boss rolls. Random if not set.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Start the boss campaign at this (already unlocked) level.
    #[arg(short, long, value_name = "N")]
    level: Option<u32>,

    /// Let the computer play this many turns instead of reading commands.
    #[arg(long, value_name = "TURNS")]
    autoplay: Option<u32>,

    /// Move picker used by --autoplay.
    #[arg(long, default_value = "greedy")]
    strategy: StrategyArg,

    /// Settings file (JSON). Defaults to settings.json in the config directory.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Keep records in memory only.
    #[arg(long)]
    no_save: bool,

    /// Name used for `save` without an argument.
    #[arg(long)]
    name: Option<String>,

    /// Language for notices (en, de). Uses the system locale if not set.
    #[arg(long)]
    lang: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Random,
    Greedy,
}

impl From<StrategyArg> for Strategy {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::Random => Strategy::Random,
            StrategyArg::Greedy => Strategy::Greedy,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let settings = storage::load_settings(args.settings.as_deref());
    if args.no_save {
        return play(&args, settings, MemoryStore::default());
    }
    match JsonStore::open() {
        Ok(store) => play(&args, settings, store),
        Err(err) => {
            warn!(%err, "records unavailable, keeping them in memory");
            play(&args, settings, MemoryStore::default())
        }
    }
}

fn play<S: RecordStore>(args: &Args, settings: Settings, store: S) -> Result<()> {
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, mode = %args.mode, "starting session");

    let lang = args.lang.as_deref().or(settings.lang.as_deref());
    let observer = ConsoleObserver::new(io::stdout().lock(), I18n::load(lang));
    let mut session = GameSession::new(args.mode, settings.rules, seed, observer, store);
    if let Some(level) = args.level {
        session
            .select_level(level)
            .with_context(|| format!("cannot start at level {level}"))?;
    }

    let name = args.name.clone().unwrap_or(settings.player_name);
    match args.autoplay {
        Some(turns) => {
            let mut rng = StdRng::seed_from_u64(seed ^ 0x5eed);
            let summary = ai::autoplay(&mut session, turns, args.strategy.into(), &mut rng);
            session.observer_mut().take_error().context("console i/o failed")?;
            println!(
                "played {} turns, score {}, {:?}",
                summary.turns, summary.score, summary.outcome
            );
        }
        None => {
            let stdin = io::stdin();
            console::run(&mut session, stdin.lock(), &name).context("console i/o failed")?;
        }
    }
    Ok(())
}
