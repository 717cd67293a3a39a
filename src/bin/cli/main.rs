mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use xuexi_lib::flashcards::{DeckMode, WordFilter};

#[derive(Parser)]
#[command(
    name = "xuexi-cli",
    about = "Vocabulary flashcards with spaced repetition",
    version
)]
struct Cli {
    /// Config file (default: <config dir>/xuexi/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Learner whose progress is used
    #[arg(long, global = true)]
    learner: Option<String>,

    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Server-synced copy of the learner store (takes precedence when loading)
    #[arg(long, global = true)]
    remote_dir: Option<PathBuf>,

    /// Override the daily new-card cap
    #[arg(long, global = true)]
    new_daily_cap: Option<u32>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Restrict a command to part of the deck
#[derive(Args, Clone, Debug, Default)]
struct FilterArgs {
    /// Only words in this category
    #[arg(long)]
    category: Option<String>,
    /// Only words from this lesson
    #[arg(long)]
    lesson: Option<String>,
}

impl From<FilterArgs> for WordFilter {
    fn from(args: FilterArgs) -> Self {
        WordFilter {
            category: args.category,
            lesson: args.lesson,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Show today's practice queue for a deck
    Queue {
        /// Deck JSON file
        deck: PathBuf,
        /// Override the deck's mode (linear, srs, random)
        #[arg(long)]
        mode: Option<DeckMode>,
        /// Seed the shuffle for a reproducible order
        #[arg(long)]
        seed: Option<u64>,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Practice a deck interactively
    Review {
        /// Deck JSON file
        deck: PathBuf,
        /// Override the deck's mode (linear, srs, random)
        #[arg(long)]
        mode: Option<DeckMode>,
        /// Stop after this many cards
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Grade one card
    Grade {
        /// Deck JSON file
        deck: PathBuf,
        /// Card id, hanzi or pinyin
        card: String,
        /// again, hard, good, easy (or 0-3)
        grade: String,
    },

    /// Show the schedule of every card in a deck
    Due {
        /// Deck JSON file
        deck: PathBuf,
        /// Only list cards that can be reviewed now
        #[arg(long)]
        only_due: bool,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Review statistics for a deck
    Stats {
        /// Deck JSON file
        deck: PathBuf,
    },

    /// Mark words that need extra attention
    #[command(subcommand)]
    Flag(FlagCommand),
}

#[derive(Subcommand)]
enum FlagCommand {
    /// Flag a card as again or hard
    Set {
        deck: PathBuf,
        card: String,
        /// again or hard
        flag: String,
    },

    /// Remove the flag from a card
    Clear { deck: PathBuf, card: String },

    /// List flagged cards
    List { deck: PathBuf },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();

    let app = app::App::new(app::Overrides {
        config: cli.config,
        learner: cli.learner,
        data_dir: cli.data_dir,
        remote_dir: cli.remote_dir,
        new_daily_cap: cli.new_daily_cap,
    })?;

    match cli.command {
        Command::Queue {
            deck,
            mode,
            seed,
            filter,
        } => {
            let filter: WordFilter = filter.into();
            commands::queue::run(&app, &deck, mode, seed, &filter, &cli.format, use_color)?;
        }
        Command::Review {
            deck,
            mode,
            limit,
            filter,
        } => {
            commands::review::run(&app, &deck, mode, limit, &filter.into(), use_color)?;
        }
        Command::Grade { deck, card, grade } => {
            commands::grade::run(&app, &deck, &card, &grade, &cli.format, use_color)?;
        }
        Command::Due {
            deck,
            only_due,
            filter,
        } => {
            commands::due::run(&app, &deck, only_due, &filter.into(), &cli.format, use_color)?;
        }
        Command::Stats { deck } => {
            commands::stats::run(&app, &deck, &cli.format)?;
        }
        Command::Flag(subcmd) => match subcmd {
            FlagCommand::Set { deck, card, flag } => {
                commands::flags::run_set(&app, &deck, &card, &flag, &cli.format)?;
            }
            FlagCommand::Clear { deck, card } => {
                commands::flags::run_clear(&app, &deck, &card)?;
            }
            FlagCommand::List { deck } => {
                commands::flags::run_list(&app, &deck, &cli.format)?;
            }
        },
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal()
}
