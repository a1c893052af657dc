pub mod drill;
pub mod report;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::app::App;
use crate::config::Config;
use crate::engine::quiz::QuizMode;
use crate::logging;
use crate::store::WordStore;
use crate::store::json_store::JsonStore;
use crate::word::WordImport;

const RECENT_DAYS: usize = 7;

#[derive(Parser)]
#[command(name = "lexdrill", version, about = "Terminal vocabulary trainer with mastery tracking")]
pub struct Cli {
    /// Directory holding library.json and stats.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log filter, e.g. "info" or "lexdrill=debug"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Study a word-book (the default command)
    Learn {
        /// Book id; becomes the current book
        #[arg(long)]
        book: Option<String>,
        /// Words per session (5-100)
        #[arg(long)]
        count: Option<usize>,
        /// cn-to-en, en-to-cn or spelling
        #[arg(long)]
        mode: Option<QuizMode>,
        /// Skip the presentation pass and quiz straight away
        #[arg(long)]
        no_review: bool,
    },
    /// Inspect and practice missed words
    Wrong {
        #[command(subcommand)]
        action: WrongAction,
    },
    /// Manage favorite words
    Favorites {
        #[command(subcommand)]
        action: FavoriteAction,
    },
    /// List word-books and their progress
    Books,
    /// Reset a book's progress and mastered flags
    Reset {
        #[arg(long)]
        book: String,
    },
    /// Import a custom book from a JSON array of words
    Import {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        /// Overwrite an existing book with the same id, resetting its progress
        #[arg(long)]
        replace: bool,
    },
    /// Show today's figures, streak and achievements
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write everything to a JSON file
    Export {
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum WrongAction {
    /// List missed words, most recent first
    List,
    /// Remove a word from the ledger
    Remove {
        #[arg(long)]
        book: String,
        #[arg(long)]
        rank: u32,
    },
    /// Quiz the most recently missed words
    Practice {
        #[arg(long)]
        count: Option<usize>,
        #[arg(long)]
        mode: Option<QuizMode>,
    },
}

#[derive(Subcommand)]
enum FavoriteAction {
    List,
    Remove {
        #[arg(long)]
        book: String,
        #[arg(long)]
        rank: u32,
    },
}

/// Settings for this run only. Command-line overrides land here and never in
/// the saved config.
#[derive(Debug, PartialEq)]
struct RunSettings {
    data_dir: PathBuf,
    log_level: String,
}

impl RunSettings {
    fn resolve(cli: &Cli, config: &Config) -> Self {
        Self {
            data_dir: cli.data_dir.clone().unwrap_or_else(|| config.data_path()),
            log_level: cli.log_level.clone().unwrap_or_else(|| config.log_level.clone()),
        }
    }
}

/// Persist `book` as the current book, leaving every other field of the
/// file at `path` as it was.
fn remember_book(path: &Path, book: &str) -> Result<()> {
    let mut saved = Config::load_from(path)?;
    saved.current_book = book.to_string();
    saved.save_to(path)
}

fn check_import_target(known: &[&str], id: &str, replace: bool) -> Result<()> {
    if !replace && known.contains(&id) {
        bail!("book '{id}' already exists; pass --replace to overwrite it and reset its progress");
    }
    Ok(())
}

pub fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load().context("failed to load config")?;
    let settings = RunSettings::resolve(&cli, &config);
    logging::init_tracing(&settings.log_level);

    let store = JsonStore::open(settings.data_dir.clone()).with_context(|| {
        format!("failed to open data directory {}", settings.data_dir.display())
    })?;
    let known: Vec<String> = store.books()?.into_iter().map(|b| b.id).collect();
    let known: Vec<&str> = known.iter().map(String::as_str).collect();
    config.validate(&known);
    debug!(data_dir = %settings.data_dir.display(), books = known.len(), "store opened");

    let mut app = App::new(config, store);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let command = cli.command.unwrap_or(Commands::Learn {
        book: None,
        count: None,
        mode: None,
        no_review: false,
    });

    match command {
        Commands::Learn {
            book,
            count,
            mode,
            no_review,
        } => {
            if let Some(book) = book {
                if !known.iter().any(|id| *id == book) {
                    bail!("unknown book '{book}'; see `lexdrill books`");
                }
                remember_book(&Config::config_path(), &book)
                    .context("failed to save config")?;
                app.config.current_book = book;
            }
            let book = app.config.current_book.clone();
            let count = count.unwrap_or(app.config.word_count);
            let mode = mode.unwrap_or(app.config.quiz_mode);
            let mut session = if no_review || !app.config.review_first {
                app.start_session(&book, count, mode)?
            } else {
                app.start_study(&book, count, mode)?
            };
            let stdin = io::stdin();
            if let Some(summary) =
                drill::run(&mut app, &mut session, &mut stdin.lock(), &mut out)?
            {
                report::summary(&mut out, &summary)?;
            }
        }
        Commands::Wrong { action } => match action {
            WrongAction::List => report::wrong_words(&mut out, &app.wrong_words()?)?,
            WrongAction::Remove { book, rank } => {
                app.remove_wrong(&book, rank)?;
                writeln!(out, "removed {book}/{rank} from wrong words")?;
            }
            WrongAction::Practice { count, mode } => {
                let count = count.unwrap_or(app.config.word_count);
                let mode = mode.unwrap_or(app.config.quiz_mode);
                let mut session = app.practice_wrong(count, mode)?;
                if session.is_empty() {
                    writeln!(out, "No wrong words to practice.")?;
                    return Ok(());
                }
                let stdin = io::stdin();
                if let Some(summary) =
                    drill::run(&mut app, &mut session, &mut stdin.lock(), &mut out)?
                {
                    report::summary(&mut out, &summary)?;
                }
            }
        },
        Commands::Favorites { action } => match action {
            FavoriteAction::List => report::favorites(&mut out, &app.favorites()?)?,
            FavoriteAction::Remove { book, rank } => {
                app.remove_favorite(&book, rank)?;
                writeln!(out, "removed {book}/{rank} from favorites")?;
            }
        },
        Commands::Books => report::books(&mut out, &app.books()?, &app.config.current_book)?,
        Commands::Reset { book } => {
            app.reset_progress(&book)?;
            writeln!(out, "progress of {book} reset")?;
        }
        Commands::Import {
            file,
            id,
            name,
            replace,
        } => {
            check_import_target(&known, &id, replace)?;
            let content = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let words: Vec<WordImport> = serde_json::from_str(&content)
                .with_context(|| format!("{} is not a JSON array of words", file.display()))?;
            if words.is_empty() {
                bail!("{} contains no words", file.display());
            }
            let book = app.import_book(&id, &name, &words)?;
            writeln!(out, "imported {} words into {}", book.total, book.id)?;
        }
        Commands::Stats { json } => {
            let stats = app.statistics()?;
            if json {
                serde_json::to_writer_pretty(&mut out, &stats)?;
                writeln!(out)?;
            } else {
                let recent = app.recent_days(RECENT_DAYS)?;
                report::statistics(&mut out, &stats, &recent, &app.achievements()?)?;
            }
        }
        Commands::Export { out: path } => {
            let data = app.store().export_all(&app.config, app.now());
            let json = serde_json::to_string_pretty(&data)?;
            fs::write(&path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(out, "exported to {}", path.display())?;
        }
    }
    Ok(())
}
