//! Command-line front end for an offline journal session.
//!
//! # Responsibility
//! - Load the journal from the local cache, run one command, write it back.
//! - Keep output plain text so it can be piped.

use chrono::Local;
use clap::{Parser, Subcommand};
use daybook_core::{
    init_logging_from_config, mood_display, DateKey, DaybookConfig, FieldSlot,
    FieldTitles, Journal, JournalCommand, Mood, SqliteLocalCache, SyncReconciler,
};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;

#[derive(Parser)]
#[command(name = "daybook", version, about = "Date-keyed personal journal")]
struct Cli {
    /// Directory holding `daybook.toml` and the cache database
    #[arg(long, value_name = "PATH", global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check core linkage
    Ping,
    /// Print one day (default: today)
    Show { date: Option<String> },
    /// Replace one field of a day
    Write {
        date: String,
        /// Field number, 1-3
        field: usize,
        text: String,
    },
    /// Rate a day 1-3, or clear the rating with `none`
    Mood { date: String, rating: String },
    /// Print or rename the three field titles
    Titles { titles: Vec<String> },
    /// Search all days, newest first
    Search {
        query: String,
        /// Substring matches only
        #[arg(long)]
        exact: bool,
    },
    /// Write all days as CSV
    Export {
        /// Output file (default: journal_export_<today>.csv)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Merge a CSV file without overwriting existing days
    Import { file: PathBuf },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    if let Command::Ping = cli.command {
        println!("daybook_core ping={}", daybook_core::ping());
        println!("daybook_core version={}", daybook_core::core_version());
        return Ok(());
    }

    let config = match &cli.data_dir {
        Some(dir) => DaybookConfig::load(&DaybookConfig::path(dir))?,
        None => DaybookConfig::default(),
    };
    for problem in config.validate() {
        eprintln!("warning: {problem}; using default");
    }
    let config = config.with_defaults_for_invalid();
    init_logging_from_config(&config.logging)?;

    let today =
        DateKey::new(Local::now().date_naive()).ok_or("system date is outside 0000-9999")?;
    let cache = SqliteLocalCache::open(config.cache.resolve_db_path(cli.data_dir.as_deref()))?;
    let sync = SyncReconciler::new(Handle::current(), Arc::new(cache), config.sync.clone());
    let mut journal = Journal::new(today, &config.search).with_sync(sync);
    journal.refresh().await;

    run(&mut journal, cli.command)?;

    journal.flush().await;
    Ok(())
}

fn run(journal: &mut Journal, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Ping => {}
        Command::Show { date } => {
            if let Some(date) = date {
                journal.go_to(date.parse()?);
            }
            print_day(journal);
        }
        Command::Write { date, field, text } => {
            let index = field.checked_sub(1).ok_or("field numbers start at 1")?;
            let slot = FieldSlot::try_from(index)?;
            journal.go_to(date.parse()?);
            journal.apply(JournalCommand::UpdateField {
                date: journal.selected(),
                slot,
                value: text,
            });
            print_day(journal);
        }
        Command::Mood { date, rating } => {
            let mood = match rating.trim() {
                "none" | "" => None,
                raw => Some(
                    raw.parse::<i64>()
                        .ok()
                        .and_then(Mood::from_value)
                        .ok_or("rating must be 1, 2, 3 or none")?,
                ),
            };
            journal.go_to(date.parse()?);
            journal.apply(JournalCommand::SetMood {
                date: journal.selected(),
                mood,
            });
            print_day(journal);
        }
        Command::Titles { titles } => {
            if !titles.is_empty() {
                let titles: [String; 3] = titles
                    .try_into()
                    .map_err(|_| "pass exactly three titles")?;
                journal.apply(JournalCommand::RenameTitles(FieldTitles::new(titles)));
            }
            for (slot, title) in journal.titles().iter() {
                println!("{}: {title}", slot.index() + 1);
            }
        }
        Command::Search { query, exact } => {
            journal.set_fuzzy(!exact);
            let results = journal.search(&query);
            if results.is_empty() {
                println!("No results.");
            }
            for result in results {
                let (emoji, _) = mood_display(result.mood);
                println!("{} {emoji}", result.date);
                for found in result.matches {
                    let marker = if found.is_exact_match { "" } else { " (~)" };
                    println!("  {}{marker}: {}", found.field_title, found.snippet);
                }
            }
        }
        Command::Export { out } => {
            let path = out.unwrap_or_else(|| PathBuf::from(journal.export_file_name()));
            std::fs::write(&path, journal.export_csv()?)?;
            println!("Exported {} day(s) to {}", journal.store().len(), path.display());
        }
        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)?;
            let report = journal.import_csv(&text)?;
            println!(
                "Imported {} day(s); {} already present; {} row(s) skipped.",
                report.imported,
                report.already_present,
                report.skipped_count()
            );
            for skipped in &report.skipped {
                println!("  line {}: {}", skipped.line, skipped.reason);
            }
            if report.new_field_titles.is_some() {
                println!("Field titles taken from the file header.");
            }
        }
    }
    Ok(())
}

fn print_day(journal: &Journal) {
    let entry = journal.current_entry();
    let (emoji, label) = mood_display(entry.mood);
    println!("{} {emoji} {label}", entry.date);
    for (slot, title) in journal.titles().iter() {
        println!("  {title}: {}", entry.field(slot));
    }
}
