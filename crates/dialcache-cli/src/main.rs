//! dialcache CLI - Inspect the local contact and call-log replica
//!
//! Reads the replica database the sync engine maintains; it never talks
//! to the external source itself.

use std::env;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use dialcache_core::classify::{classify, label_time_buckets, CallLogItem, DisplayMode};
use dialcache_core::db::{
    CursorStore, Database, Domain, RecordStore, SqliteCallLogStore, SqliteContactStore,
    SqliteCursorStore,
};
use dialcache_core::index::initials_index;
use dialcache_core::models::format_duration;
use dialcache_core::ContactRecord;
use serde::Serialize;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "dialcache")]
#[command(about = "Inspect the locally cached contact directory and call history")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional path to the replica database file
    #[arg(long, value_name = "PATH")]
    db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List contacts, sectioned by first letter
    Contacts {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the call log
    Calls {
        /// Grouping mode
        #[arg(long, value_enum, default_value_t = ModeArg::Merged)]
        mode: ModeArg,
        /// Number of calls to read from the replica (0 = all)
        #[arg(short, long, default_value = "100")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-domain sync cursor state
    Status,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum ModeArg {
    Timeline,
    Merged,
    Continuous,
}

impl From<ModeArg> for DisplayMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Timeline => Self::Timeline,
            ModeArg::Merged => Self::Merged,
            ModeArg::Continuous => Self::ContinuousMerge,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] dialcache_core::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Replica database not found at {0} (has the sync engine run?)")]
    ReplicaMissing(PathBuf),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dialcache=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);
    tracing::debug!("using replica database at {}", db_path.display());

    match cli.command {
        Commands::Contacts { json } => run_contacts(json, &db_path).await?,
        Commands::Calls { mode, limit, json } => {
            run_calls(mode.into(), limit, json, &db_path).await?;
        }
        Commands::Status => run_status(&db_path).await?,
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct ContactSection {
    section: char,
    contacts: Vec<ContactRecord>,
}

async fn run_contacts(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let store = SqliteContactStore::new(open_database(db_path)?);
    let contacts = store.find_all().await?;
    let sections: Vec<ContactSection> = initials_index(&contacts)
        .into_iter()
        .map(|(section, contacts)| ContactSection { section, contacts })
        .collect();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&sections)?);
    } else {
        for section in &sections {
            println!("{}", section.section);
            for contact in &section.contacts {
                println!("{}", format_contact_line(contact));
            }
        }
    }

    Ok(())
}

async fn run_calls(
    mode: DisplayMode,
    limit: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = SqliteCallLogStore::new(open_database(db_path)?);
    let records = if limit == 0 {
        store.find_all().await?
    } else {
        store.find_page(limit).await?
    };

    let mut items = classify(&records, mode);
    label_time_buckets(&mut items);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for item in &items {
            if let Some(bucket) = item.bucket {
                println!("{}", bucket.label());
            }
            println!("{}", format_call_line(item));
        }
    }

    Ok(())
}

async fn run_status(db_path: &Path) -> Result<(), CliError> {
    let cursors = SqliteCursorStore::new(open_database(db_path)?);

    for domain in [Domain::Contacts, Domain::CallLog] {
        let cursor = cursors.load(domain).await?;
        let state = if cursor.first_run {
            "never synced".to_string()
        } else {
            format!("last sync at {}", cursor.last_sync)
        };
        println!("{domain:<10} {state}");
    }

    Ok(())
}

fn format_contact_line(contact: &ContactRecord) -> String {
    let number = contact.primary_number().unwrap_or("-");
    format!("  {:<28}  {number}", contact.display_name)
}

fn format_call_line(item: &CallLogItem) -> String {
    let call = &item.summary.representative;
    let who = if call.cached_name.is_empty() {
        &call.phone_number
    } else {
        &call.cached_name
    };

    let mut line = format!(
        "  {} {}  {:<24}  {}",
        call.date,
        call.time,
        who,
        call.call_type.label()
    );
    if item.summary.call_count > 1 {
        line.push_str(&format!(" ({})", item.summary.call_count));
    }
    line.push_str(&format!(
        "  {}",
        format_duration(item.summary.total_duration_secs)
    ));
    line
}

fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("DIALCACHE_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dialcache")
        .join("replica.db")
}

fn open_database(path: &Path) -> Result<Database, CliError> {
    if !path.exists() {
        return Err(CliError::ReplicaMissing(path.to_path_buf()));
    }
    Ok(Database::open(path)?)
}

#[cfg(test)]
mod tests {
    use dialcache_core::models::{CallLogRecord, CallType, LabeledValue};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_mode_arg_maps_to_display_mode() {
        assert_eq!(DisplayMode::from(ModeArg::Timeline), DisplayMode::Timeline);
        assert_eq!(DisplayMode::from(ModeArg::Merged), DisplayMode::Merged);
        assert_eq!(
            DisplayMode::from(ModeArg::Continuous),
            DisplayMode::ContinuousMerge
        );
    }

    #[test]
    fn test_format_contact_line() {
        let mut contact = ContactRecord::new(1, "Ada Lovelace");
        contact
            .details
            .phones
            .push(LabeledValue::new("mobile", "555-0100"));

        let line = format_contact_line(&contact);
        assert!(line.contains("Ada Lovelace"));
        assert!(line.ends_with("555-0100"));
    }

    #[test]
    fn test_format_call_line_shows_count_and_duration() {
        let mut a = CallLogRecord::new(2, "555-0100", 2_000);
        a.cached_name = "Ada".into();
        a.call_type = CallType::Missed;
        a.duration_secs = 30;
        let mut b = CallLogRecord::new(1, "555-0100", 1_000);
        b.duration_secs = 31;

        let items = classify(&[a, b], DisplayMode::Merged);
        let line = format_call_line(&items[0]);

        assert!(line.contains("Ada"));
        assert!(line.contains("missed"));
        assert!(line.contains("(2)"));
        assert!(line.contains("1m 1s"));
    }

    #[test]
    fn test_resolve_db_path_prefers_cli_flag() {
        let explicit = PathBuf::from("/tmp/replica.db");
        assert_eq!(resolve_db_path(Some(explicit.clone())), explicit);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_open_database_requires_existing_replica() {
        let missing = std::env::temp_dir().join("dialcache-cli-missing-test.db");
        let _ = std::fs::remove_file(&missing);

        let error = open_database(&missing).unwrap_err();
        assert!(matches!(error, CliError::ReplicaMissing(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_status_on_fresh_replica() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("replica.db");
        drop(Database::open(&path).unwrap());

        run_status(&path).await.unwrap();
    }
}
