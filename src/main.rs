//! CLI entry point for `mailsweep`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use mailsweep::config::{self, Config};
use mailsweep::engine;
use mailsweep::error::StoreError;
use mailsweep::index::ExportIndex;
use mailsweep::store::maildir::MaildirStore;

#[derive(Parser)]
#[command(
    name = "mailsweep",
    version,
    about = "Export tagged mail into a dated archive, exactly once per message"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (default: $MAILSWEEP_CONFIG or the user config dir)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Export everything tagged for archiving (the default)
    Run,
    /// Show what the export index holds, without touching the mail store
    Status {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mailsweep: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    mailsweep::logging::init(log_level, &config::log_dir(&config));

    let result = match cli.command {
        Some(Commands::Status { json }) => cmd_status(&config, json),
        Some(Commands::Run) | None => cmd_run(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// One export pass.
fn cmd_run(config: &Config) -> anyhow::Result<()> {
    config.validate()?;

    let export_root = &config.archive.export_root;
    engine::prepare_export_root(export_root)?;

    let mut store = match MaildirStore::open(&config.store.maildir) {
        Ok(store) => store,
        Err(StoreError::Unavailable(reason)) => {
            info!(reason = %reason, "Mail store not available, nothing to do");
            return Ok(());
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Cannot open mail store '{}'", config.store.maildir.display())
            })
        }
    };

    let summary = engine::sweep(&mut store, &config.archive)?;
    info!(
        exported = summary.exported,
        indexed = summary.indexed,
        root = %export_root.display(),
        "Export run complete"
    );
    Ok(())
}

/// Print export index statistics.
fn cmd_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let path = config.archive.index_path();
    let index = ExportIndex::load(&path);
    let newest = index.iter().map(|(_, r)| r.exported_at).max();
    let hashed = index.iter().filter(|(_, r)| r.content_hash.is_some()).count();

    if json {
        let status = serde_json::json!({
            "index": path.to_string_lossy(),
            "records": index.len(),
            "hashed": hashed,
            "newest_export": newest.map(|t| t.to_rfc3339()),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  {:<20} {}", "Index", path.display());
    println!("  {:<20} {}", "Exported items", index.len());
    println!("  {:<20} {}", "With content hash", hashed);
    if let Some(newest) = newest {
        println!(
            "  {:<20} {}",
            "Last export",
            newest
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
        );
    }
    println!();
    Ok(())
}
