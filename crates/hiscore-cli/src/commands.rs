use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde_json::{json, Value};

use hiscore_board::{CompactionReport, LeaderboardService};
use hiscore_server::{HiscoreServer, ServerConfig};
use hiscore_store::{JournalConfig, JournalScoreStore};
use hiscore_types::{LeaderboardEntry, ScoreRecord};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref(), cli.data)?;
    let format = cli.format;

    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Top(args) => {
            let board = open_service(&config)?.top_scores(args.limit).await?;
            print_board(&board, &format)
        }
        Command::Submit(args) => {
            let record = submit(&open_service(&config)?, &args).await?;
            println!(
                "{} Score added: {} {}",
                "✓".green().bold(),
                record.name.to_string().bold(),
                record.score.to_string().yellow()
            );
            Ok(())
        }
        Command::Compact(args) => {
            if let Some(dir) = args.backup_dir {
                config.leaderboard.backup_dir = dir;
            }
            let report = open_service(&config)?.compact().await?;
            print_report(&report, &format)
        }
        Command::Backups(args) => {
            if let Some(dir) = args.backup_dir {
                config.leaderboard.backup_dir = dir;
            }
            let backups = open_service(&config)?.list_backups().await?;
            print_backups(&backups, &format)
        }
        Command::Restore(args) => {
            let restored = open_service(&config)?.restore(&args.backup).await?;
            println!(
                "{} Restored {} records from {}",
                "✓".green().bold(),
                restored.to_string().bold(),
                args.backup.display()
            );
            Ok(())
        }
    }
}

/// Defaults, then the config file, then `PORT`, then `--data`.
fn load_config(path: Option<&Path>, data: Option<PathBuf>) -> anyhow::Result<ServerConfig> {
    let config = match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    let mut config = config.with_env_overrides();
    if let Some(data) = data {
        config.data_path = data;
    }
    Ok(config)
}

/// Opening never modifies the journal, so `top` and `backups` are safe
/// against a journal a running server is writing.
fn open_service(config: &ServerConfig) -> anyhow::Result<LeaderboardService> {
    let store = JournalScoreStore::open(
        &config.data_path,
        JournalConfig {
            sync_mode: config.sync_mode,
        },
    )
    .with_context(|| format!("opening score journal {}", config.data_path.display()))?;
    Ok(LeaderboardService::new(Arc::new(store), config.leaderboard.clone()))
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    println!(
        "hiscore server on {} (journal: {})",
        config.bind_addr.to_string().bold(),
        config.data_path.display()
    );
    HiscoreServer::open(config)?.serve().await?;
    Ok(())
}

/// The score argument is parsed as JSON so that `2.5` or `-1` reach the same
/// validation as an HTTP submission.
async fn submit(service: &LeaderboardService, args: &SubmitArgs) -> anyhow::Result<ScoreRecord> {
    let score = serde_json::from_str::<Value>(&args.score)
        .unwrap_or_else(|_| Value::String(args.score.clone()));
    Ok(service.submit_score(&args.name, &score).await?)
}

fn print_board(board: &[LeaderboardEntry], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(board)?),
        OutputFormat::Text if board.is_empty() => println!("No scores yet."),
        OutputFormat::Text => {
            for (rank, entry) in board.iter().enumerate() {
                println!(
                    "{:>3}. {:<32} {}",
                    rank + 1,
                    entry.name.bold(),
                    entry.score.to_string().yellow()
                );
            }
        }
    }
    Ok(())
}

fn print_report(report: &CompactionReport, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "started_at": report.started_at.to_rfc3339(),
                "backup": report.backup.as_ref().map(|b| b.path.display().to_string()),
                "records_before": report.records_before,
                "records_after": report.records_after,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => match &report.backup {
            None => println!("Nothing to compact: the journal is empty."),
            Some(backup) => {
                println!("{} Compaction complete", "✓".green().bold());
                println!("  Backup: {}", backup.path.display().to_string().cyan());
                println!(
                    "  Records: {} → {}",
                    report.records_before,
                    report.records_after.to_string().bold()
                );
                println!("  Removed: {}", report.removed());
            }
        },
    }
    Ok(())
}

fn print_backups(backups: &[PathBuf], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let paths: Vec<_> = backups.iter().map(|p| p.display().to_string()).collect();
            println!("{}", serde_json::to_string_pretty(&paths)?);
        }
        OutputFormat::Text if backups.is_empty() => println!("No backups."),
        OutputFormat::Text => {
            for path in backups {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}
