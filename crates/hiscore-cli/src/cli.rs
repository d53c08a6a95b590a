use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hiscore",
    about = "Placement Dodge leaderboard: serve scores and maintain the score journal",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Score journal path (overrides the config file)
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Show the leaderboard
    Top(TopArgs),
    /// Record a score
    Submit(SubmitArgs),
    /// Back up the journal, then keep only each player's best score
    Compact(CompactArgs),
    /// List compaction backups, newest first
    Backups(BackupsArgs),
    /// Replace the journal with the contents of a backup
    Restore(RestoreArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct TopArgs {
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,
}

#[derive(Args)]
pub struct SubmitArgs {
    pub name: String,
    #[arg(allow_negative_numbers = true)]
    pub score: String,
}

#[derive(Args)]
pub struct CompactArgs {
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct BackupsArgs {
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct RestoreArgs {
    pub backup: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["hiscore", "serve", "--bind", "127.0.0.1:8080"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("127.0.0.1:8080".parse().unwrap()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_serve_rejects_bad_addr() {
        assert!(Cli::try_parse_from(["hiscore", "serve", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn parse_top_default_limit() {
        let cli = Cli::try_parse_from(["hiscore", "top"]).unwrap();
        if let Command::Top(args) = cli.command {
            assert_eq!(args.limit, 10);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_top_limit() {
        let cli = Cli::try_parse_from(["hiscore", "top", "-n", "3"]).unwrap();
        if let Command::Top(args) = cli.command {
            assert_eq!(args.limit, 3);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_submit_negative_score_reaches_validation() {
        let cli = Cli::try_parse_from(["hiscore", "submit", "Alice", "-1"]).unwrap();
        if let Command::Submit(args) = cli.command {
            assert_eq!(args.name, "Alice");
            assert_eq!(args.score, "-1");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_compact_with_backup_dir() {
        let cli = Cli::try_parse_from(["hiscore", "compact", "--backup-dir", "/tmp/bk"]).unwrap();
        if let Command::Compact(args) = cli.command {
            assert_eq!(args.backup_dir, Some(PathBuf::from("/tmp/bk")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_restore() {
        let cli = Cli::try_parse_from(["hiscore", "restore", "backups/x.json"]).unwrap();
        assert!(matches!(cli.command, Command::Restore(_)));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "hiscore", "--verbose", "--format", "json", "--data", "s.journal", "backups",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.data, Some(PathBuf::from("s.journal")));
        assert!(matches!(cli.command, Command::Backups(_)));
    }
}
