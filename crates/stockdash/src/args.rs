use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Terminal client for the stock screening dashboard.
#[derive(Parser)]
#[command(name = "stockdash", about = "Stock screening dashboard client", version = stockdash_core::VERSION)]
pub struct Args {
    /// API root of the screening service.
    #[arg(long, env = "STOCKDASH_URL", default_value = stockdash_core::config::DEFAULT_BASE_URL, global = true)]
    pub url: String,

    /// Rows per page.
    #[arg(long, env = "STOCKDASH_PAGE_SIZE", default_value_t = stockdash_core::config::DEFAULT_PAGE_SIZE, global = true)]
    pub page_size: usize,

    /// Status poll period in milliseconds.
    #[arg(long, env = "STOCKDASH_POLL_MS", default_value = "1500", global = true)]
    pub poll_ms: u64,

    /// Per-request timeout in seconds.
    #[arg(long, env = "STOCKDASH_TIMEOUT_SECS", default_value = "30", global = true)]
    pub timeout_secs: u64,

    /// JSON file with column definitions (built-in columns if unset).
    #[arg(long, env = "STOCKDASH_COLUMNS", value_name = "PATH", global = true)]
    pub columns: Option<PathBuf>,

    /// Use built-in demo data instead of a server.
    #[arg(long, global = true)]
    pub demo: bool,

    /// Re-sort loaded rows locally instead of refetching (TUI only).
    #[arg(long, global = true)]
    pub client_sort: bool,

    /// Write logs to this file. The TUI discards logs when unset.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(about = "Interactive dashboard (default)")]
    Tui,

    #[command(about = "Run a stock query and print the result")]
    Query {
        /// Substring of code or name.
        #[arg(long)]
        search: Option<String>,

        /// Column key to sort by (ascending unless --desc).
        #[arg(long, value_name = "KEY")]
        sort: Option<String>,

        #[arg(long, requires = "sort")]
        desc: bool,

        /// Range filter, e.g. `PEG=0..0.5`, `PEG=..1`, `所属行业=银行`. Repeatable.
        #[arg(long, value_name = "KEY=MIN..MAX")]
        filter: Vec<String>,

        /// 1-based page to print.
        #[arg(long, default_value = "1", conflicts_with = "all")]
        page: u32,

        /// Fetch and print every page.
        #[arg(long)]
        all: bool,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    #[command(about = "Print one metric's history for a stock")]
    History {
        code: String,

        /// Column key to plot.
        #[arg(long, value_name = "KEY")]
        field: String,
    },

    #[command(about = "Manage saved filter templates")]
    Templates {
        #[command(subcommand)]
        command: TemplatesCommand,
    },

    #[command(about = "Show or change the crawl schedule")]
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommand,
    },

    #[command(about = "Start a full data crawl")]
    Crawl,

    #[command(about = "Stop the running task")]
    Stop,

    #[command(about = "Recalculate metrics from stored data")]
    Recalc,

    #[command(about = "Restart the backend service")]
    Restart,

    #[command(about = "Show background task progress")]
    Status {
        /// Keep polling until the running task finishes.
        #[arg(long)]
        watch: bool,
    },
}

#[derive(Subcommand)]
pub enum TemplatesCommand {
    List,
    Save {
        name: String,

        #[arg(long, value_name = "KEY=MIN..MAX", required = true)]
        filter: Vec<String>,
    },
    Delete {
        name: String,
    },
}

#[derive(Subcommand)]
pub enum ScheduleCommand {
    Get,
    Set {
        #[arg(long)]
        hour: u8,

        #[arg(long)]
        minute: u8,

        /// Run weekly instead of daily.
        #[arg(long)]
        weekly: bool,

        /// Day of week for --weekly, 0 (Monday) through 6.
        #[arg(long, requires = "weekly", default_value = "5")]
        day: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Html,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_tui() {
        let args = Args::try_parse_from(["stockdash", "--demo"]).unwrap();
        assert!(args.demo);
        assert!(args.command.is_none());
    }

    #[test]
    fn query_collects_repeated_filters() {
        let args = Args::try_parse_from([
            "stockdash", "query", "--filter", "PEG=0..0.5", "--filter", "PB=..1", "--sort", "PEG",
            "--desc", "--format", "json",
        ])
        .unwrap();
        match args.command {
            Some(Command::Query {
                filter, sort, desc, format, ..
            }) => {
                assert_eq!(filter, vec!["PEG=0..0.5", "PB=..1"]);
                assert_eq!(sort.as_deref(), Some("PEG"));
                assert!(desc);
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected query"),
        }
    }

    #[test]
    fn page_and_all_conflict() {
        assert!(Args::try_parse_from(["stockdash", "query", "--page", "2", "--all"]).is_err());
    }
}
