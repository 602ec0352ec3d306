//! stockdash - Terminal client for the stock screening dashboard.
//!
//! Usage:
//!   stockdash                                  # interactive dashboard
//!   stockdash --demo                           # dashboard on built-in demo data
//!   stockdash query --filter PEG=0..0.5 --sort PEG
//!   stockdash history 00700 --field PEG
//!   stockdash templates list
//!   stockdash schedule set --hour 17 --minute 30 --weekly --day 4
//!   stockdash status --watch

mod args;
mod commands;
mod output;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use stockdash_core::backend::{Backend, HttpBackend, MemoryBackend};
use stockdash_core::config::Config;
use stockdash_core::controller::{SortMode, TableController};
use stockdash_core::ops::Action;
use stockdash_core::tui::App;

use args::{Args, Command, ScheduleCommand, TemplatesCommand};
use commands::{Context, QueryOptions};

/// TUI redraw period.
const TICK_RATE: Duration = Duration::from_millis(250);

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let interactive = matches!(args.command, None | Some(Command::Tui));
    init_logging(args.verbose, args.log_file.as_deref(), interactive)?;

    let config = Config {
        base_url: args.url.clone(),
        page_size: args.page_size,
        poll_interval: Duration::from_millis(args.poll_ms),
        request_timeout: Duration::from_secs(args.timeout_secs),
        columns_path: args.columns.clone(),
    }
    .validated()?;
    let columns = config.load_columns()?;

    let backend: Arc<dyn Backend> = if args.demo {
        Arc::new(MemoryBackend::demo())
    } else {
        Arc::new(HttpBackend::new(&config)?)
    };
    info!(backend = backend.name(), url = %config.base_url, "starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let Some(command) = args.command.filter(|_| !interactive) else {
        let sort_mode = if args.client_sort {
            SortMode::Client
        } else {
            SortMode::Server
        };
        let table = TableController::new(columns, config.page_size).with_sort_mode(sort_mode);
        let app = App::new(backend, runtime.handle().clone(), table, config.poll_interval);
        app.run(TICK_RATE).context("terminal error")?;
        return Ok(());
    };

    let ctx = Context {
        backend,
        config,
        columns,
    };
    runtime.block_on(dispatch(&ctx, command))
}

async fn dispatch(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Tui => Ok(()),
        Command::Query {
            search,
            sort,
            desc,
            filter,
            page,
            all,
            format,
        } => {
            let opts = QueryOptions {
                search,
                sort,
                desc,
                filters: filter,
                page,
                all,
                format,
            };
            commands::query(ctx, opts).await
        }
        Command::History { code, field } => commands::history(ctx, &code, &field).await,
        Command::Templates { command } => match command {
            TemplatesCommand::List => commands::templates_list(ctx).await,
            TemplatesCommand::Save { name, filter } => {
                commands::templates_save(ctx, &name, &filter).await
            }
            TemplatesCommand::Delete { name } => commands::templates_delete(ctx, &name).await,
        },
        Command::Schedule { command } => match command {
            ScheduleCommand::Get => commands::schedule_get(ctx).await,
            ScheduleCommand::Set {
                hour,
                minute,
                weekly,
                day,
            } => commands::schedule_set(ctx, hour, minute, weekly, day).await,
        },
        Command::Crawl => commands::action(ctx, Action::TriggerCrawl).await,
        Command::Stop => commands::action(ctx, Action::StopCrawl).await,
        Command::Recalc => commands::action(ctx, Action::Recalculate).await,
        Command::Restart => commands::action(ctx, Action::Restart).await,
        Command::Status { watch: false } => commands::status(ctx).await,
        Command::Status { watch: true } => commands::status_watch(ctx).await,
    }
}

/// Logs go to `log_file` when set, otherwise to stderr. The TUI owns the
/// terminal, so without a log file it installs no subscriber at all.
fn init_logging(verbose: u8, log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let level = match (verbose, log_file.is_some()) {
        (0, false) => Level::WARN,
        (0, true) => Level::INFO,
        (1, _) => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(format!("stockdash={level}").parse()?);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if interactive => {}
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
