//! One-shot subcommands.

use std::sync::Arc;

use anyhow::{Context as _, Result, anyhow, bail};
use tracing::{debug, info};

use stockdash_core::backend::Backend;
use stockdash_core::chart::{self, ChartLoader, ChartState, ChartTarget};
use stockdash_core::columns::{ColumnDef, Columns};
use stockdash_core::config::Config;
use stockdash_core::controller::{TableController, fetch, fetch_all};
use stockdash_core::fmt::format_progress;
use stockdash_core::models::{FilterMap, Schedule, ScheduleKind, TaskStatus};
use stockdash_core::ops::{self, Action, StatusEvent, StatusPoller};
use stockdash_core::templates::TemplateManager;
use stockdash_core::view::{build_stock_view, html};

use crate::args::OutputFormat;
use crate::output::{render_series, render_templates, render_text};

/// Everything a command needs: the resolved backend and session settings.
pub struct Context {
    pub backend: Arc<dyn Backend>,
    pub config: Config,
    pub columns: Columns,
}

impl Context {
    fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }
}

/// Splits `KEY=MIN..MAX` into key and bounds.
///
/// Either bound may be empty. Without `..` the whole value is the lower
/// bound, which for text columns is the substring to match.
pub fn parse_filter_arg(raw: &str) -> Result<(String, Option<String>, Option<String>)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("filter '{raw}' is not KEY=MIN..MAX"))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("filter '{raw}' has no column key");
    }
    let bound = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
    let (min, max) = match value.split_once("..") {
        Some((min, max)) => (bound(min), bound(max)),
        None => (bound(value), None),
    };
    Ok((key.to_string(), min, max))
}

/// Validates filter arguments the same way the filter form does.
fn build_filters(columns: &Columns, raw: &[String]) -> Result<FilterMap> {
    let mut scratch = TableController::new(columns.clone(), 1);
    for arg in raw {
        let (key, min, max) = parse_filter_arg(arg)?;
        scratch.set_filter(&key, min.as_deref(), max.as_deref())?;
    }
    Ok(scratch.query().filters.clone())
}

fn report(message: String, fallback: &str) {
    if message.trim().is_empty() {
        println!("{fallback}");
    } else {
        println!("{message}");
    }
}

pub struct QueryOptions {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub desc: bool,
    pub filters: Vec<String>,
    pub page: u32,
    pub all: bool,
    pub format: OutputFormat,
}

pub async fn query(ctx: &Context, opts: QueryOptions) -> Result<()> {
    let mut ctl = TableController::new(ctx.columns.clone(), ctx.config.page_size);
    let mut request = ctl.reset_and_query();

    if let Some(text) = &opts.search {
        request = ctl.set_search(text);
    }
    for arg in &opts.filters {
        let (key, min, max) = parse_filter_arg(arg)?;
        request = ctl.set_filter(&key, min.as_deref(), max.as_deref())?;
    }
    if let Some(key) = &opts.sort {
        let kind = ctl
            .columns()
            .get(key)
            .map(ColumnDef::sort_kind)
            .ok_or_else(|| anyhow!("unknown column: {key}"))?;
        let presses = if opts.desc { 2 } else { 1 };
        for _ in 0..presses {
            if let Some(r) = ctl.set_sort(key, kind)? {
                request = r;
            }
        }
    }

    debug!(query = ?request.query, "running query");
    fetch(&mut ctl, ctx.backend(), request).await;
    if let Some(e) = ctl.error() {
        bail!("query failed: {e}");
    }

    let mut start = 0;
    if opts.all {
        fetch_all(&mut ctl, ctx.backend()).await;
    } else {
        for _ in 1..opts.page.max(1) {
            let Some(request) = ctl.load_next_page() else {
                bail!("page {} is past the last page", opts.page);
            };
            start = ctl.rows().len();
            fetch(&mut ctl, ctx.backend(), request).await;
            if let Some(e) = ctl.page_error() {
                bail!("page fetch failed: {e}");
            }
        }
    }

    let mut view = build_stock_view(&ctl);
    view.rows.drain(..start.min(view.rows.len()));
    if opts.page > 1 {
        view.title = format!("{} (page {})", view.title, opts.page);
    }

    match opts.format {
        OutputFormat::Table => print!("{}", render_text(&view)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ctl.rows()[start..])?),
        OutputFormat::Html => print!("{}", html::render_table(&view)),
    }

    if let Some(e) = ctl.page_error() {
        bail!("stopped after {} rows: {e}", ctl.rows().len());
    }
    Ok(())
}

pub async fn history(ctx: &Context, code: &str, field: &str) -> Result<()> {
    let column = ctx
        .columns
        .get(field)
        .ok_or_else(|| anyhow!("unknown column: {field}"))?;
    if !column.is_chartable() {
        bail!("column {field} has no history chart");
    }

    let mut loader = ChartLoader::new();
    chart::load(&mut loader, ctx.backend(), ChartTarget::for_column(code, column)).await;
    match loader.state() {
        ChartState::Ready(series) => {
            print!("{}", render_series(series));
            Ok(())
        }
        ChartState::Failed { message, .. } => bail!("history for {code} failed: {message}"),
        ChartState::Idle | ChartState::Loading(_) => bail!("history for {code} was not loaded"),
    }
}

pub async fn templates_list(ctx: &Context) -> Result<()> {
    let mut manager = TemplateManager::new();
    manager.refresh(ctx.backend()).await?;
    print!("{}", render_templates(manager.templates()));
    Ok(())
}

pub async fn templates_save(ctx: &Context, name: &str, filters: &[String]) -> Result<()> {
    let filters = build_filters(&ctx.columns, filters)?;
    let mut manager = TemplateManager::new();
    let message = manager.save(ctx.backend(), name, &filters).await?;
    report(message, &format!("Template '{}' saved", name.trim()));
    Ok(())
}

pub async fn templates_delete(ctx: &Context, name: &str) -> Result<()> {
    let mut manager = TemplateManager::new();
    let message = manager.delete(ctx.backend(), name).await?;
    report(message, &format!("Template '{name}' deleted"));
    Ok(())
}

pub async fn schedule_get(ctx: &Context) -> Result<()> {
    let schedule = ops::get_schedule(ctx.backend()).await?;
    println!("Crawl runs {schedule}");
    Ok(())
}

pub async fn schedule_set(
    ctx: &Context,
    hour: u8,
    minute: u8,
    weekly: bool,
    day: String,
) -> Result<()> {
    let schedule = Schedule {
        hour,
        minute,
        kind: if weekly {
            ScheduleKind::Weekly
        } else {
            ScheduleKind::Daily
        },
        day_of_week: day,
    };
    let message = ops::set_schedule(ctx.backend(), &schedule).await?;
    report(message, &format!("Crawl now runs {schedule}"));
    Ok(())
}

pub async fn action(ctx: &Context, action: Action) -> Result<()> {
    let message = action
        .run(ctx.backend())
        .await
        .with_context(|| format!("{} failed", action.label()))?;
    report(message, &format!("{}: ok", action.label()));
    if let Some(delay) = action.refresh_after() {
        println!("Service is restarting; data is available again in about {}s", delay.as_secs());
    }
    Ok(())
}

fn status_line(status: &TaskStatus) -> String {
    let progress = format_progress(status);
    if status.is_running {
        format!("running  {progress}")
    } else if progress.is_empty() {
        "idle".to_string()
    } else {
        format!("idle  {progress}")
    }
}

pub async fn status(ctx: &Context) -> Result<()> {
    let status = ctx.backend().status().await?;
    println!("{}", status_line(&status));
    Ok(())
}

/// Polls until the running task finishes, the service reports idle on the
/// first poll, or Ctrl-C.
pub async fn status_watch(ctx: &Context) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let poller = StatusPoller::spawn(ctx.backend.clone(), ctx.config.poll_interval, move |event| {
        let _ = tx.send(event);
    });

    let mut first = true;
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(StatusEvent::Updated(status)) => {
                    println!("{}", status_line(&status));
                    if first && !status.is_running {
                        break;
                    }
                    first = false;
                }
                Some(StatusEvent::Finished(_)) => {
                    println!("task finished");
                    break;
                }
                Some(StatusEvent::Unreachable(e)) => eprintln!("status unavailable: {e}"),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }
    poller.cancel();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockdash_core::backend::MemoryBackend;

    fn demo_context() -> Context {
        Context {
            backend: Arc::new(MemoryBackend::demo()),
            config: Config::default(),
            columns: Columns::builtin(),
        }
    }

    #[test]
    fn filter_args_split_into_bounds() {
        let parsed = parse_filter_arg("PEG=0..0.5").unwrap();
        assert_eq!(parsed, ("PEG".into(), Some("0".into()), Some("0.5".into())));

        let parsed = parse_filter_arg("PB=..1").unwrap();
        assert_eq!(parsed, ("PB".into(), None, Some("1".into())));

        let parsed = parse_filter_arg("市盈率=-5..").unwrap();
        assert_eq!(parsed, ("市盈率".into(), Some("-5".into()), None));

        let parsed = parse_filter_arg("所属行业=银行").unwrap();
        assert_eq!(parsed, ("所属行业".into(), Some("银行".into()), None));
    }

    #[test]
    fn malformed_filter_args_are_rejected() {
        assert!(parse_filter_arg("PEG").is_err());
        assert!(parse_filter_arg("=1..2").is_err());
    }

    #[test]
    fn filters_are_validated_against_columns() {
        let columns = Columns::builtin();
        let filters = build_filters(&columns, &["PEG=..0.5".to_string()]).unwrap();
        assert!(filters.contains_key("PEG"));
        assert!(build_filters(&columns, &["PEG=abc".to_string()]).is_err());
        assert!(build_filters(&columns, &["nope=1".to_string()]).is_err());
    }

    #[test]
    fn status_line_distinguishes_running() {
        let running = TaskStatus {
            is_running: true,
            current: 30,
            total: 120,
            message: "crawling".into(),
        };
        assert_eq!(status_line(&running), "running  30/120 (25%) crawling");
        assert_eq!(status_line(&TaskStatus::default()), "idle");
    }

    #[tokio::test]
    async fn commands_run_against_demo_backend() {
        let ctx = demo_context();
        let options = |filters: Vec<String>, page| QueryOptions {
            search: None,
            sort: Some("PEG".into()),
            desc: true,
            filters,
            page,
            all: false,
            format: OutputFormat::Json,
        };
        query(&ctx, options(vec![], 2)).await.unwrap();
        query(&ctx, options(vec!["PEG=0..".into()], 1)).await.unwrap();
        assert!(query(&ctx, options(vec![], 9)).await.is_err());

        templates_save(&ctx, "low peg", &["PEG=..0.5".to_string()]).await.unwrap();
        let templates = ctx.backend().templates().await.unwrap();
        assert!(templates.iter().any(|t| t.name == "low peg"));
        templates_delete(&ctx, "low peg").await.unwrap();

        schedule_set(&ctx, 18, 30, true, "2".into()).await.unwrap();
        let schedule = ctx.backend().schedule().await.unwrap();
        assert_eq!((schedule.hour, schedule.minute), (18, 30));
        assert_eq!(schedule.kind, ScheduleKind::Weekly);
    }

    #[tokio::test]
    async fn invalid_schedule_fails_before_sending() {
        let ctx = demo_context();
        assert!(schedule_set(&ctx, 24, 0, false, "5".into()).await.is_err());
    }

    #[tokio::test]
    async fn history_rejects_text_columns() {
        let ctx = demo_context();
        assert!(history(&ctx, "000001", "所属行业").await.is_err());
        assert!(history(&ctx, "000001", "nope").await.is_err());
    }
}
