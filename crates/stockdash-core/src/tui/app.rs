//! Main TUI application.
//!
//! The event loop owns [`AppState`] and is the only place that mutates it.
//! Backend calls run as tasks on the tokio runtime and report back through
//! the event channel.

use std::io;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::controller::{FetchRequest, TableController};
use crate::ops::{self, Action, StatusEvent, StatusPoller};
use crate::templates::TemplateManager;

use super::event::{Event, EventHandler, TemplateUpdate};
use super::input::{KeyAction, handle_key};
use super::render::render;
use super::state::{AppState, PopupState, ScheduleForm};

/// Main TUI application.
pub struct App {
    backend: Arc<dyn Backend>,
    runtime: Handle,
    state: AppState,
    poll_interval: Duration,
    should_quit: bool,
}

impl App {
    /// Creates a new App. Backend work is spawned on `runtime`.
    pub fn new(
        backend: Arc<dyn Backend>,
        runtime: Handle,
        table: TableController,
        poll_interval: Duration,
    ) -> Self {
        let state = AppState::new(table, backend.name().to_string());
        Self {
            backend,
            runtime,
            state,
            poll_interval,
            should_quit: false,
        }
    }

    /// Runs the TUI application.
    pub fn run(mut self, tick_rate: Duration) -> io::Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let events = EventHandler::new(tick_rate);
        let tx = events.sender();

        let poller = self.start_poller(&tx);
        self.start(&tx);

        // Main loop
        loop {
            self.state.resolve_selection();
            terminal.draw(|frame| render(frame, &mut self.state))?;

            match events.next() {
                Ok(event) => self.handle_event(event, &tx),
                Err(_) => self.should_quit = true,
            }
            // Apply whatever else arrived before the next draw.
            while let Some(event) = events.try_next() {
                self.handle_event(event, &tx);
            }

            if self.should_quit {
                break;
            }
        }

        poller.cancel();

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        info!("tui closed");
        Ok(())
    }

    fn start_poller(&self, tx: &Sender<Event>) -> StatusPoller {
        let _guard = self.runtime.enter();
        let status_tx = tx.clone();
        StatusPoller::spawn(self.backend.clone(), self.poll_interval, move |event| {
            let _ = status_tx.send(Event::Status(event));
        })
    }

    /// Issues the first query.
    fn start(&mut self, tx: &Sender<Event>) {
        let request = self.state.table.reset_and_query();
        self.state.rebuild_view();
        self.spawn_fetch(tx, request);
    }

    fn handle_event(&mut self, event: Event, tx: &Sender<Event>) {
        match event {
            Event::Tick | Event::Resize(_) => {}
            Event::Key(key) => {
                let action = handle_key(&mut self.state, key);
                self.dispatch(action, tx);
            }
            Event::Query(response) => {
                self.state.apply_fetch(response);
            }
            Event::History { generation, result } => {
                if !self.state.chart.apply(generation, result) {
                    debug!(generation, "discarding stale history");
                }
            }
            Event::Templates(Ok(update)) => {
                self.state.templates.set_templates(update.templates);
                if let Some(message) = update.message {
                    self.state.status_message = Some(message);
                }
            }
            Event::Templates(Err(e)) => {
                warn!(error = %e, "template request failed");
                self.state.popup = PopupState::error(e.to_string());
            }
            Event::Status(status) => self.on_status(status, tx),
            Event::ActionDone { action, result } => match result {
                Ok(message) => {
                    self.state.status_message = None;
                    self.state.popup = PopupState::info(action.label(), message);
                }
                Err(e) => {
                    warn!(?action, error = %e, "action failed");
                    self.state.status_message = None;
                    self.state.popup = PopupState::error(e.to_string());
                }
            },
            Event::Schedule(result) => {
                // The user may have closed the editor while it was loading.
                if !matches!(self.state.popup, PopupState::Schedule(_)) {
                    return;
                }
                self.state.popup = match result {
                    Ok(schedule) => PopupState::Schedule(ScheduleForm::from_schedule(&schedule)),
                    Err(e) => PopupState::error(e.to_string()),
                };
            }
            Event::ScheduleSaved(result) => match result {
                Ok(message) => self.state.popup = PopupState::info("Crawl schedule", message),
                Err(e) => match &mut self.state.popup {
                    PopupState::Schedule(form) => form.error = Some(e.to_string()),
                    _ => self.state.popup = PopupState::error(e.to_string()),
                },
            },
            Event::Refresh => self.refresh(tx),
        }
    }

    fn on_status(&mut self, event: StatusEvent, tx: &Sender<Event>) {
        match event {
            StatusEvent::Updated(status) => {
                self.state.task = Some(status);
                self.state.poll_error = None;
            }
            StatusEvent::Finished(status) => {
                info!(message = %status.message, "task finished, reloading table");
                self.state.task = Some(status);
                self.state.status_message = Some("Task finished, table reloaded".to_string());
                self.refresh(tx);
            }
            StatusEvent::Unreachable(message) => {
                self.state.poll_error = Some(message);
            }
        }
    }

    fn refresh(&mut self, tx: &Sender<Event>) {
        let request = self.state.table.refresh();
        self.state.rebuild_view();
        self.spawn_fetch(tx, request);
    }

    fn dispatch(&mut self, action: KeyAction, tx: &Sender<Event>) {
        match action {
            KeyAction::None => {}
            KeyAction::Quit => self.should_quit = true,
            KeyAction::Fetch(request) => self.spawn_fetch(tx, request),
            KeyAction::OpenChart(request) => {
                let backend = self.backend.clone();
                let tx = tx.clone();
                self.runtime.spawn(async move {
                    let result = backend.history(&request.code).await;
                    let _ = tx.send(Event::History {
                        generation: request.generation,
                        result,
                    });
                });
            }
            KeyAction::LoadTemplates => self.spawn_templates(tx, TemplateOp::Load),
            KeyAction::SaveTemplate { name, filters } => {
                self.spawn_templates(tx, TemplateOp::Save { name, filters })
            }
            KeyAction::DeleteTemplate(name) => {
                self.spawn_templates(tx, TemplateOp::Delete(name))
            }
            KeyAction::RunAction(action) => self.spawn_action(tx, action),
            KeyAction::LoadSchedule => {
                let backend = self.backend.clone();
                let tx = tx.clone();
                self.runtime.spawn(async move {
                    let result = ops::get_schedule(backend.as_ref()).await;
                    let _ = tx.send(Event::Schedule(result));
                });
            }
            KeyAction::SaveSchedule(schedule) => {
                let backend = self.backend.clone();
                let tx = tx.clone();
                self.runtime.spawn(async move {
                    let result = ops::set_schedule(backend.as_ref(), &schedule).await;
                    let _ = tx.send(Event::ScheduleSaved(result));
                });
            }
        }
    }

    fn spawn_fetch(&self, tx: &Sender<Event>, request: FetchRequest) {
        let backend = self.backend.clone();
        let tx = tx.clone();
        self.runtime.spawn(async move {
            let result = backend.query_stocks(&request.query).await;
            let _ = tx.send(Event::Query(request.complete(result)));
        });
    }

    fn spawn_templates(&self, tx: &Sender<Event>, op: TemplateOp) {
        let backend = self.backend.clone();
        let tx = tx.clone();
        self.runtime.spawn(async move {
            let mut manager = TemplateManager::new();
            let backend = backend.as_ref();
            let result = match op {
                TemplateOp::Load => manager.refresh(backend).await.map(|()| None),
                TemplateOp::Save { name, filters } => {
                    manager.save(backend, &name, &filters).await.map(Some)
                }
                TemplateOp::Delete(name) => manager.delete(backend, &name).await.map(Some),
            };
            let update = result.map(|message| TemplateUpdate {
                templates: manager.templates().to_vec(),
                message,
            });
            let _ = tx.send(Event::Templates(update));
        });
    }

    /// Runs a confirmed action. Actions with a refresh delay (restart) do
    /// not wait for the reply before scheduling the reload.
    fn spawn_action(&self, tx: &Sender<Event>, action: Action) {
        let backend = self.backend.clone();
        let done_tx = tx.clone();
        self.runtime.spawn(async move {
            let result = action.run(backend.as_ref()).await;
            let _ = done_tx.send(Event::ActionDone { action, result });
        });

        if let Some(delay) = action.refresh_after() {
            let refresh_tx = tx.clone();
            self.runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = refresh_tx.send(Event::Refresh);
            });
        }
    }
}

enum TemplateOp {
    Load,
    Save {
        name: String,
        filters: crate::models::FilterMap,
    },
    Delete(String),
}
