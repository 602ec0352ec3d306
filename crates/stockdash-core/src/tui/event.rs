//! Event handling for TUI.
//!
//! A separate thread polls for terminal events and timer ticks. Backend
//! tasks running on the tokio runtime report back through the same channel
//! via [`EventHandler::sender`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};

use crate::controller::FetchResponse;
use crate::error::{ApiError, ScheduleError, TemplateError};
use crate::models::{FilterTemplate, HistoryResponse, Schedule};
use crate::ops::{Action, StatusEvent};

/// Template list after a load, save or delete, with the server message if any.
#[derive(Debug)]
pub struct TemplateUpdate {
    pub templates: Vec<FilterTemplate>,
    pub message: Option<String>,
}

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// Timer tick for redraw.
    Tick,
    /// Keyboard input.
    Key(KeyEvent),
    /// Terminal resize (width).
    Resize(u16),
    /// A stock query finished.
    Query(FetchResponse),
    /// A history request finished.
    History {
        generation: u64,
        result: Result<HistoryResponse, ApiError>,
    },
    Templates(Result<TemplateUpdate, TemplateError>),
    Status(StatusEvent),
    ActionDone {
        action: Action,
        result: Result<String, ApiError>,
    },
    Schedule(Result<Schedule, ApiError>),
    ScheduleSaved(Result<String, ScheduleError>),
    /// Reload the table with the current query.
    Refresh,
}

/// Event handler that polls for terminal events in a separate thread.
pub struct EventHandler {
    rx: Receiver<Event>,
    tx: Sender<Event>,
}

impl EventHandler {
    /// Creates a new event handler with the specified tick rate.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let event_tx = tx.clone();

        thread::spawn(move || {
            loop {
                if event::poll(tick_rate).unwrap_or(false) {
                    if let Ok(evt) = event::read() {
                        let event = match evt {
                            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                                Event::Key(key)
                            }
                            CrosstermEvent::Resize(w, _) => Event::Resize(w),
                            _ => continue,
                        };
                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                } else if event_tx.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx, tx }
    }

    /// Sender for background tasks.
    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    /// Receives the next event, blocking until one is available.
    pub fn next(&self) -> Result<Event, mpsc::RecvError> {
        self.rx.recv()
    }

    /// Returns an already queued event without blocking.
    pub fn try_next(&self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}
