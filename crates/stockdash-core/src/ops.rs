//! Operational controls: crawl/stop/recalculate/restart, the crawl
//! schedule, and the task status poller.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::{ApiError, ScheduleError};
use crate::models::{Schedule, TaskStatus};

/// Wait after a restart before reloading the table.
pub const RESTART_REFRESH_DELAY: Duration = Duration::from_secs(3);

/// A control action. Every action is confirmed by the user before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    TriggerCrawl,
    StopCrawl,
    Recalculate,
    Restart,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::TriggerCrawl => "Start crawl",
            Action::StopCrawl => "Stop task",
            Action::Recalculate => "Recalculate",
            Action::Restart => "Restart service",
        }
    }

    pub fn confirm_prompt(self) -> &'static str {
        match self {
            Action::TriggerCrawl => "Start a full data crawl now?",
            Action::StopCrawl => "Stop the running task?",
            Action::Recalculate => "Recalculate all metrics from stored data?",
            Action::Restart => "Restart the backend service? The table reloads afterwards.",
        }
    }

    /// Delay before the table should be reloaded, if the action requires one.
    pub fn refresh_after(self) -> Option<Duration> {
        match self {
            Action::Restart => Some(RESTART_REFRESH_DELAY),
            _ => None,
        }
    }

    /// Sends the request; `success: false` becomes [`ApiError::Rejected`].
    pub async fn run(self, backend: &dyn Backend) -> Result<String, ApiError> {
        info!(action = ?self, "running action");
        let reply = match self {
            Action::TriggerCrawl => backend.trigger_crawl().await?,
            Action::StopCrawl => backend.stop_crawl().await?,
            Action::Recalculate => backend.recalculate().await?,
            Action::Restart => backend.restart().await?,
        };
        reply.into_result()
    }
}

pub async fn get_schedule(backend: &dyn Backend) -> Result<Schedule, ApiError> {
    backend.schedule().await
}

/// Validates locally, then saves.
pub async fn set_schedule(backend: &dyn Backend, schedule: &Schedule) -> Result<String, ScheduleError> {
    schedule.validate()?;
    let message = backend.set_schedule(schedule).await?.into_result()?;
    info!(%schedule, "schedule updated");
    Ok(message)
}

// ============================================================
// Status polling
// ============================================================

#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    /// Latest status from a successful poll.
    Updated(TaskStatus),
    /// A task that was running has stopped. Sent after the `Updated` for the same poll.
    Finished(TaskStatus),
    /// The poll failed.
    Unreachable(String),
}

/// Detects the running → not-running edge across polls.
#[derive(Debug, Default)]
pub struct TransitionDetector {
    was_running: bool,
}

impl TransitionDetector {
    /// Returns true when `status` ends a run seen by an earlier poll.
    pub fn observe(&mut self, status: &TaskStatus) -> bool {
        let finished = self.was_running && !status.is_running;
        self.was_running = status.is_running;
        finished
    }
}

/// Background task polling `GET /status` at a fixed interval.
///
/// Polling stops on [`StatusPoller::cancel`] or when the poller is dropped.
pub struct StatusPoller {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl StatusPoller {
    /// Starts polling on the current tokio runtime; `on_event` runs on the poll task.
    pub fn spawn<F>(backend: Arc<dyn Backend>, interval: Duration, on_event: F) -> Self
    where
        F: FnMut(StatusEvent) + Send + 'static,
    {
        let (cancel, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(poll_loop(backend, interval, cancel_rx, on_event));
        Self { cancel, handle }
    }

    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn poll_loop<F>(
    backend: Arc<dyn Backend>,
    interval: Duration,
    mut cancel: watch::Receiver<bool>,
    mut on_event: F,
) where
    F: FnMut(StatusEvent) + Send + 'static,
{
    let mut tick = tokio::time::interval(interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut detector = TransitionDetector::default();
    let mut unreachable = false;

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
                continue;
            }
        }

        match backend.status().await {
            Ok(status) => {
                if unreachable {
                    info!("status endpoint reachable again");
                    unreachable = false;
                }
                let finished = detector.observe(&status);
                on_event(StatusEvent::Updated(status.clone()));
                if finished {
                    info!(message = %status.message, "background task finished");
                    on_event(StatusEvent::Finished(status));
                }
            }
            Err(e) => {
                if !unreachable {
                    warn!(error = %e, "status poll failed");
                    unreachable = true;
                }
                on_event(StatusEvent::Unreachable(e.to_string()));
            }
        }
    }
    debug!("status poller stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::backend::MemoryBackend;
    use crate::columns::Columns;
    use crate::models::ScheduleKind;

    fn running(current: u64) -> TaskStatus {
        TaskStatus {
            is_running: true,
            current,
            total: 10,
            message: String::new(),
        }
    }

    #[test]
    fn detector_fires_once_per_run() {
        let mut d = TransitionDetector::default();
        assert!(!d.observe(&TaskStatus::default()));
        assert!(!d.observe(&running(1)));
        assert!(!d.observe(&running(2)));
        assert!(d.observe(&TaskStatus::default()));
        assert!(!d.observe(&TaskStatus::default()));
        assert!(!d.observe(&running(1)));
        assert!(d.observe(&TaskStatus::default()));
    }

    #[tokio::test]
    async fn actions_map_rejections() {
        let backend = MemoryBackend::new(Vec::new(), Columns::builtin());
        assert!(Action::TriggerCrawl.run(&backend).await.is_ok());
        assert!(matches!(
            Action::Recalculate.run(&backend).await,
            Err(ApiError::Rejected(_))
        ));
        assert!(Action::StopCrawl.run(&backend).await.is_ok());
        assert!(Action::StopCrawl.run(&backend).await.is_err());
        assert_eq!(Action::Restart.refresh_after(), Some(RESTART_REFRESH_DELAY));
        assert_eq!(Action::TriggerCrawl.refresh_after(), None);
    }

    #[tokio::test]
    async fn schedule_is_validated_before_sending() {
        let backend = MemoryBackend::new(Vec::new(), Columns::builtin());
        let bad = Schedule {
            minute: 75,
            ..Schedule::default()
        };
        assert_eq!(set_schedule(&backend, &bad).await, Err(ScheduleError::Minute(75)));
        assert_eq!(get_schedule(&backend).await.unwrap(), Schedule::default());

        let weekly = Schedule {
            hour: 9,
            minute: 30,
            kind: ScheduleKind::Weekly,
            day_of_week: "2".into(),
        };
        set_schedule(&backend, &weekly).await.unwrap();
        assert_eq!(get_schedule(&backend).await.unwrap(), weekly);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_reports_finish_once_and_stops_on_drop() {
        let backend = Arc::new(MemoryBackend::new(Vec::new(), Columns::builtin()));
        backend.trigger_crawl().await.unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let interval = Duration::from_millis(1500);
        let poller = StatusPoller::spawn(backend.clone(), interval, move |e| {
            sink.lock().unwrap().push(e);
        });

        tokio::time::sleep(interval * 10).await;
        let finished = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, StatusEvent::Finished(_)))
            .count();
        assert_eq!(finished, 1);

        drop(poller);
        tokio::time::sleep(interval).await;
        let seen = events.lock().unwrap().len();
        tokio::time::sleep(interval * 5).await;
        assert_eq!(events.lock().unwrap().len(), seen);
    }
}
