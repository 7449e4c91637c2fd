use std::sync::Arc;
use std::time::Duration;

use crawl_core::JobId;
use engine_logging::{engine_debug, engine_info, engine_trace, engine_warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, EventSink};

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    /// Give up on a job after this long; `None` polls until a terminal status.
    pub max_duration: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_duration: None,
        }
    }
}

struct RunningPoll {
    job_id: JobId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the single status timer. Emits `PollTick` immediately on start and
/// then once per interval until stopped.
pub struct Poller {
    settings: PollSettings,
    runtime: Handle,
    running: Option<RunningPoll>,
}

impl Poller {
    pub fn new(settings: PollSettings, runtime: Handle) -> Self {
        Self {
            settings,
            runtime,
            running: None,
        }
    }

    pub fn start(&mut self, job_id: JobId, sink: Arc<dyn EventSink>) {
        if let Some(previous) = self.running.as_ref() {
            engine_debug!(
                "Poller restart: dropping timer for {} before polling {}",
                previous.job_id,
                job_id
            );
        }
        self.stop();

        let cancel = CancellationToken::new();
        let task = self.runtime.spawn(poll_loop(
            job_id.clone(),
            self.settings.clone(),
            cancel.clone(),
            sink,
        ));
        engine_info!(
            "Polling job {} every {:?}",
            job_id,
            self.settings.interval
        );
        self.running = Some(RunningPoll {
            job_id,
            cancel,
            task,
        });
    }

    /// Cancels the timer. Returns whether one was running; calling it again is a no-op.
    pub fn stop(&mut self) -> bool {
        match self.running.take() {
            Some(running) => {
                running.cancel.cancel();
                engine_debug!("Stopped polling job {}", running.job_id);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    pub fn current_job(&self) -> Option<&JobId> {
        self.running.as_ref().map(|running| &running.job_id)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    job_id: JobId,
    settings: PollSettings,
    cancel: CancellationToken,
    sink: Arc<dyn EventSink>,
) {
    let started = Instant::now();
    let mut interval = tokio::time::interval(settings.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Some(max) = settings.max_duration {
                    if started.elapsed() >= max {
                        engine_warn!("Job {} still running after {:?}; giving up", job_id, max);
                        sink.emit(EngineEvent::PollDeadlineExceeded {
                            job_id: job_id.clone(),
                        });
                        break;
                    }
                }
                engine_trace!("Poll tick for {}", job_id);
                sink.emit(EngineEvent::PollTick { job_id: job_id.clone() });
            }
        }
    }
}
