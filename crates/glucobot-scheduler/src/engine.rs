//! Queue handle and tick loop.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use glucobot_core::reminder::ReminderJob;

const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Shared enqueue handle; clones refer to the same queue.
#[derive(Debug, Clone, Default)]
pub struct SchedulerHandle {
    queue: Arc<Mutex<Vec<ReminderJob>>>,
}

impl SchedulerHandle {
    /// Enqueue a job. Past instants are accepted and fire near-immediately.
    pub fn schedule(&self, job: ReminderJob) {
        info!(
            job_id = %job.id,
            chat_id = job.chat_id,
            fire_at = %job.fire_at,
            "reminder scheduled"
        );
        self.queue.lock().unwrap().push(job);
    }

    /// Number of jobs still waiting to fire.
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

/// Polls the queue and fires due jobs over an mpsc channel, one fire per job.
pub struct SchedulerEngine {
    handle: SchedulerHandle,
    fired_tx: mpsc::Sender<ReminderJob>,
    tick: Duration,
}

impl SchedulerEngine {
    pub fn new(handle: SchedulerHandle, fired_tx: mpsc::Sender<ReminderJob>) -> Self {
        Self {
            handle,
            fired_tx,
            tick: DEFAULT_TICK,
        }
    }

    /// Override the tick period. Tests use a short one.
    pub fn tick_every(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Main loop. Polls every tick until `shutdown` broadcasts `true` or the
    /// shutdown sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("scheduler engine started");
        let mut interval = tokio::time::interval(self.tick);
        loop {
            tokio::select! {
                _ = interval.tick() => self.tick_once(),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("scheduler engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Fire every job whose instant has arrived.
    fn tick_once(&self) {
        let now = Local::now();
        // Drain due jobs under the lock, send after releasing it.
        let due: Vec<ReminderJob> = {
            let mut queue = self.handle.queue.lock().unwrap();
            let mut due = Vec::new();
            let mut i = 0;
            while i < queue.len() {
                if queue[i].fire_at <= now {
                    due.push(queue.swap_remove(i));
                } else {
                    i += 1;
                }
            }
            due
        };

        for job in due {
            info!(job_id = %job.id, chat_id = job.chat_id, "reminder fired");
            // try_send keeps the tick loop from ever blocking on delivery.
            if self.fired_tx.try_send(job).is_err() {
                warn!("delivery channel full or closed — fired job dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as TimeDelta;
    use tokio::time::timeout;

    fn job_in(chat_id: i64, offset: TimeDelta) -> ReminderJob {
        ReminderJob::new(chat_id, Local::now() + offset, 1)
    }

    fn spawn_engine(
        handle: SchedulerHandle,
        tx: mpsc::Sender<ReminderJob>,
    ) -> (watch::Sender<bool>, tokio::task::JoinHandle<()>) {
        let engine = SchedulerEngine::new(handle, tx).tick_every(Duration::from_millis(10));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(engine.run(shutdown_rx));
        (shutdown_tx, task)
    }

    #[tokio::test]
    async fn past_instant_fires_on_next_tick() {
        let handle = SchedulerHandle::default();
        let (tx, mut rx) = mpsc::channel(8);
        handle.schedule(job_in(7, TimeDelta::seconds(-60)));

        let (_shutdown, _task) = spawn_engine(handle.clone(), tx);
        let fired = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("job should fire promptly")
            .expect("channel open");
        assert_eq!(fired.chat_id, 7);
        assert_eq!(handle.pending(), 0);
    }

    #[tokio::test]
    async fn future_instant_fires_once_due() {
        let handle = SchedulerHandle::default();
        let (tx, mut rx) = mpsc::channel(8);
        handle.schedule(job_in(3, TimeDelta::milliseconds(100)));

        let (_shutdown, _task) = spawn_engine(handle.clone(), tx);
        let fired = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("job should fire after its instant")
            .expect("channel open");
        assert_eq!(fired.chat_id, 3);
    }

    #[tokio::test]
    async fn each_job_fires_exactly_once() {
        let handle = SchedulerHandle::default();
        let (tx, mut rx) = mpsc::channel(8);
        handle.schedule(job_in(1, TimeDelta::seconds(-1)));

        let (_shutdown, _task) = spawn_engine(handle.clone(), tx);
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("first fire")
            .expect("channel open");
        assert!(
            timeout(Duration::from_millis(100), rx.recv()).await.is_err(),
            "a one-shot job must not fire twice"
        );
    }

    #[tokio::test]
    async fn same_chat_jobs_are_not_deduped() {
        let handle = SchedulerHandle::default();
        let (tx, mut rx) = mpsc::channel(8);
        handle.schedule(job_in(5, TimeDelta::seconds(-1)));
        handle.schedule(job_in(5, TimeDelta::seconds(-1)));

        let (_shutdown, _task) = spawn_engine(handle.clone(), tx);
        for _ in 0..2 {
            let fired = timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("both jobs should fire")
                .expect("channel open");
            assert_eq!(fired.chat_id, 5);
        }
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let handle = SchedulerHandle::default();
        let (tx, _rx) = mpsc::channel(8);
        let (shutdown_tx, task) = spawn_engine(handle, tx);

        shutdown_tx.send(true).expect("receiver alive");
        timeout(Duration::from_secs(1), task)
            .await
            .expect("engine should stop on shutdown")
            .expect("engine task should not panic");
    }
}
