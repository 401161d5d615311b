use futures::future::join_all;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Shortest period a job may be registered with.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Registered,
    Running,
}

/// Drives named recurring jobs on the tokio runtime.
///
/// Every name gets one guard. A tick that finds a run of the same name still
/// in progress is skipped, so no two runs of one job ever overlap.
pub struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
    guards: HashMap<String, Arc<Mutex<()>>>,
    handles: Vec<(String, JoinHandle<()>)>,
    run_on_start: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            guards: HashMap::new(),
            handles: Vec::new(),
            run_on_start: false,
        }
    }

    /// Fire each job once immediately instead of waiting a full interval.
    pub fn run_on_start(mut self, yes: bool) -> Self {
        self.run_on_start = yes;
        self
    }

    /// Register `task` to run every `every` under `name`.
    ///
    /// A zero interval is raised to [`MIN_INTERVAL`].
    pub fn schedule<F, Fut>(&mut self, name: &str, every: Duration, task: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let every = if every.is_zero() {
            warn!(task = %name, floor = ?MIN_INTERVAL, "zero interval requested; using floor");
            MIN_INTERVAL
        } else {
            every
        };
        let guard = Arc::clone(
            self.guards
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        );
        let mut shutdown = self.shutdown_tx.subscribe();
        let first = if self.run_on_start {
            Instant::now()
        } else {
            Instant::now() + every
        };
        let task_name = name.to_string();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(first, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {}
                }
                let Ok(_running) = guard.try_lock() else {
                    info!(task = %task_name, "previous run still in progress; skipping tick");
                    continue;
                };
                debug!(task = %task_name, "run started");
                task().await;
                debug!(task = %task_name, "run finished");
            }
            debug!(task = %task_name, "stopped");
        });

        info!(task = %name, every = ?every, "registered");
        self.handles.push((name.to_string(), handle));
    }

    pub fn state(&self, name: &str) -> Option<TaskState> {
        self.guards.get(name).map(|g| match g.try_lock() {
            Ok(_) => TaskState::Registered,
            Err(_) => TaskState::Running,
        })
    }

    /// Withdraw pending ticks and wait for in-flight runs to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let (names, handles): (Vec<_>, Vec<_>) = self.handles.into_iter().unzip();
        for (name, joined) in names.iter().zip(join_all(handles).await) {
            if let Err(e) = joined {
                error!(task = %name, error = %e, "task ended abnormally");
            }
        }
        info!("scheduler stopped");
    }
}
