//! Periodic sync job runner
//!
//! Each registered job runs once immediately, then on its own interval, under
//! a bounded timeout. One stop signal is shared by every job loop; stopping
//! lets an in-flight invocation finish and services no further ticks.

mod jobs;

pub use jobs::HubStatsJob;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::config::SchedulerConfig;
use crate::errors::SchedulerError;
use crate::logger::{self, LogTag};

/// A periodic synchronization routine
#[async_trait]
pub trait SyncJob: Send + Sync {
    /// Unique job identifier for logs
    fn name(&self) -> &'static str;

    /// One invocation; errors are logged, never fatal
    async fn run(&self) -> Result<(), String>;
}

struct RegisteredJob {
    job: Arc<dyn SyncJob>,
    interval: Duration,
}

pub struct Scheduler {
    jobs: Vec<RegisteredJob>,
    handles: Vec<JoinHandle<()>>,
    stop_tx: watch::Sender<bool>,
    job_timeout: Duration,
    started: bool,
}

impl Scheduler {
    pub fn new(config: &SchedulerConfig) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            handles: Vec::new(),
            stop_tx,
            job_timeout: config.job_timeout(),
            started: false,
        }
    }

    /// Add a job; rejected once the scheduler has started
    pub fn register(&mut self, job: Arc<dyn SyncJob>, interval: Duration) -> Result<(), SchedulerError> {
        if self.started {
            return Err(SchedulerError::AlreadyStarted);
        }
        logger::debug(
            LogTag::Scheduler,
            &format!("Registered job {} (every {}s)", job.name(), interval.as_secs()),
        );
        self.jobs.push(RegisteredJob { job, interval });
        Ok(())
    }

    /// Spawn one loop per job and return immediately
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.started {
            return Err(SchedulerError::AlreadyStarted);
        }
        self.started = true;

        for registered in &self.jobs {
            let handle = tokio::spawn(job_loop(
                registered.job.clone(),
                registered.interval,
                self.job_timeout,
                self.stop_tx.subscribe(),
            ));
            self.handles.push(handle);
        }

        logger::info(
            LogTag::Scheduler,
            &format!("Scheduler started with {} jobs", self.jobs.len()),
        );
        Ok(())
    }

    /// Signal every loop and wait until all have exited
    pub async fn stop(&mut self) -> Result<(), SchedulerError> {
        if !self.started {
            return Err(SchedulerError::NotStarted);
        }

        // Every loop holds a receiver until it exits; none left is fine
        let _ = self.stop_tx.send(true);

        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                logger::error(LogTag::Scheduler, &format!("Job loop failed: {}", e));
            }
        }

        logger::info(LogTag::Scheduler, "Scheduler stopped");
        Ok(())
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_running(&self) -> bool {
        self.started && !*self.stop_tx.borrow()
    }
}

async fn job_loop(
    job: Arc<dyn SyncJob>,
    every: Duration,
    job_timeout: Duration,
    mut stop: watch::Receiver<bool>,
) {
    // First tick completes immediately
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if *stop.borrow() {
                    break;
                }
                run_once(job.as_ref(), job_timeout).await;
            }
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
        }
    }

    logger::debug(LogTag::Scheduler, &format!("Job {} stopped", job.name()));
}

async fn run_once(job: &dyn SyncJob, job_timeout: Duration) {
    logger::debug(LogTag::Scheduler, &format!("Running job {}", job.name()));

    match timeout(job_timeout, job.run()).await {
        Ok(Ok(())) => {
            logger::debug(LogTag::Scheduler, &format!("Job {} completed", job.name()));
        }
        Ok(Err(e)) => {
            logger::warning(LogTag::Scheduler, &format!("Job {} failed: {}", job.name(), e));
        }
        Err(_) => {
            logger::warning(
                LogTag::Scheduler,
                &format!(
                    "Job {} timed out after {}s",
                    job.name(),
                    job_timeout.as_secs()
                ),
            );
        }
    }
}
