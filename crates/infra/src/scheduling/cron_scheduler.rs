//! Cron-driven runner for background jobs.
//!
//! Join handles are tracked, cancellation is explicit, and every asynchronous
//! step (start, stop, join and each job run) is wrapped in a timeout.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use hearth_infra::scheduling::{CronScheduler, CronSchedulerConfig, ScheduledTask, SchedulerResult};
//!
//! # async fn example(task: Arc<dyn ScheduledTask>) -> SchedulerResult<()> {
//! let mut scheduler = CronScheduler::new(CronSchedulerConfig::default());
//! scheduler.register("0 * * * * *", task);
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hearth_domain::Result;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Unit of periodic work.
#[async_trait]
pub trait ScheduledTask: Send + Sync {
    /// Stable job name used in logs.
    fn name(&self) -> &'static str;

    async fn run(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct CronSchedulerConfig {
    /// Timeout applied to a single job execution.
    pub job_timeout: Duration,
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for CronSchedulerConfig {
    fn default() -> Self {
        Self {
            job_timeout: Duration::from_secs(300),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

struct Registration {
    cron: String,
    task: Arc<dyn ScheduledTask>,
}

/// Scheduler with explicit lifecycle management.
pub struct CronScheduler {
    scheduler: Option<JobScheduler>,
    config: CronSchedulerConfig,
    registrations: Vec<Registration>,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
}

impl CronScheduler {
    pub fn new(config: CronSchedulerConfig) -> Self {
        Self {
            scheduler: None,
            config,
            registrations: Vec::new(),
            monitor_handle: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Add a job. Takes effect on the next `start`.
    pub fn register(&mut self, cron: impl Into<String>, task: Arc<dyn ScheduledTask>) {
        self.registrations.push(Registration { cron: cron.into(), task });
    }

    pub fn job_names(&self) -> Vec<&'static str> {
        self.registrations.iter().map(|r| r.task.name()).collect()
    }

    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?
            .map_err(|source| SchedulerError::StartFailed { source })?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        self.monitor_handle = Some(tokio::spawn(Self::monitor_task(cancel)));

        info!(jobs = self.registrations.len(), "Scheduler started");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let Some(mut scheduler) = self.scheduler.take() else {
            return Err(SchedulerError::NotRunning);
        };

        let stop_timeout = self.config.stop_timeout;
        tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
            .await
            .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?
            .map_err(|source| SchedulerError::StopFailed { source })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("Scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler =
            JobScheduler::new().await.map_err(|source| SchedulerError::CreationFailed { source })?;

        for registration in &self.registrations {
            let name = registration.task.name();
            let task = registration.task.clone();
            let job_timeout = self.config.job_timeout;

            let job = Job::new_async(registration.cron.as_str(), move |_id, _lock| {
                let task = task.clone();
                Box::pin(async move { run_with_timeout(task, job_timeout).await })
            })
            .map_err(|source| SchedulerError::JobRegistrationFailed { job: name, source })?;

            let job_id = job.guid();
            scheduler
                .add(job)
                .await
                .map_err(|source| SchedulerError::JobRegistrationFailed { job: name, source })?;
            debug!(job = name, cron = %registration.cron, job_id = %job_id, "Registered job");
        }

        Ok(scheduler)
    }

    async fn monitor_task(cancel: CancellationToken) {
        cancel.cancelled().await;
        debug!("Scheduler monitor cancelled");
    }
}

/// One job execution; failures and timeouts are logged, never propagated.
pub async fn run_with_timeout(task: Arc<dyn ScheduledTask>, job_timeout: Duration) {
    let name = task.name();
    let started = Instant::now();
    debug!(job = name, "Job invoked");

    match tokio::time::timeout(job_timeout, task.run()).await {
        Ok(Ok(())) => {
            debug!(job = name, elapsed_ms = started.elapsed().as_millis() as u64, "Job finished");
        }
        Ok(Err(err)) => {
            error!(job = name, error = %err, kind = err.label(), "Job failed");
        }
        Err(_) => {
            warn!(job = name, timeout_secs = job_timeout.as_secs(), "Job timed out");
        }
    }
}

impl Drop for CronScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("CronScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
