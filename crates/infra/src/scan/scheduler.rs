//! Wall-clock scheduler for scan cycles.
//!
//! - Schedule: a cron expression, top of every hour by default
//! - Manual trigger: `handle.trigger()`, coalesced while a run is pending
//! - Failures: logged; the next scheduled cycle proceeds normally
//!
//! Cycles run inline in the scheduler task, so the scheduler itself never
//! overlaps cycles; the orchestrator's own lock covers other callers.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::orchestrator::{ScanError, ScanOrchestrator};

/// Second, minute, hour, day-of-month, month, day-of-week.
pub const HOURLY: &str = "0 0 * * * *";

#[derive(Debug, Clone)]
pub struct ScanScheduler {
    schedule: Schedule,
    run_on_startup: bool,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid schedule '{expression}': {reason}")]
pub struct InvalidSchedule {
    pub expression: String,
    pub reason: String,
}

impl ScanScheduler {
    pub fn hourly() -> Self {
        Self::from_expression(HOURLY).unwrap_or_else(|_| unreachable!("HOURLY is a valid cron expression"))
    }

    pub fn from_expression(expression: &str) -> Result<Self, InvalidSchedule> {
        let schedule = Schedule::from_str(expression).map_err(|e| InvalidSchedule {
            expression: expression.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            schedule,
            run_on_startup: false,
        })
    }

    pub fn with_run_on_startup(mut self, run_on_startup: bool) -> Self {
        self.run_on_startup = run_on_startup;
        self
    }

    /// Next fire time strictly after `now`.
    pub fn next_run_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&now).next()
    }

    /// Spawn the scheduler onto the current tokio runtime.
    pub fn spawn(&self, orchestrator: Arc<ScanOrchestrator>) -> ScanSchedulerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (trigger_tx, trigger_rx) = mpsc::channel::<()>(1);

        let cfg = self.clone();
        let join = tokio::spawn(scheduler_loop(cfg, orchestrator, shutdown_rx, trigger_rx));

        ScanSchedulerHandle {
            shutdown: Some(shutdown_tx),
            trigger: trigger_tx,
            join: Some(join),
        }
    }
}

/// Handle for the running scheduler (shutdown + trigger hook).
///
/// Dropping the handle stops the scheduler after the current cycle.
#[derive(Debug)]
pub struct ScanSchedulerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    trigger: mpsc::Sender<()>,
    join: Option<JoinHandle<()>>,
}

impl ScanSchedulerHandle {
    /// Request an immediate cycle. No-op if one is already pending.
    pub fn trigger(&self) {
        let _ = self.trigger.try_send(());
    }

    /// Stop the scheduler and wait for an in-flight cycle to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

async fn scheduler_loop(
    cfg: ScanScheduler,
    orchestrator: Arc<ScanOrchestrator>,
    mut shutdown_rx: oneshot::Receiver<()>,
    mut trigger_rx: mpsc::Receiver<()>,
) {
    info!(run_on_startup = cfg.run_on_startup, "scan scheduler started");

    let mut pending = cfg.run_on_startup;

    loop {
        if pending {
            pending = false;
            run_once(&orchestrator).await;
            continue;
        }

        let now = Utc::now();
        let Some(next) = cfg.next_run_after(now) else {
            warn!("schedule has no upcoming run; scheduler stopping");
            break;
        };
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = tokio::time::sleep(wait) => pending = true,
            Some(()) = trigger_rx.recv() => pending = true,
        }
    }

    info!("scan scheduler stopped");
}

async fn run_once(orchestrator: &ScanOrchestrator) {
    match orchestrator.run_cycle().await {
        Ok(report) => {
            info!(
                new_items = report.new_items,
                notice_sent = report.notice_sent,
                "scheduled scan completed"
            );
        }
        Err(ScanError::AlreadyRunning) => {
            warn!("previous scan still running; skipping this trigger");
        }
        Err(e) => {
            warn!(error = %e, "scheduled scan aborted");
        }
    }
}
