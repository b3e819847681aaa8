//! One scan cycle: ask, parse, dedupe, persist, broadcast.
//!
//! ## Pipeline
//!
//! 1. Query the intelligence client (bounded by `upstream_timeout`).
//! 2. Parse the reply into a batch of loose records.
//! 3. Snapshot the recipient directory once for the whole cycle.
//! 4. For each record, in order: skip known names, otherwise normalise,
//!    insert, and broadcast the per-tinker message.
//! 5. If nothing new was accepted, broadcast the "no new tinkers" notice.
//!
//! Steps 1 and 2 abort the cycle before any state change. Storage failures
//! abort the remaining records; tinkers already inserted stay inserted. An
//! insert and its broadcast are not atomic: a crash in between leaves the
//! tinker stored and some recipients unnotified.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use tinkerscout_ai::{parse_batch, IntelligenceClient, MalformedResponseError, ScanVariant, UpstreamError};

use crate::catalog::{CatalogError, CatalogStore};
use crate::directory::{DirectoryError, RecipientDirectory};
use crate::notify::{format_tinker_message, BroadcastReport, Notifier, NO_NEW_TINKERS_NOTICE};

/// Why a cycle ended early.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("a scan cycle is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Malformed(#[from] MalformedResponseError),

    #[error("recipient directory unavailable: {0}")]
    Directory(#[from] DirectoryError),

    #[error("catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),
}

/// What a completed cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Records in the parsed batch.
    pub fetched: usize,
    /// Tinkers inserted this cycle.
    pub new_items: usize,
    /// Records skipped because the name was already recorded.
    pub duplicates: usize,
    /// Records without a usable name.
    pub rejected: usize,
    /// Size of the recipient snapshot.
    pub recipients: usize,
    pub deliveries: BroadcastReport,
    /// Whether the "no new tinkers" notice went out.
    pub notice_sent: bool,
}

pub struct ScanOrchestrator {
    intelligence: Arc<dyn IntelligenceClient>,
    catalog: Arc<dyn CatalogStore>,
    directory: Arc<dyn RecipientDirectory>,
    notifier: Notifier,
    variant: ScanVariant,
    upstream_timeout: Duration,
    in_flight: Mutex<()>,
}

impl ScanOrchestrator {
    pub fn new(
        intelligence: Arc<dyn IntelligenceClient>,
        catalog: Arc<dyn CatalogStore>,
        directory: Arc<dyn RecipientDirectory>,
        notifier: Notifier,
    ) -> Self {
        Self {
            intelligence,
            catalog,
            directory,
            notifier,
            variant: ScanVariant::default(),
            upstream_timeout: Duration::from_secs(60),
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_variant(mut self, variant: ScanVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn variant(&self) -> ScanVariant {
        self.variant
    }

    /// Run one cycle.
    ///
    /// Returns `AlreadyRunning` without doing anything if another cycle holds
    /// the lock; overlapping triggers are dropped, not queued.
    pub async fn run_cycle(&self) -> Result<ScanReport, ScanError> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| ScanError::AlreadyRunning)?;

        let started = Instant::now();
        info!(variant = self.variant.as_str(), "tinker scan started");

        let raw = self.fetch().await?;

        let batch = parse_batch(&raw).map_err(|e| {
            error!(reason = %e.reason, raw = %e.raw, "failed to parse intelligence reply; aborting cycle");
            e
        })?;
        if batch.is_empty() {
            info!("intelligence source reported no tinkers");
        } else {
            info!(count = batch.len(), "intelligence source returned candidate tinkers");
        }

        let recipients = self.directory.list().await.map_err(|e| {
            error!(error = %e, "failed to load recipients; aborting cycle");
            e
        })?;

        let mut report = ScanReport {
            fetched: batch.len(),
            recipients: recipients.len(),
            ..Default::default()
        };
        let now = Utc::now();
        let include_ca = self.variant.includes_contract_address();

        for record in &batch {
            let Some(name) = record.name() else {
                warn!(record = %record.as_json(), "skipping record without a usable name");
                report.rejected += 1;
                continue;
            };

            // Dedupe gate.
            let existing = self
                .catalog
                .find_by_name(name)
                .await
                .map_err(|e| abort_on_catalog("find_by_name", e))?;
            if existing.is_some() {
                debug!(tinker = name, "tinker already recorded");
                report.duplicates += 1;
                continue;
            }

            let tinker = match record.normalize(now) {
                Ok(t) => t,
                Err(e) => {
                    warn!(tinker = name, error = %e, "skipping record that failed normalisation");
                    report.rejected += 1;
                    continue;
                }
            };

            match self.catalog.insert(&tinker).await {
                Ok(()) => {}
                Err(CatalogError::Conflict(name)) => {
                    info!(tinker = %name, "tinker recorded concurrently; skipping");
                    report.duplicates += 1;
                    continue;
                }
                Err(e) => return Err(abort_on_catalog("insert", e)),
            }

            report.new_items += 1;
            info!(tinker = %tinker.name, hype = %tinker.hype_level, risk = %tinker.risk_level, "new tinker recorded");

            let text = format_tinker_message(&tinker, include_ca);
            report
                .deliveries
                .merge(self.notifier.broadcast(&recipients, &text).await);
        }

        if report.new_items == 0 {
            report
                .deliveries
                .merge(self.notifier.broadcast(&recipients, NO_NEW_TINKERS_NOTICE).await);
            report.notice_sent = true;
        }

        info!(
            fetched = report.fetched,
            new_items = report.new_items,
            duplicates = report.duplicates,
            rejected = report.rejected,
            delivered = report.deliveries.delivered,
            failed_deliveries = report.deliveries.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tinker scan finished"
        );

        Ok(report)
    }

    async fn fetch(&self) -> Result<String, ScanError> {
        let call = self.intelligence.query(self.variant.payload());
        let result = match tokio::time::timeout(self.upstream_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(self.upstream_timeout)),
        };

        result.map_err(|e| {
            error!(error = %e, status = ?e.status_code(), "intelligence call failed; aborting cycle");
            ScanError::Upstream(e)
        })
    }
}

fn abort_on_catalog(operation: &str, err: CatalogError) -> ScanError {
    error!(operation, error = %err, "catalog failure; aborting remaining records");
    ScanError::Catalog(err)
}
