//! Age annotation for inbox threads
//!
//! Independent of the countdown machine: every inbox thread older than a
//! threshold gets one coarse age label computed from its most recent
//! message, and the whole age namespace is wiped and recomputed on each run.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::{fetch_all_threads, GmailClient, ProgressCallback};
use crate::config::Config;
use crate::error::Result;
use crate::labels::LabelRegistry;
use crate::query::Query;

/// Pattern matching every label in the age namespace: the configured prefix
/// followed by a day/month/year count plus unit ("21d", "3m", "2y")
pub fn age_label_pattern(prefix: &str) -> Regex {
    Regex::new(&format!(r"^{}\d+[dmy]$", regex::escape(prefix))).unwrap()
}

/// Whole-calendar-day difference between two instants
///
/// Both sides are normalized to their UTC date before subtracting, so two
/// timestamps on the same calendar day yield 0 regardless of time of day.
pub fn age_in_days(last_message: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now.date_naive() - last_message.date_naive()).num_days()
}

/// Coarse age bucket for a thread
///
/// Under 31 days the label is exact ("25d"); months divide by 31 and years
/// by 365, rounded half-away-from-zero ("3m", "2y"). With integral day
/// counts the divisors never produce an exact half, so the rounding mode
/// only matters as a documented convention.
pub fn age_bucket(age_days: i64) -> String {
    if age_days < 31 {
        format!("{}d", age_days)
    } else if age_days < 365 {
        format!("{}m", (age_days as f64 / 31.0).round() as i64)
    } else {
        format!("{}y", (age_days as f64 / 365.0).round() as i64)
    }
}

/// Result of an `annotate_ages` pass
#[derive(Debug, Default)]
pub struct AgeReport {
    pub labels_swept: usize,
    pub threads_scanned: usize,
    pub threads_labeled: usize,
}

/// Attaches coarse age labels to inbox threads
pub struct AgeAnnotator {
    client: Arc<dyn GmailClient>,
    registry: LabelRegistry,
    label_prefix: String,
    pattern: Regex,
    min_age_days: i64,
    page_size: u32,
}

impl AgeAnnotator {
    pub fn new(client: Arc<dyn GmailClient>, config: &Config) -> Self {
        let registry = LabelRegistry::new(Arc::clone(&client));
        let pattern = age_label_pattern(&config.age.label_prefix);

        Self {
            client,
            registry,
            label_prefix: config.age.label_prefix.clone(),
            pattern,
            min_age_days: config.age.min_age_days,
            page_size: config.scan.page_size,
        }
    }

    /// Delete every age label in the account
    ///
    /// Deleting the labels removes them from all threads in one step, which
    /// is the whole sweep: no per-thread label removal is needed, and empty
    /// leftover labels are pruned along the way.
    async fn sweep_stale_labels(&self) -> Result<usize> {
        let stale = self.registry.list_matching(&self.pattern).await?;

        for label in &stale {
            self.client.delete_label(&label.id).await?;
            debug!("Deleted stale age label '{}'", label.name);
        }

        info!("Swept {} stale age labels", stale.len());
        Ok(stale.len())
    }

    /// Recompute age labels for every inbox thread
    pub async fn annotate(&self, progress: Option<ProgressCallback>) -> Result<AgeReport> {
        self.annotate_at(Utc::now(), progress).await
    }

    /// Recompute age labels against an explicit "now"
    pub async fn annotate_at(
        &self,
        now: DateTime<Utc>,
        progress: Option<ProgressCallback>,
    ) -> Result<AgeReport> {
        let mut report = AgeReport {
            labels_swept: self.sweep_stale_labels().await?,
            ..Default::default()
        };

        let query = Query::new().in_inbox();
        let thread_ids = fetch_all_threads(self.client.as_ref(), &query, self.page_size).await?;
        report.threads_scanned = thread_ids.len();

        for thread_id in &thread_ids {
            let detail = self.client.get_thread(thread_id).await?;

            // A thread without messages should not occur; skip rather than fail
            let Some(last_message_at) = detail.last_message_at() else {
                debug!("Thread {} has no messages; skipping", thread_id);
                if let Some(cb) = &progress {
                    cb();
                }
                continue;
            };

            let age = age_in_days(last_message_at, now);
            if age >= self.min_age_days {
                let name = format!("{}{}", self.label_prefix, age_bucket(age));
                let label_id = self.registry.ensure(&name).await?;
                self.client
                    .modify_thread(thread_id, &[label_id], &[])
                    .await?;
                debug!("Labeled thread {} as '{}'", thread_id, name);
                report.threads_labeled += 1;
            }

            if let Some(cb) = &progress {
                cb();
            }
        }

        info!(
            "Age annotation complete: {}/{} threads labeled",
            report.threads_labeled, report.threads_scanned
        );
        Ok(report)
    }
}
