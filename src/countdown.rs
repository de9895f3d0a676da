//! Countdown state machine over bucket labels
//!
//! Every managed inbox thread carries exactly one "days remaining" bucket
//! label, `x7` down to `x0` with the default window. A daily `step` pass
//! moves each thread one bucket down; threads leaving `x0` are archived and
//! tagged with a terminal label. The machine operates purely on label
//! membership - it never fetches message content or timestamps.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::{fetch_all_threads, GmailClient, ProgressCallback, INBOX_LABEL_ID};
use crate::config::Config;
use crate::error::{GmailError, Result};
use crate::labels::LabelRegistry;
use crate::query::Query;

/// Where a thread stands in the countdown
///
/// Computed once per thread per pass from bucket-label membership, so the
/// pass logic (and its conservation tests) work on an explicit state value
/// rather than on label-set diffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketState {
    /// Holding bucket label `i`: that many daily steps remain before archival
    Admitted(u32),
    /// Aged out of the inbox; carries the terminal archived label
    Archived,
    /// Not participating in the countdown (starred, or never admitted)
    Unmanaged,
}

impl BucketState {
    /// The state after one daily step
    pub fn advanced(self) -> BucketState {
        match self {
            BucketState::Admitted(0) => BucketState::Archived,
            BucketState::Admitted(i) => BucketState::Admitted(i - 1),
            other => other,
        }
    }
}

/// Resolved label ids for every bucket plus the terminal archived label
///
/// Built once per pass from a fresh label listing; a missing label means
/// `setup` has not run and is reported as an error rather than papered over.
pub struct BucketLabels {
    buckets: BTreeMap<u32, String>,
    archived: String,
}

impl BucketLabels {
    /// The label id a given state corresponds to, if any
    pub fn id_of(&self, state: BucketState) -> Option<&str> {
        match state {
            BucketState::Admitted(i) => self.buckets.get(&i).map(String::as_str),
            BucketState::Archived => Some(&self.archived),
            BucketState::Unmanaged => None,
        }
    }
}

/// Result of a `setup` pass
#[derive(Debug, Default)]
pub struct SetupReport {
    pub created: usize,
    pub existing: usize,
}

/// Result of an `assign_new` pass
#[derive(Debug, Default)]
pub struct AssignReport {
    pub admitted: usize,
}

/// Result of a `step` pass
#[derive(Debug, Default)]
pub struct StepReport {
    pub advanced: usize,
    pub archived: usize,
}

/// Result of a `strip_on_archived` pass
#[derive(Debug, Default)]
pub struct StripReport {
    pub stripped: usize,
}

/// The countdown state machine's passes
///
/// Each method is one operator-invoked pass over a thread list materialized
/// up front. A transport failure aborts the pass mid-loop; every pass is
/// safe to re-run afterwards. Running `step` more than once per day
/// double-advances threads - scheduling is the caller's responsibility.
pub struct Countdown {
    client: Arc<dyn GmailClient>,
    registry: LabelRegistry,
    window_days: u32,
    bucket_prefix: String,
    archived_label: String,
    page_size: u32,
}

impl Countdown {
    pub fn new(client: Arc<dyn GmailClient>, config: &Config) -> Self {
        let registry = LabelRegistry::new(Arc::clone(&client));
        Self {
            client,
            registry,
            window_days: config.window.days,
            bucket_prefix: config.window.bucket_prefix.clone(),
            archived_label: config.window.archived_label.clone(),
            page_size: config.scan.page_size,
        }
    }

    /// Name of the bucket label for a given index
    pub fn bucket_label(&self, index: u32) -> String {
        format!("{}{}", self.bucket_prefix, index)
    }

    /// Idempotently create every bucket label and the archived label
    pub async fn setup(&self) -> Result<SetupReport> {
        let mut report = SetupReport::default();

        let mut names: Vec<String> = (0..=self.window_days)
            .map(|i| self.bucket_label(i))
            .collect();
        names.push(self.archived_label.clone());

        for name in names {
            match self.registry.resolve(&name).await? {
                Some(_) => report.existing += 1,
                None => {
                    self.registry.ensure(&name).await?;
                    report.created += 1;
                }
            }
        }

        info!(
            "Setup complete: {} labels created, {} already existed",
            report.created, report.existing
        );
        Ok(report)
    }

    /// Resolve every bucket label id in one listing
    async fn bucket_labels(&self) -> Result<BucketLabels> {
        let all = self.client.list_labels().await?;
        let find = |name: &str| {
            all.iter()
                .find(|l| l.name == name)
                .map(|l| l.id.clone())
                .ok_or_else(|| {
                    GmailError::LabelError(format!(
                        "Label '{}' not found; run `gmail-expiry setup` first",
                        name
                    ))
                })
        };

        let mut buckets = BTreeMap::new();
        for i in 0..=self.window_days {
            buckets.insert(i, find(&self.bucket_label(i))?);
        }
        let archived = find(&self.archived_label)?;

        Ok(BucketLabels { buckets, archived })
    }

    /// Admit every unmanaged, unstarred inbox thread into the freshest bucket
    ///
    /// Idempotent: the query excludes every bucket label, so a second run
    /// matches nothing.
    pub async fn assign_new(&self, progress: Option<ProgressCallback>) -> Result<AssignReport> {
        let labels = self.bucket_labels().await?;
        let newest = labels
            .id_of(BucketState::Admitted(self.window_days))
            .map(str::to_string)
            .ok_or_else(|| GmailError::LabelError("Freshest bucket label missing".to_string()))?;

        let mut query = Query::new().in_inbox().not_starred();
        for i in 0..=self.window_days {
            query = query.without_label(&self.bucket_label(i));
        }

        let thread_ids = fetch_all_threads(self.client.as_ref(), &query, self.page_size).await?;
        info!("Admitting {} threads into the countdown", thread_ids.len());

        let add = vec![newest];
        for thread_id in &thread_ids {
            self.client.modify_thread(thread_id, &add, &[]).await?;
            debug!("Admitted thread {}", thread_id);
            if let Some(cb) = &progress {
                cb();
            }
        }

        Ok(AssignReport {
            admitted: thread_ids.len(),
        })
    }

    /// Advance every admitted thread one bucket; archive threads leaving bucket 0
    ///
    /// Membership of all buckets is materialized before any mutation, so the
    /// processing order across buckets cannot double-advance a thread.
    pub async fn step(&self, progress: Option<ProgressCallback>) -> Result<StepReport> {
        let labels = self.bucket_labels().await?;

        let mut membership: Vec<(String, BucketState)> = Vec::new();
        for i in (0..=self.window_days).rev() {
            let query = Query::new().with_label(&self.bucket_label(i));
            let thread_ids =
                fetch_all_threads(self.client.as_ref(), &query, self.page_size).await?;
            membership.extend(
                thread_ids
                    .into_iter()
                    .map(|id| (id, BucketState::Admitted(i))),
            );
        }

        info!("Stepping {} admitted threads", membership.len());

        let mut report = StepReport::default();
        for (thread_id, state) in membership {
            let from = labels
                .id_of(state)
                .map(str::to_string)
                .ok_or_else(|| GmailError::LabelError("Bucket label vanished mid-pass".to_string()))?;

            match state.advanced() {
                BucketState::Archived => {
                    let add = vec![labels.archived.clone()];
                    let remove = vec![from, INBOX_LABEL_ID.to_string()];
                    self.client.modify_thread(&thread_id, &add, &remove).await?;
                    debug!("Archived thread {}", thread_id);
                    report.archived += 1;
                }
                BucketState::Admitted(next) => {
                    let to = labels
                        .id_of(BucketState::Admitted(next))
                        .map(str::to_string)
                        .ok_or_else(|| {
                            GmailError::LabelError("Bucket label vanished mid-pass".to_string())
                        })?;
                    self.client
                        .modify_thread(&thread_id, &[to], &[from])
                        .await?;
                    report.advanced += 1;
                }
                BucketState::Unmanaged => {}
            }

            if let Some(cb) = &progress {
                cb();
            }
        }

        Ok(report)
    }

    /// Remove stray bucket labels from threads no longer in the inbox
    ///
    /// Repairs the state left behind when the user archives a managed thread
    /// by hand, bypassing the bucket-0 exit.
    pub async fn strip_on_archived(
        &self,
        progress: Option<ProgressCallback>,
    ) -> Result<StripReport> {
        let labels = self.bucket_labels().await?;

        let mut report = StripReport::default();
        for i in 0..=self.window_days {
            let bucket_id = labels
                .id_of(BucketState::Admitted(i))
                .map(str::to_string)
                .ok_or_else(|| GmailError::LabelError("Bucket label vanished mid-pass".to_string()))?;

            let query = Query::new().not_in_inbox().with_label(&self.bucket_label(i));
            let thread_ids =
                fetch_all_threads(self.client.as_ref(), &query, self.page_size).await?;

            let remove = vec![bucket_id];
            for thread_id in &thread_ids {
                self.client.modify_thread(thread_id, &[], &remove).await?;
                debug!("Stripped {} from thread {}", self.bucket_label(i), thread_id);
                report.stripped += 1;
                if let Some(cb) = &progress {
                    cb();
                }
            }
        }

        Ok(report)
    }
}
