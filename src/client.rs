//! Gmail API client with retry logic
//!
//! The [`GmailClient`] trait is the single seam between the expiration passes
//! and the remote mail store; the passes only ever see labels, thread ids,
//! and thread metadata. [`ProductionGmailClient`] backs the trait with the
//! real Gmail API, and tests substitute a deterministic in-memory fake.

use async_trait::async_trait;
use chrono::DateTime;
use google_gmail1::{
    api::{Label, ModifyThreadRequest, Thread},
    hyper_rustls, hyper_util, Gmail,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{GmailError, Result};
use crate::models::{MessageMeta, ThreadDetail};
use crate::query::Query;

/// Gmail's reserved system label for inbox membership
pub const INBOX_LABEL_ID: &str = "INBOX";

/// Progress callback type for per-thread mutation loops
pub type ProgressCallback = Arc<dyn Fn() + Send + Sync>;

/// Label info returned from Gmail API
#[derive(Debug, Clone)]
pub struct LabelInfo {
    pub id: String,
    pub name: String,
}

/// One page of a thread search
#[derive(Debug, Clone)]
pub struct ThreadPage {
    pub thread_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

/// Trait defining the Gmail operations the passes depend on
///
/// Deliberately narrow: list/create/delete for labels, paged search plus
/// metadata fetch for threads, and a single add/remove label mutation.
#[async_trait]
pub trait GmailClient: Send + Sync {
    /// List all labels in the account
    async fn list_labels(&self) -> Result<Vec<LabelInfo>>;

    /// Create a new label, returning its id
    async fn create_label(&self, name: &str) -> Result<String>;

    /// Delete a label by id
    async fn delete_label(&self, label_id: &str) -> Result<()>;

    /// Fetch one page of thread ids matching a search query
    async fn list_threads_page(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<String>,
    ) -> Result<ThreadPage>;

    /// Get full thread metadata, including per-message timestamps
    async fn get_thread(&self, thread_id: &str) -> Result<ThreadDetail>;

    /// Add and/or remove labels on a thread in a single call
    async fn modify_thread(
        &self,
        thread_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()>;
}

/// Fetch the complete result set for a query, following pagination
///
/// Pages are requested until the store reports no continuation token; the
/// union is returned in arrival order. Any transport error aborts the whole
/// fetch - there is no partial-result recovery.
pub async fn fetch_all_threads(
    client: &dyn GmailClient,
    query: &Query,
    page_size: u32,
) -> Result<Vec<String>> {
    let query = query.to_string();
    let mut all_ids = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = client
            .list_threads_page(&query, page_size, page_token.take())
            .await?;

        all_ids.extend(page.thread_ids);

        page_token = page.next_page_token;
        if page_token.is_none() {
            break;
        }
    }

    debug!("Query '{}' matched {} threads", query, all_ids.len());
    Ok(all_ids)
}

/// Production Gmail client with exponential-backoff retry for transient errors
pub struct ProductionGmailClient {
    hub: Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>,
}

impl ProductionGmailClient {
    pub fn new(
        hub: Gmail<
            hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
        >,
    ) -> Self {
        Self { hub }
    }

    /// Execute an async operation with exponential backoff retry
    async fn with_retry<T, F, Fut>(
        operation_name: &str,
        max_retries: u32,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut delay = Duration::from_secs(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() && attempts <= max_retries => {
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        operation_name,
                        attempts,
                        max_retries + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, Duration::from_secs(30));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Parse a Gmail API Thread into our ThreadDetail structure
fn parse_thread_detail(thread: Thread) -> Result<ThreadDetail> {
    let id = thread
        .id
        .ok_or_else(|| GmailError::ApiError("Thread response missing id".to_string()))?;

    let messages = thread
        .messages
        .unwrap_or_default()
        .into_iter()
        .map(|msg| MessageMeta {
            id: msg.id.unwrap_or_default(),
            internal_date: msg.internal_date.and_then(DateTime::from_timestamp_millis),
            label_ids: msg.label_ids.unwrap_or_default(),
        })
        .collect();

    Ok(ThreadDetail { id, messages })
}

#[async_trait]
impl GmailClient for ProductionGmailClient {
    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        Self::with_retry("list_labels", 3, || async {
            // Wrap API call in timeout to prevent indefinite hangs
            let timeout_duration = Duration::from_secs(30);
            let api_call = self
                .hub
                .users()
                .labels_list("me")
                .add_scope("https://www.googleapis.com/auth/gmail.labels")
                .doit();

            let (_, response) = match tokio::time::timeout(timeout_duration, api_call).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!("Gmail API list_labels call timed out after {:?}", timeout_duration);
                    return Err(GmailError::NetworkError(format!(
                        "API call timed out after {:?}",
                        timeout_duration
                    )));
                }
            };

            let labels: Vec<LabelInfo> = response
                .labels
                .unwrap_or_default()
                .into_iter()
                .filter_map(|label| match (label.id, label.name) {
                    (Some(id), Some(name)) => Some(LabelInfo { id, name }),
                    _ => None,
                })
                .collect();

            debug!("Listed {} labels", labels.len());
            Ok(labels)
        })
        .await
    }

    async fn create_label(&self, name: &str) -> Result<String> {
        let name = name.to_string();
        Self::with_retry("create_label", 3, || async {
            let label = Label {
                name: Some(name.clone()),
                message_list_visibility: Some("show".to_string()),
                label_list_visibility: Some("labelShow".to_string()),
                ..Default::default()
            };

            let (_, created_label) = self
                .hub
                .users()
                .labels_create(label, "me")
                .add_scope("https://www.googleapis.com/auth/gmail.labels")
                .doit()
                .await?;

            created_label
                .id
                .ok_or_else(|| GmailError::LabelError("Created label has no ID".to_string()))
        })
        .await
    }

    async fn delete_label(&self, label_id: &str) -> Result<()> {
        self.hub
            .users()
            .labels_delete("me", label_id)
            .add_scope("https://www.googleapis.com/auth/gmail.labels")
            .doit()
            .await?;

        Ok(())
    }

    async fn list_threads_page(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<String>,
    ) -> Result<ThreadPage> {
        let mut call = self
            .hub
            .users()
            .threads_list("me")
            .q(query)
            .max_results(page_size);

        if let Some(token) = page_token.as_deref() {
            call = call.page_token(token);
        }

        let (_, response) = call
            .add_scope("https://www.googleapis.com/auth/gmail.modify")
            .doit()
            .await?;

        let thread_ids = response
            .threads
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| t.id)
            .collect();

        Ok(ThreadPage {
            thread_ids,
            next_page_token: response.next_page_token,
        })
    }

    async fn get_thread(&self, thread_id: &str) -> Result<ThreadDetail> {
        let thread_id = thread_id.to_string();
        Self::with_retry("get_thread", 3, || async {
            // Minimal format still carries labelIds and internalDate, which is
            // all the age computation needs
            let (_, thread) = self
                .hub
                .users()
                .threads_get("me", &thread_id)
                .format("minimal")
                .add_scope("https://www.googleapis.com/auth/gmail.modify")
                .doit()
                .await?;

            parse_thread_detail(thread)
        })
        .await
    }

    async fn modify_thread(
        &self,
        thread_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()> {
        let request = ModifyThreadRequest {
            add_label_ids: if add_label_ids.is_empty() {
                None
            } else {
                Some(add_label_ids.to_vec())
            },
            remove_label_ids: if remove_label_ids.is_empty() {
                None
            } else {
                Some(remove_label_ids.to_vec())
            },
        };

        self.hub
            .users()
            .threads_modify(request, "me", thread_id)
            .add_scope("https://www.googleapis.com/auth/gmail.modify")
            .doit()
            .await?;

        Ok(())
    }
}
