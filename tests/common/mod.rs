//! Common test utilities and fixtures

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gmail_expiry::client::{GmailClient, LabelInfo, ThreadPage, INBOX_LABEL_ID};
use gmail_expiry::error::{GmailError, Result};
use gmail_expiry::models::{MessageMeta, ThreadDetail};
use mockall::mock;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Gmail's reserved system label for starred threads
pub const STARRED_LABEL_ID: &str = "STARRED";

#[derive(Debug, Clone, Default)]
struct FakeThread {
    label_ids: HashSet<String>,
    message_dates: Vec<DateTime<Utc>>,
}

#[derive(Default)]
struct FakeState {
    // Insertion order preserved; duplicate names allowed, mirroring the
    // remote store's behavior under a creation race
    labels: Vec<LabelInfo>,
    threads: BTreeMap<String, FakeThread>,
}

/// Deterministic in-memory stand-in for the Gmail store
///
/// Implements the client trait over plain maps, including pagination and a
/// small evaluator for the query terms the passes actually emit
/// (`in:inbox`, `is:starred`, `label:`, and their negations). System labels
/// (INBOX, STARRED) exist only as ids on threads, like the real store.
#[derive(Default)]
pub struct FakeGmailClient {
    state: Mutex<FakeState>,
    next_label_id: AtomicUsize,
}

impl FakeGmailClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_label_id(&self) -> String {
        let n = self.next_label_id.fetch_add(1, Ordering::SeqCst);
        format!("Label_{}", n)
    }

    /// Create a label directly, bypassing the trait (for seeding fixtures)
    pub fn seed_label(&self, name: &str) -> String {
        let id = self.fresh_label_id();
        let mut state = self.state.lock().unwrap();
        state.labels.push(LabelInfo {
            id: id.clone(),
            name: name.to_string(),
        });
        id
    }

    /// Create a thread holding the given label ids and message timestamps
    pub fn seed_thread(&self, id: &str, label_ids: &[&str], message_dates: &[DateTime<Utc>]) {
        let mut state = self.state.lock().unwrap();
        state.threads.insert(
            id.to_string(),
            FakeThread {
                label_ids: label_ids.iter().map(|s| s.to_string()).collect(),
                message_dates: message_dates.to_vec(),
            },
        );
    }

    /// All label names currently in the account
    pub fn label_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.labels.iter().map(|l| l.name.clone()).collect()
    }

    /// First label id registered under the given name
    pub fn label_id(&self, name: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.id.clone())
    }

    /// Label ids attached to a thread
    pub fn thread_label_ids(&self, thread_id: &str) -> HashSet<String> {
        let state = self.state.lock().unwrap();
        state.threads[thread_id].label_ids.clone()
    }

    /// Label names attached to a thread (system ids map to themselves)
    pub fn thread_label_names(&self, thread_id: &str) -> HashSet<String> {
        let state = self.state.lock().unwrap();
        state.threads[thread_id]
            .label_ids
            .iter()
            .map(|id| {
                state
                    .labels
                    .iter()
                    .find(|l| &l.id == id)
                    .map(|l| l.name.clone())
                    .unwrap_or_else(|| id.clone())
            })
            .collect()
    }

    /// Ids of every thread carrying the named label
    pub fn threads_with_label_name(&self, name: &str) -> BTreeSet<String> {
        let state = self.state.lock().unwrap();
        let Some(label_id) = state.labels.iter().find(|l| l.name == name).map(|l| &l.id) else {
            return BTreeSet::new();
        };
        state
            .threads
            .iter()
            .filter(|(_, t)| t.label_ids.contains(label_id))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn in_inbox(&self, thread_id: &str) -> bool {
        self.thread_label_ids(thread_id).contains(INBOX_LABEL_ID)
    }

    fn thread_matches(state: &FakeState, thread: &FakeThread, query: &str) -> bool {
        for raw_term in query.split_whitespace() {
            let (negated, term) = match raw_term.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, raw_term),
            };

            let present = match term {
                "in:inbox" => thread.label_ids.contains(INBOX_LABEL_ID),
                "is:starred" => thread.label_ids.contains(STARRED_LABEL_ID),
                _ => {
                    if let Some(name) = term.strip_prefix("label:") {
                        match state.labels.iter().find(|l| l.name == name) {
                            Some(label) => thread.label_ids.contains(&label.id),
                            // Unknown labels match nothing, like the real store
                            None => false,
                        }
                    } else {
                        panic!("FakeGmailClient cannot evaluate query term '{}'", raw_term);
                    }
                }
            };

            if present == negated {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl GmailClient for FakeGmailClient {
    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        let state = self.state.lock().unwrap();
        Ok(state.labels.clone())
    }

    async fn create_label(&self, name: &str) -> Result<String> {
        Ok(self.seed_label(name))
    }

    async fn delete_label(&self, label_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.labels.retain(|l| l.id != label_id);
        // Deleting a label removes it from every thread, like the real store
        for thread in state.threads.values_mut() {
            thread.label_ids.remove(label_id);
        }
        Ok(())
    }

    async fn list_threads_page(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<String>,
    ) -> Result<ThreadPage> {
        let state = self.state.lock().unwrap();

        let matching: Vec<String> = state
            .threads
            .iter()
            .filter(|(_, t)| Self::thread_matches(&state, t, query))
            .map(|(id, _)| id.clone())
            .collect();

        let start: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = std::cmp::min(start + page_size as usize, matching.len());
        let next_page_token = if end < matching.len() {
            Some(end.to_string())
        } else {
            None
        };

        Ok(ThreadPage {
            thread_ids: matching[start..end].to_vec(),
            next_page_token,
        })
    }

    async fn get_thread(&self, thread_id: &str) -> Result<ThreadDetail> {
        let state = self.state.lock().unwrap();
        let thread = state
            .threads
            .get(thread_id)
            .ok_or_else(|| GmailError::ThreadNotFound(thread_id.to_string()))?;

        let label_ids: Vec<String> = thread.label_ids.iter().cloned().collect();
        let messages = thread
            .message_dates
            .iter()
            .enumerate()
            .map(|(i, date)| MessageMeta {
                id: format!("{}-m{}", thread_id, i),
                internal_date: Some(*date),
                label_ids: label_ids.clone(),
            })
            .collect();

        Ok(ThreadDetail {
            id: thread_id.to_string(),
            messages,
        })
    }

    async fn modify_thread(
        &self,
        thread_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let thread = state
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| GmailError::ThreadNotFound(thread_id.to_string()))?;

        for id in remove_label_ids {
            thread.label_ids.remove(id);
        }
        for id in add_label_ids {
            thread.label_ids.insert(id.clone());
        }
        Ok(())
    }
}

// Mock implementation of GmailClient for failure-injection tests
mock! {
    pub Client {}

    #[async_trait]
    impl GmailClient for Client {
        async fn list_labels(&self) -> Result<Vec<LabelInfo>>;
        async fn create_label(&self, name: &str) -> Result<String>;
        async fn delete_label(&self, label_id: &str) -> Result<()>;
        async fn list_threads_page(
            &self,
            query: &str,
            page_size: u32,
            page_token: Option<String>,
        ) -> Result<ThreadPage>;
        async fn get_thread(&self, thread_id: &str) -> Result<ThreadDetail>;
        async fn modify_thread(
            &self,
            thread_id: &str,
            add_label_ids: &[String],
            remove_label_ids: &[String],
        ) -> Result<()>;
    }
}
