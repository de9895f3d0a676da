//! Label name resolution and creation
//!
//! Maps logical label names to Gmail label ids. Nothing is cached: every
//! resolution lists the account's labels fresh, so the registry always
//! reflects the remote store at the moment of the call.

use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::{GmailClient, LabelInfo};
use crate::error::Result;

/// Resolves label names to Gmail label ids, creating labels on demand
pub struct LabelRegistry {
    client: Arc<dyn GmailClient>,
}

impl LabelRegistry {
    pub fn new(client: Arc<dyn GmailClient>) -> Self {
        Self { client }
    }

    /// Look up a label id by exact name
    ///
    /// If the remote store holds several labels with the same name (possible
    /// when two processes raced on creation), the first match wins and the
    /// duplicates are logged.
    pub async fn resolve(&self, name: &str) -> Result<Option<String>> {
        let labels = self.client.list_labels().await?;

        let mut matches = labels.iter().filter(|l| l.name == name);
        let first = matches.next().map(|l| l.id.clone());

        let duplicates = matches.count();
        if duplicates > 0 {
            warn!(
                "Label '{}' exists {} times remotely; using the first match",
                name,
                duplicates + 1
            );
        }

        Ok(first)
    }

    /// Resolve a label id by name, creating the label if it is missing
    ///
    /// Check-then-create: not atomic against concurrent external creation.
    /// If another process creates the same name between the lookup and the
    /// create call, the account ends up with two labels of that name; later
    /// resolutions pick the first.
    pub async fn ensure(&self, name: &str) -> Result<String> {
        if let Some(id) = self.resolve(name).await? {
            debug!("Label '{}' already exists with id {}", name, id);
            return Ok(id);
        }

        let id = self.client.create_label(name).await?;
        info!("Created label '{}' with id {}", name, id);
        Ok(id)
    }

    /// List all labels whose name matches the pattern
    ///
    /// Read-only; cost is linear in the account's total label count.
    pub async fn list_matching(&self, pattern: &Regex) -> Result<Vec<LabelInfo>> {
        let labels = self.client.list_labels().await?;

        Ok(labels
            .into_iter()
            .filter(|l| pattern.is_match(&l.name))
            .collect())
    }
}
