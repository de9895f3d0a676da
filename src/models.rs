use chrono::{DateTime, Utc};

/// Per-message metadata extracted from a thread fetch
///
/// Only the fields the expiration passes look at: the message's Gmail id,
/// its `internalDate` (the timestamp Gmail assigned on receipt), and the
/// label ids attached to it.
#[derive(Debug, Clone)]
pub struct MessageMeta {
    pub id: String,
    pub internal_date: Option<DateTime<Utc>>,
    pub label_ids: Vec<String>,
}

/// Full metadata for a thread, as returned by `users.threads.get`
///
/// Messages are kept in the order Gmail returns them (oldest first), so the
/// last entry is the most recent message.
#[derive(Debug, Clone)]
pub struct ThreadDetail {
    pub id: String,
    pub messages: Vec<MessageMeta>,
}

impl ThreadDetail {
    /// Timestamp of the most recent message, if the thread has any messages
    /// with a usable `internalDate`
    pub fn last_message_at(&self) -> Option<DateTime<Utc>> {
        self.messages.last().and_then(|m| m.internal_date)
    }
}
