//! Gmail Inbox Expiration
//!
//! Automatically manages the lifetime of inbox threads through Gmail's label
//! mechanism: threads are admitted into "days remaining" bucket labels, a
//! daily pass counts each bucket down, and threads that reach zero are
//! archived. A separate annotator attaches coarse age labels ("25d", "3m",
//! "2y") computed from each thread's most recent message.
//!
//! # Overview
//!
//! - **Authentication**: OAuth2 authentication with token caching
//! - **Label Registry**: name-to-id resolution with create-on-demand
//! - **Countdown**: the bucket state machine (`setup`, `assign-new`, `step`,
//!   `strip-on-archived`)
//! - **Age Annotation**: sweep-and-recompute age labels (`annotate-ages`)
//!
//! Execution is strictly sequential: each pass materializes its thread list
//! up front, then mutates labels one thread at a time. Nothing is persisted
//! locally between runs except the cached OAuth token - the remote label
//! store is the only state.
//!
//! # Example Usage
//!
//! ```no_run
//! use gmail_expiry::{auth, client::ProductionGmailClient, config::Config, countdown::Countdown};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml".as_ref()).await?;
//!
//!     let hub = auth::initialize_gmail_hub(
//!         "credentials.json".as_ref(),
//!         ".gmail-expiry/token.json".as_ref(),
//!     )
//!     .await?;
//!
//!     let client = Arc::new(ProductionGmailClient::new(hub));
//!     let countdown = Countdown::new(client, &config);
//!     countdown.setup().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - OAuth2 authentication and Gmail API initialization
//! - [`client`] - Gmail API client trait, production implementation, pagination
//! - [`cli`] - Command-line interface and pass runners
//! - [`config`] - Configuration management
//! - [`countdown`] - The countdown state machine
//! - [`age`] - Age annotation
//! - [`error`] - Error types and result aliases
//! - [`labels`] - Label name resolution and creation
//! - [`models`] - Thread metadata structures
//! - [`query`] - Gmail search query composition

pub mod age;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod countdown;
pub mod error;
pub mod labels;
pub mod models;
pub mod query;

// Re-export commonly used types for convenience
pub use error::{GmailError, Result};

// Core data models
pub use models::{MessageMeta, ThreadDetail};

// Client types
pub use client::{fetch_all_threads, GmailClient, LabelInfo, ProductionGmailClient, ThreadPage};

// Pass types
pub use age::{age_bucket, age_in_days, AgeAnnotator, AgeReport};
pub use countdown::{BucketState, Countdown, SetupReport, StepReport};
pub use labels::LabelRegistry;
pub use query::Query;

// CLI types (for binary usage)
pub use cli::{Cli, Commands, ProgressReporter};
