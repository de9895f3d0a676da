//! Command-line interface

use clap::{Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::age::{AgeAnnotator, AgeReport};
use crate::auth;
use crate::client::{GmailClient, ProductionGmailClient, ProgressCallback};
use crate::config::Config;
use crate::countdown::{AssignReport, Countdown, SetupReport, StepReport, StripReport};
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "gmail-expiry")]
#[command(version = "0.3.1")]
#[command(about = "Label-driven inbox expiration for Gmail", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to OAuth2 credentials file
    #[arg(long, default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Path to token cache file
    #[arg(long, default_value = ".gmail-expiry/token.json")]
    pub token_cache: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate with Gmail API
    Auth {
        /// Force re-authentication even if token exists
        #[arg(long)]
        force: bool,
    },

    /// Create the countdown bucket labels and the archived label
    Setup,

    /// Admit unlabeled inbox threads into the freshest bucket
    AssignNew,

    /// Advance every bucket one step; archive threads leaving bucket 0
    Step,

    /// Remove stray bucket labels from threads archived by hand
    StripOnArchived,

    /// Recompute age labels for all inbox threads
    AnnotateAges,

    /// Generate example configuration file
    InitConfig {
        /// Path to create config file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

/// Progress reporter using indicatif
pub struct ProgressReporter {
    multi: MultiProgress,
    spinner_style: ProgressStyle,
    counter_style: ProgressStyle,
}

impl ProgressReporter {
    pub fn new() -> Self {
        // {elapsed} renders human-readable (e.g. "1s", "234ms")
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed:>6}] {msg}")
            .unwrap()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");

        let counter_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed:>6}] {pos:>6} {msg}")
            .unwrap()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");

        Self {
            multi: MultiProgress::new(),
            spinner_style,
            counter_style,
        }
    }

    pub fn add_spinner(&self, msg: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(self.spinner_style.clone());
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Spinner that also shows how many items have been processed so far
    ///
    /// Used for the mutation loops, whose totals are not known until the
    /// query gateway has materialized the thread list.
    pub fn add_counter(&self, msg: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(self.counter_style.clone());
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Finish a spinner and clear it from the multi-progress display
    pub fn finish_spinner(&self, pb: &ProgressBar, msg: &str) {
        pb.finish_and_clear();
        println!("  ✓ {}", msg);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-thread tick callback driving a progress bar
fn progress_callback(pb: &ProgressBar) -> ProgressCallback {
    let pb = pb.clone();
    Arc::new(move || pb.inc(1))
}

/// Load configuration and authenticate, with progress feedback
async fn init(cli: &Cli) -> Result<(Config, Arc<dyn GmailClient>, ProgressReporter)> {
    let reporter = ProgressReporter::new();

    let config_spinner = reporter.add_spinner("Loading configuration...");
    let config = Config::load(&cli.config).await?;
    reporter.finish_spinner(
        &config_spinner,
        &format!("Configuration loaded (window: {} days)", config.window.days),
    );

    let auth_spinner = reporter.add_spinner("Authenticating with Gmail API...");
    let hub = auth::initialize_gmail_hub(&cli.credentials, &cli.token_cache).await?;
    reporter.finish_spinner(&auth_spinner, "Gmail API authenticated");

    let client: Arc<dyn GmailClient> = Arc::new(ProductionGmailClient::new(hub));
    Ok((config, client, reporter))
}

pub async fn run_setup(cli: &Cli) -> Result<SetupReport> {
    let (config, client, reporter) = init(cli).await?;
    let countdown = Countdown::new(client, &config);

    let spinner = reporter.add_spinner("Creating countdown labels...");
    let report = countdown.setup().await?;
    reporter.finish_spinner(
        &spinner,
        &format!(
            "Labels ready ({} created, {} existing)",
            report.created, report.existing
        ),
    );

    Ok(report)
}

pub async fn run_assign_new(cli: &Cli) -> Result<AssignReport> {
    let (config, client, reporter) = init(cli).await?;
    let countdown = Countdown::new(client, &config);

    let pb = reporter.add_counter("Admitting inbox threads...");
    let report = countdown.assign_new(Some(progress_callback(&pb))).await?;
    reporter.finish_spinner(&pb, &format!("Admitted {} threads", report.admitted));

    Ok(report)
}

pub async fn run_step(cli: &Cli) -> Result<StepReport> {
    let (config, client, reporter) = init(cli).await?;
    let countdown = Countdown::new(client, &config);

    let pb = reporter.add_counter("Advancing buckets...");
    let report = countdown.step(Some(progress_callback(&pb))).await?;
    reporter.finish_spinner(
        &pb,
        &format!(
            "Advanced {} threads, archived {}",
            report.advanced, report.archived
        ),
    );

    Ok(report)
}

pub async fn run_strip_on_archived(cli: &Cli) -> Result<StripReport> {
    let (config, client, reporter) = init(cli).await?;
    let countdown = Countdown::new(client, &config);

    let pb = reporter.add_counter("Stripping stray bucket labels...");
    let report = countdown
        .strip_on_archived(Some(progress_callback(&pb)))
        .await?;
    reporter.finish_spinner(&pb, &format!("Stripped {} threads", report.stripped));

    Ok(report)
}

pub async fn run_annotate_ages(cli: &Cli) -> Result<AgeReport> {
    let (config, client, reporter) = init(cli).await?;
    let annotator = AgeAnnotator::new(client, &config);

    let pb = reporter.add_counter("Annotating thread ages...");
    let report = annotator.annotate(Some(progress_callback(&pb))).await?;
    reporter.finish_spinner(
        &pb,
        &format!(
            "Labeled {} of {} threads ({} stale labels swept)",
            report.threads_labeled, report.threads_scanned, report.labels_swept
        ),
    );

    Ok(report)
}
