use anyhow::Result;
use clap::Parser;
use gmail_expiry::cli::{self, Cli, Commands};
use gmail_expiry::config::Config;
use gmail_expiry::error::GmailError;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        eprintln!("\nFor help, run: gmail-expiry --help");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Install default crypto provider for rustls
    // This is necessary because multiple dependencies use different crypto providers
    // On non-Windows platforms, use aws-lc-rs (better performance, FIPS support)
    // On Windows, use ring (better compatibility, no NASM/CMake required)
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_expiry=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_expiry=info,warn,error"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match &cli.command {
        Commands::Auth { force } => {
            tracing::info!("Authenticating with Gmail API...");

            if let Some(parent) = cli.token_cache.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            if *force && cli.token_cache.exists() {
                tokio::fs::remove_file(&cli.token_cache).await?;
                tracing::info!("Removed existing token cache");
            }

            // Initialize Gmail hub (will trigger OAuth flow if needed)
            let hub =
                gmail_expiry::auth::initialize_gmail_hub(&cli.credentials, &cli.token_cache)
                    .await?;

            gmail_expiry::auth::secure_token_file(&cli.token_cache).await?;

            println!("Successfully authenticated with Gmail API");
            println!("Token cached at: {:?}", cli.token_cache);

            // Test the connection - must specify scope to avoid triggering
            // an additional OAuth flow
            let (_, profile) = hub
                .users()
                .get_profile("me")
                .add_scope("https://www.googleapis.com/auth/gmail.modify")
                .doit()
                .await
                .map_err(GmailError::from)?;
            println!(
                "Connected to account: {}",
                profile.email_address.unwrap_or_default()
            );

            Ok(())
        }

        Commands::Setup => {
            let report = cli::run_setup(&cli).await?;

            println!("\n========================================");
            println!("Setup Summary");
            println!("========================================");
            println!("Labels created:  {}", report.created);
            println!("Labels existing: {}", report.existing);
            println!("========================================");

            Ok(())
        }

        Commands::AssignNew => {
            let report = cli::run_assign_new(&cli).await?;

            println!("\n========================================");
            println!("Admission Summary");
            println!("========================================");
            println!("Threads admitted: {}", report.admitted);
            println!("========================================");

            Ok(())
        }

        Commands::Step => {
            let report = cli::run_step(&cli).await?;

            println!("\n========================================");
            println!("Step Summary");
            println!("========================================");
            println!("Threads advanced: {}", report.advanced);
            println!("Threads archived: {}", report.archived);
            println!("========================================");

            Ok(())
        }

        Commands::StripOnArchived => {
            let report = cli::run_strip_on_archived(&cli).await?;

            println!("\n========================================");
            println!("Strip Summary");
            println!("========================================");
            println!("Stray labels removed: {}", report.stripped);
            println!("========================================");

            Ok(())
        }

        Commands::AnnotateAges => {
            let report = cli::run_annotate_ages(&cli).await?;

            println!("\n========================================");
            println!("Age Annotation Summary");
            println!("========================================");
            println!("Stale labels swept: {}", report.labels_swept);
            println!("Threads scanned:    {}", report.threads_scanned);
            println!("Threads labeled:    {}", report.threads_labeled);
            println!("========================================");

            Ok(())
        }

        Commands::InitConfig { output, force } => {
            tracing::info!("Generating example configuration file");

            if output.exists() && !*force {
                return Err(GmailError::ConfigError(format!(
                    "Configuration file already exists at {:?}. Use --force to overwrite.",
                    output
                ))
                .into());
            }

            Config::create_example(output).await?;

            println!("Created example configuration file at: {:?}", output);
            println!("\nPlease edit this file to customize your settings.");
            println!("Key settings to review:");
            println!("  - window.days: inbox retention window in days");
            println!("  - age.min_age_days: minimum age before a thread gets an age label");
            println!("  - age.label_prefix: namespace prefix for age labels");

            Ok(())
        }
    }
}
