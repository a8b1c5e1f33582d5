//! SiteGauge main entry point
//!
//! Command-line interface for the SiteGauge SEO analyzer.

use clap::Parser;
use sitegauge::ai::{GeminiClient, KeyStore, RotatingGenerator, TextGenerator};
use sitegauge::config::load_config;
use sitegauge::insights::InsightsClient;
use sitegauge::pipeline::Coordinator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// SiteGauge: an SEO site auditor with AI-assisted competitor research
///
/// SiteGauge fetches each site, scores it against a fixed SEO rubric,
/// optionally discovers competitors and generates outreach messages, and
/// writes a consolidated JSON report.
#[derive(Parser, Debug)]
#[command(name = "sitegauge")]
#[command(version = "0.1.0")]
#[command(about = "An SEO site auditor with AI-assisted competitor research", long_about = None)]
struct Cli {
    /// Sites to analyze (overrides the config file's site list)
    #[arg(value_name = "SITE")]
    sites: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Skip competitor discovery for this run
    #[arg(long)]
    no_competitors: bool,

    /// Skip outreach generation for this run
    #[arg(long)]
    no_outreach: bool,

    /// Query the performance-insights endpoint for every analyzed site
    #[arg(long)]
    performance: bool,

    /// Capture screenshots for every analyzed site
    #[arg(long)]
    screenshots: bool,

    /// Write the report to this path instead of the configured one
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Use credentials without the startup validation probe
    #[arg(long)]
    skip_key_validation: bool,

    /// Add an AI credential to the store and exit
    #[arg(long, value_name = "KEY", conflicts_with_all = ["remove_key", "list_keys"])]
    add_key: Option<String>,

    /// Remove an AI credential from the store and exit
    #[arg(long, value_name = "KEY", conflicts_with_all = ["add_key", "list_keys"])]
    remove_key: Option<String>,

    /// List stored AI credentials and exit
    #[arg(long, conflicts_with_all = ["add_key", "remove_key"])]
    list_keys: bool,

    /// Probe an AI credential with a single request and exit
    #[arg(long, value_name = "KEY", conflicts_with_all = ["add_key", "remove_key", "list_keys"])]
    test_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => sitegauge::Config::default(),
    };

    // CLI feature toggles override the config file
    if cli.no_competitors {
        config.features.competitors = false;
    }
    if cli.no_outreach {
        config.features.outreach = false;
    }
    if cli.performance {
        config.features.performance = true;
    }
    if cli.screenshots {
        config.features.screenshots = true;
    }
    if let Some(output) = &cli.output {
        config.output.report_path = output.display().to_string();
    }

    if cli.add_key.is_some() || cli.remove_key.is_some() || cli.test_key.is_some() || cli.list_keys
    {
        return handle_keys(&config, &cli).await;
    }

    let sites = if cli.sites.is_empty() {
        config.sites.clone()
    } else {
        cli.sites.clone()
    };
    if sites.is_empty() {
        eprintln!("No sites to analyze; pass them as arguments or list them in the config file");
        std::process::exit(1);
    }

    handle_run(config, sites, cli.skip_key_validation).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitegauge=info,warn"),
            1 => EnvFilter::new("sitegauge=debug,info"),
            2 => EnvFilter::new("sitegauge=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the credential-store modes: --add-key, --remove-key, --test-key,
/// --list-keys
async fn handle_keys(
    config: &sitegauge::Config,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = KeyStore::load(Path::new(&config.ai.keys_file))?;

    if let Some(key) = &cli.add_key {
        if store.add(key)? {
            println!("✓ Key added ({} total)", store.keys().len());
        } else {
            println!("Key already present or empty, nothing added");
        }
    } else if let Some(key) = &cli.remove_key {
        if store.remove(key)? {
            println!("✓ Key removed ({} remaining)", store.keys().len());
        } else {
            println!("Key not found");
        }
    } else if let Some(key) = &cli.test_key {
        let client = GeminiClient::new(key)?;
        match client.generate("Say 'Hello'").await {
            Ok(_) => println!("✓ Key {} is working", mask_key(key)),
            Err(e) => {
                println!("✗ Key {} failed: {}", mask_key(key), e);
                std::process::exit(1);
            }
        }
    } else {
        println!("Stored credentials: {}", store.keys().len());
        for key in store.keys() {
            println!("  - {}", mask_key(key));
        }
    }

    Ok(())
}

/// Shows only the edges of a credential
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// Handles a full analysis run
async fn handle_run(
    config: sitegauge::Config,
    sites: Vec<String>,
    skip_key_validation: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Features: competitors={}, outreach={}, screenshots={}, performance={}",
        config.features.competitors,
        config.features.outreach,
        config.features.screenshots,
        config.features.performance
    );

    let mut coordinator = Coordinator::new(config.clone())?;

    // AI capability: one session per stored credential
    let mut store = KeyStore::load(Path::new(&config.ai.keys_file))?;
    if store.is_empty() {
        tracing::warn!("No AI credentials found; competitor and outreach fallbacks will be used");
    } else {
        let sessions: Vec<Arc<dyn TextGenerator>> = store
            .keys()
            .iter()
            .map(|key| GeminiClient::new(key).map(|c| Arc::new(c) as Arc<dyn TextGenerator>))
            .collect::<sitegauge::Result<_>>()?;

        let generator = if skip_key_validation {
            RotatingGenerator::new(sessions)
        } else {
            tracing::info!("Validating {} AI credential(s)", store.keys().len());
            let (generator, valid) = RotatingGenerator::with_validation(sessions).await;
            if valid.len() < store.keys().len() {
                let surviving: Vec<String> = valid
                    .iter()
                    .filter_map(|&i| store.keys().get(i).cloned())
                    .collect();
                tracing::warn!(
                    "Dropped {} invalid credential(s)",
                    store.keys().len() - surviving.len()
                );
                store.replace(surviving)?;
            }
            generator
        };
        coordinator = coordinator.with_text_generator(Arc::new(generator));
    }

    if config.features.performance {
        let insights = InsightsClient::new(config.ai.pagespeed_api_key.clone())?;
        coordinator = coordinator.with_insights_client(Arc::new(insights));
    }
    if config.features.screenshots {
        tracing::warn!("No screenshot capability is built in; screenshots will be skipped");
    }

    let report = coordinator.run(&sites).await?;

    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&config.output.report_path, json)?;

    println!("✓ Analyzed {} site(s)", report.results.len());
    println!(
        "  {} main, {} competitor(s), {} failed",
        report.metadata.main_site_count,
        report.metadata.competitor_count,
        report.metadata.failed_count
    );
    println!("  Average score: {:.1}/100", report.metadata.average_score);
    println!("✓ Report written to: {}", config.output.report_path);

    Ok(())
}
