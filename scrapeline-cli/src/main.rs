mod pipeline;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use scrapeline_config::{
    ConfigLoad, ConfigLoader, ConfigWarnings, constants::DEFAULT_PROXY_PROBE_URL,
};
use scrapeline_core::test_proxy;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "scrapeline",
    version,
    about = "Scrape, merge and translate media metadata from file names"
)]
struct Cli {
    /// Path to scrapeline.toml (defaults to ./scrapeline.toml or ./config/scrapeline.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Env file to load before reading SCRAPELINE_* variables
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape metadata for one or more media files and print JSON lines
    Scrape {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Translate a single piece of text with the configured provider
    Translate {
        text: String,
        /// Target language (defaults to the configured one)
        #[arg(long)]
        target: Option<String>,
    },
    /// Check connectivity through the configured proxy
    ProxyTest {
        #[arg(long, default_value = DEFAULT_PROXY_PROBE_URL)]
        url: String,
    },
    /// Configuration helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Load and validate configuration, printing any warnings
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let load = load_config(&cli)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling outstanding work");
            on_signal.cancel();
        }
    });

    match cli.command {
        Command::Scrape { files } => scrape(&load, files, &cancel).await,
        Command::Translate { text, target } => {
            translate(&load, &text, target, &cancel).await
        }
        Command::ProxyTest { url } => proxy_test(&load, &url).await,
        Command::Config {
            action: ConfigAction::Check,
        } => {
            print_warnings(&load.warnings);
            let config = &load.config;
            match &config.metadata.config_path {
                Some(path) => println!("config file: {}", path.display()),
                None => println!("config file: none (defaults + environment)"),
            }
            println!(
                "sources: {}",
                if config.scraper.enabled_data_sources.is_empty() {
                    "none".to_string()
                } else {
                    config.scraper.enabled_data_sources.join(", ")
                }
            );
            println!(
                "translation: {} ({} -> {})",
                if config.translation.enabled { "on" } else { "off" },
                config.translation.provider,
                config.translation.target_language
            );
            println!(
                "proxy: {}",
                if config.proxy.is_active() {
                    config.proxy.proxy_url()
                } else {
                    "off".to_string()
                }
            );
            println!("configuration OK");
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<ConfigLoad> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &cli.env_file {
        loader = loader.with_env_file(path);
    }
    loader.load().context("failed to load configuration")
}

fn print_warnings(warnings: &ConfigWarnings) {
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => warn!("{} ({})", warning.message, hint),
            None => warn!("{}", warning.message),
        }
    }
}

async fn scrape(
    load: &ConfigLoad,
    files: Vec<PathBuf>,
    cancel: &CancellationToken,
) -> Result<()> {
    print_warnings(&load.warnings);
    let scraper = pipeline::build_scraper(&load.config)?;

    let results = futures::future::join_all(
        files
            .iter()
            .map(|file| scraper.scrape_by_file_name(file, cancel)),
    )
    .await;

    let mut failures = 0usize;
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok(Some(record)) => {
                println!("{}", serde_json::to_string(&record)?);
            }
            Ok(None) => eprintln!("{}: no match", file.display()),
            Err(err) => {
                failures += 1;
                eprintln!("{}: {}", file.display(), err);
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} file(s) failed", files.len());
    }
    Ok(())
}

async fn translate(
    load: &ConfigLoad,
    text: &str,
    target: Option<String>,
    cancel: &CancellationToken,
) -> Result<()> {
    let translator = pipeline::build_translator(&load.config)?;
    let target =
        target.unwrap_or_else(|| load.config.translation.target_language.clone());
    let translated = translator.translate(text, &target, cancel).await?;
    println!("{translated}");
    Ok(())
}

async fn proxy_test(load: &ConfigLoad, url: &str) -> Result<()> {
    let proxy = &load.config.proxy;
    if test_proxy(proxy, url, load.config.translation.timeout).await? {
        info!("Proxy {} reached {}", proxy.proxy_url(), url);
        println!("proxy OK");
    } else {
        println!("proxy disabled");
    }
    Ok(())
}
