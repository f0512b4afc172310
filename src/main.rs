//! Lang Price Sync - annotates crafting items in a localization file with auction prices
//!
//! Runs the sync pipeline on a background task and prints its progress.

use clap::Parser;
use lang_price_sync::{SyncConfig, SyncEvent, SyncPipeline};
use std::path::PathBuf;

/// Writes average auction prices of crafting items into a .lang file
#[derive(Parser, Debug)]
#[command(name = "lang_price_sync")]
#[command(version, about, long_about = None)]
struct Args {
    /// Localization file to patch (e.g. ru.lang)
    file: PathBuf,

    /// JSON config file (default: ~/.config/lang_price_sync/config.json if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Auction API client id
    #[arg(long, env = "STALCRAFT_CLIENT_ID")]
    client_id: Option<String>,

    /// Auction API client secret
    #[arg(long, env = "STALCRAFT_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Maximum concurrent requests per phase
    #[arg(long)]
    concurrency: Option<usize>,

    /// Delay before retrying a failed history request, in milliseconds
    #[arg(long)]
    retry_delay_ms: Option<u64>,
}

impl Args {
    fn apply(self, config: &mut SyncConfig) -> PathBuf {
        if let Some(client_id) = self.client_id {
            config.client_id = client_id;
        }
        if let Some(client_secret) = self.client_secret {
            config.client_secret = client_secret;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(delay) = self.retry_delay_ms {
            config.retry_delay_ms = delay;
        }
        self.file
    }
}

#[tokio::main]
async fn main() {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=lang_price_sync=debug
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match SyncConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };
    let file = args.apply(&mut config);

    let pipeline = match SyncPipeline::new(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    log::info!("Starting sync for {}", file.display());
    let mut handle = pipeline.spawn(file);

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(SyncEvent::Finished) | None => break,
                Some(SyncEvent::StateChanged(_)) => {}
                Some(event @ SyncEvent::Failed { .. }) => eprintln!("{}", event),
                Some(event) => println!("{}", event),
            },
            _ = tokio::signal::ctrl_c() => {
                log::warn!("Interrupted, cancelling sync");
                handle.cancel();
            }
        }
    }

    match handle.wait().await {
        Ok(summary) => {
            if summary.fallback_count > 0 {
                log::warn!(
                    "{} items had no auction history and were priced at 0",
                    summary.fallback_count
                );
            }
        }
        Err(_) => std::process::exit(1),
    }
}
