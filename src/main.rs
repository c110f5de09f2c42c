use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use validator_earnings_sync::{
    EarningsSync, EarningsView, HttpLedgerClient, SyncConfig, WalletSession,
};

#[derive(Parser)]
#[command(author, version, about = "Follow a provider's earnings in real time")]
struct Args {
    /// Ledger service base URL
    #[arg(long, env = "EARNINGS_API_BASE", default_value = "http://localhost:8080")]
    api_base: String,

    /// Provider wallet address
    #[arg(long, env = "EARNINGS_WALLET")]
    wallet: String,

    #[arg(long, env = "EARNINGS_POLL_INTERVAL_SECS", default_value_t = 10)]
    poll_interval_secs: u64,

    /// Stream reconnect attempts before falling back to polling only
    #[arg(long, env = "EARNINGS_MAX_RETRIES", default_value_t = 5)]
    max_retries: u32,

    #[arg(long, env = "EARNINGS_FETCH_TIMEOUT_SECS", default_value_t = 15)]
    fetch_timeout_secs: u64,

    /// Rely on the event stream alone
    #[arg(long)]
    no_polling: bool,
}

impl Args {
    fn to_config(&self) -> SyncConfig {
        SyncConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_retries: self.max_retries,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            polling_enabled: !self.no_polling,
            ..SyncConfig::default()
        }
        .with_api_base(&self.api_base)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = args.to_config();
    config.validate().context("invalid configuration")?;

    log::info!("[MAIN] ledger: {}", config.api_base);
    log::info!("[MAIN] wallet: {}", args.wallet);

    let client = Arc::new(HttpLedgerClient::new(&config.api_base)?);
    let session = WalletSession::new(Some(args.wallet.clone()));

    let engine = EarningsSync::builder(client.clone(), client)
        .with_config(config)
        .spawn(&session);

    let mut updates = engine.subscribe();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    log::warn!("[MAIN] engine stopped unexpectedly");
                    break;
                }
                let view = updates.borrow_and_update().clone();
                print_view(&view);
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("[MAIN] interrupted, shutting down");
                break;
            }
        }
    }

    engine.shutdown().await;
    Ok(())
}

fn print_view(v: &EarningsView) {
    let balances = match &v.earnings {
        Some(e) => format!(
            "available={:.4} earned={:.4} withdrawn={:.4} rentals={} rate={:.4}/h",
            e.available, e.total_earned, e.total_withdrawn, e.active_rentals, e.earnings_per_hour
        ),
        None if v.is_loading => "loading...".to_string(),
        None => "-".to_string(),
    };

    println!(
        "[{}] {} | stream={} live={} events={}{}",
        v.last_updated
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".into()),
        balances,
        v.connection_status,
        v.is_live,
        v.recent_events.len(),
        v.connection_error
            .as_deref()
            .map(|e| format!(" | {}", e))
            .unwrap_or_default(),
    );
}
