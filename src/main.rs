use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use polyintel::api::{ApiClient, PolycasterOptions, TradeSide};
use polyintel::config::{self, Config, EnvConfig};
use polyintel::dashboard::{
    filter_by_side, AnalysisEngine, Dashboard, DashboardSnapshot, WhaleFeedSummary,
};
use polyintel::monitoring::SignalLog;
use polyintel::storage::{KeyValueStore, SqliteStorage};
use polyintel::store::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("PolyIntel dashboard starting...");

    // Load configuration
    let config = Config::load("config.toml")?;
    let env_config = EnvConfig::load()?;

    info!("Opening local storage: {}", config.storage.database_path);
    let sqlite = SqliteStorage::new(&config.storage.database_path)
        .context("Failed to open local storage")?;
    info!("Stored keys: {}", sqlite.count_keys()?);
    let storage: Arc<dyn KeyValueStore> = Arc::new(sqlite);

    let settings = Settings::load(storage.as_ref())?;
    let stored_url = Settings::has_api_url_override(storage.as_ref())?
        .then(|| settings.api_url.clone());
    let base_url = config::resolve_base_url(stored_url.as_deref(), &env_config, &config);
    let timeout = config::resolve_timeout(&env_config, &config);

    info!("Backend API: {} (timeout {:?})", base_url, timeout);
    let client = ApiClient::new(&base_url, timeout)?;

    let signal_log = if config.monitoring.csv_logging {
        let log = SignalLog::new(config.monitoring.csv_log_path.clone())?;
        info!("Logging signals to {}", log.path());
        Some(log)
    } else {
        None
    };

    let dashboard = Dashboard::new(client, storage, signal_log)?
        .with_notice_ttl(Duration::from_secs(config.dashboard.error_display_secs));

    {
        let stats = dashboard.history_stats();
        info!(
            "History: {} signals ({} YES / {} NO), {} favorites",
            stats.total,
            stats.yes_count,
            stats.no_count,
            dashboard.store().favorites().len()
        );
    }

    // Optional one-shot analysis: `polyintel <market-slug>`
    if let Some(slug) = std::env::args().nth(1) {
        let engine = AnalysisEngine::Polycaster(PolycasterOptions::default());
        match dashboard.analyze(&slug, &engine).await? {
            Some(response) => info!(
                "{}: {:?} @ {:.0}% confidence ({})",
                response.card.market_id,
                response.card.direction,
                response.card.confidence * 100.0,
                response.state.decision
            ),
            None => warn_notice(&dashboard),
        }
    }

    let snapshot = dashboard
        .refresh(config.dashboard.trending_limit, config.dashboard.whale_feed_limit)
        .await;
    report(&dashboard, &snapshot);

    let interval = dashboard.settings().refresh_interval();
    if !dashboard.settings().auto_refresh {
        info!("Auto-refresh disabled, exiting");
        return Ok(());
    }

    info!("Auto-refreshing every {:?}", interval);
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                dashboard.expire_notices();
                let snapshot = dashboard
                    .refresh(config.dashboard.trending_limit, config.dashboard.whale_feed_limit)
                    .await;
                report(&dashboard, &snapshot);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                break;
            }
        }
    }

    Ok(())
}

fn report(dashboard: &Dashboard, snapshot: &DashboardSnapshot) {
    for market in &snapshot.trending {
        let marker = if dashboard.store().is_favorite(&market.id) { "*" } else { " " };
        info!(
            "{} {:<60} {:>5.1}%  vol ${:.0}",
            marker,
            market.title,
            market.current_odds * 100.0,
            market.volume_24h
        );
    }

    let feed = WhaleFeedSummary::from_feed(&snapshot.whale_feed);
    info!(
        "Whale feed: {} BUY / {} SELL, ${:.0} total",
        feed.buy_count, feed.sell_count, feed.total_volume
    );

    for side in [TradeSide::Buy, TradeSide::Sell] {
        let largest = filter_by_side(&snapshot.whale_feed, Some(side))
            .into_iter()
            .max_by(|a, b| a.amount.total_cmp(&b.amount));
        if let Some(trade) = largest {
            info!(
                "Largest {:?}: ${:.0} on {} ({:.1}% -> {:.1}%)",
                side,
                trade.amount,
                trade.market_id,
                trade.odds_before * 100.0,
                trade.odds_after * 100.0
            );
        }
    }

    if let Some(stats) = &snapshot.whale_stats {
        info!(
            "Largest whale position: ${:.2}M across {} tracked whales",
            stats.largest_position / 1_000_000.0,
            stats.top_whales.len()
        );
    }

    warn_notice(dashboard);
}

fn warn_notice(dashboard: &Dashboard) {
    if let Some(message) = dashboard.store().error() {
        warn!("{}", message);
    }
}
