//! CLI command implementations

use anyhow::{Context, Result};
use dialoguer::Confirm;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::oracle::{DexScreenerOracle, PriceOracle};
use crate::position::{
    JsonFileStore, LogNotifier, Position, PositionManager, PositionServices, PositionSnapshot,
    PositionStore,
};
use crate::quality::{PairCandidate, PooledAsset, QualityAnalyzer, SolanaTokenLookup};
use crate::trading::PaperTrader;

/// Wire a position manager to DexScreener prices, the paper trader and the
/// configured snapshot file, then resume saved positions.
async fn build_manager(config: &Config) -> Result<PositionManager> {
    let oracle: Arc<dyn PriceOracle> = Arc::new(DexScreenerOracle::new(&config.base_asset.address));
    let services = PositionServices {
        oracle: oracle.clone(),
        executor: Arc::new(PaperTrader::new(oracle, config.trading.paper_fee_pct)),
        notifier: Arc::new(LogNotifier),
        store: Arc::new(JsonFileStore::new(&config.positions.persistence_path)),
    };

    let manager = PositionManager::new(config.positions.clone(), config.exit.clone(), services)?;
    manager
        .load()
        .await
        .with_context(|| format!("Could not load {}", config.positions.persistence_path))?;
    Ok(manager)
}

/// Score a pair and print the report
pub async fn analyze(
    config: &Config,
    token: &str,
    pool: &str,
    base_amount: f64,
    token_amount: f64,
    open: bool,
) -> Result<()> {
    let lookup = SolanaTokenLookup::new(
        &config.rpc.endpoint,
        Duration::from_millis(config.rpc.timeout_ms),
    );
    let analyzer = QualityAnalyzer::new(
        config.quality.clone(),
        config.base_asset.clone(),
        Arc::new(lookup),
    )?;

    let candidate = PairCandidate::new(
        token,
        pool,
        PooledAsset {
            address: config.base_asset.address.clone(),
            amount: base_amount,
        },
        PooledAsset {
            address: token.to_string(),
            amount: token_amount,
        },
    );

    info!("Analyzing {} (pool {})", token, pool);
    let report = analyzer.analyze(&candidate).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !open {
        return Ok(());
    }
    if !report.should_trade {
        println!(
            "\nNot opening a position: should_trade is false (score {}, auto_trade {})",
            report.score, config.quality.auto_trade
        );
        return Ok(());
    }

    let manager = build_manager(config).await?;
    let position = manager
        .open(token, config.trading.buy_amount, Some(report.score))
        .await?;
    println!(
        "\nPAPER position opened: {} {} @ {} (SL {}, TP {})",
        position.quantity_held,
        token,
        position.entry_price,
        position.stop_loss_price,
        position.take_profit_price
    );
    Ok(())
}

/// Run the monitoring loop until Ctrl-C, or a single tick with `once`
pub async fn monitor(config: &Config, once: bool) -> Result<()> {
    let manager = Arc::new(build_manager(config).await?);

    if once {
        let summary = manager.monitor_tick().await;
        println!(
            "Evaluated {} | price failures {} | exits {} | closed {} | sell failures {}",
            summary.evaluated,
            summary.price_failures,
            summary.exits_triggered,
            summary.closed,
            summary.sell_failures
        );
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let runner = {
        let manager = manager.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { manager.run(cancel).await })
    };

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C, finishing current tick...");
    cancel.cancel();
    runner.await?;

    let stats = manager.stats().await;
    info!(
        "Stopped. {} open ({:+.6} {} unrealized), {} closed, net P&L {:+.6} {}",
        manager.open_count().await,
        manager.total_unrealized_pnl().await,
        config.base_asset.symbol,
        stats.positions_closed,
        stats.net_pnl,
        config.base_asset.symbol
    );
    Ok(())
}

/// Manually close a position at market
pub async fn close(config: &Config, token: &str, force: bool) -> Result<()> {
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Close position in {}? This cannot be undone.", token))
            .default(false)
            .interact()?;

        if !confirmed {
            info!("Close cancelled by user");
            return Ok(());
        }
    }

    let manager = build_manager(config).await?;
    let closed = manager.close(token).await?;

    println!("\nPosition closed: {}", closed.token_address);
    println!("  Exit price: {}", closed.exit_price.unwrap_or_default());
    println!(
        "  Realized P&L: {:+.6} {} ({:+.2}%)",
        closed.realized_pnl.unwrap_or_default(),
        config.base_asset.symbol,
        closed.realized_pnl_ratio().unwrap_or_default() * 100.0
    );
    if let Some(tx) = &closed.close_tx_hash {
        println!("  Transaction: {}", tx);
    }
    Ok(())
}

fn print_position(position: &Position, symbol: &str) {
    println!(
        "  {} | entry {} | now {} | peak {} | {:+.2}% | {:.6} {} committed",
        position.token_address,
        position.entry_price,
        position.current_price,
        position.peak_price,
        position.unrealized_pnl_ratio() * 100.0,
        position.amount_committed,
        symbol
    );
    println!(
        "      SL {} | TP {} | trailing {} | held {}m",
        position.stop_loss_price,
        position.take_profit_price,
        position
            .trailing_stop_price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".into()),
        position.hold_duration(chrono::Utc::now()).num_minutes()
    );
}

/// Show positions and statistics from the last saved snapshot
pub async fn status(config: &Config) -> Result<()> {
    let store = JsonFileStore::new(&config.positions.persistence_path);
    let snapshot = match store.load().await? {
        Some(snapshot) => snapshot,
        None => {
            warn!("No snapshot at {}", store.path().display());
            PositionSnapshot::new(Vec::new(), Vec::new(), Default::default())
        }
    };
    let symbol = config.base_asset.symbol.as_str();
    let stats = &snapshot.stats;

    println!("\n=== GEM SNIPER STATUS (saved {}) ===\n", snapshot.saved_at);
    println!(
        "Open positions: {} / {}",
        snapshot.open.len(),
        config.positions.max_concurrent_positions
    );
    println!(
        "Unrealized P&L: {:+.6} {}",
        snapshot.open.iter().map(|p| p.unrealized_pnl()).sum::<f64>(),
        symbol
    );
    println!("\nStatistics:");
    println!("  Opened: {}", stats.positions_opened);
    println!("  Closed: {}", stats.positions_closed);
    println!(
        "  Wins / losses: {} / {} ({:.1}% win rate)",
        stats.winning_trades,
        stats.losing_trades,
        stats.win_rate()
    );
    println!("  Net P&L: {:+.6} {}", stats.net_pnl, symbol);

    println!("\n=== OPEN POSITIONS ===\n");
    if snapshot.open.is_empty() {
        println!("No open positions.");
    }
    for position in &snapshot.open {
        print_position(position, symbol);
    }

    println!("\n=== RECENTLY CLOSED ===\n");
    for position in snapshot.closed.iter().rev().take(10) {
        println!(
            "  {} | {} | {:+.6} {} ({:+.2}%)",
            position.token_address,
            position
                .close_reason
                .map(|r| r.to_string())
                .unwrap_or_default(),
            position.realized_pnl.unwrap_or_default(),
            symbol,
            position.realized_pnl_ratio().unwrap_or_default() * 100.0
        );
    }

    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}
