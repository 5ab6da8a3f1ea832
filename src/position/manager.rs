//! Position management
//!
//! Owns every open position, drives the periodic monitoring tick, and is the
//! only place positions are opened or closed.
//!
//! Concurrency rules:
//! - A token has at most one open position.
//! - Open positions plus opens in flight never exceed `max_concurrent_positions`.
//! - A position is sold at most once. A close holds the token in `closing`
//!   until the sell has been recorded or has failed, and ticks skip it meanwhile.
//! - A failed sell leaves the position open and it is re-evaluated next tick.

use chrono::Utc;
use dashmap::DashSet;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ExitPolicy, PositionPolicy};
use crate::error::{Error, Result};
use crate::oracle::PriceOracle;
use crate::position::notifier::{Notifier, PositionEvent};
use crate::position::store::{PositionSnapshot, PositionStore};
use crate::position::{CloseReason, Position};
use crate::trading::{Fill, TradeExecutor};

/// Lifetime trading statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub positions_opened: u64,
    pub positions_closed: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub total_profit: f64,
    pub total_loss: f64,
    pub net_pnl: f64,
}

impl TradeStats {
    pub fn record_open(&mut self) {
        self.positions_opened += 1;
    }

    pub fn record_close(&mut self, pnl: f64) {
        self.positions_closed += 1;
        if pnl > 0.0 {
            self.winning_trades += 1;
            self.total_profit += pnl;
        } else {
            self.losing_trades += 1;
            self.total_loss += pnl.abs();
        }
        self.net_pnl = self.total_profit - self.total_loss;
    }

    /// Percentage of closed trades that made money
    pub fn win_rate(&self) -> f64 {
        if self.positions_closed == 0 {
            return 0.0;
        }
        (self.winning_trades as f64 / self.positions_closed as f64) * 100.0
    }
}

/// Outcome of one monitoring pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Positions that received a fresh price and were evaluated
    pub evaluated: usize,
    pub price_failures: usize,
    pub exits_triggered: usize,
    pub closed: usize,
    pub sell_failures: usize,
}

/// Collaborators the manager drives
#[derive(Clone)]
pub struct PositionServices {
    pub oracle: Arc<dyn PriceOracle>,
    pub executor: Arc<dyn TradeExecutor>,
    pub notifier: Arc<dyn Notifier>,
    pub store: Arc<dyn PositionStore>,
}

#[derive(Default)]
struct PositionBook {
    open: HashMap<String, Position>,
    /// Oldest first, bounded by `closed_history_limit`
    closed: VecDeque<Position>,
    stats: TradeStats,
}

impl PositionBook {
    fn push_closed(&mut self, position: Position, limit: usize) {
        self.closed.push_back(position);
        while self.closed.len() > limit {
            self.closed.pop_front();
        }
    }

    fn was_closed(&self, token: &str) -> bool {
        self.closed.iter().any(|p| p.token_address == token)
    }
}

/// Marks a token busy for the guard's lifetime
struct InFlight<'a> {
    set: &'a DashSet<String>,
    token: String,
}

impl<'a> InFlight<'a> {
    fn acquire(set: &'a DashSet<String>, token: &str) -> Option<Self> {
        if set.insert(token.to_string()) {
            Some(Self {
                set,
                token: token.to_string(),
            })
        } else {
            None
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.token);
    }
}

/// Position manager
pub struct PositionManager {
    policy: PositionPolicy,
    exit: ExitPolicy,
    services: PositionServices,
    book: RwLock<PositionBook>,
    opening: DashSet<String>,
    closing: DashSet<String>,
    tick_lock: Mutex<()>,
    persist_lock: Mutex<()>,
}

impl PositionManager {
    /// Create a manager. Call [`load`](Self::load) to resume saved positions.
    pub fn new(policy: PositionPolicy, exit: ExitPolicy, services: PositionServices) -> Result<Self> {
        policy.validate()?;
        exit.validate()?;

        Ok(Self {
            policy,
            exit,
            services,
            book: RwLock::new(PositionBook::default()),
            opening: DashSet::new(),
            closing: DashSet::new(),
            tick_lock: Mutex::new(()),
            persist_lock: Mutex::new(()),
        })
    }

    /// Restore positions from the store. Returns the number of open positions.
    pub async fn load(&self) -> Result<usize> {
        let Some(snapshot) = self.services.store.load().await? else {
            info!("No saved positions, starting fresh");
            return Ok(0);
        };

        let mut book = self.book.write().await;
        book.open = snapshot
            .open
            .into_iter()
            .filter(|p| p.is_open())
            .map(|p| (p.token_address.clone(), p))
            .collect();
        book.closed = VecDeque::new();
        for position in snapshot.closed {
            book.push_closed(position, self.policy.closed_history_limit);
        }
        book.stats = snapshot.stats;

        if book.open.len() > self.policy.max_concurrent_positions {
            warn!(
                "Resumed {} open positions, above the limit of {}. New positions are blocked until some close.",
                book.open.len(),
                self.policy.max_concurrent_positions
            );
        }

        info!(
            "Resumed {} open / {} closed positions",
            book.open.len(),
            book.closed.len()
        );
        Ok(book.open.len())
    }

    /// Point-in-time copy of the book
    pub async fn snapshot(&self) -> PositionSnapshot {
        let book = self.book.read().await;
        PositionSnapshot::new(
            book.open.values().cloned().collect(),
            book.closed.iter().cloned().collect(),
            book.stats.clone(),
        )
    }

    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.snapshot().await;
        if let Err(e) = self.services.store.save(&snapshot).await {
            error!("Failed to persist positions: {}", e);
        }
    }

    /// Whether another position fits under the concurrency cap
    pub async fn can_open_new_position(&self) -> bool {
        let book = self.book.read().await;
        book.open.len() + self.opening.len() < self.policy.max_concurrent_positions
    }

    fn check_capacity(&self, book: &PositionBook, token: &str) -> Result<()> {
        if book.open.contains_key(token) {
            return Err(Error::PositionAlreadyOpen(token.to_string()));
        }
        if self.opening.contains(token) {
            return Err(Error::OpenInProgress(token.to_string()));
        }
        let in_use = book.open.len() + self.opening.len();
        if in_use >= self.policy.max_concurrent_positions {
            return Err(Error::MaxPositionsReached {
                open: in_use,
                max: self.policy.max_concurrent_positions,
            });
        }
        Ok(())
    }

    /// Buy `base_amount` worth of `token` and track the resulting position
    pub async fn open(
        &self,
        token: &str,
        base_amount: f64,
        quality_score: Option<u32>,
    ) -> Result<Position> {
        let _reservation = {
            let book = self.book.write().await;
            self.check_capacity(&book, token)?;
            InFlight::acquire(&self.opening, token)
                .ok_or_else(|| Error::OpenInProgress(token.to_string()))?
        };

        let fill = self.services.executor.buy(token, base_amount).await?;
        let position = self
            .build_position(token, &fill, quality_score)
            .inspect_err(|e| error!("Bought {} but could not track it: {}", token, e))?;

        {
            let mut book = self.book.write().await;
            book.open.insert(token.to_string(), position.clone());
            book.stats.record_open();
        }

        self.after_open(&position).await;
        Ok(position)
    }

    /// Track a position bought outside the manager
    pub async fn add(&self, token: &str, fill: &Fill, quality_score: Option<u32>) -> Result<Position> {
        let position = self.build_position(token, fill, quality_score)?;

        {
            let mut book = self.book.write().await;
            self.check_capacity(&book, token)?;
            book.open.insert(token.to_string(), position.clone());
            book.stats.record_open();
        }

        self.after_open(&position).await;
        Ok(position)
    }

    fn build_position(&self, token: &str, fill: &Fill, quality_score: Option<u32>) -> Result<Position> {
        let position = Position::open(token, fill, &self.exit)?;
        Ok(match quality_score {
            Some(score) => position.with_quality_score(score),
            None => position,
        })
    }

    async fn after_open(&self, position: &Position) {
        self.persist().await;
        self.services.notifier.notify(&PositionEvent::Opened {
            token: position.token_address.clone(),
            entry_price: position.entry_price,
            amount_committed: position.amount_committed,
            quality_score: position.quality_score,
        });
    }

    /// Manually close an open position at market
    pub async fn close(&self, token: &str) -> Result<Position> {
        self.close_with_reason(token, CloseReason::Manual).await
    }

    async fn close_with_reason(&self, token: &str, reason: CloseReason) -> Result<Position> {
        let (_guard, quantity) = {
            let book = self.book.read().await;
            let Some(position) = book.open.get(token) else {
                return Err(if book.was_closed(token) {
                    Error::PositionAlreadyClosed(token.to_string())
                } else {
                    Error::PositionNotFound(token.to_string())
                });
            };
            let guard = InFlight::acquire(&self.closing, token)
                .ok_or_else(|| Error::CloseInProgress(token.to_string()))?;
            (guard, position.quantity_held)
        };

        let fill = match self.services.executor.sell(token, quantity, reason).await {
            Ok(fill) => fill,
            Err(e) => {
                warn!("Sell of {} ({}) failed, position stays open: {}", token, reason, e);
                self.services.notifier.notify(&PositionEvent::SellFailed {
                    token: token.to_string(),
                    reason,
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let closed = {
            let mut book = self.book.write().await;
            let mut position = book
                .open
                .remove(token)
                .ok_or_else(|| Error::PositionNotFound(token.to_string()))?;
            let pnl = position.close(&fill, reason)?;
            book.stats.record_close(pnl);
            book.push_closed(position.clone(), self.policy.closed_history_limit);
            position
        };

        self.persist().await;
        self.services.notifier.notify(&PositionEvent::Closed {
            token: token.to_string(),
            reason,
            realized_pnl: closed.realized_pnl.unwrap_or(0.0),
            realized_pnl_pct: closed.realized_pnl_ratio().unwrap_or(0.0) * 100.0,
            tx_hash: fill.tx_hash,
        });

        Ok(closed)
    }

    /// One monitoring pass: refresh prices, evaluate exits, sell what fired.
    ///
    /// Overlapping calls are serialized.
    pub async fn monitor_tick(&self) -> TickSummary {
        let _tick = self.tick_lock.lock().await;
        let mut summary = TickSummary::default();

        let tokens: Vec<String> = {
            let book = self.book.read().await;
            book.open
                .keys()
                .filter(|t| !self.closing.contains(*t))
                .cloned()
                .collect()
        };
        if tokens.is_empty() {
            return summary;
        }

        let lookups = tokens.into_iter().map(|token| async move {
            let price = self.services.oracle.get_price(&token).await;
            (token, price)
        });
        let prices = join_all(lookups).await;

        let now = Utc::now();
        let mut exits = Vec::new();
        {
            let mut book = self.book.write().await;
            for (token, price) in prices {
                let price = match price {
                    Ok(Some(price)) => price,
                    Ok(None) => {
                        debug!("No price for {}", token);
                        summary.price_failures += 1;
                        self.services
                            .notifier
                            .notify(&PositionEvent::PriceUnavailable { token });
                        continue;
                    }
                    Err(e) => {
                        warn!("Price lookup failed for {}: {}", token, e);
                        summary.price_failures += 1;
                        self.services
                            .notifier
                            .notify(&PositionEvent::PriceUnavailable { token });
                        continue;
                    }
                };

                if self.closing.contains(&token) {
                    continue;
                }
                let Some(position) = book.open.get_mut(&token) else {
                    continue;
                };
                if let Err(e) = position.update_price(price) {
                    warn!("Rejected price update for {}: {}", token, e);
                    summary.price_failures += 1;
                    continue;
                }
                summary.evaluated += 1;

                if let Some(reason) = position.should_exit(now) {
                    let pnl_pct = position.unrealized_pnl_ratio() * 100.0;
                    info!(
                        "Exit triggered for {}: {} @ {} ({:+.2}%)",
                        token, reason, price, pnl_pct
                    );
                    self.services.notifier.notify(&PositionEvent::ExitTriggered {
                        token: token.clone(),
                        reason,
                        price,
                        pnl_pct,
                    });
                    exits.push((token, reason));
                }
            }
        }
        summary.exits_triggered = exits.len();

        self.persist().await;

        let closes = exits
            .iter()
            .map(|(token, reason)| self.close_with_reason(token, *reason));
        for (result, (token, _)) in join_all(closes).await.into_iter().zip(&exits) {
            match result {
                Ok(_) => summary.closed += 1,
                Err(e) if e.is_invariant_violation() => {
                    debug!("Skipped exit for {}: {}", token, e)
                }
                Err(Error::PositionNotFound(_)) => debug!("{} already gone", token),
                Err(e) => {
                    summary.sell_failures += 1;
                    if !e.is_retryable() {
                        error!("Sell of {} failed and will not recover on retry: {}", token, e);
                    }
                }
            }
        }

        summary
    }

    /// Tick every `check_interval_secs` until cancelled
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.policy.check_interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Position monitor started ({}s interval, max {} positions)",
            self.policy.check_interval_secs, self.policy.max_concurrent_positions
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Position monitor shutting down");
                    break;
                }
                _ = interval.tick() => {
                    let summary = self.monitor_tick().await;
                    if summary.evaluated > 0 || summary.price_failures > 0 {
                        debug!("Tick: {:?}", summary);
                    }
                }
            }
        }

        self.persist().await;
    }

    /// Open positions, oldest first
    pub async fn open_positions(&self) -> Vec<Position> {
        let book = self.book.read().await;
        let mut positions: Vec<Position> = book.open.values().cloned().collect();
        positions.sort_by_key(|p| p.opened_at);
        positions
    }

    /// Closed positions, most recent first
    pub async fn closed_positions(&self, limit: Option<usize>) -> Vec<Position> {
        let book = self.book.read().await;
        book.closed
            .iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// The open position for a token, or its most recent closed one
    pub async fn get_position(&self, token: &str) -> Option<Position> {
        let book = self.book.read().await;
        book.open
            .get(token)
            .or_else(|| book.closed.iter().rev().find(|p| p.token_address == token))
            .cloned()
    }

    pub async fn open_count(&self) -> usize {
        self.book.read().await.open.len()
    }

    pub async fn stats(&self) -> TradeStats {
        self.book.read().await.stats.clone()
    }

    /// Mark-to-market P&L across open positions
    pub async fn total_unrealized_pnl(&self) -> f64 {
        let book = self.book.read().await;
        book.open.values().map(|p| p.unrealized_pnl()).sum()
    }
}
