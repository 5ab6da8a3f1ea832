//! Position lifecycle notifications
//!
//! Delivery is fire-and-forget. A notifier must never block the monitoring
//! loop, and a dropped notification never affects position state.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::position::CloseReason;

/// Events emitted by the position manager
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PositionEvent {
    Opened {
        token: String,
        entry_price: f64,
        amount_committed: f64,
        quality_score: Option<u32>,
    },
    ExitTriggered {
        token: String,
        reason: CloseReason,
        price: f64,
        pnl_pct: f64,
    },
    Closed {
        token: String,
        reason: CloseReason,
        realized_pnl: f64,
        realized_pnl_pct: f64,
        tx_hash: String,
    },
    SellFailed {
        token: String,
        reason: CloseReason,
        error: String,
    },
    PriceUnavailable {
        token: String,
    },
}

impl PositionEvent {
    pub fn token(&self) -> &str {
        match self {
            PositionEvent::Opened { token, .. }
            | PositionEvent::ExitTriggered { token, .. }
            | PositionEvent::Closed { token, .. }
            | PositionEvent::SellFailed { token, .. }
            | PositionEvent::PriceUnavailable { token } => token,
        }
    }
}

/// Receives position events
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &PositionEvent);
}

/// Writes events to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &PositionEvent) {
        match event {
            PositionEvent::Opened {
                token,
                entry_price,
                amount_committed,
                ..
            } => info!("OPENED {}: {} @ {}", token, amount_committed, entry_price),
            PositionEvent::ExitTriggered {
                token,
                reason,
                price,
                pnl_pct,
            } => info!("EXIT {} ({}) @ {} ({:+.2}%)", token, reason, price, pnl_pct),
            PositionEvent::Closed {
                token,
                reason,
                realized_pnl,
                realized_pnl_pct,
                ..
            } => info!(
                "CLOSED {} ({}): {:+.6} ({:+.2}%)",
                token, reason, realized_pnl, realized_pnl_pct
            ),
            PositionEvent::SellFailed {
                token,
                reason,
                error,
            } => warn!("SELL FAILED {} ({}): {}", token, reason, error),
            PositionEvent::PriceUnavailable { token } => debug!("No price for {}", token),
        }
    }
}

/// Forwards events into a bounded channel, dropping them when it is full
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<PositionEvent>,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PositionEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: &PositionEvent) {
        if let Err(e) = self.tx.try_send(event.clone()) {
            debug!("Dropped notification for {}: {}", event.token(), e);
        }
    }
}
