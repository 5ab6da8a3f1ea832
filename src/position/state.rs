//! A single speculative position and its exit policy
//!
//! Exit thresholds are fixed when the position opens and persisted with it, so
//! a position reloaded after a restart keeps the rules it was opened under even
//! if the configured policy has since changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::config::ExitPolicy;
use crate::error::{Error, Result};
use crate::trading::Fill;

/// Why a position was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    StopLoss,
    TrailingStop,
    TakeProfit,
    MaxHoldTime,
    Manual,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloseReason::StopLoss => "stop-loss",
            CloseReason::TrailingStop => "trailing stop",
            CloseReason::TakeProfit => "take-profit",
            CloseReason::MaxHoldTime => "max hold time",
            CloseReason::Manual => "manual",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Open,
    Closed,
}

/// Policy parameters captured at open time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitRules {
    pub trailing_stop_enabled: bool,
    /// Fractional distance of the trailing stop below the peak (0.20 = 20%)
    pub trailing_stop_ratio: f64,
    /// Minimum unrealized P&L ratio before take-profit may fire
    pub min_profit_ratio: f64,
    pub max_hold_secs: u64,
}

impl From<&ExitPolicy> for ExitRules {
    fn from(policy: &ExitPolicy) -> Self {
        Self {
            trailing_stop_enabled: policy.trailing_stop_enabled,
            trailing_stop_ratio: policy.trailing_stop_pct / 100.0,
            min_profit_ratio: policy.min_profit_pct / 100.0,
            max_hold_secs: policy.max_hold_secs,
        }
    }
}

/// One open or closed trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Token mint / contract address
    pub token_address: String,
    /// Buy transaction hash
    pub open_tx_hash: String,
    /// Entry price in base asset per token
    pub entry_price: f64,
    /// Base asset spent on the buy
    pub amount_committed: f64,
    /// Tokens received from the buy
    pub quantity_held: f64,
    pub current_price: f64,
    /// Highest price observed since open, never below entry
    pub peak_price: f64,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    /// Unset until the peak rises above entry
    pub trailing_stop_price: Option<f64>,
    pub rules: ExitRules,
    /// Quality score the token had when bought, if known
    pub quality_score: Option<u32>,
    pub opened_at: DateTime<Utc>,
    pub last_update_at: DateTime<Utc>,
    pub update_count: u64,
    pub status: PositionStatus,
    pub closed_at: Option<DateTime<Utc>>,
    pub close_reason: Option<CloseReason>,
    pub close_tx_hash: Option<String>,
    pub exit_price: Option<f64>,
    /// Base asset received minus base asset committed
    pub realized_pnl: Option<f64>,
}

impl Position {
    /// Open a position from a confirmed buy
    pub fn open(token_address: &str, fill: &Fill, policy: &ExitPolicy) -> Result<Self> {
        if !(fill.price.is_finite() && fill.price > 0.0) {
            return Err(Error::InvalidFill(format!(
                "entry price must be positive, got {}",
                fill.price
            )));
        }
        if fill.token_amount <= 0.0 || fill.base_amount <= 0.0 {
            return Err(Error::InvalidFill(format!(
                "fill amounts must be positive, got {} base / {} tokens",
                fill.base_amount, fill.token_amount
            )));
        }

        let entry_price = fill.price;
        let position = Self {
            token_address: token_address.to_string(),
            open_tx_hash: fill.tx_hash.clone(),
            entry_price,
            amount_committed: fill.base_amount,
            quantity_held: fill.token_amount,
            current_price: entry_price,
            peak_price: entry_price,
            stop_loss_price: entry_price * (1.0 - policy.stop_loss_pct / 100.0),
            take_profit_price: entry_price * (1.0 + policy.take_profit_pct / 100.0),
            trailing_stop_price: None,
            rules: ExitRules::from(policy),
            quality_score: None,
            opened_at: fill.timestamp,
            last_update_at: fill.timestamp,
            update_count: 0,
            status: PositionStatus::Open,
            closed_at: None,
            close_reason: None,
            close_tx_hash: None,
            exit_price: None,
            realized_pnl: None,
        };

        info!(
            "New position {}: {} base for {} tokens @ {} (SL {}, TP {})",
            position.token_address,
            position.amount_committed,
            position.quantity_held,
            position.entry_price,
            position.stop_loss_price,
            position.take_profit_price
        );

        Ok(position)
    }

    pub fn with_quality_score(mut self, score: u32) -> Self {
        self.quality_score = Some(score);
        self
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Record a new market price.
    ///
    /// Raises the peak and re-derives the trailing stop when the price makes a
    /// new high above entry. The trailing stop only ever moves up.
    pub fn update_price(&mut self, new_price: f64) -> Result<()> {
        if !self.is_open() {
            return Err(Error::PositionAlreadyClosed(self.token_address.clone()));
        }
        if !new_price.is_finite() || new_price < 0.0 {
            return Err(Error::PriceUnavailable(format!(
                "{} (invalid price {})",
                self.token_address, new_price
            )));
        }

        self.current_price = new_price;

        if new_price > self.peak_price {
            self.peak_price = new_price;

            if self.rules.trailing_stop_enabled {
                let candidate = self.peak_price * (1.0 - self.rules.trailing_stop_ratio);
                self.trailing_stop_price = Some(match self.trailing_stop_price {
                    Some(current) => current.max(candidate),
                    None => candidate,
                });
            }
        }

        self.last_update_at = Utc::now();
        self.update_count += 1;
        Ok(())
    }

    /// Evaluate the exit policy, highest priority first
    pub fn should_exit(&self, now: DateTime<Utc>) -> Option<CloseReason> {
        if !self.is_open() {
            return None;
        }

        if self.current_price <= self.stop_loss_price {
            return Some(CloseReason::StopLoss);
        }

        if let Some(trailing) = self.trailing_stop_price {
            if self.current_price <= trailing {
                return Some(CloseReason::TrailingStop);
            }
        }

        if self.current_price >= self.take_profit_price
            && self.unrealized_pnl_ratio() >= self.rules.min_profit_ratio
        {
            return Some(CloseReason::TakeProfit);
        }

        if self.hold_duration(now).num_seconds() >= self.rules.max_hold_secs as i64 {
            return Some(CloseReason::MaxHoldTime);
        }

        None
    }

    /// Transition to Closed from a confirmed sell. Returns the realized P&L.
    pub fn close(&mut self, fill: &Fill, reason: CloseReason) -> Result<f64> {
        if !self.is_open() {
            return Err(Error::PositionAlreadyClosed(self.token_address.clone()));
        }

        let pnl = fill.base_amount - self.amount_committed;

        self.status = PositionStatus::Closed;
        self.closed_at = Some(fill.timestamp);
        self.close_reason = Some(reason);
        self.close_tx_hash = Some(fill.tx_hash.clone());
        self.exit_price = Some(fill.price);
        self.realized_pnl = Some(pnl);

        info!(
            "Closed position {} ({}): held {}s, P&L {:+.6} ({:+.2}%)",
            self.token_address,
            reason,
            (fill.timestamp - self.opened_at).num_seconds(),
            pnl,
            self.realized_pnl_ratio().unwrap_or(0.0) * 100.0
        );

        Ok(pnl)
    }

    /// `current_price / entry_price - 1`
    pub fn unrealized_pnl_ratio(&self) -> f64 {
        self.current_price / self.entry_price - 1.0
    }

    /// Mark-to-market value in base-asset units
    pub fn current_value(&self) -> f64 {
        self.quantity_held * self.current_price
    }

    /// Unrealized P&L in base-asset units
    pub fn unrealized_pnl(&self) -> f64 {
        self.current_value() - self.amount_committed
    }

    pub fn realized_pnl_ratio(&self) -> Option<f64> {
        let pnl = self.realized_pnl?;
        if self.amount_committed == 0.0 {
            return None;
        }
        Some(pnl / self.amount_committed)
    }

    pub fn hold_duration(&self, now: DateTime<Utc>) -> chrono::Duration {
        let end = self.closed_at.unwrap_or(now);
        end - self.opened_at
    }
}
