//! Gem Sniper Library
//!
//! Scores newly created AMM pairs for quality and manages the resulting
//! positions with stop-loss, trailing-stop, take-profit and max-hold exits.

pub mod cli;
pub mod config;
pub mod error;
pub mod oracle;
pub mod position;
pub mod quality;
pub mod trading;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use position::{Position, PositionManager};
pub use quality::{QualityAnalyzer, QualityReport};
