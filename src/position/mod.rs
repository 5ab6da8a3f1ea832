//! Position lifecycle: state machine, manager, persistence and notifications

pub mod manager;
pub mod notifier;
pub mod state;
pub mod store;

pub use manager::{PositionManager, PositionServices, TickSummary, TradeStats};
pub use notifier::{ChannelNotifier, LogNotifier, Notifier, PositionEvent};
pub use state::{CloseReason, ExitRules, Position, PositionStatus};
pub use store::{JsonFileStore, MemoryStore, PositionSnapshot, PositionStore};
