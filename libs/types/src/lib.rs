//! Shared domain types for the Pulse signal engine.
//!
//! Every entity that crosses a crate boundary lives here: price bars,
//! structural events, trading signals, portfolio aggregates, the rebalance
//! audit trail, risk alerts, and the prediction collaborator's return shape.
//! All types serialize with snake_case field and variant names so the wire
//! representation matches the dashboard protocol.

pub mod alert;
pub mod market;
pub mod portfolio;
pub mod prediction;
pub mod signal;

pub use alert::{RiskAlert, RiskAlertKind, Severity};
pub use market::{
    FairValueGap, GapDirection, LiquidityVoid, MagnetStrength, PriceBar, ShiftKind, Significance,
    StructureShift, Timeframe,
};
pub use portfolio::{
    OptimizationStrategy, PerformanceSnapshot, Portfolio, PortfolioAsset, Rebalance, Trade,
    TradeAction,
};
pub use prediction::{KeyFactors, NotificationTarget, Prediction};
pub use signal::{Direction, RiskLevel, Signal, SignalType};
