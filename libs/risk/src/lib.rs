//! # Risk & Sizing Engine
//!
//! Pure numeric functions over price and return series: Value-at-Risk in
//! three flavors, Kelly-criterion sizing, ATR-based stop/target placement,
//! trailing stops, risk-budget position sizing, and drawdown analysis.
//!
//! The engine holds no state. Malformed input (zero risk per share, negative
//! account size) is rejected with [`RiskError::InvalidInput`]; statistical
//! insufficiency (too few samples) is not an error and instead yields a
//! neutral result carrying an explicit "insufficient data" reasoning string,
//! so callers can distinguish "no edge" from "no data".

pub mod drawdown;
pub mod error;
pub mod kelly;
pub mod sizing;
pub mod stops;
pub mod var;

pub use drawdown::{analyze_drawdown, DrawdownReport, ASSUMED_DAILY_RECOVERY_RATE};
pub use error::{Result, RiskError};
pub use kelly::{kelly_criterion, kelly_from_returns, KellyRecommendation};
pub use sizing::{position_size, PositionSize};
pub use stops::{atr_stop_target, trailing_stop, StopMethod, StopTarget, TrailingStop};
pub use var::{historical_var, monte_carlo_var, parametric_var, VarEstimate};
