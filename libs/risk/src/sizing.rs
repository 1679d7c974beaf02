//! Risk-budget position sizing.

use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};

/// Position value may not exceed this fraction of the account.
const MAX_POSITION_PCT: f64 = 0.20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    pub shares: u64,
    pub risk_amount: f64,
    pub per_share_risk: f64,
    pub position_value: f64,
    /// True when the 20%-of-account cap reduced the share count.
    pub capped: bool,
}

/// Shares to buy so that a stop-out loses at most `risk_pct` of the account,
/// with the position value capped at 20% of the account.
///
/// Zero or negative risk per share (entry equal to stop) is an explicit
/// invalid-input condition; it would otherwise divide the risk budget by
/// zero and report an unbounded position.
pub fn position_size(account_size: f64, risk_pct: f64, entry: f64, stop: f64) -> Result<PositionSize> {
    if account_size <= 0.0 {
        return Err(RiskError::invalid_input("account size must be positive"));
    }
    if !(0.0..=1.0).contains(&risk_pct) {
        return Err(RiskError::invalid_input("risk percent must be in [0, 1]"));
    }
    if entry <= 0.0 {
        return Err(RiskError::invalid_input("entry price must be positive"));
    }

    let per_share_risk = (entry - stop).abs();
    if per_share_risk <= 0.0 {
        return Err(RiskError::invalid_input(
            "risk per share is zero: entry and stop coincide",
        ));
    }

    let risk_amount = account_size * risk_pct;
    let mut shares = (risk_amount / per_share_risk).floor() as u64;

    let max_position_value = account_size * MAX_POSITION_PCT;
    let mut capped = false;
    if shares as f64 * entry > max_position_value {
        shares = (max_position_value / entry).floor() as u64;
        capped = true;
    }

    Ok(PositionSize {
        shares,
        risk_amount,
        per_share_risk,
        position_value: shares as f64 * entry,
        capped,
    })
}
