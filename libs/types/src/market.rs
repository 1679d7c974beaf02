//! Price series and market-structure event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bar aggregation interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    M1,
    M5,
    M15,
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    /// Interval length in seconds.
    pub fn seconds(&self) -> i64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M5 => 300,
            Timeframe::M15 => 900,
            Timeframe::H1 => 3_600,
            Timeframe::H4 => 14_400,
            Timeframe::D1 => 86_400,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single OHLCV candle. Bars are read from storage ordered ascending by
/// timestamp and are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timeframe: Timeframe,
}

impl PriceBar {
    /// Full bar range, high to low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Direction of a fair-value gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapDirection {
    Bullish,
    Bearish,
}

/// Significance bucket for a detected gap, by percent size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Low,
    Medium,
    High,
}

/// A price range left untouched by three consecutive candles, interpreted
/// as a likely future reversion target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairValueGap {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub direction: GapDirection,
    pub gap_top: f64,
    pub gap_bottom: f64,
    pub gap_size_abs: f64,
    pub gap_size_pct: f64,
    /// Flips true once a later bar's range fully covers the gap. Maintained
    /// by the consumer that tracks gap lifecycles; filled gaps are excluded
    /// from open-gap queries.
    pub filled: bool,
    pub significance: Significance,
    pub created_at: DateTime<Utc>,
}

/// Direction of a market-structure shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftKind {
    BullishToBearish,
    BearishToBullish,
}

/// A break of a prior swing high/low interpreted as a trend reversal.
/// One active trend state exists per (symbol, timeframe); a shift event
/// transitions it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureShift {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub kind: ShiftKind,
    pub break_level: f64,
    pub prior_swing_high: f64,
    pub prior_swing_low: f64,
    pub strength: String,
    /// Reserved for a downstream confirmation workflow. Always false at
    /// creation; no producer sets it.
    pub confirmed: bool,
    pub timestamp: DateTime<Utc>,
}

/// Pull strength of a liquidity void, by the size of the move that left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagnetStrength {
    Weak,
    Medium,
    Strong,
}

/// A price range covered with abnormally low volume, interpreted as having
/// unresolved buy/sell interest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityVoid {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub void_top: f64,
    pub void_bottom: f64,
    pub size_abs: f64,
    pub volume_at_event: f64,
    pub price_velocity_pct: f64,
    pub magnet_strength: MagnetStrength,
    pub revisited: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_round_trip() {
        let json = serde_json::to_string(&Timeframe::H4).unwrap();
        assert_eq!(json, "\"h4\"");
        let parsed: Timeframe = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Timeframe::H4);
    }

    #[test]
    fn significance_ordering() {
        assert!(Significance::High > Significance::Medium);
        assert!(Significance::Medium > Significance::Low);
    }

    #[test]
    fn price_bar_range() {
        let bar = PriceBar {
            timestamp: Utc::now(),
            open: 100.0,
            high: 103.0,
            low: 99.0,
            close: 102.0,
            volume: 1_000.0,
            timeframe: Timeframe::D1,
        };
        assert!((bar.range() - 4.0).abs() < 1e-12);
    }
}
