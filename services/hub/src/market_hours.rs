//! Market session bucketing.
//!
//! Weekend days are closed; weekdays bucket the exchange-local minute of
//! day into pre-market, regular, and after-hours ranges.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

const PRE_MARKET_START_MIN: u32 = 4 * 60;
const OPEN_MIN: u32 = 9 * 60 + 30;
const CLOSE_MIN: u32 = 16 * 60;
const AFTER_HOURS_END_MIN: u32 = 20 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSession {
    PreMarket,
    Open,
    AfterHours,
    Closed,
}

impl MarketSession {
    /// The generation loop treats everything except `Closed` as tradeable.
    pub fn is_closed(&self) -> bool {
        *self == MarketSession::Closed
    }
}

/// Session for a UTC instant, shifted into exchange-local time by
/// `utc_offset_minutes`.
pub fn session_at(now: DateTime<Utc>, utc_offset_minutes: i32) -> MarketSession {
    let local = now + Duration::minutes(utc_offset_minutes as i64);
    session_for(local.weekday(), local.hour() * 60 + local.minute())
}

/// Session for an exchange-local weekday and minute of day.
pub fn session_for(weekday: Weekday, minute_of_day: u32) -> MarketSession {
    if weekday == Weekday::Sat || weekday == Weekday::Sun {
        return MarketSession::Closed;
    }

    match minute_of_day {
        m if (PRE_MARKET_START_MIN..OPEN_MIN).contains(&m) => MarketSession::PreMarket,
        m if (OPEN_MIN..CLOSE_MIN).contains(&m) => MarketSession::Open,
        m if (CLOSE_MIN..AFTER_HOURS_END_MIN).contains(&m) => MarketSession::AfterHours,
        _ => MarketSession::Closed,
    }
}
