use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Weekly window during which one pick may be saved.
///
/// Moments outside both windows classify as `None` (see [`classify`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawPeriod {
    /// Thursday 00:00 through Saturday 11:59 UTC.
    #[serde(rename = "SORTEO1")]
    PeriodA,
    /// Sunday 00:00 through Wednesday 11:59 UTC.
    #[serde(rename = "SORTEO2")]
    PeriodB,
}

impl DrawPeriod {
    /// Tag stored alongside each saved pick.
    pub fn tag(self) -> &'static str {
        match self {
            DrawPeriod::PeriodA => "SORTEO1",
            DrawPeriod::PeriodB => "SORTEO2",
        }
    }
}

impl fmt::Display for DrawPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPeriodTag(pub String);

impl fmt::Display for UnknownPeriodTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown draw period tag: {}", self.0)
    }
}

impl std::error::Error for UnknownPeriodTag {}

impl FromStr for DrawPeriod {
    type Err = UnknownPeriodTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SORTEO1" => Ok(DrawPeriod::PeriodA),
            "SORTEO2" => Ok(DrawPeriod::PeriodB),
            other => Err(UnknownPeriodTag(other.to_string())),
        }
    }
}

/// Classify a UTC weekday and hour into a draw period.
///
/// Wednesday from 12:00 and Saturday from 12:00 up to midnight belong to
/// no period.
pub fn classify(day: Weekday, hour: u32) -> Option<DrawPeriod> {
    match day {
        Weekday::Thu | Weekday::Fri => Some(DrawPeriod::PeriodA),
        Weekday::Sat if hour < 12 => Some(DrawPeriod::PeriodA),
        Weekday::Sun | Weekday::Mon | Weekday::Tue => Some(DrawPeriod::PeriodB),
        Weekday::Wed if hour < 12 => Some(DrawPeriod::PeriodB),
        _ => None,
    }
}

/// Classify an instant, converting it to UTC first.
pub fn classify_at<Tz: TimeZone>(when: &DateTime<Tz>) -> Option<DrawPeriod> {
    let utc = when.with_timezone(&Utc);
    classify(utc.weekday(), utc.hour())
}
