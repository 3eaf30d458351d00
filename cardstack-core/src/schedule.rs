//! Scheduling value types carried by cards and reviews.
//!
//! These are plain values; computing the next due date is the job of the
//! scheduler that consumes this model.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid due date: {0}")]
    InvalidDue(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),
}

/// When a card is next due.
///
/// A due time at exactly midnight UTC has day precision and is written as a
/// plain date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Due(DateTime<Utc>);

impl Due {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    /// Due at the start of `date`
    pub fn on(date: NaiveDate) -> Self {
        Self(date.and_time(NaiveTime::MIN).and_utc())
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    pub fn is_day_precision(&self) -> bool {
        self.0.time() == NaiveTime::MIN
    }

    /// Returns the due time `interval` later, or `None` on overflow.
    pub fn add(&self, interval: Interval) -> Option<Due> {
        let seconds = i64::try_from(interval.as_secs()).ok()?;
        self.0
            .checked_add_signed(TimeDelta::try_seconds(seconds)?)
            .map(Due)
    }
}

impl fmt::Display for Due {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_day_precision() {
            write!(f, "{}", self.0.format(DATE_FORMAT))
        } else {
            f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        }
    }
}

impl FromStr for Due {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
            return Ok(Self::on(date));
        }
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|_| ScheduleError::InvalidDue(s.to_string()))
    }
}

/// Time between reviews, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval(u64);

impl Interval {
    pub fn seconds(seconds: u64) -> Self {
        Self(seconds)
    }

    pub fn days(days: u64) -> Self {
        Self(days.saturating_mul(SECONDS_PER_DAY))
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Whole days, rounding down
    pub fn as_days(&self) -> u64 {
        self.0 / SECONDS_PER_DAY
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % SECONDS_PER_DAY == 0 {
            write!(f, "{}d", self.0 / SECONDS_PER_DAY)
        } else {
            write!(f, "{}s", self.0)
        }
    }
}

impl FromStr for Interval {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::InvalidInterval(s.to_string());

        let Some(unit) = s.chars().last() else {
            return Err(invalid());
        };
        let multiplier = match unit {
            'd' => SECONDS_PER_DAY,
            'h' => SECONDS_PER_HOUR,
            'm' => SECONDS_PER_MINUTE,
            's' => 1,
            _ => return Err(invalid()),
        };
        let count: u64 = s[..s.len() - 1].parse().map_err(|_| invalid())?;
        count.checked_mul(multiplier).map(Self).ok_or_else(invalid)
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(Due);
string_serde!(Interval);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_due_day_precision() {
        let due = Due::on(NaiveDate::from_ymd_opt(2017, 1, 1).unwrap());
        assert!(due.is_day_precision());
        assert_eq!(due.to_string(), "2017-01-01");
        assert_eq!("2017-01-01".parse::<Due>().unwrap(), due);
    }

    #[test]
    fn test_due_second_precision() {
        let due = Due::at(Utc.with_ymd_and_hms(2017, 1, 1, 12, 30, 5).unwrap());
        assert_eq!(due.to_string(), "2017-01-01T12:30:05Z");
        assert_eq!("2017-01-01T12:30:05Z".parse::<Due>().unwrap(), due);
        assert_eq!("2017-01-01T13:30:05+01:00".parse::<Due>().unwrap(), due);
    }

    #[test]
    fn test_due_invalid() {
        assert!("tomorrow".parse::<Due>().is_err());
        assert!("2017-13-01".parse::<Due>().is_err());
    }

    #[test]
    fn test_due_add_interval() {
        let due = Due::on(NaiveDate::from_ymd_opt(2017, 1, 30).unwrap());
        assert_eq!(due.add(Interval::days(3)).unwrap().to_string(), "2017-02-02");
        assert_eq!(
            due.add(Interval::seconds(90)).unwrap().to_string(),
            "2017-01-30T00:01:30Z"
        );
        assert!(due.add(Interval::seconds(u64::MAX)).is_none());
    }

    #[test]
    fn test_interval_display() {
        assert_eq!(Interval::days(3).to_string(), "3d");
        assert_eq!(Interval::seconds(90).to_string(), "90s");
        assert_eq!(Interval::seconds(0).to_string(), "0d");
    }

    #[test]
    fn test_interval_parse() {
        assert_eq!("3d".parse::<Interval>().unwrap(), Interval::days(3));
        assert_eq!("2h".parse::<Interval>().unwrap(), Interval::seconds(7200));
        assert_eq!("10m".parse::<Interval>().unwrap(), Interval::seconds(600));
        assert_eq!("45s".parse::<Interval>().unwrap(), Interval::seconds(45));
        assert!("".parse::<Interval>().is_err());
        assert!("d".parse::<Interval>().is_err());
        assert!("-3d".parse::<Interval>().is_err());
        assert!("3w".parse::<Interval>().is_err());
        assert!("99999999999999999999d".parse::<Interval>().is_err());
    }

    #[test]
    fn test_serialization() {
        let due = Due::on(NaiveDate::from_ymd_opt(2020, 2, 29).unwrap());
        assert_eq!(serde_json::to_string(&due).unwrap(), "\"2020-02-29\"");
        let interval: Interval = serde_json::from_str("\"4d\"").unwrap();
        assert_eq!(interval.as_days(), 4);
    }
}
