//! The date interval emissions are computed for.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeframeError {
    #[error("Timeframe must end after it starts ({from} .. {to})")]
    Inverted { from: NaiveDate, to: NaiveDate },
    #[error("Year {0} is out of range")]
    YearOutOfRange(i32),
}

/// A half-open interval `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timeframe {
    from: NaiveDate,
    to: NaiveDate,
}

impl Timeframe {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, TimeframeError> {
        if to <= from {
            return Err(TimeframeError::Inverted { from, to });
        }
        Ok(Self { from, to })
    }

    /// January 1st of `year` up to (excluding) January 1st of the next.
    pub fn year(year: i32) -> Result<Self, TimeframeError> {
        let from = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(TimeframeError::YearOutOfRange(year))?;
        let to = NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or(TimeframeError::YearOutOfRange(year))?;
        Self::new(from, to)
    }

    pub fn current_year() -> Result<Self, TimeframeError> {
        Self::year(Utc::now().year())
    }

    pub fn from(&self) -> NaiveDate { self.from }
    pub fn to(&self) -> NaiveDate { self.to }

    #[inline]
    pub fn includes(&self, date: NaiveDate) -> bool {
        self.from <= date && date < self.to
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

    #[test]
    fn test_year_is_half_open() {
        let tf = Timeframe::year(2010).unwrap();
        assert!(tf.includes(d(2010, 1, 1)));
        assert!(tf.includes(d(2010, 12, 31)));
        assert!(!tf.includes(d(2011, 1, 1)));
        assert!(!tf.includes(d(2009, 12, 31)));
    }

    #[test]
    fn test_rejects_inverted_interval() {
        let err = Timeframe::new(d(2010, 2, 1), d(2010, 1, 1)).unwrap_err();
        assert!(matches!(err, TimeframeError::Inverted { .. }));
        assert!(Timeframe::new(d(2010, 1, 1), d(2010, 1, 1)).is_err());
    }
}
