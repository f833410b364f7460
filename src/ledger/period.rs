use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;

/// A calendar month in fixed-width `"YYYY-MM"` form, the unit of rollover
/// and archival. The fixed width makes plain string ordering equivalent to
/// chronological ordering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct PeriodKey(String);

impl PeriodKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(format!("{:04}-{:02}", date.year(), date.month()))
    }

    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        let valid = raw.len() == 7
            && raw.as_bytes()[4] == b'-'
            && raw[..4].chars().all(|c| c.is_ascii_digit())
            && matches!(raw[5..].parse::<u32>(), Ok(1..=12));
        if !valid {
            return Err(LedgerError::Validation(format!(
                "invalid period key `{}` (expected YYYY-MM)",
                raw
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The four-digit year prefix.
    pub fn year(&self) -> &str {
        &self.0[..4]
    }

    /// Resolves a day of month inside this period, clamped to 1–28 so every
    /// month length is valid.
    pub fn date_on(&self, day_of_month: u32) -> NaiveDate {
        let year: i32 = self.0[..4].parse().unwrap_or(1970);
        let month: u32 = self.0[5..].parse().unwrap_or(1);
        let day = day_of_month.clamp(1, 28);
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch"))
    }
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
