use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Zone in which order email timestamps and date bounds are interpreted.
pub const ORDER_TIME_ZONE: Tz = chrono_tz::Asia::Tokyo;

/// Layout of the start/end dates in configuration.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// Calendar range of days to collect. `start` is inclusive; `end` is the
/// exclusive midnight boundary ("before" semantics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Parse `YYYY/MM/DD` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = NaiveDate::parse_from_str(start.trim(), DATE_FORMAT)
            .with_context(|| format!("Invalid start date '{}', expected YYYY/MM/DD", start))?;
        let end = NaiveDate::parse_from_str(end.trim(), DATE_FORMAT)
            .with_context(|| format!("Invalid end date '{}', expected YYYY/MM/DD", end))?;

        if end < start {
            anyhow::bail!("End date {} is before start date {}", end, start);
        }

        Ok(DateRange { start, end })
    }

    /// The previous Tokyo calendar day relative to `now`.
    pub fn previous_day(now: DateTime<Utc>) -> Self {
        let today = now.with_timezone(&ORDER_TIME_ZONE).date_naive();
        DateRange {
            start: today - Duration::days(1),
            end: today,
        }
    }

    /// Unix timestamps of the start-of-day of `start` and `end` in Tokyo time.
    pub fn unix_bounds(&self) -> Result<(i64, i64)> {
        Ok((start_of_day(self.start)?, start_of_day(self.end)?))
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.start.format(DATE_FORMAT), self.end.format(DATE_FORMAT))
    }
}

fn start_of_day(date: NaiveDate) -> Result<i64> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("No midnight for {}", date))?;

    let local = ORDER_TIME_ZONE
        .from_local_datetime(&midnight)
        .earliest()
        .with_context(|| format!("Midnight of {} does not exist in {}", date, ORDER_TIME_ZONE))?;

    Ok(local.timestamp())
}
