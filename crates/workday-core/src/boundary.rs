use crate::config::{DEFAULT_DAY_START_HOUR, WorkdayConfig};
use crate::error::{ConvertError, ConvertResult};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Resolves instants to the workday they belong to.
///
/// A workday keyed by date `D` opens at `D` + day start (local wall clock) and
/// closes when workday `D + 1` opens, so DST transitions yield 23 or 25 hour
/// workdays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkdayBoundary {
    timezone: Tz,
    day_start: NaiveTime,
}

impl WorkdayBoundary {
    pub fn new(timezone: Tz, day_start_hour: u32) -> ConvertResult<Self> {
        let day_start = NaiveTime::from_hms_opt(day_start_hour, 0, 0).ok_or_else(|| {
            ConvertError::InvalidConfig(format!(
                "day start hour must be between 0 and 23 (got {day_start_hour})"
            ))
        })?;
        Ok(Self {
            timezone,
            day_start,
        })
    }

    pub fn from_config(config: &WorkdayConfig) -> ConvertResult<Self> {
        Self::new(config.timezone()?, config.day_start_hour)
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn day_start(&self) -> NaiveTime {
        self.day_start
    }

    /// Local times before the day start belong to the previous calendar date.
    pub fn workday_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        let local = instant.with_timezone(&self.timezone).naive_local();
        if local.time() < self.day_start {
            local.date().pred_opt().unwrap_or(local.date())
        } else {
            local.date()
        }
    }

    pub fn opening(&self, workday: NaiveDate) -> DateTime<Utc> {
        resolve_local(self.timezone, workday.and_time(self.day_start))
    }

    /// Exclusive end of `workday`.
    pub fn closing(&self, workday: NaiveDate) -> DateTime<Utc> {
        let next = workday.succ_opt().unwrap_or(workday);
        self.opening(next)
    }

    pub fn window(&self, workday: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.opening(workday), self.closing(workday))
    }

    pub fn contains(&self, workday: NaiveDate, instant: DateTime<Utc>) -> bool {
        let (open, close) = self.window(workday);
        open <= instant && instant < close
    }
}

/// Workday anchor date of `instant` under the default 06:00 boundary.
pub fn workday_anchor_of(instant: DateTime<Utc>, timezone: Tz) -> NaiveDate {
    let local = instant.with_timezone(&timezone).naive_local();
    let cutoff = NaiveTime::from_hms_opt(DEFAULT_DAY_START_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
    if local.time() < cutoff {
        local.date().pred_opt().unwrap_or(local.date())
    } else {
        local.date()
    }
}

const GAP_LOOKBACK_HOURS: i64 = 3;

/// Maps a local wall-clock time to an instant.
///
/// Ambiguous times take the earliest instant. Times inside a DST gap keep the
/// offset in force before the gap, which lands them after it.
pub fn resolve_local(timezone: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    if let Some(instant) = timezone.from_local_datetime(&local).earliest() {
        return instant.with_timezone(&Utc);
    }
    let before_gap = local - Duration::hours(GAP_LOOKBACK_HOURS);
    match timezone.offset_from_local_datetime(&before_gap).earliest() {
        Some(offset) => {
            let shift = Duration::seconds(i64::from(offset.fix().local_minus_utc()));
            (local - shift).and_utc()
        }
        None => local.and_utc(),
    }
}
