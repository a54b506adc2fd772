use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};

/// Source of "now" for everything that stamps or windows submissions.
///
/// Analytics never read the clock themselves; the database facade asks its
/// provider once and threads the instant through.
pub trait DateProvider: Send + Sync {
    fn get_current_time(&self) -> DateTime<Utc>;
}

/// Wall clock.
pub struct SystemDateProvider;

impl DateProvider for SystemDateProvider {
    fn get_current_time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Pins the calendar date while keeping the wall-clock time of day, so
/// successive runs on the same override still move forward in time.
pub struct OverrideDateProvider {
    override_date: NaiveDate,
}

impl OverrideDateProvider {
    pub fn new(override_date: NaiveDate) -> Self {
        Self { override_date }
    }
}

impl DateProvider for OverrideDateProvider {
    fn get_current_time(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let time_of_day = NaiveTime::from_hms_milli_opt(
            now.hour(),
            now.minute(),
            now.second(),
            now.timestamp_subsec_millis().min(999),
        )
        .unwrap_or(NaiveTime::MIN);
        self.override_date.and_time(time_of_day).and_utc()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedDateProvider {
    instant: DateTime<Utc>,
}

impl FixedDateProvider {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }
}

impl DateProvider for FixedDateProvider {
    fn get_current_time(&self) -> DateTime<Utc> {
        self.instant
    }
}
