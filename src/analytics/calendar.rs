use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc,
};

/// Longest trailing window any day listing will produce
pub const MAX_WINDOW_DAYS: usize = 366;

/// Maps instants onto calendar days in one fixed reference frame.
///
/// Every cutoff is computed from an explicit `now`; nothing here reads the
/// clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    pub fn utc() -> Self {
        Calendar { offset: Utc.fix() }
    }

    /// `None` when the offset is outside (-24h, +24h)
    pub fn with_offset_hours(hours: i32) -> Option<Self> {
        hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Calendar { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset)
    }

    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.localize(instant).date_naive()
    }

    /// `YYYY-MM-DD` of the local calendar day containing `instant`
    pub fn day_key(&self, instant: DateTime<Utc>) -> String {
        self.day_of(instant).format("%Y-%m-%d").to_string()
    }

    /// The instant at which local `day` begins
    pub fn midnight(&self, day: NaiveDate) -> DateTime<Utc> {
        let offset = Duration::seconds(i64::from(self.offset.local_minus_utc()));
        (day.and_time(NaiveTime::MIN) - offset).and_utc()
    }

    pub fn start_of_day(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.midnight(self.day_of(now))
    }

    /// Weeks start on Sunday
    pub fn start_of_week(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.midnight(self.first_day_of_week(now))
    }

    /// Last millisecond of Saturday
    pub fn end_of_week(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let next_sunday = self.first_day_of_week(now) + Days::new(7);
        self.midnight(next_sunday) - Duration::milliseconds(1)
    }

    pub fn start_of_month(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = self.day_of(now);
        self.midnight(today - Days::new(u64::from(today.day0())))
    }

    /// The trailing `n` calendar days ending today, oldest first.
    ///
    /// `n` is capped at [`MAX_WINDOW_DAYS`] and at the number of days since
    /// `NaiveDate::MIN`, so the result is always contiguous and ends today.
    pub fn last_n_days(&self, now: DateTime<Utc>, n: usize) -> Vec<NaiveDate> {
        let today = self.day_of(now);
        let available = today.signed_duration_since(NaiveDate::MIN).num_days() + 1;
        let n = n
            .min(MAX_WINDOW_DAYS)
            .min(usize::try_from(available).unwrap_or(usize::MAX));
        (0..n as u64)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(back)))
            .collect()
    }

    fn first_day_of_week(&self, now: DateTime<Utc>) -> NaiveDate {
        let today = self.day_of(now);
        today - Days::new(u64::from(today.weekday().num_days_from_sunday()))
    }
}

/// Inclusive lower bound: an instant exactly at `cutoff` is inside.
pub fn is_on_or_after(instant: DateTime<Utc>, cutoff: DateTime<Utc>) -> bool {
    instant >= cutoff
}
