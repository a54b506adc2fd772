use super::calendar::{Calendar, is_on_or_after};
use crate::submission::Submission;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Totals over an arbitrary subset of submissions.
///
/// Counts every record with a valid result, whether or not its timestamp
/// could be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AggregateCounts {
    pub total: u64,
    pub positive: u64,
}

impl AggregateCounts {
    pub fn from_submissions<'a, I>(submissions: I) -> Self
    where
        I: IntoIterator<Item = &'a Submission>,
    {
        submissions
            .into_iter()
            .fold(AggregateCounts::default(), |mut counts, submission| {
                counts.total += 1;
                if submission.result.is_positive() {
                    counts.positive += 1;
                }
                counts
            })
    }

    pub fn negative(&self) -> u64 {
        self.total - self.positive
    }

    pub fn positive_rate(&self) -> f64 {
        positive_rate(self.positive, self.total)
    }
}

/// Percentage of positives rounded to one decimal; 0 for an empty set.
pub fn positive_rate(positive: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percentage = positive as f64 / total as f64 * 100.0;
    (percentage * 10.0).round() / 10.0
}

/// `expected - total`. Not clamped: reporting above target goes negative.
pub fn missed_submissions(expected: i64, total: u64) -> i64 {
    expected - i64::try_from(total).unwrap_or(i64::MAX)
}

/// Submission volume since the start of today, this week and this month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PeriodCounts {
    pub today: u64,
    pub this_week: u64,
    pub this_month: u64,
}

impl PeriodCounts {
    /// Records without a readable timestamp are left out.
    pub fn compute(calendar: &Calendar, submissions: &[Submission], now: DateTime<Utc>) -> Self {
        let start_of_day = calendar.start_of_day(now);
        let start_of_week = calendar.start_of_week(now);
        let start_of_month = calendar.start_of_month(now);

        let mut counts = PeriodCounts::default();
        for timestamp in submissions.iter().filter_map(|s| s.timestamp) {
            if is_on_or_after(timestamp, start_of_day) {
                counts.today += 1;
            }
            if is_on_or_after(timestamp, start_of_week) {
                counts.this_week += 1;
            }
            if is_on_or_after(timestamp, start_of_month) {
                counts.this_month += 1;
            }
        }
        counts
    }
}
