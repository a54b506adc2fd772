//! Submission analytics: pure functions of a submission list and an explicit
//! `now`. Nothing in here performs I/O or reads the clock.

pub mod calendar;
pub mod counters;
pub mod streak;
pub mod trend;

use crate::submission::Submission;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

pub use calendar::{Calendar, MAX_WINDOW_DAYS};
pub use counters::{AggregateCounts, PeriodCounts, missed_submissions, positive_rate};
pub use streak::{current_streak, missing_days};
pub use trend::{
    DEFAULT_TREND_WINDOW_DAYS, Distribution, TrendPoint, compute_distribution, compute_trend,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedStats {
    pub total_count: u64,
    pub positive_count: u64,
    pub positive_rate: f64,
    pub last_submission: Option<DateTime<Utc>>,
    pub streak_days: u32,
    /// Present only when an expected count was supplied
    pub missed_submissions: Option<i64>,
    pub period_counts: PeriodCounts,
}

/// Analytics facade bound to one calendar reference frame
#[derive(Debug, Clone, Copy, Default)]
pub struct Analytics {
    calendar: Calendar,
}

impl Analytics {
    pub fn new(calendar: Calendar) -> Self {
        Analytics { calendar }
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn compute_stats(
        &self,
        submissions: &[Submission],
        now: DateTime<Utc>,
        expected_period_count: Option<i64>,
    ) -> DerivedStats {
        let counts = AggregateCounts::from_submissions(submissions);

        DerivedStats {
            total_count: counts.total,
            positive_count: counts.positive,
            positive_rate: counts.positive_rate(),
            last_submission: submissions.iter().filter_map(|s| s.timestamp).max(),
            streak_days: current_streak(&self.calendar, timestamps(submissions)),
            missed_submissions: expected_period_count
                .map(|expected| missed_submissions(expected, counts.total)),
            period_counts: PeriodCounts::compute(&self.calendar, submissions, now),
        }
    }

    pub fn compute_trend(
        &self,
        submissions: &[Submission],
        now: DateTime<Utc>,
        window_days: usize,
    ) -> Vec<TrendPoint> {
        compute_trend(&self.calendar, submissions, now, window_days)
    }

    pub fn compute_distribution(&self, submissions: &[Submission]) -> Distribution {
        compute_distribution(submissions)
    }

    pub fn missing_days(
        &self,
        submissions: &[Submission],
        now: DateTime<Utc>,
        window_days: usize,
    ) -> Vec<NaiveDate> {
        missing_days(&self.calendar, timestamps(submissions), now, window_days)
    }
}

fn timestamps(submissions: &[Submission]) -> impl Iterator<Item = DateTime<Utc>> + '_ {
    submissions.iter().filter_map(|s| s.timestamp)
}
