use super::calendar::Calendar;
use crate::submission::{Submission, TestResult};
use crate::time_format::format_date;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_TREND_WINDOW_DAYS: usize = 7;

/// Chart label format for trend buckets, e.g. `Apr 16`.
const TREND_LABEL_PATTERN: &str = "MMM d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub day: NaiveDate,
    pub label: String,
    pub positive_count: u64,
    pub negative_count: u64,
    pub total_count: u64,
}

impl TrendPoint {
    fn empty(day: NaiveDate) -> Self {
        TrendPoint {
            day,
            label: format_date(day, TREND_LABEL_PATTERN),
            positive_count: 0,
            negative_count: 0,
            total_count: 0,
        }
    }

    fn record(&mut self, result: TestResult) {
        self.total_count += 1;
        match result {
            TestResult::Positive => self.positive_count += 1,
            TestResult::Negative => self.negative_count += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Distribution {
    pub positive_count: u64,
    pub negative_count: u64,
}

/// One point per day for the trailing `window_days`, oldest first.
///
/// Submissions outside the window, or without a readable timestamp, are
/// skipped silently.
pub fn compute_trend(
    calendar: &Calendar,
    submissions: &[Submission],
    now: DateTime<Utc>,
    window_days: usize,
) -> Vec<TrendPoint> {
    let days = calendar.last_n_days(now, window_days);
    let bucket_index: HashMap<NaiveDate, usize> = days
        .iter()
        .enumerate()
        .map(|(index, day)| (*day, index))
        .collect();
    let mut points: Vec<TrendPoint> = days.into_iter().map(TrendPoint::empty).collect();

    for submission in submissions {
        let Some(timestamp) = submission.timestamp else {
            continue;
        };
        if let Some(&index) = bucket_index.get(&calendar.day_of(timestamp)) {
            points[index].record(submission.result);
        }
    }
    points
}

/// Positive vs negative across the whole set, not windowed.
pub fn compute_distribution(submissions: &[Submission]) -> Distribution {
    submissions
        .iter()
        .fold(Distribution::default(), |mut distribution, submission| {
            match submission.result {
                TestResult::Positive => distribution.positive_count += 1,
                TestResult::Negative => distribution.negative_count += 1,
            }
            distribution
        })
}
