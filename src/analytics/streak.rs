use super::calendar::Calendar;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;

/// Distinct local days on which anything was submitted, oldest first.
pub fn submission_days<I>(calendar: &Calendar, timestamps: I) -> BTreeSet<NaiveDate>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    timestamps
        .into_iter()
        .map(|timestamp| calendar.day_of(timestamp))
        .collect()
}

/// Number of consecutive days, counting back from the most recent
/// submission day, that each have at least one submission.
///
/// Input order does not matter and same-day duplicates count once. This is
/// the current run only, not the longest one in history. Returns 0 when
/// there are no timestamps.
pub fn current_streak<I>(calendar: &Calendar, timestamps: I) -> u32
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let days = submission_days(calendar, timestamps);
    let mut newest_first = days.into_iter().rev();

    let Some(mut previous) = newest_first.next() else {
        return 0;
    };

    let mut streak = 1;
    for day in newest_first {
        if previous.signed_duration_since(day).num_days() == 1 {
            streak += 1;
            previous = day;
        } else {
            break;
        }
    }
    streak
}

/// Days within the trailing `window_days` (ending today) without a single
/// submission, most recent first.
///
/// Example: with submissions on the 10th, 8th and 5th and `now` on the
/// 10th, a 6-day window yields `[9th, 7th, 6th]`.
pub fn missing_days<I>(
    calendar: &Calendar,
    timestamps: I,
    now: DateTime<Utc>,
    window_days: usize,
) -> Vec<NaiveDate>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let reported = submission_days(calendar, timestamps);
    calendar
        .last_n_days(now, window_days)
        .into_iter()
        .rev()
        .filter(|day| !reported.contains(day))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn at(d: u32, hh: u32) -> DateTime<Utc> {
        day(d).and_hms_opt(hh, 0, 0).unwrap().and_utc()
    }

    #[test]
    fn test_streak_no_submissions() {
        assert_eq!(current_streak(&Calendar::utc(), Vec::new()), 0);
    }

    #[test]
    fn test_streak_single_day() {
        assert_eq!(current_streak(&Calendar::utc(), vec![at(15, 9)]), 1);
    }

    #[test]
    fn test_streak_three_consecutive_days() {
        let timestamps = vec![at(15, 9), at(14, 18), at(13, 7)];
        assert_eq!(current_streak(&Calendar::utc(), timestamps), 3);
    }

    #[test]
    fn test_streak_stops_at_gap() {
        let timestamps = vec![at(15, 9), at(13, 9)];
        assert_eq!(current_streak(&Calendar::utc(), timestamps), 1);
    }

    #[test]
    fn test_streak_same_day_counts_once() {
        let timestamps = vec![at(15, 9), at(15, 21)];
        assert_eq!(current_streak(&Calendar::utc(), timestamps), 1);
    }

    #[test]
    fn test_streak_ignores_older_runs() {
        // Current run is 2 days even though an older run is 4 days long
        let timestamps = vec![
            at(20, 9),
            at(19, 9),
            at(15, 9),
            at(14, 9),
            at(13, 9),
            at(12, 9),
        ];
        assert_eq!(current_streak(&Calendar::utc(), timestamps), 2);
    }

    #[test]
    fn test_streak_sorts_unordered_input() {
        let timestamps = vec![at(13, 9), at(15, 9), at(14, 9), at(15, 10)];
        assert_eq!(current_streak(&Calendar::utc(), timestamps), 3);
    }

    #[test]
    fn test_streak_spans_month_boundary() {
        let feb_first = NaiveDate::from_ymd_opt(2025, 2, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            .and_utc();
        let timestamps = vec![feb_first, at(31, 8), at(30, 8)];
        assert_eq!(current_streak(&Calendar::utc(), timestamps), 3);
    }

    #[test]
    fn test_streak_depends_on_calendar_offset() {
        // 20:00 UTC on the 14th is the morning of the 15th at UTC+7,
        // which collapses onto the same local day as 09:00 UTC on the 15th
        let timestamps = vec![at(15, 9), at(14, 20)];
        assert_eq!(current_streak(&Calendar::utc(), timestamps.clone()), 2);
        let bangkok = Calendar::with_offset_hours(7).unwrap();
        assert_eq!(current_streak(&bangkok, timestamps), 1);
    }

    #[test]
    fn test_streak_is_idempotent() {
        let timestamps = vec![at(15, 9), at(14, 9), at(12, 9)];
        let calendar = Calendar::utc();
        assert_eq!(
            current_streak(&calendar, timestamps.clone()),
            current_streak(&calendar, timestamps)
        );
    }

    #[test]
    fn test_submission_days_deduplicates() {
        let days = submission_days(&Calendar::utc(), vec![at(15, 9), at(15, 10), at(14, 9)]);
        assert_eq!(days.into_iter().collect::<Vec<_>>(), vec![day(14), day(15)]);
    }

    #[test]
    fn test_missing_days_empty_history() {
        let missing = missing_days(&Calendar::utc(), Vec::new(), at(15, 12), 10);
        assert_eq!(missing.len(), 10);
        assert_eq!(missing[0], day(15));
        assert_eq!(missing[9], day(6));
    }

    #[test]
    fn test_missing_days_with_submissions() {
        let timestamps = vec![at(10, 9), at(8, 9), at(5, 9)];
        let missing = missing_days(&Calendar::utc(), timestamps, at(10, 12), 6);
        assert_eq!(missing, vec![day(9), day(7), day(6)]);
    }

    #[test]
    fn test_missing_days_ignores_submissions_outside_window() {
        let old = at(15, 12) - Duration::days(30);
        let missing = missing_days(&Calendar::utc(), vec![old], at(15, 12), 3);
        assert_eq!(missing, vec![day(15), day(14), day(13)]);
    }
}
