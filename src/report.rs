//! Admin report: filtering, dashboard figures and file exports.

use crate::analytics::{
    Analytics, Calendar, DEFAULT_TREND_WINDOW_DAYS, DerivedStats, Distribution, PeriodCounts,
    TrendPoint,
};
use crate::error::AtkResult;
use crate::submission::{ReportEntry, Submission, TestResult};
use crate::time_format::format_pattern;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::io;

/// Reports each subject is expected to file in a week across the cohort
pub const DEFAULT_EXPECTED_WEEKLY: i64 = 50;
pub const MAX_REPORT_ROWS: usize = 20;
/// Every stored submission is considered verified
const VERIFIED_STATUS: &str = "Verified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DateRange {
    Today,
    Week,
    Month,
    #[default]
    All,
}

impl DateRange {
    pub fn as_str(&self) -> &str {
        match self {
            DateRange::Today => "today",
            DateRange::Week => "week",
            DateRange::Month => "month",
            DateRange::All => "all",
        }
    }

    pub fn from(s: &str) -> Option<Self> {
        match s {
            "today" => Some(DateRange::Today),
            "week" => Some(DateRange::Week),
            "month" => Some(DateRange::Month),
            "all" => Some(DateRange::All),
            _ => None,
        }
    }

    fn contains(
        &self,
        calendar: &Calendar,
        timestamp: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(ts) = timestamp else {
            return *self == DateRange::All;
        };
        match self {
            DateRange::Today => ts >= calendar.start_of_day(now),
            DateRange::Week => ts >= calendar.start_of_week(now) && ts <= calendar.end_of_week(now),
            DateRange::Month => ts >= calendar.start_of_month(now),
            DateRange::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum StatusFilter {
    #[default]
    All,
    Positive,
    Negative,
}

impl StatusFilter {
    pub fn as_str(&self) -> &str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Positive => "positive",
            StatusFilter::Negative => "negative",
        }
    }

    pub fn from(s: &str) -> Option<Self> {
        match s {
            "all" => Some(StatusFilter::All),
            "positive" => Some(StatusFilter::Positive),
            "negative" => Some(StatusFilter::Negative),
            _ => None,
        }
    }

    fn matches(&self, result: TestResult) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Positive => result == TestResult::Positive,
            StatusFilter::Negative => result == TestResult::Negative,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub range: DateRange,
    /// Case-insensitive substring of name or email; empty matches everything
    pub search: String,
    pub status: StatusFilter,
}

impl ReportFilter {
    pub fn matches(&self, entry: &ReportEntry, calendar: &Calendar, now: DateTime<Utc>) -> bool {
        if !self.range.contains(calendar, entry.submission.timestamp, now) {
            return false;
        }

        let needle = self.search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || entry.name.to_lowercase().contains(&needle)
            || entry.email.to_lowercase().contains(&needle);

        matches_search && self.status.matches(entry.submission.result)
    }

    /// Keeps the input order
    pub fn apply(
        &self,
        entries: &[ReportEntry],
        calendar: &Calendar,
        now: DateTime<Utc>,
    ) -> Vec<ReportEntry> {
        entries
            .iter()
            .filter(|entry| self.matches(entry, calendar, now))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub generated_at: DateTime<Utc>,
    pub week_start: DateTime<Utc>,
    pub week_end: DateTime<Utc>,
    pub period_counts: PeriodCounts,
    /// Stats over this week's submissions against the expected weekly count
    pub weekly: DerivedStats,
    pub trend: Vec<TrendPoint>,
    pub distribution: Distribution,
}

pub fn build_dashboard(
    analytics: &Analytics,
    entries: &[ReportEntry],
    now: DateTime<Utc>,
    expected_weekly: i64,
) -> AdminDashboard {
    let calendar = analytics.calendar();
    let submissions: Vec<Submission> = entries.iter().map(|e| e.submission.clone()).collect();
    let this_week: Vec<Submission> = submissions
        .iter()
        .filter(|s| DateRange::Week.contains(calendar, s.timestamp, now))
        .cloned()
        .collect();

    AdminDashboard {
        generated_at: now,
        week_start: calendar.start_of_week(now),
        week_end: calendar.end_of_week(now),
        period_counts: PeriodCounts::compute(calendar, &submissions, now),
        weekly: analytics.compute_stats(&this_week, now, Some(expected_weekly)),
        trend: analytics.compute_trend(&submissions, now, DEFAULT_TREND_WINDOW_DAYS),
        distribution: analytics.compute_distribution(&submissions),
    }
}

/// `ATK_Reports_2025-04-16.csv` for the day `now` falls on
pub fn export_file_name(calendar: &Calendar, now: DateTime<Utc>, extension: &str) -> String {
    format!(
        "ATK_Reports_{}.{}",
        format_pattern(&calendar.localize(now), "yyyy-MM-dd"),
        extension
    )
}

#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    #[serde(rename = "ID")]
    id: i64,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Email")]
    email: &'a str,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Result")]
    result: &'a str,
    #[serde(rename = "Status")]
    status: &'a str,
}

pub fn write_csv<W: io::Write>(
    writer: W,
    entries: &[ReportEntry],
    calendar: &Calendar,
) -> AtkResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for entry in entries {
        let local = entry.submission.timestamp.map(|ts| calendar.localize(ts));
        wtr.serialize(CsvRecord {
            id: entry.submission.id,
            name: &entry.name,
            email: &entry.email,
            date: local
                .map(|ts| format_pattern(&ts, "yyyy-MM-dd"))
                .unwrap_or_default(),
            time: local.map(|ts| format_pattern(&ts, "h:mm aa")).unwrap_or_default(),
            result: entry.submission.result.as_str(),
            status: VERIFIED_STATUS,
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Printable summary of the week plus the first rows of the filtered report
pub fn build_markdown_report(
    entries: &[ReportEntry],
    weekly: &DerivedStats,
    calendar: &Calendar,
    now: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    let week_start = calendar.localize(calendar.start_of_week(now));
    let week_end = calendar.localize(calendar.end_of_week(now));

    let _ = writeln!(out, "# ATK Reports Dashboard");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} - {}",
        format_pattern(&week_start, "MMM d, yyyy"),
        format_pattern(&week_end, "MMM d, yyyy")
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "## Summary Statistics");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Total Submissions: {}", weekly.total_count);
    let _ = writeln!(
        out,
        "- Positive Tests: {} ({}%)",
        weekly.positive_count, weekly.positive_rate
    );
    let _ = writeln!(out, "- Missed Submissions: {}", weekly.missed_submissions.unwrap_or(0));
    let _ = writeln!(out);
    let _ = writeln!(out, "## Recent Submission Details");
    let _ = writeln!(out);
    let _ = writeln!(out, "| ID | Name | Email | Date | Result | Status |");
    let _ = writeln!(out, "|----|------|-------|------|--------|--------|");

    for entry in entries.iter().take(MAX_REPORT_ROWS) {
        let date = entry
            .submission
            .timestamp
            .map(|ts| format_pattern(&calendar.localize(ts), "yyyy-MM-dd"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} |",
            truncate_with_ellipsis(&entry.submission.id.to_string(), 20),
            escape_cell(&truncate(&entry.name, 25)),
            escape_cell(&truncate(&entry.email, 30)),
            date,
            entry.submission.result.as_str(),
            VERIFIED_STATUS
        );
    }

    out
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

fn truncate_with_ellipsis(value: &str, max_chars: usize) -> String {
    if value.chars().count() > max_chars {
        format!("{}...", truncate(value, max_chars))
    } else {
        value.to_string()
    }
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}
