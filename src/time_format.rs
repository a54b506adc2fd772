use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// Formats an instant in its own offset using a small pattern language.
///
/// Recognised tokens:
/// - `MMM` short month name (`Apr`), `MM` zero-padded month number
/// - `dd` zero-padded day, `d` day without padding
/// - `yyyy` full year, `yy` two-digit year
/// - `h` 12-hour clock hour, `mm` zero-padded minutes, `aa` `AM`/`PM`
///
/// Anything else is copied through unchanged.
///
/// Examples:
/// - `MMM d, yyyy` -> `Apr 16, 2025`
/// - `MMM d` -> `Apr 16`
/// - `h:mm aa` -> `2:30 PM`
/// - `yyyy-MM-dd` -> `2025-04-16`
pub fn format_pattern<Tz: TimeZone>(instant: &DateTime<Tz>, pattern: &str) -> String {
    format_naive(&instant.naive_local(), pattern)
}

/// Same as [`format_pattern`] for a bare calendar date (time is midnight).
pub fn format_date(date: NaiveDate, pattern: &str) -> String {
    format_naive(&date.and_time(NaiveTime::MIN), pattern)
}

fn format_naive(datetime: &NaiveDateTime, pattern: &str) -> String {
    datetime.format(&to_strftime(pattern)).to_string()
}

fn to_strftime(pattern: &str) -> String {
    const TOKENS: [(&str, &str); 9] = [
        ("MMM", "%b"),
        ("MM", "%m"),
        ("yyyy", "%Y"),
        ("yy", "%y"),
        ("dd", "%d"),
        ("d", "%-d"),
        ("h", "%-I"),
        ("mm", "%M"),
        ("aa", "%p"),
    ];

    let mut spec = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;
    'outer: while let Some(c) = rest.chars().next() {
        // Longest tokens come first in the table
        for (token, replacement) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                spec.push_str(replacement);
                rest = tail;
                continue 'outer;
            }
        }
        if c == '%' {
            spec.push_str("%%");
        } else {
            spec.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    spec
}

/// Formats how long ago `date` was, seen from `base`
///
/// Examples:
/// - under a minute (or in the future): "just now"
/// - "1 minute ago", "5 minutes ago"
/// - "3 hours ago"
/// - "2 days ago" (up to 29 days)
/// - "1 month ago" (30-day months, up to 11)
/// - "2 years ago"
pub fn format_relative<Tz: TimeZone>(date: &DateTime<Tz>, base: &DateTime<Tz>) -> String {
    let seconds = base.clone().signed_duration_since(date.clone()).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return plural_ago(minutes, "minute");
    }

    let hours = minutes / 60;
    if hours < 24 {
        return plural_ago(hours, "hour");
    }

    let days = hours / 24;
    if days < 30 {
        return plural_ago(days, "day");
    }

    let months = days / 30;
    if months < 12 {
        return plural_ago(months, "month");
    }

    plural_ago(months / 12, "year")
}

fn plural_ago(amount: i64, unit: &str) -> String {
    format!("{} {}{} ago", amount, unit, if amount == 1 { "" } else { "s" })
}
