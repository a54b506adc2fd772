use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TestResult {
    Positive,
    Negative,
}

impl TestResult {
    pub fn as_str(&self) -> &str {
        match self {
            TestResult::Positive => "Positive",
            TestResult::Negative => "Negative",
        }
    }

    pub fn from(s: &str) -> Option<Self> {
        match s {
            "Positive" => Some(TestResult::Positive),
            "Negative" => Some(TestResult::Negative),
            _ => None,
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, TestResult::Positive)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }

    pub fn from(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Role::Member),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// A single self-reported test result.
///
/// `timestamp` is `None` when the stored value could not be parsed; such
/// records still count towards totals but never towards date buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub id: i64,
    pub subject_id: i64,
    pub timestamp: Option<DateTime<Utc>>,
    pub result: TestResult,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subject {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Subject {
    pub fn display_name(&self) -> String {
        display_name(
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            &self.email,
        )
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// "First Last", or the email when no name parts are known
pub fn display_name(first_name: Option<&str>, last_name: Option<&str>, email: &str) -> String {
    let name = format!(
        "{} {}",
        first_name.unwrap_or(""),
        last_name.unwrap_or("")
    );
    let name = name.trim();
    if name.is_empty() {
        email.to_string()
    } else {
        name.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSubject {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
}

/// Row of the admin report: a submission joined with who sent it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub submission: Submission,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(first: Option<&str>, last: Option<&str>) -> Subject {
        Subject {
            id: 1,
            email: "student@phuket.psu.ac.th".to_string(),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            role: Role::Member,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_result_round_trips_through_str() {
        assert_eq!(TestResult::from("Positive"), Some(TestResult::Positive));
        assert_eq!(TestResult::from("Negative"), Some(TestResult::Negative));
        assert_eq!(TestResult::Negative.as_str(), "Negative");
    }

    #[test]
    fn test_result_rejects_other_casing() {
        assert_eq!(TestResult::from("positive"), None);
        assert_eq!(TestResult::from(""), None);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from("admin"), Some(Role::Admin));
        assert_eq!(Role::from("member"), Some(Role::Member));
        assert_eq!(Role::from("org:admin"), None);
    }

    #[test]
    fn test_display_name_full() {
        assert_eq!(subject(Some("Emily"), Some("Parker")).display_name(), "Emily Parker");
    }

    #[test]
    fn test_display_name_partial() {
        assert_eq!(subject(Some("Emily"), None).display_name(), "Emily");
        assert_eq!(subject(None, Some("Parker")).display_name(), "Parker");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(subject(None, None).display_name(), "student@phuket.psu.ac.th");
        assert_eq!(
            subject(Some(" "), Some("")).display_name(),
            "student@phuket.psu.ac.th"
        );
    }
}
