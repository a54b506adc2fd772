pub mod connection;
pub mod subjects;
pub mod submissions;

use crate::analytics::{Analytics, Calendar, DerivedStats, TrendPoint};
use crate::date_provider::{DateProvider, SystemDateProvider};
use crate::submission::{NewSubject, ReportEntry, Subject, Submission, TestResult};
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use log::debug;
use rusqlite::{Connection, Result};
use std::sync::Arc;

pub use subjects::SubjectsRepository;
pub use submissions::SubmissionsRepository;

/// Fixed-width RFC 3339 so that text order in SQLite equals time order
pub fn to_db_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Main Database struct providing access to all repositories
pub struct Database {
    pub conn: Connection,
    date_provider: Arc<dyn DateProvider>,
    analytics: Analytics,
}

impl Database {
    pub fn new(db_path: &str) -> Result<Self> {
        Self::init(db_path, Arc::new(SystemDateProvider), Calendar::utc())
    }

    pub fn with_date_provider(db_path: &str, date_provider: Arc<dyn DateProvider>) -> Result<Self> {
        Self::init(db_path, date_provider, Calendar::utc())
    }

    pub fn with_settings(
        db_path: &str,
        date_provider: Arc<dyn DateProvider>,
        calendar: Calendar,
    ) -> Result<Self> {
        Self::init(db_path, date_provider, calendar)
    }

    fn init(
        db_path: &str,
        date_provider: Arc<dyn DateProvider>,
        calendar: Calendar,
    ) -> Result<Self> {
        let conn = connection::init_connection(db_path)?;
        debug!("Opened database {}", db_path);
        Ok(Database {
            conn,
            date_provider,
            analytics: Analytics::new(calendar),
        })
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        self.date_provider.get_current_time()
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    // ===== Subjects Repository Access =====

    pub fn register_subject(&self, subject: &NewSubject) -> Result<i64> {
        let repo = SubjectsRepository::new(&self.conn, Box::new(|| self.current_time()));
        repo.insert(subject)
    }

    pub fn get_subject(&self, subject_id: i64) -> Result<Option<Subject>> {
        let repo = SubjectsRepository::new(&self.conn, Box::new(|| self.current_time()));
        repo.get(subject_id)
    }

    pub fn find_subject_by_email(&self, email: &str) -> Result<Option<Subject>> {
        let repo = SubjectsRepository::new(&self.conn, Box::new(|| self.current_time()));
        repo.find_by_email(email)
    }

    pub fn count_subjects(&self) -> Result<i64> {
        let repo = SubjectsRepository::new(&self.conn, Box::new(|| self.current_time()));
        repo.count()
    }

    // ===== Submissions Repository Access =====

    /// Stamps the submission with the provider's current time
    pub fn insert_submission(
        &self,
        subject_id: i64,
        result: TestResult,
        image_url: Option<&str>,
    ) -> Result<Submission> {
        self.insert_submission_at(subject_id, result, image_url, self.current_time())
    }

    pub fn insert_submission_at(
        &self,
        subject_id: i64,
        result: TestResult,
        image_url: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Submission> {
        let repo = SubmissionsRepository::new(&self.conn);
        repo.insert(subject_id, result, image_url, created_at)
    }

    /// Latest submission of the subject newer than `now - within`
    pub fn recent_submission(
        &self,
        subject_id: i64,
        within: Duration,
    ) -> Result<Option<Submission>> {
        let repo = SubmissionsRepository::new(&self.conn);
        repo.latest_since(subject_id, self.current_time() - within)
    }

    pub fn submission_history(&self, subject_id: i64) -> Result<Vec<Submission>> {
        let repo = SubmissionsRepository::new(&self.conn);
        repo.for_subject(subject_id)
    }

    pub fn report_entries(&self) -> Result<Vec<ReportEntry>> {
        let repo = SubmissionsRepository::new(&self.conn);
        repo.report_entries()
    }

    pub fn count_submissions(&self) -> Result<i64> {
        let repo = SubmissionsRepository::new(&self.conn);
        repo.count()
    }

    // ===== Analytics Access =====

    pub fn subject_stats(&self, subject_id: i64) -> Result<DerivedStats> {
        let history = self.submission_history(subject_id)?;
        Ok(self
            .analytics
            .compute_stats(&history, self.current_time(), None))
    }

    pub fn subject_trend(&self, subject_id: i64, window_days: usize) -> Result<Vec<TrendPoint>> {
        let history = self.submission_history(subject_id)?;
        Ok(self
            .analytics
            .compute_trend(&history, self.current_time(), window_days))
    }

    pub fn subject_missing_days(
        &self,
        subject_id: i64,
        window_days: usize,
    ) -> Result<Vec<NaiveDate>> {
        let history = self.submission_history(subject_id)?;
        Ok(self
            .analytics
            .missing_days(&history, self.current_time(), window_days))
    }
}
