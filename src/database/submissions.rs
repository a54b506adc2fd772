use super::to_db_timestamp;
use crate::row_factories::{ReportEntryRowFactory, SubmissionRowFactory};
use crate::submission::{ReportEntry, Submission, TestResult};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, params};

const SUBMISSION_COLUMNS: &str = "s.id, s.subject_id, s.result, s.image_url, s.created_at";

pub struct SubmissionsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SubmissionsRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        SubmissionsRepository { conn }
    }

    pub fn insert(
        &self,
        subject_id: i64,
        result: TestResult,
        image_url: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Submission> {
        let stored_at = to_db_timestamp(created_at);
        self.conn.execute(
            "INSERT INTO submissions (subject_id, result, image_url, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![subject_id, result.as_str(), image_url, stored_at],
        )?;

        Ok(Submission {
            id: self.conn.last_insert_rowid(),
            subject_id,
            // Read back at storage precision
            timestamp: super::parse_timestamp(&stored_at),
            result,
            image_url: image_url.map(str::to_string),
        })
    }

    pub fn get(&self, submission_id: i64) -> Result<Option<Submission>> {
        let found = self
            .conn
            .query_row(
                &format!("SELECT {} FROM submissions s WHERE s.id = ?1", SUBMISSION_COLUMNS),
                [submission_id],
                SubmissionRowFactory::from_row,
            )
            .optional()?;
        Ok(found.flatten())
    }

    /// Most recent submission of `subject_id` strictly after `cutoff`.
    ///
    /// Compared on parsed instants rather than stored text: rows with an
    /// unreadable timestamp never match, and non-`Z` offsets order correctly.
    /// The returned submission always carries a timestamp.
    pub fn latest_since(
        &self,
        subject_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<Submission>> {
        let latest = self
            .for_subject(subject_id)?
            .into_iter()
            .filter(|s| s.timestamp.is_some_and(|ts| ts > cutoff))
            .max_by_key(|s| (s.timestamp, s.id));
        Ok(latest)
    }

    /// All submissions of one subject, most recent first
    pub fn for_subject(&self, subject_id: i64) -> Result<Vec<Submission>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM submissions s
             WHERE s.subject_id = ?1
             ORDER BY s.created_at DESC, s.id DESC",
            SUBMISSION_COLUMNS
        ))?;
        let rows = stmt.query_map([subject_id], SubmissionRowFactory::from_row)?;

        let mut submissions = Vec::new();
        for row in rows {
            if let Some(submission) = row? {
                submissions.push(submission);
            }
        }
        Ok(submissions)
    }

    /// Every submission joined with its subject, most recent first
    pub fn report_entries(&self) -> Result<Vec<ReportEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, u.email, u.first_name, u.last_name
             FROM submissions s
             INNER JOIN subjects u ON s.subject_id = u.id
             ORDER BY s.created_at DESC, s.id DESC",
            SUBMISSION_COLUMNS
        ))?;
        let rows = stmt.query_map([], ReportEntryRowFactory::from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            if let Some(entry) = row? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM submissions", [], |row| row.get(0))?;
        Ok(count)
    }
}
