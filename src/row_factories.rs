use crate::database::parse_timestamp;
use crate::submission::{ReportEntry, Role, Subject, Submission, TestResult, display_name};
use log::warn;
use rusqlite::Row;

/// Factory for creating Subject objects from database rows
pub struct SubjectRowFactory;

impl SubjectRowFactory {
    /// Expected columns: id, email, first_name, last_name, role, created_at
    pub fn from_row(row: &Row) -> rusqlite::Result<Subject> {
        let id: i64 = row.get(0)?;
        let role: String = row.get(4)?;
        let created_at: String = row.get(5)?;

        Ok(Subject {
            id,
            email: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            role: Role::from(&role).unwrap_or_else(|| {
                warn!("Subject {} has unknown role '{}', treating as member", id, role);
                Role::Member
            }),
            created_at: parse_timestamp(&created_at).unwrap_or_else(|| {
                warn!("Subject {} has unreadable created_at '{}'", id, created_at);
                Default::default()
            }),
        })
    }
}

/// Factory for creating Submission objects from database rows
pub struct SubmissionRowFactory;

impl SubmissionRowFactory {
    /// Expected columns: id, subject_id, result, image_url, created_at
    ///
    /// A row with an unknown result yields `None`; a row with an unreadable
    /// timestamp is kept with `timestamp: None`.
    pub fn from_row(row: &Row) -> rusqlite::Result<Option<Submission>> {
        let id: i64 = row.get(0)?;
        let result: String = row.get(2)?;
        let created_at: Option<String> = row.get(4)?;

        let Some(result) = TestResult::from(&result) else {
            warn!("Skipping submission {} with unknown result '{}'", id, result);
            return Ok(None);
        };

        let timestamp = created_at.as_deref().and_then(parse_timestamp);
        if timestamp.is_none() {
            warn!(
                "Submission {} has unreadable timestamp {:?}; excluded from date statistics",
                id, created_at
            );
        }

        Ok(Some(Submission {
            id,
            subject_id: row.get(1)?,
            timestamp,
            result,
            image_url: row.get(3)?,
        }))
    }
}

/// Factory for admin report rows
pub struct ReportEntryRowFactory;

impl ReportEntryRowFactory {
    /// Expected columns: the five submission columns, then
    ///                   email, first_name, last_name
    pub fn from_row(row: &Row) -> rusqlite::Result<Option<ReportEntry>> {
        let Some(submission) = SubmissionRowFactory::from_row(row)? else {
            return Ok(None);
        };

        let email: String = row.get(5)?;
        let first_name: Option<String> = row.get(6)?;
        let last_name: Option<String> = row.get(7)?;

        Ok(Some(ReportEntry {
            submission,
            name: display_name(first_name.as_deref(), last_name.as_deref(), &email),
            email,
        }))
    }
}
