use crate::analytics::{DerivedStats, TrendPoint};
use crate::database::Database;
use crate::error::{AtkError, AtkResult};
use crate::image_store::{ImageStore, ImageUpload};
use crate::submission::{NewSubject, Subject, Submission, TestResult};
use chrono::{Duration, NaiveDate};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;
pub const ACCEPTED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/heic"];
/// A subject may report once per this many hours
pub const DUPLICATE_WINDOW_HOURS: i64 = 24;
/// Window used when listing days without a report
pub const MISSING_DAYS_WINDOW: usize = 10;

/// A new report as it arrives, before any checks
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub email: String,
    pub result: String,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub email: String,
    pub result: TestResult,
    pub image: ImageUpload,
}

impl SubmissionRequest {
    pub fn validate(self) -> AtkResult<ValidatedSubmission> {
        let email = self.email.trim().to_string();
        if email.is_empty() {
            return Err(AtkError::Validation("Email is required".to_string()));
        }

        let result = TestResult::from(self.result.trim())
            .ok_or_else(|| AtkError::Validation("Please select a test result".to_string()))?;

        let image = self
            .image
            .ok_or_else(|| AtkError::Validation("Missing file, email or result".to_string()))?;
        if image.bytes.len() > MAX_IMAGE_BYTES {
            return Err(AtkError::Validation("Image must be less than 2MB".to_string()));
        }
        if !ACCEPTED_IMAGE_TYPES.contains(&image.content_type.as_str()) {
            return Err(AtkError::Validation(
                "Only .jpg, .jpeg, .png, and .heic formats are supported".to_string(),
            ));
        }

        Ok(ValidatedSubmission {
            email,
            result,
            image,
        })
    }
}

/// Everything a subject's own dashboard shows
#[derive(Debug, Clone, Serialize)]
pub struct SubjectOverview {
    pub subject: Subject,
    pub stats: DerivedStats,
    pub trend: Vec<TrendPoint>,
    pub missing_days: Vec<NaiveDate>,
}

/// Intake and per-subject queries, decoupled from the CLI
pub struct SubmissionService {
    db: Arc<Database>,
    images: Arc<dyn ImageStore>,
}

impl SubmissionService {
    pub fn new(db: Arc<Database>, images: Arc<dyn ImageStore>) -> Self {
        Self { db, images }
    }

    pub fn register(&self, subject: &NewSubject) -> AtkResult<Subject> {
        if !is_valid_email(&subject.email) {
            return Err(AtkError::Validation("Invalid email address".to_string()));
        }
        let id = self.db.register_subject(subject)?;
        info!("Registered subject {} ({})", id, subject.email.trim());
        self.db
            .get_subject(id)?
            .ok_or_else(|| AtkError::SubjectNotFound(subject.email.clone()))
    }

    /// Validates, enforces one report per 24 hours, stores the photo, then
    /// records the result.
    ///
    /// The recency check and the insert are not atomic; two simultaneous
    /// reports from one subject can both get through.
    pub fn submit(&self, request: SubmissionRequest) -> AtkResult<Submission> {
        let validated = request.validate()?;
        let subject = self.find_subject(&validated.email)?;

        let recent = self
            .db
            .recent_submission(subject.id, Duration::hours(DUPLICATE_WINDOW_HOURS))?;
        if let Some((recent_id, last_submission)) =
            recent.and_then(|r| r.timestamp.map(|ts| (r.id, ts)))
        {
            warn!(
                "Rejected duplicate report from subject {} (previous submission {})",
                subject.id, recent_id
            );
            return Err(AtkError::AlreadyReported { last_submission });
        }

        let uploaded_at = self.db.current_time();
        let image_url = self.images.store(subject.id, uploaded_at, &validated.image)?;
        let submission =
            self.db
                .insert_submission_at(subject.id, validated.result, Some(&image_url), uploaded_at)?;
        info!(
            "Recorded {} result {} for subject {}",
            submission.result.as_str(),
            submission.id,
            subject.id
        );
        Ok(submission)
    }

    /// Most recent first
    pub fn history(&self, email: &str) -> AtkResult<(Subject, Vec<Submission>)> {
        let subject = self.find_subject(email)?;
        let history = self.db.submission_history(subject.id)?;
        Ok((subject, history))
    }

    pub fn overview(&self, email: &str, trend_days: usize) -> AtkResult<SubjectOverview> {
        let subject = self.find_subject(email)?;
        Ok(SubjectOverview {
            stats: self.db.subject_stats(subject.id)?,
            trend: self.db.subject_trend(subject.id, trend_days)?,
            missing_days: self.db.subject_missing_days(subject.id, MISSING_DAYS_WINDOW)?,
            subject,
        })
    }

    /// The admin report is only open to admins
    pub fn require_admin(&self, email: &str) -> AtkResult<Subject> {
        let subject = self.find_subject(email)?;
        if subject.is_admin() {
            Ok(subject)
        } else {
            warn!("Subject {} tried to open the admin report", subject.id);
            Err(AtkError::Forbidden(format!("{} is not an administrator", subject.email)))
        }
    }

    fn find_subject(&self, email: &str) -> AtkResult<Subject> {
        self.db
            .find_subject_by_email(email)?
            .ok_or_else(|| AtkError::SubjectNotFound(email.trim().to_string()))
    }
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_provider::FixedDateProvider;
    use chrono::{DateTime, Utc};
    use std::io;
    use std::sync::Mutex;

    /// Keeps uploads in memory so tests can inspect them
    #[derive(Default)]
    struct RecordingImageStore {
        stored: Mutex<Vec<(i64, String)>>,
    }

    impl ImageStore for RecordingImageStore {
        fn store(
            &self,
            subject_id: i64,
            _uploaded_at: DateTime<Utc>,
            image: &ImageUpload,
        ) -> io::Result<String> {
            let mut stored = self.stored.lock().unwrap();
            stored.push((subject_id, image.file_name.clone()));
            Ok(format!("memory://{}/{}", subject_id, image.file_name))
        }
    }

    fn noon(d: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2025, 4, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn jpeg(size: usize) -> ImageUpload {
        ImageUpload {
            file_name: "kit.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0; size],
        }
    }

    fn request(email: &str, result: &str) -> SubmissionRequest {
        SubmissionRequest {
            email: email.to_string(),
            result: result.to_string(),
            image: Some(jpeg(16)),
        }
    }

    fn service_at(now: DateTime<Utc>) -> (SubmissionService, Arc<RecordingImageStore>) {
        let clock = Arc::new(FixedDateProvider::new(now));
        let db = Arc::new(Database::with_date_provider(":memory:", clock).unwrap());
        let images = Arc::new(RecordingImageStore::default());
        let service = SubmissionService::new(db, images.clone());
        service
            .register(&NewSubject {
                email: "olivia@phuket.psu.ac.th".to_string(),
                first_name: Some("Olivia".to_string()),
                last_name: Some("Wilson".to_string()),
                is_admin: false,
            })
            .unwrap();
        (service, images)
    }

    fn validation_message(result: AtkResult<ValidatedSubmission>) -> String {
        match result {
            Err(AtkError::Validation(message)) => message,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_accepts_good_request() {
        let validated = request(" olivia@phuket.psu.ac.th ", "Positive").validate().unwrap();
        assert_eq!(validated.email, "olivia@phuket.psu.ac.th");
        assert_eq!(validated.result, TestResult::Positive);
    }

    #[test]
    fn test_validate_requires_email() {
        assert_eq!(validation_message(request("  ", "Negative").validate()), "Email is required");
    }

    #[test]
    fn test_validate_requires_known_result() {
        assert_eq!(
            validation_message(request("olivia@phuket.psu.ac.th", "Maybe").validate()),
            "Please select a test result"
        );
    }

    #[test]
    fn test_validate_requires_image() {
        let mut missing = request("olivia@phuket.psu.ac.th", "Negative");
        missing.image = None;
        assert_eq!(validation_message(missing.validate()), "Missing file, email or result");
    }

    #[test]
    fn test_validate_image_size_limit() {
        let mut at_limit = request("olivia@phuket.psu.ac.th", "Negative");
        at_limit.image = Some(jpeg(MAX_IMAGE_BYTES));
        assert!(at_limit.validate().is_ok());

        let mut too_big = request("olivia@phuket.psu.ac.th", "Negative");
        too_big.image = Some(jpeg(MAX_IMAGE_BYTES + 1));
        assert_eq!(validation_message(too_big.validate()), "Image must be less than 2MB");
    }

    #[test]
    fn test_validate_image_type() {
        let mut gif = request("olivia@phuket.psu.ac.th", "Negative");
        gif.image = Some(ImageUpload {
            content_type: "image/gif".to_string(),
            ..jpeg(16)
        });
        assert_eq!(
            validation_message(gif.validate()),
            "Only .jpg, .jpeg, .png, and .heic formats are supported"
        );
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("olivia@phuket.psu.ac.th"));
        assert!(!is_valid_email("olivia"));
        assert!(!is_valid_email("@phuket.psu.ac.th"));
        assert!(!is_valid_email("olivia@localhost"));
        assert!(!is_valid_email("oli via@phuket.psu.ac.th"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn test_register_rejects_invalid_email() {
        let (service, _) = service_at(noon(16));
        let result = service.register(&NewSubject {
            email: "not-an-email".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(AtkError::Validation(_))));
    }

    #[test]
    fn test_submit_records_result_and_image() {
        let (service, images) = service_at(noon(16));
        let submission = service
            .submit(request("olivia@phuket.psu.ac.th", "Negative"))
            .unwrap();

        assert_eq!(submission.result, TestResult::Negative);
        assert_eq!(submission.timestamp, Some(noon(16)));
        assert_eq!(submission.image_url.as_deref(), Some("memory://1/kit.jpg"));
        assert_eq!(images.stored.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_submit_unknown_subject() {
        let (service, images) = service_at(noon(16));
        let result = service.submit(request("nobody@phuket.psu.ac.th", "Negative"));
        assert!(matches!(result, Err(AtkError::SubjectNotFound(_))));
        assert!(images.stored.lock().unwrap().is_empty());
    }

    #[test]
    fn test_submit_twice_within_24_hours_rejected() {
        let (service, images) = service_at(noon(16));
        service
            .submit(request("olivia@phuket.psu.ac.th", "Negative"))
            .unwrap();

        let second = service.submit(request("olivia@phuket.psu.ac.th", "Positive"));
        match second {
            Err(AtkError::AlreadyReported { last_submission }) => {
                assert_eq!(last_submission, noon(16))
            }
            other => panic!("expected AlreadyReported, got {:?}", other),
        }
        // Rejected before the photo was uploaded
        assert_eq!(images.stored.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_submit_allowed_after_24_hours() {
        let (service, _) = service_at(noon(16));
        service
            .db
            .insert_submission_at(1, TestResult::Negative, None, noon(15))
            .unwrap();

        assert!(service
            .submit(request("olivia@phuket.psu.ac.th", "Negative"))
            .is_ok());
    }

    #[test]
    fn test_submit_not_blocked_by_unreadable_timestamp() {
        let (service, _) = service_at(noon(16));
        service
            .db
            .conn
            .execute(
                "INSERT INTO submissions (subject_id, result, created_at)
                 VALUES (1, 'Negative', 'not-a-date')",
                [],
            )
            .unwrap();

        let submission = service
            .submit(request("olivia@phuket.psu.ac.th", "Negative"))
            .unwrap();
        assert_eq!(submission.timestamp, Some(noon(16)));
    }

    #[test]
    fn test_submit_blocked_by_recent_offset_timestamp() {
        let (service, _) = service_at(noon(16));
        // 03:00Z on the 16th
        service
            .db
            .conn
            .execute(
                "INSERT INTO submissions (subject_id, result, created_at)
                 VALUES (1, 'Negative', '2025-04-16T10:00:00.000+07:00')",
                [],
            )
            .unwrap();

        match service.submit(request("olivia@phuket.psu.ac.th", "Positive")) {
            Err(AtkError::AlreadyReported { last_submission }) => {
                assert_eq!(last_submission, noon(16) - Duration::hours(9))
            }
            other => panic!("expected AlreadyReported, got {:?}", other),
        }
    }

    #[test]
    fn test_overview() {
        let (service, _) = service_at(noon(16));
        for day in [14, 15] {
            service
                .db
                .insert_submission_at(1, TestResult::Negative, None, noon(day))
                .unwrap();
        }
        service
            .submit(request("olivia@phuket.psu.ac.th", "Positive"))
            .unwrap();

        let overview = service.overview("olivia@phuket.psu.ac.th", 7).unwrap();
        assert_eq!(overview.subject.display_name(), "Olivia Wilson");
        assert_eq!(overview.stats.total_count, 3);
        assert_eq!(overview.stats.streak_days, 3);
        assert_eq!(overview.stats.positive_rate, 33.3);
        assert_eq!(overview.trend.len(), 7);
        assert_eq!(overview.missing_days.len(), MISSING_DAYS_WINDOW - 3);
    }

    #[test]
    fn test_require_admin() {
        let (service, _) = service_at(noon(16));
        service
            .register(&NewSubject {
                email: "staff@phuket.psu.ac.th".to_string(),
                is_admin: true,
                ..Default::default()
            })
            .unwrap();

        assert!(service.require_admin("staff@phuket.psu.ac.th").is_ok());
        assert!(matches!(
            service.require_admin("olivia@phuket.psu.ac.th"),
            Err(AtkError::Forbidden(_))
        ));
        assert!(matches!(
            service.require_admin("ghost@phuket.psu.ac.th"),
            Err(AtkError::SubjectNotFound(_))
        ));
    }
}
