use super::to_db_timestamp;
use crate::row_factories::SubjectRowFactory;
use crate::submission::{NewSubject, Role, Subject};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, params};

const SUBJECT_COLUMNS: &str = "id, email, first_name, last_name, role, created_at";

pub struct SubjectsRepository<'a> {
    conn: &'a Connection,
    get_current_time: Box<dyn Fn() -> DateTime<Utc> + 'a>,
}

impl<'a> SubjectsRepository<'a> {
    pub fn new(
        conn: &'a Connection,
        get_current_time: Box<dyn Fn() -> DateTime<Utc> + 'a>,
    ) -> Self {
        SubjectsRepository {
            conn,
            get_current_time,
        }
    }

    /// Emails are stored trimmed and lowercased
    pub fn insert(&self, subject: &NewSubject) -> Result<i64> {
        let role = if subject.is_admin {
            Role::Admin
        } else {
            Role::Member
        };
        self.conn.execute(
            "INSERT INTO subjects (email, first_name, last_name, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                normalize_email(&subject.email),
                subject.first_name,
                subject.last_name,
                role.as_str(),
                to_db_timestamp((self.get_current_time)())
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, subject_id: i64) -> Result<Option<Subject>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM subjects WHERE id = ?1", SUBJECT_COLUMNS),
                [subject_id],
                SubjectRowFactory::from_row,
            )
            .optional()
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<Subject>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM subjects WHERE email = ?1", SUBJECT_COLUMNS),
                [normalize_email(email)],
                SubjectRowFactory::from_row,
            )
            .optional()
    }

    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM subjects", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::init_connection;

    fn create_test_db() -> Connection {
        init_connection(":memory:").expect("Failed to create test database")
    }

    fn create_repo(conn: &Connection) -> SubjectsRepository<'_> {
        SubjectsRepository::new(conn, Box::new(Utc::now))
    }

    fn student(email: &str) -> NewSubject {
        NewSubject {
            email: email.to_string(),
            first_name: Some("Emily".to_string()),
            last_name: Some("Parker".to_string()),
            is_admin: false,
        }
    }

    #[test]
    fn test_insert_subject() {
        let conn = create_test_db();
        let repo = create_repo(&conn);
        let id = repo.insert(&student("emily@phuket.psu.ac.th")).unwrap();
        assert_eq!(id, 1);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_get_subject() {
        let conn = create_test_db();
        let repo = create_repo(&conn);
        let id = repo.insert(&student("emily@phuket.psu.ac.th")).unwrap();

        let subject = repo.get(id).unwrap().unwrap();
        assert_eq!(subject.email, "emily@phuket.psu.ac.th");
        assert_eq!(subject.display_name(), "Emily Parker");
        assert_eq!(subject.role, Role::Member);
    }

    #[test]
    fn test_insert_admin() {
        let conn = create_test_db();
        let repo = create_repo(&conn);
        let id = repo
            .insert(&NewSubject {
                email: "staff@phuket.psu.ac.th".to_string(),
                is_admin: true,
                ..Default::default()
            })
            .unwrap();

        let subject = repo.get(id).unwrap().unwrap();
        assert!(subject.is_admin());
        assert_eq!(subject.display_name(), "staff@phuket.psu.ac.th");
    }

    #[test]
    fn test_find_by_email_normalizes() {
        let conn = create_test_db();
        let repo = create_repo(&conn);
        repo.insert(&student("  Emily@Phuket.PSU.ac.th ")).unwrap();

        let found = repo.find_by_email("EMILY@phuket.psu.ac.th").unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn test_find_unknown_email() {
        let conn = create_test_db();
        let repo = create_repo(&conn);
        assert!(repo.find_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let conn = create_test_db();
        let repo = create_repo(&conn);
        repo.insert(&student("emily@phuket.psu.ac.th")).unwrap();
        assert!(repo.insert(&student("EMILY@phuket.psu.ac.th")).is_err());
    }
}
