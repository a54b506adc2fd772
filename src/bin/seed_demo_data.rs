use atk_report::database::Database;
use atk_report::submission::{NewSubject, TestResult};
use chrono::{Days, NaiveDate, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::env;
use std::error::Error;

const FIRST_NAMES: [&str; 12] = [
    "Emily", "Noah", "Olivia", "Liam", "Mia", "Lucas", "Ava", "Ethan", "Sophia", "Mason", "Chloe",
    "James",
];
const LAST_NAMES: [&str; 10] = [
    "Parker", "Kim", "Wilson", "Chen", "Ross", "Nguyen", "Brown", "Lee", "Garcia", "Taylor",
];
const EMAIL_DOMAIN: &str = "phuket.psu.ac.th";
const ADMIN_EMAIL: &str = "admin@phuket.psu.ac.th";

/// Chance that a subject reports on a given day
const REPORT_PROBABILITY: f64 = 0.8;
const POSITIVE_PROBABILITY: f64 = 0.08;

fn main() {
    let args: Vec<String> = env::args().collect();
    let (db_path, days, subjects) = validate_input(args);

    let db = match Database::new(&db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Error opening database: {}", e);
            std::process::exit(1);
        }
    };

    match seed(&db, days, subjects) {
        Ok(inserted) => {
            println!(
                "Seeded {} submissions for {} subjects over {} days into {}",
                inserted, subjects, days, db_path
            );
            println!("Admin account: {}", ADMIN_EMAIL);
        }
        Err(e) => {
            eprintln!("Error seeding database: {}", e);
            std::process::exit(1);
        }
    }
}

fn validate_input(args: Vec<String>) -> (String, u64, usize) {
    if args.len() < 2 || args.len() > 4 {
        eprintln!("Usage: {} <database_file> [days] [subjects]", args[0]);
        eprintln!();
        eprintln!("Fills a database with demo subjects and random test reports.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  <database_file>  Path to the SQLite database file");
        eprintln!("  [days]           How many days back to generate (default 30)");
        eprintln!("  [subjects]       Number of subjects (default 20)");
        eprintln!();
        eprintln!("Example: {} atk_report.db 14 10", args[0]);
        std::process::exit(1);
    }

    let days = parse_or_exit(args.get(2), 30, "days");
    let subjects = parse_or_exit(args.get(3), 20, "subjects");
    (args[1].clone(), days, subjects)
}

fn parse_or_exit<T: std::str::FromStr>(value: Option<&String>, default: T, name: &str) -> T {
    match value {
        None => default,
        Some(raw) => match raw.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                eprintln!("Invalid value for {}: '{}'", name, raw);
                std::process::exit(1);
            }
        },
    }
}

fn seed(db: &Database, days: u64, subjects: usize) -> Result<usize, Box<dyn Error>> {
    let mut rng = rand::thread_rng();

    if db.find_subject_by_email(ADMIN_EMAIL)?.is_none() {
        db.register_subject(&NewSubject {
            email: ADMIN_EMAIL.to_string(),
            first_name: Some("Report".to_string()),
            last_name: Some("Admin".to_string()),
            is_admin: true,
        })?;
    }

    let mut subject_ids = Vec::with_capacity(subjects);
    for n in 0..subjects {
        let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Demo");
        let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Subject");
        let email = format!(
            "{}.{}{}@{}",
            first.to_lowercase(),
            last.to_lowercase(),
            n + 1,
            EMAIL_DOMAIN
        );
        let id = match db.find_subject_by_email(&email)? {
            Some(existing) => existing.id,
            None => db.register_subject(&NewSubject {
                email,
                first_name: Some(first.to_string()),
                last_name: Some(last.to_string()),
                is_admin: false,
            })?,
        };
        subject_ids.push(id);
    }

    let today = Utc::now().date_naive();
    let mut inserted = 0;
    for back in (1..=days).rev() {
        let Some(day) = today.checked_sub_days(Days::new(back)) else {
            continue;
        };
        for &subject_id in &subject_ids {
            if !rng.gen_bool(REPORT_PROBABILITY) {
                continue;
            }
            let result = if rng.gen_bool(POSITIVE_PROBABILITY) {
                TestResult::Positive
            } else {
                TestResult::Negative
            };
            let Some(created_at) = random_time_on(&mut rng, day) else {
                continue;
            };
            db.insert_submission_at(subject_id, result, None, created_at)?;
            inserted += 1;
        }
    }
    Ok(inserted)
}

/// Reports mostly arrive during the morning
fn random_time_on<R: Rng>(rng: &mut R, day: NaiveDate) -> Option<chrono::DateTime<Utc>> {
    let hour = rng.gen_range(6..12);
    let minute = rng.gen_range(0..60);
    let second = rng.gen_range(0..60);
    day.and_hms_opt(hour, minute, second).map(|dt| dt.and_utc())
}
