use atk_report::analytics::{DerivedStats, TrendPoint};
use atk_report::cli::{Args, Command, ExportFormat, FilterArgs};
use atk_report::database::Database;
use atk_report::database_factory::DatabaseFactory;
use atk_report::image_store::{ImageUpload, LocalImageStore};
use atk_report::report::{self, AdminDashboard};
use atk_report::submission::{NewSubject, ReportEntry, Submission, TestResult};
use atk_report::submission_service::{SubmissionRequest, SubmissionService};
use atk_report::time_format::{format_pattern, format_relative};
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::error::Error;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

const DATE_TIME_PATTERN: &str = "MMM d, yyyy h:mm aa";

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse_args();
    if args.no_color {
        colored::control::set_override(false);
    }

    let config = args.to_database_config()?;
    let db = Arc::new(DatabaseFactory::create(config)?);

    if let Err(e) = run(args.command, db) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}

fn run(command: Command, db: Arc<Database>) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Register {
            email,
            first_name,
            last_name,
            admin,
        } => {
            let service = SubmissionService::new(db, Arc::new(LocalImageStore::new(".")));
            let subject = service.register(&NewSubject {
                email,
                first_name,
                last_name,
                is_admin: admin,
            })?;
            println!(
                "{} Registered {} <{}> as {} (id {})",
                "✓".green(),
                subject.display_name().bold(),
                subject.email,
                subject.role.as_str(),
                subject.id
            );
        }
        Command::Submit {
            email,
            result,
            image,
            image_dir,
        } => {
            let image = image.map(|path| ImageUpload::from_path(&path)).transpose()?;
            let images = Arc::new(LocalImageStore::new(image_dir));
            let service = SubmissionService::new(db.clone(), images);
            let submission = service.submit(SubmissionRequest { email, result, image })?;
            println!(
                "{} Recorded {} result at {}",
                "✓".green(),
                colored_result(submission.result),
                format_instant(&db, submission.timestamp)
            );
        }
        Command::History { email } => {
            let service = SubmissionService::new(db.clone(), Arc::new(LocalImageStore::new(".")));
            let (subject, history) = service.history(&email)?;
            print_history(&db, &subject.display_name(), &history);
        }
        Command::Stats { email, days, json } => {
            let service = SubmissionService::new(db.clone(), Arc::new(LocalImageStore::new(".")));
            let overview = service.overview(&email, days)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            } else {
                println!("{}", overview.subject.display_name().bold());
                println!("{}", "=".repeat(40));
                print_stats(&db, &overview.stats);
                println!();
                print_trend(&overview.trend);
                if !overview.missing_days.is_empty() {
                    println!();
                    println!("Days without a report (last 10 days):");
                    for day in &overview.missing_days {
                        println!("  {}", day.format("%a %b %-d").to_string().yellow());
                    }
                }
            }
        }
        Command::Dashboard {
            admin,
            filter,
            expected_weekly,
            json,
        } => {
            let (dashboard, entries) = admin_report(&db, &admin, &filter, expected_weekly)?;
            if json {
                let view = DashboardView {
                    dashboard: &dashboard,
                    entries: &entries,
                };
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_dashboard(&db, &dashboard, &entries);
            }
        }
        Command::Export {
            admin,
            filter,
            format,
            expected_weekly,
            out_dir,
        } => {
            let (dashboard, entries) = admin_report(&db, &admin, &filter, expected_weekly)?;
            let calendar = db.analytics().calendar();
            let now = db.current_time();
            let file_name = report::export_file_name(calendar, now, format.extension());
            fs::create_dir_all(&out_dir)?;
            let path: PathBuf = out_dir.join(&file_name);

            match format {
                ExportFormat::Csv => report::write_csv(File::create(&path)?, &entries, calendar)?,
                ExportFormat::Markdown => fs::write(
                    &path,
                    report::build_markdown_report(&entries, &dashboard.weekly, calendar, now),
                )?,
            }
            println!(
                "{} Report exported as {} ({} rows)",
                "✓".green(),
                path.display(),
                entries.len()
            );
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct DashboardView<'a> {
    #[serde(flatten)]
    dashboard: &'a AdminDashboard,
    entries: &'a [ReportEntry],
}

/// Dashboard figures cover every submission; `entries` are the filtered rows
fn admin_report(
    db: &Arc<Database>,
    admin_email: &str,
    filter: &FilterArgs,
    expected_weekly: i64,
) -> Result<(AdminDashboard, Vec<ReportEntry>), Box<dyn Error>> {
    let service = SubmissionService::new(db.clone(), Arc::new(LocalImageStore::new(".")));
    service.require_admin(admin_email)?;

    let now = db.current_time();
    let all_entries = db.report_entries()?;
    let dashboard = report::build_dashboard(db.analytics(), &all_entries, now, expected_weekly);
    let filtered = filter
        .to_filter()
        .apply(&all_entries, db.analytics().calendar(), now);
    Ok((dashboard, filtered))
}

fn colored_result(result: TestResult) -> ColoredString {
    match result {
        TestResult::Positive => result.as_str().red().bold(),
        TestResult::Negative => result.as_str().green(),
    }
}

fn format_instant(db: &Database, instant: Option<DateTime<Utc>>) -> String {
    match instant {
        Some(instant) => {
            let local = db.analytics().calendar().localize(instant);
            format_pattern(&local, DATE_TIME_PATTERN)
        }
        None => "unknown time".to_string(),
    }
}

fn print_history(db: &Database, name: &str, history: &[Submission]) {
    println!("Submission history for {}", name.bold());
    println!("{}", "-".repeat(60));
    if history.is_empty() {
        println!("No submissions yet.");
        return;
    }

    let now = db.current_time();
    for submission in history {
        let relative = submission
            .timestamp
            .map(|ts| format_relative(&ts, &now))
            .unwrap_or_default();
        println!(
            "#{:<5} {:<22} {:<10} {}",
            submission.id,
            format_instant(db, submission.timestamp),
            colored_result(submission.result),
            relative.dimmed()
        );
    }
}

fn print_stats(db: &Database, stats: &DerivedStats) {
    println!("Total submissions:   {}", stats.total_count);
    println!(
        "Positive results:    {} ({}%)",
        stats.positive_count.to_string().red(),
        stats.positive_rate
    );
    println!("Current streak:      {} day(s)", stats.streak_days.to_string().cyan());
    println!("Last submission:     {}", format_instant(db, stats.last_submission));
    if let Some(missed) = stats.missed_submissions {
        println!("Missed submissions:  {}", missed.to_string().yellow());
    }
    println!(
        "Today / week / month: {} / {} / {}",
        stats.period_counts.today, stats.period_counts.this_week, stats.period_counts.this_month
    );
}

fn print_trend(trend: &[TrendPoint]) {
    println!("Daily submissions:");
    for point in trend {
        println!(
            "  {:<7} {}{} {}",
            point.label,
            "█".repeat(point.positive_count as usize).red(),
            "█".repeat(point.negative_count as usize).green(),
            point.total_count
        );
    }
}

fn print_dashboard(db: &Database, dashboard: &AdminDashboard, entries: &[ReportEntry]) {
    let calendar = db.analytics().calendar();
    println!("{}", "ATK Reports Dashboard".bold());
    println!(
        "{} - {}",
        format_pattern(&calendar.localize(dashboard.week_start), "MMM d, yyyy"),
        format_pattern(&calendar.localize(dashboard.week_end), "MMM d, yyyy")
    );
    println!("{}", "=".repeat(60));
    println!("This week");
    print_stats(db, &dashboard.weekly);
    println!();
    print_trend(&dashboard.trend);
    println!();
    println!(
        "All time: {} positive / {} negative",
        dashboard.distribution.positive_count.to_string().red(),
        dashboard.distribution.negative_count.to_string().green()
    );
    println!();

    if entries.is_empty() {
        println!("No submissions match the current filters.");
        return;
    }
    println!("{} matching submission(s)", entries.len());
    println!("{}", "-".repeat(60));
    for entry in entries {
        println!(
            "#{:<5} {:<22} {:<10} {} <{}>",
            entry.submission.id,
            format_instant(db, entry.submission.timestamp),
            colored_result(entry.submission.result),
            entry.name,
            entry.email
        );
    }
}
