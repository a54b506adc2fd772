use crate::analytics::{Calendar, DEFAULT_TREND_WINDOW_DAYS, MAX_WINDOW_DAYS};
use crate::database_factory::DatabaseConfig;
use crate::report::{DEFAULT_EXPECTED_WEEKLY, DateRange, ReportFilter, StatusFilter};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_IMAGE_DIR: &str = "atk_images";

/// ATK antigen test self-reporting
#[derive(Parser, Debug, Clone)]
#[command(name = "ATK Report")]
#[command(
    about = "Self-report antigen test results and review submission analytics",
    long_about = None
)]
#[command(version)]
pub struct Args {
    /// Use in-memory database for testing
    #[arg(long, global = true, help = "Use in-memory database for testing")]
    pub test: bool,

    /// Custom database file path
    #[arg(long, global = true, value_name = "PATH", help = "Use custom database file path")]
    pub db_path: Option<PathBuf>,

    /// Override current date for testing (YYYY-MM-DD format)
    #[arg(
        long,
        global = true,
        value_name = "DATE",
        help = "Override current date (YYYY-MM-DD format)"
    )]
    pub override_date: Option<String>,

    /// Hours east of UTC used to decide which calendar day a report falls on
    #[arg(
        long,
        global = true,
        value_name = "HOURS",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub utc_offset: i32,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Register a subject who can report results
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// Grant access to the admin report
        #[arg(long)]
        admin: bool,
    },
    /// Report a test result with a photo of the kit
    Submit {
        #[arg(long)]
        email: String,
        /// Positive or Negative
        #[arg(long)]
        result: String,
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,
        /// Directory the photo is copied into
        #[arg(long, value_name = "DIR", default_value = DEFAULT_IMAGE_DIR)]
        image_dir: PathBuf,
    },
    /// List a subject's submissions, most recent first
    History {
        #[arg(long)]
        email: String,
    },
    /// Streak, counts and trend for one subject
    Stats {
        #[arg(long)]
        email: String,
        #[arg(
            long,
            value_name = "DAYS",
            default_value_t = DEFAULT_TREND_WINDOW_DAYS,
            value_parser = parse_window_days
        )]
        days: usize,
        #[arg(long)]
        json: bool,
    },
    /// Admin overview of all submissions
    Dashboard {
        /// Email of the administrator requesting the report
        #[arg(long, value_name = "EMAIL")]
        admin: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_name = "COUNT", default_value_t = DEFAULT_EXPECTED_WEEKLY)]
        expected_weekly: i64,
        #[arg(long)]
        json: bool,
    },
    /// Write the filtered admin report to a file
    Export {
        #[arg(long, value_name = "EMAIL")]
        admin: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        #[arg(long, value_name = "COUNT", default_value_t = DEFAULT_EXPECTED_WEEKLY)]
        expected_weekly: i64,
        #[arg(long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct FilterArgs {
    /// today, week, month or all
    #[arg(long, default_value = "all", value_parser = parse_date_range)]
    pub range: DateRange,
    /// Match against name or email, ignoring case
    #[arg(long, default_value = "")]
    pub search: String,
    /// all, positive or negative
    #[arg(long, default_value = "all", value_parser = parse_status)]
    pub status: StatusFilter,
}

impl FilterArgs {
    pub fn to_filter(&self) -> ReportFilter {
        ReportFilter {
            range: self.range,
            search: self.search.clone(),
            status: self.status,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    #[value(alias = "md")]
    Markdown,
}

impl ExportFormat {
    pub fn extension(&self) -> &str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
        }
    }
}

fn parse_date_range(value: &str) -> Result<DateRange, String> {
    DateRange::from(value).ok_or_else(|| {
        format!("Unknown range '{}'. Expected today, week, month or all", value)
    })
}

fn parse_status(value: &str) -> Result<StatusFilter, String> {
    StatusFilter::from(value).ok_or_else(|| {
        format!("Unknown status '{}'. Expected all, positive or negative", value)
    })
}

fn parse_window_days(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(days) if (1..=MAX_WINDOW_DAYS).contains(&days) => Ok(days),
        _ => Err(format!("Expected a number of days from 1 to {}", MAX_WINDOW_DAYS)),
    }
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate the override_date argument if provided
    pub fn validate_override_date(&self) -> Result<Option<NaiveDate>, String> {
        match &self.override_date {
            Some(date_str) => {
                NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                    .map(Some)
                    .map_err(|_| {
                        format!(
                            "Invalid date format for --override-date: '{}'. Expected YYYY-MM-DD",
                            date_str
                        )
                    })
            }
            None => Ok(None),
        }
    }

    pub fn calendar(&self) -> Result<Calendar, String> {
        Calendar::with_offset_hours(self.utc_offset)
            .ok_or_else(|| format!("Invalid --utc-offset: {}. Expected -23..=23", self.utc_offset))
    }

    pub fn to_database_config(&self) -> Result<DatabaseConfig, String> {
        let mut builder = DatabaseConfig::builder().calendar(self.calendar()?);
        if self.test {
            builder = builder.test_mode();
        }
        if let Some(path) = &self.db_path {
            builder = builder.custom_path(path.to_string_lossy());
        }
        if let Some(date) = self.validate_override_date()? {
            builder = builder.override_date(date);
        }
        Ok(builder.build())
    }
}
