use crate::analytics::Calendar;
use crate::database::Database;
use crate::date_provider::{
    DateProvider, FixedDateProvider, OverrideDateProvider, SystemDateProvider,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Result;
use std::sync::Arc;

pub const DEFAULT_DB_PATH: &str = "atk_report.db";

/// Where "now" comes from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ClockSource {
    #[default]
    System,
    /// Pinned date, wall-clock time of day
    OverrideDate(NaiveDate),
    Fixed(DateTime<Utc>),
}

/// Database configuration
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    /// Whether to use in-memory database
    pub is_test_mode: bool,
    /// Custom database file path (ignored if in test mode)
    pub custom_path: Option<String>,
    pub clock: ClockSource,
    pub calendar: Calendar,
}

impl DatabaseConfig {
    pub fn builder() -> DatabaseConfigBuilder {
        DatabaseConfigBuilder::default()
    }

    /// Gets the effective database path
    pub fn get_path(&self) -> &str {
        if self.is_test_mode {
            ":memory:"
        } else {
            self.custom_path.as_deref().unwrap_or(DEFAULT_DB_PATH)
        }
    }

    fn date_provider(&self) -> Arc<dyn DateProvider> {
        match self.clock {
            ClockSource::System => Arc::new(SystemDateProvider),
            ClockSource::OverrideDate(date) => Arc::new(OverrideDateProvider::new(date)),
            ClockSource::Fixed(instant) => Arc::new(FixedDateProvider::new(instant)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DatabaseConfigBuilder {
    config: DatabaseConfig,
}

impl DatabaseConfigBuilder {
    pub fn test_mode(mut self) -> Self {
        self.config.is_test_mode = true;
        self
    }

    pub fn custom_path(mut self, path: impl Into<String>) -> Self {
        self.config.custom_path = Some(path.into());
        self
    }

    pub fn override_date(mut self, date: NaiveDate) -> Self {
        self.config.clock = ClockSource::OverrideDate(date);
        self
    }

    /// Shorthand for `override_date`; an invalid date leaves the clock alone
    pub fn date_ymd(self, year: i32, month: u32, day: u32) -> Self {
        match NaiveDate::from_ymd_opt(year, month, day) {
            Some(date) => self.override_date(date),
            None => self,
        }
    }

    pub fn fixed_time(mut self, instant: DateTime<Utc>) -> Self {
        self.config.clock = ClockSource::Fixed(instant);
        self
    }

    pub fn calendar(mut self, calendar: Calendar) -> Self {
        self.config.calendar = calendar;
        self
    }

    pub fn build(self) -> DatabaseConfig {
        self.config
    }
}

/// Factory for creating Database instances
pub struct DatabaseFactory;

impl DatabaseFactory {
    /// Creates a database with the specified configuration
    pub fn create(config: DatabaseConfig) -> Result<Database> {
        Database::with_settings(config.get_path(), config.date_provider(), config.calendar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path() {
        let config = DatabaseConfig::default();
        assert_eq!(config.get_path(), "atk_report.db");
    }

    #[test]
    fn test_test_mode_path() {
        let config = DatabaseConfig::builder().test_mode().build();
        assert_eq!(config.get_path(), ":memory:");
    }

    #[test]
    fn test_custom_path() {
        let config = DatabaseConfig::builder().custom_path("custom.db").build();
        assert_eq!(config.get_path(), "custom.db");
    }

    #[test]
    fn test_test_mode_ignores_custom_path() {
        let config = DatabaseConfig::builder()
            .custom_path("custom.db")
            .test_mode()
            .build();
        assert_eq!(config.get_path(), ":memory:");
    }

    #[test]
    fn test_date_ymd_sets_override() {
        let config = DatabaseConfig::builder().date_ymd(2025, 4, 16).build();
        assert_eq!(
            config.clock,
            ClockSource::OverrideDate(NaiveDate::from_ymd_opt(2025, 4, 16).unwrap())
        );
    }

    #[test]
    fn test_date_ymd_invalid_keeps_system_clock() {
        let config = DatabaseConfig::builder().date_ymd(2025, 2, 30).build();
        assert_eq!(config.clock, ClockSource::System);
    }

    #[test]
    fn test_create_with_fixed_time() {
        let instant = NaiveDate::from_ymd_opt(2025, 4, 16)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            .and_utc();
        let db = DatabaseFactory::create(
            DatabaseConfig::builder()
                .test_mode()
                .fixed_time(instant)
                .build(),
        )
        .expect("Failed to create in-memory database");
        assert_eq!(db.current_time(), instant);
        assert!(db.count_submissions().is_ok());
    }

    #[test]
    fn test_create_with_calendar() {
        let calendar = Calendar::with_offset_hours(7).unwrap();
        let db = DatabaseFactory::create(
            DatabaseConfig::builder()
                .test_mode()
                .calendar(calendar)
                .build(),
        )
        .unwrap();
        assert_eq!(*db.analytics().calendar(), calendar);
    }
}
