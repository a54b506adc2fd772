pub mod analytics;
pub mod cli;
pub mod database;
pub mod database_factory;
pub mod date_provider;
pub mod error;
pub mod image_store;
pub mod report;
pub mod row_factories;
pub mod submission;
pub mod submission_service;
pub mod time_format;
