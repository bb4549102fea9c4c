//! Early-admission (수시) results dashboard.
//!
//! Fetches the admissions spreadsheet, classifies each result, and
//! aggregates pass/fail statistics over a searchable, region-filtered view.

pub mod analyzer;
pub mod classifier;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod models;
pub mod report;
pub mod scraper;

pub use error::{DashboardError, Result};
