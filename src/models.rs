use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Label of the "all regions" option in the region selector.
pub const ALL_REGIONS_LABEL: &str = "전체";

/// Header cell value that marks a header row leaking into the data range.
pub const HEADER_NAME_SENTINEL: &str = "이름";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub request_timeout_secs: u64,
    /// Maximum number of rows printed in the record table
    pub table_limit: usize,
    /// Number of records summarized for the AI report
    pub report_sample_size: usize,
    pub gemini_model: String,
    pub gemini_api_key: Option<String>,
    pub output_directory: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spreadsheet_id: "1UUPQAt7sRay4XhGTiacPKpL0jRxwCs9oUP2PB6HnVvI".to_string(),
            sheet_name: "2026수시".to_string(),
            request_timeout_secs: 30,
            table_limit: 100,
            report_sample_size: 50,
            gemini_model: "gemini-3-flash-preview".to_string(),
            gemini_api_key: None,
            output_directory: Some("output".to_string()),
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }

    /// Query endpoint of the sheet; parameters come from [`Config::sheet_query`].
    pub fn sheet_url(&self) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}/gviz/tq",
            self.spreadsheet_id
        )
    }

    /// Query parameters selecting the whole sheet as a gviz JSON response.
    pub fn sheet_query(&self) -> [(&'static str, &str); 3] {
        [
            ("tqx", "out:json"),
            ("sheet", self.sheet_name.as_str()),
            ("tq", "select *"),
        ]
    }

    /// API key from the config file, falling back to the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.gemini_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("API_KEY").ok())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdmissionStatus {
    Pass,
    WaitlistPass,
    Fail,
}

impl AdmissionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AdmissionStatus::Pass => "합격",
            AdmissionStatus::WaitlistPass => "충원합격",
            AdmissionStatus::Fail => "불합",
        }
    }
}

impl fmt::Display for AdmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionRecord {
    pub id: String,
    pub student_name: String,
    pub student_info: String, // "<반> <번>"
    pub region: String,
    pub university: String,
    pub major: String,
    pub admission_type: String,
    pub gpa: f64,
    pub status: AdmissionStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_count: usize,
    pub pass_initial: usize,
    pub pass_waiting: usize,
    pub fail_count: usize,
    /// Percentage of passes (initial + waitlist), one decimal place
    pub pass_rate: f64,
}

impl DashboardStats {
    pub fn pass_total(&self) -> usize {
        self.pass_initial + self.pass_waiting
    }
}

/// Admission track used to group the chart. Matched by substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TrackCategory {
    Subject,
    Comprehensive,
    Practical,
}

impl TrackCategory {
    pub const ALL: [TrackCategory; 3] = [
        TrackCategory::Subject,
        TrackCategory::Comprehensive,
        TrackCategory::Practical,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TrackCategory::Subject => "교과",
            TrackCategory::Comprehensive => "종합",
            TrackCategory::Practical => "실기",
        }
    }

    pub fn matches(&self, admission_type: &str) -> bool {
        admission_type.contains(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartBucket {
    pub category: TrackCategory,
    pub fail: usize,
    pub waitlist_pass: usize,
    pub pass: usize,
}

impl ChartBucket {
    pub fn new(category: TrackCategory) -> Self {
        Self {
            category,
            fail: 0,
            waitlist_pass: 0,
            pass: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.fail + self.waitlist_pass + self.pass
    }
}

pub type ChartSeries = Vec<ChartBucket>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegionFilter {
    #[default]
    All,
    Region(String),
}

impl RegionFilter {
    /// Maps the selector label back to a filter; the sentinel label means all.
    pub fn from_label(label: &str) -> Self {
        if label == ALL_REGIONS_LABEL {
            RegionFilter::All
        } else {
            RegionFilter::Region(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            RegionFilter::All => ALL_REGIONS_LABEL,
            RegionFilter::Region(region) => region,
        }
    }

    pub fn matches(&self, region: &str) -> bool {
        match self {
            RegionFilter::All => true,
            RegionFilter::Region(selected) => selected == region,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub search: String,
    pub region: RegionFilter,
}

impl FilterState {
    pub fn new(search: impl Into<String>, region: RegionFilter) -> Self {
        Self {
            search: search.into(),
            region,
        }
    }
}
