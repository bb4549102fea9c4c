use crate::classifier::classify_status;
use crate::error::{DashboardError, Result};
use crate::models::{AdmissionRecord, HEADER_NAME_SENTINEL};
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

// Sheet columns, 0-based
const COL_CLASS: usize = 1;
const COL_STUDENT_NO: usize = 2;
const COL_NAME: usize = 3;
const COL_REGION: usize = 5;
const COL_UNIVERSITY: usize = 6;
const COL_TYPE: usize = 8;
const COL_MAJOR: usize = 10;
const COL_GPA: usize = 11;
const COL_RESULT: usize = 12;

fn envelope_regex() -> &'static Regex {
    static ENVELOPE: OnceLock<Regex> = OnceLock::new();
    ENVELOPE.get_or_init(|| {
        Regex::new(r"(?s)google\.visualization\.Query\.setResponse\((.+)\)")
            .expect("envelope pattern is valid")
    })
}

pub struct SheetScraper {
    client: reqwest::Client,
    timeout: Duration,
}

impl SheetScraper {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    pub fn scrape_file(&self, file_path: &str) -> Result<Vec<AdmissionRecord>> {
        let content = fs::read_to_string(file_path)?;
        debug!(file_path, bytes = content.len(), "read saved sheet response");
        parse_response(&content)
    }

    pub async fn scrape_url(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<AdmissionRecord>> {
        let content = self.fetch_text(url, query).await?;
        parse_response(&content)
    }

    /// GET request for `url`; reqwest encodes the query parameters.
    pub fn sheet_request(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::Request> {
        Ok(self
            .client
            .get(url)
            .query(query)
            .timeout(self.timeout)
            .build()?)
    }

    pub async fn fetch_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let request = self.sheet_request(url, query)?;
        debug!(url = %request.url(), "fetching sheet");

        let response = self.client.execute(request).await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "sheet request failed");
            return Err(DashboardError::Network(format!(
                "HTTP request failed with status: {}",
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}

/// Parse a gviz `setResponse(...)` body into admission records.
///
/// All-or-nothing: an unrecognized envelope yields [`DashboardError::Format`]
/// and no records.
pub fn parse_response(body: &str) -> Result<Vec<AdmissionRecord>> {
    let json = envelope_regex()
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            DashboardError::Format("missing setResponse(...) envelope".to_string())
        })?;

    let payload: Value = serde_json::from_str(json)?;
    let rows = payload
        .get("table")
        .and_then(|table| table.get("rows"))
        .and_then(Value::as_array)
        .ok_or_else(|| DashboardError::Format("payload has no table.rows array".to_string()))?;

    let records: Vec<AdmissionRecord> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| record_from_row(index, row))
        .filter(|record| {
            !record.student_name.is_empty() && record.student_name != HEADER_NAME_SENTINEL
        })
        .collect();

    debug!(rows = rows.len(), records = records.len(), "parsed sheet response");
    Ok(records)
}

fn record_from_row(index: usize, row: &Value) -> AdmissionRecord {
    let cells = row.get("c").and_then(Value::as_array);
    let cell = |idx: usize| {
        cells
            .and_then(|cells| cells.get(idx))
            .and_then(|cell| cell.get("v"))
            .filter(|value| !value.is_null())
    };
    let text = |idx: usize| cell(idx).map(cell_text).unwrap_or_default();

    let class_no = text(COL_CLASS);
    let student_no = text(COL_STUDENT_NO);
    let gpa = cell(COL_GPA)
        .and_then(Value::as_f64)
        .filter(|gpa| gpa.is_finite() && *gpa >= 0.0)
        .unwrap_or(0.0);

    AdmissionRecord {
        id: format!("row-{}", index),
        student_name: text(COL_NAME),
        student_info: format!("{}반 {}번", class_no, student_no),
        region: text(COL_REGION),
        university: text(COL_UNIVERSITY),
        major: text(COL_MAJOR),
        admission_type: text(COL_TYPE),
        gpa,
        status: classify_status(&text(COL_RESULT)),
    }
}

/// Render a cell value as display text. Integral numbers print without a
/// fractional part, so a class cell holding `3.0` reads "3".
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            Some(f) => f.to_string(),
            None => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdmissionStatus;
    use serde_json::json;

    fn wrap(rows: Value) -> String {
        let payload = json!({
            "version": "0.6",
            "status": "ok",
            "table": { "cols": [], "rows": rows }
        });
        format!(
            "/*O_o*/\ngoogle.visualization.Query.setResponse({});",
            payload
        )
    }

    fn row(name: Value, gpa: Value, result: &str) -> Value {
        json!({ "c": [
            { "v": "2026" },
            { "v": 3.0 },
            { "v": 12.0 },
            { "v": name },
            null,
            { "v": "서울" },
            { "v": "한국대학교" },
            null,
            { "v": "학생부교과" },
            null,
            { "v": "컴퓨터공학과" },
            { "v": gpa },
            { "v": result }
        ]})
    }

    #[test]
    fn test_parse_maps_columns() {
        let body = wrap(json!([row(json!("김민수"), json!(2.35), "최초합격")]));
        let records = parse_response(&body).unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, "row-0");
        assert_eq!(record.student_name, "김민수");
        assert_eq!(record.student_info, "3반 12번");
        assert_eq!(record.region, "서울");
        assert_eq!(record.university, "한국대학교");
        assert_eq!(record.admission_type, "학생부교과");
        assert_eq!(record.major, "컴퓨터공학과");
        assert_eq!(record.gpa, 2.35);
        assert_eq!(record.status, AdmissionStatus::Pass);
    }

    #[test]
    fn test_null_name_row_is_dropped() {
        let body = wrap(json!([
            row(Value::Null, json!(1.5), "합격"),
            row(json!("이영희"), json!(1.5), "불합격")
        ]));
        let records = parse_response(&body).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].student_name, "이영희");
        // ids follow the pre-filter row index
        assert_eq!(records[0].id, "row-1");
    }

    #[test]
    fn test_header_row_is_dropped() {
        let body = wrap(json!([
            row(json!("이름"), json!("내신"), "결과"),
            row(json!("박지훈"), json!(3.1), "2차충원합격")
        ]));
        let records = parse_response(&body).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AdmissionStatus::WaitlistPass);
    }

    #[test]
    fn test_non_numeric_gpa_defaults_to_zero() {
        let body = wrap(json!([row(json!("최수진"), json!("오류"), "불합격")]));
        let records = parse_response(&body).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].gpa, 0.0);
        assert_eq!(records[0].status, AdmissionStatus::Fail);
    }

    #[test]
    fn test_short_row_coerces_missing_cells() {
        let body = wrap(json!([{ "c": [null, null, null, { "v": "정하늘" }] }]));
        let records = parse_response(&body).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].student_info, "반 번");
        assert_eq!(records[0].university, "");
        assert_eq!(records[0].gpa, 0.0);
        assert_eq!(records[0].status, AdmissionStatus::Fail);
    }

    #[test]
    fn test_missing_envelope_is_format_error() {
        let err = parse_response("{\"table\": {\"rows\": []}}").unwrap_err();
        assert!(matches!(err, DashboardError::Format(_)));

        let err = parse_response("").unwrap_err();
        assert!(matches!(err, DashboardError::Format(_)));
    }

    #[test]
    fn test_invalid_json_is_format_error() {
        let err = parse_response("google.visualization.Query.setResponse({oops)").unwrap_err();
        assert!(matches!(err, DashboardError::Format(_)));

        let err = parse_response("google.visualization.Query.setResponse({\"table\": {}})")
            .unwrap_err();
        assert!(matches!(err, DashboardError::Format(_)));
    }

    #[test]
    fn test_cell_text_renders_numbers_like_display_values() {
        assert_eq!(cell_text(&json!(3.0)), "3");
        assert_eq!(cell_text(&json!(12)), "12");
        assert_eq!(cell_text(&json!(2.5)), "2.5");
        assert_eq!(cell_text(&json!(true)), "true");
    }

    #[test]
    fn test_negative_gpa_defaults_to_zero() {
        let body = wrap(json!([
            row(json!("한지민"), json!(-1.0), "합격"),
            row(json!("오세훈"), json!(-0.25), "합격")
        ]));
        let records = parse_response(&body).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].gpa, 0.0);
        assert_eq!(records[1].gpa, 0.0);
    }

    #[test]
    fn test_sheet_request_carries_query_and_timeout() {
        let scraper = SheetScraper::new(Duration::from_secs(7));
        let request = scraper
            .sheet_request(
                "https://docs.google.com/spreadsheets/d/abc/gviz/tq",
                &[("tqx", "out:json"), ("sheet", "2026수시"), ("tq", "select *")],
            )
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/spreadsheets/d/abc/gviz/tq");
        assert!(request.url().as_str().contains("sheet=2026%EC%88%98%EC%8B%9C"));
        assert_eq!(request.timeout(), Some(&Duration::from_secs(7)));
    }

    #[test]
    fn test_scrape_file_reads_saved_response() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("response.txt");
        fs::write(&path, wrap(json!([row(json!("김민수"), json!(2.0), "합격")]))).unwrap();

        let scraper = SheetScraper::new(Duration::from_secs(1));
        let records = scraper.scrape_file(path.to_str().unwrap()).unwrap();
        assert_eq!(records.len(), 1);
    }
}
