//! AI-written summary of the admission data.
//!
//! The text generator is an external collaborator. Whatever goes wrong, the
//! caller gets a printable string back, never an error.

use crate::error::{DashboardError, Result};
use crate::models::AdmissionRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

pub const EMPTY_RESULT_FALLBACK: &str = "분석 결과를 생성할 수 없습니다.";
pub const ERROR_FALLBACK: &str = "AI 분석 중 오류가 발생했습니다.";

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDigest {
    pub summary: String,
    pub total_records: usize,
}

pub fn build_digest(records: &[AdmissionRecord], sample_size: usize) -> ReportDigest {
    let summary = records
        .iter()
        .take(sample_size)
        .map(|r| {
            format!(
                "{} ({}): 내신 {:.2}, 결과 {}",
                r.university,
                r.major,
                r.gpa,
                r.status.label()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    ReportDigest {
        summary,
        total_records: records.len(),
    }
}

pub fn build_prompt(digest: &ReportDigest) -> String {
    format!(
        "다음은 2026학년도 수시 모집 데이터의 일부입니다.\n\
         데이터 요약: {}\n\
         전체 레코드 수: {}개\n\
         \n\
         이 데이터를 분석하여 다음 항목에 대해 한국어로 전문적인 인사이트를 제공해주세요:\n\
         1. 전체적인 지원 및 합격 동향 (합격, 충원합격, 불합 비중 등)\n\
         2. 대학 및 학과별 합격권 내신 분석\n\
         3. 수험생들을 위한 전략적 제언\n\
         4. 데이터에서 발견된 특이사항이나 패턴\n\
         \n\
         답변은 Markdown 형식으로 작성해주세요.\n",
        digest.summary, digest.total_records
    )
}

#[allow(async_fn_in_trait)]
pub trait InsightGenerator {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Summarize the first `sample_size` records. Failures collapse into the
/// fixed fallback strings.
pub async fn generate_report<G: InsightGenerator>(
    generator: &G,
    records: &[AdmissionRecord],
    sample_size: usize,
) -> String {
    let digest = build_digest(records, sample_size);
    let prompt = build_prompt(&digest);
    debug!(total = digest.total_records, prompt_len = prompt.len(), "requesting AI report");

    match generator.generate(&prompt).await {
        Ok(text) if text.trim().is_empty() => EMPTY_RESULT_FALLBACK.to_string(),
        Ok(text) => text,
        Err(err) => {
            error!(error = %err, "AI report generation failed");
            ERROR_FALLBACK.to_string()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            timeout,
        }
    }
}

impl InsightGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/{}:generateContent", GEMINI_ENDPOINT, self.model);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_p: 0.95,
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DashboardError::Network(format!(
                "Gemini request failed with status: {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response.json().await?;
        Ok(body.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdmissionStatus;

    struct FixedGenerator(Result<String>);

    impl InsightGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(DashboardError::Network("unreachable".to_string())),
            }
        }
    }

    fn records(count: usize) -> Vec<AdmissionRecord> {
        (0..count)
            .map(|i| AdmissionRecord {
                id: format!("row-{}", i),
                student_name: format!("학생{}", i),
                student_info: "2반 7번".to_string(),
                region: "서울".to_string(),
                university: "한국대학교".to_string(),
                major: "의예과".to_string(),
                admission_type: "학생부종합".to_string(),
                gpa: 1.234,
                status: AdmissionStatus::WaitlistPass,
            })
            .collect()
    }

    #[test]
    fn test_digest_caps_sample_but_counts_all() {
        let digest = build_digest(&records(60), 50);
        assert_eq!(digest.total_records, 60);
        assert_eq!(digest.summary.matches("한국대학교").count(), 50);
        assert!(digest
            .summary
            .starts_with("한국대학교 (의예과): 내신 1.23, 결과 충원합격, "));
    }

    #[test]
    fn test_prompt_contains_digest() {
        let digest = build_digest(&records(2), 50);
        let prompt = build_prompt(&digest);
        assert!(prompt.contains("전체 레코드 수: 2개"));
        assert!(prompt.contains(&digest.summary));
        assert!(prompt.contains("Markdown"));
    }

    #[tokio::test]
    async fn test_report_falls_back_on_error() {
        let generator = FixedGenerator(Err(DashboardError::Cancelled));
        let text = generate_report(&generator, &records(3), 50).await;
        assert_eq!(text, ERROR_FALLBACK);
    }

    #[tokio::test]
    async fn test_report_falls_back_on_empty_text() {
        let generator = FixedGenerator(Ok("  ".to_string()));
        let text = generate_report(&generator, &records(3), 50).await;
        assert_eq!(text, EMPTY_RESULT_FALLBACK);
    }

    #[tokio::test]
    async fn test_report_passes_text_through() {
        let generator = FixedGenerator(Ok("## 동향".to_string()));
        let text = generate_report(&generator, &records(3), 50).await;
        assert_eq!(text, "## 동향");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"a"},{"text":"b"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.text(), "ab");

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.text(), "");
    }
}
