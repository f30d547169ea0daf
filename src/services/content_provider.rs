//! Content generation provider client.
//!
//! Two logical backends exist: `fast` for routine practice material and
//! `quality` for heavier artifacts such as lesson plans. Both speak the same
//! HTTP generation API; when no endpoint/key is configured (or mock mode is
//! forced) a deterministic local payload is produced instead so the queue
//! consumer keeps working in development and tests.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

const DEFAULT_TIMEOUT_MS: u64 = 60_000;
const FAST_MODEL: &str = "alfanumrik-fast-1";
const QUALITY_MODEL: &str = "alfanumrik-quality-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Fast,
    Quality,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Quality => "quality",
        }
    }

    fn model(&self) -> &'static str {
        match self {
            Self::Fast => FAST_MODEL,
            Self::Quality => QUALITY_MODEL,
        }
    }
}

/// Provider selection policy: lesson plans always go to the quality backend,
/// an explicit preference forces it, everything else takes the fast path.
pub fn select_provider(request_type: &str, preferred_provider: Option<&str>) -> Provider {
    if request_type.eq_ignore_ascii_case("lesson_plan") {
        return Provider::Quality;
    }

    match preferred_provider {
        Some(p) if p.eq_ignore_ascii_case("quality") => Provider::Quality,
        _ => Provider::Fast,
    }
}

#[derive(Debug, Clone)]
pub struct GenerationJob<'a> {
    pub request_type: &'a str,
    pub grade: &'a str,
    pub subject: &'a str,
    pub skill: &'a str,
    pub difficulty: &'a str,
    pub language: &'a str,
    pub prompt: Option<&'a str>,
}

#[derive(Debug, Error)]
pub enum ContentProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
struct ProviderConfig {
    api_key: Option<String>,
    endpoint: Option<String>,
    mock: bool,
}

#[derive(Clone)]
pub struct ContentProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerationRequestBody<'a> {
    model: &'a str,
    request_type: &'a str,
    grade: &'a str,
    subject: &'a str,
    skill: &'a str,
    difficulty: &'a str,
    language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
}

impl ContentProvider {
    pub fn from_env() -> Self {
        let api_key = env_string("CONTENT_API_KEY");
        let endpoint = env_string("CONTENT_API_ENDPOINT");
        let mock = std::env::var("CONTENT_PROVIDER_MOCK")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let timeout = std::env::var("CONTENT_API_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_TIMEOUT_MS));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            config: ProviderConfig {
                api_key,
                endpoint,
                mock,
            },
            client,
        }
    }

    pub fn is_mock(&self) -> bool {
        self.config.mock || self.config.endpoint.is_none() || self.config.api_key.is_none()
    }

    pub async fn generate(
        &self,
        provider: Provider,
        job: &GenerationJob<'_>,
    ) -> Result<serde_json::Value, ContentProviderError> {
        if self.is_mock() {
            return Ok(mock_payload(provider, job));
        }

        // is_mock() checked both above
        let endpoint = self.config.endpoint.as_deref().unwrap_or_default();
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let body = GenerationRequestBody {
            model: provider.model(),
            request_type: job.request_type,
            grade: job.grade,
            subject: job.subject,
            skill: job.skill,
            difficulty: job.difficulty,
            language: job.language,
            prompt: job.prompt,
        };

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContentProviderError::HttpStatus { status, body });
        }

        Ok(response.json().await?)
    }
}

fn mock_payload(provider: Provider, job: &GenerationJob<'_>) -> serde_json::Value {
    serde_json::json!({
        "title": format!("{}: {} ({})", job.subject, job.skill, job.difficulty),
        "type": job.request_type,
        "grade": job.grade,
        "subject": job.subject,
        "skill": job.skill,
        "difficulty": job.difficulty,
        "language": job.language,
        "generator": provider.as_str(),
        "sections": [
            { "heading": "Overview", "body": format!("Introduction to {}.", job.skill) },
            { "heading": "Practice", "body": format!("{} exercises on {}.", job.difficulty, job.skill) },
        ],
    })
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_plans_select_quality() {
        assert_eq!(select_provider("lesson_plan", None), Provider::Quality);
        assert_eq!(select_provider("LESSON_PLAN", Some("fast")), Provider::Quality);
    }

    #[test]
    fn explicit_preference_selects_quality() {
        assert_eq!(select_provider("quiz", Some("quality")), Provider::Quality);
    }

    #[test]
    fn default_is_fast() {
        assert_eq!(select_provider("quiz", None), Provider::Fast);
        assert_eq!(select_provider("worksheet", Some("fast")), Provider::Fast);
    }

    #[test]
    fn mock_payload_records_generator_and_key_fields() {
        let job = GenerationJob {
            request_type: "quiz",
            grade: "9",
            subject: "Math",
            skill: "Fractions",
            difficulty: "Hard",
            language: "en",
            prompt: None,
        };
        let payload = mock_payload(Provider::Fast, &job);
        assert_eq!(payload["generator"], "fast");
        assert_eq!(payload["skill"], "Fractions");
        assert_eq!(payload["type"], "quiz");
    }
}
