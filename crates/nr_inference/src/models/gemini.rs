use std::fmt;
use async_trait::async_trait;
use nr_core::{EntityExtraction, Error, LanguageModel, Result, SummaryOutcome};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;
use super::{extraction_prompt, parse_extraction, summary_prompt};
use crate::Config;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro-001";

const SAFETY_FINISH_REASON: &str = "SAFETY";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Client for Gemini's `generateContent` endpoint.
///
/// Every upstream failure is logged and reported as "no answer"; nothing
/// from the wire is ever surfaced as an error.
pub struct GeminiModel {
    client: Client,
    api_key: String,
    endpoint: Url,
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

impl GeminiModel {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("Gemini API key is required".to_string()))?;

        let base = config.model_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let base = Url::parse(base)
            .map_err(|e| Error::Config(format!("Invalid model URL '{}': {}", base, e)))?;
        let endpoint = format!(
            "{}/models/{}:generateContent",
            base.as_str().trim_end_matches('/'),
            config.upstream_model
        );
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| Error::Config(format!("Invalid Gemini endpoint '{}': {}", endpoint, e)))?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint,
        })
    }

    /// Send a prompt and return the first candidate's answer, if there is one.
    async fn generate(&self, prompt: &str) -> Option<SummaryOutcome> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = match self
            .client
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Gemini request failed: {}", e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Gemini API call failed: {}", status);
            return None;
        }

        let raw = match response.text().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to read Gemini response body: {}", e);
                return None;
            }
        };
        if raw.trim().is_empty() {
            tracing::warn!("Gemini returned an empty response body");
            return None;
        }
        tracing::debug!("Raw Gemini response: {}", raw);

        let parsed: GenerateResponse = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Malformed Gemini response ({}): {}", e, raw);
                return None;
            }
        };

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            tracing::warn!("Gemini returned no candidates");
            return None;
        };

        if candidate.finish_reason.as_deref() == Some(SAFETY_FINISH_REASON) {
            tracing::warn!("Gemini blocked the response due to safety filters");
            return Some(SummaryOutcome::ContentRestricted);
        }

        let Some(content) = candidate.content else {
            tracing::warn!("No content in Gemini candidate");
            return None;
        };

        match content.parts.into_iter().next().and_then(|part| part.text) {
            Some(text) => Some(SummaryOutcome::Generated(text.trim().to_string())),
            None => {
                tracing::warn!("No text part in Gemini candidate content");
                None
            }
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn extract_intent_and_entities(&self, query: &str) -> Option<EntityExtraction> {
        match self.generate(&extraction_prompt(query)).await {
            Some(SummaryOutcome::Generated(text)) if !text.is_empty() => parse_extraction(&text),
            _ => {
                tracing::warn!("No valid extraction from Gemini for query: {}", query);
                None
            }
        }
    }

    async fn summarize(&self, text: &str) -> Result<Option<SummaryOutcome>> {
        Ok(self.generate(&summary_prompt(text)).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::post, Json, Router};
    use std::collections::HashMap;
    use std::time::Duration;

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn canned(status: StatusCode, body: &'static str) -> GeminiModel {
        let router = Router::new().route(
            "/models/:model",
            post(move || async move { (status, body) }),
        );
        model_for(spawn_upstream(router).await)
    }

    fn model_for(base: String) -> GeminiModel {
        GeminiModel::new(&Config {
            api_key: Some("test-key".to_string()),
            model_url: Some(base),
            upstream_model: "gemini-test".to_string(),
            request_timeout: Duration::from_millis(500),
            ..Config::default()
        })
        .unwrap()
    }

    #[test]
    fn test_model_requires_api_key() {
        let result = GeminiModel::new(&Config::default());
        assert!(matches!(result, Err(Error::Config(_))));

        let result = GeminiModel::new(&Config {
            api_key: Some("  ".to_string()),
            ..Config::default()
        });
        assert!(result.is_err());

        let result = GeminiModel::new(&Config {
            api_key: Some("test-key".to_string()),
            ..Config::default()
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_rejects_invalid_model_url() {
        let result = GeminiModel::new(&Config {
            api_key: Some("test-key".to_string()),
            model_url: Some("not a url".to_string()),
            ..Config::default()
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_summarize_sends_prompt_and_key() {
        let router = Router::new().route(
            "/models/:model",
            post(
                |Query(params): Query<HashMap<String, String>>,
                 Json(body): Json<serde_json::Value>| async move {
                    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
                    if params.get("key").map(String::as_str) != Some("test-key")
                        || !prompt.starts_with("Summarize the following news article in 2 short lines:")
                    {
                        return (StatusCode::BAD_REQUEST, String::new());
                    }
                    let reply = serde_json::json!({
                        "candidates": [{
                            "finishReason": "STOP",
                            "content": {"parts": [{"text": "  Rain floods the valley. Roads are closed.  \n"}]}
                        }]
                    });
                    (StatusCode::OK, reply.to_string())
                },
            ),
        );
        let model = model_for(spawn_upstream(router).await);

        let summary = model.summarize("Heavy rain hit the valley").await.unwrap();
        assert_eq!(
            summary,
            Some(SummaryOutcome::Generated("Rain floods the valley. Roads are closed.".to_string()))
        );
    }

    #[tokio::test]
    async fn test_safety_block_is_distinct_outcome() {
        let model = canned(
            StatusCode::OK,
            r#"{"candidates": [{"finishReason": "SAFETY"}]}"#,
        )
        .await;
        let summary = model.summarize("something").await.unwrap();
        assert_eq!(summary, Some(SummaryOutcome::ContentRestricted));
        assert_eq!(
            summary.unwrap().text(),
            "Summary not available due to content restrictions."
        );

        assert!(model.extract_intent_and_entities("something").await.is_none());
    }

    #[tokio::test]
    async fn test_upstream_failures_are_absent() {
        let cases = [
            (StatusCode::TOO_MANY_REQUESTS, r#"{"error": "quota"}"#),
            (StatusCode::INTERNAL_SERVER_ERROR, ""),
            (StatusCode::OK, ""),
            (StatusCode::OK, "<html>nope</html>"),
            (StatusCode::OK, r#"{"candidates": []}"#),
            (StatusCode::OK, r#"{"promptFeedback": {}}"#),
            (StatusCode::OK, r#"{"candidates": [{"finishReason": "STOP"}]}"#),
            (StatusCode::OK, r#"{"candidates": [{"content": {"parts": []}}]}"#),
            (StatusCode::OK, r#"{"candidates": [{"content": {"parts": [{}]}}]}"#),
        ];
        for (status, body) in cases {
            let model = canned(status, body).await;
            assert_eq!(model.summarize("text").await.unwrap(), None, "body: {}", body);
            assert!(model.extract_intent_and_entities("text").await.is_none());
        }
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_absent() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let model = model_for(format!("http://{}", addr));
        assert_eq!(model.summarize("text").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let router = Router::new().route(
            "/models/:model",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "{}"
            }),
        );
        let model = model_for(spawn_upstream(router).await);
        assert_eq!(model.summarize("text").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_extraction_through_code_fence() {
        let model = canned(
            StatusCode::OK,
            r#"{"candidates": [{"content": {"parts": [{"text": "```json\n{\"entities\": [\"Elon Musk\"], \"intent\": \"search\"}\n```"}]}}]}"#,
        )
        .await;
        let extraction = model.extract_intent_and_entities("Elon Musk news").await.unwrap();
        assert_eq!(extraction.entities, vec!["Elon Musk"]);
        assert_eq!(extraction.intent, "search");
    }

    #[tokio::test]
    async fn test_extraction_with_prose_answer_is_absent() {
        let model = canned(
            StatusCode::OK,
            r#"{"candidates": [{"content": {"parts": [{"text": "The entities are Elon Musk."}]}}]}"#,
        )
        .await;
        assert!(model.extract_intent_and_entities("Elon Musk news").await.is_none());
    }
}
