use std::sync::Arc;
use nr_core::{EntityExtraction, Error, LanguageModel, Result};
use serde::Deserialize;
use crate::Config;

pub mod dummy;
pub mod gemini;

pub use dummy::DummyModel;
pub use gemini::GeminiModel;

/// Build the configured model. Gemini without an API key degrades to the
/// offline `DummyModel` so the service still starts.
pub async fn create_model(config: Option<Config>) -> Result<Arc<dyn LanguageModel>> {
    let config = config.unwrap_or_default();
    match config.model_name.as_str() {
        "gemini" if !has_api_key(&config) => {
            tracing::warn!("No Gemini API key configured, falling back to the dummy model");
            Ok(Arc::new(DummyModel::new()))
        }
        "gemini" => Ok(Arc::new(GeminiModel::new(&config)?)),
        "dummy" => Ok(Arc::new(DummyModel::new())),
        other => Err(Error::Config(format!(
            "Unknown model '{}'. Available models: gemini, dummy",
            other
        ))),
    }
}

fn has_api_key(config: &Config) -> bool {
    config.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
}

pub(crate) fn extraction_prompt(query: &str) -> String {
    format!(
        "Extract entities and user intent from the following query:\n\"{}\"\n\
         Return a JSON with keys 'entities' (list of strings) and 'intent' (string).",
        query
    )
}

pub(crate) fn summary_prompt(text: &str) -> String {
    format!("Summarize the following news article in 2 short lines:\n{}", text)
}

/// Remove a Markdown code fence wrapped around a model answer.
pub fn strip_code_fence(text: &str) -> String {
    let text = text.trim();
    if text.starts_with("```json") {
        text.replace("```json", "").replace("```", "").trim().to_string()
    } else if text.starts_with("```") {
        text.replace("```", "").trim().to_string()
    } else {
        text.to_string()
    }
}

#[derive(Deserialize)]
struct RawExtraction {
    entities: Option<Vec<String>>,
    intent: Option<String>,
}

/// Parse the model's answer to an extraction prompt.
///
/// Anything other than a JSON object carrying an `entities` string list is
/// treated as a failed extraction.
pub fn parse_extraction(text: &str) -> Option<EntityExtraction> {
    let cleaned = strip_code_fence(text);
    let value: serde_json::Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Invalid JSON from language model: {} ({})", cleaned, e);
            return None;
        }
    };
    if !value.is_object() {
        tracing::warn!("Expected a JSON object from language model, got: {}", cleaned);
        return None;
    }
    let raw: RawExtraction = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Unexpected extraction shape: {} ({})", cleaned, e);
            return None;
        }
    };
    Some(EntityExtraction {
        entities: raw.entities?,
        intent: raw.intent.unwrap_or_default(),
    })
}
