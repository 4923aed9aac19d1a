use std::fmt;
use nr_core::{EntityExtraction, LanguageModel, Result, SummaryOutcome};

/// Offline stand-in for a real language model.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LanguageModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn extract_intent_and_entities(&self, query: &str) -> Option<EntityExtraction> {
        // Every distinct word of three letters or more counts as an entity
        let mut entities: Vec<String> = Vec::new();
        for word in query.split(|c: char| !c.is_alphanumeric()) {
            if word.chars().count() >= 3 && !entities.iter().any(|e| e.eq_ignore_ascii_case(word)) {
                entities.push(word.to_string());
            }
        }
        Some(EntityExtraction {
            entities,
            intent: "search".to_string(),
        })
    }

    async fn summarize(&self, text: &str) -> Result<Option<SummaryOutcome>> {
        let words: Vec<&str> = text.split_whitespace().take(20).collect();
        if words.is_empty() {
            return Ok(None);
        }
        Ok(Some(SummaryOutcome::Generated(words.join(" "))))
    }
}
