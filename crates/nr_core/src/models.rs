use async_trait::async_trait;
use std::fmt;
use crate::types::{EntityExtraction, SummaryOutcome};
use crate::Result;

#[async_trait]
pub trait LanguageModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Pull entities and an intent label out of a free-text query.
    ///
    /// `None` means the extraction failed; it is not the same as an empty entity list.
    async fn extract_intent_and_entities(&self, query: &str) -> Option<EntityExtraction>;

    /// Summarize a piece of article text in a couple of short lines.
    ///
    /// `Ok(None)` means the upstream gave nothing usable back. `Err` is a
    /// transport-level failure the caller may retry.
    async fn summarize(&self, text: &str) -> Result<Option<SummaryOutcome>>;
}
