//! AI provider boundary.
//!
//! Everything that talks to an external language model goes through the
//! [`AiProvider`] trait: embedding generation, context-constrained answers,
//! and structured reminder extraction. Concrete backends are registered in
//! [`create_provider`] so the pipeline and chat engine never know which
//! model is behind the trait.


pub mod gemini;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;
use gemini::GeminiProvider;

/// An actionable item extracted from note text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedReminder {
    pub text: String,
    pub due_date: Option<NaiveDate>,
}

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generate an embedding vector for the given text.
    ///
    /// Empty or whitespace-only input returns an empty vector without
    /// calling the model; callers treat that as "do not index".
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Answer a prompt using only the supplied context.
    async fn complete(&self, prompt: &str, context: &str) -> Result<String>;

    /// Extract actionable reminders from note text, with dates resolved
    /// relative to `reference_date`. Malformed model output parses to an
    /// empty list; only transport and auth failures are errors.
    async fn extract_reminders(
        &self,
        text: &str,
        reference_date: NaiveDate,
    ) -> Result<Vec<ExtractedReminder>>;
}

/// Build the configured provider backend.
///
/// Replaces the ambient env-var switch from earlier iterations: the caller
/// owns the configuration object, which makes swapping in a fake provider
/// for tests a matter of constructing the consumer directly.
#[inline]
pub fn create_provider(config: &Config) -> Result<Arc<dyn AiProvider>> {
    if !config.gemini.has_api_key() {
        warn!("No Gemini API key configured; AI calls will fail until one is set");
    }

    let provider = GeminiProvider::new(&config.gemini)?;
    Ok(Arc::new(provider))
}

/// Strip markdown code fences from a model response.
///
/// Models frequently wrap JSON output in triple backticks with an optional
/// `json` tag; the fences have to go before the payload can be parsed.
pub fn strip_code_fences(response: &str) -> String {
    response
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}
