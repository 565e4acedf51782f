
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{AiProvider, ExtractedReminder, strip_code_fences};
use crate::config::GeminiConfig;

const COMPLETION_SYSTEM_PROMPT: &str = "You are an intelligent assistant for a note-taking app.\n\
    Answer the user's question based ONLY on the provided context (notes).\n\
    If the answer is not in the context, say \"I don't have enough information in your notes to answer that.\"";

/// Client for the Google Generative Language REST API.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    content: RequestContent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Reminder record as emitted by the model, before date parsing.
#[derive(Debug, Deserialize)]
struct RawReminder {
    text: String,
    #[serde(default)]
    due_date: Option<String>,
}

impl GeminiProvider {
    #[inline]
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        config
            .validate()
            .context("Invalid Gemini configuration")?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            agent,
        })
    }

    fn endpoint(&self, model: &str, operation: &str) -> Result<String> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "No Gemini API key configured; run the config command to set one"
            ));
        }

        Ok(format!(
            "{}/models/{}:{}?key={}",
            self.base_url, model, operation, self.api_key
        ))
    }

    /// Single-attempt POST of a JSON body. Failures surface to the caller;
    /// the enrichment pipeline's re-trigger-on-edit semantics provide retry.
    fn post_json(&self, url: &str, body: &str) -> Result<String> {
        self.agent
            .post(url)
            .header("Content-Type", "application/json")
            .send(body)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|error| match error {
                ureq::Error::StatusCode(status) => {
                    anyhow::anyhow!("Gemini API returned HTTP {}", status)
                }
                other => anyhow::anyhow!("Gemini API request failed: {}", other),
            })
    }

    fn generate_text(&self, parts: Vec<String>) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: parts.into_iter().map(|text| RequestPart { text }).collect(),
            }],
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize generation request")?;

        let url = self.endpoint(&self.model, "generateContent")?;
        let response_text = self
            .post_json(&url, &request_json)
            .context("Failed to generate completion")?;

        let response: GenerateResponse = serde_json::from_str(&response_text)
            .context("Failed to parse generation response")?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Generation response contained no candidates"))?;

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect();

        Ok(text)
    }

    fn extraction_prompt(text: &str, reference_date: NaiveDate) -> String {
        format!(
            "Analyze the following note content and extract any actionable reminders, tasks, or events (like meetings).\n\
             \n\
             Context: Today is {date}.\n\
             \n\
             Return a JSON array of objects with:\n\
             - \"text\": The description of the reminder/task.\n\
             - \"due_date\": The date in YYYY-MM-DD format. If a specific date is mentioned (e.g. \"Nov 24\"), use the current year ({year}) unless specified otherwise. If relative (e.g. \"tomorrow\"), calculate it based on today's date. If no date is mentioned, use null.\n\
             \n\
             If no reminders are found, return an empty array [].\n\
             \n\
             Note Content:\n\
             {text}\n\
             \n\
             Output JSON only:",
            date = reference_date.format("%Y-%m-%d"),
            year = reference_date.year(),
            text = text,
        )
    }

    fn parse_reminders(response: &str) -> Vec<ExtractedReminder> {
        let payload = strip_code_fences(response);

        let raw: Vec<RawReminder> = match serde_json::from_str(&payload) {
            Ok(raw) => raw,
            Err(error) => {
                // Malformed output is treated as "nothing found", never an error.
                warn!("Discarding malformed reminder extraction output: {}", error);
                return Vec::new();
            }
        };

        raw.into_iter()
            .map(|reminder| {
                let due_date = reminder.due_date.as_deref().and_then(|date| {
                    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
                        Ok(parsed) => Some(parsed),
                        Err(_) => {
                            warn!("Ignoring unparseable due date from model: {}", date);
                            None
                        }
                    }
                });

                ExtractedReminder {
                    text: reminder.text,
                    due_date,
                }
            })
            .collect()
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    #[inline]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embedding for text (length: {})", text.len());

        let request = EmbedRequest {
            content: RequestContent {
                parts: vec![RequestPart {
                    text: text.to_string(),
                }],
            },
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embedding request")?;

        let url = self.endpoint(&self.embedding_model, "embedContent")?;
        let response_text = self
            .post_json(&url, &request_json)
            .context("Failed to generate embedding")?;

        let response: EmbedResponse = serde_json::from_str(&response_text)
            .context("Failed to parse embedding response")?;

        debug!(
            "Generated embedding with {} dimensions",
            response.embedding.values.len()
        );

        Ok(response.embedding.values)
    }

    #[inline]
    async fn complete(&self, prompt: &str, context: &str) -> Result<String> {
        debug!(
            "Generating completion (prompt length: {}, context length: {})",
            prompt.len(),
            context.len()
        );

        let system_prompt = format!("{}\n\nContext:\n{}", COMPLETION_SYSTEM_PROMPT, context);
        self.generate_text(vec![system_prompt, prompt.to_string()])
    }

    #[inline]
    async fn extract_reminders(
        &self,
        text: &str,
        reference_date: NaiveDate,
    ) -> Result<Vec<ExtractedReminder>> {
        debug!(
            "Extracting reminders (text length: {}, reference date: {})",
            text.len(),
            reference_date
        );

        let prompt = Self::extraction_prompt(text, reference_date);
        let response = self.generate_text(vec![prompt])?;

        let reminders = Self::parse_reminders(&response);
        debug!("Extracted {} reminders", reminders.len());
        Ok(reminders)
    }
}
