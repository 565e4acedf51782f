//! Question answering over notes.
//!
//! One `ask` turn embeds the question, retrieves the closest notes, builds a
//! context block, and has the provider answer from that context alone. A
//! successful turn is persisted atomically; a failed one degrades to a fixed
//! fallback answer and writes nothing.


use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::database::Database;
use crate::database::queries::{ConversationQueries, NoteQueries};
use crate::provider::AiProvider;
use crate::search::VectorIndex;

/// Answer returned when any step of the retrieval/generation path fails.
pub const FALLBACK_ANSWER: &str = "Sorry, I encountered an error while thinking.";

/// How many notes are retrieved as context for a question.
pub const CONTEXT_NOTE_LIMIT: usize = 5;

/// Conversation titles longer than this are truncated with an ellipsis.
pub const TITLE_MAX_CHARS: usize = 50;

/// Outcome of one ask turn. `conversation_id` is `None` when the turn
/// failed and nothing was persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskOutcome {
    pub answer: String,
    pub conversation_id: Option<i64>,
}

pub struct ChatEngine {
    database: Database,
    provider: Arc<dyn AiProvider>,
}

impl ChatEngine {
    #[inline]
    pub fn new(database: Database, provider: Arc<dyn AiProvider>) -> Self {
        Self { database, provider }
    }

    /// Answer a question from the user's notes.
    ///
    /// Passing an existing `conversation_id` appends the turn to that
    /// conversation; `None` starts a new one titled after the question.
    /// Retrieval or generation failures return [`FALLBACK_ANSWER`] with no
    /// conversation id and leave the database untouched; only persistence
    /// failures propagate as errors.
    #[inline]
    pub async fn ask(&self, question: &str, conversation_id: Option<i64>) -> Result<AskOutcome> {
        match self.answer_from_notes(question).await {
            Ok((answer, note_ids)) => {
                let conversation_id = ConversationQueries::record_turn(
                    self.database.pool(),
                    conversation_id,
                    &conversation_title(question),
                    question,
                    &answer,
                    &note_ids,
                )
                .await?;

                Ok(AskOutcome {
                    answer,
                    conversation_id: Some(conversation_id),
                })
            }
            Err(error) => {
                warn!("Answering failed, returning fallback: {:#}", error);
                Ok(AskOutcome {
                    answer: FALLBACK_ANSWER.to_string(),
                    conversation_id: None,
                })
            }
        }
    }

    async fn answer_from_notes(&self, question: &str) -> Result<(String, Vec<i64>)> {
        let query_vector = self
            .provider
            .embed(question)
            .await
            .context("Failed to embed question")?;

        let index = VectorIndex::load(self.database.pool()).await?;
        let hits = index.search(&query_vector, CONTEXT_NOTE_LIMIT);
        debug!("Retrieved {} context notes for question", hits.len());

        let mut context_blocks = Vec::with_capacity(hits.len());
        let mut note_ids = Vec::with_capacity(hits.len());
        for hit in &hits {
            // A note deleted between index load and here just drops out of
            // the context.
            if let Some(note) = NoteQueries::get_by_id(self.database.pool(), hit.note_id).await? {
                context_blocks.push(format!("Title: {}\nContent: {}", note.title, note.content));
                note_ids.push(note.id);
            }
        }

        let answer = self
            .provider
            .complete(question, &context_blocks.join("\n\n"))
            .await
            .context("Failed to generate answer")?;

        Ok((answer, note_ids))
    }
}

/// Derive a conversation title from the first question: short questions are
/// used verbatim, long ones are cut at [`TITLE_MAX_CHARS`] characters with a
/// trailing ellipsis.
pub fn conversation_title(question: &str) -> String {
    if question.chars().count() <= TITLE_MAX_CHARS {
        question.to_string()
    } else {
        let truncated: String = question.chars().take(TITLE_MAX_CHARS).collect();
        format!("{truncated}...")
    }
}
