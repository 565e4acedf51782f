#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests for the full enrichment + chat path
// Exercises note CRUD, embedding search, reminder lifecycle, and
// conversation persistence against a scripted provider

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::TempDir;

use notes_ai::chat::{ChatEngine, FALLBACK_ANSWER};
use notes_ai::database::{
    ConversationQueries, Database, FolderQueries, MessageRole, NewNote, NoteQueries,
    ReminderQueries, ReminderStatus,
};
use notes_ai::enrichment::EnrichmentPipeline;
use notes_ai::provider::{AiProvider, ExtractedReminder};
use notes_ai::search::VectorIndex;

const KEYWORDS: [&str; 6] = ["paris", "trip", "louvre", "grocery", "milk", "bob"];

/// Deterministic provider: embeddings are keyword-count vectors, reminders
/// fire on the word "tomorrow", answers echo whether context was supplied.
struct ScriptedProvider {
    fail_completions: bool,
}

impl ScriptedProvider {
    fn working() -> Arc<Self> {
        Arc::new(Self {
            fail_completions: false,
        })
    }

    fn broken() -> Arc<Self> {
        Arc::new(Self {
            fail_completions: true,
        })
    }
}

#[async_trait]
impl AiProvider for ScriptedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let lower = text.to_lowercase();
        Ok(KEYWORDS
            .iter()
            .map(|keyword| lower.matches(keyword).count() as f32)
            .collect())
    }

    async fn complete(&self, _prompt: &str, context: &str) -> Result<String> {
        if self.fail_completions {
            return Err(anyhow!("completion backend unavailable"));
        }
        if context.trim().is_empty() {
            Ok("I don't have any notes about that.".to_string())
        } else {
            Ok(format!("Answered from notes: {}", context.lines().next().unwrap_or("")))
        }
    }

    async fn extract_reminders(
        &self,
        text: &str,
        reference_date: NaiveDate,
    ) -> Result<Vec<ExtractedReminder>> {
        if text.to_lowercase().contains("tomorrow") {
            Ok(vec![ExtractedReminder {
                text: "Meet Bob at 3pm".to_string(),
                due_date: reference_date.succ_opt(),
            }])
        } else {
            Ok(Vec::new())
        }
    }
}

async fn create_test_setup() -> Result<(Database, TempDir)> {
    let temp_dir = TempDir::new()?;
    let database = Database::new(temp_dir.path().join("notes.db")).await?;
    Ok((database, temp_dir))
}

async fn create_note(database: &Database, folder_id: i64, title: &str, content: &str) -> i64 {
    NoteQueries::create(
        database.pool(),
        NewNote {
            folder_id,
            title: title.to_string(),
            content: content.to_string(),
        },
    )
    .await
    .expect("can create note")
    .id
}

fn june_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
}

/// End-to-end: create notes, enrich them, and verify a question retrieves
/// the semantically closest note as context.
#[tokio::test]
async fn enriched_notes_answer_questions_with_the_right_context() {
    let (database, _temp_dir) = create_test_setup().await.expect("can create test setup");
    let provider = ScriptedProvider::working();

    let folder = FolderQueries::create(database.pool(), "Personal")
        .await
        .expect("can create folder");
    let travel_id = create_note(
        &database,
        folder.id,
        "Paris trip",
        "Visit the Louvre in May, book flights",
    )
    .await;
    let grocery_id = create_note(&database, folder.id, "Grocery list", "Milk, eggs, bread").await;

    let pipeline = EnrichmentPipeline::new(database.clone(), Arc::clone(&provider) as Arc<dyn AiProvider>);
    pipeline
        .enrich(travel_id, june_first())
        .await
        .expect("can enrich travel note");
    pipeline
        .enrich(grocery_id, june_first())
        .await
        .expect("can enrich grocery note");

    // Both notes are indexed, and the travel question ranks the travel
    // note first.
    let index = VectorIndex::load(database.pool())
        .await
        .expect("can load index");
    assert_eq!(index.len(), 2);

    let query = provider
        .embed("When is my Paris trip to the Louvre?")
        .await
        .expect("can embed query");
    let hits = index.search(&query, 5);
    assert_eq!(hits[0].note_id, travel_id);

    let engine = ChatEngine::new(database.clone(), provider);
    let outcome = engine
        .ask("When is my Paris trip to the Louvre?", None)
        .await
        .expect("can ask");

    assert!(outcome.answer.starts_with("Answered from notes:"));
    assert!(
        outcome.answer.contains("Paris trip"),
        "travel note leads the context block"
    );

    let conversation_id = outcome.conversation_id.expect("conversation created");
    let linked = ConversationQueries::list_linked_notes(database.pool(), conversation_id)
        .await
        .expect("can list linked notes");
    assert!(linked.contains(&travel_id));
}

/// Reminder lifecycle: extraction on create, user acceptance, and survival
/// of the accepted row across a re-enrichment that extracts a new batch.
#[tokio::test]
async fn reminder_lifecycle_across_edits() {
    let (database, _temp_dir) = create_test_setup().await.expect("can create test setup");
    let provider = ScriptedProvider::working();

    let folder = FolderQueries::create(database.pool(), "Work")
        .await
        .expect("can create folder");
    let note_id = create_note(&database, folder.id, "Standup", "Meet Bob tomorrow at 3pm").await;

    let pipeline = EnrichmentPipeline::new(database.clone(), provider);
    pipeline
        .enrich(note_id, june_first())
        .await
        .expect("can enrich");

    let pending = ReminderQueries::list_pending_for_note(database.pool(), note_id)
        .await
        .expect("can list pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].text, "Meet Bob at 3pm");
    assert_eq!(
        pending[0].due_date,
        Some(NaiveDate::from_ymd_opt(2024, 6, 2).expect("valid date")),
        "\"tomorrow\" resolves against the reference date"
    );

    // User accepts, then the note is edited and re-enriched. The extraction
    // fires again but may not resurrect or duplicate the accepted reminder.
    let accepted = ReminderQueries::set_status(database.pool(), pending[0].id, ReminderStatus::Accepted)
        .await
        .expect("can accept");
    assert_eq!(accepted.status, ReminderStatus::Accepted);

    NoteQueries::update(
        database.pool(),
        note_id,
        "Standup",
        "Meet Bob tomorrow at 4pm instead",
    )
    .await
    .expect("can update note");

    let provider = ScriptedProvider::working();
    let pipeline = EnrichmentPipeline::new(database.clone(), provider);
    pipeline
        .enrich(note_id, june_first())
        .await
        .expect("can re-enrich");

    let all = ReminderQueries::list_for_note(database.pool(), note_id)
        .await
        .expect("can list reminders");
    assert_eq!(all.len(), 2);
    assert_eq!(
        all.iter()
            .filter(|r| r.status == ReminderStatus::Accepted)
            .count(),
        1
    );
    assert_eq!(all.iter().filter(|r| r.is_pending()).count(), 1);

    // Accepted is terminal.
    let result =
        ReminderQueries::set_status(database.pool(), accepted.id, ReminderStatus::Dismissed).await;
    assert!(result.is_err());
}

/// A question asked before anything is indexed still gets an answer and a
/// recorded conversation.
#[tokio::test]
async fn asking_with_an_empty_index_still_records_the_turn() {
    let (database, _temp_dir) = create_test_setup().await.expect("can create test setup");

    let engine = ChatEngine::new(database.clone(), ScriptedProvider::working());
    let outcome = engine
        .ask("What are my plans for June?", None)
        .await
        .expect("can ask");

    assert_eq!(outcome.answer, "I don't have any notes about that.");
    let conversation_id = outcome.conversation_id.expect("conversation created");

    let messages = ConversationQueries::list_messages(database.pool(), conversation_id)
        .await
        .expect("can list messages");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[1].role, MessageRole::Ai);
}

/// Long questions become truncated conversation titles; short ones are
/// used verbatim.
#[tokio::test]
async fn conversation_titles_follow_the_question() {
    let (database, _temp_dir) = create_test_setup().await.expect("can create test setup");
    let engine = ChatEngine::new(database.clone(), ScriptedProvider::working());

    let short = "Where did I put the keys?";
    let outcome = engine.ask(short, None).await.expect("can ask");
    let short_id = outcome.conversation_id.expect("conversation created");

    let long = "x".repeat(51);
    let outcome = engine.ask(&long, None).await.expect("can ask");
    let long_id = outcome.conversation_id.expect("conversation created");

    let short_conversation = ConversationQueries::get_by_id(database.pool(), short_id)
        .await
        .expect("can get conversation")
        .expect("conversation exists");
    assert_eq!(short_conversation.title, short);

    let long_conversation = ConversationQueries::get_by_id(database.pool(), long_id)
        .await
        .expect("can get conversation")
        .expect("conversation exists");
    assert_eq!(long_conversation.title, format!("{}...", "x".repeat(50)));
}

/// Provider outages surface as the fixed fallback answer and leave no
/// trace in the database.
#[tokio::test]
async fn provider_outage_degrades_to_the_fallback_answer() {
    let (database, _temp_dir) = create_test_setup().await.expect("can create test setup");

    let engine = ChatEngine::new(database.clone(), ScriptedProvider::broken());
    let outcome = engine.ask("Anything?", None).await.expect("can ask");

    assert_eq!(outcome.answer, FALLBACK_ANSWER);
    assert_eq!(outcome.conversation_id, None);

    let conversations = ConversationQueries::list_all(database.pool())
        .await
        .expect("can list conversations");
    assert!(conversations.is_empty());
}

/// Deleting a note removes it from search results and from reminder
/// listings without disturbing recorded conversations.
#[tokio::test]
async fn note_deletion_cleans_up_derived_state() {
    let (database, _temp_dir) = create_test_setup().await.expect("can create test setup");
    let provider = ScriptedProvider::working();

    let folder = FolderQueries::create(database.pool(), "Inbox")
        .await
        .expect("can create folder");
    let note_id = create_note(&database, folder.id, "Standup", "Meet Bob tomorrow").await;

    let pipeline = EnrichmentPipeline::new(database.clone(), Arc::clone(&provider) as Arc<dyn AiProvider>);
    pipeline
        .enrich(note_id, june_first())
        .await
        .expect("can enrich");

    let engine = ChatEngine::new(database.clone(), provider);
    let outcome = engine
        .ask("What is Bob up to?", None)
        .await
        .expect("can ask");
    let conversation_id = outcome.conversation_id.expect("conversation created");

    NoteQueries::delete(database.pool(), note_id)
        .await
        .expect("can delete note");

    let index = VectorIndex::load(database.pool())
        .await
        .expect("can load index");
    assert!(index.is_empty());
    assert!(
        ReminderQueries::list_all_pending(database.pool())
            .await
            .expect("can list pending")
            .is_empty()
    );

    // The conversation transcript survives; only the note link is gone.
    let messages = ConversationQueries::list_messages(database.pool(), conversation_id)
        .await
        .expect("can list messages");
    assert_eq!(messages.len(), 2);
    let linked = ConversationQueries::list_linked_notes(database.pool(), conversation_id)
        .await
        .expect("can list linked notes");
    assert!(linked.is_empty());
}
