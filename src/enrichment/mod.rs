//! Note enrichment pipeline.
//!
//! Derives AI state (embedding + extracted reminders) from note text after
//! every create or update. The pipeline owns nothing durable beyond what it
//! writes to the embeddings and reminders tables; a failed run leaves the
//! note untouched and the next edit re-triggers enrichment, which is the
//! retry mechanism.


use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::database::Database;
use crate::database::queries::{EmbeddingQueries, NoteQueries, ReminderQueries};
use crate::provider::AiProvider;

pub struct EnrichmentPipeline {
    database: Database,
    provider: Arc<dyn AiProvider>,
    // One lock per note id: enrichment runs for the same note are strictly
    // serialized, runs for different notes are independent.
    note_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl EnrichmentPipeline {
    #[inline]
    pub fn new(database: Database, provider: Arc<dyn AiProvider>) -> Self {
        Self {
            database,
            provider,
            note_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Enrich a note, logging and swallowing any failure. Note CRUD callers
    /// must never observe an AI error.
    #[inline]
    pub async fn run(&self, note_id: i64, today: NaiveDate) {
        if let Err(error) = self.enrich(note_id, today).await {
            error!("Enrichment failed for note {}: {:#}", note_id, error);
        }
    }

    /// Enrich a note: embed its text and replace its pending reminders.
    ///
    /// The run operates on the newest note content (re-read under the
    /// per-note lock) and stamps it with `updated_at`; if the note changes
    /// underneath a slow provider call, the stale results are discarded so
    /// the newer edit's enrichment wins.
    #[inline]
    pub async fn enrich(&self, note_id: i64, today: NaiveDate) -> Result<()> {
        let lock = self.lock_for(note_id).await;
        let _guard = lock.lock().await;

        let note = NoteQueries::get_by_id(self.database.pool(), note_id).await?;
        let Some(note) = note else {
            debug!("Skipping enrichment for deleted note {}", note_id);
            return Ok(());
        };

        let version = note.updated_at;
        let text = note.enrichment_text();

        let vector = self
            .provider
            .embed(&text)
            .await
            .context("Embedding generation failed")?;

        if vector.is_empty() {
            debug!("Note {} has no embeddable content; leaving it unindexed", note_id);
        } else if self.note_is_current(note_id, version).await? {
            EmbeddingQueries::upsert(self.database.pool(), note_id, &vector).await?;
        } else {
            debug!("Discarding superseded embedding for note {}", note_id);
            return Ok(());
        }

        let reminders = self
            .provider
            .extract_reminders(&text, today)
            .await
            .context("Reminder extraction failed")?;

        // Only a successful non-empty extraction replaces the pending set.
        // An empty result may mean "nothing found" and must not wipe
        // previously suggested items.
        if reminders.is_empty() {
            debug!("No reminders extracted for note {}", note_id);
        } else if self.note_is_current(note_id, version).await? {
            ReminderQueries::replace_pending(self.database.pool(), note_id, &reminders).await?;
            info!(
                "Extracted {} reminders for note {}",
                reminders.len(),
                note_id
            );
        } else {
            debug!("Discarding superseded reminders for note {}", note_id);
        }

        Ok(())
    }

    async fn lock_for(&self, note_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.note_locks.lock().await;
        Arc::clone(locks.entry(note_id).or_default())
    }

    async fn note_is_current(&self, note_id: i64, version: NaiveDateTime) -> Result<bool> {
        let note = NoteQueries::get_by_id(self.database.pool(), note_id).await?;
        Ok(note.is_some_and(|note| note.updated_at == version))
    }
}
