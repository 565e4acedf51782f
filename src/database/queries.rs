use super::models::*;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

use crate::provider::ExtractedReminder;

pub struct FolderQueries;

impl FolderQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, name: &str) -> Result<Folder> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query("INSERT INTO folders (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(now)
            .execute(pool)
            .await
            .context("Failed to create folder")?
            .last_insert_rowid();

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created folder"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT id, name, created_at FROM folders WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Failed to get folder by id")
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT id, name, created_at FROM folders ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list folders")
    }

    #[inline]
    pub async fn rename(pool: &SqlitePool, id: i64, name: &str) -> Result<Option<Folder>> {
        let affected = sqlx::query("UPDATE folders SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to rename folder")?
            .rows_affected();

        if affected == 0 {
            return Ok(None);
        }
        Self::get_by_id(pool, id).await
    }

    #[inline]
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM folders WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete folder")?
            .rows_affected();

        Ok(affected > 0)
    }
}

pub struct NoteQueries;

impl NoteQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_note: NewNote) -> Result<Note> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO notes (folder_id, title, content, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(new_note.folder_id)
        .bind(&new_note.title)
        .bind(&new_note.content)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create note")?
        .last_insert_rowid();

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created note"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Note>> {
        sqlx::query_as::<_, Note>(
            "SELECT id, folder_id, title, content, created_at, updated_at FROM notes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get note by id")
    }

    #[inline]
    pub async fn list_by_folder(pool: &SqlitePool, folder_id: i64) -> Result<Vec<Note>> {
        sqlx::query_as::<_, Note>(
            "SELECT id, folder_id, title, content, created_at, updated_at
             FROM notes WHERE folder_id = ? ORDER BY updated_at DESC",
        )
        .bind(folder_id)
        .fetch_all(pool)
        .await
        .context("Failed to list notes for folder")
    }

    /// Refresh a note's title and content, touching `updated_at`.
    #[inline]
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        title: &str,
        content: &str,
    ) -> Result<Option<Note>> {
        let now = Utc::now().naive_utc();
        let affected =
            sqlx::query("UPDATE notes SET title = ?, content = ?, updated_at = ? WHERE id = ?")
                .bind(title)
                .bind(content)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to update note")?
                .rows_affected();

        if affected == 0 {
            return Ok(None);
        }
        Self::get_by_id(pool, id).await
    }

    #[inline]
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete note")?
            .rows_affected();

        Ok(affected > 0)
    }
}

pub struct EmbeddingQueries;

impl EmbeddingQueries {
    /// Replace the note's embedding wholesale. At most one row per note.
    #[inline]
    pub async fn upsert(pool: &SqlitePool, note_id: i64, vector: &[f32]) -> Result<()> {
        let serialized =
            serde_json::to_string(vector).context("Failed to serialize embedding vector")?;

        sqlx::query("INSERT OR REPLACE INTO embeddings (note_id, vector) VALUES (?, ?)")
            .bind(note_id)
            .bind(serialized)
            .execute(pool)
            .await
            .context("Failed to upsert embedding")?;

        debug!(
            "Stored embedding for note {} ({} dimensions)",
            note_id,
            vector.len()
        );
        Ok(())
    }

    #[inline]
    pub async fn get(pool: &SqlitePool, note_id: i64) -> Result<Option<Vec<f32>>> {
        let row = sqlx::query("SELECT vector FROM embeddings WHERE note_id = ?")
            .bind(note_id)
            .fetch_optional(pool)
            .await
            .context("Failed to get embedding")?;

        match row {
            Some(row) => {
                let serialized: String = row.get("vector");
                let vector = serde_json::from_str(&serialized)
                    .context("Failed to deserialize embedding vector")?;
                Ok(Some(vector))
            }
            None => Ok(None),
        }
    }

    /// All (note_id, vector) pairs. Rows whose stored vector fails to decode
    /// are skipped rather than failing the whole load.
    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<(i64, Vec<f32>)>> {
        let rows = sqlx::query("SELECT note_id, vector FROM embeddings")
            .fetch_all(pool)
            .await
            .context("Failed to list embeddings")?;

        let mut embeddings = Vec::with_capacity(rows.len());
        for row in rows {
            let note_id: i64 = row.get("note_id");
            let serialized: String = row.get("vector");
            match serde_json::from_str::<Vec<f32>>(&serialized) {
                Ok(vector) => embeddings.push((note_id, vector)),
                Err(error) => {
                    warn!(
                        "Skipping undecodable embedding for note {}: {}",
                        note_id, error
                    );
                }
            }
        }

        Ok(embeddings)
    }
}

pub struct ReminderQueries;

impl ReminderQueries {
    /// Replace the note's pending reminders with a freshly extracted batch,
    /// atomically. Accepted and dismissed rows are user history and are
    /// never touched.
    #[inline]
    pub async fn replace_pending(
        pool: &SqlitePool,
        note_id: i64,
        reminders: &[ExtractedReminder],
    ) -> Result<()> {
        let now = Utc::now().naive_utc();
        let mut tx = pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM reminders WHERE note_id = ? AND status = 'pending'")
            .bind(note_id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear pending reminders")?;

        for reminder in reminders {
            sqlx::query(
                "INSERT INTO reminders (note_id, text, due_date, status, created_at)
                 VALUES (?, ?, ?, 'pending', ?)",
            )
            .bind(note_id)
            .bind(&reminder.text)
            .bind(reminder.due_date)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to insert reminder")?;
        }

        tx.commit().await.context("Failed to commit reminders")?;

        debug!(
            "Replaced pending reminders for note {} ({} new)",
            note_id,
            reminders.len()
        );
        Ok(())
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Reminder>> {
        sqlx::query_as::<_, Reminder>(
            "SELECT id, note_id, text, due_date, status, created_at FROM reminders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get reminder by id")
    }

    #[inline]
    pub async fn list_for_note(pool: &SqlitePool, note_id: i64) -> Result<Vec<Reminder>> {
        sqlx::query_as::<_, Reminder>(
            "SELECT id, note_id, text, due_date, status, created_at
             FROM reminders WHERE note_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(note_id)
        .fetch_all(pool)
        .await
        .context("Failed to list reminders for note")
    }

    #[inline]
    pub async fn list_pending_for_note(pool: &SqlitePool, note_id: i64) -> Result<Vec<Reminder>> {
        sqlx::query_as::<_, Reminder>(
            "SELECT id, note_id, text, due_date, status, created_at
             FROM reminders WHERE note_id = ? AND status = 'pending'
             ORDER BY created_at ASC, id ASC",
        )
        .bind(note_id)
        .fetch_all(pool)
        .await
        .context("Failed to list pending reminders for note")
    }

    #[inline]
    pub async fn list_all_pending(pool: &SqlitePool) -> Result<Vec<Reminder>> {
        sqlx::query_as::<_, Reminder>(
            "SELECT id, note_id, text, due_date, status, created_at
             FROM reminders WHERE status = 'pending'
             ORDER BY due_date IS NULL, due_date ASC, id ASC",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list pending reminders")
    }

    /// Resolve a pending reminder. `accepted` and `dismissed` are terminal:
    /// the guarded UPDATE refuses to move a reminder that is no longer
    /// pending, so user decisions survive later edits.
    #[inline]
    pub async fn set_status(
        pool: &SqlitePool,
        id: i64,
        status: ReminderStatus,
    ) -> Result<Reminder> {
        let affected = sqlx::query(
            "UPDATE reminders SET status = ? WHERE id = ? AND status = 'pending'",
        )
        .bind(status)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update reminder status")?
        .rows_affected();

        if affected == 0 {
            let existing = Self::get_by_id(pool, id).await?;
            return match existing {
                Some(reminder) => Err(anyhow::anyhow!(
                    "Reminder {} is already {} and cannot change status",
                    id,
                    reminder.status
                )),
                None => Err(anyhow::anyhow!("Reminder not found: {}", id)),
            };
        }

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve updated reminder"))
    }
}

pub struct ConversationQueries;

impl ConversationQueries {
    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Conversation>> {
        sqlx::query_as::<_, Conversation>(
            "SELECT id, title, created_at, updated_at FROM conversations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get conversation by id")
    }

    /// Conversations ordered most-recently-active first.
    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Conversation>> {
        sqlx::query_as::<_, Conversation>(
            "SELECT id, title, created_at, updated_at FROM conversations ORDER BY updated_at DESC",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list conversations")
    }

    #[inline]
    pub async fn update_title(
        pool: &SqlitePool,
        id: i64,
        title: &str,
    ) -> Result<Option<Conversation>> {
        let now = Utc::now().naive_utc();
        let affected =
            sqlx::query("UPDATE conversations SET title = ?, updated_at = ? WHERE id = ?")
                .bind(title)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to update conversation title")?
                .rows_affected();

        if affected == 0 {
            return Ok(None);
        }
        Self::get_by_id(pool, id).await
    }

    #[inline]
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete conversation")?
            .rows_affected();

        Ok(affected > 0)
    }

    /// Messages in turn order.
    #[inline]
    pub async fn list_messages(pool: &SqlitePool, conversation_id: i64) -> Result<Vec<ChatMessage>> {
        sqlx::query_as::<_, ChatMessage>(
            "SELECT id, conversation_id, role, content, created_at
             FROM chat_messages WHERE conversation_id = ?
             ORDER BY created_at ASC, id ASC",
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await
        .context("Failed to list chat messages")
    }

    /// Note ids that have contributed context to the conversation.
    #[inline]
    pub async fn list_linked_notes(pool: &SqlitePool, conversation_id: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query(
            "SELECT note_id FROM conversation_notes WHERE conversation_id = ? ORDER BY note_id ASC",
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await
        .context("Failed to list linked notes")?;

        Ok(rows.iter().map(|row| row.get("note_id")).collect())
    }

    /// Persist one question/answer turn atomically: create the conversation
    /// when no id is given, append the user then the ai message, record note
    /// links (duplicates ignored), and refresh `updated_at`. Either the whole
    /// turn lands or none of it does.
    #[inline]
    pub async fn record_turn(
        pool: &SqlitePool,
        conversation_id: Option<i64>,
        title: &str,
        question: &str,
        answer: &str,
        note_ids: &[i64],
    ) -> Result<i64> {
        let now = Utc::now().naive_utc();
        let mut tx = pool.begin().await.context("Failed to begin transaction")?;

        let conversation_id = match conversation_id {
            Some(id) => {
                let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM conversations WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await
                    .context("Failed to look up conversation")?;
                exists.ok_or_else(|| anyhow::anyhow!("Conversation not found: {}", id))?
            }
            None => sqlx::query(
                "INSERT INTO conversations (title, created_at, updated_at) VALUES (?, ?, ?)",
            )
            .bind(title)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to create conversation")?
            .last_insert_rowid(),
        };

        for (role, content) in [(MessageRole::User, question), (MessageRole::Ai, answer)] {
            sqlx::query(
                "INSERT INTO chat_messages (conversation_id, role, content, created_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(conversation_id)
            .bind(role)
            .bind(content)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("Failed to append chat message")?;
        }

        for note_id in note_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO conversation_notes (conversation_id, note_id) VALUES (?, ?)",
            )
            .bind(conversation_id)
            .bind(note_id)
            .execute(&mut *tx)
            .await
            .context("Failed to link note to conversation")?;
        }

        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await
            .context("Failed to touch conversation")?;

        tx.commit().await.context("Failed to commit turn")?;

        debug!(
            "Recorded turn for conversation {} ({} linked notes)",
            conversation_id,
            note_ids.len()
        );
        Ok(conversation_id)
    }
}
