use anyhow::{Context, Result};
use chrono::Local;
use tracing::{info, warn};

use crate::chat::ChatEngine;
use crate::config::{Config, get_config_dir};
use crate::database::{
    ConversationQueries, Database, FolderQueries, NewNote, NoteQueries, ReminderQueries,
    ReminderStatus,
};
use crate::enrichment::EnrichmentPipeline;
use crate::provider::create_provider;

async fn open_database() -> Result<Database> {
    let config_dir = get_config_dir()?;
    Database::initialize_from_config_dir(&config_dir)
        .await
        .context("Failed to initialize database")
}

/// Run enrichment for a note after a create or update. Never fails the
/// calling command; an unreachable provider just means the note stays
/// unindexed until the next edit.
async fn enrich_note(database: &Database, note_id: i64) {
    let config = match Config::load() {
        Ok(config) => config,
        Err(error) => {
            warn!("Skipping enrichment, configuration unavailable: {:#}", error);
            return;
        }
    };

    let provider = match create_provider(&config) {
        Ok(provider) => provider,
        Err(error) => {
            warn!("Skipping enrichment, provider unavailable: {:#}", error);
            return;
        }
    };

    let pipeline = EnrichmentPipeline::new(database.clone(), provider);
    pipeline.run(note_id, Local::now().date_naive()).await;
}

/// Create a new folder
#[inline]
pub async fn add_folder(name: String) -> Result<()> {
    let database = open_database().await?;

    let folder = FolderQueries::create(database.pool(), &name)
        .await
        .context("Failed to create folder")?;

    println!("Created folder: {} (ID: {})", folder.name, folder.id);
    Ok(())
}

/// List all folders with their note counts
#[inline]
pub async fn list_folders() -> Result<()> {
    let database = open_database().await?;

    let folders = FolderQueries::list_all(database.pool())
        .await
        .context("Failed to list folders")?;

    if folders.is_empty() {
        println!("No folders yet.");
        println!("Use 'notes-ai folder add <name>' to create one.");
        return Ok(());
    }

    println!("Folders ({} total):", folders.len());
    for folder in &folders {
        let notes = NoteQueries::list_by_folder(database.pool(), folder.id).await?;
        println!(
            "  {} (ID: {}) - {} notes, created {}",
            folder.name,
            folder.id,
            notes.len(),
            folder.created_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}

/// Rename a folder
#[inline]
pub async fn rename_folder(id: i64, name: String) -> Result<()> {
    let database = open_database().await?;

    let folder = FolderQueries::rename(database.pool(), id, &name)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Folder not found: {}", id))?;

    println!("Renamed folder {} to: {}", folder.id, folder.name);
    Ok(())
}

/// Delete a folder and everything in it
#[inline]
pub async fn delete_folder(id: i64) -> Result<()> {
    let database = open_database().await?;

    let folder = FolderQueries::get_by_id(database.pool(), id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Folder not found: {}", id))?;
    let notes = NoteQueries::list_by_folder(database.pool(), id).await?;

    FolderQueries::delete(database.pool(), id).await?;

    println!(
        "Deleted folder: {} ({} notes and their reminders removed)",
        folder.name,
        notes.len()
    );
    Ok(())
}

/// Create a note and enrich it
#[inline]
pub async fn add_note(folder_id: i64, title: String, content: String) -> Result<()> {
    let database = open_database().await?;

    FolderQueries::get_by_id(database.pool(), folder_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Folder not found: {}", folder_id))?;

    let note = NoteQueries::create(
        database.pool(),
        NewNote {
            folder_id,
            title,
            content,
        },
    )
    .await
    .context("Failed to create note")?;

    println!("Created note: {} (ID: {})", note.title, note.id);

    info!("Enriching note {}", note.id);
    enrich_note(&database, note.id).await;

    let pending = ReminderQueries::list_pending_for_note(database.pool(), note.id).await?;
    if !pending.is_empty() {
        println!("Suggested reminders:");
        for reminder in &pending {
            match reminder.due_date {
                Some(due) => println!("  [{}] {} (due {})", reminder.id, reminder.text, due),
                None => println!("  [{}] {}", reminder.id, reminder.text),
            }
        }
        println!("Use 'notes-ai reminder accept <id>' or 'notes-ai reminder dismiss <id>'.");
    }

    Ok(())
}

/// Update a note's title and content, then re-enrich it
#[inline]
pub async fn update_note(id: i64, title: String, content: String) -> Result<()> {
    let database = open_database().await?;

    let note = NoteQueries::update(database.pool(), id, &title, &content)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Note not found: {}", id))?;

    println!("Updated note: {} (ID: {})", note.title, note.id);

    info!("Re-enriching note {}", note.id);
    enrich_note(&database, note.id).await;

    Ok(())
}

/// Delete a note and its derived state
#[inline]
pub async fn delete_note(id: i64) -> Result<()> {
    let database = open_database().await?;

    let note = NoteQueries::get_by_id(database.pool(), id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Note not found: {}", id))?;

    NoteQueries::delete(database.pool(), id).await?;

    println!("Deleted note: {} (ID: {})", note.title, note.id);
    Ok(())
}

/// List notes in a folder
#[inline]
pub async fn list_notes(folder_id: i64) -> Result<()> {
    let database = open_database().await?;

    let folder = FolderQueries::get_by_id(database.pool(), folder_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Folder not found: {}", folder_id))?;

    let notes = NoteQueries::list_by_folder(database.pool(), folder_id).await?;
    if notes.is_empty() {
        println!("No notes in folder: {}", folder.name);
        return Ok(());
    }

    println!("Notes in {} ({} total):", folder.name, notes.len());
    for note in &notes {
        let pending = ReminderQueries::list_pending_for_note(database.pool(), note.id).await?;
        print!(
            "  {} (ID: {}) - updated {}",
            note.title,
            note.id,
            note.updated_at.format("%Y-%m-%d %H:%M")
        );
        if pending.is_empty() {
            println!();
        } else {
            println!(", {} pending reminders", pending.len());
        }
    }

    Ok(())
}

/// Show a note with its reminders
#[inline]
pub async fn show_note(id: i64) -> Result<()> {
    let database = open_database().await?;

    let note = NoteQueries::get_by_id(database.pool(), id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Note not found: {}", id))?;

    println!("{} (ID: {})", note.title, note.id);
    println!("Updated: {}", note.updated_at.format("%Y-%m-%d %H:%M:%S"));
    println!();
    println!("{}", note.content);

    let reminders = ReminderQueries::list_for_note(database.pool(), id).await?;
    if !reminders.is_empty() {
        println!();
        println!("Reminders:");
        for reminder in &reminders {
            match reminder.due_date {
                Some(due) => println!(
                    "  [{}] {} (due {}, {})",
                    reminder.id, reminder.text, due, reminder.status
                ),
                None => println!("  [{}] {} ({})", reminder.id, reminder.text, reminder.status),
            }
        }
    }

    Ok(())
}

/// List every pending reminder across all notes
#[inline]
pub async fn list_reminders() -> Result<()> {
    let database = open_database().await?;

    let reminders = ReminderQueries::list_all_pending(database.pool()).await?;
    if reminders.is_empty() {
        println!("No pending reminders.");
        return Ok(());
    }

    println!("Pending reminders ({} total):", reminders.len());
    for reminder in &reminders {
        match reminder.due_date {
            Some(due) => println!(
                "  [{}] {} (due {}, note {})",
                reminder.id, reminder.text, due, reminder.note_id
            ),
            None => println!(
                "  [{}] {} (note {})",
                reminder.id, reminder.text, reminder.note_id
            ),
        }
    }
    println!("Use 'notes-ai reminder accept <id>' or 'notes-ai reminder dismiss <id>'.");

    Ok(())
}

/// Accept a pending reminder
#[inline]
pub async fn accept_reminder(id: i64) -> Result<()> {
    let database = open_database().await?;

    let reminder = ReminderQueries::set_status(database.pool(), id, ReminderStatus::Accepted)
        .await
        .context("Failed to accept reminder")?;

    match reminder.due_date {
        Some(due) => println!("Accepted reminder: {} (due {})", reminder.text, due),
        None => println!("Accepted reminder: {}", reminder.text),
    }
    Ok(())
}

/// Dismiss a pending reminder
#[inline]
pub async fn dismiss_reminder(id: i64) -> Result<()> {
    let database = open_database().await?;

    let reminder = ReminderQueries::set_status(database.pool(), id, ReminderStatus::Dismissed)
        .await
        .context("Failed to dismiss reminder")?;

    println!("Dismissed reminder: {}", reminder.text);
    Ok(())
}

/// Ask a question over the notes
#[inline]
pub async fn ask(question: String, conversation_id: Option<i64>) -> Result<()> {
    let database = open_database().await?;
    let config = Config::load().context("Failed to load configuration")?;
    let provider = create_provider(&config)?;

    let engine = ChatEngine::new(database, provider);
    let outcome = engine.ask(&question, conversation_id).await?;

    println!("{}", outcome.answer);
    if let Some(id) = outcome.conversation_id {
        println!();
        println!("Conversation ID: {} (pass --conversation {} to continue)", id, id);
    }

    Ok(())
}

/// List conversations, most recently active first
#[inline]
pub async fn list_conversations() -> Result<()> {
    let database = open_database().await?;

    let conversations = ConversationQueries::list_all(database.pool()).await?;
    if conversations.is_empty() {
        println!("No conversations yet.");
        println!("Use 'notes-ai ask <question>' to start one.");
        return Ok(());
    }

    println!("Conversations ({} total):", conversations.len());
    for conversation in &conversations {
        println!(
            "  {} (ID: {}) - last active {}",
            conversation.title,
            conversation.id,
            conversation.updated_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

/// Show a conversation transcript and its source notes
#[inline]
pub async fn show_conversation(id: i64) -> Result<()> {
    let database = open_database().await?;

    let conversation = ConversationQueries::get_by_id(database.pool(), id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Conversation not found: {}", id))?;

    println!("{} (ID: {})", conversation.title, conversation.id);
    println!();

    let messages = ConversationQueries::list_messages(database.pool(), id).await?;
    for message in &messages {
        println!("[{}] {}", message.role, message.content);
    }

    let linked = ConversationQueries::list_linked_notes(database.pool(), id).await?;
    if !linked.is_empty() {
        println!();
        let ids: Vec<String> = linked.iter().map(ToString::to_string).collect();
        println!("Source notes: {}", ids.join(", "));
    }

    Ok(())
}

/// Rename a conversation
#[inline]
pub async fn rename_conversation(id: i64, title: String) -> Result<()> {
    let database = open_database().await?;

    let conversation = ConversationQueries::update_title(database.pool(), id, &title)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Conversation not found: {}", id))?;

    println!(
        "Renamed conversation {} to: {}",
        conversation.id, conversation.title
    );
    Ok(())
}

/// Delete a conversation and its messages
#[inline]
pub async fn delete_conversation(id: i64) -> Result<()> {
    let database = open_database().await?;

    let conversation = ConversationQueries::get_by_id(database.pool(), id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Conversation not found: {}", id))?;

    ConversationQueries::delete(database.pool(), id).await?;

    println!(
        "Deleted conversation: {} (ID: {})",
        conversation.title, conversation.id
    );
    Ok(())
}
