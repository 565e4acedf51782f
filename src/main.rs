use clap::{Parser, Subcommand};
use notes_ai::Result;
use notes_ai::commands::{
    accept_reminder, add_folder, add_note, ask, delete_conversation, delete_folder, delete_note,
    dismiss_reminder, list_conversations, list_folders, list_notes, list_reminders,
    rename_conversation, rename_folder, show_conversation, show_note, update_note,
};
use notes_ai::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "notes-ai")]
#[command(about = "A note-taking assistant with semantic search, reminders, and chat")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the Gemini API connection and settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Manage folders
    Folder {
        #[command(subcommand)]
        command: FolderCommands,
    },
    /// Manage notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// Manage AI-suggested reminders
    Reminder {
        #[command(subcommand)]
        command: ReminderCommands,
    },
    /// Ask a question answered from your notes
    Ask {
        /// The question to ask
        question: String,
        /// Continue an existing conversation instead of starting a new one
        #[arg(long)]
        conversation: Option<i64>,
    },
    /// Manage chat conversations
    Conversation {
        #[command(subcommand)]
        command: ConversationCommands,
    },
}

#[derive(Subcommand)]
enum FolderCommands {
    /// Create a new folder
    Add {
        /// Folder name
        name: String,
    },
    /// List all folders
    List,
    /// Rename a folder
    Rename {
        /// Folder ID
        id: i64,
        /// New name
        name: String,
    },
    /// Delete a folder and all of its notes
    Delete {
        /// Folder ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum NoteCommands {
    /// Create a note in a folder
    Add {
        /// Folder ID
        folder: i64,
        /// Note title
        title: String,
        /// Note content
        content: String,
    },
    /// Replace a note's title and content
    Update {
        /// Note ID
        id: i64,
        /// New title
        title: String,
        /// New content
        content: String,
    },
    /// Delete a note
    Delete {
        /// Note ID
        id: i64,
    },
    /// List notes in a folder
    List {
        /// Folder ID
        folder: i64,
    },
    /// Show a note with its reminders
    Show {
        /// Note ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum ReminderCommands {
    /// List all pending reminders
    List,
    /// Accept a pending reminder
    Accept {
        /// Reminder ID
        id: i64,
    },
    /// Dismiss a pending reminder
    Dismiss {
        /// Reminder ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum ConversationCommands {
    /// List conversations, most recently active first
    List,
    /// Show a conversation transcript
    Show {
        /// Conversation ID
        id: i64,
    },
    /// Rename a conversation
    Rename {
        /// Conversation ID
        id: i64,
        /// New title
        title: String,
    },
    /// Delete a conversation
    Delete {
        /// Conversation ID
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Folder { command } => match command {
            FolderCommands::Add { name } => add_folder(name).await?,
            FolderCommands::List => list_folders().await?,
            FolderCommands::Rename { id, name } => rename_folder(id, name).await?,
            FolderCommands::Delete { id } => delete_folder(id).await?,
        },
        Commands::Note { command } => match command {
            NoteCommands::Add {
                folder,
                title,
                content,
            } => add_note(folder, title, content).await?,
            NoteCommands::Update { id, title, content } => update_note(id, title, content).await?,
            NoteCommands::Delete { id } => delete_note(id).await?,
            NoteCommands::List { folder } => list_notes(folder).await?,
            NoteCommands::Show { id } => show_note(id).await?,
        },
        Commands::Reminder { command } => match command {
            ReminderCommands::List => list_reminders().await?,
            ReminderCommands::Accept { id } => accept_reminder(id).await?,
            ReminderCommands::Dismiss { id } => dismiss_reminder(id).await?,
        },
        Commands::Ask {
            question,
            conversation,
        } => {
            ask(question, conversation).await?;
        }
        Commands::Conversation { command } => match command {
            ConversationCommands::List => list_conversations().await?,
            ConversationCommands::Show { id } => show_conversation(id).await?,
            ConversationCommands::Rename { id, title } => rename_conversation(id, title).await?,
            ConversationCommands::Delete { id } => delete_conversation(id).await?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["notes-ai", "reminder", "list"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Reminder { .. });
        }
    }

    #[test]
    fn note_add_command() {
        let cli = Cli::try_parse_from([
            "notes-ai",
            "note",
            "add",
            "3",
            "Paris trip",
            "Visit the Louvre in May",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Note {
                command: NoteCommands::Add {
                    folder,
                    title,
                    content,
                },
            } = parsed.command
            {
                assert_eq!(folder, 3);
                assert_eq!(title, "Paris trip");
                assert_eq!(content, "Visit the Louvre in May");
            }
        }
    }

    #[test]
    fn ask_command_with_conversation() {
        let cli = Cli::try_parse_from([
            "notes-ai",
            "ask",
            "When is my trip?",
            "--conversation",
            "7",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask {
                question,
                conversation,
            } = parsed.command
            {
                assert_eq!(question, "When is my trip?");
                assert_eq!(conversation, Some(7));
            }
        }
    }

    #[test]
    fn ask_command_without_conversation() {
        let cli = Cli::try_parse_from(["notes-ai", "ask", "When is my trip?"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask { conversation, .. } = parsed.command {
                assert_eq!(conversation, None);
            }
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["notes-ai", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["notes-ai", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn note_add_requires_all_arguments() {
        let cli = Cli::try_parse_from(["notes-ai", "note", "add", "3", "Title only"]);
        assert!(cli.is_err());
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["notes-ai", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
