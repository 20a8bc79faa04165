//! CLI definitions for Fusion.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Fusion CLI.
#[derive(Parser)]
#[command(name = "fusion")]
#[command(about = "Fusion dashboard client: live updates and chat tools")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/fusion.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Follow the live update channel until Ctrl-C
    Listen {
        /// Open this chat in the message view
        #[arg(long)]
        chat: Option<String>,
    },

    /// List recent chats
    Chats,

    /// Show the history of a chat
    Messages {
        /// WhatsApp id of the chat
        chat_id: String,
    },

    /// Queue a WhatsApp text message
    Send {
        /// WhatsApp id of the recipient
        chat_id: String,

        /// Message text
        text: String,
    },

    /// Show or change the persisted view mode
    View {
        #[arg(value_enum)]
        action: Option<ViewAction>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum ViewAction {
    /// Switch to the other mode
    Flip,
    Whatsapp,
    Chatgpt,
}
