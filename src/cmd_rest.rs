//! One-shot REST subcommands.

use anyhow::Context;
use tracing::info;

use fusion_api::ApiClient;
use fusion_config::Config;
use fusion_views::preview;

pub(crate) fn api_client(config: &Config) -> anyhow::Result<ApiClient> {
    ApiClient::from_config(&config.api)
        .with_context(|| format!("creating API client for {}", config.api.base_url))
}

/// Print the chat list, most recent first.
pub(crate) async fn list_chats(config: &Config) -> anyhow::Result<()> {
    let api = api_client(config)?;
    let chats = api.list_chats().await?;

    if chats.is_empty() {
        println!("No chats.");
        return Ok(());
    }

    println!("{:<20} {:<24} {:<8} {:<7} {}", "ID", "CONTACT", "MODE", "UNREAD", "LAST MESSAGE");
    println!("{}", "-".repeat(90));
    for chat in &chats {
        println!(
            "{:<20} {:<24} {:<8} {:<7} {}",
            chat.id,
            chat.display_name(),
            chat.mode,
            chat.unread_count,
            chat.last_message_preview.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

/// Print the history of one chat.
pub(crate) async fn show_messages(config: &Config, chat_id: &str) -> anyhow::Result<()> {
    let api = api_client(config)?;
    let messages = api.chat_messages(chat_id).await?;

    for message in &messages {
        let who = if message.is_own() { "me" } else { "contact" };
        let status = message.status.map(|s| format!(" [{:?}]", s)).unwrap_or_default();
        println!(
            "{} {:<8} {}{}",
            message.timestamp.as_deref().unwrap_or("-"),
            who,
            message.content.as_deref().unwrap_or(""),
            status,
        );
    }
    info!(chat_id, count = messages.len(), "History loaded");
    Ok(())
}

/// Queue a message; it shows up in `listen` once the backend sends it.
pub(crate) async fn send_message(config: &Config, chat_id: &str, text: &str) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("refusing to send an empty message");
    }
    let api = api_client(config)?;
    let receipt = api.send_message(chat_id, text).await?;

    let id = receipt
        .internal_message_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!("Queued message {} to {}: {}", id, chat_id, preview(text));
    Ok(())
}
