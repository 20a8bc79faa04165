//! `listen` subcommand: follow the live channel and keep the dashboard
//! views current until Ctrl-C.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use fusion_api::ApiClient;
use fusion_channel::{ChannelSnapshot, LiveChannel};
use fusion_config::Config;
use fusion_protocols::FusionEvent;
use fusion_views::{ConnectionIndicator, Dashboard, DashboardConfig, preview};

use crate::cmd_rest::api_client;

pub(crate) async fn run_listen(config: &Config, chat: Option<String>) -> anyhow::Result<()> {
    let dashboard = Arc::new(Mutex::new(Dashboard::new(DashboardConfig {
        max_hints: config.hints.max_hints,
    })));
    if let Some(chat_id) = chat.as_deref() {
        dashboard.lock().select_chat(chat_id);
    }

    // Snapshots are best effort: live events still flow without REST.
    let api = match api_client(config) {
        Ok(api) => Some(api),
        Err(e) => {
            warn!("REST snapshots disabled: {:#}", e);
            None
        }
    };
    if let Some(api) = &api {
        load_snapshots(api, &dashboard, chat.as_deref()).await;
    }

    let channel = LiveChannel::websocket(&config.live);
    let reader = channel.reader();
    let mut events = reader.subscribe();
    let mut state = reader.watch();
    let pump = tokio::spawn(Dashboard::run(dashboard.clone(), reader));

    info!(endpoint = %channel.endpoint(), "Starting live channel");
    channel.start();
    log_state(&state.borrow_and_update());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl-C: {}", e);
                }
                break;
            }
            received = events.recv() => match received {
                Ok(event) => log_event(&FusionEvent::from_envelope(&event.envelope)),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log fell behind"),
                Err(RecvError::Closed) => break,
            },
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                log_state(&snapshot);
            }
        }

        let resync = dashboard.lock().needs_resync();
        if resync {
            if let Some(api) = &api {
                load_snapshots(api, &dashboard, chat.as_deref()).await;
            }
            dashboard.lock().mark_resynced();
        }
    }

    info!("Shutting down");
    channel.disconnect();
    drop(channel);
    if let Err(e) = pump.await {
        error!("Dashboard task failed: {}", e);
    }

    let dashboard = dashboard.lock();
    info!(
        chats = dashboard.chat_list().chats().len(),
        unread = dashboard.chat_list().total_unread(),
        hints = dashboard.hints().hints().len(),
        "Session summary"
    );
    Ok(())
}

/// Reload the chat list and, when a chat is open, its history.
async fn load_snapshots(api: &ApiClient, dashboard: &Mutex<Dashboard>, chat: Option<&str>) {
    match api.list_chats().await {
        Ok(chats) => {
            debug!(count = chats.len(), "Chat list snapshot");
            dashboard.lock().chat_list_mut().load_snapshot(chats);
        }
        Err(e) => warn!("Failed to load chats: {}", e),
    }

    if let Some(chat_id) = chat {
        match api.chat_messages(chat_id).await {
            Ok(history) => {
                dashboard.lock().messages_mut().load_snapshot(chat_id, history);
            }
            Err(e) => warn!(chat_id, "Failed to load history: {}", e),
        }
    }
}

fn log_state(snapshot: &ChannelSnapshot) {
    let indicator = ConnectionIndicator::from_snapshot(snapshot);
    match (&indicator.error, &snapshot.terminal) {
        (Some(message), Some(reason)) => {
            error!(status = %indicator.label, reason = ?reason, "{}", message)
        }
        (Some(message), None) => warn!(status = %indicator.label, "{}", message),
        (None, _) => info!(status = %indicator.label, "Live channel"),
    }
}

fn log_event(event: &FusionEvent) {
    match event {
        FusionEvent::NewMessage(message) => info!(
            chat_id = %message.chat_id,
            message_id = %message.id,
            own = message.is_own(),
            "New message: {}",
            preview(message.content.as_deref().unwrap_or(""))
        ),
        FusionEvent::MessageStatus(update) => info!(
            chat_id = %update.chat_id,
            message_id = %update.id,
            status = ?update.status,
            "Message status"
        ),
        FusionEvent::ChatModeUpdate(update) => {
            info!(chat_id = %update.chat_id, mode = %update.new_mode, "Chat mode changed")
        }
        FusionEvent::Hint(hint) => {
            info!(kind = hint.kind.as_deref().unwrap_or("info"), "Hint: {}", hint.text)
        }
        FusionEvent::CommandUpdate(update) => info!(
            job_id = %update.job_id,
            status = %update.status,
            "Command: {}",
            update.message.as_deref().unwrap_or("")
        ),
        FusionEvent::Unknown { kind } => debug!(kind = %kind, "Unhandled live event"),
        FusionEvent::Invalid { kind, reason } => warn!(kind = %kind, "Malformed live event: {}", reason),
    }
}
