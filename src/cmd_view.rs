//! `view` subcommand: the persisted WhatsApp/ChatGPT switch.

use anyhow::Context;
use tracing::info;

use fusion_config::Config;
use fusion_views::{ViewMode, ViewModeStore};

use crate::cli::ViewAction;

pub(crate) fn handle_view(config: &Config, action: Option<ViewAction>) -> anyhow::Result<()> {
    let path = config.app.state_file();
    let mut store = ViewModeStore::load(&path)
        .with_context(|| format!("reading view mode from {}", path.display()))?;

    let mode = match action {
        None => store.mode(),
        Some(ViewAction::Flip) => store.flip()?,
        Some(ViewAction::Whatsapp) => {
            store.set(ViewMode::WhatsApp)?;
            ViewMode::WhatsApp
        }
        Some(ViewAction::Chatgpt) => {
            store.set(ViewMode::ChatGpt)?;
            ViewMode::ChatGpt
        }
    };

    if action.is_some() {
        info!(mode = %mode, path = %path.display(), "View mode saved");
    }
    println!("{}", mode);
    Ok(())
}
