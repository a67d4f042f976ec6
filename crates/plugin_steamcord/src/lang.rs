//! Player-facing message table and the notifier that renders it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use steamcord_rewards::{Message, NotificationService};
use tracing::info;

fn default_error() -> String {
    "Something went wrong, please try again later.".to_string()
}

fn default_claim_no_rewards() -> String {
    "We couldn't find a matching player, link your accounts at steamcord.link.".to_string()
}

fn default_claim_rewards() -> String {
    "Thank you for linking your accounts!".to_string()
}

/// Message texts, overridable from the `[steamcord.messages]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangTable {
    #[serde(default = "default_error")]
    pub error: String,
    #[serde(default = "default_claim_no_rewards")]
    pub claim_no_rewards: String,
    #[serde(default = "default_claim_rewards")]
    pub claim_rewards: String,
}

impl Default for LangTable {
    fn default() -> Self {
        Self {
            error: default_error(),
            claim_no_rewards: default_claim_no_rewards(),
            claim_rewards: default_claim_rewards(),
        }
    }
}

impl LangTable {
    pub fn text(&self, message: Message) -> &str {
        match message {
            Message::Error => &self.error,
            Message::ClaimNoRewards => &self.claim_no_rewards,
            Message::ClaimRewards => &self.claim_rewards,
        }
    }
}

/// Where rendered messages end up, usually the game's chat.
pub trait ChatSink: Send + Sync {
    fn send(&self, player_id: &str, text: &str);
}

/// Writes player messages to the log. Used when no chat is attached.
pub struct TracingChatSink;

impl ChatSink for TracingChatSink {
    fn send(&self, player_id: &str, text: &str) {
        info!("💬 [{}] {}", player_id, text);
    }
}

/// [`NotificationService`] that renders through a [`LangTable`].
pub struct LangNotifier {
    lang: LangTable,
    sink: Arc<dyn ChatSink>,
}

impl LangNotifier {
    pub fn new(lang: LangTable, sink: Arc<dyn ChatSink>) -> Self {
        Self { lang, sink }
    }
}

impl NotificationService for LangNotifier {
    fn message(&self, player_id: &str, message: Message) {
        self.sink.send(player_id, self.lang.text(message));
    }
}
