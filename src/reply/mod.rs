//! Simulated-contact reply generation.
//!
//! A [`ReplyRouter`] turns a conversation tail into the contact's next text
//! message. The primary engine carries the persona; when it fails the router
//! degrades to an optional fallback engine and finally to a fixed apology, so
//! a chat never dead-ends on an engine outage.

pub mod http;
pub mod persona;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::store::types::{Contact, Message, SenderRole};
use crate::telemetry::events::record_reply_fallback;

/// How many trailing messages of the conversation an engine sees.
pub const REPLY_HISTORY_WINDOW: usize = 10;

/// Stand-in text for history entries that carry only an image.
pub const EMPTY_MESSAGE_PLACEHOLDER: &str = "[image]";

/// What an empty engine response renders as.
pub const EMPTY_REPLY_TEXT: &str = "...";

/// Last-resort reply when every engine has failed.
pub const REPLY_APOLOGY: &str = "Sorry, I can't reply right now.";

/// One history entry as engines see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTurn {
    pub role: SenderRole,
    pub text: String,
}

/// A text generator that can impersonate a contact.
#[async_trait]
pub trait ReplyEngine: Send + Sync {
    async fn generate(&self, instruction: &str, history: &[ReplyTurn]) -> Result<String>;
}

/// Routes reply generation across a primary engine and an optional fallback.
pub struct ReplyRouter {
    primary: Arc<dyn ReplyEngine>,
    fallback: Option<Arc<dyn ReplyEngine>>,
    history_window: usize,
}

impl ReplyRouter {
    pub fn new(primary: Arc<dyn ReplyEngine>) -> Self {
        Self {
            primary,
            fallback: None,
            history_window: REPLY_HISTORY_WINDOW,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn ReplyEngine>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    #[cfg(test)]
    fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Produces the contact's next message text. Infallible by construction:
    /// engine failures degrade through the fallback chain to the apology.
    pub async fn reply(&self, contact: &Contact, history: &[Message]) -> String {
        let instruction = persona::instruction_for(contact);
        let turns = recent_turns(history, self.history_window);

        match self.primary.generate(&instruction, &turns).await {
            Ok(text) => return normalize_reply(text),
            Err(err) => {
                record_reply_fallback(&contact.id, "primary-fallback", &err.to_string());
            }
        }

        if let Some(fallback) = &self.fallback {
            match fallback.generate(&instruction, &turns).await {
                Ok(text) => return normalize_reply(text),
                Err(err) => {
                    record_reply_fallback(&contact.id, "apology", &err.to_string());
                }
            }
        } else {
            record_reply_fallback(&contact.id, "apology", "no fallback engine configured");
        }

        REPLY_APOLOGY.to_string()
    }
}

fn normalize_reply(text: String) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        EMPTY_REPLY_TEXT.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Trailing window of the conversation, oldest first. Messages without text,
/// image-only ones, read as a placeholder so the turn structure survives.
fn recent_turns(history: &[Message], window: usize) -> Vec<ReplyTurn> {
    let start = history.len().saturating_sub(window);
    history[start..]
        .iter()
        .map(|message| ReplyTurn {
            role: message.sender,
            text: if message.text.trim().is_empty() {
                EMPTY_MESSAGE_PLACEHOLDER.to_string()
            } else {
                message.text.clone()
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::store::types::DeliveryStatus;

    /// Pops one programmed outcome per call and records what it was asked.
    #[derive(Default)]
    struct ProgrammedReplyEngine {
        outcomes: Mutex<VecDeque<Result<String>>>,
        seen_histories: Mutex<Vec<Vec<ReplyTurn>>>,
    }

    impl ProgrammedReplyEngine {
        fn with_outcomes(outcomes: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                seen_histories: Mutex::new(Vec::new()),
            })
        }

        fn seen_histories(&self) -> Vec<Vec<ReplyTurn>> {
            self.seen_histories.lock().expect("history lock").clone()
        }
    }

    #[async_trait]
    impl ReplyEngine for ProgrammedReplyEngine {
        async fn generate(&self, _instruction: &str, history: &[ReplyTurn]) -> Result<String> {
            self.seen_histories
                .lock()
                .expect("history lock")
                .push(history.to_vec());
            self.outcomes
                .lock()
                .expect("outcomes lock")
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no outcome programmed")))
        }
    }

    fn contact() -> Contact {
        Contact {
            id: "c1".to_string(),
            name: "Test Person".to_string(),
            phone_number: "+1 555 000 0000".to_string(),
            avatar_url: None,
            cover_url: None,
            last_message: String::new(),
            last_message_time: 0,
            unread_count: 0,
        }
    }

    fn message(sender: SenderRole, text: &str) -> Message {
        Message {
            id: "m".to_string(),
            contact_id: "c1".to_string(),
            sender,
            text: text.to_string(),
            image_url: None,
            timestamp: 0,
            status: DeliveryStatus::Sent,
        }
    }

    #[tokio::test]
    async fn primary_success_is_returned_directly() {
        let primary = ProgrammedReplyEngine::with_outcomes(vec![Ok("hey!".to_string())]);
        let router = ReplyRouter::new(primary);

        let reply = router
            .reply(&contact(), &[message(SenderRole::User, "hello")])
            .await;
        assert_eq!(reply, "hey!");
    }

    #[tokio::test]
    async fn primary_failure_degrades_to_fallback() {
        let primary =
            ProgrammedReplyEngine::with_outcomes(vec![Err(anyhow::anyhow!("quota exhausted"))]);
        let fallback = ProgrammedReplyEngine::with_outcomes(vec![Ok("plan B".to_string())]);
        let router = ReplyRouter::new(primary).with_fallback(fallback.clone());

        let reply = router.reply(&contact(), &[]).await;
        assert_eq!(reply, "plan B");
        assert_eq!(fallback.seen_histories().len(), 1);
    }

    #[tokio::test]
    async fn both_engines_failing_yields_the_apology() {
        let primary = ProgrammedReplyEngine::with_outcomes(vec![Err(anyhow::anyhow!("down"))]);
        let fallback = ProgrammedReplyEngine::with_outcomes(vec![Err(anyhow::anyhow!("down too"))]);
        let router = ReplyRouter::new(primary).with_fallback(fallback);

        assert_eq!(router.reply(&contact(), &[]).await, REPLY_APOLOGY);
    }

    #[tokio::test]
    async fn missing_fallback_yields_the_apology() {
        let primary = ProgrammedReplyEngine::with_outcomes(vec![Err(anyhow::anyhow!("down"))]);
        let router = ReplyRouter::new(primary);

        assert_eq!(router.reply(&contact(), &[]).await, REPLY_APOLOGY);
    }

    #[tokio::test]
    async fn blank_replies_render_as_ellipsis() {
        let primary = ProgrammedReplyEngine::with_outcomes(vec![Ok("   ".to_string())]);
        let router = ReplyRouter::new(primary);

        assert_eq!(router.reply(&contact(), &[]).await, EMPTY_REPLY_TEXT);
    }

    #[tokio::test]
    async fn history_is_truncated_to_the_trailing_window() {
        let primary = ProgrammedReplyEngine::with_outcomes(vec![Ok("ok".to_string())]);
        let router = ReplyRouter::new(primary.clone()).with_history_window(3);

        let history: Vec<Message> = (0..6)
            .map(|i| message(SenderRole::User, &format!("msg {i}")))
            .collect();
        router.reply(&contact(), &history).await;

        let seen = primary.seen_histories();
        assert_eq!(seen.len(), 1);
        let texts: Vec<&str> = seen[0].iter().map(|turn| turn.text.as_str()).collect();
        assert_eq!(texts, vec!["msg 3", "msg 4", "msg 5"]);
    }

    #[tokio::test]
    async fn image_only_messages_read_as_placeholder() {
        let primary = ProgrammedReplyEngine::with_outcomes(vec![Ok("nice pic".to_string())]);
        let router = ReplyRouter::new(primary.clone());

        let mut image_only = message(SenderRole::Contact, "");
        image_only.image_url = Some("https://example.com/p.jpg".to_string());
        router.reply(&contact(), &[image_only]).await;

        assert_eq!(
            primary.seen_histories()[0][0].text,
            EMPTY_MESSAGE_PLACEHOLDER
        );
    }
}
