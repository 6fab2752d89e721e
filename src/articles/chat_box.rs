use std::collections::{HashMap, VecDeque};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{article_frame, ArticleContext};
use crate::registry::Renderer;
use crate::util::escape_html;

const DEFAULT_REPLY: &str = "Hello!";
const DEFAULT_REPLY_DELAY_MS: u64 = 500;
/// Oldest messages are dropped once a log grows past this.
pub const MAX_CHAT_MESSAGES: usize = 100;

pub struct ChatBoxArticle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub sender: ChatSender,
}

impl ChatMessage {
    fn new(text: impl Into<String>, sender: ChatSender) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
        }
    }
}

#[derive(Debug, Default)]
struct ChatLog {
    /// Bumped on every clear; replies scheduled under an older value are stale.
    generation: u64,
    messages: VecDeque<ChatMessage>,
}

impl ChatLog {
    fn push(&mut self, message: ChatMessage) {
        if self.messages.len() == MAX_CHAT_MESSAGES {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }
}

/// In-memory message logs keyed by article id.
#[derive(Debug, Clone, Default)]
pub struct ChatStore {
    logs: Arc<Mutex<HashMap<String, ChatLog>>>,
}

impl ChatStore {
    /// Appends `text` to the log and schedules the simulated reply. Blank
    /// messages are ignored and return `false`.
    pub async fn send(&self, article_id: &str, text: &str, reply: &str, delay: Duration) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        let generation = {
            let mut logs = self.logs.lock().await;
            let log = logs.entry(article_id.to_owned()).or_default();
            log.push(ChatMessage::new(text, ChatSender::User));
            log.generation
        };

        let logs = Arc::clone(&self.logs);
        let article_id = article_id.to_owned();
        let reply = reply.to_owned();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match logs.lock().await.get_mut(&article_id) {
                Some(log) if log.generation == generation => {
                    log.push(ChatMessage::new(reply, ChatSender::Bot));
                }
                _ => tracing::debug!("chat log `{article_id}` cleared before reply"),
            }
        });
        true
    }

    pub async fn messages(&self, article_id: &str) -> Vec<ChatMessage> {
        self.logs
            .lock()
            .await
            .get(article_id)
            .map(|log| log.messages.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn clear(&self, article_id: &str) {
        if let Some(log) = self.logs.lock().await.get_mut(article_id) {
            log.messages.clear();
            log.generation += 1;
        }
    }
}

#[async_trait]
impl Renderer for ChatBoxArticle {
    fn name(&self) -> &'static str {
        "ArticleChatBox"
    }

    async fn render(&self, cx: &ArticleContext<'_>) -> String {
        let id = cx.article.unique_id();
        let chats = &cx.services.chats;

        if cx.input_value("clear").is_some() {
            chats.clear(id).await;
        } else if let Some(text) = cx.input_value("message") {
            let reply = cx.article.setting_str("reply_text").unwrap_or(DEFAULT_REPLY);
            let delay = cx.article.setting_u64("reply_delay_ms", DEFAULT_REPLY_DELAY_MS);
            chats.send(id, text, reply, Duration::from_millis(delay)).await;
        }

        let mut body = String::from(r#"<div class="chat-container"><div class="chat-messages">"#);
        for message in chats.messages(id).await {
            let class = match message.sender {
                ChatSender::User => "from-user",
                ChatSender::Bot => "from-bot",
            };
            let _ = write!(
                body,
                r#"<div class="chat-message {class}" data-id="{}">{}</div>"#,
                message.id,
                escape_html(&message.text),
            );
        }
        let _ = write!(
            body,
            r#"</div><form class="chat-input-area" method="post" action="{}"><input type="text" name="message" placeholder="Type your message..."><button type="submit">Send</button><button type="submit" name="clear" value="1" class="chat-clear">Clear</button></form></div>"#,
            cx.action_url(),
        );

        article_frame(cx, "article-chat-box", cx.article.locale("title").as_deref(), &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::articles::testing::services;
    use crate::articles::FormInput;
    use crate::content::{ArticleConfig, ArticleDataWrapper};
    use crate::section::SectionContext;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn reply_arrives_after_delay() {
        let store = ChatStore::default();
        assert!(store.send("chat", "hi", "Hello!", Duration::from_millis(500)).await);
        assert_eq!(store.messages("chat").await.len(), 1);

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(store.messages("chat").await.len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let log = store.messages("chat").await;
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].sender, ChatSender::Bot);
        assert_eq!(log[1].text, "Hello!");
    }

    #[tokio::test]
    async fn blank_messages_are_ignored() {
        let store = ChatStore::default();
        assert!(!store.send("chat", "   ", "Hello!", Duration::ZERO).await);
        assert!(store.messages("chat").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn late_reply_after_clear_is_dropped() {
        let store = ChatStore::default();
        store.send("chat", "hi", "Hello!", Duration::from_millis(500)).await;
        store.clear("chat").await;

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(store.messages("chat").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_reply_skips_the_next_conversation() {
        let store = ChatStore::default();
        store.send("chat", "first", "reply to first", Duration::from_millis(500)).await;
        store.clear("chat").await;
        store.send("chat", "second", "reply to second", Duration::from_secs(5)).await;

        tokio::time::sleep(Duration::from_millis(600)).await;
        let texts: Vec<_> = store.messages("chat").await.into_iter().map(|m| m.text).collect();
        assert_eq!(texts, ["second"]);

        tokio::time::sleep(Duration::from_secs(5)).await;
        let texts: Vec<_> = store.messages("chat").await.into_iter().map(|m| m.text).collect();
        assert_eq!(texts, ["second", "reply to second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn logs_keep_only_the_newest_messages() {
        let store = ChatStore::default();
        for n in 0..MAX_CHAT_MESSAGES + 20 {
            store.send("chat", &n.to_string(), "ok", Duration::from_secs(3600)).await;
        }
        let log = store.messages("chat").await;
        assert_eq!(log.len(), MAX_CHAT_MESSAGES);
        assert_eq!(log[0].text, "20");
        let newest = (MAX_CHAT_MESSAGES + 19).to_string();
        assert_eq!(log.last().map(|m| m.text.as_str()), Some(newest.as_str()));

        tokio::time::sleep(Duration::from_secs(3601)).await;
        let log = store.messages("chat").await;
        assert_eq!(log.len(), MAX_CHAT_MESSAGES);
        assert!(log.iter().all(|m| m.sender == ChatSender::Bot));
    }

    #[tokio::test(start_paused = true)]
    async fn render_posts_message_and_uses_settings() {
        let config: ArticleConfig = serde_json::from_value(json!({
            "component": "ArticleChatBox",
            "settings": { "reply_text": "Hi <there>", "reply_delay_ms": 50 }
        }))
        .unwrap();
        let wrapper = ArticleDataWrapper::new(&config, "s-2".into(), "en");
        let services = services("http://127.0.0.1:9");
        let section = SectionContext::default();
        let input = FormInput::from_pairs([("message", "ping")]);
        let cx = ArticleContext {
            article: &wrapper,
            section: &section,
            services: &services,
            section_id: "s",
            index: 2,
            input: Some(&input),
        };

        let html = ChatBoxArticle.render(&cx).await;
        assert!(html.contains(r#"class="chat-message from-user""#));
        assert!(!html.contains("from-bot"));

        tokio::time::sleep(Duration::from_millis(60)).await;
        let log = services.chats.messages("s-2").await;
        assert_eq!(log.last().map(|m| m.text.as_str()), Some("Hi <there>"));

        let clear = FormInput::from_pairs([("clear", "1")]);
        let cx = ArticleContext {
            input: Some(&clear),
            ..cx
        };
        let html = ChatBoxArticle.render(&cx).await;
        assert!(!html.contains("chat-message from-"));
        assert!(services.chats.messages("s-2").await.is_empty());
    }
}
