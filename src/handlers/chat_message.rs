use regex::Regex;
use reqwest::{Client, header::{ACCEPT, HeaderValue}};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    models::configuration::Configuration,
    utils::{
        http::{HttpError, http_execute},
        lenient::value_as_string,
    },
};

pub const DEFAULT_REPLY: &str = "Thank you for your message. How can I help you further?";
pub const INVALID_REPLY: &str = "Sorry, I received an invalid response. Please try again.";
pub const MISSING_WEBHOOK_NOTICE: &str = "Please configure your N8N webhook URL in settings first.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Please configure your N8N webhook URL in settings first.")]
    MissingWebhook,

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Invalid markdown rule: {0}")]
    Pattern(#[from] regex::Error),
}

/// One answer of the chat agent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatReply {
    pub text: String,
    pub quick_replies: Vec<String>,
    /// `key: value` pairs for the configurator, in the order sent.
    pub form_fill: Vec<(String, String)>,
}

impl ChatReply {
    pub fn has_form_fill(&self) -> bool {
        !self.form_fill.is_empty()
    }

    /// Applies the form-fill pairs and returns how many were recognised.
    pub fn apply_to(&self, config: &mut Configuration) -> usize {
        config.apply_form_fill(self.form_fill.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// Strips markdown from agent output down to plain text with `•` bullets.
#[derive(Debug, Clone)]
pub struct MarkdownCleaner {
    rules: Vec<(Regex, &'static str)>,
}

impl MarkdownCleaner {
    pub fn new() -> Result<Self, regex::Error> {
        let rules = [
            (r"\*\*(.*?)\*\*", "$1"),
            (r"\*(.*?)\*", "$1"),
            (r"(?m)^---+$", ""),
            (r"(?m)^___+$", ""),
            (r"(?m)^\*\*\*+$", ""),
            (r"(?m)^#{1,6}\s+", ""),
            (r"(?m)^\d+\.\s+", "• "),
            (r"(?m)^[-*+]\s+", "• "),
            (r"(?s)```.*?```", ""),
            (r"`([^`]+)`", "$1"),
            (r"\[([^\]]+)\]\([^)]+\)", "$1"),
            (r"\*{3,}", ""),
            (r"-{3,}", ""),
            (r"\n\s*\n\s*\n", "\n\n"),
        ]
        .into_iter()
        .map(|(pattern, replacement)| Ok((Regex::new(pattern)?, replacement)))
        .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    pub fn clean(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (pattern, replacement) in &self.rules {
            out = pattern.replace_all(&out, *replacement).into_owned();
        }
        out.trim().to_string()
    }
}

/// Parses `"key: value• key: value"`. Entries without a colon are skipped.
pub fn parse_form_fill(raw: &str) -> Vec<(String, String)> {
    raw.split('•')
        .filter_map(|entry| entry.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

fn parse_quick_replies(button: &Value) -> Vec<String> {
    match button {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items.iter().filter_map(value_as_string).collect(),
        other => value_as_string(other).into_iter().collect(),
    }
}

/// Webhook client for one chat session.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    webhook_url: String,
    retries: u32,
    session_id: Uuid,
    cleaner: MarkdownCleaner,
}

impl ChatClient {
    pub fn new(client: Client, webhook_url: &str, retries: u32) -> Result<Self, ChatError> {
        if webhook_url.trim().is_empty() {
            return Err(ChatError::MissingWebhook);
        }
        Ok(Self {
            client,
            webhook_url: webhook_url.trim().to_string(),
            retries,
            session_id: Uuid::new_v4(),
            cleaner: MarkdownCleaner::new()?,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub async fn send(&self, input: &str) -> Result<ChatReply, ChatError> {
        let body = json!([{
            "sessionId": self.session_id,
            "action": "sendMessage",
            "chatInput": input,
        }]);
        debug!("Sending chat message in session {}", self.session_id);

        let text = http_execute(
            || {
                self.client
                    .post(&self.webhook_url)
                    .header(ACCEPT, HeaderValue::from_static("application/json"))
                    .json(&body)
            },
            self.retries,
        )
        .await?;

        let reply = self.parse_reply(&text);
        info!(
            "Chat reply: {} chars, {} quick replies, {} form fields",
            reply.text.len(),
            reply.quick_replies.len(),
            reply.form_fill.len()
        );
        Ok(reply)
    }

    /// Never fails: an unreadable body becomes an apology text.
    pub fn parse_reply(&self, body: &str) -> ChatReply {
        let value: Value = if body.trim().is_empty() {
            json!({})
        } else {
            match serde_json::from_str(body) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Error parsing chat reply: {e}");
                    return ChatReply {
                        text: INVALID_REPLY.to_string(),
                        ..Default::default()
                    };
                }
            }
        };

        let data = match value {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            Value::Array(_) => Value::Null,
            other => other,
        };

        let output = data
            .get("output")
            .and_then(value_as_string)
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| DEFAULT_REPLY.to_string());

        ChatReply {
            text: self.cleaner.clean(&output),
            quick_replies: data.get("button").map(parse_quick_replies).unwrap_or_default(),
            form_fill: data
                .get("fromfill")
                .and_then(Value::as_str)
                .map(parse_form_fill)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ChatClient {
        ChatClient::new(Client::new(), "http://localhost/webhook/chat", 0).unwrap()
    }

    #[test]
    fn cleans_agent_markdown() {
        let cleaner = MarkdownCleaner::new().unwrap();
        let raw = "## Angebot\n\n**Passfeder** aus *C45*:\n1. Breite `6`\n- [Katalog](https://nosta.de)\n\n\n\n---\nDanke";
        assert_eq!(
            cleaner.clean(raw),
            "Angebot\n\nPassfeder aus C45:\n• Breite 6\n• Katalog\n\nDanke"
        );
    }

    #[test]
    fn reads_first_element_of_array_reply() {
        let reply = client().parse_reply(
            r#"[{"output": "Welche **Breite**?", "button": "4 mm, 5 mm,, 6 mm"}]"#,
        );
        assert_eq!(reply.text, "Welche Breite?");
        assert_eq!(reply.quick_replies, vec!["4 mm", "5 mm", "6 mm"]);
        assert!(!reply.has_form_fill());
    }

    #[test]
    fn falls_back_on_empty_and_invalid_replies() {
        let client = client();
        assert_eq!(client.parse_reply("").text, DEFAULT_REPLY);
        assert_eq!(client.parse_reply("[]").text, DEFAULT_REPLY);
        assert_eq!(client.parse_reply("not json").text, INVALID_REPLY);
        assert_eq!(client.parse_reply(r#"{"button": 42}"#).quick_replies, vec!["42"]);
    }

    #[test]
    fn form_fill_configures_part() {
        let reply = client().parse_reply(
            r#"{"output": "Done", "fromfill": "productGroup: Passfeder (Keyway)• dinNorm: Keine Norm• material: C45• breite: 4• hohe: 4• tiefe: 4• colour: red"}"#,
        );
        assert_eq!(reply.form_fill.len(), 7);

        let mut config = Configuration::default();
        assert_eq!(reply.apply_to(&mut config), 6);
        assert_eq!(config.product_group, "Passfeder (Keyway)");
        assert_eq!(config.din_norm, "Keine Norm");
        assert_eq!((config.width, config.height, config.depth), (4.0, 4.0, 4.0));
    }

    #[test]
    fn requires_webhook_url() {
        let err = ChatClient::new(Client::new(), "", 0).unwrap_err();
        assert_eq!(err.to_string(), MISSING_WEBHOOK_NOTICE);
    }
}
