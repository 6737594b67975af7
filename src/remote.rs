//! Remote reply service seam.
//!
//! The runtime talks to the backend through the narrow [`ReplyService`]
//! trait: one call in, one reply string out. [`HttpReplyService`] is the
//! production implementation, posting JSON to the configured endpoint.
//! Hosts can substitute their own transport; tests substitute stubs.
//!
//! Any failure (network, timeout, non-2xx, unparseable or empty body) is an
//! error to the caller. The resolver treats every error the same way: fall
//! back to the local response bank.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RemoteConfig;
use crate::message::Role;

/// One prior turn sent along for context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    /// Who authored the turn.
    pub role: Role,
    /// Turn text.
    pub content: String,
}

/// Request body for the reply endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyRequest {
    /// The new user utterance, already trimmed.
    pub message: String,
    /// Active locale code ("en", "ru", ...).
    pub locale: String,
    /// Prior conversation, oldest first, welcome entry excluded.
    pub history: Vec<HistoryTurn>,
    /// Page the visitor is on, for context-aware replies.
    pub page: String,
}

/// Response body from the reply endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyResponse {
    /// The generated reply text.
    pub reply: String,
}

/// Transport seam for the remote reply service.
#[async_trait]
pub trait ReplyService: Send + Sync {
    /// Request a reply for the given utterance and context.
    ///
    /// Implementations return `Err` for any failure mode; callers fall back
    /// to the local bank without inspecting the error further.
    async fn send(&self, request: ReplyRequest) -> anyhow::Result<String>;
}

/// HTTP implementation of [`ReplyService`].
#[derive(Debug, Clone)]
pub struct HttpReplyService {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpReplyService {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ReplyService for HttpReplyService {
    async fn send(&self, request: ReplyRequest) -> anyhow::Result<String> {
        let response = self
            .client
            .post(&self.base_url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("reply service returned {status}: {body}");
        }

        let parsed: ReplyResponse = response.json().await?;
        let reply = parsed.reply.trim().to_owned();
        if reply.is_empty() {
            anyhow::bail!("reply service returned an empty reply");
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn request_serializes_with_wire_field_names() {
        let request = ReplyRequest {
            message: "how much is retouching?".to_owned(),
            locale: "en".to_owned(),
            history: vec![
                HistoryTurn {
                    role: Role::User,
                    content: "hi".to_owned(),
                },
                HistoryTurn {
                    role: Role::Assistant,
                    content: "hello!".to_owned(),
                },
            ],
            page: "/pricing".to_owned(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["message"], "how much is retouching?");
        assert_eq!(json["locale"], "en");
        assert_eq!(json["page"], "/pricing");
        assert_eq!(json["history"][0]["role"], "user");
        assert_eq!(json["history"][1]["role"], "assistant");
        assert_eq!(json["history"][1]["content"], "hello!");
    }

    #[test]
    fn response_parses_reply_field() {
        let parsed: ReplyResponse =
            serde_json::from_str(r#"{"reply":"From $5 per photo."}"#).unwrap();
        assert_eq!(parsed.reply, "From $5 per photo.");
    }

    #[test]
    fn response_with_missing_reply_is_an_error() {
        let parsed: Result<ReplyResponse, _> = serde_json::from_str(r#"{"ok":true}"#);
        assert!(parsed.is_err());
    }
}
