//! Core types for the conversation log.
//!
//! Provides [`ChatMessage`] and the small enums that describe it: who spoke
//! ([`Role`]), which response-bank bucket a fallback reply came from
//! ([`Category`]), reader reactions ([`Feedback`]), and the avatar display
//! state ([`Mood`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The visitor typing into the widget.
    User,
    /// The assistant (remote or fallback).
    Assistant,
}

/// Response-bank category a fallback reply was drawn from.
///
/// Declaration order is the fallback scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Retouching services and pricing.
    Services,
    /// Site navigation (catalog, account, contact pages).
    Navigation,
    /// Help, order status, turnaround questions.
    Support,
    /// Portfolio and before/after examples.
    Portfolio,
    /// Greetings, thanks, small talk.
    General,
}

/// Reader reaction on an assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    /// Thumbs up.
    Liked,
    /// Thumbs down.
    Disliked,
}

/// Avatar display state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Resting state.
    #[default]
    Idle,
    /// Input focused, waiting for the visitor to type.
    Listening,
    /// A submitted turn is awaiting resolution.
    Thinking,
    /// A reply was just appended.
    Talking,
    /// Panel just opened.
    Happy,
    /// Presence timer expired while closed and idle.
    Sleeping,
}

/// A single entry in the conversation log.
///
/// Messages are immutable after append, with two exceptions: a failed
/// fallback turn may be rewritten in place by a retry, and `feedback`
/// toggles freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Locally unique, order-stable identifier.
    pub id: String,
    /// Who authored the message.
    pub role: Role,
    /// Message text. May carry markdown links for the host renderer.
    pub content: String,
    /// When the message was appended.
    pub timestamp: DateTime<Utc>,
    /// Fallback bucket the reply came from, if it was a local match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Whether the host should offer quick-action chips under this reply.
    #[serde(default)]
    pub show_quick_actions: bool,
    /// True when the reply was generated locally after a remote failure.
    #[serde(default)]
    pub is_fallback: bool,
    /// Number of failed retries of this turn so far.
    #[serde(default)]
    pub retry_count: u32,
    /// The user text that produced this reply. Present iff `is_fallback`,
    /// so the turn can be re-submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_user_message: Option<String>,
    /// Reader reaction, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

impl ChatMessage {
    /// Create a user message timestamped now.
    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            category: None,
            show_quick_actions: false,
            is_fallback: false,
            retry_count: 0,
            original_user_message: None,
            feedback: None,
        }
    }

    /// Create an assistant message timestamped now.
    pub fn assistant(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            ..Self::user(id, content)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn user_constructor_sets_defaults() {
        let msg = ChatMessage::user("user_1", "hello");
        assert_eq!(msg.id, "user_1");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hello");
        assert!(!msg.is_fallback);
        assert_eq!(msg.retry_count, 0);
        assert!(msg.category.is_none());
        assert!(msg.feedback.is_none());
    }

    #[test]
    fn assistant_constructor_flips_role_only() {
        let msg = ChatMessage::assistant("bot_1", "hi there");
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "hi there");
        assert!(!msg.show_quick_actions);
    }

    #[test]
    fn serde_round_trip_preserves_fallback_fields() {
        let mut msg = ChatMessage::assistant("bot_2", "local answer");
        msg.is_fallback = true;
        msg.category = Some(Category::Services);
        msg.original_user_message = Some("how much?".to_owned());
        msg.retry_count = 1;

        let json = serde_json::to_string(&msg).unwrap();
        let parsed: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn serde_uses_camel_case_and_skips_absent_options() {
        let msg = ChatMessage::user("user_2", "hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"showQuickActions\":false"));
        assert!(json.contains("\"isFallback\":false"));
        assert!(!json.contains("originalUserMessage"));
        assert!(!json.contains("feedback"));
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn timestamp_serializes_as_sortable_string() {
        let msg = ChatMessage::user("user_3", "hi");
        let json = serde_json::to_value(&msg).unwrap();
        let ts = json["timestamp"].as_str().unwrap();
        // RFC 3339, so lexicographic order matches chronological order.
        assert!(ts.contains('T'));
        assert!(ts.ends_with('Z'));
    }

    #[test]
    fn mood_defaults_to_idle() {
        assert_eq!(Mood::default(), Mood::Idle);
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Portfolio).unwrap();
        assert_eq!(json, "\"portfolio\"");
    }

    #[test]
    fn message_types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChatMessage>();
        assert_send_sync::<Mood>();
        assert_send_sync::<Feedback>();
    }
}
