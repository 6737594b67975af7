//! Single source of truth for one conversation.
//!
//! [`Conversation`] holds the ordered message log, the panel open/typing
//! flags, the avatar mood, and the unread counter. It is pure state: no
//! I/O, no timers, no locking. The session owns one behind a mutex and
//! drives persistence, notification, and timers around its command surface.
//!
//! Ids are deterministic counters (`user_3`, `bot_4`) so ordering survives
//! serialization; the synthetic greeting always has id [`WELCOME_ID`]. After
//! hydration the counter resumes past the highest numeric suffix present,
//! so restored and new ids never collide.

use crate::message::{ChatMessage, Feedback, Mood, Role};
use crate::remote::HistoryTurn;
use crate::resolver::ResolvedReply;
use crate::responses;

/// Id of the synthetic greeting that opens every fresh conversation.
pub const WELCOME_ID: &str = "welcome";

/// Maximum user-turn length in characters; longer input is truncated.
pub const MAX_USER_CHARS: usize = 500;

/// Cloneable view of the conversation, handed to hosts for rendering.
#[derive(Debug, Clone)]
pub struct ConversationState {
    /// The full log, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Whether the panel is open.
    pub is_open: bool,
    /// Whether a turn is awaiting resolution.
    pub is_typing: bool,
    /// Current avatar mood.
    pub mood: Mood,
    /// Assistant replies appended while the panel was closed.
    pub unread_count: u32,
}

/// Ordered message log plus panel flags, mood, and unread counter.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    is_open: bool,
    is_typing: bool,
    mood: Mood,
    unread_count: u32,
    next_id: u64,
}

impl Conversation {
    /// Create a fresh conversation holding only the welcome message.
    #[must_use]
    pub fn new() -> Self {
        Self {
            messages: vec![welcome_message()],
            is_open: false,
            is_typing: false,
            mood: Mood::Idle,
            unread_count: 0,
            next_id: 1,
        }
    }

    /// Rebuild from a hydrated snapshot, replacing the default welcome log.
    ///
    /// The id counter resumes past the highest numeric suffix found so new
    /// messages never collide with restored ones. An empty snapshot falls
    /// back to a fresh conversation.
    #[must_use]
    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        if messages.is_empty() {
            return Self::new();
        }
        let next_id = messages
            .iter()
            .filter_map(|m| {
                m.id.strip_prefix("user_")
                    .or_else(|| m.id.strip_prefix("bot_"))
                    .and_then(|n| n.parse::<u64>().ok())
            })
            .max()
            .map_or(1, |max| max + 1);
        Self {
            messages,
            is_open: false,
            is_typing: false,
            mood: Mood::Idle,
            unread_count: 0,
            next_id,
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn unread_count(&self) -> u32 {
        self.unread_count
    }

    /// Cloneable view for host rendering.
    #[must_use]
    pub fn snapshot(&self) -> ConversationState {
        ConversationState {
            messages: self.messages.clone(),
            is_open: self.is_open,
            is_typing: self.is_typing,
            mood: self.mood,
            unread_count: self.unread_count,
        }
    }

    /// Prior turns for the remote service, oldest first. The welcome entry
    /// is always excluded; `exclude_id` additionally drops the turn being
    /// retried so it is not echoed back as context.
    #[must_use]
    pub fn remote_history(&self, exclude_id: Option<&str>) -> Vec<HistoryTurn> {
        self.messages
            .iter()
            .filter(|m| m.id != WELCOME_ID && Some(m.id.as_str()) != exclude_id)
            .map(|m| HistoryTurn {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }

    // ── Panel commands ──────────────────────────────────────────────────

    /// Open the panel: unread zeroes, avatar perks up.
    pub fn open(&mut self) {
        self.is_open = true;
        self.unread_count = 0;
        self.mood = Mood::Happy;
    }

    /// Close the panel and settle the avatar.
    pub fn close(&mut self) {
        self.is_open = false;
        self.mood = Mood::Idle;
    }

    /// Flip the panel; returns the new open state.
    pub fn toggle(&mut self) -> bool {
        if self.is_open {
            self.close();
        } else {
            self.open();
        }
        self.is_open
    }

    pub fn set_typing(&mut self, typing: bool) {
        self.is_typing = typing;
    }

    pub fn set_mood(&mut self, mood: Mood) {
        self.mood = mood;
    }

    // ── Log commands ────────────────────────────────────────────────────

    /// Append a user turn. Whitespace-only input is rejected; anything over
    /// [`MAX_USER_CHARS`] is truncated on a character boundary.
    pub fn append_user(&mut self, content: &str) -> Option<ChatMessage> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }
        let bounded: String = trimmed.chars().take(MAX_USER_CHARS).collect();
        let message = ChatMessage::user(format!("user_{}", self.next_id), bounded);
        self.next_id += 1;
        self.messages.push(message.clone());
        Some(message)
    }

    /// Append a resolved assistant reply: typing ends, the avatar talks,
    /// and the unread counter ticks if the panel is closed.
    ///
    /// `original` is the user text that produced the reply; it is retained
    /// on fallback replies so the turn can be retried later.
    pub fn append_assistant(&mut self, reply: &ResolvedReply, original: &str) -> ChatMessage {
        let mut message =
            ChatMessage::assistant(format!("bot_{}", self.next_id), reply.content.clone());
        self.next_id += 1;
        message.category = reply.category;
        message.show_quick_actions = reply.show_follow_ups;
        message.is_fallback = reply.is_fallback();
        if reply.is_fallback() {
            message.original_user_message = Some(original.to_owned());
        }
        self.messages.push(message.clone());
        self.is_typing = false;
        self.mood = Mood::Talking;
        if !self.is_open {
            self.unread_count += 1;
        }
        message
    }

    /// Toggle feedback on a message: setting the value it already has
    /// clears it. Unknown ids are a no-op.
    pub fn set_feedback(&mut self, id: &str, feedback: Feedback) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        message.feedback = if message.feedback == Some(feedback) {
            None
        } else {
            Some(feedback)
        };
        true
    }

    /// Reset to a single fresh welcome message. Panel and mood are left
    /// untouched; unread and typing clear.
    pub fn clear(&mut self) {
        self.messages = vec![welcome_message()];
        self.unread_count = 0;
        self.is_typing = false;
        self.next_id = 1;
    }

    // ── Retry support ───────────────────────────────────────────────────

    /// The original user text behind a failed fallback turn, if the id
    /// names one. Anything else (remote reply, user turn, pruned id)
    /// returns `None`.
    #[must_use]
    pub fn retryable_original(&self, id: &str) -> Option<String> {
        self.messages
            .iter()
            .find(|m| m.id == id && m.role == Role::Assistant && m.is_fallback)
            .and_then(|m| m.original_user_message.clone())
    }

    /// Rewrite a retried turn in place after the remote finally answered.
    /// Only the four retry fields change; id, timestamp, and everything
    /// else stay as appended.
    pub fn apply_retry_success(&mut self, id: &str, reply: &ResolvedReply) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        message.content = reply.content.clone();
        message.is_fallback = false;
        message.original_user_message = None;
        message.retry_count = 0;
        self.is_typing = false;
        self.mood = Mood::Talking;
        true
    }

    /// Record another failed retry: the stale content stays for a further
    /// attempt, the counter ticks up.
    pub fn mark_retry_failed(&mut self, id: &str) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        message.retry_count += 1;
        self.is_typing = false;
        self.mood = Mood::Idle;
        true
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

fn welcome_message() -> ChatMessage {
    let mut message = ChatMessage::assistant(WELCOME_ID, responses::WELCOME_TEXT);
    message.show_quick_actions = true;
    message
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::message::Category;
    use crate::resolver::ReplySource;

    fn fallback_reply(content: &str) -> ResolvedReply {
        ResolvedReply {
            content: content.to_owned(),
            source: ReplySource::Fallback,
            show_follow_ups: true,
            category: Some(Category::Services),
        }
    }

    fn remote_reply(content: &str) -> ResolvedReply {
        ResolvedReply {
            content: content.to_owned(),
            source: ReplySource::Remote,
            show_follow_ups: true,
            category: None,
        }
    }

    #[test]
    fn new_starts_with_welcome_only() {
        let convo = Conversation::new();
        assert_eq!(convo.messages().len(), 1);
        assert_eq!(convo.messages()[0].id, WELCOME_ID);
        assert!(convo.messages()[0].show_quick_actions);
        assert_eq!(convo.mood(), Mood::Idle);
        assert!(!convo.is_open());
        assert_eq!(convo.unread_count(), 0);
    }

    #[test]
    fn append_user_trims_and_numbers_ids() {
        let mut convo = Conversation::new();
        let first = convo.append_user("  hello  ").unwrap();
        assert_eq!(first.content, "hello");
        assert_eq!(first.id, "user_1");

        let second = convo.append_user("again").unwrap();
        assert_eq!(second.id, "user_2");
        assert_eq!(convo.messages().len(), 3);
    }

    #[test]
    fn append_user_rejects_blank_input() {
        let mut convo = Conversation::new();
        assert!(convo.append_user("").is_none());
        assert!(convo.append_user("   \n\t ").is_none());
        assert_eq!(convo.messages().len(), 1);
    }

    #[test]
    fn append_user_truncates_long_input_on_char_boundary() {
        let mut convo = Conversation::new();
        let long: String = "я".repeat(MAX_USER_CHARS + 100);
        let message = convo.append_user(&long).unwrap();
        assert_eq!(message.content.chars().count(), MAX_USER_CHARS);
    }

    #[test]
    fn append_assistant_ends_typing_and_talks() {
        let mut convo = Conversation::new();
        convo.set_typing(true);
        let message = convo.append_assistant(&remote_reply("hi!"), "hello");
        assert_eq!(message.id, "bot_1");
        assert!(!message.is_fallback);
        assert!(message.original_user_message.is_none());
        assert!(!convo.is_typing());
        assert_eq!(convo.mood(), Mood::Talking);
    }

    #[test]
    fn fallback_append_retains_original_user_message() {
        let mut convo = Conversation::new();
        let message = convo.append_assistant(&fallback_reply("canned"), "how much?");
        assert!(message.is_fallback);
        assert_eq!(message.original_user_message.as_deref(), Some("how much?"));
        assert_eq!(message.category, Some(Category::Services));
        assert!(message.show_quick_actions);
    }

    #[test]
    fn unread_counts_only_while_closed() {
        let mut convo = Conversation::new();
        convo.append_assistant(&remote_reply("one"), "");
        convo.append_assistant(&remote_reply("two"), "");
        assert_eq!(convo.unread_count(), 2);

        convo.open();
        assert_eq!(convo.unread_count(), 0);

        convo.append_assistant(&remote_reply("three"), "");
        assert_eq!(convo.unread_count(), 0);
    }

    #[test]
    fn open_close_toggle_drive_mood() {
        let mut convo = Conversation::new();
        assert!(convo.toggle());
        assert_eq!(convo.mood(), Mood::Happy);
        assert!(!convo.toggle());
        assert_eq!(convo.mood(), Mood::Idle);
    }

    #[test]
    fn feedback_toggles_and_tolerates_unknown_ids() {
        let mut convo = Conversation::new();
        let message = convo.append_assistant(&remote_reply("hi"), "");

        assert!(convo.set_feedback(&message.id, Feedback::Liked));
        assert_eq!(convo.messages()[1].feedback, Some(Feedback::Liked));

        // Same value again clears it.
        assert!(convo.set_feedback(&message.id, Feedback::Liked));
        assert_eq!(convo.messages()[1].feedback, None);

        assert!(convo.set_feedback(&message.id, Feedback::Disliked));
        assert_eq!(convo.messages()[1].feedback, Some(Feedback::Disliked));

        assert!(!convo.set_feedback("bot_999", Feedback::Liked));
    }

    #[test]
    fn clear_resets_log_and_counters() {
        let mut convo = Conversation::new();
        convo.append_user("hello");
        convo.append_assistant(&remote_reply("hi"), "hello");
        convo.set_typing(true);
        convo.clear();

        assert_eq!(convo.messages().len(), 1);
        assert_eq!(convo.messages()[0].id, WELCOME_ID);
        assert_eq!(convo.unread_count(), 0);
        assert!(!convo.is_typing());
        // Counter restarts too.
        assert_eq!(convo.append_user("fresh").unwrap().id, "user_1");
    }

    #[test]
    fn remote_history_excludes_welcome_and_retried_turn() {
        let mut convo = Conversation::new();
        convo.append_user("question");
        let bot = convo.append_assistant(&fallback_reply("canned"), "question");

        let full = convo.remote_history(None);
        assert_eq!(full.len(), 2);
        assert_eq!(full[0].role, Role::User);
        assert_eq!(full[0].content, "question");

        let without_retry = convo.remote_history(Some(bot.id.as_str()));
        assert_eq!(without_retry.len(), 1);
        assert_eq!(without_retry[0].content, "question");
    }

    #[test]
    fn from_messages_resumes_the_id_counter() {
        let hydrated = vec![
            ChatMessage::user("user_3", "a"),
            ChatMessage::assistant("bot_7", "b"),
        ];
        let mut convo = Conversation::from_messages(hydrated);
        assert_eq!(convo.messages().len(), 2);
        assert_eq!(convo.unread_count(), 0);
        assert_eq!(convo.append_user("next").unwrap().id, "user_8");
    }

    #[test]
    fn from_messages_empty_falls_back_to_welcome() {
        let convo = Conversation::from_messages(Vec::new());
        assert_eq!(convo.messages().len(), 1);
        assert_eq!(convo.messages()[0].id, WELCOME_ID);
    }

    #[test]
    fn retryable_original_requires_a_failed_fallback() {
        let mut convo = Conversation::new();
        convo.append_user("question");
        let fallback = convo.append_assistant(&fallback_reply("canned"), "question");
        let remote = convo.append_assistant(&remote_reply("real"), "other");

        assert_eq!(
            convo.retryable_original(&fallback.id).as_deref(),
            Some("question")
        );
        assert!(convo.retryable_original(&remote.id).is_none());
        assert!(convo.retryable_original("user_1").is_none());
        assert!(convo.retryable_original("gone").is_none());
    }

    #[test]
    fn retry_success_rewrites_only_the_retry_fields() {
        let mut convo = Conversation::new();
        convo.append_user("question");
        let target = convo.append_assistant(&fallback_reply("canned"), "question");
        convo.mark_retry_failed(&target.id);
        convo.set_typing(true);

        assert!(convo.apply_retry_success(&target.id, &remote_reply("real answer")));

        let updated = &convo.messages()[2];
        assert_eq!(updated.content, "real answer");
        assert!(!updated.is_fallback);
        assert!(updated.original_user_message.is_none());
        assert_eq!(updated.retry_count, 0);
        // id, timestamp, category, and the quick-action flag stay as appended.
        assert_eq!(updated.id, target.id);
        assert_eq!(updated.timestamp, target.timestamp);
        assert_eq!(updated.category, Some(Category::Services));
        assert!(updated.show_quick_actions);

        assert!(!convo.is_typing());
        assert_eq!(convo.mood(), Mood::Talking);
    }

    #[test]
    fn retry_failure_increments_and_preserves_content() {
        let mut convo = Conversation::new();
        convo.append_user("question");
        let target = convo.append_assistant(&fallback_reply("canned"), "question");
        convo.set_typing(true);

        assert!(convo.mark_retry_failed(&target.id));

        let updated = &convo.messages()[2];
        assert_eq!(updated.retry_count, 1);
        assert_eq!(updated.content, "canned");
        assert!(updated.is_fallback);
        assert!(!convo.is_typing());
        assert_eq!(convo.mood(), Mood::Idle);

        // Pruned ids are a quiet no-op.
        assert!(!convo.mark_retry_failed("bot_404"));
        assert!(!convo.apply_retry_success("bot_404", &remote_reply("x")));
    }
}
