//! Pixie: embeddable conversational assistant runtime.
//!
//! This crate is the headless core of the site assistant widget: a chat
//! session with a remote reply service, a deterministic local fallback
//! bank (English and Russian), an animated-avatar mood machine, bounded
//! snapshot persistence, and a mute-gated notification chime.
//!
//! # Architecture
//!
//! One [`AssistantSession`] per visitor, wired from small parts:
//! - **Conversation**: ordered message log, panel flags, mood, unread count
//! - **Resolver**: remote reply service first, keyword bank on failure
//! - **Archive**: bounded snapshot over a host key-value store
//! - **Presence**: 30s idle countdown that sends the avatar to sleep
//! - **Notification gate**: reply chime, honoring the persisted mute flag
//!
//! Hosts supply the transport ([`ReplyService`]), storage
//! ([`KeyValueStore`]), and sound ([`AudioCue`]) seams; everything else is
//! owned by the session.

pub mod config;
pub mod conversation;
pub mod error;
pub mod message;
pub mod notify;
pub mod persistence;
pub mod presence;
pub mod remote;
pub mod resolver;
pub mod responses;
pub mod session;

pub use config::AssistantConfig;
pub use conversation::{Conversation, ConversationState, WELCOME_ID};
pub use error::{AssistantError, Result};
pub use message::{Category, ChatMessage, Feedback, Mood, Role};
pub use notify::{AudioCue, NotificationGate};
pub use persistence::{ChatArchive, KeyValueStore, MemoryKeyValueStore};
pub use presence::PresenceTimer;
pub use remote::{HistoryTurn, HttpReplyService, ReplyRequest, ReplyService};
pub use resolver::{AmbientContext, ReplyResolver, ReplySource, ResolvedReply};
pub use session::{AssistantSession, RetryOutcome, SubmitOutcome};
