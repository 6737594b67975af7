//! Conversation snapshot persistence over a host key-value string store.
//!
//! Defines the [`KeyValueStore`] trait the host implements (browser local
//! storage, a settings file, anything that maps strings to strings) and
//! provides [`MemoryKeyValueStore`] for tests and ephemeral hosts.
//!
//! [`ChatArchive`] is the policy layer on top: it keeps only the most
//! recent messages and owns the snapshot and mute-flag keys. Timestamps
//! ride along as RFC 3339 strings via the message serialization, so
//! snapshots stay sortable and readable.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::PersistenceConfig;
use crate::message::ChatMessage;

/// Host-supplied key-value string store.
///
/// `get` returns `Ok(None)` for keys that were never written. Implementations
/// may fail for any reason; callers treat failures as a missing snapshot.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value by key.
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Write (overwrite) a value.
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// In-memory store for tests and hosts without durable storage.
///
/// Values live in an `Arc<RwLock<HashMap>>`; cheaply cloneable, lost on drop.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let values = self.values.read().await;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut values = self.values.write().await;
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Bounded snapshot reader/writer for one conversation.
#[derive(Clone)]
pub struct ChatArchive {
    store: Arc<dyn KeyValueStore>,
    config: PersistenceConfig,
}

impl ChatArchive {
    pub fn new(store: Arc<dyn KeyValueStore>, config: PersistenceConfig) -> Self {
        Self { store, config }
    }

    /// Persist the log, keeping only the most recent `max_messages`,
    /// oldest dropped first.
    pub async fn save(&self, messages: &[ChatMessage]) -> anyhow::Result<()> {
        let start = messages.len().saturating_sub(self.config.max_messages);
        let blob = serde_json::to_string(&messages[start..])?;
        self.store.set(&self.config.snapshot_key, &blob).await?;
        debug!(stored = messages.len() - start, "conversation snapshot written");
        Ok(())
    }

    /// Load the snapshot. `Ok(None)` means nothing usable was stored (no
    /// key, empty value, or an empty list); a present-but-unparseable value
    /// is an error the caller decides how to swallow.
    pub async fn load(&self) -> anyhow::Result<Option<Vec<ChatMessage>>> {
        let Some(raw) = self.store.get(&self.config.snapshot_key).await? else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let messages: Vec<ChatMessage> = serde_json::from_str(&raw)?;
        if messages.is_empty() {
            return Ok(None);
        }
        Ok(Some(messages))
    }

    /// Drop the stored snapshot.
    pub async fn purge(&self) -> anyhow::Result<()> {
        self.store.set(&self.config.snapshot_key, "").await
    }

    /// Read the persisted mute flag. Absent or unrecognized values mean
    /// unmuted.
    pub async fn load_muted(&self) -> anyhow::Result<bool> {
        let value = self.store.get(&self.config.mute_key).await?;
        Ok(value.as_deref() == Some("true"))
    }

    /// Persist the mute flag.
    pub async fn save_muted(&self, muted: bool) -> anyhow::Result<()> {
        let value = if muted { "true" } else { "false" };
        self.store.set(&self.config.mute_key, value).await
    }
}
