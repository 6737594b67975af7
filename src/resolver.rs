//! Remote-first reply resolution with a deterministic local fallback.
//!
//! [`ReplyResolver`] tries the remote reply service once per turn. Any
//! failure (network error, timeout, non-2xx, empty body) degrades to the
//! local response bank after a randomized simulated-typing delay, so the
//! visitor always gets an answer. The two paths are surfaced as a tagged
//! [`ReplySource`] rather than an error: a fallback is a normal outcome
//! here, not a fault.
//!
//! Retries use [`ReplyResolver::resolve_remote_only`]: a retry exists to
//! upgrade a fallback answer to a real one, so it never falls back again
//! and never waits the typing delay.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::TimingConfig;
use crate::message::Category;
use crate::remote::{HistoryTurn, ReplyRequest, ReplyService};
use crate::responses;

/// Where a resolved reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// The remote reply service answered.
    Remote,
    /// The local response bank answered after a remote failure.
    Fallback,
}

/// Outcome of resolving one user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReply {
    /// Reply text.
    pub content: String,
    /// Remote or fallback.
    pub source: ReplySource,
    /// Whether the host should offer quick-action chips under the reply.
    pub show_follow_ups: bool,
    /// Bank category the reply came from (fallback only).
    pub category: Option<Category>,
}

impl ResolvedReply {
    /// True when the reply came from the local bank.
    pub fn is_fallback(&self) -> bool {
        self.source == ReplySource::Fallback
    }
}

/// Host-supplied context sent with every remote request.
#[derive(Debug, Clone)]
pub struct AmbientContext {
    /// Page the visitor is on.
    pub page: String,
    /// Active locale code.
    pub locale: String,
}

impl Default for AmbientContext {
    fn default() -> Self {
        Self {
            page: "/".to_owned(),
            locale: "en".to_owned(),
        }
    }
}

/// Resolves user turns into replies, remote first.
pub struct ReplyResolver {
    service: Arc<dyn ReplyService>,
    timing: TimingConfig,
}

impl ReplyResolver {
    pub fn new(service: Arc<dyn ReplyService>, timing: TimingConfig) -> Self {
        Self { service, timing }
    }

    /// Resolve one user turn. Never fails: any remote error degrades to the
    /// local bank after the simulated-typing delay.
    pub async fn resolve(
        &self,
        content: &str,
        history: Vec<HistoryTurn>,
        context: &AmbientContext,
    ) -> ResolvedReply {
        match self.try_remote(content, history, context).await {
            Ok(reply) => {
                debug!(chars = reply.len(), "remote reply received");
                ResolvedReply {
                    content: reply,
                    source: ReplySource::Remote,
                    show_follow_ups: true,
                    category: None,
                }
            }
            Err(error) => {
                warn!(error = %error, "reply service unavailable, using local bank");
                self.typing_delay().await;
                self.local_match(content)
            }
        }
    }

    /// Remote-only resolution for retries: no local fallback, no delay.
    pub async fn resolve_remote_only(
        &self,
        content: &str,
        history: Vec<HistoryTurn>,
        context: &AmbientContext,
    ) -> anyhow::Result<ResolvedReply> {
        let reply = self.try_remote(content, history, context).await?;
        Ok(ResolvedReply {
            content: reply,
            source: ReplySource::Remote,
            show_follow_ups: true,
            category: None,
        })
    }

    /// Deterministic keyword fallback. Always produces a non-empty reply.
    pub fn local_match(&self, content: &str) -> ResolvedReply {
        let group = responses::find_group(content).unwrap_or(responses::DEFAULT_GROUP);
        ResolvedReply {
            content: responses::pick_reply(group).to_owned(),
            source: ReplySource::Fallback,
            show_follow_ups: !group.follow_ups.is_empty(),
            category: Some(group.category),
        }
    }

    async fn try_remote(
        &self,
        content: &str,
        history: Vec<HistoryTurn>,
        context: &AmbientContext,
    ) -> anyhow::Result<String> {
        self.service
            .send(ReplyRequest {
                message: content.trim().to_owned(),
                locale: context.locale.clone(),
                history,
                page: context.page.clone(),
            })
            .await
    }

    /// Wait a uniformly random interval so fallback replies land with the
    /// cadence of someone typing, not instantly.
    async fn typing_delay(&self) {
        let min = self.timing.fallback_delay_min_ms;
        let max = self.timing.fallback_delay_max_ms.max(min);
        let span = (max - min) as f64;
        let wait = min + (rand::random::<f64>() * span) as u64;
        tokio::time::sleep(Duration::from_millis(wait)).await;
    }
}
