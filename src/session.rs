//! Session orchestration: one [`AssistantSession`] per embedded widget.
//!
//! The session wires the conversation state to the reply resolver, the
//! snapshot archive, the notification gate, and the presence timer, and
//! exposes the command surface hosts drive from their UI. All methods take
//! `&self`; state lives behind a mutex so the session can be shared across
//! tasks. Snapshot writes are fire-and-forget. The 2s mood reset and the
//! presence countdown are owned cancellable tasks, and [`shutdown`] stops
//! every pending timer so nothing mutates state after teardown.
//!
//! [`shutdown`]: AssistantSession::shutdown

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{AssistantConfig, TimingConfig};
use crate::conversation::{Conversation, ConversationState};
use crate::message::{ChatMessage, Feedback, Mood};
use crate::notify::{AudioCue, NotificationGate};
use crate::persistence::{ChatArchive, KeyValueStore};
use crate::presence::PresenceTimer;
use crate::remote::ReplyService;
use crate::resolver::{AmbientContext, ReplyResolver, ReplySource};
use crate::responses;

/// What a submission did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A reply was appended, by the named path.
    Replied(ReplySource),
    /// Nothing happened: blank input, unknown quick action, or a turn
    /// already in flight.
    Ignored,
}

/// What a retry did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The remote answered; the turn was rewritten in place.
    Recovered,
    /// The remote failed again; the retry counter ticked up.
    Failed,
    /// The id named no retryable turn, or a turn was already in flight.
    Ignored,
}

/// One write to the archive. Routed through a single writer task so
/// fire-and-forget writes land in the order they were issued.
enum ArchiveCommand {
    Save(Vec<ChatMessage>),
    Purge,
    SetMuted(bool),
}

/// Embedded assistant runtime for one visitor session.
pub struct AssistantSession {
    state: Arc<Mutex<Conversation>>,
    resolver: ReplyResolver,
    archive_tx: mpsc::UnboundedSender<ArchiveCommand>,
    gate: Mutex<NotificationGate>,
    presence: Arc<PresenceTimer>,
    context: Mutex<AmbientContext>,
    timing: TimingConfig,
    cancel: CancellationToken,
    mood_reset: Mutex<Option<JoinHandle<()>>>,
}

impl AssistantSession {
    /// Bring up a session: hydrate the conversation from the archive, load
    /// the mute preference, and arm the presence countdown.
    ///
    /// Hydration is forgiving. A missing snapshot starts fresh; an
    /// unreadable one is logged and discarded rather than surfaced.
    pub async fn start(
        config: AssistantConfig,
        service: Arc<dyn ReplyService>,
        store: Arc<dyn KeyValueStore>,
        cue: Option<Box<dyn AudioCue>>,
    ) -> Self {
        let archive = ChatArchive::new(store, config.persistence.clone());

        let conversation = match archive.load().await {
            Ok(Some(messages)) => {
                debug!(restored = messages.len(), "conversation hydrated from snapshot");
                Conversation::from_messages(messages)
            }
            Ok(None) => Conversation::new(),
            Err(error) => {
                warn!(error = %error, "stored conversation unreadable, starting fresh");
                Conversation::new()
            }
        };

        let mut gate = NotificationGate::new(cue, &config.notification);
        match archive.load_muted().await {
            Ok(muted) => gate.set_muted(muted),
            Err(error) => {
                debug!(error = %error, "mute preference unavailable, defaulting to audible");
            }
        }

        let state = Arc::new(Mutex::new(conversation));
        let presence = Arc::new(PresenceTimer::new(
            Arc::clone(&state),
            Duration::from_millis(config.timing.sleep_timeout_ms),
        ));
        presence.rearm();

        // Single writer keeps archive writes in issue order; it drains and
        // exits once the session (the only sender) is dropped.
        let (archive_tx, mut archive_rx) = mpsc::unbounded_channel::<ArchiveCommand>();
        tokio::spawn(async move {
            while let Some(command) = archive_rx.recv().await {
                let written = match command {
                    ArchiveCommand::Save(messages) => archive.save(&messages).await,
                    ArchiveCommand::Purge => archive.purge().await,
                    ArchiveCommand::SetMuted(muted) => archive.save_muted(muted).await,
                };
                if let Err(error) = written {
                    warn!(error = %error, "archive write failed");
                }
            }
        });

        info!("assistant session started");
        Self {
            resolver: ReplyResolver::new(service, config.timing.clone()),
            state,
            archive_tx,
            gate: Mutex::new(gate),
            presence,
            context: Mutex::new(AmbientContext::default()),
            timing: config.timing,
            cancel: CancellationToken::new(),
            mood_reset: Mutex::new(None),
        }
    }

    // ── Conversation commands ───────────────────────────────────────────

    /// Submit a user turn and wait for its reply.
    ///
    /// Blank input and submissions made while a turn is in flight are
    /// ignored. The reply lands in the log before this returns; snapshot
    /// writes happen in the background.
    pub async fn submit(&self, content: &str) -> SubmitOutcome {
        if content.trim().is_empty() || self.cancel.is_cancelled() {
            return SubmitOutcome::Ignored;
        }
        self.presence.wake();

        let (user_content, history) = {
            let mut conversation = self.lock_state();
            if conversation.is_typing() {
                debug!("submission ignored, a turn is already in flight");
                return SubmitOutcome::Ignored;
            }
            // Context for the remote call is the log as it stood before
            // this turn; the new message travels in its own field.
            let history = conversation.remote_history(None);
            let Some(user) = conversation.append_user(content) else {
                return SubmitOutcome::Ignored;
            };
            conversation.set_typing(true);
            conversation.set_mood(Mood::Thinking);
            (user.content, history)
        };
        self.persist();

        let context = self.ambient();
        let reply = tokio::select! {
            () = self.cancel.cancelled() => {
                let mut conversation = self.lock_state();
                conversation.set_typing(false);
                return SubmitOutcome::Ignored;
            }
            reply = self.resolver.resolve(&user_content, history, &context) => reply,
        };

        let source = reply.source;
        {
            let mut conversation = self.lock_state();
            conversation.append_assistant(&reply, &user_content);
        }
        self.persist();
        self.gate.lock().unwrap_or_else(|e| e.into_inner()).notify();
        self.schedule_mood_reset();

        SubmitOutcome::Replied(source)
    }

    /// Submit one of the fixed quick-action chips by id. The chip's label
    /// goes through [`Self::submit`] as an ordinary user turn.
    pub async fn submit_quick_action(&self, action_id: &str) -> SubmitOutcome {
        let Some(action) = responses::quick_action(action_id) else {
            debug!(id = action_id, "unknown quick action ignored");
            return SubmitOutcome::Ignored;
        };
        self.submit(action.label).await
    }

    /// Retry a fallback turn against the remote service only.
    ///
    /// Success rewrites the turn in place; failure bumps its retry counter
    /// and keeps the canned text. A retry never falls back a second time
    /// and never waits the simulated-typing delay.
    pub async fn retry(&self, message_id: &str) -> RetryOutcome {
        if self.cancel.is_cancelled() {
            return RetryOutcome::Ignored;
        }
        self.presence.wake();

        let (original, history) = {
            let mut conversation = self.lock_state();
            if conversation.is_typing() {
                debug!("retry ignored, a turn is already in flight");
                return RetryOutcome::Ignored;
            }
            let Some(original) = conversation.retryable_original(message_id) else {
                debug!(id = message_id, "retry ignored, no failed turn under that id");
                return RetryOutcome::Ignored;
            };
            let history = conversation.remote_history(Some(message_id));
            conversation.set_typing(true);
            conversation.set_mood(Mood::Thinking);
            (original, history)
        };

        let context = self.ambient();
        let result = tokio::select! {
            () = self.cancel.cancelled() => {
                let mut conversation = self.lock_state();
                conversation.set_typing(false);
                return RetryOutcome::Ignored;
            }
            result = self.resolver.resolve_remote_only(&original, history, &context) => result,
        };

        let outcome = {
            let mut conversation = self.lock_state();
            match result {
                Ok(reply) => {
                    if conversation.apply_retry_success(message_id, &reply) {
                        RetryOutcome::Recovered
                    } else {
                        // The turn was pruned (cleared) while we waited.
                        conversation.set_typing(false);
                        conversation.set_mood(Mood::Idle);
                        RetryOutcome::Ignored
                    }
                }
                Err(error) => {
                    warn!(error = %error, id = message_id, "retry failed, keeping local reply");
                    if conversation.mark_retry_failed(message_id) {
                        RetryOutcome::Failed
                    } else {
                        conversation.set_typing(false);
                        conversation.set_mood(Mood::Idle);
                        RetryOutcome::Ignored
                    }
                }
            }
        };
        self.persist();
        match outcome {
            RetryOutcome::Recovered => self.schedule_mood_reset(),
            // The avatar settled straight to idle; restart the countdown.
            RetryOutcome::Failed | RetryOutcome::Ignored => self.presence.rearm(),
        }
        outcome
    }

    /// Toggle feedback on an assistant reply. Unknown ids are a no-op.
    pub fn set_feedback(&self, message_id: &str, feedback: Feedback) -> bool {
        let changed = self.lock_state().set_feedback(message_id, feedback);
        if changed {
            self.persist();
        }
        changed
    }

    /// Reset to a fresh welcome-only conversation and purge the snapshot.
    pub fn clear(&self) {
        self.lock_state().clear();
        let _ = self.archive_tx.send(ArchiveCommand::Purge);
    }

    // ── Panel and mood commands ─────────────────────────────────────────

    /// Open the panel: unread zeroes, avatar perks up.
    pub fn open(&self) {
        self.presence.wake();
        self.lock_state().open();
    }

    /// Close the panel; the presence countdown restarts.
    pub fn close(&self) {
        self.lock_state().close();
        self.presence.rearm();
    }

    /// Flip the panel; returns the new open state.
    pub fn toggle(&self) -> bool {
        self.presence.wake();
        let mut conversation = self.lock_state();
        conversation.toggle()
    }

    /// Input focus: the avatar leans in, unless a turn is resolving.
    pub fn focus_input(&self) {
        self.presence.wake();
        let mut conversation = self.lock_state();
        if !conversation.is_typing() {
            conversation.set_mood(Mood::Listening);
        }
    }

    /// Input blur: back to resting, unless a turn is resolving.
    pub fn blur_input(&self) {
        let mut conversation = self.lock_state();
        if !conversation.is_typing() {
            conversation.set_mood(Mood::Idle);
            drop(conversation);
            self.presence.rearm();
        }
    }

    /// Set the avatar mood directly. Setting `idle` restarts the presence
    /// countdown, matching what every other path back to rest does.
    pub fn set_mood(&self, mood: Mood) {
        self.lock_state().set_mood(mood);
        if mood == Mood::Idle {
            self.presence.rearm();
        }
    }

    // ── Preferences and context ─────────────────────────────────────────

    /// Flip the chime mute preference; the new value is persisted.
    pub fn toggle_mute(&self) -> bool {
        let muted = self
            .gate
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .toggle_muted();
        let _ = self.archive_tx.send(ArchiveCommand::SetMuted(muted));
        muted
    }

    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.gate.lock().unwrap_or_else(|e| e.into_inner()).is_muted()
    }

    /// Replace the ambient context (page, locale) sent with remote calls.
    pub fn set_context(&self, context: AmbientContext) {
        *self.context.lock().unwrap_or_else(|e| e.into_inner()) = context;
    }

    /// Cloneable view of the conversation for rendering.
    #[must_use]
    pub fn state(&self) -> ConversationState {
        self.lock_state().snapshot()
    }

    // ── Teardown ────────────────────────────────────────────────────────

    /// Stop every pending timer and in-flight resolution. Idempotent.
    /// Queued archive writes still drain; new submissions are ignored.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.presence.shutdown();
        if let Ok(mut guard) = self.mood_reset.lock()
            && let Some(handle) = guard.take()
        {
            handle.abort();
        }
        debug!("assistant session shut down");
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn lock_state(&self) -> std::sync::MutexGuard<'_, Conversation> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ambient(&self) -> AmbientContext {
        self.context.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Queue the current log for archiving without blocking the caller.
    fn persist(&self) {
        let messages = self.lock_state().messages().to_vec();
        let _ = self.archive_tx.send(ArchiveCommand::Save(messages));
    }

    /// Schedule the talking→idle settle. A newer schedule supersedes any
    /// pending one, and the settle is skipped when the mood has already
    /// moved on.
    fn schedule_mood_reset(&self) {
        let state = Arc::clone(&self.state);
        let presence = Arc::clone(&self.presence);
        let delay = Duration::from_millis(self.timing.mood_reset_ms);
        let cancel = self.cancel.clone();

        let mut guard = self.mood_reset.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = guard.take() {
            previous.abort();
        }
        *guard = Some(tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    let settled = {
                        let mut conversation = state.lock().unwrap_or_else(|e| e.into_inner());
                        if conversation.mood() == Mood::Talking {
                            conversation.set_mood(Mood::Idle);
                            true
                        } else {
                            false
                        }
                    };
                    if settled {
                        presence.rearm();
                    }
                }
            }
        }));
    }
}

impl Drop for AssistantSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
