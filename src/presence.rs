//! Idle-presence timer: the assistant dozes off when nobody is around.
//!
//! Runs orthogonally to the conversation flow. Every activity signal calls
//! [`PresenceTimer::wake`], which clears a sleeping avatar back to idle and
//! restarts the countdown. When the countdown expires with the panel closed
//! and the mood still idle, the avatar switches to sleeping. Purely cosmetic;
//! it never blocks or drops queued work.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::conversation::Conversation;
use crate::message::Mood;

pub struct PresenceTimer {
    state: Arc<Mutex<Conversation>>,
    timeout: Duration,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PresenceTimer {
    /// Create a disarmed timer. Call [`Self::rearm`] to start the countdown.
    pub fn new(state: Arc<Mutex<Conversation>>, timeout: Duration) -> Self {
        Self {
            state,
            timeout,
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// Activity signal: a sleeping avatar snaps back to idle and the
    /// countdown restarts from zero.
    pub fn wake(&self) {
        {
            let mut conversation = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if conversation.mood() == Mood::Sleeping {
                conversation.set_mood(Mood::Idle);
            }
        }
        self.rearm();
    }

    /// Restart the countdown without touching the current mood.
    pub fn rearm(&self) {
        let state = Arc::clone(&self.state);
        let timeout = self.timeout;
        let cancel = self.cancel.clone();

        let mut guard = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = guard.take() {
            previous.abort();
        }
        *guard = Some(tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(timeout) => {
                    let mut conversation = state.lock().unwrap_or_else(|e| e.into_inner());
                    if !conversation.is_open() && conversation.mood() == Mood::Idle {
                        debug!("presence timeout, assistant dozing off");
                        conversation.set_mood(Mood::Sleeping);
                    }
                }
            }
        }));
    }

    /// Stop the countdown permanently. Used at session teardown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        if let Ok(mut guard) = self.task.lock()
            && let Some(handle) = guard.take()
        {
            handle.abort();
        }
    }
}

impl Drop for PresenceTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
