//! Notification chime, gated by the persisted mute preference.
//!
//! The crate never touches an audio device itself. The host hands in an
//! [`AudioCue`] (a wrapped `<audio>` element, a rodio sink, whatever fits)
//! and [`NotificationGate`] decides whether each assistant reply gets a
//! chime. Playback failures are logged and swallowed; a blocked or broken
//! cue must never disturb the conversation flow.

use tracing::debug;

use crate::config::NotificationConfig;

/// Host-supplied sound effect. Implementations restart the clip from the
/// beginning on every trigger so rapid replies each get a full chime.
pub trait AudioCue: Send + Sync {
    /// Set playback volume in `0.0..=1.0`.
    fn set_volume(&self, volume: f32);

    /// Seek to the start and play.
    fn rewind_and_play(&self) -> anyhow::Result<()>;
}

/// Decides whether the reply chime actually sounds.
pub struct NotificationGate {
    cue: Option<Box<dyn AudioCue>>,
    muted: bool,
}

impl NotificationGate {
    /// Wrap an optional cue. The configured volume is applied once here;
    /// hosts without audio pass `None` and every trigger is a no-op.
    pub fn new(cue: Option<Box<dyn AudioCue>>, config: &NotificationConfig) -> Self {
        if let Some(ref cue) = cue {
            cue.set_volume(config.volume);
        }
        Self { cue, muted: false }
    }

    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Flip the mute preference, returning the new value.
    pub fn toggle_muted(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Sound the chime unless muted. Failures are logged at debug level
    /// and otherwise ignored.
    pub fn notify(&self) {
        if self.muted {
            return;
        }
        let Some(ref cue) = self.cue else {
            return;
        };
        if let Err(error) = cue.rewind_and_play() {
            debug!(error = %error, "notification sound failed");
        }
    }
}
