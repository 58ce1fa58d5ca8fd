//! Streaming audio call sequencer.
//!
//! One [`CallSession`] manages one bidirectional realtime audio exchange:
//! capture frames go out to the remote collaborator, returned chunks are
//! scheduled for gapless playback, and accumulated transcripts land in the
//! conversation store as discrete messages. The session exposes state and
//! broadcast updates; it never calls into the UI.

pub mod pcm;
pub mod playback;
pub mod traits;
pub mod transcript;
pub mod types;

mod worker;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::call::playback::PlaybackSequencer;
use crate::call::traits::{PlaybackId, PlaybackSink, RealtimeAudioClient};
use crate::call::types::{CallConfig, CallPhase, CallUpdate, LiveEvent, OutboundFrame};
use crate::call::worker::CallWorker;
use crate::store::ConversationStore;
use crate::telemetry::events::record_call_phase;

pub(crate) enum CallCommand {
    HangUp,
}

/// State shared between the session handle and its worker task.
pub(crate) struct SessionShared {
    contact_id: String,
    active: AtomicBool,
    muted: AtomicBool,
    phase: Mutex<CallPhase>,
    client: Arc<dyn RealtimeAudioClient>,
    capture_sample_rate_hz: u32,
    update_tx: broadcast::Sender<CallUpdate>,
}

impl SessionShared {
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub(crate) fn client(&self) -> &Arc<dyn RealtimeAudioClient> {
        &self.client
    }

    pub(crate) fn phase(&self) -> CallPhase {
        match self.phase.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Applies a phase transition if the state machine allows it. Terminal
    /// phases admit none; `Connected` is only reachable from `Connecting`.
    pub(crate) fn transition(&self, next: CallPhase) -> bool {
        {
            let mut phase = match self.phase.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if phase.is_terminal() || *phase == next {
                return false;
            }
            if next == CallPhase::Connected && *phase != CallPhase::Connecting {
                return false;
            }
            *phase = next;
        }

        record_call_phase(&self.contact_id, next.as_str());
        self.emit(CallUpdate::Phase(next));
        true
    }

    pub(crate) fn emit(&self, update: CallUpdate) {
        // Nobody listening is fine; the phase getter covers polling UIs.
        let _ = self.update_tx.send(update);
    }
}

/// Handle on one active voice call.
///
/// Created in `Connecting`; the worker drives the phase from collaborator
/// lifecycle events. Dropping the handle aborts the worker; `hang_up` is the
/// graceful path and is safe to call any number of times, including on a
/// session that never connected.
pub struct CallSession {
    shared: Arc<SessionShared>,
    command_tx: mpsc::Sender<CallCommand>,
    worker: Option<JoinHandle<()>>,
}

impl CallSession {
    /// Starts a session over an already-initiated collaborator connection.
    /// `events` delivers the collaborator's inbound traffic; `playback_done`
    /// reports buffers the sink finished playing.
    pub fn start(
        config: CallConfig,
        contact_id: impl Into<String>,
        store: Arc<ConversationStore>,
        client: Arc<dyn RealtimeAudioClient>,
        sink: Arc<dyn PlaybackSink>,
        events: mpsc::Receiver<LiveEvent>,
        playback_done: mpsc::Receiver<PlaybackId>,
    ) -> Self {
        let contact_id = contact_id.into();
        let (update_tx, _) = broadcast::channel(config.update_buffer);
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);

        let shared = Arc::new(SessionShared {
            contact_id: contact_id.clone(),
            active: AtomicBool::new(true),
            muted: AtomicBool::new(false),
            phase: Mutex::new(CallPhase::Connecting),
            client,
            capture_sample_rate_hz: config.capture_sample_rate_hz,
            update_tx,
        });

        let worker = CallWorker::new(
            Arc::clone(&shared),
            contact_id,
            store,
            PlaybackSequencer::new(sink),
            events,
            playback_done,
            command_rx,
            config.output_sample_rate_hz,
        );
        let worker = tokio::spawn(worker.run());

        Self {
            shared,
            command_tx,
            worker: Some(worker),
        }
    }

    pub fn phase(&self) -> CallPhase {
        self.shared.phase()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CallUpdate> {
        self.shared.update_tx.subscribe()
    }

    /// While muted, capture frames keep arriving but are dropped instead of
    /// forwarded; the device stream itself is untouched.
    pub fn set_muted(&self, muted: bool) {
        self.shared.muted.store(muted, Ordering::SeqCst);
    }

    pub fn is_muted(&self) -> bool {
        self.shared.muted.load(Ordering::SeqCst)
    }

    /// Forwards one capture block to the collaborator as 16-bit PCM tagged
    /// with the capture sample rate. A no-op after teardown and while muted.
    pub async fn push_capture_frame(&self, samples: &[f32]) -> Result<()> {
        if !self.shared.is_active() {
            return Ok(());
        }
        if samples.is_empty() {
            warn!(target: "call_session", "received empty capture frame");
            return Ok(());
        }
        if self.is_muted() {
            return Ok(());
        }

        let frame = OutboundFrame {
            sample_rate_hz: self.shared.capture_sample_rate_hz,
            data: pcm::encode_frame(samples),
        };
        self.shared.client.send_audio(frame).await
    }

    /// Gracefully ends the call: pending transcripts flush, in-flight
    /// playback stops, the collaborator handle closes. Idempotent.
    pub async fn hang_up(&self) {
        self.shared.deactivate();
        // The worker may already be gone after a fault or remote close.
        let _ = self.command_tx.send(CallCommand::HangUp).await;
    }
}

impl Drop for CallSession {
    fn drop(&mut self) {
        self.shared.deactivate();
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}
