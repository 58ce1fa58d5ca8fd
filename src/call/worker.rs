use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use crate::call::playback::PlaybackSequencer;
use crate::call::traits::PlaybackId;
use crate::call::transcript::TranscriptAccumulator;
use crate::call::types::{CallPhase, CallUpdate, LiveEvent, PcmBuffer};
use crate::call::{pcm, CallCommand, SessionShared};
use crate::store::ConversationStore;

/// Event loop of one call session. Consumes collaborator events, playback
/// completions and session commands until the session reaches a terminal
/// phase.
pub(crate) struct CallWorker {
    shared: Arc<SessionShared>,
    contact_id: String,
    store: Arc<ConversationStore>,
    sequencer: PlaybackSequencer,
    transcripts: TranscriptAccumulator,
    events: mpsc::Receiver<LiveEvent>,
    playback_done: mpsc::Receiver<PlaybackId>,
    commands: mpsc::Receiver<CallCommand>,
    output_sample_rate_hz: u32,
    speaking: bool,
}

impl CallWorker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        shared: Arc<SessionShared>,
        contact_id: String,
        store: Arc<ConversationStore>,
        sequencer: PlaybackSequencer,
        events: mpsc::Receiver<LiveEvent>,
        playback_done: mpsc::Receiver<PlaybackId>,
        commands: mpsc::Receiver<CallCommand>,
        output_sample_rate_hz: u32,
    ) -> Self {
        Self {
            shared,
            contact_id,
            store,
            sequencer,
            transcripts: TranscriptAccumulator::default(),
            events,
            playback_done,
            commands,
            output_sample_rate_hz,
            speaking: false,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                Some(CallCommand::HangUp) = self.commands.recv() => {
                    self.finish(CallPhase::Ended).await;
                    break;
                }
                Some(id) = self.playback_done.recv() => {
                    if !self.shared.is_active() {
                        continue;
                    }
                    self.sequencer.mark_finished(id);
                    self.sync_speaking();
                }
                event = self.events.recv() => {
                    match event {
                        // Teardown may have started while this event was in
                        // flight; inactive sessions ignore everything.
                        Some(_) if !self.shared.is_active() => continue,
                        Some(event) => {
                            if self.handle_event(event).await {
                                break;
                            }
                        }
                        // Collaborator dropped its sender: remote close.
                        None => {
                            self.finish(CallPhase::Ended).await;
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Returns true once the session has reached a terminal phase.
    async fn handle_event(&mut self, event: LiveEvent) -> bool {
        match event {
            LiveEvent::Opened => {
                self.shared.transition(CallPhase::Connected);
                false
            }
            LiveEvent::Audio(chunk) => {
                let samples = pcm::decode_chunk(&chunk.data);
                if samples.is_empty() {
                    warn!(target: "call_session", "received empty audio chunk");
                    return false;
                }
                self.sequencer.schedule(PcmBuffer {
                    samples,
                    sample_rate_hz: self.output_sample_rate_hz,
                });
                self.sync_speaking();
                false
            }
            LiveEvent::Transcript { direction, text } => {
                self.transcripts.push(direction, &text);
                false
            }
            LiveEvent::TurnComplete => {
                self.flush_transcripts();
                false
            }
            LiveEvent::Interrupted => {
                self.flush_transcripts();
                self.sequencer.interrupt();
                self.sync_speaking();
                false
            }
            LiveEvent::Closed => {
                self.finish(CallPhase::Ended).await;
                true
            }
            LiveEvent::Fault(message) => {
                warn!(target: "call_session", %message, "realtime collaborator fault");
                self.finish(CallPhase::Error).await;
                true
            }
        }
    }

    /// Tears the session down. Idempotent and tolerant of partial
    /// initialisation: each release is individually guarded so one failure
    /// never prevents releasing the rest.
    async fn finish(&mut self, outcome: CallPhase) {
        self.shared.deactivate();
        self.flush_transcripts();

        self.sequencer.interrupt();
        self.sync_speaking();

        if let Err(err) = self.shared.client().close().await {
            warn!(target: "call_session", %err, "failed to close realtime client");
        }

        self.shared.transition(outcome);
    }

    fn flush_transcripts(&mut self) {
        for (role, text) in self.transcripts.flush() {
            if let Err(err) = self.store.append_message(&self.contact_id, role, &text, None) {
                warn!(
                    target: "call_session",
                    %err,
                    "failed to record call transcript message"
                );
            }
        }
    }

    fn sync_speaking(&mut self) {
        let speaking = !self.sequencer.is_idle();
        if speaking != self.speaking {
            self.speaking = speaking;
            self.shared.emit(CallUpdate::Speaking(speaking));
        }
    }
}
