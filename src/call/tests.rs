use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::call::pcm;
use crate::call::traits::{PlaybackId, PlaybackSink, RealtimeAudioClient};
use crate::call::types::{
    AudioChunk, CallConfig, CallPhase, CallUpdate, LiveEvent, OutboundFrame, PcmBuffer,
    TranscriptDirection,
};
use crate::call::CallSession;
use crate::store::storage::MemoryStorage;
use crate::store::types::SenderRole;
use crate::store::ConversationStore;

#[derive(Default)]
struct RecordingClient {
    frames: Mutex<Vec<OutboundFrame>>,
    close_calls: AtomicUsize,
}

impl RecordingClient {
    fn frames(&self) -> Vec<OutboundFrame> {
        self.frames.lock().expect("frames lock").clone()
    }

    fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RealtimeAudioClient for RecordingClient {
    async fn send_audio(&self, frame: OutboundFrame) -> Result<()> {
        self.frames.lock().expect("frames lock").push(frame);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct ManualSink {
    clock: Mutex<f64>,
    starts: Mutex<Vec<(PlaybackId, f64, f64)>>,
    stopped: Mutex<Vec<PlaybackId>>,
    next_id: AtomicU64,
}

impl ManualSink {
    fn set_clock(&self, at: f64) {
        *self.clock.lock().expect("clock lock") = at;
    }

    fn starts(&self) -> Vec<(PlaybackId, f64, f64)> {
        self.starts.lock().expect("starts lock").clone()
    }

    fn stopped(&self) -> Vec<PlaybackId> {
        self.stopped.lock().expect("stopped lock").clone()
    }
}

impl PlaybackSink for ManualSink {
    fn now(&self) -> f64 {
        *self.clock.lock().expect("clock lock")
    }

    fn start(&self, buffer: PcmBuffer, at: f64) -> PlaybackId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.starts
            .lock()
            .expect("starts lock")
            .push((id, at, buffer.duration_secs()));
        id
    }

    fn stop(&self, id: PlaybackId) {
        self.stopped.lock().expect("stopped lock").push(id);
    }
}

struct Harness {
    session: CallSession,
    events: mpsc::Sender<LiveEvent>,
    playback_done: mpsc::Sender<PlaybackId>,
    client: Arc<RecordingClient>,
    sink: Arc<ManualSink>,
    store: Arc<ConversationStore>,
    contact_id: String,
}

fn start_call() -> Harness {
    let store = Arc::new(ConversationStore::load(Arc::new(MemoryStorage::default())));
    let contact = store
        .add_contact("Call Partner", "+1 555 222 3333")
        .expect("add contact");

    let client = Arc::new(RecordingClient::default());
    let sink = Arc::new(ManualSink::default());
    let (event_tx, event_rx) = mpsc::channel(16);
    let (done_tx, done_rx) = mpsc::channel(16);

    let session = CallSession::start(
        CallConfig::default(),
        contact.id.clone(),
        Arc::clone(&store),
        client.clone() as Arc<dyn RealtimeAudioClient>,
        sink.clone() as Arc<dyn PlaybackSink>,
        event_rx,
        done_rx,
    );

    Harness {
        session,
        events: event_tx,
        playback_done: done_tx,
        client,
        sink,
        store,
        contact_id: contact.id,
    }
}

/// Output-rate chunk of the given duration, encoded as the collaborator would
/// send it.
fn audio_chunk(duration_secs: f64) -> LiveEvent {
    let samples = vec![0.05_f32; (duration_secs * 24_000.0) as usize];
    LiveEvent::Audio(AudioChunk {
        data: pcm::encode_frame(&samples),
    })
}

async fn wait_until(mut predicate: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !predicate() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition not reached in time");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn opened_event_moves_the_call_to_connected() {
    let call = start_call();
    assert_eq!(call.session.phase(), CallPhase::Connecting);

    call.events.send(LiveEvent::Opened).await.expect("send");
    wait_until(|| call.session.phase() == CallPhase::Connected).await;
}

#[tokio::test]
async fn audio_chunks_are_scheduled_back_to_back() {
    let call = start_call();
    call.events.send(LiveEvent::Opened).await.expect("send");

    call.events.send(audio_chunk(0.5)).await.expect("send");
    call.events.send(audio_chunk(0.25)).await.expect("send");
    call.events.send(audio_chunk(1.0)).await.expect("send");
    wait_until(|| call.sink.starts().len() == 3).await;

    let starts = call.sink.starts();
    assert_eq!(starts[0].1, 0.0);
    assert!((starts[1].1 - 0.5).abs() < 1e-6);
    assert!((starts[2].1 - 0.75).abs() < 1e-6);
}

#[tokio::test]
async fn interruption_stops_playback_and_resets_the_cursor() {
    let call = start_call();
    call.events.send(LiveEvent::Opened).await.expect("send");

    call.events.send(audio_chunk(0.5)).await.expect("send");
    call.events.send(audio_chunk(0.5)).await.expect("send");
    wait_until(|| call.sink.starts().len() == 2).await;

    call.sink.set_clock(0.2);
    call.events.send(LiveEvent::Interrupted).await.expect("send");
    wait_until(|| call.sink.stopped().len() == 2).await;

    // The next chunk starts at the reset clock, not the one-second cursor.
    call.events.send(audio_chunk(0.1)).await.expect("send");
    wait_until(|| call.sink.starts().len() == 3).await;
    assert!((call.sink.starts()[2].1 - 0.2).abs() < 1e-6);
}

#[tokio::test]
async fn turn_complete_flushes_transcripts_into_the_store() {
    let call = start_call();
    call.events.send(LiveEvent::Opened).await.expect("send");

    for (direction, text) in [
        (TranscriptDirection::User, "how are "),
        (TranscriptDirection::User, "you?"),
        (TranscriptDirection::Remote, "doing great, "),
        (TranscriptDirection::Remote, "thanks!"),
    ] {
        call.events
            .send(LiveEvent::Transcript {
                direction,
                text: text.to_string(),
            })
            .await
            .expect("send");
    }
    call.events.send(LiveEvent::TurnComplete).await.expect("send");
    wait_until(|| call.store.messages(&call.contact_id).len() == 2).await;

    let messages = call.store.messages(&call.contact_id);
    assert_eq!(messages[0].sender, SenderRole::User);
    assert_eq!(messages[0].text, "how are you?");
    assert_eq!(messages[1].sender, SenderRole::Contact);
    assert_eq!(messages[1].text, "doing great, thanks!");

    // Buffers drained: a second turn boundary adds nothing.
    call.events.send(LiveEvent::TurnComplete).await.expect("send");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(call.store.messages(&call.contact_id).len(), 2);
}

#[tokio::test]
async fn remote_close_flushes_and_ends_the_call() {
    let call = start_call();
    call.events.send(LiveEvent::Opened).await.expect("send");
    call.events
        .send(LiveEvent::Transcript {
            direction: TranscriptDirection::Remote,
            text: "goodbye".to_string(),
        })
        .await
        .expect("send");

    call.events.send(LiveEvent::Closed).await.expect("send");
    wait_until(|| call.session.phase() == CallPhase::Ended).await;

    let messages = call.store.messages(&call.contact_id);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "goodbye");
    assert_eq!(call.client.close_calls(), 1);
}

#[tokio::test]
async fn fault_ends_the_call_in_error_and_later_events_are_ignored() {
    let call = start_call();
    call.events.send(LiveEvent::Opened).await.expect("send");
    call.events
        .send(LiveEvent::Fault("socket torn down".to_string()))
        .await
        .expect("send");
    wait_until(|| call.session.phase() == CallPhase::Error).await;

    call.events.send(audio_chunk(0.5)).await.expect("send");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(call.sink.starts().is_empty());
}

#[tokio::test]
async fn speaking_updates_follow_playback_activity() {
    let call = start_call();
    let mut updates = call.session.subscribe();
    call.events.send(LiveEvent::Opened).await.expect("send");
    call.events.send(audio_chunk(0.5)).await.expect("send");

    loop {
        match updates.recv().await.expect("update") {
            CallUpdate::Speaking(true) => break,
            _ => continue,
        }
    }

    // The sink reporting the buffer finished quiets the session again.
    let (id, _, _) = call.sink.starts()[0];
    call.playback_done.send(id).await.expect("send done");
    loop {
        match updates.recv().await.expect("update") {
            CallUpdate::Speaking(false) => break,
            _ => continue,
        }
    }
}

#[tokio::test]
async fn capture_frames_are_encoded_and_muted_frames_dropped() {
    let call = start_call();
    call.events.send(LiveEvent::Opened).await.expect("send");
    wait_until(|| call.session.phase() == CallPhase::Connected).await;

    let samples = vec![0.25_f32; 320];
    call.session
        .push_capture_frame(&samples)
        .await
        .expect("push frame");

    let frames = call.client.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].sample_rate_hz, 16_000);
    assert_eq!(frames[0].data.len(), samples.len() * 2);

    call.session.set_muted(true);
    call.session
        .push_capture_frame(&samples)
        .await
        .expect("push frame");
    assert_eq!(call.client.frames().len(), 1);

    call.session.set_muted(false);
    call.session
        .push_capture_frame(&samples)
        .await
        .expect("push frame");
    assert_eq!(call.client.frames().len(), 2);
}

#[tokio::test]
async fn hang_up_is_idempotent_and_closes_the_client_once() {
    let call = start_call();
    call.events.send(LiveEvent::Opened).await.expect("send");
    call.events
        .send(LiveEvent::Transcript {
            direction: TranscriptDirection::User,
            text: "hello?".to_string(),
        })
        .await
        .expect("send");
    // A chunk behind the transcript proves the worker has consumed both
    // before the hang-up lands.
    call.events.send(audio_chunk(0.3)).await.expect("send");
    wait_until(|| call.sink.starts().len() == 1).await;

    call.session.hang_up().await;
    wait_until(|| call.session.phase() == CallPhase::Ended).await;
    call.session.hang_up().await;

    assert_eq!(call.session.phase(), CallPhase::Ended);
    assert_eq!(call.client.close_calls(), 1);
    assert_eq!(call.store.messages(&call.contact_id).len(), 1);

    // Capture after teardown is a silent no-op.
    call.session
        .push_capture_frame(&[0.1, 0.2])
        .await
        .expect("push frame");
    assert!(call.client.frames().is_empty());
}

#[tokio::test]
async fn hanging_up_before_connecting_still_ends_cleanly() {
    let call = start_call();
    call.session.hang_up().await;
    wait_until(|| call.session.phase() == CallPhase::Ended).await;
    assert_eq!(call.client.close_calls(), 1);
}
