use serde::Serialize;
use tracing::{info, warn};

pub(crate) const TARGET: &str = "telemetry::asiltcom";
pub(crate) const EVENT_STORE_WRITE_FAILED: &str = "store_write_failed";
pub(crate) const EVENT_SNAPSHOT_IMPORTED: &str = "snapshot_imported";
pub(crate) const EVENT_CALL_PHASE: &str = "call_phase";
pub(crate) const EVENT_PLAYBACK_SCHEDULED: &str = "playback_scheduled";
pub(crate) const EVENT_PLAYBACK_INTERRUPTED: &str = "playback_interrupted";
pub(crate) const EVENT_REPLY_FALLBACK: &str = "reply_fallback";

#[derive(Debug, Serialize)]
pub struct StoreWriteFailedEvent<'a> {
    pub key: &'a str,
    pub error: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SnapshotImportedEvent {
    pub contacts: usize,
    pub conversations: usize,
}

#[derive(Debug, Serialize)]
pub struct CallPhaseEvent<'a> {
    pub contact_id: &'a str,
    pub phase: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PlaybackScheduledEvent {
    pub start_secs: f64,
    pub duration_secs: f64,
    pub in_flight: usize,
}

#[derive(Debug, Serialize)]
pub struct PlaybackInterruptedEvent {
    pub stopped: usize,
}

#[derive(Debug, Serialize)]
pub struct ReplyFallbackEvent<'a> {
    pub contact_id: &'a str,
    pub stage: &'static str,
    pub reason: &'a str,
}

pub fn record_store_write_failure(key: &str, error: &str) {
    let event = StoreWriteFailedEvent { key, error };
    emit(EVENT_STORE_WRITE_FAILED, &event);
}

pub fn record_snapshot_imported(contacts: usize, conversations: usize) {
    let event = SnapshotImportedEvent {
        contacts,
        conversations,
    };
    emit(EVENT_SNAPSHOT_IMPORTED, &event);
}

pub fn record_call_phase(contact_id: &str, phase: &'static str) {
    let event = CallPhaseEvent { contact_id, phase };
    emit(EVENT_CALL_PHASE, &event);
}

pub fn record_playback_scheduled(start_secs: f64, duration_secs: f64, in_flight: usize) {
    let event = PlaybackScheduledEvent {
        start_secs,
        duration_secs,
        in_flight,
    };
    emit(EVENT_PLAYBACK_SCHEDULED, &event);
}

pub fn record_playback_interrupted(stopped: usize) {
    let event = PlaybackInterruptedEvent { stopped };
    emit(EVENT_PLAYBACK_INTERRUPTED, &event);
}

/// `stage` names which reply path degraded: the primary engine falling back to
/// the conservative one, or the whole chain resolving to the placeholder.
pub fn record_reply_fallback(contact_id: &str, stage: &'static str, reason: &str) {
    let event = ReplyFallbackEvent {
        contact_id,
        stage,
        reason,
    };
    emit(EVENT_REPLY_FALLBACK, &event);
}

fn emit<T: Serialize>(event_name: &'static str, event: &T) {
    match serde_json::to_string(event) {
        Ok(payload) => info!(
            target: TARGET,
            event = event_name,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = event_name,
            %err,
            "failed to encode telemetry event"
        ),
    }
}
