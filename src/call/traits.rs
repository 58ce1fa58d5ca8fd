use anyhow::Result;
use async_trait::async_trait;

use crate::call::types::{OutboundFrame, PcmBuffer};

/// Handle on a scheduled playback buffer, for stopping it on interruption.
pub type PlaybackId = u64;

/// The remote realtime-audio collaborator. Inbound traffic arrives on the
/// event channel handed to [`crate::call::CallSession::start`].
#[async_trait]
pub trait RealtimeAudioClient: Send + Sync {
    async fn send_audio(&self, frame: OutboundFrame) -> Result<()>;
    async fn close(&self) -> Result<()>;
}

/// Output device boundary: a monotonic output clock plus buffer start/stop.
/// Completions are reported back through the playback-done channel.
pub trait PlaybackSink: Send + Sync {
    /// Current output clock time in seconds.
    fn now(&self) -> f64;
    fn start(&self, buffer: PcmBuffer, at: f64) -> PlaybackId;
    fn stop(&self, id: PlaybackId);
}
