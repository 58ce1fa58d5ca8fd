use bytes::Bytes;

use crate::store::types::SenderRole;

/// Capture side runs mono 16 kHz PCM; the collaborator returns mono 24 kHz.
pub const CAPTURE_SAMPLE_RATE_HZ: u32 = 16_000;
pub const OUTPUT_SAMPLE_RATE_HZ: u32 = 24_000;

/// Voice call state machine. `Ended` and `Error` are terminal; the only way
/// out of a terminal phase is destroying the session and starting a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Connecting,
    Connected,
    Ended,
    Error,
}

impl CallPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallPhase::Ended | CallPhase::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallPhase::Connecting => "connecting",
            CallPhase::Connected => "connected",
            CallPhase::Ended => "ended",
            CallPhase::Error => "error",
        }
    }
}

/// Which party a transcript fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptDirection {
    User,
    Remote,
}

impl TranscriptDirection {
    pub fn sender_role(&self) -> SenderRole {
        match self {
            TranscriptDirection::User => SenderRole::User,
            TranscriptDirection::Remote => SenderRole::Contact,
        }
    }
}

/// One independently decodable audio chunk from the collaborator:
/// 16-bit little-endian PCM, mono, at [`OUTPUT_SAMPLE_RATE_HZ`].
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub data: Bytes,
}

/// Events the realtime collaborator delivers, in arrival order.
#[derive(Debug, Clone)]
pub enum LiveEvent {
    /// Session acknowledged open by the remote side.
    Opened,
    Audio(AudioChunk),
    Transcript {
        direction: TranscriptDirection,
        text: String,
    },
    /// One full exchange unit finished; accumulated transcripts flush.
    TurnComplete,
    /// Barge-in: the user spoke over playback.
    Interrupted,
    Closed,
    Fault(String),
}

/// Outbound capture frame: 16-bit little-endian PCM tagged with the rate it
/// was captured at.
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    pub sample_rate_hz: u32,
    pub data: Bytes,
}

/// Updates the session broadcasts for the UI to observe. The session never
/// calls into the UI directly.
#[derive(Debug, Clone, PartialEq)]
pub enum CallUpdate {
    Phase(CallPhase),
    /// Whether remote audio is currently in flight (scheduled, not finished).
    Speaking(bool),
}

/// Decoded mono PCM ready for the playback sink.
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    pub samples: Vec<f32>,
    pub sample_rate_hz: u32,
}

impl PcmBuffer {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate_hz as f64
    }
}

#[derive(Debug, Clone)]
pub struct CallConfig {
    pub capture_sample_rate_hz: u32,
    pub output_sample_rate_hz: u32,
    pub update_buffer: usize,
    pub command_buffer: usize,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            capture_sample_rate_hz: CAPTURE_SAMPLE_RATE_HZ,
            output_sample_rate_hz: OUTPUT_SAMPLE_RATE_HZ,
            update_buffer: 32,
            command_buffer: 8,
        }
    }
}
