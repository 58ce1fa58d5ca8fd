//! Per-direction transcript accumulation.

use crate::call::types::TranscriptDirection;
use crate::store::types::SenderRole;

/// Accumulates incremental transcript fragments for each direction until a
/// turn completes, the session is interrupted, or it closes. Flushing drains
/// both buffers so no transcribed speech is silently dropped.
#[derive(Debug, Default)]
pub struct TranscriptAccumulator {
    user: String,
    remote: String,
}

impl TranscriptAccumulator {
    pub fn push(&mut self, direction: TranscriptDirection, fragment: &str) {
        match direction {
            TranscriptDirection::User => self.user.push_str(fragment),
            TranscriptDirection::Remote => self.remote.push_str(fragment),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user.trim().is_empty() && self.remote.trim().is_empty()
    }

    /// Drains both buffers into at most two (role, text) entries, user side
    /// first. Whitespace-only buffers produce nothing.
    pub fn flush(&mut self) -> Vec<(SenderRole, String)> {
        let mut flushed = Vec::new();

        let user = std::mem::take(&mut self.user);
        let user = user.trim();
        if !user.is_empty() {
            flushed.push((TranscriptDirection::User.sender_role(), user.to_string()));
        }

        let remote = std::mem::take(&mut self.remote);
        let remote = remote.trim();
        if !remote.is_empty() {
            flushed.push((TranscriptDirection::Remote.sender_role(), remote.to_string()));
        }

        flushed
    }
}
