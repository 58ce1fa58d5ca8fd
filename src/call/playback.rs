//! Gapless playback scheduling.

use std::collections::HashSet;
use std::sync::Arc;

use crate::call::traits::{PlaybackId, PlaybackSink};
use crate::call::types::PcmBuffer;
use crate::telemetry::events::{record_playback_interrupted, record_playback_scheduled};

/// Schedules decoded buffers back-to-back on the output clock.
///
/// Each buffer starts at `max(sink.now(), cursor)` and the cursor advances by
/// the buffer's duration immediately, so buffers arriving promptly play with
/// no overlap and no gap, in arrival order. Interruption stops every in-flight
/// buffer and resets the cursor to the current clock, bounding residual
/// playback after a barge-in to zero.
pub struct PlaybackSequencer {
    sink: Arc<dyn PlaybackSink>,
    next_start: f64,
    scheduled: HashSet<PlaybackId>,
}

impl PlaybackSequencer {
    pub fn new(sink: Arc<dyn PlaybackSink>) -> Self {
        Self {
            sink,
            next_start: 0.0,
            scheduled: HashSet::new(),
        }
    }

    /// Schedules one buffer and returns its effective start time.
    pub fn schedule(&mut self, buffer: PcmBuffer) -> f64 {
        let duration = buffer.duration_secs();
        let start = self.sink.now().max(self.next_start);

        let id = self.sink.start(buffer, start);
        self.scheduled.insert(id);
        self.next_start = start + duration;

        record_playback_scheduled(start, duration, self.scheduled.len());
        start
    }

    /// Marks one buffer as finished playing.
    pub fn mark_finished(&mut self, id: PlaybackId) {
        self.scheduled.remove(&id);
    }

    /// Stops every scheduled-but-unfinished buffer and resets the cursor to
    /// the current clock. Returns how many buffers were stopped. Safe to call
    /// with nothing in flight.
    pub fn interrupt(&mut self) -> usize {
        let stopped = self.scheduled.len();
        for id in self.scheduled.drain() {
            self.sink.stop(id);
        }
        self.next_start = self.sink.now();

        if stopped > 0 {
            record_playback_interrupted(stopped);
        }
        stopped
    }

    pub fn is_idle(&self) -> bool {
        self.scheduled.is_empty()
    }
}
