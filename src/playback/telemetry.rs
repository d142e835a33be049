use std::collections::VecDeque;

/// One per-frame render measurement.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySample {
    /// Frame counter at the time of the render.
    pub frame: f64,
    /// Measured wall-clock render duration in seconds.
    pub duration_secs: f64,
}

/// Fixed-capacity ring of recent render durations.
///
/// Single writer (the draw loop), single reader (whoever drains it). Reading
/// is destructive, so no synchronization is needed beyond message passing:
/// every sample is observed at most once.
#[derive(Clone, Debug)]
pub struct TelemetryRing {
    samples: VecDeque<TelemetrySample>,
    capacity: usize,
    batch: u64,
}

impl TelemetryRing {
    /// Create a ring holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            batch: 0,
        }
    }

    /// Number of samples currently buffered.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the ring holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append one sample, overwriting the oldest when full.
    pub fn push(&mut self, sample: TelemetrySample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Drain all buffered samples and advance the batch identifier.
    pub fn drain(&mut self) -> (u64, Vec<TelemetrySample>) {
        self.batch += 1;
        (self.batch, self.samples.drain(..).collect())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/telemetry.rs"]
mod tests;
