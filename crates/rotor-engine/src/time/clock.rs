/// Measures wall-clock time between frames.
///
/// Timestamps are host-provided monotonic milliseconds (`requestAnimationFrame`
/// style), so the clock itself never reads the system time and can be driven
/// deterministically in tests.
///
/// The first advance has no baseline and reports zero elapsed time. A timestamp
/// of `0.0` is a valid first reading.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    last_timestamp_ms: Option<f64>,
    frame_index: u64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `now_ms` and returns the milliseconds since the previous advance.
    ///
    /// The delta is passed through unclamped; host timestamps are monotonic.
    pub fn advance(&mut self, now_ms: f64) -> f64 {
        let elapsed = match self.last_timestamp_ms {
            Some(last) => now_ms - last,
            None => 0.0,
        };

        self.last_timestamp_ms = Some(now_ms);
        self.frame_index = self.frame_index.wrapping_add(1);
        elapsed
    }

    /// Forgets the baseline; the next advance reports zero again.
    ///
    /// Useful after the loop was paused so the gap does not show up as one huge step.
    pub fn reset(&mut self) {
        self.last_timestamp_ms = None;
    }

    /// Number of advances so far.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    #[inline]
    pub fn last_timestamp_ms(&self) -> Option<f64> {
        self.last_timestamp_ms
    }
}
