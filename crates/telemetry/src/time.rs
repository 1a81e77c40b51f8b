use crate::sinks::ConsensusMetricsSink;
use std::time::Instant;

/// RAII timer recording elapsed seconds into a [`ConsensusMetricsSink`] on drop.
pub struct Timer<'a> {
    sink: &'a dyn ConsensusMetricsSink,
    start: Instant,
}

impl<'a> Timer<'a> {
    /// Starts timing against `sink`.
    pub fn new(sink: &'a dyn ConsensusMetricsSink) -> Self {
        Self {
            sink,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        self.sink
            .observe_verify_duration(self.start.elapsed().as_secs_f64());
    }
}
