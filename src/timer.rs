use std::time::{Duration, Instant};

/// Monotonic batch clock. Callers pass `now` so the clock can be driven from
/// the event loop and from tests alike.
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    started_at: Option<Instant>,
    frozen: Option<Duration>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from zero, discarding any previous reading.
    pub fn restart(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.frozen = None;
    }

    /// Freezes the reading; later calls keep the first frozen value.
    pub fn pause(&mut self, now: Instant) -> Duration {
        if let Some(frozen) = self.frozen {
            return frozen;
        }
        let elapsed = self.running_elapsed(now);
        self.frozen = Some(elapsed);
        elapsed
    }

    pub fn stop(&mut self) {
        self.started_at = None;
        self.frozen = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.frozen.is_none()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.frozen.unwrap_or_else(|| self.running_elapsed(now))
    }

    fn running_elapsed(&self, now: Instant) -> Duration {
        self.started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default()
    }
}
