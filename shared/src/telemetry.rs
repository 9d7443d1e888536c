use std::time::{Duration, Instant};

/// Wall-clock stopwatch used to report model latency.
pub struct Telemetry {
    start: Instant,
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a latency the way the lab reports it, e.g. `1.27s`.
pub fn format_latency(latency: Duration) -> String {
    format!("{:.2}s", latency.as_secs_f64())
}
