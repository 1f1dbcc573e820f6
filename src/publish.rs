//! Aggregate one window into a report and publish it at a limited rate.

use serde::Serialize;
use std::time::Duration;

use crate::clock::Clock;
use crate::sampler::SampleWindow;
use crate::spectrum::Peak;
use crate::telemetry::TelemetrySink;

/// Result of one cycle, all values in g. Serialized with the field names of the telemetry
/// channel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct Report {
    #[serde(rename = "field1")]
    pub peak_x: f64,

    #[serde(rename = "field2")]
    pub peak_y: f64,

    #[serde(rename = "field3")]
    pub peak_z: f64,

    #[serde(rename = "field4")]
    pub mean_magnitude: f64,
}

impl Report {
    /// Combine the per-axis peaks with the mean magnitude of the window.
    pub fn aggregate([x, y, z]: [Peak; 3], window: &SampleWindow) -> Report {
        Report {
            peak_x: x.magnitude,
            peak_y: y.magnitude,
            peak_z: z.magnitude,
            mean_magnitude: window.mean_magnitude(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Published,

    /// The sink reported an error, the report is dropped.
    Failed(String),

    /// Too soon after the last attempt, the report is dropped.
    Skipped { remaining: Duration },
}

/// Rate limit for publishing. Attempts are spaced by at least `interval`, measured from
/// the end of the previous attempt whether it succeeded or not. Missed reports are not
/// queued.
#[derive(Debug, Clone)]
pub struct PublishGate {
    interval: Duration,
    last: Option<Duration>,
}

impl PublishGate {
    pub fn new(interval: Duration) -> PublishGate {
        PublishGate {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Clock time at the end of the last attempt.
    pub fn last_attempt(&self) -> Option<Duration> {
        self.last
    }

    /// Time left until an attempt is allowed, zero if it is allowed now.
    pub fn remaining(&self, now: Duration) -> Duration {
        match self.last {
            Some(last) => (last + self.interval).saturating_sub(now),
            None => Duration::ZERO,
        }
    }

    /// Publish `report` to `sink` if the interval has passed since the last attempt.
    pub fn offer<T: TelemetrySink, C: Clock>(
        &mut self,
        report: &Report,
        sink: &mut T,
        clock: &C,
    ) -> PublishOutcome {
        let remaining = self.remaining(clock.now());

        if remaining > Duration::ZERO {
            trace!("skipping publish, next in: {:?}", remaining);
            return PublishOutcome::Skipped { remaining };
        }

        debug!("publishing: {:?}", report);
        let r = sink.publish(report);

        // Advance even on failure, a rate limited endpoint should not be retried early.
        self.last = Some(clock.now());

        match r {
            Ok(()) => {
                info!(
                    "published: peaks: [{:.4}, {:.4}, {:.4}] g, mean: {:.4} g",
                    report.peak_x, report.peak_y, report.peak_z, report.mean_magnitude
                );
                PublishOutcome::Published
            }
            Err(e) => {
                warn!("failed to publish report: {}", e);
                PublishOutcome::Failed(e.to_string())
            }
        }
    }
}
