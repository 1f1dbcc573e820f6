//! Measure vibration with a triaxial accelerometer: sample a fixed-length window at a fixed
//! rate, find the dominant spectral peak on each axis and publish the peaks together with
//! the mean vibration magnitude at a limited rate.

#[macro_use]
extern crate log;

pub mod analyzer;
pub mod clock;
pub mod config;
pub mod publish;
pub mod sampler;
pub mod source;
pub mod spectrum;
pub mod telemetry;

pub use analyzer::{Analyzer, Stats};
pub use clock::{Clock, Monotonic};
pub use config::Config;
pub use publish::{PublishGate, PublishOutcome, Report};
pub use sampler::{SampleWindow, Sampler, SamplerStats};
pub use source::{Acceleration, SampleSource};
pub use spectrum::{Peak, PeakExtractor, WindowFn};
pub use telemetry::TelemetrySink;

/// Standard gravity [m/s^2].
pub const SENSORS_GRAVITY_STANDARD: f64 = 9.80665;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("number of samples must be a power of two and at least 4, got {0}")]
    InvalidSamples(usize),

    #[error("sampling frequency must be positive and finite, got {0} Hz")]
    InvalidFrequency(f64),

    #[error("invalid tone: {0}")]
    InvalidTone(String),

    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("could not read replay file: {0}")]
    Csv(#[from] csv::Error),

    #[error("replay file contains no samples")]
    EmptyReplay,
}
