//! The acquisition, analysis and publishing cycle.

use crate::clock::Clock;
use crate::config::Config;
use crate::publish::{PublishGate, PublishOutcome, Report};
use crate::sampler::{SampleWindow, Sampler, SamplerStats};
use crate::source::SampleSource;
use crate::spectrum::{Peak, PeakExtractor};
use crate::telemetry::TelemetrySink;
use crate::Error;

/// Counters since the analyzer was started.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub cycles: u64,
    pub published: u64,
    pub failed: u64,
    pub skipped: u64,

    /// Total samples taken after their deadline.
    pub overruns: u64,
}

/// Everything produced by one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    pub peaks: [Peak; 3],
    pub report: Report,
    pub outcome: PublishOutcome,
    pub sampler: SamplerStats,
}

/// One measurement session. Owns the collaborators, the pre-allocated sample window and the
/// publish state, so that nothing is shared between cycles except through this struct.
pub struct Analyzer<S: SampleSource, T: TelemetrySink, C: Clock> {
    source: S,
    sink: T,
    clock: C,

    sampler: Sampler,
    extractor: PeakExtractor,
    window: SampleWindow,
    gate: PublishGate,

    stats: Stats,
}

impl<S: SampleSource, T: TelemetrySink, C: Clock> Analyzer<S, T, C> {
    pub fn new(config: &Config, source: S, sink: T, clock: C) -> Result<Analyzer<S, T, C>, Error> {
        config.validate()?;

        let analyzer = Analyzer {
            source,
            sink,
            clock,
            sampler: Sampler::new(config.period()),
            extractor: PeakExtractor::from_config(config),
            window: SampleWindow::new(config.samples),
            gate: PublishGate::new(config.min_publish_interval()),
            stats: Stats::default(),
        };

        info!(
            "analyzer: {} samples every {:?} ({:?} per window), {} window, publish interval: {:?}",
            analyzer.window.len(),
            analyzer.sampler.period(),
            config.window_duration(),
            analyzer.extractor.window(),
            analyzer.gate.interval()
        );

        Ok(analyzer)
    }

    /// Acquire one window, find the peak of each axis and offer the report for publishing.
    pub fn cycle(&mut self) -> Cycle {
        let sampler = self
            .sampler
            .acquire(&mut self.source, &mut self.clock, &mut self.window);

        let mut peaks = [Peak::default(); 3];
        for (p, axis) in peaks.iter_mut().zip(self.window.axes_mut()) {
            *p = self.extractor.peak(axis);
        }

        if log_enabled!(log::Level::Debug) {
            for (name, p) in ["x", "y", "z"].iter().zip(&peaks) {
                match p.bin {
                    Some(k) => debug!(
                        "{}: peak {:.4} g at {:.1} Hz (bin {})",
                        name,
                        p.magnitude,
                        self.extractor.bin_frequency(k),
                        k
                    ),
                    None => debug!("{}: no peak", name),
                }
            }
        }

        let report = Report::aggregate(peaks, &self.window);
        let outcome = self.gate.offer(&report, &mut self.sink, &self.clock);

        self.stats.cycles += 1;
        self.stats.overruns += sampler.overruns as u64;
        match outcome {
            PublishOutcome::Published => self.stats.published += 1,
            PublishOutcome::Failed(_) => self.stats.failed += 1,
            PublishOutcome::Skipped { .. } => self.stats.skipped += 1,
        }

        Cycle {
            peaks,
            report,
            outcome,
            sampler,
        }
    }

    /// Run `n` cycles.
    pub fn run_cycles(&mut self, n: u64) -> Stats {
        for _ in 0..n {
            self.cycle();
        }

        self.stats
    }

    /// Run until the process is terminated.
    pub fn run(&mut self) -> ! {
        loop {
            self.cycle();

            if self.stats.cycles % 1000 == 0 {
                debug!("stats: {:?}", self.stats);
            }
        }
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn gate(&self) -> &PublishGate {
        &self.gate
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sink(&self) -> &T {
        &self.sink
    }

    pub fn into_parts(self) -> (S, T, C) {
        (self.source, self.sink, self.clock)
    }
}
