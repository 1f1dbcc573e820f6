//! Fixed-rate acquisition of one window of triaxial samples.

use num_complex::Complex64;
use std::time::Duration;

use crate::clock::Clock;
use crate::source::SampleSource;

/// Per-axis sample buffers for one window. Allocated once and overwritten in place every
/// cycle. Samples are stored in g with a zero imaginary part, ready for the transform.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    pub x: Vec<Complex64>,
    pub y: Vec<Complex64>,
    pub z: Vec<Complex64>,

    /// Sum of the vector magnitude of every sample in the window [g].
    pub magnitude_sum: f64,
}

impl SampleWindow {
    pub fn new(n: usize) -> SampleWindow {
        SampleWindow {
            x: vec![Complex64::default(); n],
            y: vec![Complex64::default(); n],
            z: vec![Complex64::default(); n],
            magnitude_sum: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Store a sample [g] at position `i`.
    pub fn put(&mut self, i: usize, [x, y, z]: [f64; 3]) {
        self.x[i] = Complex64::new(x, 0.0);
        self.y[i] = Complex64::new(y, 0.0);
        self.z[i] = Complex64::new(z, 0.0);

        self.magnitude_sum += (x * x + y * y + z * z).sqrt();
    }

    /// Mean vector magnitude over the window [g].
    pub fn mean_magnitude(&self) -> f64 {
        self.magnitude_sum / self.len() as f64
    }

    pub fn axes_mut(&mut self) -> [&mut [Complex64]; 3] {
        [&mut self.x[..], &mut self.y[..], &mut self.z[..]]
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SamplerStats {
    /// Samples that were due before the previous read returned.
    pub overruns: usize,

    /// Time from the first read until the last read returned.
    pub elapsed: Duration,
}

/// Acquires samples at a fixed period. Deadlines accumulate from the first sample
/// (`deadline += period`), so jitter in the reads does not add up as drift. A read that
/// runs past the next deadline is not recovered: the next sample is taken immediately and
/// the window takes longer than `n * period`.
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    period: Duration,
}

impl Sampler {
    pub fn new(period: Duration) -> Sampler {
        Sampler { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Fill `window` with readings from `source`.
    pub fn acquire<S: SampleSource, C: Clock>(
        &self,
        source: &mut S,
        clock: &mut C,
        window: &mut SampleWindow,
    ) -> SamplerStats {
        let mut stats = SamplerStats::default();

        window.magnitude_sum = 0.0;

        let start = clock.now();
        let mut deadline = start;

        for i in 0..window.len() {
            if i > 0 {
                let now = clock.now();
                if now > deadline {
                    trace!(
                        "sample {} overran its slot by {:?}",
                        i,
                        now - deadline
                    );
                    stats.overruns += 1;
                }

                clock.wait_until(deadline);
            }

            let a = source.read();
            window.put(i, a.as_g());

            deadline += self.period;
        }

        stats.elapsed = clock.now() - start;

        if stats.overruns > 0 {
            debug!(
                "window of {} samples took {:?} with {} overruns (nominal: {:?})",
                window.len(),
                stats.elapsed,
                stats.overruns,
                u32::try_from(window.len())
                    .map_or(Duration::MAX, |n| self.period.saturating_mul(n))
            );
        }

        stats
    }
}
