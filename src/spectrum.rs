//! Dominant spectral peak of one axis.
//!
//! Each axis buffer is weighted by a window function, transformed in place and converted to
//! an amplitude spectrum in place. The amplitude is scaled by `2 / sum(w)` so that a
//! sinusoid centered on a bin reports its amplitude in the input unit (g).

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::Config;

/// Window functions, all in the periodic (DFT-even) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowFn {
    Rectangle,
    Hamming,
    Hann,
    Blackman,
    FlatTop,
}

impl WindowFn {
    /// Cosine-sum coefficients: `w[n] = sum_i (-1)^i a_i cos(2 pi i n / N)`.
    fn coefficients(&self) -> &'static [f64] {
        use WindowFn::*;

        match self {
            Rectangle => &[1.0],
            Hamming => &[0.54, 0.46],
            Hann => &[0.5, 0.5],
            Blackman => &[0.42, 0.5, 0.08],
            FlatTop => &[
                0.21557895,
                0.41663158,
                0.277263158,
                0.083578947,
                0.006947368,
            ],
        }
    }

    /// Weight of sample `n` in a window of length `len`.
    pub fn weight(&self, n: usize, len: usize) -> f64 {
        let x = 2. * PI * n as f64 / len as f64;

        self.coefficients()
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let s = if i % 2 == 0 { 1.0 } else { -1.0 };
                s * a * (i as f64 * x).cos()
            })
            .sum()
    }

    pub fn weights(&self, len: usize) -> Vec<f64> {
        (0..len).map(|n| self.weight(n, len)).collect()
    }
}

impl FromStr for WindowFn {
    type Err = String;

    fn from_str(s: &str) -> Result<WindowFn, String> {
        use WindowFn::*;

        match s.to_ascii_lowercase().as_str() {
            "rectangle" | "rect" | "none" => Ok(Rectangle),
            "hamming" => Ok(Hamming),
            "hann" | "hanning" => Ok(Hann),
            "blackman" => Ok(Blackman),
            "flat-top" | "flattop" => Ok(FlatTop),
            _ => Err(format!("unknown window function: {s}")),
        }
    }
}

impl fmt::Display for WindowFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use WindowFn::*;

        let s = match self {
            Rectangle => "rectangle",
            Hamming => "hamming",
            Hann => "hann",
            Blackman => "blackman",
            FlatTop => "flat-top",
        };

        f.write_str(s)
    }
}

/// Dominant non-DC peak of an amplitude spectrum.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Bin of the peak, `None` if no bin in `1..N/2` was positive.
    pub bin: Option<usize>,

    /// Amplitude [g], never negative.
    pub magnitude: f64,
}

/// Scan bins `1..N/2` of a magnitude spectrum (held in the real part) for the largest value.
/// DC and the mirrored half are skipped. Non-positive (or NaN) bins never win, so a
/// degenerate spectrum gives a zero peak.
pub fn dominant_peak(spectrum: &[Complex64]) -> Peak {
    spectrum
        .iter()
        .enumerate()
        .take(spectrum.len() / 2)
        .skip(1)
        .fold(Peak::default(), |peak, (k, c)| {
            if c.re > peak.magnitude {
                Peak {
                    bin: Some(k),
                    magnitude: c.re,
                }
            } else {
                peak
            }
        })
}

/// Windowing, transform and peak search for buffers of one fixed length. The plan, scratch
/// space and window weights are computed once.
pub struct PeakExtractor {
    fft: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
    window: WindowFn,
    weights: Vec<f64>,
    scale: f64,
    remove_dc: bool,
    sample_rate: f64,
}

impl PeakExtractor {
    pub fn new(len: usize, window: WindowFn, sample_rate: f64, remove_dc: bool) -> PeakExtractor {
        debug_assert!(len >= 4 && len.is_power_of_two());

        let fft = FftPlanner::<f64>::new().plan_fft_forward(len);
        let scratch = vec![Complex64::default(); fft.get_inplace_scratch_len()];

        let weights = window.weights(len);
        let scale = 2. / weights.iter().sum::<f64>();

        debug!(
            "spectrum: {} bins, {} window, resolution: {:.3} Hz",
            len / 2,
            window,
            sample_rate / len as f64
        );

        PeakExtractor {
            fft,
            scratch,
            window,
            weights,
            scale,
            remove_dc,
            sample_rate,
        }
    }

    pub fn from_config(c: &Config) -> PeakExtractor {
        PeakExtractor::new(c.samples, c.window, c.frequency, c.remove_dc)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn window(&self) -> WindowFn {
        self.window
    }

    /// Center frequency of `bin` [Hz].
    pub fn bin_frequency(&self, bin: usize) -> f64 {
        bin as f64 * self.sample_rate / self.len() as f64
    }

    /// Weight the real part of `buf` in place, optionally removing its mean first.
    pub fn apply_window(&self, buf: &mut [Complex64]) {
        let mean = if self.remove_dc {
            buf.iter().map(|c| c.re).sum::<f64>() / buf.len() as f64
        } else {
            0.0
        };

        for (c, w) in buf.iter_mut().zip(&self.weights) {
            c.re = (c.re - mean) * w;
        }
    }

    /// Forward transform in place.
    pub fn transform(&mut self, buf: &mut [Complex64]) {
        self.fft.process_with_scratch(buf, &mut self.scratch);
    }

    /// Replace each bin with its scaled amplitude in the real part, zeroing the imaginary part.
    pub fn to_magnitude(&self, buf: &mut [Complex64]) {
        for c in buf.iter_mut() {
            *c = Complex64::new(c.norm() * self.scale, 0.0);
        }
    }

    /// Dominant peak of one axis. `buf` holds the samples on entry and the amplitude spectrum
    /// on return.
    pub fn peak(&mut self, buf: &mut [Complex64]) -> Peak {
        assert_eq!(buf.len(), self.len(), "buffer does not match transform length");

        self.apply_window(buf);
        self.transform(buf);
        self.to_magnitude(buf);

        let peak = dominant_peak(buf);

        if peak.bin.is_none() {
            trace!("degenerate spectrum, no positive bins.");
        }

        peak
    }
}
