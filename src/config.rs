use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::spectrum::WindowFn;
use crate::Error;

/// Run-time configuration, read once at startup.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Sampling frequency [Hz].
    pub frequency: f64,

    /// Samples per window, must be a power of two and at least 4.
    pub samples: usize,

    /// Minimum time between publish attempts [ms].
    pub publish_interval: u64,

    /// Weighting applied to each window before the transform.
    pub window: WindowFn,

    /// Subtract the window mean before weighting so that a static offset (gravity) does not
    /// leak out of the DC bin.
    pub remove_dc: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            frequency: 800.0,
            samples: 64,
            publish_interval: 20_000,
            window: WindowFn::Hann,
            remove_dc: true,
        }
    }
}

impl Config {
    pub fn from_path<P: AsRef<Path>>(p: P) -> Result<Config, Error> {
        let p = p.as_ref();
        debug!("reading config from: {:?}", p);

        let f = fs::read_to_string(p)?;
        Config::from_toml(&f)
    }

    pub fn from_toml(s: &str) -> Result<Config, Error> {
        let c: Config = toml::from_str(s)?;
        c.validate()?;

        Ok(c)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.samples < 4 || !self.samples.is_power_of_two() {
            return Err(Error::InvalidSamples(self.samples));
        }

        if !self.frequency.is_finite() || self.frequency <= 0.0 || self.period().is_zero() {
            return Err(Error::InvalidFrequency(self.frequency));
        }

        Ok(())
    }

    /// Time between two consecutive samples.
    pub fn period(&self) -> Duration {
        Duration::from_nanos((1e9 / self.frequency).round() as u64)
    }

    pub fn min_publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval)
    }

    /// Time covered by one window: `samples` periods. Acquisition returns right after the
    /// last read, one period short of this, and the next window starts immediately.
    pub fn window_duration(&self) -> Duration {
        u32::try_from(self.samples).map_or(Duration::MAX, |n| self.period().saturating_mul(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        c.validate().unwrap();

        assert_eq!(c.frequency, 800.0);
        assert_eq!(c.samples, 64);
        assert_eq!(c.min_publish_interval(), Duration::from_secs(20));
        assert_eq!(c.window, WindowFn::Hann);
        assert_eq!(c.period(), Duration::from_micros(1250));
        assert_eq!(c.window_duration(), Duration::from_millis(80));
    }

    #[test]
    fn load_default_conf() {
        let c = Config::from_path("vibmon.toml").unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn parse_partial_toml() {
        let c = Config::from_toml(
            r#"
            frequency = 400.0
            window = "flat-top"
            publish-interval = 15000
            "#,
        )
        .unwrap();

        assert_eq!(c.frequency, 400.0);
        assert_eq!(c.samples, 64);
        assert_eq!(c.window, WindowFn::FlatTop);
        assert_eq!(c.publish_interval, 15_000);
        assert!(c.remove_dc);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn unknown_key() {
        assert!(matches!(
            Config::from_toml("sample-rate = 100.0"),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn reject_bad_samples() {
        for n in [0, 1, 2, 3, 5, 48, 100] {
            let c = Config {
                samples: n,
                ..Config::default()
            };
            assert!(matches!(c.validate(), Err(Error::InvalidSamples(m)) if m == n));
        }

        for n in [4, 8, 64, 4096] {
            let c = Config {
                samples: n,
                ..Config::default()
            };
            c.validate().unwrap();
        }
    }

    #[test]
    fn reject_bad_frequency() {
        // the last one rounds to a zero period.
        for f in [0.0, -1.0, f64::NAN, f64::INFINITY, 3e9] {
            let c = Config {
                frequency: f,
                ..Config::default()
            };
            assert!(matches!(c.validate(), Err(Error::InvalidFrequency(_))));
        }
    }

    #[test]
    fn highest_frequency() {
        let c = Config {
            frequency: 1e9,
            ..Config::default()
        };
        c.validate().unwrap();
        assert_eq!(c.period(), Duration::from_nanos(1));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Config::from_path("does-not-exist.toml"),
            Err(Error::Io(_))
        ));
    }
}
