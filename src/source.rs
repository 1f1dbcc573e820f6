//! Sources of triaxial acceleration readings.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::io;
use std::path::Path;
use std::str::FromStr;

use crate::clock::Clock;
use crate::{Error, SENSORS_GRAVITY_STANDARD};

/// One triaxial reading [m/s^2].
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Acceleration {
    pub const fn new(x: f64, y: f64, z: f64) -> Acceleration {
        Acceleration { x, y, z }
    }

    /// Reading given in g.
    pub fn from_g(x: f64, y: f64, z: f64) -> Acceleration {
        Acceleration {
            x: x * SENSORS_GRAVITY_STANDARD,
            y: y * SENSORS_GRAVITY_STANDARD,
            z: z * SENSORS_GRAVITY_STANDARD,
        }
    }

    pub fn as_g(&self) -> [f64; 3] {
        [
            self.x / SENSORS_GRAVITY_STANDARD,
            self.y / SENSORS_GRAVITY_STANDARD,
            self.z / SENSORS_GRAVITY_STANDARD,
        ]
    }
}

/// Supplies one reading on demand. Must return promptly compared to the sampling period.
pub trait SampleSource {
    fn read(&mut self) -> Acceleration;
}

impl<S: SampleSource + ?Sized> SampleSource for &mut S {
    fn read(&mut self) -> Acceleration {
        (**self).read()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Axis, Error> {
        match s {
            "x" | "X" => Ok(Axis::X),
            "y" | "Y" => Ok(Axis::Y),
            "z" | "Z" => Ok(Axis::Z),
            _ => Err(Error::InvalidTone(format!("unknown axis: {s}"))),
        }
    }
}

/// A sinusoidal component on one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub axis: Axis,
    pub frequency: f64, // [Hz]
    pub amplitude: f64, // [g]
}

/// Parses `axis:frequency:amplitude`, e.g. `z:50:2` for a 2 g, 50 Hz tone on the z-axis.
impl FromStr for Tone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Tone, Error> {
        let mut parts = s.split(':');

        let (axis, frequency, amplitude) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(a), Some(f), Some(m), None) => (a, f, m),
                _ => {
                    return Err(Error::InvalidTone(format!(
                        "expected axis:frequency:amplitude, got: {s}"
                    )))
                }
            };

        let axis = axis.parse()?;
        let frequency = frequency
            .parse::<f64>()
            .map_err(|e| Error::InvalidTone(format!("frequency {frequency}: {e}")))?;
        let amplitude = amplitude
            .parse::<f64>()
            .map_err(|e| Error::InvalidTone(format!("amplitude {amplitude}: {e}")))?;

        Ok(Tone {
            axis,
            frequency,
            amplitude,
        })
    }
}

/// Deterministic signal generator: a static offset plus a sum of tones, evaluated at the
/// clock time of each read. Jitter, overruns and gaps between windows therefore show up in
/// the signal the same way they would for a real sensor.
#[derive(Debug, Clone)]
pub struct Synthetic<C: Clock> {
    clock: C,
    offset: Acceleration,
    tones: Vec<Tone>,
}

impl<C: Clock> Synthetic<C> {
    /// A sensor at rest: 1 g on the z-axis. `clock` should share its time with the clock
    /// pacing the sampler.
    pub fn new(clock: C) -> Synthetic<C> {
        Synthetic {
            clock,
            offset: Acceleration::from_g(0.0, 0.0, 1.0),
            tones: Vec::new(),
        }
    }

    pub fn with_offset(mut self, offset: Acceleration) -> Synthetic<C> {
        self.offset = offset;
        self
    }

    pub fn with_tone(mut self, tone: Tone) -> Synthetic<C> {
        self.tones.push(tone);
        self
    }

    pub fn with_tones(mut self, tones: impl IntoIterator<Item = Tone>) -> Synthetic<C> {
        self.tones.extend(tones);
        self
    }
}

impl<C: Clock> SampleSource for Synthetic<C> {
    fn read(&mut self) -> Acceleration {
        let t = self.clock.now().as_secs_f64();

        let mut a = self.offset;

        for tone in &self.tones {
            let v =
                tone.amplitude * SENSORS_GRAVITY_STANDARD * (2. * PI * tone.frequency * t).sin();

            match tone.axis {
                Axis::X => a.x += v,
                Axis::Y => a.y += v,
                Axis::Z => a.z += v,
            }
        }

        a
    }
}

/// Replays recorded readings, starting over at the end.
#[derive(Debug, Clone)]
pub struct Replay {
    samples: Vec<Acceleration>,
    pos: usize,
}

impl Replay {
    /// Load `x,y,z` rows [m/s^2] from a CSV file with a header. Lines starting with `#` are
    /// ignored.
    pub fn from_path<P: AsRef<Path>>(p: P) -> Result<Replay, Error> {
        let p = p.as_ref();
        info!("loading replay from: {:?}", p);

        let f = std::fs::File::open(p)?;
        Replay::from_reader(f)
    }

    pub fn from_reader<R: io::Read>(r: R) -> Result<Replay, Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(r);

        let samples = rdr
            .deserialize::<Acceleration>()
            .collect::<Result<Vec<_>, _>>()?;

        if samples.is_empty() {
            return Err(Error::EmptyReplay);
        }

        debug!("loaded {} samples for replay.", samples.len());

        Ok(Replay { samples, pos: 0 })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SampleSource for Replay {
    fn read(&mut self) -> Acceleration {
        let a = self.samples[self.pos];
        self.pos = (self.pos + 1) % self.samples.len();
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use approx::assert_abs_diff_eq;
    use std::time::Duration;

    #[test]
    fn synthetic_at_rest() {
        let clock = ManualClock::new();
        let mut s = Synthetic::new(clock.clone());

        for _ in 0..10 {
            let a = s.read();
            assert_eq!(a.as_g(), [0.0, 0.0, 1.0]);
            clock.advance(Duration::from_micros(1250));
        }
    }

    #[test]
    fn synthetic_tone() {
        let clock = ManualClock::new();
        let mut s = Synthetic::new(clock.clone())
            .with_offset(Acceleration::default())
            .with_tone("x:200:2".parse().unwrap());

        // a quarter period per sample at 800 Hz
        let expected = [0.0, 2.0, 0.0, -2.0, 0.0];

        for e in expected {
            let [x, y, z] = s.read().as_g();
            assert_abs_diff_eq!(x, e, epsilon = 1e-9);
            assert_eq!(y, 0.0);
            assert_eq!(z, 0.0);
            clock.advance(Duration::from_micros(1250));
        }
    }

    #[test]
    fn synthetic_follows_clock() {
        let clock = ManualClock::new();
        let mut s = Synthetic::new(clock.clone())
            .with_offset(Acceleration::default())
            .with_tone("x:200:2".parse().unwrap());

        clock.set(Duration::from_micros(1250));
        let [x, _, _] = s.read().as_g();
        assert_abs_diff_eq!(x, 2.0, epsilon = 1e-9);

        // a late read sees the signal at the time it was taken, not at its slot
        let t = Duration::from_micros(1_250_312);
        clock.set(t);
        let [x, _, _] = s.read().as_g();
        let e = 2.0 * (2. * PI * 200. * t.as_secs_f64()).sin();
        assert_abs_diff_eq!(x, e, epsilon = 1e-9);
        assert!((x - 2.0).abs() > 1.0);

        // reading twice without the clock moving gives the same value
        let [x2, _, _] = s.read().as_g();
        assert_eq!(x, x2);
    }

    #[test]
    fn parse_tone() {
        let t: Tone = "Y:12.5:0.3".parse().unwrap();
        assert_eq!(
            t,
            Tone {
                axis: Axis::Y,
                frequency: 12.5,
                amplitude: 0.3
            }
        );

        assert!("w:1:1".parse::<Tone>().is_err());
        assert!("x:1".parse::<Tone>().is_err());
        assert!("x:1:1:1".parse::<Tone>().is_err());
        assert!("x:fast:1".parse::<Tone>().is_err());
    }

    #[test]
    fn replay_loops() {
        let data = "x,y,z\n# at rest\n0.0, 0.0, 9.80665\n1.0,2.0,3.0\n";
        let mut r = Replay::from_reader(data.as_bytes()).unwrap();
        assert_eq!(r.len(), 2);

        assert_eq!(r.read(), Acceleration::new(0.0, 0.0, 9.80665));
        assert_eq!(r.read(), Acceleration::new(1.0, 2.0, 3.0));
        assert_eq!(r.read(), Acceleration::new(0.0, 0.0, 9.80665));
    }

    #[test]
    fn replay_empty() {
        assert!(matches!(
            Replay::from_reader("x,y,z\n".as_bytes()),
            Err(Error::EmptyReplay)
        ));
    }

    #[test]
    fn replay_bad_row() {
        assert!(matches!(
            Replay::from_reader("x,y,z\n1.0,a,2.0\n".as_bytes()),
            Err(Error::Csv(_))
        ));
    }
}
