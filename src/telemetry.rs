//! Delivery of cycle reports to a remote endpoint.

use std::fmt::Display;
use std::io::{self, Write};

use crate::publish::Report;

/// Delivers one report. The transport is up to the implementation; a returned error is
/// reported by the caller and otherwise ignored.
pub trait TelemetrySink {
    type Error: Display;

    fn publish(&mut self, report: &Report) -> Result<(), Self::Error>;
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for &mut T {
    type Error = T::Error;

    fn publish(&mut self, report: &Report) -> Result<(), Self::Error> {
        (**self).publish(report)
    }
}

/// Writes each report as one line of JSON, e.g:
///
/// ```json
/// {"field1":0.01,"field2":0.02,"field3":1.98,"field4":1.0}
/// ```
pub struct JsonLines<W: Write> {
    w: W,
}

impl<W: Write> JsonLines<W> {
    pub fn new(w: W) -> JsonLines<W> {
        JsonLines { w }
    }

    pub fn into_inner(self) -> W {
        self.w
    }
}

impl<W: Write> TelemetrySink for JsonLines<W> {
    type Error = io::Error;

    fn publish(&mut self, report: &Report) -> Result<(), io::Error> {
        serde_json::to_writer(&mut self.w, report)?;
        self.w.write_all(b"\n")?;
        self.w.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn json_lines() {
        let mut s = JsonLines::new(Vec::new());

        let r = Report {
            peak_x: 0.5,
            peak_y: 0.0,
            peak_z: 2.0,
            mean_magnitude: 1.0,
        };

        s.publish(&r).unwrap();
        s.publish(&r).unwrap();

        let out = String::from_utf8(s.into_inner()).unwrap();
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);

        let v: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(v["field1"], 0.5);
        assert_eq!(v["field2"], 0.0);
        assert_eq!(v["field3"], 2.0);
        assert_eq!(v["field4"], 1.0);
    }

    #[test]
    fn write_error_is_publish_error() {
        let mut s = JsonLines::new(Broken);
        assert!(s.publish(&Report::default()).is_err());
    }
}
