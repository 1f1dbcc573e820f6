#[macro_use]
extern crate log;

use argh::FromArgs;
use env_logger::Env;
use std::io;
use std::path::PathBuf;

use vibmon::clock::{ManualClock, Monotonic};
use vibmon::source::{Replay, Synthetic, Tone};
use vibmon::spectrum::WindowFn;
use vibmon::telemetry::JsonLines;
use vibmon::{Analyzer, Clock, Config, SampleSource};

#[derive(FromArgs)]
/// Measure vibration peaks and publish them as JSON lines on stdout.
struct Vibmon {
    /// configuration file.
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// sampling frequency [Hz].
    #[argh(option, short = 'f')]
    frequency: Option<f64>,

    /// samples per window, a power of two.
    #[argh(option, short = 'n')]
    samples: Option<usize>,

    /// minimum time between publishes [ms].
    #[argh(option, short = 'i')]
    interval: Option<u64>,

    /// window function: rectangle, hamming, hann, blackman or flat-top.
    #[argh(option, short = 'w')]
    window: Option<WindowFn>,

    /// replay x,y,z readings [m/s^2] from a CSV file.
    #[argh(option, short = 'r')]
    replay: Option<PathBuf>,

    /// add a tone to the generated signal: axis:frequency:amplitude [Hz, g].
    #[argh(option, short = 't')]
    tone: Vec<Tone>,

    /// stop after this number of windows.
    #[argh(option)]
    cycles: Option<u64>,

    /// run on simulated time, as fast as possible.
    #[argh(switch, short = 's')]
    simulate: bool,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(Env::default().default_filter_or("warn,vibmon=info")).init();

    let args: Vibmon = argh::from_env();

    let mut config = match &args.config {
        Some(p) => Config::from_path(p)?,
        None => Config::default(),
    };

    if let Some(f) = args.frequency {
        config.frequency = f;
    }
    if let Some(n) = args.samples {
        config.samples = n;
    }
    if let Some(i) = args.interval {
        config.publish_interval = i;
    }
    if let Some(w) = args.window {
        config.window = w;
    }
    config.validate()?;

    if args.simulate {
        let clock = ManualClock::new();
        let mut source = open_source(&args, clock.clone())?;
        run(&config, &mut *source, clock, args.cycles)
    } else {
        let clock = Monotonic::new();
        let mut source = open_source(&args, clock)?;
        run(&config, &mut *source, clock, args.cycles)
    }
}

/// The generated signal follows `clock`, which must be the clock pacing the sampler.
fn open_source<C: Clock + 'static>(args: &Vibmon, clock: C) -> eyre::Result<Box<dyn SampleSource>> {
    Ok(match &args.replay {
        Some(p) => {
            if !args.tone.is_empty() {
                warn!("replaying from file, ignoring tones.");
            }
            Box::new(Replay::from_path(p)?)
        }
        None => Box::new(Synthetic::new(clock).with_tones(args.tone.iter().copied())),
    })
}

fn run<S: SampleSource, C: Clock>(
    config: &Config,
    source: S,
    clock: C,
    cycles: Option<u64>,
) -> eyre::Result<()> {
    let sink = JsonLines::new(io::stdout());
    let mut analyzer = Analyzer::new(config, source, sink, clock)?;

    match cycles {
        Some(n) => {
            let stats = analyzer.run_cycles(n);
            info!("done: {:?}", stats);
            Ok(())
        }
        None => analyzer.run(),
    }
}
