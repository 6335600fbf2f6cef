//! Host-side replay harness for the brightness controller.
//!
//! Compiles `src/brightness/` directly (which also makes its inline test
//! suites runnable with plain `cargo test` in this directory) and replays
//! a trace of sensor readings through the controller with instant delays,
//! printing every actuation the fader emits.

use std::{
    cell::Cell,
    env,
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
    process,
    rc::Rc,
};

#[path = "../../../src/brightness/mod.rs"]
mod brightness;

use brightness::config::AlsConfig;
use brightness::{Backlight, BrightnessController, LightSensor};
use embassy_futures::block_on;
use embedded_hal_async::delay::DelayNs;

/// Replays trace readings; once exhausted it repeats the last reading so
/// a burst confirmation started near the end of the trace can finish.
struct TraceSensor {
    readings: Vec<Result<i32, ReadFailed>>,
    consumed: Rc<Cell<usize>>,
}

#[derive(Clone, Copy, Debug)]
struct ReadFailed;

impl LightSensor for TraceSensor {
    type Error = ReadFailed;

    async fn read_intensity(&mut self) -> Result<i32, ReadFailed> {
        let index = self.consumed.get().min(self.readings.len() - 1);
        self.consumed.set(self.consumed.get() + 1);
        self.readings[index]
    }
}

struct PrintingBacklight;

impl Backlight for PrintingBacklight {
    type Error = std::convert::Infallible;

    fn set_level(&mut self, percent: u8) -> Result<(), Self::Error> {
        println!("  backlight <- {percent}%");
        Ok(())
    }
}

struct InstantDelay;

impl DelayNs for InstantDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();

    let mut initial: u8 = 100;
    let mut trace_path: Option<PathBuf> = None;

    let mut idx = 1;
    while idx < args.len() {
        match args[idx].as_str() {
            "--initial" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| usage())?;
                initial = value
                    .parse()
                    .map_err(|_| format!("invalid initial brightness: {value}"))?;
            }
            arg => {
                if trace_path.is_some() {
                    return Err("multiple trace paths provided".into());
                }
                trace_path = Some(PathBuf::from(arg));
            }
        }
        idx += 1;
    }

    let trace_path = trace_path.ok_or_else(usage)?;
    let readings = parse_trace(&trace_path)?;
    if readings.is_empty() {
        return Err("trace contains no readings".into());
    }
    let total = readings.len();

    let consumed = Rc::new(Cell::new(0));
    let config = AlsConfig {
        initial_brightness: initial,
        ..AlsConfig::default()
    };
    let mut controller = BrightnessController::new(
        TraceSensor {
            readings,
            consumed: Rc::clone(&consumed),
        },
        PrintingBacklight,
        InstantDelay,
        config,
    )
    .map_err(|err| format!("invalid config: {err:?}"))?;

    println!("replaying {total} readings from {}", trace_path.display());
    let mut iteration = 0;
    while consumed.get() < total {
        iteration += 1;
        println!("sample {iteration} (level {}%)", controller.brightness());
        block_on(controller.sample_once());
    }
    println!("final level: {}%", controller.brightness());

    Ok(())
}

fn parse_trace(path: &PathBuf) -> Result<Vec<Result<i32, ReadFailed>>, String> {
    let file = File::open(path).map_err(|err| format!("cannot open {}: {err}", path.display()))?;

    let mut readings = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|err| format!("read error: {err}"))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "fail" {
            readings.push(Err(ReadFailed));
            continue;
        }
        let value = line
            .parse()
            .map_err(|_| format!("line {}: expected integer or `fail`", number + 1))?;
        readings.push(Ok(value));
    }

    Ok(readings)
}

fn usage() -> String {
    "usage: brightness_host_harness [--initial <percent>] <trace-file>\n\
     trace file: one sensor reading per line (integer, or `fail` for a read error)"
        .into()
}
