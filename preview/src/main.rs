//! Headless preview for lightbox-core
//!
//! Runs the render loop against the simulated driver, cycles through the
//! built-in programs and draws the panel in the terminal with 24-bit ANSI
//! colors.
//!
//! Usage: `lightbox-preview [name=value ...]`, for example
//! `lightbox-preview speed=3 palette=fire target_fps=30`.

use std::io::{self, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lightbox_core::animation::BUILTIN_ANIMATIONS;
use lightbox_core::output::{CoordinateMap, HardwareProfile, SimulatedDriver, SimulatedPanel};
use lightbox_core::{FrameGenerator, LoopConfig, ParameterStore, RenderLoop, Rgb};
use log::{error, info, warn};

/// Time spent on each program
const PROGRAM_DURATION: Duration = Duration::from_secs(3);

/// Terminal redraw period
const DRAW_INTERVAL: Duration = Duration::from_millis(100);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let profile = HardwareProfile::ws2811_10x10();
    let store = match ParameterStore::standard(&profile) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            error!("parameter registry: {err}");
            return;
        }
    };
    for argument in std::env::args().skip(1) {
        apply_argument(&store, &argument);
    }

    let (driver, panel) = SimulatedDriver::new();
    let handle = match RenderLoop::start(
        driver,
        Arc::clone(&store),
        FrameGenerator::with_builtins(),
        LoopConfig::default(),
    ) {
        Ok(handle) => handle,
        Err(err) => {
            error!("render loop failed to start: {err}");
            return;
        }
    };

    let map = CoordinateMap::new(&profile);
    for entry in BUILTIN_ANIMATIONS.iter().skip(1) {
        if let Err(err) = handle.switch_program(entry.name) {
            warn!("{err}");
            continue;
        }
        let draws = PROGRAM_DURATION.as_millis() / DRAW_INTERVAL.as_millis();
        for _ in 0..draws {
            thread::sleep(DRAW_INTERVAL);
            if let Err(err) = draw(&panel, &map) {
                error!("terminal: {err}");
                break;
            }
        }
        if let Some(status) = handle.status() {
            match serde_json::to_string(&status) {
                Ok(json) => info!("{json}"),
                Err(err) => warn!("status: {err}"),
            }
        }
    }

    match handle.stop() {
        Ok(report) => info!(
            "rendered {} frames, {:.1} FPS average",
            report.frames, report.performance.fps.avg
        ),
        Err(err) => error!("render loop failed: {err}"),
    }
}

/// Apply a `name=value` argument; values are parsed as JSON, bare words as strings
fn apply_argument(store: &ParameterStore, argument: &str) {
    let Some((name, raw)) = argument.split_once('=') else {
        warn!("ignoring `{argument}`, expected name=value");
        return;
    };
    let value = serde_json::from_str(raw)
        .unwrap_or_else(|_| serde_json::Value::String(raw.to_owned()));
    match store.update(name, &value) {
        Ok(()) => info!("{name} = {value}"),
        Err(err) => warn!("{err}"),
    }
}

fn draw(panel: &SimulatedPanel, map: &CoordinateMap) -> io::Result<()> {
    let frame = panel.frame();
    if frame.len() != map.len() {
        return Ok(());
    }
    let mut out = io::stdout().lock();
    // Home the cursor so frames overwrite each other
    write!(out, "\x1b[H")?;
    for y in 0..map.height() {
        for x in 0..map.width() {
            let Rgb { r, g, b } = map.map(x, y).map_or(Rgb::default(), |index| frame[index]);
            write!(out, "\x1b[48;2;{r};{g};{b}m  ")?;
        }
        writeln!(out, "\x1b[0m")?;
    }
    out.flush()
}
