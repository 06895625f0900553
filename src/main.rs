//! # Lerp Face Demo Host
//!
//! This binary plays the part of the watch platform: it owns the surface, the timer and
//! the notification stream, and forwards everything into the library's [`Engine`].
//!
//! ## Modes
//! - `--stdout`: render one frame and print its draw commands as JSON
//! - `--ascii`: render one frame into the raster canvas and print it as ASCII art
//! - default: run live for `--seconds N` on a single-threaded tokio runtime, painting
//!   whenever the engine asks for it
//!
//! `--at HH:MM:SS[.mmm]` pins the clock for the one-shot modes.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::{bail, Context};
use log::{debug, info};
use serde::Serialize;
use std::env;
use std::time::Duration;
use tokio::time::Instant;

use lerp_face_lib::{
    canvas::DrawCommand,
    config::FaceConfig,
    image::ProceduralImageLoader,
    raster::RasterCanvas,
    scheduler::PlatformTimer,
    time::{Clock, ManualClock, SystemClock},
    ComplicationData, Engine, FrameReport, InterruptionFilter, RecordingCanvas, RectF,
};

/// Repaint cadence while a digit morph is running.
const ANIMATION_FRAME: Duration = Duration::from_millis(16);

/// ASCII output width in characters.
const ASCII_COLUMNS: u32 = 48;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputMode {
    Live,
    Json,
    Ascii,
}

/// Command-line options.
#[derive(Clone, Debug, PartialEq)]
struct Options {
    mode: OutputMode,
    seconds: u64,
    /// `(hour, minute, second, millisecond)`
    at: Option<(u32, u32, u32, u32)>,
    ambient: bool,
    low_bit: bool,
    burn_in: bool,
    muted: bool,
    config: Option<String>,
    slot0: Option<String>,
    slot1: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mode: OutputMode::Live,
            seconds: 5,
            at: None,
            ambient: false,
            low_bit: false,
            burn_in: false,
            muted: false,
            config: None,
            slot0: None,
            slot1: None,
        }
    }
}

impl Options {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut options = Options::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |name: &str| {
                args.next()
                    .with_context(|| format!("{name} requires a value"))
            };
            match arg.as_str() {
                "--stdout" => options.mode = OutputMode::Json,
                "--ascii" => options.mode = OutputMode::Ascii,
                "--ambient" => options.ambient = true,
                "--low-bit" => options.low_bit = true,
                "--burn-in" => options.burn_in = true,
                "--muted" => options.muted = true,
                "--seconds" => {
                    let raw = value("--seconds")?;
                    options.seconds = raw
                        .parse()
                        .with_context(|| format!("invalid --seconds value {raw:?}"))?;
                }
                "--at" => options.at = Some(parse_time(&value("--at")?)?),
                "--config" => options.config = Some(value("--config")?),
                "--slot0" => options.slot0 = Some(value("--slot0")?),
                "--slot1" => options.slot1 = Some(value("--slot1")?),
                other => bail!("unknown argument {other:?}"),
            }
        }
        Ok(options)
    }
}

/// Parse `HH:MM:SS` or `HH:MM:SS.mmm`.
fn parse_time(raw: &str) -> anyhow::Result<(u32, u32, u32, u32)> {
    let (hms, millis) = match raw.split_once('.') {
        Some((hms, millis)) => (hms, millis.parse::<u32>().context("invalid milliseconds")?),
        None => (raw, 0),
    };
    let parts: Vec<u32> = hms
        .split(':')
        .map(|part| part.parse::<u32>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("invalid time {raw:?}"))?;
    let &[hour, minute, second] = parts.as_slice() else {
        bail!("time {raw:?} must be HH:MM:SS[.mmm]");
    };
    if hour > 23 || minute > 59 || second > 59 || millis > 999 {
        bail!("time {raw:?} is out of range");
    }
    Ok((hour, minute, second, millis))
}

/// Platform timer backed by a tokio deadline.
#[derive(Debug, Default)]
struct DeadlineTimer {
    deadline: Option<Instant>,
}

impl DeadlineTimer {
    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the deadline if it has passed.
    fn take_expired(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl PlatformTimer for DeadlineTimer {
    fn schedule_after(&mut self, delay: Duration) {
        self.deadline = Some(Instant::now() + delay);
    }

    fn cancel_pending(&mut self) {
        self.deadline = None;
    }
}

/// Bring a fresh engine up to the state requested on the command line.
fn start_engine<C: Clock, T: PlatformTimer>(
    config: &FaceConfig,
    options: &Options,
    clock: C,
    timer: T,
) -> anyhow::Result<Engine<C, T, ProceduralImageLoader>> {
    let loader = ProceduralImageLoader::new(config.surface.asset_resolution);
    let mut engine = Engine::new(config, clock, timer, loader).context("invalid face configuration")?;
    engine.on_properties_changed(options.low_bit, options.burn_in);
    engine
        .on_surface_size_changed(config.surface.width, config.surface.height)
        .context("failed to prepare surface")?;
    engine.on_visibility_changed(true);
    engine.on_ambient_mode_changed(options.ambient);
    if options.muted {
        engine.on_interruption_filter_changed(InterruptionFilter::None);
    }
    for (id, text) in [(0, &options.slot0), (1, &options.slot1)] {
        if let Some(text) = text {
            engine.on_complication_data_update(id, ComplicationData::short_text(text.as_str()));
        }
    }
    Ok(engine)
}

#[derive(Serialize)]
struct FrameDump<'a> {
    report: &'a FrameReport,
    commands: &'a [DrawCommand],
}

fn render_json<C: Clock>(config: &FaceConfig, options: &Options, clock: C) -> anyhow::Result<String> {
    let mut engine = start_engine(config, options, clock, DeadlineTimer::default())?;
    let mut canvas = RecordingCanvas::new();
    let bounds = RectF::new(
        0.0,
        0.0,
        config.surface.width as f32,
        config.surface.height as f32,
    );
    let report = engine.render_frame(&mut canvas, bounds);
    engine.destroy();
    let commands = canvas.into_commands();
    let dump = FrameDump {
        report: &report,
        commands: &commands,
    };
    serde_json::to_string_pretty(&dump).context("failed to serialize frame")
}

fn render_ascii<C: Clock>(config: &FaceConfig, options: &Options, clock: C) -> anyhow::Result<String> {
    let mut engine = start_engine(config, options, clock, DeadlineTimer::default())?;
    let mut canvas = RasterCanvas::new(config.surface.width, config.surface.height);
    let bounds = canvas.bounds();
    engine.render_frame(&mut canvas, bounds);
    engine.destroy();
    Ok(canvas.to_ascii(ASCII_COLUMNS))
}

/// Milliseconds until the next wall-clock minute, for the ambient time tick.
fn until_next_minute(now_ms: i64) -> Duration {
    Duration::from_millis((60_000 - now_ms.rem_euclid(60_000)) as u64)
}

async fn run_live(config: FaceConfig, options: Options) -> anyhow::Result<()> {
    let clock = SystemClock::new();
    let mut minute_tick = Instant::now() + until_next_minute(clock.now_millis());
    let mut engine = start_engine(&config, &options, clock, DeadlineTimer::default())?;
    let end = Instant::now() + Duration::from_secs(options.seconds);
    let mut canvas = RasterCanvas::new(config.surface.width, config.surface.height);
    let mut frames = 0u32;
    let mut next_paint = Instant::now();

    loop {
        let now = Instant::now();
        if engine.redraw_requested() && now >= next_paint {
            engine.take_redraw_request();
            canvas = RasterCanvas::new(config.surface.width, config.surface.height);
            let bounds = canvas.bounds();
            let report = engine.render_frame(&mut canvas, bounds);
            frames += 1;
            debug!(
                "Frame {}: {:?}, {} layers, animating {}",
                frames,
                report.plan.background,
                report.layers_drawn.len(),
                report.animating
            );
            next_paint = now + ANIMATION_FRAME;
        }
        if now >= end {
            break;
        }

        let mut wake = end.min(minute_tick);
        if let Some(deadline) = engine.scheduler().timer().deadline() {
            wake = wake.min(deadline);
        }
        if engine.redraw_requested() {
            wake = wake.min(next_paint);
        }
        tokio::time::sleep_until(wake).await;

        let now = Instant::now();
        if engine.timer_mut().take_expired(now) {
            engine.on_timer_fired();
        }
        if now >= minute_tick {
            engine.on_time_tick();
            minute_tick = now + until_next_minute(engine.clock().now_millis());
        }
    }

    engine.destroy();
    info!("Painted {} frames in {}s", frames, options.seconds);
    println!("{}", canvas.to_ascii(ASCII_COLUMNS));
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Options::parse(env::args().skip(1))?;
    let config = match &options.config {
        Some(path) => FaceConfig::load_from_path(path),
        None => FaceConfig::load(),
    };

    match options.mode {
        OutputMode::Json | OutputMode::Ascii => {
            let output = match (options.mode, options.at) {
                (OutputMode::Json, Some((h, m, s, ms))) => {
                    render_json(&config, &options, ManualClock::at_hms_milli(h, m, s, ms))?
                }
                (OutputMode::Json, None) => render_json(&config, &options, SystemClock::new())?,
                (_, Some((h, m, s, ms))) => {
                    render_ascii(&config, &options, ManualClock::at_hms_milli(h, m, s, ms))?
                }
                (_, None) => render_ascii(&config, &options, SystemClock::new())?,
            };
            println!("{output}");
        }
        OutputMode::Live => {
            if options.at.is_some() {
                eprintln!("⚠️  --at only applies to --stdout and --ascii; live mode uses the system clock");
            }
            eprintln!(
                "🕐 Running live for {}s on a {}x{} surface...",
                options.seconds, config.surface.width, config.surface.height
            );
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .context("failed to start tokio runtime")?;
            runtime.block_on(run_live(config, options))?;
            eprintln!("✅ Done");
        }
    }

    Ok(())
}
