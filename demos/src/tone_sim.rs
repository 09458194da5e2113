//! Tone streaming against a simulated PWM output and transfer engine.
//!
//! Runs the real fill loop on the main thread while a second thread plays
//! the part of the DMA channel, draining one chunk per nominal chunk period:
//!
//! ```text
//!   FillLoop (main thread)
//!         │  chunk[fill % 2]
//!   DmaRing (2 × 1024 codes)
//!         │  one chunk per ~21.9 ms
//!   SimTransfer (engine thread) ──► on_completion() ──► DRAINED
//! ```
//!
//! When the producer misses a deadline the engine replays a stale chunk,
//! exactly as the hardware does, and the fill loop recovers.
//!
//! Usage: `tone_sim [frequency-hz] [seconds] [--dither]`

use std::thread;
use std::time::{Duration, Instant};

use pwm_tone::config::ToneConfig;
use pwm_tone::constants::SAMPLES_PER_CHUNK;
use pwm_tone::io::sim::{SimOutput, SimTransfer};
use pwm_tone::io::{
    on_completion, start_transfer, ChunkCounter, DmaRing, FillLoop, InterruptDrain, StopSignal,
};

static RING: DmaRing = DmaRing::new();
static FILLED: ChunkCounter = ChunkCounter::new();
static DRAINED: ChunkCounter = ChunkCounter::new();
static OUTPUT: SimOutput = SimOutput::new();
static STOP: StopSignal = StopSignal::new();
static FINISHED: StopSignal = StopSignal::new();

const MAX_RUN_TIME: Duration = Duration::from_secs(24 * 60 * 60);

struct Options {
    frequency: f32,
    seconds: f32,
    dither: bool,
}

fn parse_options() -> Options {
    let mut options = Options {
        frequency: pwm_tone::constants::TONE_FREQUENCY,
        seconds: 1.0,
        dither: false,
    };
    let mut positional = 0;
    for arg in std::env::args().skip(1) {
        if arg == "--dither" {
            options.dither = true;
            continue;
        }
        match (positional, arg.parse::<f32>()) {
            (0, Ok(frequency)) => options.frequency = frequency,
            (1, Ok(seconds)) => options.seconds = seconds,
            _ => log::warn!("ignoring argument {arg:?}"),
        }
        positional += 1;
    }
    options
}

/// Reject options that `ToneConfig` or `Duration` would panic on.
///
/// Returns the run time.
fn check_options(options: &Options, sample_rate: f32) -> Result<Duration, String> {
    let nyquist = sample_rate / 2.0;
    if !(options.frequency > 0.0 && options.frequency < nyquist) {
        return Err(format!(
            "frequency must lie in (0, {nyquist}) Hz, got {}",
            options.frequency
        ));
    }
    match Duration::try_from_secs_f32(options.seconds) {
        Ok(run_time) if !run_time.is_zero() && run_time <= MAX_RUN_TIME => Ok(run_time),
        _ => Err(format!(
            "run time must lie in (0, {}] seconds, got {}",
            MAX_RUN_TIME.as_secs(),
            options.seconds
        )),
    }
}

/// Engine thread body: one chunk per period. Asks the fill loop to stop at
/// `deadline` and keeps draining until it has.
///
/// Returns the last chunk read and the number of chunks moved.
fn run_engine(
    engine: &SimTransfer<'_, SAMPLES_PER_CHUNK>,
    period: Duration,
    deadline: Instant,
) -> ([u16; SAMPLES_PER_CHUNK], usize) {
    let mut sink = [0u16; SAMPLES_PER_CHUNK];
    let mut chunks = 0;
    let mut next = Instant::now() + period;

    // Nothing moves until the fill loop enables the output.
    while !OUTPUT.running() {
        thread::yield_now();
    }

    while !FINISHED.is_requested() {
        if Instant::now() >= deadline {
            STOP.request();
        }
        thread::sleep(next.saturating_duration_since(Instant::now()));
        next += period;

        if engine.transfer_chunk(&mut sink) {
            chunks += 1;
        } else if engine.replay_chunk() {
            log::debug!("engine replayed a stale chunk at position {}", engine.position());
        } else {
            continue;
        }
        on_completion(&mut &*engine, &DRAINED);
    }
    (sink, chunks)
}

/// Frequency of the strongest bin in `codes`, refined by parabolic interpolation.
fn dominant_frequency(codes: &[u16], sample_rate: f32) -> f32 {
    let n = codes.len();
    let mean = codes.iter().map(|&c| c as f32).sum::<f32>() / n as f32;
    let magnitude = |k: usize| {
        let (mut re, mut im) = (0.0f32, 0.0f32);
        for (i, &code) in codes.iter().enumerate() {
            let angle = 2.0 * core::f32::consts::PI * ((k * i) % n) as f32 / n as f32;
            let (s, c) = libm::sincosf(angle);
            re += (code as f32 - mean) * c;
            im -= (code as f32 - mean) * s;
        }
        libm::sqrtf(re * re + im * im)
    };

    let spectrum: Vec<f32> = (0..=n / 2).map(magnitude).collect();
    let peak = (1..n / 2)
        .max_by(|&a, &b| spectrum[a].total_cmp(&spectrum[b]))
        .unwrap_or(1);

    let (left, centre, right) = (spectrum[peak - 1], spectrum[peak], spectrum[peak + 1]);
    let denominator = left - 2.0 * centre + right;
    let offset = if denominator.abs() > f32::EPSILON {
        0.5 * (left - right) / denominator
    } else {
        0.0
    };
    (peak as f32 + offset) * sample_rate / n as f32
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let options = parse_options();
    let run_time = match check_options(&options, ToneConfig::DEFAULT.sample_rate()) {
        Ok(run_time) => run_time,
        Err(message) => {
            log::error!("{message}");
            std::process::exit(2);
        }
    };
    let config = ToneConfig::new(options.frequency).with_dither(options.dither);

    let engine = SimTransfer::new(&RING, &FILLED, &OUTPUT);
    if let Err(error) = start_transfer(&config, &RING, &mut &OUTPUT, &mut &engine) {
        log::error!("bring-up failed: {error}");
        std::process::exit(1);
    }

    let period = Duration::from_micros(config.chunk_period_us(SAMPLES_PER_CHUNK) as u64);
    let deadline = Instant::now() + run_time;
    log::info!("chunk period {:?}, running for {:?}", period, run_time);

    let (last_chunk, chunks, fill_index, underruns) = thread::scope(|scope| {
        let engine_thread = scope.spawn(|| run_engine(&engine, period, deadline));

        let drain = InterruptDrain::new(&DRAINED, || thread::sleep(Duration::from_micros(200)));
        let mut fill = FillLoop::new(&config, &RING, &FILLED, &OUTPUT, drain);
        let Ok(()) = fill.run(&STOP);
        FINISHED.request();

        let (last_chunk, chunks) = match engine_thread.join() {
            Ok(result) => result,
            Err(_) => {
                log::error!("engine thread panicked");
                std::process::exit(1);
            }
        };
        (last_chunk, chunks, fill.fill_index(), fill.underruns())
    });

    log::info!(
        "engine moved {} chunks ({} replays); fill loop produced {} with {} underruns",
        chunks,
        engine.replays(),
        fill_index,
        underruns
    );
    log::info!(
        "dominant frequency in last chunk: {:.1} Hz (configured {} Hz)",
        dominant_frequency(&last_chunk, config.sample_rate()),
        config.tone_frequency()
    );
}
