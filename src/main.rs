//! tonescope - Multi-channel tone synthesizer with a live oscilloscope

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tonescope::config::{self, ToneConfig};
use tonescope::control::ControlSurface;
use tonescope::engine::{default_device_name, list_output_devices, AudioOutput, SignalGraph, SMOOTHING_TIME_CONSTANT};
use tonescope::pitch;
use tonescope::synth::Waveform;
use tonescope::viz;

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, Commands::Play { .. });
    init_logging(cli.log_file.as_deref(), interactive)?;

    match cli.command {
        Commands::Play { config: config_path } => play(config_path.as_deref())?,

        Commands::Tone {
            pitches,
            duration,
            waveform,
            gain,
        } => tone(pitches, duration, waveform, gain)?,

        Commands::Resolve { text } => {
            let mut failed = false;
            for input in &text {
                match pitch::resolve(input) {
                    Ok(hz) => println!("{:>8}  {:.4} Hz", input, hz),
                    Err(e) => {
                        println!("{:>8}  error: {}", input, e);
                        failed = true;
                    }
                }
            }
            if failed {
                std::process::exit(1);
            }
        }

        Commands::Devices => {
            println!("Available audio devices:\n");

            match default_device_name() {
                Some(name) => println!("Default output: {}\n", name),
                None => println!("No default output device\n"),
            }

            println!("Output devices:");
            let devices = list_output_devices();
            if devices.is_empty() {
                println!("  (none found)");
            }
            for (name, config) in devices {
                println!("  - {} ({} Hz, {} ch)", name, config.sample_rate.0, config.channels);
            }
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    print_summary(&cfg);
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let example_config = include_str!("../tonescope.example.yaml");

            let path = "tonescope.yaml";
            if Path::new(path).exists() {
                println!("tonescope.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, example_config)?;
                println!("Created tonescope.yaml with example configuration.");
            }
        }
    }

    Ok(())
}

/// Install the fmt subscriber
///
/// `RUST_LOG` overrides the default `info` filter. Without a log file the
/// interactive UI discards log output so it cannot draw over the screen.
fn init_logging(log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("failed to create log file {:?}", path))?;
            subscriber.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None if interactive => subscriber.with_writer(io::sink).init(),
        None => subscriber.with_writer(io::stderr).init(),
    }

    Ok(())
}

fn play(config_path: Option<&Path>) -> Result<()> {
    let cfg = config::load_or_default(config_path)?;

    let mut output = AudioOutput::open(&cfg.audio)?;
    let mut graph = SignalGraph::new(f64::from(output.sample_rate()), &cfg);
    let mut surface = ControlSurface::new(&cfg);

    output.start(graph.engine())?;
    let result = viz::run_viz(&mut graph, &mut surface, cfg.scope.fps);

    graph.stop();
    wait_for_release();
    output.stop();
    info!("Playback finished");

    result
}

fn tone(pitches: Vec<String>, duration: f64, waveform: Waveform, gain: u8) -> Result<()> {
    let length = playback_length(duration)?;

    let mut cfg = ToneConfig::default();
    cfg.master.waveform = waveform;
    cfg.master.gain = gain;
    cfg.channels = pitches;
    cfg.validate()?;

    // Unresolvable pitches fall back to 440 Hz inside the graph; report them up front
    for input in &cfg.channels {
        match pitch::resolve(input) {
            Ok(hz) => println!("  {} -> {:.2} Hz", input, hz),
            Err(e) => println!("  {} -> {}", input, e),
        }
    }

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))?;

    let mut output = AudioOutput::open(&cfg.audio)?;
    let mut graph = SignalGraph::new(f64::from(output.sample_rate()), &cfg);
    output.start(graph.engine())?;

    println!("Playing {} for {:.1}s (Ctrl+C to stop)...", waveform, duration);
    graph.play();

    let started = Instant::now();
    while running.load(Ordering::SeqCst) && started.elapsed() < length {
        std::thread::sleep(Duration::from_millis(10));
    }

    graph.stop();
    wait_for_release();
    output.stop();

    Ok(())
}

/// Convert a `--duration` in seconds, rejecting values a `Duration` cannot hold
fn playback_length(seconds: f64) -> Result<Duration> {
    if seconds < 0.0 {
        bail!("duration must be a non-negative number of seconds");
    }
    Duration::try_from_secs_f64(seconds).with_context(|| format!("duration {} is out of range", seconds))
}

/// Let the stop ramp finish before the stream is closed
fn wait_for_release() {
    std::thread::sleep(Duration::from_secs_f64(SMOOTHING_TIME_CONSTANT * 10.0));
}

fn print_summary(cfg: &ToneConfig) {
    let sample_rate = cfg
        .audio
        .sample_rate
        .map(|r| format!("{} Hz", r))
        .unwrap_or_else(|| "device default".to_string());
    let device = cfg.audio.device.clone().unwrap_or_else(|| "default".to_string());

    println!("  Device: {}", device);
    println!("  Sample rate: {}", sample_rate);
    if let Some(frames) = cfg.audio.buffer_size {
        println!("  Buffer size: {}", frames);
    }
    println!("  Waveform: {}", cfg.master.waveform);
    println!("  Master gain: {} ({:.2})", cfg.master.gain, cfg.master.gain_level());
    println!(
        "  Filter: cutoff {} ({:.0} Hz), resonance {:.1}",
        cfg.filter.cutoff,
        cfg.filter.cutoff_hz(),
        cfg.filter.resonance
    );
    println!("  Scope: {} samples at {} fps", cfg.scope.window_size, cfg.scope.fps);
    println!("  Channels: {}", cfg.channels.len());
    for (id, input) in cfg.channels.iter().enumerate() {
        match pitch::resolve(input) {
            Ok(hz) => println!("    {}: {} -> {:.2} Hz", id + 1, input, hz),
            Err(e) => println!("    {}: {} -> {} (falls back to 440 Hz)", id + 1, input, e),
        }
    }
}
