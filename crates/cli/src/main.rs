use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use facenarrator_core::narration::domain::phrase_catalog::PhraseCatalog;
use facenarrator_core::narration::infrastructure::catalog_loader;
use facenarrator_core::playback::infrastructure::log_phrase_display::LogPhraseDisplay;
use facenarrator_core::playback::infrastructure::snapshot_capture::load_snapshot;
use facenarrator_core::session::narration_session::NarrationSession;
use facenarrator_core::session::session_config::SessionConfig;
use facenarrator_core::session::session_factory::build_session;
use facenarrator_core::session::session_logger::StdoutSessionLogger;
use facenarrator_core::shared::detection::Detection;
use facenarrator_core::shared::frame::Frame;
use facenarrator_core::tracking::infrastructure::centroid_tracker::MatchStrategy;

/// Replay recorded face detections through a narration session.
#[derive(Parser)]
#[command(name = "facenarrator")]
struct Cli {
    /// Detector output: one JSON array of detections per line, one line per frame.
    detections: PathBuf,

    /// Phrase catalog (.json, .yaml or .yml). Without it only remote phrases are spoken.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Session config file (defaults to the per-user config location).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Remote phrase service URL (overrides the config file).
    #[arg(long)]
    remote_url: Option<String>,

    /// Still image sent to the remote phrase service in place of a camera frame.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Replay rate in frames per second (defaults to the configured assumed fps).
    #[arg(long)]
    fps: Option<f64>,

    /// Local phrases spoken before each remote batch.
    #[arg(long)]
    phrases_per_cycle: Option<usize>,

    /// Frames averaged for the speed estimate (5-30).
    #[arg(long)]
    speed_window: Option<usize>,

    /// Detection matching: sequential or global-nearest.
    #[arg(long)]
    match_strategy: Option<String>,

    /// Write per-frame face annotations as JSON lines.
    #[arg(long)]
    annotations: Option<PathBuf>,

    /// Keep the session running this long after the last frame so the final
    /// phrase can finish.
    #[arg(long, default_value = "0")]
    linger_ms: u64,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let frames = read_frames(&cli.detections)?;
    log::info!(
        "Replaying {} frames from {}",
        frames.len(),
        cli.detections.display()
    );

    let catalog = load_catalog(cli.catalog.as_deref());
    let snapshot = match &cli.snapshot {
        Some(path) => Some(load_snapshot(path)?),
        None => {
            if config.remote_url.is_some() {
                log::warn!("--snapshot not given; remote batches will fall back to local phrases");
            }
            None
        }
    };

    let mut session = build_session(
        &config,
        catalog,
        Box::new(LogPhraseDisplay::new()),
        Box::new(StdoutSessionLogger::default()),
    )?;

    let mut annotations = match &cli.annotations {
        Some(path) => Some(BufWriter::new(File::create(path)?)),
        None => None,
    };

    let fps = cli.fps.unwrap_or(config.assumed_fps);
    let frame_interval = Duration::from_secs_f64(1.0 / fps);
    let start = Instant::now();

    for (index, detections) in frames.into_iter().enumerate() {
        let due = start + frame_interval * index as u32;
        if let Some(wait) = due.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }

        let mut capture = || snapshot.clone().map(|f: Frame| f.with_index(index));
        let report = session.process_frame(detections, Instant::now(), &mut capture);

        if let Some(out) = annotations.as_mut() {
            serde_json::to_writer(&mut *out, &report.annotations)?;
            out.write_all(b"\n")?;
        }
        for annotation in report.annotations.iter().filter(|a| a.primary) {
            log::debug!("Frame {}: {} [{}]", report.frame_index, annotation.label(), report.state);
        }
    }

    linger(&mut session, Duration::from_millis(cli.linger_ms));

    if let Some(mut out) = annotations {
        out.flush()?;
    }
    session.stop();
    session.summary();
    Ok(())
}

/// Keep delivering playback events with no faces in view.
fn linger(session: &mut NarrationSession, duration: Duration) {
    let until = Instant::now() + duration;
    while Instant::now() < until {
        session.process_frame(Vec::new(), Instant::now(), &mut || None);
        thread::sleep(Duration::from_millis(20));
    }
}

fn build_config(cli: &Cli) -> Result<SessionConfig, Box<dyn std::error::Error>> {
    let mut config = SessionConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.remote_url {
        config.remote_url = Some(url.clone());
    }
    if let Some(n) = cli.phrases_per_cycle {
        config.local_phrases_per_cycle = n;
    }
    if let Some(window) = cli.speed_window {
        config.speed_window = window;
        config.min_speed_samples = config.min_speed_samples.min(window);
    }
    if let Some(strategy) = &cli.match_strategy {
        config.match_strategy = parse_match_strategy(strategy)?;
    }
    config.validate()?;
    Ok(config)
}

fn load_catalog(path: Option<&Path>) -> Option<PhraseCatalog> {
    let path = path?;
    match catalog_loader::load(path) {
        Ok(catalog) => Some(catalog),
        Err(e) => {
            log::error!("{e}");
            None
        }
    }
}

fn read_frames(path: &Path) -> Result<Vec<Vec<Detection>>, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Cannot read detections {}: {e}", path.display()))?;
    parse_frames(&text)
}

/// One frame per line. Blank lines are frames with no faces.
fn parse_frames(text: &str) -> Result<Vec<Vec<Detection>>, Box<dyn std::error::Error>> {
    text.lines()
        .enumerate()
        .map(|(n, line)| -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
            if line.trim().is_empty() {
                return Ok(Vec::new());
            }
            serde_json::from_str(line).map_err(|e| format!("Line {}: {e}", n + 1).into())
        })
        .collect()
}

fn parse_match_strategy(value: &str) -> Result<MatchStrategy, Box<dyn std::error::Error>> {
    match value {
        "sequential" => Ok(MatchStrategy::Sequential),
        "global-nearest" | "global_nearest" => Ok(MatchStrategy::GlobalNearest),
        other => Err(format!(
            "Match strategy must be 'sequential' or 'global-nearest', got '{other}'"
        )
        .into()),
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.detections.exists() {
        return Err(format!("Detections file not found: {}", cli.detections.display()).into());
    }
    if let Some(fps) = cli.fps {
        if !(fps > 0.0 && fps <= 240.0) {
            return Err(format!("FPS must be between 0 and 240, got {fps}").into());
        }
    }
    if let Some(snapshot) = &cli.snapshot {
        if !snapshot.exists() {
            return Err(format!("Snapshot not found: {}", snapshot.display()).into());
        }
    }
    Ok(())
}
