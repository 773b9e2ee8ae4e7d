use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde::Serialize;

use facedet_core::detection::domain::detection::Detection;
use facedet_core::detection::domain::detector_family::DetectorFamily;
use facedet_core::detection::domain::detector_settings::DetectorSettings;
use facedet_core::detection::domain::device::Device;
use facedet_core::detection::infrastructure::detection_worker::{
    DetectResult, DetectionWorker, PendingResult,
};
use facedet_core::detection::infrastructure::{
    execution_provider, model_resolver, ort_face_detector,
};
use facedet_core::shared::constants::{DEFAULT_WORKER_CAPACITY, IMAGE_EXTENSIONS};
use facedet_core::shared::frame::Frame;

/// Detect faces in images and print them as JSON lines.
#[derive(Parser)]
#[command(name = "facedet")]
struct Cli {
    /// Image files or directories of images.
    inputs: Vec<PathBuf>,

    /// Detector family: ssd, atss or yolov8-face.
    #[arg(long)]
    family: Option<String>,

    /// Model file (defaults to the family's cached or bundled model).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Directory searched for bundled models.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Inference device: CPU, GPU, GPU.0, GPU.1, GPU.2 or NPU.
    #[arg(long)]
    device: Option<String>,

    /// Minimum confidence of reported faces (0.0-1.0).
    #[arg(long)]
    confidence: Option<f32>,

    /// Settings file (defaults to the user config file).
    #[arg(long)]
    config: Option<PathBuf>,

    /// List inference devices usable on this host and exit.
    #[arg(long)]
    list_devices: bool,

    /// Pretty-print each JSON record.
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct ImageReport<'a> {
    path: &'a Path,
    width: u32,
    height: u32,
    detections: Vec<Detection>,
}

struct Pending {
    path: PathBuf,
    width: u32,
    height: u32,
    result: PendingResult,
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

    if cli.list_devices {
        list_devices();
        return Ok(());
    }

    let settings = build_settings(&cli)?;
    validate(&cli, &settings)?;

    let images = collect_images(&cli.inputs)?;
    if images.is_empty() {
        return Err("No images found in the given inputs".into());
    }

    let model_path = model_resolver::resolve(
        settings.family,
        settings.model_path.as_deref(),
        cli.model_dir.as_deref(),
    );
    log::info!("Using {} model {}", settings.family, model_path.display());
    let detector = ort_face_detector::open_with_settings(&model_path, &settings)?;

    let worker = DetectionWorker::with_default_capacity(Box::new(detector));
    let handle = worker.handle();
    let mut pending = VecDeque::new();
    let mut failures = 0usize;

    for (index, path) in images.into_iter().enumerate() {
        let frame = match load_frame(&path, index) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Skipping {}: {e}", path.display());
                failures += 1;
                continue;
            }
        };
        let (width, height) = (frame.width(), frame.height());
        let result = handle.submit(frame)?;
        pending.push_back(Pending {
            path,
            width,
            height,
            result,
        });

        if pending.len() >= DEFAULT_WORKER_CAPACITY {
            if let Some(done) = pending.pop_front() {
                failures += report(done, cli.pretty)?;
            }
        }
    }
    while let Some(done) = pending.pop_front() {
        failures += report(done, cli.pretty)?;
    }
    worker.shutdown();

    if failures > 0 {
        log::warn!("{failures} image(s) could not be processed");
    }
    Ok(())
}

/// Print one image's detections. Returns 1 if detection failed for it.
fn report(done: Pending, pretty: bool) -> Result<usize, Box<dyn std::error::Error>> {
    let result: DetectResult = done.result.recv()?;
    let detections = match result {
        Ok(detections) => detections,
        Err(e) => {
            log::warn!("Detection failed for {}: {e}", done.path.display());
            return Ok(1);
        }
    };

    let record = ImageReport {
        path: &done.path,
        width: done.width,
        height: done.height,
        detections,
    };
    let json = if pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    println!("{json}");
    Ok(0)
}

fn build_settings(cli: &Cli) -> Result<DetectorSettings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => DetectorSettings::load(path)?,
        None => DetectorSettings::load_default(),
    };
    if let Some(family) = &cli.family {
        settings.family = family.parse::<DetectorFamily>()?;
    }
    if let Some(model) = &cli.model {
        settings.model_path = Some(model.clone());
    }
    if let Some(device) = &cli.device {
        settings.device = device.clone();
    }
    if let Some(confidence) = cli.confidence {
        settings.min_confidence = confidence;
    }
    Ok(settings)
}

fn validate(cli: &Cli, settings: &DetectorSettings) -> Result<(), Box<dyn std::error::Error>> {
    if cli.inputs.is_empty() {
        return Err("At least one input image or directory is required".into());
    }
    for input in &cli.inputs {
        if !input.exists() {
            return Err(format!("Input not found: {}", input.display()).into());
        }
    }
    if !(0.0..=1.0).contains(&settings.min_confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            settings.min_confidence
        )
        .into());
    }
    Ok(())
}

fn list_devices() {
    for device in Device::ALL {
        let status = if execution_provider::is_available(*device) {
            "available"
        } else {
            "unavailable"
        };
        println!("{device}\t{status}");
    }
}

/// Expand directories into their image files, sorted by path.
fn collect_images(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut images = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && is_image(path))
                .collect();
            entries.sort();
            images.extend(entries);
        } else {
            images.push(input.clone());
        }
    }
    Ok(images)
}

fn load_frame(path: &Path, index: usize) -> Result<Frame, image::ImageError> {
    let image = image::open(path)?.to_rgb8();
    Ok(Frame::from_rgb_image(image, index))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
