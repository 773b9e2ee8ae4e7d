//! Construction of `ModelFaceDetector`s over ONNX Runtime.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::execution_provider;
use super::ort_inference_engine::OrtInferenceEngine;
use crate::detection::domain::detector_family::DetectorFamily;
use crate::detection::domain::detector_settings::DetectorSettings;
use crate::detection::domain::device::{Device, ParseDeviceError};
use crate::detection::domain::inference_engine::EngineError;
use crate::detection::domain::model_face_detector::ModelFaceDetector;

#[derive(Error, Debug)]
pub enum OpenError {
    #[error("model file not found: {}", .0.display())]
    ModelFileNotFound(PathBuf),
    #[error(transparent)]
    UnsupportedDevice(#[from] ParseDeviceError),
    #[error("device {0} is not available on this host")]
    DeviceUnavailable(String),
    #[error("failed to load model: {0}")]
    ModelLoadFailure(String),
}

impl From<EngineError> for OpenError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::DeviceUnavailable(device) => OpenError::DeviceUnavailable(device),
            other => OpenError::ModelLoadFailure(other.to_string()),
        }
    }
}

/// Validate the arguments and build a detector for `family`.
///
/// The model file and device selector are checked before ONNX Runtime is
/// touched, so configuration mistakes fail fast.
pub fn open(
    family: DetectorFamily,
    model_path: &Path,
    device: &str,
    settings: &DetectorSettings,
) -> Result<ModelFaceDetector, OpenError> {
    let device = validate(model_path, device)?;
    if !execution_provider::is_available(device) {
        return Err(OpenError::DeviceUnavailable(device.to_string()));
    }

    let engine = OrtInferenceEngine::open(model_path, device)?;
    let detector = ModelFaceDetector::new(family, Box::new(engine), settings);

    let geometry = detector.input_geometry();
    log::info!(
        "loaded {family} model {} on {device} ({}x{}, min confidence {})",
        model_path.display(),
        geometry.width,
        geometry.height,
        detector.min_confidence()
    );
    Ok(detector)
}

/// Build a detector from settings alone.
pub fn open_with_settings(
    model_path: &Path,
    settings: &DetectorSettings,
) -> Result<ModelFaceDetector, OpenError> {
    open(settings.family, model_path, &settings.device, settings)
}

fn validate(model_path: &Path, device: &str) -> Result<Device, OpenError> {
    if !model_path.is_file() {
        return Err(OpenError::ModelFileNotFound(model_path.to_path_buf()));
    }
    Ok(device.parse()?)
}
