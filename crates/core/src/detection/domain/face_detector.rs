use thiserror::Error;

use super::detection::Detection;
use super::image_preprocessor::PreprocessError;
use super::inference_engine::EngineError;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("tensor conversion failed: {0}")]
    TensorConversion(#[from] PreprocessError),
    #[error("inference failed: {0}")]
    Inference(#[from] EngineError),
}

/// Domain interface for face detection.
///
/// `&mut self` allows one in-flight call per detector; share a detector
/// across threads through a `DetectionWorker`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectError>;
}
