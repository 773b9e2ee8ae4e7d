use thiserror::Error;

use super::image_preprocessor::TensorBuffer;
use super::output_tensor::OutputTensor;

/// Spatial size of a model's input tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputGeometry {
    pub width: u32,
    pub height: u32,
}

impl InputGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("device {0} is not available on this host")]
    DeviceUnavailable(String),
    #[error("failed to load model: {0}")]
    ModelLoad(String),
    #[error("unsupported model input: {0}")]
    UnsupportedInput(String),
    #[error("inference failed: {0}")]
    Run(String),
    #[error("output tensor shape {shape:?} does not match {len} values")]
    OutputShape { shape: Vec<usize>, len: usize },
}

/// Port to the inference backend that executes a compiled model.
///
/// One engine belongs to exactly one detector; `run` takes `&mut self`
/// because backends are not guaranteed to be reentrant.
pub trait InferenceEngine: Send {
    /// Input tensor geometry of the compiled model.
    fn input_geometry(&self) -> InputGeometry;

    /// Execute the model once, returning its outputs in declaration order.
    fn run(&mut self, input: TensorBuffer) -> Result<Vec<OutputTensor>, EngineError>;
}
