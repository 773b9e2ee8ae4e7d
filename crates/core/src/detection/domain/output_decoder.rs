use super::detection::Detection;
use super::inference_engine::InputGeometry;
use super::output_tensor::OutputTensor;

/// Geometry needed to map model outputs back onto the source image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodeContext {
    pub source_width: u32,
    pub source_height: u32,
    pub input: InputGeometry,
}

impl DecodeContext {
    pub fn new(source_width: u32, source_height: u32, input: InputGeometry) -> Self {
        Self {
            source_width,
            source_height,
            input,
        }
    }

    /// Horizontal scale from model-input pixels to source pixels.
    pub fn ratio_w(&self) -> f32 {
        self.source_width as f32 / self.input.width as f32
    }

    /// Vertical scale from model-input pixels to source pixels.
    pub fn ratio_h(&self) -> f32 {
        self.source_height as f32 / self.input.height as f32
    }
}

/// Family-specific conversion of raw model outputs into detections.
///
/// Decoders never fail: outputs whose layout does not fit the family are
/// skipped, since some exports emit extra diagnostic tensors. Decoders do
/// not apply confidence cutoffs; the detector does that afterwards.
pub trait OutputDecoder: Send {
    fn decode(&self, outputs: &[OutputTensor], ctx: &DecodeContext) -> Vec<Detection>;
}
