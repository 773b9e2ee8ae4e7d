//! Image-to-tensor conversion shared by all detector families.
//!
//! The source frame is resized to the model's input geometry and repacked
//! into a pixel-major NHWC tensor (`[1, height, width, 3]`).

use image::imageops::FilterType;
use ndarray::Array4;
use thiserror::Error;

use super::inference_engine::InputGeometry;
use crate::shared::frame::Frame;

/// Resize filter used for all model inputs.
const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Per-channel element type of the produced tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    /// Raw byte per channel.
    U8,
    /// Byte value divided by 255, in `[0, 1]`.
    F32,
}

/// Order of the three colour channels in the packed tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    Bgr,
    Rgb,
}

impl ChannelOrder {
    fn arrange(self, [r, g, b]: [u8; 3]) -> [u8; 3] {
        match self {
            ChannelOrder::Bgr => [b, g, r],
            ChannelOrder::Rgb => [r, g, b],
        }
    }
}

/// A preprocessed model input in NHWC layout.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorBuffer {
    U8(Array4<u8>),
    F32(Array4<f32>),
}

impl TensorBuffer {
    pub fn shape(&self) -> &[usize] {
        match self {
            TensorBuffer::U8(a) => a.shape(),
            TensorBuffer::F32(a) => a.shape(),
        }
    }

    pub fn element_kind(&self) -> ElementKind {
        match self {
            TensorBuffer::U8(_) => ElementKind::U8,
            TensorBuffer::F32(_) => ElementKind::F32,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreprocessError {
    #[error("source image is empty")]
    EmptyImage,
    #[error("unsupported channel count {0} (expected 3 or 4)")]
    UnsupportedChannels(u8),
    #[error("invalid target geometry {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },
    #[error("could not resize {width}x{height} image to model input")]
    ResizeFailed { width: u32, height: u32 },
}

/// Resize `frame` to `target` and pack it into a tensor.
pub fn to_tensor(
    frame: &Frame,
    target: InputGeometry,
    kind: ElementKind,
    order: ChannelOrder,
) -> Result<TensorBuffer, PreprocessError> {
    if frame.is_empty() {
        return Err(PreprocessError::EmptyImage);
    }
    if !matches!(frame.channels(), 3 | 4) {
        return Err(PreprocessError::UnsupportedChannels(frame.channels()));
    }
    if target.is_empty() {
        return Err(PreprocessError::InvalidGeometry {
            width: target.width,
            height: target.height,
        });
    }

    let resize_failed = || PreprocessError::ResizeFailed {
        width: frame.width(),
        height: frame.height(),
    };

    let source = frame.to_rgb_image().ok_or_else(resize_failed)?;
    let resized = if source.dimensions() == (target.width, target.height) {
        source
    } else {
        image::imageops::resize(&source, target.width, target.height, RESIZE_FILTER)
    };
    if resized.dimensions() != (target.width, target.height) {
        return Err(resize_failed());
    }

    let mut packed = Vec::with_capacity(resized.as_raw().len());
    for pixel in resized.pixels() {
        packed.extend_from_slice(&order.arrange(pixel.0));
    }

    let shape = (1, target.height as usize, target.width as usize, 3);
    let bytes = Array4::from_shape_vec(shape, packed).map_err(|_| resize_failed())?;

    Ok(match kind {
        ElementKind::U8 => TensorBuffer::U8(bytes),
        ElementKind::F32 => TensorBuffer::F32(bytes.mapv(|v| v as f32 / 255.0)),
    })
}
