//! `InferenceEngine` backed by an ONNX Runtime session.

use std::path::Path;

use ndarray::Array4;
use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::{DynTensor, Tensor, ValueType};

use super::execution_provider;
use crate::detection::domain::device::Device;
use crate::detection::domain::image_preprocessor::TensorBuffer;
use crate::detection::domain::inference_engine::{EngineError, InferenceEngine, InputGeometry};
use crate::detection::domain::output_tensor::OutputTensor;

/// Memory layout of the model's image input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputLayout {
    Nchw,
    Nhwc,
}

impl InputLayout {
    /// Read layout and spatial size from a rank-4 input shape.
    ///
    /// A trailing axis of 3 means NHWC; anything else is treated as NCHW.
    /// Dynamic extents (negative values) produce a zero geometry.
    pub fn from_shape(shape: &[i64]) -> Option<(Self, InputGeometry)> {
        if shape.len() != 4 {
            return None;
        }
        let extent = |v: i64| u32::try_from(v).unwrap_or(0);
        Some(if shape[3] == 3 {
            (Self::Nhwc, InputGeometry::new(extent(shape[2]), extent(shape[1])))
        } else {
            (Self::Nchw, InputGeometry::new(extent(shape[3]), extent(shape[2])))
        })
    }

    /// Reorder an NHWC array into this layout.
    fn arrange<T: Clone>(self, nhwc: Array4<T>) -> Array4<T> {
        match self {
            Self::Nhwc => nhwc,
            Self::Nchw => nhwc
                .permuted_axes([0, 3, 1, 2])
                .as_standard_layout()
                .into_owned(),
        }
    }
}

pub struct OrtInferenceEngine {
    session: Session,
    layout: InputLayout,
    geometry: InputGeometry,
    expects_float: bool,
}

impl OrtInferenceEngine {
    /// Build a session for `model_path` with the providers for `device`.
    pub fn open(model_path: &Path, device: Device) -> Result<Self, EngineError> {
        let providers = execution_provider::providers_for(device)?;
        let session = Session::builder()
            .map_err(load_error)?
            .with_execution_providers(providers)
            .map_err(load_error)?
            .commit_from_file(model_path)
            .map_err(load_error)?;

        let input = session
            .inputs()
            .first()
            .ok_or_else(|| EngineError::UnsupportedInput("model declares no inputs".into()))?;
        let ValueType::Tensor { ty, shape, .. } = input.dtype() else {
            return Err(EngineError::UnsupportedInput(
                "model input is not a tensor".into(),
            ));
        };
        let expects_float = match ty {
            TensorElementType::Float32 => true,
            TensorElementType::Uint8 => false,
            other => {
                return Err(EngineError::UnsupportedInput(format!(
                    "input element type {other:?}"
                )))
            }
        };
        let (layout, geometry) = InputLayout::from_shape(shape).ok_or_else(|| {
            EngineError::UnsupportedInput(format!("input shape {shape:?} is not rank 4"))
        })?;

        log::debug!(
            "model input {layout:?} {}x{}, float: {expects_float}",
            geometry.width,
            geometry.height
        );

        Ok(Self {
            session,
            layout,
            geometry,
            expects_float,
        })
    }

    fn to_value(&self, input: TensorBuffer) -> Result<DynTensor, EngineError> {
        let value = match input {
            TensorBuffer::F32(a) if self.expects_float => {
                Tensor::from_array(self.layout.arrange(a)).map(|t| t.upcast())
            }
            TensorBuffer::U8(a) if self.expects_float => {
                Tensor::from_array(self.layout.arrange(a.mapv(f32::from))).map(|t| t.upcast())
            }
            TensorBuffer::U8(a) => Tensor::from_array(self.layout.arrange(a)).map(|t| t.upcast()),
            TensorBuffer::F32(_) => {
                return Err(EngineError::UnsupportedInput(
                    "model expects bytes but received floats".into(),
                ))
            }
        };
        value.map_err(run_error)
    }
}

impl InferenceEngine for OrtInferenceEngine {
    fn input_geometry(&self) -> InputGeometry {
        self.geometry
    }

    fn run(&mut self, input: TensorBuffer) -> Result<Vec<OutputTensor>, EngineError> {
        let value = self.to_value(input)?;
        let outputs = self.session.run(ort::inputs![value]).map_err(run_error)?;

        let mut tensors = Vec::with_capacity(outputs.len());
        for i in 0..outputs.len() {
            let output = &outputs[i];
            let copied = if let Ok(view) = output.try_extract_array::<f32>() {
                Some((view.shape().to_vec(), view.iter().copied().collect()))
            } else if let Ok(view) = output.try_extract_array::<i64>() {
                Some((view.shape().to_vec(), view.iter().map(|&v| v as f32).collect()))
            } else {
                None
            };
            match copied {
                Some((shape, data)) => tensors.push(OutputTensor::new(shape, data)?),
                None => log::debug!("skipping non-numeric output {i}"),
            }
        }
        Ok(tensors)
    }
}

fn load_error(e: impl std::fmt::Display) -> EngineError {
    EngineError::ModelLoad(e.to_string())
}

fn run_error(e: impl std::fmt::Display) -> EngineError {
    EngineError::Run(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[1, 3, 448, 448], InputLayout::Nchw, 448, 448)]
    #[case(&[1, 3, 480, 640], InputLayout::Nchw, 640, 480)]
    #[case(&[1, 300, 400, 3], InputLayout::Nhwc, 400, 300)]
    #[case(&[1, 3, -1, -1], InputLayout::Nchw, 0, 0)]
    fn test_layout_from_shape(
        #[case] shape: &[i64],
        #[case] layout: InputLayout,
        #[case] width: u32,
        #[case] height: u32,
    ) {
        assert_eq!(
            InputLayout::from_shape(shape),
            Some((layout, InputGeometry::new(width, height)))
        );
    }

    #[test]
    fn test_layout_rejects_other_ranks() {
        assert!(InputLayout::from_shape(&[1, 3, 640]).is_none());
    }

    #[test]
    fn test_nchw_arrangement_moves_channels_first() {
        let nhwc = Array4::from_shape_fn((1, 2, 3, 3), |(_, y, x, c)| (y * 100 + x * 10 + c) as u8);
        let nchw = InputLayout::Nchw.arrange(nhwc.clone());

        assert_eq!(nchw.shape(), &[1, 3, 2, 3]);
        assert_eq!(nchw[[0, 2, 1, 0]], nhwc[[0, 1, 0, 2]]);
        assert!(nchw.is_standard_layout());
        assert_eq!(InputLayout::Nhwc.arrange(nhwc.clone()), nhwc);
    }
}
