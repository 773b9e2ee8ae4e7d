use super::inference_engine::EngineError;

/// A raw model output: an owned f32 buffer plus its shape.
///
/// Produced by an [`InferenceEngine`](super::inference_engine::InferenceEngine)
/// for one `run` and consumed once by a decoder, then dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl OutputTensor {
    /// Pair a buffer with its shape; the shape's element count must equal
    /// the buffer length.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, EngineError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(EngineError::OutputShape {
                shape,
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Extent of the last axis, or 0 for a scalar.
    pub fn last_dim(&self) -> usize {
        self.shape.last().copied().unwrap_or(0)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_matching_shape() {
        let t = OutputTensor::new(vec![2, 3], vec![0.0; 6]).unwrap();
        assert_eq!(t.rank(), 2);
        assert_eq!(t.last_dim(), 3);
        assert_eq!(t.data().len(), 6);
    }

    #[test]
    fn test_new_rejects_short_buffer() {
        let err = OutputTensor::new(vec![1, 1, 2, 7], vec![0.0; 10]).unwrap_err();
        assert!(matches!(err, EngineError::OutputShape { len: 10, .. }));
    }

    #[test]
    fn test_scalar_has_no_last_dim() {
        let t = OutputTensor::new(vec![], vec![1.0]).unwrap();
        assert_eq!(t.rank(), 0);
        assert_eq!(t.last_dim(), 0);
    }
}
