//! The detector facade: preprocess, run the engine, decode, suppress, filter.

use super::detection::Detection;
use super::detector_family::DetectorFamily;
use super::detector_settings::DetectorSettings;
use super::face_detector::{DetectError, FaceDetector};
use super::image_preprocessor;
use super::inference_engine::{InferenceEngine, InputGeometry};
use super::nms_filter::NmsParams;
use super::output_decoder::{DecodeContext, OutputDecoder};
use crate::shared::frame::Frame;

/// A face detector built from one model family and one inference engine.
///
/// The input geometry is read from the engine once and cached. After
/// [`dispose`](Self::dispose) every call to `detect` returns an empty list.
pub struct ModelFaceDetector {
    family: DetectorFamily,
    engine: Option<Box<dyn InferenceEngine>>,
    geometry: InputGeometry,
    decoder: Box<dyn OutputDecoder>,
    nms: Option<NmsParams>,
    min_confidence: f32,
}

impl ModelFaceDetector {
    pub fn new(
        family: DetectorFamily,
        engine: Box<dyn InferenceEngine>,
        settings: &DetectorSettings,
    ) -> Self {
        let mut geometry = engine.input_geometry();
        if geometry.is_empty() {
            let fallback = family.default_geometry();
            log::warn!(
                "{family} model has a dynamic input shape, using {}x{}",
                fallback.width,
                fallback.height
            );
            geometry = fallback;
        }

        Self {
            family,
            engine: Some(engine),
            geometry,
            decoder: family.decoder(),
            nms: settings.nms.resolve(family),
            min_confidence: settings.min_confidence,
        }
    }

    pub fn family(&self) -> DetectorFamily {
        self.family
    }

    pub fn input_geometry(&self) -> InputGeometry {
        self.geometry
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    pub fn is_disposed(&self) -> bool {
        self.engine.is_none()
    }

    /// Release the inference engine. Further calls are no-ops.
    pub fn dispose(&mut self) {
        if self.engine.take().is_some() {
            log::debug!("{} detector disposed", self.family);
        }
    }
}

impl FaceDetector for ModelFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectError> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        let Some(engine) = self.engine.as_mut() else {
            return Ok(Vec::new());
        };

        let input = image_preprocessor::to_tensor(
            frame,
            self.geometry,
            self.family.element_kind(),
            self.family.channel_order(),
        )?;
        let outputs = engine.run(input)?;

        let ctx = DecodeContext::new(frame.width(), frame.height(), self.geometry);
        let candidates = self.decoder.decode(&outputs, &ctx);
        drop(outputs);

        let total = candidates.len();
        let survivors = match &self.nms {
            Some(params) => params.apply(candidates),
            None => candidates,
        };
        let kept = Detection::filter_confident(survivors, self.min_confidence);

        log::debug!(
            "frame {}: {total} candidates, {} kept",
            frame.index(),
            kept.len()
        );
        Ok(kept)
    }
}
