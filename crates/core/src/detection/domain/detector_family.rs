use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::anchor_free_decoder::AnchorFreeDecoder;
use super::box_list_decoder::BoxListDecoder;
use super::fixed_slot_decoder::FixedSlotDecoder;
use super::image_preprocessor::{ChannelOrder, ElementKind};
use super::inference_engine::InputGeometry;
use super::nms_filter::NmsParams;
use super::output_decoder::OutputDecoder;
use crate::shared::constants::{
    ANCHOR_FREE_NMS_IOU, ANCHOR_FREE_NMS_SCORE, ATSS_MODEL_NAME, SSD_MODEL_NAME,
    YOLOV8_FACE_MODEL_NAME,
};

/// Output layout a detection model follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectorFamily {
    /// MobileNetV2 + SSD: one `[1, 1, N, 7]` tensor, normalized corners.
    #[serde(rename = "ssd")]
    FixedSlotSingleTensor,
    /// ResNet152 + ATSS: `[boxes, 5]` lists in model-input pixels.
    #[serde(rename = "atss")]
    MultiTensorBoxList,
    /// YOLOv8-face: anchor-free DFL feature maps with keypoints.
    #[serde(rename = "yolov8-face")]
    AnchorFreeDfl,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown detector family '{0}' (expected ssd, atss or yolov8-face)")]
pub struct ParseFamilyError(pub String);

impl DetectorFamily {
    pub const ALL: &[DetectorFamily] = &[
        DetectorFamily::FixedSlotSingleTensor,
        DetectorFamily::MultiTensorBoxList,
        DetectorFamily::AnchorFreeDfl,
    ];

    /// Short identifier used in settings files and on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            DetectorFamily::FixedSlotSingleTensor => "ssd",
            DetectorFamily::MultiTensorBoxList => "atss",
            DetectorFamily::AnchorFreeDfl => "yolov8-face",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DetectorFamily::FixedSlotSingleTensor => "MobileNetv2AndSSD",
            DetectorFamily::MultiTensorBoxList => "ResNet152AndATSS",
            DetectorFamily::AnchorFreeDfl => "Yolov8nFace",
        }
    }

    /// Default model file name for this family.
    pub fn model_name(&self) -> &'static str {
        match self {
            DetectorFamily::FixedSlotSingleTensor => SSD_MODEL_NAME,
            DetectorFamily::MultiTensorBoxList => ATSS_MODEL_NAME,
            DetectorFamily::AnchorFreeDfl => YOLOV8_FACE_MODEL_NAME,
        }
    }

    pub fn element_kind(&self) -> ElementKind {
        match self {
            DetectorFamily::FixedSlotSingleTensor | DetectorFamily::MultiTensorBoxList => {
                ElementKind::U8
            }
            DetectorFamily::AnchorFreeDfl => ElementKind::F32,
        }
    }

    pub fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Bgr
    }

    /// Input size used when the model declares a dynamic input shape.
    pub fn default_geometry(&self) -> InputGeometry {
        match self {
            DetectorFamily::FixedSlotSingleTensor => InputGeometry::square(448),
            DetectorFamily::MultiTensorBoxList => InputGeometry::square(640),
            DetectorFamily::AnchorFreeDfl => InputGeometry::square(640),
        }
    }

    /// NMS pass the family needs after decoding, if any.
    ///
    /// SSD and ATSS heads suppress duplicates inside the model.
    pub fn default_nms(&self) -> Option<NmsParams> {
        match self {
            DetectorFamily::AnchorFreeDfl => {
                Some(NmsParams::new(ANCHOR_FREE_NMS_SCORE, ANCHOR_FREE_NMS_IOU))
            }
            _ => None,
        }
    }

    pub fn decoder(&self) -> Box<dyn OutputDecoder> {
        match self {
            DetectorFamily::FixedSlotSingleTensor => Box::new(FixedSlotDecoder::new()),
            DetectorFamily::MultiTensorBoxList => Box::new(BoxListDecoder::new()),
            DetectorFamily::AnchorFreeDfl => Box::new(AnchorFreeDecoder::default()),
        }
    }
}

impl fmt::Display for DetectorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for DetectorFamily {
    type Err = ParseFamilyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|f| {
                f.key().eq_ignore_ascii_case(needle) || f.display_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| ParseFamilyError(s.to_string()))
    }
}
