use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::detector_family::DetectorFamily;
use super::device::Device;
use super::nms_filter::NmsParams;
use crate::shared::constants::{APP_DIR_NAME, DEFAULT_MIN_CONFIDENCE};

/// Whether the detector runs an NMS pass after decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum NmsPolicy {
    /// Use the family's own default (only the anchor-free family runs NMS).
    #[default]
    Auto,
    Off,
    On {
        score_threshold: f32,
        iou_threshold: f32,
        #[serde(default)]
        top_k: usize,
    },
}

impl NmsPolicy {
    pub fn resolve(&self, family: DetectorFamily) -> Option<NmsParams> {
        match *self {
            NmsPolicy::Auto => family.default_nms(),
            NmsPolicy::Off => None,
            NmsPolicy::On {
                score_threshold,
                iou_threshold,
                top_k,
            } => Some(NmsParams {
                score_threshold,
                iou_threshold,
                top_k,
            }),
        }
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted detector configuration.
///
/// `device` stays a string so that an unknown selector is reported when the
/// detector is opened rather than when the file is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub family: DetectorFamily,
    pub model_path: Option<PathBuf>,
    pub device: String,
    pub min_confidence: f32,
    pub nms: NmsPolicy,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            family: DetectorFamily::FixedSlotSingleTensor,
            model_path: None,
            device: Device::Cpu.to_string(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            nms: NmsPolicy::Auto,
        }
    }
}

impl DetectorSettings {
    /// `<config dir>/FaceDetect/settings.json`
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Settings from the user config file, or defaults when it is missing
    /// or unreadable.
    pub fn load_default() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!("ignoring {}: {e}", path.display());
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = DetectorSettings::default();
        assert_eq!(s.device, "CPU");
        assert_eq!(s.min_confidence, 0.6);
        assert_eq!(s.nms, NmsPolicy::Auto);
        assert!(s.nms.resolve(s.family).is_none());
    }

    #[test]
    fn test_auto_policy_follows_family() {
        assert!(NmsPolicy::Auto
            .resolve(DetectorFamily::MultiTensorBoxList)
            .is_none());
        assert_eq!(
            NmsPolicy::Auto.resolve(DetectorFamily::AnchorFreeDfl),
            Some(NmsParams::new(0.5, 0.5))
        );
    }

    #[test]
    fn test_explicit_policies_override_family() {
        assert!(NmsPolicy::Off
            .resolve(DetectorFamily::AnchorFreeDfl)
            .is_none());
        let on = NmsPolicy::On {
            score_threshold: 0.3,
            iou_threshold: 0.4,
            top_k: 10,
        };
        let params = on.resolve(DetectorFamily::FixedSlotSingleTensor).unwrap();
        assert_eq!(params.top_k, 10);
        assert_eq!(params.iou_threshold, 0.4);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = DetectorSettings {
            family: DetectorFamily::AnchorFreeDfl,
            model_path: Some(PathBuf::from("/models/face.onnx")),
            device: "GPU.1".into(),
            min_confidence: 0.75,
            nms: NmsPolicy::On {
                score_threshold: 0.4,
                iou_threshold: 0.45,
                top_k: 0,
            },
        };
        settings.save(&path).unwrap();
        assert_eq!(DetectorSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"family": "atss", "nms": {"mode": "off"}}"#).unwrap();

        let s = DetectorSettings::load(&path).unwrap();
        assert_eq!(s.family, DetectorFamily::MultiTensorBoxList);
        assert_eq!(s.nms, NmsPolicy::Off);
        assert_eq!(s.device, "CPU");
        assert_eq!(s.min_confidence, 0.6);
    }

    #[test]
    fn test_on_policy_top_k_defaults_to_zero() {
        let p: NmsPolicy =
            serde_json::from_str(r#"{"mode": "on", "score_threshold": 0.2, "iou_threshold": 0.6}"#)
                .unwrap();
        assert_eq!(
            p,
            NmsPolicy::On {
                score_threshold: 0.2,
                iou_threshold: 0.6,
                top_k: 0
            }
        );
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            DetectorSettings::load(&missing),
            Err(SettingsError::Io(_))
        ));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            DetectorSettings::load(&broken),
            Err(SettingsError::Json(_))
        ));
    }
}
