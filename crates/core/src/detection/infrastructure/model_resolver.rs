use std::path::{Path, PathBuf};

use crate::detection::domain::detector_family::DetectorFamily;
use crate::shared::constants::{APP_DIR_NAME, DEFAULT_MODEL_DIR};

/// Locate the model file for `family`.
///
/// Resolution order:
/// 1. `explicit`, when given (returned even if it does not exist)
/// 2. User cache directory (platform-specific)
/// 3. `bundled_dir`, or `runtimes/models` relative to the working directory
///
/// The bundled path is returned when nothing exists, so that opening the
/// detector reports which file was expected.
pub fn resolve(
    family: DetectorFamily,
    explicit: Option<&Path>,
    bundled_dir: Option<&Path>,
) -> PathBuf {
    resolve_in(
        family,
        explicit,
        model_cache_dir().as_deref(),
        bundled_dir.unwrap_or(Path::new(DEFAULT_MODEL_DIR)),
    )
}

fn resolve_in(
    family: DetectorFamily,
    explicit: Option<&Path>,
    cache_dir: Option<&Path>,
    bundled_dir: &Path,
) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    let name = family.model_name();
    if let Some(cached) = cache_dir.map(|d| d.join(name)).filter(|p| p.is_file()) {
        log::debug!("using cached model {}", cached.display());
        return cached;
    }
    bundled_dir.join(name)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/FaceDetect/models/`
/// - Linux: `$XDG_CACHE_HOME/FaceDetect/models/` or `~/.cache/FaceDetect/models/`
/// - Windows: `%LOCALAPPDATA%/FaceDetect/models/`
pub fn model_cache_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir().map(|d| d.join(APP_DIR_NAME).join("models"))
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir().map(|d| d.join(APP_DIR_NAME).join("models"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_explicit_path_wins() {
        let explicit = Path::new("/opt/models/custom.onnx");
        let path = resolve(DetectorFamily::AnchorFreeDfl, Some(explicit), None);
        assert_eq!(path, explicit);
    }

    #[test]
    fn test_cached_model_preferred_over_bundled() {
        let cache = tempfile::tempdir().unwrap();
        let bundled = tempfile::tempdir().unwrap();
        let family = DetectorFamily::MultiTensorBoxList;
        fs::write(cache.path().join(family.model_name()), b"cached").unwrap();
        fs::write(bundled.path().join(family.model_name()), b"bundled").unwrap();

        let path = resolve_in(family, None, Some(cache.path()), bundled.path());
        assert_eq!(path, cache.path().join("face-detection-0206.onnx"));
    }

    #[test]
    fn test_falls_back_to_bundled_dir() {
        let cache = tempfile::tempdir().unwrap();
        let bundled = tempfile::tempdir().unwrap();

        let path = resolve_in(
            DetectorFamily::FixedSlotSingleTensor,
            None,
            Some(cache.path()),
            bundled.path(),
        );
        assert_eq!(path, bundled.path().join("face-detection-0204.onnx"));
    }

    #[test]
    fn test_without_cache_dir() {
        let path = resolve_in(
            DetectorFamily::AnchorFreeDfl,
            None,
            None,
            Path::new("runtimes/models"),
        );
        assert_eq!(path, Path::new("runtimes/models/yolov8n-face.onnx"));
    }

    #[test]
    fn test_cache_dir_is_namespaced() {
        if let Some(dir) = model_cache_dir() {
            assert!(dir.ends_with("FaceDetect/models"));
        }
    }
}
