/// Directory name used under the platform config/cache directories.
pub const APP_DIR_NAME: &str = "FaceDetect";

/// Bundled model directory, relative to the working directory.
pub const DEFAULT_MODEL_DIR: &str = "runtimes/models";

pub const SSD_MODEL_NAME: &str = "face-detection-0204.onnx";
pub const ATSS_MODEL_NAME: &str = "face-detection-0206.onnx";
pub const YOLOV8_FACE_MODEL_NAME: &str = "yolov8n-face.onnx";

/// Confidence cutoff applied to the published detection list.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.6;

/// Score and IoU thresholds used by the anchor-free family's NMS pass.
pub const ANCHOR_FREE_NMS_SCORE: f32 = 0.5;
pub const ANCHOR_FREE_NMS_IOU: f32 = 0.5;

/// Frames queued ahead of a detection worker before `submit` blocks.
pub const DEFAULT_WORKER_CAPACITY: usize = 4;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
