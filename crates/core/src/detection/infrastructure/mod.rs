pub mod detection_worker;
pub mod execution_provider;
pub mod model_resolver;
pub mod ort_face_detector;
pub mod ort_inference_engine;
