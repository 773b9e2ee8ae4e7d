//! Face detection over pluggable inference backends.
//!
//! The `detection::domain` layer holds the detector contract, preprocessing,
//! the per-family output decoders and NMS. `detection::infrastructure` wires
//! those to ONNX Runtime and provides the worker used by multi-threaded
//! callers.

pub mod shared {
    pub mod bounding_box;
    pub mod constants;
    pub mod frame;
}

pub mod detection {
    pub mod domain {
        pub mod anchor_free_decoder;
        pub mod box_list_decoder;
        pub mod detection;
        pub mod detector_family;
        pub mod detector_settings;
        pub mod device;
        pub mod face_detector;
        pub mod fixed_slot_decoder;
        pub mod image_preprocessor;
        pub mod inference_engine;
        pub mod model_face_detector;
        pub mod nms_filter;
        pub mod output_decoder;
        pub mod output_tensor;
    }
    pub mod infrastructure;
}
