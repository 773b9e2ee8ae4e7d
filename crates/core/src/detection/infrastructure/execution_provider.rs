//! Device selector to ONNX Runtime execution provider mapping.
//!
//! CPU needs no registration. macOS routes every accelerator selector to
//! CoreML; Windows routes GPU selectors to DirectML adapters and has no NPU
//! provider. Other platforms only run on the CPU.

use ort::execution_providers::ExecutionProviderDispatch;

use crate::detection::domain::device::Device;
use crate::detection::domain::inference_engine::EngineError;

/// Execution providers to register for `device`, most preferred first.
///
/// An empty list means the default CPU provider.
pub fn providers_for(device: Device) -> Result<Vec<ExecutionProviderDispatch>, EngineError> {
    if device == Device::Cpu {
        return Ok(Vec::new());
    }
    accelerator_for(device)
        .map(|ep| vec![ep.error_on_failure()])
        .ok_or_else(|| EngineError::DeviceUnavailable(device.to_string()))
}

/// Whether `device` can be used on this host without building a session.
pub fn is_available(device: Device) -> bool {
    if device == Device::Cpu {
        return true;
    }
    probe(device).unwrap_or_else(|e| {
        log::debug!("probing {device} failed: {e}");
        false
    })
}

#[cfg(target_os = "macos")]
fn accelerator_for(_device: Device) -> Option<ExecutionProviderDispatch> {
    Some(ort::execution_providers::CoreMLExecutionProvider::default().build())
}

#[cfg(target_os = "macos")]
fn probe(_device: Device) -> ort::Result<bool> {
    use ort::execution_providers::ExecutionProvider;
    ort::execution_providers::CoreMLExecutionProvider::default().is_available()
}

#[cfg(target_os = "windows")]
fn accelerator_for(device: Device) -> Option<ExecutionProviderDispatch> {
    let index = device.gpu_index()?;
    Some(
        ort::execution_providers::DirectMLExecutionProvider::default()
            .with_device_id(index as i32)
            .build(),
    )
}

#[cfg(target_os = "windows")]
fn probe(device: Device) -> ort::Result<bool> {
    use ort::execution_providers::ExecutionProvider;
    if device.gpu_index().is_none() {
        return Ok(false);
    }
    ort::execution_providers::DirectMLExecutionProvider::default().is_available()
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn accelerator_for(_device: Device) -> Option<ExecutionProviderDispatch> {
    None
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn probe(_device: Device) -> ort::Result<bool> {
    Ok(false)
}
