use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inference device selector.
///
/// Names follow the engine's device strings (`CPU`, `GPU`, `GPU.0`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    #[default]
    #[serde(rename = "CPU")]
    Cpu,
    #[serde(rename = "GPU")]
    Gpu,
    #[serde(rename = "GPU.0")]
    Gpu0,
    #[serde(rename = "GPU.1")]
    Gpu1,
    #[serde(rename = "GPU.2")]
    Gpu2,
    #[serde(rename = "NPU")]
    Npu,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported device '{0}' (expected one of CPU, GPU, GPU.0, GPU.1, GPU.2, NPU)")]
pub struct ParseDeviceError(pub String);

impl Device {
    pub const ALL: &[Device] = &[
        Device::Cpu,
        Device::Gpu,
        Device::Gpu0,
        Device::Gpu1,
        Device::Gpu2,
        Device::Npu,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Device::Cpu => "CPU",
            Device::Gpu => "GPU",
            Device::Gpu0 => "GPU.0",
            Device::Gpu1 => "GPU.1",
            Device::Gpu2 => "GPU.2",
            Device::Npu => "NPU",
        }
    }

    /// Adapter index for GPU selectors; plain `GPU` means the first adapter.
    pub fn gpu_index(&self) -> Option<u32> {
        match self {
            Device::Gpu | Device::Gpu0 => Some(0),
            Device::Gpu1 => Some(1),
            Device::Gpu2 => Some(2),
            Device::Cpu | Device::Npu => None,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Device {
    type Err = ParseDeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Device::ALL
            .iter()
            .copied()
            .find(|d| d.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseDeviceError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("CPU", Device::Cpu)]
    #[case("cpu", Device::Cpu)]
    #[case("GPU", Device::Gpu)]
    #[case("gpu.1", Device::Gpu1)]
    #[case(" NPU ", Device::Npu)]
    fn test_parse_known_devices(#[case] input: &str, #[case] expected: Device) {
        assert_eq!(input.parse::<Device>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("TPU")]
    #[case("GPU.3")]
    fn test_parse_unknown_device_fails(#[case] input: &str) {
        let err = input.parse::<Device>().unwrap_err();
        assert_eq!(err, ParseDeviceError(input.to_string()));
    }

    #[test]
    fn test_names_round_trip() {
        for d in Device::ALL {
            assert_eq!(d.name().parse::<Device>().unwrap(), *d);
        }
    }

    #[test]
    fn test_gpu_index() {
        assert_eq!(Device::Gpu.gpu_index(), Some(0));
        assert_eq!(Device::Gpu2.gpu_index(), Some(2));
        assert_eq!(Device::Cpu.gpu_index(), None);
        assert_eq!(Device::Npu.gpu_index(), None);
    }

    #[test]
    fn test_serde_uses_engine_names() {
        assert_eq!(serde_json::to_string(&Device::Gpu1).unwrap(), "\"GPU.1\"");
        let d: Device = serde_json::from_str("\"NPU\"").unwrap();
        assert_eq!(d, Device::Npu);
    }
}
