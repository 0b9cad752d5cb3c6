use std::fmt;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;

use serde::Serialize;

use crate::error::AppError;

/// Raw model output: mono samples in [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// A pretrained voice-cloning speech model.
///
/// Implementations are called from blocking worker threads, possibly from
/// several at once, so they must be `Send + Sync`.
pub trait SpeechModel: Send + Sync {
    /// Synthesize `text` in the timbre of the audio sample at `voice_ref`.
    fn generate(&self, text: &str, voice_ref: &Path) -> Result<Waveform, AppError>;

    fn device(&self) -> Device;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
}

impl Device {
    /// Accelerator if one is visible, otherwise the CPU.
    pub fn detect() -> Self {
        if cuda_available() {
            Device::Cuda
        } else {
            Device::Cpu
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" | "gpu" => Ok(Device::Cuda),
            other => Err(format!("unknown device '{}' (expected cpu or cuda)", other)),
        }
    }
}

fn cuda_available() -> bool {
    match Command::new("nvidia-smi").arg("-L").output() {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout)
                .lines()
                .any(|line| line.starts_with("GPU "))
        }
        _ => false,
    }
}
