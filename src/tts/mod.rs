pub mod audio;
pub mod command;
pub mod model;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::sync::Semaphore;

use crate::error::AppError;

pub use command::CommandModel;
pub use model::{Device, SpeechModel};

/// The audio sample a generation is conditioned on.
///
/// Uploaded samples live in a temp file that is removed when this is dropped.
#[derive(Debug)]
pub enum VoiceRef {
    Stored(PathBuf),
    Upload(NamedTempFile),
}

impl VoiceRef {
    pub fn from_upload(bytes: &[u8]) -> Result<Self, AppError> {
        let mut file = NamedTempFile::with_suffix(".wav")?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(VoiceRef::Upload(file))
    }

    pub fn path(&self) -> &Path {
        match self {
            VoiceRef::Stored(path) => path,
            VoiceRef::Upload(file) => file.path(),
        }
    }
}

/// Runs the speech model off the async runtime with bounded concurrency.
pub struct TtsService {
    model: Arc<dyn SpeechModel>,
    permits: Arc<Semaphore>,
}

impl TtsService {
    pub fn new(model: Arc<dyn SpeechModel>, max_concurrent: usize) -> Self {
        Self {
            model,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn device(&self) -> Device {
        self.model.device()
    }

    /// Synthesize `text` and return it as WAV bytes.
    ///
    /// The blocking task owns `voice` and the permit, so an abandoned request
    /// still finishes, releases its slot and removes its temp file.
    pub async fn speak(&self, text: String, voice: VoiceRef) -> Result<Vec<u8>, AppError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| AppError::ShuttingDown)?;

        let model = Arc::clone(&self.model);
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let started = std::time::Instant::now();
            let waveform = model.generate(&text, voice.path())?;
            tracing::info!(
                chars = text.chars().count(),
                samples = waveform.samples.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Generated speech"
            );
            audio::samples_to_wav(&waveform.samples, waveform.sample_rate)
        })
        .await
        .map_err(|e| AppError::TtsError(format!("Synthesis task failed: {}", e)))?
    }

    /// Refuse new generations. Work already holding a permit completes.
    pub fn shutdown(&self) {
        tracing::info!("Closing speech generation queue");
        self.permits.close();
    }

    pub fn is_shut_down(&self) -> bool {
        self.permits.is_closed()
    }
}
