use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;

use crate::error::AppError;
use crate::tts::audio;
use crate::tts::model::{Device, SpeechModel, Waveform};

/// Drives an external synthesizer program.
///
/// The program is invoked as
/// `<program> [args..] --device <dev> --voice <ref> --output <out.wav> -- <text>`
/// and must write a WAV file to `<out.wav>` before exiting successfully.
pub struct CommandModel {
    program: String,
    args: Vec<String>,
    device: Device,
}

impl CommandModel {
    pub fn new(command: &[String], device: Device) -> Result<Self, AppError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| AppError::TtsError("Speech model command is empty".to_string()))?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            device,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl SpeechModel for CommandModel {
    fn generate(&self, text: &str, voice_ref: &Path) -> Result<Waveform, AppError> {
        let output_file = NamedTempFile::with_suffix(".wav")?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--device")
            .arg(self.device.as_str())
            .arg("--voice")
            .arg(voice_ref)
            .arg("--output")
            .arg(output_file.path())
            .arg("--")
            .arg(text)
            .output()
            .map_err(|e| {
                AppError::TtsError(format!(
                    "Failed to run speech model '{}': {}",
                    self.program, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::TtsError(format!(
                "Speech model exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let waveform = audio::read_wav(output_file.path())?;
        tracing::debug!(
            samples = waveform.samples.len(),
            sample_rate = waveform.sample_rate,
            "Speech model produced audio"
        );

        Ok(waveform)
    }

    fn device(&self) -> Device {
        self.device
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into(), "synth".into()]
    }

    fn write_voice(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("voice.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for s in [0i16, 8192, -8192] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn rejects_empty_command() {
        assert!(CommandModel::new(&[], Device::Cpu).is_err());
    }

    #[test]
    fn reads_output_written_by_program() {
        let dir = tempfile::tempdir().unwrap();
        let voice = write_voice(dir.path());
        // Copy the voice reference to the output path.
        let script = r#"
            while [ $# -gt 0 ]; do
                case "$1" in
                    --voice) voice="$2"; shift 2 ;;
                    --output) out="$2"; shift 2 ;;
                    --) shift; break ;;
                    *) shift ;;
                esac
            done
            [ "$1" = "hello there" ] || exit 9
            cp "$voice" "$out"
        "#;
        let model = CommandModel::new(&sh(script), Device::Cpu).unwrap();

        let waveform = model.generate("hello there", &voice).unwrap();
        assert_eq!(waveform.sample_rate, 22050);
        assert_eq!(waveform.samples, vec![0.0, 0.25, -0.25]);
    }

    #[test]
    fn passes_device_flag() {
        let dir = tempfile::tempdir().unwrap();
        let voice = write_voice(dir.path());
        let script = r#"
            while [ $# -gt 0 ]; do
                case "$1" in
                    --device) device="$2"; shift 2 ;;
                    --voice) voice="$2"; shift 2 ;;
                    --output) out="$2"; shift 2 ;;
                    *) shift ;;
                esac
            done
            [ "$device" = "cuda" ] || exit 4
            cp "$voice" "$out"
        "#;
        let model = CommandModel::new(&sh(script), Device::Cuda).unwrap();
        assert!(model.generate("x", &voice).is_ok());
        assert_eq!(model.device(), Device::Cuda);
    }

    #[test]
    fn surfaces_stderr_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let voice = write_voice(dir.path());
        let model = CommandModel::new(&sh("echo boom >&2; exit 3"), Device::Cpu).unwrap();

        let err = model.generate("hi", &voice).unwrap_err();
        assert!(matches!(&err, AppError::TtsError(msg) if msg.contains("boom")));
    }

    #[test]
    fn missing_program_is_tts_error() {
        let dir = tempfile::tempdir().unwrap();
        let voice = write_voice(dir.path());
        let command = vec!["definitely-not-a-speech-synth-binary".to_string()];
        let model = CommandModel::new(&command, Device::Cpu).unwrap();

        assert!(matches!(
            model.generate("hi", &voice),
            Err(AppError::TtsError(_))
        ));
    }
}
