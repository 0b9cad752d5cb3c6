use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::tts::Device;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Device requested at startup. `Auto` probes for an accelerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceChoice {
    Auto,
    Fixed(Device),
}

impl FromStr for DeviceChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(DeviceChoice::Auto),
            other => other.parse().map(DeviceChoice::Fixed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub personalities_dir: PathBuf,
    pub static_dir: PathBuf,
    pub model_command: Vec<String>,
    pub device: DeviceChoice,
    pub max_concurrent_generations: usize,
    pub max_upload_bytes: usize,
    pub max_text_chars: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str, default: &str| lookup(var).unwrap_or_else(|| default.to_string());

        let model_command: Vec<String> = get("SPEECH_MODEL_CMD", "speech-synth")
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if model_command.is_empty() {
            return Err(ConfigError::Invalid {
                var: "SPEECH_MODEL_CMD",
                value: String::new(),
                reason: "must name a program".into(),
            });
        }

        let max_concurrent_generations: usize = parse("MAX_CONCURRENT_GENERATIONS", get("MAX_CONCURRENT_GENERATIONS", "1"))?;
        if max_concurrent_generations == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_CONCURRENT_GENERATIONS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            host: get("HOST", "0.0.0.0"),
            port: parse("PORT", get("PORT", "8000"))?,
            personalities_dir: get("PERSONALITIES_DIR", "./personalities").into(),
            static_dir: get("STATIC_DIR", "./static").into(),
            model_command,
            device: parse("DEVICE", get("DEVICE", "auto"))?,
            max_concurrent_generations,
            max_upload_bytes: parse("MAX_UPLOAD_BYTES", get("MAX_UPLOAD_BYTES", "52428800"))?,
            max_text_chars: parse("MAX_TEXT_CHARS", get("MAX_TEXT_CHARS", "10000"))?,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let value = format!("{}:{}", self.host, self.port);
        value.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: "HOST",
            value,
            reason: e.to_string(),
        })
    }
}

fn parse<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: value.clone(),
        reason: e.to_string(),
    })
}
