use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

const SAMPLE_EXTENSION: &str = "wav";

lazy_static! {
    // Letters (with combining marks), digits, '_', '-', '.', space;
    // no leading dot; no separators.
    static ref NAME_REGEX: Regex =
        Regex::new(r"^[\p{L}\p{N}_\- ][\p{L}\p{M}\p{N}_\-. ]{0,127}$").unwrap();
}

/// Flat directory of named voice samples, one `<name>.wav` per personality.
pub struct PersonalityStore {
    dir: PathBuf,
}

impl PersonalityStore {
    /// Open the store, creating the directory if needed.
    pub fn open(dir: PathBuf) -> Result<Self, AppError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of stored samples. Files whose stem is not a valid name are
    /// skipped, so every listed name resolves.
    pub fn list(&self) -> Result<Vec<String>, AppError> {
        let mut names = Vec::new();

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();

            if !path.is_file() {
                continue;
            }
            if path.extension().map(|e| e == SAMPLE_EXTENSION).unwrap_or(false) {
                match path.file_stem().and_then(|s| s.to_str()) {
                    Some(stem) if is_valid_name(stem) => names.push(stem.to_string()),
                    _ => tracing::debug!("Skipping sample with unusable name: {}", path.display()),
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Store a sample under `name`, replacing any existing one.
    pub fn add(&self, name: &str, audio: &[u8]) -> Result<(), AppError> {
        if !is_valid_name(name) {
            return Err(AppError::InvalidName(name.to_string()));
        }

        let path = self.sample_path(name);
        std::fs::write(&path, audio)?;
        tracing::info!("Stored personality '{}' ({} bytes)", name, audio.len());
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if !is_valid_name(name) {
            return None;
        }
        let path = self.sample_path(name);
        path.is_file().then_some(path)
    }

    fn sample_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, SAMPLE_EXTENSION))
    }
}

pub fn is_valid_name(name: &str) -> bool {
    NAME_REGEX.is_match(name)
}
