//! File-backed persistence for the committed bias state.
//!
//! The record is a small TOML file replaced atomically (write to a sibling,
//! fsync, rename), so a power cut mid-commit leaves either the old record
//! or the new one, never a torn file.

use crate::error::HwError;
use bias_traits::{BiasState, BiasStore, BoxError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    step_range: u16,
    step_pos: u16,
    bias_actual: u8,
}

impl From<BiasState> for StateFile {
    fn from(s: BiasState) -> Self {
        Self {
            step_range: s.step_range,
            step_pos: s.step_pos,
            bias_actual: s.bias_actual,
        }
    }
}

impl From<StateFile> for BiasState {
    fn from(f: StateFile) -> Self {
        Self {
            step_range: f.step_range,
            step_pos: f.step_pos,
            bias_actual: f.bias_actual,
        }
    }
}

pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}

#[derive(Debug)]
pub struct FileBiasStore {
    path: PathBuf,
}

impl FileBiasStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create parent directories eagerly so the first commit cannot fail on
    /// a missing path.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HwError> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BiasStore for FileBiasStore {
    fn load(&mut self) -> Result<Option<BiasState>, BoxError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path).map_err(HwError::from)?;
        let file: StateFile =
            toml::from_str(&text).map_err(|e| HwError::Format(e.to_string()))?;
        Ok(Some(file.into()))
    }

    fn store(&mut self, state: BiasState) -> Result<(), BoxError> {
        let text = toml::to_string(&StateFile::from(state))
            .map_err(|e| HwError::Format(e.to_string()))?;
        write_atomic(&self.path, text.as_bytes()).map_err(HwError::from)?;
        tracing::debug!(path = %self.path.display(), "bias state persisted");
        Ok(())
    }
}
