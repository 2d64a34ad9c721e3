//! Offline replays of recorded debugging sessions.
//!
//! A recording is a JSON [`Script`] of event batches and target metadata,
//! optionally paired with the outcome of launching the user program.
use std::path::{Path, PathBuf};

use eyre::WrapErr;
use protocol::testing::Script;
use serde::Deserialize;
use tracer::{LaunchFailure, LaunchResult, TracerConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct Recording {
    #[serde(flatten)]
    pub script: Script,

    /// Outcome reported by the launcher, a successful launch when absent
    #[serde(default)]
    pub launch: Option<RecordedLaunch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordedLaunch {
    Succeeded,
    Failed {
        message: String,
        line: Option<u32>,
        column: Option<u32>,
    },
}

impl RecordedLaunch {
    pub fn into_result(self) -> LaunchResult {
        match self {
            RecordedLaunch::Succeeded => LaunchResult::succeeded(),
            RecordedLaunch::Failed {
                message,
                line,
                column,
            } => LaunchResult::failed(LaunchFailure {
                message,
                line,
                column,
            }),
        }
    }
}

pub fn load_recording(path: impl AsRef<Path>) -> eyre::Result<Recording> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading recording {}", path.display()))?;
    serde_json::from_str(&contents)
        .wrap_err_with(|| format!("parsing recording {}", path.display()))
}

/// User-wide configuration file, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("steptrace").join("tracer.toml"))
}

/// Load the explicit configuration file, falling back to the user-wide one
/// and then to the built-in defaults.
pub fn resolve_config(explicit: Option<&Path>) -> eyre::Result<TracerConfig> {
    if let Some(path) = explicit {
        return TracerConfig::from_path(path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => {
            tracing::debug!(path = %path.display(), "loading user configuration");
            TracerConfig::from_path(&path)
        }
        _ => Ok(TracerConfig::default()),
    }
}
