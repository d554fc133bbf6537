use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// User-tunable settings read from the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Idle poll interval in milliseconds; the status line refreshes at
    /// this cadence even without keystrokes.
    pub tick_rate_ms: u64,
    /// Completed rows kept visible above the current line.
    pub num_previous_lines: usize,
    /// Show the last raw key code at the end of the status line.
    pub show_key_code: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate_ms: 1000,
            num_previous_lines: 3,
            show_key_code: true,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "retype") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("retype_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing or corrupt config silently falls back to defaults.
    fn load(&self) -> Config {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|body| serde_json::from_str(&body).ok())
            .unwrap_or_default()
    }

    fn save(&self, cfg: &Config) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(cfg)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, body)
    }
}
