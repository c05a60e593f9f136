//! Directory layout under `~/.namecast/<app>`.

use std::io;
use std::path::PathBuf;

/// Base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".namecast";

/// Configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Span database filename inside the data directory.
pub const SPANS_DB_FILE: &str = "spans.redb";

/// Provides access to the namecast directory structure.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Application name.
    pub app_name: String,
    /// Directory holding every app's files (`~/.namecast` by default).
    pub base_dir: PathBuf,
}

impl Paths {
    /// Paths rooted at the user's home directory.
    pub fn new(app_name: impl Into<String>) -> io::Result<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not find home directory")
        })?;
        Ok(Self::with_base(app_name, home_dir.join(DEFAULT_BASE_DIR)))
    }

    /// Paths rooted at an explicit base directory.
    pub fn with_base(app_name: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_name: app_name.into(),
            base_dir: base_dir.into(),
        }
    }

    /// `<base>/<app>`.
    pub fn app_dir(&self) -> PathBuf {
        self.base_dir.join(&self.app_name)
    }

    pub fn config_file(&self) -> PathBuf {
        self.app_dir().join(DEFAULT_CONFIG_FILE)
    }

    /// `<base>/<app>/data`.
    pub fn data_dir(&self) -> PathBuf {
        self.app_dir().join("data")
    }

    pub fn ensure_data_dir(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.data_dir())
    }

    pub fn data_path(&self, name: &str) -> PathBuf {
        self.data_dir().join(name)
    }

    /// Database file for persisted placeholder spans.
    pub fn spans_db(&self) -> PathBuf {
        self.data_path(SPANS_DB_FILE)
    }
}
