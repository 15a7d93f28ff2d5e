use std::env;
use std::path::PathBuf;

pub const ADDR_VAR: &str = "ALGOCANVAS_ADDR";
pub const DATA_DIR_VAR: &str = "ALGOCANVAS_DATA_DIR";

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DATA_DIR: &str = "saved";

/// Settings for the web server and the saved-visualization store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub addr: String,
    /// Directory saved visualizations are written to
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl ServerConfig {
    /// Reads the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            addr: lookup(ADDR_VAR)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.addr),
            data_dir: lookup(DATA_DIR_VAR)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        }
    }

    /// Applies explicit overrides, e.g. from command-line flags.
    pub fn with_overrides(mut self, addr: Option<String>, data_dir: Option<PathBuf>) -> Self {
        if let Some(addr) = addr {
            self.addr = addr;
        }
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }
}
