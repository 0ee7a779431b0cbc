use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Daemon configuration, loaded from a TOML file at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Icecast status endpoint (`status-json.xsl`).
    pub icecast_url: String,
    /// Azuracast now-playing endpoint.
    pub azuracast_url: String,
    /// Selects which of the two endpoints is polled.
    pub use_icecast: bool,
    /// Where the rendered slide is written. The extension picks the
    /// encoding; `.jpg`/`.jpeg` is flattened to opaque RGB.
    pub output_image: PathBuf,
    /// TrueType font used for both text lines.
    pub font: PathBuf,
    /// Station logo, used for the bar block and as artwork fallback.
    #[serde(default = "default_logo")]
    pub logo: PathBuf,
    /// Enables the Last.fm artwork lookup for the Icecast backend.
    #[serde(default)]
    pub lastfm_api_key: String,
}

fn default_logo() -> PathBuf {
    PathBuf::from("logo.png")
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}
