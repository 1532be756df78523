use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persistent defaults loaded from `~/.config/urlsmith/config.toml`.
/// Every field can be overridden by its CLI flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlsmithConfig {
    /// Query pair separator, a single character.
    pub query_separator: String,
    /// Suppress `urlsmith note:` diagnostics by default.
    #[serde(default)]
    pub quiet: bool,
    /// Fill in known scheme default ports on output by default.
    #[serde(default)]
    pub default_port: bool,
    /// Show hosts in punycode form by default.
    #[serde(default)]
    pub punycode: bool,
}

impl Default for UrlsmithConfig {
    fn default() -> Self {
        Self {
            query_separator: "&".to_string(),
            quiet: false,
            default_port: false,
            punycode: false,
        }
    }
}

impl UrlsmithConfig {
    /// The configured separator as a char; errors unless exactly one.
    pub fn separator(&self) -> Result<char> {
        let mut chars = self.query_separator.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => anyhow::bail!(
                "query_separator must be a single character, got {:?}",
                self.query_separator
            ),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("urlsmith")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<UrlsmithConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = UrlsmithConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: UrlsmithConfig = toml::from_str(&data)?;
    cfg.separator()?;
    Ok(cfg)
}
