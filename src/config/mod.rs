use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::{Args, ProviderKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderKind,
    pub endpoint: String,
    pub model: String,
    pub out_dir: String,
    /// Durable credential storage; `None` means the per-user config dir.
    pub storage_path: Option<String>,
    pub persist_credential: bool,
    /// No timeout unless set; the transport default applies.
    pub timeout_secs: Option<u64>,
    pub save_request: bool,
    pub save_response: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: "gemini-1.5-pro".into(),
            out_dir: ".".into(),
            storage_path: None,
            persist_credential: true,
            timeout_secs: None,
            save_request: false,
            save_response: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// File config (if any) with CLI flags layered on top.
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut cfg = match &args.config {
            Some(p) => Self::load(Path::new(p))?,
            None => Self::default(),
        };
        if let Some(p) = args.provider.clone() {
            cfg.provider = p;
        }
        if let Some(m) = &args.model {
            cfg.model = m.clone();
        }
        if let Some(e) = &args.endpoint {
            cfg.endpoint = e.clone();
        }
        if let Some(o) = &args.out_dir {
            cfg.out_dir = o.clone();
        }
        if args.timeout_secs.is_some() {
            cfg.timeout_secs = args.timeout_secs;
        }
        if args.no_persist {
            cfg.persist_credential = false;
        }
        cfg.save_request |= args.save_request;
        cfg.save_response |= args.save_response;
        Ok(cfg)
    }

    pub fn storage_file(&self) -> Result<PathBuf> {
        if let Some(p) = &self.storage_path {
            return Ok(PathBuf::from(p));
        }
        let dir = dirs::config_dir().context("could not determine config directory")?;
        Ok(dir.join("vibe_sitegen").join("storage.json"))
    }
}
