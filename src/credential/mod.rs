use anyhow::{bail, Context, Result};
use fs_err as fs;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Fixed storage key for the Gemini API key.
pub const CREDENTIAL_KEY: &str = "gemini_api_key";

pub const MIN_KEY_LEN: usize = 10;

/// Where credentials live between runs.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// JSON object on disk; a missing file reads as empty.
pub struct FileKvStore {
    path: PathBuf,
}

impl FileKvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&text)
            .with_context(|| format!("corrupt storage file {}", self.path.display()))
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    /// Rewrites the whole file through a sibling temp file. A corrupt file is
    /// replaced rather than blocking the write.
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut all = self.read_all().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "discarding unreadable storage file");
            BTreeMap::new()
        });
        all.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&all)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Holds the single API key. Accepts any string; see [`validate_key_input`].
pub struct CredentialStore {
    cached: Mutex<String>,
    backing: Box<dyn KvStore>,
}

impl CredentialStore {
    pub fn new(backing: Box<dyn KvStore>) -> Self {
        Self { cached: Mutex::new(String::new()), backing }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryKvStore::default()))
    }

    pub fn set(&self, secret: &str) -> Result<()> {
        *self.cached.lock() = secret.to_string();
        self.backing.set(CREDENTIAL_KEY, secret)
    }

    /// Memory first, then durable storage; empty when neither has a value.
    pub fn get(&self) -> String {
        let mut cached = self.cached.lock();
        if cached.is_empty() {
            match self.backing.get(CREDENTIAL_KEY) {
                Ok(Some(v)) => *cached = v,
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "could not read stored API key"),
            }
        }
        cached.clone()
    }

    pub fn has(&self) -> bool {
        !self.get().is_empty()
    }
}

/// Superficial check applied before `set`; the provider does the real validation.
pub fn validate_key_input(input: &str) -> Result<String> {
    let key = input.trim();
    if key.len() < MIN_KEY_LEN {
        bail!("Please provide a valid Gemini API key.");
    }
    Ok(key.to_string())
}

/// Masked form for status output.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
