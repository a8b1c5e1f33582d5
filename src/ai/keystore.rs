//! Persisted credential store: a keyed list of API keys in a JSON file,
//! loaded at startup and rewritten on every mutation

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct KeyFile {
    keys: Vec<String>,
}

/// JSON-file-backed list of AI credentials
#[derive(Debug)]
pub struct KeyStore {
    path: PathBuf,
    keys: Vec<String>,
}

impl KeyStore {
    /// Loads the store from disk; a missing file yields an empty store
    pub fn load(path: &Path) -> Result<Self> {
        let keys = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let file: KeyFile = serde_json::from_str(&content)?;
            file.keys
        } else {
            Vec::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            keys,
        })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Adds a key if not already present; returns whether it was added
    pub fn add(&mut self, key: &str) -> Result<bool> {
        if key.is_empty() || self.keys.iter().any(|k| k == key) {
            return Ok(false);
        }
        self.keys.push(key.to_string());
        self.save()?;
        Ok(true)
    }

    /// Inserts a key at the front of the rotation order
    pub fn add_primary(&mut self, key: &str) -> Result<bool> {
        if key.is_empty() || self.keys.iter().any(|k| k == key) {
            return Ok(false);
        }
        self.keys.insert(0, key.to_string());
        self.save()?;
        Ok(true)
    }

    /// Removes a key; returns whether it was present
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        let before = self.keys.len();
        self.keys.retain(|k| k != key);
        if self.keys.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Replaces the key list wholesale (used after validation drops keys)
    pub fn replace(&mut self, keys: Vec<String>) -> Result<()> {
        self.keys = keys;
        self.save()
    }

    fn save(&self) -> Result<()> {
        let file = KeyFile {
            keys: self.keys.clone(),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}
