//! Content-addressed scan cache
//!
//! Caches oracle answers by the SHA-256 of the file content. ScanCode takes
//! seconds per file; across CI runs most files are unchanged, so only new
//! content reaches the wrapped oracle.

use super::{ScanOracle, ScanResult};
use crate::AuditResult;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Cache file name in the audited root
pub const CACHE_FILE_NAME: &str = ".license-audit-cache.json";

const CACHE_VERSION: u32 = 1;

/// Cached answers for one content hash
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachedEntry {
    pub license: Option<ScanResult>,
    pub copyrights: Option<Vec<String>>,
    pub scanned_at: String,
}

/// On-disk cache layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanCacheData {
    pub version: u32,
    pub entries: HashMap<String, CachedEntry>,
}

impl Default for ScanCacheData {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// Oracle wrapper serving repeated content from the cache
pub struct CachingOracle<O> {
    inner: O,
    cache_path: PathBuf,
    data: Mutex<ScanCacheData>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<O: ScanOracle> CachingOracle<O> {
    /// Load the cache from `cache_path`, or start empty
    pub fn load(inner: O, cache_path: impl Into<PathBuf>) -> Self {
        let cache_path = cache_path.into();
        let data = match std::fs::read_to_string(&cache_path) {
            Ok(content) => match serde_json::from_str::<ScanCacheData>(&content) {
                Ok(d) if d.version == CACHE_VERSION => {
                    tracing::info!("Loaded scan cache ({} entries)", d.entries.len());
                    d
                }
                _ => {
                    tracing::debug!("Cache version mismatch or corrupt cache, starting fresh");
                    ScanCacheData::default()
                }
            },
            Err(_) => ScanCacheData::default(),
        };

        Self {
            inner,
            cache_path,
            data: Mutex::new(data),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Save cache to disk
    pub fn save(&self) -> AuditResult<()> {
        let json = match self.data.lock() {
            Ok(data) => serde_json::to_string_pretty(&*data)?,
            Err(_) => return Ok(()),
        };
        std::fs::write(&self.cache_path, json)?;
        tracing::info!(
            "Saved scan cache to {} ({}/{} hits)",
            self.cache_path.display(),
            self.hits(),
            self.hits() + self.misses()
        );
        Ok(())
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    fn lookup<T>(&self, hash: &str, field: impl Fn(&CachedEntry) -> Option<T>) -> Option<T> {
        let found = self
            .data
            .lock()
            .ok()
            .and_then(|data| data.entries.get(hash).and_then(&field));
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    fn store(&self, hash: String, update: impl FnOnce(&mut CachedEntry)) {
        if let Ok(mut data) = self.data.lock() {
            let entry = data.entries.entry(hash).or_default();
            update(entry);
            entry.scanned_at = chrono::Utc::now().to_rfc3339();
        }
    }
}

impl<O: ScanOracle> ScanOracle for CachingOracle<O> {
    fn detect_license(&self, path: &Path) -> AuditResult<ScanResult> {
        let hash = hash_file(path)?;
        if let Some(result) = self.lookup(&hash, |e| e.license.clone()) {
            return Ok(result);
        }
        let result = self.inner.detect_license(path)?;
        let stored = result.clone();
        self.store(hash, |e| e.license = Some(stored));
        Ok(result)
    }

    fn detect_copyrights(&self, path: &Path) -> AuditResult<Vec<String>> {
        let hash = hash_file(path)?;
        if let Some(copyrights) = self.lookup(&hash, |e| e.copyrights.clone()) {
            return Ok(copyrights);
        }
        let copyrights = self.inner.detect_copyrights(path)?;
        let stored = copyrights.clone();
        self.store(hash, |e| e.copyrights = Some(stored));
        Ok(copyrights)
    }

    fn identify_text(&self, text: &str) -> Option<String> {
        self.inner.identify_text(text)
    }
}

/// Hash a file's contents with SHA-256
fn hash_file(path: &Path) -> AuditResult<String> {
    let content = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(hex::encode(hasher.finalize()))
}
