use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::{EngineError, LineRecord};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "prop_picks";
const CACHE_FILE: &str = "lines_cache.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheFile {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    lines: Vec<LineRecord>,
    fetched_at: u64,
}

/// Normalized lines handed back by the cache. `stale` is true when a live
/// refresh failed and an expired entry was served instead; callers must
/// surface it, never hide it.
#[derive(Debug, Clone)]
pub struct CachedLines {
    pub lines: Vec<LineRecord>,
    pub fetched_at: u64,
    pub stale: bool,
}

/// Storage backend for cache entries. File-backed for the binary, in-memory
/// for tests; either way the cache itself stays a plain value the pipeline
/// receives, not ambient state.
pub trait CacheStore {
    fn load(&self) -> CacheFile;
    fn save(&self, cache: &CacheFile) -> Result<()>;
}

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default location under XDG cache (or ~/.cache).
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(base) = std::env::var("XDG_CACHE_HOME")
            && !base.trim().is_empty()
        {
            return Some(PathBuf::from(base).join(CACHE_DIR).join(CACHE_FILE));
        }
        let home = std::env::var("HOME").ok()?;
        if home.trim().is_empty() {
            return None;
        }
        Some(PathBuf::from(home).join(".cache").join(CACHE_DIR).join(CACHE_FILE))
    }
}

impl CacheStore for FileStore {
    fn load(&self) -> CacheFile {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return CacheFile::default();
        };
        let cache = serde_json::from_str::<CacheFile>(&raw).unwrap_or_default();
        if cache.version != CACHE_VERSION {
            return CacheFile::default();
        }
        cache
    }

    fn save(&self, cache: &CacheFile) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        // Write-to-temp then atomic rename so a crash mid-write never leaves
        // a partial entry observable to the next reader.
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string(cache).context("serialize lines cache")?;
        fs::write(&tmp, json).context("write lines cache")?;
        fs::rename(&tmp, &self.path).context("swap lines cache")?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<CacheFile>,
}

impl CacheStore for MemoryStore {
    fn load(&self) -> CacheFile {
        self.inner.lock().expect("memory store lock poisoned").clone()
    }

    fn save(&self, cache: &CacheFile) -> Result<()> {
        *self.inner.lock().expect("memory store lock poisoned") = cache.clone();
        Ok(())
    }
}

/// Deterministic slot key: identical requests always hit the same entry.
/// Params are sorted so argument order cannot split the cache.
pub fn cache_key(endpoint: &str, params: &[(String, String)], sport_filter: &str) -> String {
    let mut sorted: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    sorted.sort();
    let query: Vec<String> = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{endpoint}?{}#{sport_filter}", query.join("&"))
}

pub struct LineCache<S: CacheStore> {
    store: S,
    ttl: Duration,
}

impl<S: CacheStore> LineCache<S> {
    pub fn new(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Return cached lines for the key, refreshing through `fetch` when the
    /// entry is missing or older than the TTL. A failed refresh falls back to
    /// the expired entry (flagged stale); with no entry at all it fails with
    /// `FetchUnavailable` so the caller can take the offline snapshot path.
    pub fn get_or_fetch(
        &self,
        key: &str,
        fetch: impl FnOnce() -> Result<Vec<LineRecord>>,
    ) -> Result<CachedLines, EngineError> {
        let now = now_secs();
        let cached = self.store.load().entries.get(key).cloned();

        if let Some(entry) = cached.as_ref()
            && now.saturating_sub(entry.fetched_at) <= self.ttl.as_secs()
        {
            return Ok(CachedLines {
                lines: entry.lines.clone(),
                fetched_at: entry.fetched_at,
                stale: false,
            });
        }

        match fetch() {
            Ok(lines) => {
                let entry = CacheEntry {
                    lines: lines.clone(),
                    fetched_at: now,
                };
                self.refresh_entry(key, entry);
                Ok(CachedLines {
                    lines,
                    fetched_at: now,
                    stale: false,
                })
            }
            Err(err) => match cached {
                // Availability beats strict freshness, but staleness is
                // always surfaced to the caller.
                Some(entry) => {
                    tracing::warn!(key, error = %err, "live fetch failed, serving stale cache entry");
                    Ok(CachedLines {
                        lines: entry.lines,
                        fetched_at: entry.fetched_at,
                        stale: true,
                    })
                }
                None => Err(EngineError::FetchUnavailable(err.to_string())),
            },
        }
    }

    fn refresh_entry(&self, key: &str, entry: CacheEntry) {
        let mut cache = self.store.load();
        cache.version = CACHE_VERSION;
        cache.entries.insert(key.to_string(), entry);
        if let Err(err) = self.store.save(&cache) {
            tracing::warn!(error = %err, "failed to persist lines cache");
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
