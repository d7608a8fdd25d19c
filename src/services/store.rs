//! Persistent key-value store for the set counter

use std::{
    collections::HashMap,
    io::Write,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Key under which the counter is stored
pub const COUNT_KEY: &str = "count";

/// Durable storage surviving process restarts
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never written
    async fn load(&self, key: &str) -> Result<Option<Value>>;

    /// Overwrite a value
    async fn save(&self, key: &str, value: Value) -> Result<()>;
}

/// Read the persisted counter once at startup.
///
/// Absent, malformed, and unreadable values all count as zero.
pub async fn load_count(store: &dyn KeyValueStore) -> u32 {
    match store.load(COUNT_KEY).await {
        Ok(Some(value)) => match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(count) => count,
            None => {
                warn!("Ignoring malformed stored count: {}", value);
                0
            }
        },
        Ok(None) => {
            debug!("No stored count, starting from zero");
            0
        }
        Err(e) => {
            warn!("Failed to read stored count: {:#}", e);
            0
        }
    }
}

/// Store backed by a single JSON object file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

fn read_map(path: &Path) -> Result<Map<String, Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    match serde_json::from_str::<Value>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?
    {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("Store file holds {} instead of an object", other)),
    }
}

fn write_map(path: &Path, map: &Map<String, Value>) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let content = serde_json::to_string_pretty(map).context("Failed to serialize store")?;

    let mut temp_file = NamedTempFile::new_in(dir).context("Failed to create temporary file")?;
    temp_file
        .write_all(content.as_bytes())
        .context("Failed to write temporary file")?;
    temp_file
        .as_file()
        .sync_all()
        .context("Failed to sync temporary file")?;
    temp_file
        .persist(path)
        .with_context(|| format!("Failed to persist {}", path.display()))?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path.clone();
        let map = tokio::task::spawn_blocking(move || read_map(&path))
            .await
            .context("Store read task failed")??;
        Ok(map.get(key).cloned())
    }

    async fn save(&self, key: &str, value: Value) -> Result<()> {
        let path = self.path.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            // an unreadable file is replaced rather than blocking every later write
            let mut map = read_map(&path).unwrap_or_else(|e| {
                warn!("Rewriting unreadable store: {:#}", e);
                Map::new()
            });
            map.insert(key, value);
            write_map(&path, &map)
        })
        .await
        .context("Store write task failed")?
    }
}

/// Store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following load and save fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(anyhow!("memory store is unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        self.check()?;
        let values = self
            .values
            .lock()
            .map_err(|e| anyhow!("Failed to lock memory store: {}", e))?;
        Ok(values.get(key).cloned())
    }

    async fn save(&self, key: &str, value: Value) -> Result<()> {
        self.check()?;
        let mut values = self
            .values
            .lock()
            .map_err(|e| anyhow!("Failed to lock memory store: {}", e))?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}
