use orbit_contracts::{AppError, AppResult};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Document-like key-value store backing the dashboard settings.
///
/// `set` only stages a value; nothing is durable until `save` flushes.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> AppResult<()>;
    fn save(&self) -> AppResult<()>;
}

type Entries = Option<Map<String, Value>>;

fn lock_entries(slot: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// JSON document on disk, loaded on first access.
pub struct JsonFileSettingsStore {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(None),
        }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(SETTINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_entries<T>(&self, op: impl FnOnce(&mut Map<String, Value>) -> T) -> AppResult<T> {
        let mut guard = lock_entries(&self.entries);
        if guard.is_none() {
            *guard = Some(read_settings_document(&self.path)?);
        }
        match guard.as_mut() {
            Some(entries) => Ok(op(entries)),
            None => Err(AppError::new("settings_read_failed", "Failed to read settings")),
        }
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn get(&self, key: &str) -> AppResult<Option<Value>> {
        self.with_entries(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> AppResult<()> {
        self.with_entries(|entries| {
            entries.insert(key.to_string(), value);
        })
    }

    fn save(&self) -> AppResult<()> {
        // Entries stay locked during the write so flushes never share the temp file.
        self.with_entries(|entries| {
            write_settings_file(&self.path, &Value::Object(entries.clone()))
        })?
    }
}

fn read_settings_document(path: &Path) -> AppResult<Map<String, Value>> {
    let content = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(error) => {
            return Err(
                AppError::new("settings_read_failed", "Failed to read settings")
                    .with_source(error)
                    .with_context("path", path.to_string_lossy().to_string()),
            );
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(entries)) => Ok(entries),
        Ok(_) => {
            tracing::warn!(
                event = "settings_document_not_object",
                path = %path.to_string_lossy()
            );
            backup_corrupted_settings_file(path, &content);
            Ok(Map::new())
        }
        Err(error) => {
            let backup = backup_corrupted_settings_file(path, &content);
            tracing::warn!(
                event = "settings_parse_failed",
                detail = %error,
                path = %path.to_string_lossy(),
                backup_path = backup
                    .as_ref()
                    .map(|value| value.to_string_lossy().to_string())
                    .unwrap_or_default()
            );
            Ok(Map::new())
        }
    }
}

fn backup_corrupted_settings_file(path: &Path, content: &str) -> Option<PathBuf> {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0);
    let file_name = path
        .file_name()
        .map(|value| value.to_string_lossy().to_string())
        .unwrap_or_else(|| SETTINGS_FILE_NAME.to_string());
    let backup_path = path.with_file_name(format!("{file_name}.bak.{suffix}"));

    match fs::write(&backup_path, content) {
        Ok(_) => Some(backup_path),
        Err(error) => {
            tracing::warn!(
                event = "settings_backup_failed",
                detail = %error,
                backup_path = %backup_path.to_string_lossy()
            );
            None
        }
    }
}

fn write_settings_file(path: &Path, document: &Value) -> AppResult<()> {
    let parent = path.parent().ok_or_else(|| {
        AppError::new("settings_path_invalid", "Settings path has no parent directory")
            .with_context("path", path.to_string_lossy().to_string())
    })?;

    fs::create_dir_all(parent).map_err(|error| {
        AppError::new("settings_dir_create_failed", "Failed to create settings directory")
            .with_source(error)
            .with_context("path", parent.to_string_lossy().to_string())
    })?;

    let serialized = serde_json::to_string_pretty(document).map_err(|error| {
        AppError::new("settings_serialize_failed", "Failed to serialize settings").with_source(error)
    })?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, serialized).map_err(|error| {
        AppError::new("settings_write_failed", "Failed to write settings")
            .with_source(error)
            .with_context("path", temp_path.to_string_lossy().to_string())
    })?;

    match fs::rename(&temp_path, path) {
        Ok(_) => Ok(()),
        Err(rename_error) => {
            // Windows refuses to rename over an existing file.
            if path.exists() {
                fs::remove_file(path)
                    .and_then(|_| fs::rename(&temp_path, path))
                    .map_err(|error| {
                        let _ = fs::remove_file(&temp_path);
                        AppError::new("settings_write_failed", "Failed to replace settings file")
                            .with_source(error)
                            .with_context("path", path.to_string_lossy().to_string())
                    })
            } else {
                let _ = fs::remove_file(&temp_path);
                Err(AppError::new("settings_write_failed", "Failed to write settings")
                    .with_source(rename_error)
                    .with_context("path", path.to_string_lossy().to_string()))
            }
        }
    }
}

/// In-process store for tests and headless runs.
#[derive(Default)]
pub struct MemorySettingsStore {
    entries: Mutex<Entries>,
    save_count: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Map<String, Value>) -> Self {
        Self {
            entries: Mutex::new(Some(entries)),
            ..Self::default()
        }
    }

    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        lock_entries(&self.entries).clone().unwrap_or_default()
    }

    fn ensure_writable(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::new("settings_write_failed", "Failed to write settings")
                .with_cause("memory store rejects writes"));
        }
        Ok(())
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> AppResult<Option<Value>> {
        Ok(lock_entries(&self.entries)
            .as_ref()
            .and_then(|entries| entries.get(key).cloned()))
    }

    fn set(&self, key: &str, value: Value) -> AppResult<()> {
        self.ensure_writable()?;
        lock_entries(&self.entries)
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value);
        Ok(())
    }

    fn save(&self) -> AppResult<()> {
        self.ensure_writable()?;
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/settings/store_tests.rs"]
mod tests;
