use crate::store::SettingsStore;
use orbit_contracts::models::OrbitRootDto;
use orbit_contracts::{AppError, AppResult};
use orbit_kernel::runtime::blocking::run_blocking;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;

pub const KEY_ROOTS: &str = "orbitPaths";
pub const KEY_EXCLUDED: &str = "excludedPaths";
pub const KEY_PROJECT_ORDER: &str = "projectOrder";
pub const KEY_PREFERRED_IDES: &str = "preferredIdes";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrbitSettings {
    pub roots: Vec<OrbitRootDto>,
    pub excluded: Vec<String>,
    pub project_order: Vec<String>,
    pub preferred_ides: BTreeMap<String, String>,
}

/// Subset of settings to persist; `None` keys are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrbitSettingsPatch {
    pub roots: Option<Vec<OrbitRootDto>>,
    pub excluded: Option<Vec<String>>,
    pub project_order: Option<Vec<String>>,
    pub preferred_ides: Option<BTreeMap<String, String>>,
}

impl OrbitSettingsPatch {
    pub fn roots_and_excluded(roots: Vec<OrbitRootDto>, excluded: Vec<String>) -> Self {
        Self {
            roots: Some(roots),
            excluded: Some(excluded),
            ..Self::default()
        }
    }

    pub fn project_order(order: Vec<String>) -> Self {
        Self {
            project_order: Some(order),
            ..Self::default()
        }
    }

    pub fn preferred_ides(preferred_ides: BTreeMap<String, String>) -> Self {
        Self {
            preferred_ides: Some(preferred_ides),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_none()
            && self.excluded.is_none()
            && self.project_order.is_none()
            && self.preferred_ides.is_none()
    }

    fn into_entries(self) -> Vec<(&'static str, Value)> {
        let mut entries = Vec::new();
        if let Some(roots) = self.roots {
            let roots = roots.into_iter().map(root_to_value).collect::<Vec<_>>();
            entries.push((KEY_ROOTS, Value::Array(roots)));
        }
        if let Some(excluded) = self.excluded {
            entries.push((KEY_EXCLUDED, Value::from(excluded)));
        }
        if let Some(order) = self.project_order {
            entries.push((KEY_PROJECT_ORDER, Value::from(order)));
        }
        if let Some(preferred_ides) = self.preferred_ides {
            let object = preferred_ides
                .into_iter()
                .map(|(path, ide)| (path, Value::String(ide)))
                .collect::<serde_json::Map<_, _>>();
            entries.push((KEY_PREFERRED_IDES, Value::Object(object)));
        }
        entries
    }
}

fn root_to_value(root: OrbitRootDto) -> Value {
    serde_json::json!({ "path": root.path, "enabled": root.enabled })
}

#[derive(Clone)]
pub struct OrbitSettingsRepository {
    store: Arc<dyn SettingsStore>,
}

impl OrbitSettingsRepository {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Reads all four keys concurrently. Missing, unreadable or wrongly shaped
    /// values fall back to empty containers.
    pub async fn load(&self) -> OrbitSettings {
        let (roots, excluded, project_order, preferred_ides) = tokio::join!(
            self.read_key(KEY_ROOTS),
            self.read_key(KEY_EXCLUDED),
            self.read_key(KEY_PROJECT_ORDER),
            self.read_key(KEY_PREFERRED_IDES),
        );

        OrbitSettings {
            roots: decode_roots(roots),
            excluded: decode_string_list(KEY_EXCLUDED, excluded),
            project_order: decode_string_list(KEY_PROJECT_ORDER, project_order),
            preferred_ides: decode_string_map(KEY_PREFERRED_IDES, preferred_ides),
        }
    }

    /// Stages every supplied key concurrently, waits for all of them, then
    /// flushes once.
    pub async fn save(&self, patch: OrbitSettingsPatch) -> AppResult<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut pending = JoinSet::new();
        for (key, value) in patch.into_entries() {
            let store = Arc::clone(&self.store);
            pending.spawn(run_blocking("settings_set", move || store.set(key, value)));
        }

        let mut first_error = None;
        while let Some(joined) = pending.join_next().await {
            let result = joined.map_err(|error| {
                AppError::new("settings_write_failed", "Failed to write settings")
                    .with_source(error)
            });
            if let Err(error) | Ok(Err(error)) = result {
                first_error.get_or_insert(error);
            }
        }
        if let Some(error) = first_error {
            return Err(error);
        }

        let store = Arc::clone(&self.store);
        run_blocking("settings_save", move || store.save()).await
    }

    async fn read_key(&self, key: &'static str) -> Option<Value> {
        let store = Arc::clone(&self.store);
        match run_blocking("settings_get", move || store.get(key)).await {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(
                    event = "orbit_settings_read_failed",
                    key,
                    error_code = error.code.as_str(),
                    error_message = error.message.as_str()
                );
                None
            }
        }
    }
}

fn warn_malformed(key: &str, value: &Value) {
    tracing::warn!(
        event = "orbit_settings_malformed_key",
        key,
        kind = value_kind(value)
    );
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn decode_roots(value: Option<Value>) -> Vec<OrbitRootDto> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn_malformed(KEY_ROOTS, &other);
            return Vec::new();
        }
    };

    let mut roots: Vec<OrbitRootDto> = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<OrbitRootDto>(item) {
            Ok(root) if roots.iter().all(|known| known.path != root.path) => roots.push(root),
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(
                    event = "orbit_settings_malformed_root",
                    detail = %error
                );
            }
        }
    }
    roots
}

fn decode_string_list(key: &str, value: Option<Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text),
                _ => None,
            })
            .collect(),
        Some(other) => {
            warn_malformed(key, &other);
            Vec::new()
        }
    }
}

fn decode_string_map(key: &str, value: Option<Value>) -> BTreeMap<String, String> {
    match value {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::Object(entries)) => entries
            .into_iter()
            .filter_map(|(path, ide)| match ide {
                Value::String(ide) => Some((path, ide)),
                _ => None,
            })
            .collect(),
        Some(other) => {
            warn_malformed(key, &other);
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
#[path = "../tests/settings/orbit_settings_tests.rs"]
mod tests;
