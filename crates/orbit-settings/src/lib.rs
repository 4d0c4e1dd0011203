mod orbit_settings;
mod store;

pub use orbit_settings::{
    KEY_EXCLUDED, KEY_PREFERRED_IDES, KEY_PROJECT_ORDER, KEY_ROOTS, OrbitSettings,
    OrbitSettingsPatch, OrbitSettingsRepository,
};
pub use store::{JsonFileSettingsStore, MemorySettingsStore, SETTINGS_FILE_NAME, SettingsStore};
