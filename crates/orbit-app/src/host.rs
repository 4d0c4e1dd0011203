use orbit_contracts::AppResult;
use serde_json::Value;

pub const PROJECTS_CHANGED_EVENT: &str = "orbit://projects/changed";

pub trait OrbitHost: Send + Sync {
    fn emit(&self, event: &str, payload: Value) -> AppResult<()>;
    fn reveal_path(&self, path: &str) -> AppResult<()>;
}
