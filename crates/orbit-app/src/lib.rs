//! Dashboard core: the single state owner, scan reconciliation and the
//! mutation API the Tauri commands call into.

pub mod backend;
pub mod host;
pub mod orbit;

pub use backend::{DiscoveryBackend, ProjectBackend};
pub use host::{OrbitHost, PROJECTS_CHANGED_EVENT};
pub use orbit::{ChangeReason, OrbitService, OrbitState};
