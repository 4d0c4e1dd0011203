use orbit_contracts::AppResult;
use orbit_contracts::models::ProjectDto;
use orbit_discovery::{LaunchRequest, ScanOptions, launch_project, scan_projects};

/// Native commands the dashboard depends on. Calls block; callers move them
/// onto the blocking pool.
pub trait ProjectBackend: Send + Sync {
    fn scan(&self, base_path: &str) -> AppResult<Vec<ProjectDto>>;
    fn launch(&self, request: &LaunchRequest) -> AppResult<()>;
}

/// Filesystem-backed implementation.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryBackend {
    options: ScanOptions,
}

impl DiscoveryBackend {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }
}

impl ProjectBackend for DiscoveryBackend {
    fn scan(&self, base_path: &str) -> AppResult<Vec<ProjectDto>> {
        scan_projects(base_path, &self.options)
    }

    fn launch(&self, request: &LaunchRequest) -> AppResult<()> {
        launch_project(request)
    }
}
