use super::coordinator::scan_roots;
use super::ide::effective_ide;
use super::state::{OrbitState, ScanTicket};
use crate::backend::ProjectBackend;
use crate::host::{OrbitHost, PROJECTS_CHANGED_EVENT};
use orbit_contracts::models::{OrbitSnapshotDto, ProjectDiffDto, ProjectsChangedPayload};
use orbit_contracts::{AppError, AppResult};
use orbit_discovery::LaunchRequest;
use orbit_kernel::runtime::blocking::run_blocking;
use orbit_settings::{OrbitSettingsPatch, OrbitSettingsRepository};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Mutex as AsyncMutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    Startup,
    RootsAdded,
    RootToggled,
    RootDeleted,
    ProjectExcluded,
    ExcludedRestored,
    Rescan,
    Reorder,
}

impl ChangeReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::RootsAdded => "roots_added",
            Self::RootToggled => "root_toggled",
            Self::RootDeleted => "root_deleted",
            Self::ProjectExcluded => "project_excluded",
            Self::ExcludedRestored => "excluded_restored",
            Self::Rescan => "rescan",
            Self::Reorder => "reorder",
        }
    }
}

/// Settings keys written together by one persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PersistScope {
    RootsAndExcluded,
    ProjectOrder,
    PreferredIdes,
}

impl PersistScope {
    fn as_str(self) -> &'static str {
        match self {
            Self::RootsAndExcluded => "roots_and_excluded",
            Self::ProjectOrder => "project_order",
            Self::PreferredIdes => "preferred_ides",
        }
    }
}

/// Mutation API over the dashboard state.
///
/// Every mutation updates memory first, then persists, then (except for
/// reorder and IDE preference) rescans. A persistence failure is reported
/// only after the in-memory update and the rescan have happened.
///
/// Writes go through a single persist lane and read the state once they
/// hold it, so the last write to land always carries the newest values.
#[derive(Clone)]
pub struct OrbitService {
    state: Arc<Mutex<OrbitState>>,
    persist_lane: Arc<AsyncMutex<()>>,
    settings: OrbitSettingsRepository,
    backend: Arc<dyn ProjectBackend>,
    host: Arc<dyn OrbitHost>,
}

impl OrbitService {
    pub fn new(
        settings: OrbitSettingsRepository,
        backend: Arc<dyn ProjectBackend>,
        host: Arc<dyn OrbitHost>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(OrbitState::default())),
            persist_lane: Arc::new(AsyncMutex::new(())),
            settings,
            backend,
            host,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, OrbitState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn snapshot(&self) -> OrbitSnapshotDto {
        self.lock_state().snapshot()
    }

    /// Loads persisted settings and runs the first scan when any root exists.
    pub async fn load(&self) -> OrbitSnapshotDto {
        self.load_settings().await;
        self.startup_scan().await
    }

    /// Installs persisted settings without scanning. Must complete before
    /// any mutation is accepted, since it replaces the in-memory settings.
    pub async fn load_settings(&self) {
        let settings = self.settings.load().await;
        let root_count = {
            let mut state = self.lock_state();
            state.install_settings(settings);
            state.roots.len()
        };
        tracing::info!(event = "orbit_settings_loaded", root_count);
    }

    /// Scans the installed roots, if any.
    pub async fn startup_scan(&self) -> OrbitSnapshotDto {
        let ticket = {
            let mut state = self.lock_state();
            (!state.roots.is_empty()).then(|| state.begin_scan())
        };
        if let Some(ticket) = ticket {
            self.run_scan(ticket, ChangeReason::Startup).await;
        }
        self.snapshot()
    }

    pub async fn add_roots(&self, paths: Vec<String>) -> AppResult<OrbitSnapshotDto> {
        self.commit_roots_and_exclusions(ChangeReason::RootsAdded, |state| {
            state.add_roots(&paths);
            true
        })
        .await
    }

    /// Out-of-range indexes are ignored without persisting or rescanning.
    pub async fn toggle_root(&self, index: usize) -> AppResult<OrbitSnapshotDto> {
        self.commit_roots_and_exclusions(ChangeReason::RootToggled, |state| {
            state.toggle_root(index)
        })
        .await
    }

    pub async fn delete_root(&self, path: &str) -> AppResult<OrbitSnapshotDto> {
        self.commit_roots_and_exclusions(ChangeReason::RootDeleted, |state| {
            state.delete_root(path);
            true
        })
        .await
    }

    pub async fn exclude_project(&self, path: &str) -> AppResult<OrbitSnapshotDto> {
        self.commit_roots_and_exclusions(ChangeReason::ProjectExcluded, |state| {
            state.exclude_project(path);
            true
        })
        .await
    }

    pub async fn restore_excluded(&self) -> AppResult<OrbitSnapshotDto> {
        self.commit_roots_and_exclusions(ChangeReason::ExcludedRestored, |state| {
            state.restore_excluded();
            true
        })
        .await
    }

    /// Replaces the manual order. Does not rescan.
    pub async fn reorder_projects(
        &self,
        ordered_paths: Vec<String>,
    ) -> AppResult<OrbitSnapshotDto> {
        let (diff, snapshot) = {
            let mut state = self.lock_state();
            let diff = state.reorder_projects(ordered_paths);
            (diff, state.snapshot())
        };
        self.publish(snapshot.clone(), diff, ChangeReason::Reorder);
        self.persist(PersistScope::ProjectOrder).await?;
        Ok(snapshot)
    }

    /// Stores an IDE override; only the preference key is written.
    pub async fn set_project_ide(
        &self,
        path: &str,
        ide_id: &str,
    ) -> AppResult<OrbitSnapshotDto> {
        let snapshot = {
            let mut state = self.lock_state();
            state.set_project_ide(path, ide_id);
            state.snapshot()
        };
        self.persist(PersistScope::PreferredIdes).await?;
        Ok(snapshot)
    }

    pub async fn rescan(&self) -> OrbitSnapshotDto {
        let ticket = self.lock_state().begin_scan();
        self.run_scan(ticket, ChangeReason::Rescan).await;
        self.snapshot()
    }

    /// Opens a project in `ide_id`, or in its effective IDE when none is given.
    pub async fn launch_project(
        &self,
        path: &str,
        ide_id: Option<&str>,
        open_latest_file: bool,
    ) -> AppResult<()> {
        let request = {
            let state = self.lock_state();
            let project = state.projects.iter().find(|project| project.path == path);
            let ide_id = match ide_id.map(str::trim).filter(|value| !value.is_empty()) {
                Some(ide_id) => ide_id.to_string(),
                None => effective_ide(project, state.preferred_ides.get(path).map(String::as_str)),
            };
            let target_file = if open_latest_file {
                project.and_then(|project| project.last_modified_file.clone())
            } else {
                None
            };
            LaunchRequest {
                path: path.to_string(),
                ide_id,
                target_file,
            }
        };

        let backend = Arc::clone(&self.backend);
        run_blocking("orbit_launch_project", move || backend.launch(&request)).await
    }

    pub fn reveal_project(&self, path: &str) -> AppResult<()> {
        if path.trim().is_empty() {
            return Err(AppError::new("project_reveal_failed", "Project path is required"));
        }
        self.host.reveal_path(path)
    }

    async fn commit_roots_and_exclusions(
        &self,
        reason: ChangeReason,
        mutate: impl FnOnce(&mut OrbitState) -> bool,
    ) -> AppResult<OrbitSnapshotDto> {
        let ticket = {
            let mut state = self.lock_state();
            mutate(&mut state).then(|| state.begin_scan())
        };
        let Some(ticket) = ticket else {
            return Ok(self.snapshot());
        };

        let persisted = self.persist(PersistScope::RootsAndExcluded).await;
        self.run_scan(ticket, reason).await;
        persisted.map(|_| self.snapshot())
    }

    /// Writes the current values of `scope`, queued behind earlier writes.
    async fn persist(&self, scope: PersistScope) -> AppResult<()> {
        let _lane = self.persist_lane.lock().await;
        let patch = {
            let state = self.lock_state();
            match scope {
                PersistScope::RootsAndExcluded => OrbitSettingsPatch::roots_and_excluded(
                    state.roots.clone(),
                    state.excluded.clone(),
                ),
                PersistScope::ProjectOrder => {
                    OrbitSettingsPatch::project_order(state.project_order.clone())
                }
                PersistScope::PreferredIdes => {
                    OrbitSettingsPatch::preferred_ides(state.preferred_ides.clone())
                }
            }
        };
        self.settings.save(patch).await.map_err(|error| {
            tracing::warn!(
                event = "orbit_settings_persist_failed",
                scope = scope.as_str(),
                error_code = error.code.as_str(),
                error_message = error.message.as_str()
            );
            AppError::new(
                "orbit_settings_persist_failed",
                "Dashboard settings could not be saved",
            )
            .with_context("settingsError", error.code.clone())
            .with_causes(error.causes.clone())
        })
    }

    async fn run_scan(&self, ticket: ScanTicket, reason: ChangeReason) {
        let ScanTicket { seq, roots } = ticket;
        let root_count = roots.len();
        let batches = scan_roots(Arc::clone(&self.backend), roots).await;

        let applied = {
            let mut state = self.lock_state();
            let latest_seq = state.latest_seq();
            match state.apply_scan(seq, batches) {
                Some(applied) => Some((applied, state.snapshot())),
                None => {
                    tracing::debug!(
                        event = "orbit_scan_stale_discarded",
                        seq,
                        latest_seq,
                        reason = reason.as_str()
                    );
                    None
                }
            }
        };
        let Some((applied, snapshot)) = applied else {
            return;
        };

        tracing::info!(
            event = "orbit_scan_applied",
            seq,
            reason = reason.as_str(),
            root_count,
            project_count = snapshot.projects.len(),
            added = applied.diff.added.len(),
            removed = applied.diff.removed.len(),
            list_changed = !applied.diff.is_empty()
        );

        if let Some(order) = applied.repaired_order {
            tracing::debug!(
                event = "orbit_order_repaired",
                seq,
                order_len = order.len()
            );
            // Logged inside persist; the scan itself already succeeded.
            let _ = self.persist(PersistScope::ProjectOrder).await;
        }

        self.publish(snapshot, applied.diff, reason);
    }

    fn publish(&self, snapshot: OrbitSnapshotDto, diff: ProjectDiffDto, reason: ChangeReason) {
        let payload = ProjectsChangedPayload {
            snapshot,
            diff,
            reason: reason.as_str().to_string(),
        };
        let result = serde_json::to_value(&payload)
            .map_err(|error| {
                AppError::new("orbit_event_serialize_failed", "Failed to serialize event")
                    .with_source(error)
            })
            .and_then(|value| self.host.emit(PROJECTS_CHANGED_EVENT, value));
        if let Err(error) = result {
            tracing::warn!(
                event = "orbit_event_emit_failed",
                reason = reason.as_str(),
                error_code = error.code.as_str(),
                error_message = error.message.as_str()
            );
        }
    }
}

#[cfg(test)]
#[path = "../../tests/orbit/service_tests.rs"]
mod tests;
