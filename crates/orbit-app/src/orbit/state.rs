use super::reconcile::{diff_projects, missing_in_order, reconcile_projects, sort_by_order};
use orbit_contracts::models::{OrbitRootDto, OrbitSnapshotDto, ProjectDiffDto, ProjectDto};
use orbit_settings::OrbitSettings;
use std::collections::BTreeMap;

/// A scan as issued: its sequence number and the enabled roots it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTicket {
    pub seq: u64,
    pub roots: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedScan {
    pub diff: ProjectDiffDto,
    /// Full order list after newcomers were appended, when any were.
    pub repaired_order: Option<Vec<String>>,
}

/// Single owner of the dashboard state. Mutations are synchronous; the scan
/// sequence counter decides which completed scan may update `projects`.
#[derive(Debug, Clone, Default)]
pub struct OrbitState {
    pub roots: Vec<OrbitRootDto>,
    pub excluded: Vec<String>,
    pub project_order: Vec<String>,
    pub preferred_ides: BTreeMap<String, String>,
    pub projects: Vec<ProjectDto>,
    issued_seq: u64,
}

impl OrbitState {
    pub fn install_settings(&mut self, settings: OrbitSettings) {
        self.roots = settings.roots;
        self.excluded = settings.excluded;
        self.project_order = settings.project_order;
        self.preferred_ides = settings.preferred_ides;
    }

    pub fn snapshot(&self) -> OrbitSnapshotDto {
        OrbitSnapshotDto {
            roots: self.roots.clone(),
            projects: self.projects.clone(),
            excluded: self.excluded.clone(),
            project_order: self.project_order.clone(),
            preferred_ides: self.preferred_ides.clone(),
        }
    }

    pub fn latest_seq(&self) -> u64 {
        self.issued_seq
    }

    /// Appends unknown, non-blank paths as enabled roots.
    pub fn add_roots(&mut self, paths: &[String]) {
        for path in paths {
            if path.trim().is_empty() || self.roots.iter().any(|root| &root.path == path) {
                continue;
            }
            self.roots.push(OrbitRootDto::enabled(path.clone()));
        }
    }

    /// Returns `false` when `index` is out of range.
    pub fn toggle_root(&mut self, index: usize) -> bool {
        match self.roots.get_mut(index) {
            Some(root) => {
                root.enabled = !root.enabled;
                true
            }
            None => false,
        }
    }

    pub fn delete_root(&mut self, path: &str) {
        self.roots.retain(|root| root.path != path);
    }

    pub fn exclude_project(&mut self, path: &str) {
        if !self.excluded.iter().any(|known| known == path) {
            self.excluded.push(path.to_string());
        }
    }

    pub fn restore_excluded(&mut self) {
        self.excluded.clear();
    }

    /// Replaces the order list and re-sorts the displayed projects to match.
    pub fn reorder_projects(&mut self, ordered_paths: Vec<String>) -> ProjectDiffDto {
        let mut order: Vec<String> = Vec::with_capacity(ordered_paths.len());
        for path in ordered_paths {
            if !order.contains(&path) {
                order.push(path);
            }
        }
        self.project_order = order;
        sort_by_order(&mut self.projects, &self.project_order);
        diff_projects(&self.projects, &self.projects)
    }

    pub fn set_project_ide(&mut self, path: &str, ide_id: &str) {
        self.preferred_ides.insert(path.to_string(), ide_id.to_string());
    }

    /// Issues the next sequence number and captures the enabled roots as of now.
    pub fn begin_scan(&mut self) -> ScanTicket {
        self.issued_seq += 1;
        ScanTicket {
            seq: self.issued_seq,
            roots: self
                .roots
                .iter()
                .filter(|root| root.enabled)
                .map(|root| root.path.clone())
                .collect(),
        }
    }

    /// Applies a completed scan if it is the most recently issued one.
    ///
    /// Exclusions and order are read at apply time so a reorder made while
    /// the scan was in flight is kept. Returns `None` for a superseded scan,
    /// which leaves the state untouched.
    pub fn apply_scan(&mut self, seq: u64, batches: Vec<Vec<ProjectDto>>) -> Option<AppliedScan> {
        if seq != self.issued_seq {
            return None;
        }

        let projects = reconcile_projects(batches, &self.excluded, &self.project_order);
        let diff = diff_projects(&self.projects, &projects);
        let missing = missing_in_order(&projects, &self.project_order);
        self.projects = projects;

        let repaired_order = if missing.is_empty() {
            None
        } else {
            self.project_order.extend(missing);
            Some(self.project_order.clone())
        };
        Some(AppliedScan {
            diff,
            repaired_order,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/orbit/state_tests.rs"]
mod tests;
