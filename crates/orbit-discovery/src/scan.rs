use crate::latest::find_latest_file;
use crate::signals::detect_project_signals;
use anyhow::Context;
use orbit_contracts::models::ProjectDto;
use orbit_contracts::{AppResult, ResultExt};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const DEFAULT_IGNORED_DIRS: [&str; 12] = [
    "node_modules",
    ".git",
    "target",
    "dist",
    "build",
    ".next",
    ".idea",
    ".vscode",
    "coverage",
    "bin",
    "obj",
    "lib",
];
const DEFAULT_MAX_DEPTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub ignored_dirs: Vec<String>,
    pub skip_hidden: bool,
    pub max_depth: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|name| name.to_string()).collect(),
            skip_hidden: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ScanOptions {
    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignored_dirs
            .iter()
            .any(|ignored| ignored.eq_ignore_ascii_case(name))
    }
}

fn epoch_millis(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
}

/// Treats every immediate subdirectory of `base_path` as one project.
pub fn scan_projects(base_path: &str, options: &ScanOptions) -> AppResult<Vec<ProjectDto>> {
    let root = Path::new(base_path);
    let entries = fs::read_dir(root)
        .with_context(|| format!("failed to read project root: {}", root.display()))
        .with_code("project_root_unreadable", "Project folder cannot be read")
        .with_ctx("basePath", base_path)?;

    let mut project_dirs = entries
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_dir()))
        .collect::<Vec<_>>();
    project_dirs.sort_by_key(|entry| entry.file_name());

    let mut projects = Vec::with_capacity(project_dirs.len());
    for entry in project_dirs {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        let last_modified = entry
            .metadata()
            .ok()
            .and_then(|meta| meta.modified().ok())
            .and_then(epoch_millis);
        let signals = detect_project_signals(&path);

        projects.push(ProjectDto {
            name,
            path: path.to_string_lossy().to_string(),
            last_modified,
            last_modified_file: find_latest_file(&path, options),
            project_type: signals.project_type,
            techs: signals.techs,
            ides: signals.ides,
            source_path: base_path.to_string(),
        });
    }

    tracing::debug!(
        event = "project_root_scanned",
        base_path,
        project_count = projects.len()
    );
    Ok(projects)
}

#[cfg(test)]
#[path = "../tests/discovery/scan_tests.rs"]
mod tests;
