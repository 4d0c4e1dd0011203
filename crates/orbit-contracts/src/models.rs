use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResultDto {
    pub ok: bool,
    pub message: String,
}

/// A filesystem path registered for scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbitRootDto {
    pub path: String,
    pub enabled: bool,
}

impl OrbitRootDto {
    pub fn enabled(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            enabled: true,
        }
    }
}

/// One discovered project.
///
/// Field names stay snake_case: the dashboard reads them verbatim from the
/// scan command result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDto {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub last_modified: Option<u64>,
    #[serde(default)]
    pub last_modified_file: Option<String>,
    #[serde(default = "unknown_project_type")]
    pub project_type: String,
    #[serde(default)]
    pub techs: Vec<String>,
    #[serde(default)]
    pub ides: Vec<String>,
    #[serde(default)]
    pub source_path: String,
}

fn unknown_project_type() -> String {
    "unknown".to_string()
}

/// Path-level classification of a list change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDiffDto {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: Vec<String>,
}

impl ProjectDiffDto {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbitSnapshotDto {
    pub roots: Vec<OrbitRootDto>,
    pub projects: Vec<ProjectDto>,
    pub excluded: Vec<String>,
    pub project_order: Vec<String>,
    pub preferred_ides: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsChangedPayload {
    pub snapshot: OrbitSnapshotDto,
    pub diff: ProjectDiffDto,
    pub reason: String,
}

/// Result of the native folder picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderSelection {
    Cancelled,
    Single(String),
    Many(Vec<String>),
}

impl FolderSelection {
    pub fn from_paths(paths: Option<Vec<String>>) -> Self {
        match paths {
            None => Self::Cancelled,
            Some(mut paths) if paths.len() == 1 => Self::Single(paths.remove(0)),
            Some(paths) if paths.is_empty() => Self::Cancelled,
            Some(paths) => Self::Many(paths),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn into_paths(self) -> Vec<String> {
        match self {
            Self::Cancelled => Vec::new(),
            Self::Single(path) => vec![path],
            Self::Many(paths) => paths,
        }
    }
}
