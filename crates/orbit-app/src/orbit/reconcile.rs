use orbit_contracts::models::{ProjectDiffDto, ProjectDto};
use std::collections::{HashMap, HashSet};

/// Concatenates per-root results in root order and collapses duplicate paths.
///
/// A later duplicate replaces the content of the earlier one but keeps the
/// position where the path was first seen.
pub fn merge_scan_results<I>(batches: I) -> Vec<ProjectDto>
where
    I: IntoIterator<Item = Vec<ProjectDto>>,
{
    let mut merged: Vec<ProjectDto> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for project in batches.into_iter().flatten() {
        if let Some(&index) = positions.get(&project.path) {
            merged[index] = project;
            continue;
        }
        positions.insert(project.path.clone(), merged.len());
        merged.push(project);
    }
    merged
}

pub fn filter_excluded(projects: Vec<ProjectDto>, excluded: &[String]) -> Vec<ProjectDto> {
    if excluded.is_empty() {
        return projects;
    }
    let excluded = excluded.iter().map(String::as_str).collect::<HashSet<_>>();
    projects
        .into_iter()
        .filter(|project| !excluded.contains(project.path.as_str()))
        .collect()
}

/// Stable sort by position in `order`; unordered projects sink to the end in
/// their current relative order.
pub fn sort_by_order(projects: &mut [ProjectDto], order: &[String]) {
    let index = order_index(order);
    projects.sort_by_key(|project| {
        index
            .get(project.path.as_str())
            .copied()
            .unwrap_or(usize::MAX)
    });
}

/// Paths of `projects` not yet in `order`, in list order.
pub fn missing_in_order(projects: &[ProjectDto], order: &[String]) -> Vec<String> {
    let index = order_index(order);
    projects
        .iter()
        .filter(|project| !index.contains_key(project.path.as_str()))
        .map(|project| project.path.clone())
        .collect()
}

/// Full pipeline from raw per-root batches to the displayed list.
pub fn reconcile_projects(
    batches: Vec<Vec<ProjectDto>>,
    excluded: &[String],
    order: &[String],
) -> Vec<ProjectDto> {
    let mut projects = filter_excluded(merge_scan_results(batches), excluded);
    sort_by_order(&mut projects, order);
    projects
}

/// Classifies paths of `next` against `previous`. `added` and `unchanged`
/// follow `next` order, `removed` follows `previous` order.
pub fn diff_projects(previous: &[ProjectDto], next: &[ProjectDto]) -> ProjectDiffDto {
    let before = previous
        .iter()
        .map(|project| project.path.as_str())
        .collect::<HashSet<_>>();
    let after = next
        .iter()
        .map(|project| project.path.as_str())
        .collect::<HashSet<_>>();

    let mut diff = ProjectDiffDto::default();
    let mut seen = HashSet::new();
    for project in next {
        if !seen.insert(project.path.as_str()) {
            continue;
        }
        if before.contains(project.path.as_str()) {
            diff.unchanged.push(project.path.clone());
        } else {
            diff.added.push(project.path.clone());
        }
    }
    let mut seen = HashSet::new();
    for project in previous {
        if seen.insert(project.path.as_str()) && !after.contains(project.path.as_str()) {
            diff.removed.push(project.path.clone());
        }
    }
    diff
}

fn order_index(order: &[String]) -> HashMap<&str, usize> {
    let mut index = HashMap::with_capacity(order.len());
    for (position, path) in order.iter().enumerate() {
        index.entry(path.as_str()).or_insert(position);
    }
    index
}

#[cfg(test)]
#[path = "../../tests/orbit/reconcile_tests.rs"]
mod tests;
