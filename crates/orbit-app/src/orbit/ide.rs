use orbit_contracts::models::ProjectDto;

pub const DEFAULT_IDE: &str = "vscode";

/// IDE used when the caller does not pick one: the stored preference, then
/// the first IDE detected in the project, then [`DEFAULT_IDE`].
pub fn effective_ide(project: Option<&ProjectDto>, preferred: Option<&str>) -> String {
    preferred
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| project.and_then(|project| project.ides.first().map(String::as_str)))
        .unwrap_or(DEFAULT_IDE)
        .to_string()
}
