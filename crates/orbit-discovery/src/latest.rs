use crate::scan::ScanOptions;
use std::path::Path;
use std::time::SystemTime;
use walkdir::{DirEntry, WalkDir};

fn is_walkable(entry: &DirEntry, root: &Path, options: &ScanOptions) -> bool {
    if entry.path() == root || !entry.file_type().is_dir() {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    if options.skip_hidden && name.starts_with('.') {
        return false;
    }
    !options.is_ignored_dir(&name)
}

/// Most recently modified file under `root`, relative to `root` with `/`
/// separators. Hidden and ignored directories are not descended into.
pub fn find_latest_file(root: &Path, options: &ScanOptions) -> Option<String> {
    let mut latest: Option<(SystemTime, String)> = None;

    let walker = WalkDir::new(root)
        .max_depth(options.max_depth)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| is_walkable(entry, root, options));

    for entry in walker.flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(modified) = entry.metadata().ok().and_then(|meta| meta.modified().ok()) else {
            continue;
        };
        if latest.as_ref().is_some_and(|(time, _)| modified <= *time) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .components()
            .map(|part| part.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        latest = Some((modified, relative));
    }

    latest.map(|(_, relative)| relative)
}

#[cfg(test)]
#[path = "../tests/discovery/latest_tests.rs"]
mod tests;
