//! Native backend behind the dashboard: turns a root folder into project
//! cards and opens projects in an editor.

mod latest;
mod launch;
mod scan;
mod signals;

pub use latest::find_latest_file;
pub use launch::{
    LaunchCommand, LaunchRequest, build_launch_command, launch_project, resolve_ide_executable,
};
pub use scan::{ScanOptions, scan_projects};
pub use signals::{DirListing, ProjectSignals, detect_project_signals, detect_project_type};
