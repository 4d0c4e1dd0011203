pub mod coordinator;
pub mod ide;
pub mod reconcile;
pub mod service;
pub mod state;

pub use coordinator::scan_roots;
pub use ide::{DEFAULT_IDE, effective_ide};
pub use reconcile::{
    diff_projects, filter_excluded, merge_scan_results, missing_in_order, reconcile_projects,
    sort_by_order,
};
pub use service::{ChangeReason, OrbitService};
pub use state::{AppliedScan, OrbitState, ScanTicket};
