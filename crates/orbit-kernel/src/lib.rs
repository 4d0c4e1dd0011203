pub mod request;
pub mod runtime;

pub use request::RequestContext;

pub use orbit_contracts::models;
pub use orbit_contracts::{AppError, AppResult, ErrorContextItem, InvokeError, ResultExt};
