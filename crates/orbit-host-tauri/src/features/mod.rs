pub(crate) mod orbit;

pub(crate) use crate::command_runtime::{run_command_async, run_command_sync};
