pub(crate) mod commands;
mod picker;
