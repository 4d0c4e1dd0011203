pub(crate) const MAIN_WINDOW_LABEL: &str = "main";
pub(crate) const FOLDER_PICKER_TITLE: &str = "Add Orbit";
