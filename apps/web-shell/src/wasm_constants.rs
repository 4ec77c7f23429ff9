pub(crate) const CONFIG_GLOBAL: &str = "__DW_CONFIG__";
pub(crate) const CALLBACK_KEY: &str = "callback";
pub(crate) const BUTTONS_KEY: &str = "buttons";
pub(crate) const ELEMENT_KEY: &str = "element";
pub(crate) const DZ_OPTIONS_KEY: &str = "dz_options";
pub(crate) const MODAL_GROUP_TAG: &str = "div";
pub(crate) const HIDDEN_INPUT_TYPE: &str = "hidden";
pub(crate) const DELETE_UPLOAD_FILENAME_KEY: &str = "filename";
pub(crate) const DISMISS_ATTRIBUTE: &str = "data-bs-dismiss";
