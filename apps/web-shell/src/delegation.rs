use dw_utilities_core::edit_form::DeleteAction;

/// Elements the document-level click listener reacts to.
pub(crate) const DELEGATED_CLICK_SELECTOR: &str =
    "[data-dw-modal][data-dw-button], [data-dw-upload-delete], [data-dw-action]";

/// `data-bs-dismiss` value of buttons that close their modal.
pub(crate) const MODAL_DISMISS_TARGET: &str = "modal";

/// Attribute values read off the closest delegated element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ClickAttributes {
    pub(crate) modal: Option<String>,
    /// Value of `data-bs-dismiss` on the clicked button.
    pub(crate) dismiss: Option<String>,
    pub(crate) button: Option<String>,
    pub(crate) upload_delete: Option<String>,
    pub(crate) action: Option<String>,
    pub(crate) form: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DelegatedAction {
    ModalButton { modal_id: String, index: usize, closes: bool },
    UploadDelete { id: String },
    DeleteFlow { form: String, action: DeleteAction },
}

impl ClickAttributes {
    pub(crate) fn action(&self) -> Option<DelegatedAction> {
        if let (Some(modal_id), Some(button)) = (present(&self.modal), present(&self.button)) {
            let index = button.parse::<usize>().ok()?;
            return Some(DelegatedAction::ModalButton {
                modal_id: modal_id.to_string(),
                index,
                closes: present(&self.dismiss) == Some(MODAL_DISMISS_TARGET),
            });
        }
        if let Some(id) = present(&self.upload_delete) {
            return Some(DelegatedAction::UploadDelete { id: id.to_string() });
        }
        let action = DeleteAction::parse(present(&self.action)?)?;
        Some(DelegatedAction::DeleteFlow {
            form: present(&self.form)?.to_string(),
            action,
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|text| !text.is_empty())
}
