use super::*;

    /// Reads `window.__DW_CONFIG__`; an absent global yields the defaults.
    pub(super) fn load_page_config() -> Result<Config, BridgeError> {
        let window = window()?;
        let raw = js_sys::Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL))
            .map_err(|_| format!("{CONFIG_GLOBAL} is unreadable"))?;
        let value = js_to_json(&raw, "page configuration")?;
        Ok(Config::from_json(&value.to_string())?)
    }

    pub(super) fn install_click_delegation() -> Result<(), String> {
        let document = document()?;
        DELEGATED_CLICK_HANDLER.with(|slot| {
            if slot.borrow().is_some() {
                return Ok(());
            }
            let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |event| {
                handle_delegated_click(event);
            }));
            document
                .add_event_listener_with_callback("click", callback.as_ref().unchecked_ref())
                .map_err(|_| "failed to listen for clicks".to_string())?;
            *slot.borrow_mut() = Some(callback);
            Ok(())
        })
    }

    fn handle_delegated_click(event: web_sys::Event) {
        let Some(target) = event.target().and_then(|target| target.dyn_into::<Element>().ok()) else {
            return;
        };
        let Ok(Some(element)) = target.closest(DELEGATED_CLICK_SELECTOR) else {
            return;
        };
        let attributes = ClickAttributes {
            modal: element.get_attribute(MODAL_ID_ATTRIBUTE),
            dismiss: element.get_attribute(DISMISS_ATTRIBUTE),
            button: element.get_attribute(MODAL_BUTTON_ATTRIBUTE),
            upload_delete: element.get_attribute(UPLOAD_DELETE_ATTRIBUTE),
            action: element.get_attribute(ACTION_ATTRIBUTE),
            form: element.get_attribute(FORM_KEY_ATTRIBUTE),
        };
        let Some(action) = attributes.action() else {
            return;
        };
        event.prevent_default();
        debug!(?action, "delegated click");
        let result = match action {
            DelegatedAction::ModalButton { modal_id, index, closes } => {
                run_modal_button(&modal_id, index, closes);
                Ok(())
            }
            DelegatedAction::UploadDelete { id } => delete_from_preview(&id),
            DelegatedAction::DeleteFlow { form, action } => handle_delete_action(&form, action),
        };
        if let Err(error) = result {
            error!(%error, "delegated click failed");
        }
    }
