use super::*;

    /// What a modal button runs when clicked.
    #[derive(Clone)]
    pub(super) enum ButtonCallback {
        Script(js_sys::Function),
        Native(Rc<dyn Fn(&str)>),
    }

    impl ButtonCallback {
        fn invoke(&self, modal_id: &str) {
            match self {
                Self::Script(function) => call_js(function, &JsValue::from_str(modal_id)),
                Self::Native(callback) => callback(modal_id),
            }
        }
    }

    /// `modal(cfg)`: button callbacks sit next to their JSON options, so they
    /// are lifted out of `cfg.buttons[i].callback` before deserializing.
    pub(super) fn show_modal_from_js(cfg: &JsValue) -> Result<String, BridgeError> {
        let mut config = ModalConfig::from_json(js_to_json(cfg, "modal")?)?;
        let mut callbacks = Vec::new();
        if let Some(buttons) = js_property(cfg, BUTTONS_KEY) {
            let buttons = js_sys::Array::from(&buttons);
            for (index, button) in buttons.iter().enumerate() {
                let Some(function) = js_function(&button, CALLBACK_KEY) else {
                    continue;
                };
                if let Some(options) = config.buttons.get_mut(index) {
                    options.has_callback = true;
                    callbacks.push((index, ButtonCallback::Script(function)));
                }
            }
        }
        show_modal(&config, callbacks)
    }

    /// Renders `config`, replacing any modal with the same id, and opens it.
    pub(super) fn show_modal(
        config: &ModalConfig,
        callbacks: Vec<(usize, ButtonCallback)>,
    ) -> Result<String, BridgeError> {
        let modal_id = config
            .explicit_id()
            .map_or_else(|| modal_id_from_entropy(js_sys::Math::random()), ToString::to_string);
        MODAL_BUTTONS.with(|registry| registry.borrow_mut().register(&modal_id, callbacks));

        let document = document()?;
        if let Some(existing) = document.get_element_by_id(&group_id(&modal_id)) {
            existing.remove();
        }
        let group = document
            .create_element(MODAL_GROUP_TAG)
            .map_err(|_| "failed to create modal group".to_string())?;
        group.set_id(&group_id(&modal_id));
        group.set_inner_html(&render_modal(config, &modal_id).into_string());
        body()?
            .append_child(&group)
            .map_err(|_| "failed to append modal group".to_string())?;

        let trigger = group
            .query_selector(&attribute_selector("data-bs-target", &format!("#{modal_id}")))
            .map_err(|_| "invalid modal id".to_string())?
            .and_then(|trigger| trigger.dyn_into::<HtmlElement>().ok())
            .ok_or_else(|| format!("modal '{modal_id}' has no trigger"))?;
        trigger.click();
        debug!(%modal_id, "modal shown");
        Ok(modal_id)
    }

    /// Removes the modal's markup and callbacks; unknown ids are ignored.
    pub(super) fn destroy_modal(modal_id: &str) -> Result<(), BridgeError> {
        MODAL_BUTTONS.with(|registry| registry.borrow_mut().remove(modal_id));
        if let Some(group) = document()?.get_element_by_id(&group_id(modal_id)) {
            group.remove();
        }
        Ok(())
    }

    /// The callback is taken out before it runs, so a callback that reopens
    /// the same modal id keeps its fresh table.
    pub(super) fn run_modal_button(modal_id: &str, index: usize, closes: bool) {
        let callback = MODAL_BUTTONS.with(|registry| registry.borrow_mut().press(modal_id, index, closes));
        match callback {
            Some(callback) => callback.invoke(modal_id),
            None => debug!(%modal_id, index, "modal button has no callback"),
        }
    }

    /// Danger-themed alert; server-supplied text is escaped by the renderer.
    pub(super) fn show_alert(title: &str, message: &str, on_close: Option<ButtonCallback>) {
        let with_callback = on_close.is_some();
        let callbacks = on_close.map(|callback| (0, callback)).into_iter().collect();
        if let Err(error) = show_modal(&alert_modal(title, message, with_callback), callbacks) {
            error!(%error, title, "alert dialog not shown");
        }
    }
