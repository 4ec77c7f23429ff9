use super::*;

    use dw_utilities_core::edit_form::DEFAULT_DELETE_PROMPT;

    /// One save/delete call from the page: the JSON half plus its callback.
    #[derive(Clone)]
    pub(super) struct EditCall {
        request: EditRequest,
        callback: Option<js_sys::Function>,
    }

    impl EditCall {
        fn from_js(cfg: &JsValue) -> Result<Self, BridgeError> {
            Ok(Self {
                request: parse_options(cfg, "edit request")?,
                callback: js_function(cfg, CALLBACK_KEY),
            })
        }

        fn route(&self) -> ResponseRoute {
            self.request.route(self.callback.is_some())
        }
    }

    /// Delete state for one form, shared by every `EditForm` handle on it.
    pub(super) struct EditFormSession {
        container: String,
        workflow: DeleteWorkflow,
        pending: Option<EditCall>,
    }

    #[wasm_bindgen]
    pub struct EditForm {
        form: String,
    }

    pub(super) fn open_edit_form(options: &JsValue) -> Result<EditForm, BridgeError> {
        let options: EditFormOptions = parse_options(options, "edit form options")?;
        let config = current_config();
        let form = options.form_selector(&config);
        let container = options.container_selector(&config);
        EDIT_FORMS.with(|forms| {
            forms
                .borrow_mut()
                .entry(form.clone())
                .and_modify(|session| session.container.clone_from(&container))
                .or_insert_with(|| EditFormSession {
                    container,
                    workflow: DeleteWorkflow::default(),
                    pending: None,
                });
        });
        Ok(EditForm { form })
    }

    #[wasm_bindgen]
    impl EditForm {
        #[wasm_bindgen(getter)]
        pub fn form(&self) -> String {
            self.form.clone()
        }

        /// Validates the form, then posts `cfg.data` to `cfg.url`. Ignored while
        /// a field check for this form is still pending.
        pub fn save(&self, cfg: JsValue) -> Result<(), JsValue> {
            let call = EditCall::from_js(&cfg)?;
            let request = call.request.api_request().map_err(BridgeError::from)?;
            if SUBMIT_GUARDS.with(|guards| guards.borrow().is_blocked(&self.form)) {
                debug!(form = %self.form, "save ignored while validation is pending");
                return Ok(());
            }
            acquire_busy(&self.form);
            if !validate_required_fields(Some(self.form.as_str()), &self.form)? {
                return Ok(());
            }
            send_edit(request, call, self.form.clone(), false);
            Ok(())
        }

        pub fn delete_confirm(&self, cfg: JsValue) -> Result<(), JsValue> {
            let call = EditCall::from_js(&cfg)?;
            Ok(apply_delete_action(&self.form, DeleteAction::Confirm, Some(call))?)
        }

        pub fn delete_execute(&self, cfg: JsValue) -> Result<(), JsValue> {
            let call = EditCall::from_js(&cfg)?;
            Ok(apply_delete_action(&self.form, DeleteAction::Execute, Some(call))?)
        }

        pub fn delete_cancel(&self, cfg: JsValue) -> Result<(), JsValue> {
            let call = EditCall::from_js(&cfg)?;
            Ok(apply_delete_action(&self.form, DeleteAction::Cancel, Some(call))?)
        }
    }

    /// Buttons rendered in the delete container reuse the call stored by the
    /// last `delete_*` invocation.
    pub(super) fn handle_delete_action(form: &str, action: DeleteAction) -> Result<(), BridgeError> {
        apply_delete_action(form, action, None)
    }

    /// Transition errors are returned untouched so the page sees a refused
    /// double submit; the workflow is left as it was.
    fn apply_delete_action(form: &str, action: DeleteAction, call: Option<EditCall>) -> Result<(), BridgeError> {
        let execute = EDIT_FORMS.with(|forms| -> Result<Option<EditCall>, BridgeError> {
            let mut forms = forms.borrow_mut();
            let session = forms
                .get_mut(form)
                .ok_or_else(|| format!("no edit form registered for '{form}'"))?;
            if let Some(call) = call {
                session.pending = Some(call);
            }
            let execute = match action {
                DeleteAction::Execute => Some(
                    session
                        .pending
                        .clone()
                        .ok_or_else(|| format!("no delete request for '{form}'"))?,
                ),
                DeleteAction::Confirm | DeleteAction::Cancel => None,
            };
            match action {
                DeleteAction::Confirm => session.workflow.confirm(),
                DeleteAction::Cancel => session.workflow.cancel(),
                DeleteAction::Execute => session.workflow.execute(),
            }?;
            Ok(execute)
        })?;
        render_delete(form)?;
        let Some(call) = execute else {
            return Ok(());
        };
        let request = match call.request.api_request() {
            Ok(request) => request,
            Err(error) => {
                finish_delete(form, false)?;
                return Err(error.into());
            }
        };
        acquire_busy(form);
        send_edit(request, call, form.to_string(), true);
        Ok(())
    }

    fn render_delete(form: &str) -> Result<(), String> {
        let rendered = EDIT_FORMS.with(|forms| {
            forms.borrow().get(form).map(|session| {
                let prompt = session
                    .pending
                    .as_ref()
                    .map_or(DEFAULT_DELETE_PROMPT, |call| call.request.prompt())
                    .to_string();
                (
                    session.container.clone(),
                    render_delete_container(&session.workflow, form, &prompt).into_string(),
                )
            })
        });
        match rendered {
            Some((container, html)) => set_inner_html(&container, &html),
            None => Ok(()),
        }
    }

    fn finish_delete(form: &str, succeeded: bool) -> Result<(), String> {
        EDIT_FORMS.with(|forms| {
            if let Some(session) = forms.borrow_mut().get_mut(form) {
                let finished = if succeeded {
                    session.workflow.complete()
                } else {
                    session.workflow.fail()
                };
                if let Err(error) = finished {
                    debug!(%error, form, "delete already settled");
                }
            }
        });
        render_delete(form)
    }

    fn send_edit(request: ApiRequest, call: EditCall, holder: String, deleting: bool) {
        spawn_local(async move {
            let route = call.route();
            let outcome = submit(&request, &holder, route != ResponseRoute::Ignore).await;
            if deleting {
                if let Err(error) = finish_delete(&holder, outcome.is_ok()) {
                    warn!(%error, form = %holder, "delete container not updated");
                }
            }
            if let Ok(body) = outcome {
                deliver_response(&route, &body, call.callback.as_ref(), &holder);
            }
        });
    }
