use super::*;

    use dw_utilities_core::upload::{
        DROP_TARGET_SELECTOR, EMPTY_PROMPT_SELECTOR, ERROR_CLASS, NEW_UPLOAD_SELECTOR,
        PREVIEW_IMAGE_SELECTOR, PREVIEW_SELECTOR, UPLOAD_ATTRIBUTE, UploadConfig, UploadDeleteOptions,
        UploadEffect, UploadEvent, UploadResponse, UploadWorkflow, confirm_delete_modal,
        hidden_field_name, merge_dropzone_options, widget_selector,
    };

    #[wasm_bindgen]
    extern "C" {
        #[derive(Clone)]
        pub(super) type Dropzone;

        #[wasm_bindgen(constructor, catch)]
        fn new(element: &Element, options: &JsValue) -> Result<Dropzone, JsValue>;

        #[wasm_bindgen(method)]
        fn on(this: &Dropzone, event: &str, handler: &js_sys::Function);

        #[wasm_bindgen(method, js_name = removeAllFiles)]
        fn remove_all_files(this: &Dropzone, cancel_if_necessary: bool);

        #[wasm_bindgen(method)]
        fn destroy(this: &Dropzone);
    }

    pub(super) struct UploadWidget {
        dropzone: Dropzone,
        workflow: UploadWorkflow,
        _handlers: Vec<Closure<dyn FnMut(JsValue, JsValue)>>,
    }

    /// Where an upload's effects land.
    struct EffectScope {
        id: String,
        append_form: String,
        holder: String,
    }

    impl EffectScope {
        fn of(workflow: &UploadWorkflow) -> Self {
            Self {
                id: workflow.id().to_string(),
                append_form: workflow.append_form().to_string(),
                holder: workflow.busy_holder(),
            }
        }
    }

    pub(super) fn initialize_upload(id: &str, cfg: &JsValue) -> Result<(), BridgeError> {
        let config = current_config();
        let mut upload = UploadConfig::from_json(js_to_json(cfg, "upload configuration")?)?;
        if let Some(image) = query(&widget_selector(id, PREVIEW_IMAGE_SELECTOR))? {
            upload.preview_class_extra = Some(image.class_name());
        }
        let Some(target) = query(&widget_selector(id, DROP_TARGET_SELECTOR))? else {
            debug!(id, "no drop target, upload widget skipped");
            return Ok(());
        };

        let options = match js_property(cfg, DZ_OPTIONS_KEY) {
            Some(options) if options.is_object() => options,
            _ => js_sys::Object::new().into(),
        };
        for (key, value) in merge_dropzone_options(id, upload.dz_options.clone(), &config) {
            let key = JsValue::from_str(&key);
            if js_sys::Reflect::has(&options, &key).unwrap_or(false) {
                continue;
            }
            js_sys::Reflect::set(&options, &key, &json_to_js(&value))
                .map_err(|_| "failed to set dropzone option".to_string())?;
        }

        if let Some(previous) = UPLOAD_WIDGETS.with(|widgets| widgets.borrow_mut().remove(id)) {
            previous.dropzone.destroy();
        }
        let dropzone = Dropzone::new(&target, &options).map_err(|error| BridgeError::Options {
            what: "dropzone options",
            detail: error.as_string().unwrap_or_else(|| format!("{error:?}")),
        })?;
        let handlers = bind_dropzone_events(&dropzone, id);
        let workflow = UploadWorkflow::new(id, &upload, &config);
        UPLOAD_WIDGETS.with(|widgets| {
            widgets.borrow_mut().insert(
                id.to_string(),
                UploadWidget {
                    dropzone,
                    workflow,
                    _handlers: handlers,
                },
            );
        });
        info!(id, "upload widget ready");
        Ok(())
    }

    fn bind_dropzone_events(dropzone: &Dropzone, id: &str) -> Vec<Closure<dyn FnMut(JsValue, JsValue)>> {
        let bind = |event: &str, handler: Box<dyn FnMut(JsValue, JsValue)>| {
            let closure = Closure::<dyn FnMut(JsValue, JsValue)>::wrap(handler);
            dropzone.on(event, closure.as_ref().unchecked_ref());
            closure
        };
        let widget = id.to_string();
        let error = bind(
            "error",
            Box::new(move |_file, message| {
                dispatch_upload_event(&widget, UploadEvent::Error(error_text(&message)));
            }),
        );
        let widget = id.to_string();
        let thumbnail = bind(
            "thumbnail",
            Box::new(move |_file, _data_url| dispatch_upload_event(&widget, UploadEvent::Thumbnail)),
        );
        let widget = id.to_string();
        let progress = bind(
            "uploadprogress",
            Box::new(move |_file, progress| {
                let percent = progress.as_f64().unwrap_or_default();
                dispatch_upload_event(&widget, UploadEvent::Progress(percent));
            }),
        );
        let widget = id.to_string();
        let success = bind(
            "success",
            Box::new(move |file, response| {
                let event = match upload_response(&file, &response) {
                    Ok(response) => UploadEvent::Success(response),
                    Err(error) => {
                        warn!(%error, id = %widget, "upload response unreadable");
                        UploadEvent::Error("The server response could not be read.".to_string())
                    }
                };
                dispatch_upload_event(&widget, event);
            }),
        );
        vec![error, thumbnail, progress, success]
    }

    /// Prefers the raw `file.xhr.responseText`; Dropzone's own parsed copy is
    /// the fallback.
    fn upload_response(file: &JsValue, response: &JsValue) -> Result<UploadResponse, BridgeError> {
        let raw = js_property(file, "xhr")
            .and_then(|xhr| js_property(&xhr, "responseText"))
            .and_then(|text| text.as_string());
        if let Some(raw) = raw {
            return Ok(UploadResponse::parse(&raw)?);
        }
        if let Some(raw) = response.as_string() {
            return Ok(UploadResponse::parse(&raw)?);
        }
        Ok(UploadResponse::from_value(&js_to_json(response, "upload response")?))
    }

    fn error_text(message: &JsValue) -> String {
        if let Some(text) = message.as_string() {
            return text;
        }
        match js_to_json(message, "upload error") {
            Ok(Value::Object(body)) => body
                .get("error_message")
                .and_then(Value::as_str)
                .map_or_else(|| Value::Object(body.clone()).to_string(), ToString::to_string),
            Ok(other) => other.to_string(),
            Err(error) => error.to_string(),
        }
    }

    pub(super) fn dispatch_upload_event(id: &str, event: UploadEvent) {
        let applied = UPLOAD_WIDGETS.with(|widgets| {
            let mut widgets = widgets.borrow_mut();
            let widget = widgets.get_mut(id)?;
            let effects = widget.workflow.apply(event);
            Some((EffectScope::of(&widget.workflow), effects))
        });
        match applied {
            Some((scope, effects)) => apply_effects(&scope, effects),
            None => debug!(id, "event for unknown upload widget"),
        }
    }

    fn apply_effects(scope: &EffectScope, effects: Vec<UploadEffect>) {
        for effect in effects {
            debug!(id = %scope.id, ?effect, "upload effect");
            if let Err(error) = apply_effect(scope, effect) {
                warn!(%error, id = %scope.id, "upload effect failed");
            }
        }
    }

    fn apply_effect(scope: &EffectScope, effect: UploadEffect) -> Result<(), String> {
        let id = scope.id.as_str();
        match effect {
            UploadEffect::HideEmptyPrompt => set_display(&widget_selector(id, EMPTY_PROMPT_SELECTOR), false),
            UploadEffect::ShowEmptyPrompt => set_display(&widget_selector(id, EMPTY_PROMPT_SELECTOR), true),
            UploadEffect::HideDropTarget => set_display(&widget_selector(id, DROP_TARGET_SELECTOR), false),
            UploadEffect::ShowDropTarget => set_display(&widget_selector(id, DROP_TARGET_SELECTOR), true),
            UploadEffect::MarkBusy => {
                acquire_busy(&scope.holder);
                Ok(())
            }
            UploadEffect::ReleaseBusy => {
                release_busy(&scope.holder);
                Ok(())
            }
            UploadEffect::ShowError { title, message } => {
                let widget = scope.id.clone();
                let acknowledge = ButtonCallback::Native(Rc::new(move |_modal_id: &str| {
                    dispatch_upload_event(&widget, UploadEvent::ErrorAcknowledged);
                }));
                show_alert(&title, &message, Some(acknowledge));
                Ok(())
            }
            UploadEffect::ClearWidget => {
                let dropzone =
                    UPLOAD_WIDGETS.with(|widgets| widgets.borrow().get(id).map(|widget| widget.dropzone.clone()));
                if let Some(dropzone) = dropzone {
                    dropzone.remove_all_files(true);
                }
                Ok(())
            }
            UploadEffect::RenderPreview { html } => set_inner_html(&widget_selector(id, PREVIEW_SELECTOR), &html),
            UploadEffect::AwaitPreviewLoad => await_preview_load(id),
            UploadEffect::ShowPreviewImage => show_new_upload(id),
            UploadEffect::ClearPreview => set_inner_html(&widget_selector(id, PREVIEW_SELECTOR), ""),
            UploadEffect::SetHiddenField { value } => {
                upsert_hidden_field(&scope.append_form, &hidden_field_name(id), &value)
            }
            UploadEffect::RemoveHiddenField => remove_elements(&input_by_name(&hidden_field_name(id))),
            UploadEffect::NotifyDelete { filename } => {
                let config = current_config();
                let request = ApiRequest::new(
                    config.delete_upload_url,
                    FormPayload::new().with(DELETE_UPLOAD_FILENAME_KEY, filename),
                );
                spawn_local(async move {
                    if let Err(error) = submit(&request, PAGE_HOLDER, false).await {
                        debug!(%error, "upload delete not acknowledged");
                    }
                });
                Ok(())
            }
            UploadEffect::ClearErrorClass => {
                if let Some(widget) = query(&attribute_selector(UPLOAD_ATTRIBUTE, id))? {
                    widget
                        .class_list()
                        .remove_1(ERROR_CLASS)
                        .map_err(|_| "failed to clear upload error class".to_string())?;
                }
                Ok(())
            }
        }
    }

    fn await_preview_load(id: &str) -> Result<(), String> {
        let image = query(&widget_selector(id, NEW_UPLOAD_SELECTOR))?
            .and_then(|image| image.dyn_into::<web_sys::HtmlImageElement>().ok());
        let Some(image) = image else {
            dispatch_upload_event(id, UploadEvent::PreviewLoaded);
            return Ok(());
        };
        let widget = id.to_string();
        let on_load = Closure::once_into_js(move || {
            dispatch_upload_event(&widget, UploadEvent::PreviewLoaded);
        });
        image.set_onload(Some(on_load.unchecked_ref()));
        Ok(())
    }

    fn show_new_upload(id: &str) -> Result<(), String> {
        for image in query_all(&widget_selector(id, NEW_UPLOAD_SELECTOR))? {
            if let Ok(image) = image.dyn_into::<HtmlElement>() {
                image
                    .style()
                    .set_property("display", "flex")
                    .map_err(|_| "failed to show uploaded image".to_string())?;
            }
        }
        Ok(())
    }

    pub(super) fn delete_upload(id: &str, cfg: &JsValue) -> Result<(), BridgeError> {
        let options = UploadDeleteOptions::from_json(js_to_json(cfg, "upload delete options")?)?;
        if !options.confirm {
            perform_delete(id, &options);
            return Ok(());
        }
        let widget = id.to_string();
        let confirmed = options.clone();
        let on_yes = ButtonCallback::Native(Rc::new(move |_modal_id: &str| perform_delete(&widget, &confirmed)));
        show_modal(&confirm_delete_modal(options.message_or_default()), vec![(0, on_yes)])?;
        Ok(())
    }

    /// The delete affordance rendered inside a fresh preview.
    pub(super) fn delete_from_preview(id: &str) -> Result<(), BridgeError> {
        let options = UploadDeleteOptions {
            reset: true,
            ..UploadDeleteOptions::default()
        };
        perform_delete(id, &options);
        Ok(())
    }

    /// Runs against the live widget when there is one; a page that only shows
    /// a stored image gets a throwaway workflow.
    fn perform_delete(id: &str, options: &UploadDeleteOptions) {
        let event = UploadEvent::Delete { reset: options.reset };
        let applied = UPLOAD_WIDGETS.with(|widgets| {
            let mut widgets = widgets.borrow_mut();
            let widget = widgets.get_mut(id)?;
            let effects = widget.workflow.apply(event.clone());
            Some((EffectScope::of(&widget.workflow), effects))
        });
        let (mut scope, effects) = applied.unwrap_or_else(|| {
            let upload = UploadConfig {
                append_form: options.append_form.clone(),
                ..UploadConfig::default()
            };
            let mut workflow = UploadWorkflow::new(id, &upload, &current_config());
            let effects = workflow.apply(event);
            (EffectScope::of(&workflow), effects)
        });
        if let Some(form) = options.append_form.as_deref().filter(|form| !form.trim().is_empty()) {
            scope.append_form = form.to_string();
        }
        info!(id, reset = options.reset, "upload removed");
        apply_effects(&scope, effects);
    }
