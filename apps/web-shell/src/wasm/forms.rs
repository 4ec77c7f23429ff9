use super::*;

    use dw_utilities_core::form::{
        FieldKind, FieldSnapshot, RICH_TEXT_CONTENT_SELECTOR, RICH_TEXT_EDITOR_SELECTOR,
        RICH_TEXT_TARGET_ATTRIBUTE, serialize_fields,
    };
    use dw_utilities_core::validation::{
        FIELD_CONTROL_SELECTOR, FIELD_FEEDBACK_SELECTOR, FieldVerdict, INVALID_CLASS, INVALID_SELECTOR,
        InputRule, REQUIRED_FIELDS_SELECTOR, REQUIRED_MESSAGE, RequiredField, field_group_selector,
        required_verdict, validate_required,
    };
    use web_sys::{HtmlButtonElement, HtmlOptionElement, HtmlSelectElement, HtmlTextAreaElement};

    pub(super) fn serialize_form(form: &web_sys::HtmlFormElement) -> Result<String, String> {
        mirror_rich_text()?;
        let controls = form.elements();
        let fields: Vec<FieldSnapshot> = (0..controls.length())
            .filter_map(|index| controls.item(index))
            .filter_map(|element| snapshot(&element))
            .collect();
        Ok(serialize_fields(&fields))
    }

    /// Copies each rich text editor's markup into the input it targets.
    fn mirror_rich_text() -> Result<(), String> {
        for editor in query_all(RICH_TEXT_EDITOR_SELECTOR)? {
            let Some(target) = editor.get_attribute(RICH_TEXT_TARGET_ATTRIBUTE) else {
                continue;
            };
            let html = editor
                .query_selector(RICH_TEXT_CONTENT_SELECTOR)
                .ok()
                .flatten()
                .map(|content| content.inner_html())
                .unwrap_or_default();
            for input in query_all(&input_by_name(&target))? {
                set_field_value(&input, &html);
            }
        }
        Ok(())
    }

    fn snapshot(element: &Element) -> Option<FieldSnapshot> {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            return Some(FieldSnapshot {
                name: input.name(),
                kind: FieldKind::from_type(&input.type_()),
                disabled: input.disabled(),
                checked: input.checked(),
                value: input.value(),
                selected_values: Vec::new(),
            });
        }
        if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            let options = select.selected_options();
            let selected_values = (0..options.length())
                .filter_map(|index| options.item(index))
                .filter_map(|option| option.dyn_into::<HtmlOptionElement>().ok())
                .map(|option| option.value())
                .collect();
            return Some(FieldSnapshot {
                name: select.name(),
                kind: FieldKind::from_type(&select.type_()),
                disabled: select.disabled(),
                checked: false,
                value: select.value(),
                selected_values,
            });
        }
        if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
            return Some(FieldSnapshot {
                name: textarea.name(),
                kind: FieldKind::Value,
                disabled: textarea.disabled(),
                checked: false,
                value: textarea.value(),
                selected_values: Vec::new(),
            });
        }
        let button = element.dyn_ref::<HtmlButtonElement>()?;
        Some(FieldSnapshot {
            name: button.name(),
            kind: FieldKind::from_type(&button.type_()),
            disabled: button.disabled(),
            checked: false,
            value: button.value(),
            selected_values: Vec::new(),
        })
    }

    pub(super) fn field_value(element: &Element) -> String {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
            textarea.value()
        } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else {
            element.get_attribute("value").unwrap_or_default()
        }
    }

    fn set_field_value(element: &Element, value: &str) {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
            textarea.set_value(value);
        }
    }

    /// Elements matching `selector` under `scope`, or document-wide when the
    /// scope is absent or matches nothing.
    pub(super) fn scoped_elements(scope: Option<&str>, selector: &str) -> Result<Vec<Element>, String> {
        match scope.map(query).transpose()?.flatten() {
            Some(root) => query_all_in(&root, selector),
            None => query_all(selector),
        }
    }

    /// Required-field pass. On failure the page holder and `holder` are
    /// released and the failure dialog is shown.
    pub(super) fn validate_required_fields(scope: Option<&str>, holder: &str) -> Result<bool, BridgeError> {
        let previously_invalid = scoped_elements(scope, INVALID_SELECTOR)?.len();
        let elements = scoped_elements(scope, REQUIRED_FIELDS_SELECTOR)?;
        let required: Vec<RequiredField> = elements
            .iter()
            .map(|element| RequiredField::new(&field_value(element)))
            .collect();
        let report = validate_required(&required, previously_invalid);
        for index in &report.mark_invalid {
            let Some(element) = elements.get(*index) else {
                continue;
            };
            element
                .class_list()
                .add_1(INVALID_CLASS)
                .map_err(|_| "failed to flag required field".to_string())?;
            if let Some(feedback) = element.next_element_sibling() {
                feedback.set_inner_html(REQUIRED_MESSAGE);
            }
        }
        let Some(failure) = report.failure else {
            return Ok(true);
        };
        debug!(?failure, missing = report.mark_invalid.len(), "form rejected");
        settle_busy(holder);
        settle_busy(PAGE_HOLDER);
        show_modal(&failure.failure_modal(), Vec::new())?;
        Ok(false)
    }

    pub(super) fn display_field_error(name: &str, message: &str) -> Result<(), String> {
        let (control, feedback) = field_group(name)?;
        control
            .class_list()
            .add_1(INVALID_CLASS)
            .map_err(|_| format!("failed to flag field '{name}'"))?;
        feedback.set_inner_html(message);
        Ok(())
    }

    pub(super) fn remove_field_error(name: &str) -> Result<(), String> {
        let (control, feedback) = field_group(name)?;
        control
            .class_list()
            .remove_1(INVALID_CLASS)
            .map_err(|_| format!("failed to clear field '{name}'"))?;
        feedback.set_inner_html("");
        Ok(())
    }

    fn field_group(name: &str) -> Result<(Element, Element), String> {
        let control = query(&field_group_selector(name, FIELD_CONTROL_SELECTOR))?
            .ok_or_else(|| format!("no form control for '{name}'"))?;
        let feedback = query(&field_group_selector(name, FIELD_FEEDBACK_SELECTOR))?
            .ok_or_else(|| format!("no feedback element for '{name}'"))?;
        Ok((control, feedback))
    }

    fn apply_verdict(name: &str, verdict: &FieldVerdict) -> Result<(), String> {
        match verdict {
            FieldVerdict::Valid => remove_field_error(name),
            FieldVerdict::Invalid(message) => display_field_error(name, message),
        }
    }

    /// Checks one field against its rule. A uniqueness check holds the form's
    /// submit guard until the server answers.
    pub(super) fn validate_single_input(cfg: &JsValue) -> Result<(), BridgeError> {
        let element = js_property(cfg, ELEMENT_KEY).and_then(|value| value.dyn_into::<Element>().ok());
        let rule: InputRule = parse_options(&without_element(cfg), "input rule")?;
        let value = match element {
            Some(element) => field_value(&element),
            None => query(&field_group_selector(&rule.input, FIELD_CONTROL_SELECTOR))?
                .map(|element| field_value(&element))
                .unwrap_or_default(),
        };

        if let Some(unique) = rule.unique.clone() {
            let config = current_config();
            let guard = rule
                .form
                .clone()
                .filter(|form| !form.trim().is_empty())
                .unwrap_or(config.append_form_selector);
            let request = ApiRequest::new(config.validate_unique_url, unique.payload(&value));
            SUBMIT_GUARDS.with(|guards| guards.borrow_mut().begin(&guard));
            spawn_local(async move {
                if let Ok(body) = submit(&request, PAGE_HOLDER, true).await {
                    if let Err(error) = apply_verdict(&rule.input, &unique.verdict(&body)) {
                        warn!(%error, input = %rule.input, "uniqueness result not shown");
                    }
                }
                SUBMIT_GUARDS.with(|guards| guards.borrow_mut().end(&guard));
            });
        } else if rule.required {
            apply_verdict(&rule.input, &required_verdict(&value))?;
        }
        Ok(())
    }

    /// Shallow copy of `cfg` minus the DOM element, which is not JSON.
    fn without_element(cfg: &JsValue) -> JsValue {
        if !cfg.is_object() {
            return cfg.clone();
        }
        let copy = js_sys::Object::assign(&js_sys::Object::new(), cfg.unchecked_ref());
        if let Err(error) = js_sys::Reflect::delete_property(&copy, &JsValue::from_str(ELEMENT_KEY)) {
            warn!(?error, "input rule element not stripped");
        }
        copy.into()
    }
