use super::*;

    pub(super) fn window() -> Result<web_sys::Window, String> {
        web_sys::window().ok_or_else(|| "window is unavailable".to_string())
    }

    pub(super) fn document() -> Result<web_sys::Document, String> {
        window()?
            .document()
            .ok_or_else(|| "document is unavailable".to_string())
    }

    pub(super) fn body() -> Result<HtmlElement, String> {
        document()?
            .body()
            .ok_or_else(|| "document body is unavailable".to_string())
    }

    pub(super) fn query(selector: &str) -> Result<Option<Element>, String> {
        document()?
            .query_selector(selector)
            .map_err(|_| format!("invalid selector '{selector}'"))
    }

    pub(super) fn query_all(selector: &str) -> Result<Vec<Element>, String> {
        let list = document()?
            .query_selector_all(selector)
            .map_err(|_| format!("invalid selector '{selector}'"))?;
        Ok(node_list_elements(&list))
    }

    pub(super) fn query_all_in(scope: &Element, selector: &str) -> Result<Vec<Element>, String> {
        let list = scope
            .query_selector_all(selector)
            .map_err(|_| format!("invalid selector '{selector}'"))?;
        Ok(node_list_elements(&list))
    }

    fn node_list_elements(list: &web_sys::NodeList) -> Vec<Element> {
        (0..list.length())
            .filter_map(|index| list.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    pub(super) fn set_display(selector: &str, visible: bool) -> Result<(), String> {
        for element in query_all(selector)? {
            let Ok(element) = element.dyn_into::<HtmlElement>() else {
                continue;
            };
            let result = if visible {
                element.style().remove_property("display").map(|_| ())
            } else {
                element.style().set_property("display", "none")
            };
            result.map_err(|_| format!("failed to toggle display of '{selector}'"))?;
        }
        Ok(())
    }

    pub(super) fn set_inner_html(selector: &str, html: &str) -> Result<(), String> {
        for element in query_all(selector)? {
            element.set_inner_html(html);
        }
        Ok(())
    }

    pub(super) fn remove_elements(selector: &str) -> Result<(), String> {
        for element in query_all(selector)? {
            element.remove();
        }
        Ok(())
    }

    pub(super) fn set_busy_class(busy: bool) {
        let class = current_config().busy_class;
        let result = body().and_then(|body| {
            let classes = body.class_list();
            let toggled = if busy {
                classes.add_1(&class)
            } else {
                classes.remove_1(&class)
            };
            toggled.map_err(|_| format!("failed to toggle body class '{class}'"))
        });
        if let Err(error) = result {
            warn!(%error, busy, "busy indicator not updated");
        }
    }

    /// Sets a hidden input inside `form_selector`, creating it when missing.
    pub(super) fn upsert_hidden_field(form_selector: &str, name: &str, value: &str) -> Result<(), String> {
        let form = query(form_selector)?.ok_or_else(|| format!("form '{form_selector}' not found"))?;
        let existing = form
            .query_selector(&input_by_name(name))
            .map_err(|_| format!("invalid field name '{name}'"))?;
        let input = match existing {
            Some(element) => element
                .dyn_into::<HtmlInputElement>()
                .map_err(|_| format!("field '{name}' is not an input"))?,
            None => {
                let input = document()?
                    .create_element("input")
                    .map_err(|_| "failed to create hidden input".to_string())?
                    .dyn_into::<HtmlInputElement>()
                    .map_err(|_| "hidden input is not HtmlInputElement".to_string())?;
                input.set_type(HIDDEN_INPUT_TYPE);
                input.set_name(name);
                form.append_child(&input)
                    .map_err(|_| "failed to append hidden input".to_string())?;
                input
            }
        };
        input.set_value(value);
        Ok(())
    }

    pub(super) fn navigate(url: &str) -> Result<(), String> {
        window()?
            .location()
            .set_href(url)
            .map_err(|_| format!("failed to navigate to '{url}'"))
    }

    pub(super) fn alert(message: &str) {
        if let Err(error) = window().and_then(|window| {
            window
                .alert_with_message(message)
                .map_err(|_| "alert failed".to_string())
        }) {
            warn!(%error, message, "alert not shown");
        }
    }

    pub(super) fn console_log_json(value: &Value) {
        web_sys::console::log_1(&json_to_js(value));
    }

    pub(super) fn console_log_text(text: &str) {
        web_sys::console::log_1(&JsValue::from_str(text));
    }

    pub(super) fn call_js(function: &js_sys::Function, argument: &JsValue) {
        if let Err(error) = function.call1(&JsValue::NULL, argument) {
            error!(error = ?error, "page callback threw");
        }
    }

    /// `null` and `undefined` both come back as `Value::Null`.
    pub(super) fn js_to_json(value: &JsValue, what: &'static str) -> Result<Value, BridgeError> {
        if value.is_null() || value.is_undefined() {
            return Ok(Value::Null);
        }
        let text = js_sys::JSON::stringify(value)
            .map_err(|_| BridgeError::Options {
                what,
                detail: "value is not serializable".to_string(),
            })?
            .as_string()
            .unwrap_or_default();
        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|error| BridgeError::Options {
            what,
            detail: error.to_string(),
        })
    }

    pub(super) fn json_to_js(value: &Value) -> JsValue {
        js_sys::JSON::parse(&value.to_string()).unwrap_or(JsValue::NULL)
    }

    pub(super) fn parse_options<T: serde::de::DeserializeOwned>(
        value: &JsValue,
        what: &'static str,
    ) -> Result<T, BridgeError> {
        let json = match js_to_json(value, what)? {
            Value::Null => Value::Object(serde_json::Map::new()),
            json => json,
        };
        serde_json::from_value(json).map_err(|error| BridgeError::Options {
            what,
            detail: error.to_string(),
        })
    }

    pub(super) fn js_property(object: &JsValue, key: &str) -> Option<JsValue> {
        if !object.is_object() {
            return None;
        }
        js_sys::Reflect::get(object, &JsValue::from_str(key))
            .ok()
            .filter(|value| !value.is_undefined() && !value.is_null())
    }

    pub(super) fn js_function(object: &JsValue, key: &str) -> Option<js_sys::Function> {
        js_property(object, key).and_then(|value| value.dyn_into::<js_sys::Function>().ok())
    }

    pub(super) struct DocumentCookies {
        document: web_sys::HtmlDocument,
    }

    impl DocumentCookies {
        pub(super) fn new() -> Result<Self, BridgeError> {
            let document = document()?
                .dyn_into::<web_sys::HtmlDocument>()
                .map_err(|_| "document is not an HTML document".to_string())?;
            Ok(Self { document })
        }
    }

    impl dw_utilities_core::cookie::CookieStore for DocumentCookies {
        type Error = String;

        fn read_all(&self) -> Result<String, String> {
            self.document
                .cookie()
                .map_err(|_| "document.cookie is unreadable".to_string())
        }

        fn write(&self, assignment: &str) -> Result<(), String> {
            self.document
                .set_cookie(assignment)
                .map_err(|_| "document.cookie is not writable".to_string())
        }
    }
