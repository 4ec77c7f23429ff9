#![allow(clippy::needless_pass_by_value)]

#[cfg(any(target_arch = "wasm32", test))]
mod delegation;
#[cfg(target_arch = "wasm32")]
mod wasm_constants;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use dw_utilities_core::config::{Config, ConfigError};
    use dw_utilities_core::cookie::{CookieError, CookieJar, CookieJarError, parse_cookie_header};
    use dw_utilities_core::edit_form::{
        ACTION_ATTRIBUTE, DeleteAction, DeleteTransitionError, DeleteWorkflow, EditFormOptions, EditRequest,
        EditRequestError, FORM_KEY_ATTRIBUTE, ResponseRoute, render_delete_container,
    };
    use dw_utilities_core::modal::{
        ButtonRegistry, MODAL_BUTTON_ATTRIBUTE, MODAL_ID_ATTRIBUTE, ModalConfig, ModalConfigError,
        alert_modal, group_id, modal_id_from_entropy, render_modal,
    };
    use dw_utilities_core::payload::{FormPayload, PayloadError};
    use dw_utilities_core::request::{ApiRequest, RequestError};
    use dw_utilities_core::selector::{attribute_selector, input_by_name};
    use dw_utilities_core::session::{BusyTracker, PAGE_HOLDER, SubmitGuards};
    use dw_utilities_core::token::{TokenDecodeError, decode_token_payload_unverified};
    use dw_utilities_core::upload::{UPLOAD_DELETE_ATTRIBUTE, UploadConfigError};
    use serde::Deserialize;
    use serde_json::Value;
    use thiserror::Error;
    use tracing::{debug, error, info, warn};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::{Element, HtmlElement, HtmlInputElement};

    use crate::delegation::{ClickAttributes, DELEGATED_CLICK_SELECTOR, DelegatedAction};
    use crate::wasm_constants::*;

    mod dialogs;
    mod dom;
    mod editing;
    mod forms;
    mod lifecycle;
    mod logging;
    mod network;
    mod uploads;

    use dialogs::*;
    use dom::*;
    use editing::*;
    use forms::*;
    use lifecycle::*;
    use logging::*;
    use network::*;
    use uploads::*;

    thread_local! {
        static CONFIG: RefCell<Config> = RefCell::new(Config::default());
        static BUSY: RefCell<BusyTracker> = RefCell::new(BusyTracker::default());
        static SUBMIT_GUARDS: RefCell<SubmitGuards> = RefCell::new(SubmitGuards::default());
        static MODAL_BUTTONS: RefCell<ButtonRegistry<ButtonCallback>> = RefCell::new(ButtonRegistry::default());
        static EDIT_FORMS: RefCell<HashMap<String, EditFormSession>> = RefCell::new(HashMap::new());
        static UPLOAD_WIDGETS: RefCell<HashMap<String, UploadWidget>> = RefCell::new(HashMap::new());
        static DELEGATED_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
    }

    /// Everything that can go wrong between a page script call and the core.
    #[derive(Debug, Error)]
    pub(super) enum BridgeError {
        #[error("invalid {what}: {detail}")]
        Options { what: &'static str, detail: String },
        #[error("{0}")]
        Dom(String),
        #[error(transparent)]
        Config(#[from] ConfigError),
        #[error(transparent)]
        Cookie(#[from] CookieError),
        #[error(transparent)]
        Token(#[from] TokenDecodeError),
        #[error(transparent)]
        Modal(#[from] ModalConfigError),
        #[error(transparent)]
        Edit(#[from] EditRequestError),
        #[error(transparent)]
        Delete(#[from] DeleteTransitionError),
        #[error(transparent)]
        Upload(#[from] UploadConfigError),
        #[error(transparent)]
        Payload(#[from] PayloadError),
    }

    impl From<String> for BridgeError {
        fn from(message: String) -> Self {
            Self::Dom(message)
        }
    }

    impl From<CookieJarError<String>> for BridgeError {
        fn from(error: CookieJarError<String>) -> Self {
            match error {
                CookieJarError::Cookie(error) => Self::Cookie(error),
                CookieJarError::Store(message) => Self::Dom(message),
            }
        }
    }

    impl From<BridgeError> for JsValue {
        fn from(error: BridgeError) -> Self {
            JsValue::from_str(&error.to_string())
        }
    }

    pub(super) fn current_config() -> Config {
        CONFIG.with(|config| config.borrow().clone())
    }

    pub(super) fn acquire_busy(holder: &str) {
        if BUSY.with(|busy| busy.borrow_mut().acquire(holder)) {
            set_busy_class(true);
        }
    }

    pub(super) fn release_busy(holder: &str) {
        if BUSY.with(|busy| busy.borrow_mut().release(holder)) {
            set_busy_class(false);
        }
    }

    /// Error-path release: the busy class goes whenever no holder remains.
    pub(super) fn settle_busy(holder: &str) {
        if BUSY.with(|busy| busy.borrow_mut().settle(holder)) {
            set_busy_class(false);
        }
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        let loaded = load_page_config();
        let config = match &loaded {
            Ok(config) => config.clone(),
            Err(_) => Config::default(),
        };
        init_logging(&config.log_filter);
        if let Err(error) = loaded {
            warn!(%error, "page configuration rejected, using defaults");
        }
        CONFIG.with(|slot| *slot.borrow_mut() = config);
        if let Err(error) = install_click_delegation() {
            error!(%error, "delegated click handling unavailable");
        }
        info!("dw utilities ready");
    }

    /// Replaces the active configuration; missing keys take their defaults.
    #[wasm_bindgen]
    pub fn configure(options: JsValue) -> Result<(), JsValue> {
        let value = js_to_json(&options, "configuration")?;
        let config = Config::from_json(&value.to_string()).map_err(BridgeError::from)?;
        debug!(?config, "configuration replaced");
        CONFIG.with(|slot| *slot.borrow_mut() = config);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn api_request(cfg: JsValue) -> Result<(), JsValue> {
        let callback = js_function(&cfg, CALLBACK_KEY);
        let options: ApiRequestOptions = parse_options(&cfg, "request")?;
        let (request, holder) = options.into_parts()?;
        spawn_local(async move {
            let needs_body = callback.is_some() || request.debug;
            let Ok(body) = submit(&request, &holder, needs_body).await else {
                return;
            };
            match callback {
                Some(callback) => call_js(&callback, &json_to_js(&body)),
                None if request.debug => console_log_json(&body),
                None => {}
            }
        });
        Ok(())
    }

    #[wasm_bindgen]
    pub fn serialize(form: web_sys::HtmlFormElement) -> Result<String, JsValue> {
        Ok(serialize_form(&form).map_err(BridgeError::from)?)
    }

    /// Runs `callback` once when every required field in `scope` (or the whole
    /// document) has a value and nothing is flagged invalid.
    #[wasm_bindgen]
    pub fn form_validate(callback: js_sys::Function, scope: Option<String>) -> Result<bool, JsValue> {
        let valid = validate_required_fields(scope.as_deref(), PAGE_HOLDER)?;
        if valid {
            callback.call0(&JsValue::NULL)?;
        }
        Ok(valid)
    }

    #[wasm_bindgen]
    pub fn validate_input(cfg: JsValue) -> Result<(), JsValue> {
        Ok(validate_single_input(&cfg)?)
    }

    #[wasm_bindgen]
    pub fn display_error(name: String, message: String) -> Result<(), JsValue> {
        Ok(display_field_error(&name, &message).map_err(BridgeError::from)?)
    }

    #[wasm_bindgen]
    pub fn remove_error(name: String) -> Result<(), JsValue> {
        Ok(remove_field_error(&name).map_err(BridgeError::from)?)
    }

    /// `key=value` pairs joined by `&`, without percent-encoding.
    #[wasm_bindgen]
    pub fn formbody_encode(data: JsValue) -> Result<String, JsValue> {
        let value = js_to_json(&data, "form body")?;
        Ok(FormPayload::from_json_object(&value)
            .map_err(BridgeError::from)?
            .encode_raw())
    }

    #[wasm_bindgen]
    pub fn busy_acquire(key: String) {
        acquire_busy(&key);
    }

    #[wasm_bindgen]
    pub fn busy_release(key: String) {
        release_busy(&key);
    }

    #[wasm_bindgen]
    pub fn cookie_set(name: String, value: String, days: Option<f64>) -> Result<(), JsValue> {
        let days = days.map_or_else(|| current_config().cookie_days, |days| days.round() as i64);
        let jar = CookieJar::new(DocumentCookies::new()?);
        jar.set(&name, &value, days, js_sys::Date::now() as i64)
            .map_err(BridgeError::from)?;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn cookie_get(name: String) -> Result<Option<String>, JsValue> {
        let jar = CookieJar::new(DocumentCookies::new()?);
        Ok(jar.get(&name).map_err(BridgeError::from)?)
    }

    #[wasm_bindgen]
    pub fn cookie_delete(name: String) -> Result<(), JsValue> {
        let jar = CookieJar::new(DocumentCookies::new()?);
        jar.delete(&name).map_err(BridgeError::from)?;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn cookie_parse(raw: String) -> Result<JsValue, JsValue> {
        let cookies = parse_cookie_header(&raw).map_err(BridgeError::from)?;
        let value = serde_json::to_value(cookies).map_err(|error| BridgeError::Options {
            what: "cookie header",
            detail: error.to_string(),
        })?;
        Ok(json_to_js(&value))
    }

    /// Claims of a JSON Web Token. The signature is NOT checked.
    #[wasm_bindgen]
    pub fn jwt_decode_unverified(token: String) -> Result<JsValue, JsValue> {
        let claims = decode_token_payload_unverified(&token).map_err(BridgeError::from)?;
        Ok(json_to_js(&claims))
    }

    /// Renders and opens a dialog, returning its id.
    #[wasm_bindgen]
    pub fn modal(cfg: JsValue) -> Result<String, JsValue> {
        Ok(show_modal_from_js(&cfg)?)
    }

    #[wasm_bindgen]
    pub fn modal_destroy(id: String) -> Result<(), JsValue> {
        Ok(destroy_modal(&id)?)
    }

    #[wasm_bindgen]
    pub fn edit_form(options: JsValue) -> Result<EditForm, JsValue> {
        Ok(open_edit_form(&options)?)
    }

    #[wasm_bindgen]
    pub fn upload_initialize(id: String, cfg: JsValue) -> Result<(), JsValue> {
        Ok(initialize_upload(&id, &cfg)?)
    }

    #[wasm_bindgen]
    pub fn upload_delete(id: String, cfg: JsValue) -> Result<(), JsValue> {
        Ok(delete_upload(&id, &cfg)?)
    }
}
