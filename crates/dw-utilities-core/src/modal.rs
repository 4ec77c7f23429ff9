//! Bootstrap-style modal dialogs rendered from a declarative config.
//!
//! Button callbacks are never written into markup. Each button that has one is
//! tagged with `data-dw-modal` / `data-dw-button` and the closure lives in a
//! [`ButtonRegistry`] table owned by that modal id, so two open dialogs cannot
//! overwrite each other's callbacks.

use std::collections::{BTreeMap, HashMap};

use maud::{Markup, PreEscaped, html};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MODAL_ID_ATTRIBUTE: &str = "data-dw-modal";
pub const MODAL_BUTTON_ATTRIBUTE: &str = "data-dw-button";
const MODAL_ID_PREFIX: &str = "modal";
const MODAL_ID_SUFFIX_LEN: usize = 5;
const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub const WARNING_ICON_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" class="icon mb-2 text-danger icon-lg" width="24" height="24" viewBox="0 0 24 24" stroke-width="2" stroke="currentColor" fill="none" stroke-linecap="round" stroke-linejoin="round"><path stroke="none" d="M0 0h24v24H0z" fill="none"></path><path d="M12 9v2m0 4v.01"></path><path d="M5 19h14a2 2 0 0 0 1.84 -2.75l-7.1 -12.25a2 2 0 0 0 -3.5 0l-7.1 12.25a2 2 0 0 0 1.75 2.75"></path></svg>"#;

#[derive(Debug, Error)]
pub enum ModalConfigError {
    #[error("invalid modal config: {source}")]
    Invalid { source: serde_json::Error },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModalFormat {
    #[default]
    Default,
    Small,
    Large,
    FullWidth,
}

impl ModalFormat {
    fn dialog_class(self) -> &'static str {
        match self {
            Self::Default => "",
            Self::Small => "modal-sm",
            Self::Large => "modal-lg",
            Self::FullWidth => "modal-full-width",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalButton {
    pub label: String,
    pub color: Option<String>,
    pub class_extra: Option<String>,
    pub close_modal: bool,
    /// Set by the browser layer when the source config carried a callback.
    pub has_callback: bool,
}

impl ModalButton {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Self::default()
        }
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn class_extra(mut self, class_extra: &str) -> Self {
        self.class_extra = Some(class_extra.to_string());
        self
    }

    pub fn closes(mut self) -> Self {
        self.close_modal = true;
        self
    }

    pub fn with_callback(mut self) -> Self {
        self.has_callback = true;
        self
    }
}

/// Title and content are trusted markup fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalConfig {
    pub modal_id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub form: bool,
    pub format: ModalFormat,
    pub centered: bool,
    pub scrollable: bool,
    pub blur: bool,
    pub fade: bool,
    pub theme: Option<String>,
    pub hide_x: bool,
    pub modal_dialog_extra: Option<String>,
    pub modal_content_extra: Option<String>,
    pub modal_header_extra: Option<String>,
    pub modal_title_extra: Option<String>,
    pub modal_body_extra: Option<String>,
    pub modal_footer_extra: Option<String>,
    pub buttons: Vec<ModalButton>,
}

impl ModalConfig {
    pub fn from_json(value: serde_json::Value) -> Result<Self, ModalConfigError> {
        serde_json::from_value(value).map_err(|source| ModalConfigError::Invalid { source })
    }

    /// Caller-supplied id, ignoring blanks.
    pub fn explicit_id(&self) -> Option<&str> {
        self.modal_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn callback_indexes(&self) -> Vec<usize> {
        self.buttons
            .iter()
            .enumerate()
            .filter(|(_, button)| button.has_callback)
            .map(|(index, _)| index)
            .collect()
    }
}

/// Id of the wrapper element each rendered modal lives in.
pub fn group_id(modal_id: &str) -> String {
    format!("{modal_id}-group")
}

/// `modal` followed by five base-36 digits taken from a `[0, 1)` sample.
pub fn modal_id_from_entropy(sample: f64) -> String {
    let mut fraction = if sample.is_finite() { sample.abs().fract() } else { 0.0 };
    let mut id = String::from(MODAL_ID_PREFIX);
    for _ in 0..MODAL_ID_SUFFIX_LEN {
        fraction *= 36.0;
        let digit = (fraction.floor() as usize).min(35);
        fraction -= digit as f64;
        id.push(char::from(BASE36_DIGITS[digit]));
    }
    id
}

pub fn render_modal(config: &ModalConfig, modal_id: &str) -> Markup {
    let small = config.format == ModalFormat::Small;
    let modal_class = class_list(&[
        "modal",
        if config.blur { "modal-blur" } else { "" },
        if config.fade { "fade" } else { "" },
    ]);
    let dialog_class = class_list(&[
        "modal-dialog",
        config.format.dialog_class(),
        if config.centered { "modal-dialog-centered" } else { "" },
        if config.scrollable { "modal-dialog-scrollable" } else { "" },
        extra(&config.modal_dialog_extra),
    ]);
    let title_class = class_list(&["modal-title", extra(&config.modal_title_extra)]);

    html! {
        div class=(modal_class) id=(modal_id) tabindex="-1" role="dialog" aria-hidden="true" {
            div class=(dialog_class) role="document" {
                div class=(class_list(&["modal-content", extra(&config.modal_content_extra)])) {
                    @if let Some(theme) = config.theme.as_deref() {
                        div class={ "modal-status bg-" (theme) } {}
                    }
                    @if small {
                        (close_button(config.hide_x))
                    } @else if let Some(title) = config.title.as_deref() {
                        div class=(class_list(&["modal-header", extra(&config.modal_header_extra)])) {
                            div class=(title_class) { (PreEscaped(title)) }
                            (close_button(config.hide_x))
                        }
                    } @else {
                        (close_button(config.hide_x))
                    }
                    div class=(class_list(&["modal-body", extra(&config.modal_body_extra)])) {
                        @if config.form {
                            form action="javascript:void(0);" { (modal_body(config, small, &title_class)) }
                        } @else {
                            (modal_body(config, small, &title_class))
                        }
                    }
                    div class=(class_list(&["modal-footer", extra(&config.modal_footer_extra)])) {
                        @for (index, button) in config.buttons.iter().enumerate() {
                            (modal_button(modal_id, index, button))
                        }
                    }
                }
            }
        }
        a href="#" class="d-none" data-bs-toggle="modal" data-bs-target={ "#" (modal_id) } {}
    }
}

fn modal_body(config: &ModalConfig, small: bool, title_class: &str) -> Markup {
    html! {
        @if small {
            @if let Some(title) = config.title.as_deref() {
                div class=(title_class) { (PreEscaped(title)) }
            }
            @if let Some(content) = config.content.as_deref() {
                div { (PreEscaped(content)) }
            }
        } @else if let Some(content) = config.content.as_deref() {
            (PreEscaped(content))
        }
    }
}

fn modal_button(modal_id: &str, index: usize, button: &ModalButton) -> Markup {
    let class = class_list(&[
        "btn",
        &button
            .color
            .as_deref()
            .map(|color| format!("btn-{color}"))
            .unwrap_or_default(),
        extra(&button.class_extra),
    ]);
    let dismiss = button.close_modal.then_some("modal");
    let owner = button.has_callback.then_some(modal_id);
    let slot = button.has_callback.then_some(index);
    html! {
        button type="button" class=(class) data-bs-dismiss=[dismiss] data-dw-modal=[owner] data-dw-button=[slot] {
            (PreEscaped(&button.label))
        }
    }
}

fn close_button(hidden: bool) -> Markup {
    html! {
        @if !hidden {
            button type="button" class="btn-close" data-bs-dismiss="modal" aria-label="Close" {}
        }
    }
}

fn extra(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

pub(crate) fn class_list(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Danger-themed small dialog used for every error and confirmation prompt.
pub fn danger_dialog(title: Markup, content: Option<Markup>, buttons: Vec<ModalButton>) -> ModalConfig {
    let title = html! {
        (PreEscaped(WARNING_ICON_SVG)) br; (title)
    };
    ModalConfig {
        title: Some(title.into_string()),
        content: content.map(|content| html! { span class="text-muted" { (content) } }.into_string()),
        format: ModalFormat::Small,
        theme: Some("danger".to_string()),
        modal_title_extra: Some("text-center w-100 pt-2 fs-2".to_string()),
        modal_body_extra: Some("text-center".to_string()),
        modal_footer_extra: Some("border-top-0 bg-transparent".to_string()),
        buttons,
        ..ModalConfig::default()
    }
}

/// OK button that closes the dialog, optionally running a callback first.
pub fn acknowledge_button(with_callback: bool) -> ModalButton {
    let button = ModalButton::new("OK")
        .color("danger")
        .class_extra("w-75 mx-auto mb-3")
        .closes();
    if with_callback { button.with_callback() } else { button }
}

/// Plain-text title and message, both escaped.
pub fn alert_modal(title: &str, message: &str, with_callback: bool) -> ModalConfig {
    danger_dialog(
        html! { (title) },
        Some(html! { (message) }),
        vec![acknowledge_button(with_callback)],
    )
}

/// Callbacks for rendered modal buttons, keyed by modal id then button index.
#[derive(Debug)]
pub struct ButtonRegistry<C> {
    by_modal: HashMap<String, BTreeMap<usize, C>>,
}

impl<C> Default for ButtonRegistry<C> {
    fn default() -> Self {
        Self {
            by_modal: HashMap::new(),
        }
    }
}

impl<C> ButtonRegistry<C> {
    /// Installs the table for `modal_id`, dropping any table it had before.
    pub fn register(&mut self, modal_id: &str, callbacks: impl IntoIterator<Item = (usize, C)>) {
        let table: BTreeMap<usize, C> = callbacks.into_iter().collect();
        if table.is_empty() {
            self.by_modal.remove(modal_id);
        } else {
            self.by_modal.insert(modal_id.to_string(), table);
        }
    }

    pub fn get(&self, modal_id: &str, index: usize) -> Option<&C> {
        self.by_modal.get(modal_id)?.get(&index)
    }

    /// Callback for a clicked button. A button that closes its modal also
    /// drops the modal's table, since nothing in it can be clicked again.
    pub fn press(&mut self, modal_id: &str, index: usize, closes: bool) -> Option<C>
    where
        C: Clone,
    {
        if closes {
            return self.by_modal.remove(modal_id)?.remove(&index);
        }
        self.get(modal_id, index).cloned()
    }

    pub fn remove(&mut self, modal_id: &str) -> bool {
        self.by_modal.remove(modal_id).is_some()
    }

    pub fn contains(&self, modal_id: &str) -> bool {
        self.by_modal.contains_key(modal_id)
    }

    pub fn len(&self) -> usize {
        self.by_modal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_modal.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entropy_ids_are_prefixed_base36() {
        let id = modal_id_from_entropy(0.123_456_789);
        assert!(id.starts_with("modal"));
        assert_eq!(id.len(), 10);
        assert!(id[5..].chars().all(|ch| ch.is_ascii_digit() || ch.is_ascii_lowercase()));
        assert_eq!(modal_id_from_entropy(0.0), "modal00000");
        assert_eq!(modal_id_from_entropy(f64::NAN), "modal00000");
    }

    #[test]
    fn parses_js_style_config() {
        let config = ModalConfig::from_json(json!({
            "title": "Edit",
            "content": "<p>Body</p>",
            "format": "full-width",
            "centered": true,
            "buttons": [{"label": "Save", "color": "primary"}, {"label": "Close", "close_modal": true}]
        }))
        .expect("valid config");
        assert_eq!(config.format, ModalFormat::FullWidth);
        assert_eq!(config.buttons.len(), 2);
        assert!(config.buttons[1].close_modal);
        assert_eq!(config.explicit_id(), None);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let error = ModalConfig::from_json(json!({"format": "huge"})).expect_err("bad format");
        assert!(error.to_string().starts_with("invalid modal config"));
    }

    #[test]
    fn default_format_renders_header_with_title() {
        let config = ModalConfig {
            title: Some("Settings".to_string()),
            content: Some("<p>Body</p>".to_string()),
            scrollable: true,
            fade: true,
            ..ModalConfig::default()
        };
        let html = render_modal(&config, "modal-x").into_string();
        assert!(html.contains(r#"<div class="modal fade" id="modal-x""#));
        assert!(html.contains(r#"class="modal-dialog modal-dialog-scrollable""#));
        assert!(html.contains(r#"<div class="modal-header"><div class="modal-title">Settings</div>"#));
        assert!(html.contains("<p>Body</p>"));
        assert!(html.contains(r##"data-bs-target="#modal-x""##));
    }

    #[test]
    fn small_format_moves_title_into_body() {
        let config = ModalConfig {
            title: Some("Careful".to_string()),
            content: Some("Details".to_string()),
            format: ModalFormat::Small,
            hide_x: true,
            theme: Some("warning".to_string()),
            ..ModalConfig::default()
        };
        let html = render_modal(&config, "m1").into_string();
        assert!(!html.contains("modal-header"));
        assert!(!html.contains("btn-close"));
        assert!(html.contains(r#"<div class="modal-status bg-warning"></div>"#));
        assert!(html.contains(r#"<div class="modal-body"><div class="modal-title">Careful</div><div>Details</div></div>"#));
    }

    #[test]
    fn form_option_wraps_body() {
        let config = ModalConfig {
            content: Some("<input name=\"q\">".to_string()),
            form: true,
            ..ModalConfig::default()
        };
        let html = render_modal(&config, "m2").into_string();
        assert!(html.contains(r#"<form action="javascript:void(0);"><input name="q"></form>"#));
    }

    #[test]
    fn buttons_carry_delegation_attributes_only_with_callbacks() {
        let config = ModalConfig {
            buttons: vec![
                ModalButton::new("Yes").color("danger").with_callback().closes(),
                ModalButton::new("No").closes(),
            ],
            ..ModalConfig::default()
        };
        let html = render_modal(&config, "m3").into_string();
        assert!(html.contains(
            r#"<button type="button" class="btn btn-danger" data-bs-dismiss="modal" data-dw-modal="m3" data-dw-button="0">Yes</button>"#
        ));
        assert!(html.contains(r#"<button type="button" class="btn" data-bs-dismiss="modal">No</button>"#));
        assert_eq!(config.callback_indexes(), vec![0]);
    }

    #[test]
    fn alert_modal_escapes_plain_text() {
        let config = alert_modal("Upload Error", "<script>x</script>", false);
        let content = config.content.unwrap_or_default();
        assert!(content.contains("&lt;script&gt;"));
        assert_eq!(config.format, ModalFormat::Small);
        assert_eq!(config.buttons.len(), 1);
        assert!(config.buttons[0].close_modal);
    }

    #[test]
    fn registry_tables_are_scoped_per_modal() {
        let mut registry = ButtonRegistry::default();
        registry.register("first", [(0, "first-ok")]);
        registry.register("second", [(0, "second-ok"), (1, "second-cancel")]);
        assert_eq!(registry.get("first", 0), Some(&"first-ok"));
        assert_eq!(registry.get("second", 1), Some(&"second-cancel"));

        registry.register("first", [(1, "first-replaced")]);
        assert_eq!(registry.get("first", 0), None);
        assert_eq!(registry.get("first", 1), Some(&"first-replaced"));
        assert_eq!(registry.get("second", 0), Some(&"second-ok"));

        assert!(registry.remove("first"));
        assert!(!registry.remove("first"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registering_no_callbacks_clears_the_table() {
        let mut registry = ButtonRegistry::default();
        registry.register("m", [(0, 1_u8)]);
        registry.register("m", std::iter::empty());
        assert!(!registry.contains("m"));
        assert!(registry.is_empty());
    }

    #[test]
    fn closing_button_releases_its_modal_table() {
        let mut registry = ButtonRegistry::default();
        registry.register("modalab12c", [(0, "keep"), (1, "close")]);
        registry.register("modalzz999", [(0, "other")]);

        assert_eq!(registry.press("modalab12c", 0, false), Some("keep"));
        assert!(registry.contains("modalab12c"));

        assert_eq!(registry.press("modalab12c", 1, true), Some("close"));
        assert!(!registry.contains("modalab12c"));
        assert_eq!(registry.press("modalab12c", 0, false), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn closing_button_without_callback_still_releases_the_table() {
        let mut registry = ButtonRegistry::default();
        registry.register("m", [(0, 1_u8)]);
        assert_eq!(registry.press("m", 3, true), None);
        assert!(registry.is_empty());
    }
}
