use super::*;

    use dw_utilities_core::payload::FORM_CONTENT_TYPE;
    use dw_utilities_core::request::classify_response_for;
    use gloo_net::http::Request;

    /// Options accepted by the `api_request` export; the callback is read
    /// separately because it is not JSON.
    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub(super) struct ApiRequestOptions {
        url: String,
        data: Value,
        debug: bool,
        busy_key: Option<String>,
    }

    impl ApiRequestOptions {
        pub(super) fn into_parts(self) -> Result<(ApiRequest, String), BridgeError> {
            if self.url.trim().is_empty() {
                return Err(BridgeError::Options {
                    what: "request",
                    detail: "url is required".to_string(),
                });
            }
            let mut request = ApiRequest::new(self.url, FormPayload::from_json_object(&self.data)?);
            request.debug = self.debug;
            let holder = self
                .busy_key
                .filter(|key| !key.trim().is_empty())
                .unwrap_or_else(|| PAGE_HOLDER.to_string());
            Ok((request, holder))
        }
    }

    /// With `needs_body` unset a successful reply that is not JSON yields
    /// `Value::Null` instead of a decode error.
    pub(super) async fn post_form(request: &ApiRequest, needs_body: bool) -> Result<Value, RequestError> {
        let response = Request::post(&request.url)
            .header("content-type", FORM_CONTENT_TYPE)
            .body(request.body())
            .map_err(|error| RequestError::Transport {
                message: error.to_string(),
            })?
            .send()
            .await
            .map_err(|error| RequestError::Transport {
                message: error.to_string(),
            })?;
        let status = response.status();
        let raw = response.text().await.map_err(|error| RequestError::Transport {
            message: error.to_string(),
        })?;
        let classified = classify_response_for(status, &raw, needs_body);
        if classified.is_err() {
            console_log_text(&raw);
        }
        classified
    }

    /// Posts `request` and reports any failure on behalf of `holder`. The error
    /// is returned only so callers can stop; it has already been surfaced.
    pub(super) async fn submit(request: &ApiRequest, holder: &str, needs_body: bool) -> Result<Value, RequestError> {
        debug!(url = %request.url, holder, needs_body, "posting form request");
        let outcome = post_form(request, needs_body).await;
        if let Err(error) = &outcome {
            report_failure(error, holder);
        }
        outcome
    }

    fn report_failure(error: &RequestError, holder: &str) {
        match error {
            RequestError::Http(failure) => {
                settle_busy(holder);
                warn!(status = failure.status, code = ?failure.code, "request rejected");
                alert(&failure.alert_text());
            }
            RequestError::Decode { status, source } => {
                settle_busy(holder);
                error!(status, %source, "response body is not json");
            }
            RequestError::Transport { message } => {
                warn!(%message, "request not delivered");
            }
        }
    }

    /// Hands a successful save/delete response to wherever `route` says.
    pub(super) fn deliver_response(
        route: &ResponseRoute,
        body: &Value,
        callback: Option<&js_sys::Function>,
        holder: &str,
    ) {
        if !route.keeps_busy() {
            release_busy(holder);
        }
        match route {
            ResponseRoute::Callback => {
                if let Some(callback) = callback {
                    call_js(callback, &json_to_js(body));
                }
            }
            ResponseRoute::Redirect(target) => {
                if let Err(error) = navigate(target) {
                    release_busy(holder);
                    error!(%error, "redirect failed");
                }
            }
            ResponseRoute::Debug => console_log_json(body),
            ResponseRoute::Ignore => {}
        }
    }
