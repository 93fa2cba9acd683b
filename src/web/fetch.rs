use crate::transport::{FetchRequest, FetchResponse, Transport, TransportError};
use async_trait::async_trait;
use js_sys::{Array, JsString};
use tracing::{instrument, trace};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestCredentials, RequestInit, RequestRedirect, Response};

/// [`Transport`] over `window.fetch`, sending cookies same-origin only and following redirects.
#[derive(Debug, Clone, Default)]
pub struct FetchTransport;

fn describe(value: &JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

impl FetchTransport {
	/// The `Request` [`fetch`](`Transport::fetch`) sends for `request`.
	///
	/// # Errors
	///
	/// Iff a header or the URL is rejected.
	pub fn request(request: &FetchRequest) -> Result<Request, JsValue> {
		let headers = Headers::new()?;
		for (name, value) in &request.headers {
			headers.append(name, value)?;
		}

		let init = RequestInit::new();
		init.set_method(request.method.as_str());
		init.set_credentials(RequestCredentials::SameOrigin);
		init.set_redirect(RequestRedirect::Follow);
		init.set_headers(&headers);
		if let Some(body) = &request.body {
			init.set_body(&JsValue::from_str(body));
		}
		Request::new_with_str_and_init(&request.url, &init)
	}
}

fn collect_headers(headers: &Headers) -> Vec<(String, String)> {
	let entries = match js_sys::try_iter(headers) {
		Ok(Some(entries)) => entries,
		_ => return vec![],
	};
	entries
		.filter_map(Result::ok)
		.filter_map(|entry| {
			let entry: Array = entry.dyn_into().ok()?;
			let name = entry.get(0).dyn_into::<JsString>().ok()?;
			let value = entry.get(1).dyn_into::<JsString>().ok()?;
			Some((String::from(name), String::from(value)))
		})
		.collect()
}

#[async_trait(?Send)]
impl Transport for FetchTransport {
	type Raw = Response;

	#[instrument(skip(self, request), fields(method = request.method.as_str(), url = request.url.as_str()))]
	async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse<Response>, TransportError> {
		let window = web_sys::window().ok_or_else(|| TransportError::Request("No window".to_owned()))?;
		let request = Self::request(&request).map_err(|error| TransportError::Request(describe(&error)))?;

		let response = JsFuture::from(window.fetch_with_request(&request)).await.map_err(|error| TransportError::Fetch(describe(&error)))?;
		let response: Response = response.dyn_into().map_err(|_| TransportError::NotAResponse)?;

		let text = JsFuture::from(response.text().map_err(|error| TransportError::Body(describe(&error)))?)
			.await
			.map_err(|error| TransportError::Body(describe(&error)))?
			.as_string()
			.unwrap_or_default();
		trace!("Received {} bytes.", text.len());

		Ok(FetchResponse {
			url: response.url(),
			status: response.status(),
			headers: collect_headers(&response.headers()),
			text,
			raw: response,
		})
	}
}
