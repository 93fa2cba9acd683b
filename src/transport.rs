use crate::form::FormMethod;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
	pub method: FormMethod,
	pub url: String,
	pub headers: Vec<(String, String)>,
	/// `application/x-www-form-urlencoded`, for POST requests.
	pub body: Option<String>,
}

/// A response after redirects, with its body read.
#[derive(Debug, Clone)]
pub struct FetchResponse<R> {
	/// The final URL, after following redirects.
	pub url: String,
	pub status: u16,
	pub headers: Vec<(String, String)>,
	pub text: String,
	/// The platform's own response object, passed on with `ez:app:updated`.
	pub raw: R,
}

impl<R> FetchResponse<R> {
	/// Case-insensitive header lookup.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
	}
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
	#[error("Failed to build the request: {0}")]
	Request(String),
	#[error("Fetch failed: {0}")]
	Fetch(String),
	#[error("Fetch resolved to something other than a response")]
	NotAResponse,
	#[error("Failed to read the response body: {0}")]
	Body(String),
}

/// Performs update requests. Credentials are scoped same-origin and redirects followed transparently.
///
/// No timeout is enforced on top of the platform's own.
#[async_trait(?Send)]
pub trait Transport {
	type Raw;

	async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse<Self::Raw>, TransportError>;
}
