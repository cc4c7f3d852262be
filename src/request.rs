//! Request builder: turns a method name and encoded body into a fully addressed POST.
//!
//! The header set is fixed across every method and service and must stay byte-for-byte
//! identical for existing counterpart services to accept the request.

// crates.io
use oauth2::{
	HttpRequest,
	http::{
		HeaderMap, HeaderValue, Method,
		header::{ACCEPT, ACCEPT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE},
	},
};
// self
use crate::{_prelude::*, error::ConfigError, service::ServiceDescriptor};

/// `Accept-Encoding` sent with every call.
pub const ACCEPT_ENCODING_VALUE: &str = "gzip";
/// `Accept` sent with every call.
pub const ACCEPT_VALUE: &str = "text/html, image/gif, image/jpeg, *; q=.2, */*; q=.2";
/// `Content-Type` of every request body.
pub const CONTENT_TYPE_VALUE: &str = "application/x-protobuf";

/// One outbound RPC, built fresh per call and dropped afterwards.
#[derive(Clone, Debug)]
pub struct RpcRequest {
	/// RPC method name the request was built for.
	pub method: String,
	/// Fully joined method URL.
	pub url: Url,
	/// Fixed protobuf headers plus whatever the transport adds while authorizing.
	pub headers: HeaderMap,
	/// Encoded request message.
	pub body: Bytes,
}
impl RpcRequest {
	/// HTTP method used for every call.
	pub const HTTP_METHOD: Method = Method::POST;

	/// Converts into a generic HTTP request for transports built on the `http` types.
	pub fn into_http(self) -> Result<HttpRequest, ConfigError> {
		let mut request = oauth2::http::Request::builder()
			.method(Self::HTTP_METHOD)
			.uri(self.url.as_str())
			.body(self.body.to_vec())?;

		*request.headers_mut() = self.headers;

		Ok(request)
	}
}

/// Joins `base` and `path` with exactly one slash between them.
pub fn join_path(base: &str, path: &str) -> String {
	format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Addresses methods of one service on one host.
#[derive(Clone, Copy, Debug)]
pub struct RequestBuilder<'a> {
	host: &'a Url,
	descriptor: &'a ServiceDescriptor,
}
impl<'a> RequestBuilder<'a> {
	/// Creates a builder for `descriptor` served from `host`.
	pub fn new(host: &'a Url, descriptor: &'a ServiceDescriptor) -> Self {
		Self { host, descriptor }
	}

	/// Host joined with the service base path.
	pub fn base_url(&self) -> String {
		if self.descriptor.base_path.trim_matches('/').is_empty() {
			self.host.as_str().to_owned()
		} else {
			join_path(self.host.as_str(), &self.descriptor.base_path)
		}
	}

	/// URL for `method`.
	pub fn method_url(&self, method: &str) -> Result<Url, ConfigError> {
		let url = join_path(&self.base_url(), self.descriptor.method_path(method));

		Url::parse(&url).map_err(|source| ConfigError::InvalidUrl { url, source })
	}

	/// Builds the POST for `method` carrying `body`.
	pub fn build(&self, method: &str, body: Bytes) -> Result<RpcRequest, ConfigError> {
		if method.is_empty() {
			return Err(ConfigError::EmptyMethod);
		}

		let url = self.method_url(method)?;
		let mut headers = HeaderMap::with_capacity(4);

		headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(ACCEPT_ENCODING_VALUE));
		headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
		headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_VALUE));
		headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));

		Ok(RpcRequest { method: method.to_owned(), url, headers, body })
	}
}
