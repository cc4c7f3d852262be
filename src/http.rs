//! Transport collaborator contract and the reqwest-backed implementation.
//!
//! The executor hands every request to an [`RpcTransport`] twice: once to
//! [`authorize`](RpcTransport::authorize) it with the call's [`Credential`], once to
//! [`execute`](RpcTransport::execute) it. The transport owns the token policy; the executor
//! only persists whatever token the credential reports afterwards.

// crates.io
#[cfg(feature = "reqwest")]
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
// self
use crate::{_prelude::*, auth::Credential, request::RpcRequest};
#[cfg(feature = "reqwest")]
use crate::{
	auth::{AccessToken, DEFAULT_TOKEN_ENDPOINT},
	error::{AuthError, ConfigError, TransportError},
	service::ServiceOptions,
};

/// Grant type used to exchange a signed assertion for an access token.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Future returned by [`RpcTransport`] operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Raw outcome of one HTTP round trip, consumed immediately by the executor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body, already decompressed.
	pub body: Bytes,
}
impl RpcResponse {
	/// Creates a response.
	pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
		Self { status, body: body.into() }
	}

	/// Returns true for status 200, the only status the executor decodes.
	pub fn is_ok(&self) -> bool {
		self.status == 200
	}
}

/// HTTP stack that signs and executes RPC requests.
///
/// Implementations must be `Send + Sync + 'static` so one instance can be shared behind an
/// `Arc` by every client that uses it.
pub trait RpcTransport
where
	Self: 'static + Send + Sync,
{
	/// Adds authorization to `request`.
	///
	/// Anonymous credentials must leave the request untouched. For authenticated credentials the
	/// transport chooses between the cached token and a freshly negotiated one, and reports a
	/// fresh token through [`Credential::replace_token`].
	fn authorize<'a>(
		&'a self,
		request: &'a mut RpcRequest,
		credential: &'a mut Credential,
	) -> TransportFuture<'a, ()>;

	/// Sends `request` and returns the status and body, whatever the status.
	fn execute<'a>(&'a self, request: RpcRequest) -> TransportFuture<'a, RpcResponse>;
}

/// reqwest transport that negotiates JWT-bearer tokens.
///
/// A cached token is reused while its [`AccessToken`] record parses and is not within
/// [`EXPIRY_SKEW`](crate::auth::EXPIRY_SKEW) of expiry. Anything else (no cache, foreign cache
/// contents, stale token) triggers an assertion exchange at the token endpoint. A token the
/// service later rejects is not retried; the call fails with the service's status.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	token_endpoint: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport whose client carries the options' user agent and timeout.
	pub fn from_options(options: &ServiceOptions) -> Result<Self, ConfigError> {
		Self::from_builder(options, ReqwestClient::builder())
	}

	/// Like [`from_options`](Self::from_options), starting from a caller-configured builder
	/// (custom TLS roots, proxies).
	pub fn from_builder(
		options: &ServiceOptions,
		mut builder: reqwest::ClientBuilder,
	) -> Result<Self, ConfigError> {
		if !options.application_name.is_empty() {
			builder = builder.user_agent(options.application_name.clone());
		}
		if let Some(timeout) = options.timeout {
			builder = builder.timeout(timeout);
		}

		let token_endpoint = match &options.token_endpoint {
			Some(endpoint) => endpoint.clone(),
			None => Url::parse(DEFAULT_TOKEN_ENDPOINT).map_err(|source| {
				ConfigError::InvalidUrl { url: DEFAULT_TOKEN_ENDPOINT.into(), source }
			})?,
		};

		Ok(Self { client: builder.build()?, token_endpoint })
	}

	/// Token endpoint used for assertion exchanges.
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}

	async fn negotiate(&self, credential: &Credential, now: OffsetDateTime) -> Result<AccessToken> {
		let assertion = credential.assertion().ok_or(AuthError::MissingAssertion)?;
		let form_body = {
			let mut form = url::form_urlencoded::Serializer::new(String::new());

			form.append_pair("grant_type", JWT_BEARER_GRANT);
			form.append_pair("assertion", assertion.expose());

			if let Some(client_id) = credential.client_id() {
				form.append_pair("client_id", client_id);
			}

			form.finish()
		};

		#[cfg(feature = "tracing")]
		tracing::debug!(
			service_account = credential.identity().unwrap_or_default(),
			scopes = %credential.scopes().normalized(),
			endpoint = %self.token_endpoint,
			"Negotiating access token."
		);

		let response = self
			.client
			.post(self.token_endpoint.clone())
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.body(form_body)
			.send()
			.await
			.map_err(|e| TransportError::network("token", e))?;
		let status = response.status().as_u16();
		let body = response.bytes().await.map_err(|e| TransportError::network("token", e))?;

		if status != 200 {
			return Err(AuthError::TokenEndpoint { status, body }.into());
		}

		Ok(AccessToken::from_token_response(status, &body, now)?)
	}
}
#[cfg(feature = "reqwest")]
impl RpcTransport for ReqwestTransport {
	fn authorize<'a>(
		&'a self,
		request: &'a mut RpcRequest,
		credential: &'a mut Credential,
	) -> TransportFuture<'a, ()> {
		Box::pin(async move {
			if !credential.is_authenticated() {
				return Ok(());
			}

			let now = OffsetDateTime::now_utc();
			let cached = credential
				.cached_token()
				.and_then(AccessToken::from_blob)
				.filter(|token| !token.is_stale_at(now));
			let token = match cached {
				Some(token) => token,
				None => {
					let fresh = self.negotiate(credential, now).await?;

					credential.replace_token(fresh.to_blob()?);

					fresh
				},
			};
			let mut value = HeaderValue::try_from(format!("Bearer {}", token.access_token.expose()))
				.map_err(ConfigError::from)?;

			value.set_sensitive(true);
			request.headers.insert(AUTHORIZATION, value);

			Ok(())
		})
	}

	fn execute<'a>(&'a self, request: RpcRequest) -> TransportFuture<'a, RpcResponse> {
		Box::pin(async move {
			let request =
				reqwest::Request::try_from(request.into_http()?).map_err(ConfigError::from)?;
			let response =
				self.client.execute(request).await.map_err(|e| TransportError::network("rpc", e))?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(|e| TransportError::network("rpc", e))?;

			Ok(RpcResponse::new(status, body))
		})
	}
}
