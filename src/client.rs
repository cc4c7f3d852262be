//! Call executor: one generic client per service descriptor.
//!
//! A call serializes the request, obtains a credential, builds the POST, and lets the transport
//! authorize and execute it. A 200 reply writes back any refreshed token and is decoded into the
//! caller's response container; any other status becomes [`RpcError::Http`] and leaves the cache
//! alone. Each call starts from scratch; nothing is retried.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::{ConfigError, RpcError},
	http::RpcTransport,
	message::RpcMessage,
	obs::{self, CacheOp, CallOutcome, CallSpan, CallStage},
	provider::CredentialProvider,
	request::RequestBuilder,
	service::{ServiceDescriptor, ServiceOptions},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestRpcClient = RpcClient<ReqwestTransport>;

/// Calls the methods of one service through an explicitly supplied transport.
pub struct RpcClient<T>
where
	T: ?Sized + RpcTransport,
{
	options: ServiceOptions,
	descriptor: ServiceDescriptor,
	transport: Arc<T>,
	provider: CredentialProvider,
}
impl<T> RpcClient<T>
where
	T: ?Sized + RpcTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	///
	/// The options are validated and the default [`CredentialProvider`] is derived from them.
	pub fn with_transport(
		options: ServiceOptions,
		descriptor: ServiceDescriptor,
		transport: impl Into<Arc<T>>,
	) -> Result<Self, ConfigError> {
		options.validate()?;

		let provider = CredentialProvider::from_options(&options);

		Ok(Self { options, descriptor, transport: transport.into(), provider })
	}

	/// Replaces the credential provider.
	pub fn with_provider(mut self, provider: CredentialProvider) -> Self {
		self.provider = provider;

		self
	}

	/// Options the client was built with.
	pub fn options(&self) -> &ServiceOptions {
		&self.options
	}

	/// Service the client calls.
	pub fn descriptor(&self) -> &ServiceDescriptor {
		&self.descriptor
	}

	/// Transport shared by every call.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Credential provider shared by every call.
	pub fn provider(&self) -> &CredentialProvider {
		&self.provider
	}

	/// Invokes `method` with `request` and decodes the reply into `response`.
	///
	/// Returns `response` filled from exactly the bytes of a 200 reply, or an error; the
	/// container is consumed either way.
	pub async fn call<Req, Resp>(
		&self,
		method: &str,
		request: &Req,
		response: Resp,
	) -> Result<Resp>
	where
		Req: ?Sized + RpcMessage + Sync,
		Resp: RpcMessage,
	{
		let span = CallSpan::new(method);

		obs::record_call_outcome(method, CallOutcome::Attempt);

		let result = span.instrument(self.run(&span, method, request, response)).await;

		match &result {
			Ok(_) => {
				span.enter_stage(CallStage::Succeeded);
				obs::record_call_outcome(method, CallOutcome::Success);
			},
			Err(e) => {
				span.fail(e);
				obs::record_call_outcome(method, CallOutcome::Failure);
			},
		}

		result
	}

	async fn run<Req, Resp>(
		&self,
		span: &CallSpan,
		method: &str,
		request: &Req,
		mut response: Resp,
	) -> Result<Resp>
	where
		Req: ?Sized + RpcMessage + Sync,
		Resp: RpcMessage,
	{
		span.enter_stage(CallStage::Serializing);

		let body = request.to_bytes()?;

		span.enter_stage(CallStage::Authenticating);

		let mut credential =
			self.provider.get_credential(&self.options, &self.descriptor.scopes).await?;
		let mut outbound =
			RequestBuilder::new(&self.options.host, &self.descriptor).build(method, body)?;

		self.transport.authorize(&mut outbound, &mut credential).await?;
		span.enter_stage(CallStage::Requesting);

		let reply = self.transport.execute(outbound).await?;

		if !reply.is_ok() {
			return Err(RpcError::Http { code: reply.status, body: reply.body }.into());
		}

		self.persist_refreshed(&credential).await;
		response.parse_from(reply.body)?;

		Ok(response)
	}

	async fn persist_refreshed(&self, credential: &Credential) {
		if let Err(e) = self.provider.persist(credential).await {
			obs::report_cache_failure(CacheOp::Save, &e);
		}
	}
}
#[cfg(feature = "reqwest")]
impl RpcClient<ReqwestTransport> {
	/// Creates a client that provisions its own reqwest transport from `options`.
	pub fn new(
		options: ServiceOptions,
		descriptor: ServiceDescriptor,
	) -> Result<Self, ConfigError> {
		let transport = ReqwestTransport::from_options(&options)?;

		Self::with_transport(options, descriptor, transport)
	}
}
impl<T> Debug for RpcClient<T>
where
	T: ?Sized + RpcTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RpcClient")
			.field("host", &self.options.host.as_str())
			.field("base_path", &self.descriptor.base_path)
			.field("provider", &self.provider)
			.finish_non_exhaustive()
	}
}
