//! Per-call credential handed from the provider to the transport.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenBlob, TokenSecret},
};

/// Inputs the transport needs to authorize one request, plus whatever token it settles on.
///
/// An anonymous credential (no service account configured) makes the call proceed
/// unauthenticated. For authenticated credentials the transport decides whether
/// [`cached_token`](Self::cached_token) is still usable or a fresh token must be negotiated with
/// [`assertion`](Self::assertion), and reports its choice through
/// [`replace_token`](Self::replace_token).
#[derive(Clone, Debug, Default)]
pub struct Credential {
	service_account: Option<String>,
	scopes: ScopeSet,
	cached: Option<TokenBlob>,
	assertion: Option<TokenSecret>,
	client_id: Option<String>,
	current: Option<TokenBlob>,
}
impl Credential {
	/// Credential for a call that proceeds without a service account.
	pub fn anonymous(client_id: Option<String>) -> Self {
		Self { client_id, ..Default::default() }
	}

	/// Credential for a service account, carrying a freshly signed assertion.
	pub fn service_account(
		identity: impl Into<String>,
		scopes: ScopeSet,
		assertion: TokenSecret,
	) -> Self {
		Self {
			service_account: Some(identity.into()),
			scopes,
			assertion: Some(assertion),
			..Default::default()
		}
	}

	/// Attaches the token loaded from the cache.
	pub fn with_cached_token(mut self, token: Option<TokenBlob>) -> Self {
		self.cached = token.filter(|blob| !blob.is_empty());

		self
	}

	/// Attaches the client identifier hint.
	pub fn with_client_id(mut self, client_id: Option<String>) -> Self {
		self.client_id = client_id;

		self
	}

	/// Returns true if a service account is configured.
	pub fn is_authenticated(&self) -> bool {
		self.service_account.is_some()
	}

	/// Service-account identity, if configured.
	pub fn identity(&self) -> Option<&str> {
		self.service_account.as_deref()
	}

	/// Scopes the assertion was minted for.
	pub fn scopes(&self) -> &ScopeSet {
		&self.scopes
	}

	/// Token loaded from the cache at the start of the call.
	pub fn cached_token(&self) -> Option<&TokenBlob> {
		self.cached.as_ref()
	}

	/// Signed assertion available for token negotiation.
	pub fn assertion(&self) -> Option<&TokenSecret> {
		self.assertion.as_ref()
	}

	/// Client identifier hint forwarded to the transport.
	pub fn client_id(&self) -> Option<&str> {
		self.client_id.as_deref()
	}

	/// Records the token the transport negotiated for this call.
	pub fn replace_token(&mut self, token: TokenBlob) {
		self.current = Some(token);
	}

	/// Token that must be written back to the cache, if it differs from what was loaded.
	pub fn refreshed_token(&self) -> Option<&TokenBlob> {
		self.current.as_ref().filter(|current| self.cached.as_ref() != Some(*current))
	}
}
