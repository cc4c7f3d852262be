//! Credential provider: turns [`ServiceOptions`] into the per-call [`Credential`] and writes
//! refreshed tokens back to the cache.
//!
//! Without a configured service account no collaborator is touched and the call proceeds
//! unauthenticated. Otherwise the provider loads the cached token (a failed read counts as an
//! empty cache), re-reads the private key, and signs a fresh assertion so the transport can
//! either reuse the cache or negotiate a new token.

// self
use crate::{
	_prelude::*,
	auth::{AssertionSigner, Credential, JwtAssertionSigner, ScopeSet, TokenBlob},
	error::{AuthError, ConfigError},
	obs::{self, CacheOp, CallOutcome},
	service::ServiceOptions,
	store::{FileTokenStore, StoreError, TokenStore},
};

/// Supplies credentials for calls and persists the tokens they end up using.
#[derive(Clone)]
pub struct CredentialProvider {
	store: Option<Arc<dyn TokenStore>>,
	signer: Arc<dyn AssertionSigner>,
}
impl CredentialProvider {
	/// Creates a provider with an explicit signer and no token cache.
	pub fn new(signer: Arc<dyn AssertionSigner>) -> Self {
		Self { store: None, signer }
	}

	/// Builds the default provider for `options`.
	///
	/// The cache is a [`FileTokenStore`] at `auth_token_file` when set, and assertions target
	/// the configured token endpoint.
	pub fn from_options(options: &ServiceOptions) -> Self {
		let signer = match &options.token_endpoint {
			Some(endpoint) => JwtAssertionSigner::new(endpoint.as_str()),
			None => JwtAssertionSigner::default(),
		};
		let store = options
			.auth_token_file
			.as_ref()
			.map(|path| Arc::new(FileTokenStore::new(path)) as Arc<dyn TokenStore>);

		Self { store, signer: Arc::new(signer) }
	}

	/// Replaces the token cache.
	pub fn with_store(mut self, store: Arc<dyn TokenStore>) -> Self {
		self.store = Some(store);

		self
	}

	/// Token cache in use, if any.
	pub fn store(&self) -> Option<&Arc<dyn TokenStore>> {
		self.store.as_ref()
	}

	/// Produces the credential for one call requesting `scopes`.
	pub async fn get_credential(
		&self,
		options: &ServiceOptions,
		scopes: &ScopeSet,
	) -> Result<Credential> {
		let Some(identity) = options.service_account_name.as_deref() else {
			return Ok(Credential::anonymous(options.client_id.clone()));
		};
		let key_path = options.private_key_file.as_ref().ok_or_else(|| {
			ConfigError::MissingPrivateKeyPath { service_account: identity.to_owned() }
		})?;
		let cached = self.load_cached().await;
		let private_key = std::fs::read(key_path)
			.map_err(|source| AuthError::MissingKey { path: key_path.clone(), source })?;
		let assertion = self.signer.sign_assertion(identity, scopes, &private_key)?;

		Ok(Credential::service_account(identity, scopes.clone(), assertion)
			.with_cached_token(cached)
			.with_client_id(options.client_id.clone()))
	}

	/// Writes the credential's refreshed token to the cache.
	///
	/// Returns `Ok(true)` when a token was written and `Ok(false)` when there was nothing to
	/// write (no cache configured, or the token did not change).
	pub async fn persist(&self, credential: &Credential) -> Result<bool, StoreError> {
		let (Some(store), Some(token)) = (&self.store, credential.refreshed_token()) else {
			return Ok(false);
		};
		let result = store.save(token).await;

		match &result {
			Ok(()) => obs::record_cache_op(CacheOp::Save, CallOutcome::Success),
			Err(_) => obs::record_cache_op(CacheOp::Save, CallOutcome::Failure),
		}

		result.map(|()| true)
	}

	async fn load_cached(&self) -> Option<TokenBlob> {
		let store = self.store.as_ref()?;

		match store.load().await {
			Ok(token) => {
				obs::record_cache_op(CacheOp::Load, CallOutcome::Success);

				token
			},
			Err(e) => {
				obs::record_cache_op(CacheOp::Load, CallOutcome::Failure);
				obs::report_cache_failure(CacheOp::Load, &e);

				None
			},
		}
	}
}
impl Debug for CredentialProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialProvider")
			.field("store", &self.store.as_ref().map(|_| "<dyn TokenStore>"))
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::{_preludet::*, store::MemoryTokenStore};

	fn runtime() -> Runtime {
		Runtime::new().expect("Tokio runtime should start.")
	}

	fn scopes() -> ScopeSet {
		ScopeSet::new(["https://www.googleapis.com/auth/datastore"])
			.expect("Scope fixture should be valid.")
	}

	fn service_account_options(key: PathBuf) -> ServiceOptions {
		ServiceOptions::builder(
			Url::parse("https://rpc.example.com").expect("Test host URL should parse."),
		)
		.service_account("rpc-tests@demo-project.iam.gserviceaccount.com", key)
		.client_id("client-7")
		.build()
		.expect("Service-account options should validate.")
	}

	#[test]
	fn anonymous_options_never_touch_the_store() {
		let store = Arc::new(MemoryTokenStore::with_token(TokenBlob::new(&b"cached"[..])));
		let provider = CredentialProvider::new(Arc::new(JwtAssertionSigner::default()))
			.with_store(store.clone());
		let credential = runtime()
			.block_on(provider.get_credential(&anonymous_options(), &scopes()))
			.expect("Anonymous credential should never fail.");

		assert!(!credential.is_authenticated());
		assert!(credential.cached_token().is_none());
		assert!(
			!runtime()
				.block_on(provider.persist(&credential))
				.expect("Nothing to persist for anonymous credentials.")
		);
		assert_eq!(store.save_count(), 0);
	}

	#[test]
	fn service_account_credential_carries_cache_and_assertion() {
		let store = Arc::new(MemoryTokenStore::with_token(TokenBlob::new(&b"cached"[..])));
		let provider = CredentialProvider::new(Arc::new(JwtAssertionSigner::default()))
			.with_store(store);
		let options = service_account_options(fixture_path("service_account_key.pem"));
		let credential = runtime()
			.block_on(provider.get_credential(&options, &scopes()))
			.expect("Credential should build from the PEM fixture.");

		assert!(credential.is_authenticated());
		assert_eq!(credential.cached_token().map(TokenBlob::expose), Some(&b"cached"[..]));
		assert_eq!(credential.client_id(), Some("client-7"));
		assert_eq!(
			credential.assertion().map(|jwt| jwt.expose().split('.').count()),
			Some(3),
		);
	}

	#[test]
	fn unreadable_key_is_missing_key() {
		let provider = CredentialProvider::new(Arc::new(JwtAssertionSigner::default()));
		let options = service_account_options(temp_path("absent_key"));
		let err = runtime()
			.block_on(provider.get_credential(&options, &scopes()))
			.expect_err("Missing key files must fail.");

		assert!(matches!(err, Error::Auth(AuthError::MissingKey { .. })));
	}

	#[test]
	fn persist_writes_only_refreshed_tokens() {
		let store = Arc::new(MemoryTokenStore::default());
		let provider = CredentialProvider::new(Arc::new(JwtAssertionSigner::default()))
			.with_store(store.clone());
		let options = service_account_options(fixture_path("service_account_key.pem"));
		let rt = runtime();
		let mut credential = rt
			.block_on(provider.get_credential(&options, &scopes()))
			.expect("Credential should build from the PEM fixture.");

		assert!(!rt.block_on(provider.persist(&credential)).expect("No-op persist succeeds."));

		credential.replace_token(TokenBlob::new(&b"fresh"[..]));

		assert!(rt.block_on(provider.persist(&credential)).expect("Persist should succeed."));
		assert_eq!(store.snapshot().map(|blob| blob.expose().to_vec()), Some(b"fresh".to_vec()));
	}
}
