//! Assertion signers that turn a service-account identity, scopes, and private key into a
//! bearer-grant assertion.

// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	error::AuthError,
};

/// Default token endpoint used as the assertion audience.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Mints assertions from raw private-key bytes.
///
/// Implementations must not cache key material between calls; the provider re-reads the key
/// file for every call.
pub trait AssertionSigner
where
	Self: Send + Sync,
{
	/// Signs an assertion for `identity` requesting `scopes`.
	fn sign_assertion(
		&self,
		identity: &str,
		scopes: &ScopeSet,
		private_key: &[u8],
	) -> Result<TokenSecret, AuthError>;
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
	iss: &'a str,
	#[serde(skip_serializing_if = "str::is_empty")]
	scope: &'a str,
	aud: &'a str,
	iat: i64,
	exp: i64,
}

#[derive(Deserialize)]
struct ServiceAccountKey {
	private_key: String,
	#[serde(default)]
	private_key_id: Option<String>,
}

/// RS256 JWT bearer assertions (RFC 7523) for service accounts.
///
/// Accepts either a PEM-encoded RSA key (PKCS#1 or PKCS#8) or a service-account JSON key
/// file; for the latter the `private_key_id` becomes the JWT `kid`.
#[derive(Clone, Debug)]
pub struct JwtAssertionSigner {
	audience: String,
	lifetime: Duration,
}
impl JwtAssertionSigner {
	/// Lifetime of a minted assertion.
	pub const DEFAULT_LIFETIME: Duration = Duration::hours(1);

	/// Creates a signer whose assertions target `audience` (the token endpoint).
	pub fn new(audience: impl Into<String>) -> Self {
		Self { audience: audience.into(), lifetime: Self::DEFAULT_LIFETIME }
	}

	/// Overrides the assertion lifetime.
	pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
		self.lifetime = lifetime;

		self
	}

	/// Audience written into the `aud` claim.
	pub fn audience(&self) -> &str {
		&self.audience
	}

	/// Signs an assertion issued at `now`.
	pub fn sign_at(
		&self,
		identity: &str,
		scopes: &ScopeSet,
		private_key: &[u8],
		now: OffsetDateTime,
	) -> Result<TokenSecret, AuthError> {
		let (pem, key_id) = split_key_material(private_key)?;
		let key = EncodingKey::from_rsa_pem(&pem).map_err(AuthError::signing)?;
		let mut header = Header::new(Algorithm::RS256);

		header.kid = key_id;

		let scope = scopes.normalized();
		let claims = AssertionClaims {
			iss: identity,
			scope: &scope,
			aud: &self.audience,
			iat: now.unix_timestamp(),
			exp: (now + self.lifetime).unix_timestamp(),
		};

		jsonwebtoken::encode(&header, &claims, &key)
			.map(TokenSecret::new)
			.map_err(AuthError::signing)
	}
}
impl Default for JwtAssertionSigner {
	fn default() -> Self {
		Self::new(DEFAULT_TOKEN_ENDPOINT)
	}
}
impl AssertionSigner for JwtAssertionSigner {
	fn sign_assertion(
		&self,
		identity: &str,
		scopes: &ScopeSet,
		private_key: &[u8],
	) -> Result<TokenSecret, AuthError> {
		self.sign_at(identity, scopes, private_key, OffsetDateTime::now_utc())
	}
}

fn split_key_material(raw: &[u8]) -> Result<(Vec<u8>, Option<String>), AuthError> {
	if raw.trim_ascii_start().starts_with(b"{") {
		let key: ServiceAccountKey = serde_json::from_slice(raw).map_err(AuthError::signing)?;

		return Ok((key.private_key.into_bytes(), key.private_key_id));
	}

	Ok((raw.to_vec(), None))
}
