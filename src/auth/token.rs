//! Access-token record negotiated with the token endpoint and kept in the token cache.

// crates.io
use oauth2::{TokenResponse, basic::BasicTokenResponse};
// self
use crate::{
	_prelude::*,
	auth::{TokenBlob, TokenSecret},
	error::AuthError,
};

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::hours(1);
/// Tokens this close to expiry are treated as stale.
pub const EXPIRY_SKEW: Duration = Duration::seconds(30);

/// Bearer token plus the bookkeeping needed to decide whether it is still usable.
///
/// Serialized as JSON (`access_token`, `token_type`, `expires_in`, `created`) into the token
/// cache; `expires_in` and `created` are whole seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
	/// Bearer value sent in the `Authorization` header.
	pub access_token: TokenSecret,
	/// Token type reported by the endpoint (normally `bearer`).
	pub token_type: String,
	/// Lifetime in seconds, relative to `created`.
	pub expires_in: i64,
	/// Unix timestamp at which the token was obtained.
	pub created: i64,
}
impl AccessToken {
	/// Creates a bearer token obtained at `created` and valid for `lifetime`.
	pub fn bearer(
		access_token: impl Into<String>,
		lifetime: Duration,
		created: OffsetDateTime,
	) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			token_type: "bearer".into(),
			expires_in: lifetime.whole_seconds(),
			created: created.unix_timestamp(),
		}
	}

	/// Parses a successful token endpoint response body.
	pub fn from_token_response(
		status: u16,
		body: &[u8],
		now: OffsetDateTime,
	) -> Result<Self, AuthError> {
		let mut deserializer = serde_json::Deserializer::from_slice(body);
		let response: BasicTokenResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| AuthError::TokenResponseParse { source, status: Some(status) })?;
		let lifetime = response
			.expires_in()
			.and_then(|value| i64::try_from(value.as_secs()).ok())
			.map(Duration::seconds)
			.unwrap_or(DEFAULT_TOKEN_LIFETIME);
		let mut token = Self::bearer(response.access_token().secret().as_str(), lifetime, now);

		token.token_type = response.token_type().as_ref().to_owned();

		Ok(token)
	}

	/// Decodes a cached blob; `None` when the cache holds something else.
	pub fn from_blob(blob: &TokenBlob) -> Option<Self> {
		serde_json::from_slice(blob.expose()).ok()
	}

	/// Encodes the record into cache bytes.
	pub fn to_blob(&self) -> Result<TokenBlob, AuthError> {
		serde_json::to_vec(self).map(TokenBlob::new).map_err(AuthError::TokenEncode)
	}

	/// Instant after which the token is no longer accepted.
	pub fn expires_at(&self) -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(self.created.saturating_add(self.expires_in))
			.unwrap_or(OffsetDateTime::UNIX_EPOCH)
	}

	/// Returns true when the token expires within [`EXPIRY_SKEW`] of `now`.
	pub fn is_stale_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at().checked_sub(EXPIRY_SKEW).is_none_or(|deadline| deadline <= now)
	}
}
