//! Redacting wrappers for credential material.

// self
use crate::_prelude::*;

/// Redacted string secret (assertions, bearer tokens) kept out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Opaque cached token bytes exactly as they live in the token cache.
///
/// The client never interprets the contents; only the transport knows the format.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenBlob(Bytes);
impl TokenBlob {
	/// Wraps raw cache bytes.
	pub fn new(bytes: impl Into<Bytes>) -> Self {
		Self(bytes.into())
	}

	/// Returns the raw bytes. Callers must avoid logging them.
	pub fn expose(&self) -> &[u8] {
		&self.0
	}

	/// Returns true if the cache held zero bytes.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for TokenBlob {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenBlob(<redacted; {} bytes>)", self.0.len())
	}
}
