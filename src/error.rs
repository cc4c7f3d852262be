//! Client-level error types shared across the provider, builder, transport, and executor.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error returned by [`RpcClient::call`](crate::client::RpcClient::call).
///
/// Every non-success path of a call maps onto exactly one variant; nothing is printed and
/// nothing terminates the process.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Missing or invalid options.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Credential acquisition or signing failed.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// The request message could not be encoded.
	#[error("Request message could not be serialized.")]
	Serialization {
		/// Encoder failure reported by the message.
		#[source]
		source: BoxError,
	},
	/// The 200 response body could not be decoded into the response container.
	#[error("Response body could not be deserialized.")]
	Deserialization {
		/// Decoder failure reported by the message.
		#[source]
		source: BoxError,
	},
	/// Token cache read/write failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// The remote service answered with a non-200 status.
	#[error(transparent)]
	Rpc(#[from] RpcError),
	/// Transport failure (DNS, TCP, TLS, I/O).
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl Error {
	/// Wraps an encoder failure.
	pub fn serialization(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Serialization { source: Box::new(src) }
	}

	/// Wraps a decoder failure.
	pub fn deserialization(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Deserialization { source: Box::new(src) }
	}

	/// Stable label used for span fields and metric outcomes.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Config(_) => "config",
			Self::Auth(_) => "auth",
			Self::Serialization { .. } => "serialization",
			Self::Deserialization { .. } => "deserialization",
			Self::Storage(_) => "storage",
			Self::Rpc(_) => "rpc",
			Self::Transport(_) => "transport",
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Outbound request could not be assembled.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A header value contains characters HTTP does not allow.
	#[error("Header value is invalid.")]
	InvalidHeader(#[from] oauth2::http::header::InvalidHeaderValue),
	/// Host or method path does not form a valid URL.
	#[error("Method URL `{url}` is invalid.")]
	InvalidUrl {
		/// Joined URL string that failed to parse.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Host must be an absolute HTTP(S) URL.
	#[error("Host `{host}` must use http or https.")]
	UnsupportedScheme {
		/// Offending host URL.
		host: String,
	},
	/// RPC method names cannot be empty.
	#[error("RPC method name cannot be empty.")]
	EmptyMethod,
	/// A service account is configured without a private key path.
	#[error("Service account `{service_account}` is configured without a private key file.")]
	MissingPrivateKeyPath {
		/// Configured service-account identity.
		service_account: String,
	},
	/// Service scopes cannot be normalized.
	#[error("Service scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Credential acquisition and signing failures.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// The configured private key file could not be read.
	#[error("Private key file {} could not be read.", .path.display())]
	MissingKey {
		/// Configured key path.
		path: PathBuf,
		/// Underlying I/O failure.
		#[source]
		source: std::io::Error,
	},
	/// The private key could not be parsed or used to sign the assertion.
	#[error("Assertion could not be signed.")]
	Signing {
		/// Signer-specific failure.
		#[source]
		source: BoxError,
	},
	/// An authenticated credential reached the transport without an assertion.
	#[error("Credential carries no assertion to exchange.")]
	MissingAssertion,
	/// Token endpoint rejected the assertion exchange.
	#[error("Token endpoint returned HTTP {status}.")]
	TokenEndpoint {
		/// HTTP status code returned by the token endpoint.
		status: u16,
		/// Raw response body kept for diagnostics.
		body: Bytes,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// An access token record could not be encoded for caching.
	#[error("Access token record could not be encoded.")]
	TokenEncode(#[source] serde_json::Error),
}
impl AuthError {
	/// Wraps a signer failure.
	pub fn signing(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Signing { source: Box::new(src) }
	}
}

/// Non-success RPC outcomes.
#[derive(Debug, ThisError)]
pub enum RpcError {
	/// The service answered with a status other than 200.
	#[error("RPC request returned HTTP {code}.")]
	Http {
		/// HTTP status code.
		code: u16,
		/// Response body, preserved verbatim.
		body: Bytes,
	},
}
impl RpcError {
	/// HTTP status code carried by the error.
	pub fn code(&self) -> u16 {
		match self {
			Self::Http { code, .. } => *code,
		}
	}

	/// Response body carried by the error.
	pub fn body(&self) -> &Bytes {
		match self {
			Self::Http { body, .. } => body,
		}
	}
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {target}.")]
	Network {
		/// Which endpoint was being called (`rpc` or `token`).
		target: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		target: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { target, source: Box::new(src) }
	}
}
