//! Token cache contract and built-in backends.
//!
//! The cache holds one opaque token blob. Stores do no locking: concurrent callers that both
//! refresh race on the write and the last writer wins, which is acceptable because the
//! authorization server decides validity, not the cache.

pub mod file;
pub mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

// self
use crate::{_prelude::*, auth::TokenBlob};

/// Future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistent home of the cached access token.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the cached token, `None` when nothing is cached.
	///
	/// An `Err` means the cache exists but could not be read; callers treat it like an empty
	/// cache after reporting it.
	fn load(&self) -> StoreFuture<'_, Option<TokenBlob>>;

	/// Replaces the cached token.
	fn save<'a>(&'a self, token: &'a TokenBlob) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// The backend could not be read from or written to.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
