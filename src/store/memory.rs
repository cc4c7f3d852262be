//! In-process [`TokenStore`] for tests and short-lived tools.

// self
use crate::{
	_prelude::*,
	auth::TokenBlob,
	store::{StoreError, StoreFuture, TokenStore},
};

/// Keeps the cached token in memory and counts writes.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore {
	token: Arc<Mutex<Option<TokenBlob>>>,
	saves: Arc<Mutex<usize>>,
	read_only: bool,
}
impl MemoryTokenStore {
	/// Creates a store pre-populated with `token`.
	pub fn with_token(token: TokenBlob) -> Self {
		Self { token: Arc::new(Mutex::new(Some(token))), ..Default::default() }
	}

	/// Makes every save fail, mimicking an unwritable cache location.
	pub fn read_only(mut self) -> Self {
		self.read_only = true;

		self
	}

	/// Returns the currently cached token.
	pub fn snapshot(&self) -> Option<TokenBlob> {
		self.token.lock().clone()
	}

	/// Number of successful saves.
	pub fn save_count(&self) -> usize {
		*self.saves.lock()
	}
}
impl TokenStore for MemoryTokenStore {
	fn load(&self) -> StoreFuture<'_, Option<TokenBlob>> {
		Box::pin(async move { Ok(self.snapshot()) })
	}

	fn save<'a>(&'a self, token: &'a TokenBlob) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			if self.read_only {
				return Err(StoreError::Backend { message: "Token cache is read-only".into() });
			}

			*self.token.lock() = Some(token.clone());
			*self.saves.lock() += 1;

			Ok(())
		})
	}
}
