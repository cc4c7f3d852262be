//! File-backed [`TokenStore`] holding the raw token blob.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
};
// self
use crate::{
	_prelude::*,
	auth::TokenBlob,
	store::{StoreError, StoreFuture, TokenStore},
};

/// Keeps the cached token at a fixed path, replacing it atomically on save.
#[derive(Clone, Debug)]
pub struct FileTokenStore {
	path: PathBuf,
}
impl FileTokenStore {
	/// Points the store at `path`; nothing is touched until the first load or save.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Location of the cache file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn read_now(&self) -> Result<Option<TokenBlob>, StoreError> {
		match fs::read(&self.path) {
			Ok(bytes) if bytes.is_empty() => Ok(None),
			Ok(bytes) => Ok(Some(TokenBlob::new(bytes))),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
			Err(e) => Err(StoreError::Backend {
				message: format!("Failed to read {}: {e}", self.path.display()),
			}),
		}
	}

	fn write_now(&self, token: &TokenBlob) -> Result<(), StoreError> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create cache directory {}: {e}", parent.display()),
			})?;
		}

		let mut tmp_path = self.path.clone().into_os_string();

		tmp_path.push(".tmp");

		let tmp_path = PathBuf::from(tmp_path);

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(token.expose()).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenStore for FileTokenStore {
	fn load(&self) -> StoreFuture<'_, Option<TokenBlob>> {
		Box::pin(async move { self.read_now() })
	}

	fn save<'a>(&'a self, token: &'a TokenBlob) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.write_now(token) })
	}
}
