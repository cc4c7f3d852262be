//! Service descriptors: base path, per-method paths, and authorization scopes.

// self
use crate::{_prelude::*, auth::ScopeSet, error::ConfigError};

/// Describes one remote service so a single generic client can call any of its methods.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceDescriptor {
	/// Path appended to the host before any method path.
	pub base_path: String,
	/// Explicit method paths, relative to `base_path`.
	pub method_paths: BTreeMap<String, String>,
	/// Scopes requested when authenticating as a service account.
	pub scopes: ScopeSet,
}
impl ServiceDescriptor {
	/// Returns a builder seeded with `base_path`.
	pub fn builder(base_path: impl Into<String>) -> ServiceDescriptorBuilder {
		ServiceDescriptorBuilder::new(base_path)
	}

	/// Path for `method`; methods without an explicit entry use their own name.
	pub fn method_path<'a>(&'a self, method: &'a str) -> &'a str {
		self.method_paths.get(method).map(String::as_str).unwrap_or(method)
	}
}

/// Builder for [`ServiceDescriptor`] values.
#[derive(Debug, Default)]
pub struct ServiceDescriptorBuilder {
	base_path: String,
	method_paths: BTreeMap<String, String>,
	scopes: Vec<String>,
}
impl ServiceDescriptorBuilder {
	/// Creates a builder seeded with `base_path`.
	pub fn new(base_path: impl Into<String>) -> Self {
		Self { base_path: base_path.into(), ..Default::default() }
	}

	/// Maps `method` onto `path`.
	pub fn method_path(mut self, method: impl Into<String>, path: impl Into<String>) -> Self {
		self.method_paths.insert(method.into(), path.into());

		self
	}

	/// Adds one scope.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scopes.push(scope.into());

		self
	}

	/// Adds several scopes.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes.extend(scopes.into_iter().map(Into::into));

		self
	}

	/// Normalizes scopes and returns the descriptor.
	pub fn build(self) -> Result<ServiceDescriptor, ConfigError> {
		Ok(ServiceDescriptor {
			base_path: self.base_path,
			method_paths: self.method_paths,
			scopes: ScopeSet::new(self.scopes)?,
		})
	}
}
