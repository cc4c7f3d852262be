//! Protobuf-over-HTTP RPC client that signs every call with a cached, assertion-based
//! service-account credential and surfaces every failure as a structured error.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod message;
pub mod obs;
pub mod provider;
pub mod request;
pub mod service;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		auth::{AccessToken, Credential},
		http::{RpcResponse, RpcTransport, TransportFuture},
		request::RpcRequest,
		service::{ServiceDescriptor, ServiceOptions},
	};
	#[cfg(feature = "reqwest")]
	use crate::{
		client::{ReqwestRpcClient, RpcClient},
		http::ReqwestTransport,
	};

	/// Everything a [`ScriptedTransport`] observed during a single call.
	#[derive(Clone, Debug)]
	pub struct RecordedCall {
		/// Request exactly as it reached `execute`.
		pub request: RpcRequest,
		/// Whether the credential handed to `authorize` carried a service account.
		pub authenticated: bool,
		/// Cached token visible to `authorize`, if any.
		pub cached_token: Option<String>,
		/// Assertion visible to `authorize`, if any.
		pub assertion: Option<String>,
		/// Client identifier hint visible to `authorize`, if any.
		pub client_id: Option<String>,
	}

	/// In-process transport double that replays scripted responses and records requests.
	///
	/// Each `execute` pops the next scripted response; when the script is exhausted the
	/// request body is echoed back with status 200.
	#[derive(Debug, Default)]
	pub struct ScriptedTransport {
		responses: Mutex<VecDeque<RpcResponse>>,
		issue_token: Option<AccessToken>,
		calls: Mutex<Vec<RecordedCall>>,
		pending: Mutex<Option<RecordedCall>>,
	}
	impl ScriptedTransport {
		/// Builds a transport that echoes every request body with status 200.
		pub fn echo() -> Self {
			Self::default()
		}

		/// Queues a response for the next call.
		pub fn respond(self, status: u16, body: impl Into<Bytes>) -> Self {
			self.responses.lock().push_back(RpcResponse::new(status, body));

			self
		}

		/// Makes `authorize` report `token` as freshly negotiated for authenticated calls.
		pub fn issuing(mut self, token: AccessToken) -> Self {
			self.issue_token = Some(token);

			self
		}

		/// Returns every call observed so far.
		pub fn calls(&self) -> Vec<RecordedCall> {
			self.calls.lock().clone()
		}
	}
	impl RpcTransport for ScriptedTransport {
		fn authorize<'a>(
			&'a self,
			request: &'a mut RpcRequest,
			credential: &'a mut Credential,
		) -> TransportFuture<'a, ()> {
			Box::pin(async move {
				*self.pending.lock() = Some(RecordedCall {
					request: request.clone(),
					authenticated: credential.is_authenticated(),
					cached_token: credential
						.cached_token()
						.map(|token| String::from_utf8_lossy(token.expose()).into_owned()),
					assertion: credential.assertion().map(|value| value.expose().to_owned()),
					client_id: credential.client_id().map(str::to_owned),
				});

				if let (true, Some(token)) = (credential.is_authenticated(), &self.issue_token) {
					credential.replace_token(token.to_blob()?);
				}

				Ok(())
			})
		}

		fn execute<'a>(&'a self, request: RpcRequest) -> TransportFuture<'a, RpcResponse> {
			Box::pin(async move {
				let mut recorded = self.pending.lock().take().unwrap_or(RecordedCall {
					request: request.clone(),
					authenticated: false,
					cached_token: None,
					assertion: None,
					client_id: None,
				});

				recorded.request = request.clone();
				self.calls.lock().push(recorded);

				let response = self
					.responses
					.lock()
					.pop_front()
					.unwrap_or_else(|| RpcResponse::new(200, request.body.clone()));

				Ok(response)
			})
		}
	}

	/// Reqwest builder that accepts the self-signed certificates produced by `httpmock` during
	/// tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_client_builder() -> reqwest::ClientBuilder {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
	}

	/// Builds a reqwest-backed client for `options` whose transport trusts `httpmock`'s
	/// certificates.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_client(
		options: ServiceOptions,
		descriptor: ServiceDescriptor,
	) -> ReqwestRpcClient {
		let transport = ReqwestTransport::from_builder(&options, test_reqwest_client_builder())
			.expect("Failed to build insecure reqwest transport for tests.");

		RpcClient::with_transport(options, descriptor, transport)
			.expect("Failed to build reqwest test client.")
	}

	/// Options pointing at `https://rpc.example.com` with no service account configured.
	pub fn anonymous_options() -> ServiceOptions {
		ServiceOptions::builder(
			Url::parse("https://rpc.example.com/").expect("Test host URL should parse."),
		)
		.application_name("oauth2-rpc-tests")
		.build()
		.expect("Anonymous test options should validate.")
	}

	/// Descriptor for a small datastore-like service used across tests.
	pub fn test_descriptor() -> ServiceDescriptor {
		ServiceDescriptor::builder("/datastore/v1beta2/datasets/demo")
			.method_path("lookup", "/lookup")
			.method_path("runQuery", "runQuery")
			.scopes(["https://www.googleapis.com/auth/datastore"])
			.build()
			.expect("Test service descriptor should build.")
	}

	/// Absolute path of a file under `tests/fixtures`.
	pub fn fixture_path(name: &str) -> std::path::PathBuf {
		std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
	}

	/// Unique scratch path under the system temp directory.
	pub fn temp_path(label: &str) -> std::path::PathBuf {
		let unique = format!(
			"oauth2_rpc_{label}_{}_{}",
			std::process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		std::env::temp_dir().join(unique)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use bytes::Bytes;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use bytes;
pub use prost;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
