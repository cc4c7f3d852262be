//! Optional observability helpers for RPC calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit one `oauth2_rpc.call` span per call carrying the `method` and
//!   `stage` fields, plus warnings for token-cache failures.
//! - Enable `metrics` to increment `oauth2_rpc_call_total` (labeled by `method` + `outcome`) and
//!   `oauth2_rpc_token_cache_total` (labeled by `op` + `outcome`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Stages one call moves through, strictly forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallStage {
	/// Created, nothing done yet.
	Idle,
	/// Encoding the request message.
	Serializing,
	/// Loading the cache, signing the assertion, and authorizing the request.
	Authenticating,
	/// Waiting on the RPC round trip.
	Requesting,
	/// The response decoded into the caller's container.
	Succeeded,
	/// Any error surfaced to the caller.
	Failed,
}
impl CallStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallStage::Idle => "idle",
			CallStage::Serializing => "serializing",
			CallStage::Authenticating => "authenticating",
			CallStage::Requesting => "requesting",
			CallStage::Succeeded => "succeeded",
			CallStage::Failed => "failed",
		}
	}

	/// Returns true once the call can no longer change stage.
	pub const fn is_terminal(self) -> bool {
		matches!(self, CallStage::Succeeded | CallStage::Failed)
	}
}
impl Display for CallStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for calls and cache operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure, either propagated or reported and swallowed.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Token-cache operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheOp {
	/// Reading the cached token.
	Load,
	/// Writing a refreshed token.
	Save,
}
impl CacheOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheOp::Load => "load",
			CacheOp::Save => "save",
		}
	}
}
impl Display for CacheOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
