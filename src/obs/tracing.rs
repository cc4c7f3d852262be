// self
use crate::{
	_prelude::*,
	obs::{CacheOp, CallStage},
	store::StoreError,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// Span wrapping one RPC call and tracking its [`CallStage`].
#[derive(Clone, Debug)]
pub struct CallSpan {
	stage: Arc<Mutex<CallStage>>,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a span for `method`, starting at [`CallStage::Idle`].
	pub fn new(method: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"oauth2_rpc.call",
				method,
				stage = CallStage::Idle.as_str(),
				error = tracing::field::Empty,
			);

			Self { stage: Arc::new(Mutex::new(CallStage::Idle)), span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = method;

			Self { stage: Arc::new(Mutex::new(CallStage::Idle)) }
		}
	}

	/// Current stage.
	pub fn stage(&self) -> CallStage {
		*self.stage.lock()
	}

	/// Moves to `stage`; terminal stages are never left.
	pub fn enter_stage(&self, stage: CallStage) {
		let mut current = self.stage.lock();

		if current.is_terminal() {
			return;
		}

		*current = stage;

		#[cfg(feature = "tracing")]
		self.span.record("stage", stage.as_str());
	}

	/// Moves to [`CallStage::Failed`] and records the error kind.
	pub fn fail(&self, error: &Error) {
		self.enter_stage(CallStage::Failed);

		#[cfg(feature = "tracing")]
		{
			self.span.record("error", error.kind());
			tracing::debug!(parent: &self.span, error = %error, "RPC call failed.");
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = error;
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Reports a token-cache failure that the call survives.
pub fn report_cache_failure(op: CacheOp, error: &StoreError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(op = op.as_str(), error = %error, "Token cache operation failed.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (op, error);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn failed_stage_is_sticky() {
		let span = CallSpan::new("lookup");

		assert_eq!(span.stage(), CallStage::Idle);

		span.enter_stage(CallStage::Authenticating);
		span.fail(&Error::Storage(StoreError::Backend { message: "disk gone".into() }));
		span.enter_stage(CallStage::Succeeded);

		assert_eq!(span.stage(), CallStage::Failed);
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::new("runQuery");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
