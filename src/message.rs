//! Typed message capability: the client only ever asks a message to encode itself or to
//! decode a body into itself.

// self
use crate::_prelude::*;

/// Request or response message carried by an RPC.
///
/// Every [`prost::Message`] implements this. Other encodings implement it directly and report
/// failures through [`Error::serialization`] / [`Error::deserialization`].
pub trait RpcMessage
where
	Self: Send,
{
	/// Encodes the message into its wire bytes.
	fn to_bytes(&self) -> Result<Bytes>;

	/// Replaces the message contents with the decoded `bytes`.
	fn parse_from(&mut self, bytes: Bytes) -> Result<()>;
}
impl<T> RpcMessage for T
where
	T: prost::Message,
{
	fn to_bytes(&self) -> Result<Bytes> {
		Ok(Bytes::from(self.encode_to_vec()))
	}

	fn parse_from(&mut self, bytes: Bytes) -> Result<()> {
		self.clear();

		self.merge(bytes).map_err(Error::deserialization)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Clone, PartialEq, prost::Message)]
	struct Entity {
		#[prost(string, tag = "1")]
		kind: String,
		#[prost(int64, tag = "2")]
		id: i64,
	}

	#[test]
	fn parse_replaces_previous_contents() {
		let encoded = Entity { kind: "Book".into(), id: 0 }
			.to_bytes()
			.expect("Prost messages always encode.");
		let mut container = Entity { kind: "Stale".into(), id: 99 };

		container.parse_from(encoded).expect("Encoded entity should decode.");

		assert_eq!(container, Entity { kind: "Book".into(), id: 0 });
	}

	#[test]
	fn truncated_bytes_are_a_deserialization_error() {
		let mut container = Entity::default();
		let err = container
			.parse_from(Bytes::from_static(b"\x0a\x05Bo"))
			.expect_err("Truncated length-delimited field must fail.");

		assert!(matches!(err, Error::Deserialization { .. }));
	}
}
