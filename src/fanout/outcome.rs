//! Per-provider results of a fan-out dispatch.

// self
use crate::{_prelude::*, auth::ProviderId, error::ErrorKind};

/// Result of one provider's share of a dispatch.
///
/// Serializes as `{"provider": .., "status": "success", "data": ..}` or
/// `{"provider": .., "status": "failed", "error": {..}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome {
	/// Provider the outcome belongs to.
	pub provider: ProviderId,
	/// Payload or failure.
	#[serde(flatten)]
	pub result: OutcomeResult,
}
impl OperationOutcome {
	/// Builds a successful outcome.
	pub fn success(provider: ProviderId, data: Value) -> Self {
		Self { provider, result: OutcomeResult::Success { data } }
	}

	/// Builds a failed outcome from a broker error.
	pub fn failed(provider: ProviderId, error: &Error) -> Self {
		Self { provider, result: OutcomeResult::Failed { error: OutcomeError::from(error) } }
	}

	/// Returns `true` for successful outcomes.
	pub fn is_success(&self) -> bool {
		matches!(self.result, OutcomeResult::Success { .. })
	}

	/// Payload of a successful outcome.
	pub fn data(&self) -> Option<&Value> {
		match &self.result {
			OutcomeResult::Success { data } => Some(data),
			OutcomeResult::Failed { .. } => None,
		}
	}

	/// Failure of a failed outcome.
	pub fn error(&self) -> Option<&OutcomeError> {
		match &self.result {
			OutcomeResult::Success { .. } => None,
			OutcomeResult::Failed { error } => Some(error),
		}
	}
}

/// Success payload or failure description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeResult {
	/// The provider call succeeded.
	Success {
		/// Provider payload, already unwrapped from its envelope.
		data: Value,
	},
	/// The provider call failed.
	Failed {
		/// Failure description.
		error: OutcomeError,
	},
}

/// Serializable failure description carried by a failed outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeError {
	/// Failure class callers branch on.
	pub kind: ErrorKind,
	/// Human-readable message.
	pub message: String,
	/// Upstream HTTP status, when there was one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status_code: Option<u16>,
	/// Upstream response body, for non-2xx responses.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub body: Option<Value>,
}
impl From<&Error> for OutcomeError {
	fn from(error: &Error) -> Self {
		let body = match error {
			Error::UpstreamHttp { body, .. } => Some(body.clone()),
			_ => None,
		};

		Self { kind: error.kind(), message: error.to_string(), status_code: error.status(), body }
	}
}
