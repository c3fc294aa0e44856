//! Broker-level error types shared across provider clients, the credential manager, and the
//! fan-out coordinator.

// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	credential::TokenVerificationError,
	provider::Capability,
};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
///
/// Provider clients and the credential manager propagate these values undecorated; the
/// fan-out coordinator converts them into failed outcomes tagged with [`ErrorKind`].
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Signed token could not be verified.
	#[error(transparent)]
	TokenVerification(#[from] TokenVerificationError),

	/// The provider's token endpoint refused or failed to issue a credential.
	#[error("Failed to fetch a credential for provider `{provider}`: {details}.")]
	CredentialFetch {
		/// Provider whose token endpoint failed.
		provider: ProviderId,
		/// Human-readable failure summary.
		details: String,
		/// HTTP status code, when the provider answered.
		status: Option<u16>,
	},
	/// The provider does not offer the requested capability.
	#[error("Provider `{provider}` does not support {capability}.")]
	Unsupported {
		/// Provider that lacks the capability.
		provider: ProviderId,
		/// Capability that was requested.
		capability: Capability,
	},
	/// The provider answered with a non-2xx status.
	#[error("Provider `{provider}` responded with HTTP {status}.")]
	UpstreamHttp {
		/// Provider that produced the response.
		provider: ProviderId,
		/// HTTP status code.
		status: u16,
		/// Response body, parsed as JSON when possible and kept as a string otherwise.
		body: Value,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// The provider's response lacks the structure its client expects.
	#[error("Provider `{provider}` returned a response without `{expected}`.")]
	EnvelopeShape {
		/// Provider that produced the response.
		provider: ProviderId,
		/// Dotted path of the missing element.
		expected: String,
	},
	/// A per-provider input required by the operation was not supplied by the caller.
	#[error("Provider `{provider}` requires {requirement}, which was not supplied.")]
	PreconditionMissing {
		/// Provider the precondition applies to.
		provider: ProviderId,
		/// Description of the missing input.
		requirement: &'static str,
	},
}
impl Error {
	/// Builds an [`Error::Unsupported`] value.
	pub fn unsupported(provider: &ProviderId, capability: Capability) -> Self {
		Self::Unsupported { provider: provider.clone(), capability }
	}

	/// Returns the stable classification used in fan-out outcomes.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Storage(_) => ErrorKind::Storage,
			Self::Config(_) => ErrorKind::Config,
			Self::Transport(err) if err.is_timeout() => ErrorKind::Timeout,
			Self::Transport(_) => ErrorKind::Transport,
			Self::TokenVerification(_) => ErrorKind::TokenVerification,
			Self::CredentialFetch { .. } => ErrorKind::CredentialFetch,
			Self::Unsupported { .. } => ErrorKind::Unsupported,
			Self::UpstreamHttp { .. } => ErrorKind::UpstreamHttp,
			Self::EnvelopeShape { .. } => ErrorKind::EnvelopeShape,
			Self::PreconditionMissing { .. } => ErrorKind::PreconditionMissing,
		}
	}

	/// Returns `true` when the provider intentionally lacks the capability.
	pub fn is_unsupported(&self) -> bool {
		matches!(self, Self::Unsupported { .. })
	}

	/// HTTP status attached to the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::UpstreamHttp { status, .. } => Some(*status),
			Self::CredentialFetch { status, .. } => *status,
			_ => None,
		}
	}
}

/// Data tag describing which failure class an [`Error`] belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// Credential acquisition failed.
	CredentialFetch,
	/// Signed token verification failed.
	TokenVerification,
	/// Provider lacks the capability; not a transport failure.
	Unsupported,
	/// Provider answered with a non-2xx status.
	UpstreamHttp,
	/// Provider response was missing its expected envelope.
	EnvelopeShape,
	/// Caller did not supply a required per-provider input.
	PreconditionMissing,
	/// Network-level failure.
	Transport,
	/// Request exceeded its deadline.
	Timeout,
	/// Storage backend failure.
	Storage,
	/// Local configuration failure.
	Config,
}
impl ErrorKind {
	/// Returns a stable label suitable for logs and serialized outcomes.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::CredentialFetch => "credential_fetch",
			Self::TokenVerification => "token_verification",
			Self::Unsupported => "unsupported",
			Self::UpstreamHttp => "upstream_http",
			Self::EnvelopeShape => "envelope_shape",
			Self::PreconditionMissing => "precondition_missing",
			Self::Transport => "transport",
			Self::Timeout => "timeout",
			Self::Storage => "storage",
			Self::Config => "config",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A provider URL could not be parsed or extended.
	#[error("Provider URL `{url}` is invalid.")]
	InvalidUrl {
		/// URL that failed.
		url: String,
	},
	/// Token endpoint could not be used to build an OAuth client.
	#[error("Token endpoint is invalid.")]
	InvalidTokenEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
	/// Consent permissions are invalid.
	#[error("Requested permissions are invalid.")]
	InvalidPermissions(#[from] crate::auth::PermissionValidationError),
	/// Credential builder validation failed.
	#[error("Unable to build credential.")]
	CredentialBuild(#[from] crate::auth::CredentialBuilderError),
	/// Consent validity window could not be rendered.
	#[error("Consent dates could not be formatted.")]
	ConsentDate,
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Two registered clients claim the same provider identifier.
	#[error("Provider `{provider}` is registered more than once.")]
	DuplicateProvider {
		/// Duplicated identifier.
		provider: ProviderId,
	},
	/// The registry has no client for the provider.
	#[error("Provider `{provider}` is not registered.")]
	UnknownProvider {
		/// Missing identifier.
		provider: ProviderId,
	},
	/// Broker configuration document could not be parsed.
	#[error("Broker configuration is invalid at `{path}`.")]
	Document {
		/// Path to the failing field.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// Configuration declares a capability its provider kind does not implement.
	#[error("Provider `{provider}` of kind `{kind}` does not implement {capability}.")]
	UnimplementedCapability {
		/// Configured provider.
		provider: ProviderId,
		/// Provider kind label.
		kind: &'static str,
		/// Capability the kind lacks.
		capability: Capability,
	},
	/// Configuration names a provider kind the crate does not ship.
	#[error("Provider kind `{kind}` is not supported.")]
	UnknownProviderKind {
		/// Offending kind label.
		kind: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, deadlines).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request did not complete before its deadline.
	#[error("Request to the provider timed out.")]
	Timeout {
		/// Transport-specific error, when the HTTP client raised one.
		#[source]
		source: Option<BoxError>,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Returns `true` for deadline failures.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() {
			Self::Timeout { source: Some(Box::new(e)) }
		} else {
			Self::network(e)
		}
	}
}
