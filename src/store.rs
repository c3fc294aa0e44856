//! Storage contracts and the built-in in-memory store for provider credentials.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{BearerSecret, ProviderId},
};

/// Boxed future returned by [`CredentialStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable mapping from provider to its latest bearer credential.
///
/// Encryption at rest is the implementation's concern; the manager writes through on every
/// successful fetch and never reads back during normal operation.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the credential for `provider`.
	fn save<'a>(
		&'a self,
		provider: &'a ProviderId,
		bearer: &'a BearerSecret,
		expires_in_secs: i64,
	) -> StoreFuture<'a, ()>;

	/// Loads the credential stored for `provider`, if present.
	fn load<'a>(&'a self, provider: &'a ProviderId) -> StoreFuture<'a, Option<StoredCredential>>;
}

/// Credential as persisted by a [`CredentialStore`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
	/// Provider the credential belongs to.
	pub provider: ProviderId,
	/// Bearer value.
	pub bearer: BearerSecret,
	/// Lifetime declared by the provider at issuance, in seconds.
	pub expires_in_secs: i64,
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
