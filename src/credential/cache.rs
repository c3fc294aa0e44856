//! In-memory credential cache keyed by provider.

// self
use crate::{
	_prelude::*,
	auth::{Credential, ProviderId},
};

/// Live credentials, one per provider.
///
/// Critical sections never span an `.await`; writes replace whole values.
#[derive(Debug, Default)]
pub struct CredentialCache {
	entries: RwLock<HashMap<ProviderId, Credential>>,
}
impl CredentialCache {
	/// Returns the cached credential regardless of freshness.
	pub fn get(&self, provider: &ProviderId) -> Option<Credential> {
		self.entries.read().get(provider).cloned()
	}

	/// Returns the cached credential when it is still fresh at `now` given `margin`.
	pub fn fresh(
		&self,
		provider: &ProviderId,
		now: OffsetDateTime,
		margin: Duration,
	) -> Option<Credential> {
		self.entries.read().get(provider).filter(|c| c.is_fresh_at(now, margin)).cloned()
	}

	/// Stores `credential`, replacing any previous value for its provider.
	pub fn insert(&self, credential: Credential) {
		self.entries.write().insert(credential.provider.clone(), credential);
	}

	/// Drops the cached credential for `provider`.
	pub fn remove(&self, provider: &ProviderId) -> Option<Credential> {
		self.entries.write().remove(provider)
	}

	/// Number of cached credentials.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns `true` when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}
}
