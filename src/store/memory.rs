//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{BearerSecret, ProviderId},
	store::{CredentialStore, StoreError, StoreFuture, StoredCredential},
};

type StoreMap = Arc<RwLock<HashMap<ProviderId, StoredCredential>>>;

/// Storage backend that keeps credentials in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of providers with a stored credential.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing has been saved yet.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn save_now(map: StoreMap, record: StoredCredential) -> Result<(), StoreError> {
		map.write().insert(record.provider.clone(), record);

		Ok(())
	}

	fn load_now(map: StoreMap, provider: &ProviderId) -> Option<StoredCredential> {
		map.read().get(provider).cloned()
	}
}
impl CredentialStore for MemoryStore {
	fn save<'a>(
		&'a self,
		provider: &'a ProviderId,
		bearer: &'a BearerSecret,
		expires_in_secs: i64,
	) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let record =
			StoredCredential { provider: provider.clone(), bearer: bearer.clone(), expires_in_secs };

		Box::pin(async move { Self::save_now(map, record) })
	}

	fn load<'a>(&'a self, provider: &'a ProviderId) -> StoreFuture<'a, Option<StoredCredential>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::load_now(map, provider)) })
	}
}
