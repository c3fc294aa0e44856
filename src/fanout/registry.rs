//! Startup-validated set of provider clients.

// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	error::ConfigError,
	provider::ProviderClient,
};

/// Provider clients keyed by provider id.
///
/// Built once; every descriptor is validated and duplicate ids are rejected, so lookups at
/// dispatch time only have to handle ids the caller made up.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
	clients: BTreeMap<ProviderId, Arc<dyn ProviderClient>>,
}
impl ProviderRegistry {
	/// Returns a builder.
	pub fn builder() -> ProviderRegistryBuilder {
		ProviderRegistryBuilder::default()
	}

	/// Client registered for `provider`.
	pub fn get(&self, provider: &ProviderId) -> Option<&Arc<dyn ProviderClient>> {
		self.clients.get(provider)
	}

	/// Returns `true` when `provider` is registered.
	pub fn contains(&self, provider: &ProviderId) -> bool {
		self.clients.contains_key(provider)
	}

	/// Registered ids in ascending order.
	pub fn ids(&self) -> impl Iterator<Item = &ProviderId> {
		self.clients.keys()
	}

	/// Number of registered providers.
	pub fn len(&self) -> usize {
		self.clients.len()
	}

	/// Returns `true` when no provider is registered.
	pub fn is_empty(&self) -> bool {
		self.clients.is_empty()
	}
}
impl Debug for ProviderRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_set().entries(self.clients.keys()).finish()
	}
}

/// Builder for [`ProviderRegistry`].
#[derive(Default)]
pub struct ProviderRegistryBuilder {
	clients: Vec<Arc<dyn ProviderClient>>,
}
impl ProviderRegistryBuilder {
	/// Adds a client.
	pub fn register<C>(self, client: C) -> Self
	where
		C: 'static + ProviderClient,
	{
		self.register_shared(Arc::new(client))
	}

	/// Adds an already shared client.
	pub fn register_shared(mut self, client: Arc<dyn ProviderClient>) -> Self {
		self.clients.push(client);

		self
	}

	/// Validates every descriptor and rejects duplicate ids.
	pub fn build(self) -> Result<ProviderRegistry, ConfigError> {
		let mut clients = BTreeMap::new();

		for client in self.clients {
			client.descriptor().validate()?;

			let id = client.id().clone();

			if clients.contains_key(&id) {
				return Err(ConfigError::DuplicateProvider { provider: id });
			}

			clients.insert(id, client);
		}

		Ok(ProviderRegistry { clients })
	}
}
