//! Provider descriptor data structures shared by clients, the credential manager, and the
//! fan-out coordinator.
//!
//! A descriptor is validated once at construction and then shared read-only. It declares
//! where the provider lives, how its tokens are obtained, and which logical operations it
//! supports, so unsupported work can be rejected before any network traffic.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Capability flags declared by providers.
pub mod capability;
/// Provider-specific header quirks.
pub mod quirks;

pub use builder::*;
pub use capability::*;
pub use quirks::*;

// self
use crate::{_prelude::*, auth::ProviderId};

/// How a provider issues bearer credentials.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenStyle {
	/// Sandbox style: `POST {base}/auth/bank-token?client_id=..&client_secret=..`.
	#[default]
	BankToken,
	/// RFC 6749 client-credentials grant against a dedicated token endpoint.
	ClientCredentials {
		/// Token endpoint URL.
		token_url: Url,
	},
}

/// Immutable provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Base URL every provider path is resolved against.
	pub base_url: Url,
	/// Token acquisition style.
	pub token_style: TokenStyle,
	/// Logical operations the provider implements.
	pub capabilities: CapabilitySet,
	/// Provider-specific header quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Checks whether the descriptor declares a capability.
	pub fn supports(&self, capability: Capability) -> bool {
		self.capabilities.supports(capability)
	}

	/// Value sent as `x-fapi-financial-id`.
	pub fn financial_id(&self) -> &str {
		self.quirks.financial_id.as_deref().unwrap_or(&self.id)
	}

	/// URL of the provider's JSON Web Key Set.
	pub fn jwks_url(&self) -> Result<Url, url::ParseError> {
		jwks_url(&self.base_url)
	}
}

/// Resolves `{base}/.well-known/jwks.json` without discarding any base path.
pub(crate) fn jwks_url(base_url: &Url) -> Result<Url, url::ParseError> {
	let mut raw = base_url.as_str().trim_end_matches('/').to_owned();

	raw.push_str("/.well-known/jwks.json");

	Url::parse(&raw)
}
