//! Logical operations the coordinator can fan out.

// crates.io
use serde_json::json;
// self
use crate::{
	_prelude::*,
	auth::{ConsentId, Credential, ProviderId, UserId},
	provider::{Capability, ConsentRequest, ProviderClient},
};

/// Explicit provider-to-consent mapping supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsentMap(BTreeMap<ProviderId, ConsentId>);
impl ConsentMap {
	/// Creates an empty map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces the consent for `provider`.
	pub fn with(mut self, provider: ProviderId, consent: ConsentId) -> Self {
		self.0.insert(provider, consent);

		self
	}

	/// Consent registered for `provider`.
	pub fn get(&self, provider: &ProviderId) -> Option<&ConsentId> {
		self.0.get(provider)
	}

	/// Consent for `provider`, or [`Error::PreconditionMissing`].
	pub fn require(&self, provider: &ProviderId) -> Result<&ConsentId> {
		self.get(provider).ok_or_else(|| Error::PreconditionMissing {
			provider: provider.clone(),
			requirement: "a consent id",
		})
	}

	/// Number of mapped providers.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no consent is mapped.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl FromIterator<(ProviderId, ConsentId)> for ConsentMap {
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (ProviderId, ConsentId)>,
	{
		Self(iter.into_iter().collect())
	}
}

/// One logical request dispatched to every selected provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
	/// Create a consent. The dispatch user replaces the request's `user_id`.
	CreateConsent(ConsentRequest),
	/// Read each provider's consent.
	GetConsent(ConsentMap),
	/// Revoke each provider's consent.
	RevokeConsent(ConsentMap),
	/// List accounts under each provider's consent.
	ListAccounts(ConsentMap),
	/// List cards under each provider's consent.
	ListCards(ConsentMap),
	/// List the public product catalogue.
	ListProducts,
	/// List product agreements under each provider's consent.
	ListProductAgreements(ConsentMap),
}
impl Operation {
	/// Capability a provider must declare to receive this operation.
	pub fn capability(&self) -> Capability {
		match self {
			Self::CreateConsent(_) => Capability::CreateConsent,
			Self::GetConsent(_) => Capability::GetConsent,
			Self::RevokeConsent(_) => Capability::RevokeConsent,
			Self::ListAccounts(_) => Capability::ListAccounts,
			Self::ListCards(_) => Capability::ListCards,
			Self::ListProducts => Capability::ListProducts,
			Self::ListProductAgreements(_) => Capability::ListProductAgreements,
		}
	}

	/// Consent mapping, for consent-scoped operations.
	pub fn consents(&self) -> Option<&ConsentMap> {
		match self {
			Self::GetConsent(consents)
			| Self::RevokeConsent(consents)
			| Self::ListAccounts(consents)
			| Self::ListCards(consents)
			| Self::ListProductAgreements(consents) => Some(consents),
			Self::CreateConsent(_) | Self::ListProducts => None,
		}
	}

	pub(crate) async fn invoke(
		&self,
		client: &dyn ProviderClient,
		credential: &Credential,
		user: &UserId,
	) -> Result<Value> {
		let provider = client.id();
		let unsupported = || Error::unsupported(provider, self.capability());

		match self {
			Self::CreateConsent(request) => {
				let request = ConsentRequest { user_id: user.clone(), ..request.clone() };
				let consent = client.create_consent(credential, &request).await?;

				Ok(json!({ "consent_id": consent }))
			},
			Self::GetConsent(consents) => {
				let consent = client.get_consent(credential, consents.require(provider)?, user).await?;

				Ok(json!(consent))
			},
			Self::RevokeConsent(consents) => {
				let consent = consents.require(provider)?;

				client.revoke_consent(credential, consent, user).await?;

				Ok(json!({ "consent_id": consent, "status": "revoked" }))
			},
			Self::ListAccounts(consents) => {
				let consent = consents.require(provider)?;
				let api = client.accounts().ok_or_else(unsupported)?;

				api.list_accounts(credential, consent, user).await
			},
			Self::ListCards(consents) => {
				let consent = consents.require(provider)?;
				let api = client.cards().ok_or_else(unsupported)?;

				api.list_cards(credential, consent, user).await
			},
			Self::ListProducts => {
				let api = client.products().ok_or_else(unsupported)?;

				api.list_products(credential).await
			},
			Self::ListProductAgreements(consents) => {
				let consent = consents.require(provider)?;
				let api = client.products().ok_or_else(unsupported)?;

				api.list_product_agreements(credential, consent, user).await
			},
		}
	}
}
