//! Capability-aware provider client traits.
//!
//! [`ProviderClient`] is the surface every provider implements: token acquisition and
//! consent creation are mandatory, everything else is optional. Optional services are
//! exposed through accessor methods returning sub-service trait objects; a provider that
//! lacks a whole service returns `None`, and a provider that lacks a single operation
//! inherits the default method, which resolves to [`Error::Unsupported`] without any
//! network traffic.

// self
use crate::{
	_prelude::*,
	auth::{BearerSecret, ConsentId, Credential, ProviderId, UserId},
	provider::{
		Capability, Consent, ConsentRequest, NewAccount, PaymentInitiationRequest,
		ProductAgreementRequest, ProviderDescriptor, VrpConsentRequest, VrpPaymentRequest,
	},
};

/// Boxed future returned by provider client methods.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Token endpoint result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenGrant {
	/// Bearer value.
	pub access_token: BearerSecret,
	/// Declared lifetime.
	pub expires_in: Duration,
}

/// Resolves immediately to [`Error::Unsupported`].
pub fn unsupported<'a, T>(provider: &ProviderId, capability: Capability) -> ClientFuture<'a, T>
where
	T: 'a + Send,
{
	let err = Error::unsupported(provider, capability);

	Box::pin(async move { Err(err) })
}

/// Operation surface shared by every provider.
pub trait ProviderClient
where
	Self: Send + Sync,
{
	/// Validated descriptor for this provider.
	fn descriptor(&self) -> &ProviderDescriptor;

	/// Provider identifier.
	fn id(&self) -> &ProviderId {
		&self.descriptor().id
	}

	/// Obtains a new bearer credential from the provider's token endpoint.
	fn fetch_token(&self) -> ClientFuture<'_, TokenGrant>;

	/// Creates an account-access or payment consent and returns its id.
	fn create_consent<'a>(
		&'a self,
		credential: &'a Credential,
		request: &'a ConsentRequest,
	) -> ClientFuture<'a, ConsentId>;

	/// Reads a consent. Documents missing the id or status fail with
	/// [`Error::EnvelopeShape`].
	fn get_consent<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
	) -> ClientFuture<'a, Consent> {
		let _ = (credential, consent, user);

		unsupported(self.id(), Capability::GetConsent)
	}

	/// Revokes a consent.
	fn revoke_consent<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
	) -> ClientFuture<'a, ()> {
		let _ = (credential, consent, user);

		unsupported(self.id(), Capability::RevokeConsent)
	}

	/// Account service, when offered.
	fn accounts(&self) -> Option<&dyn AccountsApi> {
		None
	}

	/// Payment service, when offered.
	fn payments(&self) -> Option<&dyn PaymentsApi> {
		None
	}

	/// Product service, when offered.
	fn products(&self) -> Option<&dyn ProductsApi> {
		None
	}

	/// Card service, when offered.
	fn cards(&self) -> Option<&dyn CardsApi> {
		None
	}
}

/// Account operations. Consent-scoped reads send `X-Consent-Id`.
pub trait AccountsApi
where
	Self: ProviderClient,
{
	/// Lists the user's accounts.
	fn list_accounts<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, consent, user);

		unsupported(self.id(), Capability::ListAccounts)
	}

	/// Reads one account.
	fn account_details<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		account_id: &'a str,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, consent, user, account_id);

		unsupported(self.id(), Capability::AccountDetails)
	}

	/// Reads an account's balances.
	fn account_balances<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		account_id: &'a str,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, consent, user, account_id);

		unsupported(self.id(), Capability::AccountBalances)
	}

	/// Reads an account's transactions.
	fn account_transactions<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		account_id: &'a str,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, consent, user, account_id);

		unsupported(self.id(), Capability::AccountTransactions)
	}

	/// Opens an account.
	fn create_account<'a>(
		&'a self,
		credential: &'a Credential,
		request: &'a NewAccount,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, request);

		unsupported(self.id(), Capability::CreateAccount)
	}

	/// Changes an account's status.
	fn update_account_status<'a>(
		&'a self,
		credential: &'a Credential,
		user: &'a UserId,
		account_id: &'a str,
		status: &'a str,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, user, account_id, status);

		unsupported(self.id(), Capability::UpdateAccountStatus)
	}

	/// Closes an account.
	fn close_account<'a>(
		&'a self,
		credential: &'a Credential,
		user: &'a UserId,
		account_id: &'a str,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, user, account_id);

		unsupported(self.id(), Capability::CloseAccount)
	}
}

/// Payment operations.
pub trait PaymentsApi
where
	Self: ProviderClient,
{
	/// Initiates a single payment under a payment consent. The request's instruction
	/// identification is sent unmodified as `x-idempotency-key`.
	fn create_payment<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		request: &'a PaymentInitiationRequest,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, consent, request);

		unsupported(self.id(), Capability::CreatePayment)
	}

	/// Reads a payment's status.
	fn payment_status<'a>(
		&'a self,
		credential: &'a Credential,
		payment_id: &'a str,
		user: &'a UserId,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, payment_id, user);

		unsupported(self.id(), Capability::PaymentStatus)
	}

	/// Creates a variable recurring payment consent.
	fn create_vrp_consent<'a>(
		&'a self,
		credential: &'a Credential,
		user: &'a UserId,
		request: &'a VrpConsentRequest,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, user, request);

		unsupported(self.id(), Capability::CreateVrpConsent)
	}

	/// Reads a variable recurring payment consent.
	fn get_vrp_consent<'a>(
		&'a self,
		credential: &'a Credential,
		user: &'a UserId,
		consent: &'a ConsentId,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, user, consent);

		unsupported(self.id(), Capability::GetVrpConsent)
	}

	/// Pays under a variable recurring payment consent.
	fn create_vrp_payment<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		request: &'a VrpPaymentRequest,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, consent, user, request);

		unsupported(self.id(), Capability::CreateVrpPayment)
	}
}

/// Product catalogue and agreement operations.
pub trait ProductsApi
where
	Self: ProviderClient,
{
	/// Lists the public product catalogue.
	fn list_products<'a>(&'a self, credential: &'a Credential) -> ClientFuture<'a, Value> {
		let _ = credential;

		unsupported(self.id(), Capability::ListProducts)
	}

	/// Reads one product.
	fn product_details<'a>(
		&'a self,
		credential: &'a Credential,
		product_id: &'a str,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, product_id);

		unsupported(self.id(), Capability::ProductDetails)
	}

	/// Lists the user's product agreements.
	fn list_product_agreements<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, consent, user);

		unsupported(self.id(), Capability::ListProductAgreements)
	}

	/// Opens a product agreement.
	fn create_product_agreement<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		request: &'a ProductAgreementRequest,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, consent, user, request);

		unsupported(self.id(), Capability::CreateProductAgreement)
	}

	/// Reads one product agreement.
	fn product_agreement_details<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		agreement_id: &'a str,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, consent, user, agreement_id);

		unsupported(self.id(), Capability::ProductAgreementDetails)
	}

	/// Closes a product agreement.
	fn close_product_agreement<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		agreement_id: &'a str,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, consent, user, agreement_id);

		unsupported(self.id(), Capability::CloseProductAgreement)
	}
}

/// Card operations.
pub trait CardsApi
where
	Self: ProviderClient,
{
	/// Lists the user's cards.
	fn list_cards<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, consent, user);

		unsupported(self.id(), Capability::ListCards)
	}

	/// Reads one card.
	fn card_details<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		card_id: &'a str,
	) -> ClientFuture<'a, Value> {
		let _ = (credential, consent, user, card_id);

		unsupported(self.id(), Capability::CardDetails)
	}
}
