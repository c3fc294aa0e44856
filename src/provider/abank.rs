//! ABank: account reads, single payments, products, and cards.

// self
use crate::{
	_prelude::*,
	auth::{ConsentId, Credential, ProviderId, UserId},
	http::ReqwestHttpClient,
	provider::{
		AccountsApi, Capability, CapabilitySet, CardsApi, ClientAuth, ClientFuture,
		ConsentRequest, PaymentInitiationRequest, PaymentsApi, ProductAgreementRequest,
		ProductsApi, ProviderClient, ProviderDescriptor, ProviderDescriptorError, RestTransport,
		TokenGrant,
		sandbox::{self, BalanceLookup},
	},
};

/// ABank client.
///
/// Account management and variable recurring payments are not offered; those calls
/// resolve to [`Error::Unsupported`] through the trait defaults.
#[derive(Debug)]
pub struct ABankClient {
	transport: RestTransport,
}
impl ABankClient {
	/// Provider kind label used in configuration.
	pub const KIND: &'static str = "abank";

	/// Capabilities ABank implements.
	pub fn capabilities() -> CapabilitySet {
		[
			Capability::CreateConsent,
			Capability::ListAccounts,
			Capability::AccountDetails,
			Capability::AccountBalances,
			Capability::AccountTransactions,
			Capability::CreatePayment,
			Capability::PaymentStatus,
			Capability::ListProducts,
			Capability::ProductDetails,
			Capability::ListProductAgreements,
			Capability::CreateProductAgreement,
			Capability::ProductAgreementDetails,
			Capability::CloseProductAgreement,
			Capability::ListCards,
			Capability::CardDetails,
		]
		.into_iter()
		.collect()
	}

	/// Builds the default descriptor for an ABank deployment.
	pub fn default_descriptor(
		id: ProviderId,
		base_url: Url,
	) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		ProviderDescriptor::builder(id)
			.base_url(base_url)
			.support_all(Self::capabilities().iter())
			.build()
	}

	/// Wraps an existing transport.
	pub fn new(transport: RestTransport) -> Self {
		Self { transport }
	}

	/// Builds the transport and client in one step.
	pub fn connect(
		descriptor: ProviderDescriptor,
		auth: ClientAuth,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		Ok(Self::new(RestTransport::new(descriptor, auth, http_client)?))
	}
}
impl ProviderClient for ABankClient {
	fn descriptor(&self) -> &ProviderDescriptor {
		self.transport.descriptor()
	}

	fn fetch_token(&self) -> ClientFuture<'_, TokenGrant> {
		Box::pin(self.transport.fetch_token())
	}

	fn create_consent<'a>(
		&'a self,
		credential: &'a Credential,
		request: &'a ConsentRequest,
	) -> ClientFuture<'a, ConsentId> {
		Box::pin(sandbox::create_consent(&self.transport, credential, request))
	}

	fn accounts(&self) -> Option<&dyn AccountsApi> {
		Some(self)
	}

	fn payments(&self) -> Option<&dyn PaymentsApi> {
		Some(self)
	}

	fn products(&self) -> Option<&dyn ProductsApi> {
		Some(self)
	}

	fn cards(&self) -> Option<&dyn CardsApi> {
		Some(self)
	}
}
impl AccountsApi for ABankClient {
	fn list_accounts<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::list_accounts(&self.transport, credential, consent, user))
	}

	fn account_details<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		account_id: &'a str,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::account_details(&self.transport, credential, consent, user, account_id))
	}

	fn account_balances<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		account_id: &'a str,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::account_balances(
			&self.transport,
			credential,
			consent,
			user,
			account_id,
			BalanceLookup::Query,
		))
	}

	fn account_transactions<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		account_id: &'a str,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::account_transactions(
			&self.transport,
			credential,
			consent,
			user,
			account_id,
		))
	}
}
impl PaymentsApi for ABankClient {
	fn create_payment<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		request: &'a PaymentInitiationRequest,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::create_payment(&self.transport, credential, consent, request))
	}

	fn payment_status<'a>(
		&'a self,
		credential: &'a Credential,
		payment_id: &'a str,
		user: &'a UserId,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::payment_status(&self.transport, credential, payment_id, user))
	}
}
impl ProductsApi for ABankClient {
	fn list_products<'a>(&'a self, credential: &'a Credential) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::list_products(&self.transport, credential, &["data"]))
	}

	fn product_details<'a>(
		&'a self,
		credential: &'a Credential,
		product_id: &'a str,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::product_details(&self.transport, credential, product_id))
	}

	fn list_product_agreements<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::list_product_agreements(&self.transport, credential, consent, user))
	}

	fn create_product_agreement<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		request: &'a ProductAgreementRequest,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::create_product_agreement(
			&self.transport,
			credential,
			consent,
			user,
			request,
		))
	}

	fn product_agreement_details<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		agreement_id: &'a str,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::product_agreement_details(
			&self.transport,
			credential,
			consent,
			user,
			agreement_id,
		))
	}

	fn close_product_agreement<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		agreement_id: &'a str,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::close_product_agreement(
			&self.transport,
			credential,
			consent,
			user,
			agreement_id,
		))
	}
}
impl CardsApi for ABankClient {
	fn list_cards<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::list_cards(&self.transport, credential, consent, user))
	}

	fn card_details<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		card_id: &'a str,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::card_details(&self.transport, credential, consent, user, card_id))
	}
}
