//! VBank: the full sandbox surface, including variable recurring payments.

// self
use crate::{
	_prelude::*,
	auth::{ConsentId, Credential, ProviderId, UserId},
	http::ReqwestHttpClient,
	provider::{
		AccountsApi, CapabilitySet, CardsApi, ClientAuth, ClientFuture, Consent, ConsentRequest,
		NewAccount, PaymentInitiationRequest, PaymentsApi, ProductAgreementRequest, ProductsApi,
		ProviderClient, ProviderDescriptor, ProviderDescriptorError, RestTransport, TokenGrant,
		VrpConsentRequest, VrpPaymentRequest,
		sandbox::{self, BalanceLookup},
	},
};

/// VBank client.
///
/// Balances are read with `POST` and a `{"user_id"}` body, and the product catalogue is
/// accepted either wrapped in `data.product` or as a bare array.
#[derive(Debug)]
pub struct VBankClient {
	transport: RestTransport,
}
impl VBankClient {
	/// Provider kind label used in configuration.
	pub const KIND: &'static str = "vbank";

	/// Capabilities VBank implements.
	pub fn capabilities() -> CapabilitySet {
		CapabilitySet::all()
	}

	/// Builds the default descriptor for a VBank deployment.
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
impl ProviderClient for VBankClient {
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

	fn get_consent<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
	) -> ClientFuture<'a, Consent> {
		Box::pin(sandbox::get_consent(&self.transport, credential, consent, user))
	}

	fn revoke_consent<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
	) -> ClientFuture<'a, ()> {
		Box::pin(sandbox::revoke_consent(&self.transport, credential, consent, user))
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
impl AccountsApi for VBankClient {
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
			BalanceLookup::Body,
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

	fn create_account<'a>(
		&'a self,
		credential: &'a Credential,
		request: &'a NewAccount,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::create_account(&self.transport, credential, request))
	}

	fn update_account_status<'a>(
		&'a self,
		credential: &'a Credential,
		user: &'a UserId,
		account_id: &'a str,
		status: &'a str,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::update_account_status(
			&self.transport,
			credential,
			user,
			account_id,
			status,
		))
	}

	fn close_account<'a>(
		&'a self,
		credential: &'a Credential,
		user: &'a UserId,
		account_id: &'a str,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::close_account(&self.transport, credential, user, account_id))
	}
}
impl PaymentsApi for VBankClient {
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

	fn create_vrp_consent<'a>(
		&'a self,
		credential: &'a Credential,
		user: &'a UserId,
		request: &'a VrpConsentRequest,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::create_vrp_consent(&self.transport, credential, user, request))
	}

	fn get_vrp_consent<'a>(
		&'a self,
		credential: &'a Credential,
		user: &'a UserId,
		consent: &'a ConsentId,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::get_vrp_consent(&self.transport, credential, user, consent))
	}

	fn create_vrp_payment<'a>(
		&'a self,
		credential: &'a Credential,
		consent: &'a ConsentId,
		user: &'a UserId,
		request: &'a VrpPaymentRequest,
	) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::create_vrp_payment(&self.transport, credential, consent, user, request))
	}
}
impl ProductsApi for VBankClient {
	fn list_products<'a>(&'a self, credential: &'a Credential) -> ClientFuture<'a, Value> {
		Box::pin(sandbox::list_products(&self.transport, credential, &["data", "product"]))
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
impl CardsApi for VBankClient {
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
