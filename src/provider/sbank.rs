//! SBank: token issuance and consent creation only.

// self
use crate::{
	_prelude::*,
	auth::{ConsentId, Credential, ProviderId},
	http::ReqwestHttpClient,
	provider::{
		Capability, CapabilitySet, ClientAuth, ClientFuture, ConsentRequest, ProviderClient,
		ProviderDescriptor, ProviderDescriptorError, RestTransport, TokenGrant, sandbox,
	},
};

/// SBank client. Every service accessor returns `None`.
#[derive(Debug)]
pub struct SBankClient {
	transport: RestTransport,
}
impl SBankClient {
	/// Provider kind label used in configuration.
	pub const KIND: &'static str = "sbank";

	/// Capabilities SBank implements.
	pub fn capabilities() -> CapabilitySet {
		[Capability::CreateConsent].into_iter().collect()
	}

	/// Builds the default descriptor for an SBank deployment.
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
impl ProviderClient for SBankClient {
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
}
