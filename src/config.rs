//! JSON broker configuration.
//!
//! A [`BrokerConfig`] names the team's client credentials, the manager's timing knobs, and
//! the providers to register. Parsing goes through `serde_path_to_error`, so a bad document
//! reports the failing field path (for example `providers[1].base_url`).

// self
use crate::{
	_prelude::*,
	auth::{ClientSecret, ProviderId},
	credential::CredentialManager,
	error::ConfigError,
	fanout::ProviderRegistry,
	http::ReqwestHttpClient,
	provider::{
		ABankClient, CapabilitySet, ClientAuth, ProviderDescriptor, ProviderQuirks,
		SBankClient, TokenStyle, VBankClient,
	},
	store::CredentialStore,
};

/// Provider implementations shipped with the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProviderKind {
	/// [`VBankClient`].
	VBank,
	/// [`ABankClient`].
	ABank,
	/// [`SBankClient`].
	SBank,
}
impl ProviderKind {
	/// Configuration label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::VBank => VBankClient::KIND,
			Self::ABank => ABankClient::KIND,
			Self::SBank => SBankClient::KIND,
		}
	}

	/// Capabilities the kind implements.
	pub fn capabilities(self) -> CapabilitySet {
		match self {
			Self::VBank => VBankClient::capabilities(),
			Self::ABank => ABankClient::capabilities(),
			Self::SBank => SBankClient::capabilities(),
		}
	}
}
impl Display for ProviderKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ProviderKind {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			VBankClient::KIND => Ok(Self::VBank),
			ABankClient::KIND => Ok(Self::ABank),
			SBankClient::KIND => Ok(Self::SBank),
			_ => Err(ConfigError::UnknownProviderKind { kind: s.to_owned() }),
		}
	}
}
impl TryFrom<String> for ProviderKind {
	type Error = ConfigError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}
impl From<ProviderKind> for String {
	fn from(value: ProviderKind) -> Self {
		value.as_str().to_owned()
	}
}

/// One provider entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
	/// Provider identifier.
	pub id: ProviderId,
	/// Client implementation.
	pub kind: ProviderKind,
	/// Base URL of the provider API.
	pub base_url: Url,
	/// Token acquisition style.
	#[serde(default)]
	pub token_style: TokenStyle,
	/// Narrows the advertised capabilities; the kind's full set when absent. Naming a
	/// capability the kind does not implement is rejected.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub capabilities: Option<CapabilitySet>,
	/// Header quirks.
	#[serde(default)]
	pub quirks: ProviderQuirks,
	/// Per-provider client id, overriding the broker-wide one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_id: Option<String>,
	/// Per-provider client secret, overriding the broker-wide one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_secret: Option<ClientSecret>,
}
impl ProviderConfig {
	/// Builds the validated descriptor for this entry.
	pub fn descriptor(&self) -> Result<ProviderDescriptor, ConfigError> {
		let implemented = self.kind.capabilities();
		let capabilities = self.capabilities.unwrap_or(implemented);

		if let Some(capability) = capabilities.iter().find(|c| !implemented.supports(*c)) {
			return Err(ConfigError::UnimplementedCapability {
				provider: self.id.clone(),
				kind: self.kind.as_str(),
				capability,
			});
		}

		ProviderDescriptor::builder(self.id.clone())
			.base_url(self.base_url.clone())
			.token_style(self.token_style.clone())
			.support_all(capabilities.iter())
			.quirks(self.quirks.clone())
			.build()
			.map_err(ConfigError::from)
	}
}

/// Broker configuration document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
	/// Team client id sent as the requesting identity and used for token requests.
	pub client_id: String,
	/// Team client secret.
	pub client_secret: ClientSecret,
	/// Seconds before expiry at which cached credentials are refetched.
	#[serde(default = "default_safety_margin_secs")]
	pub safety_margin_secs: u32,
	/// Key-set cache lifetime in seconds.
	#[serde(default = "default_jwks_ttl_secs")]
	pub jwks_ttl_secs: u32,
	/// Whole-request deadline for provider calls in seconds.
	#[serde(default = "default_request_timeout_secs")]
	pub request_timeout_secs: u32,
	/// Providers to register.
	pub providers: Vec<ProviderConfig>,
}
impl BrokerConfig {
	/// Parses a JSON document, reporting the failing field path on error.
	pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
		let de = &mut serde_json::Deserializer::from_str(json);

		serde_path_to_error::deserialize(de).map_err(|err| ConfigError::Document {
			path: err.path().to_string(),
			source: err.into_inner(),
		})
	}

	/// Builds the shared HTTP client with the configured request deadline.
	pub fn http_client(&self) -> Result<ReqwestHttpClient, ConfigError> {
		ReqwestHttpClient::with_timeout(Duration::seconds(self.request_timeout_secs.into()))
	}

	/// Instantiates and registers every configured provider.
	pub fn build_registry(&self, http_client: &ReqwestHttpClient) -> Result<ProviderRegistry> {
		let mut builder = ProviderRegistry::builder();

		for provider in &self.providers {
			let descriptor = provider.descriptor()?;
			let auth = ClientAuth::new(
				provider.client_id.as_deref().unwrap_or(&self.client_id),
				provider.client_secret.as_ref().unwrap_or(&self.client_secret).expose(),
			);
			let http_client = http_client.clone();

			builder = match provider.kind {
				ProviderKind::VBank =>
					builder.register(VBankClient::connect(descriptor, auth, http_client)?),
				ProviderKind::ABank =>
					builder.register(ABankClient::connect(descriptor, auth, http_client)?),
				ProviderKind::SBank =>
					builder.register(SBankClient::connect(descriptor, auth, http_client)?),
			};
		}

		builder.build().map_err(Error::from)
	}

	/// Builds a credential manager over the configured providers.
	pub fn build_manager(&self, store: Arc<dyn CredentialStore>) -> Result<CredentialManager> {
		self.build_manager_with(store, self.http_client()?)
	}

	/// Like [`build_manager`](Self::build_manager) but shares a caller-built HTTP client
	/// with every provider and the key-set downloader.
	pub fn build_manager_with(
		&self,
		store: Arc<dyn CredentialStore>,
		http_client: ReqwestHttpClient,
	) -> Result<CredentialManager> {
		let registry = self.build_registry(&http_client)?;

		Ok(CredentialManager::new(Arc::new(registry), store)
			.with_http_client(http_client)
			.with_safety_margin(Duration::seconds(self.safety_margin_secs.into()))
			.with_key_set_ttl(Duration::seconds(self.jwks_ttl_secs.into())))
	}
}

fn default_safety_margin_secs() -> u32 {
	60
}

fn default_jwks_ttl_secs() -> u32 {
	3_600
}

fn default_request_timeout_secs() -> u32 {
	30
}
