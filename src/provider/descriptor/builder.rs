// crates.io
use reqwest::header::HeaderName;
// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	provider::{Capability, CapabilitySet, ProviderDescriptor, ProviderQuirks, TokenStyle},
};

const LOOPBACK_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Base URL is mandatory.
	#[error("Missing base URL.")]
	MissingBaseUrl,
	/// At least one capability must be declared.
	#[error("Descriptor must declare at least one capability.")]
	NoCapabilities,
	/// URLs must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} URL must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which URL failed validation.
		endpoint: &'static str,
		/// URL that failed validation.
		url: String,
	},
	/// URLs must be able to carry path segments.
	#[error("The {endpoint} URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// Which URL failed validation.
		endpoint: &'static str,
		/// URL that failed validation.
		url: String,
	},
	/// The requesting-identity header name is not a legal HTTP header.
	#[error("`{name}` is not a valid HTTP header name.")]
	InvalidHeaderName {
		/// Rejected header name.
		name: String,
	},
	/// The financial id override was blank.
	#[error("Financial id override cannot be empty.")]
	EmptyFinancialId,
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// Base URL for provider calls.
	pub base_url: Option<Url>,
	/// Token acquisition style.
	pub token_style: TokenStyle,
	/// Capabilities enabled for the provider.
	pub capabilities: CapabilitySet,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			base_url: None,
			token_style: TokenStyle::default(),
			capabilities: CapabilitySet::empty(),
			quirks: ProviderQuirks::default(),
		}
	}

	/// Sets the base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Overrides the token acquisition style.
	pub fn token_style(mut self, style: TokenStyle) -> Self {
		self.token_style = style;

		self
	}

	/// Marks a single capability as supported.
	pub fn support(mut self, capability: Capability) -> Self {
		self.capabilities = self.capabilities.enable(capability);

		self
	}

	/// Marks multiple capabilities as supported.
	pub fn support_all<I>(mut self, capabilities: I) -> Self
	where
		I: IntoIterator<Item = Capability>,
	{
		for capability in capabilities {
			self.capabilities = self.capabilities.enable(capability);
		}

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let base_url = self.base_url.ok_or(ProviderDescriptorError::MissingBaseUrl)?;
		let descriptor = ProviderDescriptor {
			id: self.id,
			base_url,
			token_style: self.token_style,
			capabilities: self.capabilities,
			quirks: self.quirks,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	pub fn validate(&self) -> Result<(), ProviderDescriptorError> {
		if self.capabilities.is_empty() {
			return Err(ProviderDescriptorError::NoCapabilities);
		}

		validate_endpoint("base", &self.base_url)?;

		if let TokenStyle::ClientCredentials { token_url } = &self.token_style {
			validate_endpoint("token", token_url)?;
		}
		if HeaderName::from_bytes(self.quirks.requesting_identity_header.as_bytes()).is_err() {
			return Err(ProviderDescriptorError::InvalidHeaderName {
				name: self.quirks.requesting_identity_header.clone(),
			});
		}
		if matches!(self.quirks.financial_id.as_deref(), Some(value) if value.trim().is_empty()) {
			return Err(ProviderDescriptorError::EmptyFinancialId);
		}

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.cannot_be_a_base() {
		return Err(ProviderDescriptorError::CannotBeABase { endpoint: name, url: url.to_string() });
	}

	let loopback = url.host_str().is_some_and(|host| LOOPBACK_HOSTS.contains(&host));

	match url.scheme() {
		"https" => Ok(()),
		"http" if loopback => Ok(()),
		_ => Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn id() -> ProviderId {
		ProviderId::new("vbank").expect("Provider fixture should be valid.")
	}

	fn url(raw: &str) -> Url {
		Url::parse(raw).expect("URL fixture should parse.")
	}

	#[test]
	fn builds_with_defaults() {
		let descriptor = ProviderDescriptor::builder(id())
			.base_url(url("https://vbank.open.bankingapi.ru"))
			.support_all([Capability::CreateConsent, Capability::ListAccounts])
			.build()
			.expect("Descriptor should build.");

		assert_eq!(descriptor.token_style, TokenStyle::BankToken);
		assert_eq!(descriptor.quirks.requesting_identity_header, "X-Requesting-Bank");
		assert_eq!(descriptor.financial_id(), "vbank");
		assert!(descriptor.supports(Capability::ListAccounts));
		assert!(!descriptor.supports(Capability::ListCards));
	}

	#[test]
	fn rejects_plain_http_outside_loopback() {
		let err = ProviderDescriptor::builder(id())
			.base_url(url("http://vbank.example.com"))
			.support(Capability::CreateConsent)
			.build()
			.expect_err("Remote plain HTTP must be rejected.");

		assert!(matches!(err, ProviderDescriptorError::InsecureEndpoint { endpoint: "base", .. }));

		ProviderDescriptor::builder(id())
			.base_url(url("http://127.0.0.1:8080"))
			.support(Capability::CreateConsent)
			.build()
			.expect("Loopback plain HTTP should be accepted.");
	}

	#[test]
	fn rejects_insecure_token_endpoint_and_missing_capabilities() {
		let err = ProviderDescriptor::builder(id())
			.base_url(url("https://vbank.example.com"))
			.token_style(TokenStyle::ClientCredentials { token_url: url("http://auth.example.com") })
			.support(Capability::CreateConsent)
			.build()
			.expect_err("Insecure token endpoint must be rejected.");

		assert!(matches!(err, ProviderDescriptorError::InsecureEndpoint { endpoint: "token", .. }));
		assert_eq!(
			ProviderDescriptor::builder(id()).base_url(url("https://vbank.example.com")).build(),
			Err(ProviderDescriptorError::NoCapabilities)
		);
		assert_eq!(
			ProviderDescriptor::builder(id()).support(Capability::CreateConsent).build(),
			Err(ProviderDescriptorError::MissingBaseUrl)
		);
	}

	#[test]
	fn rejects_bad_quirks() {
		let base = ProviderDescriptor::builder(id())
			.base_url(url("https://vbank.example.com"))
			.support(Capability::CreateConsent);
		let err = base
			.quirks(ProviderQuirks {
				financial_id: None,
				requesting_identity_header: "X Requesting".into(),
			})
			.build()
			.expect_err("Header names with spaces must be rejected.");

		assert!(matches!(err, ProviderDescriptorError::InvalidHeaderName { .. }));

		let err = ProviderDescriptor::builder(id())
			.base_url(url("https://vbank.example.com"))
			.support(Capability::CreateConsent)
			.quirks(ProviderQuirks { financial_id: Some(" ".into()), ..Default::default() })
			.build()
			.expect_err("Blank financial ids must be rejected.");

		assert_eq!(err, ProviderDescriptorError::EmptyFinancialId);
	}
}
