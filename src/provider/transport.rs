//! Shared REST plumbing for provider clients.

// crates.io
use reqwest::{RequestBuilder, Response};
// self
use crate::{
	_prelude::*,
	auth::{BearerSecret, ClientSecret, ConsentId, Credential, ProviderId},
	error::{ConfigError, TransportError},
	http::{ReqwestHttpClient, parse_retry_after},
	oauth::ClientCredentialsExchange,
	provider::{ProviderDescriptor, TokenGrant, TokenStyle},
};

/// Header carrying the account-access consent id.
pub const CONSENT_HEADER: &str = "X-Consent-Id";
/// Header carrying the payment consent id.
pub const PAYMENT_CONSENT_HEADER: &str = "X-Payment-Consent-Id";
/// Header carrying the caller-supplied idempotency key.
pub const IDEMPOTENCY_HEADER: &str = "x-idempotency-key";
/// Header carrying the provider's financial institution id.
pub const FINANCIAL_ID_HEADER: &str = "x-fapi-financial-id";

/// Team credentials presented to provider token endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAuth {
	/// Team client id; also sent as the requesting identity.
	pub client_id: String,
	/// Team client secret.
	pub client_secret: ClientSecret,
}
impl ClientAuth {
	/// Creates a new credential pair.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self { client_id: client_id.into(), client_secret: ClientSecret::new(client_secret) }
	}
}

#[derive(Deserialize)]
struct BankTokenResponse {
	access_token: String,
	expires_in: Option<i64>,
}

/// HTTP transport bound to one provider.
///
/// Every request carries the requesting-identity header; callers add the bearer, consent,
/// and body per operation.
pub struct RestTransport {
	descriptor: ProviderDescriptor,
	auth: ClientAuth,
	http_client: ReqwestHttpClient,
	exchange: Option<ClientCredentialsExchange>,
}
impl RestTransport {
	/// Creates a transport for a validated descriptor.
	pub fn new(
		descriptor: ProviderDescriptor,
		auth: ClientAuth,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		descriptor.validate().map_err(ConfigError::from)?;

		let exchange = match &descriptor.token_style {
			TokenStyle::BankToken => None,
			TokenStyle::ClientCredentials { token_url } => Some(ClientCredentialsExchange::new(
				descriptor.id.clone(),
				token_url,
				&auth.client_id,
				auth.client_secret.expose(),
				http_client.clone(),
			)?),
		};

		Ok(Self { descriptor, auth, http_client, exchange })
	}

	/// Descriptor the transport was built from.
	pub fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	/// Provider identifier.
	pub fn provider(&self) -> &ProviderId {
		&self.descriptor.id
	}

	/// Team client id sent as the requesting identity.
	pub fn client_id(&self) -> &str {
		&self.auth.client_id
	}

	/// Resolves `segments` under the base URL, percent-encoding each one.
	pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
		let mut url = self.descriptor.base_url.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::InvalidUrl { url: self.descriptor.base_url.to_string() })?
			.pop_if_empty()
			.extend(segments);

		Ok(url)
	}

	/// Starts a request against `segments`.
	pub fn request(&self, method: Method, segments: &[&str]) -> Result<ProviderRequest<'_>> {
		let url = self.endpoint(segments)?;
		let builder = self
			.http_client
			.request(method, url)
			.header(self.descriptor.quirks.requesting_identity_header.as_str(), self.client_id());

		Ok(ProviderRequest { transport: self, builder })
	}

	/// Obtains a fresh token using the descriptor's token style.
	pub async fn fetch_token(&self) -> Result<TokenGrant> {
		if let Some(exchange) = &self.exchange {
			return exchange.exchange().await;
		}

		self.fetch_bank_token().await
	}

	async fn fetch_bank_token(&self) -> Result<TokenGrant> {
		let url = self.endpoint(&["auth", "bank-token"])?;
		let response = self
			.http_client
			.post(url)
			.query(&[
				("client_id", self.auth.client_id.as_str()),
				("client_secret", self.auth.client_secret.expose()),
			])
			.send()
			.await
			.map_err(TransportError::from)?;
		let status = response.status();

		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();

			return Err(Error::CredentialFetch {
				provider: self.provider().clone(),
				details: format!("token endpoint responded with HTTP {status}: {body}"),
				status: Some(status.as_u16()),
			});
		}

		let payload: BankTokenResponse =
			response.json().await.map_err(|err| Error::CredentialFetch {
				provider: self.provider().clone(),
				details: format!("token response could not be parsed ({err})"),
				status: Some(status.as_u16()),
			})?;
		let expires_in = payload.expires_in.ok_or(ConfigError::MissingExpiresIn)?;

		if expires_in <= 0 {
			return Err(ConfigError::NonPositiveExpiresIn.into());
		}

		Ok(TokenGrant {
			access_token: BearerSecret::new(payload.access_token),
			expires_in: Duration::seconds(expires_in),
		})
	}
}
impl Debug for RestTransport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RestTransport")
			.field("provider", &self.descriptor.id)
			.field("base_url", &self.descriptor.base_url.as_str())
			.field("client_id", &self.auth.client_id)
			.finish()
	}
}

/// Request under construction for one provider call.
pub struct ProviderRequest<'a> {
	transport: &'a RestTransport,
	builder: RequestBuilder,
}
impl ProviderRequest<'_> {
	/// Adds `Authorization: Bearer`.
	pub fn bearer(mut self, credential: &Credential) -> Self {
		self.builder = self.builder.bearer_auth(credential.bearer.expose());

		self
	}

	/// Adds the account-access consent header.
	pub fn consent(self, consent: &ConsentId) -> Self {
		self.header(CONSENT_HEADER, consent)
	}

	/// Adds `x-fapi-financial-id`.
	pub fn financial_id(self) -> Self {
		let value = self.transport.descriptor.financial_id().to_owned();

		self.header(FINANCIAL_ID_HEADER, &value)
	}

	/// Adds an arbitrary header.
	pub fn header(mut self, name: &'static str, value: &str) -> Self {
		self.builder = self.builder.header(name, value);

		self
	}

	/// Appends query parameters.
	pub fn query<T>(mut self, query: &T) -> Self
	where
		T: ?Sized + Serialize,
	{
		self.builder = self.builder.query(query);

		self
	}

	/// Sets a JSON body.
	pub fn json<T>(mut self, body: &T) -> Self
	where
		T: ?Sized + Serialize,
	{
		self.builder = self.builder.json(body);

		self
	}

	/// Sends the request and returns the JSON body of a 2xx response.
	///
	/// Empty bodies become [`Value::Null`] and non-JSON bodies are returned as strings.
	/// Non-2xx responses become [`Error::UpstreamHttp`].
	pub async fn send(self) -> Result<Value> {
		let response = self.builder.send().await.map_err(TransportError::from)?;

		if !response.status().is_success() {
			return Err(self.transport.upstream_error(response).await);
		}

		let text = response.text().await.map_err(TransportError::from)?;

		Ok(parse_body(text))
	}
}

impl RestTransport {
	async fn upstream_error(&self, response: Response) -> Error {
		let status = response.status().as_u16();
		let retry_after = parse_retry_after(response.headers());
		let body = response.text().await.map(parse_body).unwrap_or(Value::Null);

		Error::UpstreamHttp { provider: self.provider().clone(), status, body, retry_after }
	}
}

fn parse_body(text: String) -> Value {
	if text.trim().is_empty() {
		return Value::Null;
	}

	serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::provider::Capability;

	fn transport(base: &str) -> RestTransport {
		let descriptor =
			ProviderDescriptor::builder(ProviderId::new("vbank").expect("Provider should be valid."))
				.base_url(Url::parse(base).expect("Base URL fixture should parse."))
				.support(Capability::ListAccounts)
				.build()
				.expect("Descriptor fixture should build.");

		RestTransport::new(descriptor, ClientAuth::new("team200", "s3cr3t"), Default::default())
			.expect("Transport fixture should build.")
	}

	#[test]
	fn endpoint_encodes_segments_and_keeps_base_path() {
		let transport = transport("https://sandbox.example.com/vbank/");
		let url = transport.endpoint(&["accounts", "acc 1/../x"]).expect("Endpoint should resolve.");

		assert_eq!(url.as_str(), "https://sandbox.example.com/vbank/accounts/acc%201%2F..%2Fx");
	}

	#[test]
	fn non_json_bodies_are_kept_as_text() {
		assert_eq!(parse_body(String::new()), Value::Null);
		assert_eq!(parse_body("{\"ok\":true}".into()), serde_json::json!({ "ok": true }));
		assert_eq!(parse_body("Bad Gateway".into()), Value::String("Bad Gateway".into()));
	}

	#[test]
	fn debug_output_omits_secret() {
		let rendered = format!("{:?}", transport("https://sandbox.example.com"));

		assert!(rendered.contains("team200"));
		assert!(!rendered.contains("s3cr3t"));
	}
}
