//! Client-credentials exchange driven through the `oauth2` crate.

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError,
	RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{BearerSecret, ProviderId},
	error::{ConfigError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	provider::TokenGrant,
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// RFC 6749 §4.4 exchange bound to one provider's token endpoint.
///
/// Client credentials travel in the form body, which is what the sandbox banks accept.
pub(crate) struct ClientCredentialsExchange {
	provider: ProviderId,
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestHttpClient,
}
impl ClientCredentialsExchange {
	pub(crate) fn new(
		provider: ProviderId,
		token_url: &Url,
		client_id: &str,
		client_secret: &str,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		let token_url = TokenUrl::new(token_url.to_string())
			.map_err(|source| ConfigError::InvalidTokenEndpoint { source })?;
		let oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.to_owned()))
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self { provider, oauth_client, http_client })
	}

	pub(crate) async fn exchange(&self) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let response = self
			.oauth_client
			.exchange_client_credentials()
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(&self.provider, meta.take(), err))?;
		let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
		let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

		if expires_in <= 0 {
			return Err(ConfigError::NonPositiveExpiresIn.into());
		}

		Ok(TokenGrant {
			access_token: BearerSecret::new(response.access_token().secret().to_owned()),
			expires_in: Duration::seconds(expires_in),
		})
	}
}

fn map_request_error(
	provider: &ProviderId,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(provider, status, &response),
		RequestTokenError::Request(error) => map_transport_error(provider, status, error),
		RequestTokenError::Parse(error, _body) => Error::CredentialFetch {
			provider: provider.clone(),
			details: format!("token response could not be parsed ({error})"),
			status,
		},
		RequestTokenError::Other(message) => Error::CredentialFetch {
			provider: provider.clone(),
			details: format!("token endpoint returned an unexpected response ({message})"),
			status,
		},
	}
}

fn map_server_response_error(
	provider: &ProviderId,
	status: Option<u16>,
	response: &BasicErrorResponse,
) -> Error {
	let details = match response.error_description() {
		Some(description) =>
			format!("token endpoint returned `{}` ({description})", response.error().as_ref()),
		None => format!("token endpoint returned `{}`", response.error().as_ref()),
	};

	Error::CredentialFetch { provider: provider.clone(), details, status }
}

fn map_transport_error(
	provider: &ProviderId,
	status: Option<u16>,
	err: HttpClientError<ReqwestError>,
) -> Error {
	match err {
		HttpClientError::Reqwest(inner) if inner.is_builder() => ConfigError::from(*inner).into(),
		HttpClientError::Reqwest(inner) => TransportError::from(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => Error::CredentialFetch {
			provider: provider.clone(),
			details: format!("HTTP client error while calling the token endpoint ({message})"),
			status,
		},
		_ => Error::CredentialFetch {
			provider: provider.clone(),
			details: "HTTP client error while calling the token endpoint".into(),
			status,
		},
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn builds_client_for_https_token_endpoint() {
		let token_url =
			Url::parse("https://auth.example.com/token").expect("Token URL fixture should parse.");
		let exchange = ClientCredentialsExchange::new(
			ProviderId::new("vbank").expect("Provider fixture should be valid."),
			&token_url,
			"team200",
			"secret",
			ReqwestHttpClient::default(),
		);

		assert!(exchange.is_ok());
	}

	#[test]
	fn server_errors_become_credential_fetch_failures() {
		let provider = ProviderId::new("abank").expect("Provider fixture should be valid.");
		let response: BasicErrorResponse = serde_json::from_str(
			"{\"error\":\"invalid_client\",\"error_description\":\"bad secret\"}",
		)
		.expect("Error response fixture should deserialize.");
		let err = map_server_response_error(&provider, Some(401), &response);

		match err {
			Error::CredentialFetch { provider, details, status } => {
				assert_eq!(provider.as_ref(), "abank");
				assert!(details.contains("invalid_client"));
				assert!(details.contains("bad secret"));
				assert_eq!(status, Some(401));
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}
}
