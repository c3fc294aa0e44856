//! Capability-aware Open Banking broker.
//!
//! Provider credentials are cached per bank and provider-signed tokens are verified against
//! each bank's key set. One logical request fans out to many banks, and a failing bank only
//! fails its own outcome.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod config;
pub mod credential;
pub mod error;
pub mod fanout;
pub mod http;
pub mod obs;
pub mod provider;
pub mod store;

mod oauth;

#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// self
	use crate::{
		auth::{BearerSecret, ConsentId, Credential, ProviderId, UserId},
		clock::{Clock, ManualClock},
		credential::CredentialManager,
		error::ConfigError,
		fanout::ProviderRegistry,
		http::ReqwestHttpClient,
		provider::{
			AccountsApi, Capability, ClientFuture, ConsentRequest, ProviderClient,
			ProviderDescriptor, TokenGrant,
		},
		store::{CredentialStore, MemoryStore},
	};

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Parses a provider identifier fixture.
	pub fn provider_id(value: &str) -> ProviderId {
		ProviderId::new(value).expect("Provider identifier fixture should be valid.")
	}

	/// Parses a user identifier fixture.
	pub fn user_id(value: &str) -> UserId {
		UserId::new(value).expect("User identifier fixture should be valid.")
	}

	/// Registers every scripted client.
	pub fn registry_of<I>(clients: I) -> ProviderRegistry
	where
		I: IntoIterator<Item = Arc<ScriptedClient>>,
	{
		clients
			.into_iter()
			.fold(ProviderRegistry::builder(), |builder, client| builder.register_shared(client))
			.build()
			.expect("Scripted registry should build.")
	}

	/// Constructs a [`CredentialManager`] backed by an in-memory store and a manual clock so
	/// tests can advance time without sleeping.
	pub fn build_test_manager(
		registry: ProviderRegistry,
	) -> (Arc<CredentialManager>, Arc<MemoryStore>, Arc<ManualClock>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let clock_backend = Arc::new(ManualClock::starting_at(OffsetDateTime::now_utc()));
		let clock: Arc<dyn Clock> = clock_backend.clone();
		let manager = CredentialManager::new(Arc::new(registry), store)
			.with_clock(clock)
			.with_http_client(test_reqwest_http_client());

		(Arc::new(manager), store_backend, clock_backend)
	}

	/// Scripted answer for [`ScriptedClient`]'s account listing.
	#[derive(Clone, Debug)]
	pub enum AccountsScript {
		/// Resolve with the payload.
		Data(Value),
		/// Resolve with [`Error::UpstreamHttp`] carrying the status.
		Upstream(u16),
		/// Sleep, then resolve with the payload.
		Delayed(std::time::Duration, Value),
	}

	/// In-process provider whose token endpoint and account listing are scripted.
	#[derive(Debug)]
	pub struct ScriptedClient {
		descriptor: ProviderDescriptor,
		tokens: Mutex<VecDeque<String>>,
		token_ttl: Duration,
		token_delay: Option<std::time::Duration>,
		token_calls: AtomicUsize,
		accounts: AccountsScript,
	}
	impl ScriptedClient {
		/// Creates a client that supports consent creation and account listing and issues
		/// `tok1` with a one-hour lifetime.
		pub fn new(id: &str) -> Self {
			let base_url = Url::parse(&format!("https://{id}.example.com"))
				.expect("Scripted base URL should parse.");

			Self {
				descriptor: Self::descriptor_for(
					id,
					base_url,
					[Capability::CreateConsent, Capability::ListAccounts],
				),
				tokens: Mutex::new(VecDeque::from(["tok1".to_owned()])),
				token_ttl: Duration::hours(1),
				token_delay: None,
				token_calls: AtomicUsize::new(0),
				accounts: AccountsScript::Data(Value::Array(Vec::new())),
			}
		}

		/// Replaces the queue of bearer values handed out by successive fetches.
		pub fn with_tokens<'a, I>(self, tokens: I) -> Self
		where
			I: IntoIterator<Item = &'a str>,
		{
			*self.tokens.lock() = tokens.into_iter().map(str::to_owned).collect();

			self
		}

		/// Overrides the declared token lifetime.
		pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
			self.token_ttl = ttl;

			self
		}

		/// Delays every token fetch.
		pub fn with_token_delay(mut self, delay: std::time::Duration) -> Self {
			self.token_delay = Some(delay);

			self
		}

		/// Replaces the declared capabilities.
		pub fn with_capabilities<I>(mut self, capabilities: I) -> Self
		where
			I: IntoIterator<Item = Capability>,
		{
			self.descriptor = Self::descriptor_for(
				&self.descriptor.id,
				self.descriptor.base_url.clone(),
				capabilities,
			);

			self
		}

		/// Scripts the account listing.
		pub fn with_accounts(mut self, script: AccountsScript) -> Self {
			self.accounts = script;

			self
		}

		/// Number of token fetches performed so far.
		pub fn token_calls(&self) -> usize {
			self.token_calls.load(Ordering::SeqCst)
		}

		fn descriptor_for<I>(id: &str, base_url: Url, capabilities: I) -> ProviderDescriptor
		where
			I: IntoIterator<Item = Capability>,
		{
			ProviderDescriptor::builder(provider_id(id))
				.base_url(base_url)
				.support_all(capabilities)
				.build()
				.expect("Scripted descriptor should build.")
		}
	}
	impl ProviderClient for ScriptedClient {
		fn descriptor(&self) -> &ProviderDescriptor {
			&self.descriptor
		}

		fn fetch_token(&self) -> ClientFuture<'_, TokenGrant> {
			Box::pin(async move {
				self.token_calls.fetch_add(1, Ordering::SeqCst);

				if let Some(delay) = self.token_delay {
					tokio::time::sleep(delay).await;
				}

				let next = self.tokens.lock().pop_front();
				let token = next.ok_or_else(|| Error::CredentialFetch {
					provider: self.id().clone(),
					details: "token endpoint refused the request".into(),
					status: Some(401),
				})?;

				Ok(TokenGrant { access_token: BearerSecret::new(token), expires_in: self.token_ttl })
			})
		}

		fn create_consent<'a>(
			&'a self,
			credential: &'a Credential,
			request: &'a ConsentRequest,
		) -> ClientFuture<'a, ConsentId> {
			let _ = credential;

			Box::pin(async move {
				let consent = ConsentId::new(format!("{}-{}", self.id(), request.user_id))
					.map_err(ConfigError::from)?;

				Ok(consent)
			})
		}

		fn accounts(&self) -> Option<&dyn AccountsApi> {
			Some(self)
		}
	}
	impl AccountsApi for ScriptedClient {
		fn list_accounts<'a>(
			&'a self,
			credential: &'a Credential,
			consent: &'a ConsentId,
			user: &'a UserId,
		) -> ClientFuture<'a, Value> {
			let _ = (credential, consent, user);

			Box::pin(async move {
				match &self.accounts {
					AccountsScript::Data(data) => Ok(data.clone()),
					AccountsScript::Upstream(status) => Err(Error::UpstreamHttp {
						provider: self.id().clone(),
						status: *status,
						body: Value::String("upstream failure".into()),
						retry_after: None,
					}),
					AccountsScript::Delayed(delay, data) => {
						tokio::time::sleep(*delay).await;

						Ok(data.clone())
					},
				}
			})
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, Method, StatusCode};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(test)] use httpmock as _;
#[cfg(test)] use openbanking_broker as _;
