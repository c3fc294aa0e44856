//! Credential manager: cached provider bearer tokens and JWKS-backed token verification.
//!
//! [`CredentialManager::get_credential`] serves a cached credential while it is fresh
//! (`now < expires_at - safety_margin`) and otherwise fetches a new one under a
//! per-provider single-flight guard, writing it through to the [`CredentialStore`]
//! before caching it. Concurrent callers for the same provider share one fetch; callers
//! for different providers never wait on each other.
//!
//! [`CredentialManager::verify_signed_token`] validates provider-signed JWTs against the
//! provider's published key set, cached per URL with a TTL. It never touches the
//! credential cache.

mod cache;
mod key_set;
mod metrics;

pub use cache::CredentialCache;
pub use key_set::{KeySetCache, TokenVerificationError};
pub use metrics::CredentialMetrics;

// crates.io
use jsonwebtoken::{DecodingKey, Validation, jwk::JwkSet};
// self
use crate::{
	_prelude::*,
	auth::{Credential, ProviderId},
	clock::{Clock, SystemClock},
	error::ConfigError,
	fanout::ProviderRegistry,
	http::ReqwestHttpClient,
	obs::{self, OpKind, OpOutcome, OpSpan},
	provider::descriptor,
	store::CredentialStore,
};

/// Claims of a verified token.
pub type Claims = serde_json::Map<String, Value>;

type GuardMap = Mutex<HashMap<ProviderId, Arc<AsyncMutex<()>>>>;

/// Owns live provider credentials and the key sets used to verify provider tokens.
pub struct CredentialManager {
	registry: Arc<ProviderRegistry>,
	store: Arc<dyn CredentialStore>,
	clock: Arc<dyn Clock>,
	http_client: ReqwestHttpClient,
	cache: Arc<CredentialCache>,
	key_sets: Arc<KeySetCache>,
	safety_margin: Duration,
	guards: GuardMap,
	metrics: Arc<CredentialMetrics>,
}
impl CredentialManager {
	/// Default margin before expiry at which a cached credential is treated as stale.
	pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(60);

	/// Creates a manager over `registry` that persists fetched credentials to `store`.
	pub fn new(registry: Arc<ProviderRegistry>, store: Arc<dyn CredentialStore>) -> Self {
		Self {
			registry,
			store,
			clock: Arc::new(SystemClock),
			http_client: ReqwestHttpClient::default(),
			cache: Default::default(),
			key_sets: Default::default(),
			safety_margin: Self::DEFAULT_SAFETY_MARGIN,
			guards: Default::default(),
			metrics: Default::default(),
		}
	}

	/// Overrides the time source.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Overrides the HTTP client used for key-set downloads.
	pub fn with_http_client(mut self, http_client: ReqwestHttpClient) -> Self {
		self.http_client = http_client;

		self
	}

	/// Overrides the safety margin. Negative values are clamped to zero.
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Replaces the key-set cache with an empty one whose entries live for `ttl`.
	pub fn with_key_set_ttl(mut self, ttl: Duration) -> Self {
		self.key_sets = Arc::new(KeySetCache::new(ttl));

		self
	}

	/// Injects a shared credential cache.
	pub fn with_credential_cache(mut self, cache: Arc<CredentialCache>) -> Self {
		self.cache = cache;

		self
	}

	/// Injects a shared key-set cache.
	pub fn with_key_set_cache(mut self, key_sets: Arc<KeySetCache>) -> Self {
		self.key_sets = key_sets;

		self
	}

	/// Registry of provider clients the manager fetches credentials from.
	pub fn registry(&self) -> &Arc<ProviderRegistry> {
		&self.registry
	}

	/// Effective safety margin.
	pub fn safety_margin(&self) -> Duration {
		self.safety_margin
	}

	/// Lookup counters.
	pub fn metrics(&self) -> &CredentialMetrics {
		&self.metrics
	}

	/// Returns a usable credential for `provider`, fetching one when the cache is empty or
	/// stale.
	///
	/// Fetch failures surface as [`Error::CredentialFetch`] and are never retried here;
	/// store failures surface as [`Error::Storage`].
	pub async fn get_credential(&self, provider: &ProviderId) -> Result<Credential> {
		const KIND: OpKind = OpKind::CredentialFetch;

		if let Some(credential) = self.cache.fresh(provider, self.clock.now(), self.safety_margin)
		{
			self.metrics.record_hit();

			return Ok(credential);
		}

		let span = OpSpan::new(KIND, "get_credential");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.fetch_guarded(provider)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => {
				self.metrics.record_failure();
				obs::record_op_outcome(KIND, OpOutcome::Failure);
			},
		}

		result
	}

	/// Drops the cached credential for `provider` so the next lookup fetches a new one.
	pub fn invalidate(&self, provider: &ProviderId) {
		self.cache.remove(provider);
	}

	/// Verifies `token` against the key set published under `base_url` and returns its
	/// claims.
	///
	/// The header's `kid` selects the key; a `kid` missing from a cached set triggers one
	/// refetch before [`TokenVerificationError::KeyNotFound`] is returned, unless the set
	/// is still inside the cache's refetch cooldown. Signature and
	/// `exp`/`nbf` are checked with the header's algorithm; audience is not.
	pub async fn verify_signed_token(&self, token: &str, base_url: &Url) -> Result<Claims> {
		const KIND: OpKind = OpKind::TokenVerify;

		let span = OpSpan::new(KIND, "verify_signed_token");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.verify(token, base_url)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Drops the key set cached for `base_url`.
	pub fn invalidate_key_set(&self, base_url: &Url) -> Result<bool> {
		let url = descriptor::jwks_url(base_url)
			.map_err(|_| ConfigError::InvalidUrl { url: base_url.to_string() })?;

		Ok(self.key_sets.invalidate(&url))
	}

	async fn fetch_guarded(&self, provider: &ProviderId) -> Result<Credential> {
		let client = self
			.registry
			.get(provider)
			.ok_or_else(|| ConfigError::UnknownProvider { provider: provider.clone() })?;
		let guard = self.guard(provider);
		let _singleflight = guard.lock().await;

		// Another caller may have completed the fetch while this one waited.
		if let Some(credential) = self.cache.fresh(provider, self.clock.now(), self.safety_margin)
		{
			self.metrics.record_hit();

			return Ok(credential);
		}

		self.metrics.record_fetch();

		let grant = client.fetch_token().await.map_err(|err| credential_fetch(provider, err))?;
		let credential = Credential::builder(provider.clone())
			.bearer(grant.access_token.expose())
			.issued_at(self.clock.now())
			.expires_in(grant.expires_in)
			.build()
			.map_err(ConfigError::from)?;

		self.store.save(provider, &credential.bearer, grant.expires_in.whole_seconds()).await?;
		self.cache.insert(credential.clone());

		Ok(credential)
	}

	fn guard(&self, provider: &ProviderId) -> Arc<AsyncMutex<()>> {
		self.guards.lock().entry(provider.clone()).or_default().clone()
	}

	async fn verify(&self, token: &str, base_url: &Url) -> Result<Claims> {
		let header = jsonwebtoken::decode_header(token).map_err(TokenVerificationError::Rejected)?;
		let kid = header.kid.ok_or(TokenVerificationError::MissingKeyId)?;
		let url = descriptor::jwks_url(base_url)
			.map_err(|_| ConfigError::InvalidUrl { url: base_url.to_string() })?;
		let now = self.clock.now();
		let keys = match self.key_sets.get(&url, now) {
			Some(cached) if cached.find(&kid).is_some() => cached,
			Some(_) if self.key_sets.cooling_down(&url, now) =>
				return Err(TokenVerificationError::KeyNotFound { kid }.into()),
			// An unknown kid in an older set usually means the provider rotated its keys.
			_ => self.download_key_set(&url).await?,
		};
		let jwk = keys
			.find(&kid)
			.ok_or_else(|| TokenVerificationError::KeyNotFound { kid: kid.clone() })?;

		if !key_set::key_accepts(jwk, header.alg) {
			return Err(TokenVerificationError::InvalidKey { kid, source: None }.into());
		}

		let key = DecodingKey::from_jwk(jwk)
			.map_err(|err| TokenVerificationError::InvalidKey { kid, source: Some(err) })?;
		let mut validation = Validation::new(header.alg);

		validation.validate_aud = false;
		validation.validate_nbf = true;

		let data = jsonwebtoken::decode::<Claims>(token, &key, &validation)
			.map_err(TokenVerificationError::Rejected)?;

		Ok(data.claims)
	}

	async fn download_key_set(&self, url: &Url) -> Result<Arc<JwkSet>> {
		const KIND: OpKind = OpKind::KeySetFetch;

		let span = OpSpan::new(KIND, "download_key_set");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async {
				let fetch_error = |details: String| TokenVerificationError::KeySetFetch {
					url: url.to_string(),
					details,
				};
				let response = self
					.http_client
					.get(url.clone())
					.send()
					.await
					.map_err(|err| fetch_error(err.to_string()))?;
				let status = response.status();

				if !status.is_success() {
					return Err(fetch_error(format!("HTTP {status}")));
				}

				response.json::<JwkSet>().await.map_err(|err| fetch_error(err.to_string()))
			})
			.await;

		match result {
			Ok(keys) => {
				obs::record_op_outcome(KIND, OpOutcome::Success);

				Ok(self.key_sets.insert(url.clone(), keys, self.clock.now()))
			},
			Err(err) => {
				obs::record_op_outcome(KIND, OpOutcome::Failure);

				Err(err.into())
			},
		}
	}
}
impl Debug for CredentialManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialManager")
			.field("providers", &self.registry.len())
			.field("cached", &self.cache.len())
			.field("safety_margin", &self.safety_margin)
			.field("key_set_ttl", &self.key_sets.ttl())
			.finish()
	}
}

fn credential_fetch(provider: &ProviderId, err: Error) -> Error {
	match err {
		err @ Error::CredentialFetch { .. } => err,
		err => Error::CredentialFetch {
			provider: provider.clone(),
			status: err.status(),
			details: err.to_string(),
		},
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use futures::future;
	// self
	use super::*;
	use crate::{_preludet::*, error::TransportError, store::CredentialStore};

	#[tokio::test]
	async fn fresh_credential_is_served_from_cache_until_the_margin() {
		let client = Arc::new(ScriptedClient::new("vbank").with_tokens(["tok1", "tok2"]));
		let (manager, store, clock) = build_test_manager(registry_of([client.clone()]));
		let provider = provider_id("vbank");
		let first = manager.get_credential(&provider).await.expect("First fetch should succeed.");

		clock.advance(Duration::seconds(3_600 - 61));

		let second = manager.get_credential(&provider).await.expect("Cache lookup should succeed.");

		assert_eq!(first, second);
		assert_eq!(client.token_calls(), 1);
		assert_eq!(manager.metrics().hits(), 1);
		assert_eq!(manager.metrics().fetches(), 1);

		let stored = store
			.load(&provider)
			.await
			.expect("Store load should succeed.")
			.expect("Credential should be written through.");

		assert_eq!(stored.bearer.expose(), "tok1");
		assert_eq!(stored.expires_in_secs, 3_600);
	}

	#[tokio::test]
	async fn crossing_the_margin_forces_exactly_one_fetch() {
		let client = Arc::new(ScriptedClient::new("vbank").with_tokens(["tok1", "tok2", "tok3"]));
		let (manager, _, clock) = build_test_manager(registry_of([client.clone()]));
		let provider = provider_id("vbank");

		manager.get_credential(&provider).await.expect("First fetch should succeed.");
		clock.advance(Duration::seconds(3_600 - 60));

		let refreshed = manager.get_credential(&provider).await.expect("Refetch should succeed.");
		let reused = manager.get_credential(&provider).await.expect("Cache lookup should succeed.");

		assert_eq!(refreshed.bearer.expose(), "tok2");
		assert_eq!(reused, refreshed);
		assert_eq!(client.token_calls(), 2);
	}

	#[tokio::test]
	async fn expired_credential_is_replaced_after_its_lifetime() {
		let client = Arc::new(ScriptedClient::new("vbank").with_tokens(["tok1", "tok2"]));
		let (manager, store, clock) = build_test_manager(registry_of([client.clone()]));
		let provider = provider_id("vbank");

		assert!(store.is_empty());

		let first = manager.get_credential(&provider).await.expect("First fetch should succeed.");

		assert_eq!(first.bearer.expose(), "tok1");
		assert_eq!(first.lifetime_secs(), 3_600);

		clock.advance(Duration::seconds(3_600));

		let second = manager.get_credential(&provider).await.expect("Second fetch should succeed.");

		assert_eq!(second.bearer.expose(), "tok2");
		assert_eq!(client.token_calls(), 2);

		let stored = store
			.load(&provider)
			.await
			.expect("Store load should succeed.")
			.expect("Replacement should be written through.");

		assert_eq!(stored.bearer.expose(), "tok2");
	}

	#[tokio::test]
	async fn concurrent_callers_share_one_fetch() {
		let client = Arc::new(
			ScriptedClient::new("vbank")
				.with_tokens(["tok1", "tok2"])
				.with_token_delay(std::time::Duration::from_millis(50)),
		);
		let (manager, _, _) = build_test_manager(registry_of([client.clone()]));
		let provider = provider_id("vbank");
		let results =
			future::join_all((0..5).map(|_| manager.get_credential(&provider))).await;

		assert_eq!(client.token_calls(), 1);

		for result in results {
			assert_eq!(result.expect("Every caller should succeed.").bearer.expose(), "tok1");
		}
	}

	#[tokio::test]
	async fn fetch_failures_surface_and_are_not_cached() {
		let client = Arc::new(ScriptedClient::new("vbank").with_tokens(Vec::<&str>::new()));
		let (manager, store, _) = build_test_manager(registry_of([client.clone()]));
		let provider = provider_id("vbank");

		for _ in 0..2 {
			let err = manager.get_credential(&provider).await.expect_err("Fetch should fail.");

			assert!(matches!(err, Error::CredentialFetch { status: Some(401), .. }));
		}

		assert_eq!(client.token_calls(), 2);
		assert_eq!(manager.metrics().failures(), 2);
		assert!(store.is_empty());
	}

	#[tokio::test]
	async fn invalidate_and_unknown_providers() {
		let client = Arc::new(ScriptedClient::new("vbank").with_tokens(["tok1", "tok2"]));
		let (manager, _, _) = build_test_manager(registry_of([client.clone()]));
		let provider = provider_id("vbank");

		manager.get_credential(&provider).await.expect("First fetch should succeed.");
		manager.invalidate(&provider);

		let refetched = manager.get_credential(&provider).await.expect("Refetch should succeed.");

		assert_eq!(refetched.bearer.expose(), "tok2");

		let err = manager
			.get_credential(&provider_id("nobank"))
			.await
			.expect_err("Unregistered provider should fail.");

		assert!(matches!(err, Error::Config(ConfigError::UnknownProvider { .. })));
	}

	#[test]
	fn non_fetch_errors_are_wrapped_with_provider() {
		let provider = ProviderId::new("vbank").expect("Provider fixture should be valid.");
		let wrapped =
			credential_fetch(&provider, TransportError::Timeout { source: None }.into());

		assert!(matches!(
			wrapped,
			Error::CredentialFetch { ref provider, status: None, .. } if provider.as_ref() == "vbank"
		));

		let denied = Error::CredentialFetch {
			provider: provider.clone(),
			details: "denied".into(),
			status: Some(401),
		};
		let passthrough = credential_fetch(&provider, denied);

		assert_eq!(passthrough.status(), Some(401));
	}
}
