//! JSON Web Key Set cache and signed-token verification errors.

// crates.io
use jsonwebtoken::{
	Algorithm,
	jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm},
};
// self
use crate::_prelude::*;

/// Failures raised while verifying a provider-signed token.
#[derive(Debug, ThisError)]
pub enum TokenVerificationError {
	/// The key set could not be downloaded or parsed.
	#[error("Key set at `{url}` could not be fetched: {details}.")]
	KeySetFetch {
		/// Key set URL.
		url: String,
		/// Human-readable failure summary.
		details: String,
	},
	/// The token header carries no `kid`.
	#[error("Token header does not name a signing key.")]
	MissingKeyId,
	/// No key in the set matches the token's `kid`, even after a refetch.
	#[error("Signing key `{kid}` is not published by the provider.")]
	KeyNotFound {
		/// Key identifier from the token header.
		kid: String,
	},
	/// The matching key cannot verify the token's algorithm or is malformed.
	#[error("Signing key `{kid}` cannot be used to verify this token.")]
	InvalidKey {
		/// Key identifier from the token header.
		kid: String,
		/// Underlying key decoding failure, when there is one.
		#[source]
		source: Option<jsonwebtoken::errors::Error>,
	},
	/// Signature or time-claim validation failed.
	#[error("Signed token was rejected.")]
	Rejected(#[source] jsonwebtoken::errors::Error),
}

#[derive(Clone, Debug)]
struct CachedKeySet {
	keys: Arc<JwkSet>,
	fetched_at: OffsetDateTime,
}

/// Key sets keyed by their URL, expiring after a fixed TTL.
///
/// A set younger than the refetch cooldown is never downloaded again on a `kid` miss, so
/// tokens naming unknown keys cannot drive one key-set request each.
#[derive(Debug)]
pub struct KeySetCache {
	ttl: Duration,
	refetch_cooldown: Duration,
	entries: RwLock<HashMap<Url, CachedKeySet>>,
}
impl KeySetCache {
	/// Default key-set lifetime.
	pub const DEFAULT_TTL: Duration = Duration::hours(1);
	/// Default minimum age of a set before a `kid` miss may refetch it.
	pub const DEFAULT_REFETCH_COOLDOWN: Duration = Duration::seconds(30);

	/// Creates an empty cache whose entries live for `ttl`.
	pub fn new(ttl: Duration) -> Self {
		Self { ttl, refetch_cooldown: Self::DEFAULT_REFETCH_COOLDOWN, entries: Default::default() }
	}

	/// Overrides the refetch cooldown; negative values are clamped to zero.
	pub fn with_refetch_cooldown(mut self, cooldown: Duration) -> Self {
		self.refetch_cooldown = cooldown.max(Duration::ZERO);

		self
	}

	/// Entry lifetime.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Minimum age of a set before a `kid` miss may refetch it.
	pub fn refetch_cooldown(&self) -> Duration {
		self.refetch_cooldown
	}

	/// Returns `true` while the set for `url` is younger than the refetch cooldown.
	pub fn cooling_down(&self, url: &Url, now: OffsetDateTime) -> bool {
		self.entries
			.read()
			.get(url)
			.is_some_and(|entry| now - entry.fetched_at < self.refetch_cooldown)
	}

	/// Returns the cached set for `url` when it was fetched less than one TTL before `now`.
	pub fn get(&self, url: &Url, now: OffsetDateTime) -> Option<Arc<JwkSet>> {
		self.entries
			.read()
			.get(url)
			.filter(|entry| now - entry.fetched_at < self.ttl)
			.map(|entry| entry.keys.clone())
	}

	/// Stores a freshly fetched set.
	pub fn insert(&self, url: Url, keys: JwkSet, now: OffsetDateTime) -> Arc<JwkSet> {
		let keys = Arc::new(keys);

		self.entries.write().insert(url, CachedKeySet { keys: keys.clone(), fetched_at: now });

		keys
	}

	/// Drops the set cached for `url`. Returns `true` when one was present.
	pub fn invalidate(&self, url: &Url) -> bool {
		self.entries.write().remove(url).is_some()
	}
}
impl Default for KeySetCache {
	fn default() -> Self {
		Self::new(Self::DEFAULT_TTL)
	}
}

/// Checks that `algorithm` belongs to the family of the key material in `jwk` and matches
/// the key's published `alg`, when it has one.
pub(crate) fn key_accepts(jwk: &Jwk, algorithm: Algorithm) -> bool {
	if let Some(published) = &jwk.common.key_algorithm
		&& signing_algorithm(published) != Some(algorithm)
	{
		return false;
	}

	match &jwk.algorithm {
		AlgorithmParameters::RSA(_) => matches!(
			algorithm,
			Algorithm::RS256
				| Algorithm::RS384
				| Algorithm::RS512
				| Algorithm::PS256
				| Algorithm::PS384
				| Algorithm::PS512
		),
		AlgorithmParameters::EllipticCurve(_) =>
			matches!(algorithm, Algorithm::ES256 | Algorithm::ES384),
		AlgorithmParameters::OctetKeyPair(_) => matches!(algorithm, Algorithm::EdDSA),
		// Symmetric keys have no business in a published key set.
		AlgorithmParameters::OctetKey(_) => false,
	}
}

fn signing_algorithm(algorithm: &KeyAlgorithm) -> Option<Algorithm> {
	Some(match algorithm {
		KeyAlgorithm::HS256 => Algorithm::HS256,
		KeyAlgorithm::HS384 => Algorithm::HS384,
		KeyAlgorithm::HS512 => Algorithm::HS512,
		KeyAlgorithm::ES256 => Algorithm::ES256,
		KeyAlgorithm::ES384 => Algorithm::ES384,
		KeyAlgorithm::RS256 => Algorithm::RS256,
		KeyAlgorithm::RS384 => Algorithm::RS384,
		KeyAlgorithm::RS512 => Algorithm::RS512,
		KeyAlgorithm::PS256 => Algorithm::PS256,
		KeyAlgorithm::PS384 => Algorithm::PS384,
		KeyAlgorithm::PS512 => Algorithm::PS512,
		KeyAlgorithm::EdDSA => Algorithm::EdDSA,
		// Encryption algorithms never sign.
		_ => return None,
	})
}
