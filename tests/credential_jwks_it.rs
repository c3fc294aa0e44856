// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use time::{Duration, OffsetDateTime};
// self
use openbanking_broker::{
	_preludet::test_reqwest_http_client,
	auth::{Credential, ProviderId},
	clock::ManualClock,
	credential::{CredentialCache, CredentialManager, TokenVerificationError},
	error::Error,
	fanout::ProviderRegistry,
	serde_json::{Value, json},
	store::MemoryStore,
	url::Url,
};

const JWKS: &str = include_str!("fixtures/jwks.json");
const SIGNING_KEY: &[u8] = include_bytes!("fixtures/signing_key.pem");
const OTHER_SIGNING_KEY: &[u8] = include_bytes!("fixtures/other_signing_key.pem");
const KEY_ID: &str = "sandbox-2025";

fn manager() -> (CredentialManager, Arc<ManualClock>) {
	let clock = Arc::new(ManualClock::starting_at(OffsetDateTime::now_utc()));
	let manager = CredentialManager::new(
		Arc::new(ProviderRegistry::default()),
		Arc::new(MemoryStore::default()),
	)
	.with_http_client(test_reqwest_http_client())
	.with_clock(clock.clone());

	(manager, clock)
}

fn claims(exp_offset_secs: i64) -> Value {
	json!({
		"sub": "team200",
		"iss": "vbank",
		"exp": OffsetDateTime::now_utc().unix_timestamp() + exp_offset_secs,
	})
}

fn sign_with(pem: &[u8], algorithm: Algorithm, kid: Option<&str>, exp_offset_secs: i64) -> String {
	let header = Header { kid: kid.map(str::to_owned), ..Header::new(algorithm) };
	let key = EncodingKey::from_rsa_pem(pem).expect("Signing key fixture should parse.");

	jsonwebtoken::encode(&header, &claims(exp_offset_secs), &key).expect("Token should sign.")
}

fn sign(kid: Option<&str>, exp_offset_secs: i64) -> String {
	sign_with(SIGNING_KEY, Algorithm::RS256, kid, exp_offset_secs)
}

async fn serve_key_set(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/jwks.json");
			then.status(200).header("content-type", "application/json").body(JWKS);
		})
		.await
}

fn base_url(server: &MockServer) -> Url {
	Url::parse(&server.base_url()).expect("Mock base URL should parse.")
}

#[tokio::test]
async fn verifies_tokens_and_serves_later_checks_from_cache() {
	let server = MockServer::start_async().await;
	let mock = serve_key_set(&server).await;
	let (manager, _) = manager();
	let base = base_url(&server);
	let claims = manager
		.verify_signed_token(&sign(Some(KEY_ID), 600), &base)
		.await
		.expect("Token signed by the published key should verify.");

	assert_eq!(claims.get("sub"), Some(&Value::String("team200".into())));

	manager
		.verify_signed_token(&sign(Some(KEY_ID), 600), &base)
		.await
		.expect("Cached key set should verify a token with a known kid.");

	assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn unknown_kids_refetch_at_most_once_per_cooldown() {
	let server = MockServer::start_async().await;
	let mock = serve_key_set(&server).await;
	let (manager, clock) = manager();
	let base = base_url(&server);

	manager
		.verify_signed_token(&sign(Some(KEY_ID), 600), &base)
		.await
		.expect("Initial verification should succeed.");

	for i in 0..50 {
		let kid = format!("forged-{i}");
		let err = manager
			.verify_signed_token(&sign(Some(&kid), 600), &base)
			.await
			.expect_err("An unpublished kid must be rejected.");

		assert!(matches!(
			err,
			Error::TokenVerification(TokenVerificationError::KeyNotFound { kid: ref missing }) if *missing == kid
		));
	}

	assert_eq!(mock.hits_async().await, 1);

	clock.advance(Duration::seconds(31));

	let err = manager
		.verify_signed_token(&sign(Some("rotated-2026"), 600), &base)
		.await
		.expect_err("A kid absent after refetch must be rejected.");

	assert!(matches!(
		err,
		Error::TokenVerification(TokenVerificationError::KeyNotFound { ref kid }) if kid == "rotated-2026"
	));
	assert_eq!(mock.hits_async().await, 2);
}

#[tokio::test]
async fn key_sets_expire_after_the_configured_ttl() {
	let server = MockServer::start_async().await;
	let mock = serve_key_set(&server).await;
	let (manager, clock) = manager();
	let manager = manager.with_key_set_ttl(Duration::minutes(10));
	let base = base_url(&server);

	manager
		.verify_signed_token(&sign(Some(KEY_ID), 3_600), &base)
		.await
		.expect("Initial verification should succeed.");
	clock.advance(Duration::minutes(9));
	manager
		.verify_signed_token(&sign(Some(KEY_ID), 3_600), &base)
		.await
		.expect("Verification inside the TTL should succeed.");

	assert_eq!(mock.hits_async().await, 1);

	clock.advance(Duration::minutes(2));
	manager
		.verify_signed_token(&sign(Some(KEY_ID), 3_600), &base)
		.await
		.expect("Verification after the TTL should refetch and succeed.");

	assert_eq!(mock.hits_async().await, 2);
}

#[tokio::test]
async fn verification_leaves_credentials_untouched() {
	let server = MockServer::start_async().await;

	serve_key_set(&server).await;

	let provider = ProviderId::new("vbank").expect("Provider identifier should be valid.");
	let cached = Credential::builder(provider.clone())
		.bearer("tok1")
		.expires_in(Duration::hours(1))
		.build()
		.expect("Credential fixture should build.");
	let cache = Arc::new(CredentialCache::default());

	cache.insert(cached.clone());

	let (manager, _) = manager();
	let manager = manager.with_credential_cache(cache.clone());

	manager
		.verify_signed_token(&sign(Some(KEY_ID), 600), &base_url(&server))
		.await
		.expect("Verification should succeed.");

	assert_eq!(cache.len(), 1);
	assert_eq!(cache.get(&provider), Some(cached));
	assert_eq!(manager.metrics().hits(), 0);
	assert_eq!(manager.metrics().fetches(), 0);
	assert_eq!(manager.metrics().failures(), 0);
}

#[tokio::test]
async fn tokens_signed_by_another_key_are_rejected() {
	let server = MockServer::start_async().await;

	serve_key_set(&server).await;

	let (manager, _) = manager();
	let token = sign_with(OTHER_SIGNING_KEY, Algorithm::RS256, Some(KEY_ID), 600);
	let err = manager
		.verify_signed_token(&token, &base_url(&server))
		.await
		.expect_err("A signature from another key must be rejected.");

	assert!(matches!(err, Error::TokenVerification(TokenVerificationError::Rejected(_))));
}

#[tokio::test]
async fn algorithms_outside_the_key_are_refused() {
	let server = MockServer::start_async().await;

	serve_key_set(&server).await;

	let (manager, _) = manager();
	let base = base_url(&server);
	let hmac_header = Header { kid: Some(KEY_ID.into()), ..Header::new(Algorithm::HS256) };
	let hmac = jsonwebtoken::encode(&hmac_header, &claims(600), &EncodingKey::from_secret(b"s3cr3t"))
		.expect("HMAC token should sign.");
	// The published key is pinned to RS256 even though RS384 is RSA too.
	let rs384 = sign_with(SIGNING_KEY, Algorithm::RS384, Some(KEY_ID), 600);

	for token in [hmac, rs384] {
		let err = manager
			.verify_signed_token(&token, &base)
			.await
			.expect_err("A mismatched algorithm must be refused.");

		assert!(matches!(
			err,
			Error::TokenVerification(TokenVerificationError::InvalidKey { ref kid, .. }) if kid == KEY_ID
		));
	}
}

#[tokio::test]
async fn tokens_without_kid_are_rejected_before_any_fetch() {
	let (manager, _) = manager();
	let base = Url::parse("http://127.0.0.1:9").expect("Base URL should parse.");
	let err = manager
		.verify_signed_token(&sign(None, 600), &base)
		.await
		.expect_err("A token without kid must be rejected.");

	assert!(matches!(err, Error::TokenVerification(TokenVerificationError::MissingKeyId)));
}

#[tokio::test]
async fn expired_tokens_are_rejected() {
	let server = MockServer::start_async().await;

	serve_key_set(&server).await;

	let (manager, _) = manager();
	let err = manager
		.verify_signed_token(&sign(Some(KEY_ID), -3_600), &base_url(&server))
		.await
		.expect_err("An expired token must be rejected.");

	assert!(matches!(err, Error::TokenVerification(TokenVerificationError::Rejected(_))));
}

#[tokio::test]
async fn key_set_endpoint_failures_are_reported() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/jwks.json");
			then.status(500);
		})
		.await;

	let (manager, _) = manager();
	let base = base_url(&server);
	let err = manager
		.verify_signed_token(&sign(Some(KEY_ID), 600), &base)
		.await
		.expect_err("A failing key set endpoint must be reported.");

	match err {
		Error::TokenVerification(TokenVerificationError::KeySetFetch { url, details }) => {
			assert!(url.ends_with("/.well-known/jwks.json"));
			assert!(details.contains("500"));
		},
		other => panic!("Unexpected error: {other:?}."),
	}
	assert!(!manager.invalidate_key_set(&base).expect("Base URL should resolve."));
}
