// crates.io
use httpmock::prelude::*;
use time::Duration;
// self
use openbanking_broker::{
	_preludet::test_reqwest_http_client,
	auth::{ConsentId, Credential, PermissionSet, ProviderId, UserId},
	error::{ConfigError, Error},
	provider::{
		ClientAuth, ConsentRequest, PaymentConsentFields, PaymentInitiationRequest,
		ProviderClient, ProviderDescriptor, TokenStyle, VBankClient,
	},
	serde_json::{self, Value, json},
	url::Url,
};

const CLIENT_ID: &str = "team200";
const CLIENT_SECRET: &str = "s3cr3t";

fn provider() -> ProviderId {
	ProviderId::new("vbank").expect("Provider identifier should be valid for VBank tests.")
}

fn user() -> UserId {
	UserId::new("team200-1").expect("User identifier should be valid for VBank tests.")
}

fn consent(value: &str) -> ConsentId {
	ConsentId::new(value).expect("Consent identifier should be valid for VBank tests.")
}

fn build_client(server: &MockServer) -> VBankClient {
	let base_url = Url::parse(&server.base_url()).expect("Mock base URL should parse.");
	let descriptor = VBankClient::default_descriptor(provider(), base_url)
		.expect("VBank descriptor should build for the mock server.");

	VBankClient::connect(
		descriptor,
		ClientAuth::new(CLIENT_ID, CLIENT_SECRET),
		test_reqwest_http_client(),
	)
	.expect("VBank client should connect.")
}

fn credential() -> Credential {
	Credential::builder(provider())
		.bearer("tok1")
		.expires_in(Duration::hours(1))
		.build()
		.expect("Credential fixture should build.")
}

#[tokio::test]
async fn fetch_token_posts_client_credentials_as_query() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/bank-token")
				.query_param("client_id", CLIENT_ID)
				.query_param("client_secret", CLIENT_SECRET);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"tok1\",\"token_type\":\"bearer\",\"expires_in\":86400}");
		})
		.await;
	let grant = build_client(&server).fetch_token().await.expect("Token fetch should succeed.");

	mock.assert_async().await;

	assert_eq!(grant.access_token.expose(), "tok1");
	assert_eq!(grant.expires_in, Duration::seconds(86_400));
}

#[tokio::test]
async fn token_responses_must_declare_a_lifetime() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/bank-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"tok1\"}");
		})
		.await;

	let err = build_client(&server).fetch_token().await.expect_err("Missing expires_in must fail.");

	assert!(matches!(err, Error::Config(ConfigError::MissingExpiresIn)));
}

#[tokio::test]
async fn rejected_token_requests_are_credential_fetch_errors() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/bank-token");
			then.status(401).body("invalid client");
		})
		.await;

	let err = build_client(&server).fetch_token().await.expect_err("A 401 must fail.");

	assert!(matches!(err, Error::CredentialFetch { status: Some(401), .. }));
}

#[tokio::test]
async fn account_consent_reads_top_level_consent_id() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/account-consents/request")
				.header("authorization", "Bearer tok1")
				.header("x-requesting-bank", CLIENT_ID);
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "consent_id": "c-1", "status": "approved" }));
		})
		.await;
	let request = ConsentRequest::account_access(
		PermissionSet::new(["ReadAccountsDetail", "ReadBalances"])
			.expect("Permissions should be valid."),
		user(),
	);
	let consent = build_client(&server)
		.create_consent(&credential(), &request)
		.await
		.expect("Consent creation should succeed.");

	mock.assert_async().await;

	assert_eq!(&*consent, "c-1");
}

#[tokio::test]
async fn payment_consent_falls_back_to_data_envelope() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/payment-consents/request").json_body(json!({
				"requesting_bank": CLIENT_ID,
				"client_id": "team200-1",
				"permissions": ["CreateDomesticSinglePayment"],
				"debtor_account": "40817810",
				"amount": "100.00",
				"currency": "RUB",
			}));
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "data": { "consentId": "pc-1" } }));
		})
		.await;
	let request = ConsentRequest::account_access(
		PermissionSet::new(["CreateDomesticSinglePayment"]).expect("Permissions should be valid."),
		user(),
	)
	.with_payment(PaymentConsentFields {
		debtor_account: "40817810".into(),
		amount: "100.00".into(),
		currency: "RUB".into(),
	});
	let consent = build_client(&server)
		.create_consent(&credential(), &request)
		.await
		.expect("Payment consent creation should succeed.");

	mock.assert_async().await;

	assert_eq!(&*consent, "pc-1");
}

#[tokio::test]
async fn consent_read_returns_a_typed_record() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/account-consents/c-1")
				.query_param("client_id", "team200-1")
				.header("authorization", "Bearer tok1");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"data": {
					"consentId": "c-1",
					"status": "Authorised",
					"permissions": ["ReadAccountsDetail", "ReadBalances"]
				}
			}));
		})
		.await;
	let record = build_client(&server)
		.get_consent(&credential(), &consent("c-1"), &user())
		.await
		.expect("Consent read should succeed.");

	mock.assert_async().await;

	assert_eq!(record.consent_id, consent("c-1"));
	assert_eq!(record.provider, provider());
	assert_eq!(record.user_id, user());
	assert_eq!(record.status, "Authorised");
	assert!(record.permissions.contains("ReadBalances"));
	assert!(record.payment.is_none());
}

#[tokio::test]
async fn consent_read_without_status_is_an_envelope_error() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/account-consents/c-1");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "data": { "consentId": "c-1" } }));
		})
		.await;

	let err = build_client(&server)
		.get_consent(&credential(), &consent("c-1"), &user())
		.await
		.expect_err("A consent document without status must be rejected.");

	assert!(matches!(err, Error::EnvelopeShape { ref expected, .. } if expected == "data.status"));
}

#[tokio::test]
async fn list_accounts_sends_consent_and_unwraps_envelope() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/accounts")
				.query_param("client_id", "team200-1")
				.header("authorization", "Bearer tok1")
				.header("x-consent-id", "c-1")
				.header("x-requesting-bank", CLIENT_ID);
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "data": { "account": [{ "accountId": "acc-1" }] } }));
		})
		.await;
	let client = build_client(&server);
	let accounts = client
		.accounts()
		.expect("VBank offers accounts.")
		.list_accounts(&credential(), &consent("c-1"), &user())
		.await
		.expect("Account listing should succeed.");

	mock.assert_async().await;

	assert_eq!(accounts, json!([{ "accountId": "acc-1" }]));
}

#[tokio::test]
async fn balances_are_posted_with_user_body() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/accounts/acc-1/balances")
				.header("x-consent-id", "c-1")
				.json_body(json!({ "user_id": "team200-1" }));
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "data": { "balance": [{ "amount": "10.00" }] } }));
		})
		.await;
	let client = build_client(&server);
	let balances = client
		.accounts()
		.expect("VBank offers accounts.")
		.account_balances(&credential(), &consent("c-1"), &user(), "acc-1")
		.await
		.expect("Balance lookup should succeed.");

	mock.assert_async().await;

	assert_eq!(balances, json!([{ "amount": "10.00" }]));
}

#[tokio::test]
async fn missing_envelope_is_a_shape_error() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/accounts");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "data": {} }));
		})
		.await;

	let client = build_client(&server);
	let err = client
		.accounts()
		.expect("VBank offers accounts.")
		.list_accounts(&credential(), &consent("c-1"), &user())
		.await
		.expect_err("A response without data.account must fail.");

	assert!(matches!(err, Error::EnvelopeShape { ref expected, .. } if expected == "data.account"));
}

#[tokio::test]
async fn non_success_responses_keep_status_and_raw_body() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/accounts/acc-1/transactions");
			then.status(502).header("retry-after", "30").body("Bad Gateway");
		})
		.await;

	let client = build_client(&server);
	let err = client
		.accounts()
		.expect("VBank offers accounts.")
		.account_transactions(&credential(), &consent("c-1"), &user(), "acc-1")
		.await
		.expect_err("A 502 must fail.");

	match err {
		Error::UpstreamHttp { status, body, retry_after, .. } => {
			assert_eq!(status, 502);
			assert_eq!(body, Value::String("Bad Gateway".into()));
			assert_eq!(retry_after, Some(Duration::seconds(30)));
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn payments_carry_idempotency_and_consent_headers() {
	let server = MockServer::start_async().await;
	let request: PaymentInitiationRequest = serde_json::from_value(json!({
		"data": {
			"initiation": {
				"instructed_amount": { "amount": "100.00", "currency": "RUB" },
				"debtor_account": { "scheme_name": "RU.CBR.PAN", "identification": "4081" },
				"creditor_account": {
					"scheme_name": "RU.CBR.PAN",
					"identification": "4082",
					"name": "Ivan"
				},
				"instruction_identification": "instr-1",
				"end_to_end_identification": "e2e-1"
			}
		}
	}))
	.expect("Payment fixture should deserialize.");
	let expected_body = serde_json::to_value(&request).expect("Payment fixture should serialize.");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/payments")
				.query_param("client_id", CLIENT_ID)
				.header("x-idempotency-key", "instr-1")
				.header("x-payment-consent-id", "pc-1")
				.header("x-fapi-financial-id", "vbank")
				.json_body(expected_body);
			then.status(201)
				.header("content-type", "application/json")
				.json_body(json!({ "data": { "paymentId": "p-1", "status": "AcceptedSettlementInProcess" } }));
		})
		.await;
	let client = build_client(&server);
	let payment = client
		.payments()
		.expect("VBank offers payments.")
		.create_payment(&credential(), &consent("pc-1"), &request)
		.await
		.expect("Payment should be accepted.");

	mock.assert_async().await;

	assert_eq!(payment["data"]["paymentId"], "p-1");
}

#[tokio::test]
async fn product_catalogue_accepts_wrapped_and_bare_lists() {
	let wrapped = MockServer::start_async().await;
	let bare = MockServer::start_async().await;

	wrapped
		.mock_async(|when, then| {
			when.method(GET).path("/products");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "data": { "product": [{ "productId": "dep-1" }] } }));
		})
		.await;
	bare.mock_async(|when, then| {
		when.method(GET).path("/products");
		then.status(200)
			.header("content-type", "application/json")
			.json_body(json!([{ "productId": "dep-1" }]));
	})
	.await;

	for server in [&wrapped, &bare] {
		let client = build_client(server);
		let products = client
			.products()
			.expect("VBank offers products.")
			.list_products(&credential())
			.await
			.expect("Product listing should succeed.");

		assert_eq!(products, json!([{ "productId": "dep-1" }]));
	}
}

#[tokio::test]
async fn closing_an_agreement_with_empty_body_reports_closed() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(DELETE)
				.path("/product-agreements/agr-1")
				.query_param("client_id", "team200-1");
			then.status(204);
		})
		.await;

	let client = build_client(&server);
	let closed = client
		.products()
		.expect("VBank offers products.")
		.close_product_agreement(&credential(), &consent("c-1"), &user(), "agr-1")
		.await
		.expect("Closing should succeed.");

	assert_eq!(closed, json!({ "agreement_id": "agr-1", "status": "closed" }));
}

#[tokio::test]
async fn client_credentials_style_uses_oauth_token_endpoint() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"cc-tok\",\"token_type\":\"bearer\",\"expires_in\":600}");
		})
		.await;
	let token_url = Url::parse(&server.url("/oauth/token")).expect("Token URL should parse.");
	let descriptor = ProviderDescriptor::builder(provider())
		.base_url(Url::parse(&server.base_url()).expect("Mock base URL should parse."))
		.token_style(TokenStyle::ClientCredentials { token_url })
		.support_all(VBankClient::capabilities().iter())
		.build()
		.expect("Client-credentials descriptor should build.");
	let client = VBankClient::connect(
		descriptor,
		ClientAuth::new(CLIENT_ID, CLIENT_SECRET),
		test_reqwest_http_client(),
	)
	.expect("VBank client should connect.");
	let grant = client.fetch_token().await.expect("Client-credentials exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(grant.access_token.expose(), "cc-tok");
	assert_eq!(grant.expires_in, Duration::seconds(600));
}
