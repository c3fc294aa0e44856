//! REST dialect shared by the sandbox banks.
//!
//! Each function performs one provider call over a [`RestTransport`] and owns the envelope
//! unwrapping for that call. Provider clients compose these and override the handful of
//! endpoints where a bank deviates.

// crates.io
use serde_json::json;
use time::{format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::{
	_prelude::*,
	auth::{ConsentId, Credential, PermissionSet, UserId},
	error::ConfigError,
	provider::{
		Consent, ConsentRequest, NewAccount, PaymentConsentFields, PaymentInitiationRequest,
		ProductAgreementRequest, RestTransport, VrpConsentRequest, VrpPaymentRequest, envelope,
		model,
		transport::{IDEMPOTENCY_HEADER, PAYMENT_CONSENT_HEADER},
	},
};

const CONSENT_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
const CONSENT_WINDOW: Duration = Duration::days(365);

pub(crate) async fn create_consent(
	transport: &RestTransport,
	credential: &Credential,
	request: &ConsentRequest,
) -> Result<ConsentId> {
	let (path, body) = match request.payment_consent() {
		Some(payment) => ("payment-consents", json!({
			"requesting_bank": transport.client_id(),
			"client_id": request.user_id,
			"permissions": request.permissions,
			"debtor_account": payment.debtor_account,
			"amount": payment.amount,
			"currency": payment.currency,
		})),
		None => {
			let now = OffsetDateTime::now_utc();

			("account-consents", json!({
				"permissions": request.permissions,
				"expiration_date": consent_date(now + CONSENT_WINDOW)?,
				"transaction_from_date": consent_date(now - CONSENT_WINDOW)?,
				"transaction_to_date": consent_date(now)?,
				"client_id": request.user_id,
			}))
		},
	};
	let response = transport
		.request(Method::POST, &[path, "request"])?
		.bearer(credential)
		.json(&body)
		.send()
		.await?;

	consent_id(transport, response)
}

pub(crate) async fn get_consent(
	transport: &RestTransport,
	credential: &Credential,
	consent: &ConsentId,
	user: &UserId,
) -> Result<Consent> {
	let response = transport
		.request(Method::GET, &["account-consents", consent.as_ref()])?
		.bearer(credential)
		.query(&[("client_id", user)])
		.send()
		.await?;

	consent_record(transport, user, response)
}

pub(crate) async fn revoke_consent(
	transport: &RestTransport,
	credential: &Credential,
	consent: &ConsentId,
	user: &UserId,
) -> Result<()> {
	transport
		.request(Method::DELETE, &["account-consents", consent.as_ref()])?
		.bearer(credential)
		.query(&[("client_id", user)])
		.send()
		.await?;

	Ok(())
}

pub(crate) async fn list_accounts(
	transport: &RestTransport,
	credential: &Credential,
	consent: &ConsentId,
	user: &UserId,
) -> Result<Value> {
	let body = transport
		.request(Method::GET, &["accounts"])?
		.bearer(credential)
		.consent(consent)
		.query(&[("client_id", user)])
		.send()
		.await?;

	envelope::take(transport.provider(), body, &["data", "account"])
}

pub(crate) async fn account_details(
	transport: &RestTransport,
	credential: &Credential,
	consent: &ConsentId,
	user: &UserId,
	account_id: &str,
) -> Result<Value> {
	let body = transport
		.request(Method::GET, &["accounts", account_id])?
		.bearer(credential)
		.consent(consent)
		.query(&[("client_id", user)])
		.send()
		.await?;

	envelope::take(transport.provider(), body, &["data", "account"])
}

/// How a bank expects the balance lookup to identify the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BalanceLookup {
	/// `GET` with a `client_id` query parameter.
	Query,
	/// `POST` with a `{"user_id"}` JSON body.
	Body,
}

pub(crate) async fn account_balances(
	transport: &RestTransport,
	credential: &Credential,
	consent: &ConsentId,
	user: &UserId,
	account_id: &str,
	lookup: BalanceLookup,
) -> Result<Value> {
	let segments = ["accounts", account_id, "balances"];
	let request = match lookup {
		BalanceLookup::Query =>
			transport.request(Method::GET, &segments)?.query(&[("client_id", user)]),
		BalanceLookup::Body =>
			transport.request(Method::POST, &segments)?.json(&json!({ "user_id": user })),
	};
	let body = request.bearer(credential).consent(consent).send().await?;

	envelope::take(transport.provider(), body, &["data", "balance"])
}

pub(crate) async fn account_transactions(
	transport: &RestTransport,
	credential: &Credential,
	consent: &ConsentId,
	user: &UserId,
	account_id: &str,
) -> Result<Value> {
	let body = transport
		.request(Method::GET, &["accounts", account_id, "transactions"])?
		.bearer(credential)
		.consent(consent)
		.query(&[("client_id", user)])
		.send()
		.await?;

	envelope::take(transport.provider(), body, &["data", "transaction"])
}

pub(crate) async fn create_account(
	transport: &RestTransport,
	credential: &Credential,
	request: &NewAccount,
) -> Result<Value> {
	transport.request(Method::POST, &["accounts"])?.bearer(credential).json(request).send().await
}

pub(crate) async fn update_account_status(
	transport: &RestTransport,
	credential: &Credential,
	user: &UserId,
	account_id: &str,
	status: &str,
) -> Result<Value> {
	transport
		.request(Method::PUT, &["accounts", account_id, "status"])?
		.bearer(credential)
		.json(&json!({ "status": status, "client_id": user }))
		.send()
		.await
}

pub(crate) async fn close_account(
	transport: &RestTransport,
	credential: &Credential,
	user: &UserId,
	account_id: &str,
) -> Result<Value> {
	transport
		.request(Method::PUT, &["accounts", account_id, "close"])?
		.bearer(credential)
		.json(&json!({ "client_id": user }))
		.send()
		.await
}

pub(crate) async fn create_payment(
	transport: &RestTransport,
	credential: &Credential,
	consent: &ConsentId,
	request: &PaymentInitiationRequest,
) -> Result<Value> {
	transport
		.request(Method::POST, &["payments"])?
		.bearer(credential)
		.financial_id()
		.header(IDEMPOTENCY_HEADER, request.idempotency_key())
		.header(PAYMENT_CONSENT_HEADER, consent)
		.query(&[("client_id", transport.client_id())])
		.json(request)
		.send()
		.await
}

pub(crate) async fn payment_status(
	transport: &RestTransport,
	credential: &Credential,
	payment_id: &str,
	user: &UserId,
) -> Result<Value> {
	transport
		.request(Method::GET, &["payments", payment_id])?
		.bearer(credential)
		.financial_id()
		.query(&[("client_id", user)])
		.send()
		.await
}

pub(crate) async fn create_vrp_consent(
	transport: &RestTransport,
	credential: &Credential,
	user: &UserId,
	request: &VrpConsentRequest,
) -> Result<Value> {
	transport
		.request(Method::POST, &["vrp-consents"])?
		.bearer(credential)
		.query(&[("client_id", user)])
		.json(request)
		.send()
		.await
}

pub(crate) async fn get_vrp_consent(
	transport: &RestTransport,
	credential: &Credential,
	user: &UserId,
	consent: &ConsentId,
) -> Result<Value> {
	transport
		.request(Method::GET, &["vrp-consents", consent.as_ref()])?
		.bearer(credential)
		.query(&[("client_id", user)])
		.send()
		.await
}

pub(crate) async fn create_vrp_payment(
	transport: &RestTransport,
	credential: &Credential,
	consent: &ConsentId,
	user: &UserId,
	request: &VrpPaymentRequest,
) -> Result<Value> {
	transport
		.request(Method::POST, &["vrp-consents", consent.as_ref(), "payments"])?
		.bearer(credential)
		.header(IDEMPOTENCY_HEADER, request.idempotency_key())
		.query(&[("client_id", user)])
		.json(request)
		.send()
		.await
}

pub(crate) async fn list_products(
	transport: &RestTransport,
	credential: &Credential,
	path: &[&str],
) -> Result<Value> {
	let body = transport.request(Method::GET, &["products"])?.bearer(credential).send().await?;

	envelope::take_list(transport.provider(), body, path)
}

pub(crate) async fn product_details(
	transport: &RestTransport,
	credential: &Credential,
	product_id: &str,
) -> Result<Value> {
	let body =
		transport.request(Method::GET, &["products", product_id])?.bearer(credential).send().await?;

	envelope::take(transport.provider(), body, &["data"])
}

pub(crate) async fn list_product_agreements(
	transport: &RestTransport,
	credential: &Credential,
	consent: &ConsentId,
	user: &UserId,
) -> Result<Value> {
	let body = transport
		.request(Method::GET, &["product-agreements"])?
		.bearer(credential)
		.consent(consent)
		.query(&[("client_id", user)])
		.send()
		.await?;

	envelope::take_list(transport.provider(), body, &["data"])
}

pub(crate) async fn create_product_agreement(
	transport: &RestTransport,
	credential: &Credential,
	consent: &ConsentId,
	user: &UserId,
	request: &ProductAgreementRequest,
) -> Result<Value> {
	let body = transport
		.request(Method::POST, &["product-agreements"])?
		.bearer(credential)
		.consent(consent)
		.query(&[("client_id", user)])
		.json(request)
		.send()
		.await?;

	envelope::take(transport.provider(), body, &["data"])
}

pub(crate) async fn product_agreement_details(
	transport: &RestTransport,
	credential: &Credential,
	consent: &ConsentId,
	user: &UserId,
	agreement_id: &str,
) -> Result<Value> {
	let body = transport
		.request(Method::GET, &["product-agreements", agreement_id])?
		.bearer(credential)
		.consent(consent)
		.query(&[("client_id", user)])
		.send()
		.await?;

	envelope::take(transport.provider(), body, &["data"])
}

pub(crate) async fn close_product_agreement(
	transport: &RestTransport,
	credential: &Credential,
	consent: &ConsentId,
	user: &UserId,
	agreement_id: &str,
) -> Result<Value> {
	let body = transport
		.request(Method::DELETE, &["product-agreements", agreement_id])?
		.bearer(credential)
		.consent(consent)
		.query(&[("client_id", user)])
		.send()
		.await?;

	Ok(match body {
		Value::Null => json!({ "agreement_id": agreement_id, "status": "closed" }),
		body => body,
	})
}

pub(crate) async fn list_cards(
	transport: &RestTransport,
	credential: &Credential,
	consent: &ConsentId,
	user: &UserId,
) -> Result<Value> {
	let body = transport
		.request(Method::GET, &["cards"])?
		.bearer(credential)
		.consent(consent)
		.query(&[("client_id", user)])
		.send()
		.await?;

	envelope::take(transport.provider(), body, &["data", "card"])
}

pub(crate) async fn card_details(
	transport: &RestTransport,
	credential: &Credential,
	consent: &ConsentId,
	user: &UserId,
	card_id: &str,
) -> Result<Value> {
	let body = transport
		.request(Method::GET, &["cards", card_id])?
		.bearer(credential)
		.consent(consent)
		.query(&[("client_id", user)])
		.send()
		.await?;

	envelope::take(transport.provider(), body, &["data", "card"])
}

fn consent_id(transport: &RestTransport, response: Value) -> Result<ConsentId> {
	let raw = match response.get("consent_id").and_then(Value::as_str) {
		Some(raw) => raw.to_owned(),
		None => envelope::take(transport.provider(), response, &["data", "consentId"])?
			.as_str()
			.map(str::to_owned)
			.ok_or_else(|| Error::EnvelopeShape {
				provider: transport.provider().clone(),
				expected: "consent_id".into(),
			})?,
	};

	ConsentId::new(raw).map_err(|err| ConfigError::from(err).into())
}

/// Reads a consent document, either bare or under `data`.
fn consent_record(transport: &RestTransport, user: &UserId, response: Value) -> Result<Consent> {
	let provider = transport.provider();
	let shape = |field: &str| Error::EnvelopeShape {
		provider: provider.clone(),
		expected: format!("data.{field}"),
	};
	let document = match response.get("data") {
		Some(data) if data.is_object() => data,
		_ => &response,
	};
	let consent_id = first_str(document, &["consentId", "consent_id"])
		.and_then(|raw| ConsentId::new(raw).ok())
		.ok_or_else(|| shape("consentId"))?;
	let status = first_str(document, &["status"]).ok_or_else(|| shape("status"))?.to_owned();
	let permissions = match document.get("permissions") {
		None | Some(Value::Null) => PermissionSet::default(),
		Some(value) => PermissionSet::deserialize(value).map_err(|_| shape("permissions"))?,
	};
	let payment = match (
		first_str(document, &["debtor_account", "debtorAccount"]),
		first_str(document, &["amount"]),
	) {
		(Some(debtor_account), Some(amount)) => Some(PaymentConsentFields {
			debtor_account: debtor_account.to_owned(),
			amount: amount.to_owned(),
			currency: first_str(document, &["currency"])
				.map_or_else(model::default_currency, str::to_owned),
		}),
		_ => None,
	};

	Ok(Consent {
		consent_id,
		provider: provider.clone(),
		user_id: user.clone(),
		permissions,
		payment,
		status,
	})
}

fn first_str<'v>(document: &'v Value, keys: &[&str]) -> Option<&'v str> {
	keys.iter().find_map(|key| document.get(*key).and_then(Value::as_str))
}

fn consent_date(instant: OffsetDateTime) -> Result<String> {
	instant.format(CONSENT_DATE_FORMAT).map_err(|_| ConfigError::ConsentDate.into())
}
