//! Request payloads sent to providers.
//!
//! Provider responses stay as [`Value`]; only the bodies the broker builds are typed.
//! Field casing follows what the sandbox banks accept on the wire, and deserialization
//! also accepts the Open Banking aliases so callers can forward upstream documents.

// self
use crate::{
	_prelude::*,
	auth::{ConsentId, PermissionSet, ProviderId, UserId},
};

/// Payment-specific fields of a consent request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConsentFields {
	/// Account the payment will be drawn from.
	pub debtor_account: String,
	/// Decimal amount as a string.
	pub amount: String,
	/// ISO 4217 currency code.
	#[serde(default = "default_currency")]
	pub currency: String,
}

/// Caller input for consent creation.
///
/// A present `payment` block together with the `CreateDomesticSinglePayment` permission
/// makes clients create a payment consent; anything else creates an account-access consent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRequest {
	/// Requested permissions.
	pub permissions: PermissionSet,
	/// End user the consent is requested for.
	pub user_id: UserId,
	/// Payment details for payment consents.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payment: Option<PaymentConsentFields>,
}
impl ConsentRequest {
	/// Builds an account-access consent request.
	pub fn account_access(permissions: PermissionSet, user_id: UserId) -> Self {
		Self { permissions, user_id, payment: None }
	}

	/// Attaches payment details.
	pub fn with_payment(mut self, payment: PaymentConsentFields) -> Self {
		self.payment = Some(payment);

		self
	}

	/// Payment details when this request should create a payment consent.
	pub fn payment_consent(&self) -> Option<&PaymentConsentFields> {
		self.payment.as_ref().filter(|_| self.permissions.requests_payment())
	}
}

/// Consent read back from a provider.
///
/// Provider-scoped and never cached; the broker only carries it between the bank and the
/// caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consent {
	/// Provider-issued identifier.
	pub consent_id: ConsentId,
	/// Provider holding the consent.
	pub provider: ProviderId,
	/// End user the consent belongs to.
	pub user_id: UserId,
	/// Granted permissions; empty when the provider omits them.
	pub permissions: PermissionSet,
	/// Payment details of a payment consent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payment: Option<PaymentConsentFields>,
	/// Provider-reported status, e.g. `Authorised` or `AwaitingAuthorisation`.
	pub status: String,
}

/// Amount and currency pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructedAmount {
	/// Decimal amount as a string, e.g. `"100.00"`.
	#[serde(alias = "Amount")]
	pub amount: String,
	/// ISO 4217 currency code.
	#[serde(alias = "Currency")]
	pub currency: String,
}

/// Payer account reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtorAccount {
	/// Identification scheme, e.g. `RU.CBR.PAN`.
	#[serde(alias = "schemeName", alias = "SchemeName")]
	pub scheme_name: String,
	/// Account identifier under the scheme.
	#[serde(alias = "Identification")]
	pub identification: String,
}

/// Payee account reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditorAccount {
	/// Identification scheme, e.g. `RU.CBR.PAN`.
	#[serde(alias = "schemeName", alias = "SchemeName")]
	pub scheme_name: String,
	/// Account identifier under the scheme.
	#[serde(alias = "Identification")]
	pub identification: String,
	/// Account holder name.
	#[serde(alias = "Name")]
	pub name: String,
}

/// Instruction details of a single domestic payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInitiation {
	/// Amount to transfer.
	#[serde(alias = "InstructedAmount")]
	pub instructed_amount: InstructedAmount,
	/// Payer account.
	#[serde(alias = "DebtorAccount")]
	pub debtor_account: DebtorAccount,
	/// Payee account.
	#[serde(alias = "CreditorAccount")]
	pub creditor_account: CreditorAccount,
	/// Caller-chosen instruction id; sent unmodified as the idempotency key.
	#[serde(alias = "InstructionIdentification")]
	pub instruction_identification: String,
	/// End-to-end reference carried through the payment chain.
	#[serde(alias = "EndToEndIdentification")]
	pub end_to_end_identification: String,
}

/// `Data` block of a payment initiation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentData {
	/// Instruction details.
	#[serde(alias = "Initiation")]
	pub initiation: PaymentInitiation,
}

/// Single domestic payment initiation request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentInitiationRequest {
	/// Payment data.
	#[serde(alias = "Data")]
	pub data: PaymentData,
	/// Risk block; an empty object is accepted by sandboxes.
	#[serde(alias = "Risk", default = "empty_object")]
	pub risk: Value,
}
impl PaymentInitiationRequest {
	/// Idempotency key derived from the instruction identification.
	pub fn idempotency_key(&self) -> &str {
		&self.data.initiation.instruction_identification
	}
}

/// Limits attached to a variable recurring payment consent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VrpControlParameters {
	/// Ceiling for any single payment.
	pub maximum_individual_amount: InstructedAmount,
	/// Periodic limits, forwarded verbatim.
	#[serde(default)]
	pub periodic_limits: Vec<Value>,
	/// Start of validity.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub valid_from_date_time: Option<String>,
	/// End of validity.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub valid_to_date_time: Option<String>,
}

/// `Data` block of a variable recurring payment consent request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VrpConsentData {
	/// Consent limits.
	pub control_parameters: VrpControlParameters,
	/// Account the payments are drawn from.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub debtor_account: Option<DebtorAccount>,
}

/// Variable recurring payment consent request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VrpConsentRequest {
	/// Consent data.
	pub data: VrpConsentData,
}

/// Instruction of a payment made under a variable recurring payment consent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VrpInstruction {
	/// Caller-chosen instruction id; sent unmodified as the idempotency key.
	pub instruction_identification: String,
	/// End-to-end reference.
	pub end_to_end_identification: String,
	/// Amount to transfer.
	pub instructed_amount: InstructedAmount,
	/// Payee account.
	pub creditor_account: CreditorAccount,
}

/// `Data` block of a variable recurring payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VrpPaymentData {
	/// Consent the payment is made under.
	pub consent_id: String,
	/// Instruction details.
	pub instruction: VrpInstruction,
}

/// Payment under a variable recurring payment consent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VrpPaymentRequest {
	/// Payment data.
	pub data: VrpPaymentData,
}
impl VrpPaymentRequest {
	/// Idempotency key derived from the instruction identification.
	pub fn idempotency_key(&self) -> &str {
		&self.data.instruction.instruction_identification
	}
}

/// Account opening request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
	/// Account type, e.g. `checking` or `savings`.
	pub account_type: String,
	/// Opening balance.
	#[serde(default)]
	pub initial_balance: f64,
}

/// Product agreement opening request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAgreementRequest {
	/// Product being opened.
	pub product_id: String,
	/// End user the agreement belongs to.
	pub user_id: UserId,
	/// Initial deposit or drawdown, when the product takes one.
	pub initial_amount: Option<f64>,
}

pub(crate) fn default_currency() -> String {
	"RUB".into()
}

fn empty_object() -> Value {
	Value::Object(Default::default())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn payment_consent_requires_permission_and_fields() {
		let user = UserId::new("team200-1").expect("User fixture should be valid.");
		let fields = PaymentConsentFields {
			debtor_account: "40817810".into(),
			amount: "100.00".into(),
			currency: "RUB".into(),
		};
		let read_only = ConsentRequest::account_access(
			PermissionSet::new(["ReadAccountsDetail"]).expect("Permissions should be valid."),
			user.clone(),
		)
		.with_payment(fields.clone());
		let payment = ConsentRequest::account_access(
			PermissionSet::new(["CreateDomesticSinglePayment"]).expect("Permissions should be valid."),
			user.clone(),
		);

		assert!(read_only.payment_consent().is_none());
		assert!(payment.payment_consent().is_none());
		assert_eq!(payment.with_payment(fields.clone()).payment_consent(), Some(&fields));

		let parsed: PaymentConsentFields =
			serde_json::from_str("{\"debtor_account\":\"1\",\"amount\":\"2.00\"}")
				.expect("Payment fields should deserialize.");

		assert_eq!(parsed.currency, "RUB");
	}

	#[test]
	fn payment_request_accepts_open_banking_casing() {
		let request: PaymentInitiationRequest = serde_json::from_value(serde_json::json!({
			"Data": {
				"Initiation": {
					"InstructedAmount": { "Amount": "100.00", "Currency": "RUB" },
					"DebtorAccount": { "schemeName": "RU.CBR.PAN", "identification": "4081" },
					"CreditorAccount": {
						"schemeName": "RU.CBR.PAN",
						"identification": "4082",
						"Name": "Ivan"
					},
					"InstructionIdentification": "instr-1",
					"EndToEndIdentification": "e2e-1"
				}
			}
		}))
		.expect("Open Banking payment document should deserialize.");

		assert_eq!(request.idempotency_key(), "instr-1");
		assert_eq!(request.risk, serde_json::json!({}));

		let wire = serde_json::to_value(&request).expect("Payment request should serialize.");

		assert_eq!(wire["data"]["initiation"]["instructed_amount"]["amount"], "100.00");
		assert_eq!(wire["data"]["initiation"]["creditor_account"]["name"], "Ivan");
	}

	#[test]
	fn vrp_payment_uses_pascal_case_envelope() {
		let request = VrpPaymentRequest {
			data: VrpPaymentData {
				consent_id: "vrp-1".into(),
				instruction: VrpInstruction {
					instruction_identification: "instr-9".into(),
					end_to_end_identification: "e2e-9".into(),
					instructed_amount: InstructedAmount {
						amount: "5.00".into(),
						currency: "RUB".into(),
					},
					creditor_account: CreditorAccount {
						scheme_name: "RU.CBR.PAN".into(),
						identification: "4083".into(),
						name: "Shop".into(),
					},
				},
			},
		};
		let wire = serde_json::to_value(&request).expect("VRP payment should serialize.");

		assert_eq!(wire["Data"]["ConsentId"], "vrp-1");
		assert_eq!(wire["Data"]["Instruction"]["InstructionIdentification"], "instr-9");
		assert_eq!(request.idempotency_key(), "instr-9");
	}

	#[test]
	fn product_agreement_request_is_camel_case() {
		let request = ProductAgreementRequest {
			product_id: "dep-12".into(),
			user_id: UserId::new("team200-1").expect("User fixture should be valid."),
			initial_amount: Some(5000.0),
		};
		let wire = serde_json::to_value(&request).expect("Agreement request should serialize.");

		assert_eq!(wire["productId"], "dep-12");
		assert_eq!(wire["userId"], "team200-1");
		assert_eq!(wire["initialAmount"], 5000.0);
	}
}
