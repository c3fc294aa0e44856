// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

macro_rules! def_capabilities {
	($($(#[$meta:meta])* $variant:ident => $label:literal,)+) => {
		/// Logical operations a provider may implement.
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(rename_all = "snake_case")]
		pub enum Capability {
			$($(#[$meta])* $variant,)+
		}
		impl Capability {
			/// Every capability in declaration order.
			pub const ALL: &'static [Capability] = &[$(Capability::$variant,)+];

			/// Returns a stable label suitable for logs and error messages.
			pub const fn as_str(self) -> &'static str {
				match self {
					$(Capability::$variant => $label,)+
				}
			}
		}
	};
}

def_capabilities! {
	/// Account-access or payment consent creation.
	CreateConsent => "create_consent",
	/// Consent lookup.
	GetConsent => "get_consent",
	/// Consent revocation.
	RevokeConsent => "revoke_consent",
	/// Account listing.
	ListAccounts => "list_accounts",
	/// Single account details.
	AccountDetails => "account_details",
	/// Account balances.
	AccountBalances => "account_balances",
	/// Account transaction history.
	AccountTransactions => "account_transactions",
	/// Account opening.
	CreateAccount => "create_account",
	/// Account status change.
	UpdateAccountStatus => "update_account_status",
	/// Account closure.
	CloseAccount => "close_account",
	/// Single domestic payment initiation.
	CreatePayment => "create_payment",
	/// Payment status lookup.
	PaymentStatus => "payment_status",
	/// Variable recurring payment consent creation.
	CreateVrpConsent => "create_vrp_consent",
	/// Variable recurring payment consent lookup.
	GetVrpConsent => "get_vrp_consent",
	/// Payment under a variable recurring payment consent.
	CreateVrpPayment => "create_vrp_payment",
	/// Product catalogue listing.
	ListProducts => "list_products",
	/// Single product details.
	ProductDetails => "product_details",
	/// Product agreement listing.
	ListProductAgreements => "list_product_agreements",
	/// Product agreement opening.
	CreateProductAgreement => "create_product_agreement",
	/// Single product agreement details.
	ProductAgreementDetails => "product_agreement_details",
	/// Product agreement closure.
	CloseProductAgreement => "close_product_agreement",
	/// Card listing.
	ListCards => "list_cards",
	/// Single card details.
	CardDetails => "card_details",
}
impl Capability {
	const fn bit(self) -> u32 {
		1 << self as u32
	}
}
impl Display for Capability {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Compact set of [`Capability`] flags.
///
/// Serialized as an array of capability labels.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u32);
impl CapabilitySet {
	/// Set with no capabilities.
	pub const fn empty() -> Self {
		Self(0)
	}

	/// Set with every capability.
	pub fn all() -> Self {
		Capability::ALL.iter().copied().collect()
	}

	/// Returns true if the provided capability is present.
	pub const fn supports(self, capability: Capability) -> bool {
		self.0 & capability.bit() != 0
	}

	/// Adds a capability.
	pub const fn enable(self, capability: Capability) -> Self {
		Self(self.0 | capability.bit())
	}

	/// Removes a capability.
	pub const fn disable(self, capability: Capability) -> Self {
		Self(self.0 & !capability.bit())
	}

	/// Returns true when no capabilities are enabled.
	pub const fn is_empty(self) -> bool {
		self.0 == 0
	}

	/// Iterator over enabled capabilities in declaration order.
	pub fn iter(self) -> impl Iterator<Item = Capability> {
		Capability::ALL.iter().copied().filter(move |capability| self.supports(*capability))
	}
}
impl FromIterator<Capability> for CapabilitySet {
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = Capability>,
	{
		iter.into_iter().fold(Self::empty(), Self::enable)
	}
}
impl Debug for CapabilitySet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_set().entries(self.iter()).finish()
	}
}
impl Serialize for CapabilitySet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(None)?;

		for capability in self.iter() {
			seq.serialize_element(&capability)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for CapabilitySet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<Capability>>::deserialize(deserializer)?;

		if values.is_empty() {
			return Err(DeError::custom("capability list cannot be empty"));
		}

		Ok(values.into_iter().collect())
	}
}
