// self
use crate::_prelude::*;

/// Header name used to identify the calling team when none is configured.
pub const DEFAULT_REQUESTING_IDENTITY_HEADER: &str = "X-Requesting-Bank";

/// Provider-specific header quirks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Value of `x-fapi-financial-id` on payment calls; the provider id when unset.
	pub financial_id: Option<String>,
	/// Header carrying the caller's client id on every provider request.
	pub requesting_identity_header: String,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self {
			financial_id: None,
			requesting_identity_header: DEFAULT_REQUESTING_IDENTITY_HEADER.into(),
		}
	}
}
