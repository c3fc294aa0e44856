//! Consent permission sets.

// std
use std::slice::Iter;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

/// Permission that switches consent creation to the payment-consent endpoint.
pub const DOMESTIC_SINGLE_PAYMENT: &str = "CreateDomesticSinglePayment";

/// Errors emitted when validating permissions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum PermissionValidationError {
	/// Empty permission entries are not allowed.
	#[error("Permission entries cannot be empty.")]
	Empty,
	/// Permissions cannot contain embedded whitespace characters.
	#[error("Permission contains whitespace: {permission}.")]
	ContainsWhitespace {
		/// The offending permission string.
		permission: String,
	},
}

/// Normalized set of provider permission strings (`ReadAccountsDetail`, `ReadBalances`, ...).
///
/// Entries are deduplicated and sorted so two requests naming the same permissions in a
/// different order produce identical consent bodies.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PermissionSet(Arc<[String]>);
impl PermissionSet {
	/// Creates a normalized permission set from any iterator.
	pub fn new<I, S>(permissions: I) -> Result<Self, PermissionValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut set = BTreeSet::new();

		for permission in permissions {
			let owned: String = permission.into();

			if owned.is_empty() {
				return Err(PermissionValidationError::Empty);
			}
			if owned.chars().any(char::is_whitespace) {
				return Err(PermissionValidationError::ContainsWhitespace { permission: owned });
			}

			set.insert(owned);
		}

		Ok(Self(Arc::from(set.into_iter().collect::<Vec<_>>())))
	}

	/// Number of distinct permissions.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no permissions are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the normalized set contains the provided permission.
	pub fn contains(&self, permission: &str) -> bool {
		self.0.binary_search_by(|candidate| candidate.as_str().cmp(permission)).is_ok()
	}

	/// Returns true when the set requests a domestic single payment.
	pub fn requests_payment(&self) -> bool {
		self.contains(DOMESTIC_SINGLE_PAYMENT)
	}

	/// Iterator over normalized permissions.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|s| s.as_str())
	}

	/// Returns the underlying slice of permission strings.
	pub fn as_slice(&self) -> &[String] {
		&self.0
	}
}
impl Debug for PermissionSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("PermissionSet").field(&self.0).finish()
	}
}
impl Display for PermissionSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0.join(" "))
	}
}
impl<'a> IntoIterator for &'a PermissionSet {
	type IntoIter = PermissionIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		PermissionIter { inner: self.0.iter() }
	}
}
impl FromStr for PermissionSet {
	type Err = PermissionValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::default());
		}
		if s.chars().all(char::is_whitespace) {
			return Err(PermissionValidationError::Empty);
		}

		Self::new(s.split_whitespace())
	}
}
impl Serialize for PermissionSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.0.len()))?;

		for permission in self.0.iter() {
			seq.serialize_element(permission)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for PermissionSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		PermissionSet::new(values).map_err(DeError::custom)
	}
}

/// Iterator over permission strings.
pub struct PermissionIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for PermissionIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}
