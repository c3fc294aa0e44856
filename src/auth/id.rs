//! Validated identifiers for providers, end users, and consents.
//!
//! Each kind carries its own character rules. Consent identifiers travel in request headers and
//! path segments, so they are limited to a small ASCII set. User identifiers are opaque and only
//! reject whitespace and control characters.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($(#[$meta:meta])* $name:ident => $rules:ident) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Character rules applied by [`Self::new`] and deserialization.
			pub const RULES: IdentifierRules = $rules;

			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				Self::RULES.check(view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::RULES.check(&value)?;

				Ok(Self(value))
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", Self::RULES.kind, self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

/// Validation rules for one identifier kind.
#[derive(Clone, Copy, Debug)]
pub struct IdentifierRules {
	/// Kind label used in errors and `Debug` output.
	pub kind: &'static str,
	/// Maximum length in characters.
	pub max_len: usize,
	accepts: fn(char) -> bool,
}
impl IdentifierRules {
	/// Checks `view` against these rules.
	pub fn check(&self, view: &str) -> Result<(), IdentifierError> {
		let kind = self.kind;

		if view.is_empty() {
			return Err(IdentifierError::Empty { kind });
		}
		if view.chars().any(char::is_whitespace) {
			return Err(IdentifierError::ContainsWhitespace { kind });
		}
		if let Some(character) = view.chars().find(|c| !(self.accepts)(*c)) {
			return Err(IdentifierError::InvalidCharacter { kind, character });
		}
		if view.chars().count() > self.max_len {
			return Err(IdentifierError::TooLong { kind, max: self.max_len });
		}

		Ok(())
	}
}

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (provider, user, consent).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (provider, user, consent).
		kind: &'static str,
	},
	/// The identifier contains a character its kind does not allow.
	#[error("{kind} identifier contains disallowed character {character:?}.")]
	InvalidCharacter {
		/// Kind of identifier (provider, user, consent).
		kind: &'static str,
		/// First offending character.
		character: char,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (provider, user, consent).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

// Lowercase so configuration and cache keys have one spelling.
const PROVIDER_RULES: IdentifierRules = IdentifierRules {
	kind: "Provider",
	max_len: 64,
	accepts: |c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_'),
};
const USER_RULES: IdentifierRules =
	IdentifierRules { kind: "User", max_len: 128, accepts: |c| !c.is_control() };
// Consent identifiers are sent as header values and URL path segments.
const CONSENT_RULES: IdentifierRules = IdentifierRules {
	kind: "Consent",
	max_len: 128,
	accepts: |c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'),
};

def_id! {
	/// Identifier for a registered Open Banking provider.
	///
	/// Lowercase ASCII letters, digits, `-` and `_`, at most 64 characters.
	ProviderId => PROVIDER_RULES
}
def_id! {
	/// Identifier of the end user a consent or request acts for.
	UserId => USER_RULES
}
def_id! {
	/// Provider-issued consent identifier.
	///
	/// ASCII letters, digits, `-`, `_`, `.` and `:`, at most 128 characters.
	ConsentId => CONSENT_RULES
}
