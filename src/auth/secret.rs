//! Secret wrappers that keep bearer tokens and client secrets out of logs.

// self
use crate::_prelude::*;

macro_rules! def_secret {
	($name:ident, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(String);
		impl $name {
			/// Wraps a new secret value.
			pub fn new(value: impl Into<String>) -> Self {
				Self(value.into())
			}

			/// Returns the raw value. Callers must avoid logging this string.
			pub fn expose(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				self.expose()
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.debug_tuple(stringify!($name)).field(&"<redacted>").finish()
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str("<redacted>")
			}
		}
	};
}

def_secret! { BearerSecret, "Redacted bearer token issued by a provider." }
def_secret! { ClientSecret, "Redacted client secret used to obtain provider tokens." }

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatters_redact_but_expose_returns_raw_value() {
		let bearer = BearerSecret::new("tok1");
		let client = ClientSecret::new("s3cr3t");

		assert_eq!(format!("{bearer:?}"), "BearerSecret(\"<redacted>\")");
		assert_eq!(format!("{client:?}"), "ClientSecret(\"<redacted>\")");
		assert_eq!(format!("{bearer}"), "<redacted>");
		assert_eq!(bearer.expose(), "tok1");
		assert_eq!(client.expose(), "s3cr3t");
	}
}
