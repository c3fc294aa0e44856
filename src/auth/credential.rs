//! Bearer credential records and their builder.

// self
use crate::{
	_prelude::*,
	auth::{BearerSecret, ProviderId},
};

/// Freshness of a credential relative to an instant and a safety margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
	/// Usable without a refetch.
	Fresh,
	/// Still accepted upstream but inside the safety margin; callers should refetch.
	Stale,
	/// Past the provider-declared expiry.
	Expired,
}

/// Errors produced by [`CredentialBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CredentialBuilderError {
	/// Issued when no bearer value was provided.
	#[error("Bearer value is required.")]
	MissingBearer,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// Issued when the expiry does not follow the issue instant.
	#[error("Expiry must be later than the issue instant.")]
	ExpiryNotAfterIssue,
}

/// Provider-issued bearer credential.
///
/// Records are immutable once built; a refresh produces a new value that replaces the
/// cached one wholesale.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Provider that issued the credential.
	pub provider: ProviderId,
	/// Bearer value; callers must avoid logging it.
	pub bearer: BearerSecret,
	/// Instant the credential was obtained.
	pub issued_at: OffsetDateTime,
	/// Provider-declared expiry (`issued_at + expires_in`).
	pub expires_at: OffsetDateTime,
}
impl Credential {
	/// Returns a builder for the provided issuer.
	pub fn builder(provider: ProviderId) -> CredentialBuilder {
		CredentialBuilder::new(provider)
	}

	/// Computes freshness at `instant`, treating the last `margin` before expiry as stale.
	pub fn status_at(&self, instant: OffsetDateTime, margin: Duration) -> CredentialStatus {
		if instant >= self.expires_at {
			return CredentialStatus::Expired;
		}
		if instant >= self.expires_at - margin {
			return CredentialStatus::Stale;
		}

		CredentialStatus::Fresh
	}

	/// Returns `true` when the credential can be served from cache at `instant`.
	pub fn is_fresh_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		matches!(self.status_at(instant, margin), CredentialStatus::Fresh)
	}

	/// Declared lifetime in whole seconds.
	pub fn lifetime_secs(&self) -> i64 {
		(self.expires_at - self.issued_at).whole_seconds()
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("provider", &self.provider)
			.field("bearer", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Credential`].
#[derive(Clone, Debug)]
pub struct CredentialBuilder {
	provider: ProviderId,
	bearer: Option<BearerSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl CredentialBuilder {
	fn new(provider: ProviderId) -> Self {
		Self { provider, bearer: None, issued_at: None, expires_at: None, expires_in: None }
	}

	/// Provides the bearer value.
	pub fn bearer(mut self, value: impl Into<String>) -> Self {
		self.bearer = Some(BearerSecret::new(value));

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces a [`Credential`].
	pub fn build(self) -> Result<Credential, CredentialBuilderError> {
		let bearer = self.bearer.ok_or(CredentialBuilderError::MissingBearer)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => issued_at + delta,
			(None, None) => return Err(CredentialBuilderError::MissingExpiry),
		};

		if expires_at <= issued_at {
			return Err(CredentialBuilderError::ExpiryNotAfterIssue);
		}

		Ok(Credential { provider: self.provider, bearer, issued_at, expires_at })
	}
}
