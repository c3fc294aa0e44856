// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for credential lookups.
#[derive(Debug, Default)]
pub struct CredentialMetrics {
	hits: AtomicU64,
	fetches: AtomicU64,
	failures: AtomicU64,
}
impl CredentialMetrics {
	/// Returns the number of lookups served from cache.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Returns the number of token endpoint calls.
	pub fn fetches(&self) -> u64 {
		self.fetches.load(Ordering::Relaxed)
	}

	/// Returns the number of lookups that ended in an error.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_fetch(&self) {
		self.fetches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
