//! Fan-out coordinator: one logical request, many providers, one outcome each.
//!
//! [`Coordinator::dispatch`] only fails for caller mistakes (an empty provider set or an
//! id missing from the registry). Everything that goes wrong for an individual provider
//! (missing consent, unsupported capability, credential failure, upstream error, timeout)
//! becomes a failed [`OperationOutcome`] next to the others' results. Per-provider work
//! runs concurrently inside the caller's task, so dropping the returned future cancels all
//! of it.

mod operation;
mod outcome;
mod registry;

pub use operation::{ConsentMap, Operation};
pub use outcome::{OperationOutcome, OutcomeError, OutcomeResult};
pub use registry::{ProviderRegistry, ProviderRegistryBuilder};

// crates.io
use futures::future;
// self
use crate::{
	_prelude::*,
	auth::{ProviderId, UserId},
	credential::CredentialManager,
	error::TransportError,
	obs::{self, OpKind, OpOutcome, OpSpan},
	provider::ProviderClient,
};

/// Caller mistakes rejected before any provider is contacted.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum DispatchError {
	/// No provider was selected.
	#[error("At least one provider must be selected.")]
	EmptyProviderSet,
	/// A selected provider is not registered.
	#[error("Provider `{provider}` is not registered.")]
	UnknownProvider {
		/// Offending identifier.
		provider: ProviderId,
	},
}

/// Dispatches operations to the providers of a [`CredentialManager`]'s registry.
#[derive(Clone, Debug)]
pub struct Coordinator {
	manager: Arc<CredentialManager>,
	timeout: Option<Duration>,
}
impl Coordinator {
	/// Creates a coordinator without a per-provider deadline.
	pub fn new(manager: Arc<CredentialManager>) -> Self {
		Self { manager, timeout: None }
	}

	/// Bounds each provider's share of a dispatch, credential fetch included.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Credential manager the coordinator obtains bearer tokens from.
	pub fn manager(&self) -> &Arc<CredentialManager> {
		&self.manager
	}

	/// Runs `operation` for `user` against every provider in `providers`.
	///
	/// Duplicate ids are collapsed; outcomes follow the order in which ids first appear.
	pub async fn dispatch<I>(
		&self,
		providers: I,
		user: &UserId,
		operation: &Operation,
	) -> Result<Vec<OperationOutcome>, DispatchError>
	where
		I: IntoIterator<Item = ProviderId>,
	{
		let registry = self.manager.registry();
		let mut seen = BTreeSet::new();
		let mut clients = Vec::new();

		for provider in providers {
			if !seen.insert(provider.clone()) {
				continue;
			}

			let client = registry
				.get(&provider)
				.ok_or(DispatchError::UnknownProvider { provider })?;

			clients.push(client.as_ref());
		}

		if clients.is_empty() {
			return Err(DispatchError::EmptyProviderSet);
		}

		let outcomes =
			future::join_all(clients.into_iter().map(|client| self.run(client, user, operation)))
				.await;

		Ok(outcomes)
	}

	async fn run(
		&self,
		client: &dyn ProviderClient,
		user: &UserId,
		operation: &Operation,
	) -> OperationOutcome {
		const KIND: OpKind = OpKind::Dispatch;

		let span = OpSpan::new(KIND, "dispatch");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let attempt = span.instrument(self.attempt(client, user, operation));
		let result = match self.timeout {
			Some(limit) => tokio::time::timeout(limit.unsigned_abs(), attempt)
				.await
				.unwrap_or_else(|_| Err(TransportError::Timeout { source: None }.into())),
			None => attempt.await,
		};
		let provider = client.id().clone();

		match result {
			Ok(data) => {
				obs::record_op_outcome(KIND, OpOutcome::Success);

				OperationOutcome::success(provider, data)
			},
			Err(err) => {
				obs::record_op_outcome(KIND, OpOutcome::Failure);

				OperationOutcome::failed(provider, &err)
			},
		}
	}

	async fn attempt(
		&self,
		client: &dyn ProviderClient,
		user: &UserId,
		operation: &Operation,
	) -> Result<Value> {
		let provider = client.id();

		if let Some(consents) = operation.consents() {
			consents.require(provider)?;
		}

		let capability = operation.capability();

		if !client.descriptor().supports(capability) {
			return Err(Error::unsupported(provider, capability));
		}

		let credential = self.manager.get_credential(provider).await?;

		operation.invoke(client, &credential, user).await
	}
}
