//! Provider-facing descriptors, payload models, and clients.
//!
//! `descriptor` holds validated per-provider metadata (base URL, token style, capability
//! set, wire quirks). `client` defines the capability-aware [`ProviderClient`] surface, and
//! `vbank`, `abank`, and `sbank` implement it over the shared [`RestTransport`].

pub mod abank;
pub mod client;
pub mod descriptor;
pub mod model;
pub mod sbank;
pub mod transport;
pub mod vbank;

pub(crate) mod envelope;
pub(crate) mod sandbox;

pub use abank::ABankClient;
pub use client::*;
pub use descriptor::*;
pub use model::*;
pub use sbank::SBankClient;
pub use transport::{ClientAuth, ProviderRequest, RestTransport};
pub use vbank::VBankClient;
