//! Response envelope unwrapping.

// self
use crate::{_prelude::*, auth::ProviderId};

/// Moves the value at `path` out of `body`, failing with [`Error::EnvelopeShape`] when any
/// segment is absent or null.
pub(crate) fn take(provider: &ProviderId, mut body: Value, path: &[&str]) -> Result<Value> {
	let mut cursor = &mut body;

	for segment in path {
		cursor = match cursor.get_mut(*segment) {
			Some(next) if !next.is_null() => next,
			_ => return Err(shape_error(provider, path)),
		};
	}

	Ok(cursor.take())
}

/// Like [`take`] but falls back to the whole body when it already is a bare array.
pub(crate) fn take_list(provider: &ProviderId, body: Value, path: &[&str]) -> Result<Value> {
	if body.is_array() {
		return Ok(body);
	}

	take(provider, body, path)
}

fn shape_error(provider: &ProviderId, path: &[&str]) -> Error {
	Error::EnvelopeShape { provider: provider.clone(), expected: path.join(".") }
}
