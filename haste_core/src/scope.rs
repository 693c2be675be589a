use std::collections::BTreeMap;

use derive_more::Deref;

/// The variables visible to placeholder substitution at one level of a build.
///
/// A scope is never shared between levels. A child level starts from a
/// [`Scope::branch`] of its parent and only ever writes into its own copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct Scope(BTreeMap<String, String>);

impl Scope {
	pub fn new() -> Self {
		Self::default()
	}

	/// Copy this scope for use by a nested level.
	#[must_use]
	pub fn branch(&self) -> Self {
		self.clone()
	}

	/// Set `key`, replacing any existing value.
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.insert(key.into(), value.into());
	}

	/// Set `key` only when it has no value yet. Returns whether the value was
	/// stored.
	pub fn set_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
		let key = key.into();
		if self.0.contains_key(&key) {
			return false;
		}

		self.0.insert(key, value.into());
		true
	}

	/// Merge `entries` into this scope, overriding existing values.
	pub fn merge<K, V>(&mut self, entries: impl IntoIterator<Item = (K, V)>)
	where
		K: Into<String>,
		V: Into<String>,
	{
		for (key, value) in entries {
			self.set(key, value);
		}
	}

	/// Look up `key`, treating a missing variable as empty.
	pub fn value(&self, key: &str) -> &str {
		self.0.get(key).map_or("", String::as_str)
	}

	/// A stable textual form of the scope, used in cache keys.
	pub fn fingerprint(&self) -> String {
		let mut fingerprint = String::new();
		for (key, value) in &self.0 {
			fingerprint.push_str(key);
			fingerprint.push('\u{1f}');
			fingerprint.push_str(value);
			fingerprint.push('\u{1e}');
		}
		fingerprint
	}
}

impl<K, V> FromIterator<(K, V)> for Scope
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut scope = Self::new();
		scope.merge(iter);
		scope
	}
}
