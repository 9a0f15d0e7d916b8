use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// The timeout applied to requests when [`ClientConfig::timeout`] is unset.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration options read on every outbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
	/// The Open Cloud API key used when a request includes credentials and carries no key of its own.
	pub api_key: Option<String>,

	/// The per-request timeout. Falls back to [`DEFAULT_TIMEOUT`] when `None`.
	pub timeout: Option<Duration>,
}

impl ClientConfig {
	/// Creates a configuration holding the given API key.
	pub fn with_api_key(api_key: impl Into<String>) -> Self {
		Self { api_key: Some(api_key.into()), ..Default::default() }
	}

	/// Returns a copy of this configuration using the given request timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}

	/// Returns the effective request timeout.
	pub fn effective_timeout(&self) -> Duration {
		self.timeout.unwrap_or(DEFAULT_TIMEOUT)
	}
}

/// Holder for the current [`ClientConfig`].
///
/// Every write replaces the whole value, so readers always observe a fully-formed configuration.
/// Clones of an [`OpenCloudClient`] share one store.
///
/// [`OpenCloudClient`]: crate::client::OpenCloudClient
#[derive(Debug, Default)]
pub struct ConfigStore {
	current: RwLock<Arc<ClientConfig>>,
}

impl ConfigStore {
	/// Creates a store initialized with `config`.
	pub fn new(config: ClientConfig) -> Self {
		Self { current: RwLock::new(Arc::new(config)) }
	}

	/// Replaces the current configuration. Nothing from the previous value is retained.
	pub fn set_config(&self, config: ClientConfig) {
		let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
		*current = Arc::new(config);
	}

	/// Returns the current configuration, or the empty configuration if none was set.
	pub fn get_config(&self) -> ClientConfig {
		let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
		ClientConfig::clone(&current)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_before_first_set() {
		let store = ConfigStore::default();
		assert_eq!(store.get_config(), ClientConfig::default());
		assert_eq!(store.get_config().api_key, None);
	}

	#[test]
	fn set_then_get_round_trips() {
		let store = ConfigStore::default();
		store.set_config(ClientConfig::with_api_key("X"));
		assert_eq!(store.get_config(), ClientConfig::with_api_key("X"));
	}

	#[test]
	fn set_replaces_instead_of_merging() {
		let store = ConfigStore::new(ClientConfig::with_api_key("first").with_timeout(Duration::from_secs(5)));
		store.set_config(ClientConfig { api_key: None, timeout: Some(Duration::from_secs(1)) });

		let config = store.get_config();
		assert_eq!(config.api_key, None);
		assert_eq!(config.effective_timeout(), Duration::from_secs(1));

		store.set_config(ClientConfig::default());
		assert_eq!(store.get_config().effective_timeout(), DEFAULT_TIMEOUT);
	}

	#[test]
	fn concurrent_readers_see_whole_values() {
		let store = Arc::new(ConfigStore::default());
		let writer = {
			let store = Arc::clone(&store);
			std::thread::spawn(move || {
				for i in 0..100 {
					store.set_config(ClientConfig::with_api_key(format!("key-{}", i)));
				}
			})
		};
		for _ in 0..100 {
			let config = store.get_config();
			if let Some(key) = config.api_key {
				assert!(key.starts_with("key-"));
			}
		}
		writer.join().unwrap();
		assert_eq!(store.get_config().api_key.as_deref(), Some("key-99"));
	}
}
