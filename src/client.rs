use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use url::Url;

use crate::config::{ClientConfig, ConfigStore};
use crate::error::{OpenCloudError, ValidationError};
use crate::http::{HttpClient, RequestOptions};
use crate::types::{Entry, GetEntryRequest};

/// The Open Cloud API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://apis.roblox.com";
/// The domain every request is restricted to by default.
pub const DEFAULT_DOMAIN: &str = "roblox.com";

const ENTRY_PATH: [&str; 8] =
	["datastores", "v1", "universes", "{universeId}", "standard-datastores", "datastore", "entries", "entry"];

/// Thin-client to access the Open Cloud DataStore API.
///
/// Each client owns its configuration; clones share it, so [`OpenCloudClient::set_config`] on one
/// clone is observed by all of them.
#[derive(Clone)]
pub struct OpenCloudClient {
	base_url: String,
	http: HttpClient,
}

impl OpenCloudClient {
	/// Constructs an [`OpenCloudClient`] targeting [`DEFAULT_BASE_URL`].
	pub fn new(config: ClientConfig) -> Self {
		Self::from_client(DEFAULT_BASE_URL, DEFAULT_DOMAIN, Client::new(), config)
	}

	/// Constructs an [`OpenCloudClient`] from a given [`reqwest::Client`], using `base_url` as the API
	/// endpoint and restricting requests to `domain`.
	pub fn from_client(base_url: &str, domain: &str, client: Client, config: ClientConfig) -> Self {
		let config = Arc::new(ConfigStore::new(config));
		Self { base_url: base_url.trim_end_matches('/').to_string(), http: HttpClient::new(client, domain, config) }
	}

	/// Returns the underlying base URL.
	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Returns the request helper, for endpoints this client does not wrap.
	pub fn http(&self) -> &HttpClient {
		&self.http
	}

	/// Replaces the configuration used by subsequent requests.
	pub fn set_config(&self, config: ClientConfig) {
		self.http.config_store().set_config(config)
	}

	/// Returns the current configuration.
	pub fn config(&self) -> ClientConfig {
		self.http.config_store().get_config()
	}

	/// Fetches the latest value and metadata of the entry named in `request`.
	/// Makes a `GET` call to the standard datastore entry endpoint, authenticated with the API key.
	///
	/// Missing required fields fail with [`OpenCloudError::InvalidRequest`] before any network call.
	pub async fn get_entry(&self, request: &GetEntryRequest) -> Result<Entry, OpenCloudError> {
		self.get_entry_with_cancellation(request, std::future::pending()).await
	}

	/// Like [`OpenCloudClient::get_entry`], but fails with [`OpenCloudError::Cancelled`] once
	/// `cancellation` completes.
	pub async fn get_entry_with_cancellation<C>(
		&self, request: &GetEntryRequest, cancellation: C,
	) -> Result<Entry, OpenCloudError>
	where
		C: Future<Output = ()>,
	{
		request.validate()?;
		let url = self.entry_url(request)?;
		let mut options = RequestOptions::new("GET").include_credentials(true);
		if let Some(api_key) = &request.api_key {
			options = options.with_api_key(api_key.clone());
		}

		let outcome = self.http.prepare(url.as_str(), &options, None)?.send_with_cancellation(cancellation).await?;
		Entry::try_from(outcome.into_response()?)
	}

	fn entry_url(&self, request: &GetEntryRequest) -> Result<Url, ValidationError> {
		let mut url = Url::parse(&self.base_url)
			.map_err(|e| ValidationError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
		url.path_segments_mut()
			.map_err(|_| ValidationError::InvalidUrl(format!("{} cannot be a base URL", self.base_url)))?
			.pop_if_empty()
			.extend(ENTRY_PATH.iter().map(|segment| match *segment {
				"{universeId}" => request.universe_id.as_str(),
				segment => segment,
			}));
		{
			let mut query = url.query_pairs_mut();
			query.append_pair("datastoreName", &request.datastore_name);
			query.append_pair("entryKey", &request.entry_key);
			if let Some(scope) = &request.scope {
				query.append_pair("scope", scope);
			}
		}
		Ok(url)
	}
}
