use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

use crate::error::{OpenCloudError, ValidationError};
use crate::headers::{
	CONTENT_MD5, ENTRY_ATTRIBUTES, ENTRY_CREATED_TIME, ENTRY_USER_IDS, ENTRY_VERSION, LAST_MODIFIED,
};
use crate::http::RawResponse;

/// Identifier of a universe, the top-level namespace datastores live under.
///
/// Universe IDs are numeric, but are accepted as text as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniverseId(String);

impl UniverseId {
	/// Returns the identifier as it appears in request paths.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Display for UniverseId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<u64> for UniverseId {
	fn from(id: u64) -> Self {
		UniverseId(id.to_string())
	}
}

impl From<&str> for UniverseId {
	fn from(id: &str) -> Self {
		UniverseId(id.to_string())
	}
}

impl From<String> for UniverseId {
	fn from(id: String) -> Self {
		UniverseId(id)
	}
}

/// Request to fetch the latest value of a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetEntryRequest {
	/// API key for this request only. Overrides the configured key.
	pub api_key: Option<String>,
	/// The universe the datastore belongs to.
	pub universe_id: UniverseId,
	/// The name of the datastore.
	pub datastore_name: String,
	/// The scope of the entry. The API uses `global` when unset.
	pub scope: Option<String>,
	/// The key of the entry.
	pub entry_key: String,
}

impl GetEntryRequest {
	/// Creates a request for `entry_key` in `datastore_name` of `universe_id`, in the default scope.
	pub fn new(
		universe_id: impl Into<UniverseId>, datastore_name: impl Into<String>, entry_key: impl Into<String>,
	) -> Self {
		Self {
			api_key: None,
			universe_id: universe_id.into(),
			datastore_name: datastore_name.into(),
			scope: None,
			entry_key: entry_key.into(),
		}
	}

	/// Sets the scope of the entry.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());
		self
	}

	/// Sets an API key used for this request only.
	pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
		self.api_key = Some(api_key.into());
		self
	}

	pub(crate) fn validate(&self) -> Result<(), ValidationError> {
		if self.universe_id.as_str().is_empty() {
			return Err(ValidationError::MissingField("universe_id"));
		}
		if self.datastore_name.is_empty() {
			return Err(ValidationError::MissingField("datastore_name"));
		}
		if self.entry_key.is_empty() {
			return Err(ValidationError::MissingField("entry_key"));
		}
		Ok(())
	}
}

/// A stored value together with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
	/// The stored value. Non-JSON content is kept as a JSON string.
	pub data: Value,
	/// The version of the entry.
	pub version: Option<String>,
	/// Attributes attached to the entry.
	pub attributes: Map<String, Value>,
	/// User IDs associated with the entry.
	pub user_ids: Vec<u64>,
	/// When the entry was created, as reported by the server.
	pub created_at: Option<String>,
	/// When the entry was last modified, as reported by the server.
	pub last_modified: Option<String>,
	/// Base64 MD5 checksum of the content.
	pub md5: Option<String>,
}

impl TryFrom<RawResponse> for Entry {
	type Error = OpenCloudError;

	fn try_from(response: RawResponse) -> Result<Self, Self::Error> {
		let attributes = match response.header(ENTRY_ATTRIBUTES)? {
			Some(raw) => serde_json::from_str(raw).map_err(|e| {
				OpenCloudError::MalformedResponse(format!("Invalid {} header: {}", ENTRY_ATTRIBUTES, e))
			})?,
			None => Map::new(),
		};
		let user_ids = match response.header(ENTRY_USER_IDS)? {
			Some(raw) => serde_json::from_str(raw).map_err(|e| {
				OpenCloudError::MalformedResponse(format!("Invalid {} header: {}", ENTRY_USER_IDS, e))
			})?,
			None => Vec::new(),
		};

		let data = if response.body.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&response.body).unwrap_or_else(|_| Value::String(response.text()))
		};

		Ok(Entry {
			data,
			version: response.header(ENTRY_VERSION)?.map(str::to_string),
			attributes,
			user_ids,
			created_at: response.header(ENTRY_CREATED_TIME)?.map(str::to_string),
			last_modified: response.header(LAST_MODIFIED)?.map(str::to_string),
			md5: response.header(CONTENT_MD5)?.map(str::to_string),
		})
	}
}
