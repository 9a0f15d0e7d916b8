use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::ValidationError;

/// The header carrying the Open Cloud API key.
pub const API_KEY: &str = "x-api-key";
/// The content type used when a request does not specify one.
pub const APPLICATION_JSON: &str = "application/json";

/// Entry version, set on entry responses.
pub const ENTRY_VERSION: &str = "roblox-entry-version";
/// JSON object of entry attributes.
pub const ENTRY_ATTRIBUTES: &str = "roblox-entry-attributes";
/// JSON array of user IDs associated with an entry.
pub const ENTRY_USER_IDS: &str = "roblox-entry-userids";
/// Creation time of the entry.
pub const ENTRY_CREATED_TIME: &str = "roblox-entry-created-time";
/// Last modification time of the entry.
pub const LAST_MODIFIED: &str = "last-modified";
/// Base64 MD5 checksum of the entry content.
pub const CONTENT_MD5: &str = "content-md5";

/// Builds the headers of an outbound request.
///
/// The defaults are the content type (falling back to [`APPLICATION_JSON`]) and, when given, the API
/// key. Caller-supplied `headers` are layered on top and replace defaults with the same name.
/// Header names are case-insensitive, so two caller headers differing only in case are rejected.
pub(crate) fn build_headermap(
	content_type: Option<&str>, api_key: Option<&str>, headers: &HashMap<String, String>,
) -> Result<HeaderMap, ValidationError> {
	let mut headermap = HeaderMap::new();
	headermap.insert(CONTENT_TYPE, header_value(content_type.unwrap_or(APPLICATION_JSON))?);
	if let Some(api_key) = api_key {
		let mut value = header_value(api_key)?;
		value.set_sensitive(true);
		headermap.insert(HeaderName::from_static(API_KEY), value);
	}
	let mut overrides = HeaderMap::new();
	for (name, value) in headers {
		let header_name =
			HeaderName::from_str(name).map_err(|e| ValidationError::InvalidHeader(format!("{}: {}", name, e)))?;
		if overrides.insert(header_name, header_value(value)?).is_some() {
			return Err(ValidationError::InvalidHeader(format!("{} is given more than once", name)));
		}
	}
	for (name, value) in overrides {
		if let Some(name) = name {
			headermap.insert(name, value);
		}
	}
	Ok(headermap)
}

fn header_value(value: &str) -> Result<HeaderValue, ValidationError> {
	HeaderValue::from_str(value).map_err(|e| ValidationError::InvalidHeader(e.to_string()))
}
