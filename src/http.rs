use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use url::Url;

use crate::config::ConfigStore;
use crate::error::{OpenCloudError, ValidationError};
use crate::headers::build_headermap;

/// Per-call options of a request sent through [`HttpClient`].
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
	/// The HTTP method, e.g. `GET`. Required.
	pub method: String,

	/// API key for this call only. Takes precedence over [`ClientConfig::api_key`].
	///
	/// [`ClientConfig::api_key`]: crate::config::ClientConfig::api_key
	pub api_key: Option<String>,

	/// Extra headers. These replace default headers of the same name.
	pub headers: HashMap<String, String>,

	/// Content type of the body. Defaults to `application/json`.
	pub content_type: Option<String>,

	/// Whether the API key header is attached.
	pub include_credentials: bool,

	/// Whether the outcome collapses to [`RequestOutcome::Boolean`].
	pub resolve_with_boolean: bool,
}

impl RequestOptions {
	/// Creates options for a request with the given HTTP `method`.
	pub fn new(method: impl Into<String>) -> Self {
		Self { method: method.into(), ..Default::default() }
	}

	/// Sets an API key that overrides the configured one for this call.
	pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
		self.api_key = Some(api_key.into());
		self
	}

	/// Adds a header that takes precedence over the defaults.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());
		self
	}

	/// Adds several headers that take precedence over the defaults.
	pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
		self.headers.extend(headers);
		self
	}

	/// Sets the content type of the body.
	pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = Some(content_type.into());
		self
	}

	/// Sets whether the API key header is attached.
	pub fn include_credentials(mut self, include_credentials: bool) -> Self {
		self.include_credentials = include_credentials;
		self
	}

	/// Sets whether the outcome collapses to `true`/`false`.
	pub fn resolve_with_boolean(mut self, resolve_with_boolean: bool) -> Self {
		self.resolve_with_boolean = resolve_with_boolean;
		self
	}
}

/// Body of an outbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
	/// Serialized as JSON.
	Json(serde_json::Value),
	/// Sent as-is.
	Text(String),
	/// Sent as-is.
	Bytes(Vec<u8>),
}

impl RequestBody {
	fn into_bytes(self) -> Result<Vec<u8>, ValidationError> {
		match self {
			RequestBody::Json(value) => {
				serde_json::to_vec(&value).map_err(|e| ValidationError::InvalidBody(e.to_string()))
			},
			RequestBody::Text(text) => Ok(text.into_bytes()),
			RequestBody::Bytes(bytes) => Ok(bytes),
		}
	}
}

impl From<serde_json::Value> for RequestBody {
	fn from(value: serde_json::Value) -> Self {
		RequestBody::Json(value)
	}
}

impl From<String> for RequestBody {
	fn from(text: String) -> Self {
		RequestBody::Text(text)
	}
}

impl From<&str> for RequestBody {
	fn from(text: &str) -> Self {
		RequestBody::Text(text.to_string())
	}
}

impl From<Vec<u8>> for RequestBody {
	fn from(bytes: Vec<u8>) -> Self {
		RequestBody::Bytes(bytes)
	}
}

/// A successful (`2xx`) response.
#[derive(Debug, Clone)]
pub struct RawResponse {
	/// The response status code.
	pub status: StatusCode,
	/// The response headers.
	pub headers: HeaderMap,
	/// The response body.
	pub body: Bytes,
}

impl RawResponse {
	/// Returns the value of header `name`, or `None` if it is absent.
	///
	/// Fails with [`OpenCloudError::MalformedResponse`] if the value is not visible ASCII.
	pub fn header(&self, name: &str) -> Result<Option<&str>, OpenCloudError> {
		match self.headers.get(name) {
			Some(value) => value.to_str().map(Some).map_err(|e| {
				OpenCloudError::MalformedResponse(format!("Header {} is not valid text: {}", name, e))
			}),
			None => Ok(None),
		}
	}

	/// Returns the body as text, replacing invalid UTF-8 sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Deserializes the body from JSON.
	pub fn json<T: DeserializeOwned>(&self) -> Result<T, OpenCloudError> {
		Ok(serde_json::from_slice(&self.body)?)
	}
}

/// The result of a request that did not fail in non-boolean mode.
#[derive(Debug, Clone)]
pub enum RequestOutcome {
	/// The full response, returned when boolean resolution is off.
	Response(RawResponse),
	/// Whether the request succeeded, returned when boolean resolution is on.
	Boolean(bool),
}

impl RequestOutcome {
	/// Returns the response, failing if the request was made in boolean mode.
	pub fn into_response(self) -> Result<RawResponse, OpenCloudError> {
		match self {
			RequestOutcome::Response(response) => Ok(response),
			RequestOutcome::Boolean(_) => Err(OpenCloudError::MalformedResponse(
				"Expected a response object but the request resolved to a boolean".to_string(),
			)),
		}
	}

	/// Returns whether the request succeeded.
	pub fn as_bool(&self) -> bool {
		match self {
			RequestOutcome::Response(_) => true,
			RequestOutcome::Boolean(success) => *success,
		}
	}
}

/// Issues single requests against the Open Cloud API host and classifies their outcome.
///
/// Requests are only sent to hosts equal to, or subdomains of, the configured domain. Credentials
/// are resolved per call, first from [`RequestOptions::api_key`] and then from the [`ConfigStore`].
#[derive(Clone)]
pub struct HttpClient {
	client: Client,
	domain: String,
	config: Arc<ConfigStore>,
}

impl HttpClient {
	/// Constructs an [`HttpClient`] restricted to `domain` and reading credentials from `config`.
	pub fn new(client: Client, domain: &str, config: Arc<ConfigStore>) -> Self {
		Self { client, domain: domain.to_ascii_lowercase(), config }
	}

	/// Returns the domain requests are restricted to.
	pub fn domain(&self) -> &str {
		&self.domain
	}

	/// Returns the store credentials and timeouts are read from.
	pub fn config_store(&self) -> &Arc<ConfigStore> {
		&self.config
	}

	/// Validates the inputs and builds the request without sending it.
	///
	/// Checks, in order, that `url` and [`RequestOptions::method`] are non-empty, that both parse, and
	/// that `url` targets the expected domain.
	pub fn prepare(
		&self, url: &str, options: &RequestOptions, body: Option<RequestBody>,
	) -> Result<PreparedRequest, ValidationError> {
		if url.is_empty() {
			return Err(ValidationError::EmptyUrl);
		}
		if options.method.is_empty() {
			return Err(ValidationError::EmptyMethod);
		}
		let url = self.validate_url(url)?;
		let method = Method::from_bytes(options.method.to_ascii_uppercase().as_bytes())
			.map_err(|_| ValidationError::InvalidMethod(options.method.clone()))?;

		let config = self.config.get_config();
		let api_key = if options.include_credentials {
			let api_key = non_empty(options.api_key.as_deref()).or(non_empty(config.api_key.as_deref()));
			if api_key.is_none() {
				log::warn!("Credentials requested for {} {} but no API key is configured", method, url);
			}
			api_key
		} else {
			None
		};
		let headers = build_headermap(options.content_type.as_deref(), api_key, &options.headers)?;

		let mut request = Request::new(method, url);
		*request.headers_mut() = headers;
		*request.timeout_mut() = Some(config.effective_timeout());
		if let Some(body) = body {
			*request.body_mut() = Some(body.into_bytes()?.into());
		}

		Ok(PreparedRequest {
			client: self.client.clone(),
			request,
			resolve_with_boolean: options.resolve_with_boolean,
		})
	}

	/// Validates, sends and classifies a request in one step.
	///
	/// Validation failures are returned as [`OpenCloudError::InvalidRequest`] without any network
	/// activity. Use [`HttpClient::prepare`] to handle them separately.
	pub async fn request(
		&self, url: &str, options: &RequestOptions, body: Option<RequestBody>,
	) -> Result<RequestOutcome, OpenCloudError> {
		self.prepare(url, options, body)?.send().await
	}

	fn validate_url(&self, url: &str) -> Result<Url, ValidationError> {
		let parsed = Url::parse(url).map_err(|e| ValidationError::InvalidUrl(format!("{}: {}", url, e)))?;
		let on_domain = match parsed.host_str() {
			Some(host) => {
				let host = host.to_ascii_lowercase();
				host == self.domain || host.ends_with(&format!(".{}", self.domain))
			},
			None => false,
		};
		if on_domain {
			Ok(parsed)
		} else {
			Err(ValidationError::ForeignDomain { url: url.to_string(), expected: self.domain.clone() })
		}
	}
}

/// A validated request, ready to be sent.
#[derive(Debug)]
pub struct PreparedRequest {
	client: Client,
	request: Request,
	resolve_with_boolean: bool,
}

impl PreparedRequest {
	/// Returns the HTTP method.
	pub fn method(&self) -> &Method {
		self.request.method()
	}

	/// Returns the target URL.
	pub fn url(&self) -> &Url {
		self.request.url()
	}

	/// Returns the headers that will be sent.
	pub fn headers(&self) -> &HeaderMap {
		self.request.headers()
	}

	/// Returns the body that will be sent, if any.
	pub fn body(&self) -> Option<&[u8]> {
		self.request.body().and_then(|body| body.as_bytes())
	}

	/// Sends the request and classifies the result.
	///
	/// A status outside `200..=299` or a transport failure resolves to `Boolean(false)` in boolean
	/// mode and to an error otherwise. Success resolves to `Boolean(true)` or the full response.
	pub async fn send(self) -> Result<RequestOutcome, OpenCloudError> {
		self.send_with_cancellation(std::future::pending()).await
	}

	/// Like [`PreparedRequest::send`], but abandons the request once `cancellation` completes.
	///
	/// A cancelled request fails with [`OpenCloudError::Cancelled`] regardless of boolean mode.
	pub async fn send_with_cancellation<C>(self, cancellation: C) -> Result<RequestOutcome, OpenCloudError>
	where
		C: Future<Output = ()>,
	{
		let PreparedRequest { client, request, resolve_with_boolean } = self;
		let method = request.method().clone();
		let url = request.url().clone();
		log::debug!("Sending {} request to {}", method, url);

		let result = tokio::select! {
			biased;
			_ = cancellation => {
				log::debug!("{} request to {} was cancelled", method, url);
				return Err(OpenCloudError::Cancelled);
			}
			result = execute(&client, request) => result,
		};

		match result {
			Ok(response) => {
				log::debug!("{} request to {} completed with {}", method, url, response.status);
				if resolve_with_boolean {
					Ok(RequestOutcome::Boolean(true))
				} else {
					Ok(RequestOutcome::Response(response))
				}
			},
			Err(err) => {
				match &err {
					OpenCloudError::HttpStatus { .. } => log::debug!("{} request to {} failed: {}", method, url, err),
					_ => log::warn!("{} request to {} failed: {}", method, url, err),
				}
				if resolve_with_boolean {
					Ok(RequestOutcome::Boolean(false))
				} else {
					Err(err)
				}
			},
		}
	}
}

fn non_empty(api_key: Option<&str>) -> Option<&str> {
	api_key.filter(|api_key| !api_key.is_empty())
}

async fn execute(client: &Client, request: Request) -> Result<RawResponse, OpenCloudError> {
	let response = client.execute(request).await?;
	let status = response.status();
	if !status.is_success() {
		return Err(OpenCloudError::from_status(status));
	}
	let headers = response.headers().clone();
	let body = response.bytes().await?;
	Ok(RawResponse { status, headers, body })
}
