use reqwest::StatusCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A request that cannot be sent as constructed.
///
/// These are caller mistakes and are detected before any network activity. Retrying them without
/// changing the input will fail the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
	/// No URL was given.
	EmptyUrl,

	/// No HTTP method was given.
	EmptyMethod,

	/// The HTTP method is not a valid token.
	InvalidMethod(String),

	/// The URL could not be parsed.
	InvalidUrl(String),

	/// The URL does not target the expected API domain.
	ForeignDomain {
		/// The rejected URL.
		url: String,
		/// The domain requests are restricted to.
		expected: String,
	},

	/// A header name or value is not valid HTTP.
	InvalidHeader(String),

	/// The request body could not be serialized.
	InvalidBody(String),

	/// A required request field is empty.
	MissingField(&'static str),
}

impl Display for ValidationError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ValidationError::EmptyUrl => write!(f, "You must provide a url to send the request to"),
			ValidationError::EmptyMethod => write!(f, "You must provide a method in the request options"),
			ValidationError::InvalidMethod(method) => write!(f, "Invalid HTTP method: {}", method),
			ValidationError::InvalidUrl(message) => write!(f, "Invalid URL: {}", message),
			ValidationError::ForeignDomain { url, expected } => {
				write!(f, "The URL {} must target the {} domain", url, expected)
			},
			ValidationError::InvalidHeader(message) => write!(f, "Invalid header: {}", message),
			ValidationError::InvalidBody(message) => write!(f, "Invalid request body: {}", message),
			ValidationError::MissingField(field) => write!(f, "Missing required field: {}", field),
		}
	}
}

impl Error for ValidationError {}

/// Errors returned on interacting with the Open Cloud API.
#[derive(Debug)]
pub enum OpenCloudError {
	/// The request was rejected before it was sent. See [`ValidationError`].
	InvalidRequest(ValidationError),

	/// The server responded with a status code outside `200..=299`.
	HttpStatus {
		/// The response status code.
		status: StatusCode,
		/// The reason phrase for `status`, e.g. `Not Found`.
		status_text: String,
	},

	/// The request could not be completed, e.g. connection failure or a broken response stream.
	Transport(String),

	/// The request did not complete within the configured timeout.
	Timeout(String),

	/// The response was received but does not have the expected shape.
	MalformedResponse(String),

	/// The request was abandoned because its cancellation signal fired first.
	Cancelled,
}

impl OpenCloudError {
	/// Creates an [`OpenCloudError::HttpStatus`] for a non-success `status`.
	pub fn from_status(status: StatusCode) -> OpenCloudError {
		let status_text = match status.canonical_reason() {
			Some(reason) => reason.to_string(),
			None => status.as_str().to_string(),
		};
		OpenCloudError::HttpStatus { status, status_text }
	}

	/// Returns the HTTP status code if the server responded with a failure status.
	pub fn status(&self) -> Option<StatusCode> {
		match self {
			OpenCloudError::HttpStatus { status, .. } => Some(*status),
			_ => None,
		}
	}
}

impl Display for OpenCloudError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			OpenCloudError::InvalidRequest(err) => write!(f, "{}", err),
			OpenCloudError::HttpStatus { status_text, .. } => write!(f, "{}", status_text),
			OpenCloudError::Transport(message) => write!(f, "{}", message),
			OpenCloudError::Timeout(message) => write!(f, "Request timed out: {}", message),
			OpenCloudError::MalformedResponse(message) => {
				write!(f, "Malformed response from Open Cloud: {}", message)
			},
			OpenCloudError::Cancelled => write!(f, "Request was cancelled"),
		}
	}
}

impl Error for OpenCloudError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			OpenCloudError::InvalidRequest(err) => Some(err),
			_ => None,
		}
	}
}

impl From<ValidationError> for OpenCloudError {
	fn from(err: ValidationError) -> Self {
		OpenCloudError::InvalidRequest(err)
	}
}

impl From<reqwest::Error> for OpenCloudError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			OpenCloudError::Timeout(err.to_string())
		} else {
			OpenCloudError::Transport(err.to_string())
		}
	}
}

impl From<serde_json::Error> for OpenCloudError {
	fn from(err: serde_json::Error) -> Self {
		OpenCloudError::MalformedResponse(err.to_string())
	}
}
