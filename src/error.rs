//! Crate-level error types shared across the decoder, API client, and flows.

// self
use crate::{_prelude::*, token::Rejection};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The pasted token could not be read at all.
	#[error(transparent)]
	Decode(#[from] crate::token::DecodeError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary backend failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Fixture file could not be written.
	#[error(transparent)]
	Fixture(#[from] FixtureError),

	/// Backend rejected the access cookie.
	#[error("Backend rejected the access credentials (HTTP {status}).")]
	Unauthorized {
		/// HTTP status code (401 or 403).
		status: u16,
	},
	/// Backend refused the submitted marketplace token.
	#[error("Token is inactive or has been deleted.")]
	TokenInactive,
	/// Submission was attempted before any token was entered.
	#[error("No token has been entered.")]
	MissingToken,
	/// Token was readable but is not acceptable for this application.
	#[error("Token was rejected: {rejection}.")]
	TokenRejected {
		/// Why the token cannot be used.
		rejection: Rejection,
	},
	/// Backend answered with a non-retryable error status.
	#[error("Backend returned HTTP {status}: {message}.")]
	Api {
		/// HTTP status code.
		status: u16,
		/// Backend-supplied message, or a generic fallback.
		message: String,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL must use HTTPS.
	#[error("The base URL must use HTTPS: {url}.")]
	InsecureBaseUrl {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base URL cannot carry path segments for endpoints.
	#[error("The base URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// Base URL that failed validation.
		url: String,
	},
	/// Request timeout must be positive.
	#[error("The request timeout must be positive.")]
	NonPositiveTimeout,
	/// Environment variable holds an unparsable value.
	#[error("Environment variable `{name}` holds an invalid value: {value}.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Offending value.
		value: String,
	},
	/// Dashboards can only be listed for explicit suppliers.
	#[error("Supplier identifier is required to list dashboards.")]
	MissingSupplierId,
	/// Supplier identifier cannot be used as part of a fixture file name.
	#[error("Supplier identifier `{supplier_id}` must not contain path separators or `..`.")]
	InvalidSupplierId {
		/// Identifier as given.
		supplier_id: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Backend returned a throttling or server-side error.
	#[error("Backend returned a retryable response: {message}.")]
	Api {
		/// Backend-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Backend responded with JSON that does not match the expected shape.
	#[error("Backend returned malformed JSON for {endpoint}.")]
	ResponseParse {
		/// Endpoint path that produced the payload.
		endpoint: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Endpoint path being called.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

/// Failures raised while writing sync fixtures to disk.
#[derive(Debug, ThisError)]
pub enum FixtureError {
	/// Filesystem operation failed.
	#[error("Failed to {action} {path}.")]
	Io {
		/// What was being attempted.
		action: &'static str,
		/// Path involved.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Fixture payload could not be serialized.
	#[error("Failed to serialize fixture {path}.")]
	Serialize {
		/// Target path.
		path: String,
		/// Underlying serializer failure.
		#[source]
		source: serde_json::Error,
	},
}
