//! Transport-agnostic response handling shared by backend clients.
//!
//! [`ResponseMetadata`] captures the status and retry hint of the last response so
//! [`classify_failure`] can map error statuses onto the crate taxonomy consistently,
//! whatever HTTP stack produced them. [`parse_body`] decodes successful payloads and
//! reports the JSON path of any mismatch.

#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransientError};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Metadata from the most recent HTTP response.
///
/// Additional metadata fields may be added in future releases, so downstream code
/// should construct values using field names instead of struct update syntax.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the backend, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}
impl ResponseMetadata {
	/// Returns true for 2xx statuses.
	pub fn is_success(&self) -> bool {
		matches!(self.status, Some(200..=299))
	}
}

#[derive(Deserialize)]
struct ErrorBody {
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	error: Option<String>,
}

/// Maps a non-2xx response into an [`Error`].
///
/// 401/403 become [`Error::Unauthorized`], 429 and 5xx become retryable
/// [`TransientError::Api`], everything else becomes [`Error::Api`]. The backend's
/// `message` (or `error`) field is preferred over a raw body preview.
pub fn classify_failure(meta: &ResponseMetadata, body: &[u8]) -> Error {
	let status = meta.status.unwrap_or_default();
	let message = backend_message(body).unwrap_or_else(|| format!("unexpected HTTP {status}"));

	match status {
		401 | 403 => Error::Unauthorized { status },
		429 | 500..=599 =>
			TransientError::Api { message, status: meta.status, retry_after: meta.retry_after }
				.into(),
		_ => Error::Api { status, message },
	}
}

/// Decodes a successful JSON body, reporting the offending path on mismatch.
pub fn parse_body<T>(endpoint: &'static str, meta: &ResponseMetadata, body: &[u8]) -> Result<T>
where
	T: for<'de> Deserialize<'de>,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de).map_err(|source| {
		Error::from(TransientError::ResponseParse { endpoint, source, status: meta.status })
	})
}

fn backend_message(body: &[u8]) -> Option<String> {
	if body.is_empty() {
		return None;
	}

	match serde_json::from_slice::<ErrorBody>(body) {
		Ok(parsed) => parsed.message.or(parsed.error).filter(|m| !m.trim().is_empty()),
		Err(_) => {
			let text = String::from_utf8_lossy(body);
			let trimmed = text.trim();

			if trimmed.is_empty() {
				None
			} else {
				Some(trimmed.chars().take(BODY_PREVIEW_LIMIT).collect())
			}
		},
	}
}

#[cfg(feature = "reqwest")]
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
