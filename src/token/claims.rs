//! Compact-token payload extraction into a typed, default-tolerant claims structure.

// crates.io
use base64::{
	Engine as _,
	alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, token::ScopeMask};

// Standard alphabet after the url-safe characters are translated; padding is optional.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
	&alphabet::STANDARD,
	GeneralPurposeConfig::new()
		.with_decode_padding_mode(DecodePaddingMode::Indifferent)
		.with_decode_allow_trailing_bits(true),
);

/// Structural failures: the token could not be read at all.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Token has no payload segment.
	#[error("Token must contain a payload segment; found {segments} segment(s).")]
	MissingPayload {
		/// Number of dot-separated segments found.
		segments: usize,
	},
	/// Payload segment is not valid base64url.
	#[error("Token payload is not valid base64url.")]
	Base64(#[source] base64::DecodeError),
	/// Payload bytes are not valid JSON.
	#[error("Token payload is not valid JSON.")]
	Json(#[source] serde_json::Error),
	/// Payload is valid JSON but not an object.
	#[error("Token payload must be a JSON object.")]
	NotAnObject,
}

/// Claims this client reads from a token payload.
///
/// Missing or wrong-typed claims fall back to defaults: no supplier, expiry at the epoch
/// (already expired), and an empty scope mask.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Claims {
	/// `sid` claim: supplier identifier.
	pub supplier_id: Option<String>,
	/// `exp` claim: expiry in seconds since the Unix epoch.
	pub exp: i64,
	/// `s` claim: permission bitmask.
	pub scopes_mask: ScopeMask,
}
impl Claims {
	/// Reads the payload segment of a compact token.
	pub fn from_compact(token: &str) -> Result<Self, DecodeError> {
		let segment = payload_segment(token)?;
		let bytes = decode_segment(segment)?;
		let value = serde_json::from_slice::<Value>(&bytes).map_err(DecodeError::Json)?;

		match value {
			Value::Object(object) => Ok(Self::from_object(&object)),
			_ => Err(DecodeError::NotAnObject),
		}
	}

	/// Extracts claims from an already-parsed payload object.
	pub fn from_object(object: &Map<String, Value>) -> Self {
		Self {
			supplier_id: object.get("sid").and_then(read_supplier_id),
			exp: object.get("exp").and_then(read_exp).unwrap_or(0),
			scopes_mask: ScopeMask(object.get("s").and_then(read_mask).unwrap_or(0)),
		}
	}
}

fn payload_segment(token: &str) -> Result<&str, DecodeError> {
	let mut segments = token.split('.');
	let _header = segments.next();

	match segments.next() {
		Some(payload) => Ok(payload),
		None => Err(DecodeError::MissingPayload { segments: 1 }),
	}
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, DecodeError> {
	let translated: String = segment
		.chars()
		.map(|c| match c {
			'-' => '+',
			'_' => '/',
			other => other,
		})
		.collect();

	PAYLOAD_ENGINE.decode(translated).map_err(DecodeError::Base64)
}

fn read_supplier_id(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

fn read_exp(value: &Value) -> Option<i64> {
	let Value::Number(number) = value else {
		return None;
	};

	// Out-of-range values saturate at the i64 bounds.
	number.as_i64().or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64))
}

// Non-negative integers are kept as is. Anything else is truncated toward zero and wrapped
// to its low 32 bits, so `3.5` reads as `3` and `-1` sets bits 1..=32.
fn read_mask(value: &Value) -> Option<u64> {
	const WRAP: f64 = 4_294_967_296.;

	let Value::Number(number) = value else {
		return None;
	};

	if let Some(mask) = number.as_u64() {
		return Some(mask);
	}
	if let Some(signed) = number.as_i64() {
		return Some(u64::from(signed as u32));
	}

	number.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc().rem_euclid(WRAP) as u64)
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::engine::general_purpose::URL_SAFE_NO_PAD;
	use serde_json::json;
	// self
	use super::*;

	fn token_with(payload: &str) -> String {
		format!("header.{}.signature", URL_SAFE_NO_PAD.encode(payload))
	}

	#[test]
	fn reads_present_claims() {
		let claims = Claims::from_compact(&token_with(r#"{"sid":"123","exp":1700000000,"s":33}"#))
			.expect("Well-formed payload should decode.");

		assert_eq!(claims.supplier_id.as_deref(), Some("123"));
		assert_eq!(claims.exp, 1_700_000_000);
		assert_eq!(claims.scopes_mask, ScopeMask(33));
	}

	#[test]
	fn absent_claims_fall_back_to_defaults() {
		let claims =
			Claims::from_compact(&token_with("{}")).expect("Empty object should decode.");

		assert_eq!(claims, Claims::default());

		let claims = Claims::from_compact(&token_with(r#"{"sid":null,"exp":"soon","s":[1]}"#))
			.expect("Wrong-typed claims should not fail decoding.");

		assert_eq!(claims, Claims::default());
	}

	#[test]
	fn numeric_supplier_and_fractional_expiry_are_tolerated() {
		let object = json!({ "sid": 42, "exp": 1700000000.9, "s": 2.0 });
		let claims = Claims::from_object(object.as_object().expect("Fixture is an object."));

		assert_eq!(claims.supplier_id.as_deref(), Some("42"));
		assert_eq!(claims.exp, 1_700_000_000);
		assert_eq!(claims.scopes_mask, ScopeMask(2));
	}

	#[test]
	fn fractional_and_negative_masks_wrap_to_thirty_two_bits() {
		let read = |s: Value| {
			let object = json!({ "s": s });

			Claims::from_object(object.as_object().expect("Fixture is an object.")).scopes_mask
		};

		assert_eq!(read(json!(3.5)), ScopeMask(3));
		assert_eq!(read(json!(-1)), ScopeMask(0xFFFF_FFFF));
		assert_eq!(read(json!(-1.9)), ScopeMask(0xFFFF_FFFF));
		assert_eq!(read(json!(-2)), ScopeMask(0xFFFF_FFFE));
		assert_eq!(read(json!(0.4)), ScopeMask(0));
		assert!(read(json!(-1)).contains(30));
		assert!(!read(json!(-2)).contains(1));
	}

	#[test]
	fn accepts_padded_and_url_safe_payloads() {
		// `{"sid":"??>"}` encodes with an `_` character and trailing padding.
		let payload = r#"{"sid":"??>"}"#;
		let url_safe = base64::engine::general_purpose::URL_SAFE.encode(payload);

		assert!(url_safe.ends_with('='));
		assert!(url_safe.contains('_') || url_safe.contains('-'));

		let claims = Claims::from_compact(&format!("h.{url_safe}"))
			.expect("Padded url-safe payload should decode.");

		assert_eq!(claims.supplier_id.as_deref(), Some("??>"));
	}

	#[test]
	fn structural_failures_are_reported() {
		assert!(matches!(
			Claims::from_compact("no-dots-here"),
			Err(DecodeError::MissingPayload { segments: 1 })
		));
		assert!(matches!(Claims::from_compact(""), Err(DecodeError::MissingPayload { .. })));
		assert!(matches!(Claims::from_compact("h.!!!.s"), Err(DecodeError::Base64(_))));
		assert!(matches!(Claims::from_compact(&token_with("not json")), Err(DecodeError::Json(_))));
		assert!(matches!(Claims::from_compact("h."), Err(DecodeError::Json(_))));
		assert!(matches!(Claims::from_compact(&token_with("[1,2]")), Err(DecodeError::NotAnObject)));
	}
}
