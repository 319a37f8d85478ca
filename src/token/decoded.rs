//! Decoded token value object and the decode entry points.

// self
use crate::{
	_prelude::*,
	token::{AllowList, Claims, DecodeError, Permission, ScopeMask, scope_name},
};

// Bounds of what RFC 3339 can express (years 0000 through 9999).
const MIN_EXPIRY_SECS: i64 = -62_167_219_200;
const MAX_EXPIRY_SECS: i64 = 253_402_300_799;

/// Reads `token` against `allowed` using the current UTC clock.
///
/// Structural problems (no payload segment, bad base64, bad JSON) are errors. An expired
/// token or one carrying scopes outside `allowed` still decodes; inspect
/// [`DecodedToken::is_valid_for_our_use`] or [`DecodedToken::rejection`].
pub fn decode(token: &str, allowed: &AllowList) -> Result<DecodedToken, DecodeError> {
	decode_at(token, allowed, OffsetDateTime::now_utc())
}

/// Same as [`decode`] with an explicit clock.
pub fn decode_at(
	token: &str,
	allowed: &AllowList,
	now: OffsetDateTime,
) -> Result<DecodedToken, DecodeError> {
	Claims::from_compact(token).map(|claims| DecodedToken::from_claims(claims, allowed, now))
}

/// Why a readable token cannot be used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum Rejection {
	/// The `exp` instant has passed.
	Expired,
	/// The token grants positions the allow-list does not accept.
	ScopesNotAllowed {
		/// Offending bit positions, ascending.
		disallowed: Vec<u8>,
	},
}
impl Display for Rejection {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Rejection::Expired => f.write_str("token has expired"),
			Rejection::ScopesNotAllowed { disallowed } => {
				f.write_str("token carries scopes outside the allow-list: ")?;

				for (idx, position) in disallowed.iter().enumerate() {
					if idx > 0 {
						f.write_str(", ")?;
					}

					f.write_str(&scope_name(*position))?;
				}

				Ok(())
			},
		}
	}
}

/// Access flags shown to the user once a token is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSummary {
	/// Content analytics.
	pub analytics: bool,
	/// Questions and feedback.
	pub reviews: bool,
	/// Advertising.
	pub promotion: bool,
	/// Product content.
	pub content: bool,
	/// Statistics.
	pub statistics: bool,
	/// Token is not read-only.
	pub editing: bool,
}

/// Verdict produced by a single decode call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedToken {
	/// `sid` claim.
	pub supplier_id: Option<String>,
	/// `exp` claim in seconds; 0 when absent.
	pub exp: i64,
	/// `exp` as an instant, clamped to years 0000 through 9999.
	#[serde(with = "time::serde::rfc3339")]
	pub expired_at: OffsetDateTime,
	/// `exp` is at or before the decode instant.
	pub expired: bool,
	/// `s` claim; 0 when absent.
	pub scopes_mask: ScopeMask,
	/// Known positions set in the mask, ascending.
	pub scopes: Vec<u8>,
	/// Labels for [`scopes`](Self::scopes), index-aligned.
	pub scopes_named: Vec<String>,
	/// Read-only bit (30) is set.
	pub read_only: bool,
	/// Every position in [`scopes`](Self::scopes) is in the allow-list.
	pub scopes_allowed_only: bool,
	/// Positions from [`scopes`](Self::scopes) outside the allow-list.
	#[serde(default)]
	pub disallowed_scopes: Vec<u8>,
	/// `!expired && scopes_allowed_only`.
	pub is_valid_for_our_use: bool,
}
impl DecodedToken {
	/// Evaluates already-extracted claims.
	pub fn from_claims(claims: Claims, allowed: &AllowList, now: OffsetDateTime) -> Self {
		let Claims { supplier_id, exp, scopes_mask } = claims;
		let scopes = scopes_mask.positions();
		let scopes_named = scopes.iter().map(|p| scope_name(*p).into_owned()).collect();
		let expired = exp <= now.unix_timestamp();
		let disallowed_scopes = allowed.disallowed(&scopes);
		let scopes_allowed_only = disallowed_scopes.is_empty();

		Self {
			supplier_id,
			exp,
			expired_at: expiry_instant(exp),
			expired,
			scopes_mask,
			scopes,
			scopes_named,
			read_only: scopes_mask.is_read_only(),
			scopes_allowed_only,
			disallowed_scopes,
			is_valid_for_our_use: !expired && scopes_allowed_only,
		}
	}

	/// Returns true if the token would be expired at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.exp <= instant.unix_timestamp()
	}

	/// Returns true if `permission` was found in the mask.
	pub fn has(&self, permission: Permission) -> bool {
		self.scopes.contains(&permission.position())
	}

	/// Explains why the token is unusable; `None` when it is usable. Expiry wins over
	/// scope problems.
	pub fn rejection(&self) -> Option<Rejection> {
		if self.expired {
			return Some(Rejection::Expired);
		}
		if !self.scopes_allowed_only {
			return Some(Rejection::ScopesNotAllowed { disallowed: self.disallowed_scopes.clone() });
		}

		None
	}

	/// Access flags for the accepted-token summary.
	pub fn access(&self) -> AccessSummary {
		AccessSummary {
			analytics: self.has(Permission::ContentAnalytics),
			reviews: self.has(Permission::QuestionsAndFeedback),
			promotion: self.has(Permission::Advert),
			content: self.has(Permission::Content),
			statistics: self.has(Permission::Statistics),
			editing: !self.read_only,
		}
	}
}

fn expiry_instant(exp: i64) -> OffsetDateTime {
	OffsetDateTime::from_unix_timestamp(exp.clamp(MIN_EXPIRY_SECS, MAX_EXPIRY_SECS))
		.unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	use serde_json::json;
	use time::macros;
	// self
	use super::*;

	const NOW: OffsetDateTime = macros::datetime!(2025-06-01 12:00 UTC);

	fn token(payload: serde_json::Value) -> String {
		format!("eyJhbGciOiJFUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(payload.to_string()))
	}

	fn in_an_hour() -> i64 {
		(NOW + Duration::hours(1)).unix_timestamp()
	}

	#[test]
	fn usable_token_resolves_named_scopes() {
		let raw = token(json!({ "sid": "123", "exp": in_an_hour(), "s": 0b100001 }));
		let decoded = decode_at(&raw, &AllowList::new([1, 6]), NOW)
			.expect("Well-formed token should decode.");

		assert_eq!(decoded.supplier_id.as_deref(), Some("123"));
		assert!(!decoded.expired);
		assert_eq!(decoded.scopes, vec![1, 6]);
		assert_eq!(decoded.scopes_named, vec!["CONTENT", "ADVERT"]);
		assert!(!decoded.read_only);
		assert!(decoded.scopes_allowed_only);
		assert!(decoded.is_valid_for_our_use);
		assert_eq!(decoded.rejection(), None);
		assert_eq!(decoded.expired_at, NOW + Duration::hours(1));
	}

	#[test]
	fn past_expiry_rejects_token() {
		let past = (NOW - Duration::minutes(5)).unix_timestamp();
		let raw = token(json!({ "sid": "123", "exp": past, "s": 0b100001 }));
		let decoded =
			decode_at(&raw, &AllowList::new([1, 6]), NOW).expect("Expired token still decodes.");

		assert!(decoded.expired);
		assert!(!decoded.is_valid_for_our_use);
		assert_eq!(decoded.rejection(), Some(Rejection::Expired));
	}

	#[test]
	fn expiry_boundary_counts_as_expired() {
		let raw = token(json!({ "exp": NOW.unix_timestamp() }));
		let decoded = decode_at(&raw, &AllowList::default(), NOW)
			.expect("Boundary token should decode.");

		assert!(decoded.expired);
		assert!(!decoded.is_expired_at(NOW - Duration::seconds(1)));
	}

	#[test]
	fn scopes_outside_allow_list_reject_token() {
		let raw = token(json!({ "exp": in_an_hour(), "s": 0b1001 }));
		let decoded = decode_at(&raw, &AllowList::new([1, 6]), NOW)
			.expect("Token with extra scopes still decodes.");

		assert!(!decoded.scopes_allowed_only);
		assert!(!decoded.is_valid_for_our_use);
		assert_eq!(decoded.disallowed_scopes, vec![4]);
		assert_eq!(
			decoded.rejection(),
			Some(Rejection::ScopesNotAllowed { disallowed: vec![4] })
		);
		assert_eq!(
			decoded.rejection().map(|r| r.to_string()).as_deref(),
			Some("token carries scopes outside the allow-list: MARKETPLACE")
		);
	}

	#[test]
	fn expiry_takes_precedence_over_scopes() {
		let raw = token(json!({ "exp": 1, "s": 0b1000 }));
		let decoded =
			decode_at(&raw, &AllowList::new([1]), NOW).expect("Token should decode.");

		assert_eq!(decoded.rejection(), Some(Rejection::Expired));
	}

	#[test]
	fn read_only_bit_is_reported() {
		let raw = token(json!({ "exp": in_an_hour(), "s": 1u64 << 29 }));
		let decoded =
			decode_at(&raw, &AllowList::new([30]), NOW).expect("Read-only token should decode.");

		assert!(decoded.read_only);
		assert_eq!(decoded.scopes_named, vec!["READ_ONLY"]);
		assert!(!decoded.access().editing);
	}

	#[test]
	fn missing_claims_default_and_expire() {
		let decoded = decode_at(&token(json!({})), &AllowList::default(), NOW)
			.expect("Empty payload should decode.");

		assert_eq!(decoded.supplier_id, None);
		assert_eq!(decoded.exp, 0);
		assert_eq!(decoded.expired_at, OffsetDateTime::UNIX_EPOCH);
		assert_eq!(decoded.scopes_mask, ScopeMask(0));
		assert!(decoded.scopes.is_empty());
		assert!(decoded.scopes_allowed_only, "No scopes is vacuously allowed.");
		assert!(decoded.expired);
		assert!(!decoded.is_valid_for_our_use);
	}

	#[test]
	fn structural_failures_surface_as_errors() {
		assert!(matches!(
			decode_at("single-segment", &AllowList::default(), NOW),
			Err(DecodeError::MissingPayload { .. })
		));
		assert!(matches!(
			decode_at("h.%%%%.s", &AllowList::default(), NOW),
			Err(DecodeError::Base64(_))
		));
	}

	#[test]
	fn mask_bits_match_scope_membership() {
		for mask in [0_u64, 1, 0b1010_1010_1010, 0xFFF, 1 << 29, (1 << 30) - 1, u32::MAX as u64] {
			let raw = token(json!({ "exp": in_an_hour(), "s": mask }));
			let decoded = decode_at(&raw, &AllowList::default(), NOW)
				.expect("Mask fixture should decode.");

			assert_eq!(decoded.scopes_mask, ScopeMask(mask));

			for permission in Permission::ALL {
				let p = permission.position();

				assert_eq!(decoded.scopes.contains(&p), (mask >> (p - 1)) & 1 == 1);
			}

			assert_eq!(decoded.scopes.len(), decoded.scopes_named.len());

			for (position, name) in decoded.scopes.iter().zip(&decoded.scopes_named) {
				assert_eq!(scope_name(*position), name.as_str());
			}
		}
	}

	#[test]
	fn widening_allow_list_never_revokes_validity() {
		let raw = token(json!({ "exp": in_an_hour(), "s": 0b100001 }));
		let narrow = AllowList::new([1, 6]);
		let wide = AllowList::new([1, 2, 5, 6, 30]);
		let first = decode_at(&raw, &narrow, NOW).expect("Token should decode.");
		let second = decode_at(&raw, &wide, NOW).expect("Token should decode.");

		assert!(first.is_valid_for_our_use);
		assert!(second.is_valid_for_our_use);
		assert_eq!(first, decode_at(&raw, &narrow, NOW).expect("Token should decode."));
	}

	#[test]
	fn far_future_expiry_is_clamped() {
		let decoded = decode_at(&token(json!({ "exp": i64::MAX })), &AllowList::default(), NOW)
			.expect("Huge expiry should decode.");

		assert_eq!(decoded.expired_at, macros::datetime!(9999-12-31 23:59:59 UTC));
		assert!(!decoded.expired);
	}

	#[test]
	fn expiry_beyond_i64_range_stays_in_the_future() {
		for exp in [json!(10_000_000_000_000_000_000_u64), json!(1e20)] {
			let decoded = decode_at(&token(json!({ "exp": exp })), &AllowList::default(), NOW)
				.expect("Out-of-range expiry should decode.");

			assert_eq!(decoded.exp, i64::MAX);
			assert!(!decoded.expired, "Expiry {exp} should not count as expired.");
			assert!(decoded.is_valid_for_our_use);
		}
	}

	#[test]
	fn serializes_with_camel_case_fields() {
		let raw = token(json!({ "sid": "s-1", "exp": in_an_hour(), "s": 5 }));
		let decoded = decode_at(&raw, &AllowList::new([1, 3]), NOW).expect("Token should decode.");
		let value = serde_json::to_value(&decoded).expect("Decoded token should serialize.");

		assert_eq!(value["supplierId"], "s-1");
		assert_eq!(value["scopesMask"], 5);
		assert_eq!(value["scopesNamed"], json!(["CONTENT", "DISCOUNT_AND_PRICES"]));
		assert_eq!(value["isValidForOurUse"], true);
		assert_eq!(value["expiredAt"], "2025-06-01T13:00:00Z");
	}

	#[test]
	fn access_summary_reflects_scopes() {
		let raw = token(json!({ "exp": in_an_hour(), "s": 0b111_0010 }));
		let access = decode_at(&raw, &AllowList::default(), NOW)
			.expect("Token should decode.")
			.access();

		assert_eq!(
			access,
			AccessSummary {
				analytics: true,
				reviews: true,
				promotion: true,
				content: false,
				statistics: true,
				editing: true,
			}
		);
	}
}
