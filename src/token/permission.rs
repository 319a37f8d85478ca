//! Fixed permission table, bitmask helpers, and the allow-list built from backend scopes.

// std
use std::{borrow::Cow, collections::btree_set};
// self
use crate::_prelude::*;

/// Permission granted by a marketplace token, encoded as a 1-based bit in the `s` claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
	/// Product cards and media.
	Content,
	/// Sales funnel analytics.
	ContentAnalytics,
	/// Price and discount management.
	DiscountAndPrices,
	/// Marketplace (seller-fulfilled) orders.
	Marketplace,
	/// Sales and stock statistics.
	Statistics,
	/// Advertising campaigns.
	Advert,
	/// Buyer questions and feedback.
	QuestionsAndFeedback,
	/// Product recommendations.
	Recommendations,
	/// Chat with buyers.
	BuyerChat,
	/// Warehouse supplies.
	Supplies,
	/// Buyer returns.
	Returns,
	/// Seller documents.
	Documents,
	/// Token cannot be used for mutating calls.
	ReadOnly,
}
impl Permission {
	/// Every known permission in ascending bit order.
	pub const ALL: [Permission; 13] = [
		Permission::Content,
		Permission::ContentAnalytics,
		Permission::DiscountAndPrices,
		Permission::Marketplace,
		Permission::Statistics,
		Permission::Advert,
		Permission::QuestionsAndFeedback,
		Permission::Recommendations,
		Permission::BuyerChat,
		Permission::Supplies,
		Permission::Returns,
		Permission::Documents,
		Permission::ReadOnly,
	];
	/// Highest bit position the backend is expected to reference.
	pub const MAX_POSITION: u8 = 30;

	/// 1-based bit position inside the scope mask.
	pub const fn position(self) -> u8 {
		match self {
			Permission::Content => 1,
			Permission::ContentAnalytics => 2,
			Permission::DiscountAndPrices => 3,
			Permission::Marketplace => 4,
			Permission::Statistics => 5,
			Permission::Advert => 6,
			Permission::QuestionsAndFeedback => 7,
			Permission::Recommendations => 8,
			Permission::BuyerChat => 9,
			Permission::Supplies => 10,
			Permission::Returns => 11,
			Permission::Documents => 12,
			Permission::ReadOnly => 30,
		}
	}

	/// Human-readable label used in decoded output.
	pub const fn as_str(self) -> &'static str {
		match self {
			Permission::Content => "CONTENT",
			Permission::ContentAnalytics => "CONTENT_ANALYTICS",
			Permission::DiscountAndPrices => "DISCOUNT_AND_PRICES",
			Permission::Marketplace => "MARKETPLACE",
			Permission::Statistics => "STATISTICS",
			Permission::Advert => "ADVERT",
			Permission::QuestionsAndFeedback => "QUESTIONS_AND_FEEDBACK",
			Permission::Recommendations => "RECOMMENDATIONS",
			Permission::BuyerChat => "BUYER_CHAT",
			Permission::Supplies => "SUPPLIES",
			Permission::Returns => "RETURNS",
			Permission::Documents => "DOCUMENTS",
			Permission::ReadOnly => "READ_ONLY",
		}
	}

	/// Identifier the backend uses in `/tokens/scopes` records.
	pub const fn backend_value(self) -> &'static str {
		match self {
			Permission::Content => "content",
			Permission::ContentAnalytics => "contentanalytics",
			Permission::DiscountAndPrices => "discountsandprices",
			Permission::Marketplace => "marketplace",
			Permission::Statistics => "statistics",
			Permission::Advert => "advert",
			Permission::QuestionsAndFeedback => "questionsandfeedback",
			Permission::Recommendations => "recommendations",
			Permission::BuyerChat => "buyerchat",
			Permission::Supplies => "supplies",
			Permission::Returns => "returns",
			Permission::Documents => "documents",
			Permission::ReadOnly => "read-only",
		}
	}

	/// Single-bit mask for this permission.
	pub const fn bit(self) -> u64 {
		1 << (self.position() - 1)
	}

	/// Looks up the permission occupying `position`.
	pub fn from_position(position: u8) -> Option<Self> {
		Self::ALL.into_iter().find(|p| p.position() == position)
	}

	/// Looks up the permission named `value` by the backend.
	pub fn from_backend_value(value: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|p| p.backend_value() == value)
	}
}
impl Display for Permission {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Resolves a bit position to its label, falling back to `UNKNOWN_<position>`.
pub fn scope_name(position: u8) -> Cow<'static, str> {
	match Permission::from_position(position) {
		Some(permission) => Cow::Borrowed(permission.as_str()),
		None => Cow::Owned(format!("UNKNOWN_{position}")),
	}
}

/// Raw permission bitmask carried in the token's `s` claim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeMask(pub u64);
impl ScopeMask {
	/// Returns true if bit `position` (1-based) is set.
	pub const fn contains(self, position: u8) -> bool {
		if position == 0 || position > 64 {
			return false;
		}

		self.0 & (1 << (position - 1)) != 0
	}

	/// Known positions set in the mask, ascending.
	pub fn positions(self) -> Vec<u8> {
		Permission::ALL.into_iter().map(Permission::position).filter(|p| self.contains(*p)).collect()
	}

	/// Returns true if the read-only bit is set.
	pub const fn is_read_only(self) -> bool {
		self.contains(Permission::ReadOnly.position())
	}
}
impl FromIterator<Permission> for ScopeMask {
	fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
		Self(iter.into_iter().fold(0, |mask, p| mask | p.bit()))
	}
}

/// Whether the backend requires or merely tolerates a scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeRequirement {
	/// Scope must be granted for the token to be usable.
	Required,
	/// Scope may be granted.
	Optional,
	/// Requirement label this client does not understand.
	#[serde(other)]
	Unrecognized,
}

/// Scope identifier as sent by the backend, either a name or a bare bit position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopeValue {
	/// Bit position, e.g. `5`.
	Position(u32),
	/// Backend name, e.g. `"statistics"`.
	Name(String),
}
impl ScopeValue {
	/// Resolves the value to a bit position, if it names one.
	pub fn position(&self) -> Option<u8> {
		match self {
			ScopeValue::Position(raw) => u8::try_from(*raw)
				.ok()
				.filter(|position| (1..=Permission::MAX_POSITION).contains(position)),
			ScopeValue::Name(name) => Permission::from_backend_value(name).map(Permission::position),
		}
	}
}

/// Scope record returned by `GET /tokens/scopes`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRecord {
	/// Display name, when the backend provides one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Scope identifier.
	pub value: ScopeValue,
	/// Requirement level.
	#[serde(rename = "type")]
	pub requirement: ScopeRequirement,
}

/// Ordered set of bit positions a token may carry and still be usable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList(BTreeSet<u8>);
impl AllowList {
	/// Builds an allow-list from raw positions.
	pub fn new<I>(positions: I) -> Self
	where
		I: IntoIterator<Item = u8>,
	{
		Self(positions.into_iter().collect())
	}

	/// Keeps `REQUIRED` records and maps their values to bit positions, dropping
	/// values that name no known permission.
	pub fn from_scope_records<'a, I>(records: I) -> Self
	where
		I: IntoIterator<Item = &'a ScopeRecord>,
	{
		records
			.into_iter()
			.filter(|record| record.requirement == ScopeRequirement::Required)
			.filter_map(|record| record.value.position())
			.collect()
	}

	/// Number of allowed positions.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if nothing is allowed.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if `position` is allowed.
	pub fn contains(&self, position: u8) -> bool {
		self.0.contains(&position)
	}

	/// Returns true when every position in `positions` is allowed.
	pub fn permits(&self, positions: &[u8]) -> bool {
		positions.iter().all(|p| self.contains(*p))
	}

	/// Positions from `positions` that fall outside the allow-list, in input order.
	pub fn disallowed(&self, positions: &[u8]) -> Vec<u8> {
		positions.iter().copied().filter(|p| !self.contains(*p)).collect()
	}

	/// Iterator over allowed positions, ascending.
	pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
		self.0.iter().copied()
	}
}
impl FromIterator<u8> for AllowList {
	fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
		Self::new(iter)
	}
}
impl FromIterator<Permission> for AllowList {
	fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
		Self::new(iter.into_iter().map(Permission::position))
	}
}
impl<'a> IntoIterator for &'a AllowList {
	type IntoIter = std::iter::Copied<btree_set::Iter<'a, u8>>;
	type Item = u8;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter().copied()
	}
}
impl Display for AllowList {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		for (idx, position) in self.0.iter().enumerate() {
			if idx > 0 {
				f.write_str(",")?;
			}

			write!(f, "{position}")?;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn table_positions_and_names_line_up() {
		for permission in Permission::ALL {
			assert_eq!(Permission::from_position(permission.position()), Some(permission));
			assert_eq!(Permission::from_backend_value(permission.backend_value()), Some(permission));
			assert_eq!(scope_name(permission.position()), permission.as_str());
		}

		assert_eq!(Permission::ReadOnly.position(), 30);
		assert_eq!(Permission::Advert.bit(), 0b100000);
		assert_eq!(scope_name(13), "UNKNOWN_13");
		assert!(Permission::from_backend_value("Content").is_none());
	}

	#[test]
	fn mask_positions_only_report_known_bits() {
		// Bits 1, 6, 13 and 30; 13 is outside the table.
		let mask = ScopeMask(0b100001 | (1 << 12) | (1 << 29));

		assert_eq!(mask.positions(), vec![1, 6, 30]);
		assert!(mask.contains(13));
		assert!(mask.is_read_only());
		assert!(!ScopeMask(0).contains(0));
		assert!(!ScopeMask(u64::MAX).contains(65));
	}

	#[test]
	fn mask_collects_from_permissions() {
		let mask: ScopeMask = [Permission::Content, Permission::Advert].into_iter().collect();

		assert_eq!(mask, ScopeMask(33));
	}

	#[test]
	fn allow_list_keeps_required_known_scopes() {
		let records: Vec<ScopeRecord> = serde_json::from_str(
			r#"[
				{"name":"Content","value":"content","type":"REQUIRED"},
				{"name":"Advert","value":"advert","type":"REQUIRED"},
				{"name":"Chat","value":"buyerchat","type":"OPTIONAL"},
				{"name":"Mystery","value":"teleport","type":"REQUIRED"},
				{"value":30,"type":"REQUIRED"},
				{"value":99,"type":"REQUIRED"},
				{"value":"returns","type":"DEPRECATED"}
			]"#,
		)
		.expect("Scope records should deserialize.");
		let allowed = AllowList::from_scope_records(&records);

		assert_eq!(allowed.iter().collect::<Vec<_>>(), vec![1, 6, 30]);
		assert_eq!(records[6].requirement, ScopeRequirement::Unrecognized);
		assert_eq!(allowed.to_string(), "1,6,30");
	}

	#[test]
	fn allow_list_reports_disallowed_positions() {
		let allowed = AllowList::new([1, 6]);

		assert!(allowed.permits(&[]));
		assert!(allowed.permits(&[6, 1]));
		assert!(!allowed.permits(&[1, 4]));
		assert_eq!(allowed.disallowed(&[1, 4, 6, 30]), vec![4, 30]);
	}
}
