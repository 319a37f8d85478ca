//! Query parameters for the list endpoints.

// self
use crate::{_prelude::*, error::ConfigError};

/// Sort direction accepted by list endpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
	/// Oldest first.
	Asc,
	/// Newest first.
	#[default]
	Desc,
}
impl SortOrder {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			SortOrder::Asc => "ASC",
			SortOrder::Desc => "DESC",
		}
	}
}
impl Display for SortOrder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

const DEFAULT_SORT_BY: &str = "created_at";

/// Parameters for `GET /suppliers`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupplierQuery {
	/// Index of the first item.
	pub offset: u32,
	/// Page size.
	pub limit: u32,
	/// Sort column.
	pub sort_by: String,
	/// Sort direction.
	pub order: SortOrder,
}
impl SupplierQuery {
	/// Default page size.
	pub const DEFAULT_LIMIT: u32 = 100;

	/// Overrides the offset.
	pub fn offset(mut self, offset: u32) -> Self {
		self.offset = offset;

		self
	}

	/// Overrides the page size.
	pub fn limit(mut self, limit: u32) -> Self {
		self.limit = limit;

		self
	}

	/// Overrides the sort column.
	pub fn sort_by(mut self, column: impl Into<String>) -> Self {
		self.sort_by = column.into();

		self
	}

	/// Overrides the sort direction.
	pub fn order(mut self, order: SortOrder) -> Self {
		self.order = order;

		self
	}

	/// Encodes the query string pairs.
	pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
		vec![
			("offset", self.offset.to_string()),
			("limit", self.limit.to_string()),
			("sort_by", self.sort_by.clone()),
			("order", self.order.to_string()),
		]
	}
}
impl Default for SupplierQuery {
	fn default() -> Self {
		Self {
			offset: 0,
			limit: Self::DEFAULT_LIMIT,
			sort_by: DEFAULT_SORT_BY.into(),
			order: SortOrder::Desc,
		}
	}
}

/// Parameters for `GET /dashboards`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardQuery {
	/// Suppliers to include; at least one is required.
	pub supplier_ids: Vec<String>,
	/// Index of the first item.
	pub offset: u32,
	/// Page size.
	pub limit: u32,
	/// Sort column.
	pub sort_by: String,
	/// Sort direction.
	pub order: SortOrder,
}
impl DashboardQuery {
	/// Default page size.
	pub const DEFAULT_LIMIT: u32 = 10;

	/// Creates a query for a single supplier.
	pub fn for_supplier(supplier_id: impl Into<String>) -> Self {
		Self::default().supplier(supplier_id)
	}

	/// Adds a supplier to the filter.
	pub fn supplier(mut self, supplier_id: impl Into<String>) -> Self {
		self.supplier_ids.push(supplier_id.into());

		self
	}

	/// Overrides the offset.
	pub fn offset(mut self, offset: u32) -> Self {
		self.offset = offset;

		self
	}

	/// Overrides the page size.
	pub fn limit(mut self, limit: u32) -> Self {
		self.limit = limit;

		self
	}

	/// Overrides the sort column.
	pub fn sort_by(mut self, column: impl Into<String>) -> Self {
		self.sort_by = column.into();

		self
	}

	/// Overrides the sort direction.
	pub fn order(mut self, order: SortOrder) -> Self {
		self.order = order;

		self
	}

	/// Encodes the query string pairs; repeated `supplier_id` keys carry multiple suppliers.
	pub fn to_pairs(&self) -> Result<Vec<(&'static str, String)>, ConfigError> {
		let supplier_ids = self
			.supplier_ids
			.iter()
			.map(|id| id.trim())
			.filter(|id| !id.is_empty())
			.collect::<Vec<_>>();

		if supplier_ids.is_empty() {
			return Err(ConfigError::MissingSupplierId);
		}

		let mut pairs =
			supplier_ids.into_iter().map(|id| ("supplier_id", id.to_owned())).collect::<Vec<_>>();

		pairs.extend([
			("offset", self.offset.to_string()),
			("limit", self.limit.to_string()),
			("sort_by", self.sort_by.clone()),
			("order", self.order.to_string()),
		]);

		Ok(pairs)
	}
}
impl Default for DashboardQuery {
	fn default() -> Self {
		Self {
			supplier_ids: Vec::new(),
			offset: 0,
			limit: Self::DEFAULT_LIMIT,
			sort_by: DEFAULT_SORT_BY.into(),
			order: SortOrder::Desc,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn supplier_query_defaults_match_sync_window() {
		let pairs = SupplierQuery::default().to_pairs();

		assert_eq!(pairs, vec![
			("offset", "0".to_string()),
			("limit", "100".to_string()),
			("sort_by", "created_at".to_string()),
			("order", "DESC".to_string()),
		]);
	}

	#[test]
	fn dashboard_query_requires_supplier() {
		assert!(matches!(
			DashboardQuery::default().to_pairs(),
			Err(ConfigError::MissingSupplierId)
		));
		assert!(matches!(
			DashboardQuery::for_supplier("  ").to_pairs(),
			Err(ConfigError::MissingSupplierId)
		));

		let pairs = DashboardQuery::for_supplier("a")
			.supplier("b")
			.limit(100)
			.order(SortOrder::Asc)
			.to_pairs()
			.expect("Query with suppliers should encode.");

		assert_eq!(&pairs[..2], &[("supplier_id", "a".to_string()), ("supplier_id", "b".to_string())]);
		assert!(pairs.contains(&("limit", "100".to_string())));
		assert!(pairs.contains(&("order", "ASC".to_string())));
	}
}
