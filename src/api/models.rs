//! Backend records exchanged with the seller:alert REST API.

// self
use crate::_prelude::*;
pub use crate::token::{ScopeRecord, ScopeRequirement, ScopeValue};

/// Paging window echoed by list endpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
	/// Index of the first returned item.
	pub offset: u64,
	/// Requested page size.
	pub limit: u64,
	/// Total number of matching items.
	pub total: u64,
}

/// Envelope returned by list endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
	/// Items in the current page.
	pub data: Vec<T>,
	/// Paging window, when the endpoint reports one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pagination: Option<Pagination>,
}

/// Product surfaces a supplier account is wired into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consumer {
	/// Automatic spreadsheets.
	AutoTables,
	/// Automatic "jam" analytics.
	AutoJam,
	/// Web dashboard.
	Dashboard,
	/// Consumer this client does not know yet.
	#[serde(other)]
	Unknown,
}

/// User linked to a supplier account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierUser {
	/// Backend user identifier.
	pub id: i64,
}

/// Connected marketplace supplier account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
	/// Marketplace supplier identifier (the token's `sid`).
	pub supplier_id: String,
	/// Display name.
	pub name: String,
	/// Surfaces consuming this account.
	#[serde(default)]
	pub consumers: Vec<Consumer>,
	/// Whether a live marketplace token is attached.
	#[serde(default)]
	pub active_token: bool,
	/// Users with access.
	#[serde(default)]
	pub users: Vec<SupplierUser>,
}

/// Headline metrics for one dashboard period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardValueData {
	/// Orders total in roubles.
	pub orders_sum: f64,
	/// Advertising cost share (fraction).
	pub drr: f64,
	/// Click-through rate (fraction).
	pub ctr: f64,
	/// Cost per click in roubles.
	pub cpc: f64,
}

/// Per-product statistics row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
	/// Seller's article code.
	pub vendor_code: String,
	/// Orders total in roubles.
	pub orders_sum: f64,
	/// Number of orders.
	pub orders_count: u64,
	/// Advertising cost share (fraction).
	pub drr: f64,
	/// Click-through rate (fraction).
	pub ctr: f64,
	/// Cost per click in roubles.
	pub cpc: f64,
	/// Marketplace nomenclature id.
	#[serde(default)]
	pub nm_id: Option<i64>,
}

/// Dashboard snapshot for a supplier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
	/// Snapshot time as sent by the backend (ISO 8601).
	pub time: String,
	/// Supplier the snapshot belongs to.
	pub supplier: Supplier,
	/// Metrics for the current period.
	pub current_data: DashboardValueData,
	/// Metrics for the previous period.
	#[serde(default)]
	pub old_data: Option<DashboardValueData>,
	/// Per-product rows.
	#[serde(default)]
	pub stats: Option<Vec<DashboardStats>>,
}
impl Dashboard {
	/// Parses [`time`](Self::time) as RFC 3339, if it is one.
	pub fn timestamp(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::parse(&self.time, &time::format_description::well_known::Rfc3339).ok()
	}
}

/// Response of `POST /tokens`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCreated {
	/// Identifier of the stored token.
	pub token_id: i64,
}

/// Response of `POST /auth/telegram/login`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramLogin {
	/// Authenticated user.
	pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScopesEnvelope {
	pub(crate) data: Vec<ScopeRecord>,
}
