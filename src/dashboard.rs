//! View models derived from dashboard snapshots.
//!
//! Both builders read only the newest snapshot (the first element, as returned by the
//! backend with `order=DESC`).

// self
use crate::{
	_prelude::*,
	api::{Dashboard, DashboardStats, DashboardValueData},
};

const NBSP: char = '\u{a0}';

/// Which headline metric a card shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardMetric {
	/// Orders total in roubles.
	Orders,
	/// Advertising cost share.
	Drr,
	/// Click-through rate.
	Ctr,
	/// Cost per click.
	Cpc,
}
impl CardMetric {
	/// Display order of the cards.
	pub const ALL: [CardMetric; 4] =
		[CardMetric::Orders, CardMetric::Drr, CardMetric::Ctr, CardMetric::Cpc];

	/// Card title as rendered in the dashboard.
	pub const fn title(self) -> &'static str {
		match self {
			CardMetric::Orders => "Заказы",
			CardMetric::Drr => "ДРР",
			CardMetric::Ctr => "CTR",
			CardMetric::Cpc => "CPC",
		}
	}

	/// Whether the card value is a percentage.
	pub const fn is_percentage(self) -> bool {
		matches!(self, CardMetric::Drr | CardMetric::Ctr)
	}

	fn read(self, data: &DashboardValueData) -> f64 {
		match self {
			CardMetric::Orders => data.orders_sum,
			CardMetric::Drr => data.drr,
			CardMetric::Ctr => data.ctr,
			CardMetric::Cpc => data.cpc,
		}
	}
}

/// Headline metric card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryCard {
	/// 1-based position.
	pub id: u8,
	/// Metric shown.
	pub metric: CardMetric,
	/// Card title.
	pub title: String,
	/// Current value; fractions are scaled to percent.
	pub value: f64,
	/// Relative change against the previous period, in percent.
	pub change: f64,
	/// `value` is a percentage.
	pub is_percentage: bool,
}

/// Formatted per-product table row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRow {
	/// Stable row key, `product-<nm_id>` or `product-<index>`.
	pub id: String,
	/// Vendor code.
	pub name: String,
	/// Number of orders.
	pub orders: u64,
	/// Orders total, e.g. `1 234 ₽`.
	pub orders_amount: String,
	/// DRR with one decimal, e.g. `12.5%`.
	pub drr: String,
	/// CTR with two decimals, e.g. `3.40%`.
	pub ctr: String,
	/// CPC with one decimal, e.g. `9.5 ₽`.
	pub cpc: String,
}

/// Builds the four headline cards from the newest snapshot; empty input yields no cards.
pub fn summary_cards(dashboards: &[Dashboard]) -> Vec<SummaryCard> {
	let Some(latest) = dashboards.first() else {
		return Vec::new();
	};
	let current = &latest.current_data;
	let old = latest.old_data.as_ref();

	CardMetric::ALL
		.into_iter()
		.zip(1..)
		.map(|(metric, id)| {
			let raw = metric.read(current);
			let value = if metric.is_percentage() { raw * 100. } else { raw };

			SummaryCard {
				id,
				metric,
				title: metric.title().into(),
				value,
				change: percent_change(raw, old.map(|data| metric.read(data))),
				is_percentage: metric.is_percentage(),
			}
		})
		.collect()
}

/// Builds table rows from the newest snapshot's stats.
pub fn product_rows(dashboards: &[Dashboard]) -> Vec<ProductRow> {
	let Some(stats) = dashboards.first().and_then(|latest| latest.stats.as_deref()) else {
		return Vec::new();
	};

	stats.iter().enumerate().map(|(index, stat)| product_row(index, stat)).collect()
}

/// `(current - old) / old * 100`, or 0 without a usable baseline.
pub fn percent_change(current: f64, old: Option<f64>) -> f64 {
	match old {
		Some(old) if old != 0. && old.is_finite() => (current - old) / old * 100.,
		_ => 0.,
	}
}

/// Formats a rouble amount with no decimals and non-breaking-space digit groups.
pub fn format_roubles(amount: f64) -> String {
	let rounded = amount.round();
	let digits = format!("{:.0}", rounded.abs());
	let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 4);

	if rounded < 0. {
		out.push('-');
	}

	for (idx, ch) in digits.chars().enumerate() {
		if idx > 0 && (digits.len() - idx) % 3 == 0 {
			out.push(NBSP);
		}

		out.push(ch);
	}

	out.push(NBSP);
	out.push('₽');

	out
}

fn product_row(index: usize, stat: &DashboardStats) -> ProductRow {
	// A zero `nm_id` is treated as missing.
	let key = match stat.nm_id {
		Some(nm_id) if nm_id != 0 => nm_id.to_string(),
		_ => index.to_string(),
	};

	ProductRow {
		id: format!("product-{key}"),
		name: stat.vendor_code.clone(),
		orders: stat.orders_count,
		orders_amount: format_roubles(stat.orders_sum),
		drr: format!("{:.1}%", stat.drr * 100.),
		ctr: format!("{:.2}%", stat.ctr * 100.),
		cpc: format!("{:.1} ₽", stat.cpc),
	}
}
