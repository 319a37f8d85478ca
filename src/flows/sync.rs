//! Fixture sync: pull suppliers and dashboards from the backend into static JSON files.
//!
//! Each file holds the `data` array of one list response, pretty-printed with a trailing
//! newline. Files are replaced atomically through a sibling `.tmp` file so a reader never
//! observes a half-written fixture.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	api::{DashboardQuery, SellerApi, SupplierQuery},
	error::{ConfigError, FixtureError},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// File name the supplier list is written to.
pub const SUPPLIERS_FILE: &str = "people.json";

/// Page size used by both syncs.
pub const SYNC_LIMIT: u32 = 100;

/// Result of one sync run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncReport {
	/// Fixture that was written.
	pub path: PathBuf,
	/// Number of records written.
	pub count: usize,
}

/// File name for a supplier's dashboards.
///
/// The identifier must be non-blank and must stay a single path component.
pub fn dashboard_file_name(supplier_id: &str) -> Result<String, ConfigError> {
	if supplier_id.trim().is_empty() {
		return Err(ConfigError::MissingSupplierId);
	}
	if supplier_id.contains(['/', '\\']) || supplier_id.contains("..") {
		return Err(ConfigError::InvalidSupplierId { supplier_id: supplier_id.to_owned() });
	}

	Ok(format!("dashboard-{supplier_id}.json"))
}

/// Fetches the newest suppliers and writes them to `<dir>/people.json`.
pub async fn sync_suppliers<A>(api: &A, dir: impl AsRef<Path>) -> Result<SyncReport>
where
	A: ?Sized + SellerApi,
{
	const KIND: FlowKind = FlowKind::SyncSuppliers;

	let span = FlowSpan::new(KIND, "sync_suppliers");
	let path = dir.as_ref().join(SUPPLIERS_FILE);

	obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

	let result = span
		.instrument(async move {
			let query = SupplierQuery::default().limit(SYNC_LIMIT);
			let page = api.suppliers(&query).await?;

			write_fixture(&path, &page.data)?;

			Ok(SyncReport { path, count: page.data.len() })
		})
		.await;

	obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

	result
}

/// Fetches the newest dashboards of `supplier_id` and writes them to
/// `<dir>/dashboard-<supplier_id>.json`.
pub async fn sync_dashboards<A>(
	api: &A,
	supplier_id: &str,
	dir: impl AsRef<Path>,
) -> Result<SyncReport>
where
	A: ?Sized + SellerApi,
{
	const KIND: FlowKind = FlowKind::SyncDashboards;

	let span = FlowSpan::new(KIND, "sync_dashboards");
	let supplier_id = supplier_id.trim();
	let dir = dir.as_ref();

	obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

	let result = span
		.instrument(async move {
			let path = dir.join(dashboard_file_name(supplier_id)?);
			let query = DashboardQuery::for_supplier(supplier_id).limit(SYNC_LIMIT);
			let page = api.dashboards(&query).await?;

			write_fixture(&path, &page.data)?;

			Ok(SyncReport { path, count: page.data.len() })
		})
		.await;

	obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

	result
}

/// Serializes `value` as pretty JSON plus a trailing newline and atomically replaces
/// `path`, creating parent directories as needed.
pub fn write_fixture<T>(path: &Path, value: &T) -> Result<(), FixtureError>
where
	T: ?Sized + Serialize,
{
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent).map_err(io_error("create directory", parent))?;
	}

	let mut serialized = serde_json::to_vec_pretty(value)
		.map_err(|source| FixtureError::Serialize { path: path.display().to_string(), source })?;

	serialized.push(b'\n');

	let mut tmp_path = path.to_path_buf();

	tmp_path.set_extension("json.tmp");

	{
		let mut file = File::create(&tmp_path).map_err(io_error("create", &tmp_path))?;

		file.write_all(&serialized).map_err(io_error("write", &tmp_path))?;
		file.sync_all().map_err(io_error("sync", &tmp_path))?;
	}

	fs::rename(&tmp_path, path).map_err(io_error("replace", path))?;

	#[cfg(feature = "tracing")]
	tracing::info!(path = %path.display(), bytes = serialized.len(), "wrote fixture");

	Ok(())
}

fn io_error(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> FixtureError {
	let path = path.display().to_string();

	move |source| FixtureError::Io { action, path, source }
}
