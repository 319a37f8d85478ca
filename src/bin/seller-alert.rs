//! Command-line companion for the seller:alert dashboard: inspect marketplace tokens,
//! connect them to an account, and refresh the static JSON fixtures.

// std
use std::{path::PathBuf, sync::Arc};
// crates.io
use clap::{Args, Parser, Subcommand};
use color_eyre::{
	Result,
	eyre::{WrapErr, eyre},
};
use tracing_subscriber::EnvFilter;
// self
use seller_alert::{
	api::ApiClient,
	config::{ClientConfig, ClientConfigBuilder},
	flows::{self, ConnectSession},
	time::Duration,
	token::{AllowList, TokenSecret},
	url::Url,
};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
	/// Backend base URL [env: SELLER_ALERT_BASE_URL].
	#[arg(long, global = true)]
	base_url: Option<Url>,
	/// Session cookie sent as `access_token` [env: ACCESS_TOKEN].
	#[arg(long, global = true)]
	access_token: Option<String>,
	/// Per-request timeout in seconds [env: SELLER_ALERT_TIMEOUT_SECS].
	#[arg(long, global = true)]
	timeout_secs: Option<i64>,
	/// Accept a plain `http` base URL.
	#[arg(long, global = true)]
	insecure_http: bool,
	/// Log filter, e.g. `info` or `seller_alert=debug`.
	#[arg(long, global = true, env = "RUST_LOG", default_value = "warn")]
	log: String,
	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Decode a marketplace token and print the verdict as JSON.
	Decode {
		/// Compact token as copied from the marketplace.
		token: String,
		/// Allowed bit position; repeat for several.
		#[arg(long = "allow", value_name = "POSITION")]
		allow: Vec<u8>,
		/// Take the allow-list from the backend instead of `--allow`.
		#[arg(long, conflicts_with = "allow")]
		fetch_scopes: bool,
	},
	/// Check a marketplace token and attach it to the signed-in account.
	Connect {
		/// Compact token as copied from the marketplace.
		token: String,
	},
	/// Refresh static JSON fixtures from the backend.
	Sync {
		#[command(subcommand)]
		target: SyncTarget,
	},
}

#[derive(Debug, Subcommand)]
enum SyncTarget {
	/// Write the supplier list to `people.json`.
	Suppliers(SyncOut),
	/// Write a supplier's dashboards to `dashboard-<ID>.json`.
	Dashboards {
		/// Supplier identifier.
		supplier_id: String,
		#[command(flatten)]
		out: SyncOut,
	},
}

#[derive(Debug, Args)]
struct SyncOut {
	/// Directory the fixture is written to.
	#[arg(long, default_value = "src/data")]
	out: PathBuf,
}

impl Cli {
	fn client_config(&self, require_session: bool) -> Result<ClientConfig> {
		// Flags take precedence over the environment.
		let mut builder = ClientConfigBuilder::from_env()
			.wrap_err("Invalid client configuration in the environment.")?
			.allow_insecure_http(self.insecure_http);

		if let Some(url) = self.base_url.clone() {
			builder = builder.base_url(url);
		}
		if let Some(secs) = self.timeout_secs {
			builder = builder.timeout(Duration::seconds(secs));
		}
		if let Some(token) = self.access_token.as_deref() {
			builder = builder.access_token(TokenSecret::new(token.trim()));
		}

		let config = builder.build().wrap_err("Invalid client configuration.")?;

		if require_session && config.access_token.is_none() {
			return Err(eyre!(
				"An access token is required; pass --access-token or set {}.",
				ClientConfig::ENV_ACCESS_TOKEN
			));
		}

		Ok(config)
	}

	fn api_client(&self, require_session: bool) -> Result<ApiClient> {
		Ok(ApiClient::new(self.client_config(require_session)?)?)
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let cli = Cli::parse();

	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_new(&cli.log).wrap_err("Invalid log filter.")?)
		.with_writer(std::io::stderr)
		.init();

	match &cli.command {
		Command::Decode { token, allow, fetch_scopes } => {
			let allow_list = if *fetch_scopes {
				ConnectSession::new(Arc::new(cli.api_client(false)?)).allow_list().await?
			} else {
				allow.iter().copied().collect::<AllowList>()
			};
			let decoded = seller_alert::token::decode(token.trim(), &allow_list)?;

			println!("{}", serde_json::to_string_pretty(&decoded)?);

			if let Some(rejection) = decoded.rejection() {
				eprintln!("Token is not usable: {rejection}.");
			}
		},
		Command::Connect { token } => {
			let session = ConnectSession::new(Arc::new(cli.api_client(true)?));
			let account = session.connect(token).await?;

			println!("{}", serde_json::to_string_pretty(&account)?);
		},
		Command::Sync { target: SyncTarget::Suppliers(SyncOut { out }) } => {
			let report = flows::sync_suppliers(&cli.api_client(true)?, out).await?;

			println!("Wrote {} suppliers to {}.", report.count, report.path.display());
		},
		Command::Sync { target: SyncTarget::Dashboards { supplier_id, out: SyncOut { out } } } => {
			let report = flows::sync_dashboards(&cli.api_client(true)?, supplier_id, out).await?;

			println!(
				"Wrote {} dashboards for supplier {supplier_id} to {}.",
				report.count,
				report.path.display()
			);
		},
	}

	Ok(())
}
