//! Typed client for the seller:alert REST backend.
//!
//! [`SellerApi`] is the only seam flows depend on, so tests and alternative transports
//! can stand in for the backend. [`ApiClient`] is the reqwest-backed implementation.

pub mod models;
pub mod query;

pub use models::*;
pub use query::*;

#[cfg(feature = "reqwest")] use reqwest::{RequestBuilder, header::COOKIE, redirect::Policy};
// self
use crate::{_prelude::*, token::TokenSecret};
#[cfg(feature = "reqwest")]
use crate::{
	config::ClientConfig,
	error::{ConfigError, TransportError},
	http::{self, ResponseMetadata},
};

/// Boxed future returned by [`SellerApi`] methods.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Backend operations used by the dashboard flows.
pub trait SellerApi
where
	Self: Send + Sync,
{
	/// `GET /tokens/scopes`: scopes the backend declares for marketplace tokens.
	fn token_scopes(&self) -> ApiFuture<'_, Vec<ScopeRecord>>;

	/// `POST /tokens`: stores a marketplace token. A 400 answer means the marketplace
	/// reports the token as inactive or deleted.
	fn add_token<'a>(&'a self, token: &'a TokenSecret) -> ApiFuture<'a, TokenCreated>;

	/// `GET /suppliers`.
	fn suppliers<'a>(&'a self, query: &'a SupplierQuery) -> ApiFuture<'a, Page<Supplier>>;

	/// `GET /dashboards`.
	fn dashboards<'a>(&'a self, query: &'a DashboardQuery) -> ApiFuture<'a, Page<Dashboard>>;

	/// `POST /auth/telegram/login`: exchanges Telegram web-app init data for a session.
	fn login_with_telegram<'a>(&'a self, init_data: &'a str) -> ApiFuture<'a, TelegramLogin>;
}

#[cfg(feature = "reqwest")]
#[derive(Serialize)]
struct AddTokenBody<'a> {
	token: &'a str,
}

#[cfg(feature = "reqwest")]
#[derive(Serialize)]
struct TelegramLoginBody<'a> {
	init_data: &'a str,
}

/// reqwest-backed [`SellerApi`] implementation.
///
/// Requests never follow redirects, carry the configured session as the `access_token`
/// cookie, and time out after [`ClientConfig::timeout`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ApiClient {
	config: ClientConfig,
	http: ReqwestClient,
}
#[cfg(feature = "reqwest")]
impl ApiClient {
	/// Builds a client with its own connection pool.
	pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
		let http = ReqwestClient::builder()
			.redirect(Policy::none())
			.timeout(config.timeout.unsigned_abs())
			.build()?;

		Ok(Self { config, http })
	}

	/// Wraps an existing reqwest client. Configure it to disable redirect following.
	pub fn with_client(config: ClientConfig, http: ReqwestClient) -> Self {
		Self { config, http }
	}

	/// Configuration in use.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
		let builder = self
			.http
			.request(method, self.config.endpoint(path))
			.timeout(self.config.timeout.unsigned_abs());

		match self.config.access_token.as_ref() {
			Some(token) => builder.header(COOKIE, format!("access_token={}", token.expose())),
			None => builder,
		}
	}

	async fn dispatch(
		&self,
		endpoint: &'static str,
		request: RequestBuilder,
	) -> Result<(ResponseMetadata, Vec<u8>)> {
		let response =
			request.send().await.map_err(|e| TransportError::network(endpoint, e))?;
		let meta = ResponseMetadata {
			status: Some(response.status().as_u16()),
			retry_after: http::parse_retry_after(response.headers()),
		};
		let body = response.bytes().await.map_err(|e| TransportError::network(endpoint, e))?;

		Ok((meta, body.to_vec()))
	}

	async fn call<T>(&self, endpoint: &'static str, request: RequestBuilder) -> Result<T>
	where
		T: for<'de> Deserialize<'de>,
	{
		let (meta, body) = self.dispatch(endpoint, request).await?;

		if !meta.is_success() {
			return Err(http::classify_failure(&meta, &body));
		}

		http::parse_body(endpoint, &meta, &body)
	}
}
#[cfg(feature = "reqwest")]
impl SellerApi for ApiClient {
	fn token_scopes(&self) -> ApiFuture<'_, Vec<ScopeRecord>> {
		Box::pin(async move {
			const ENDPOINT: &str = "/tokens/scopes";

			let request = self.request(reqwest::Method::GET, ENDPOINT);
			let envelope: ScopesEnvelope = self.call(ENDPOINT, request).await?;

			Ok(envelope.data)
		})
	}

	fn add_token<'a>(&'a self, token: &'a TokenSecret) -> ApiFuture<'a, TokenCreated> {
		Box::pin(async move {
			const ENDPOINT: &str = "/tokens";

			let request = self
				.request(reqwest::Method::POST, ENDPOINT)
				.json(&AddTokenBody { token: token.expose() });
			let (meta, body) = self.dispatch(ENDPOINT, request).await?;

			match meta.status {
				Some(400) => Err(Error::TokenInactive),
				_ if meta.is_success() => http::parse_body(ENDPOINT, &meta, &body),
				_ => Err(http::classify_failure(&meta, &body)),
			}
		})
	}

	fn suppliers<'a>(&'a self, query: &'a SupplierQuery) -> ApiFuture<'a, Page<Supplier>> {
		Box::pin(async move {
			const ENDPOINT: &str = "/suppliers";

			let request = self.request(reqwest::Method::GET, ENDPOINT).query(&query.to_pairs());

			self.call(ENDPOINT, request).await
		})
	}

	fn dashboards<'a>(&'a self, query: &'a DashboardQuery) -> ApiFuture<'a, Page<Dashboard>> {
		Box::pin(async move {
			const ENDPOINT: &str = "/dashboards";

			let pairs = query.to_pairs()?;
			let request = self.request(reqwest::Method::GET, ENDPOINT).query(&pairs);

			self.call(ENDPOINT, request).await
		})
	}

	fn login_with_telegram<'a>(&'a self, init_data: &'a str) -> ApiFuture<'a, TelegramLogin> {
		Box::pin(async move {
			const ENDPOINT: &str = "/auth/telegram/login";

			let request = self
				.request(reqwest::Method::POST, ENDPOINT)
				.json(&TelegramLoginBody { init_data });

			self.call(ENDPOINT, request).await
		})
	}
}
