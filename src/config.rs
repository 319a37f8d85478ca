//! Validated client configuration for the seller:alert backend.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError, token::TokenSecret};

/// Immutable configuration consumed by [`ApiClient`](crate::api::ApiClient).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Backend base URL; endpoint paths are resolved against it.
	pub base_url: Url,
	/// Per-request timeout.
	pub timeout: Duration,
	/// Session cookie sent as `access_token`, when authenticated.
	pub access_token: Option<TokenSecret>,
}
impl ClientConfig {
	/// Production backend base URL.
	pub const DEFAULT_BASE_URL: &'static str = "https://api.test.seller-alert.com";
	/// Default per-request timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(15);
	/// Variable overriding the base URL.
	pub const ENV_BASE_URL: &'static str = "SELLER_ALERT_BASE_URL";
	/// Variable holding the session cookie.
	pub const ENV_ACCESS_TOKEN: &'static str = "ACCESS_TOKEN";
	/// Variable overriding the timeout, in whole seconds.
	pub const ENV_TIMEOUT_SECS: &'static str = "SELLER_ALERT_TIMEOUT_SECS";

	/// Creates a new builder seeded with defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Resolves an endpoint path (e.g. `tokens/scopes`) against the base URL.
	pub fn endpoint(&self, path: &str) -> Url {
		let mut url = self.base_url.clone();

		if let Ok(mut segments) = url.path_segments_mut() {
			segments.pop_if_empty().extend(path.split('/').filter(|s| !s.is_empty()));
		}

		url
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Backend base URL.
	pub base_url: Option<Url>,
	/// Per-request timeout.
	pub timeout: Duration,
	/// Session cookie.
	pub access_token: Option<TokenSecret>,
	/// Accept plain `http` base URLs (local development and tests).
	pub allow_insecure_http: bool,
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self {
			base_url: None,
			timeout: ClientConfig::DEFAULT_TIMEOUT,
			access_token: None,
			allow_insecure_http: false,
		}
	}
}
impl ClientConfigBuilder {
	/// Seeds a builder from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Seeds a builder from an arbitrary variable lookup; blank values are ignored.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&'static str) -> Option<String>,
	{
		let mut builder = Self::default();

		if let Some(raw) = lookup(ClientConfig::ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
			builder = builder.base_url_str(raw.trim())?;
		}
		if let Some(raw) = lookup(ClientConfig::ENV_ACCESS_TOKEN).filter(|v| !v.trim().is_empty())
		{
			builder = builder.access_token(TokenSecret::new(raw.trim()));
		}
		if let Some(raw) = lookup(ClientConfig::ENV_TIMEOUT_SECS).filter(|v| !v.trim().is_empty())
		{
			let secs = raw.trim().parse::<i64>().map_err(|_| ConfigError::InvalidEnv {
				name: ClientConfig::ENV_TIMEOUT_SECS,
				value: raw.clone(),
			})?;

			builder = builder.timeout(Duration::seconds(secs));
		}

		Ok(builder)
	}

	/// Sets the base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Parses and sets the base URL.
	pub fn base_url_str(self, raw: &str) -> Result<Self, ConfigError> {
		let url = Url::parse(raw).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		Ok(self.base_url(url))
	}

	/// Overrides the per-request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Sets the session cookie.
	pub fn access_token(mut self, token: TokenSecret) -> Self {
		self.access_token = Some(token);

		self
	}

	/// Permits `http` base URLs.
	pub fn allow_insecure_http(mut self, allow: bool) -> Self {
		self.allow_insecure_http = allow;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let base_url = match self.base_url {
			Some(url) => url,
			None => Url::parse(ClientConfig::DEFAULT_BASE_URL)
				.map_err(|source| ConfigError::InvalidBaseUrl { source })?,
		};

		validate_base_url(&base_url, self.allow_insecure_http)?;

		if !self.timeout.is_positive() {
			return Err(ConfigError::NonPositiveTimeout);
		}

		Ok(ClientConfig {
			base_url,
			timeout: self.timeout,
			access_token: self.access_token.filter(|token| !token.is_blank()),
		})
	}
}

fn validate_base_url(url: &Url, allow_insecure_http: bool) -> Result<(), ConfigError> {
	if url.cannot_be_a_base() {
		return Err(ConfigError::CannotBeABase { url: url.to_string() });
	}

	match url.scheme() {
		"https" => Ok(()),
		"http" if allow_insecure_http => Ok(()),
		_ => Err(ConfigError::InsecureBaseUrl { url: url.to_string() }),
	}
}
