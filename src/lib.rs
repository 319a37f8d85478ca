//! Client core for the seller:alert dashboard: read marketplace access tokens, judge their
//! permission scopes, talk to the seller:alert backend, and sync dashboard fixtures.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod token;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use crate::{api::ApiClient, config::ClientConfig, token::TokenSecret};

	/// Builds a reqwest client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_client() -> ReqwestClient {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Constructs an [`ApiClient`] pointed at a mock server base URL, authenticated with a
	/// fixed access cookie.
	pub fn build_test_api_client(base_url: &str) -> ApiClient {
		let config = ClientConfig::builder()
			.base_url(Url::parse(base_url).expect("Mock server URL should parse."))
			.allow_insecure_http(true)
			.access_token(TokenSecret::new("test-access-cookie"))
			.build()
			.expect("Test client configuration should be valid.");

		ApiClient::with_client(config, test_reqwest_client())
	}

	/// Encodes `payload` as the middle segment of a compact token with a dummy header and
	/// signature.
	pub fn compact_token(payload: &serde_json::Value) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256","kid":"test"}"#);
		let body = URL_SAFE_NO_PAD.encode(payload.to_string());

		format!("{header}.{body}.c2lnbmF0dXJl")
	}

	/// Unix timestamp `delta` away from now.
	pub fn unix_in(delta: Duration) -> i64 {
		(OffsetDateTime::now_utc() + delta).unix_timestamp()
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use time;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
#[cfg(feature = "cli")]
use {clap as _, color_eyre as _, tokio as _, tracing_subscriber as _};
