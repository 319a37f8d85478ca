//! Marketplace token connection: inspect a pasted token, then hand it to the backend.
//!
//! A [`ConnectSession`] lives as long as one token dialog. The backend's scope list is
//! fetched at most once per session; concurrent callers wait on the same in-flight
//! request instead of issuing their own. Every [`ConnectSession::inspect`] call replaces
//! the previous verdict, and [`ConnectSession::submit`] only forwards a token whose
//! latest verdict is usable.

// self
use crate::{
	_prelude::*,
	api::SellerApi,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	token::{AccessSummary, AllowList, DecodedToken, Rejection, TokenSecret, decode_at},
};

/// Token plus the verdict reached when it was inspected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inspection {
	/// Trimmed token as pasted.
	pub token: TokenSecret,
	/// Decoder verdict.
	pub decoded: DecodedToken,
}

/// Account attached by a successful submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedAccount {
	/// Backend identifier of the stored token.
	pub token_id: i64,
	/// Supplier the token belongs to.
	pub supplier_id: Option<String>,
	/// Token expiry.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
	/// Access the token grants.
	pub access: AccessSummary,
}

#[derive(Debug, Default)]
struct Latest {
	generation: u64,
	inspection: Option<Inspection>,
}

/// State for one token dialog.
pub struct ConnectSession<A>
where
	A: ?Sized + SellerApi,
{
	api: Arc<A>,
	allow_list: AsyncMutex<Option<AllowList>>,
	latest: Mutex<Latest>,
}
impl<A> ConnectSession<A>
where
	A: ?Sized + SellerApi,
{
	/// Opens a session that fetches the allow-list from the backend on first use.
	pub fn new(api: Arc<A>) -> Self {
		Self { api, allow_list: AsyncMutex::new(None), latest: Default::default() }
	}

	/// Opens a session with a fixed allow-list; the backend scope list is never fetched.
	pub fn with_allow_list(api: Arc<A>, allow_list: AllowList) -> Self {
		Self { api, allow_list: AsyncMutex::new(Some(allow_list)), latest: Default::default() }
	}

	/// Returns the session allow-list, fetching `GET /tokens/scopes` on first use.
	///
	/// A failed fetch is not cached; the next call tries again.
	pub async fn allow_list(&self) -> Result<AllowList> {
		let mut slot = self.allow_list.lock().await;

		if let Some(allow_list) = slot.as_ref() {
			return Ok(allow_list.clone());
		}

		let records = self.api.token_scopes().await?;
		let allow_list = AllowList::from_scope_records(&records);

		#[cfg(feature = "tracing")]
		tracing::debug!(allowed = %allow_list, "fetched token scope allow-list");

		*slot = Some(allow_list.clone());

		Ok(allow_list)
	}

	/// Decodes `input` against the session allow-list and remembers the verdict.
	///
	/// Blank input clears the remembered verdict and returns `Ok(None)`. A structurally
	/// broken token clears it too and surfaces [`Error::Decode`]. When calls overlap, the
	/// one started last decides what [`submit`](Self::submit) sees.
	pub async fn inspect(&self, input: &str) -> Result<Option<DecodedToken>> {
		let span = FlowSpan::new(FlowKind::Connect, "inspect");

		span.instrument(async move {
			Ok(self.inspect_latest(input).await?.map(|inspection| inspection.decoded))
		})
		.await
	}

	/// Latest remembered inspection, if any.
	pub fn latest(&self) -> Option<Inspection> {
		self.latest.lock().inspection.clone()
	}

	/// Submits the most recently inspected token.
	pub async fn submit(&self) -> Result<ConnectedAccount> {
		const KIND: FlowKind = FlowKind::Connect;

		let span = FlowSpan::new(KIND, "submit");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let inspection = self.latest().ok_or(Error::MissingToken)?;

				self.submit_inspection(inspection).await
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Inspects `input` and submits it when usable.
	///
	/// The token submitted is always the one inspected by this call, even when another
	/// inspection overlaps and replaces the remembered verdict.
	pub async fn connect(&self, input: &str) -> Result<ConnectedAccount> {
		const KIND: FlowKind = FlowKind::Connect;

		let span = FlowSpan::new(KIND, "connect");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let inspection = self.inspect_latest(input).await?.ok_or(Error::MissingToken)?;

				self.submit_inspection(inspection).await
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn inspect_latest(&self, input: &str) -> Result<Option<Inspection>> {
		let ticket = {
			let mut latest = self.latest.lock();

			latest.generation += 1;
			latest.inspection = None;

			latest.generation
		};
		let trimmed = input.trim();

		if trimmed.is_empty() {
			return Ok(None);
		}

		let allow_list = self.allow_list().await?;
		let decoded = decode_at(trimmed, &allow_list, OffsetDateTime::now_utc())?;
		let token = TokenSecret::new(trimmed);

		#[cfg(feature = "tracing")]
		tracing::debug!(
			token = %token.fingerprint(),
			usable = decoded.is_valid_for_our_use,
			"inspected marketplace token"
		);

		let inspection = Inspection { token, decoded };
		let mut latest = self.latest.lock();

		if latest.generation == ticket {
			latest.inspection = Some(inspection.clone());
		}

		Ok(Some(inspection))
	}

	async fn submit_inspection(&self, inspection: Inspection) -> Result<ConnectedAccount> {
		let Inspection { token, decoded } = inspection;
		let rejection = decoded.rejection().or_else(|| {
			decoded.is_expired_at(OffsetDateTime::now_utc()).then_some(Rejection::Expired)
		});

		if let Some(rejection) = rejection {
			return Err(Error::TokenRejected { rejection });
		}

		let created = self.api.add_token(&token).await?;

		Ok(ConnectedAccount {
			token_id: created.token_id,
			supplier_id: decoded.supplier_id.clone(),
			expires_at: decoded.expired_at,
			access: decoded.access(),
		})
	}
}
impl<A> Debug for ConnectSession<A>
where
	A: ?Sized + SellerApi,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConnectSession")
			.field("allow_list_cached", &self.allow_list.try_lock().map(|slot| slot.is_some()))
			.field("has_inspection", &self.latest.lock().inspection.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	use serde_json::json;
	// self
	use super::*;
	use crate::api::{
		ApiFuture, Dashboard, DashboardQuery, Page, ScopeRecord, ScopeRequirement, ScopeValue,
		Supplier, SupplierQuery, TelegramLogin, TokenCreated,
	};

	#[derive(Default)]
	struct FakeApi {
		scope_calls: AtomicUsize,
		submitted: Mutex<Vec<String>>,
		// Scope fetches wait while a test holds this lock.
		scope_gate: Arc<AsyncMutex<()>>,
	}
	impl SellerApi for FakeApi {
		fn token_scopes(&self) -> ApiFuture<'_, Vec<ScopeRecord>> {
			self.scope_calls.fetch_add(1, Ordering::SeqCst);

			let gate = self.scope_gate.clone();

			Box::pin(async move {
				let _open = gate.lock().await;

				Ok(vec![
					ScopeRecord {
						name: Some("Контент".into()),
						value: ScopeValue::Name("content".into()),
						requirement: ScopeRequirement::Required,
					},
					ScopeRecord {
						name: Some("Продвижение".into()),
						value: ScopeValue::Name("advert".into()),
						requirement: ScopeRequirement::Required,
					},
					ScopeRecord {
						name: None,
						value: ScopeValue::Name("marketplace".into()),
						requirement: ScopeRequirement::Optional,
					},
				])
			})
		}

		fn add_token<'a>(&'a self, token: &'a TokenSecret) -> ApiFuture<'a, TokenCreated> {
			self.submitted.lock().push(token.expose().to_owned());

			Box::pin(async { Ok(TokenCreated { token_id: 77 }) })
		}

		fn suppliers<'a>(&'a self, _: &'a SupplierQuery) -> ApiFuture<'a, Page<Supplier>> {
			Box::pin(async { Ok(Page { data: Vec::new(), pagination: None }) })
		}

		fn dashboards<'a>(&'a self, _: &'a DashboardQuery) -> ApiFuture<'a, Page<Dashboard>> {
			Box::pin(async { Ok(Page { data: Vec::new(), pagination: None }) })
		}

		fn login_with_telegram<'a>(&'a self, _: &'a str) -> ApiFuture<'a, TelegramLogin> {
			Box::pin(async { Ok(TelegramLogin { user_id: 1 }) })
		}
	}

	fn token(scopes: u64, exp_in: Duration) -> String {
		token_for("sup-9", scopes, exp_in)
	}

	fn token_for(supplier_id: &str, scopes: u64, exp_in: Duration) -> String {
		let payload = json!({
			"sid": supplier_id,
			"exp": (OffsetDateTime::now_utc() + exp_in).unix_timestamp(),
			"s": scopes,
		});

		format!("eyJhbGciOiJFUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(payload.to_string()))
	}

	#[tokio::test]
	async fn allow_list_is_fetched_once_per_session() {
		let api = Arc::new(FakeApi::default());
		let session = ConnectSession::new(api.clone());
		let (first, second) = tokio::join!(session.allow_list(), session.allow_list());

		assert_eq!(first.expect("Allow-list should load.").to_string(), "1,6");
		assert_eq!(second.expect("Allow-list should load.").to_string(), "1,6");
		assert_eq!(api.scope_calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn usable_token_is_submitted() {
		let api = Arc::new(FakeApi::default());
		let session = ConnectSession::new(api.clone());
		let raw = token(0b100001, Duration::hours(2));
		let account =
			session.connect(&format!("  {raw}\n")).await.expect("Usable token should connect.");

		assert_eq!(account.token_id, 77);
		assert_eq!(account.supplier_id.as_deref(), Some("sup-9"));
		assert!(account.access.content);
		assert!(account.access.promotion);
		assert!(!account.access.statistics);
		assert!(account.access.editing);
		assert_eq!(*api.submitted.lock(), vec![raw]);
	}

	#[tokio::test]
	async fn connect_submits_its_own_token_when_another_inspection_overlaps() {
		let api = Arc::new(FakeApi::default());
		let session = ConnectSession::new(api.clone());
		let mine = token_for("sup-a", 0b1, Duration::hours(2));
		let other = token_for("sup-b", 0b1, Duration::hours(2));
		let gate = api.scope_gate.lock().await;
		// Both calls start while the scope fetch is held, so `other` starts last and owns
		// the remembered verdict by the time `mine` is decoded.
		let (connected, inspected, ()) =
			tokio::join!(session.connect(&mine), session.inspect(&other), async move {
				drop(gate);
			});
		let account = connected.expect("Connect should submit the token it inspected.");

		assert_eq!(account.supplier_id.as_deref(), Some("sup-a"));
		assert_eq!(*api.submitted.lock(), vec![mine]);
		assert_eq!(
			inspected.expect("Overlapping inspection should decode.").and_then(|d| d.supplier_id),
			Some("sup-b".into())
		);
		assert_eq!(
			session.latest().map(|inspection| inspection.token.expose().to_owned()),
			Some(other)
		);
	}

	#[tokio::test]
	async fn connect_with_blank_input_reports_missing_token() {
		let api = Arc::new(FakeApi::default());
		let session = ConnectSession::new(api.clone());

		assert!(matches!(session.connect("  ").await, Err(Error::MissingToken)));
		assert_eq!(api.scope_calls.load(Ordering::SeqCst), 0);
		assert!(api.submitted.lock().is_empty());
	}

	#[tokio::test]
	async fn submit_refuses_missing_or_rejected_tokens() {
		let api = Arc::new(FakeApi::default());
		let session = ConnectSession::new(api.clone());

		assert!(matches!(session.submit().await, Err(Error::MissingToken)));

		session
			.inspect(&token(0b1001, Duration::hours(2)))
			.await
			.expect("Token with extra scopes should decode.");

		match session.submit().await {
			Err(Error::TokenRejected { rejection }) =>
				assert_eq!(rejection, Rejection::ScopesNotAllowed { disallowed: vec![4] }),
			other => panic!("Expected a scope rejection, got {other:?}."),
		}

		session
			.inspect(&token(0b1, -Duration::minutes(1)))
			.await
			.expect("Expired token should decode.");

		assert!(matches!(
			session.submit().await,
			Err(Error::TokenRejected { rejection: Rejection::Expired })
		));
		assert!(api.submitted.lock().is_empty());
	}

	#[tokio::test]
	async fn blank_or_broken_input_clears_previous_inspection() {
		let session = ConnectSession::with_allow_list(
			Arc::new(FakeApi::default()),
			AllowList::new([1, 6]),
		);

		session.inspect(&token(0b1, Duration::hours(1))).await.expect("Token should decode.");

		assert!(session.latest().is_some());
		assert_eq!(session.inspect("   ").await.expect("Blank input is not an error."), None);
		assert!(session.latest().is_none());

		session.inspect(&token(0b1, Duration::hours(1))).await.expect("Token should decode.");

		assert!(matches!(session.inspect("garbage").await, Err(Error::Decode(_))));
		assert!(session.latest().is_none());
	}

	#[tokio::test]
	async fn fixed_allow_list_skips_scope_fetch() {
		let api = Arc::new(FakeApi::default());
		let session = ConnectSession::with_allow_list(api.clone(), AllowList::new([5]));

		assert_eq!(
			session.allow_list().await.expect("Fixed allow-list should be returned."),
			AllowList::new([5])
		);
		assert_eq!(api.scope_calls.load(Ordering::SeqCst), 0);
	}
}
