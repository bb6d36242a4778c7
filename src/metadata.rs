//! Per-policy OIDC discovery documents and their caching resolver.
//!
//! Azure AD B2C publishes one discovery document per user flow (policy) at
//! `https://{tenant}.b2clogin.com/{tenant_id}/{policy}/v2.0/.well-known/openid-configuration`.
//! The resolver fetches each document at most once per process lifetime: the
//! first successful fetch wins and is served unchanged afterwards. Discovery
//! documents change rarely, so a tenant rotating endpoints mid-process keeps
//! serving the stale copy until restart.

// std
use std::collections::HashMap;
// self
use crate::{
	_prelude::*,
	config::ProviderConfig,
	error::{ConfigError, MetadataError},
	http::HttpTransport,
};

/// Discovery document published for a single policy.
///
/// Only the fields this provider consumes are modeled; unknown fields are
/// ignored. `end_session_endpoint` and `jwks_uri` stay optional at parse time
/// and only error when an operation actually needs them.
#[derive(Clone, Debug, Deserialize)]
pub struct PolicyMetadata {
	/// Authorization endpoint used for login and password-reset requests.
	pub authorization_endpoint: Url,
	/// Token endpoint used for the authorization-code exchange.
	pub token_endpoint: Url,
	/// Issuer value identity tokens must carry.
	pub issuer: String,
	/// End-session endpoint used to build logout URLs.
	#[serde(default)]
	pub end_session_endpoint: Option<Url>,
	/// Location of the policy's signing key set.
	#[serde(default)]
	pub jwks_uri: Option<Url>,
}
impl PolicyMetadata {
	/// Returns the end-session endpoint or a missing-field error naming it.
	pub fn require_end_session_endpoint(&self, policy: &str) -> Result<&Url, MetadataError> {
		self.end_session_endpoint.as_ref().ok_or_else(|| MetadataError::MissingField {
			policy: policy.to_owned(),
			field: "end_session_endpoint",
		})
	}

	/// Returns the key-set location or a missing-field error naming it.
	pub fn require_jwks_uri(&self, policy: &str) -> Result<&Url, MetadataError> {
		self.jwks_uri
			.as_ref()
			.ok_or_else(|| MetadataError::MissingField { policy: policy.to_owned(), field: "jwks_uri" })
	}
}

/// Resolves and caches one [`PolicyMetadata`] per policy name.
///
/// The cache is owned exclusively by the enclosing provider instance and
/// populated on first access per policy. Concurrent first accesses for the
/// same policy are collapsed into a single network fetch by a per-policy
/// guard; failed fetches leave the cache untouched so a later attempt can
/// succeed.
pub struct MetadataResolver<C>
where
	C: HttpTransport,
{
	http_client: Arc<C>,
	tenant: String,
	tenant_id: String,
	authority: Option<Url>,
	cache: Mutex<HashMap<String, Arc<PolicyMetadata>>>,
	fetch_guards: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}
impl<C> MetadataResolver<C>
where
	C: HttpTransport,
{
	/// Creates a resolver for the configured tenant.
	pub fn new(http_client: Arc<C>, config: &ProviderConfig) -> Self {
		Self {
			http_client,
			tenant: config.tenant.clone(),
			tenant_id: config.tenant_id.clone(),
			authority: config.authority.clone(),
			cache: Mutex::new(HashMap::new()),
			fetch_guards: Mutex::new(HashMap::new()),
		}
	}

	/// Computes the well-known discovery URL for a policy.
	pub fn discovery_url(&self, policy: &str) -> Result<Url, ConfigError> {
		let authority = match &self.authority {
			Some(authority) => authority.as_str().trim_end_matches('/').to_owned(),
			None => format!("https://{}.b2clogin.com", self.tenant),
		};

		Url::parse(&format!(
			"{authority}/{}/{policy}/v2.0/.well-known/openid-configuration",
			self.tenant_id,
		))
		.map_err(|source| ConfigError::InvalidAuthority { tenant: self.tenant.clone(), source })
	}

	/// Returns the policy's metadata, fetching it on first access.
	pub async fn resolve(&self, policy: &str) -> Result<Arc<PolicyMetadata>> {
		if let Some(found) = self.cache.lock().get(policy) {
			return Ok(found.clone());
		}

		let guard = self.fetch_guard(policy);
		let _permit = guard.lock().await;

		// A concurrent caller may have filled the entry while we waited.
		if let Some(found) = self.cache.lock().get(policy) {
			return Ok(found.clone());
		}

		let url = self.discovery_url(policy)?;
		let body = self
			.http_client
			.get(&url)
			.await
			.map_err(|source| MetadataError::Fetch { policy: policy.to_owned(), source })?;
		let mut deserializer = serde_json::Deserializer::from_slice(&body);
		let metadata: PolicyMetadata = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| MetadataError::Parse { policy: policy.to_owned(), source })?;
		let metadata = Arc::new(metadata);

		self.cache.lock().insert(policy.to_owned(), metadata.clone());

		Ok(metadata)
	}

	/// Returns (and creates on demand) the single-flight guard for a policy.
	fn fetch_guard(&self, policy: &str) -> Arc<AsyncMutex<()>> {
		let mut guards = self.fetch_guards.lock();

		guards.entry(policy.to_owned()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
impl<C> Debug for MetadataResolver<C>
where
	C: HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MetadataResolver")
			.field("tenant", &self.tenant)
			.field("tenant_id", &self.tenant_id)
			.field("authority", &self.authority)
			.field("cached_policies", &self.cache.lock().len())
			.finish()
	}
}
