//! The B2C login provider: authorization, code exchange, token validation,
//! logout, and password reset, all driven by per-policy discovery.

/// Provider registration for hosting frameworks.
pub mod registry;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, EndpointNotSet,
	EndpointSet, ExtraTokenFields, RedirectUrl, StandardRevocableToken, StandardTokenResponse,
	TokenUrl,
	basic::{
		BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
		BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	config::ProviderConfig,
	error::{self, TokenError},
	http::HttpTransport,
	metadata::{MetadataResolver, PolicyMetadata},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::DestinationStore,
	token::{
		RawIdToken,
		claims::{self, ClaimExpectations, IdentityTokenClaims},
		jwks::SigningKeys,
	},
	user::NormalizedUser,
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestHttpClient};

/// Fixed nonce sent with password-reset requests.
///
/// The reset flow never validates the returned identity token, so the nonce
/// carries no entropy; the B2C endpoint merely requires its presence.
pub const PASSWORD_RESET_NONCE: &str = "defaultNonce";

/// Extra fields B2C returns from the token endpoint alongside the standard
/// OAuth 2.0 set.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct B2cTokenFields {
	/// Compact-form identity token; B2C's general-purpose token for sign-in.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
	/// Lifetime of the identity token in seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token_expires_in: Option<i64>,
}
impl ExtraTokenFields for B2cTokenFields {}

/// Token-endpoint response carrying the B2C extra fields.
pub type B2cTokenResponse = StandardTokenResponse<B2cTokenFields, BasicTokenType>;

type ConfiguredB2cClient = Client<
	BasicErrorResponse,
	B2cTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;

/// Login provider for a single B2C application.
///
/// Owns the per-policy metadata cache, the signing-key cache, and the
/// destination-store collaborator. Instances are safe to share across
/// concurrent requests; every operation resolves its policy's metadata through
/// the cache and fails fast on the first error.
pub struct B2cProvider<C>
where
	C: HttpTransport,
{
	config: ProviderConfig,
	http_client: Arc<C>,
	metadata: MetadataResolver<C>,
	signing_keys: SigningKeys<C>,
	destinations: Arc<dyn DestinationStore>,
}
#[cfg(feature = "reqwest")]
impl B2cProvider<ReqwestHttpClient> {
	/// Creates a provider backed by a fresh reqwest client honoring the
	/// configured request timeout.
	pub fn new(
		config: ProviderConfig,
		destinations: Arc<dyn DestinationStore>,
	) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::new(config.http_timeout)?;

		Ok(Self::with_http_client(config, http_client, destinations))
	}
}
impl<C> B2cProvider<C>
where
	C: HttpTransport,
{
	/// Creates a provider on top of an existing transport.
	pub fn with_http_client(
		config: ProviderConfig,
		http_client: impl Into<Arc<C>>,
		destinations: Arc<dyn DestinationStore>,
	) -> Self {
		let http_client = http_client.into();
		let metadata = MetadataResolver::new(http_client.clone(), &config);
		let signing_keys = SigningKeys::new(http_client.clone());

		Self { config, http_client, metadata, signing_keys, destinations }
	}

	/// The configuration this provider was built from.
	pub fn config(&self) -> &ProviderConfig {
		&self.config
	}

	/// Builds the sign-in authorization URL.
	///
	/// Records the caller's intended destination first so the web layer can
	/// send the user back after a successful login, then issues the standard
	/// code request against the policy's discovered authorization endpoint.
	pub async fn authorization_url(&self, state: &str, intended: Url) -> Result<Url> {
		const KIND: FlowKind = FlowKind::Authorize;

		let span = FlowSpan::new(KIND, "authorization_url");
		let result = span
			.instrument(async move {
				self.destinations.put_intended(intended).await?;

				let metadata = self.metadata.resolve(&self.config.policy).await?;

				Ok(self.build_code_request_url(&metadata, state))
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Token endpoint published by the sign-in policy.
	pub async fn token_endpoint(&self) -> Result<Url> {
		let metadata = self.metadata.resolve(&self.config.policy).await?;

		Ok(metadata.token_endpoint.clone())
	}

	/// Exchanges an authorization code at the sign-in policy's token endpoint.
	///
	/// `grant_type=authorization_code` and client-secret-post authentication
	/// are supplied by the generic OAuth client.
	pub async fn exchange_code(&self, code: &str) -> Result<B2cTokenResponse> {
		const KIND: FlowKind = FlowKind::Exchange;

		let span = FlowSpan::new(KIND, "exchange_code");
		let result = span
			.instrument(async move {
				let metadata = self.metadata.resolve(&self.config.policy).await?;
				let oauth_client = self.oauth_client(&metadata);
				let handle = self.http_client.exchange_handle();

				oauth_client
					.exchange_code(AuthorizationCode::new(code.to_owned()))
					.request_async(&handle)
					.await
					.map_err(error::map_exchange_error)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Extracts the identity token from a token-endpoint response.
	///
	/// B2C sign-in consumes the `id_token`, not the OAuth 2.0 access token.
	pub fn parse_id_token<'r>(&self, response: &'r B2cTokenResponse) -> Result<&'r str> {
		response
			.extra_fields()
			.id_token
			.as_deref()
			.ok_or_else(|| TokenError::MissingField { field: "id_token" }.into())
	}

	/// Extracts the identity token's lifetime from a token-endpoint response.
	pub fn parse_expires_in(&self, response: &B2cTokenResponse) -> Result<i64> {
		response
			.extra_fields()
			.id_token_expires_in
			.ok_or_else(|| TokenError::MissingField { field: "id_token_expires_in" }.into())
	}

	/// Validates an identity token and returns its verified claims.
	///
	/// Stages run in a fixed order: compact-serialization checks, algorithm
	/// pinning on the raw header, signature verification against the policy's
	/// published key set, then the claim pipeline. Claims are surfaced only
	/// after every stage has passed.
	pub async fn user_claims(&self, id_token: &str) -> Result<IdentityTokenClaims> {
		const KIND: FlowKind = FlowKind::Claims;

		let span = FlowSpan::new(KIND, "user_claims");
		let result = span
			.instrument(async move {
				let raw = RawIdToken::parse(id_token)?;

				raw.require_rs256()?;

				let metadata = self.metadata.resolve(&self.config.policy).await?;
				let jwks_uri = metadata.require_jwks_uri(&self.config.policy)?;
				let key = self.signing_keys.decoding_key(jwks_uri, raw.key_id()).await?;
				let claims = raw.verify_signature(&key)?;
				let expectations = ClaimExpectations {
					issuer: &metadata.issuer,
					audience: &self.config.client_id,
					now: OffsetDateTime::now_utc(),
				};

				claims::check_claims(&claims, &expectations)?;

				Ok(claims)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Runs the full post-callback flow: code exchange, identity-token
	/// extraction, validation, and user mapping.
	pub async fn authenticate(&self, code: &str) -> Result<NormalizedUser> {
		let response = self.exchange_code(code).await?;
		let id_token = self.parse_id_token(&response)?;
		let claims = self.user_claims(id_token).await?;

		NormalizedUser::from_claims(claims)
	}

	/// Builds the sign-in policy's end-session URL pointing back at the
	/// configured post-logout destination.
	pub async fn logout_url(&self) -> Result<Url> {
		const KIND: FlowKind = FlowKind::Logout;

		let span = FlowSpan::new(KIND, "logout_url");
		let result = span
			.instrument(async move {
				let metadata = self.metadata.resolve(&self.config.policy).await?;
				let mut url = metadata.require_end_session_endpoint(&self.config.policy)?.clone();

				url.query_pairs_mut().append_pair(
					"post_logout_redirect_uri",
					self.config.post_logout_redirect_uri.as_str(),
				);

				Ok(url)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Builds the password-reset authorization URL against the reset policy.
	///
	/// This is the implicit variant: `response_type=id_token` with the fixed
	/// nonce and a forced login prompt, no code exchange afterwards.
	pub async fn password_reset_url(&self, state: &str) -> Result<Url> {
		const KIND: FlowKind = FlowKind::PasswordReset;

		let span = FlowSpan::new(KIND, "password_reset_url");
		let result = span
			.instrument(async move {
				let metadata = self.metadata.resolve(&self.config.pwreset_policy).await?;
				let mut url = metadata.authorization_endpoint.clone();
				let mut pairs = url.query_pairs_mut();

				pairs.append_pair("client_id", &self.config.client_id);
				pairs.append_pair("nonce", PASSWORD_RESET_NONCE);
				pairs.append_pair("redirect_uri", self.config.redirect_uri.as_str());

				if let Some(scope) = self.format_scope() {
					pairs.append_pair("scope", &scope);
				}

				pairs.append_pair("response_type", "id_token");
				pairs.append_pair("prompt", "login");
				pairs.append_pair("state", state);

				drop(pairs);

				Ok(url)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	fn build_code_request_url(&self, metadata: &PolicyMetadata, state: &str) -> Url {
		let mut url = metadata.authorization_endpoint.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", &self.config.client_id);
		pairs.append_pair("redirect_uri", self.config.redirect_uri.as_str());

		if let Some(scope) = self.format_scope() {
			pairs.append_pair("scope", &scope);
		}

		pairs.append_pair("state", state);

		drop(pairs);

		url
	}

	fn format_scope(&self) -> Option<String> {
		if self.config.scopes.is_empty() {
			return None;
		}

		let mut buf = String::new();

		for (idx, scope) in self.config.scopes.iter().enumerate() {
			if idx > 0 {
				buf.push(self.config.scope_separator);
			}

			buf.push_str(scope);
		}

		Some(buf)
	}

	fn oauth_client(&self, metadata: &PolicyMetadata) -> ConfiguredB2cClient {
		Client::new(ClientId::new(self.config.client_id.clone()))
			.set_client_secret(ClientSecret::new(self.config.client_secret.clone()))
			.set_auth_uri(AuthUrl::from_url(metadata.authorization_endpoint.clone()))
			.set_token_uri(TokenUrl::from_url(metadata.token_endpoint.clone()))
			.set_redirect_uri(RedirectUrl::from_url(self.config.redirect_uri.clone()))
			.set_auth_type(AuthType::RequestBody)
	}
}
impl<C> Debug for B2cProvider<C>
where
	C: HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("B2cProvider")
			.field("tenant", &self.config.tenant)
			.field("policy", &self.config.policy)
			.field("pwreset_policy", &self.config.pwreset_policy)
			.field("client_id", &self.config.client_id)
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		store::{DestinationStore, MemoryDestinationStore},
	};

	fn provider() -> ReqwestTestProvider {
		build_reqwest_test_provider(
			Url::parse("https://mock.localhost")
				.expect("Authority fixture should parse successfully."),
		)
		.0
	}

	fn metadata_fixture() -> PolicyMetadata {
		serde_json::from_value(serde_json::json!({
			"authorization_endpoint": "https://contoso.b2clogin.com/oauth2/v2.0/authorize",
			"token_endpoint": "https://contoso.b2clogin.com/oauth2/v2.0/token",
			"issuer": "https://contoso.b2clogin.com/tfp/v2.0/",
		}))
		.expect("Metadata fixture should deserialize.")
	}

	#[test]
	fn code_request_url_carries_the_standard_parameters() {
		let url = provider().build_code_request_url(&metadata_fixture(), "state-123");

		assert_eq!(url.host_str(), Some("contoso.b2clogin.com"));
		assert_eq!(url.path(), "/oauth2/v2.0/authorize");

		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert_eq!(pairs.get("response_type"), Some(&"code".into()));
		assert_eq!(pairs.get("client_id"), Some(&TEST_CLIENT_ID.into()));
		assert_eq!(pairs.get("redirect_uri"), Some(&"https://app.example.com/callback".into()));
		assert_eq!(pairs.get("scope"), Some(&"openid offline_access".into()));
		assert_eq!(pairs.get("state"), Some(&"state-123".into()));
	}

	#[test]
	fn scope_formatting_honors_the_separator() {
		let mut config = test_provider_config(
			Url::parse("https://mock.localhost")
				.expect("Authority fixture should parse successfully."),
		);

		config.scopes = vec!["openid".into(), "profile".into()];
		config.scope_separator = ',';

		let store: Arc<dyn DestinationStore> = Arc::new(MemoryDestinationStore::default());
		let provider = B2cProvider::new(config, store)
			.expect("Provider fixture should build successfully.");

		assert_eq!(provider.format_scope(), Some("openid,profile".into()));
	}

	#[test]
	fn empty_scopes_omit_the_parameter() {
		let mut config = test_provider_config(
			Url::parse("https://mock.localhost")
				.expect("Authority fixture should parse successfully."),
		);

		config.scopes = Vec::new();

		let store: Arc<dyn DestinationStore> = Arc::new(MemoryDestinationStore::default());
		let provider = B2cProvider::new(config, store)
			.expect("Provider fixture should build successfully.");

		assert_eq!(provider.format_scope(), None);

		let url = provider.build_code_request_url(&metadata_fixture(), "state-123");
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert!(!pairs.contains_key("scope"));
	}

	#[test]
	fn token_response_extras_are_extracted() {
		let response: B2cTokenResponse = serde_json::from_value(serde_json::json!({
			"access_token": "opaque-access",
			"token_type": "bearer",
			"id_token": "aaa.bbb.ccc",
			"id_token_expires_in": 3600,
		}))
		.expect("Token response fixture should deserialize.");
		let provider = provider();

		assert_eq!(
			provider
				.parse_id_token(&response)
				.expect("Identity token extraction should succeed."),
			"aaa.bbb.ccc",
		);
		assert_eq!(
			provider
				.parse_expires_in(&response)
				.expect("Identity token lifetime extraction should succeed."),
			3600,
		);
	}

	#[test]
	fn absent_extras_are_reported_by_field() {
		let response: B2cTokenResponse = serde_json::from_value(serde_json::json!({
			"access_token": "opaque-access",
			"token_type": "bearer",
		}))
		.expect("Token response fixture should deserialize.");
		let provider = provider();

		assert!(matches!(
			provider.parse_id_token(&response),
			Err(Error::Token(TokenError::MissingField { field: "id_token" })),
		));
		assert!(matches!(
			provider.parse_expires_in(&response),
			Err(Error::Token(TokenError::MissingField { field: "id_token_expires_in" })),
		));
	}
}
