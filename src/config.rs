//! Immutable provider configuration and its validating builder.

// self
use crate::{_prelude::*, error::ConfigError};

/// Provider-specific configuration keys recognized by the hosting framework.
///
/// The remaining OAuth settings (client id/secret, redirect URI) use the host's
/// generic key names and are supplied through the same channel.
pub const CONFIG_KEYS: [&str; 4] = ["tenant", "tenant_id", "policy", "pwreset_policy"];

/// Scopes requested when the caller does not override them.
pub const DEFAULT_SCOPES: [&str; 2] = ["openid", "offline_access"];
/// Scope separator used when the caller does not override it.
pub const DEFAULT_SCOPE_SEPARATOR: char = ' ';
/// Bounded timeout applied to every outbound HTTP request.
pub const DEFAULT_HTTP_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Immutable configuration consumed by [`B2cProvider`](crate::provider::B2cProvider).
///
/// Supplied once at construction and never mutated afterwards. Values are
/// loaded by the hosting application (environment, config file); only their
/// semantics are this crate's concern.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
	/// Tenant name forming the `{tenant}.b2clogin.com` authority subdomain.
	pub tenant: String,
	/// Tenant identifier forming the first authority path segment.
	pub tenant_id: String,
	/// Sign-in user-flow (policy) name.
	pub policy: String,
	/// Password-reset user-flow (policy) name.
	pub pwreset_policy: String,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: String,
	/// Redirect URI registered with the B2C application.
	pub redirect_uri: Url,
	/// Destination the end-session endpoint redirects to after logout.
	pub post_logout_redirect_uri: Url,
	/// Ordered scopes requested during authorization.
	pub scopes: Vec<String>,
	/// Separator joining scopes into a single request parameter.
	pub scope_separator: char,
	/// Authority override replacing `https://{tenant}.b2clogin.com`.
	///
	/// B2C tenants fronted by a custom login domain set this to that domain's
	/// base URL; discovery keeps the `{tenant_id}/{policy}` path shape.
	pub authority: Option<Url>,
	/// Bounded timeout for discovery, key-set, and token requests.
	pub http_timeout: StdDuration,
}
impl ProviderConfig {
	/// Creates a new builder with no fields set.
	pub fn builder() -> ProviderConfigBuilder {
		ProviderConfigBuilder::default()
	}
}

/// Builder for [`ProviderConfig`] values.
#[derive(Debug, Default)]
pub struct ProviderConfigBuilder {
	tenant: Option<String>,
	tenant_id: Option<String>,
	policy: Option<String>,
	pwreset_policy: Option<String>,
	client_id: Option<String>,
	client_secret: Option<String>,
	redirect_uri: Option<Url>,
	post_logout_redirect_uri: Option<Url>,
	scopes: Option<Vec<String>>,
	scope_separator: Option<char>,
	authority: Option<Url>,
	http_timeout: Option<StdDuration>,
}
impl ProviderConfigBuilder {
	/// Sets the tenant name.
	pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
		self.tenant = Some(tenant.into());

		self
	}

	/// Sets the tenant identifier.
	pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
		self.tenant_id = Some(tenant_id.into());

		self
	}

	/// Sets the sign-in policy name.
	pub fn policy(mut self, policy: impl Into<String>) -> Self {
		self.policy = Some(policy.into());

		self
	}

	/// Sets the password-reset policy name.
	pub fn pwreset_policy(mut self, pwreset_policy: impl Into<String>) -> Self {
		self.pwreset_policy = Some(pwreset_policy.into());

		self
	}

	/// Sets the OAuth client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the OAuth client secret.
	pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.client_secret = Some(client_secret.into());

		self
	}

	/// Sets the redirect URI.
	pub fn redirect_uri(mut self, redirect_uri: Url) -> Self {
		self.redirect_uri = Some(redirect_uri);

		self
	}

	/// Sets the post-logout destination.
	pub fn post_logout_redirect_uri(mut self, destination: Url) -> Self {
		self.post_logout_redirect_uri = Some(destination);

		self
	}

	/// Replaces the default `openid offline_access` scope list.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = Some(scopes.into_iter().map(Into::into).collect());

		self
	}

	/// Overrides the scope separator character.
	pub fn scope_separator(mut self, separator: char) -> Self {
		self.scope_separator = Some(separator);

		self
	}

	/// Overrides the default `https://{tenant}.b2clogin.com` authority.
	pub fn authority(mut self, authority: Url) -> Self {
		self.authority = Some(authority);

		self
	}

	/// Overrides the HTTP request timeout (defaults to 10 seconds).
	pub fn http_timeout(mut self, timeout: StdDuration) -> Self {
		self.http_timeout = Some(timeout);

		self
	}

	/// Validates the collected fields and produces a [`ProviderConfig`].
	pub fn build(self) -> Result<ProviderConfig, ConfigError> {
		let separator = self.scope_separator.unwrap_or(DEFAULT_SCOPE_SEPARATOR);

		if separator.is_control() {
			return Err(ConfigError::InvalidScopeSeparator { separator });
		}

		Ok(ProviderConfig {
			tenant: self.tenant.ok_or(ConfigError::MissingField { field: "tenant" })?,
			tenant_id: self.tenant_id.ok_or(ConfigError::MissingField { field: "tenant_id" })?,
			policy: self.policy.ok_or(ConfigError::MissingField { field: "policy" })?,
			pwreset_policy: self
				.pwreset_policy
				.ok_or(ConfigError::MissingField { field: "pwreset_policy" })?,
			client_id: self.client_id.ok_or(ConfigError::MissingField { field: "client_id" })?,
			client_secret: self
				.client_secret
				.ok_or(ConfigError::MissingField { field: "client_secret" })?,
			redirect_uri: self
				.redirect_uri
				.ok_or(ConfigError::MissingField { field: "redirect_uri" })?,
			post_logout_redirect_uri: self
				.post_logout_redirect_uri
				.ok_or(ConfigError::MissingField { field: "post_logout_redirect_uri" })?,
			scopes: self
				.scopes
				.unwrap_or_else(|| DEFAULT_SCOPES.iter().map(|s| (*s).to_owned()).collect()),
			scope_separator: separator,
			authority: self.authority,
			http_timeout: self.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT),
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn minimal_builder() -> ProviderConfigBuilder {
		ProviderConfig::builder()
			.tenant("contoso")
			.tenant_id("contoso.onmicrosoft.com")
			.policy("B2C_1_signin")
			.pwreset_policy("B2C_1_pwreset")
			.client_id("client-abc")
			.client_secret("secret-abc")
			.redirect_uri(
				Url::parse("https://app.example.com/callback")
					.expect("Redirect fixture should parse successfully."),
			)
			.post_logout_redirect_uri(
				Url::parse("https://app.example.com/logout/success")
					.expect("Post-logout fixture should parse successfully."),
			)
	}

	#[test]
	fn defaults_cover_scopes_and_separator() {
		let config = minimal_builder().build().expect("Minimal configuration should build.");

		assert_eq!(config.scopes, vec!["openid".to_owned(), "offline_access".to_owned()]);
		assert_eq!(config.scope_separator, ' ');
		assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
		assert!(config.authority.is_none());
	}

	#[test]
	fn missing_required_field_is_reported_by_name() {
		let err = ProviderConfig::builder()
			.tenant("contoso")
			.build()
			.expect_err("Missing fields should fail the build.");

		assert!(matches!(err, ConfigError::MissingField { field: "tenant_id" }));
	}

	#[test]
	fn control_separator_is_rejected() {
		let err = minimal_builder()
			.scope_separator('\u{0}')
			.build()
			.expect_err("Control separators should fail the build.");

		assert!(matches!(err, ConfigError::InvalidScopeSeparator { .. }));
	}

	#[test]
	fn config_keys_match_the_registration_contract() {
		assert_eq!(CONFIG_KEYS, ["tenant", "tenant_id", "policy", "pwreset_policy"]);
	}
}
