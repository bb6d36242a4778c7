//! Azure AD B2C login provider—policy-scoped OIDC discovery, identity-token validation, and
//! logout/password-reset flows on top of a generic OAuth 2.0 client.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod config;
pub mod error;
pub mod http;
pub mod metadata;
pub mod obs;
pub mod provider;
pub mod store;
pub mod token;
pub mod user;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::ProviderConfig,
		http::ReqwestHttpClient,
		provider::B2cProvider,
		store::{DestinationStore, MemoryDestinationStore},
	};

	/// Client id baked into test configurations.
	pub const TEST_CLIENT_ID: &str = "client-it";
	/// Client secret baked into test configurations.
	pub const TEST_CLIENT_SECRET: &str = "secret-it";
	/// Sign-in policy baked into test configurations.
	pub const TEST_SIGNIN_POLICY: &str = "B2C_1_signin";
	/// Password-reset policy baked into test configurations.
	pub const TEST_PWRESET_POLICY: &str = "B2C_1_pwreset";

	/// Provider type alias used by reqwest-backed integration tests.
	pub type ReqwestTestProvider = B2cProvider<ReqwestHttpClient>;

	/// Builds a configuration whose discovery authority points at a mock server.
	pub fn test_provider_config(authority: Url) -> ProviderConfig {
		ProviderConfig::builder()
			.tenant("contoso")
			.tenant_id("contoso.onmicrosoft.com")
			.policy(TEST_SIGNIN_POLICY)
			.pwreset_policy(TEST_PWRESET_POLICY)
			.client_id(TEST_CLIENT_ID)
			.client_secret(TEST_CLIENT_SECRET)
			.redirect_uri(
				Url::parse("https://app.example.com/callback")
					.expect("Redirect fixture should parse successfully."),
			)
			.post_logout_redirect_uri(
				Url::parse("https://app.example.com/logout/success")
					.expect("Post-logout fixture should parse successfully."),
			)
			.authority(authority)
			.build()
			.expect("Test configuration should build successfully.")
	}

	/// Constructs a [`B2cProvider`] backed by an in-memory destination store and the reqwest
	/// transport used across integration tests.
	pub fn build_reqwest_test_provider(
		authority: Url,
	) -> (ReqwestTestProvider, MemoryDestinationStore) {
		let config = test_provider_config(authority);
		let store_backend = MemoryDestinationStore::default();
		let store: Arc<dyn DestinationStore> = Arc::new(store_backend.clone());
		let provider =
			B2cProvider::new(config, store).expect("Test provider should build successfully.");

		(provider, store_backend)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
