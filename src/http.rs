//! Transport primitives for discovery, key-set, and token-endpoint calls.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack: a plain
//! GET used for discovery documents and signing key sets, plus a handle the
//! `oauth2` facade drives for the authorization-code exchange. The default
//! [`ReqwestHttpClient`] implementation lives behind the `reqwest` feature.

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Boxed future returned by [`HttpTransport::get`].
pub type GetFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, FetchError>> + 'a + Send>>;

/// Failures surfaced by [`HttpTransport::get`].
///
/// Both variants are fatal for the enclosing authentication attempt; the
/// caller maps them into its own taxonomy (metadata fetch, key fetch).
#[derive(Debug, ThisError)]
pub enum FetchError {
	/// Endpoint answered with a non-success status.
	#[error("Endpoint returned HTTP status {status}.")]
	Status {
		/// HTTP status code of the response.
		status: u16,
	},
	/// Request failed below the HTTP layer or timed out.
	#[error("Network error occurred while calling the endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: Box<dyn StdError + Send + Sync>,
	},
}
impl FetchError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

/// Abstraction over HTTP transports used by the provider.
///
/// Implementations must be `Send + Sync + 'static` so a provider instance can
/// be shared across concurrent requests. Every request must observe a bounded
/// timeout and fail fast; nothing in this crate retries.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle driven by the `oauth2` facade during the
	/// authorization-code exchange.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Issues a GET and returns the response body on a success status.
	fn get<'a>(&'a self, url: &'a Url) -> GetFuture<'a>;

	/// Builds a handle for the token-endpoint exchange.
	fn exchange_handle(&self) -> Self::Handle;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one
/// place. The wrapped client carries the configured request timeout; custom
/// clients passed via [`with_client`](Self::with_client) should configure
/// their own.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client enforcing the provided request timeout.
	pub fn new(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	type Handle = ReqwestExchangeHandle;
	type TransportError = ReqwestError;

	fn get<'a>(&'a self, url: &'a Url) -> GetFuture<'a> {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.get(url.clone()).send().await.map_err(FetchError::network)?;
			let status = response.status();

			if !status.is_success() {
				return Err(FetchError::Status { status: status.as_u16() });
			}

			Ok(response.bytes().await.map_err(FetchError::network)?.to_vec())
		})
	}

	fn exchange_handle(&self) -> Self::Handle {
		ReqwestExchangeHandle(self.0.clone())
	}
}

/// [`AsyncHttpClient`] adapter that executes token-endpoint requests through
/// reqwest.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestExchangeHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestExchangeHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
