//! Error types shared across discovery, token validation, and provider flows.

// crates.io
use oauth2::{
	HttpClientError, RequestTokenError,
	basic::{BasicErrorResponse, BasicErrorResponseType},
};
// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type JsonParseError = serde_path_to_error::Error<serde_json::Error>;

/// Canonical provider error exposed by public APIs.
///
/// Every variant is fatal for the current authentication attempt; nothing in
/// this crate retries internally. Callers surface these as a failed login and
/// let the end user re-initiate the flow.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Discovery document could not be fetched or understood.
	#[error(transparent)]
	Metadata(#[from] MetadataError),
	/// Identity token was malformed or its signature could not be trusted.
	#[error(transparent)]
	Token(#[from] TokenError),
	/// A verified token carried an unacceptable claim.
	#[error(transparent)]
	Claim(#[from] ClaimError),
	/// Destination-store failure.
	#[error(transparent)]
	Storage(#[from] crate::store::StoreError),
	/// Transport failure (DNS, TCP, TLS) during the code exchange.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// A claim required to build a usable identity is absent.
	///
	/// Indicates policy misconfiguration on the B2C side, not a transient
	/// failure.
	#[error("Identity token is missing the required `{claim}` claim.")]
	MissingClaim {
		/// Name of the absent claim.
		claim: &'static str,
	},
	/// Provider rejected the authorization code exchange.
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Client authentication failed during the code exchange.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
}

/// Configuration and validation failures raised while assembling the provider.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required configuration field was not supplied to the builder.
	#[error("Missing required configuration field `{field}`.")]
	MissingField {
		/// Name of the absent field.
		field: &'static str,
	},
	/// Tenant or authority values do not form a valid discovery URL.
	#[error("Authority for tenant `{tenant}` is not a valid URL.")]
	InvalidAuthority {
		/// Configured tenant name.
		tenant: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Scope separators must be printable characters.
	#[error("Scope separator must be a printable character.")]
	InvalidScopeSeparator {
		/// Invalid separator that was supplied.
		separator: char,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures while resolving a policy's discovery document.
#[derive(Debug, ThisError)]
pub enum MetadataError {
	/// Discovery request failed at the HTTP layer or returned a non-success
	/// status.
	#[error("Discovery request for policy `{policy}` failed.")]
	Fetch {
		/// Policy whose document was requested.
		policy: String,
		/// Underlying fetch failure.
		#[source]
		source: crate::http::FetchError,
	},
	/// Discovery response body is not a valid document.
	#[error("Discovery document for policy `{policy}` is malformed.")]
	Parse {
		/// Policy whose document was requested.
		policy: String,
		/// Structured parsing failure.
		#[source]
		source: JsonParseError,
	},
	/// Document parsed but lacks a field the current operation needs.
	#[error("Discovery document for policy `{policy}` is missing `{field}`.")]
	MissingField {
		/// Policy whose document was consulted.
		policy: String,
		/// Name of the absent field.
		field: &'static str,
	},
}

/// Failures while parsing or verifying an identity token.
#[derive(Debug, ThisError)]
pub enum TokenError {
	/// Token is not a well-formed compact JWS.
	#[error("Identity token is not a compact JWS: {reason}.")]
	Format {
		/// What about the serialization was unacceptable.
		reason: &'static str,
	},
	/// Token header names a signing algorithm other than RS256.
	#[error("Identity token uses unsupported signing algorithm `{alg}`.")]
	UnsupportedAlgorithm {
		/// Algorithm named by the raw token header.
		alg: String,
	},
	/// Signing key set could not be fetched.
	#[error("Signing key set request failed.")]
	KeyFetch {
		/// Underlying fetch failure.
		#[source]
		source: crate::http::FetchError,
	},
	/// Signing key set response is not a valid key set.
	#[error("Signing key set is malformed.")]
	KeyParse {
		/// Structured parsing failure.
		#[source]
		source: JsonParseError,
	},
	/// Token header references a key id absent from the provider's key set.
	#[error("Signing key `{kid}` is not present in the provider's key set.")]
	UnknownKeyId {
		/// Key id named by the token header.
		kid: String,
	},
	/// Matched key cannot verify RS256 signatures.
	#[error("Signing key `{kid}` cannot be used for RS256 verification: {reason}.")]
	UnusableKey {
		/// Key id of the unusable key.
		kid: String,
		/// What about the key was unacceptable.
		reason: &'static str,
	},
	/// Cryptographic signature verification failed.
	#[error("Identity token signature verification failed.")]
	Signature {
		/// Underlying verification failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Token endpoint response lacks a field this provider requires.
	#[error("Token endpoint response is missing `{field}`.")]
	MissingField {
		/// Name of the absent field.
		field: &'static str,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: JsonParseError,
	},
}

/// Claim validation failures, one variant per checked claim.
///
/// Produced by the fixed validation pipeline in [`crate::token::claims`];
/// a token failing any of these is rejected outright.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClaimError {
	/// `iss` is absent or differs from the resolved policy issuer.
	#[error("Issuer mismatch: expected `{expected}`, token carries `{found}`.")]
	Issuer {
		/// Issuer published by the policy's discovery document.
		expected: String,
		/// Issuer found in the token, or an empty string when absent.
		found: String,
	},
	/// `iat` is absent or lies in the future beyond the allowed clock skew.
	#[error("Issued-at claim is missing or in the future.")]
	IssuedAt,
	/// `nbf` lies in the future beyond the allowed clock skew.
	#[error("Token is not yet valid.")]
	NotBefore,
	/// `exp` is absent or in the past.
	#[error("Token has expired.")]
	Expired,
	/// `aud` is absent or does not contain the configured client id.
	#[error("Audience does not include the configured client id.")]
	Audience,
}

/// Transport-level failures (network, IO) during the code exchange.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

pub(crate) fn map_exchange_error<E>(
	error: RequestTokenError<HttpClientError<E>, BasicErrorResponse>,
) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match error {
		RequestTokenError::ServerResponse(response) => {
			let reason = response
				.error_description()
				.cloned()
				.unwrap_or_else(|| response.error().as_ref().to_owned());

			match response.error() {
				BasicErrorResponseType::InvalidClient => Error::InvalidClient { reason },
				_ => Error::InvalidGrant { reason },
			}
		},
		RequestTokenError::Request(HttpClientError::Io(source)) => TransportError::Io(source).into(),
		RequestTokenError::Request(source) => TransportError::network(source).into(),
		RequestTokenError::Parse(source, _) => TokenError::ResponseParse { source }.into(),
		RequestTokenError::Other(reason) => Error::InvalidGrant { reason },
	}
}
