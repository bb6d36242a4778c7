//! Identity-token handling: compact-JWS parsing, signing keys, claim checks.
//!
//! B2C's general-purpose token is the identity token (`id_token`), not the
//! OAuth 2.0 access token. Validation runs as a fixed sequence: serialization
//! checks, algorithm pinning on the raw header, signature verification against
//! the policy's published key set, then the claim pipeline in [`claims`].
//! Claims are never surfaced before every stage has passed.

/// Ordered claim validation pipeline.
pub mod claims;
/// Signing key-set fetching and caching.
pub mod jwks;

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
// self
use crate::{_prelude::*, error::TokenError, token::claims::IdentityTokenClaims};

/// The only signing algorithm this provider accepts.
pub const REQUIRED_ALG: &str = "RS256";

/// Protected header fields consulted before any signature work.
#[derive(Clone, Debug, Deserialize)]
pub struct JwsHeader {
	/// Signing algorithm named by the token.
	pub alg: String,
	/// Key id selecting the verification key from the policy's key set.
	#[serde(default)]
	pub kid: Option<String>,
	/// Declared token type, informational only.
	#[serde(default)]
	pub typ: Option<String>,
}

/// A compact-form signed token whose serialization has been checked.
///
/// Construction only proves the three-segment shape and decodes the header;
/// the payload stays untrusted until signature and claim validation succeed.
#[derive(Clone, Debug)]
pub struct RawIdToken<'a> {
	/// Decoded protected header.
	pub header: JwsHeader,
	compact: &'a str,
}
impl<'a> RawIdToken<'a> {
	/// Checks the compact serialization and decodes the protected header.
	pub fn parse(compact: &'a str) -> Result<Self, TokenError> {
		let segments = compact.split('.').collect::<Vec<_>>();
		let [header, payload, signature] = segments.as_slice() else {
			return Err(TokenError::Format { reason: "expected exactly three segments" });
		};
		let header_bytes = URL_SAFE_NO_PAD
			.decode(header)
			.map_err(|_| TokenError::Format { reason: "header segment is not base64url" })?;

		URL_SAFE_NO_PAD
			.decode(payload)
			.map_err(|_| TokenError::Format { reason: "payload segment is not base64url" })?;
		URL_SAFE_NO_PAD
			.decode(signature)
			.map_err(|_| TokenError::Format { reason: "signature segment is not base64url" })?;

		let header = serde_json::from_slice::<JwsHeader>(&header_bytes)
			.map_err(|_| TokenError::Format { reason: "header segment is not valid JSON" })?;

		Ok(Self { header, compact })
	}

	/// Rejects every signing algorithm except RS256.
	///
	/// Runs on the raw header before any key material is consulted, so an
	/// algorithm-substitution attempt never reaches signature verification.
	pub fn require_rs256(&self) -> Result<(), TokenError> {
		if self.header.alg == REQUIRED_ALG {
			Ok(())
		} else {
			Err(TokenError::UnsupportedAlgorithm { alg: self.header.alg.clone() })
		}
	}

	/// Key id from the header, if the policy publishes one.
	pub fn key_id(&self) -> Option<&str> {
		self.header.kid.as_deref()
	}

	/// Verifies the RS256 signature and decodes the payload.
	///
	/// The library's built-in claim validation stays disabled; the pipeline in
	/// [`claims`] is the only claim authority. The returned claims are
	/// signature-verified but not yet checked.
	pub fn verify_signature(&self, key: &DecodingKey) -> Result<IdentityTokenClaims, TokenError> {
		let mut validation = Validation::new(Algorithm::RS256);

		validation.validate_exp = false;
		validation.validate_nbf = false;
		validation.validate_aud = false;
		validation.required_spec_claims.clear();

		let decoded = jsonwebtoken::decode::<IdentityTokenClaims>(self.compact, key, &validation)
			.map_err(|source| TokenError::Signature { source })?;

		Ok(decoded.claims)
	}

	/// The original compact serialization.
	pub fn as_str(&self) -> &'a str {
		self.compact
	}
}
