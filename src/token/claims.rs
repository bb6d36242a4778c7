//! Verified claim set and the fixed claim-validation pipeline.
//!
//! The checks run as an explicit ordered list over the decoded claims plus
//! the expectations derived from configuration and resolved metadata. Each
//! check owns one [`ClaimError`] variant. There is deliberately no
//! registration surface: the list is the whole pipeline.

// std
use std::collections::BTreeMap;
// self
use crate::{_prelude::*, error::ClaimError};

/// Leeway granted to future-dated claims (`iat`, `nbf`) to absorb clock drift
/// between this host and the issuer. Expiry is checked strictly.
pub const CLOCK_SKEW: Duration = Duration::seconds(60);

/// `aud` claim in either of its RFC 7519 shapes.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Audience {
	/// A single audience string.
	Single(String),
	/// A list of audience strings.
	Many(Vec<String>),
}
impl Audience {
	/// Returns true if the audience names the provided client id.
	pub fn contains(&self, client_id: &str) -> bool {
		match self {
			Audience::Single(value) => value == client_id,
			Audience::Many(values) => values.iter().any(|value| value == client_id),
		}
	}
}

/// Decoded identity-token payload.
///
/// Every field is optional at the serde layer; presence requirements are
/// enforced by the validation pipeline and by
/// [`NormalizedUser::from_claims`](crate::user::NormalizedUser::from_claims).
/// Claims outside the modeled set are retained in `extra` for callers.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct IdentityTokenClaims {
	/// Issuer of the token.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub iss: Option<String>,
	/// Intended audience(s).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub aud: Option<Audience>,
	/// Expiration time as a unix timestamp.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub exp: Option<i64>,
	/// Not-before time as a unix timestamp.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub nbf: Option<i64>,
	/// Issued-at time as a unix timestamp.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub iat: Option<i64>,
	/// Directory object id of the authenticated user.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub oid: Option<String>,
	/// Given name attribute.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub given_name: Option<String>,
	/// Family name attribute.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub family_name: Option<String>,
	/// Email addresses collected by the policy, first entry preferred.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub emails: Vec<String>,
	/// Claims outside the modeled set, preserved verbatim.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}

/// Expected values the pipeline validates claims against.
#[derive(Clone, Copy, Debug)]
pub struct ClaimExpectations<'a> {
	/// Issuer published by the sign-in policy's discovery document.
	pub issuer: &'a str,
	/// Configured OAuth client id the audience must contain.
	pub audience: &'a str,
	/// Validation instant, injected for testability.
	pub now: OffsetDateTime,
}

type ClaimCheck = fn(&IdentityTokenClaims, &ClaimExpectations) -> Result<(), ClaimError>;

/// The complete pipeline, in evaluation order.
const CLAIM_CHECKS: [ClaimCheck; 5] =
	[check_issuer, check_issued_at, check_not_before, check_expiration, check_audience];

/// Runs every claim check, stopping at the first failure.
///
/// There is no partial success: callers must treat any error as a fully
/// rejected token.
pub fn check_claims(
	claims: &IdentityTokenClaims,
	expectations: &ClaimExpectations,
) -> Result<(), ClaimError> {
	for check in CLAIM_CHECKS {
		check(claims, expectations)?;
	}

	Ok(())
}

fn check_issuer(
	claims: &IdentityTokenClaims,
	expectations: &ClaimExpectations,
) -> Result<(), ClaimError> {
	let found = claims.iss.as_deref().unwrap_or_default();

	if found == expectations.issuer {
		Ok(())
	} else {
		Err(ClaimError::Issuer {
			expected: expectations.issuer.to_owned(),
			found: found.to_owned(),
		})
	}
}

fn check_issued_at(
	claims: &IdentityTokenClaims,
	expectations: &ClaimExpectations,
) -> Result<(), ClaimError> {
	let iat = claims.iat.ok_or(ClaimError::IssuedAt)?;
	let issued_at = timestamp(iat, ClaimError::IssuedAt)?;

	if issued_at > expectations.now + CLOCK_SKEW {
		return Err(ClaimError::IssuedAt);
	}

	Ok(())
}

fn check_not_before(
	claims: &IdentityTokenClaims,
	expectations: &ClaimExpectations,
) -> Result<(), ClaimError> {
	let Some(nbf) = claims.nbf else {
		return Ok(());
	};
	let not_before = timestamp(nbf, ClaimError::NotBefore)?;

	if not_before > expectations.now + CLOCK_SKEW {
		return Err(ClaimError::NotBefore);
	}

	Ok(())
}

fn check_expiration(
	claims: &IdentityTokenClaims,
	expectations: &ClaimExpectations,
) -> Result<(), ClaimError> {
	let exp = claims.exp.ok_or(ClaimError::Expired)?;
	let expires_at = timestamp(exp, ClaimError::Expired)?;

	if expires_at <= expectations.now {
		return Err(ClaimError::Expired);
	}

	Ok(())
}

fn check_audience(
	claims: &IdentityTokenClaims,
	expectations: &ClaimExpectations,
) -> Result<(), ClaimError> {
	match &claims.aud {
		Some(audience) if audience.contains(expectations.audience) => Ok(()),
		_ => Err(ClaimError::Audience),
	}
}

fn timestamp(unix: i64, or: ClaimError) -> Result<OffsetDateTime, ClaimError> {
	OffsetDateTime::from_unix_timestamp(unix).map_err(|_| or)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const ISSUER: &str = "https://contoso.b2clogin.com/tfp/11111111/v2.0/";
	const CLIENT_ID: &str = "client-abc";

	fn now() -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(1_700_000_000)
			.expect("Fixture timestamp should be valid.")
	}

	fn valid_claims() -> IdentityTokenClaims {
		IdentityTokenClaims {
			iss: Some(ISSUER.into()),
			aud: Some(Audience::Single(CLIENT_ID.into())),
			exp: Some(now().unix_timestamp() + 3600),
			nbf: Some(now().unix_timestamp() - 10),
			iat: Some(now().unix_timestamp() - 10),
			..Default::default()
		}
	}

	fn expectations() -> ClaimExpectations<'static> {
		ClaimExpectations { issuer: ISSUER, audience: CLIENT_ID, now: now() }
	}

	#[test]
	fn valid_claims_pass_the_pipeline() {
		check_claims(&valid_claims(), &expectations()).expect("Valid claims should pass.");
	}

	#[test]
	fn issuer_mismatch_is_rejected() {
		let mut claims = valid_claims();

		claims.iss = Some("https://evil.example.com/".into());

		let err = check_claims(&claims, &expectations())
			.expect_err("Foreign issuers should be rejected.");

		assert!(matches!(err, ClaimError::Issuer { .. }));
	}

	#[test]
	fn missing_issuer_is_rejected() {
		let mut claims = valid_claims();

		claims.iss = None;

		assert!(matches!(
			check_claims(&claims, &expectations()),
			Err(ClaimError::Issuer { found, .. }) if found.is_empty(),
		));
	}

	#[test]
	fn issued_at_must_be_present() {
		let mut claims = valid_claims();

		claims.iat = None;

		assert_eq!(check_claims(&claims, &expectations()), Err(ClaimError::IssuedAt));
	}

	#[test]
	fn issued_at_tolerates_skew_but_not_more() {
		let mut claims = valid_claims();

		claims.iat = Some(now().unix_timestamp() + CLOCK_SKEW.whole_seconds());

		check_claims(&claims, &expectations()).expect("Skew-bounded issued-at should pass.");

		claims.iat = Some(now().unix_timestamp() + CLOCK_SKEW.whole_seconds() + 1);

		assert_eq!(check_claims(&claims, &expectations()), Err(ClaimError::IssuedAt));
	}

	#[test]
	fn future_not_before_is_rejected() {
		let mut claims = valid_claims();

		claims.nbf = Some(now().unix_timestamp() + CLOCK_SKEW.whole_seconds() + 1);

		assert_eq!(check_claims(&claims, &expectations()), Err(ClaimError::NotBefore));
	}

	#[test]
	fn absent_not_before_is_tolerated() {
		let mut claims = valid_claims();

		claims.nbf = None;

		check_claims(&claims, &expectations()).expect("Tokens without nbf should pass.");
	}

	#[test]
	fn expiry_one_second_in_the_past_is_rejected() {
		let mut claims = valid_claims();

		claims.exp = Some(now().unix_timestamp() - 1);

		assert_eq!(check_claims(&claims, &expectations()), Err(ClaimError::Expired));
	}

	#[test]
	fn missing_expiry_is_rejected() {
		let mut claims = valid_claims();

		claims.exp = None;

		assert_eq!(check_claims(&claims, &expectations()), Err(ClaimError::Expired));
	}

	#[test]
	fn audience_list_must_name_the_client() {
		let mut claims = valid_claims();

		claims.aud = Some(Audience::Many(vec!["other".into(), CLIENT_ID.into()]));

		check_claims(&claims, &expectations()).expect("Audience lists naming us should pass.");

		claims.aud = Some(Audience::Many(vec!["other".into()]));

		assert_eq!(check_claims(&claims, &expectations()), Err(ClaimError::Audience));
	}

	#[test]
	fn audience_shapes_deserialize() {
		let single: Audience = serde_json::from_str("\"client-abc\"")
			.expect("String audiences should deserialize.");
		let many: Audience = serde_json::from_str("[\"a\", \"client-abc\"]")
			.expect("List audiences should deserialize.");

		assert!(single.contains("client-abc"));
		assert!(many.contains("client-abc"));
	}
}
