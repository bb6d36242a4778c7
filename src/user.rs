//! Mapping verified claims into the caller-facing user record.

// self
use crate::{_prelude::*, token::claims::IdentityTokenClaims};

/// Authenticated user derived from a fully validated identity token.
///
/// Constructed once per successful authentication and never mutated. The
/// verified claim set is retained so callers can inspect attributes beyond
/// the normalized fields.
#[derive(Clone, Debug, Serialize)]
pub struct NormalizedUser {
	/// Directory object id (`oid`).
	pub id: String,
	/// Display name, given and family names joined by a space.
	pub name: String,
	/// Given name attribute.
	pub given_name: String,
	/// Family name attribute.
	pub surname: String,
	/// First email collected by the policy.
	pub email: String,
	/// The full verified claim set backing this record.
	pub claims: IdentityTokenClaims,
}
impl NormalizedUser {
	/// Maps verified claims into a user record.
	///
	/// An absent `oid`, `given_name`, `family_name`, or empty `emails` means
	/// the policy is not configured to emit the attributes this application
	/// needs, so the failure is permanent rather than transient.
	pub fn from_claims(claims: IdentityTokenClaims) -> Result<Self> {
		let id = claims.oid.clone().ok_or(Error::MissingClaim { claim: "oid" })?;
		let given_name =
			claims.given_name.clone().ok_or(Error::MissingClaim { claim: "given_name" })?;
		let surname =
			claims.family_name.clone().ok_or(Error::MissingClaim { claim: "family_name" })?;
		let email =
			claims.emails.first().cloned().ok_or(Error::MissingClaim { claim: "emails" })?;

		Ok(Self { id, name: format!("{given_name} {surname}"), given_name, surname, email, claims })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn ada_claims() -> IdentityTokenClaims {
		IdentityTokenClaims {
			oid: Some("abc".into()),
			given_name: Some("Ada".into()),
			family_name: Some("Lovelace".into()),
			emails: vec!["ada@example.com".into()],
			..Default::default()
		}
	}

	#[test]
	fn maps_the_normalized_fields() {
		let user = NormalizedUser::from_claims(ada_claims())
			.expect("Complete claims should map successfully.");

		assert_eq!(user.id, "abc");
		assert_eq!(user.name, "Ada Lovelace");
		assert_eq!(user.given_name, "Ada");
		assert_eq!(user.surname, "Lovelace");
		assert_eq!(user.email, "ada@example.com");
		assert_eq!(user.claims.oid.as_deref(), Some("abc"));
	}

	#[test]
	fn each_required_claim_is_reported_by_name() {
		let mut claims = ada_claims();

		claims.oid = None;

		assert!(matches!(
			NormalizedUser::from_claims(claims),
			Err(Error::MissingClaim { claim: "oid" }),
		));

		let mut claims = ada_claims();

		claims.family_name = None;

		assert!(matches!(
			NormalizedUser::from_claims(claims),
			Err(Error::MissingClaim { claim: "family_name" }),
		));

		let mut claims = ada_claims();

		claims.emails.clear();

		assert!(matches!(
			NormalizedUser::from_claims(claims),
			Err(Error::MissingClaim { claim: "emails" }),
		));
	}
}
