//! Signing key sets published by the provider, cached per location.

// std
use std::collections::HashMap;
// crates.io
use jsonwebtoken::DecodingKey;
// self
use crate::{_prelude::*, error::TokenError, http::HttpTransport};

const UNSPECIFIED_KID: &str = "<unspecified>";

/// A single JSON Web Key, reduced to the RSA fields RS256 verification needs.
#[derive(Clone, Debug, Deserialize)]
pub struct Jwk {
	/// Key id referenced by token headers.
	#[serde(default)]
	pub kid: Option<String>,
	/// Key type; only `RSA` keys are usable here.
	pub kty: String,
	/// Advertised algorithm, informational only.
	#[serde(default)]
	pub alg: Option<String>,
	/// RSA modulus, base64url.
	#[serde(default)]
	pub n: Option<String>,
	/// RSA public exponent, base64url.
	#[serde(default)]
	pub e: Option<String>,
}
impl Jwk {
	/// Builds a verification key from the RSA components.
	pub fn to_decoding_key(&self) -> Result<DecodingKey, TokenError> {
		let kid = self.kid.clone().unwrap_or_else(|| UNSPECIFIED_KID.to_owned());

		if self.kty != "RSA" {
			return Err(TokenError::UnusableKey { kid, reason: "key type is not RSA" });
		}

		let n = self.n.as_deref().ok_or(TokenError::UnusableKey {
			kid: kid.clone(),
			reason: "modulus component is missing",
		})?;
		let e = self.e.as_deref().ok_or(TokenError::UnusableKey {
			kid: kid.clone(),
			reason: "exponent component is missing",
		})?;

		DecodingKey::from_rsa_components(n, e).map_err(|source| TokenError::Signature { source })
	}
}

/// Key set published at a policy's `jwks_uri`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct JwkSet {
	/// Keys in publication order.
	pub keys: Vec<Jwk>,
}
impl JwkSet {
	/// Finds the key matching `kid`, or the first key when the token header
	/// does not name one.
	pub fn find(&self, kid: Option<&str>) -> Option<&Jwk> {
		match kid {
			Some(kid) => self.keys.iter().find(|key| key.kid.as_deref() == Some(kid)),
			None => self.keys.first(),
		}
	}
}

/// Fetches and caches one [`JwkSet`] per key-set location.
///
/// Same lifecycle as the metadata cache: fetch-on-miss, first successful
/// fetch wins for the process lifetime. A key id that is absent from a
/// cached set is fatal for the attempt; rotated keys are picked up on
/// restart.
pub struct SigningKeys<C>
where
	C: HttpTransport,
{
	http_client: Arc<C>,
	cache: Mutex<HashMap<Url, Arc<JwkSet>>>,
}
impl<C> SigningKeys<C>
where
	C: HttpTransport,
{
	/// Creates an empty cache backed by the provided transport.
	pub fn new(http_client: Arc<C>) -> Self {
		Self { http_client, cache: Mutex::new(HashMap::new()) }
	}

	/// Resolves the verification key for a token header.
	pub async fn decoding_key(
		&self,
		jwks_uri: &Url,
		kid: Option<&str>,
	) -> Result<DecodingKey, TokenError> {
		let key_set = self.key_set(jwks_uri).await?;
		let key = key_set.find(kid).ok_or_else(|| TokenError::UnknownKeyId {
			kid: kid.unwrap_or(UNSPECIFIED_KID).to_owned(),
		})?;

		key.to_decoding_key()
	}

	async fn key_set(&self, jwks_uri: &Url) -> Result<Arc<JwkSet>, TokenError> {
		if let Some(found) = self.cache.lock().get(jwks_uri) {
			return Ok(found.clone());
		}

		let body = self
			.http_client
			.get(jwks_uri)
			.await
			.map_err(|source| TokenError::KeyFetch { source })?;
		let mut deserializer = serde_json::Deserializer::from_slice(&body);
		let key_set: JwkSet = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| TokenError::KeyParse { source })?;
		let key_set = Arc::new(key_set);

		// Concurrent misses may fetch redundantly; last insert wins and the
		// sets are identical, so no single-flight guard is needed here.
		self.cache.lock().insert(jwks_uri.clone(), key_set.clone());

		Ok(key_set)
	}
}
impl<C> Debug for SigningKeys<C>
where
	C: HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SigningKeys").field("cached_sets", &self.cache.lock().len()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn rsa_jwk(kid: &str) -> Jwk {
		Jwk {
			kid: Some(kid.into()),
			kty: "RSA".into(),
			alg: Some("RS256".into()),
			n: Some("sXchYvVoEkbEt-TPX1i3HJ34QGTdzUCSrngEWmY9fMNeTjoVH1GBpLqVsjkUmfHCNB8".into()),
			e: Some("AQAB".into()),
		}
	}

	#[test]
	fn find_prefers_the_matching_kid() {
		let set = JwkSet { keys: vec![rsa_jwk("key-1"), rsa_jwk("key-2")] };

		assert_eq!(
			set.find(Some("key-2")).and_then(|key| key.kid.as_deref()),
			Some("key-2"),
		);
		assert!(set.find(Some("key-3")).is_none());
	}

	#[test]
	fn find_falls_back_to_the_first_key_without_a_kid() {
		let set = JwkSet { keys: vec![rsa_jwk("key-1"), rsa_jwk("key-2")] };

		assert_eq!(set.find(None).and_then(|key| key.kid.as_deref()), Some("key-1"));
	}

	#[test]
	fn non_rsa_keys_are_unusable() {
		let key = Jwk {
			kid: Some("ec-key".into()),
			kty: "EC".into(),
			alg: None,
			n: None,
			e: None,
		};
		let err = key.to_decoding_key().err().expect("EC keys should be unusable.");

		assert!(matches!(err, TokenError::UnusableKey { reason: "key type is not RSA", .. }));
	}

	#[test]
	fn rsa_keys_missing_components_are_unusable() {
		let mut key = rsa_jwk("key-1");

		key.e = None;

		let err = key.to_decoding_key().err().expect("Keys without an exponent are unusable.");

		assert!(matches!(
			err,
			TokenError::UnusableKey { reason: "exponent component is missing", .. },
		));
	}
}
