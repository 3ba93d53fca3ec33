use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{Policy, PolicyError};

/// Application secret shared with the Filepicker service.
///
/// The secret is only ever used as an HMAC key. It is never sent over the
/// wire and is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a non-empty secret.
    pub fn new(secret: impl Into<String>) -> Result<Self, PolicyError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(PolicyError::EmptySecret);
        }
        Ok(Self(secret))
    }

    /// The raw secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    fn mac(&self) -> Hmac<Sha256> {
        Hmac::<Sha256>::new_from_slice(self.as_bytes()).expect("HMAC can take key of any size")
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(..)")
    }
}

impl TryFrom<&str> for Secret {
    type Error = PolicyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for Secret {
    type Error = PolicyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// HMAC-SHA256 signature bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// The raw MAC bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for Signature {
    /// Displays lowercase hex encoded representation of the signature
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// A policy encoded for transmission together with its signature.
///
/// Both fields are sent as the `policy` and `signature` query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPolicy {
    /// Lowercase hex HMAC-SHA256 of `policy`, keyed by the app secret.
    pub signature: String,
    /// URL-safe base64 (padded) of the policy JSON.
    pub policy: String,
}

impl SignedPolicy {
    /// Encode and sign a policy.
    ///
    /// This is a pure function of the policy content and the secret.
    pub fn sign(policy: &Policy, secret: &Secret) -> Result<Self, PolicyError> {
        let encoded = URL_SAFE.encode(policy.to_json()?);
        let signature = sign_bytes(secret, encoded.as_bytes());

        Ok(Self {
            signature: signature.to_string(),
            policy: encoded,
        })
    }

    /// Query parameters carrying the signature and the encoded policy.
    pub fn params(&self) -> [(&'static str, String); 2] {
        [
            ("signature", self.signature.clone()),
            ("policy", self.policy.clone()),
        ]
    }

    /// Check that the signature matches the encoded policy under `secret`.
    ///
    /// The comparison runs in constant time.
    pub fn verify(&self, secret: &Secret) -> bool {
        let Ok(expected) = hex::decode(&self.signature) else {
            return false;
        };
        let mut mac = secret.mac();
        mac.update(self.policy.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }

    /// Decode the transmitted policy back into a [`Policy`].
    pub fn decode(&self) -> Result<Policy, PolicyError> {
        let json = URL_SAFE
            .decode(&self.policy)
            .map_err(|e| PolicyError::Decode(e.to_string()))?;
        serde_json::from_slice(&json).map_err(|e| PolicyError::Decode(e.to_string()))
    }
}

/// Compute HMAC-SHA256 of `data` keyed by `secret`.
fn sign_bytes(secret: &Secret, data: &[u8]) -> Signature {
    let mut mac = secret.mac();
    mac.update(data);
    Signature(mac.finalize().into_bytes().to_vec())
}
