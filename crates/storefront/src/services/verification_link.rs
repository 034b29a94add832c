//! Signed email hints for verification continue URLs.
//!
//! The continue URL of a verification email carries the address so the
//! landing page can update the profile after Firebase applies the code on
//! its own page. The address alone proves nothing, so it travels with an
//! HMAC-SHA256 signature (`sig`) only this server can produce.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use fragranza_core::Email;

type HmacSha256 = Hmac<Sha256>;

/// Signs and checks the `email` parameter of verification links.
#[derive(Clone)]
pub struct LinkSigner {
    key: SecretString,
}

impl LinkSigner {
    #[must_use]
    pub const fn new(key: SecretString) -> Self {
        Self { key }
    }

    /// Hex signature for `email`.
    #[must_use]
    pub fn sign(&self, email: &Email) -> Option<String> {
        let mut mac = self.keyed()?;
        mac.update(email.as_str().as_bytes());
        Some(hex::encode(mac.finalize().into_bytes()))
    }

    /// Whether `signature` was produced by [`sign`](Self::sign) for `email`.
    ///
    /// Compares in constant time.
    #[must_use]
    pub fn verify(&self, email: &Email, signature: &str) -> bool {
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };
        let Some(mut mac) = self.keyed() else {
            return false;
        };
        mac.update(email.as_str().as_bytes());
        mac.verify_slice(&signature).is_ok()
    }

    fn keyed(&self) -> Option<HmacSha256> {
        HmacSha256::new_from_slice(self.key.expose_secret().as_bytes()).ok()
    }
}

impl std::fmt::Debug for LinkSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSigner")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
