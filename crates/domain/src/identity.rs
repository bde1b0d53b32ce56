use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// One-way token standing in for "the same caller". Never the raw origin.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityToken(String);

impl IdentityToken {
    pub fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are pseudonymous but still linkable, keep them out of logs.
impl fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "IdentityToken({}..)", prefix)
    }
}

/// Derives identity tokens from forwarded-origin headers.
///
/// The origin is keyed into HMAC-SHA256 with a per-deployment salt, so the
/// persisted token cannot be turned back into an address without the salt.
#[derive(Clone)]
pub struct IdentityDeriver {
    mac: HmacSha256,
}

impl IdentityDeriver {
    pub fn new(salt: &str) -> Self {
        let mac = HmacSha256::new_from_slice(salt.as_bytes())
            .expect("HMAC accepts keys of any length");
        Self { mac }
    }

    /// `origin_chain` is the raw `X-Forwarded-For` value, leftmost entry being
    /// the original client. `fallback` is the single-address header.
    ///
    /// Unknown origins all hash the empty string and share one identity.
    pub fn derive(&self, origin_chain: Option<&str>, fallback: Option<&str>) -> IdentityToken {
        let origin = resolve_origin(origin_chain, fallback);
        self.token_for(origin)
    }

    pub fn token_for(&self, origin: &str) -> IdentityToken {
        let mut mac = self.mac.clone();
        mac.update(origin.as_bytes());
        IdentityToken(hex::encode(mac.finalize().into_bytes()))
    }
}

fn resolve_origin<'a>(origin_chain: Option<&'a str>, fallback: Option<&'a str>) -> &'a str {
    let first_hop = origin_chain
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty());

    match first_hop {
        Some(hop) => hop,
        None => fallback.map(str::trim).unwrap_or(""),
    }
}
