//! Pure helpers: plan-time validation and secret hashing

use sha2::{Digest, Sha256};

use super::schema::requires_principal;
use crate::error::{Error, Result};

/// Check the principal rule for a platform
///
/// Platforms in the principal-required set need a present, non-empty
/// `platform_principal`. Every other platform passes unconditionally.
pub fn validate(platform: &str, platform_principal: Option<&str>) -> Result<()> {
    if !requires_principal(platform) {
        return Ok(());
    }

    match platform_principal {
        None => Err(Error::missing_principal(platform)),
        Some("") => Err(Error::empty_principal(platform)),
        Some(_) => Ok(()),
    }
}

/// SHA-256 of `value`, rendered as lowercase hex
///
/// Gives secret-bearing fields a stable, non-reversible local representation.
pub fn hash_content(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}
