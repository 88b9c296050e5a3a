// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Private key loading for the local-key connector.
//!
//! Keys arrive either as hex (`KDAO_PRIVATE_KEY`) or as a PEM file
//! (`KDAO_KEY_PEM`, SEC1 or PKCS#8). Both end up as an alloy
//! [`PrivateKeySigner`].

use alloy::signers::local::PrivateKeySigner;
use k256::SecretKey;

use crate::blockchain::ChainClientError;

/// Parse a private key from PEM format to a hex string.
///
/// # Returns
/// * `Ok(String)` - Hex-encoded private key (64 characters, no 0x prefix)
/// * `Err(ChainClientError)` - If PEM parsing fails
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, ChainClientError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| ChainClientError::InvalidPrivateKey(format!("Invalid UTF-8: {e}")))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| ChainClientError::InvalidPrivateKey(format!("Invalid PEM: {e}")))?;

    // SEC1 ("EC PRIVATE KEY") first, then PKCS#8 ("PRIVATE KEY")
    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| ChainClientError::InvalidPrivateKey(format!("Invalid key format: {e}")))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Create a signer from a hex private key, with or without `0x`.
pub fn signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner, ChainClientError> {
    let trimmed = private_key_hex.trim();
    let key_bytes = alloy::hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
        .map_err(|e| ChainClientError::InvalidPrivateKey(e.to_string()))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| ChainClientError::InvalidPrivateKey(e.to_string()))
}

/// Create a signer from a PEM-encoded private key.
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, ChainClientError> {
    let hex_key = pem_to_hex(pem_bytes)?;
    signer_from_hex(&hex_key)
}

#[cfg(test)]
mod tests {
    use k256::pkcs8::{EncodePrivateKey, LineEnding};

    use super::*;

    const TEST_KEY_HEX: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn test_pem() -> String {
        let bytes = alloy::hex::decode(TEST_KEY_HEX).unwrap();
        let secret = SecretKey::from_slice(&bytes).unwrap();
        secret.to_pkcs8_pem(LineEnding::LF).unwrap().to_string()
    }

    #[test]
    fn test_pem_to_hex() {
        let hex = pem_to_hex(test_pem().as_bytes()).unwrap();
        assert_eq!(hex, TEST_KEY_HEX);
    }

    #[test]
    fn pem_and_hex_yield_same_address() {
        let from_pem = signer_from_pem(test_pem().as_bytes()).unwrap();
        let from_hex = signer_from_hex(TEST_KEY_HEX).unwrap();
        let prefixed = signer_from_hex(&format!("0x{TEST_KEY_HEX}")).unwrap();

        assert_eq!(from_pem.address(), from_hex.address());
        assert_eq!(prefixed.address(), from_hex.address());
    }

    #[test]
    fn garbage_keys_are_rejected() {
        assert!(matches!(
            signer_from_hex("zz"),
            Err(ChainClientError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            signer_from_pem(b"not a pem"),
            Err(ChainClientError::InvalidPrivateKey(_))
        ));
    }
}
