// src/wallet.rs
use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};

/// The single account whose key material is currently decrypted and
/// available for signing. Held by the bridge behind a shared reference,
/// read per authorization decision, never persisted here.
#[derive(Debug, Clone)]
pub struct UnlockedAccount {
    pub signing_key: SigningKey,
    pub address: String,
    pub name: String,
}

impl UnlockedAccount {
    /// Reconstruct from a raw 32-byte secp256k1 private key
    pub fn from_private_key(private_key_bytes: &[u8], name: String) -> Result<Self, String> {
        match private_key_bytes.len() {
            32 => {
                let signing_key = SigningKey::from_slice(private_key_bytes)
                    .map_err(|e| format!("Invalid private key: {}", e))?;
                let address = derive_address(signing_key.verifying_key());
                Ok(Self {
                    signing_key,
                    address,
                    name,
                })
            }
            len => Err(format!("Invalid key length: {} bytes", len)),
        }
    }

    /// Reconstruct from a hex private key, with or without the 0x prefix
    pub fn from_hex_key(key_hex: &str, name: String) -> Result<Self, String> {
        let stripped = key_hex.strip_prefix("0x").unwrap_or(key_hex);
        let bytes = hex::decode(stripped).map_err(|e| format!("Decode error: {}", e))?;
        Self::from_private_key(&bytes, name)
    }

    /// The account's 0x-prefixed hex address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Get the verifying key (public key)
    pub fn verifying_key(&self) -> VerifyingKey {
        *self.signing_key.verifying_key()
    }
}

/// Keccak-256 of the uncompressed public key, last 20 bytes, hex encoded
pub fn derive_address(verifying_key: &VerifyingKey) -> String {
    let point = verifying_key.to_encoded_point(false);
    let digest = Keccak256::digest(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&digest[12..]))
}
