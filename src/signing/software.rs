// src/signing/software.rs
use async_trait::async_trait;
use rlp::RlpStream;
use sha3::{Digest, Keccak256};
use std::error::Error;

use crate::signing::{TransactionSigner, TxEnvelope};
use crate::wallet::UnlockedAccount;

/// Signs with the unlocked account's in-process secp256k1 key.
/// Transactions use the legacy envelope with EIP-155 replay protection;
/// messages use the EIP-191 personal-sign prefix.
#[derive(Clone)]
pub struct SoftwareSigner {
    account: UnlockedAccount,
}

impl SoftwareSigner {
    pub fn new(account: UnlockedAccount) -> Self {
        Self { account }
    }
}

#[async_trait]
impl TransactionSigner for SoftwareSigner {
    fn address(&self) -> String {
        self.account.address.clone()
    }

    async fn sign_transaction(&self, tx: &TxEnvelope) -> Result<String, Box<dyn Error>> {
        let unsigned = encode_envelope(tx, None)?;
        let digest = keccak256(&unsigned);

        let (signature, recovery_id) = self
            .account
            .signing_key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| format!("Signing failed: {}", e))?;

        let bytes = signature.to_bytes();
        let r = trim_leading_zeros(&bytes[..32]);
        let s = trim_leading_zeros(&bytes[32..]);
        let v = tx.chain_id * 2 + 35 + recovery_id.to_byte() as u64;

        let signed = encode_envelope(tx, Some((v, r, s)))?;
        Ok(format!("0x{}", hex::encode(signed)))
    }

    async fn sign_message(&self, message: &[u8]) -> Result<String, Box<dyn Error>> {
        let digest = personal_message_digest(message);

        let (signature, recovery_id) = self
            .account
            .signing_key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| format!("Signing failed: {}", e))?;

        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = 27 + recovery_id.to_byte();
        Ok(format!("0x{}", hex::encode(out)))
    }

    fn name(&self) -> String {
        format!("Software Wallet: {}", self.account.name)
    }
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// EIP-191: keccak256("\x19Ethereum Signed Message:\n" + len + message)
fn personal_message_digest(message: &[u8]) -> [u8; 32] {
    let mut buf = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
    buf.extend_from_slice(message);
    keccak256(&buf)
}

/// RLP legacy envelope. Unsigned form carries (chain_id, 0, 0) in the
/// signature slots per EIP-155; the signed form carries (v, r, s).
fn encode_envelope(
    tx: &TxEnvelope,
    signature: Option<(u64, Vec<u8>, Vec<u8>)>,
) -> Result<Vec<u8>, String> {
    let gas_price = optional_quantity_bytes(tx.gas_price.as_deref())?;
    let gas_limit = optional_quantity_bytes(tx.gas_limit.as_deref())?;
    let value = optional_quantity_bytes(tx.value.as_deref())?;
    let data = hex_bytes(&tx.data)?;
    let to = match &tx.to {
        Some(address) => address_bytes(address)?,
        None => Vec::new(),
    };

    let mut stream = RlpStream::new_list(9);
    stream.append(&tx.nonce);
    stream.append(&gas_price);
    stream.append(&gas_limit);
    stream.append(&to);
    stream.append(&value);
    stream.append(&data);
    match signature {
        Some((v, r, s)) => {
            stream.append(&v);
            stream.append(&r);
            stream.append(&s);
        }
        None => {
            stream.append(&tx.chain_id);
            stream.append(&0u8);
            stream.append(&0u8);
        }
    }
    Ok(stream.out().to_vec())
}

/// Minimal big-endian bytes of a hex quantity; absent encodes as zero
fn optional_quantity_bytes(quantity: Option<&str>) -> Result<Vec<u8>, String> {
    match quantity {
        Some(q) => {
            let digits = q
                .strip_prefix("0x")
                .ok_or_else(|| format!("Quantity missing 0x prefix: {}", q))?;
            let trimmed = digits.trim_start_matches('0');
            if trimmed.is_empty() {
                return Ok(Vec::new());
            }
            let padded = if trimmed.len() % 2 == 1 {
                format!("0{}", trimmed)
            } else {
                trimmed.to_string()
            };
            hex::decode(&padded).map_err(|e| format!("Invalid quantity {}: {}", q, e))
        }
        None => Ok(Vec::new()),
    }
}

fn hex_bytes(data: &str) -> Result<Vec<u8>, String> {
    let digits = data
        .strip_prefix("0x")
        .ok_or_else(|| format!("Hex data missing 0x prefix: {}", data))?;
    hex::decode(digits).map_err(|e| format!("Invalid hex data {}: {}", data, e))
}

fn address_bytes(address: &str) -> Result<Vec<u8>, String> {
    let bytes = hex_bytes(address)?;
    if bytes.len() != 20 {
        return Err(format!("Address is not 20 bytes: {}", address));
    }
    Ok(bytes)
}

fn trim_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    bytes[start..].to_vec()
}
