// src/signing/mod.rs
use async_trait::async_trait;
use std::error::Error;

use crate::wallet::UnlockedAccount;

pub mod software;

use software::SoftwareSigner;

/// The envelope handed to the signer for an authorized transaction.
/// Quantities stay as the hex strings the frame supplied; the signer is
/// responsible for their canonical encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxEnvelope {
    pub to: Option<String>,
    pub nonce: u64,
    pub chain_id: u64,
    pub data: String,
    pub value: Option<String>,
    pub gas_price: Option<String>,
    pub gas_limit: Option<String>,
}

/// Trait for the authority that turns authorized requests into signatures
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// The 0x-prefixed address this signer signs for
    fn address(&self) -> String;

    /// Sign a transaction envelope, returning the raw signed transaction hex
    async fn sign_transaction(&self, tx: &TxEnvelope) -> Result<String, Box<dyn Error>>;

    /// Sign arbitrary bytes as a personal message, returning the signature hex
    async fn sign_message(&self, message: &[u8]) -> Result<String, Box<dyn Error>>;

    /// Get a display name for the signing method
    fn name(&self) -> String;
}

/// Enum to hold different signer types
#[derive(Clone)]
pub enum SignerType {
    Software(SoftwareSigner),
}

impl SignerType {
    /// Create a software signer over the unlocked account's key material
    pub fn from_account(account: &UnlockedAccount) -> Self {
        SignerType::Software(SoftwareSigner::new(account.clone()))
    }
}

#[async_trait]
impl TransactionSigner for SignerType {
    fn address(&self) -> String {
        match self {
            SignerType::Software(s) => s.address(),
        }
    }

    async fn sign_transaction(&self, tx: &TxEnvelope) -> Result<String, Box<dyn Error>> {
        match self {
            SignerType::Software(s) => s.sign_transaction(tx).await,
        }
    }

    async fn sign_message(&self, message: &[u8]) -> Result<String, Box<dyn Error>> {
        match self {
            SignerType::Software(s) => s.sign_message(message).await,
        }
    }

    fn name(&self) -> String {
        match self {
            SignerType::Software(s) => s.name(),
        }
    }
}
