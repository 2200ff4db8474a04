use crate::networks::NetworkId;

/// Runtime configuration, loaded from environment variables
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Port the frame transport listens on
    pub port: u16,
    /// Network the bridge starts on
    pub network: NetworkId,
    /// Hex private key to unlock at startup; stands in for the external
    /// unlock flow
    pub private_key: Option<String>,
}

impl BridgeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("BRIDGE_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9743),
            network: std::env::var("BRIDGE_NETWORK")
                .ok()
                .and_then(|v| NetworkId::from_name(&v).ok())
                .unwrap_or(NetworkId::Mainnet),
            private_key: std::env::var("WALLET_PRIVATE_KEY").ok(),
        }
    }
}
