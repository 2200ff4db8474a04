// src/networks.rs
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Networks the bridge can point the dApp frame at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    Mainnet,
    Goerli,
    Sepolia,
}

impl NetworkId {
    /// Parse a network name as it appears in configuration
    pub fn from_name(name: &str) -> Result<Self, String> {
        match name.to_lowercase().as_str() {
            "mainnet" => Ok(NetworkId::Mainnet),
            "goerli" => Ok(NetworkId::Goerli),
            "sepolia" => Ok(NetworkId::Sepolia),
            other => Err(format!("Unknown network: {}", other)),
        }
    }
}

/// Static facts about a network: identifiers, node endpoint, explorer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub network_id: u64,
    pub chain_id: u64,
    pub node_url: &'static str,
    pub etherscan_base_url: &'static str,
    pub display_name: &'static str,
}

static NETWORKS_INFO: Lazy<HashMap<NetworkId, NetworkInfo>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert(
        NetworkId::Mainnet,
        NetworkInfo {
            network_id: 1,
            chain_id: 1,
            node_url: "https://cloudflare-eth.com",
            etherscan_base_url: "https://etherscan.io",
            display_name: "Mainnet",
        },
    );
    map.insert(
        NetworkId::Goerli,
        NetworkInfo {
            network_id: 5,
            chain_id: 5,
            node_url: "https://rpc.ankr.com/eth_goerli",
            etherscan_base_url: "https://goerli.etherscan.io",
            display_name: "Goerli",
        },
    );
    map.insert(
        NetworkId::Sepolia,
        NetworkInfo {
            network_id: 11155111,
            chain_id: 11155111,
            node_url: "https://rpc.sepolia.org",
            etherscan_base_url: "https://sepolia.etherscan.io",
            display_name: "Sepolia",
        },
    );
    map
});

/// Look up the static info for a network
pub fn info(network: NetworkId) -> &'static NetworkInfo {
    &NETWORKS_INFO[&network]
}
