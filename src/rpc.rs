use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct RpcRequest {
    jsonrpc: String,
    id: u64,
    method: String,
    params: Vec<serde_json::Value>,
}

/// Gateway to the remote JSON-RPC node of whichever network is active.
/// The bridge consumes this seam; tests substitute their own implementation.
#[async_trait]
pub trait NodeGateway: Send + Sync {
    /// Pending-block transaction count for an address, i.e. the next nonce
    async fn get_transaction_count(&self, node_url: &str, address: &str) -> Result<u64, String>;

    /// Broadcast a signed raw transaction, returning the transaction hash
    async fn send_raw_transaction(&self, node_url: &str, raw_tx: &str) -> Result<String, String>;

    /// Proxy an arbitrary request body verbatim and return the node's
    /// response exactly as received
    async fn raw_request(&self, node_url: &str, body: &Value) -> Result<Value, String>;
}

/// JSON-RPC over HTTP POST with a shared reqwest client
pub struct HttpGateway {
    client: Client,
}

impl HttpGateway {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    async fn call(&self, node_url: &str, method: &str, params: Vec<Value>) -> Result<Value, String> {
        let request = RpcRequest {
            jsonrpc: "2.0".to_string(),
            id: 1,
            method: method.to_string(),
            params,
        };

        let response = self
            .client
            .post(node_url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Failed to send request: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("RPC error: {}", response.status()));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e))?;

        if let Some(error) = json.get("error") {
            return Err(format!("RPC error: {:?}", error));
        }

        json.get("result")
            .cloned()
            .ok_or_else(|| format!("Response carried no result: {:?}", json))
    }
}

impl Default for HttpGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeGateway for HttpGateway {
    async fn get_transaction_count(&self, node_url: &str, address: &str) -> Result<u64, String> {
        let result = self
            .call(
                node_url,
                "eth_getTransactionCount",
                vec![
                    Value::String(address.to_string()),
                    Value::String("pending".to_string()),
                ],
            )
            .await?;

        let quantity = result
            .as_str()
            .ok_or_else(|| format!("Transaction count is not a string: {:?}", result))?;
        parse_hex_u64(quantity)
    }

    async fn send_raw_transaction(&self, node_url: &str, raw_tx: &str) -> Result<String, String> {
        let result = self
            .call(
                node_url,
                "eth_sendRawTransaction",
                vec![Value::String(raw_tx.to_string())],
            )
            .await?;

        result
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| format!("Transaction hash is not a string: {:?}", result))
    }

    async fn raw_request(&self, node_url: &str, body: &Value) -> Result<Value, String> {
        let response = self
            .client
            .post(node_url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| format!("Failed to send request: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("RPC error: {}", response.status()));
        }

        response
            .json()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e))
    }
}

/// Parse a 0x-prefixed hex quantity into a u64
pub fn parse_hex_u64(quantity: &str) -> Result<u64, String> {
    let digits = quantity
        .strip_prefix("0x")
        .ok_or_else(|| format!("Quantity missing 0x prefix: {}", quantity))?;
    if digits.is_empty() {
        return Err(format!("Empty hex quantity: {}", quantity));
    }
    u64::from_str_radix(digits, 16).map_err(|e| format!("Invalid hex quantity {}: {}", quantity, e))
}
