use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// JSON-RPC invalid request: failed validation or unauthorized address
pub const ERR_INVALID_REQUEST: i64 = -32600;
/// Default code for a user-rejected actionable request
pub const ERR_USER_REJECTED: i64 = 1;
pub const DEFAULT_REJECT_REASON: &str = "The request is not authorized";

/// A request from the dApp frame, already past envelope validation.
/// Consumed within a single classify-and-dispatch cycle, never retained.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub reason: String,
}

/// Messages destined for the dApp frame
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// A successful reply to a frame request
    Success { id: Value, result: Value },

    /// An error reply to a frame request
    Error { id: Value, error: RpcError },

    /// A lifecycle notification (accountsChanged, networkChanged,
    /// chainChanged); not correlated with any frame request
    Notification { method: String, params: Vec<Value> },

    /// A remote node response relayed verbatim
    Relay { payload: Value },
}

impl OutboundMessage {
    /// The JSON payload the frame sees. `seq` is the host-generated bus id;
    /// notifications borrow it as their synthetic JSON-RPC id.
    pub fn to_payload(&self, seq: u64) -> Value {
        match self {
            OutboundMessage::Success { id, result } => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": result,
            }),
            OutboundMessage::Error { id, error } => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": error.code, "reason": error.reason },
            }),
            OutboundMessage::Notification { method, params } => json!({
                "jsonrpc": "2.0",
                "id": seq,
                "method": method,
                "params": params,
            }),
            OutboundMessage::Relay { payload } => payload.clone(),
        }
    }
}

/// The single parameter object of eth_sendTransaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionParams {
    pub from: String,
    pub to: Option<String>,
    pub gas: Option<String>,
    pub value: Option<String>,
    #[serde(rename = "gasPrice")]
    pub gas_price: Option<String>,
    pub data: String,
}

/// A request that needs explicit user authorization before it can touch
/// key material. Constructed only after validation; the method tag alone
/// is never trusted.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionableRequest {
    SendTransaction {
        id: Value,
        params: TransactionParams,
        received_at: DateTime<Utc>,
    },
    SignMessage {
        id: Value,
        address: String,
        data: String,
        received_at: DateTime<Utc>,
    },
}

impl ActionableRequest {
    pub fn id(&self) -> &Value {
        match self {
            ActionableRequest::SendTransaction { id, .. } => id,
            ActionableRequest::SignMessage { id, .. } => id,
        }
    }

    /// The address that must match the unlocked account for this request
    /// to be authorized
    pub fn authorizing_address(&self) -> &str {
        match self {
            ActionableRequest::SendTransaction { params, .. } => &params.from,
            ActionableRequest::SignMessage { address, .. } => address,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            ActionableRequest::SendTransaction { .. } => "eth_sendTransaction",
            ActionableRequest::SignMessage { .. } => "eth_sign",
        }
    }
}
