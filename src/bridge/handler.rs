use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::alerts::AlertSink;
use crate::bridge::classify::{classify, Classification};
use crate::bridge::outbox::{Outbox, QueuedMessage};
use crate::bridge::protocol::{
    ActionableRequest, InboundMessage, OutboundMessage, RpcError, TransactionParams,
    DEFAULT_REJECT_REASON, ERR_USER_REJECTED,
};
use crate::bridge::queue::PendingQueue;
use crate::networks::{self, NetworkId, NetworkInfo};
use crate::rpc::NodeGateway;
use crate::signing::{SignerType, TransactionSigner, TxEnvelope};
use crate::validation;
use crate::wallet::UnlockedAccount;

/// The provider bridge: consumes frame messages, drives classification,
/// the pending queue and the authorization flow, and feeds the outbound
/// bus. All shared state lives behind its locks; locks are never held
/// across gateway or signing calls.
pub struct ProviderBridge {
    unlocked_account: Arc<Mutex<Option<UnlockedAccount>>>,
    network: Arc<Mutex<NetworkId>>,
    pending: Arc<Mutex<PendingQueue>>,
    outbox: Arc<Mutex<Outbox>>,
    gateway: Arc<dyn NodeGateway>,
    alerts: AlertSink,
}

impl ProviderBridge {
    pub fn new(network: NetworkId, gateway: Arc<dyn NodeGateway>, alerts: AlertSink) -> Self {
        Self {
            unlocked_account: Arc::new(Mutex::new(None)),
            network: Arc::new(Mutex::new(network)),
            pending: Arc::new(Mutex::new(PendingQueue::new())),
            outbox: Arc::new(Mutex::new(Outbox::new())),
            gateway,
            alerts,
        }
    }

    /// A raw message has arrived from the dApp frame
    pub async fn handle_message(&self, raw: &str) {
        // Parse untrusted input into a canonical, fully-owned value before
        // anything else looks at it
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Dropping frame message that is not JSON: {}", e);
                return;
            }
        };

        let violations = validation::validate_request_envelope(&value);
        if !violations.is_empty() {
            log::warn!("Dropping frame message that failed validation: {:?}", violations);
            return;
        }

        let message: InboundMessage = match serde_json::from_value(value.clone()) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("Dropping frame message with unusable envelope: {}", e);
                return;
            }
        };

        let unlocked_address = self.unlocked_address();

        match classify(&message, unlocked_address.as_deref()) {
            Classification::Synthetic(result) => {
                self.push_outbound(OutboundMessage::Success {
                    id: message.id,
                    result,
                });
            }

            Classification::Reject { code, reason } => {
                log::error!(
                    "Refusing {} request {}: {}",
                    message.method,
                    message.id,
                    reason
                );
                self.push_outbound(OutboundMessage::Error {
                    id: message.id,
                    error: RpcError { code, reason },
                });
            }

            Classification::Actionable(request) => {
                let fresh = {
                    let mut pending = self.pending.lock().unwrap();
                    pending.enqueue(request.clone())
                };
                if fresh {
                    // Surface the new pending request to whoever makes
                    // authorization decisions
                    self.alerts.info(
                        "Authorization requested",
                        format!(
                            "A {} request for {} is waiting for your decision.",
                            request.method(),
                            request.authorizing_address()
                        ),
                    );
                } else {
                    log::warn!("Ignoring duplicate pending request id {}", request.id());
                }
            }

            Classification::PassThrough => {
                let node_url = self.active_network().node_url;
                match self.gateway.raw_request(node_url, &value).await {
                    Ok(response) => {
                        self.push_outbound(OutboundMessage::Relay { payload: response });
                    }
                    Err(e) => {
                        // The frame gets no reply; retrying is its call
                        log::error!("Pass-through request {} failed: {}", message.id, e);
                    }
                }
            }
        }
    }

    /// Authorize a pending request. Runs to a terminal outcome: a success
    /// reply, or a rejection; there is no mid-flight cancellation.
    pub async fn accept_request(&self, id: &Value) {
        let request = {
            let pending = self.pending.lock().unwrap();
            pending.find(id).cloned()
        };
        let Some(request) = request else {
            log::warn!("accept_request for id {} which is not pending", id);
            return;
        };

        // The account may have locked or switched since the request was
        // queued; that is a mismatch, not an error to swallow
        let account = {
            let unlocked = self.unlocked_account.lock().unwrap();
            unlocked.clone()
        };
        let Some(account) = account else {
            self.alerts.error(
                "Failed to accept request",
                "Your account must be unlocked to sign the request.".to_string(),
            );
            self.reject_request(id, None, None);
            return;
        };

        let network_info = self.active_network();

        match request {
            ActionableRequest::SendTransaction { id, params, .. } => {
                self.accept_transaction(&id, params, account, network_info)
                    .await;
            }
            ActionableRequest::SignMessage {
                id, address, data, ..
            } => {
                self.accept_sign_message(&id, &address, &data, account).await;
            }
        }
    }

    async fn accept_transaction(
        &self,
        id: &Value,
        params: TransactionParams,
        account: UnlockedAccount,
        network_info: &'static NetworkInfo,
    ) {
        if params.from != account.address {
            self.alerts.error(
                "Failed to sign transaction",
                "The requested account is not unlocked".to_string(),
            );
            self.reject_request(id, None, None);
            return;
        }

        let nonce = match self
            .gateway
            .get_transaction_count(network_info.node_url, &params.from)
            .await
        {
            Ok(nonce) => nonce,
            Err(e) => {
                self.alerts.error(
                    "Failed to sign transaction",
                    format!(
                        "An unexpected error occurred while attempting to sign the transaction: {}",
                        e
                    ),
                );
                self.reject_request(id, None, Some("Failed to sign the transaction".to_string()));
                return;
            }
        };

        let signer = SignerType::from_account(&account);
        let envelope = TxEnvelope {
            to: params.to,
            nonce,
            chain_id: network_info.chain_id,
            data: params.data,
            value: params.value,
            gas_price: params.gas_price,
            gas_limit: params.gas,
        };

        let signed = match signer.sign_transaction(&envelope).await {
            Ok(signed) => signed,
            Err(e) => {
                self.alerts.error(
                    "Failed to sign transaction",
                    format!(
                        "An unexpected error occurred while attempting to sign the transaction: {}",
                        e
                    ),
                );
                self.reject_request(id, None, Some("Failed to sign the transaction".to_string()));
                return;
            }
        };

        // The signed payload is used once; a failed broadcast discards it
        // and the frame must issue a fresh request
        match self
            .gateway
            .send_raw_transaction(network_info.node_url, &signed)
            .await
        {
            Ok(hash) => {
                let explorer_url =
                    format!("{}/tx/{}", network_info.etherscan_base_url, hash);
                self.alerts.success(
                    "Sent transaction",
                    "The transaction has been signed and broadcast.".to_string(),
                    Some(explorer_url),
                );
                self.resolve_success(id, json!(hash));
            }
            Err(e) => {
                self.alerts.error(
                    "Failed to broadcast signed transaction",
                    format!(
                        "An unexpected error occurred while attempting to broadcast the signed transaction: {}",
                        e
                    ),
                );
                self.reject_request(
                    id,
                    None,
                    Some("Failed to broadcast the signed transaction".to_string()),
                );
            }
        }
    }

    async fn accept_sign_message(
        &self,
        id: &Value,
        address: &str,
        data: &str,
        account: UnlockedAccount,
    ) {
        if address != account.address {
            self.alerts.error(
                "Failed to sign message",
                format!(
                    "The requested signatory address \"{}\" is not the unlocked account.",
                    address
                ),
            );
            self.reject_request(id, None, None);
            return;
        }

        let bytes = match hex::decode(data.strip_prefix("0x").unwrap_or(data)) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.alerts.error(
                    "Failed to sign message",
                    format!("The requested data is not valid hex: {}", e),
                );
                self.reject_request(id, None, Some("Failed to sign the requested data".to_string()));
                return;
            }
        };

        let signer = SignerType::from_account(&account);
        match signer.sign_message(&bytes).await {
            Ok(signature) => {
                self.alerts.success(
                    "Signed message",
                    "The message has been signed.".to_string(),
                    None,
                );
                self.resolve_success(id, json!(signature));
            }
            Err(e) => {
                self.alerts.error(
                    "Failed to sign message",
                    format!(
                        "An unexpected error was encountered while attempting to sign the requested data: {}",
                        e
                    ),
                );
                self.reject_request(id, None, Some("Failed to sign the requested data".to_string()));
            }
        }
    }

    /// Reject a pending request and tell the frame. Defaults to the user
    /// rejection code and reason; a no-op when the id is not pending.
    pub fn reject_request(&self, id: &Value, code: Option<i64>, reason: Option<String>) {
        let removed = {
            let mut pending = self.pending.lock().unwrap();
            pending.remove(id)
        };
        if removed.is_none() {
            log::warn!("reject_request for id {} which is not pending", id);
            return;
        }

        self.push_outbound(OutboundMessage::Error {
            id: id.clone(),
            error: RpcError {
                code: code.unwrap_or(ERR_USER_REJECTED),
                reason: reason.unwrap_or_else(|| DEFAULT_REJECT_REASON.to_string()),
            },
        });
    }

    /// Switch the active network and notify the frame, then the user
    pub fn set_network(&self, network: NetworkId) {
        {
            let mut active = self.network.lock().unwrap();
            *active = network;
        }
        let info = networks::info(network);

        // The unlocked account survives a network switch, so there is no
        // accountsChanged to send here
        self.push_outbound(OutboundMessage::Notification {
            method: "networkChanged".to_string(),
            params: vec![json!(info.network_id)],
        });
        self.push_outbound(OutboundMessage::Notification {
            method: "chainChanged".to_string(),
            params: vec![json!(info.chain_id)],
        });

        self.alerts.info(
            &format!("Switched to {}", info.display_name),
            format!("The network has been changed to {}.", info.display_name),
        );
    }

    /// Replace the unlocked account reference and notify the frame.
    /// The first param is the account list, so it nests in an array.
    pub fn set_unlocked_account(&self, account: Option<UnlockedAccount>) {
        let accounts = match &account {
            Some(account) => json!([account.address]),
            None => json!([]),
        };
        {
            let mut unlocked = self.unlocked_account.lock().unwrap();
            *unlocked = account;
        }
        self.push_outbound(OutboundMessage::Notification {
            method: "accountsChanged".to_string(),
            params: vec![accounts],
        });
    }

    /// Drop all pending requests and undelivered outbound messages. For
    /// when the frame content is replaced and its ids become meaningless.
    pub fn clear_queue(&self) {
        self.pending.lock().unwrap().clear();
        self.outbox.lock().unwrap().clear();
    }

    pub fn pending_requests(&self) -> Vec<ActionableRequest> {
        self.pending.lock().unwrap().entries()
    }

    pub fn network(&self) -> NetworkId {
        *self.network.lock().unwrap()
    }

    pub fn unlocked_address(&self) -> Option<String> {
        let unlocked = self.unlocked_account.lock().unwrap();
        unlocked.as_ref().map(|account| account.address.clone())
    }

    /// Undelivered outbound messages, for the transport to drain
    pub fn outbox_snapshot(&self) -> Vec<QueuedMessage> {
        self.outbox.lock().unwrap().snapshot()
    }

    /// The transport reports which bus ids it actually delivered
    pub fn messages_sent(&self, seqs: &[u64]) {
        self.outbox.lock().unwrap().mark_sent(seqs);
    }

    fn active_network(&self) -> &'static NetworkInfo {
        let network = *self.network.lock().unwrap();
        networks::info(network)
    }

    fn push_outbound(&self, message: OutboundMessage) {
        self.outbox.lock().unwrap().push(message);
    }

    fn resolve_success(&self, id: &Value, result: Value) {
        {
            let mut pending = self.pending.lock().unwrap();
            pending.remove(id);
        }
        self.push_outbound(OutboundMessage::Success {
            id: id.clone(),
            result,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{Alert, AlertLevel};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::mpsc::UnboundedReceiver;

    const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe51296170827936ea5cce4b76994b0f";
    const TX_HASH: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";

    struct MockGateway {
        nonce: u64,
        broadcast: Result<String, String>,
        raw_response: Value,
        nonce_calls: StdMutex<Vec<String>>,
        broadcasts: StdMutex<Vec<String>>,
        proxied: StdMutex<Vec<Value>>,
    }

    impl Default for MockGateway {
        fn default() -> Self {
            Self {
                nonce: 5,
                broadcast: Ok(TX_HASH.to_string()),
                raw_response: json!({"jsonrpc": "2.0", "id": 9, "result": "0x10"}),
                nonce_calls: StdMutex::new(Vec::new()),
                broadcasts: StdMutex::new(Vec::new()),
                proxied: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl NodeGateway for MockGateway {
        async fn get_transaction_count(
            &self,
            _node_url: &str,
            address: &str,
        ) -> Result<u64, String> {
            self.nonce_calls.lock().unwrap().push(address.to_string());
            Ok(self.nonce)
        }

        async fn send_raw_transaction(
            &self,
            _node_url: &str,
            raw_tx: &str,
        ) -> Result<String, String> {
            self.broadcasts.lock().unwrap().push(raw_tx.to_string());
            self.broadcast.clone()
        }

        async fn raw_request(&self, _node_url: &str, body: &Value) -> Result<Value, String> {
            self.proxied.lock().unwrap().push(body.clone());
            Ok(self.raw_response.clone())
        }
    }

    fn new_bridge(
        gateway: MockGateway,
    ) -> (ProviderBridge, Arc<MockGateway>, UnboundedReceiver<Alert>) {
        let gateway = Arc::new(gateway);
        let (alerts, rx) = AlertSink::new();
        let bridge = ProviderBridge::new(NetworkId::Mainnet, gateway.clone(), alerts);
        (bridge, gateway, rx)
    }

    fn test_account() -> UnlockedAccount {
        UnlockedAccount::from_hex_key(TEST_KEY, "primary".to_string()).unwrap()
    }

    fn drain_alerts(rx: &mut UnboundedReceiver<Alert>) -> Vec<Alert> {
        let mut alerts = Vec::new();
        while let Ok(alert) = rx.try_recv() {
            alerts.push(alert);
        }
        alerts
    }

    /// Outbox payloads pushed so far, oldest first
    fn payloads(bridge: &ProviderBridge) -> Vec<Value> {
        bridge
            .outbox_snapshot()
            .into_iter()
            .map(|item| item.payload)
            .collect()
    }

    async fn send(bridge: &ProviderBridge, message: Value) {
        bridge
            .handle_message(&serde_json::to_string(&message).unwrap())
            .await;
    }

    fn tx_message(id: Value, from: &str) -> Value {
        json!({
            "id": id,
            "method": "eth_sendTransaction",
            "params": [{
                "from": from,
                "to": "0x52908400098527886E0F7030069857D2E4169EE7",
                "gas": "0x5208",
                "value": "0xde0b6b3a7640000",
                "gasPrice": "0x3b9aca00",
                "data": "0x"
            }]
        })
    }

    #[tokio::test]
    async fn test_malformed_messages_are_dropped_silently() {
        let (bridge, _, _rx) = new_bridge(MockGateway::default());

        bridge.handle_message("not json at all").await;
        send(&bridge, json!({"method": "eth_accounts"})).await; // no id
        send(&bridge, json!({"id": 1})).await; // no method
        send(&bridge, json!({"id": 1, "method": "eth_sign", "params": {}})).await;

        assert!(bridge.outbox_snapshot().is_empty());
        assert!(bridge.pending_requests().is_empty());
    }

    #[tokio::test]
    async fn test_enable_and_eth_accounts_are_synthetic() {
        let (bridge, gateway, _rx) = new_bridge(MockGateway::default());

        send(&bridge, json!({"id": 1, "method": "enable"})).await;
        send(&bridge, json!({"id": 2, "method": "eth_accounts"})).await;

        let account = test_account();
        let address = account.address.clone();
        bridge.set_unlocked_account(Some(account));
        send(&bridge, json!({"id": 3, "method": "eth_accounts"})).await;

        let payloads = payloads(&bridge);
        assert_eq!(payloads[0]["result"], json!(true));
        assert_eq!(payloads[1]["result"], json!([]));
        // payloads[2] is the accountsChanged notification
        assert_eq!(payloads[3]["result"], json!([address]));

        // Nothing touched the remote node
        assert!(gateway.proxied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transaction_accept_signs_with_fetched_nonce_and_chain_id() {
        let (bridge, gateway, mut rx) = new_bridge(MockGateway::default());
        let account = test_account();
        let address = account.address.clone();
        bridge.set_unlocked_account(Some(account));

        send(&bridge, tx_message(json!(1), &address)).await;
        assert_eq!(bridge.pending_requests().len(), 1);

        // Enqueueing surfaced the request to the authorization collaborator
        let alerts = drain_alerts(&mut rx);
        assert!(alerts
            .iter()
            .any(|alert| alert.header == "Authorization requested"));

        bridge.accept_request(&json!(1)).await;

        assert_eq!(*gateway.nonce_calls.lock().unwrap(), vec![address]);

        // The broadcast payload is a legacy envelope carrying the fetched
        // nonce and the active network's chain id in v
        let broadcasts = gateway.broadcasts.lock().unwrap();
        assert_eq!(broadcasts.len(), 1);
        let bytes = hex::decode(&broadcasts[0][2..]).unwrap();
        let decoded = rlp::Rlp::new(&bytes);
        let nonce: u64 = decoded.val_at(0).unwrap();
        assert_eq!(nonce, 5);
        let v: u64 = decoded.val_at(6).unwrap();
        assert!(v == 37 || v == 38);

        let reply = payloads(&bridge).pop().unwrap();
        assert_eq!(reply["id"], json!(1));
        assert_eq!(reply["result"], json!(TX_HASH));

        assert!(bridge.pending_requests().is_empty());

        let alerts = drain_alerts(&mut rx);
        let success = alerts
            .iter()
            .find(|alert| alert.level == AlertLevel::Success)
            .unwrap();
        assert_eq!(
            success.more_info_url.as_deref(),
            Some(format!("https://etherscan.io/tx/{}", TX_HASH).as_str())
        );
    }

    #[tokio::test]
    async fn test_transaction_for_foreign_address_rejected_without_queueing() {
        let (bridge, _, _rx) = new_bridge(MockGateway::default());
        bridge.set_unlocked_account(Some(test_account()));

        let foreign = "0x52908400098527886E0F7030069857D2E4169EE7";
        send(&bridge, tx_message(json!(1), foreign)).await;

        assert!(bridge.pending_requests().is_empty());
        let reply = payloads(&bridge).pop().unwrap();
        assert_eq!(reply["error"]["code"], json!(-32600));
        assert_eq!(
            reply["error"]["reason"],
            json!(format!("Invalid address: {}", foreign))
        );
    }

    #[tokio::test]
    async fn test_sign_message_roundtrip() {
        let (bridge, _, mut rx) = new_bridge(MockGateway::default());
        let account = test_account();
        let address = account.address.clone();
        bridge.set_unlocked_account(Some(account.clone()));

        let data = "0xdeadbeef";
        send(
            &bridge,
            json!({"id": "sig-1", "method": "eth_sign", "params": [address, data]}),
        )
        .await;
        assert_eq!(bridge.pending_requests().len(), 1);

        bridge.accept_request(&json!("sig-1")).await;

        let expected = SignerType::from_account(&account)
            .sign_message(&hex::decode("deadbeef").unwrap())
            .await
            .unwrap();

        let reply = payloads(&bridge).pop().unwrap();
        assert_eq!(reply["id"], json!("sig-1"));
        assert_eq!(reply["result"], json!(expected));
        assert!(bridge.pending_requests().is_empty());

        let alerts = drain_alerts(&mut rx);
        assert!(alerts.iter().any(|alert| alert.header == "Signed message"));
    }

    #[tokio::test]
    async fn test_reject_uses_default_then_caller_overrides() {
        let (bridge, _, _rx) = new_bridge(MockGateway::default());
        let account = test_account();
        let address = account.address.clone();
        bridge.set_unlocked_account(Some(account));

        send(
            &bridge,
            json!({"id": 1, "method": "eth_sign", "params": [address, "0xaa"]}),
        )
        .await;
        send(
            &bridge,
            json!({"id": 2, "method": "eth_sign", "params": [address, "0xbb"]}),
        )
        .await;

        bridge.reject_request(&json!(1), None, None);
        bridge.reject_request(&json!(2), Some(-32600), Some("Request failed validation".to_string()));

        let payloads = payloads(&bridge);
        let first = &payloads[payloads.len() - 2];
        assert_eq!(first["error"]["code"], json!(1));
        assert_eq!(first["error"]["reason"], json!("The request is not authorized"));

        let second = &payloads[payloads.len() - 1];
        assert_eq!(second["error"]["code"], json!(-32600));
        assert!(bridge.pending_requests().is_empty());
    }

    #[tokio::test]
    async fn test_accept_and_reject_of_absent_id_are_noops() {
        let (bridge, gateway, _rx) = new_bridge(MockGateway::default());
        bridge.set_unlocked_account(Some(test_account()));
        let baseline = bridge.outbox_snapshot().len();

        bridge.accept_request(&json!(404)).await;
        bridge.reject_request(&json!(404), None, None);

        assert_eq!(bridge.outbox_snapshot().len(), baseline);
        assert!(gateway.nonce_calls.lock().unwrap().is_empty());
        assert!(gateway.broadcasts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_account_lost_between_enqueue_and_accept() {
        let (bridge, _, mut rx) = new_bridge(MockGateway::default());
        let account = test_account();
        let address = account.address.clone();
        bridge.set_unlocked_account(Some(account));

        send(
            &bridge,
            json!({"id": 1, "method": "eth_sign", "params": [address, "0xaa"]}),
        )
        .await;
        bridge.set_unlocked_account(None);

        bridge.accept_request(&json!(1)).await;

        let reply = payloads(&bridge).pop().unwrap();
        assert_eq!(reply["error"]["code"], json!(1));
        assert!(bridge.pending_requests().is_empty());

        let alerts = drain_alerts(&mut rx);
        assert!(alerts
            .iter()
            .any(|alert| alert.header == "Failed to accept request"));
    }

    #[tokio::test]
    async fn test_broadcast_failure_is_terminal() {
        let gateway = MockGateway {
            broadcast: Err("nonce too low".to_string()),
            ..MockGateway::default()
        };
        let (bridge, gateway, mut rx) = new_bridge(gateway);
        let account = test_account();
        let address = account.address.clone();
        bridge.set_unlocked_account(Some(account));

        send(&bridge, tx_message(json!(1), &address)).await;
        bridge.accept_request(&json!(1)).await;

        // Signed exactly once, never retried
        assert_eq!(gateway.broadcasts.lock().unwrap().len(), 1);
        assert!(bridge.pending_requests().is_empty());

        let reply = payloads(&bridge).pop().unwrap();
        assert_eq!(
            reply["error"]["reason"],
            json!("Failed to broadcast the signed transaction")
        );

        let alerts = drain_alerts(&mut rx);
        assert!(alerts
            .iter()
            .any(|alert| alert.header == "Failed to broadcast signed transaction"));
    }

    #[tokio::test]
    async fn test_duplicate_id_not_requeued() {
        let (bridge, _, mut rx) = new_bridge(MockGateway::default());
        let account = test_account();
        let address = account.address.clone();
        bridge.set_unlocked_account(Some(account));

        send(
            &bridge,
            json!({"id": 1, "method": "eth_sign", "params": [address, "0xaa"]}),
        )
        .await;
        send(
            &bridge,
            json!({"id": 1, "method": "eth_sign", "params": [address, "0xbb"]}),
        )
        .await;

        let pending = bridge.pending_requests();
        assert_eq!(pending.len(), 1);
        match &pending[0] {
            ActionableRequest::SignMessage { data, .. } => assert_eq!(data, "0xaa"),
            other => panic!("Unexpected entry: {:?}", other),
        }

        // Only the first enqueue surfaced an authorization alert
        let alerts = drain_alerts(&mut rx);
        let prompts = alerts
            .iter()
            .filter(|alert| alert.header == "Authorization requested")
            .count();
        assert_eq!(prompts, 1);
    }

    #[tokio::test]
    async fn test_pass_through_relays_node_response_verbatim() {
        let (bridge, gateway, _rx) = new_bridge(MockGateway::default());

        let request = json!({"id": 9, "method": "eth_getBalance", "params": ["0xabc", "latest"]});
        send(&bridge, request.clone()).await;

        assert_eq!(*gateway.proxied.lock().unwrap(), vec![request]);
        let reply = payloads(&bridge).pop().unwrap();
        assert_eq!(reply, gateway.raw_response);
    }

    #[tokio::test]
    async fn test_set_network_emits_network_then_chain_changed() {
        let (bridge, _, mut rx) = new_bridge(MockGateway::default());

        bridge.set_network(NetworkId::Goerli);
        assert_eq!(bridge.network(), NetworkId::Goerli);

        let payloads = payloads(&bridge);
        assert_eq!(payloads[0]["method"], json!("networkChanged"));
        assert_eq!(payloads[0]["params"], json!([5]));
        assert_eq!(payloads[1]["method"], json!("chainChanged"));
        assert_eq!(payloads[1]["params"], json!([5]));

        let alerts = drain_alerts(&mut rx);
        assert!(alerts
            .iter()
            .any(|alert| alert.header == "Switched to Goerli"));
    }

    #[tokio::test]
    async fn test_accounts_changed_notification_shape() {
        let (bridge, _, _rx) = new_bridge(MockGateway::default());
        let account = test_account();
        let address = account.address.clone();

        bridge.set_unlocked_account(Some(account));
        bridge.set_unlocked_account(None);

        let payloads = payloads(&bridge);
        assert_eq!(payloads[0]["method"], json!("accountsChanged"));
        assert_eq!(payloads[0]["params"], json!([[address]]));
        assert_eq!(payloads[1]["params"], json!([[]]));
    }

    #[tokio::test]
    async fn test_clear_queue_discards_everything_silently() {
        let (bridge, _, _rx) = new_bridge(MockGateway::default());
        let account = test_account();
        let address = account.address.clone();
        bridge.set_unlocked_account(Some(account));

        for id in 1..=3 {
            send(
                &bridge,
                json!({"id": id, "method": "eth_sign", "params": [address, "0xaa"]}),
            )
            .await;
        }
        assert_eq!(bridge.pending_requests().len(), 3);

        bridge.clear_queue();

        assert!(bridge.pending_requests().is_empty());
        // No per-entry error replies either; the whole bus is dropped
        assert!(bridge.outbox_snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_messages_sent_removes_delivered_items() {
        let (bridge, _, _rx) = new_bridge(MockGateway::default());

        send(&bridge, json!({"id": 1, "method": "enable"})).await;
        send(&bridge, json!({"id": 2, "method": "enable"})).await;

        let snapshot = bridge.outbox_snapshot();
        assert_eq!(snapshot.len(), 2);

        bridge.messages_sent(&[snapshot[0].seq]);
        let remaining = bridge.outbox_snapshot();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].seq, snapshot[1].seq);
    }
}
