use chrono::Utc;
use serde_json::{json, Value};

use crate::bridge::protocol::{ActionableRequest, InboundMessage, ERR_INVALID_REQUEST};
use crate::validation;

const VALIDATION_REASON: &str = "Request failed validation";

/// What the bridge should do with a validated inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Answer immediately from local wallet state
    Synthetic(Value),

    /// Queue for an explicit user decision
    Actionable(ActionableRequest),

    /// Refuse immediately, without queueing
    Reject { code: i64, reason: String },

    /// Proxy verbatim to the active network's remote node
    PassThrough,
}

fn validation_reject() -> Classification {
    Classification::Reject {
        code: ERR_INVALID_REQUEST,
        reason: VALIDATION_REASON.to_string(),
    }
}

/// The mandatory authorizing-address check: a request can only be queued
/// when the wallet could actually sign for the address it names.
fn check_authorized(address: &str, unlocked_address: Option<&str>) -> Option<Classification> {
    match unlocked_address {
        Some(unlocked) if unlocked == address => None,
        _ => Some(Classification::Reject {
            code: ERR_INVALID_REQUEST,
            reason: format!("Invalid address: {}", address),
        }),
    }
}

/// Decide how to handle a message that already passed envelope validation.
/// `unlocked_address` is the address of the currently unlocked account.
pub fn classify(message: &InboundMessage, unlocked_address: Option<&str>) -> Classification {
    match message.method.as_str() {
        "enable" => Classification::Synthetic(json!(true)),

        "eth_accounts" => {
            let accounts = match unlocked_address {
                Some(address) => json!([address]),
                None => json!([]),
            };
            Classification::Synthetic(accounts)
        }

        "eth_sendTransaction" => {
            if message.params.len() != 1 {
                return validation_reject();
            }
            if !validation::validate_transaction_params(&message.params[0]).is_empty() {
                return validation_reject();
            }
            let params = match serde_json::from_value(message.params[0].clone()) {
                Ok(params) => params,
                Err(_) => return validation_reject(),
            };

            let request = ActionableRequest::SendTransaction {
                id: message.id.clone(),
                params,
                received_at: Utc::now(),
            };
            if let Some(reject) = check_authorized(request.authorizing_address(), unlocked_address)
            {
                return reject;
            }
            Classification::Actionable(request)
        }

        "eth_sign" => {
            if message.params.len() != 2 {
                return validation_reject();
            }
            let (address, data) = match (message.params[0].as_str(), message.params[1].as_str()) {
                (Some(address), Some(data)) => (address, data),
                _ => return validation_reject(),
            };
            if !validation::validate_address(address).is_empty()
                || !validation::validate_hex_data(data).is_empty()
            {
                return validation_reject();
            }
            if let Some(reject) = check_authorized(address, unlocked_address) {
                return reject;
            }

            Classification::Actionable(ActionableRequest::SignMessage {
                id: message.id.clone(),
                address: address.to_string(),
                data: data.to_string(),
                received_at: Utc::now(),
            })
        }

        // Everything else is the remote node's business
        _ => Classification::PassThrough,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0xC2D7CF95645D33006175B78989035C7c9061d3F9";
    const OTHER: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

    fn inbound(method: &str, params: Vec<Value>) -> InboundMessage {
        InboundMessage {
            id: json!(1),
            method: method.to_string(),
            params,
        }
    }

    #[test]
    fn test_enable_is_synthetic() {
        let result = classify(&inbound("enable", vec![]), None);
        assert_eq!(result, Classification::Synthetic(json!(true)));
    }

    #[test]
    fn test_eth_accounts_reports_unlocked_account() {
        assert_eq!(
            classify(&inbound("eth_accounts", vec![]), Some(ADDRESS)),
            Classification::Synthetic(json!([ADDRESS]))
        );
        assert_eq!(
            classify(&inbound("eth_accounts", vec![]), None),
            Classification::Synthetic(json!([]))
        );
    }

    #[test]
    fn test_unknown_method_passes_through() {
        assert_eq!(
            classify(&inbound("foo_bar", vec![json!(1)]), Some(ADDRESS)),
            Classification::PassThrough
        );
        assert_eq!(
            classify(&inbound("eth_blockNumber", vec![]), None),
            Classification::PassThrough
        );
    }

    #[test]
    fn test_send_transaction_requires_exactly_one_param() {
        let result = classify(&inbound("eth_sendTransaction", vec![]), Some(ADDRESS));
        assert_eq!(
            result,
            Classification::Reject {
                code: ERR_INVALID_REQUEST,
                reason: "Request failed validation".to_string(),
            }
        );
    }

    #[test]
    fn test_send_transaction_rejects_invalid_params() {
        let params = vec![json!({"from": "0x123", "data": "0x"})];
        let result = classify(&inbound("eth_sendTransaction", params), Some(ADDRESS));
        assert!(matches!(result, Classification::Reject { code, .. } if code == -32600));
    }

    #[test]
    fn test_send_transaction_rejects_foreign_address() {
        let params = vec![json!({"from": OTHER, "data": "0x"})];
        let result = classify(&inbound("eth_sendTransaction", params), Some(ADDRESS));
        assert_eq!(
            result,
            Classification::Reject {
                code: ERR_INVALID_REQUEST,
                reason: format!("Invalid address: {}", OTHER),
            }
        );
    }

    #[test]
    fn test_send_transaction_rejects_when_locked() {
        let params = vec![json!({"from": ADDRESS, "data": "0x"})];
        let result = classify(&inbound("eth_sendTransaction", params), None);
        assert!(matches!(result, Classification::Reject { code, .. } if code == -32600));
    }

    #[test]
    fn test_address_comparison_is_case_sensitive() {
        let lowered = ADDRESS.to_lowercase();
        let params = vec![json!({"from": lowered, "data": "0x"})];
        let result = classify(&inbound("eth_sendTransaction", params), Some(ADDRESS));
        assert!(matches!(result, Classification::Reject { .. }));
    }

    #[test]
    fn test_send_transaction_accepted_for_unlocked_account() {
        let params = vec![json!({"from": ADDRESS, "to": OTHER, "data": "0x", "gas": "0x5208"})];
        let result = classify(&inbound("eth_sendTransaction", params), Some(ADDRESS));
        match result {
            Classification::Actionable(ActionableRequest::SendTransaction { params, .. }) => {
                assert_eq!(params.from, ADDRESS);
                assert_eq!(params.to.as_deref(), Some(OTHER));
                assert_eq!(params.gas.as_deref(), Some("0x5208"));
            }
            other => panic!("Expected actionable transaction, got {:?}", other),
        }
    }

    #[test]
    fn test_sign_requires_two_valid_params() {
        let result = classify(&inbound("eth_sign", vec![json!(ADDRESS)]), Some(ADDRESS));
        assert!(matches!(result, Classification::Reject { .. }));

        let result = classify(
            &inbound("eth_sign", vec![json!(ADDRESS), json!(123)]),
            Some(ADDRESS),
        );
        assert!(matches!(result, Classification::Reject { .. }));

        let result = classify(
            &inbound("eth_sign", vec![json!("not an address"), json!("0xdead")]),
            Some(ADDRESS),
        );
        assert!(matches!(result, Classification::Reject { .. }));
    }

    #[test]
    fn test_sign_accepted_for_unlocked_account() {
        let result = classify(
            &inbound("eth_sign", vec![json!(ADDRESS), json!("0xdeadbeef")]),
            Some(ADDRESS),
        );
        match result {
            Classification::Actionable(ActionableRequest::SignMessage { address, data, .. }) => {
                assert_eq!(address, ADDRESS);
                assert_eq!(data, "0xdeadbeef");
            }
            other => panic!("Expected actionable sign request, got {:?}", other),
        }
    }

    #[test]
    fn test_sign_rejects_foreign_address() {
        let result = classify(
            &inbound("eth_sign", vec![json!(OTHER), json!("0xdead")]),
            Some(ADDRESS),
        );
        assert_eq!(
            result,
            Classification::Reject {
                code: ERR_INVALID_REQUEST,
                reason: format!("Invalid address: {}", OTHER),
            }
        );
    }
}
