// src/validation.rs
//
// Pure validators for untrusted frame input. Every function returns the
// list of violations it found; an empty list means the value is acceptable.
// Nothing in here mutates state or fails: bad input is described, not thrown.
use serde_json::Value;

fn is_hex_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// An Ethereum address: 0x followed by exactly 40 hex characters
pub fn validate_address(value: &str) -> Vec<String> {
    let mut violations = Vec::new();
    match value.strip_prefix("0x") {
        Some(rest) if rest.len() == 40 && is_hex_digits(rest) => {}
        _ => violations.push(format!("Not a valid address: {}", value)),
    }
    violations
}

/// Arbitrary hex-encoded bytes: 0x followed by an even number of hex
/// characters, possibly none at all
pub fn validate_hex_data(value: &str) -> Vec<String> {
    let mut violations = Vec::new();
    match value.strip_prefix("0x") {
        Some("") => {}
        Some(rest) if rest.len() % 2 == 0 && is_hex_digits(rest) => {}
        _ => violations.push(format!("Not valid hex data: {}", value)),
    }
    violations
}

/// A hex quantity: 0x followed by at least one hex character
pub fn validate_quantity(value: &str) -> Vec<String> {
    let mut violations = Vec::new();
    match value.strip_prefix("0x") {
        Some(rest) if is_hex_digits(rest) => {}
        _ => violations.push(format!("Not a valid hex quantity: {}", value)),
    }
    violations
}

/// The generic JSON-RPC request envelope: id present (string or number),
/// method a non-empty string, params an array when present
pub fn validate_request_envelope(message: &Value) -> Vec<String> {
    let mut violations = Vec::new();

    let obj = match message.as_object() {
        Some(obj) => obj,
        None => {
            violations.push("Message is not an object".to_string());
            return violations;
        }
    };

    match obj.get("id") {
        Some(Value::String(_)) | Some(Value::Number(_)) => {}
        Some(_) => violations.push("Field id must be a string or a number".to_string()),
        None => violations.push("Field id is required".to_string()),
    }

    match obj.get("method") {
        Some(Value::String(method)) if !method.is_empty() => {}
        Some(Value::String(_)) => violations.push("Field method must not be empty".to_string()),
        Some(_) => violations.push("Field method must be a string".to_string()),
        None => violations.push("Field method is required".to_string()),
    }

    if let Some(params) = obj.get("params") {
        if !params.is_array() {
            violations.push("Field params must be an array".to_string());
        }
    }

    violations
}

fn check_string_field(
    violations: &mut Vec<String>,
    field: &str,
    value: &Value,
    validate: fn(&str) -> Vec<String>,
) {
    match value.as_str() {
        Some(s) => violations.extend(validate(s)),
        None => violations.push(format!("Field {} must be a string", field)),
    }
}

/// The single parameter of eth_sendTransaction: required from + data,
/// optional to and the gas/value/gasPrice quantities
pub fn validate_transaction_params(params: &Value) -> Vec<String> {
    let mut violations = Vec::new();

    let obj = match params.as_object() {
        Some(obj) => obj,
        None => {
            violations.push("Transaction parameter is not an object".to_string());
            return violations;
        }
    };

    match obj.get("from") {
        Some(from) => check_string_field(&mut violations, "from", from, validate_address),
        None => violations.push("Field from is required".to_string()),
    }

    match obj.get("data") {
        Some(data) => check_string_field(&mut violations, "data", data, validate_hex_data),
        None => violations.push("Field data is required".to_string()),
    }

    if let Some(to) = obj.get("to").filter(|v| !v.is_null()) {
        check_string_field(&mut violations, "to", to, validate_address);
    }

    for field in ["gas", "value", "gasPrice"] {
        if let Some(value) = obj.get(field).filter(|v| !v.is_null()) {
            check_string_field(&mut violations, field, value, validate_quantity);
        }
    }

    violations
}
