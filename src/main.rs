use std::error::Error;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};

mod alerts;
mod bridge;
mod config;
mod networks;
mod rpc;
mod signing;
mod validation;
mod wallet;

use alerts::{Alert, AlertLevel, AlertSink};
use bridge::{FrameServer, ProviderBridge};
use config::BridgeConfig;
use networks::NetworkId;
use rpc::HttpGateway;
use wallet::UnlockedAccount;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = BridgeConfig::from_env();
    let (alerts, mut alert_rx) = AlertSink::new();
    let gateway = Arc::new(HttpGateway::new());
    let bridge = Arc::new(ProviderBridge::new(config.network, gateway, alerts));

    if let Some(key) = &config.private_key {
        let account = UnlockedAccount::from_hex_key(key, "primary".to_string())?;
        println!("🔓 Unlocked account {}", account.address);
        bridge.set_unlocked_account(Some(account));
    } else {
        println!("🔒 No WALLET_PRIVATE_KEY set; starting locked");
    }

    tokio::spawn(async move {
        while let Some(alert) = alert_rx.recv().await {
            render_alert(&alert);
        }
    });

    spawn_control_loop(Arc::clone(&bridge));

    let server = Arc::new(FrameServer::new(config.port, bridge));
    server.start().await
}

fn render_alert(alert: &Alert) {
    let suffix = match &alert.more_info_url {
        Some(url) => format!(" ({})", url),
        None => String::new(),
    };
    match alert.level {
        AlertLevel::Info => log::info!("{}: {}{}", alert.header, alert.message, suffix),
        AlertLevel::Success => log::info!("✅ {}: {}{}", alert.header, alert.message, suffix),
        AlertLevel::Error => log::error!("{}: {}{}", alert.header, alert.message, suffix),
    }
}

/// Stand-in for the authorization UI: decisions arrive as stdin commands
fn spawn_control_loop(bridge: Arc<ProviderBridge>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            handle_command(&bridge, line.trim()).await;
        }
    });
}

async fn handle_command(bridge: &ProviderBridge, line: &str) {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "" => {}
        "pending" => {
            let pending = bridge.pending_requests();
            if pending.is_empty() {
                println!("No pending requests");
            }
            for request in pending {
                println!(
                    "  {} {} for {}",
                    request.id(),
                    request.method(),
                    request.authorizing_address()
                );
            }
        }
        "accept" => match parse_id(rest) {
            Some(id) => bridge.accept_request(&id).await,
            None => println!("usage: accept <id>"),
        },
        "reject" => match parse_id(rest) {
            Some(id) => bridge.reject_request(&id, None, None),
            None => println!("usage: reject <id>"),
        },
        "network" => match NetworkId::from_name(rest) {
            Ok(network) => bridge.set_network(network),
            Err(e) => println!("{}", e),
        },
        "clear" => bridge.clear_queue(),
        _ => println!("commands: pending | accept <id> | reject <id> | network <name> | clear"),
    }
}

/// Request ids are frame-supplied JSON values: numbers stay numbers,
/// anything else is taken as a string id
fn parse_id(raw: &str) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value) if value.is_number() || value.is_string() => Some(value),
        _ => Some(Value::String(raw.to_string())),
    }
}
