use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

use crate::bridge::handler::ProviderBridge;

/// The transport between the dApp frame and the bridge: a localhost
/// WebSocket server. Text frames go into the bridge; the outbound bus is
/// drained back out, and only messages actually written to the socket are
/// acknowledged as sent.
pub struct FrameServer {
    port: u16,
    bridge: Arc<ProviderBridge>,
}

impl FrameServer {
    pub fn new(port: u16, bridge: Arc<ProviderBridge>) -> Self {
        Self { port, bridge }
    }

    pub async fn start(self: Arc<Self>) -> Result<(), Box<dyn std::error::Error>> {
        let addr: SocketAddr = format!("127.0.0.1:{}", self.port).parse()?;
        let listener = TcpListener::bind(&addr).await?;

        println!("🌉 Frame bridge running on ws://localhost:{}", self.port);

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let server = Arc::clone(&self);
                    tokio::spawn(async move {
                        if let Err(e) = server.handle_connection(stream).await {
                            eprintln!("Error handling connection: {}", e);
                        }
                    });
                }
                Err(e) => {
                    eprintln!("Error accepting connection: {}", e);
                }
            }
        }
    }

    async fn handle_connection(
        &self,
        stream: TcpStream,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let ws_stream = accept_async(stream).await?;
        let (mut write, mut read) = ws_stream.split();

        // Deliver any backlog queued while the frame was away
        self.flush_outbox(&mut write).await?;

        let mut flush_timer = tokio::time::interval(Duration::from_millis(250));

        loop {
            tokio::select! {
                incoming = read.next() => {
                    match incoming {
                        Some(Ok(Message::Text(text))) => {
                            self.bridge.handle_message(&text).await;
                            self.flush_outbox(&mut write).await?;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            break;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Err(e)) => {
                            eprintln!("WebSocket error: {}", e);
                            break;
                        }
                        Some(Ok(_)) => {}
                    }
                }
                _ = flush_timer.tick() => {
                    // Decisions and network switches produce outbound
                    // messages outside any inbound dispatch
                    self.flush_outbox(&mut write).await?;
                }
            }
        }

        Ok(())
    }

    async fn flush_outbox(
        &self,
        write: &mut SplitSink<WebSocketStream<TcpStream>, Message>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let queued = self.bridge.outbox_snapshot();
        if queued.is_empty() {
            return Ok(());
        }

        let mut delivered = Vec::with_capacity(queued.len());
        let mut failure = None;
        for item in queued {
            let text = serde_json::to_string(&item.payload)?;
            match write.send(Message::Text(text)).await {
                Ok(()) => delivered.push(item.seq),
                Err(e) => {
                    // Undelivered items stay queued for the next connection
                    failure = Some(e);
                    break;
                }
            }
        }

        if !delivered.is_empty() {
            self.bridge.messages_sent(&delivered);
        }

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
