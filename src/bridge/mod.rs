pub mod classify;
pub mod handler;
pub mod outbox;
pub mod protocol;
pub mod queue;
pub mod server;

pub use handler::ProviderBridge;
pub use protocol::{ActionableRequest, InboundMessage, OutboundMessage, RpcError};
pub use server::FrameServer;
