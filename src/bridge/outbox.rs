use std::collections::VecDeque;

use serde_json::Value;

use crate::bridge::protocol::OutboundMessage;

/// A payload waiting for the transport to deliver it. `seq` is the
/// host-generated bus id the transport acknowledges with; the frame's own
/// JSON-RPC id lives inside the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMessage {
    pub seq: u64,
    pub payload: Value,
}

/// Ordered outbound message bus. Items stay queued across frame reconnects
/// until the transport acknowledges delivery or the queue is cleared.
#[derive(Debug)]
pub struct Outbox {
    next_seq: u64,
    items: VecDeque<QueuedMessage>,
}

impl Default for Outbox {
    fn default() -> Self {
        Self {
            next_seq: 1,
            items: VecDeque::new(),
        }
    }
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message for delivery, returning its bus id
    pub fn push(&mut self, message: OutboundMessage) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.items.push_back(QueuedMessage {
            seq,
            payload: message.to_payload(seq),
        });
        seq
    }

    /// Everything still awaiting delivery, in FIFO order
    pub fn snapshot(&self) -> Vec<QueuedMessage> {
        self.items.iter().cloned().collect()
    }

    /// Drop the items the transport reported as delivered
    pub fn mark_sent(&mut self, seqs: &[u64]) {
        self.items.retain(|item| !seqs.contains(&item.seq));
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
