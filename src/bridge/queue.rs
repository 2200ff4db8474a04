use serde_json::Value;

use crate::bridge::protocol::ActionableRequest;

/// Actionable requests awaiting a user decision, keyed by the frame's
/// request id. The queue, not the frame, is the source of truth for
/// whether an id is still pending.
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: Vec<ActionableRequest>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request. Frame-supplied ids are untrusted and may collide;
    /// a duplicate id is ignored and the earlier request stays in place.
    /// Returns whether the request was actually added.
    pub fn enqueue(&mut self, request: ActionableRequest) -> bool {
        if self.find(request.id()).is_some() {
            return false;
        }
        self.entries.push(request);
        true
    }

    pub fn find(&self, id: &Value) -> Option<&ActionableRequest> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Remove and return the entry for an id; absent ids are a no-op
    pub fn remove(&mut self, id: &Value) -> Option<ActionableRequest> {
        let index = self.entries.iter().position(|entry| entry.id() == id)?;
        Some(self.entries.remove(index))
    }

    /// Drop every pending entry without notifying anyone. Used when the
    /// frame content is replaced and its ids stop meaning anything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> Vec<ActionableRequest> {
        self.entries.clone()
    }
}
