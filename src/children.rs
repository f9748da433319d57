//! Child activity handles and reply routing.
//!
//! Every displayed activity runs its own sub-machine somewhere else. The
//! orchestrator only keeps a snapshot of what each one says it can handle and
//! the session id to address it by; it never touches their state.

use crate::error::SequencerError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Navigation commands a child may claim for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NavCommand {
    Next,
    Previous,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildHandle {
    pub activity_id: String,
    pub session_id: String,
    #[serde(default)]
    pub capabilities: BTreeSet<NavCommand>,
}

impl ChildHandle {
    pub fn new(activity_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            activity_id: activity_id.into(),
            session_id: session_id.into(),
            capabilities: BTreeSet::new(),
        }
    }

    pub fn with_capabilities<I: IntoIterator<Item = NavCommand>>(mut self, caps: I) -> Self {
        self.capabilities = caps.into_iter().collect();
        self
    }

    /// Capability query against the last snapshot the child reported.
    pub fn can_handle(&self, command: NavCommand) -> bool {
        self.capabilities.contains(&command)
    }
}

/// Activity id to child handle. Owned by the orchestrator alone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChildRegistry {
    children: BTreeMap<String, ChildHandle>,
}

impl ChildRegistry {
    pub fn register(&mut self, handle: ChildHandle) -> Option<ChildHandle> {
        self.children.insert(handle.activity_id.clone(), handle)
    }

    pub fn update(
        &mut self,
        activity_id: &str,
        capabilities: BTreeSet<NavCommand>,
    ) -> Result<(), SequencerError> {
        let handle = self
            .children
            .get_mut(activity_id)
            .ok_or_else(|| SequencerError::UnknownChild(activity_id.to_string()))?;
        handle.capabilities = capabilities;
        Ok(())
    }

    pub fn remove(&mut self, activity_id: &str) -> Option<ChildHandle> {
        self.children.remove(activity_id)
    }

    pub fn get(&self, activity_id: &str) -> Option<&ChildHandle> {
        self.children.get(activity_id)
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.children.values().map(|c| c.session_id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }
}

/// One hop on a reply's way back down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTarget {
    pub id: String,
    #[serde(default)]
    pub kind: String,
}

impl EventTarget {
    pub fn child(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "child".to_string(),
        }
    }
}

/// Return-address stack carried by `SEND_REPLY`, oldest hop first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReturnPath(Vec<EventTarget>);

impl ReturnPath {
    pub fn new(hops: Vec<EventTarget>) -> Self {
        Self(hops)
    }

    /// Record a hop on the way up.
    pub fn push(&mut self, hop: EventTarget) {
        self.0.push(hop);
    }

    /// Take the newest hop for the next forward.
    pub fn pop_hop(&mut self) -> Option<EventTarget> {
        self.0.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn hops(&self) -> &[EventTarget] {
        &self.0
    }
}
