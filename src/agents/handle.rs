//! Shared per-agent state handle
//!
//! Each agent's state, location, and activity descriptor are written from two
//! sources: the agent's own loop and, while it is inside a facility, the
//! facility server's pushes arriving on the connection listener task. Both
//! writers go through this one handle, a single mutex, so updates serialize
//! instead of racing.

use crate::facility::Push;
use crate::types::{AgentId, AgentKind, AgentLocation, AgentState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::trace;

/// Point-in-time view of one agent, for the monitoring surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Agent identity
    pub id: AgentId,
    /// Agent role
    pub kind: AgentKind,
    /// Behavioral state at capture time
    pub state: AgentState,
    /// Zone occupied at capture time
    pub location: AgentLocation,
    /// Free-text activity descriptor
    pub activity: String,
    /// When the snapshot was taken
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Inner {
    state: AgentState,
    location: AgentLocation,
    activity: String,
}

/// Single-writer-at-a-time view of one agent's observable state.
#[derive(Debug)]
pub struct AgentHandle {
    id: AgentId,
    kind: AgentKind,
    inner: Mutex<Inner>,
}

impl AgentHandle {
    /// Create the handle for the `index`-th agent of a kind, idle at its
    /// home zone.
    pub fn new(kind: AgentKind, index: usize) -> Self {
        Self {
            id: AgentId::new(kind, index),
            kind,
            inner: Mutex::new(Inner {
                state: AgentState::Idle,
                location: kind.home_zone(),
                activity: "clocking in".to_string(),
            }),
        }
    }

    /// Agent identity.
    pub fn id(&self) -> &AgentId {
        &self.id
    }

    /// Agent role.
    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Current behavioral state.
    pub fn state(&self) -> AgentState {
        self.lock().state
    }

    /// Current zone.
    pub fn location(&self) -> AgentLocation {
        self.lock().location
    }

    /// Set the behavioral state.
    pub fn set_state(&self, state: AgentState) {
        let mut inner = self.lock();
        if inner.state != state {
            trace!(agent = %self.id, from = %inner.state, to = %state, "state change");
            inner.state = state;
        }
    }

    /// Set the current zone.
    pub fn set_location(&self, location: AgentLocation) {
        let mut inner = self.lock();
        if inner.location != location {
            trace!(agent = %self.id, from = %inner.location, to = %location, "location change");
            inner.location = location;
        }
    }

    /// Set the free-text activity descriptor shown on the monitor surface.
    pub fn set_activity(&self, activity: impl Into<String>) {
        self.lock().activity = activity.into();
    }

    /// Set state and activity in one lock acquisition.
    pub fn set(&self, state: AgentState, activity: impl Into<String>) {
        let mut inner = self.lock();
        inner.state = state;
        inner.activity = activity.into();
    }

    /// Apply a facility push addressed to this agent. Events carry no
    /// state/location payload and leave the handle untouched.
    pub fn apply_push(&self, push: &Push) {
        match push {
            Push::State { state, .. } => self.set_state(*state),
            Push::Location { location, .. } => self.set_location(*location),
            Push::Event { .. } => {}
        }
    }

    /// Capture a snapshot for display. Read-only; never blocks agents for
    /// longer than the field copies.
    pub fn snapshot(&self) -> AgentSnapshot {
        let inner = self.lock();
        AgentSnapshot {
            id: self.id.clone(),
            kind: self.kind,
            state: inner.state,
            location: inner.location,
            activity: inner.activity.clone(),
            captured_at: Utc::now(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a panicking writer; the data is still
        // a valid snapshot.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
