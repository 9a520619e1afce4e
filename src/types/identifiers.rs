//! Agent identifiers
//!
//! Agent ids have a stable text form, `KIND-index` (`WORKER-3`, `MANAGER-0`),
//! used both as the thread-of-control name in logs and verbatim on the
//! facility wire. The facility server derives an agent's return zone from the
//! kind prefix, so the prefix set is part of the protocol.

use crate::types::{AgentKind, AgentLocation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of one agent, unique within a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Build the id for the `index`-th agent of a kind.
    pub fn new(kind: AgentKind, index: usize) -> Self {
        Self(format!("{}-{}", kind.as_prefix(), index))
    }

    /// Placeholder identity for a connection that has not sent HELLO yet.
    pub fn unknown() -> Self {
        Self("UNKNOWN".to_string())
    }

    /// The raw text form as it appears on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Agent kind, parsed from the id prefix. Ids minted outside the
    /// simulation (a hand-typed HELLO, for instance) may have no valid prefix.
    pub fn kind(&self) -> Option<AgentKind> {
        self.0.split('-').next().and_then(|p| p.parse().ok())
    }

    /// Zone the facility server sends this agent back to after a visit.
    /// Unrecognized prefixes fall back to the factory floor, matching the
    /// protocol's tolerance for unknown peers.
    pub fn origin_zone(&self) -> AgentLocation {
        self.kind().map(|k| k.origin_zone()).unwrap_or(AgentLocation::Factory)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AgentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(format!("Invalid agent id: {:?}", s));
        }
        Ok(Self(s.to_string()))
    }
}
