//! Enumeration types for the factory floor simulator
//!
//! This module contains the agent state, agent location, and agent kind
//! enumerations shared by the agent machines, the facility wire protocol, and
//! the monitoring surface. The `Display`/`FromStr` forms are the canonical
//! wire tokens (`ON_BREAK`, `LOADING_DECK`, ...), so the same types are used
//! on both sides of the socket.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Behavioral state of an agent.
///
/// Every agent owns exactly one state at a time. While an agent is inside a
/// facility (bathroom/breakroom) the facility server owns the state and
/// pushes updates over the wire; at all other times the agent's own loop is
/// the only writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    /// Waiting for work at the home zone
    Idle,
    /// Actively producing, loading, unloading, or dispatching
    Working,
    /// Blocked on a resource (materials, free delivery bay, room slot)
    Waiting,
    /// Traveling between zones
    Moving,
    /// Inside (or queued for) a facility; remote-controlled
    OnBreak,
    /// Shutdown signal observed, winding down
    EndingShift,
    /// Agent loop has stopped
    ShiftEnded,
}

impl AgentState {
    /// Canonical wire token for this state.
    pub fn as_wire(&self) -> &'static str {
        match self {
            AgentState::Idle => "IDLE",
            AgentState::Working => "WORKING",
            AgentState::Waiting => "WAITING",
            AgentState::Moving => "MOVING",
            AgentState::OnBreak => "ON_BREAK",
            AgentState::EndingShift => "ENDING_SHIFT",
            AgentState::ShiftEnded => "SHIFT_ENDED",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for AgentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "IDLE" => Ok(AgentState::Idle),
            "WORKING" => Ok(AgentState::Working),
            "WAITING" => Ok(AgentState::Waiting),
            "MOVING" => Ok(AgentState::Moving),
            "ON_BREAK" | "ONBREAK" => Ok(AgentState::OnBreak),
            "ENDING_SHIFT" => Ok(AgentState::EndingShift),
            "SHIFT_ENDED" => Ok(AgentState::ShiftEnded),
            _ => Err(format!("Unknown agent state: {}", s)),
        }
    }
}

/// Physical zone an agent occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentLocation {
    /// Production floor with the workstations
    Factory,
    /// Shared stock of raw materials and finished products
    Warehouse,
    /// Off-site facility, reachable only through its server
    Bathroom,
    /// Off-site facility, reachable only through its server
    Breakroom,
    /// Parking spot for delivery trucks
    LoadingDeck,
    /// Source of raw materials for delivery runs
    Supplier,
}

impl AgentLocation {
    /// Canonical wire token for this location.
    pub fn as_wire(&self) -> &'static str {
        match self {
            AgentLocation::Factory => "FACTORY",
            AgentLocation::Warehouse => "WAREHOUSE",
            AgentLocation::Bathroom => "BATHROOM",
            AgentLocation::Breakroom => "BREAKROOM",
            AgentLocation::LoadingDeck => "LOADING_DECK",
            AgentLocation::Supplier => "SUPPLIER",
        }
    }
}

impl fmt::Display for AgentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for AgentLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FACTORY" => Ok(AgentLocation::Factory),
            "WAREHOUSE" => Ok(AgentLocation::Warehouse),
            "BATHROOM" => Ok(AgentLocation::Bathroom),
            "BREAKROOM" => Ok(AgentLocation::Breakroom),
            "LOADING_DECK" | "LOADINGDECK" => Ok(AgentLocation::LoadingDeck),
            "SUPPLIER" => Ok(AgentLocation::Supplier),
            _ => Err(format!("Unknown agent location: {}", s)),
        }
    }
}

/// The closed set of agent roles in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentKind {
    /// Produces goods from raw materials at a workstation
    Worker,
    /// Refills the production order queue
    Manager,
    /// Dispatches material restock runs to delivery drivers
    Inventory,
    /// Shuttles raw materials from the supplier to the warehouse
    Delivery,
}

impl AgentKind {
    /// Zone this kind of agent returns to after a facility visit.
    pub fn origin_zone(&self) -> AgentLocation {
        match self {
            AgentKind::Worker | AgentKind::Manager => AgentLocation::Factory,
            AgentKind::Inventory => AgentLocation::Warehouse,
            AgentKind::Delivery => AgentLocation::LoadingDeck,
        }
    }

    /// Zone this kind of agent starts the shift in.
    pub fn home_zone(&self) -> AgentLocation {
        self.origin_zone()
    }

    /// Identifier prefix used in agent ids (`WORKER-3`).
    pub fn as_prefix(&self) -> &'static str {
        match self {
            AgentKind::Worker => "WORKER",
            AgentKind::Manager => "MANAGER",
            AgentKind::Inventory => "INVENTORY",
            AgentKind::Delivery => "DELIVERY",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_prefix())
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "WORKER" => Ok(AgentKind::Worker),
            "MANAGER" => Ok(AgentKind::Manager),
            "INVENTORY" => Ok(AgentKind::Inventory),
            "DELIVERY" => Ok(AgentKind::Delivery),
            _ => Err(format!("Unknown agent kind: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_state_wire_round_trip() {
        for state in [
            AgentState::Idle,
            AgentState::Working,
            AgentState::Waiting,
            AgentState::Moving,
            AgentState::OnBreak,
            AgentState::EndingShift,
            AgentState::ShiftEnded,
        ] {
            assert_eq!(state.to_string().parse::<AgentState>().unwrap(), state);
        }
        assert_eq!(format!("{}", AgentState::OnBreak), "ON_BREAK");
        assert!("NAPPING".parse::<AgentState>().is_err());
    }

    #[test]
    fn test_agent_location_wire_round_trip() {
        for location in [
            AgentLocation::Factory,
            AgentLocation::Warehouse,
            AgentLocation::Bathroom,
            AgentLocation::Breakroom,
            AgentLocation::LoadingDeck,
            AgentLocation::Supplier,
        ] {
            assert_eq!(location.to_string().parse::<AgentLocation>().unwrap(), location);
        }
        assert_eq!(format!("{}", AgentLocation::LoadingDeck), "LOADING_DECK");
        assert!("MOON".parse::<AgentLocation>().is_err());
    }

    #[test]
    fn test_agent_kind_origin_zones() {
        assert_eq!(AgentKind::Worker.origin_zone(), AgentLocation::Factory);
        assert_eq!(AgentKind::Manager.origin_zone(), AgentLocation::Factory);
        assert_eq!(AgentKind::Inventory.origin_zone(), AgentLocation::Warehouse);
        assert_eq!(AgentKind::Delivery.origin_zone(), AgentLocation::LoadingDeck);
    }

    #[test]
    fn test_agent_kind_parsing() {
        assert_eq!("worker".parse::<AgentKind>().unwrap(), AgentKind::Worker);
        assert_eq!("DELIVERY".parse::<AgentKind>().unwrap(), AgentKind::Delivery);
        assert!("JANITOR".parse::<AgentKind>().is_err());
    }

    #[test]
    fn test_enum_serialization_uses_wire_form() {
        let json = serde_json::to_string(&AgentState::OnBreak).unwrap();
        assert_eq!(json, "\"ON_BREAK\"");
        let parsed: AgentLocation = serde_json::from_str("\"LOADING_DECK\"").unwrap();
        assert_eq!(parsed, AgentLocation::LoadingDeck);
    }
}
