//! Facility wire protocol
//!
//! Line-oriented, newline-delimited, whitespace-tokenized UTF-8. The whole
//! vocabulary is the closed set of types below; both endpoints parse a line
//! exactly once at the connection boundary and work with tagged values from
//! then on. Anything outside the vocabulary is reported back as an
//! `UNKNOWN_COMMAND` event and otherwise ignored.
//!
//! Client to server:
//!
//! ```text
//! HELLO <agentId>
//! REQUEST_BATHROOM | REQUEST_BREAKROOM
//! QUIT
//! ```
//!
//! Server to client, each addressed to one agent:
//!
//! ```text
//! STATE <agentId> <AgentState>
//! LOCATION <agentId> <AgentLocation>
//! EVENT <agentId> <token>
//! ```

use crate::types::{AgentId, AgentLocation, AgentState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which facility a connection talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FacilityKind {
    /// The bathroom facility
    Bathroom,
    /// The breakroom facility
    Breakroom,
}

impl FacilityKind {
    /// The `REQUEST_*` command keyword for this facility.
    pub fn request_keyword(&self) -> &'static str {
        match self {
            FacilityKind::Bathroom => "REQUEST_BATHROOM",
            FacilityKind::Breakroom => "REQUEST_BREAKROOM",
        }
    }

    /// The zone an agent occupies while inside this facility.
    pub fn location(&self) -> AgentLocation {
        match self {
            FacilityKind::Bathroom => AgentLocation::Bathroom,
            FacilityKind::Breakroom => AgentLocation::Breakroom,
        }
    }
}

impl fmt::Display for FacilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacilityKind::Bathroom => f.write_str("BATHROOM"),
            FacilityKind::Breakroom => f.write_str("BREAKROOM"),
        }
    }
}

/// Error produced when a line does not parse as protocol vocabulary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Empty input line
    #[error("empty line")]
    EmptyLine,

    /// First token is not a known command or push keyword
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Known keyword but a required argument is missing or malformed
    #[error("malformed {keyword} line: {reason}")]
    Malformed {
        /// The keyword of the offending line
        keyword: &'static str,
        /// What was wrong with it
        reason: String,
    },
}

/// A client-to-server command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Register the agent identity owning this connection; must come first.
    Hello(AgentId),
    /// Enqueue an access request for the connection's agent.
    Request(FacilityKind),
    /// Close the session; the server finishes or aborts any in-flight
    /// request and closes the socket.
    Quit,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Hello(agent) => write!(f, "HELLO {}", agent),
            Command::Request(kind) => f.write_str(kind.request_keyword()),
            Command::Quit => f.write_str("QUIT"),
        }
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().ok_or(ProtocolError::EmptyLine)?;
        match keyword {
            "HELLO" => {
                let id = tokens.next().ok_or(ProtocolError::Malformed {
                    keyword: "HELLO",
                    reason: "missing agent id".to_string(),
                })?;
                let agent = id.parse().map_err(|e| ProtocolError::Malformed {
                    keyword: "HELLO",
                    reason: e,
                })?;
                Ok(Command::Hello(agent))
            }
            "REQUEST_BATHROOM" => Ok(Command::Request(FacilityKind::Bathroom)),
            "REQUEST_BREAKROOM" => Ok(Command::Request(FacilityKind::Breakroom)),
            "QUIT" => Ok(Command::Quit),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

/// Event tokens carried by `EVENT` pushes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventToken {
    /// Identity registered
    HelloOk,
    /// The facility pipeline for a request completed normally
    BreakComplete,
    /// The in-flight request was aborted (cancellation or disconnect)
    Interrupted,
    /// A command arrived before HELLO and was ignored
    NotIdentified,
    /// Session closing acknowledgment
    Bye,
    /// Echo of an unrecognized command keyword
    UnknownCommand(String),
}

impl fmt::Display for EventToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventToken::HelloOk => f.write_str("HELLO_OK"),
            EventToken::BreakComplete => f.write_str("BREAK_COMPLETE"),
            EventToken::Interrupted => f.write_str("INTERRUPTED"),
            EventToken::NotIdentified => f.write_str("NOT_IDENTIFIED"),
            EventToken::Bye => f.write_str("BYE"),
            EventToken::UnknownCommand(cmd) => write!(f, "UNKNOWN_COMMAND:{}", cmd),
        }
    }
}

impl FromStr for EventToken {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HELLO_OK" => Ok(EventToken::HelloOk),
            // FINISHED is the legacy spelling some peers use for completion.
            "BREAK_COMPLETE" | "FINISHED" => Ok(EventToken::BreakComplete),
            "INTERRUPTED" => Ok(EventToken::Interrupted),
            "NOT_IDENTIFIED" => Ok(EventToken::NotIdentified),
            "BYE" => Ok(EventToken::Bye),
            other => match other.strip_prefix("UNKNOWN_COMMAND:") {
                Some(cmd) => Ok(EventToken::UnknownCommand(cmd.to_string())),
                None => Err(ProtocolError::Malformed {
                    keyword: "EVENT",
                    reason: format!("unknown event token: {}", other),
                }),
            },
        }
    }
}

/// A server-to-client push, always addressed to one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Push {
    /// Remote state update for the addressed agent
    State {
        /// Addressee
        agent: AgentId,
        /// New behavioral state
        state: AgentState,
    },
    /// Remote location update for the addressed agent
    Location {
        /// Addressee
        agent: AgentId,
        /// New location
        location: AgentLocation,
    },
    /// Out-of-band event for the addressed agent
    Event {
        /// Addressee
        agent: AgentId,
        /// Event token
        token: EventToken,
    },
}

impl Push {
    /// The agent this push is addressed to.
    pub fn agent(&self) -> &AgentId {
        match self {
            Push::State { agent, .. } | Push::Location { agent, .. } | Push::Event { agent, .. } => {
                agent
            }
        }
    }
}

impl fmt::Display for Push {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Push::State { agent, state } => write!(f, "STATE {} {}", agent, state),
            Push::Location { agent, location } => write!(f, "LOCATION {} {}", agent, location),
            Push::Event { agent, token } => write!(f, "EVENT {} {}", agent, token),
        }
    }
}

impl FromStr for Push {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().ok_or(ProtocolError::EmptyLine)?;

        fn two_args<'a>(
            keyword: &'static str,
            tokens: &mut impl Iterator<Item = &'a str>,
        ) -> Result<(AgentId, &'a str), ProtocolError> {
            let agent = tokens
                .next()
                .ok_or(ProtocolError::Malformed { keyword, reason: "missing agent id".into() })?
                .parse()
                .map_err(|e| ProtocolError::Malformed { keyword, reason: e })?;
            let value = tokens
                .next()
                .ok_or(ProtocolError::Malformed { keyword, reason: "missing value".into() })?;
            Ok((agent, value))
        }

        match keyword {
            "STATE" => {
                let (agent, value) = two_args("STATE", &mut tokens)?;
                let state = value
                    .parse()
                    .map_err(|e| ProtocolError::Malformed { keyword: "STATE", reason: e })?;
                Ok(Push::State { agent, state })
            }
            "LOCATION" => {
                let (agent, value) = two_args("LOCATION", &mut tokens)?;
                let location = value
                    .parse()
                    .map_err(|e| ProtocolError::Malformed { keyword: "LOCATION", reason: e })?;
                Ok(Push::Location { agent, location })
            }
            "EVENT" => {
                let (agent, value) = two_args("EVENT", &mut tokens)?;
                Ok(Push::Event { agent, token: value.parse()? })
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}
