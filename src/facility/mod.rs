//! Break facilities: wire protocol, rooms, TCP server, and agent client.

pub mod connection;
#[allow(clippy::module_inception)]
pub mod facility;
pub mod protocol;
pub mod server;

pub use connection::{FacilityConnection, PushHandler};
pub use facility::{AttendOutcome, Facility, PushSender};
pub use protocol::{Command, EventToken, FacilityKind, ProtocolError, Push};
pub use server::FacilityServer;
