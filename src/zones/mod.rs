//! Shared capacity-controlled zones

pub mod buffer_zone;

pub use buffer_zone::{BufferZone, ZoneClosed, ZoneGuard};
