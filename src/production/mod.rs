//! Production domain: orders and the shared warehouse

pub mod order;
pub mod warehouse;

pub use order::{OrderQueue, ProductOrder};
pub use warehouse::Warehouse;
