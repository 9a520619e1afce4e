//! Production orders and the shared order queue

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One production order: make `quantity` units of product `product_id`.
///
/// The conversion ratio is 1:1, so `quantity` doubles as the number of raw
/// material units the worker must fetch before production can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOrder {
    /// Product type, 1..=product_count
    pub product_id: usize,
    /// Units to produce (and raw material units required)
    pub quantity: u32,
}

impl ProductOrder {
    /// Create a new order.
    pub fn new(product_id: usize, quantity: u32) -> Self {
        Self { product_id, quantity }
    }

    /// Raw material units the worker must carry before producing.
    pub fn required_materials(&self) -> u32 {
        self.quantity
    }

    /// Warehouse slot raw materials are drawn from.
    pub fn source_slot(&self) -> usize {
        0
    }

    /// Warehouse slot finished units are stored into.
    pub fn target_slot(&self) -> usize {
        self.product_id
    }
}

/// FIFO queue of outstanding production orders, owned by the factory.
///
/// The manager pushes batches; each order is consumed at most once, by the
/// single worker whose `pop` wins it. The pop is the ownership transfer
/// point, so no order can be claimed twice.
#[derive(Debug, Default)]
pub struct OrderQueue {
    orders: Mutex<VecDeque<ProductOrder>>,
}

impl OrderQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of orders, preserving their relative order.
    pub fn push_batch(&self, batch: impl IntoIterator<Item = ProductOrder>) {
        let mut orders = self.orders.lock().unwrap_or_else(|e| e.into_inner());
        orders.extend(batch);
    }

    /// Claim the oldest outstanding order, if any.
    pub fn pop(&self) -> Option<ProductOrder> {
        let mut orders = self.orders.lock().unwrap_or_else(|e| e.into_inner());
        orders.pop_front()
    }

    /// Number of orders currently waiting.
    pub fn len(&self) -> usize {
        self.orders.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_order_slots() {
        let order = ProductOrder::new(3, 7);
        assert_eq!(order.source_slot(), 0);
        assert_eq!(order.target_slot(), 3);
        assert_eq!(order.required_materials(), 7);
    }

    #[test]
    fn test_queue_fifo_order() {
        let queue = OrderQueue::new();
        queue.push_batch([ProductOrder::new(1, 1), ProductOrder::new(2, 2)]);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().unwrap().product_id, 1);
        assert_eq!(queue.pop().unwrap().product_id, 2);
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_each_order_claimed_at_most_once() {
        let queue = Arc::new(OrderQueue::new());
        queue.push_batch((1..=100).map(|i| ProductOrder::new(i, 1)));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let queue = Arc::clone(&queue);
            handles.push(std::thread::spawn(move || {
                let mut claimed = Vec::new();
                while let Some(order) = queue.pop() {
                    claimed.push(order.product_id);
                }
                claimed
            }));
        }

        let mut all: Vec<usize> =
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        assert_eq!(all, (1..=100).collect::<Vec<_>>());
    }
}
