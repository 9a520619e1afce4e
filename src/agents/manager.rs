//! Floor manager
//!
//! Keeps the order queue fed. Whenever the queue runs dry the manager drafts
//! a fresh batch with randomized products and quantities. Manager breaks are
//! local desk breaks; the facilities are for the floor staff.

use crate::agents::handle::AgentHandle;
use crate::production::{OrderQueue, ProductOrder};
use crate::types::{breaks, orders, AgentKind, AgentState, SimulationConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The agent that keeps the order queue stocked.
#[derive(Debug)]
pub struct ManagerAgent {
    handle: Arc<AgentHandle>,
    orders: Arc<OrderQueue>,
    batch_size: usize,
    product_count: usize,
    request_time: Duration,
    rng: StdRng,
    ticks_since_break: u32,
    break_ticks_left: u32,
}

impl ManagerAgent {
    /// Create the manager. One per simulation.
    pub fn new(config: &SimulationConfig, order_queue: Arc<OrderQueue>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_sub(1)),
            None => StdRng::from_entropy(),
        };
        Self {
            handle: Arc::new(AgentHandle::new(AgentKind::Manager, 0)),
            orders: order_queue,
            batch_size: config.order_batch_size,
            product_count: config.product_count,
            request_time: config.request_time(),
            rng,
            ticks_since_break: 0,
            break_ticks_left: 0,
        }
    }

    /// Shared view of this agent's state.
    pub fn handle(&self) -> &Arc<AgentHandle> {
        &self.handle
    }

    /// One scheduling step; returns how long to sleep before the next.
    pub fn step(&mut self) -> Duration {
        if self.break_ticks_left > 0 {
            self.break_ticks_left -= 1;
            if self.break_ticks_left == 0 {
                self.handle.set(AgentState::Idle, "back from the desk break");
            }
            return self.request_time;
        }

        if self.orders.is_empty() {
            let batch = self.draft_batch();
            let count = batch.len();
            self.orders.push_batch(batch);
            self.handle.set(AgentState::Working, "drafting orders");
            info!(agent = %self.handle.id(), orders = count, "order queue refilled");
        } else {
            self.handle.set(AgentState::Idle, "supervising the floor");
        }

        self.ticks_since_break += 1;
        if self.break_due() {
            self.ticks_since_break = 0;
            self.break_ticks_left = breaks::MANAGER_BREAK_TICKS;
            self.handle.set(AgentState::OnBreak, "scrolling the phone at the desk");
        }
        self.request_time
    }

    fn draft_batch(&mut self) -> Vec<ProductOrder> {
        (0..self.batch_size)
            .map(|_| {
                ProductOrder::new(
                    self.rng.gen_range(1..=self.product_count),
                    self.rng.gen_range(1..=orders::MAX_QUANTITY),
                )
            })
            .collect()
    }

    fn break_due(&mut self) -> bool {
        if self.ticks_since_break < breaks::MIN_TICKS_BEFORE_BREAK {
            return false;
        }
        let chance = breaks::BASE_CHANCE_PCT + breaks::PER_TICK_CHANCE_PCT * self.ticks_since_break;
        self.rng.gen_range(0..100) < chance
    }
}
