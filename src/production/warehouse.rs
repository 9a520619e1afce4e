//! Shared warehouse inventory
//!
//! The warehouse is one of the two objects mutated by multiple agents
//! concurrently (the other being the admission gates), so every operation
//! takes the slot lock for the duration of its read-modify-write. No
//! operation blocks: a failed take is signaled by the boolean result.

use std::sync::Mutex;
use tracing::warn;

/// Ordered sequence of per-slot stock counters.
///
/// Slot 0 holds raw material (stocked by delivery drivers, drained by
/// workers); slots `1..=product_count` hold finished products (stocked by
/// workers). Counters never go negative: `try_take` is an atomic
/// check-and-decrement.
#[derive(Debug)]
pub struct Warehouse {
    slots: Mutex<Vec<u64>>,
}

impl Warehouse {
    /// Create a warehouse with `slot_count` empty slots.
    pub fn new(slot_count: usize) -> Self {
        Self { slots: Mutex::new(vec![0; slot_count]) }
    }

    /// Atomically take one unit from `slot` if stock is available.
    ///
    /// Returns `true` on success. An empty slot or an out-of-range index is
    /// an expected "not yet available" signal, not an error.
    pub fn try_take(&self, slot: usize) -> bool {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        match slots.get_mut(slot) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            Some(_) => false,
            None => {
                warn!(slot, "take from out-of-range warehouse slot ignored");
                false
            }
        }
    }

    /// Atomically add `amount` units to `slot`. An amount of 0 is a no-op.
    pub fn add(&self, slot: usize, amount: u64) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        match slots.get_mut(slot) {
            Some(count) => *count += amount,
            None => warn!(slot, amount, "add to out-of-range warehouse slot ignored"),
        }
    }

    /// Current stock of one slot, or 0 for an out-of-range index.
    pub fn stock(&self, slot: usize) -> u64 {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.get(slot).copied().unwrap_or(0)
    }

    /// Snapshot of all slot counters, in slot order. Display readers consume
    /// this; it never mutates.
    pub fn stock_levels(&self) -> Vec<u64> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_take_from_empty_slot_fails() {
        let warehouse = Warehouse::new(3);
        assert!(!warehouse.try_take(0));
        assert_eq!(warehouse.stock(0), 0);
    }

    #[test]
    fn test_add_then_take() {
        let warehouse = Warehouse::new(3);
        warehouse.add(1, 2);
        assert!(warehouse.try_take(1));
        assert!(warehouse.try_take(1));
        assert!(!warehouse.try_take(1));
        assert_eq!(warehouse.stock(1), 0);
    }

    #[test]
    fn test_out_of_range_access_is_harmless() {
        let warehouse = Warehouse::new(2);
        assert!(!warehouse.try_take(9));
        warehouse.add(9, 5);
        assert_eq!(warehouse.stock(9), 0);
        assert_eq!(warehouse.stock_levels(), vec![0, 0]);
    }

    #[test]
    fn test_zero_amount_add_is_noop() {
        let warehouse = Warehouse::new(1);
        warehouse.add(0, 0);
        assert_eq!(warehouse.stock(0), 0);
    }

    #[test]
    fn test_concurrent_takes_never_oversell() {
        let warehouse = Arc::new(Warehouse::new(1));
        warehouse.add(0, 5);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let warehouse = Arc::clone(&warehouse);
            handles.push(std::thread::spawn(move || warehouse.try_take(0)));
        }
        let successes =
            handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
        assert_eq!(successes, 5);
        assert_eq!(warehouse.stock(0), 0);
        assert!(!warehouse.try_take(0));
    }
}
