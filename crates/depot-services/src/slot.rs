//! Connection slots — the bounded pool of admission tickets.
//!
//! A slot is Reserved at accept time and Active once the peer has declared
//! its name, so capacity is consumed before identity is known. The table is
//! a free-list over a fixed arena, not a scanned sentinel array; the caller
//! (`state::ServerState`) holds the lock.

/// Occupancy state of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Free,
    Reserved,
    Active,
}

/// Fixed-capacity slot pool.
#[derive(Debug)]
pub struct SlotTable {
    states: Box<[SlotState]>,
    /// Free indices, popped on acquire. Seeded in reverse so the first
    /// acquisitions hand out 0, 1, 2, ...
    free: Vec<usize>,
}

impl SlotTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            states: vec![SlotState::Free; capacity].into_boxed_slice(),
            free: (0..capacity).rev().collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.states.len()
    }

    /// Number of non-Free slots. Never exceeds `capacity()`.
    pub fn occupied(&self) -> usize {
        self.states.len() - self.free.len()
    }

    /// Take a free slot, flipping it to Reserved. `None` when full.
    pub fn acquire(&mut self) -> Option<usize> {
        let index = self.free.pop()?;
        self.states[index] = SlotState::Reserved;
        Some(index)
    }

    /// Reserved → Active, once the peer's declared identity is known.
    pub fn mark_active(&mut self, index: usize) {
        debug_assert_eq!(self.states[index], SlotState::Reserved);
        self.states[index] = SlotState::Active;
    }

    /// Return a slot to the pool unconditionally.
    pub fn release(&mut self, index: usize) {
        debug_assert_ne!(self.states[index], SlotState::Free, "double release");
        self.states[index] = SlotState::Free;
        self.free.push(index);
    }

    pub fn state(&self, index: usize) -> SlotState {
        self.states[index]
    }
}
