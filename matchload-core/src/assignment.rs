//! Deterministic slot-to-identity assignment
//!
//! Slot `s` (1-based) uses roster index `(s - 1 + cycle) mod roster_len` for
//! its `cycle`-th cycle. Distinct slots are allowed to land on the same
//! identity; the matching service answers such re-entries with 409.

/// Roster index for the given slot and cycle, or `None` for an empty roster
pub fn roster_index(slot: usize, cycle: u64, roster_len: usize) -> Option<usize> {
    let base = slot.saturating_sub(1) as u64;
    let index = base.wrapping_add(cycle).checked_rem(roster_len as u64)?;
    Some(index as usize)
}
