use std::collections::{BTreeMap, BTreeSet};

/// Per descriptor set record of claimed binding numbers.
///
/// Bindings are handed out first-fit from low numbers. Callers that need ranges kept free
/// (e.g. descriptor-heap bindings) must claim them before the first [`allocate_chunk`] call.
///
/// [`allocate_chunk`]: BindingAllocator::allocate_chunk
#[derive(Debug, Default, Clone)]
pub struct BindingAllocator {
    sets: BTreeMap<u32, BTreeSet<u32>>,
}

impl BindingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `binding` in `set` used. Returns whether it was previously free.
    ///
    /// A collision is not an error here; the caller decides how to report it.
    pub fn claim(&mut self, set: u32, binding: u32) -> bool {
        self.sets.entry(set).or_default().insert(binding)
    }

    /// Claims `[binding, binding + count)`. Returns true iff the whole range was free.
    pub fn claim_range(&mut self, set: u32, binding: u32, count: u32) -> bool {
        let used = self.sets.entry(set).or_default();
        let mut all_free = true;
        for b in binding..binding.saturating_add(count) {
            all_free &= used.insert(b);
        }
        all_free
    }

    pub fn is_claimed(&self, set: u32, binding: u32) -> bool {
        self.sets
            .get(&set)
            .is_some_and(|used| used.contains(&binding))
    }

    /// Returns the lowest `start >= shift` such that `[start, start + count)` is disjoint from
    /// every binding claimed in `set`, and claims that range.
    ///
    /// `None` when no such range fits below `u32::MAX`; nothing is claimed then.
    pub fn allocate_chunk(&mut self, set: u32, count: u32, shift: u32) -> Option<u32> {
        let used = self.sets.entry(set).or_default();
        let start = first_fit(used, count, shift)?;
        used.extend(start..start + count);
        Some(start)
    }

    /// Claimed bindings of one set, ascending.
    pub fn claimed(&self, set: u32) -> impl Iterator<Item = u32> + '_ {
        self.sets.get(&set).into_iter().flatten().copied()
    }

    pub fn clear(&mut self) {
        self.sets.clear();
    }
}

fn first_fit(used: &BTreeSet<u32>, count: u32, shift: u32) -> Option<u32> {
    let mut candidate = shift;
    // Bindings below `shift` can never constrain the window.
    for &b in used.range(shift..) {
        if b - candidate >= count {
            return Some(candidate);
        }
        candidate = b.checked_add(1)?;
    }
    candidate.checked_add(count).map(|_| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_returns_shift() {
        let mut alloc = BindingAllocator::new();
        assert_eq!(alloc.allocate_chunk(0, 3, 7), Some(7));
        assert_eq!(alloc.claimed(0).collect::<Vec<_>>(), [7, 8, 9]);
    }

    #[test]
    fn fits_before_first_claim() {
        let mut alloc = BindingAllocator::new();
        assert!(alloc.claim(0, 3));
        assert_eq!(alloc.allocate_chunk(0, 1, 0), Some(0));
    }

    #[test]
    fn skips_to_after_contiguous_claims() {
        let mut alloc = BindingAllocator::new();
        assert!(alloc.claim_range(0, 0, 6));
        assert_eq!(alloc.allocate_chunk(0, 1, 0), Some(6));
    }

    #[test]
    fn uses_first_interior_gap_large_enough() {
        let mut alloc = BindingAllocator::new();
        for b in [0, 2, 5, 9] {
            alloc.claim(0, b);
        }
        // Gap {1} is too small, {3, 4} is not.
        assert_eq!(alloc.allocate_chunk(0, 2, 0), Some(3));
        // Gap {6, 7, 8} fits three.
        assert_eq!(alloc.allocate_chunk(0, 3, 0), Some(6));
        assert_eq!(alloc.allocate_chunk(0, 1, 0), Some(1));
        assert_eq!(alloc.allocate_chunk(0, 1, 0), Some(10));
    }

    #[test]
    fn shift_bounds_every_window() {
        let mut alloc = BindingAllocator::new();
        alloc.claim(0, 0);
        alloc.claim(0, 10);
        assert_eq!(alloc.allocate_chunk(0, 1, 5), Some(5));
        assert_eq!(alloc.allocate_chunk(0, 5, 5), Some(11));
    }

    #[test]
    fn claim_reports_collisions() {
        let mut alloc = BindingAllocator::new();
        assert!(alloc.claim(1, 4));
        assert!(!alloc.claim(1, 4));
        assert!(alloc.claim(2, 4));
        assert!(!alloc.claim_range(1, 2, 3));
        assert!(alloc.is_claimed(1, 3));
    }

    #[test]
    fn sets_are_independent() {
        let mut alloc = BindingAllocator::new();
        alloc.claim(0, 0);
        assert_eq!(alloc.allocate_chunk(1, 1, 0), Some(0));
        assert_eq!(alloc.allocate_chunk(0, 1, 0), Some(1));
    }

    #[test]
    fn exhausted_range_is_reported_not_wrapped() {
        let mut alloc = BindingAllocator::new();
        assert_eq!(alloc.allocate_chunk(0, 5, u32::MAX - 2), None);
        assert_eq!(alloc.claimed(0).count(), 0);

        alloc.claim(0, u32::MAX);
        assert_eq!(alloc.allocate_chunk(0, 1, u32::MAX), None);
        assert_eq!(alloc.allocate_chunk(0, 1, u32::MAX - 1), Some(u32::MAX - 1));
    }
}
