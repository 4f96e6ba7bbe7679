use crate::decl::MAX_INTERFACE_LOCATIONS;
use crate::location_alloc::LocationAllocator;

/// Components per interface location.
pub const COMPONENTS_PER_LOCATION: u32 = 4;

/// Allocation cost of one packed interface variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackItem {
    pub location_count: u32,
    pub component_count: u32,
    /// Start component must be 0 or 2.
    pub component_alignment: bool,
}

/// Best-fit packer sharing the unused components of already assigned locations.
///
/// Only locations handed out by this packer are candidates for reuse; locations reserved
/// directly on the [`LocationAllocator`] (render targets, explicit locations) are left alone.
#[derive(Debug, Default, Clone)]
pub struct ComponentPacker {
    /// Next free component per location, `None` for locations the packer does not own.
    next_component: Vec<Option<u32>>,
    /// Start location of every fresh allocation, in insertion order.
    starts: Vec<u32>,
}

impl ComponentPacker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `(location, component)` for `item`, preferring a window inside an earlier
    /// allocation over fresh locations.
    ///
    /// `item.location_count` must not exceed [`MAX_INTERFACE_LOCATIONS`].
    pub fn assign(&mut self, item: PackItem, locations: &mut LocationAllocator) -> (u32, u32) {
        debug_assert!((1..=MAX_INTERFACE_LOCATIONS).contains(&item.location_count));
        debug_assert!((1..=COMPONENTS_PER_LOCATION).contains(&item.component_count));

        let reuse = self
            .starts
            .iter()
            .find_map(|&start| Some((start, self.window_component(start, item)?)));
        if let Some((start, component)) = reuse {
            for loc in start..start + item.location_count {
                self.next_component[loc as usize] = Some(component + item.component_count);
            }
            return (start, component);
        }

        let start = locations.allocate_range(item.location_count, 0);
        let end = (start + item.location_count) as usize;
        if self.next_component.len() < end {
            self.next_component.resize(end, None);
        }
        for slot in &mut self.next_component[start as usize..end] {
            *slot = Some(item.component_count);
        }
        self.starts.push(start);
        (start, 0)
    }

    /// Start component usable across `[start, start + location_count)`, if every location in
    /// the window is packer-owned and has room.
    fn window_component(&self, start: u32, item: PackItem) -> Option<u32> {
        let mut component = 0;
        for loc in start..start + item.location_count {
            let next = (*self.next_component.get(loc as usize)?)?;
            component = component.max(next);
        }
        if item.component_alignment {
            component = component.next_multiple_of(2);
        }
        (component + item.component_count <= COMPONENTS_PER_LOCATION).then_some(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(location_count: u32, component_count: u32, component_alignment: bool) -> PackItem {
        PackItem {
            location_count,
            component_count,
            component_alignment,
        }
    }

    #[test]
    fn two_halves_share_a_location() {
        let mut locs = LocationAllocator::new();
        let mut packer = ComponentPacker::new();
        assert_eq!(packer.assign(item(1, 2, false), &mut locs), (0, 0));
        assert_eq!(packer.assign(item(1, 2, false), &mut locs), (0, 2));
        assert_eq!(packer.assign(item(1, 4, false), &mut locs), (1, 0));
    }

    #[test]
    fn alignment_rounds_up_to_component_two() {
        let mut locs = LocationAllocator::new();
        let mut packer = ComponentPacker::new();
        assert_eq!(packer.assign(item(1, 1, false), &mut locs), (0, 0));
        assert_eq!(packer.assign(item(1, 2, true), &mut locs), (0, 2));
        // Location 0 is full now.
        assert_eq!(packer.assign(item(1, 1, false), &mut locs), (1, 0));
    }

    #[test]
    fn aligned_item_that_would_overflow_gets_fresh_location() {
        let mut locs = LocationAllocator::new();
        let mut packer = ComponentPacker::new();
        assert_eq!(packer.assign(item(1, 3, false), &mut locs), (0, 0));
        // Component 3 rounds up to 4; no room left.
        assert_eq!(packer.assign(item(1, 2, true), &mut locs), (1, 0));
        assert_eq!(packer.assign(item(1, 1, false), &mut locs), (0, 3));
    }

    #[test]
    fn multi_location_window_uses_highest_next_component() {
        let mut locs = LocationAllocator::new();
        let mut packer = ComponentPacker::new();
        assert_eq!(packer.assign(item(2, 1, false), &mut locs), (0, 0));
        assert_eq!(packer.assign(item(1, 2, false), &mut locs), (0, 1));
        // Location 0 is at component 3, location 1 at component 1.
        assert_eq!(packer.assign(item(2, 1, false), &mut locs), (0, 3));
        assert_eq!(packer.assign(item(2, 1, false), &mut locs), (2, 0));
    }

    #[test]
    fn window_never_extends_into_foreign_locations() {
        let mut locs = LocationAllocator::new();
        let mut packer = ComponentPacker::new();
        assert_eq!(packer.assign(item(1, 1, false), &mut locs), (0, 0));
        assert!(locs.reserve(1, 0));
        // Window [0, 2) would cover reserved location 1.
        assert_eq!(packer.assign(item(2, 1, false), &mut locs), (2, 0));
    }
}
