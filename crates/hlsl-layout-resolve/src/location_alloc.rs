use bit_set::BitSet;

#[derive(Debug, Default, Clone)]
struct Plane {
    used: BitSet,
    /// One past the highest location ever marked used.
    next_free: u32,
}

/// Interface location table of one (entry point, direction).
///
/// Locations are tracked separately per index plane; plane 1 only exists for dual-source
/// blending outputs. Callers keep plane numbers below [`INDEX_PLANES`] and locations below
/// [`MAX_INTERFACE_LOCATIONS`], which `StageVar::validate` enforces.
///
/// [`INDEX_PLANES`]: crate::decl::INDEX_PLANES
/// [`MAX_INTERFACE_LOCATIONS`]: crate::decl::MAX_INTERFACE_LOCATIONS
#[derive(Debug, Default, Clone)]
pub struct LocationAllocator {
    planes: Vec<Plane>,
}

impl LocationAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn plane_mut(&mut self, index: u32) -> &mut Plane {
        let index = index as usize;
        if self.planes.len() <= index {
            self.planes.resize_with(index + 1, Plane::default);
        }
        &mut self.planes[index]
    }

    /// Grows the table of `plane` so `len` locations can be tracked without reallocating.
    pub fn ensure_capacity(&mut self, plane: u32, len: u32) {
        let plane = self.plane_mut(plane);
        let len = len as usize;
        if plane.used.capacity() < len {
            plane.used.reserve_len(len);
        }
    }

    /// Marks `location` used. Returns whether it was previously free.
    pub fn reserve(&mut self, location: u32, plane: u32) -> bool {
        self.reserve_range(location, 1, plane)
    }

    /// Marks `[location, location + count)` used. Returns true iff every location was free.
    ///
    /// A range running past `u32::MAX` is refused without marking anything.
    pub fn reserve_range(&mut self, location: u32, count: u32, plane_index: u32) -> bool {
        let Some(end) = location.checked_add(count) else {
            return false;
        };
        self.ensure_capacity(plane_index, end);
        let plane = self.plane_mut(plane_index);
        let mut all_free = true;
        for loc in location..end {
            all_free &= plane.used.insert(loc as usize);
        }
        plane.next_free = plane.next_free.max(end);
        all_free
    }

    /// Claims the first run of `count` free locations, scanning from 0. Falls back to the end
    /// of the table when no interior run is large enough.
    pub fn allocate_range(&mut self, count: u32, plane_index: u32) -> u32 {
        debug_assert!(count > 0, "allocating an empty location range");
        let plane = self.plane_mut(plane_index);

        let mut start = plane.next_free;
        let mut run_start = 0;
        let mut run_len = 0;
        for loc in 0..plane.next_free {
            if plane.used.contains(loc as usize) {
                run_start = loc + 1;
                run_len = 0;
                continue;
            }
            run_len += 1;
            if run_len == count {
                start = run_start;
                break;
            }
        }

        self.reserve_range(start, count, plane_index);
        start
    }

    pub fn is_used(&self, location: u32, plane: u32) -> bool {
        self.planes
            .get(plane as usize)
            .is_some_and(|p| p.used.contains(location as usize))
    }

    pub fn next_free(&self, plane: u32) -> u32 {
        self.planes
            .get(plane as usize)
            .map_or(0, |p| p.next_free)
    }
}
