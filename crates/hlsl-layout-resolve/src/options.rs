//! Caller-supplied resolver configuration.
//!
//! Every field is defaulted so a partially specified JSON document (as read by
//! `hlsl-layout-dump`) deserializes into a usable configuration.

use serde::{Deserialize, Serialize};

use crate::decl::{ExplicitBinding, HeapKind, RegisterClass};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Descriptor set used for registers without an explicit `space`.
    pub default_space: u32,
    /// Whether [`ResolverOptions::shifts`] is applied to register numbers and automatic
    /// allocation.
    pub auto_shift_bindings: bool,
    pub shifts: ShiftTable,
    /// Explicit `(class, number, space) -> (set, binding)` overrides.
    pub register_bindings: Vec<RegisterBinding>,
    /// Fixed binding for the implicit global constant block.
    pub globals_binding: Option<ExplicitBinding>,
    pub reserved_heap_bindings: ReservedHeapBindings,
    /// Every resource must carry a register (or explicit) assignment.
    pub strict_register_required: bool,
    pub stage_io_order: StageIoOrder,
    /// Pack sub-4-component interface variables into shared locations.
    pub signature_packing: bool,
}

impl ResolverOptions {
    /// Shift applied to bindings of `class` in `space`, or 0 when auto shifting is off.
    pub fn shift_for(&self, class: RegisterClass, space: u32) -> u32 {
        if self.auto_shift_bindings {
            self.shifts.get(class, space)
        } else {
            0
        }
    }

    pub fn register_binding(
        &self,
        class: RegisterClass,
        number: u32,
        space: u32,
    ) -> Option<ExplicitBinding> {
        self.register_bindings
            .iter()
            .find(|m| m.class == class && m.number == number && m.space == space)
            .map(|m| ExplicitBinding::new(m.set, m.binding))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftEntry {
    pub class: RegisterClass,
    /// `None` applies to every space.
    #[serde(default)]
    pub space: Option<u32>,
    pub shift: u32,
}

/// Per register class, per space binding offsets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShiftTable {
    entries: Vec<ShiftEntry>,
}

impl ShiftTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the shift for one space, replacing a previous entry for the same key.
    pub fn set(&mut self, class: RegisterClass, space: u32, shift: u32) -> &mut Self {
        self.insert(class, Some(space), shift)
    }

    /// Sets the shift for every space without a space-specific entry.
    pub fn set_all_spaces(&mut self, class: RegisterClass, shift: u32) -> &mut Self {
        self.insert(class, None, shift)
    }

    fn insert(&mut self, class: RegisterClass, space: Option<u32>, shift: u32) -> &mut Self {
        match self
            .entries
            .iter_mut()
            .find(|e| e.class == class && e.space == space)
        {
            Some(entry) => entry.shift = shift,
            None => self.entries.push(ShiftEntry { class, space, shift }),
        }
        self
    }

    pub fn get(&self, class: RegisterClass, space: u32) -> u32 {
        let mut fallback = 0;
        for entry in self.entries.iter().filter(|e| e.class == class) {
            match entry.space {
                Some(s) if s == space => return entry.shift,
                Some(_) => {}
                None => fallback = entry.shift,
            }
        }
        fallback
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterBinding {
    pub class: RegisterClass,
    pub number: u32,
    #[serde(default)]
    pub space: u32,
    pub set: u32,
    pub binding: u32,
}

/// Bindings set aside for descriptor-heap resources before any automatic allocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservedHeapBindings {
    pub resource_heap: Option<ExplicitBinding>,
    pub sampler_heap: Option<ExplicitBinding>,
    pub counter_heap: Option<ExplicitBinding>,
}

impl ReservedHeapBindings {
    pub fn get(&self, kind: HeapKind) -> Option<ExplicitBinding> {
        match kind {
            HeapKind::Resource => self.resource_heap,
            HeapKind::Sampler => self.sampler_heap,
            HeapKind::Counter => self.counter_heap,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (HeapKind, ExplicitBinding)> + '_ {
        [HeapKind::Resource, HeapKind::Sampler, HeapKind::Counter]
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|b| (kind, b)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageIoOrder {
    #[default]
    Declaration,
    /// Sort by semantic so producer and consumer stages agree without pinned locations.
    Alphabetical,
}
