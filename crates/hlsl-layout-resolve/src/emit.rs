//! Decoration emission interface.
//!
//! The resolver only computes numbers. Writing them onto the IR is the job of whatever
//! implements [`DecorationSink`] (in a compiler: the SPIR-V builder).

use serde::Serialize;

use crate::decl::{ResourceId, ResourceVar, StageVar, StageVarId};

pub trait DecorationSink {
    fn resource_binding(&mut self, var: &ResourceVar, set: u32, binding: u32);

    fn interface_location(
        &mut self,
        var: &StageVar,
        location: u32,
        component: Option<u32>,
        index: Option<u32>,
    );

    fn counter_binding_link(&mut self, buffer: &ResourceVar, counter: &ResourceVar);
}

/// Sink that drops every decoration; for callers only interested in the returned layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DecorationSink for NullSink {
    fn resource_binding(&mut self, _var: &ResourceVar, _set: u32, _binding: u32) {}

    fn interface_location(
        &mut self,
        _var: &StageVar,
        _location: u32,
        _component: Option<u32>,
        _index: Option<u32>,
    ) {
    }

    fn counter_binding_link(&mut self, _buffer: &ResourceVar, _counter: &ResourceVar) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decoration", rename_all = "snake_case")]
pub enum Decoration {
    Binding {
        var: ResourceId,
        set: u32,
        binding: u32,
    },
    Location {
        var: StageVarId,
        location: u32,
        component: Option<u32>,
        index: Option<u32>,
    },
    CounterLink {
        buffer: ResourceId,
        counter: ResourceId,
    },
}

/// Decorations computed by a pass that has not finished yet.
///
/// Nothing reaches the caller's sink until [`PendingDecorations::flush`]; a pass that fails
/// drops the whole batch.
#[derive(Debug, Default)]
pub(crate) struct PendingDecorations<'r> {
    ops: Vec<PendingOp<'r>>,
}

#[derive(Debug)]
enum PendingOp<'r> {
    Binding(&'r ResourceVar, u32, u32),
    Location(&'r StageVar, u32, Option<u32>, Option<u32>),
    CounterLink(&'r ResourceVar, &'r ResourceVar),
}

impl<'r> PendingDecorations<'r> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn resource_binding(&mut self, var: &'r ResourceVar, set: u32, binding: u32) {
        self.ops.push(PendingOp::Binding(var, set, binding));
    }

    pub(crate) fn interface_location(
        &mut self,
        var: &'r StageVar,
        location: u32,
        component: Option<u32>,
        index: Option<u32>,
    ) {
        self.ops
            .push(PendingOp::Location(var, location, component, index));
    }

    pub(crate) fn counter_binding_link(
        &mut self,
        buffer: &'r ResourceVar,
        counter: &'r ResourceVar,
    ) {
        self.ops.push(PendingOp::CounterLink(buffer, counter));
    }

    /// Hands every decoration to `sink`, in the order it was computed.
    pub(crate) fn flush(self, sink: &mut dyn DecorationSink) {
        for op in self.ops {
            match op {
                PendingOp::Binding(var, set, binding) => sink.resource_binding(var, set, binding),
                PendingOp::Location(var, location, component, index) => {
                    sink.interface_location(var, location, component, index)
                }
                PendingOp::CounterLink(buffer, counter) => {
                    sink.counter_binding_link(buffer, counter)
                }
            }
        }
    }
}

/// Sink recording every decoration in emission order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub decorations: Vec<Decoration>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DecorationSink for RecordingSink {
    fn resource_binding(&mut self, var: &ResourceVar, set: u32, binding: u32) {
        self.decorations.push(Decoration::Binding {
            var: var.id,
            set,
            binding,
        });
    }

    fn interface_location(
        &mut self,
        var: &StageVar,
        location: u32,
        component: Option<u32>,
        index: Option<u32>,
    ) {
        self.decorations.push(Decoration::Location {
            var: var.id,
            location,
            component,
            index,
        });
    }

    fn counter_binding_link(&mut self, buffer: &ResourceVar, counter: &ResourceVar) {
        self.decorations.push(Decoration::CounterLink {
            buffer: buffer.id,
            counter: counter.id,
        });
    }
}
