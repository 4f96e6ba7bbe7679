//! Binding and interface-location resolver for an HLSL to SPIR-V backend.
//!
//! Given the normalized declarations of a compilation unit, this crate decides:
//!
//! - the `(descriptor set, binding)` of every resource (textures, buffers, samplers, hidden
//!   counters, the implicit global block, descriptor heaps), honoring `vk::binding`,
//!   `register(...)` assignments, caller shift tables and reserved heap bindings;
//! - the `(location, component, index)` of every non-builtin stage input and output, honoring
//!   `vk::location`, `SV_Target<n>` and optional component packing.
//!
//! The numbers are forwarded to a [`DecorationSink`] and also returned, together with any
//! non-fatal [`Diagnostic`]s. Parsing, IR construction and the decorations themselves are the
//! caller's business.

#![forbid(unsafe_code)]

pub mod binding_alloc;
pub mod component_pack;
pub mod context;
pub mod decl;
pub mod emit;
mod error;
pub mod location_alloc;
pub mod options;
pub mod resources;
pub mod stage_io;

pub use crate::binding_alloc::BindingAllocator;
pub use crate::component_pack::{ComponentPacker, PackItem, COMPONENTS_PER_LOCATION};
pub use crate::context::{resolve_unit, ResolvedResources, ResolverContext, UnitLayout};
pub use crate::decl::{
    flatten_counters, Direction, EntryPoint, ExplicitBinding, HeapKind, LocationSource,
    RegisterAssignment, RegisterClass, ResourceId, ResourceKind, ResourceSource, ResourceVar,
    Semantic, ShaderStage, SignaturePoint, StageVar, StageVarId, INDEX_PLANES,
    MAX_INTERFACE_LOCATIONS,
};
pub use crate::emit::{Decoration, DecorationSink, NullSink, RecordingSink};
pub use crate::error::{Diagnostic, ParseSemanticError, ResolveError, SourceLocation};
pub use crate::location_alloc::LocationAllocator;
pub use crate::options::{
    RegisterBinding, ReservedHeapBindings, ResolverOptions, ShiftEntry, ShiftTable, StageIoOrder,
};
pub use crate::resources::{
    resolve_resource_bindings, ResourceBinding, ResourceLayout, ResourceResolution,
};
pub use crate::stage_io::{
    check_stage_linkage, resolve_pipeline_locations, resolve_stage_locations, InterfaceLocation,
    PipelineLayout, StageLayout,
};
