//! `(set, binding)` resolution for opaque resources.
//!
//! Resources are visited in fixed passes so that everything the user pinned is claimed before
//! anything is allocated automatically:
//!
//! 0. reserved descriptor-heap bindings from [`ResolverOptions::reserved_heap_bindings`];
//! 1. explicit `vk::binding`, the global block override, register mappings and shifted
//!    `register(...)` numbers, plus explicit counter bindings;
//! 2. automatic allocation for `register(spaceN)` and undecorated resources;
//! 3. automatic allocation for the remaining hidden counters;
//! 4. descriptor-heap resources, one shared binding per heap kind.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::binding_alloc::BindingAllocator;
use crate::decl::{
    ExplicitBinding, HeapKind, RegisterClass, ResourceId, ResourceSource, ResourceVar,
};
use crate::emit::{DecorationSink, PendingDecorations};
use crate::error::{Diagnostic, ResolveError};
use crate::options::ResolverOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceBinding {
    pub set: u32,
    pub binding: u32,
}

/// Final `(set, binding)` of every resource of a compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResourceLayout {
    bindings: BTreeMap<ResourceId, ResourceBinding>,
}

impl ResourceLayout {
    pub fn get(&self, id: ResourceId) -> Option<ResourceBinding> {
        self.bindings.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, ResourceBinding)> + '_ {
        self.bindings.iter().map(|(&id, &b)| (id, b))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn assign(&mut self, id: ResourceId, binding: ResourceBinding) {
        let prev = self.bindings.insert(id, binding);
        assert!(prev.is_none(), "resource {id:?} assigned a binding twice");
    }

    fn contains(&self, id: ResourceId) -> bool {
        self.bindings.contains_key(&id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceResolution {
    pub layout: ResourceLayout,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolves every resource with a fresh binding table.
///
/// On error nothing is forwarded to `sink`.
pub fn resolve_resource_bindings(
    options: &ResolverOptions,
    resources: &[ResourceVar],
    sink: &mut dyn DecorationSink,
) -> Result<ResourceResolution, ResolveError> {
    let mut bindings = BindingAllocator::new();
    let (resolution, pending) = ResourceResolver::new(options, &mut bindings).run(resources)?;
    pending.flush(sink);
    Ok(resolution)
}

pub(crate) struct ResourceResolver<'a, 'r> {
    options: &'a ResolverOptions,
    bindings: &'a mut BindingAllocator,
    pending: PendingDecorations<'r>,
    layout: ResourceLayout,
    diagnostics: Vec<Diagnostic>,
    reservations_claimed: bool,
}

impl<'a, 'r> ResourceResolver<'a, 'r> {
    pub(crate) fn new(options: &'a ResolverOptions, bindings: &'a mut BindingAllocator) -> Self {
        Self {
            options,
            bindings,
            pending: PendingDecorations::new(),
            layout: ResourceLayout::default(),
            diagnostics: Vec::new(),
            reservations_claimed: false,
        }
    }

    /// Runs every pass. The decorations come back unflushed so the caller decides when the
    /// unit as a whole has succeeded.
    pub(crate) fn run(
        mut self,
        resources: &'r [ResourceVar],
    ) -> Result<(ResourceResolution, PendingDecorations<'r>), ResolveError> {
        let by_id = index_resources(resources)?;

        self.claim_reservations();

        let mut primaries = Vec::new();
        // (counter, owning buffer)
        let mut counters = Vec::new();
        for res in resources.iter().filter(|r| r.heap_kind().is_none()) {
            match res.counter_of {
                Some(owner) => counters.push((res, &resources[by_id[&owner]])),
                None => primaries.push(res),
            }
        }

        for &res in &primaries {
            if let Some(b) = self.pinned_binding(res)? {
                self.claim(res, b)?;
            }
            if res.counter_binding.is_some() && !counters.iter().any(|(_, o)| o.id == res.id) {
                debug!(name = %res.name, "ignoring counter binding on a buffer without a counter");
            }
        }
        for &(counter, owner) in &counters {
            if let Some(binding) = owner.counter_binding {
                let set = self.home_set(owner)?;
                self.claim(counter, ExplicitBinding::new(set, binding))?;
            }
        }

        for &res in &primaries {
            if self.layout.contains(res.id) {
                continue;
            }
            let set = match res.source {
                ResourceSource::RegisterSpaceOnly { space } => space,
                ResourceSource::None => {
                    if self.options.strict_register_required && !res.is_global_block() {
                        return Err(ResolveError::MissingRegister {
                            name: res.name.clone(),
                            loc: res.loc.clone(),
                        });
                    }
                    self.options.default_space
                }
                ResourceSource::Explicit(_) | ResourceSource::Register(_) => {
                    unreachable!("pinned resource '{}' left unassigned", res.name)
                }
            };
            let shift = self.options.shift_for(res.kind.register_class(), set);
            self.allocate(res, set, shift)?;
        }

        for &(counter, owner) in &counters {
            if self.layout.contains(counter.id) {
                continue;
            }
            if self.options.strict_register_required {
                return Err(ResolveError::CounterBindingRequired {
                    name: owner.name.clone(),
                    loc: owner.loc.clone(),
                });
            }
            let set = self.home_set(owner)?;
            let shift = self.options.shift_for(RegisterClass::U, set);
            self.allocate(counter, set, shift)?;
        }
        for &(counter, owner) in &counters {
            self.pending.counter_binding_link(owner, counter);
        }

        self.resolve_heaps(resources)?;

        let resolution = ResourceResolution {
            layout: self.layout,
            diagnostics: self.diagnostics,
        };
        Ok((resolution, self.pending))
    }

    fn claim_reservations(&mut self) {
        for (kind, b) in self.options.reserved_heap_bindings.iter() {
            debug!(?kind, set = b.set, binding = b.binding, "reserving heap binding");
            self.bindings.claim(b.set, b.binding);
        }
        self.reservations_claimed = true;
    }

    /// Binding fixed by the declaration or the caller's tables, if any.
    fn pinned_binding(&self, res: &ResourceVar) -> Result<Option<ExplicitBinding>, ResolveError> {
        let b = match res.source {
            ResourceSource::Explicit(b) => b,
            _ if res.is_global_block() && self.options.globals_binding.is_some() => {
                return Ok(self.options.globals_binding);
            }
            ResourceSource::Register(reg) => {
                let space = reg.space.unwrap_or(self.options.default_space);
                match self.options.register_binding(reg.class, reg.number, space) {
                    Some(mapped) => mapped,
                    None => {
                        let shift = self.options.shift_for(reg.class, space);
                        let binding = reg.number.checked_add(shift).ok_or_else(|| {
                            ResolveError::invalid(
                                &res.name,
                                &res.loc,
                                format!(
                                    "register {}{} shifted by {shift} is out of the binding range",
                                    reg.class, reg.number
                                ),
                            )
                        })?;
                        ExplicitBinding::new(space, binding)
                    }
                }
            }
            ResourceSource::RegisterSpaceOnly { .. } | ResourceSource::None => return Ok(None),
        };
        Ok(Some(b))
    }

    /// Descriptor set a resource lands in, known before its binding is.
    fn home_set(&self, res: &ResourceVar) -> Result<u32, ResolveError> {
        if let Some(b) = self.pinned_binding(res)? {
            return Ok(b.set);
        }
        Ok(match res.source {
            ResourceSource::RegisterSpaceOnly { space } => space,
            _ => self.options.default_space,
        })
    }

    fn claim(&mut self, res: &'r ResourceVar, b: ExplicitBinding) -> Result<(), ResolveError> {
        if b.binding.checked_add(res.binding_count).is_none() {
            return Err(ResolveError::invalid(
                &res.name,
                &res.loc,
                format!(
                    "{} bindings from binding {} are out of the binding range",
                    res.binding_count, b.binding
                ),
            ));
        }
        if !self.bindings.claim_range(b.set, b.binding, res.binding_count) {
            warn!(
                name = %res.name,
                set = b.set,
                binding = b.binding,
                "resource binding already assigned to another resource"
            );
            self.diagnostics.push(Diagnostic::BindingCollision {
                set: b.set,
                binding: b.binding,
                name: res.name.clone(),
                loc: res.loc.clone(),
            });
        }
        debug!(name = %res.name, set = b.set, binding = b.binding, "pinned resource binding");
        self.record(res, b.set, b.binding);
        Ok(())
    }

    fn allocate(
        &mut self,
        res: &'r ResourceVar,
        set: u32,
        shift: u32,
    ) -> Result<(), ResolveError> {
        assert!(
            self.reservations_claimed,
            "automatic binding allocation before reserved bindings were claimed"
        );
        let binding = self.allocate_chunk(res, set, res.binding_count, shift)?;
        debug!(name = %res.name, set, binding, "allocated resource binding");
        self.record(res, set, binding);
        Ok(())
    }

    fn allocate_chunk(
        &mut self,
        res: &ResourceVar,
        set: u32,
        count: u32,
        shift: u32,
    ) -> Result<u32, ResolveError> {
        self.bindings
            .allocate_chunk(set, count, shift)
            .ok_or_else(|| {
                ResolveError::invalid(
                    &res.name,
                    &res.loc,
                    format!("no {count} free bindings left in set {set} from binding {shift}"),
                )
            })
    }

    fn record(&mut self, res: &'r ResourceVar, set: u32, binding: u32) {
        self.layout.assign(res.id, ResourceBinding { set, binding });
        self.pending.resource_binding(res, set, binding);
    }

    fn resolve_heaps(&mut self, resources: &'r [ResourceVar]) -> Result<(), ResolveError> {
        let mut shared: HashMap<HeapKind, ExplicitBinding> = HashMap::new();
        for res in resources {
            let Some(kind) = res.heap_kind() else {
                continue;
            };
            let b = match shared.get(&kind) {
                Some(&b) => b,
                None => {
                    let b = match self.options.reserved_heap_bindings.get(kind) {
                        Some(b) => b,
                        None => {
                            let set = self.options.default_space;
                            ExplicitBinding::new(set, self.allocate_chunk(res, set, 1, 0)?)
                        }
                    };
                    debug!(?kind, set = b.set, binding = b.binding, "heap binding");
                    shared.insert(kind, b);
                    b
                }
            };
            self.record(res, b.set, b.binding);
        }
        Ok(())
    }
}

/// Validates the list and maps ids to positions.
fn index_resources(resources: &[ResourceVar]) -> Result<HashMap<ResourceId, usize>, ResolveError> {
    let mut by_id = HashMap::with_capacity(resources.len());
    for (i, res) in resources.iter().enumerate() {
        res.validate()?;
        if by_id.insert(res.id, i).is_some() {
            return Err(ResolveError::invalid(
                &res.name,
                &res.loc,
                format!("duplicate resource id {}", res.id.0),
            ));
        }
    }
    for res in resources {
        if let Some(owner) = res.counter_of {
            let owner_ok = by_id
                .get(&owner)
                .is_some_and(|&i| resources[i].kind.can_own_counter());
            if !owner_ok {
                return Err(ResolveError::invalid(
                    &res.name,
                    &res.loc,
                    format!("counter owner {} is not a buffer with a counter", owner.0),
                ));
            }
        }
    }
    Ok(by_id)
}
