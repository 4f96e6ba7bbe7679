use crate::binding_alloc::BindingAllocator;
use crate::decl::{EntryPoint, ResourceVar};
use crate::emit::{DecorationSink, PendingDecorations};
use crate::error::ResolveError;
use crate::options::ResolverOptions;
use crate::resources::{ResourceResolution, ResourceResolver};
use crate::stage_io::{self, PipelineLayout, StageLayout};

/// Resolution state of one compilation unit.
///
/// Resource bindings are module-global and have to be committed before any entry point's
/// interface is laid out; [`ResolverContext::resolve_resources`] consumes the context and hands
/// back the only type able to resolve stage locations.
#[derive(Debug)]
pub struct ResolverContext {
    options: ResolverOptions,
    bindings: BindingAllocator,
}

impl ResolverContext {
    pub fn new(options: ResolverOptions) -> Self {
        Self {
            options,
            bindings: BindingAllocator::new(),
        }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn resolve_resources(
        self,
        resources: &[ResourceVar],
        sink: &mut dyn DecorationSink,
    ) -> Result<ResolvedResources, ResolveError> {
        let (resolved, pending) = self.resolve_resources_pending(resources)?;
        pending.flush(sink);
        Ok(resolved)
    }

    fn resolve_resources_pending<'r>(
        mut self,
        resources: &'r [ResourceVar],
    ) -> Result<(ResolvedResources, PendingDecorations<'r>), ResolveError> {
        let (resolution, pending) =
            ResourceResolver::new(&self.options, &mut self.bindings).run(resources)?;
        let resolved = ResolvedResources {
            options: self.options,
            bindings: self.bindings,
            resolution,
        };
        Ok((resolved, pending))
    }
}

/// A compilation unit whose resource bindings are final.
#[derive(Debug)]
pub struct ResolvedResources {
    options: ResolverOptions,
    bindings: BindingAllocator,
    resolution: ResourceResolution,
}

impl ResolvedResources {
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn resources(&self) -> &ResourceResolution {
        &self.resolution
    }

    /// Binding table as left by resource resolution.
    pub fn bindings(&self) -> &BindingAllocator {
        &self.bindings
    }

    /// Lays out one entry point. Entry points do not share location tables.
    pub fn resolve_stage_locations(
        &self,
        entry: &EntryPoint,
        sink: &mut dyn DecorationSink,
    ) -> Result<StageLayout, ResolveError> {
        stage_io::resolve_stage_locations(&self.options, entry, sink)
    }

    pub fn resolve_pipeline(
        &self,
        entries: &[EntryPoint],
        sink: &mut dyn DecorationSink,
    ) -> Result<PipelineLayout, ResolveError> {
        stage_io::resolve_pipeline_locations(&self.options, entries, sink)
    }

    pub fn into_resolution(self) -> ResourceResolution {
        self.resolution
    }
}

/// Resource bindings plus the pipeline's interface layout.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct UnitLayout {
    pub resources: ResourceResolution,
    pub pipeline: PipelineLayout,
}

/// Runs both passes over a whole compilation unit, in order.
///
/// `sink` sees every decoration of the unit, resources first, or none at all when either pass
/// fails.
pub fn resolve_unit(
    options: ResolverOptions,
    resources: &[ResourceVar],
    entries: &[EntryPoint],
    sink: &mut dyn DecorationSink,
) -> Result<UnitLayout, ResolveError> {
    let (resolved, mut pending) =
        ResolverContext::new(options).resolve_resources_pending(resources)?;
    let pipeline = stage_io::resolve_pipeline(&resolved.options, entries, &mut pending)?;
    pending.flush(sink);
    Ok(UnitLayout {
        resources: resolved.into_resolution(),
        pipeline,
    })
}
