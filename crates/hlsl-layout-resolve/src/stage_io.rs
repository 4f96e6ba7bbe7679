//! Interface location resolution for stage inputs and outputs.
//!
//! Each entry point owns its own tables, so entry points can be resolved independently once the
//! module-wide resource pass is done. Within an entry point, inputs and outputs are resolved
//! separately and follow the same rules:
//!
//! - either every non-builtin variable has `vk::location` (kept verbatim), or none has;
//! - `SV_Target<n>` outputs sit at location `n`;
//! - the rest are placed in declaration or alphabetical-by-semantic order, optionally packing
//!   narrow variables into shared locations.

use std::collections::BTreeMap;

use hashbrown::HashSet;
use serde::Serialize;
use tracing::{debug, warn};

use crate::component_pack::{ComponentPacker, PackItem};
use crate::decl::{
    Direction, EntryPoint, LocationSource, ShaderStage, StageVar, StageVarId,
    MAX_INTERFACE_LOCATIONS,
};
use crate::emit::{DecorationSink, PendingDecorations};
use crate::error::{Diagnostic, ResolveError};
use crate::location_alloc::LocationAllocator;
use crate::options::{ResolverOptions, StageIoOrder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct InterfaceLocation {
    pub location: u32,
    pub component: u32,
    /// Dual-source blending index, only when given explicitly.
    pub index: Option<u32>,
}

/// Final interface locations of one entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageLayout {
    pub entry_point: String,
    locations: BTreeMap<StageVarId, InterfaceLocation>,
}

impl StageLayout {
    fn new(entry_point: &str) -> Self {
        Self {
            entry_point: entry_point.to_owned(),
            locations: BTreeMap::new(),
        }
    }

    pub fn get(&self, id: StageVarId) -> Option<InterfaceLocation> {
        self.locations.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StageVarId, InterfaceLocation)> + '_ {
        self.locations.iter().map(|(&id, &l)| (id, l))
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineLayout {
    pub stages: Vec<StageLayout>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolves the inputs and outputs of one entry point.
///
/// On error nothing is forwarded to `sink`, including locations of the direction that did
/// resolve.
pub fn resolve_stage_locations(
    options: &ResolverOptions,
    entry: &EntryPoint,
    sink: &mut dyn DecorationSink,
) -> Result<StageLayout, ResolveError> {
    let mut pending = PendingDecorations::new();
    let layout = resolve_stage(options, entry, &mut pending)?;
    pending.flush(sink);
    Ok(layout)
}

fn resolve_stage<'e>(
    options: &ResolverOptions,
    entry: &'e EntryPoint,
    pending: &mut PendingDecorations<'e>,
) -> Result<StageLayout, ResolveError> {
    let mut seen = HashSet::with_capacity(entry.vars.len());
    for var in &entry.vars {
        var.validate()?;
        if !seen.insert(var.id) {
            return Err(ResolveError::invalid(
                &var.name,
                &var.loc,
                format!("duplicate stage variable id {}", var.id.0),
            ));
        }
    }

    let mut layout = StageLayout::new(&entry.name);
    for direction in [Direction::Input, Direction::Output] {
        let mut resolver = DirectionResolver {
            options,
            entry,
            direction,
            layout: &mut layout,
            pending: &mut *pending,
        };
        resolver.run()?;
    }
    Ok(layout)
}

/// Resolves a pipeline's entry points, given in pipeline order, and checks that every
/// consecutive graphics stage pair agrees on the locations of shared semantics.
///
/// Decorations are only forwarded once every entry point has resolved.
pub fn resolve_pipeline_locations(
    options: &ResolverOptions,
    entries: &[EntryPoint],
    sink: &mut dyn DecorationSink,
) -> Result<PipelineLayout, ResolveError> {
    let mut pending = PendingDecorations::new();
    let pipeline = resolve_pipeline(options, entries, &mut pending)?;
    pending.flush(sink);
    Ok(pipeline)
}

pub(crate) fn resolve_pipeline<'e>(
    options: &ResolverOptions,
    entries: &'e [EntryPoint],
    pending: &mut PendingDecorations<'e>,
) -> Result<PipelineLayout, ResolveError> {
    let stages = entries
        .iter()
        .map(|entry| resolve_stage(options, entry, &mut *pending))
        .collect::<Result<Vec<_>, _>>()?;

    let graphics: Vec<usize> = (0..entries.len())
        .filter(|&i| entries[i].stage != ShaderStage::Compute)
        .collect();
    let mut diagnostics = Vec::new();
    for pair in graphics.windows(2) {
        let (p, c) = (pair[0], pair[1]);
        diagnostics.extend(check_stage_linkage(
            &entries[p],
            &stages[p],
            &entries[c],
            &stages[c],
        ));
    }
    Ok(PipelineLayout {
        stages,
        diagnostics,
    })
}

/// Reports semantics written by `producer` and read by `consumer` at different locations.
pub fn check_stage_linkage(
    producer: &EntryPoint,
    producer_layout: &StageLayout,
    consumer: &EntryPoint,
    consumer_layout: &StageLayout,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let outputs = producer
        .vars
        .iter()
        .filter(|v| !v.is_builtin && v.direction() == Direction::Output);
    for out in outputs {
        let (Some(semantic), Some(out_loc)) = (&out.semantic, producer_layout.get(out.id)) else {
            continue;
        };
        let input = consumer.vars.iter().find(|v| {
            !v.is_builtin
                && v.direction() == Direction::Input
                && v.semantic.as_ref().is_some_and(|s| s.key() == semantic.key())
        });
        let Some(in_loc) = input.and_then(|v| consumer_layout.get(v.id)) else {
            continue;
        };
        if in_loc.location != out_loc.location {
            warn!(
                %semantic,
                producer = %producer.name,
                consumer = %consumer.name,
                "stage linkage location mismatch"
            );
            diagnostics.push(Diagnostic::LinkageMismatch {
                semantic: semantic.to_string(),
                output_location: out_loc.location,
                input_location: in_loc.location,
                producer: producer.name.clone(),
                consumer: consumer.name.clone(),
            });
        }
    }
    diagnostics
}

struct DirectionResolver<'a, 'e> {
    options: &'a ResolverOptions,
    entry: &'e EntryPoint,
    direction: Direction,
    layout: &'a mut StageLayout,
    pending: &'a mut PendingDecorations<'e>,
}

impl<'e> DirectionResolver<'_, 'e> {
    fn run(&mut self) -> Result<(), ResolveError> {
        let entry = self.entry;
        let direction = self.direction;
        let vars: Vec<&'e StageVar> = entry
            .vars
            .iter()
            .filter(|v| v.direction() == direction)
            .collect();
        self.check_semantics(&vars)?;

        let eligible: Vec<&'e StageVar> = vars.into_iter().filter(|v| !v.is_builtin).collect();
        let explicit = eligible
            .iter()
            .filter(|v| matches!(v.location, LocationSource::Explicit { .. }))
            .count();

        if explicit == 0 {
            return self.assign_automatic(eligible);
        }
        if let Some(missing) = eligible.iter().find(|v| v.location == LocationSource::None) {
            return Err(ResolveError::PartialExplicitLocations {
                direction: self.direction,
                name: missing.name.clone(),
                loc: missing.loc.clone(),
            });
        }
        self.assign_explicit(&eligible)
    }

    fn check_semantics(&self, vars: &[&StageVar]) -> Result<(), ResolveError> {
        let mut seen = HashSet::new();
        for var in vars {
            let Some(semantic) = &var.semantic else {
                continue;
            };
            if !seen.insert(semantic.key()) {
                return Err(ResolveError::DuplicateSemantic {
                    direction: self.direction,
                    semantic: semantic.to_string(),
                    entry_point: self.entry.name.clone(),
                    loc: var.loc.clone(),
                });
            }
        }
        Ok(())
    }

    fn assign_explicit(&mut self, vars: &[&'e StageVar]) -> Result<(), ResolveError> {
        let mut used = LocationAllocator::new();
        for &var in vars {
            let LocationSource::Explicit { location, index } = var.location else {
                unreachable!("'{}' has no explicit location", var.name);
            };
            if !used.reserve(location, index.unwrap_or(0)) {
                return Err(ResolveError::DuplicateLocation {
                    direction: self.direction,
                    location,
                    index: index.unwrap_or(0),
                    name: var.name.clone(),
                    loc: var.loc.clone(),
                });
            }
            self.record(var, location, 0, index);
        }
        Ok(())
    }

    fn assign_automatic(&mut self, vars: Vec<&'e StageVar>) -> Result<(), ResolveError> {
        let mut locations = LocationAllocator::new();
        let mut packer = ComponentPacker::new();

        let (targets, mut rest): (Vec<&'e StageVar>, Vec<&'e StageVar>) =
            vars.into_iter().partition(|v| self.is_render_target(v));

        for var in targets {
            let index = var.semantic.as_ref().map_or(0, |s| s.index);
            if !locations.reserve_range(index, var.location_count, 0) {
                return Err(ResolveError::DuplicateTarget {
                    index,
                    entry_point: self.entry.name.clone(),
                    loc: var.loc.clone(),
                });
            }
            self.record(var, index, 0, None);
        }

        let fixed_layout = rest.iter().any(|v| v.sig_point.is_fixed_layout());
        if self.options.stage_io_order == StageIoOrder::Alphabetical && !fixed_layout {
            rest.sort_by_cached_key(|v| match &v.semantic {
                Some(semantic) => semantic.key(),
                None => (v.name.to_ascii_uppercase(), 0),
            });
        }

        for var in rest {
            let (location, component) =
                if self.options.signature_packing && !var.sig_point.is_fixed_layout() {
                    let item = PackItem {
                        location_count: var.location_count,
                        component_count: var.component_count,
                        component_alignment: var.component_alignment,
                    };
                    packer.assign(item, &mut locations)
                } else {
                    (locations.allocate_range(var.location_count, 0), 0)
                };
            if location + var.location_count > MAX_INTERFACE_LOCATIONS {
                return Err(ResolveError::invalid(
                    &var.name,
                    &var.loc,
                    format!(
                        "{} interface of '{}' needs more than {} locations",
                        self.direction, self.entry.name, MAX_INTERFACE_LOCATIONS
                    ),
                ));
            }
            self.record(var, location, component, None);
        }
        Ok(())
    }

    fn is_render_target(&self, var: &StageVar) -> bool {
        self.direction == Direction::Output
            && var.semantic.as_ref().is_some_and(|s| s.is_target())
    }

    fn record(&mut self, var: &'e StageVar, location: u32, component: u32, index: Option<u32>) {
        debug!(
            entry_point = %self.entry.name,
            name = %var.name,
            location,
            component,
            ?index,
            "assigned {} location",
            self.direction
        );
        let prev = self.layout.locations.insert(
            var.id,
            InterfaceLocation {
                location,
                component,
                index,
            },
        );
        assert!(prev.is_none(), "stage variable {:?} assigned twice", var.id);
        self.pending.interface_location(
            var,
            location,
            (component != 0).then_some(component),
            index,
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::decl::{Semantic, SignaturePoint};
    use crate::emit::{Decoration, NullSink, RecordingSink};

    fn loc(layout: &StageLayout, id: u32) -> (u32, u32) {
        let l = layout.get(StageVarId(id)).unwrap();
        (l.location, l.component)
    }

    #[test]
    fn declaration_order_whole_locations() {
        let entry = EntryPoint::new(
            "vs",
            ShaderStage::Vertex,
            vec![
                StageVar::new(0, "pos", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("SV_Position", 0))
                    .builtin(),
                StageVar::new(1, "uv", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("TEXCOORD", 0))
                    .with_cost(1, 2),
                StageVar::new(2, "m", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("MATRIX", 0))
                    .with_cost(4, 4),
                StageVar::new(3, "c", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("COLOR", 0)),
                StageVar::new(4, "in", SignaturePoint::VsIn)
                    .with_semantic(Semantic::new("POSITION", 0)),
            ],
        );
        let layout =
            resolve_stage_locations(&ResolverOptions::default(), &entry, &mut NullSink).unwrap();
        assert_eq!(layout.get(StageVarId(0)), None);
        assert_eq!(loc(&layout, 1), (0, 0));
        assert_eq!(loc(&layout, 2), (1, 0));
        assert_eq!(loc(&layout, 3), (5, 0));
        assert_eq!(loc(&layout, 4), (0, 0));
    }

    #[test]
    fn alphabetical_order_sorts_by_semantic() {
        let options = ResolverOptions {
            stage_io_order: StageIoOrder::Alphabetical,
            ..Default::default()
        };
        let entry = EntryPoint::new(
            "vs",
            ShaderStage::Vertex,
            vec![
                StageVar::new(0, "b", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("TEXCOORD", 1)),
                StageVar::new(1, "a", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("COLOR", 0)),
                StageVar::new(2, "c", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("TEXCOORD", 0)),
                // Vertex inputs keep declaration order.
                StageVar::new(3, "y", SignaturePoint::VsIn)
                    .with_semantic(Semantic::new("TEXCOORD", 0)),
                StageVar::new(4, "x", SignaturePoint::VsIn)
                    .with_semantic(Semantic::new("COLOR", 0)),
            ],
        );
        let layout = resolve_stage_locations(&options, &entry, &mut NullSink).unwrap();
        assert_eq!(loc(&layout, 1), (0, 0));
        assert_eq!(loc(&layout, 2), (1, 0));
        assert_eq!(loc(&layout, 0), (2, 0));
        assert_eq!(loc(&layout, 3), (0, 0));
        assert_eq!(loc(&layout, 4), (1, 0));
    }

    #[test]
    fn explicit_locations_are_verbatim_and_emit_index() {
        let entry = EntryPoint::new(
            "ps",
            ShaderStage::Pixel,
            vec![
                StageVar::new(0, "c0", SignaturePoint::PsOut)
                    .with_semantic(Semantic::new("SV_Target", 0))
                    .with_location(0, Some(0)),
                StageVar::new(1, "c1", SignaturePoint::PsOut)
                    .with_semantic(Semantic::new("SV_Target", 1))
                    .with_location(0, Some(1)),
            ],
        );
        let mut sink = RecordingSink::new();
        let layout =
            resolve_stage_locations(&ResolverOptions::default(), &entry, &mut sink).unwrap();
        assert_eq!(layout.get(StageVarId(1)).unwrap().index, Some(1));
        assert_eq!(
            sink.decorations,
            vec![
                Decoration::Location {
                    var: StageVarId(0),
                    location: 0,
                    component: None,
                    index: Some(0),
                },
                Decoration::Location {
                    var: StageVarId(1),
                    location: 0,
                    component: None,
                    index: Some(1),
                },
            ]
        );
    }

    #[test]
    fn duplicate_explicit_location_is_fatal() {
        let entry = EntryPoint::new(
            "vs",
            ShaderStage::Vertex,
            vec![
                StageVar::new(0, "a", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("A", 0))
                    .with_location(2, None),
                StageVar::new(1, "b", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("B", 0))
                    .with_location(2, None),
            ],
        );
        let err = resolve_stage_locations(&ResolverOptions::default(), &entry, &mut NullSink)
            .unwrap_err();
        assert!(
            matches!(err, ResolveError::DuplicateLocation { location: 2, index: 0, .. }),
            "{err:?}"
        );
    }

    #[test]
    fn partial_explicit_is_fatal() {
        let entry = EntryPoint::new(
            "vs",
            ShaderStage::Vertex,
            vec![
                StageVar::new(0, "a", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("A", 0))
                    .with_location(0, None),
                StageVar::new(1, "b", SignaturePoint::VsOut).with_semantic(Semantic::new("B", 0)),
            ],
        );
        let err = resolve_stage_locations(&ResolverOptions::default(), &entry, &mut NullSink)
            .unwrap_err();
        assert!(
            matches!(&err, ResolveError::PartialExplicitLocations { name, .. } if name == "b"),
            "{err:?}"
        );
    }

    #[test]
    fn explicit_inputs_do_not_force_explicit_outputs() {
        let entry = EntryPoint::new(
            "vs",
            ShaderStage::Vertex,
            vec![
                StageVar::new(0, "in", SignaturePoint::VsIn)
                    .with_semantic(Semantic::new("POSITION", 0))
                    .with_location(3, None),
                StageVar::new(1, "out", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("TEXCOORD", 0)),
            ],
        );
        let layout =
            resolve_stage_locations(&ResolverOptions::default(), &entry, &mut NullSink).unwrap();
        assert_eq!(loc(&layout, 0), (3, 0));
        assert_eq!(loc(&layout, 1), (0, 0));
    }

    #[test]
    fn targets_are_pinned_to_their_index() {
        let entry = EntryPoint::new(
            "ps",
            ShaderStage::Pixel,
            vec![
                StageVar::new(0, "extra", SignaturePoint::PsOut)
                    .with_semantic(Semantic::new("EXTRA", 0)),
                StageVar::new(1, "t2", SignaturePoint::PsOut)
                    .with_semantic(Semantic::new("SV_Target", 2)),
                StageVar::new(2, "t0", SignaturePoint::PsOut)
                    .with_semantic(Semantic::new("SV_TARGET", 0)),
            ],
        );
        let layout =
            resolve_stage_locations(&ResolverOptions::default(), &entry, &mut NullSink).unwrap();
        assert_eq!(loc(&layout, 1), (2, 0));
        assert_eq!(loc(&layout, 2), (0, 0));
        assert_eq!(loc(&layout, 0), (1, 0));
    }

    #[test]
    fn overlapping_target_array_is_fatal() {
        let entry = EntryPoint::new(
            "ps",
            ShaderStage::Pixel,
            vec![
                StageVar::new(0, "targets", SignaturePoint::PsOut)
                    .with_semantic(Semantic::new("SV_Target", 0))
                    .with_cost(2, 4),
                StageVar::new(1, "t1", SignaturePoint::PsOut)
                    .with_semantic(Semantic::new("SV_Target", 1)),
            ],
        );
        let err = resolve_stage_locations(&ResolverOptions::default(), &entry, &mut NullSink)
            .unwrap_err();
        assert!(matches!(err, ResolveError::DuplicateTarget { index: 1, .. }), "{err:?}");
    }

    #[test]
    fn packing_is_skipped_for_fixed_layout_points() {
        let options = ResolverOptions {
            signature_packing: true,
            ..Default::default()
        };
        let entry = EntryPoint::new(
            "vs",
            ShaderStage::Vertex,
            vec![
                StageVar::new(0, "a", SignaturePoint::VsIn)
                    .with_semantic(Semantic::new("A", 0))
                    .with_cost(1, 2),
                StageVar::new(1, "b", SignaturePoint::VsIn)
                    .with_semantic(Semantic::new("B", 0))
                    .with_cost(1, 2),
                StageVar::new(2, "c", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("C", 0))
                    .with_cost(1, 2),
                StageVar::new(3, "d", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("D", 0))
                    .with_cost(1, 1),
            ],
        );
        let mut sink = RecordingSink::new();
        let layout = resolve_stage_locations(&options, &entry, &mut sink).unwrap();
        assert_eq!(loc(&layout, 0), (0, 0));
        assert_eq!(loc(&layout, 1), (1, 0));
        assert_eq!(loc(&layout, 2), (0, 0));
        assert_eq!(loc(&layout, 3), (0, 2));
        assert!(sink.decorations.contains(&Decoration::Location {
            var: StageVarId(3),
            location: 0,
            component: Some(2),
            index: None,
        }));
    }

    #[test]
    fn linkage_mismatch_is_reported() {
        let vs = EntryPoint::new(
            "vs",
            ShaderStage::Vertex,
            vec![
                StageVar::new(0, "a", SignaturePoint::VsOut).with_semantic(Semantic::new("A", 0)),
                StageVar::new(1, "b", SignaturePoint::VsOut).with_semantic(Semantic::new("B", 0)),
            ],
        );
        let ps = EntryPoint::new(
            "ps",
            ShaderStage::Pixel,
            vec![
                StageVar::new(0, "b", SignaturePoint::PsIn).with_semantic(Semantic::new("B", 0)),
                StageVar::new(1, "a", SignaturePoint::PsIn).with_semantic(Semantic::new("A", 0)),
            ],
        );
        let pipeline = resolve_pipeline_locations(
            &ResolverOptions::default(),
            &[vs.clone(), ps.clone()],
            &mut NullSink,
        )
        .unwrap();
        assert_eq!(pipeline.diagnostics.len(), 2);

        let options = ResolverOptions {
            stage_io_order: StageIoOrder::Alphabetical,
            ..Default::default()
        };
        let pipeline = resolve_pipeline_locations(&options, &[vs, ps], &mut NullSink).unwrap();
        assert!(pipeline.diagnostics.is_empty());
    }

    #[test]
    fn out_of_range_dual_source_index_is_rejected() {
        let entry = EntryPoint::new(
            "ps",
            ShaderStage::Pixel,
            vec![StageVar::new(0, "c", SignaturePoint::PsOut)
                .with_semantic(Semantic::new("SV_Target", 0))
                .with_location(0, Some(u32::MAX))],
        );
        let err = resolve_stage_locations(&ResolverOptions::default(), &entry, &mut NullSink)
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidDeclaration { .. }), "{err:?}");
    }

    #[test]
    fn explicit_location_at_the_top_of_the_range_is_rejected() {
        let entry = EntryPoint::new(
            "vs",
            ShaderStage::Vertex,
            vec![
                StageVar::new(0, "a", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("A", 0))
                    .with_location(u32::MAX, None),
                StageVar::new(1, "b", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("B", 0))
                    .with_location(u32::MAX, None),
            ],
        );
        let err = resolve_stage_locations(&ResolverOptions::default(), &entry, &mut NullSink)
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidDeclaration { .. }), "{err:?}");

        let last = MAX_INTERFACE_LOCATIONS - 1;
        let entry = EntryPoint::new(
            "vs",
            ShaderStage::Vertex,
            vec![StageVar::new(0, "a", SignaturePoint::VsOut)
                .with_semantic(Semantic::new("A", 0))
                .with_location(last, None)],
        );
        let layout =
            resolve_stage_locations(&ResolverOptions::default(), &entry, &mut NullSink).unwrap();
        assert_eq!(loc(&layout, 0), (last, 0));
    }

    #[test]
    fn automatic_locations_stop_at_the_limit() {
        let entry = EntryPoint::new(
            "vs",
            ShaderStage::Vertex,
            vec![
                StageVar::new(0, "a", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("A", 0))
                    .with_cost(600, 4),
                StageVar::new(1, "b", SignaturePoint::VsOut)
                    .with_semantic(Semantic::new("B", 0))
                    .with_cost(600, 4),
            ],
        );
        let err = resolve_stage_locations(&ResolverOptions::default(), &entry, &mut NullSink)
            .unwrap_err();
        assert!(
            matches!(&err, ResolveError::InvalidDeclaration { name, .. } if name == "b"),
            "{err:?}"
        );
    }

    #[test]
    fn failed_output_pass_discards_resolved_inputs() {
        let entry = EntryPoint::new(
            "ps",
            ShaderStage::Pixel,
            vec![
                StageVar::new(0, "uv", SignaturePoint::PsIn)
                    .with_semantic(Semantic::new("TEXCOORD", 0)),
                StageVar::new(1, "a", SignaturePoint::PsOut)
                    .with_semantic(Semantic::new("SV_Target", 2)),
                StageVar::new(2, "b", SignaturePoint::PsOut)
                    .with_semantic(Semantic::new("sv_target", 2)),
            ],
        );
        let mut sink = RecordingSink::new();
        let err = resolve_stage_locations(&ResolverOptions::default(), &entry, &mut sink)
            .unwrap_err();
        assert!(matches!(err, ResolveError::DuplicateSemantic { .. }), "{err:?}");
        assert!(sink.decorations.is_empty(), "{:?}", sink.decorations);
    }

    #[test]
    fn failed_pipeline_discards_earlier_entry_points() {
        let vs = EntryPoint::new(
            "vs",
            ShaderStage::Vertex,
            vec![StageVar::new(0, "uv", SignaturePoint::VsOut)
                .with_semantic(Semantic::new("TEXCOORD", 0))],
        );
        let ps = EntryPoint::new(
            "ps",
            ShaderStage::Pixel,
            vec![
                StageVar::new(0, "uv", SignaturePoint::PsIn)
                    .with_semantic(Semantic::new("TEXCOORD", 0))
                    .with_location(0, None),
                StageVar::new(1, "n", SignaturePoint::PsIn)
                    .with_semantic(Semantic::new("NORMAL", 0)),
            ],
        );
        let mut sink = RecordingSink::new();
        let err = resolve_pipeline_locations(&ResolverOptions::default(), &[vs, ps], &mut sink)
            .unwrap_err();
        assert!(matches!(err, ResolveError::PartialExplicitLocations { .. }), "{err:?}");
        assert!(sink.decorations.is_empty(), "{:?}", sink.decorations);
    }
}
