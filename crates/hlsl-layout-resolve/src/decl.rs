//! Normalized declaration records consumed by the resolver.
//!
//! The front end lowers every resource and every stage input/output into one of these records
//! before resolution. Only the allocation cost of a declaration is kept (bindings consumed,
//! locations and components consumed); the source type itself never reaches this crate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ParseSemanticError, ResolveError, SourceLocation};

fn one() -> u32 {
    1
}

fn four() -> u32 {
    4
}

/// Interface locations per (entry point, direction, index plane). Explicit and automatic
/// locations must end at or below this bound.
pub const MAX_INTERFACE_LOCATIONS: u32 = 1024;

/// Index planes: 0, plus 1 for the second source of dual-source blending.
pub const INDEX_PLANES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageVarId(pub u32);

/// Legacy register file letter (`b#`, `t#`, `s#`, `u#`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterClass {
    B,
    T,
    S,
    U,
}

impl RegisterClass {
    pub const ALL: [RegisterClass; 4] = [Self::B, Self::T, Self::S, Self::U];

    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'b' | 'B' => Some(Self::B),
            't' | 'T' => Some(Self::T),
            's' | 'S' => Some(Self::S),
            'u' | 'U' => Some(Self::U),
            _ => None,
        }
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::B => 'b',
            Self::T => 't',
            Self::S => 's',
            Self::U => 'u',
        }
    }
}

impl fmt::Display for RegisterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExplicitBinding {
    pub set: u32,
    pub binding: u32,
}

impl ExplicitBinding {
    pub const fn new(set: u32, binding: u32) -> Self {
        Self { set, binding }
    }
}

/// `register(t3, space1)` style assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegisterAssignment {
    pub class: RegisterClass,
    pub number: u32,
    #[serde(default)]
    pub space: Option<u32>,
}

/// Where a resource's binding comes from, in precedence order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceSource {
    /// `[[vk::binding(binding, set)]]`.
    Explicit(ExplicitBinding),
    /// `register(<class><number>[, space<n>])`.
    Register(RegisterAssignment),
    /// `register(space<n>)`: allocate automatically inside that space.
    RegisterSpaceOnly { space: u32 },
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeapKind {
    Resource,
    Sampler,
    Counter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    ConstantBuffer,
    TextureBuffer,
    Texture,
    Sampler,
    StructuredBuffer,
    ByteAddressBuffer,
    RwBuffer,
    RwTexture,
    RwStructuredBuffer,
    RwByteAddressBuffer,
    AppendConsumeBuffer,
    /// Hidden counter paired with a `RwStructuredBuffer` or append/consume buffer.
    CounterBuffer,
    /// Implicit constant block holding loose global uniforms.
    GlobalBlock,
    Heap(HeapKind),
}

impl ResourceKind {
    /// Register class a declaration of this kind would use, used to look up shifts when the
    /// declaration carries no register.
    pub const fn register_class(self) -> RegisterClass {
        match self {
            Self::ConstantBuffer | Self::GlobalBlock => RegisterClass::B,
            Self::TextureBuffer
            | Self::Texture
            | Self::StructuredBuffer
            | Self::ByteAddressBuffer
            | Self::Heap(HeapKind::Resource) => RegisterClass::T,
            Self::Sampler | Self::Heap(HeapKind::Sampler) => RegisterClass::S,
            Self::RwBuffer
            | Self::RwTexture
            | Self::RwStructuredBuffer
            | Self::RwByteAddressBuffer
            | Self::AppendConsumeBuffer
            | Self::CounterBuffer
            | Self::Heap(HeapKind::Counter) => RegisterClass::U,
        }
    }

    pub const fn can_own_counter(self) -> bool {
        matches!(self, Self::RwStructuredBuffer | Self::AppendConsumeBuffer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceVar {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub loc: SourceLocation,
    pub kind: ResourceKind,
    #[serde(default)]
    pub source: ResourceSource,
    /// Bindings consumed; the array size for resource arrays.
    #[serde(default = "one")]
    pub binding_count: u32,
    /// `[[vk::counter_binding(n)]]` on the owning buffer.
    #[serde(default)]
    pub counter_binding: Option<u32>,
    /// Whether the front end needs a hidden counter for this buffer.
    #[serde(default)]
    pub has_counter: bool,
    /// Owning buffer of a [`ResourceKind::CounterBuffer`].
    #[serde(default)]
    pub counter_of: Option<ResourceId>,
}

impl ResourceVar {
    pub fn new(id: u32, name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: ResourceId(id),
            name: name.into(),
            loc: SourceLocation::default(),
            kind,
            source: ResourceSource::None,
            binding_count: 1,
            counter_binding: None,
            has_counter: false,
            counter_of: None,
        }
    }

    pub fn with_source(mut self, source: ResourceSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_explicit(self, set: u32, binding: u32) -> Self {
        self.with_source(ResourceSource::Explicit(ExplicitBinding::new(set, binding)))
    }

    pub fn with_register(self, class: RegisterClass, number: u32, space: Option<u32>) -> Self {
        self.with_source(ResourceSource::Register(RegisterAssignment {
            class,
            number,
            space,
        }))
    }

    pub fn with_binding_count(mut self, count: u32) -> Self {
        self.binding_count = count;
        self
    }

    pub fn with_counter(mut self, counter_binding: Option<u32>) -> Self {
        self.has_counter = true;
        self.counter_binding = counter_binding;
        self
    }

    pub fn at(mut self, loc: SourceLocation) -> Self {
        self.loc = loc;
        self
    }

    pub fn is_counter(&self) -> bool {
        self.kind == ResourceKind::CounterBuffer
    }

    pub fn is_global_block(&self) -> bool {
        self.kind == ResourceKind::GlobalBlock
    }

    pub fn heap_kind(&self) -> Option<HeapKind> {
        match self.kind {
            ResourceKind::Heap(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.binding_count == 0 {
            return Err(ResolveError::invalid(
                &self.name,
                &self.loc,
                "binding count must be at least 1",
            ));
        }
        if self.is_counter() != self.counter_of.is_some() {
            return Err(ResolveError::invalid(
                &self.name,
                &self.loc,
                "counter resources must name exactly one owning buffer",
            ));
        }
        Ok(())
    }
}

/// Appends a hidden counter record right after every buffer that needs one.
///
/// Counter ids are allocated after the highest id already present, in buffer order.
pub fn flatten_counters(resources: Vec<ResourceVar>) -> Vec<ResourceVar> {
    let mut next_id = resources.iter().map(|r| r.id.0.wrapping_add(1)).max().unwrap_or(0);
    let mut out = Vec::with_capacity(resources.len());
    for res in resources {
        let counter = (res.has_counter && res.kind.can_own_counter()).then(|| {
            let mut counter = ResourceVar::new(
                next_id,
                format!("counter.var.{}", res.name),
                ResourceKind::CounterBuffer,
            )
            .with_binding_count(res.binding_count)
            .at(res.loc.clone());
            counter.counter_of = Some(res.id);
            next_id = next_id.wrapping_add(1);
            counter
        });
        out.push(res);
        out.extend(counter);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Input => "input",
            Direction::Output => "output",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderStage {
    Vertex,
    Hull,
    Domain,
    Geometry,
    Pixel,
    Compute,
    Mesh,
    Amplification,
}

/// Interface table a stage variable belongs to: stage, direction and sub-phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignaturePoint {
    VsIn,
    VsOut,
    HsCpIn,
    HsCpOut,
    /// Hull shader patch-constant output.
    HsPcOut,
    DsCpIn,
    /// Domain shader patch-constant input.
    DsPcIn,
    DsOut,
    GsIn,
    GsOut,
    PsIn,
    PsOut,
    MsOut,
    MsPrimOut,
    CsIn,
}

impl SignaturePoint {
    pub const fn direction(self) -> Direction {
        match self {
            Self::VsIn
            | Self::HsCpIn
            | Self::DsCpIn
            | Self::DsPcIn
            | Self::GsIn
            | Self::PsIn
            | Self::CsIn => Direction::Input,
            Self::VsOut
            | Self::HsCpOut
            | Self::HsPcOut
            | Self::DsOut
            | Self::GsOut
            | Self::PsOut
            | Self::MsOut
            | Self::MsPrimOut => Direction::Output,
        }
    }

    pub const fn stage(self) -> ShaderStage {
        match self {
            Self::VsIn | Self::VsOut => ShaderStage::Vertex,
            Self::HsCpIn | Self::HsCpOut | Self::HsPcOut => ShaderStage::Hull,
            Self::DsCpIn | Self::DsPcIn | Self::DsOut => ShaderStage::Domain,
            Self::GsIn | Self::GsOut => ShaderStage::Geometry,
            Self::PsIn | Self::PsOut => ShaderStage::Pixel,
            Self::MsOut | Self::MsPrimOut => ShaderStage::Mesh,
            Self::CsIn => ShaderStage::Compute,
        }
    }

    /// Vertex inputs and pixel outputs face the application, so their layout is never packed or
    /// reordered.
    pub const fn is_fixed_layout(self) -> bool {
        matches!(self, Self::VsIn | Self::PsOut)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Semantic {
    pub name: String,
    #[serde(default)]
    pub index: u32,
}

impl Semantic {
    pub fn new(name: impl Into<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }

    /// Splits a trailing decimal index off a semantic string (`TEXCOORD3` -> `TEXCOORD`, 3).
    pub fn parse(s: &str) -> Result<Self, ParseSemanticError> {
        let digits = s.bytes().rev().take_while(u8::is_ascii_digit).count();
        let (name, index) = s.split_at(s.len() - digits);
        let index = match index {
            "" => 0,
            digits => digits
                .parse()
                .map_err(|_| ParseSemanticError(s.to_owned()))?,
        };
        Ok(Self::new(name, index))
    }

    pub fn is_target(&self) -> bool {
        self.name.eq_ignore_ascii_case("SV_Target")
    }

    /// Case-insensitive identity used for duplicate detection.
    pub fn key(&self) -> (String, u32) {
        (self.name.to_ascii_uppercase(), self.index)
    }
}

impl std::str::FromStr for Semantic {
    type Err = ParseSemanticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.index)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationSource {
    /// `[[vk::location(n)]]`, with `[[vk::index(i)]]` for dual-source blending.
    Explicit {
        location: u32,
        #[serde(default)]
        index: Option<u32>,
    },
    #[default]
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageVar {
    pub id: StageVarId,
    pub name: String,
    #[serde(default)]
    pub loc: SourceLocation,
    pub sig_point: SignaturePoint,
    #[serde(default)]
    pub semantic: Option<Semantic>,
    #[serde(default = "one")]
    pub location_count: u32,
    #[serde(default = "four")]
    pub component_count: u32,
    /// 64-bit element types must start at component 0 or 2.
    #[serde(default)]
    pub component_alignment: bool,
    #[serde(default)]
    pub location: LocationSource,
    #[serde(default)]
    pub is_builtin: bool,
}

impl StageVar {
    pub fn new(id: u32, name: impl Into<String>, sig_point: SignaturePoint) -> Self {
        Self {
            id: StageVarId(id),
            name: name.into(),
            loc: SourceLocation::default(),
            sig_point,
            semantic: None,
            location_count: 1,
            component_count: 4,
            component_alignment: false,
            location: LocationSource::None,
            is_builtin: false,
        }
    }

    pub fn with_semantic(mut self, semantic: Semantic) -> Self {
        self.semantic = Some(semantic);
        self
    }

    pub fn with_cost(mut self, location_count: u32, component_count: u32) -> Self {
        self.location_count = location_count;
        self.component_count = component_count;
        self
    }

    pub fn with_alignment(mut self) -> Self {
        self.component_alignment = true;
        self
    }

    pub fn with_location(mut self, location: u32, index: Option<u32>) -> Self {
        self.location = LocationSource::Explicit { location, index };
        self
    }

    pub fn builtin(mut self) -> Self {
        self.is_builtin = true;
        self
    }

    pub fn at(mut self, loc: SourceLocation) -> Self {
        self.loc = loc;
        self
    }

    pub fn direction(&self) -> Direction {
        self.sig_point.direction()
    }

    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.location_count == 0 {
            return Err(ResolveError::invalid(
                &self.name,
                &self.loc,
                "location count must be at least 1",
            ));
        }
        if !(1..=4).contains(&self.component_count) {
            return Err(ResolveError::invalid(
                &self.name,
                &self.loc,
                format!("component count {} is outside 1..=4", self.component_count),
            ));
        }
        if self.location_count > MAX_INTERFACE_LOCATIONS {
            return Err(ResolveError::invalid(
                &self.name,
                &self.loc,
                format!(
                    "location count {} exceeds {MAX_INTERFACE_LOCATIONS}",
                    self.location_count
                ),
            ));
        }
        if let LocationSource::Explicit { location, index } = self.location {
            if index.is_some_and(|i| i >= INDEX_PLANES) {
                return Err(ResolveError::invalid(
                    &self.name,
                    &self.loc,
                    format!("vk::index({}) must be 0 or 1", index.unwrap_or_default()),
                ));
            }
            self.check_location_range("vk::location", location)?;
        }
        if self.direction() == Direction::Output {
            if let Some(semantic) = self.semantic.as_ref().filter(|s| s.is_target()) {
                self.check_location_range("render target", semantic.index)?;
            }
        }
        Ok(())
    }

    /// `[start, start + location_count)` must stay within [`MAX_INTERFACE_LOCATIONS`].
    fn check_location_range(&self, what: &str, start: u32) -> Result<(), ResolveError> {
        match start.checked_add(self.location_count) {
            Some(end) if end <= MAX_INTERFACE_LOCATIONS => Ok(()),
            _ => Err(ResolveError::invalid(
                &self.name,
                &self.loc,
                format!(
                    "{what} {start} with {} locations ends past {MAX_INTERFACE_LOCATIONS}",
                    self.location_count
                ),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub name: String,
    pub stage: ShaderStage,
    #[serde(default)]
    pub vars: Vec<StageVar>,
}

impl EntryPoint {
    pub fn new(name: impl Into<String>, stage: ShaderStage, vars: Vec<StageVar>) -> Self {
        Self {
            name: name.into(),
            stage,
            vars,
        }
    }
}
