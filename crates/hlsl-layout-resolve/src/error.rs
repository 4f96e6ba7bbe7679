use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decl::Direction;

/// Where a declaration came from in the source program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            write!(f, "<unknown>:{}:{}", self.line, self.column)
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

/// Fatal resolution failure. Aborts the pass for the whole compilation unit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error(
        "{loc}: partial explicit stage {direction} location assignment via vk::location is unsupported ('{name}' has none)"
    )]
    PartialExplicitLocations {
        direction: Direction,
        name: String,
        loc: SourceLocation,
    },

    #[error("{loc}: stage {direction} location #{location} (index {index}) already consumed ('{name}')")]
    DuplicateLocation {
        direction: Direction,
        location: u32,
        index: u32,
        name: String,
        loc: SourceLocation,
    },

    #[error("{loc}: duplicate {direction} semantic {semantic} in entry point '{entry_point}'")]
    DuplicateSemantic {
        direction: Direction,
        semantic: String,
        entry_point: String,
        loc: SourceLocation,
    },

    #[error("{loc}: render target SV_Target{index} is written more than once in entry point '{entry_point}'")]
    DuplicateTarget {
        index: u32,
        entry_point: String,
        loc: SourceLocation,
    },

    #[error("{loc}: resource '{name}' has no register assignment, which is required in strict register mode")]
    MissingRegister { name: String, loc: SourceLocation },

    #[error(
        "{loc}: counter of '{name}' needs an explicit counter binding in strict register mode"
    )]
    CounterBindingRequired { name: String, loc: SourceLocation },

    #[error("{loc}: invalid declaration '{name}': {reason}")]
    InvalidDeclaration {
        name: String,
        loc: SourceLocation,
        reason: String,
    },
}

impl ResolveError {
    pub(crate) fn invalid(name: &str, loc: &SourceLocation, reason: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            name: name.to_owned(),
            loc: loc.clone(),
            reason: reason.into(),
        }
    }
}

/// A semantic string whose trailing index does not fit in 32 bits.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("semantic index of '{0}' is out of range")]
pub struct ParseSemanticError(pub String);

/// Recoverable finding. The assignment it is reported with is still complete.
///
/// Explicit binding collisions are only warned about: a later dead-code pass may drop one of the
/// colliding declarations before the module is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    BindingCollision {
        set: u32,
        binding: u32,
        name: String,
        loc: SourceLocation,
    },
    LinkageMismatch {
        semantic: String,
        output_location: u32,
        input_location: u32,
        producer: String,
        consumer: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::BindingCollision {
                set,
                binding,
                name,
                loc,
            } => write!(
                f,
                "{loc}: resource binding #{binding} in descriptor set #{set} already assigned to another resource ('{name}')"
            ),
            Diagnostic::LinkageMismatch {
                semantic,
                output_location,
                input_location,
                producer,
                consumer,
            } => write!(
                f,
                "semantic {semantic} is written by '{producer}' at location {output_location} but read by '{consumer}' at location {input_location}"
            ),
        }
    }
}
