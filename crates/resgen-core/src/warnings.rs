use std::fmt;

/// Recoverable conditions. The compiler and emitters accumulate these and
/// keep going; callers render or deduplicate them as they see fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    /// Dotted location inside the input schema, e.g. `Note.properties.poll`.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// A `$ref` target was not found; the type fell back to plain JSON.
    FallbackToJson { reference: String },
    /// Parsing recursed past the depth limit.
    DepthLimitReached,
    /// An `allOf` mixed object and non-object members; only the object
    /// parts were merged.
    IntersectionNotFullySupported,
    /// A union's members could not be told apart at runtime; only the last
    /// member was emitted.
    ComplexUnionSimplified,
    /// A schema name expected at this scope does not exist.
    MissingSchema { name: String },
}

impl Warning {
    pub fn new(kind: WarningKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::FallbackToJson { reference } => {
                write!(
                    f,
                    "{}: unresolved reference {reference}, falling back to JSON",
                    self.path
                )
            }
            WarningKind::DepthLimitReached => {
                write!(f, "{}: schema nesting exceeds depth limit", self.path)
            }
            WarningKind::IntersectionNotFullySupported => {
                write!(
                    f,
                    "{}: allOf mixes object and non-object members; merged object parts only",
                    self.path
                )
            }
            WarningKind::ComplexUnionSimplified => {
                write!(
                    f,
                    "{}: union members are not runtime-distinguishable; emitted last member",
                    self.path
                )
            }
            WarningKind::MissingSchema { name } => {
                write!(f, "{}: schema {name} is not defined in this scope", self.path)
            }
        }
    }
}
