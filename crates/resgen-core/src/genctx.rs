use std::collections::BTreeSet;

use crate::ir::IrType;
use crate::warnings::{Warning, WarningKind};

/// An inline complex type promoted to a synthetic name because the target
/// language forbids unnamed records or variants in that position.
#[derive(Debug, Clone)]
pub struct ExtractedType {
    pub name: String,
    pub ir: IrType,
    /// Whether the entry is an unboxed (runtime-kind-tagged) variant rather
    /// than a record.
    pub unboxed: bool,
}

/// Per-top-level-schema workspace shared by the type emitter and the schema
/// emitter. The type emitter runs first and fills the extracted-type table;
/// the schema emitter reads it, which is what keeps emitted validators in
/// field-for-field agreement with emitted types.
#[derive(Debug)]
pub struct GenContext {
    /// Dotted location for diagnostics, e.g. `Note.poll.choices`.
    segments: Vec<String>,
    /// Whether emission happens inside the aggregate component-schemas
    /// module (changes how qualified references are written).
    pub inside_component_schemas: bool,
    /// Names visible at the current scope.
    pub available_schemas: BTreeSet<String>,
    /// Prepended to cross-module references (`SharedBase` mode).
    pub module_prefix: Option<String>,
    /// When the current schema is self-referential, references to this name
    /// lower to the recursion marker.
    pub self_ref_name: Option<String>,
    pub warnings: Vec<Warning>,
    /// Set for the second (validator) pass over the same IR so diagnostics
    /// are reported once, by the pass that filled the table.
    pub quiet: bool,
    extracted: Vec<ExtractedType>,
    extract_counter: u32,
}

impl GenContext {
    pub fn new(schema_name: &str, available_schemas: BTreeSet<String>) -> Self {
        Self {
            segments: vec![schema_name.to_string()],
            inside_component_schemas: false,
            available_schemas,
            module_prefix: None,
            self_ref_name: None,
            warnings: Vec::new(),
            quiet: false,
            extracted: Vec::new(),
            extract_counter: 0,
        }
    }

    pub fn path(&self) -> String {
        self.segments.join(".")
    }

    pub fn push_path(&mut self, segment: &str) {
        self.segments.push(segment.to_string());
    }

    pub fn pop_path(&mut self) {
        self.segments.pop();
    }

    pub fn warn(&mut self, kind: WarningKind) {
        if self.quiet {
            return;
        }
        let path = self.path();
        self.warnings.push(Warning::new(kind, path));
    }

    /// Register an extracted type, deduplicating by structural shape:
    /// interning the same shape twice returns the first entry's name, so
    /// the schema emitter sees exactly the table the type emitter built.
    pub fn intern(&mut self, hint: &str, ir: &IrType, unboxed: bool) -> String {
        if let Some(existing) = self.find(ir) {
            return existing.name.clone();
        }
        let mut name = hint.to_string();
        while self.extracted.iter().any(|e| e.name == name) {
            self.extract_counter += 1;
            name = format!("{hint}{}", self.extract_counter);
        }
        self.extracted.push(ExtractedType {
            name: name.clone(),
            ir: ir.clone(),
            unboxed,
        });
        name
    }

    /// Look up a previously interned entry by structural shape.
    pub fn find(&self, ir: &IrType) -> Option<&ExtractedType> {
        self.extracted.iter().find(|e| e.ir.same_shape(ir))
    }

    pub fn extracted(&self) -> &[ExtractedType] {
        &self.extracted
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}
