use indexmap::IndexMap;

use crate::naming::NormalizedName;

use super::types::IrType;

/// A top-level IR type paired with its component-schema name.
#[derive(Debug, Clone)]
pub struct NamedSchema {
    pub name: NormalizedName,
    pub description: Option<String>,
    pub ir: IrType,
}

/// The universe for reference resolution: component-schema name → schema,
/// in document order.
#[derive(Debug, Clone, Default)]
pub struct SchemaContext {
    schemas: IndexMap<String, NamedSchema>,
}

impl SchemaContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, schema: NamedSchema) {
        self.schemas.insert(schema.name.original.clone(), schema);
    }

    pub fn get(&self, name: &str) -> Option<&NamedSchema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.schemas.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedSchema> + '_ {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Replace a schema's IR in place (used by the optimiser phases).
    pub fn map_ir(&mut self, f: impl Fn(IrType) -> IrType) {
        for schema in self.schemas.values_mut() {
            let ir = std::mem::replace(&mut schema.ir, IrType::Unknown);
            schema.ir = f(ir);
        }
    }
}
