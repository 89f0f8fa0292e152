use std::fmt;

use serde_json::{json, Value};

/// A property of an object type, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct IrProperty {
    pub name: String,
    pub ir: IrType,
    pub required: bool,
}

impl IrProperty {
    pub fn new(name: impl Into<String>, ir: IrType, required: bool) -> Self {
        Self {
            name: name.into(),
            ir,
            required,
        }
    }
}

/// A literal value refinement.
#[derive(Debug, Clone, PartialEq)]
pub enum IrLiteral {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
}

/// The normalised algebra of types the schema compiler produces.
///
/// Values are immutable once built; the optimiser returns new values.
/// Constraint fields on primitives carry through to the validator emitter
/// but are invisible to structural equality.
#[derive(Debug, Clone, PartialEq)]
pub enum IrType {
    String {
        min_len: Option<u64>,
        max_len: Option<u64>,
        pattern: Option<String>,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
        multiple_of: Option<f64>,
    },
    Integer {
        min: Option<f64>,
        max: Option<f64>,
        multiple_of: Option<f64>,
    },
    Boolean,
    Null,
    Array {
        items: Box<IrType>,
        min_items: Option<u64>,
        max_items: Option<u64>,
        unique: bool,
    },
    Object {
        properties: Vec<IrProperty>,
        additional: Option<Box<IrType>>,
    },
    Literal(IrLiteral),
    Union(Vec<IrType>),
    Intersection(Vec<IrType>),
    /// Schema name only; the `#/components/schemas/` prefix is stripped at
    /// parse time.
    Reference(String),
    /// Nullable wrapper. Idempotent: the constructor collapses
    /// `Option(Option(x))` to `Option(x)`.
    Option(Box<IrType>),
    /// The bottom of the lattice; everything unclassifiable lands here.
    Unknown,
}

impl IrType {
    pub fn string() -> Self {
        IrType::String {
            min_len: None,
            max_len: None,
            pattern: None,
        }
    }

    pub fn number() -> Self {
        IrType::Number {
            min: None,
            max: None,
            multiple_of: None,
        }
    }

    pub fn integer() -> Self {
        IrType::Integer {
            min: None,
            max: None,
            multiple_of: None,
        }
    }

    pub fn array(items: IrType) -> Self {
        IrType::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
            unique: false,
        }
    }

    pub fn object(properties: Vec<IrProperty>) -> Self {
        IrType::Object {
            properties,
            additional: None,
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        IrType::Reference(name.into())
    }

    /// Nullable wrapper; collapses a double option on construction.
    pub fn option(inner: IrType) -> Self {
        match inner {
            opt @ IrType::Option(_) => opt,
            other => IrType::Option(Box::new(other)),
        }
    }

    /// Structural equality, blind to constraint fields on primitives and
    /// array bounds. This is the relation that dedups extracted auxiliary
    /// types, so both emitters must consult exactly this.
    pub fn same_shape(&self, other: &IrType) -> bool {
        use IrType::*;
        match (self, other) {
            (String { .. }, String { .. }) => true,
            (Number { .. }, Number { .. }) => true,
            (Integer { .. }, Integer { .. }) => true,
            (Boolean, Boolean) | (Null, Null) | (Unknown, Unknown) => true,
            (Array { items: a, .. }, Array { items: b, .. }) => a.same_shape(b),
            (
                Object {
                    properties: pa,
                    additional: aa,
                },
                Object {
                    properties: pb,
                    additional: ab,
                },
            ) => {
                pa.len() == pb.len()
                    && pa.iter().zip(pb).all(|(x, y)| {
                        x.name == y.name && x.required == y.required && x.ir.same_shape(&y.ir)
                    })
                    && match (aa, ab) {
                        (None, None) => true,
                        (Some(x), Some(y)) => x.same_shape(y),
                        _ => false,
                    }
            }
            (Literal(a), Literal(b)) => a == b,
            (Union(a), Union(b)) | (Intersection(a), Intersection(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_shape(y))
            }
            (Reference(a), Reference(b)) => a == b,
            (Option(a), Option(b)) => a.same_shape(b),
            _ => false,
        }
    }

    /// Canonical pretty-print of the shape; the dedup key for union members
    /// and extracted-type lookup. Two types have equal keys iff
    /// `same_shape` holds.
    pub fn shape_key(&self) -> String {
        self.to_string()
    }

    /// Node count; the optimiser's notion of how big a type is.
    pub fn complexity(&self) -> usize {
        match self {
            IrType::String { .. }
            | IrType::Number { .. }
            | IrType::Integer { .. }
            | IrType::Boolean
            | IrType::Null
            | IrType::Literal(_)
            | IrType::Reference(_)
            | IrType::Unknown => 1,
            IrType::Array { items, .. } => 1 + items.complexity(),
            IrType::Option(inner) => 1 + inner.complexity(),
            IrType::Object {
                properties,
                additional,
            } => {
                1 + properties.iter().map(|p| p.ir.complexity()).sum::<usize>()
                    + additional.as_ref().map_or(0, |a| a.complexity())
            }
            IrType::Union(members) | IrType::Intersection(members) => {
                1 + members.iter().map(|m| m.complexity()).sum::<usize>()
            }
        }
    }

    /// Whether this type is small enough to inline in place of a reference:
    /// a primitive, a literal, a reference, or an array of something simple.
    pub fn is_simple(&self) -> bool {
        match self {
            IrType::String { .. }
            | IrType::Number { .. }
            | IrType::Integer { .. }
            | IrType::Boolean
            | IrType::Null
            | IrType::Literal(_)
            | IrType::Reference(_)
            | IrType::Unknown => true,
            IrType::Array { items, .. } => items.is_simple(),
            _ => false,
        }
    }

    /// Whether a decoded value of this type may be `null`/absent. Drives
    /// double-option elision in both emitters.
    pub fn is_nullish(&self) -> bool {
        match self {
            IrType::Null | IrType::Option(_) | IrType::Literal(IrLiteral::Null) => true,
            IrType::Union(members) => members.iter().any(|m| m.is_nullish()),
            _ => false,
        }
    }

    /// Append every directly referenced schema name, first-occurrence order,
    /// no duplicates. The edge source for the dependency sort.
    pub fn collect_refs(&self, out: &mut Vec<String>) {
        match self {
            IrType::Reference(name) => {
                if !out.iter().any(|n| n == name) {
                    out.push(name.clone());
                }
            }
            IrType::Array { items, .. } => items.collect_refs(out),
            IrType::Option(inner) => inner.collect_refs(out),
            IrType::Object {
                properties,
                additional,
            } => {
                for p in properties {
                    p.ir.collect_refs(out);
                }
                if let Some(a) = additional {
                    a.collect_refs(out);
                }
            }
            IrType::Union(members) | IrType::Intersection(members) => {
                for m in members {
                    m.collect_refs(out);
                }
            }
            _ => {}
        }
    }

    /// Whether the type's body mentions the given schema name.
    pub fn contains_ref(&self, name: &str) -> bool {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs.iter().any(|n| n == name)
    }

    /// Render the IR back to a JSON-Schema document. Re-parsing the result
    /// yields a structurally equal IR (constraints on primitives survive
    /// too, but equality would not notice if they did not).
    pub fn to_schema_json(&self) -> Value {
        match self {
            IrType::String {
                min_len,
                max_len,
                pattern,
            } => {
                let mut map = serde_json::Map::new();
                map.insert("type".into(), json!("string"));
                if let Some(v) = min_len {
                    map.insert("minLength".into(), json!(v));
                }
                if let Some(v) = max_len {
                    map.insert("maxLength".into(), json!(v));
                }
                if let Some(v) = pattern {
                    map.insert("pattern".into(), json!(v));
                }
                Value::Object(map)
            }
            IrType::Number {
                min,
                max,
                multiple_of,
            } => numeric_schema("number", *min, *max, *multiple_of),
            IrType::Integer {
                min,
                max,
                multiple_of,
            } => numeric_schema("integer", *min, *max, *multiple_of),
            IrType::Boolean => json!({"type": "boolean"}),
            IrType::Null => json!({"type": "null"}),
            IrType::Array {
                items,
                min_items,
                max_items,
                unique,
            } => {
                let mut map = serde_json::Map::new();
                map.insert("type".into(), json!("array"));
                map.insert("items".into(), items.to_schema_json());
                if let Some(v) = min_items {
                    map.insert("minItems".into(), json!(v));
                }
                if let Some(v) = max_items {
                    map.insert("maxItems".into(), json!(v));
                }
                if *unique {
                    map.insert("uniqueItems".into(), json!(true));
                }
                Value::Object(map)
            }
            IrType::Object {
                properties,
                additional,
            } => {
                let mut map = serde_json::Map::new();
                map.insert("type".into(), json!("object"));
                if !properties.is_empty() {
                    let mut props = serde_json::Map::new();
                    let mut required = Vec::new();
                    for p in properties {
                        props.insert(p.name.clone(), p.ir.to_schema_json());
                        if p.required {
                            required.push(json!(p.name));
                        }
                    }
                    map.insert("properties".into(), Value::Object(props));
                    if !required.is_empty() {
                        map.insert("required".into(), Value::Array(required));
                    }
                }
                if let Some(a) = additional {
                    map.insert("additionalProperties".into(), a.to_schema_json());
                }
                Value::Object(map)
            }
            IrType::Literal(lit) => match lit {
                IrLiteral::Str(s) => json!({"const": s}),
                IrLiteral::Num(n) => json!({"const": n}),
                IrLiteral::Bool(b) => json!({"const": b}),
                IrLiteral::Null => json!({"const": null}),
            },
            IrType::Union(members) => {
                let subs: Vec<Value> = members.iter().map(|m| m.to_schema_json()).collect();
                json!({"oneOf": subs})
            }
            IrType::Intersection(members) => {
                let subs: Vec<Value> = members.iter().map(|m| m.to_schema_json()).collect();
                json!({"allOf": subs})
            }
            IrType::Reference(name) => {
                json!({"$ref": format!("#/components/schemas/{name}")})
            }
            IrType::Option(inner) => {
                let mut obj = inner.to_schema_json();
                if let Some(map) = obj.as_object_mut() {
                    map.insert("nullable".into(), json!(true));
                }
                obj
            }
            IrType::Unknown => json!({}),
        }
    }
}

fn numeric_schema(kind: &str, min: Option<f64>, max: Option<f64>, multiple_of: Option<f64>) -> Value {
    let mut map = serde_json::Map::new();
    map.insert("type".into(), json!(kind));
    if let Some(v) = min {
        map.insert("minimum".into(), json!(v));
    }
    if let Some(v) = max {
        map.insert("maximum".into(), json!(v));
    }
    if let Some(v) = multiple_of {
        map.insert("multipleOf".into(), json!(v));
    }
    Value::Object(map)
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::String { .. } => write!(f, "string"),
            IrType::Number { .. } => write!(f, "number"),
            IrType::Integer { .. } => write!(f, "integer"),
            IrType::Boolean => write!(f, "boolean"),
            IrType::Null => write!(f, "null"),
            IrType::Unknown => write!(f, "unknown"),
            IrType::Array { items, .. } => write!(f, "array<{items}>"),
            IrType::Option(inner) => write!(f, "option<{inner}>"),
            IrType::Reference(name) => write!(f, "ref:{name}"),
            IrType::Literal(lit) => match lit {
                IrLiteral::Str(s) => write!(f, "lit:{s:?}"),
                IrLiteral::Num(n) => write!(f, "lit:{n}"),
                IrLiteral::Bool(b) => write!(f, "lit:{b}"),
                IrLiteral::Null => write!(f, "lit:null"),
            },
            IrType::Object {
                properties,
                additional,
            } => {
                write!(f, "object{{")?;
                for (i, p) in properties.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    let req = if p.required { "!" } else { "?" };
                    write!(f, "{}{req}:{}", p.name, p.ir)?;
                }
                write!(f, "}}")?;
                if let Some(a) = additional {
                    write!(f, "+dict<{a}>")?;
                }
                Ok(())
            }
            IrType::Union(members) => {
                write!(f, "union<")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{m}")?;
                }
                write!(f, ">")
            }
            IrType::Intersection(members) => {
                write!(f, "intersection<")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, "&")?;
                    }
                    write!(f, "{m}")?;
                }
                write!(f, ">")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_is_idempotent() {
        let once = IrType::option(IrType::string());
        let twice = IrType::option(IrType::option(IrType::string()));
        assert_eq!(once, twice);
    }

    #[test]
    fn same_shape_ignores_constraints() {
        let plain = IrType::string();
        let constrained = IrType::String {
            min_len: Some(1),
            max_len: Some(80),
            pattern: Some("^x".to_string()),
        };
        assert!(plain.same_shape(&constrained));
        assert_eq!(plain.shape_key(), constrained.shape_key());
        assert_ne!(plain, constrained);
    }

    #[test]
    fn same_shape_distinguishes_number_from_integer() {
        assert!(!IrType::number().same_shape(&IrType::integer()));
    }

    #[test]
    fn object_shape_depends_on_field_names_and_requiredness() {
        let a = IrType::object(vec![IrProperty::new("id", IrType::integer(), true)]);
        let b = IrType::object(vec![IrProperty::new("id", IrType::integer(), false)]);
        assert!(!a.same_shape(&b));
        assert_ne!(a.shape_key(), b.shape_key());
    }

    #[test]
    fn collect_refs_dedups_in_order() {
        let ir = IrType::object(vec![
            IrProperty::new("a", IrType::reference("Tag"), true),
            IrProperty::new("b", IrType::reference("User"), true),
            IrProperty::new("c", IrType::array(IrType::reference("Tag")), true),
        ]);
        let mut refs = Vec::new();
        ir.collect_refs(&mut refs);
        assert_eq!(refs, ["Tag", "User"]);
    }

    #[test]
    fn nullish_sees_through_unions() {
        let u = IrType::Union(vec![IrType::string(), IrType::Null]);
        assert!(u.is_nullish());
        assert!(!IrType::string().is_nullish());
    }

    #[test]
    fn complexity_counts_nodes() {
        let ir = IrType::object(vec![
            IrProperty::new("id", IrType::integer(), true),
            IrProperty::new("tags", IrType::array(IrType::string()), false),
        ]);
        assert_eq!(ir.complexity(), 4);
    }
}
