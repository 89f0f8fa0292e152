use serde_json::Value;

use crate::document::schema::{
    AdditionalProperties, SchemaNode, SchemaOrRef, SchemaType, TypeSet,
};
use crate::warnings::{Warning, WarningKind};

use super::types::{IrLiteral, IrProperty, IrType};

/// Recursion bound for a single schema tree. Pathological `$ref` cycles that
/// escaped external dereferencing bottom out here instead of overflowing.
pub const MAX_DEPTH: usize = 30;

/// Translate a JSON-Schema node into the IR, accumulating warnings.
pub fn parse_schema(node: &SchemaOrRef, path: &str, warnings: &mut Vec<Warning>) -> IrType {
    parse_at(node, path, warnings, 0)
}

fn parse_at(node: &SchemaOrRef, path: &str, warnings: &mut Vec<Warning>, depth: usize) -> IrType {
    if depth > MAX_DEPTH {
        warnings.push(Warning::new(WarningKind::DepthLimitReached, path));
        return IrType::Unknown;
    }

    match node {
        // A $ref is preserved, never chased; composition keywords on the
        // same object are ignored.
        SchemaOrRef::Ref { ref_path } => {
            let name = ref_path.rsplit('/').next().unwrap_or(ref_path);
            IrType::Reference(name.to_string())
        }
        SchemaOrRef::Schema(schema) => parse_node(schema, path, warnings, depth),
    }
}

fn parse_node(schema: &SchemaNode, path: &str, warnings: &mut Vec<Warning>, depth: usize) -> IrType {
    // 3.0-style nullability: strip the flag, parse the base, wrap.
    if schema.nullable == Some(true) {
        let mut base = schema.clone();
        base.nullable = None;
        let inner = parse_node(&base, path, warnings, depth + 1);
        return IrType::option(inner);
    }

    match &schema.schema_type {
        Some(TypeSet::Single(t)) => parse_typed(schema, *t, path, warnings, depth),
        Some(TypeSet::Multiple(types)) => parse_type_set(schema, types, path, warnings, depth),
        None => parse_untyped(schema, path, warnings, depth),
    }
}

fn parse_typed(
    schema: &SchemaNode,
    t: SchemaType,
    path: &str,
    warnings: &mut Vec<Warning>,
    depth: usize,
) -> IrType {
    match t {
        SchemaType::String => IrType::String {
            min_len: schema.min_length,
            max_len: schema.max_length,
            pattern: schema.pattern.clone(),
        },
        SchemaType::Number => IrType::Number {
            min: schema.minimum,
            max: schema.maximum,
            multiple_of: schema.multiple_of,
        },
        SchemaType::Integer => IrType::Integer {
            min: schema.minimum,
            max: schema.maximum,
            multiple_of: schema.multiple_of,
        },
        SchemaType::Boolean => IrType::Boolean,
        SchemaType::Null => IrType::Null,
        SchemaType::Array => parse_array(schema, path, warnings, depth),
        SchemaType::Object => {
            if !schema.all_of.is_empty() {
                parse_all_of(schema, path, warnings, depth)
            } else {
                parse_object(schema, path, warnings, depth)
            }
        }
    }
}

/// OpenAPI 3.1 `type: [..]` arrays. A null entry turns into an `Option`
/// wrapper; multiple non-null entries become a union.
fn parse_type_set(
    schema: &SchemaNode,
    types: &[SchemaType],
    path: &str,
    warnings: &mut Vec<Warning>,
    depth: usize,
) -> IrType {
    let has_null = types.contains(&SchemaType::Null);
    let non_null: Vec<SchemaType> = types
        .iter()
        .copied()
        .filter(|t| *t != SchemaType::Null)
        .collect();

    let base = match non_null.as_slice() {
        [] => return IrType::Null,
        [single] => parse_typed(schema, *single, path, warnings, depth + 1),
        many => IrType::Union(
            many.iter()
                .map(|t| parse_typed(schema, *t, path, warnings, depth + 1))
                .collect(),
        ),
    };

    if has_null {
        IrType::option(base)
    } else {
        base
    }
}

fn parse_untyped(
    schema: &SchemaNode,
    path: &str,
    warnings: &mut Vec<Warning>,
    depth: usize,
) -> IrType {
    if !schema.enum_values.is_empty() {
        return parse_enum(&schema.enum_values);
    }
    if let Some(value) = &schema.const_value {
        return match literal_of(value) {
            Some(lit) => IrType::Literal(lit),
            None => IrType::Unknown,
        };
    }
    if !schema.all_of.is_empty() {
        return parse_all_of(schema, path, warnings, depth);
    }
    if !schema.one_of.is_empty() {
        return parse_member_union(&schema.one_of, path, warnings, depth);
    }
    if !schema.any_of.is_empty() {
        return parse_member_union(&schema.any_of, path, warnings, depth);
    }
    // Implicit shapes: properties without `type: object`, items without
    // `type: array`.
    if !schema.properties.is_empty() || schema.additional_properties.is_some() {
        return parse_object(schema, path, warnings, depth);
    }
    if schema.items.is_some() {
        return parse_array(schema, path, warnings, depth);
    }
    IrType::Unknown
}

fn parse_enum(values: &[Value]) -> IrType {
    let members: Vec<IrType> = values
        .iter()
        .filter_map(literal_of)
        .map(IrType::Literal)
        .collect();
    if members.is_empty() {
        IrType::Unknown
    } else {
        IrType::Union(members)
    }
}

fn literal_of(value: &Value) -> Option<IrLiteral> {
    match value {
        Value::String(s) => Some(IrLiteral::Str(s.clone())),
        Value::Number(n) => n.as_f64().map(IrLiteral::Num),
        Value::Bool(b) => Some(IrLiteral::Bool(*b)),
        Value::Null => Some(IrLiteral::Null),
        _ => None,
    }
}

fn parse_array(schema: &SchemaNode, path: &str, warnings: &mut Vec<Warning>, depth: usize) -> IrType {
    let items = match &schema.items {
        Some(items) => parse_at(items, &format!("{path}.items"), warnings, depth + 1),
        None => IrType::Unknown,
    };
    IrType::Array {
        items: Box::new(items),
        min_items: schema.min_items,
        max_items: schema.max_items,
        unique: schema.unique_items.unwrap_or(false),
    }
}

fn parse_object(
    schema: &SchemaNode,
    path: &str,
    warnings: &mut Vec<Warning>,
    depth: usize,
) -> IrType {
    let properties: Vec<IrProperty> = schema
        .properties
        .iter()
        .map(|(name, prop)| {
            let ir = parse_at(prop, &format!("{path}.{name}"), warnings, depth + 1);
            IrProperty::new(name.clone(), ir, schema.required.contains(name))
        })
        .collect();

    let additional = match &schema.additional_properties {
        Some(AdditionalProperties::Schema(s)) => Some(Box::new(parse_at(
            s,
            &format!("{path}.additionalProperties"),
            warnings,
            depth + 1,
        ))),
        Some(AdditionalProperties::Bool(true)) => Some(Box::new(IrType::Unknown)),
        Some(AdditionalProperties::Bool(false)) | None => None,
    };

    IrType::Object {
        properties,
        additional,
    }
}

/// `allOf` becomes an intersection; when the carrier schema has properties
/// of its own, they join as a trailing object member.
fn parse_all_of(
    schema: &SchemaNode,
    path: &str,
    warnings: &mut Vec<Warning>,
    depth: usize,
) -> IrType {
    let mut members: Vec<IrType> = schema
        .all_of
        .iter()
        .enumerate()
        .map(|(i, sub)| parse_at(sub, &format!("{path}.allOf[{i}]"), warnings, depth + 1))
        .collect();

    if !schema.properties.is_empty() {
        let mut carrier = schema.clone();
        carrier.all_of = Vec::new();
        members.push(parse_object(&carrier, path, warnings, depth));
    }

    IrType::Intersection(members)
}

fn parse_member_union(
    members: &[SchemaOrRef],
    path: &str,
    warnings: &mut Vec<Warning>,
    depth: usize,
) -> IrType {
    IrType::Union(
        members
            .iter()
            .enumerate()
            .map(|(i, sub)| parse_at(sub, &format!("{path}[{i}]"), warnings, depth + 1))
            .collect(),
    )
}
