use resgen_core::genctx::GenContext;
use resgen_core::ir::{IrLiteral, IrProperty, IrType};
use resgen_core::naming::normalize_name;
use resgen_core::warnings::WarningKind;

use crate::keywords::{escape_label, escape_string, polyvariant_tag};
use crate::unions::{self, UnionShape};

/// Auxiliary definitions accumulated while lowering one named schema:
/// extracted record types, unboxed variants, and their validators, in
/// definition order (every entry only references earlier entries).
#[derive(Debug, Default)]
pub struct AuxDefs {
    /// `(synthetic name, full type definition)`.
    pub types: Vec<(String, String)>,
    /// `(synthetic name, full validator binding)`.
    pub schemas: Vec<(String, String)>,
}

/// Lower an IR type to a ReScript type expression.
///
/// `inline` marks positions under a type constructor (array element, option
/// parameter, field of a record) where ReScript forbids anonymous records
/// and variants; complex shapes there are promoted to synthetic names via
/// the generation context.
pub fn lower_type(ir: &IrType, ctx: &mut GenContext, aux: &mut AuxDefs, inline: bool) -> String {
    match ir {
        IrType::String { .. } => "string".to_string(),
        IrType::Number { .. } => "float".to_string(),
        IrType::Integer { .. } => "int".to_string(),
        IrType::Boolean => "bool".to_string(),
        IrType::Null => "unit".to_string(),
        IrType::Unknown => "JSON.t".to_string(),
        IrType::Literal(lit) => match lit {
            IrLiteral::Str(_) => "string".to_string(),
            IrLiteral::Num(_) => "float".to_string(),
            IrLiteral::Bool(_) => "bool".to_string(),
            IrLiteral::Null => "unit".to_string(),
        },
        IrType::Array { items, .. } => {
            format!("array<{}>", lower_type(items, ctx, aux, true))
        }
        IrType::Option(inner) => {
            let lowered = lower_type(inner, ctx, aux, true);
            wrap_option(lowered)
        }
        IrType::Object {
            properties,
            additional,
        } => {
            if properties.is_empty() {
                let value = match additional {
                    Some(v) => lower_type(v, ctx, aux, true),
                    None => "JSON.t".to_string(),
                };
                return format!("dict<{value}>");
            }
            if inline {
                extract_record(ir, properties, ctx, aux)
            } else {
                render_record(properties, ctx, aux)
            }
        }
        IrType::Reference(name) => lower_reference(name, ctx, ".t"),
        IrType::Union(members) => lower_union(members, ctx, aux, inline),
        IrType::Intersection(members) => lower_intersection(members, ctx, aux, inline),
    }
}

/// Wrap in `option<…>` unless the expression is already an option.
fn wrap_option(inner: String) -> String {
    if inner.starts_with("option<") {
        inner
    } else {
        format!("option<{inner}>")
    }
}

/// Strip one `option<…>` layer (ReScript's `?:` record sugar supplies it).
pub fn strip_option(ty: &str) -> &str {
    ty.strip_prefix("option<")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(ty)
}

/// Qualify a schema reference against the current scope. `suffix` is `.t`
/// for types and `.schema` for validators.
pub fn lower_reference(name: &str, ctx: &mut GenContext, suffix: &str) -> String {
    if ctx.self_ref_name.as_deref() == Some(name) {
        return match suffix {
            ".t" => "t".to_string(),
            _ => "selfSchema".to_string(),
        };
    }
    if !ctx.available_schemas.contains(name) {
        ctx.warn(WarningKind::MissingSchema {
            name: name.to_string(),
        });
        return match suffix {
            ".t" => "JSON.t".to_string(),
            _ => "S.json".to_string(),
        };
    }
    let pascal = normalize_name(name).pascal_case;
    let prefix = match &ctx.module_prefix {
        Some(p) => format!("{p}."),
        None => String::new(),
    };
    if ctx.inside_component_schemas {
        format!("{prefix}{pascal}{suffix}")
    } else {
        format!("{prefix}Schemas.{pascal}{suffix}")
    }
}

/// Render a record literal, one field per line. Only legal at definition
/// positions; inline callers go through `extract_record` instead.
pub fn render_record(
    properties: &[IrProperty],
    ctx: &mut GenContext,
    aux: &mut AuxDefs,
) -> String {
    let mut fields = Vec::with_capacity(properties.len());
    for p in properties {
        ctx.push_path(&p.name);
        let ty = lower_type(&p.ir, ctx, aux, true);
        ctx.pop_path();

        let (label, renamed) = escape_label(&p.name);
        let alias = if renamed {
            format!("@as(\"{}\") ", escape_string(&p.name))
        } else {
            String::new()
        };
        if p.required {
            fields.push(format!("  {alias}{label}: {ty},"));
        } else {
            // `label?:` already reads as an option; avoid option<option<_>>.
            fields.push(format!("  {alias}{label}?: {},", strip_option(&ty)));
        }
    }
    format!("{{\n{}\n}}", fields.join("\n"))
}

/// Promote an inline record to a synthetic named type. Children lower
/// first so nested extractions land ahead of their parent in `aux`.
fn extract_record(
    ir: &IrType,
    properties: &[IrProperty],
    ctx: &mut GenContext,
    aux: &mut AuxDefs,
) -> String {
    if let Some(existing) = ctx.find(ir) {
        return existing.name.clone();
    }
    let body = render_record(properties, ctx, aux);
    let name = ctx.intern(&extraction_hint(ctx), ir, false);
    aux.types.push((name.clone(), format!("type {name} = {body}")));
    name
}

fn lower_union(
    members: &[IrType],
    ctx: &mut GenContext,
    aux: &mut AuxDefs,
    inline: bool,
) -> String {
    let plan = unions::analyze(members);

    let lowered = match &plan.shape {
        UnionShape::Lone(member) => lower_type(member, ctx, aux, true),
        UnionShape::ArrayOf(item) => {
            format!("array<{}>", lower_type(item, ctx, aux, true))
        }
        UnionShape::Enum(tags) => {
            let tags: Vec<String> = tags.iter().map(|t| polyvariant_tag(t)).collect();
            format!("[{}]", tags.join(" | "))
        }
        UnionShape::Unboxed(variants) => {
            let key = IrType::Union(plan.effective.clone());
            let interned = ctx.find(&key).map(|existing| existing.name.clone());
            if let Some(name) = interned {
                name
            } else {
                let constructors: Vec<String> = variants
                    .iter()
                    .map(|v| {
                        let payload = lower_type(&v.ir, ctx, aux, true);
                        format!("{}({payload})", v.constructor)
                    })
                    .collect();
                let name = ctx.intern(&extraction_hint(ctx), &key, true);
                aux.types.push((
                    name.clone(),
                    format!(
                        "@unboxed\ntype {name} =\n  | {}",
                        constructors.join("\n  | ")
                    ),
                ));
                name
            }
        }
        UnionShape::Fallback(last) => {
            ctx.warn(WarningKind::ComplexUnionSimplified);
            lower_type(last, ctx, aux, inline)
        }
    };

    if plan.has_null {
        wrap_option(lowered)
    } else {
        lowered
    }
}

fn lower_intersection(
    members: &[IrType],
    ctx: &mut GenContext,
    aux: &mut AuxDefs,
    inline: bool,
) -> String {
    if members.iter().all(|m| matches!(m, IrType::Reference(_))) {
        // The typical override pattern: the last ref wins wholesale.
        return match members.last() {
            Some(last) => lower_type(last, ctx, aux, inline),
            None => "JSON.t".to_string(),
        };
    }

    let objects: Vec<&IrType> = members
        .iter()
        .filter(|m| matches!(m, IrType::Object { .. }))
        .collect();

    if objects.is_empty() {
        return match members.last() {
            Some(last) => lower_type(last, ctx, aux, inline),
            None => "JSON.t".to_string(),
        };
    }

    if objects.len() != members.len() {
        ctx.warn(WarningKind::IntersectionNotFullySupported);
    }

    let merged = merge_objects(&objects);
    lower_type(&merged, ctx, aux, inline)
}

/// Flatten object members into one record; a later property spelling wins
/// over an earlier one, keeping the earlier position.
pub fn merge_objects(objects: &[&IrType]) -> IrType {
    let mut properties: Vec<IrProperty> = Vec::new();
    let mut additional: Option<Box<IrType>> = None;

    for obj in objects {
        if let IrType::Object {
            properties: props,
            additional: add,
        } = obj
        {
            for p in props {
                if let Some(slot) = properties.iter_mut().find(|q| q.name == p.name) {
                    *slot = p.clone();
                } else {
                    properties.push(p.clone());
                }
            }
            if add.is_some() {
                additional = add.clone();
            }
        }
    }

    IrType::Object {
        properties,
        additional,
    }
}

/// Synthetic-name hint: the innermost path segment, camel-cased, steering
/// clear of the reserved `t` / `schema` bindings.
fn extraction_hint(ctx: &GenContext) -> String {
    let path = ctx.path();
    let last = path.rsplit('.').next().unwrap_or("aux");
    let mut hint = normalize_name(last).camel_case;
    if hint.is_empty() || hint == "t" || hint == "schema" {
        hint.push('_');
    }
    hint
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn ctx() -> GenContext {
        let mut available = BTreeSet::new();
        for name in ["Note", "Tag", "User", "Folder"] {
            available.insert(name.to_string());
        }
        let mut ctx = GenContext::new("Note", available);
        ctx.inside_component_schemas = true;
        ctx
    }

    fn lower(ir: &IrType) -> (String, GenContext, AuxDefs) {
        let mut c = ctx();
        let mut aux = AuxDefs::default();
        let out = lower_type(ir, &mut c, &mut aux, false);
        (out, c, aux)
    }

    #[test]
    fn primitives() {
        assert_eq!(lower(&IrType::string()).0, "string");
        assert_eq!(lower(&IrType::number()).0, "float");
        assert_eq!(lower(&IrType::integer()).0, "int");
        assert_eq!(lower(&IrType::Boolean).0, "bool");
        assert_eq!(lower(&IrType::Unknown).0, "JSON.t");
    }

    #[test]
    fn array_of_reference() {
        let (out, _, _) = lower(&IrType::array(IrType::reference("Tag")));
        assert_eq!(out, "array<Tag.t>");
    }

    #[test]
    fn empty_object_is_json_dict() {
        let (out, _, _) = lower(&IrType::object(vec![]));
        assert_eq!(out, "dict<JSON.t>");
    }

    #[test]
    fn dictionary_object() {
        let ir = IrType::Object {
            properties: vec![],
            additional: Some(Box::new(IrType::integer())),
        };
        assert_eq!(lower(&ir).0, "dict<int>");
    }

    #[test]
    fn record_with_optional_field() {
        let ir = IrType::object(vec![
            IrProperty::new("id", IrType::integer(), true),
            IrProperty::new("name", IrType::string(), true),
            IrProperty::new("tag", IrType::string(), false),
        ]);
        let (out, _, _) = lower(&ir);
        assert!(out.contains("  id: int,"));
        assert!(out.contains("  name: string,"));
        assert!(out.contains("  tag?: string,"));
    }

    #[test]
    fn renamed_field_gets_as_alias() {
        let ir = IrType::object(vec![IrProperty::new("created_at", IrType::string(), true)]);
        let (out, _, _) = lower(&ir);
        assert!(out.contains("@as(\"created_at\") createdAt: string,"));
    }

    #[test]
    fn keyword_field_is_escaped() {
        let ir = IrType::object(vec![IrProperty::new("type", IrType::string(), true)]);
        let (out, _, _) = lower(&ir);
        assert!(out.contains("@as(\"type\") type_: string,"));
    }

    #[test]
    fn optional_nullable_field_has_single_option() {
        // note?: oneOf [Note, null] — invariant: no option<option<_>>.
        let ir = IrType::object(vec![IrProperty::new(
            "note",
            IrType::Union(vec![IrType::reference("Note"), IrType::Null]),
            false,
        )]);
        let (out, _, _) = lower(&ir);
        assert!(out.contains("  note?: Note.t,"));
        assert!(!out.contains("option<option<"));
    }

    #[test]
    fn inline_record_is_extracted() {
        let inner = IrType::object(vec![IrProperty::new("street", IrType::string(), true)]);
        let ir = IrType::object(vec![IrProperty::new("address", inner, true)]);
        let (out, ctx, aux) = lower(&ir);
        assert!(out.contains("  address: address,"));
        assert_eq!(aux.types.len(), 1);
        assert_eq!(aux.types[0].0, "address");
        assert!(aux.types[0].1.starts_with("type address = {"));
        assert_eq!(ctx.extracted().len(), 1);
    }

    #[test]
    fn nested_extraction_defines_children_first() {
        let grandchild = IrType::object(vec![IrProperty::new("x", IrType::integer(), true)]);
        let child = IrType::object(vec![IrProperty::new("inner", grandchild, true)]);
        let ir = IrType::object(vec![IrProperty::new("outer", child, true)]);
        let (_, _, aux) = lower(&ir);
        assert_eq!(aux.types.len(), 2);
        // The grandchild ("inner") must be defined before its parent ("outer").
        assert_eq!(aux.types[0].0, "inner");
        assert_eq!(aux.types[1].0, "outer");
    }

    #[test]
    fn enum_union_is_polyvariant() {
        let members: Vec<IrType> = ["public", "home"]
            .iter()
            .map(|s| IrType::Literal(IrLiteral::Str(s.to_string())))
            .collect();
        let (out, _, _) = lower(&IrType::Union(members));
        assert_eq!(out, "[#public | #home]");
    }

    #[test]
    fn nullable_union_of_one_is_option() {
        let ir = IrType::Union(vec![IrType::reference("Note"), IrType::Null]);
        assert_eq!(lower(&ir).0, "option<Note.t>");
    }

    #[test]
    fn array_plus_element_union_lowers_to_array() {
        let ir = IrType::Union(vec![
            IrType::reference("Tag"),
            IrType::array(IrType::reference("Tag")),
        ]);
        assert_eq!(lower(&ir).0, "array<Tag.t>");
    }

    #[test]
    fn discriminable_union_extracts_unboxed_variant() {
        let ir = IrType::Union(vec![IrType::string(), IrType::integer(), IrType::Boolean]);
        let (out, ctx, aux) = lower(&ir);
        assert_eq!(out, "note");
        assert_eq!(aux.types.len(), 1);
        let def = &aux.types[0].1;
        assert!(def.starts_with("@unboxed\ntype note ="));
        assert!(def.contains("| String(string)"));
        assert!(def.contains("| Int(int)"));
        assert!(def.contains("| Bool(bool)"));
        assert!(ctx.extracted()[0].unboxed);
    }

    #[test]
    fn non_discriminable_union_falls_back_with_warning() {
        let ir = IrType::Union(vec![IrType::reference("Note"), IrType::reference("User")]);
        let (out, ctx, _) = lower(&ir);
        assert_eq!(out, "User.t");
        assert!(ctx
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::ComplexUnionSimplified));
    }

    #[test]
    fn self_reference_lowers_to_t() {
        let mut c = ctx();
        c.self_ref_name = Some("Note".to_string());
        let mut aux = AuxDefs::default();
        let out = lower_type(&IrType::reference("Note"), &mut c, &mut aux, true);
        assert_eq!(out, "t");
    }

    #[test]
    fn missing_reference_warns_and_degrades() {
        let (out, ctx, _) = lower(&IrType::reference("Nowhere"));
        assert_eq!(out, "JSON.t");
        assert!(ctx
            .warnings
            .iter()
            .any(|w| matches!(&w.kind, WarningKind::MissingSchema { name } if name == "Nowhere")));
    }

    #[test]
    fn outside_components_references_qualify_through_schemas() {
        let mut c = ctx();
        c.inside_component_schemas = false;
        let mut aux = AuxDefs::default();
        let out = lower_type(&IrType::reference("Note"), &mut c, &mut aux, true);
        assert_eq!(out, "Schemas.Note.t");
    }

    #[test]
    fn module_prefix_qualifies_cross_module_refs() {
        let mut c = ctx();
        c.module_prefix = Some("Base".to_string());
        let mut aux = AuxDefs::default();
        let out = lower_type(&IrType::reference("Note"), &mut c, &mut aux, true);
        assert_eq!(out, "Base.Note.t");
    }

    #[test]
    fn all_reference_intersection_takes_last() {
        let ir = IrType::Intersection(vec![IrType::reference("Note"), IrType::reference("User")]);
        assert_eq!(lower(&ir).0, "User.t");
    }

    #[test]
    fn object_intersection_merges_fields() {
        let a = IrType::object(vec![IrProperty::new("id", IrType::integer(), true)]);
        let b = IrType::object(vec![IrProperty::new("name", IrType::string(), true)]);
        let (out, _, _) = lower(&IrType::Intersection(vec![a, b]));
        assert!(out.contains("  id: int,"));
        assert!(out.contains("  name: string,"));
    }

    #[test]
    fn mixed_intersection_warns() {
        let obj = IrType::object(vec![IrProperty::new("id", IrType::integer(), true)]);
        let ir = IrType::Intersection(vec![IrType::reference("Note"), obj]);
        let (out, ctx, _) = lower(&ir);
        assert!(out.contains("id: int"));
        assert!(ctx
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::IntersectionNotFullySupported));
    }

    #[test]
    fn same_union_shape_interns_once() {
        let union = IrType::Union(vec![IrType::string(), IrType::Boolean]);
        let ir = IrType::object(vec![
            IrProperty::new("first", union.clone(), true),
            IrProperty::new("second", union, true),
        ]);
        let (out, ctx, aux) = lower(&ir);
        assert_eq!(ctx.extracted().len(), 1);
        assert_eq!(aux.types.len(), 1);
        assert!(out.contains("first: first"));
        assert!(out.contains("second: first"));
    }
}
