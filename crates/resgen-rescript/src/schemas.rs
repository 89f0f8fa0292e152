use resgen_core::genctx::GenContext;
use resgen_core::ir::{IrLiteral, IrProperty, IrType};

use crate::keywords::{escape_label, escape_string, float_literal};
use crate::types::{lower_reference, merge_objects, AuxDefs};
use crate::unions::{self, UnionShape};

/// Lower an IR type to a `rescript-schema` builder expression.
///
/// Mirrors the type emitter over the same generation context. The type
/// emitter ran first and filled the extracted-type table; whenever a
/// complex inline IR matches an entry, the validator references the
/// entry's `<name>Schema` binding instead of re-emitting, which is what
/// keeps validators and types in field-for-field agreement.
pub fn lower_schema(ir: &IrType, ctx: &mut GenContext, aux: &mut AuxDefs) -> String {
    match ir {
        IrType::String {
            min_len,
            max_len,
            pattern,
        } => {
            let mut out = "S.string".to_string();
            if let Some(n) = min_len {
                out.push_str(&format!("->S.stringMinLength({n})"));
            }
            if let Some(n) = max_len {
                out.push_str(&format!("->S.stringMaxLength({n})"));
            }
            if let Some(p) = pattern {
                out.push_str(&format!("->S.pattern(%re(\"/{}/\"))", p.replace('/', "\\/")));
            }
            out
        }
        IrType::Number { min, max, .. } => {
            let mut out = "S.float".to_string();
            if let Some(n) = min {
                out.push_str(&format!("->S.floatMin({})", float_literal(*n)));
            }
            if let Some(n) = max {
                out.push_str(&format!("->S.floatMax({})", float_literal(*n)));
            }
            out
        }
        IrType::Integer { min, max, .. } => {
            let mut out = "S.int".to_string();
            if let Some(n) = min {
                out.push_str(&format!("->S.intMin({})", *n as i64));
            }
            if let Some(n) = max {
                out.push_str(&format!("->S.intMax({})", *n as i64));
            }
            out
        }
        IrType::Boolean => "S.bool".to_string(),
        IrType::Null => null_literal(),
        IrType::Unknown => "S.json".to_string(),
        IrType::Literal(lit) => match lit {
            IrLiteral::Str(s) => format!("S.literal(\"{}\")", escape_string(s)),
            IrLiteral::Num(n) => format!("S.literal({})", float_literal(*n)),
            IrLiteral::Bool(b) => format!("S.literal({b})"),
            IrLiteral::Null => null_literal(),
        },
        IrType::Array {
            items,
            min_items,
            max_items,
            ..
        } => {
            let mut out = format!("S.array({})", lower_schema(items, ctx, aux));
            if let Some(n) = min_items {
                out.push_str(&format!("->S.arrayMinLength({n})"));
            }
            if let Some(n) = max_items {
                out.push_str(&format!("->S.arrayMaxLength({n})"));
            }
            out
        }
        IrType::Option(inner) => nullable(lower_schema(inner, ctx, aux)),
        IrType::Object {
            properties,
            additional,
        } => {
            if properties.is_empty() {
                let value = match additional {
                    Some(v) => lower_schema(v, ctx, aux),
                    None => "S.json".to_string(),
                };
                return format!("S.dict({value})");
            }
            if let Some(entry) = ctx.find(ir) {
                let name = entry.name.clone();
                let entry_ir = entry.ir.clone();
                ensure_record_schema(&name, &entry_ir, ctx, aux);
                return format!("{name}Schema");
            }
            render_object_schema(properties, ctx, aux)
        }
        IrType::Reference(name) => lower_reference(name, ctx, ".schema"),
        IrType::Union(members) => lower_union_schema(members, ctx, aux),
        IrType::Intersection(members) => lower_intersection_schema(members, ctx, aux),
    }
}

fn null_literal() -> String {
    "S.literal(%raw(`null`))".to_string()
}

/// Decode JSON null to `None`, unless the expression is already
/// nullable-returning.
fn nullable(inner: String) -> String {
    if is_nullable_returning(&inner) {
        inner
    } else {
        format!("S.null({inner})")
    }
}

fn is_nullable_returning(expr: &str) -> bool {
    expr.starts_with("S.null(") || expr.starts_with("S.option(")
}

fn is_container_constructor(expr: &str) -> bool {
    expr.starts_with("S.object(") || expr.starts_with("S.dict(")
}

/// Render the `S.object` expression for a record's fields, applying the
/// per-field optionality rules.
pub fn render_object_schema(
    properties: &[IrProperty],
    ctx: &mut GenContext,
    aux: &mut AuxDefs,
) -> String {
    let mut fields = Vec::with_capacity(properties.len());
    for p in properties {
        ctx.push_path(&p.name);
        let expr = lower_schema(&p.ir, ctx, aux);
        ctx.pop_path();

        let (label, _) = escape_label(&p.name);
        let json = escape_string(&p.name);

        if p.required {
            fields.push(format!("    {label}: s.field(\"{json}\", {expr}),"));
        } else if is_container_constructor(&expr) {
            // Defaults cannot attach to object/dict constructors.
            fields.push(format!(
                "    {label}: ?s.field(\"{json}\", S.option({expr})),"
            ));
        } else if is_nullable_returning(&expr) {
            fields.push(format!(
                "    {label}: ?s.fieldOr(\"{json}\", {expr}, None),"
            ));
        } else {
            fields.push(format!(
                "    {label}: ?s.fieldOr(\"{json}\", S.null({expr}), None),"
            ));
        }
    }
    format!("S.object(s => {{\n{}\n  }})", fields.join("\n"))
}

/// Render (once) the validator binding for an extracted record.
fn ensure_record_schema(name: &str, ir: &IrType, ctx: &mut GenContext, aux: &mut AuxDefs) {
    if aux.schemas.iter().any(|(n, _)| n == name) {
        return;
    }
    let IrType::Object { properties, .. } = ir else {
        return;
    };
    let properties = properties.clone();
    let body = render_object_schema(&properties, ctx, aux);
    push_schema_def(name, &body, aux);
}

fn push_schema_def(name: &str, body: &str, aux: &mut AuxDefs) {
    aux.schemas.push((
        name.to_string(),
        format!("let {name}Schema: S.t<{name}> = {body}"),
    ));
}

fn lower_union_schema(members: &[IrType], ctx: &mut GenContext, aux: &mut AuxDefs) -> String {
    let plan = unions::analyze(members);

    let lowered = match &plan.shape {
        UnionShape::Lone(member) => lower_schema(member, ctx, aux),
        UnionShape::ArrayOf(item) => format!("S.array({})", lower_schema(item, ctx, aux)),
        UnionShape::Enum(tags) => {
            let literals: Vec<String> = tags
                .iter()
                .map(|t| format!("S.literal({})", crate::keywords::polyvariant_tag(t)))
                .collect();
            format!("S.union([{}])", literals.join(", "))
        }
        UnionShape::Unboxed(variants) => {
            let key = IrType::Union(plan.effective.clone());
            let interned = ctx.find(&key).map(|entry| entry.name.clone());
            // The type emitter saw the same IR first; the fallback only
            // fires when the schema emitter is run standalone.
            let name = interned.unwrap_or_else(|| ctx.intern("value", &key, true));
            if !aux.schemas.iter().any(|(n, _)| n == &name) {
                let branches: Vec<String> = variants
                    .iter()
                    .map(|v| {
                        let payload = lower_schema(&v.ir, ctx, aux);
                        format!("{payload}->S.shape(v => {}(v))", v.constructor)
                    })
                    .collect();
                let body = format!("S.union([\n    {},\n  ])", branches.join(",\n    "));
                push_schema_def(&name, &body, aux);
            }
            format!("{name}Schema")
        }
        // The type emitter already warned for this union.
        UnionShape::Fallback(last) => lower_schema(last, ctx, aux),
    };

    if plan.has_null {
        nullable(lowered)
    } else {
        lowered
    }
}

fn lower_intersection_schema(
    members: &[IrType],
    ctx: &mut GenContext,
    aux: &mut AuxDefs,
) -> String {
    if members.iter().all(|m| matches!(m, IrType::Reference(_))) {
        return match members.last() {
            Some(last) => lower_schema(last, ctx, aux),
            None => "S.json".to_string(),
        };
    }

    let objects: Vec<&IrType> = members
        .iter()
        .filter(|m| matches!(m, IrType::Object { .. }))
        .collect();

    if objects.is_empty() {
        return match members.last() {
            Some(last) => lower_schema(last, ctx, aux),
            None => "S.json".to_string(),
        };
    }

    let merged = merge_objects(&objects);
    lower_schema(&merged, ctx, aux)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{lower_type, AuxDefs};
    use resgen_core::ir::IrProperty;
    use std::collections::BTreeSet;

    fn ctx() -> GenContext {
        let mut available = BTreeSet::new();
        for name in ["Note", "Tag", "User"] {
            available.insert(name.to_string());
        }
        let mut ctx = GenContext::new("Note", available);
        ctx.inside_component_schemas = true;
        ctx
    }

    /// Run both passes the way the orchestrator does: types first.
    fn lower_both(ir: &IrType) -> (String, String, GenContext, AuxDefs) {
        let mut c = ctx();
        let mut aux = AuxDefs::default();
        let ty = lower_type(ir, &mut c, &mut aux, false);
        c.quiet = true;
        let schema = lower_schema(ir, &mut c, &mut aux);
        c.quiet = false;
        (ty, schema, c, aux)
    }

    #[test]
    fn primitive_schemas() {
        let (_, s, _, _) = lower_both(&IrType::string());
        assert_eq!(s, "S.string");
        let (_, s, _, _) = lower_both(&IrType::integer());
        assert_eq!(s, "S.int");
        let (_, s, _, _) = lower_both(&IrType::Boolean);
        assert_eq!(s, "S.bool");
        let (_, s, _, _) = lower_both(&IrType::Unknown);
        assert_eq!(s, "S.json");
    }

    #[test]
    fn string_constraints_chain() {
        let ir = IrType::String {
            min_len: Some(1),
            max_len: Some(8),
            pattern: None,
        };
        let (_, s, _, _) = lower_both(&ir);
        assert_eq!(s, "S.string->S.stringMinLength(1)->S.stringMaxLength(8)");
    }

    #[test]
    fn pet_record_field_rules() {
        let ir = IrType::object(vec![
            IrProperty::new("id", IrType::integer(), true),
            IrProperty::new("name", IrType::string(), true),
            IrProperty::new("tag", IrType::string(), false),
        ]);
        let (_, s, _, _) = lower_both(&ir);
        assert!(s.contains("id: s.field(\"id\", S.int),"));
        assert!(s.contains("name: s.field(\"name\", S.string),"));
        assert!(s.contains("tag: ?s.fieldOr(\"tag\", S.null(S.string), None),"));
    }

    #[test]
    fn optional_nullable_field_uses_field_or_without_extra_null() {
        let ir = IrType::object(vec![IrProperty::new(
            "note",
            IrType::Union(vec![IrType::reference("Note"), IrType::Null]),
            false,
        )]);
        let (_, s, _, _) = lower_both(&ir);
        assert!(s.contains("note: ?s.fieldOr(\"note\", S.null(Note.schema), None),"));
        assert!(!s.contains("S.null(S.null("));
    }

    #[test]
    fn optional_dict_field_wraps_in_option() {
        let dict = IrType::Object {
            properties: vec![],
            additional: Some(Box::new(IrType::string())),
        };
        let ir = IrType::object(vec![IrProperty::new("extras", dict, false)]);
        let (_, s, _, _) = lower_both(&ir);
        assert!(s.contains("extras: ?s.field(\"extras\", S.option(S.dict(S.string))),"));
    }

    #[test]
    fn enum_schema_is_literal_union() {
        let members: Vec<IrType> = ["public", "home"]
            .iter()
            .map(|v| IrType::Literal(IrLiteral::Str(v.to_string())))
            .collect();
        let (_, s, _, _) = lower_both(&IrType::Union(members));
        assert_eq!(s, "S.union([S.literal(#public), S.literal(#home)])");
    }

    #[test]
    fn unboxed_union_type_and_schema_share_the_extraction() {
        let ir = IrType::Union(vec![IrType::string(), IrType::integer(), IrType::Boolean]);
        let (ty, schema, ctx, aux) = lower_both(&ir);
        assert_eq!(ty, "note");
        assert_eq!(schema, "noteSchema");
        // Invariant: one extracted entry, one type def, one schema def.
        assert_eq!(ctx.extracted().len(), 1);
        assert_eq!(aux.types.len(), 1);
        assert_eq!(aux.schemas.len(), 1);
        let def = &aux.schemas[0].1;
        assert!(def.contains("S.string->S.shape(v => String(v))"));
        assert!(def.contains("S.int->S.shape(v => Int(v))"));
        assert!(def.contains("S.bool->S.shape(v => Bool(v))"));
    }

    #[test]
    fn extracted_record_schema_is_referenced_not_reemitted() {
        let inner = IrType::object(vec![IrProperty::new("street", IrType::string(), true)]);
        let ir = IrType::object(vec![IrProperty::new("address", inner, true)]);
        let (_, schema, _, aux) = lower_both(&ir);
        assert!(schema.contains("address: s.field(\"address\", addressSchema),"));
        assert_eq!(aux.schemas.len(), 1);
        assert!(aux.schemas[0]
            .1
            .starts_with("let addressSchema: S.t<address> = S.object(s => {"));
    }

    #[test]
    fn aux_schema_names_match_aux_type_names() {
        // Invariant 3: auxiliary validator set == auxiliary type set.
        let variant = IrType::Union(vec![IrType::string(), IrType::Boolean]);
        let inner = IrType::object(vec![IrProperty::new("kind", variant, true)]);
        let ir = IrType::object(vec![IrProperty::new("payload", inner, false)]);
        let (_, _, _, aux) = lower_both(&ir);
        let type_names: Vec<&String> = aux.types.iter().map(|(n, _)| n).collect();
        let schema_names: Vec<&String> = aux.schemas.iter().map(|(n, _)| n).collect();
        assert_eq!(type_names, schema_names);
    }

    #[test]
    fn nullable_union_of_reference() {
        let ir = IrType::Union(vec![IrType::reference("Note"), IrType::Null]);
        let (_, s, _, _) = lower_both(&ir);
        assert_eq!(s, "S.null(Note.schema)");
    }

    #[test]
    fn array_plus_element_schema_is_array() {
        let ir = IrType::Union(vec![
            IrType::reference("Tag"),
            IrType::array(IrType::reference("Tag")),
        ]);
        let (_, s, _, _) = lower_both(&ir);
        assert_eq!(s, "S.array(Tag.schema)");
    }

    #[test]
    fn fallback_union_does_not_warn_twice() {
        let ir = IrType::Union(vec![IrType::reference("Note"), IrType::reference("User")]);
        let (_, _, ctx, _) = lower_both(&ir);
        let count = ctx
            .warnings
            .iter()
            .filter(|w| w.kind == resgen_core::warnings::WarningKind::ComplexUnionSimplified)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn self_reference_lowers_to_self_schema_param() {
        let mut c = ctx();
        c.self_ref_name = Some("Note".to_string());
        let mut aux = AuxDefs::default();
        let s = lower_schema(&IrType::reference("Note"), &mut c, &mut aux);
        assert_eq!(s, "selfSchema");
    }
}
