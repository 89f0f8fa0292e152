use resgen_core::compile::CompiledSpec;
use resgen_core::ir::{IrLiteral, IrType};
use resgen_core::naming::normalize_name;

/// Map an IR type to its TypeScript spelling. TypeScript permits inline
/// object and union types everywhere, so this is a plain recursive printer
/// with no extraction machinery.
pub fn ir_type_to_ts(ir: &IrType) -> String {
    match ir {
        IrType::String { .. } => "string".to_string(),
        IrType::Number { .. } | IrType::Integer { .. } => "number".to_string(),
        IrType::Boolean => "boolean".to_string(),
        IrType::Null => "null".to_string(),
        IrType::Unknown => "unknown".to_string(),
        IrType::Literal(lit) => match lit {
            IrLiteral::Str(s) => format!("\"{s}\""),
            IrLiteral::Num(n) => format!("{n}"),
            IrLiteral::Bool(b) => format!("{b}"),
            IrLiteral::Null => "null".to_string(),
        },
        IrType::Array { items, .. } => {
            let inner = ir_type_to_ts(items);
            if inner.contains('|') || inner.contains('&') {
                format!("({inner})[]")
            } else {
                format!("{inner}[]")
            }
        }
        IrType::Object {
            properties,
            additional,
        } => {
            if properties.is_empty() {
                let value = match additional {
                    Some(v) => ir_type_to_ts(v),
                    None => "unknown".to_string(),
                };
                return format!("Record<string, {value}>");
            }
            let fields: Vec<String> = properties
                .iter()
                .map(|p| {
                    let marker = if p.required { "" } else { "?" };
                    format!("{}{marker}: {}", quote_key(&p.name), ir_type_to_ts(&p.ir))
                })
                .collect();
            format!("{{ {} }}", fields.join("; "))
        }
        IrType::Reference(name) => normalize_name(name).pascal_case,
        IrType::Option(inner) => format!("{} | null", ir_type_to_ts(inner)),
        IrType::Union(members) => members
            .iter()
            .map(ir_type_to_ts)
            .collect::<Vec<_>>()
            .join(" | "),
        IrType::Intersection(members) => members
            .iter()
            .map(ir_type_to_ts)
            .collect::<Vec<_>>()
            .join(" & "),
    }
}

fn quote_key(name: &str) -> String {
    let plain = name
        .chars()
        .enumerate()
        .all(|(i, c)| c == '_' || c == '$' || if i == 0 { c.is_ascii_alphabetic() } else { c.is_ascii_alphanumeric() });
    if plain && !name.is_empty() {
        name.to_string()
    } else {
        format!("\"{name}\"")
    }
}

/// Emit `types.d.ts`: one exported declaration per named schema plus one
/// request/response pair per endpoint.
pub fn emit_dts(compiled: &CompiledSpec) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "// Generated by resgen. Do not edit.\n// {} {}\n\n",
        compiled.info.title, compiled.info.version
    ));

    for named in compiled.schemas.iter() {
        if let Some(description) = &named.description {
            out.push_str(&format!("/** {} */\n", description.replace("*/", "*\\/")));
        }
        out.push_str(&format!(
            "export type {} = {};\n\n",
            named.name.pascal_case,
            ir_type_to_ts(&named.ir)
        ));
    }

    for endpoint in &compiled.endpoints {
        let pascal = &endpoint.name.pascal_case;
        if let Some(request) = &endpoint.request {
            out.push_str(&format!(
                "export type {pascal}Request = {};\n",
                ir_type_to_ts(request)
            ));
        }
        let response = match &endpoint.response {
            Some(ir) => ir_type_to_ts(ir),
            None => "void".to_string(),
        };
        out.push_str(&format!("export type {pascal}Response = {response};\n\n"));
    }

    out
}
