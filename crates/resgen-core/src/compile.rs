use crate::document::{Document, MediaType, Operation, PathItem, RequestBodyOrRef, ResponseOrRef};
use crate::error::GeneratorError;
use crate::fingerprint::endpoint_fingerprint;
use crate::ir::{inline_simple_refs, optimize, parse_schema, IrProperty, IrType, NamedSchema, SchemaContext};
use crate::naming::{normalize_name, route_to_name, NormalizedName};
use crate::warnings::{Warning, WarningKind};

use indexmap::IndexMap;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }
}

/// API metadata.
#[derive(Debug, Clone)]
pub struct ApiInfo {
    pub title: String,
    pub description: Option<String>,
    pub version: String,
}

/// A compiled endpoint: everything the emitters need, nothing they must
/// re-derive.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub name: NormalizedName,
    pub method: HttpMethod,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// JSON request body type, when one exists.
    pub request: Option<IrType>,
    pub request_required: bool,
    /// First declared success response with content; `None` lowers to the
    /// unit response marker.
    pub response: Option<IrType>,
    /// Stable change-detection fingerprint (hex FNV-1a).
    pub fingerprint: String,
}

/// The one-way output of the compilation front half: named schemas in the
/// reference universe plus the endpoint list, with all recoverable
/// conditions accumulated as warnings.
#[derive(Debug, Clone)]
pub struct CompiledSpec {
    pub info: ApiInfo,
    pub schemas: SchemaContext,
    pub endpoints: Vec<Endpoint>,
    pub warnings: Vec<Warning>,
}

/// Success statuses checked in order for the response schema.
const SUCCESS_STATUSES: [&str; 4] = ["200", "201", "202", "204"];

/// Compile a parsed document into the IR universe and endpoint list.
pub fn compile(doc: &Document) -> Result<CompiledSpec, GeneratorError> {
    let mut warnings = Vec::new();

    // Phase 1: every component schema to IR, in document order.
    let mut schemas = SchemaContext::new();
    if let Some(components) = &doc.components {
        for (name, node) in &components.schemas {
            let ir = parse_schema(node, name, &mut warnings);
            let description = match node {
                crate::document::SchemaOrRef::Schema(s) => s.description.clone(),
                crate::document::SchemaOrRef::Ref { .. } => None,
            };
            schemas.insert(NamedSchema {
                name: normalize_name(name),
                description,
                ir,
            });
        }
    }

    // Phase 2: optimise, then inline trivial references, then re-normalise
    // whatever the inlining exposed.
    let frozen = schemas.clone();
    schemas.map_ir(|ir| optimize(inline_simple_refs(optimize(ir), &frozen)));

    // Phase 3: unresolved references degrade to JSON with a warning.
    let known: Vec<String> = schemas.names().map(str::to_string).collect();
    let mut resolved = SchemaContext::new();
    for named in schemas.iter() {
        let ir = resolve_refs(
            named.ir.clone(),
            &known,
            &named.name.original,
            &mut warnings,
        );
        resolved.insert(NamedSchema {
            name: named.name.clone(),
            description: named.description.clone(),
            ir,
        });
    }
    let schemas = resolved;

    // Phase 4: endpoints, in path declaration order.
    let mut endpoints = Vec::new();
    for (path, item) in &doc.paths {
        collect_endpoints(path, item, &known, &mut endpoints, &mut warnings);
    }

    Ok(CompiledSpec {
        info: ApiInfo {
            title: doc.info.title.clone(),
            description: doc.info.description.clone(),
            version: doc.info.version.clone(),
        },
        schemas,
        endpoints,
        warnings,
    })
}

/// Swap every reference to an unknown name for `Unknown`, warning once per
/// occurrence.
fn resolve_refs(ir: IrType, known: &[String], path: &str, warnings: &mut Vec<Warning>) -> IrType {
    match ir {
        IrType::Reference(name) => {
            if known.iter().any(|k| k == &name) {
                IrType::Reference(name)
            } else {
                warnings.push(Warning::new(
                    WarningKind::FallbackToJson {
                        reference: name.clone(),
                    },
                    path,
                ));
                IrType::Unknown
            }
        }
        IrType::Array {
            items,
            min_items,
            max_items,
            unique,
        } => IrType::Array {
            items: Box::new(resolve_refs(*items, known, path, warnings)),
            min_items,
            max_items,
            unique,
        },
        IrType::Object {
            properties,
            additional,
        } => IrType::Object {
            properties: properties
                .into_iter()
                .map(|p| {
                    let sub = format!("{path}.{}", p.name);
                    IrProperty::new(p.name, resolve_refs(p.ir, known, &sub, warnings), p.required)
                })
                .collect(),
            additional: additional.map(|a| Box::new(resolve_refs(*a, known, path, warnings))),
        },
        IrType::Option(inner) => IrType::option(resolve_refs(*inner, known, path, warnings)),
        IrType::Union(members) => IrType::Union(
            members
                .into_iter()
                .map(|m| resolve_refs(m, known, path, warnings))
                .collect(),
        ),
        IrType::Intersection(members) => IrType::Intersection(
            members
                .into_iter()
                .map(|m| resolve_refs(m, known, path, warnings))
                .collect(),
        ),
        other => other,
    }
}

fn collect_endpoints(
    path: &str,
    item: &PathItem,
    known: &[String],
    out: &mut Vec<Endpoint>,
    warnings: &mut Vec<Warning>,
) {
    macro_rules! add_op {
        ($method:expr, $op:expr) => {
            if let Some(ref op) = $op {
                out.push(build_endpoint($method, path, op, known, warnings));
            }
        };
    }

    add_op!(HttpMethod::Get, item.get);
    add_op!(HttpMethod::Post, item.post);
    add_op!(HttpMethod::Put, item.put);
    add_op!(HttpMethod::Delete, item.delete);
    add_op!(HttpMethod::Patch, item.patch);
    add_op!(HttpMethod::Options, item.options);
    add_op!(HttpMethod::Head, item.head);
    add_op!(HttpMethod::Trace, item.trace);
}

fn build_endpoint(
    method: HttpMethod,
    path: &str,
    op: &Operation,
    known: &[String],
    warnings: &mut Vec<Warning>,
) -> Endpoint {
    let raw_name = op
        .operation_id
        .clone()
        .unwrap_or_else(|| route_to_name(method.as_str(), path));
    let name = normalize_name(&raw_name);

    let (request, request_required) = match &op.request_body {
        Some(RequestBodyOrRef::RequestBody(body)) => {
            let ir = json_media_type(&body.content).and_then(|mt| mt.schema.as_ref()).map(|s| {
                let raw = parse_schema(s, &format!("{raw_name}.requestBody"), warnings);
                let opt = optimize(raw);
                resolve_refs(opt, known, &format!("{raw_name}.requestBody"), warnings)
            });
            (ir, body.required)
        }
        _ => (None, false),
    };

    let response = SUCCESS_STATUSES.iter().find_map(|status| {
        let resp = op.responses.get(*status)?;
        let ResponseOrRef::Response(resp) = resp else {
            return None;
        };
        let mt = json_media_type(&resp.content)?;
        let node = mt.schema.as_ref()?;
        let raw = parse_schema(node, &format!("{raw_name}.responses.{status}"), warnings);
        let opt = optimize(raw);
        Some(resolve_refs(
            opt,
            known,
            &format!("{raw_name}.responses.{status}"),
            warnings,
        ))
    });

    let fingerprint = endpoint_fingerprint(
        path,
        method.as_str(),
        op.operation_id.as_deref(),
        op.summary.as_deref(),
        op.description.as_deref(),
    );

    Endpoint {
        name,
        method,
        path: path.to_string(),
        summary: op.summary.clone(),
        description: op.description.clone(),
        tags: op.tags.clone(),
        request,
        request_required,
        response,
        fingerprint,
    }
}

/// Prefer `application/json`, fall back to the first declared content type.
fn json_media_type(content: &IndexMap<String, MediaType>) -> Option<&MediaType> {
    content
        .get("application/json")
        .or_else(|| content.values().next())
}
