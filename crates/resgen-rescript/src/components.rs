use std::collections::BTreeSet;

use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, Control, DfsEvent};

use resgen_core::compile::CompiledSpec;
use resgen_core::genctx::GenContext;
use resgen_core::ir::SchemaContext;
use resgen_core::naming::normalize_name;
use resgen_core::warnings::Warning;

use crate::schemas::lower_schema;
use crate::types::{lower_type, AuxDefs};

/// The dependency-ordered emission plan for the component schemas.
#[derive(Debug)]
pub struct EmissionPlan {
    /// Schema names, dependencies before dependents.
    pub order: Vec<String>,
    /// Names involved in a removed back-edge; these lower with explicit
    /// recursion markers.
    pub flagged: BTreeSet<String>,
}

/// Topologically sort the schema context. On a cycle, remove the DFS
/// back-edges and retry; as a last resort fall back to alphabetical order.
pub fn plan_emission(schemas: &SchemaContext) -> EmissionPlan {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut nodes: IndexMap<String, NodeIndex> = IndexMap::new();

    for name in schemas.names() {
        let idx = graph.add_node(name.to_string());
        nodes.insert(name.to_string(), idx);
    }

    // One edge (dep → dependent) per direct reference to another known name.
    for named in schemas.iter() {
        let mut refs = Vec::new();
        named.ir.collect_refs(&mut refs);
        for target in refs {
            if target == named.name.original {
                continue;
            }
            if let (Some(&from), Some(&to)) =
                (nodes.get(&target), nodes.get(&named.name.original))
            {
                graph.add_edge(from, to, ());
            }
        }
    }

    let mut flagged = BTreeSet::new();

    if let Ok(order) = toposort(&graph, None) {
        return EmissionPlan {
            order: order.into_iter().map(|i| graph[i].clone()).collect(),
            flagged,
        };
    }

    // Cycle tolerance: identify back-edges, drop them, re-sort.
    let mut back_edges = Vec::new();
    depth_first_search(&graph, graph.node_indices(), |event| {
        if let DfsEvent::BackEdge(u, v) = event {
            back_edges.push((u, v));
        }
        Control::<()>::Continue
    });

    for (u, v) in &back_edges {
        flagged.insert(graph[*u].clone());
        flagged.insert(graph[*v].clone());
        log::warn!(
            "breaking schema cycle: dropping edge {} -> {}",
            graph[*u],
            graph[*v]
        );
        if let Some(edge) = graph.find_edge(*u, *v) {
            graph.remove_edge(edge);
        }
    }

    match toposort(&graph, None) {
        Ok(order) => EmissionPlan {
            order: order.into_iter().map(|i| graph[i].clone()).collect(),
            flagged,
        },
        Err(_) => {
            let mut order: Vec<String> = schemas.names().map(str::to_string).collect();
            order.sort();
            EmissionPlan { order, flagged }
        }
    }
}

/// Emit the aggregate component-schemas file: one module per schema with
/// its type, validator, and any extracted auxiliaries; dependency order;
/// deterministic header. Byte-identical across runs on the same input.
pub fn emit_components(
    compiled: &CompiledSpec,
    module_prefix: Option<String>,
) -> (String, Vec<Warning>) {
    let plan = plan_emission(&compiled.schemas);
    let available: BTreeSet<String> = compiled.schemas.names().map(str::to_string).collect();

    let mut out = String::new();
    out.push_str(&header(&compiled.info.title, &compiled.info.version));
    let mut warnings = Vec::new();

    for name in &plan.order {
        let Some(named) = compiled.schemas.get(name) else {
            continue;
        };

        let self_recursive =
            named.ir.contains_ref(name) || plan.flagged.contains(name);

        let mut ctx = GenContext::new(name, available.clone());
        ctx.inside_component_schemas = true;
        ctx.module_prefix = module_prefix.clone();
        if self_recursive {
            ctx.self_ref_name = Some(name.to_string());
        }

        let mut aux = AuxDefs::default();
        let body_ty = lower_type(&named.ir, &mut ctx, &mut aux, false);
        ctx.quiet = true;
        let body_schema = lower_schema(&named.ir, &mut ctx, &mut aux);
        ctx.quiet = false;

        out.push('\n');
        if let Some(description) = &named.description {
            out.push_str(&format!("/** {} */\n", description.replace("*/", "*\\/")));
        }
        out.push_str(&format!("module {} = {{\n", named.name.pascal_case));

        for (_, def) in &aux.types {
            out.push_str(&indent(def, 2));
            out.push('\n');
        }

        let rec_marker = if self_recursive { "rec " } else { "" };
        out.push_str(&indent(&format!("type {rec_marker}t = {body_ty}"), 2));
        out.push('\n');

        if self_recursive {
            let mut recursive_body = String::new();
            for (_, def) in &aux.schemas {
                recursive_body.push_str(def);
                recursive_body.push('\n');
            }
            recursive_body.push_str(&body_schema);
            out.push_str(&indent(
                &format!(
                    "let schema: S.t<t> = S.recursive(\"{}\", selfSchema => {{\n{}\n}})",
                    named.name.original,
                    indent(&recursive_body, 2),
                ),
                2,
            ));
            out.push('\n');
        } else {
            for (_, def) in &aux.schemas {
                out.push_str(&indent(def, 2));
                out.push('\n');
            }
            out.push_str(&indent(&format!("let schema: S.t<t> = {body_schema}"), 2));
            out.push('\n');
        }

        out.push_str("}\n");
        warnings.extend(ctx.take_warnings());
    }

    (out, warnings)
}

pub fn header(title: &str, version: &str) -> String {
    format!("// Generated by resgen. Do not edit.\n// {title} {version}\n")
}

fn indent(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                line.to_string()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
