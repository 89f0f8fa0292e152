use super::context::SchemaContext;
use super::types::{IrProperty, IrType};

/// How many reference hops the simple-reference inliner may chase.
const INLINE_DEPTH: usize = 2;

/// Largest node count a schema body may have and still be inlined.
const INLINE_MAX_COMPLEXITY: usize = 4;

/// Normalise an IR tree: flatten nested unions and intersections, dedup
/// union members by shape, collapse singletons, turn empty compositions
/// into `Unknown`. Runs bottom-up, so one pass reaches a fixed point;
/// running it twice is the same as running it once.
pub fn optimize(ir: IrType) -> IrType {
    match ir {
        IrType::Array {
            items,
            min_items,
            max_items,
            unique,
        } => IrType::Array {
            items: Box::new(optimize(*items)),
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
                .map(|p| IrProperty::new(p.name, optimize(p.ir), p.required))
                .collect(),
            additional: additional.map(|a| Box::new(optimize(*a))),
        },
        IrType::Option(inner) => IrType::option(optimize(*inner)),
        IrType::Union(members) => {
            let mut flat = Vec::new();
            for member in members.into_iter().map(optimize) {
                match member {
                    IrType::Union(inner) => flat.extend(inner),
                    other => flat.push(other),
                }
            }
            let mut seen: Vec<String> = Vec::new();
            let mut out: Vec<IrType> = Vec::new();
            for member in flat {
                let key = member.shape_key();
                if !seen.contains(&key) {
                    seen.push(key);
                    out.push(member);
                }
            }
            collapse(out, IrType::Union)
        }
        IrType::Intersection(members) => {
            let mut flat = Vec::new();
            for member in members.into_iter().map(optimize) {
                match member {
                    IrType::Intersection(inner) => flat.extend(inner),
                    other => flat.push(other),
                }
            }
            collapse(flat, IrType::Intersection)
        }
        other => other,
    }
}

fn collapse(mut members: Vec<IrType>, wrap: fn(Vec<IrType>) -> IrType) -> IrType {
    match members.pop() {
        None => IrType::Unknown,
        Some(single) if members.is_empty() => single,
        Some(last) => {
            members.push(last);
            wrap(members)
        }
    }
}

/// Replace references to simple named schemas (primitive, simple array,
/// simple reference) with their bodies, chasing at most `INLINE_DEPTH`
/// hops. Self-referential targets are never inlined.
pub fn inline_simple_refs(ir: IrType, ctx: &SchemaContext) -> IrType {
    inline_at(ir, ctx, 0)
}

fn inline_at(ir: IrType, ctx: &SchemaContext, hops: usize) -> IrType {
    match ir {
        IrType::Reference(name) => {
            if hops < INLINE_DEPTH {
                if let Some(named) = ctx.get(&name) {
                    if named.ir.is_simple()
                        && named.ir.complexity() <= INLINE_MAX_COMPLEXITY
                        && !named.ir.contains_ref(&name)
                    {
                        return inline_at(named.ir.clone(), ctx, hops + 1);
                    }
                }
            }
            IrType::Reference(name)
        }
        IrType::Array {
            items,
            min_items,
            max_items,
            unique,
        } => IrType::Array {
            items: Box::new(inline_at(*items, ctx, hops)),
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
                .map(|p| IrProperty::new(p.name, inline_at(p.ir, ctx, hops), p.required))
                .collect(),
            additional: additional.map(|a| Box::new(inline_at(*a, ctx, hops))),
        },
        IrType::Option(inner) => IrType::option(inline_at(*inner, ctx, hops)),
        IrType::Union(members) => IrType::Union(
            members
                .into_iter()
                .map(|m| inline_at(m, ctx, hops))
                .collect(),
        ),
        IrType::Intersection(members) => IrType::Intersection(
            members
                .into_iter()
                .map(|m| inline_at(m, ctx, hops))
                .collect(),
        ),
        other => other,
    }
}
