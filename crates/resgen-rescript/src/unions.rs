use heck::ToPascalCase;
use resgen_core::ir::{IrLiteral, IrType};
use resgen_core::naming::normalize_name;

/// The runtime kind a decoded JSON value presents. A union is unboxable
/// exactly when every member maps to a distinct kind, because the decoder
/// can then classify a value by shape alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeKind {
    Boolean,
    String,
    Number,
    Array,
    Object,
    Null,
}

impl RuntimeKind {
    fn of(ir: &IrType) -> Option<RuntimeKind> {
        match ir {
            IrType::Boolean | IrType::Literal(IrLiteral::Bool(_)) => Some(RuntimeKind::Boolean),
            IrType::String { .. } | IrType::Literal(IrLiteral::Str(_)) => Some(RuntimeKind::String),
            IrType::Number { .. }
            | IrType::Integer { .. }
            | IrType::Literal(IrLiteral::Num(_)) => Some(RuntimeKind::Number),
            IrType::Array { .. } => Some(RuntimeKind::Array),
            IrType::Object { .. } | IrType::Reference(_) | IrType::Intersection(_) => {
                Some(RuntimeKind::Object)
            }
            IrType::Null | IrType::Literal(IrLiteral::Null) => Some(RuntimeKind::Null),
            // Unknown, Option and nested unions have no single runtime kind.
            _ => None,
        }
    }
}

/// One constructor of an unboxed variant.
#[derive(Debug, Clone)]
pub struct UnboxedMember {
    pub constructor: String,
    pub ir: IrType,
}

/// The lowering a union gets, decided once and shared by both emitters.
#[derive(Debug, Clone)]
pub enum UnionShape {
    /// A single effective member (after the null split).
    Lone(IrType),
    /// `[T, Array<T>]` simplifies to the array.
    ArrayOf(IrType),
    /// Pure string-literal union; valid inline as a polymorphic variant.
    Enum(Vec<String>),
    /// Every member has a distinct runtime kind; extracted as an unboxed
    /// variant.
    Unboxed(Vec<UnboxedMember>),
    /// Not discriminable; only the last member survives.
    Fallback(IrType),
}

/// A union's analysis: the shape of the non-null members plus whether a
/// null member was split off (re-wrapped as an option by the emitters).
#[derive(Debug, Clone)]
pub struct UnionPlan {
    pub has_null: bool,
    pub shape: UnionShape,
    /// The effective (null-free) union, the key both emitters intern
    /// extracted variants under.
    pub effective: Vec<IrType>,
}

fn is_null_member(ir: &IrType) -> bool {
    matches!(ir, IrType::Null | IrType::Literal(IrLiteral::Null))
}

/// Decide how a union lowers. Pure; neither warns nor extracts — the
/// emitters own those side effects.
pub fn analyze(members: &[IrType]) -> UnionPlan {
    let has_null = members.iter().any(is_null_member);
    let effective: Vec<IrType> = if has_null {
        members.iter().filter(|m| !is_null_member(m)).cloned().collect()
    } else {
        members.to_vec()
    };

    let shape = decide_shape(&effective);
    UnionPlan {
        has_null,
        shape,
        effective,
    }
}

fn decide_shape(effective: &[IrType]) -> UnionShape {
    if effective.len() <= 1 {
        return match effective.first() {
            Some(single) => UnionShape::Lone(single.clone()),
            None => UnionShape::Lone(IrType::Unknown),
        };
    }

    // Array-plus-element: [T, Array<T>] in either order.
    if effective.len() == 2 {
        if let Some(item) = array_plus_element(&effective[0], &effective[1]) {
            return UnionShape::ArrayOf(item);
        }
    }

    // Pure string-literal enum.
    let tags: Vec<&str> = effective
        .iter()
        .filter_map(|m| match m {
            IrType::Literal(IrLiteral::Str(s)) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    if tags.len() == effective.len() && (1..=50).contains(&tags.len()) {
        return UnionShape::Enum(tags.into_iter().map(str::to_string).collect());
    }

    // Runtime-kind discriminability.
    let kinds: Vec<Option<RuntimeKind>> = effective.iter().map(RuntimeKind::of).collect();
    let all_classified = kinds.iter().all(Option::is_some);
    let unique = all_classified && {
        let mut seen = Vec::new();
        kinds.iter().flatten().all(|k| {
            if seen.contains(k) {
                false
            } else {
                seen.push(*k);
                true
            }
        })
    };

    if unique {
        let members = derive_constructors(effective);
        return UnionShape::Unboxed(members);
    }

    UnionShape::Fallback(effective.last().cloned().unwrap_or(IrType::Unknown))
}

fn array_plus_element(a: &IrType, b: &IrType) -> Option<IrType> {
    let check = |arr: &IrType, elem: &IrType| match arr {
        IrType::Array { items, .. } if items.same_shape(elem) => Some(elem.clone()),
        _ => None,
    };
    check(a, b).or_else(|| check(b, a))
}

/// Constructor names: the primitive kind for primitives, the schema name
/// for references, PascalCase of the tag for string literals. Collisions
/// get a counter suffix.
fn derive_constructors(effective: &[IrType]) -> Vec<UnboxedMember> {
    let mut used: Vec<String> = Vec::new();
    effective
        .iter()
        .map(|ir| {
            let base = constructor_base(ir);
            let mut name = base.clone();
            let mut counter = 1;
            while used.contains(&name) {
                counter += 1;
                name = format!("{base}{counter}");
            }
            used.push(name.clone());
            UnboxedMember {
                constructor: name,
                ir: ir.clone(),
            }
        })
        .collect()
}

fn constructor_base(ir: &IrType) -> String {
    match ir {
        IrType::String { .. } => "String".to_string(),
        IrType::Number { .. } => "Float".to_string(),
        IrType::Integer { .. } => "Int".to_string(),
        IrType::Boolean => "Bool".to_string(),
        IrType::Array { .. } => "Array".to_string(),
        IrType::Object { .. } => "Object".to_string(),
        IrType::Intersection(_) => "Object".to_string(),
        IrType::Reference(name) => normalize_name(name).pascal_case,
        IrType::Literal(IrLiteral::Str(s)) => s.to_pascal_case(),
        IrType::Literal(IrLiteral::Num(_)) => "Float".to_string(),
        IrType::Literal(IrLiteral::Bool(_)) => "Bool".to_string(),
        _ => "Value".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_plus_one_member_is_lone() {
        let plan = analyze(&[IrType::reference("Note"), IrType::Null]);
        assert!(plan.has_null);
        assert!(matches!(plan.shape, UnionShape::Lone(IrType::Reference(ref n)) if n == "Note"));
    }

    #[test]
    fn array_plus_element_simplifies() {
        let plan = analyze(&[
            IrType::reference("Tag"),
            IrType::array(IrType::reference("Tag")),
        ]);
        assert!(!plan.has_null);
        assert!(matches!(plan.shape, UnionShape::ArrayOf(IrType::Reference(ref n)) if n == "Tag"));
    }

    #[test]
    fn string_literals_form_enum() {
        let members: Vec<IrType> = ["public", "home", "followers", "specified"]
            .iter()
            .map(|s| IrType::Literal(IrLiteral::Str(s.to_string())))
            .collect();
        let plan = analyze(&members);
        match plan.shape {
            UnionShape::Enum(tags) => assert_eq!(tags.len(), 4),
            other => panic!("expected enum, got {other:?}"),
        }
    }

    #[test]
    fn distinct_kinds_are_unboxable() {
        let plan = analyze(&[IrType::string(), IrType::integer(), IrType::Boolean]);
        match plan.shape {
            UnionShape::Unboxed(members) => {
                let names: Vec<&str> =
                    members.iter().map(|m| m.constructor.as_str()).collect();
                assert_eq!(names, ["String", "Int", "Bool"]);
            }
            other => panic!("expected unboxed, got {other:?}"),
        }
    }

    #[test]
    fn number_and_integer_share_a_kind() {
        let plan = analyze(&[IrType::number(), IrType::integer()]);
        assert!(matches!(plan.shape, UnionShape::Fallback(IrType::Integer { .. })));
    }

    #[test]
    fn two_references_share_the_object_kind() {
        let plan = analyze(&[IrType::reference("A"), IrType::reference("B")]);
        assert!(matches!(plan.shape, UnionShape::Fallback(IrType::Reference(ref n)) if n == "B"));
    }

    #[test]
    fn colliding_constructor_names_get_suffixes() {
        // A reference named String next to a real string member.
        let members = derive_constructors(&[IrType::string(), IrType::reference("String")]);
        assert_eq!(members[0].constructor, "String");
        assert_eq!(members[1].constructor, "String2");
    }

    #[test]
    fn unknown_member_defeats_unboxing() {
        let plan = analyze(&[IrType::string(), IrType::Unknown]);
        assert!(matches!(plan.shape, UnionShape::Fallback(IrType::Unknown)));
    }
}
