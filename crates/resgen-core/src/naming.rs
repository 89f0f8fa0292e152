use std::fmt;

use heck::{ToLowerCamelCase, ToPascalCase, ToShoutySnakeCase, ToSnakeCase};

/// A name with its casing variants pre-computed once, so emitters never
/// re-derive (and never disagree on) a casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedName {
    pub original: String,
    pub pascal_case: String,
    pub camel_case: String,
    pub snake_case: String,
    pub screaming_snake: String,
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Create a `NormalizedName` from an arbitrary string.
pub fn normalize_name(name: &str) -> NormalizedName {
    let sanitized = sanitize_identifier(name);

    NormalizedName {
        original: name.to_string(),
        pascal_case: sanitized.to_pascal_case(),
        camel_case: sanitized.to_lower_camel_case(),
        snake_case: sanitized.to_snake_case(),
        screaming_snake: sanitized.to_shouty_snake_case(),
    }
}

/// Derive a camelCase operation name from HTTP method + path, used when an
/// operation has no explicit `operationId`.
///
/// Path parameters contribute no words; the trailing-parameter shape picks
/// between the collection verb (`list`) and the single-resource verb (`get`).
pub fn route_to_name(method: &str, path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let mut resource_parts: Vec<String> = Vec::new();
    let mut ends_with_param = false;

    for seg in &segments {
        if seg.starts_with('{') && seg.ends_with('}') {
            ends_with_param = true;
        } else {
            resource_parts.push(seg.to_string());
            ends_with_param = false;
        }
    }

    let method_upper = method.to_uppercase();
    let prefix = match method_upper.as_str() {
        "GET" if ends_with_param => "get",
        "GET" => "list",
        "POST" => "create",
        "PUT" => "update",
        "DELETE" => "delete",
        "PATCH" => "patch",
        "OPTIONS" => "options",
        "HEAD" => "head",
        "TRACE" => "trace",
        other => other,
    };

    if resource_parts.is_empty() {
        return prefix.to_string();
    }

    let mut pascal_parts = String::new();
    for (i, part) in resource_parts.iter().enumerate() {
        let is_last = i == resource_parts.len() - 1;
        let word = if is_last && ends_with_param {
            singularize(part)
        } else {
            part.to_string()
        };
        pascal_parts.push_str(&word.to_pascal_case());
    }

    format!("{prefix}{pascal_parts}")
}

/// Naive singularization: strips a trailing 's' if present.
fn singularize(word: &str) -> String {
    if word.ends_with("ies") && word.len() > 3 {
        format!("{}y", &word[..word.len() - 3])
    } else if word.ends_with("ses") || word.ends_with("xes") || word.ends_with("zes") {
        word[..word.len() - 2].to_string()
    } else if word.ends_with('s') && !word.ends_with("ss") && word.len() > 1 {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Strip everything that cannot appear in an identifier, remembering word
/// boundaries so heck still sees them.
fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_was_separator = false;

    for (i, ch) in name.chars().enumerate() {
        if ch.is_alphanumeric() {
            if i == 0 && ch.is_ascii_digit() {
                result.push('_');
            }
            if prev_was_separator && !result.is_empty() {
                result.push('_');
            }
            result.push(ch);
            prev_was_separator = false;
        } else {
            prev_was_separator = true;
        }
    }

    if result.is_empty() {
        return "unnamed".to_string();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casing_variants() {
        let n = normalize_name("notes-create");
        assert_eq!(n.pascal_case, "NotesCreate");
        assert_eq!(n.camel_case, "notesCreate");
        assert_eq!(n.snake_case, "notes_create");
        assert_eq!(n.screaming_snake, "NOTES_CREATE");
    }

    #[test]
    fn slash_separated_name() {
        let n = normalize_name("notes/create");
        assert_eq!(n.pascal_case, "NotesCreate");
        assert_eq!(n.camel_case, "notesCreate");
    }

    #[test]
    fn empty_name_falls_back() {
        assert_eq!(normalize_name("//").pascal_case, "Unnamed");
    }

    #[test]
    fn route_collection_get() {
        assert_eq!(route_to_name("GET", "/notes"), "listNotes");
    }

    #[test]
    fn route_single_get() {
        assert_eq!(route_to_name("GET", "/notes/{noteId}"), "getNote");
    }

    #[test]
    fn route_post() {
        assert_eq!(route_to_name("POST", "/notes"), "createNotes");
    }

    #[test]
    fn route_nested_single() {
        assert_eq!(
            route_to_name("GET", "/users/{userId}/notes/{noteId}"),
            "getUsersNote"
        );
    }

    #[test]
    fn route_delete() {
        assert_eq!(route_to_name("DELETE", "/notes/{noteId}"), "deleteNote");
    }

    #[test]
    fn route_root() {
        assert_eq!(route_to_name("GET", "/"), "list");
    }
}
