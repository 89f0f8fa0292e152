use indexmap::IndexMap;

use crate::error::{ErrorContext, GeneratorError};

/// The marker an untouched override block carries.
pub const OVERRIDE_PLACEHOLDER: &str = "<!-- Empty - no override -->";

/// One parsed doc-override file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocOverride {
    pub endpoint: String,
    pub method: String,
    /// Fingerprint of the endpoint the override was written against.
    pub hash: String,
    pub host: Option<String>,
    pub version: Option<String>,
    pub operation_id: Option<String>,
    pub default_description: String,
    /// Present only when the override block is non-empty and not the
    /// placeholder.
    pub override_text: Option<String>,
}

impl DocOverride {
    /// Parse the `---`-delimited frontmatter plus the two known sections.
    pub fn parse(content: &str, source: &str) -> Result<Self, GeneratorError> {
        let bad = |message: &str| GeneratorError::Validation {
            message: message.to_string(),
            context: ErrorContext::at(source),
        };

        let rest = content
            .trim_start()
            .strip_prefix("---")
            .ok_or_else(|| bad("missing frontmatter opener"))?;
        let (frontmatter, body) = rest
            .split_once("\n---")
            .ok_or_else(|| bad("missing frontmatter closer"))?;

        let mut keys: IndexMap<&str, String> = IndexMap::new();
        for line in frontmatter.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| bad("malformed frontmatter line"))?;
            keys.insert(key.trim(), value.trim().trim_matches('"').to_string());
        }

        let required = |key: &str| {
            keys.get(key)
                .cloned()
                .ok_or_else(|| bad(&format!("frontmatter key {key} missing")))
        };

        let default_description = section_text(body, "## Default Description")
            .unwrap_or_default()
            .trim()
            .to_string();

        let override_text = section_text(body, "## Override")
            .and_then(|section| fenced_block(&section))
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty() && text != OVERRIDE_PLACEHOLDER);

        Ok(Self {
            endpoint: required("endpoint")?,
            method: required("method")?,
            hash: required("hash")?,
            host: keys.get("host").cloned(),
            version: keys.get("version").cloned(),
            operation_id: keys.get("operationId").cloned(),
            default_description,
            override_text,
        })
    }

    /// Whether the override was written against this endpoint fingerprint.
    pub fn matches(&self, fingerprint: &str) -> bool {
        self.hash == fingerprint
    }
}

/// The text of a `##`-headed section, up to the next `##` heading.
fn section_text(body: &str, heading: &str) -> Option<String> {
    let start = body.find(heading)? + heading.len();
    let tail = &body[start..];
    let end = tail.find("\n## ").unwrap_or(tail.len());
    Some(tail[..end].to_string())
}

/// The contents of the first fenced code block in a section.
fn fenced_block(section: &str) -> Option<String> {
    let open = section.find("```")?;
    let after = &section[open + 3..];
    // Skip the info string on the opening fence line.
    let content_start = after.find('\n')? + 1;
    let content = &after[content_start..];
    let close = content.find("```")?;
    Some(content[..close].to_string())
}

/// The override files the caller loaded, keyed `{module}/{operation}`.
/// The core holds no file handles; the CLI reads the directory and hands
/// the contents over.
#[derive(Debug, Clone, Default)]
pub struct DocOverrides {
    entries: IndexMap<String, DocOverride>,
}

/// A looked-up description with its staleness flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDoc {
    pub text: String,
    /// The override was written against a different endpoint fingerprint.
    pub stale: bool,
}

impl DocOverrides {
    pub fn from_files<'a>(
        files: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, GeneratorError> {
        let mut entries = IndexMap::new();
        for (key, content) in files {
            let parsed = DocOverride::parse(content, key)?;
            entries.insert(key.to_string(), parsed);
        }
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, module: &str, operation: &str) -> Option<&DocOverride> {
        self.entries.get(&format!("{module}/{operation}.md"))
    }

    /// The effective description for an endpoint: the override when one is
    /// present and current, else the supplied default. Stale overrides are
    /// reported but not applied.
    pub fn description_for(
        &self,
        module: &str,
        operation: &str,
        fingerprint: &str,
        default: Option<&str>,
    ) -> Option<ResolvedDoc> {
        let override_text = self
            .get(module, operation)
            .filter(|entry| entry.override_text.is_some())
            .map(|entry| (entry.override_text.clone(), entry.matches(fingerprint)));

        match override_text {
            Some((Some(text), true)) => Some(ResolvedDoc { text, stale: false }),
            Some(_) => default.map(|d| ResolvedDoc {
                text: d.to_string(),
                stale: true,
            }),
            None => default.map(|d| ResolvedDoc {
                text: d.to_string(),
                stale: false,
            }),
        }
    }
}

/// Render the override template the generator writes for humans to edit.
pub fn render_override_template(
    endpoint: &str,
    method: &str,
    fingerprint: &str,
    operation_id: Option<&str>,
    default_description: &str,
) -> String {
    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&format!("endpoint: {endpoint}\n"));
    out.push_str(&format!("method: {method}\n"));
    out.push_str(&format!("hash: {fingerprint}\n"));
    if let Some(id) = operation_id {
        out.push_str(&format!("operationId: {id}\n"));
    }
    out.push_str("---\n\n## Default Description\n\n");
    out.push_str(default_description);
    out.push_str("\n\n## Override\n\n```\n");
    out.push_str(OVERRIDE_PLACEHOLDER);
    out.push_str("\n```\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"---
endpoint: /notes/create
method: POST
hash: a1b2c3d4
operationId: createNote
---

## Default Description

Creates a note.

## Override

```
Creates a note. Requires write:notes scope.
```
"#;

    #[test]
    fn parses_frontmatter_and_sections() {
        let doc = DocOverride::parse(SAMPLE, "notes/createNote.md").unwrap();
        assert_eq!(doc.endpoint, "/notes/create");
        assert_eq!(doc.method, "POST");
        assert_eq!(doc.hash, "a1b2c3d4");
        assert_eq!(doc.operation_id.as_deref(), Some("createNote"));
        assert_eq!(doc.default_description, "Creates a note.");
        assert_eq!(
            doc.override_text.as_deref(),
            Some("Creates a note. Requires write:notes scope.")
        );
    }

    #[test]
    fn placeholder_means_no_override() {
        let template =
            render_override_template("/notes/create", "POST", "a1b2c3d4", None, "Creates a note.");
        let doc = DocOverride::parse(&template, "notes/createNote.md").unwrap();
        assert!(doc.override_text.is_none());
    }

    #[test]
    fn template_round_trips() {
        let template = render_override_template(
            "/notes/create",
            "POST",
            "deadbeef",
            Some("createNote"),
            "Creates a note.",
        );
        let doc = DocOverride::parse(&template, "x").unwrap();
        assert_eq!(doc.endpoint, "/notes/create");
        assert_eq!(doc.hash, "deadbeef");
        assert_eq!(doc.default_description, "Creates a note.");
    }

    #[test]
    fn stale_override_is_not_applied() {
        let overrides =
            DocOverrides::from_files([("notes/createNote.md", SAMPLE)]).unwrap();
        let resolved = overrides
            .description_for("notes", "createNote", "ffffffff", Some("Default."))
            .unwrap();
        assert!(resolved.stale);
        assert_eq!(resolved.text, "Default.");
    }

    #[test]
    fn current_override_replaces_default() {
        let overrides =
            DocOverrides::from_files([("notes/createNote.md", SAMPLE)]).unwrap();
        let resolved = overrides
            .description_for("notes", "createNote", "a1b2c3d4", Some("Default."))
            .unwrap();
        assert!(!resolved.stale);
        assert!(resolved.text.contains("write:notes"));
    }

    #[test]
    fn missing_frontmatter_is_an_error() {
        assert!(DocOverride::parse("## Override\n", "x").is_err());
    }
}
