use crate::compile::Endpoint;
use crate::config::BreakingChangeHandling;
use crate::error::{ErrorContext, GeneratorError};

/// Endpoint-list delta between the base spec and one fork. Schema-level
/// merging stays out of scope; the diff is keyed by operation name with
/// fingerprints deciding "changed".
#[derive(Debug, Clone, Default)]
pub struct ForkDiff {
    pub fork: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

impl ForkDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Compare a fork's endpoint list against the base's.
pub fn diff_endpoints(base: &[Endpoint], fork_name: &str, fork: &[Endpoint]) -> ForkDiff {
    let mut diff = ForkDiff {
        fork: fork_name.to_string(),
        ..ForkDiff::default()
    };

    for endpoint in fork {
        match base.iter().find(|b| b.name.original == endpoint.name.original) {
            None => diff.added.push(endpoint.name.original.clone()),
            Some(b) if b.fingerprint != endpoint.fingerprint => {
                diff.changed.push(endpoint.name.original.clone());
            }
            Some(_) => {}
        }
    }
    for endpoint in base {
        if !fork.iter().any(|f| f.name.original == endpoint.name.original) {
            diff.removed.push(endpoint.name.original.clone());
        }
    }

    diff
}

/// Render the markdown diff report for a set of forks.
pub fn render_report(base_title: &str, diffs: &[ForkDiff]) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Endpoint diff against {base_title}\n"));

    for diff in diffs {
        out.push_str(&format!("\n## {}\n\n", diff.fork));
        if diff.is_empty() {
            out.push_str("No endpoint differences.\n");
            continue;
        }
        out.push_str("| Change | Operation |\n|---|---|\n");
        for name in &diff.added {
            out.push_str(&format!("| added | `{name}` |\n"));
        }
        for name in &diff.removed {
            out.push_str(&format!("| removed | `{name}` |\n"));
        }
        for name in &diff.changed {
            out.push_str(&format!("| changed | `{name}` |\n"));
        }
    }

    out
}

/// Apply the configured policy to removed endpoints across all forks.
pub fn apply_breaking_policy(
    diffs: &[ForkDiff],
    policy: BreakingChangeHandling,
) -> Result<(), GeneratorError> {
    let breaking: Vec<(&str, &str)> = diffs
        .iter()
        .flat_map(|d| d.removed.iter().map(move |name| (d.fork.as_str(), name.as_str())))
        .collect();

    if breaking.is_empty() {
        return Ok(());
    }

    match policy {
        BreakingChangeHandling::Ignore => Ok(()),
        BreakingChangeHandling::Warn => {
            for (fork, name) in breaking {
                log::warn!("fork {fork} removes endpoint {name}");
            }
            Ok(())
        }
        BreakingChangeHandling::Error => {
            let (fork, name) = breaking[0];
            Err(GeneratorError::Validation {
                message: format!(
                    "fork {fork} removes endpoint {name} ({} removal(s) total)",
                    diffs.iter().map(|d| d.removed.len()).sum::<usize>()
                ),
                context: ErrorContext::operation(name, format!("forks.{fork}")),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::HttpMethod;
    use crate::naming::normalize_name;

    fn endpoint(name: &str, fingerprint: &str) -> Endpoint {
        Endpoint {
            name: normalize_name(name),
            method: HttpMethod::Get,
            path: format!("/{name}"),
            summary: None,
            description: None,
            tags: Vec::new(),
            request: None,
            request_required: false,
            response: None,
            fingerprint: fingerprint.to_string(),
        }
    }

    #[test]
    fn detects_added_removed_changed() {
        let base = vec![endpoint("a", "1"), endpoint("b", "2"), endpoint("c", "3")];
        let fork = vec![endpoint("a", "1"), endpoint("b", "9"), endpoint("d", "4")];
        let diff = diff_endpoints(&base, "fork", &fork);
        assert_eq!(diff.added, ["d"]);
        assert_eq!(diff.removed, ["c"]);
        assert_eq!(diff.changed, ["b"]);
    }

    #[test]
    fn report_lists_each_change() {
        let diff = ForkDiff {
            fork: "forky".to_string(),
            added: vec!["x".to_string()],
            removed: vec!["y".to_string()],
            changed: vec![],
        };
        let report = render_report("Base API", &[diff]);
        assert!(report.contains("## forky"));
        assert!(report.contains("| added | `x` |"));
        assert!(report.contains("| removed | `y` |"));
    }

    #[test]
    fn error_policy_fails_on_removals() {
        let diffs = vec![ForkDiff {
            fork: "forky".to_string(),
            removed: vec!["gone".to_string()],
            ..ForkDiff::default()
        }];
        assert!(apply_breaking_policy(&diffs, BreakingChangeHandling::Ignore).is_ok());
        assert!(matches!(
            apply_breaking_policy(&diffs, BreakingChangeHandling::Error),
            Err(GeneratorError::Validation { .. })
        ));
    }
}
