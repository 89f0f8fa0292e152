use resgen_core::compile::{compile, CompiledSpec};
use resgen_core::config::{ForkStrategy, GenConfig};
use resgen_core::docs::DocOverrides;
use resgen_core::document::Document;
use resgen_core::error::GeneratorError;
use resgen_core::report;
use resgen_core::{Artifacts, CodeGenerator, GeneratedFile};

use crate::components::emit_components;
use crate::endpoints::{emit_client, emit_endpoint_modules};

/// ReScript generator: the `api` and `wrapper` targets.
#[derive(Default)]
pub struct RescriptGenerator {
    pub overrides: DocOverrides,
}

impl CodeGenerator for RescriptGenerator {
    type Error = GeneratorError;

    fn generate(
        &self,
        compiled: &CompiledSpec,
        config: &GenConfig,
    ) -> Result<Artifacts, GeneratorError> {
        let mut artifacts = Artifacts::default();
        artifacts.warnings.extend(compiled.warnings.clone());

        let dir = output_dir(config);

        if config.targets.api {
            let (schemas_code, mut warnings) = emit_components(compiled, None);
            artifacts.files.push(GeneratedFile {
                path: format!("{dir}Schemas.res"),
                content: schemas_code,
            });
            artifacts.warnings.append(&mut warnings);

            let (endpoint_files, mut warnings) =
                emit_endpoint_modules(compiled, config, &self.overrides, None);
            for file in endpoint_files {
                artifacts.files.push(GeneratedFile {
                    path: format!("{dir}{}", file.path),
                    content: file.content,
                });
            }
            artifacts.warnings.append(&mut warnings);
        }

        if config.targets.wrapper {
            artifacts.files.push(GeneratedFile {
                path: format!("{dir}Client.res"),
                content: emit_client(),
            });
        }

        Ok(artifacts)
    }
}

/// In `SharedBase` mode the base instance's artifacts live in their own
/// subdirectory; forks qualify into it via the module prefix.
fn output_dir(config: &GenConfig) -> String {
    match config.strategy {
        ForkStrategy::SharedBase => format!("{}/", config.base_instance_name),
        ForkStrategy::Separate => String::new(),
    }
}

/// Primary entry: parse-level document + configuration in, artifact bundle
/// or structured error out.
pub fn generate(doc: &Document, config: &GenConfig) -> Result<Artifacts, GeneratorError> {
    generate_with_forks(doc, &[], config, &DocOverrides::default())
}

/// Entry for multi-fork inputs. Forks are diffed against the base at the
/// endpoint-list level; schema merging stays out of scope. The diff report
/// is emitted when configured, and the breaking-change policy is applied
/// before any artifact is produced.
pub fn generate_with_forks(
    doc: &Document,
    forks: &[(String, Document)],
    config: &GenConfig,
    overrides: &DocOverrides,
) -> Result<Artifacts, GeneratorError> {
    config.validate()?;

    let compiled = compile(doc)?;

    let mut diffs = Vec::with_capacity(forks.len());
    for (name, fork_doc) in forks {
        let fork = compile(fork_doc)?;
        diffs.push(report::diff_endpoints(
            &compiled.endpoints,
            name,
            &fork.endpoints,
        ));
    }
    report::apply_breaking_policy(&diffs, config.breaking_change_handling)?;

    let generator = RescriptGenerator {
        overrides: overrides.clone(),
    };
    let mut artifacts = generator.generate(&compiled, config)?;

    if config.generate_diff_report && !diffs.is_empty() {
        artifacts.files.push(GeneratedFile {
            path: "DIFF_REPORT.md".to_string(),
            content: report::render_report(&compiled.info.title, &diffs),
        });
    }

    Ok(artifacts)
}
