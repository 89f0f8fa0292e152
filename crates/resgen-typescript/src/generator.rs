use resgen_core::compile::CompiledSpec;
use resgen_core::config::GenConfig;
use resgen_core::error::GeneratorError;
use resgen_core::{Artifacts, CodeGenerator, GeneratedFile};

use crate::dts::emit_dts;
use crate::wrapper::emit_wrapper;

/// TypeScript generator: the `dts` and `ts_wrapper` targets.
pub struct TypeScriptGenerator;

impl CodeGenerator for TypeScriptGenerator {
    type Error = GeneratorError;

    fn generate(
        &self,
        compiled: &CompiledSpec,
        config: &GenConfig,
    ) -> Result<Artifacts, GeneratorError> {
        let mut artifacts = Artifacts::default();

        if config.targets.dts {
            artifacts.files.push(GeneratedFile {
                path: "types.d.ts".to_string(),
                content: emit_dts(compiled),
            });
        }

        if config.targets.ts_wrapper {
            artifacts.files.push(GeneratedFile {
                path: "wrapper.ts".to_string(),
                content: emit_wrapper(compiled),
            });
        }

        Ok(artifacts)
    }
}
