pub mod compile;
pub mod config;
pub mod docs;
pub mod document;
pub mod error;
pub mod fingerprint;
pub mod genctx;
pub mod ir;
pub mod naming;
pub mod report;
pub mod warnings;

use warnings::Warning;

/// A generated file with path and content.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

/// The bundle a generator returns: file contents plus every warning
/// accumulated while compiling and lowering.
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    pub files: Vec<GeneratedFile>,
    pub warnings: Vec<Warning>,
}

impl Artifacts {
    pub fn merge(&mut self, other: Artifacts) {
        self.files.extend(other.files);
        self.warnings.extend(other.warnings);
    }
}

/// Trait for code generators that produce files from a compiled spec.
pub trait CodeGenerator {
    type Error: std::error::Error;
    fn generate(
        &self,
        compiled: &compile::CompiledSpec,
        config: &config::GenConfig,
    ) -> Result<Artifacts, Self::Error>;
}
