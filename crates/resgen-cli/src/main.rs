use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;

use resgen_core::compile::compile;
use resgen_core::config::{self, GenConfig, CONFIG_FILE_NAME};
use resgen_core::docs::DocOverrides;
use resgen_core::document::{self, Document};
use resgen_core::error::{ErrorContext, GeneratorError};
use resgen_core::{Artifacts, CodeGenerator};
use resgen_typescript::TypeScriptGenerator;

#[derive(Parser)]
#[command(name = "resgen", about = "OpenAPI 3.1 → ReScript client generator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code from an OpenAPI spec
    Generate {
        /// Path to the OpenAPI spec file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "src/generated")]
        output: PathBuf,

        /// Named fork specs, `name=path` pairs
        #[arg(long = "fork", value_name = "NAME=PATH")]
        forks: Vec<String>,
    },

    /// Validate an OpenAPI spec and report compile warnings
    Validate {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Inspect the compiled IR of an OpenAPI spec
    Inspect {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Write a default .resgen.yaml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions { shell: Shell },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            output,
            forks,
        } => cmd_generate(&input, &output, &forks),
        Commands::Validate { input } => cmd_validate(&input),
        Commands::Inspect { input } => cmd_inspect(&input),
        Commands::Init { force } => cmd_init(force),
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "resgen", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn load_config() -> Result<GenConfig> {
    let path = PathBuf::from(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(GenConfig::default());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(config::parse_config(&content)?)
}

fn load_document(path: &Path) -> Result<Document> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");
    let doc = match ext {
        "json" => document::from_json(&content)?,
        _ => document::from_yaml(&content)?,
    };
    Ok(doc)
}

/// Load `{module}/{operation}.md` override files under the configured
/// directory. The core consumes contents only; all I/O stays here.
fn load_overrides(config: &GenConfig) -> Result<DocOverrides> {
    let Some(dir) = &config.doc_override_dir else {
        return Ok(DocOverrides::default());
    };
    if !dir.exists() {
        log::warn!("doc override directory {} does not exist", dir.display());
        return Ok(DocOverrides::default());
    }

    let mut files: Vec<(String, String)> = Vec::new();
    for module_entry in fs::read_dir(dir)? {
        let module_entry = module_entry?;
        if !module_entry.file_type()?.is_dir() {
            continue;
        }
        let module_name = module_entry.file_name().to_string_lossy().into_owned();
        for file_entry in fs::read_dir(module_entry.path())? {
            let file_entry = file_entry?;
            let file_name = file_entry.file_name().to_string_lossy().into_owned();
            if !file_name.ends_with(".md") {
                continue;
            }
            let content = fs::read_to_string(file_entry.path())?;
            files.push((format!("{module_name}/{file_name}"), content));
        }
    }
    files.sort();

    let borrowed: Vec<(&str, &str)> = files
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    Ok(DocOverrides::from_files(borrowed)?)
}

fn parse_fork_args(forks: &[String]) -> Result<Vec<(String, Document)>> {
    forks
        .iter()
        .map(|spec| {
            let (name, path) = spec
                .split_once('=')
                .with_context(|| format!("fork {spec:?} is not in NAME=PATH form"))?;
            let doc = load_document(Path::new(path))?;
            Ok((name.to_string(), doc))
        })
        .collect()
}

fn cmd_generate(input: &Path, output: &Path, fork_args: &[String]) -> Result<()> {
    let config = load_config()?;
    let overrides = load_overrides(&config)?;
    let forks = parse_fork_args(fork_args)?;

    let doc = load_document(input)?;

    let mut artifacts =
        resgen_rescript::generate_with_forks(&doc, &forks, &config, &overrides)?;

    if config.targets.dts || config.targets.ts_wrapper {
        let compiled = compile(&doc)?;
        let ts = TypeScriptGenerator.generate(&compiled, &config)?;
        artifacts.merge(ts);
    }

    write_artifacts(output, &artifacts)?;

    for warning in &artifacts.warnings {
        log::warn!("{warning}");
    }
    println!(
        "wrote {} file(s) to {} ({} warning(s))",
        artifacts.files.len(),
        output.display(),
        artifacts.warnings.len()
    );
    Ok(())
}

fn write_artifacts(output: &Path, artifacts: &Artifacts) -> Result<()> {
    for file in &artifacts.files {
        let path = output.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GeneratorError::FileWrite {
                message: e.to_string(),
                context: ErrorContext::at(parent.display().to_string()),
            })?;
        }
        fs::write(&path, &file.content).map_err(|e| GeneratorError::FileWrite {
            message: e.to_string(),
            context: ErrorContext::at(path.display().to_string()),
        })?;
    }
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<()> {
    let doc = load_document(input)?;
    let compiled = compile(&doc)?;
    for warning in &compiled.warnings {
        println!("warning: {warning}");
    }
    println!(
        "{} v{}: {} schema(s), {} endpoint(s), {} warning(s)",
        compiled.info.title,
        compiled.info.version,
        compiled.schemas.len(),
        compiled.endpoints.len(),
        compiled.warnings.len()
    );
    Ok(())
}

fn cmd_inspect(input: &Path) -> Result<()> {
    let doc = load_document(input)?;
    let compiled = compile(&doc)?;

    println!("# {} {}", compiled.info.title, compiled.info.version);
    println!("\n## Schemas");
    for named in compiled.schemas.iter() {
        println!("- {}: {}", named.name.original, named.ir);
    }
    println!("\n## Endpoints");
    for endpoint in &compiled.endpoints {
        println!(
            "- {} {} {} [{}]",
            endpoint.method.as_str(),
            endpoint.path,
            endpoint.name.camel_case,
            endpoint.fingerprint
        );
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let path = PathBuf::from(CONFIG_FILE_NAME);
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    fs::write(&path, config::default_config_content())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}
