//! Converts equipment hierarchy exports (CSV rows of `Root\Child\Grandchild`
//! paths with optional uid and plant code columns) into CIM RDF/XML.
//!
//! Each input file produces an `.xml` file with the same stem, either next to
//! it or in the configured output directory.  Directories are searched for
//! files matching `file_management.input_glob`.
//!
//!   hierarchy-to-rdf --config converter.toml --parent _d69453f3-... input/

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};

use hierarchy_rdf::config::Config;
use hierarchy_rdf::convert::{convert_all, convert_sample};
use hierarchy_rdf::errors::Result;
use hierarchy_rdf::hierarchy::AttachmentPolicy;
use hierarchy_rdf::inputs::collect_inputs;
use hierarchy_rdf::logging::init_logging;

/// Picked up from the working directory when `--config` is not given.
const DEFAULT_CONFIG: &str = "config.toml";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    /// Rows with a uid stand in as the parent of the rows below them.
    VirtualContainer,
    /// Rows with a uid are only listed as children of their parent.
    ExternalChild,
}

impl From<PolicyArg> for AttachmentPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::VirtualContainer => AttachmentPolicy::VirtualContainer,
            PolicyArg::ExternalChild => AttachmentPolicy::ExternalChild,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(version, about = "Convert equipment hierarchy exports into CIM RDF/XML")]
struct Args {
    /// Files or directories to convert.  Defaults to the configured input
    /// directory.
    #[clap(value_parser)]
    inputs: Vec<PathBuf>,

    /// TOML or JSON config file.
    #[clap(long, short, value_parser)]
    config: Option<PathBuf>,

    /// uid of the existing object the hierarchy's roots are attached to, for
    /// example `_d69453f3-...`.  A leading `#` is added when missing.
    #[clap(long, short, value_parser, env = "HIERARCHY_RDF_PARENT")]
    parent: Option<String>,

    /// How rows that carry their own uid are handled.
    #[clap(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Write outputs here instead of next to each input.
    #[clap(long, short, value_parser)]
    output_dir: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None if Path::new(DEFAULT_CONFIG).is_file() => Config::load(Path::new(DEFAULT_CONFIG))?,
        None => Config::default(),
    };
    if let Some(policy) = args.policy {
        config.hierarchy.policy = policy.into();
    }
    if let Some(dir) = &args.output_dir {
        config.file_management.output_directory = Some(dir.clone());
    }
    Ok(config)
}

fn run(args: &Args, config: &Config) -> Result<bool> {
    let root_parent = config.root_parent(args.parent.as_deref())?;
    info!(parent = root_parent.as_resource(), "hierarchy roots attach to");

    let inputs = if args.inputs.is_empty() {
        vec![config.file_management.input_directory.clone()]
    } else {
        args.inputs.clone()
    };
    let files = collect_inputs(&inputs, &config.file_management.input_glob)?;

    if files.is_empty() {
        if config.file_management.fallback_on_missing_file {
            convert_sample(config, &root_parent)?;
            return Ok(true);
        }
        warn!("no input files found");
        return Ok(false);
    }

    let summary = convert_all(&files, config, &root_parent);
    for (file, reason) in &summary.failed {
        error!(file = %file.display(), %reason, "not converted");
    }
    Ok(summary.is_success())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            let _ = init_logging(None);
            error!(error = %err, "unable to load configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_logging(config.file_management.log_directory.as_deref()) {
        eprintln!("unable to set up logging: {}", err);
        return ExitCode::FAILURE;
    }

    match run(&args, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(error = %err, "conversion aborted");
            ExitCode::FAILURE
        }
    }
}
