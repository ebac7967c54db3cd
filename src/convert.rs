//! Per-file conversion and the batch loop around it.  Every file is converted
//! independently: a failure is logged with the file's name and the batch moves
//! on to the next one.

use std::path::{Path, PathBuf};

use tracing::{error, info, info_span, warn};

use crate::config::{Config, RootParent};
use crate::errors::{ConvertError, Result};
use crate::file_format::csv_rows::read_records;
use crate::file_utils::write_file_ensuring_parent_dir;
use crate::hierarchy::{resolve, Record};
use crate::rdf_xml::generate;
use crate::sample_data::sample_records;
use crate::tree::{IdMinter, UuidMinter};

/// Output name used when the built-in sample rows are converted.
pub const SAMPLE_OUTPUT_NAME: &str = "sample.xml";

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// `input` with its extension replaced by `xml`, placed in `output_dir` when
/// one is given and next to the input otherwise.
pub fn output_path_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => {
            let name = input
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("output"));
            dir.join(name).with_extension("xml")
        }
        None => input.with_extension("xml"),
    }
}

/// Resolve and render already ingested rows.
pub fn convert_records(
    records: &[Record],
    config: &Config,
    root_parent: &RootParent,
    minter: &mut dyn IdMinter,
) -> Result<String> {
    let resolved = resolve(records, &config.hierarchy_options());
    if resolved.is_empty() {
        return Err(ConvertError::EmptyInput);
    }
    generate(&resolved, root_parent, &config.xml_generation, minter)
}

pub fn convert_file(input: &Path, config: &Config, root_parent: &RootParent) -> Result<PathBuf> {
    let records = read_records(input, &config.csv_headers)?;
    let xml = convert_records(&records, config, root_parent, &mut UuidMinter)?;
    let output = output_path_for(input, config.file_management.output_directory.as_deref());
    write_file_ensuring_parent_dir(&output, &xml)?;
    info!(output = %output.display(), "wrote RDF/XML");
    Ok(output)
}

pub fn convert_all(inputs: &[PathBuf], config: &Config, root_parent: &RootParent) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for input in inputs {
        let _span = info_span!("convert", file = %input.display()).entered();
        match convert_file(input, config, root_parent) {
            Ok(output) => summary.converted.push(output),
            Err(err) => {
                error!(error = %err, "conversion failed; skipping file");
                summary.failed.push((input.clone(), err.to_string()));
            }
        }
    }

    info!(
        converted = summary.converted.len(),
        failed = summary.failed.len(),
        "batch finished"
    );
    summary
}

/// Convert the built-in sample rows into `<output_directory>/sample.xml` (or
/// `./sample.xml`).
pub fn convert_sample(config: &Config, root_parent: &RootParent) -> Result<PathBuf> {
    warn!("no input files found; converting the built-in sample rows");
    let xml = convert_records(&sample_records(), config, root_parent, &mut UuidMinter)?;
    let output = config
        .file_management
        .output_directory
        .as_deref()
        .unwrap_or_else(|| Path::new("."))
        .join(SAMPLE_OUTPUT_NAME);
    write_file_ensuring_parent_dir(&output, &xml)?;
    info!(output = %output.display(), "wrote sample RDF/XML");
    Ok(output)
}
