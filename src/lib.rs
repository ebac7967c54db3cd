//! Conversion of flat, backslash separated equipment hierarchies (CSV exports
//! from an asset management system) into CIM RDF/XML documents.
//!
//! The pipeline is `file_format::csv_rows` -> `hierarchy::resolve` ->
//! `tree::NodeTree` -> `rdf_xml`, driven per file by `convert`.

pub mod config;
pub mod convert;
pub mod errors;
pub mod file_format;
pub mod file_utils;
pub mod hierarchy;
pub mod inputs;
pub mod logging;
pub mod output;
pub mod path;
pub mod rdf_xml;
pub mod sample_data;
pub mod tree;

#[cfg(test)]
mod utils;
