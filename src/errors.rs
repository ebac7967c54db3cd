use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Everything that can go wrong while turning an equipment export into an
/// RDF/XML document.  The batch driver treats every variant as a per-file
/// problem: it gets logged and the next file is processed.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input is structurally unusable, for example the configured path
    /// column is not present in the header row.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// None of the candidate text encodings could decode the file.
    #[error("unable to decode {} with any of the encodings {}", path.display(), tried.join(", "))]
    Encoding { path: PathBuf, tried: Vec<String> },
    /// The resolver produced nothing to emit.
    #[error("no hierarchy paths to generate")]
    EmptyInput,
    /// Something unexpected happened while assigning identifiers or writing
    /// out the document.
    #[error("generation failed: {0}")]
    Generation(String),
    /// The configuration file is unreadable or lacks a required value.
    #[error("configuration problem: {0}")]
    Config(String),
    #[error("I/O problem with {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub fn io(path: &Path, source: std::io::Error) -> ConvertError {
        ConvertError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// CSV reader problems surface once the encoding has been settled, so they are
// problems with the data rather than the transport.
impl From<csv::Error> for ConvertError {
    fn from(err: csv::Error) -> ConvertError {
        ConvertError::MalformedInput(err.to_string())
    }
}

impl From<toml::de::Error> for ConvertError {
    fn from(err: toml::de::Error) -> ConvertError {
        ConvertError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(err: serde_json::Error) -> ConvertError {
        ConvertError::Config(err.to_string())
    }
}
