use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ConvertError, Result};
use crate::hierarchy::{AttachmentPolicy, HierarchyOptions};
use crate::path::PATH_SEPARATOR;

/// Schema for the converter's config file, either TOML or JSON.  Every section
/// and field is optional so a partial file only overrides what it names.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub file_management: FileManagement,
    pub csv_headers: CsvHeaders,
    pub hierarchy: HierarchyConfig,
    pub xml_generation: ModelConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FileManagement {
    /// Used when no inputs are given on the command line.
    pub input_directory: PathBuf,
    /// When unset, every output lands next to its input.
    pub output_directory: Option<PathBuf>,
    /// When set, logs are also written to `<log_directory>/hierarchy-to-rdf.log`.
    pub log_directory: Option<PathBuf>,
    /// Which files to pick up when an input is a directory.
    pub input_glob: String,
    /// Convert the built-in sample rows if there are no input files at all.
    pub fallback_on_missing_file: bool,
}

impl Default for FileManagement {
    fn default() -> Self {
        FileManagement {
            input_directory: PathBuf::from("input"),
            output_directory: None,
            log_directory: None,
            input_glob: "*.csv".to_string(),
            fallback_on_missing_file: false,
        }
    }
}

/// Header names of the export's columns.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvHeaders {
    pub path: String,
    pub uid: String,
    /// Plant coding system column; ignored entirely when unset.
    #[serde(alias = "CCK_code")]
    pub inventory_code: Option<String>,
}

impl Default for CsvHeaders {
    fn default() -> Self {
        CsvHeaders {
            path: "path".to_string(),
            uid: "uid".to_string(),
            inventory_code: None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    pub policy: AttachmentPolicy,
}

/// Everything that ends up in the document framing.  Values are emitted
/// verbatim apart from XML escaping.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Prefix -> URI, emitted as `xmlns:` attributes on `rdf:RDF`.
    pub namespaces: BTreeMap<String, String>,
    pub model_id: String,
    /// Falls back to the current time when left empty.
    pub model_created: String,
    pub model_version: String,
    pub model_name: String,
    /// The existing object every root of the hierarchy is attached to.  The
    /// command line `--parent` takes precedence.
    pub root_parent_id: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let namespaces = [
            ("cim", "http://iec.ch/TC57/2014/CIM-schema-cim16#"),
            ("md", "http://iec.ch/TC57/61970-552/ModelDescription/1#"),
            ("me", "http://monitel.com/2014/schema-cim16#"),
            ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
            ("rh", "http://rushydro.ru/2015/schema-cim16#"),
        ]
        .iter()
        .map(|(prefix, uri)| (prefix.to_string(), uri.to_string()))
        .collect();

        ModelConfig {
            namespaces,
            model_id: "00000000-0000-0000-0000-000000000000".to_string(),
            model_created: String::new(),
            model_version: "1.0".to_string(),
            model_name: "Equipment hierarchy".to_string(),
            root_parent_id: None,
        }
    }
}

impl ModelConfig {
    /// `model_created`, or now in RFC 3339 if it was left empty.
    pub fn created(&self) -> String {
        if self.model_created.trim().is_empty() {
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        } else {
            self.model_created.clone()
        }
    }
}

impl Config {
    /// Load a config file; `.json` files are parsed as JSON, anything else as
    /// TOML.
    pub fn load(path: &Path) -> Result<Config> {
        let contents =
            std::fs::read_to_string(path).map_err(|err| ConvertError::io(path, err))?;
        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Config::from_json_str(&contents)?
        } else {
            Config::from_toml_str(&contents)?
        };
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Config> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_json_str(contents: &str) -> Result<Config> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn hierarchy_options(&self) -> HierarchyOptions {
        HierarchyOptions {
            separator: PATH_SEPARATOR,
            fallback_on_missing_file: self.file_management.fallback_on_missing_file,
            policy: self.hierarchy.policy,
        }
    }

    /// Pick the root parent id, preferring an explicit override.  A missing
    /// or blank id is an error; there is no sensible object to guess.
    pub fn root_parent(&self, override_id: Option<&str>) -> Result<RootParent> {
        let raw = override_id
            .or(self.xml_generation.root_parent_id.as_deref())
            .unwrap_or("");
        RootParent::new(raw)
    }
}

/// The id of the existing object the hierarchy's roots hang off, normalized to
/// an `rdf:resource` reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootParent(String);

impl RootParent {
    pub fn new(raw: &str) -> Result<RootParent> {
        let raw = raw.trim();
        if raw.is_empty() || raw == "#" {
            return Err(ConvertError::Config(
                "no root parent id configured (use --parent or xml_generation.root_parent_id)"
                    .to_string(),
            ));
        }
        if raw.starts_with('#') {
            Ok(RootParent(raw.to_string()))
        } else {
            Ok(RootParent(format!("#{}", raw)))
        }
    }

    pub fn as_resource(&self) -> &str {
        &self.0
    }
}
