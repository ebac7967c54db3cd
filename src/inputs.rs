/*
Input enumeration.  Command line inputs may be files, which are taken as-is, or
directories, which are walked with walkdir and filtered with a globset matcher
against each file's name (so `*.csv` means "any CSV anywhere below").

The result is sorted and deduplicated so that a batch always processes files in
the same order no matter how the filesystem lists them.
*/

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::errors::{ConvertError, Result};

fn compile_glob(glob: &str) -> Result<GlobMatcher> {
    Glob::new(glob)
        .map(|g| g.compile_matcher())
        .map_err(|err| ConvertError::Config(format!("bad input glob '{}': {}", glob, err)))
}

fn walk_dir(root: &Path, matcher: &GlobMatcher, into: &mut BTreeSet<PathBuf>) -> Result<()> {
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            let source = err
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "walk failed"));
            ConvertError::Io { path, source }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if matcher.is_match(entry.file_name()) {
            into.insert(entry.into_path());
        }
    }
    Ok(())
}

/// Expand `inputs` into the sorted list of files to convert.  Inputs that do not
/// exist are reported and skipped.
pub fn collect_inputs(inputs: &[PathBuf], glob: &str) -> Result<Vec<PathBuf>> {
    let matcher = compile_glob(glob)?;
    let mut files = BTreeSet::new();

    for input in inputs {
        if input.is_dir() {
            walk_dir(input, &matcher, &mut files)?;
        } else if input.is_file() {
            files.insert(input.clone());
        } else {
            warn!(input = %input.display(), "input does not exist; skipping");
        }
    }

    debug!(count = files.len(), "collected input files");
    Ok(files.into_iter().collect())
}
