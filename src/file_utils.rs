use std::path::Path;

use crate::errors::{ConvertError, Result};

pub fn write_file_ensuring_parent_dir(file_path: &Path, contents: &str) -> Result<()> {
    if let Some(parent_path) = file_path.parent() {
        if !parent_path.as_os_str().is_empty() {
            std::fs::create_dir_all(parent_path)
                .map_err(|err| ConvertError::io(parent_path, err))?;
        }
    }
    std::fs::write(file_path, contents).map_err(|err| ConvertError::io(file_path, err))?;
    Ok(())
}
