use std::{
    env, fs,
    ops::Deref,
    path::{Path, PathBuf},
};

use uuid::Uuid;

/// A scratch directory under the system temp dir that is removed on drop.  The
/// name gets a random suffix so concurrently running tests never share one.
pub struct TempDir(PathBuf);

impl TempDir {
    pub fn new<P: AsRef<Path>>(prefix: P) -> Self {
        let mut name = prefix.as_ref().as_os_str().to_owned();
        name.push(format!("-{}", Uuid::new_v4().simple()));
        let path = env::temp_dir().join(name);
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }
}

impl Deref for TempDir {
    type Target = PathBuf;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}
