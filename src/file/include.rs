use std::path::{Path, PathBuf};

use super::{File, FileResolver};
use crate::Error;

/// An implementation of [`FileResolver`] which searches an include path on the file system.
#[derive(Debug)]
pub struct IncludeFileResolver {
    include: PathBuf,
}

impl IncludeFileResolver {
    /// Constructs a `IncludeFileResolver` that searches the given include path.
    pub fn new(include: PathBuf) -> Self {
        IncludeFileResolver { include }
    }

    /// The include path searched by this resolver.
    pub fn include(&self) -> &Path {
        &self.include
    }
}

impl FileResolver for IncludeFileResolver {
    /// Opens a file by its unique name, relative to the include path.
    ///
    /// # Errors
    ///
    /// If no matching file is found, [`Error::file_not_found()`] is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::fs;
    /// # use oneproto::file::{IncludeFileResolver, FileResolver};
    /// # let tempdir = tempfile::TempDir::new().unwrap();
    /// fs::write(tempdir.path().join("foo.proto"), "message Foo { }").unwrap();
    ///
    /// let resolver = IncludeFileResolver::new(tempdir.path().to_owned());
    /// let file = resolver.open_file("foo.proto").unwrap();
    /// assert_eq!(file.path(), Some(tempdir.path().join("foo.proto").as_ref()));
    /// assert_eq!(file.source(), Some("message Foo { }"));
    ///
    /// assert!(resolver.open_file("notfound.proto").unwrap_err().is_file_not_found());
    /// ```
    fn open_file(&self, name: &str) -> Result<File, Error> {
        File::open(name, &self.include.join(name))
    }
}
