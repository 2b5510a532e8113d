//! Locating, reading and parsing protobuf source files.

mod chain;
mod include;

pub use chain::ChainFileResolver;
pub use include::IncludeFileResolver;

use std::{
    fs, io,
    path::{self, Path, PathBuf},
};

use prost_types::FileDescriptorProto;
use walkdir::WalkDir;

use crate::{error::ErrorKind, Error};


/// A strategy for locating protobuf source files.
///
/// The main implementation is [`IncludeFileResolver`] which uses the file system, but
/// this trait allows sourcing files from other places as well.
pub trait FileResolver {
    /// Opens a file by its unique name.
    ///
    /// # Errors
    ///
    /// If the file is not found, the implementation should return [`Error::file_not_found`].
    fn open_file(&self, name: &str) -> Result<File, Error>;
}

impl<T> FileResolver for Box<T>
where
    T: FileResolver + ?Sized,
{
    fn open_file(&self, name: &str) -> Result<File, Error> {
        (**self).open_file(name)
    }
}

/// A parsed protobuf source file, returned by [`FileResolver::open_file`].
///
/// Type names and imports are left exactly as written in the source.
#[derive(Debug, Clone)]
pub struct File {
    pub(crate) path: Option<PathBuf>,
    pub(crate) source: Option<String>,
    pub(crate) descriptor: FileDescriptorProto,
}

impl File {
    /// Reads and parses the protobuf source file at `path`, giving it the unique name `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if there is an IO error opening the file, or it is not
    /// a valid protobuf source file.
    ///
    /// If the file does not exist, [`Error::file_not_found()`] is returned.
    pub fn open(name: &str, path: &Path) -> Result<Self, Error> {
        let source = fs::read_to_string(path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                Error::file_not_found(name)
            } else {
                Error::from_kind(ErrorKind::OpenFile {
                    name: name.to_owned(),
                    path: path.to_owned(),
                    err,
                })
            }
        })?;

        let mut file = File::from_source(name, &source)?;
        file.path = Some(path.to_owned());
        Ok(file)
    }

    /// Parses a protobuf source file from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid protobuf source file.
    ///
    /// # Examples
    ///
    /// ```
    /// # use oneproto::file::File;
    /// let file = File::from_source("foo.proto", "package a.b; message Foo { }").unwrap();
    /// assert_eq!(file.name(), "foo.proto");
    /// assert_eq!(file.file_descriptor_proto().package(), "a.b");
    /// assert_eq!(file.file_descriptor_proto().message_type[0].name(), "Foo");
    /// ```
    pub fn from_source(name: &str, source: &str) -> Result<Self, Error> {
        let mut descriptor =
            protox_parse::parse(name, source).map_err(|err| Error::parse(name, err))?;
        descriptor.name = Some(name.to_owned());

        Ok(File {
            path: None,
            source: Some(source.to_owned()),
            descriptor,
        })
    }

    /// Creates a new instance of [`File`] from an already parsed [`FileDescriptorProto`].
    pub fn from_file_descriptor_proto(file: FileDescriptorProto) -> Self {
        File {
            path: None,
            source: None,
            descriptor: file,
        }
    }

    /// Returns the unique name of this file.
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Returns the filesystem path, if this source is backed by a physical file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the full content of the source file if available.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Returns the parsed descriptor of the file.
    pub fn file_descriptor_proto(&self) -> &FileDescriptorProto {
        &self.descriptor
    }

    /// Converts this file into its parsed descriptor.
    pub fn into_file_descriptor_proto(self) -> FileDescriptorProto {
        self.descriptor
    }
}

/// Finds every `.proto` file under `dir`.
///
/// Files are returned as `/`-separated names relative to `dir`, sorted by name.
pub fn discover(dir: &Path) -> Result<Vec<String>, Error> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|err| Error::from(io::Error::from(err)))?;
        if !entry.file_type().is_file() || entry.path().extension() != Some("proto".as_ref()) {
            continue;
        }

        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        match path_to_file_name(relative) {
            Some(name) => names.push(name),
            None => {
                return Err(Error::from_kind(ErrorKind::FileNotIncluded {
                    path: entry.path().to_owned(),
                }))
            }
        }
    }

    tracing::trace!(dir = %dir.display(), count = names.len(), "discovered files");
    names.sort();
    Ok(names)
}

pub(crate) fn path_to_file_name(path: &Path) -> Option<String> {
    let mut name = String::new();
    for component in path.components() {
        match component {
            path::Component::Normal(component) => {
                if let Some(component) = component.to_str() {
                    if !name.is_empty() {
                        name.push('/');
                    }
                    name.push_str(component);
                } else {
                    return None;
                }
            }
            path::Component::CurDir => continue,
            _ => return None,
        }
    }

    Some(name)
}
