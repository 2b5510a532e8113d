use std::{fmt, io, path::PathBuf};

use miette::Diagnostic;
use protox_parse::ParseError;
use thiserror::Error;

/// An error that can occur when merging protobuf files.
#[derive(Diagnostic, Error)]
#[error(transparent)]
#[diagnostic(transparent)]
pub struct Error {
    kind: Box<ErrorKind>,
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum ErrorKind {
    #[error("{}", err)]
    #[diagnostic(forward(err))]
    Parse { name: String, err: ParseError },
    #[error("error opening file '{path}'")]
    OpenFile {
        name: String,
        path: PathBuf,
        #[source]
        err: io::Error,
    },
    #[error("file '{name}' not found")]
    FileNotFound { name: String },
    #[error("file '{path}' is not in the include path")]
    FileNotIncluded { path: PathBuf },
    #[error("error reading template file '{path}'")]
    ReadTemplate {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
    #[error("message '{message}' extends '{name}', which is not defined")]
    #[diagnostic(help(
        "the parent message name must be fully qualified, relative to the root package"
    ))]
    ExtendsNotFound { message: String, name: String },
    #[error("extends cycle detected: {cycle}")]
    ExtendsCycle { message: String, cycle: String },
    #[error("message '{message}' has an invalid extends option: expected a string value")]
    #[diagnostic(help("write the option as `option ({}) = \"package.Parent\";`", option))]
    InvalidExtends { message: String, option: String },
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Creates an instance of [`struct@Error`] with an arbitrary payload.
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::from_kind(ErrorKind::Custom(error.into()))
    }

    /// Creates an instance of [`struct@Error`] indicating that a file could not be found.
    ///
    /// This error should be returned by [`FileResolver`](crate::file::FileResolver) instances if a file is not found.
    pub fn file_not_found(name: &str) -> Self {
        Error::from_kind(ErrorKind::FileNotFound {
            name: name.to_owned(),
        })
    }

    /// The file in which this error occurred, if available.
    pub fn file(&self) -> Option<&str> {
        match &*self.kind {
            ErrorKind::Parse { name, .. }
            | ErrorKind::OpenFile { name, .. }
            | ErrorKind::FileNotFound { name } => Some(name),
            _ => None,
        }
    }

    /// The message whose extends options caused this error, if any.
    pub fn message(&self) -> Option<&str> {
        match &*self.kind {
            ErrorKind::ExtendsNotFound { message, .. }
            | ErrorKind::ExtendsCycle { message, .. }
            | ErrorKind::InvalidExtends { message, .. } => Some(message),
            _ => None,
        }
    }

    pub(crate) fn parse(name: &str, err: ParseError) -> Self {
        Error::from_kind(ErrorKind::Parse {
            name: name.to_owned(),
            err,
        })
    }

    pub(crate) fn from_kind(kind: ErrorKind) -> Self {
        Error {
            kind: Box::new(kind),
        }
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns true if this is an instance of [`Error::file_not_found()`]
    pub fn is_file_not_found(&self) -> bool {
        matches!(
            &*self.kind,
            ErrorKind::FileNotFound { .. } | ErrorKind::FileNotIncluded { .. }
        )
    }

    /// Returns true if this error is caused by an invalid protobuf source file.
    pub fn is_parse(&self) -> bool {
        matches!(&*self.kind, ErrorKind::Parse { .. })
    }

    /// Returns true if this error is caused by an IO error while opening a file.
    pub fn is_io(&self) -> bool {
        match &*self.kind {
            ErrorKind::OpenFile { .. } | ErrorKind::ReadTemplate { .. } => true,
            ErrorKind::Custom(err) if err.downcast_ref::<io::Error>().is_some() => true,
            _ => false,
        }
    }

    /// Returns true if this error was caused by an unresolvable extends option.
    pub fn is_extends(&self) -> bool {
        matches!(
            &*self.kind,
            ErrorKind::ExtendsNotFound { .. }
                | ErrorKind::ExtendsCycle { .. }
                | ErrorKind::InvalidExtends { .. }
        )
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::new(err)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.kind {
            ErrorKind::Parse { err, .. } => err.fmt(f),
            ErrorKind::OpenFile { err, .. } | ErrorKind::ReadTemplate { err, .. } => {
                write!(f, "{}: {}", self, err)
            }
            ErrorKind::FileNotFound { .. }
            | ErrorKind::FileNotIncluded { .. }
            | ErrorKind::ExtendsNotFound { .. }
            | ErrorKind::ExtendsCycle { .. }
            | ErrorKind::InvalidExtends { .. } => write!(f, "{}", self),
            ErrorKind::Custom(err) => err.fmt(f),
        }
    }
}

#[test]
fn fmt_debug_io() {
    let err = Error::from_kind(ErrorKind::OpenFile {
        name: "file.proto".into(),
        path: "path/to/file.proto".into(),
        err: io::Error::new(io::ErrorKind::Other, "io error"),
    });

    assert!(err.is_io());
    assert_eq!(err.file(), Some("file.proto"));
    assert_eq!(
        format!("{:?}", err),
        "error opening file 'path/to/file.proto': io error"
    );
}

#[test]
fn fmt_debug_parse() {
    let err = Error::parse("file.proto", protox_parse::parse("file.proto", "invalid").unwrap_err());

    assert!(err.is_parse());
    assert_eq!(err.file(), Some("file.proto"));
}

#[test]
fn fmt_extends_not_found() {
    let err = Error::from_kind(ErrorKind::ExtendsNotFound {
        message: "a.Child".into(),
        name: "b.Missing".into(),
    });

    assert!(err.is_extends());
    assert!(!err.is_io());
    assert_eq!(err.message(), Some("a.Child"));
    assert_eq!(
        err.to_string(),
        "message 'a.Child' extends 'b.Missing', which is not defined"
    );
}
