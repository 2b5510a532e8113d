use std::{fmt, fs, path::Path};

use bytes::Buf;
use prost::Message;
use prost_types::{FileDescriptorProto, FileDescriptorSet};

use crate::{
    error::ErrorKind,
    file::{discover, ChainFileResolver, FileResolver, IncludeFileResolver},
    generate::Generator,
    namespace::NamespaceTree,
    options::DEFAULT_EXTENDS_OPTION,
    resolve::Resolver,
    Error,
};

#[cfg(test)]
mod tests;

/// Options for merging protobuf files into a single schema.
pub struct Transpiler {
    root_package: String,
    resolver: Box<dyn FileResolver>,
    files: Vec<FileDescriptorProto>,
    template: String,
    inherit_options: bool,
    extends_option: String,
}

impl Transpiler {
    /// Create a new [`Transpiler`] which opens files from the given include paths.
    ///
    /// Files in `root_package` are written at the top level of the output. Files in any other
    /// package are nested in one message per package name segment.
    pub fn new<I, P>(includes: I, root_package: &str) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut resolver = ChainFileResolver::new();
        for include in includes {
            resolver.add(IncludeFileResolver::new(include.as_ref().to_owned()));
        }

        Transpiler::with_file_resolver(resolver, root_package)
    }

    /// Create a new [`Transpiler`] with a custom [`FileResolver`] for opening files.
    pub fn with_file_resolver<R>(resolver: R, root_package: &str) -> Self
    where
        R: FileResolver + 'static,
    {
        Transpiler {
            root_package: root_package.to_owned(),
            resolver: Box::new(resolver),
            files: Vec::new(),
            template: String::new(),
            inherit_options: false,
            extends_option: DEFAULT_EXTENDS_OPTION.to_owned(),
        }
    }

    /// Set the text written verbatim at the start of the output, typically containing the
    /// `syntax` and `package` statements and any imports.
    pub fn template(&mut self, template: impl Into<String>) -> &mut Self {
        self.template = template.into();
        self
    }

    /// Read the template from a file.
    pub fn template_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, Error> {
        let path = path.as_ref();
        let template = fs::read_to_string(path).map_err(|err| {
            Error::from_kind(ErrorKind::ReadTemplate {
                path: path.to_owned(),
                err,
            })
        })?;
        Ok(self.template(template))
    }

    /// Set whether messages also inherit the options of the messages they extend.
    ///
    /// Extends options themselves are never inherited.
    pub fn inherit_options(&mut self, yes: bool) -> &mut Self {
        self.inherit_options = yes;
        self
    }

    /// Set the name of the option used to inherit fields. Defaults to [`DEFAULT_EXTENDS_OPTION`].
    pub fn extends_option(&mut self, name: impl Into<String>) -> &mut Self {
        self.extends_option = name.into();
        self
    }

    /// Open and parse the file with the given name using the file resolver.
    ///
    /// Opening a file that was already added has no effect.
    pub fn open_file(&mut self, name: impl AsRef<str>) -> Result<&mut Self, Error> {
        let name = name.as_ref();
        if self.files.iter().any(|file| file.name() == name) {
            return Ok(self);
        }

        tracing::trace!(file = name, "opening file");
        let file = self.resolver.open_file(name)?;
        self.files.push(file.into_file_descriptor_proto());
        Ok(self)
    }

    /// Open and parse several files.
    pub fn open_files(
        &mut self,
        names: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<&mut Self, Error> {
        for name in names {
            self.open_file(name)?;
        }
        Ok(self)
    }

    /// Find every `.proto` file under `dir`, and open each by its path relative to `dir`.
    pub fn open_dir(&mut self, dir: impl AsRef<Path>) -> Result<&mut Self, Error> {
        let names = discover(dir.as_ref())?;
        self.open_files(names)
    }

    /// Add an already parsed file.
    pub fn add_file(&mut self, file: FileDescriptorProto) -> &mut Self {
        self.files.push(file);
        self
    }

    /// Add every file of a [`FileDescriptorSet`].
    pub fn add_file_descriptor_set(&mut self, set: FileDescriptorSet) -> &mut Self {
        self.files.extend(set.file);
        self
    }

    /// Decode an encoded [`FileDescriptorSet`] and add all of its files.
    pub fn decode_file_descriptor_set<B>(&mut self, buf: B) -> Result<&mut Self, Error>
    where
        B: Buf,
    {
        let set = FileDescriptorSet::decode(buf).map_err(Error::new)?;
        Ok(self.add_file_descriptor_set(set))
    }

    /// The files added so far, in the order they were added.
    pub fn files(&self) -> &[FileDescriptorProto] {
        &self.files
    }

    /// Merge all added files into a single schema.
    ///
    /// The output is the template, followed by the declarations of every file, with extends
    /// options resolved. The added files themselves are not modified, so this may be called
    /// more than once.
    pub fn generate(&self) -> Result<String, Error> {
        let mut tree = NamespaceTree::build(self.files.clone(), &self.root_package);

        Resolver::new(&mut tree)
            .inherit_options(self.inherit_options)
            .extends_option(&self.extends_option)
            .resolve_all()?;

        let output = Generator::new(&tree)
            .extends_option(&self.extends_option)
            .generate(&self.template);

        tracing::debug!(
            files = self.files.len(),
            messages = tree.registry().len(),
            bytes = output.len(),
            "generated schema"
        );
        Ok(output)
    }
}

impl fmt::Debug for Transpiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transpiler")
            .field("root_package", &self.root_package)
            .field("files", &self.files.len())
            .field("inherit_options", &self.inherit_options)
            .field("extends_option", &self.extends_option)
            .finish_non_exhaustive()
    }
}

/// Merges the given files, opened relative to `includes`, into a single schema.
///
/// This is equivalent to:
///
/// ```rust
/// # use oneproto::Transpiler;
/// # fn main() -> Result<(), oneproto::Error> {
/// # let files: Vec<String> = vec![];
/// # let includes: Vec<std::path::PathBuf> = vec![".".into()];
/// let schema = Transpiler::new(includes, "root")
///     .template("syntax = \"proto3\";\n\npackage root;\n")
///     .open_files(files)?
///     .generate()?;
/// # Ok(())
/// # }
/// ```
pub fn transpile(
    files: impl IntoIterator<Item = impl AsRef<str>>,
    includes: impl IntoIterator<Item = impl AsRef<Path>>,
    root_package: &str,
    template: &str,
) -> Result<String, Error> {
    Transpiler::new(includes, root_package)
        .template(template)
        .open_files(files)?
        .generate()
}
