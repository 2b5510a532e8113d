//! Rendering of a resolved [`NamespaceTree`] as protobuf source text.

mod field;

pub use self::field::{field_line, field_type, map_entry};

use std::fmt::{self, Write};

use prost_types::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    ServiceDescriptorProto, UninterpretedOption,
};

use crate::{
    fmt::Indent,
    namespace::{NamespaceNode, NamespaceTree},
    options::{is_extends_directive, stringify, value_options, DEFAULT_EXTENDS_OPTION},
};

#[cfg(test)]
mod tests;

/// Writes the declarations of a [`NamespaceTree`] as a single protobuf source file.
///
/// Each namespace other than the root is written as a message wrapping the enums, services,
/// messages and extensions of its files, followed by its child namespaces.
#[derive(Debug)]
pub struct Generator<'a> {
    tree: &'a NamespaceTree,
    extends_option: &'a str,
    buf: String,
}

impl<'a> Generator<'a> {
    /// Creates a generator for `tree`.
    pub fn new(tree: &'a NamespaceTree) -> Self {
        Generator {
            tree,
            extends_option: DEFAULT_EXTENDS_OPTION,
            buf: String::new(),
        }
    }

    /// Set the name of the extends option, which is never written to the output.
    pub fn extends_option(&mut self, name: &'a str) -> &mut Self {
        self.extends_option = name;
        self
    }

    /// Writes `template` verbatim, followed by the declarations of the tree.
    pub fn generate(&mut self, template: &str) -> String {
        self.buf.clear();
        self.buf.push_str(template);
        if !template.is_empty() {
            if !template.ends_with('\n') {
                self.buf.push('\n');
            }
            self.buf.push('\n');
        }

        let tree = self.tree;
        self.node(tree.root(), 0);

        std::mem::take(&mut self.buf)
    }

    fn node(&mut self, node: &NamespaceNode, depth: usize) {
        let tree = self.tree;
        let inner = match node.name() {
            Some(name) => {
                tracing::debug!(namespace = name, depth, "generating namespace");
                self.line(depth, format_args!("message {} {{", name));
                depth + 1
            }
            None => depth,
        };

        let files: Vec<&FileDescriptorProto> = node
            .files()
            .iter()
            .map(|&index| &tree.files()[index])
            .collect();

        let mut first = true;
        for enum_ in files.iter().flat_map(|file| &file.enum_type) {
            self.separate(&mut first);
            self.enum_(enum_, inner);
        }
        for service in files.iter().flat_map(|file| &file.service) {
            self.separate(&mut first);
            self.service(service, inner);
        }
        for message in files.iter().flat_map(|file| &file.message_type) {
            self.separate(&mut first);
            self.message(message, inner);
        }

        let extensions: Vec<&FieldDescriptorProto> =
            files.iter().flat_map(|file| &file.extension).collect();
        self.extensions(&extensions, &[], inner, &mut first);

        for child in node.children() {
            self.separate(&mut first);
            self.node(child, inner);
        }

        if node.name().is_some() {
            self.line(depth, format_args!("}}"));
        }
    }

    fn message(&mut self, message: &DescriptorProto, depth: usize) {
        self.line(depth, format_args!("message {} {{", message.name()));
        let inner = depth + 1;

        let mut first = true;
        self.head_options(
            message
                .options
                .as_ref()
                .map_or(&[][..], |options| &options.uninterpreted_option[..]),
            inner,
            &mut first,
        );

        if !message.field.is_empty() {
            self.separate(&mut first);
            for field in &message.field {
                self.line(
                    inner,
                    format_args!("{}", field_line(&message.nested_type, field)),
                );
            }
        }

        for enum_ in &message.enum_type {
            self.separate(&mut first);
            self.enum_(enum_, inner);
        }

        for nested in &message.nested_type {
            if is_map_entry(nested) {
                continue;
            }
            self.separate(&mut first);
            self.message(nested, inner);
        }

        let extensions: Vec<&FieldDescriptorProto> = message.extension.iter().collect();
        self.extensions(&extensions, &message.nested_type, inner, &mut first);

        self.line(depth, format_args!("}}"));
    }

    fn enum_(&mut self, enum_: &EnumDescriptorProto, depth: usize) {
        self.line(depth, format_args!("enum {} {{", enum_.name()));
        let inner = depth + 1;

        let mut first = true;
        self.head_options(
            enum_
                .options
                .as_ref()
                .map_or(&[][..], |options| &options.uninterpreted_option[..]),
            inner,
            &mut first,
        );

        if !enum_.value.is_empty() {
            self.separate(&mut first);
            for value in &enum_.value {
                let options = value
                    .options
                    .as_ref()
                    .map_or(&[][..], |options| &options.uninterpreted_option[..]);
                self.line(
                    inner,
                    format_args!(
                        "{} = {}{};",
                        value.name(),
                        value.number(),
                        value_options(options)
                    ),
                );
            }
        }

        self.line(depth, format_args!("}}"));
    }

    fn service(&mut self, service: &ServiceDescriptorProto, depth: usize) {
        self.line(depth, format_args!("service {} {{", service.name()));
        let inner = depth + 1;

        let mut first = true;
        self.head_options(
            service
                .options
                .as_ref()
                .map_or(&[][..], |options| &options.uninterpreted_option[..]),
            inner,
            &mut first,
        );

        for method in &service.method {
            self.separate(&mut first);

            let input = Streaming(method.client_streaming(), method.input_type());
            let output = Streaming(method.server_streaming(), method.output_type());
            let options = method
                .options
                .as_ref()
                .map_or(&[][..], |options| &options.uninterpreted_option[..]);

            if options.is_empty() {
                self.line(
                    inner,
                    format_args!("rpc {}({}) returns ({});", method.name(), input, output),
                );
            } else {
                self.line(
                    inner,
                    format_args!("rpc {}({}) returns ({}) {{", method.name(), input, output),
                );
                for option in options {
                    self.line(inner + 1, format_args!("option {};", stringify(option)));
                }
                self.line(inner, format_args!("}}"));
            }
        }

        self.line(depth, format_args!("}}"));
    }

    /// Writes one `extend` block per extendee, in order of first appearance.
    fn extensions(
        &mut self,
        fields: &[&FieldDescriptorProto],
        scope: &[DescriptorProto],
        depth: usize,
        first: &mut bool,
    ) {
        let mut groups: Vec<(&str, Vec<&FieldDescriptorProto>)> = Vec::new();
        for &field in fields {
            match groups
                .iter_mut()
                .find(|(extendee, _)| *extendee == field.extendee())
            {
                Some((_, group)) => group.push(field),
                None => groups.push((field.extendee(), vec![field])),
            }
        }

        for (extendee, fields) in groups {
            self.separate(first);
            self.line(depth, format_args!("extend {} {{", extendee));
            for field in fields {
                self.line(depth + 1, format_args!("{}", field_line(scope, field)));
            }
            self.line(depth, format_args!("}}"));
        }
    }

    fn head_options(&mut self, options: &[UninterpretedOption], depth: usize, first: &mut bool) {
        let extends_option = self.extends_option;
        let mut options = options
            .iter()
            .filter(|option| !is_extends_directive(option, extends_option))
            .peekable();
        if options.peek().is_none() {
            return;
        }

        self.separate(first);
        for option in options {
            self.line(depth, format_args!("option {};", stringify(option)));
        }
    }

    fn separate(&mut self, first: &mut bool) {
        if !*first {
            self.buf.push('\n');
        }
        *first = false;
    }

    fn line(&mut self, depth: usize, args: fmt::Arguments) {
        let _ = writeln!(self.buf, "{}{}", Indent(depth), args);
    }
}

struct Streaming<'a>(bool, &'a str);

impl<'a> fmt::Display for Streaming<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 {
            write!(f, "stream {}", self.1)
        } else {
            f.write_str(self.1)
        }
    }
}

fn is_map_entry(message: &DescriptorProto) -> bool {
    message
        .options
        .as_ref()
        .map_or(false, |options| options.map_entry())
}
