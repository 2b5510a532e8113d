//! Merging of fields inherited through extends options.
//!
//! A message with an option such as `option (oneproto.extends) = "pkg.Parent";` receives a copy
//! of every field of `pkg.Parent` (after `pkg.Parent` has itself been resolved), and the option
//! is removed. The merged field list is sorted by field number.

use std::{
    collections::HashMap,
    fmt::{self, Write},
};

use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, UninterpretedOption};

use crate::{
    error::ErrorKind,
    generate::map_entry,
    namespace::{trim_root_package, MessageId, MessageRegistry, NamespaceTree},
    options::{self, is_extends_directive, DEFAULT_EXTENDS_OPTION},
    Error,
};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InProgress,
    Done,
}

/// Resolves extends options for the messages of a [`NamespaceTree`], modifying them in place.
///
/// Each message is resolved at most once per resolver. Resolution state is owned by the
/// resolver, so independent trees can be resolved with independent resolvers.
pub struct Resolver<'a> {
    files: &'a mut [FileDescriptorProto],
    registry: &'a MessageRegistry,
    root_package: &'a str,
    extends_option: &'a str,
    inherit_options: bool,
    state: HashMap<MessageId, State>,
    stack: Vec<String>,
}

#[derive(Default)]
struct Inherited {
    fields: Vec<FieldDescriptorProto>,
    options: Vec<UninterpretedOption>,
    map_entries: Vec<DescriptorProto>,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver for the messages of `tree`.
    pub fn new(tree: &'a mut NamespaceTree) -> Self {
        let (files, registry, root_package) = tree.parts_mut();
        Resolver {
            files,
            registry,
            root_package,
            extends_option: DEFAULT_EXTENDS_OPTION,
            inherit_options: false,
            state: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Set whether messages also inherit the options of the messages they extend.
    pub fn inherit_options(&mut self, yes: bool) -> &mut Self {
        self.inherit_options = yes;
        self
    }

    /// Set the name of the option that marks a message as extending another.
    pub fn extends_option(&mut self, name: &'a str) -> &mut Self {
        self.extends_option = name;
        self
    }

    /// Resolves every message, in declaration order.
    pub fn resolve_all(&mut self) -> Result<(), Error> {
        let registry = self.registry;
        for (name, id) in registry.iter() {
            self.resolve_message(id, name)?;
        }
        Ok(())
    }

    /// Resolves the message with the given fully-qualified name.
    ///
    /// Returns `false` if there is no such message. Resolving a message more than once has no
    /// further effect.
    pub fn resolve(&mut self, name: &str) -> Result<bool, Error> {
        let name = trim_root_package(name, self.root_package);
        let registry = self.registry;
        match registry.get(name) {
            Some(id) => {
                self.resolve_nested(id, name)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Resolves a message and then each of its nested messages.
    fn resolve_nested(&mut self, id: &MessageId, name: &str) -> Result<(), Error> {
        self.resolve_message(id, name)?;

        let nested_names: Vec<String> = id
            .get(self.files)
            .nested_type
            .iter()
            .map(|nested| format!("{}.{}", name, nested.name()))
            .collect();
        for (index, nested_name) in nested_names.iter().enumerate() {
            self.resolve_nested(&id.nested(index), nested_name)?;
        }
        Ok(())
    }

    /// Resolves the extends options of a single message. Nested messages are not visited, so
    /// only genuine inheritance chains are tracked on the stack.
    fn resolve_message(&mut self, id: &MessageId, name: &str) -> Result<(), Error> {
        match self.state.get(id) {
            Some(State::Done) => return Ok(()),
            Some(State::InProgress) => return Err(self.cycle_error(name)),
            None => (),
        }

        self.state.insert(id.clone(), State::InProgress);
        self.stack.push(name.to_owned());

        let declared = id
            .get(self.files)
            .options
            .as_ref()
            .map(|options| options.uninterpreted_option.clone())
            .unwrap_or_default();

        let mut kept = Vec::with_capacity(declared.len());
        let mut inherited = Inherited::default();
        for option in declared {
            if is_extends_directive(&option, self.extends_option) {
                self.inherit(name, &option, &mut inherited)?;
            } else {
                kept.push(option);
            }
        }

        let message = id.get_mut(self.files);
        if self.inherit_options {
            kept.extend(inherited.options);
        }
        if !kept.is_empty() || message.options.is_some() {
            message
                .options
                .get_or_insert_with(Default::default)
                .uninterpreted_option = kept;
        }

        message.field.extend(inherited.fields);
        message.field.sort_by_key(|field| field.number());

        for entry in inherited.map_entries {
            if !message
                .nested_type
                .iter()
                .any(|nested| nested.name() == entry.name())
            {
                message.nested_type.push(entry);
            }
        }

        self.stack.pop();
        self.state.insert(id.clone(), State::Done);
        Ok(())
    }

    fn inherit(
        &mut self,
        name: &str,
        option: &UninterpretedOption,
        inherited: &mut Inherited,
    ) -> Result<(), Error> {
        let target = match options::string_value(option) {
            Some(value) => trim_root_package(value, self.root_package).to_owned(),
            None => {
                return Err(Error::from_kind(ErrorKind::InvalidExtends {
                    message: name.to_owned(),
                    option: options::option_name(option),
                }))
            }
        };

        let registry = self.registry;
        let parent_id = registry.get(&target).ok_or_else(|| {
            Error::from_kind(ErrorKind::ExtendsNotFound {
                message: name.to_owned(),
                name: target.clone(),
            })
        })?;
        self.resolve_message(parent_id, &target)?;

        let parent = parent_id.get(self.files);
        tracing::debug!(
            name = %name,
            parent = %target,
            fields = parent.field.len(),
            "inheriting fields"
        );

        for field in &parent.field {
            if let Some(entry) = map_entry(&parent.nested_type, field) {
                if !inherited
                    .map_entries
                    .iter()
                    .any(|existing| existing.name() == entry.name())
                {
                    inherited.map_entries.push(entry.clone());
                }
            }
            inherited.fields.push(field.clone());
        }

        if let Some(parent_options) = &parent.options {
            inherited.options.extend(
                parent_options
                    .uninterpreted_option
                    .iter()
                    .filter(|option| !is_extends_directive(option, self.extends_option))
                    .cloned(),
            );
        }

        Ok(())
    }

    fn cycle_error(&self, name: &str) -> Error {
        let start = self
            .stack
            .iter()
            .position(|entry| entry == name)
            .unwrap_or(0);

        let mut cycle = String::new();
        for entry in &self.stack[start..] {
            let _ = write!(&mut cycle, "{} -> ", entry);
        }
        cycle.push_str(name);

        Error::from_kind(ErrorKind::ExtendsCycle {
            message: name.to_owned(),
            cycle,
        })
    }
}

impl<'a> fmt::Debug for Resolver<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("root_package", &self.root_package)
            .field("extends_option", &self.extends_option)
            .field("inherit_options", &self.inherit_options)
            .field("resolved", &self.state.len())
            .finish_non_exhaustive()
    }
}
