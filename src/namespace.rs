//! Grouping of files into a tree of namespaces, one node per package name segment.

use std::collections::{btree_map, hash_map, BTreeMap, HashMap};

use prost_types::{DescriptorProto, FileDescriptorProto};

/// The location of a message within the files of a [`NamespaceTree`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId {
    file: usize,
    index: usize,
    nested: Vec<usize>,
}

impl MessageId {
    /// The index of the file declaring this message.
    pub fn file(&self) -> usize {
        self.file
    }

    pub(crate) fn nested(&self, index: usize) -> MessageId {
        let mut nested = self.nested.clone();
        nested.push(index);
        MessageId {
            file: self.file,
            index: self.index,
            nested,
        }
    }

    pub(crate) fn get<'a>(&self, files: &'a [FileDescriptorProto]) -> &'a DescriptorProto {
        self.nested.iter().fold(
            &files[self.file].message_type[self.index],
            |message, &index| &message.nested_type[index],
        )
    }

    pub(crate) fn get_mut<'a>(
        &self,
        files: &'a mut [FileDescriptorProto],
    ) -> &'a mut DescriptorProto {
        self.nested.iter().fold(
            &mut files[self.file].message_type[self.index],
            |message, &index| &mut message.nested_type[index],
        )
    }
}

/// A lookup table of every message in a set of files, keyed by fully-qualified name relative to
/// the root package.
#[derive(Debug, Default)]
pub struct MessageRegistry {
    names: HashMap<String, MessageId>,
    messages: Vec<(String, MessageId)>,
}

impl MessageRegistry {
    /// Looks up a message by its fully-qualified name. A leading `.` is ignored.
    pub fn get(&self, name: &str) -> Option<&MessageId> {
        self.names.get(name.strip_prefix('.').unwrap_or(name))
    }

    /// Iterates all messages, including nested messages, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MessageId)> {
        self.messages.iter().map(|(name, id)| (name.as_str(), id))
    }

    /// The number of registered messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if no messages are registered.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn add(&mut self, name: String, id: MessageId) {
        match self.names.entry(name.clone()) {
            hash_map::Entry::Vacant(entry) => {
                entry.insert(id.clone());
            }
            hash_map::Entry::Occupied(mut entry) => {
                tracing::warn!(
                    name = %name,
                    "message is defined more than once, the last definition is used for extends lookups"
                );
                entry.insert(id.clone());
            }
        }
        self.messages.push((name, id));
    }

    fn add_messages(&mut self, scope: &str, id: &MessageId, messages: &[DescriptorProto]) {
        for (index, message) in messages.iter().enumerate() {
            let id = id.nested(index);
            let name = join_name(scope, message.name());
            self.add(name.clone(), id.clone());
            self.add_messages(&name, &id, &message.nested_type);
        }
    }
}

/// A node of the namespace tree.
///
/// Every node except the root corresponds to one segment of a package name, and is rendered
/// as a message wrapping the declarations of its files and child namespaces.
#[derive(Debug, Default)]
pub struct NamespaceNode {
    name: Option<String>,
    files: Vec<usize>,
    children: BTreeMap<String, NamespaceNode>,
}

impl NamespaceNode {
    /// The package name segment of this node, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Indices of the files whose package is exactly the path to this node.
    pub fn files(&self) -> &[usize] {
        &self.files
    }

    /// Gets a child namespace by name.
    pub fn child(&self, name: &str) -> Option<&NamespaceNode> {
        self.children.get(name)
    }

    /// Iterates child namespaces, ordered by name.
    pub fn children(&self) -> impl Iterator<Item = &NamespaceNode> {
        self.children.values()
    }

    fn child_mut(&mut self, name: &str) -> &mut NamespaceNode {
        match self.children.entry(name.to_owned()) {
            btree_map::Entry::Occupied(entry) => entry.into_mut(),
            btree_map::Entry::Vacant(entry) => entry.insert(NamespaceNode {
                name: Some(name.to_owned()),
                ..Default::default()
            }),
        }
    }
}

/// A set of files grouped by package, along with a registry of all the messages they declare.
#[derive(Debug)]
pub struct NamespaceTree {
    root_package: String,
    files: Vec<FileDescriptorProto>,
    root: NamespaceNode,
    registry: MessageRegistry,
}

impl NamespaceTree {
    /// Groups `files` into a tree by package name.
    ///
    /// Files in `root_package` (or with no package) are attached to the root node. For other
    /// files, the `root_package` prefix is removed and a node is created for each remaining
    /// segment of the package name.
    pub fn build(files: Vec<FileDescriptorProto>, root_package: &str) -> Self {
        let mut root = NamespaceNode::default();
        let mut registry = MessageRegistry::default();

        for (file_index, file) in files.iter().enumerate() {
            tracing::trace!(file = file.name(), package = file.package(), "adding file");

            let path = namespace_path(file.package(), root_package);
            let node = path
                .iter()
                .fold(&mut root, |node, segment| node.child_mut(segment));
            node.files.push(file_index);

            let scope = path.join(".");
            for (index, message) in file.message_type.iter().enumerate() {
                let id = MessageId {
                    file: file_index,
                    index,
                    nested: Vec::new(),
                };
                let name = join_name(&scope, message.name());
                registry.add(name.clone(), id.clone());
                registry.add_messages(&name, &id, &message.nested_type);
            }
        }

        NamespaceTree {
            root_package: root_package.to_owned(),
            files,
            root,
            registry,
        }
    }

    /// The package whose files are attached directly to the root node.
    pub fn root_package(&self) -> &str {
        &self.root_package
    }

    /// The root node of the tree.
    pub fn root(&self) -> &NamespaceNode {
        &self.root
    }

    /// All files, indexed by [`NamespaceNode::files`].
    pub fn files(&self) -> &[FileDescriptorProto] {
        &self.files
    }

    /// The registry of all messages declared in the files.
    pub fn registry(&self) -> &MessageRegistry {
        &self.registry
    }

    /// Looks up a message by its fully-qualified name.
    pub fn message(&self, name: &str) -> Option<&DescriptorProto> {
        self.registry.get(name).map(|id| id.get(&self.files))
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut [FileDescriptorProto], &MessageRegistry, &str) {
        (&mut self.files, &self.registry, &self.root_package)
    }
}

/// Removes a leading `.` and the `root_package` prefix from a fully-qualified name.
pub fn trim_root_package<'a>(name: &'a str, root_package: &str) -> &'a str {
    let name = name.strip_prefix('.').unwrap_or(name);
    if root_package.is_empty() {
        return name;
    }

    name.strip_prefix(root_package)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(name)
}

fn namespace_path<'a>(package: &'a str, root_package: &str) -> Vec<&'a str> {
    if package.is_empty() || package == root_package {
        return Vec::new();
    }

    trim_root_package(package, root_package)
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect()
}

fn join_name(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_owned()
    } else {
        format!("{}.{}", scope, name)
    }
}
