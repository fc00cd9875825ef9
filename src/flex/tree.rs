//! Directory tree rebuilt from the flat entry paths of an archive.

use std::collections::BTreeMap;

/// A node of the rebuilt tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Directory(BTreeMap<String, Node>),
    /// Index into the archive's entry list
    File(usize),
}

impl Node {
    pub fn new_root() -> Self {
        Node::Directory(BTreeMap::new())
    }

    /// Insert a file at a `/`-separated path, creating every intermediate
    /// directory. When a path is used both as a file and as a directory the
    /// later insertion replaces the earlier one.
    pub fn insert(&mut self, path: &str, index: usize) {
        let mut segments = path.split('/').peekable();
        let mut node = self;
        while let Some(segment) = segments.next() {
            if !matches!(node, Node::Directory(_)) {
                *node = Node::new_root();
            }
            let Node::Directory(children) = node else {
                return;
            };
            if segments.peek().is_none() {
                children.insert(segment.to_string(), Node::File(index));
                return;
            }
            node = children
                .entry(segment.to_string())
                .or_insert_with(Node::new_root);
        }
    }

    /// Look up the node at a `/`-separated path; `""` is this node.
    pub fn get(&self, path: &str) -> Option<&Node> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('/').try_fold(self, |node, segment| match node {
            Node::Directory(children) => children.get(segment),
            Node::File(_) => None,
        })
    }

    /// Every file below this node as (path relative to this node, index),
    /// depth first.
    pub fn files(&self) -> Vec<(String, usize)> {
        let mut out = Vec::new();
        let mut stack = vec![(String::new(), self)];
        while let Some((prefix, node)) = stack.pop() {
            match node {
                Node::File(index) => out.push((prefix, *index)),
                Node::Directory(children) => {
                    // Reverse so siblings come out in name order
                    for (name, child) in children.iter().rev() {
                        let path = if prefix.is_empty() {
                            name.clone()
                        } else {
                            format!("{prefix}/{name}")
                        };
                        stack.push((path, child));
                    }
                }
            }
        }
        out
    }
}
