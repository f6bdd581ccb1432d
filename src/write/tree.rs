//! In-memory write tree
//!
//! An ordered tree of nodes rooted at the volume root. Parents own
//! their children; the synthetic `.` and `..` records are materialized
//! only during emission. Nodes are addressed by index into one arena so
//! the planner can hold several views of the tree at once.

use crate::error::{IsoError, Result};
use crate::utils::datetime::RecordDateTime;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// POSIX metadata attached to a node at ingestion time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMetadata {
    /// File mode bits
    pub mode: Option<u32>,

    /// Owner uid
    pub uid: Option<u32>,

    /// Owner gid
    pub gid: Option<u32>,

    /// Link count
    pub links: Option<u32>,

    /// Creation time
    pub created: Option<RecordDateTime>,

    /// Modification time
    pub modified: Option<RecordDateTime>,
}

/// What a tree node is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A directory
    Directory,
    /// A regular file of known size
    File {
        /// Declared content size in bytes
        size: u64,
    },
    /// A symbolic link
    Symlink {
        /// Link target path
        target: String,
    },
}

/// One node of the write tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Name of this node within its parent (empty for the root)
    pub name: String,

    /// Index of the parent node (the root is its own parent)
    pub parent: usize,

    /// Node kind
    pub kind: NodeKind,

    /// Metadata recorded for this node
    pub metadata: NodeMetadata,

    /// Children by raw name; the map keeps them name-sorted
    pub children: BTreeMap<String, usize>,
}

impl TreeNode {
    /// Whether the node is a directory
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory)
    }
}

/// Arena-backed tree with node 0 as the volume root
#[derive(Debug, Clone)]
pub struct WriteTree {
    nodes: Vec<TreeNode>,
}

/// Index of the root node
pub const ROOT: usize = 0;

impl WriteTree {
    /// An empty tree holding only the root directory
    pub fn new() -> Self {
        Self {
            nodes: alloc::vec![TreeNode {
                name: String::new(),
                parent: ROOT,
                kind: NodeKind::Directory,
                metadata: NodeMetadata::default(),
                children: BTreeMap::new(),
            }],
        }
    }

    /// Node by index
    pub fn node(&self, id: usize) -> &TreeNode {
        &self.nodes[id]
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether only the root exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Children of a directory in raw-name order
    pub fn children(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        self.nodes[id].children.values().copied()
    }

    /// Full volume path of a node (`/A/HELLO.TXT` style)
    pub fn path_of(&self, id: usize) -> String {
        if id == ROOT {
            return String::from("/");
        }
        let mut parts = Vec::new();
        let mut current = id;
        while current != ROOT {
            parts.push(self.nodes[current].name.clone());
            current = self.nodes[current].parent;
        }
        parts.reverse();
        let mut path = String::new();
        for part in parts {
            path.push('/');
            path.push_str(&part);
        }
        path
    }

    /// Add a directory, creating missing parents
    pub fn add_directory(&mut self, path: &str, metadata: NodeMetadata) -> Result<usize> {
        self.insert(path, NodeKind::Directory, metadata)
    }

    /// Add a file of the given size, creating missing parents
    pub fn add_file(&mut self, path: &str, size: u64, metadata: NodeMetadata) -> Result<usize> {
        if size > u32::MAX as u64 {
            return Err(IsoError::InvalidArgument {
                name: "size",
                message: "multi-extent files (> 4 GiB) are not supported",
            });
        }
        self.insert(path, NodeKind::File { size }, metadata)
    }

    /// Add a symlink, creating missing parents
    pub fn add_symlink(
        &mut self,
        path: &str,
        target: &str,
        metadata: NodeMetadata,
    ) -> Result<usize> {
        if target.is_empty() {
            return Err(IsoError::InvalidArgument {
                name: "target",
                message: "must not be empty",
            });
        }
        self.insert(
            path,
            NodeKind::Symlink {
                target: String::from(target),
            },
            metadata,
        )
    }

    fn insert(&mut self, path: &str, kind: NodeKind, metadata: NodeMetadata) -> Result<usize> {
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        if components.is_empty() {
            return Err(IsoError::InvalidArgument {
                name: "path",
                message: "must name at least one component",
            });
        }
        if components.iter().any(|c| *c == "." || *c == "..") {
            return Err(IsoError::InvalidArgument {
                name: "path",
                message: "`.` and `..` components are not allowed",
            });
        }

        let mut parent = ROOT;
        for component in &components[..components.len() - 1] {
            parent = match self.nodes[parent].children.get(*component) {
                Some(&child) => {
                    if !self.nodes[child].is_directory() {
                        return Err(IsoError::InvalidArgument {
                            name: "path",
                            message: "intermediate component is not a directory",
                        });
                    }
                    child
                }
                None => self.push_child(parent, component, NodeKind::Directory,
                    NodeMetadata::default()),
            };
        }

        let name = components[components.len() - 1];
        if let Some(&existing) = self.nodes[parent].children.get(name) {
            let same_kind = matches!(
                (&self.nodes[existing].kind, &kind),
                (NodeKind::Directory, NodeKind::Directory)
                    | (NodeKind::File { .. }, NodeKind::File { .. })
                    | (NodeKind::Symlink { .. }, NodeKind::Symlink { .. })
            );
            if !same_kind {
                return Err(IsoError::InvalidArgument {
                    name: "path",
                    message: "node exists with a different kind",
                });
            }
            // Re-adding an existing node updates its metadata only.
            self.nodes[existing].metadata = metadata;
            return Ok(existing);
        }

        Ok(self.push_child(parent, name, kind, metadata))
    }

    fn push_child(
        &mut self,
        parent: usize,
        name: &str,
        kind: NodeKind,
        metadata: NodeMetadata,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            name: String::from(name),
            parent,
            kind,
            metadata,
            children: BTreeMap::new(),
        });
        self.nodes[parent].children.insert(String::from(name), id);
        id
    }
}

impl Default for WriteTree {
    fn default() -> Self {
        Self::new()
    }
}
