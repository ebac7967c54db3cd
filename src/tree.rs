//! In-memory node tree rebuilt from a `ResolvedHierarchy` for a single
//! generation run.  Edges come purely from set membership of the created
//! paths; identifiers are minted fresh every time.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};
use uuid::Uuid;

use crate::errors::{ConvertError, Result};
use crate::hierarchy::ResolvedHierarchy;
use crate::path::HierPath;

/// How many times a colliding identifier is re-minted before giving up.
const MAX_MINT_ATTEMPTS: usize = 8;

/// Source of element identifiers (`rdf:about` values).
pub trait IdMinter {
    fn mint(&mut self) -> String;
}

/// Mints `#_<uuid v4>` identifiers.
#[derive(Debug, Default)]
pub struct UuidMinter;

impl IdMinter for UuidMinter {
    fn mint(&mut self) -> String {
        format!("#_{}", Uuid::new_v4())
    }
}

/// Element category of a node.  Roots are always containers.  Any other node
/// is a container when it has a reconstructed child or lists at least one
/// external child, under either attachment policy, so that its
/// `ChildObjects` links are emitted; otherwise it is a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Container,
    Leaf,
}

/// Where a node's `ParentObject` points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParentRef {
    /// The externally supplied object the whole hierarchy hangs off.
    RootParent,
    /// A virtual container's uid.
    External(String),
    /// Another node in this tree, by index.
    Node(usize),
}

#[derive(Clone, Debug)]
pub struct TreeNode {
    pub path: HierPath,
    pub id: String,
    pub category: Category,
    pub parent: ParentRef,
    /// Indices of reconstructed children, in path order.
    pub children: Vec<usize>,
    pub external_children: Vec<String>,
    pub inventory_code: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NodeTree {
    /// Same order as `ResolvedHierarchy::paths_to_create`.
    pub nodes: Vec<TreeNode>,
}

impl NodeTree {
    pub fn build(resolved: &ResolvedHierarchy, minter: &mut dyn IdMinter) -> Result<NodeTree> {
        if resolved.is_empty() {
            return Err(ConvertError::EmptyInput);
        }

        let paths = &resolved.paths_to_create;
        let index: HashMap<&HierPath, usize> =
            paths.iter().enumerate().map(|(i, p)| (p, i)).collect();

        // ## Edge reconstruction
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); paths.len()];
        let mut parents: Vec<Option<usize>> = vec![None; paths.len()];
        for path in paths {
            for split in 1..path.len() {
                let parent = index.get(&path.prefix(split));
                let child = index.get(&path.prefix(split + 1));
                if let (Some(&parent), Some(&child)) = (parent, child) {
                    if !children[parent].contains(&child) {
                        children[parent].push(child);
                    }
                    parents[child] = Some(parent);
                }
            }
        }
        for list in children.iter_mut() {
            list.sort_unstable();
        }

        let ids = assign_ids(paths.len(), minter)?;

        let nodes = paths
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let external_children = resolved
                    .external_children
                    .get(path)
                    .cloned()
                    .unwrap_or_default();

                let category =
                    if path.is_root() || !children[i].is_empty() || !external_children.is_empty() {
                        Category::Container
                    } else {
                        Category::Leaf
                    };

                let parent = if path.is_root() {
                    ParentRef::RootParent
                } else if let Some(uid) = resolved.virtual_parents.get(path) {
                    ParentRef::External(uid.clone())
                } else if let Some(parent) = parents[i] {
                    ParentRef::Node(parent)
                } else {
                    debug!(%path, "no parent among created paths; linking to the root parent");
                    ParentRef::RootParent
                };

                TreeNode {
                    path: path.clone(),
                    id: ids[i].clone(),
                    category,
                    parent,
                    children: std::mem::take(&mut children[i]),
                    external_children,
                    inventory_code: resolved.inventory_codes.get(path).cloned(),
                }
            })
            .collect::<Vec<_>>();

        Ok(NodeTree { nodes })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Mint one identifier per node, refusing duplicates.
fn assign_ids(count: usize, minter: &mut dyn IdMinter) -> Result<Vec<String>> {
    let mut used = HashSet::with_capacity(count);
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let mut attempts = 0;
        let id = loop {
            let candidate = minter.mint();
            if used.insert(candidate.clone()) {
                break candidate;
            }
            attempts += 1;
            trace!(%candidate, attempts, "identifier collision");
            if attempts >= MAX_MINT_ATTEMPTS {
                return Err(ConvertError::Generation(format!(
                    "identifier source kept returning already assigned ids (last: {})",
                    candidate
                )));
            }
        };
        ids.push(id);
    }
    Ok(ids)
}
