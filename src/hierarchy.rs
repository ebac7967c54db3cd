//! Turns flat export rows into the set of hierarchy nodes that should be
//! materialized, plus the side tables the emitter needs to link them to
//! objects that already exist elsewhere (rows carrying their own uid).

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::path::{HierPath, PATH_SEPARATOR};

/// One row of an equipment export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// The raw separator-delimited path cell.
    pub path: String,
    /// Identifier of an object that already exists in the target model.
    pub external_id: Option<String>,
    /// Plant coding system code for the node.
    pub inventory_code: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Record {
    /// Blank optional cells are normalized to `None`.
    pub fn new(path: &str, external_id: Option<&str>, inventory_code: Option<&str>) -> Record {
        Record {
            path: path.trim().to_string(),
            external_id: non_empty(external_id),
            inventory_code: non_empty(inventory_code),
        }
    }
}

/// What to do with rows that carry their own external identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttachmentPolicy {
    /// The row is never materialized; the rows directly below it use its uid
    /// as their parent reference and its own parent lists the uid as a child.
    #[default]
    VirtualContainer,
    /// The row is never materialized; its uid is listed as a child of its
    /// parent.  Rows below it are not re-parented.
    ExternalChild,
}

#[derive(Clone, Debug)]
pub struct HierarchyOptions {
    pub separator: char,
    /// Consulted by the batch driver: convert the built-in sample rows when
    /// there is no input file at all.
    pub fallback_on_missing_file: bool,
    pub policy: AttachmentPolicy,
}

impl Default for HierarchyOptions {
    fn default() -> Self {
        HierarchyOptions {
            separator: PATH_SEPARATOR,
            fallback_on_missing_file: false,
            policy: AttachmentPolicy::default(),
        }
    }
}

/// Resolver output.  Immutable once built; the emitter only reads it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedHierarchy {
    pub policy: AttachmentPolicy,
    /// Sorted, deduplicated.  Never contains a path that carries a uid.
    pub paths_to_create: Vec<HierPath>,
    /// Persisted parent -> uids of externally owned children, first seen first.
    pub external_children: BTreeMap<HierPath, Vec<String>>,
    pub inventory_codes: BTreeMap<HierPath, String>,
    /// Child path -> uid of the virtual container standing in as its parent.
    pub virtual_parents: BTreeMap<HierPath, String>,
}

impl ResolvedHierarchy {
    pub fn is_empty(&self) -> bool {
        self.paths_to_create.is_empty()
    }

    pub fn external_child_count(&self) -> usize {
        self.external_children.values().map(Vec::len).sum()
    }
}

/// Adds `path` and every ancestor not listed in `skip` to `into`.
fn add_with_ancestors(
    path: &HierPath,
    skip: &HashMap<HierPath, String>,
    into: &mut BTreeSet<HierPath>,
) {
    for ancestor in path.ancestors() {
        if !skip.contains_key(&ancestor) {
            into.insert(ancestor);
        }
    }
    if !skip.contains_key(path) {
        into.insert(path.clone());
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

pub fn resolve(records: &[Record], options: &HierarchyOptions) -> ResolvedHierarchy {
    let mut rows = Vec::with_capacity(records.len());
    let mut inventory_codes = BTreeMap::new();
    let mut external_ids: HashMap<HierPath, String> = HashMap::new();

    for (i, record) in records.iter().enumerate() {
        let path = match HierPath::parse(&record.path, options.separator) {
            Some(path) => path,
            None => {
                debug!(row = i, raw = %record.path, "skipping row with an empty path");
                continue;
            }
        };

        // Codes are kept even for dropped rows; the path may still be created
        // as an ancestor of another row.
        if let Some(code) = &record.inventory_code {
            inventory_codes.insert(path.clone(), code.clone());
        }
        if let Some(uid) = &record.external_id {
            if path.is_root() {
                warn!(%path, %uid, "uid on a root-level row has no parent to attach to; row dropped");
                continue;
            }
            external_ids.insert(path.clone(), uid.clone());
        }
        rows.push(path);
    }

    let resolved = match options.policy {
        AttachmentPolicy::VirtualContainer => {
            resolve_virtual_containers(&rows, &external_ids, inventory_codes)
        }
        AttachmentPolicy::ExternalChild => {
            resolve_external_children(&rows, &external_ids, inventory_codes)
        }
    };

    info!(
        policy = ?resolved.policy,
        paths = resolved.paths_to_create.len(),
        external_children = resolved.external_child_count(),
        inventory_codes = resolved.inventory_codes.len(),
        virtual_parents = resolved.virtual_parents.len(),
        "resolved hierarchy"
    );

    resolved
}

fn resolve_virtual_containers(
    rows: &[HierPath],
    external_ids: &HashMap<HierPath, String>,
    inventory_codes: BTreeMap<HierPath, String>,
) -> ResolvedHierarchy {
    let mut to_create = BTreeSet::new();
    let mut external_children: BTreeMap<HierPath, Vec<String>> = BTreeMap::new();
    let mut seen_virtual = HashSet::new();

    for path in rows {
        // Every row, virtual or not, needs its non-virtual ancestors.
        add_with_ancestors(path, external_ids, &mut to_create);

        if let Some(uid) = external_ids.get(path) {
            if !seen_virtual.insert(path.clone()) {
                continue;
            }
            // Roots never make it into `external_ids`, so there is a parent.
            if let Some(parent) = path.parent() {
                if !external_ids.contains_key(&parent) {
                    push_unique(external_children.entry(parent).or_default(), uid);
                }
            }
        }
    }

    let virtual_parents = to_create
        .iter()
        .filter_map(|path| {
            let parent = path.parent()?;
            external_ids
                .get(&parent)
                .map(|uid| (path.clone(), uid.clone()))
        })
        .collect();

    ResolvedHierarchy {
        policy: AttachmentPolicy::VirtualContainer,
        paths_to_create: to_create.into_iter().collect(),
        external_children,
        inventory_codes,
        virtual_parents,
    }
}

fn resolve_external_children(
    rows: &[HierPath],
    external_ids: &HashMap<HierPath, String>,
    inventory_codes: BTreeMap<HierPath, String>,
) -> ResolvedHierarchy {
    let mut to_create = BTreeSet::new();
    let mut external_children: BTreeMap<HierPath, Vec<String>> = BTreeMap::new();

    for path in rows {
        match (external_ids.get(path), path.parent()) {
            (Some(uid), Some(parent)) => {
                if let Some(parent_uid) = external_ids.get(&parent) {
                    warn!(
                        %path,
                        %uid,
                        %parent_uid,
                        "parent also carries a uid and is never created; row dropped"
                    );
                    continue;
                }
                add_with_ancestors(&parent, external_ids, &mut to_create);
                push_unique(external_children.entry(parent).or_default(), uid);
            }
            _ => add_with_ancestors(path, external_ids, &mut to_create),
        }
    }

    ResolvedHierarchy {
        policy: AttachmentPolicy::ExternalChild,
        paths_to_create: to_create.into_iter().collect(),
        external_children,
        inventory_codes,
        virtual_parents: BTreeMap::new(),
    }
}
