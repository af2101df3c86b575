//! The persistent dependency graph.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use strata_common::{Ident, Interner};
use strata_model::{ItemCollection, LayoutCollection, ObjectId};

use crate::error::DependencyStoreError;
use crate::props::DependencyProps;

/// File name of the persisted graph within the state directory.
const STORE_FILE: &str = "dependencies.json";

/// One recorded dependency: `from` depends on the listed properties of `to`.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyEdge {
    /// The depending object.
    pub from: ObjectId,
    /// The depended-upon object.
    pub to: ObjectId,
    /// Which properties of `to` the dependency covers.
    pub props: DependencyProps,
}

/// Directed graph of dependencies between content objects.
///
/// Edges accumulate property flags; recording the same pair twice unions
/// the flags rather than replacing them. The graph persists across runs and
/// may be stored at any point mid-run: suspension edges must survive a run
/// that aborts right after they are recorded.
///
/// The store also remembers which items and layouts existed when it was
/// last persisted. After loading, [`refresh_members`](Self::refresh_members)
/// compares that membership against the current site to answer "which
/// members are new since last run" — the query behind collection
/// outdatedness. Removals never produce new members.
#[derive(Debug)]
pub struct DependencyStore {
    graph: StableDiGraph<ObjectId, DependencyProps>,
    nodes: HashMap<ObjectId, NodeIndex>,
    previous_items: Option<BTreeSet<String>>,
    previous_layouts: Option<BTreeSet<String>>,
    current_items: BTreeSet<String>,
    current_layouts: BTreeSet<String>,
    new_items: Vec<Ident>,
    new_layouts: Vec<Ident>,
}

impl DependencyStore {
    /// Creates an empty store with no previous-run state.
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            nodes: HashMap::new(),
            previous_items: None,
            previous_layouts: None,
            current_items: BTreeSet::new(),
            current_layouts: BTreeSet::new(),
            new_items: Vec::new(),
            new_layouts: Vec::new(),
        }
    }

    fn node(&mut self, obj: ObjectId) -> NodeIndex {
        match self.nodes.get(&obj) {
            Some(&idx) => idx,
            None => {
                let idx = self.graph.add_node(obj);
                self.nodes.insert(obj, idx);
                idx
            }
        }
    }

    /// Records that `from` depends on the given properties of `to`.
    ///
    /// Flags union into any existing edge. Self-dependencies are ignored.
    /// Returns `true` if an edge was created or widened.
    pub fn record_dependency(
        &mut self,
        from: ObjectId,
        to: ObjectId,
        props: DependencyProps,
    ) -> bool {
        if from == to {
            return false;
        }
        let a = self.node(from);
        let b = self.node(to);
        match self.graph.find_edge(a, b) {
            Some(edge) => {
                self.graph[edge].merge(&props);
            }
            None => {
                self.graph.add_edge(a, b, props);
            }
        }
        true
    }

    /// The outgoing edges of `obj` — the dependencies that can make it
    /// outdated — in recording order.
    pub fn dependencies_causing_outdatedness_of(&self, obj: ObjectId) -> Vec<DependencyEdge> {
        let Some(&idx) = self.nodes.get(&obj) else {
            return Vec::new();
        };
        let mut edges: Vec<DependencyEdge> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| DependencyEdge {
                from: obj,
                to: self.graph[e.target()],
                props: e.weight().clone(),
            })
            .collect();
        // petgraph yields newest-first; present recording order instead
        edges.reverse();
        edges
    }

    /// The objects `obj` depends on, in recording order.
    pub fn objects_causing_outdatedness_of(&self, obj: ObjectId) -> Vec<ObjectId> {
        self.dependencies_causing_outdatedness_of(obj)
            .into_iter()
            .map(|e| e.to)
            .collect()
    }

    /// Drops all outgoing edges of `obj`.
    ///
    /// Called for objects about to recompile, whose reads will re-record
    /// their dependencies from scratch. Incoming edges are untouched.
    pub fn forget_dependencies_of(&mut self, obj: ObjectId) {
        let Some(&idx) = self.nodes.get(&obj) else {
            return;
        };
        let edge_ids: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.id())
            .collect();
        for id in edge_ids {
            self.graph.remove_edge(id);
        }
    }

    /// Total number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Compares the current site membership against the persisted one.
    ///
    /// Must be called after [`load`](Self::load) and before outdatedness
    /// checking. On a first run (nothing persisted) no member counts as
    /// new.
    pub fn refresh_members(
        &mut self,
        items: &ItemCollection,
        layouts: &LayoutCollection,
        interner: &Interner,
    ) {
        self.current_items = items
            .identifiers()
            .iter()
            .map(|id| interner.resolve(*id).to_string())
            .collect();
        self.current_layouts = layouts
            .identifiers()
            .iter()
            .map(|id| interner.resolve(*id).to_string())
            .collect();

        self.new_items = match &self.previous_items {
            None => Vec::new(),
            Some(prev) => self
                .current_items
                .difference(prev)
                .map(|s| interner.get_or_intern(s))
                .collect(),
        };
        self.new_layouts = match &self.previous_layouts {
            None => Vec::new(),
            Some(prev) => self
                .current_layouts
                .difference(prev)
                .map(|s| interner.get_or_intern(s))
                .collect(),
        };
    }

    /// Items present now but absent when the store was last persisted.
    pub fn new_items(&self) -> &[Ident] {
        &self.new_items
    }

    /// Layouts present now but absent when the store was last persisted.
    pub fn new_layouts(&self) -> &[Ident] {
        &self.new_layouts
    }

    fn store_path(dir: &Path) -> PathBuf {
        dir.join(STORE_FILE)
    }

    /// Loads the persisted graph from `dir`.
    ///
    /// A missing file yields an empty store with no previous membership; a
    /// corrupt file is an error, never silently an empty store.
    pub fn load(dir: &Path, interner: &Interner) -> Result<Self, DependencyStoreError> {
        let path = Self::store_path(dir);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(DependencyStoreError::Io { path, source: e }),
        };
        let file: StoreFile =
            serde_json::from_str(&raw).map_err(|e| DependencyStoreError::Corrupted {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let mut store = Self::new();
        for edge in file.edges {
            let from = ObjectId::parse(&edge.from, interner).ok_or_else(|| {
                DependencyStoreError::Corrupted {
                    path: path.clone(),
                    reason: format!("unknown object identity `{}`", edge.from),
                }
            })?;
            let to = ObjectId::parse(&edge.to, interner).ok_or_else(|| {
                DependencyStoreError::Corrupted {
                    path: path.clone(),
                    reason: format!("unknown object identity `{}`", edge.to),
                }
            })?;
            store.record_dependency(from, to, edge.props);
        }
        store.previous_items = Some(file.items.into_iter().collect());
        store.previous_layouts = Some(file.layouts.into_iter().collect());
        Ok(store)
    }

    /// Persists the graph and the current membership to `dir`.
    ///
    /// Safe to call repeatedly mid-run; the scheduler does so after every
    /// suspension so that edges recorded before an aborted run survive it.
    pub fn store(&self, dir: &Path, interner: &Interner) -> Result<(), DependencyStoreError> {
        std::fs::create_dir_all(dir).map_err(|e| DependencyStoreError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let mut edges = Vec::with_capacity(self.graph.edge_count());
        for edge in self.graph.edge_references() {
            edges.push(EdgeFile {
                from: self.graph[edge.source()].describe(interner),
                to: self.graph[edge.target()].describe(interner),
                props: edge.weight().clone(),
            });
        }
        let file = StoreFile {
            edges,
            items: self.current_items.iter().cloned().collect(),
            layouts: self.current_layouts.iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| {
            DependencyStoreError::Serialization {
                reason: e.to_string(),
            }
        })?;
        let path = Self::store_path(dir);
        std::fs::write(&path, json).map_err(|e| DependencyStoreError::Io { path, source: e })
    }
}

impl Default for DependencyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    edges: Vec<EdgeFile>,
    items: Vec<String>,
    layouts: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct EdgeFile {
    from: String,
    to: String,
    props: DependencyProps,
}
