//! Symbolic name resolution
//!
//! Scripts refer to graphs, state graphs and global objects by name; the
//! binary format stores numeric IDs. The host supplies the mapping through
//! these traits, one capability per trait, bundled per direction and passed
//! explicitly to the compiler or decompiler.

use crate::frontend::lexer::tokens::is_identifier;
use crate::frontend::parser::ast::Reference;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which resolver a lookup went through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolverKind {
    Graph,
    StateGraph,
    GlobalObject,
}

impl fmt::Display for ResolverKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ResolverKind::Graph => write!(f, "graph"),
            ResolverKind::StateGraph => write!(f, "state graph"),
            ResolverKind::GlobalObject => write!(f, "global object"),
        }
    }
}

/// Resolution error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// No resolver installed, or the resolver does not know the name
    #[error("unresolved {kind} `{name}`")]
    Unresolved { kind: ResolverKind, name: String },

    /// The installed resolver has no name for an ID
    #[error("no {kind} name for id {id}")]
    UnknownId { kind: ResolverKind, id: i64 },

    /// The resolver produced text that is neither an identifier nor a number
    #[error("{kind} resolver produced invalid name `{name}`")]
    InvalidName { kind: ResolverKind, name: String },
}

/// Behaviour graph name → graph ID
pub trait GraphResolver {
    fn resolve_graph(
        &self,
        name: &str,
    ) -> Option<u32>;
}

/// State graph name → behaviour index
pub trait StateGraphResolver {
    fn resolve_state_graph(
        &self,
        name: &str,
    ) -> Option<i16>;
}

/// Global object name → global object ID
pub trait GlobalObjectIdResolver {
    fn resolve_object(
        &self,
        name: &str,
    ) -> Option<u16>;
}

/// Graph ID → behaviour graph name
pub trait GraphNameResolver {
    fn graph_name(
        &self,
        id: u32,
    ) -> Option<String>;
}

/// Behaviour index → state graph name
pub trait StateGraphNameResolver {
    fn state_graph_name(
        &self,
        index: i16,
    ) -> Option<String>;
}

/// Global object ID → global object name
pub trait GlobalObjectNameResolver {
    fn object_name(
        &self,
        id: u16,
    ) -> Option<String>;
}

/// Resolvers used while compiling
#[derive(Clone, Copy, Default)]
pub struct CompileResolvers<'r> {
    pub graphs: Option<&'r dyn GraphResolver>,
    pub state_graphs: Option<&'r dyn StateGraphResolver>,
    pub objects: Option<&'r dyn GlobalObjectIdResolver>,
}

impl<'r> CompileResolvers<'r> {
    /// No resolvers: only numeric references compile
    pub fn none() -> Self {
        Self::default()
    }

    /// Use one value for every capability
    pub fn uniform<R>(resolver: &'r R) -> Self
    where
        R: GraphResolver + StateGraphResolver + GlobalObjectIdResolver,
    {
        Self {
            graphs: Some(resolver),
            state_graphs: Some(resolver),
            objects: Some(resolver),
        }
    }

    pub fn with_graphs(
        mut self,
        resolver: &'r dyn GraphResolver,
    ) -> Self {
        self.graphs = Some(resolver);
        self
    }

    pub fn with_state_graphs(
        mut self,
        resolver: &'r dyn StateGraphResolver,
    ) -> Self {
        self.state_graphs = Some(resolver);
        self
    }

    pub fn with_objects(
        mut self,
        resolver: &'r dyn GlobalObjectIdResolver,
    ) -> Self {
        self.objects = Some(resolver);
        self
    }

    /// Graph ID for a name
    pub fn graph_id(
        &self,
        name: &str,
    ) -> Result<i64, ResolutionError> {
        self.graphs
            .and_then(|r| r.resolve_graph(name))
            .map(i64::from)
            .ok_or_else(|| unresolved(ResolverKind::Graph, name))
    }

    /// Numeric value of a graph reference
    pub fn graph(
        &self,
        reference: &Reference,
    ) -> Result<i64, ResolutionError> {
        match reference {
            Reference::Literal(value) => Ok(*value),
            Reference::Symbol(name) => self.graph_id(name),
        }
    }

    /// Numeric value of a state graph reference
    pub fn state_graph(
        &self,
        reference: &Reference,
    ) -> Result<i64, ResolutionError> {
        match reference {
            Reference::Literal(value) => Ok(*value),
            Reference::Symbol(name) => self
                .state_graphs
                .and_then(|r| r.resolve_state_graph(name))
                .map(i64::from)
                .ok_or_else(|| unresolved(ResolverKind::StateGraph, name)),
        }
    }

    /// Numeric value of a global object reference
    pub fn object(
        &self,
        reference: &Reference,
    ) -> Result<i64, ResolutionError> {
        match reference {
            Reference::Literal(value) => Ok(*value),
            Reference::Symbol(name) => self
                .objects
                .and_then(|r| r.resolve_object(name))
                .map(i64::from)
                .ok_or_else(|| unresolved(ResolverKind::GlobalObject, name)),
        }
    }
}

impl fmt::Debug for CompileResolvers<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("CompileResolvers")
            .field("graphs", &self.graphs.is_some())
            .field("state_graphs", &self.state_graphs.is_some())
            .field("objects", &self.objects.is_some())
            .finish()
    }
}

fn unresolved(
    kind: ResolverKind,
    name: &str,
) -> ResolutionError {
    ResolutionError::Unresolved {
        kind,
        name: name.to_string(),
    }
}

/// Resolvers used while decompiling
#[derive(Clone, Copy, Default)]
pub struct DecompileResolvers<'r> {
    pub graphs: Option<&'r dyn GraphNameResolver>,
    pub state_graphs: Option<&'r dyn StateGraphNameResolver>,
    pub objects: Option<&'r dyn GlobalObjectNameResolver>,
}

impl<'r> DecompileResolvers<'r> {
    /// No resolvers: every reference prints as a number
    pub fn none() -> Self {
        Self::default()
    }

    /// Use one value for every capability
    pub fn uniform<R>(resolver: &'r R) -> Self
    where
        R: GraphNameResolver + StateGraphNameResolver + GlobalObjectNameResolver,
    {
        Self {
            graphs: Some(resolver),
            state_graphs: Some(resolver),
            objects: Some(resolver),
        }
    }

    pub fn with_graphs(
        mut self,
        resolver: &'r dyn GraphNameResolver,
    ) -> Self {
        self.graphs = Some(resolver);
        self
    }

    pub fn with_state_graphs(
        mut self,
        resolver: &'r dyn StateGraphNameResolver,
    ) -> Self {
        self.state_graphs = Some(resolver);
        self
    }

    pub fn with_objects(
        mut self,
        resolver: &'r dyn GlobalObjectNameResolver,
    ) -> Self {
        self.objects = Some(resolver);
        self
    }

    /// Reference for a graph ID
    pub fn graph(
        &self,
        id: u32,
    ) -> Result<Reference, ResolutionError> {
        match self.graphs {
            None => Ok(Reference::Literal(i64::from(id))),
            Some(r) => lookup(ResolverKind::Graph, i64::from(id), r.graph_name(id)),
        }
    }

    /// Reference for a behaviour index
    pub fn state_graph(
        &self,
        index: i16,
    ) -> Result<Reference, ResolutionError> {
        match self.state_graphs {
            None => Ok(Reference::Literal(i64::from(index))),
            Some(r) => lookup(ResolverKind::StateGraph, i64::from(index), r.state_graph_name(index)),
        }
    }

    /// Reference for a global object ID
    pub fn object(
        &self,
        id: u16,
    ) -> Result<Reference, ResolutionError> {
        match self.objects {
            None => Ok(Reference::Literal(i64::from(id))),
            Some(r) => lookup(ResolverKind::GlobalObject, i64::from(id), r.object_name(id)),
        }
    }

    /// Identifier naming a graph, if the graph resolver has one
    ///
    /// Numeric answers and a missing resolver give `None`; the caller falls
    /// back to a generated name.
    pub fn graph_identifier(
        &self,
        id: u32,
    ) -> Result<Option<String>, ResolutionError> {
        if self.graphs.is_none() {
            return Ok(None);
        }
        match self.graph(id)? {
            Reference::Symbol(name) => Ok(Some(name)),
            Reference::Literal(_) => Ok(None),
        }
    }
}

impl fmt::Debug for DecompileResolvers<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("DecompileResolvers")
            .field("graphs", &self.graphs.is_some())
            .field("state_graphs", &self.state_graphs.is_some())
            .field("objects", &self.objects.is_some())
            .finish()
    }
}

fn lookup(
    kind: ResolverKind,
    id: i64,
    name: Option<String>,
) -> Result<Reference, ResolutionError> {
    let name = name.ok_or(ResolutionError::UnknownId { kind, id })?;
    reference_from_name(&name).ok_or(ResolutionError::InvalidName { kind, name })
}

/// Interpret resolver output as an identifier or a canonical decimal literal
fn reference_from_name(name: &str) -> Option<Reference> {
    if is_identifier(name) {
        return Some(Reference::Symbol(name.to_string()));
    }
    let value: i64 = name.parse().ok()?;
    (value.to_string() == name).then_some(Reference::Literal(value))
}

/// Resolver that treats names as decimal numbers
///
/// Compiling parses the name, decompiling prints the ID. Useful for
/// self-contained round trips with no asset registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResolver;

impl GraphResolver for DefaultResolver {
    fn resolve_graph(
        &self,
        name: &str,
    ) -> Option<u32> {
        name.parse().ok()
    }
}

impl StateGraphResolver for DefaultResolver {
    fn resolve_state_graph(
        &self,
        name: &str,
    ) -> Option<i16> {
        name.parse().ok()
    }
}

impl GlobalObjectIdResolver for DefaultResolver {
    fn resolve_object(
        &self,
        name: &str,
    ) -> Option<u16> {
        name.parse().ok()
    }
}

impl GraphNameResolver for DefaultResolver {
    fn graph_name(
        &self,
        id: u32,
    ) -> Option<String> {
        Some(id.to_string())
    }
}

impl StateGraphNameResolver for DefaultResolver {
    fn state_graph_name(
        &self,
        index: i16,
    ) -> Option<String> {
        Some(index.to_string())
    }
}

impl GlobalObjectNameResolver for DefaultResolver {
    fn object_name(
        &self,
        id: u16,
    ) -> Option<String> {
        Some(id.to_string())
    }
}

/// Bidirectional name ↔ ID table built up front
///
/// Serializes as a plain `name = id` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IndexMap<String, i64>", into = "IndexMap<String, i64>")]
pub struct SymbolMap {
    by_name: IndexMap<String, i64>,
    by_id: IndexMap<i64, String>,
}

impl SymbolMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping; a later entry for the same name or ID replaces it
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        id: i64,
    ) {
        let name = name.into();
        if let Some(old_id) = self.by_name.insert(name.clone(), id) {
            self.by_id.shift_remove(&old_id);
        }
        if let Some(old_name) = self.by_id.insert(id, name.clone()) {
            if old_name != name {
                self.by_name.shift_remove(&old_name);
            }
        }
    }

    pub fn id(
        &self,
        name: &str,
    ) -> Option<i64> {
        self.by_name.get(name).copied()
    }

    pub fn name(
        &self,
        id: i64,
    ) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl From<IndexMap<String, i64>> for SymbolMap {
    fn from(entries: IndexMap<String, i64>) -> Self {
        let mut map = SymbolMap::new();
        for (name, id) in entries {
            map.insert(name, id);
        }
        map
    }
}

impl From<SymbolMap> for IndexMap<String, i64> {
    fn from(map: SymbolMap) -> Self {
        map.by_name
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for SymbolMap {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        let mut map = SymbolMap::new();
        for (name, id) in iter {
            map.insert(name, id);
        }
        map
    }
}

impl GraphResolver for SymbolMap {
    fn resolve_graph(
        &self,
        name: &str,
    ) -> Option<u32> {
        self.id(name).and_then(|id| u32::try_from(id).ok())
    }
}

impl StateGraphResolver for SymbolMap {
    fn resolve_state_graph(
        &self,
        name: &str,
    ) -> Option<i16> {
        self.id(name).and_then(|id| i16::try_from(id).ok())
    }
}

impl GlobalObjectIdResolver for SymbolMap {
    fn resolve_object(
        &self,
        name: &str,
    ) -> Option<u16> {
        self.id(name).and_then(|id| u16::try_from(id).ok())
    }
}

impl GraphNameResolver for SymbolMap {
    fn graph_name(
        &self,
        id: u32,
    ) -> Option<String> {
        self.name(i64::from(id)).map(str::to_string)
    }
}

impl StateGraphNameResolver for SymbolMap {
    fn state_graph_name(
        &self,
        index: i16,
    ) -> Option<String> {
        self.name(i64::from(index)).map(str::to_string)
    }
}

impl GlobalObjectNameResolver for SymbolMap {
    fn object_name(
        &self,
        id: u16,
    ) -> Option<String> {
        self.name(i64::from(id)).map(str::to_string)
    }
}

/// One symbol table per resolver capability, as loaded from a symbols file
///
/// Only the tables present in the file are installed; a missing table leaves
/// that capability without a resolver, so decompiling prints raw numbers.
///
/// ```toml
/// [graphs]
/// Patrol = 12
///
/// [state_graphs]
/// Walk = 3
///
/// [objects]
/// Crate = 400
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphs: Option<SymbolMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_graphs: Option<SymbolMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objects: Option<SymbolMap>,
}

impl ResolverSet {
    /// Parse a TOML symbols file
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    pub fn compile_resolvers(&self) -> CompileResolvers<'_> {
        CompileResolvers {
            graphs: self.graphs.as_ref().map(|m| m as &dyn GraphResolver),
            state_graphs: self.state_graphs.as_ref().map(|m| m as &dyn StateGraphResolver),
            objects: self.objects.as_ref().map(|m| m as &dyn GlobalObjectIdResolver),
        }
    }

    pub fn decompile_resolvers(&self) -> DecompileResolvers<'_> {
        DecompileResolvers {
            graphs: self.graphs.as_ref().map(|m| m as &dyn GraphNameResolver),
            state_graphs: self.state_graphs.as_ref().map(|m| m as &dyn StateGraphNameResolver),
            objects: self.objects.as_ref().map(|m| m as &dyn GlobalObjectNameResolver),
        }
    }
}
