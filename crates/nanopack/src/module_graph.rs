use arcstr::ArcStr;
use nanopack_common::{
  BlockIdx, Connection, ConnectionIdx, DependencyIdx, ModuleIdx, OptimizationBailout, UsedExports,
};
use nanopack_error::{BuildError, BuildResult};
use nanopack_utils::indexmap::FxIndexSet;
use oxc_index::IndexVec;
use rustc_hash::FxHashMap;

/// Per-module bookkeeping, created lazily on first touch.
#[derive(Debug, Default)]
pub struct ModuleGraphModule {
  pub incoming_connections: FxIndexSet<ConnectionIdx>,
  pub outgoing_connections: FxIndexSet<ConnectionIdx>,
  pub issuer: Option<ModuleIdx>,
  pub optimization_bailout: Vec<OptimizationBailout>,
  pub used_exports: UsedExports,
}

/// Per-dependency bookkeeping, created lazily on first touch. A dependency
/// maps to at most one live connection at a time.
#[derive(Debug, Default)]
pub struct DependencyRecord {
  pub connection: Option<ConnectionIdx>,
  pub parent_module: Option<ModuleIdx>,
  pub parent_block: Option<BlockIdx>,
}

/// Identity key for ad-hoc cross-cutting metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKey {
  Module(ModuleIdx),
  Dependency(DependencyIdx),
  Block(BlockIdx),
}

pub type Meta = FxHashMap<ArcStr, serde_json::Value>;

/// The module dependency graph: a central connection store plus per-module
/// and per-dependency derived records.
///
/// The incoming/outgoing index sets store connection ids, never edge data,
/// so repointing an edge updates the store once and moves one id between the
/// affected sets. Invariant: a live connection is a member of its target's
/// incoming set and, when it has an origin, of the origin's outgoing set.
#[derive(Debug, Default)]
pub struct ModuleGraph {
  connections: IndexVec<ConnectionIdx, Connection>,
  modules: FxHashMap<ModuleIdx, ModuleGraphModule>,
  dependencies: FxHashMap<DependencyIdx, DependencyRecord>,
  meta: FxHashMap<MetaKey, Meta>,
}

impl ModuleGraph {
  fn module_record_mut(&mut self, module: ModuleIdx) -> &mut ModuleGraphModule {
    self.modules.entry(module).or_default()
  }

  fn dependency_record_mut(&mut self, dependency: DependencyIdx) -> &mut DependencyRecord {
    self.dependencies.entry(dependency).or_default()
  }

  /// Records the lexical owner of a dependency. Overwrites any previous
  /// parent linkage.
  pub fn set_parents(&mut self, dependency: DependencyIdx, block: BlockIdx, module: ModuleIdx) {
    let record = self.dependency_record_mut(dependency);
    record.parent_block = Some(block);
    record.parent_module = Some(module);
  }

  pub fn parent_module(&self, dependency: DependencyIdx) -> Option<ModuleIdx> {
    self.dependencies.get(&dependency).and_then(|record| record.parent_module)
  }

  pub fn parent_block(&self, dependency: DependencyIdx) -> Option<BlockIdx> {
    self.dependencies.get(&dependency).and_then(|record| record.parent_block)
  }

  /// Creates a connection for `dependency` targeting `module` and indexes it
  /// on both sides. Does not clean up a previous connection of the same
  /// dependency; callers re-resolving a dependency go through
  /// [remove_connection](Self::remove_connection) first.
  pub fn set_resolved_module(
    &mut self,
    origin_module: Option<ModuleIdx>,
    dependency: DependencyIdx,
    module: ModuleIdx,
  ) {
    let idx = self.connections.push(Connection::new(origin_module, Some(dependency), module));
    self.dependency_record_mut(dependency).connection = Some(idx);
    self.module_record_mut(module).incoming_connections.insert(idx);
    if let Some(origin) = origin_module {
      self.module_record_mut(origin).outgoing_connections.insert(idx);
    }
  }

  /// Repoints the dependency's connection at `new_module`, moving it between
  /// the incoming sets. No-op if it already targets `new_module`.
  pub fn update_module(
    &mut self,
    dependency: DependencyIdx,
    new_module: ModuleIdx,
  ) -> BuildResult<()> {
    let idx = self.expect_connection_idx(dependency)?;
    let old_module = self.connections[idx].module;
    if old_module == new_module {
      return Ok(());
    }
    self.connections[idx].module = new_module;
    self.module_record_mut(old_module).incoming_connections.shift_remove(&idx);
    self.module_record_mut(new_module).incoming_connections.insert(idx);
    Ok(())
  }

  /// Appends a justification to the dependency's connection.
  pub fn add_explanation(
    &mut self,
    dependency: DependencyIdx,
    explanation: ArcStr,
  ) -> BuildResult<()> {
    let idx = self.expect_connection_idx(dependency)?;
    self.connections[idx].add_explanation(explanation);
    Ok(())
  }

  /// Moves every connection of `old_module` accepted by `filter` over to
  /// `new_module`, on both the origin and the target side. No-op when both
  /// modules are the same.
  pub fn replace_module(
    &mut self,
    old_module: ModuleIdx,
    new_module: ModuleIdx,
    filter: impl Fn(&Connection) -> bool,
  ) {
    if old_module == new_module {
      return;
    }
    tracing::debug!(?old_module, ?new_module, "replace module in graph");

    let outgoing = self
      .modules
      .get(&old_module)
      .map(|record| record.outgoing_connections.iter().copied().collect::<Vec<_>>())
      .unwrap_or_default();
    for idx in outgoing {
      if filter(&self.connections[idx]) {
        self.connections[idx].origin_module = Some(new_module);
        self.module_record_mut(old_module).outgoing_connections.shift_remove(&idx);
        self.module_record_mut(new_module).outgoing_connections.insert(idx);
      }
    }

    let incoming = self
      .modules
      .get(&old_module)
      .map(|record| record.incoming_connections.iter().copied().collect::<Vec<_>>())
      .unwrap_or_default();
    for idx in incoming {
      if filter(&self.connections[idx]) {
        self.connections[idx].module = new_module;
        self.module_record_mut(old_module).incoming_connections.shift_remove(&idx);
        self.module_record_mut(new_module).incoming_connections.insert(idx);
      }
    }
  }

  /// Inserts a synthetic incoming connection with no origin and no
  /// dependency, justifying the module's retention for reasons outside the
  /// dependency graph.
  pub fn add_extra_reason(&mut self, module: ModuleIdx, explanation: ArcStr) {
    let mut connection = Connection::new(None, None, module);
    connection.add_explanation(explanation);
    let idx = self.connections.push(connection);
    self.module_record_mut(module).incoming_connections.insert(idx);
  }

  /// Detaches the dependency's connection from both index sets and clears
  /// the per-dependency slot. Returns false if there was no connection.
  pub fn remove_connection(&mut self, dependency: DependencyIdx) -> bool {
    let Some(idx) = self.connection_idx(dependency) else {
      return false;
    };
    let (module, origin) = {
      let connection = &self.connections[idx];
      (connection.module, connection.origin_module)
    };
    self.module_record_mut(module).incoming_connections.shift_remove(&idx);
    if let Some(origin) = origin {
      self.module_record_mut(origin).outgoing_connections.shift_remove(&idx);
    }
    self.dependency_record_mut(dependency).connection = None;
    true
  }

  pub fn connection_idx(&self, dependency: DependencyIdx) -> Option<ConnectionIdx> {
    self.dependencies.get(&dependency).and_then(|record| record.connection)
  }

  pub fn connection(&self, dependency: DependencyIdx) -> Option<&Connection> {
    self.connection_idx(dependency).map(|idx| &self.connections[idx])
  }

  pub fn connection_by_idx(&self, idx: ConnectionIdx) -> &Connection {
    &self.connections[idx]
  }

  /// Snapshot of every connection in the store, live and detached alike, for
  /// debugging and tests.
  pub fn connections(&self) -> impl Iterator<Item = &Connection> {
    self.connections.iter()
  }

  pub fn module(&self, dependency: DependencyIdx) -> Option<ModuleIdx> {
    self.connection(dependency).map(|connection| connection.module)
  }

  /// The connection's raw stored target, before any caller-side indirection.
  pub fn resolved_module(&self, dependency: DependencyIdx) -> Option<ModuleIdx> {
    self.module(dependency)
  }

  pub fn origin(&self, dependency: DependencyIdx) -> Option<ModuleIdx> {
    self.connection(dependency).and_then(|connection| connection.origin_module)
  }

  pub fn resolved_origin(&self, dependency: DependencyIdx) -> Option<ModuleIdx> {
    self.origin(dependency)
  }

  pub fn incoming_connections(&self, module: ModuleIdx) -> impl Iterator<Item = &Connection> {
    self
      .modules
      .get(&module)
      .into_iter()
      .flat_map(|record| record.incoming_connections.iter().map(|idx| &self.connections[*idx]))
  }

  pub fn outgoing_connections(&self, module: ModuleIdx) -> impl Iterator<Item = &Connection> {
    self
      .modules
      .get(&module)
      .into_iter()
      .flat_map(|record| record.outgoing_connections.iter().map(|idx| &self.connections[*idx]))
  }

  /// Which module first caused this module to be requested.
  pub fn issuer(&self, module: ModuleIdx) -> Option<ModuleIdx> {
    self.modules.get(&module).and_then(|record| record.issuer)
  }

  pub fn set_issuer(&mut self, module: ModuleIdx, issuer: Option<ModuleIdx>) {
    self.module_record_mut(module).issuer = issuer;
  }

  pub fn optimization_bailout(&self, module: ModuleIdx) -> &[OptimizationBailout] {
    self.modules.get(&module).map_or(&[][..], |record| &record.optimization_bailout)
  }

  /// Live diagnostic list, callers append to it directly.
  pub fn optimization_bailout_mut(&mut self, module: ModuleIdx) -> &mut Vec<OptimizationBailout> {
    &mut self.module_record_mut(module).optimization_bailout
  }

  pub fn used_exports(&self, module: ModuleIdx) -> &UsedExports {
    self.modules.get(&module).map_or(&UsedExports::Unknown, |record| &record.used_exports)
  }

  /// No lattice-transition validation happens here; the optimization pass is
  /// responsible for monotonicity if it needs it.
  pub fn set_used_exports(&mut self, module: ModuleIdx, used_exports: UsedExports) {
    self.module_record_mut(module).used_exports = used_exports;
  }

  pub fn meta(&self, key: MetaKey) -> Option<&Meta> {
    self.meta.get(&key)
  }

  /// The same key yields the same record for the life of the graph.
  pub fn meta_mut(&mut self, key: MetaKey) -> &mut Meta {
    self.meta.entry(key).or_default()
  }

  fn expect_connection_idx(&self, dependency: DependencyIdx) -> BuildResult<ConnectionIdx> {
    self
      .connection_idx(dependency)
      .ok_or_else(|| BuildError::from_message(format!("dependency {dependency:?} has no connection")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn idx(raw: u32) -> ModuleIdx {
    ModuleIdx::from_raw(raw)
  }

  #[test]
  fn untouched_dependency_yields_nothing() {
    let graph = ModuleGraph::default();
    let dep = idx(0);
    assert_eq!(graph.module(dep), None);
    assert_eq!(graph.origin(dep), None);
    assert!(graph.connection(dep).is_none());
    assert_eq!(graph.parent_module(dep), None);
    assert_eq!(graph.parent_block(dep), None);
  }

  #[test]
  fn set_resolved_module_indexes_both_sides() {
    let mut graph = ModuleGraph::default();
    let (a, b, dep) = (idx(0), idx(1), idx(0));
    graph.set_resolved_module(Some(a), dep, b);

    assert_eq!(graph.module(dep), Some(b));
    assert_eq!(graph.resolved_module(dep), Some(b));
    assert_eq!(graph.origin(dep), Some(a));
    assert_eq!(graph.resolved_origin(dep), Some(a));
    assert_eq!(graph.incoming_connections(b).count(), 1);
    assert_eq!(graph.outgoing_connections(a).count(), 1);
    assert_eq!(graph.incoming_connections(a).count(), 0);
  }

  #[test]
  fn update_module_moves_incoming_membership() {
    let mut graph = ModuleGraph::default();
    let (a, b, c, dep) = (idx(0), idx(1), idx(2), idx(0));
    graph.set_resolved_module(Some(a), dep, b);
    graph.update_module(dep, c).unwrap();

    assert_eq!(graph.module(dep), Some(c));
    assert_eq!(graph.incoming_connections(b).count(), 0);
    assert_eq!(graph.incoming_connections(c).count(), 1);
    // origin side untouched
    assert_eq!(graph.outgoing_connections(a).count(), 1);

    // repointing at the current target is a no-op
    graph.update_module(dep, c).unwrap();
    assert_eq!(graph.incoming_connections(c).count(), 1);
  }

  #[test]
  fn update_module_without_connection_fails() {
    let mut graph = ModuleGraph::default();
    let error = graph.update_module(idx(0), idx(1)).unwrap_err();
    assert!(error[0].to_string().contains("no connection"));
  }

  #[test]
  fn connections_snapshot_covers_the_whole_store() {
    let mut graph = ModuleGraph::default();
    let (a, b, dep) = (idx(0), idx(1), idx(0));
    assert_eq!(graph.connections().count(), 0);

    graph.set_resolved_module(Some(a), dep, b);
    graph.add_extra_reason(b, arcstr::literal!("entry point"));
    assert_eq!(graph.connections().count(), 2);

    // detaching keeps the record in the store snapshot
    graph.remove_connection(dep);
    assert_eq!(graph.connections().count(), 2);
    assert_eq!(graph.incoming_connections(b).count(), 1);
  }

  #[test]
  fn add_explanation_accumulates() {
    let mut graph = ModuleGraph::default();
    let (a, b, dep) = (idx(0), idx(1), idx(0));
    assert!(graph.add_explanation(dep, arcstr::literal!("too early")).is_err());

    graph.set_resolved_module(Some(a), dep, b);
    graph.add_explanation(dep, arcstr::literal!("used by entry")).unwrap();
    graph.add_explanation(dep, arcstr::literal!("kept by side effect")).unwrap();
    let connection = graph.connection(dep).unwrap();
    assert_eq!(connection.explanations().len(), 2);
    assert_eq!(connection.explanation().unwrap(), "used by entry kept by side effect");
  }

  #[test]
  fn replace_module_same_module_is_noop() {
    let mut graph = ModuleGraph::default();
    let (a, b, dep) = (idx(0), idx(1), idx(0));
    graph.set_resolved_module(Some(a), dep, b);
    graph.replace_module(a, a, |_| true);
    assert_eq!(graph.outgoing_connections(a).count(), 1);
    assert_eq!(graph.origin(dep), Some(a));
  }

  #[test]
  fn replace_module_moves_filtered_connections() {
    let mut graph = ModuleGraph::default();
    let (a, b, c, d) = (idx(0), idx(1), idx(2), idx(3));
    let (dep0, dep1, dep2) = (idx(0), idx(1), idx(2));
    // a -> b, a -> c, b -> a
    graph.set_resolved_module(Some(a), dep0, b);
    graph.set_resolved_module(Some(a), dep1, c);
    graph.set_resolved_module(Some(b), dep2, a);

    // move only the a -> b edge and every incoming edge of a over to d
    graph.replace_module(a, d, |connection| connection.module != c);

    assert_eq!(graph.origin(dep0), Some(d));
    assert_eq!(graph.origin(dep1), Some(a));
    assert_eq!(graph.module(dep2), Some(d));
    assert_eq!(graph.outgoing_connections(a).count(), 1);
    assert_eq!(graph.outgoing_connections(d).count(), 1);
    assert_eq!(graph.incoming_connections(a).count(), 0);
    assert_eq!(graph.incoming_connections(d).count(), 1);
  }

  #[test]
  fn extra_reason_is_a_synthetic_incoming_connection() {
    let mut graph = ModuleGraph::default();
    let module = idx(0);
    graph.add_extra_reason(module, arcstr::literal!("entry point"));

    let connections = graph.incoming_connections(module).collect::<Vec<_>>();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].origin_module, None);
    assert_eq!(connections[0].dependency, None);
    assert_eq!(connections[0].explanation().unwrap(), "entry point");
  }

  #[test]
  fn remove_connection_detaches_both_sides() {
    let mut graph = ModuleGraph::default();
    let (a, b, dep) = (idx(0), idx(1), idx(0));
    graph.set_resolved_module(Some(a), dep, b);

    assert!(graph.remove_connection(dep));
    assert!(!graph.remove_connection(dep));
    assert_eq!(graph.module(dep), None);
    assert_eq!(graph.incoming_connections(b).count(), 0);
    assert_eq!(graph.outgoing_connections(a).count(), 0);
  }

  #[test]
  fn parents_are_overwritten_idempotently() {
    let mut graph = ModuleGraph::default();
    let (dep, block_a, block_b, m) = (idx(0), idx(0), idx(1), idx(0));
    graph.set_parents(dep, block_a, m);
    graph.set_parents(dep, block_b, m);
    assert_eq!(graph.parent_block(dep), Some(block_b));
    assert_eq!(graph.parent_module(dep), Some(m));
  }

  #[test]
  fn issuer_roundtrip() {
    let mut graph = ModuleGraph::default();
    let (a, b) = (idx(0), idx(1));
    assert_eq!(graph.issuer(a), None);
    graph.set_issuer(a, Some(b));
    assert_eq!(graph.issuer(a), Some(b));
    graph.set_issuer(a, None);
    assert_eq!(graph.issuer(a), None);
  }

  #[test]
  fn used_exports_defaults_to_unknown() {
    let mut graph = ModuleGraph::default();
    let module = idx(0);
    assert_eq!(*graph.used_exports(module), UsedExports::Unknown);

    graph.set_used_exports(module, UsedExports::Unused);
    assert_eq!(*graph.used_exports(module), UsedExports::Unused);
    assert_ne!(*graph.used_exports(module), UsedExports::FullNamespace);
    assert_ne!(
      *graph.used_exports(module),
      UsedExports::OnlyNames(nanopack_utils::indexmap::FxIndexSet::default())
    );
  }

  #[test]
  fn optimization_bailout_is_appendable() {
    let mut graph = ModuleGraph::default();
    let module = idx(0);
    assert!(graph.optimization_bailout(module).is_empty());
    graph
      .optimization_bailout_mut(module)
      .push(OptimizationBailout::Message("CommonJS bailout".to_string()));
    assert_eq!(graph.optimization_bailout(module).len(), 1);
  }

  #[test]
  fn meta_records_are_stable_per_key() {
    let mut graph = ModuleGraph::default();
    let key = MetaKey::Module(idx(0));
    let other = MetaKey::Dependency(idx(0));

    graph.meta_mut(key).insert(arcstr::literal!("seen"), serde_json::json!(true));
    assert_eq!(graph.meta_mut(key).len(), 1);
    assert!(graph.meta_mut(other).is_empty());
    assert_eq!(graph.meta(key).unwrap().len(), 1);
    assert!(graph.meta(MetaKey::Block(idx(0))).is_none());
  }
}
