use arcstr::ArcStr;
use itertools::Itertools;
use nanopack_common::{
  Chunk, ChunkGroup, ChunkGroupKind, ChunkGroupOptions, ChunkGroupTable, ChunkIdx, ChunkTable,
  GroupIdx, HashUpdate, ModuleIdx, ORDER_KEY_SUFFIX,
};
use nanopack_utils::indexmap::{FxIndexMap, FxIndexSet};
use rustc_hash::{FxHashMap, FxHashSet};

/// Id-keyed projections over a chunk's async chunks, consumed by runtime
/// code generation. A pure view, building it never mutates the graph.
#[derive(Debug, Default)]
pub struct ChunkMaps {
  pub hashes: FxIndexMap<ArcStr, ArcStr>,
  pub content_hashes: FxIndexMap<ArcStr, FxIndexMap<ArcStr, ArcStr>>,
  pub names: FxIndexMap<ArcStr, ArcStr>,
}

/// The chunk/chunk-group topology: chunk membership in groups, the group
/// parent/child adjacency across async boundaries, and the traversal,
/// ordering and hashing queries over it. Owns the chunk debug-id counter.
#[derive(Debug, Default)]
pub struct ChunkGraph {
  pub chunks: ChunkTable,
  pub groups: ChunkGroupTable,
  next_debug_id: u32,
}

impl ChunkGraph {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn create_chunk(&mut self, name: Option<ArcStr>) -> ChunkIdx {
    let debug_id = self.next_debug_id;
    self.next_debug_id += 1;
    self.chunks.push(Chunk::new(debug_id, name))
  }

  pub fn create_group(&mut self, kind: ChunkGroupKind, options: ChunkGroupOptions) -> GroupIdx {
    self.groups.push(ChunkGroup::new(kind, options))
  }

  /// Appends the chunk to the group and records the membership on the chunk,
  /// keeping both sides in agreement. Returns false if already connected.
  pub fn connect_chunk_and_group(&mut self, chunk: ChunkIdx, group: GroupIdx) -> bool {
    if !self.chunks[chunk].add_group(group) {
      return false;
    }
    self.groups[group].insert_chunk(chunk, None);
    true
  }

  pub fn connect_group_parent_child(&mut self, parent: GroupIdx, child: GroupIdx) {
    self.groups[parent].children.insert(child);
    self.groups[child].parents.insert(parent);
  }

  /// Removes the chunk from every group it belongs to, on both sides.
  pub fn disconnect_chunk_from_groups(&mut self, chunk: ChunkIdx) {
    tracing::debug!(?chunk, "disconnect chunk from all groups");
    let groups = std::mem::take(&mut self.chunks[chunk].groups);
    for group in groups {
      self.groups[group].remove_chunk(chunk);
    }
  }

  /// Inserts `new_chunk` directly next to `chunk` in every group `chunk`
  /// belongs to, for dividing one chunk's content across two output chunks
  /// that must occupy the same position everywhere.
  pub fn split_chunk(&mut self, chunk: ChunkIdx, new_chunk: ChunkIdx) {
    let groups = self.chunks[chunk].groups.iter().copied().collect::<Vec<_>>();
    for group in groups {
      self.groups[group].insert_chunk(new_chunk, Some(chunk));
      self.chunks[new_chunk].add_group(group);
    }
  }

  pub fn add_module_to_chunk(&mut self, module: ModuleIdx, chunk: ChunkIdx) {
    let modules = &mut self.chunks[chunk].modules;
    if !modules.contains(&module) {
      modules.push(module);
    }
  }

  pub fn set_entry_module(&mut self, chunk: ChunkIdx, module: ModuleIdx, group: GroupIdx) {
    self.chunks[chunk].entry_modules.insert(module, group);
  }

  /// The set of chunks reachable from `chunk` only through asynchronous
  /// boundaries.
  ///
  /// Chunks shared by every group the chunk belongs to load together with it
  /// no matter which group is taken, so they are excluded even when some
  /// async path reaches them.
  pub fn all_async_chunks_of(&self, chunk: ChunkIdx) -> FxIndexSet<ChunkIdx> {
    let chunk_ref = &self.chunks[chunk];

    let mut own_groups = chunk_ref.groups.iter();
    let mut initial: FxHashSet<ChunkIdx> = own_groups
      .next()
      .map(|group| self.groups[*group].chunks.iter().copied().collect())
      .unwrap_or_default();
    for group in own_groups {
      let members =
        self.groups[*group].chunks.iter().copied().collect::<FxHashSet<ChunkIdx>>();
      initial.retain(|member| members.contains(member));
    }

    // Reachability walk over the group graph. The queue doubles as the
    // visited set, so cycles terminate.
    let mut queue = chunk_ref
      .groups
      .iter()
      .flat_map(|group| self.groups[*group].children.iter().copied())
      .collect::<FxIndexSet<GroupIdx>>();
    let mut chunks = FxIndexSet::default();
    let mut cursor = 0;
    while let Some(group) = queue.get_index(cursor).copied() {
      cursor += 1;
      for member in &self.groups[group].chunks {
        if !initial.contains(member) {
          chunks.insert(*member);
        }
      }
      for child in &self.groups[group].children {
        queue.insert(*child);
      }
    }
    chunks
  }

  /// Hash, content-hash and name maps over the async chunks of `chunk`,
  /// keyed by chunk id. Chunks without an assigned id are skipped.
  pub fn chunk_maps(&self, chunk: ChunkIdx, real_hash: bool) -> ChunkMaps {
    let mut maps = ChunkMaps::default();
    for async_chunk in self.all_async_chunks_of(chunk) {
      let chunk_ref = &self.chunks[async_chunk];
      let Some(id) = chunk_ref.id.clone() else { continue };
      let hash = if real_hash { &chunk_ref.hash } else { &chunk_ref.rendered_hash };
      if let Some(hash) = hash {
        maps.hashes.insert(id.clone(), hash.clone());
      }
      for (content_type, content_hash) in &chunk_ref.content_hash {
        maps
          .content_hashes
          .entry(content_type.clone())
          .or_default()
          .insert(id.clone(), content_hash.clone());
      }
      if let Some(name) = &chunk_ref.name {
        maps.names.insert(id, name.clone());
      }
    }
    maps
  }

  /// Ordered child chunk ids per loading-hint name (`prefetchOrder` on a
  /// child group contributes under `prefetch`). Only groups where `chunk`
  /// occupies the final position contribute; higher order values come first,
  /// ties broken by the group total order.
  pub fn child_ids_by_orders(&self, chunk: ChunkIdx) -> FxIndexMap<ArcStr, Vec<ArcStr>> {
    let mut lists: FxIndexMap<ArcStr, Vec<(i32, GroupIdx)>> = FxIndexMap::default();
    for group in &self.chunks[chunk].groups {
      let group = &self.groups[*group];
      if group.chunks.last() != Some(&chunk) {
        continue;
      }
      for child_idx in &group.children {
        let child = &self.groups[*child_idx];
        for (key, order) in &child.options.orders {
          if let Some(name) = key.strip_suffix(ORDER_KEY_SUFFIX) {
            lists.entry(ArcStr::from(name)).or_default().push((*order, *child_idx));
          }
        }
      }
    }

    let mut result = FxIndexMap::default();
    for (name, mut list) in lists {
      list.sort_by(|(lhs_order, lhs_group), (rhs_order, rhs_group)| {
        rhs_order.cmp(lhs_order).then_with(|| {
          self.groups[*lhs_group].compare_to(&self.chunks, &self.groups[*rhs_group])
        })
      });
      let mut ids = FxIndexSet::default();
      for (_, group) in list {
        for member in &self.groups[group].chunks {
          if let Some(id) = &self.chunks[*member].id {
            ids.insert(id.clone());
          }
        }
      }
      result.insert(name, ids.into_iter().collect());
    }
    result
  }

  /// [child_ids_by_orders](Self::child_ids_by_orders) applied to this chunk
  /// (when `include_direct_children`) and to every async chunk of it, merged
  /// into a map keyed by order name, then by source chunk id.
  pub fn child_ids_by_orders_map(
    &self,
    chunk: ChunkIdx,
    include_direct_children: bool,
  ) -> FxIndexMap<ArcStr, FxIndexMap<ArcStr, Vec<ArcStr>>> {
    let mut result = FxIndexMap::default();
    if include_direct_children {
      self.collect_child_ids_into(chunk, &mut result);
    }
    for async_chunk in self.all_async_chunks_of(chunk) {
      self.collect_child_ids_into(async_chunk, &mut result);
    }
    result
  }

  fn collect_child_ids_into(
    &self,
    chunk: ChunkIdx,
    result: &mut FxIndexMap<ArcStr, FxIndexMap<ArcStr, Vec<ArcStr>>>,
  ) {
    let Some(id) = self.chunks[chunk].id.clone() else {
      return;
    };
    for (name, ids) in self.child_ids_by_orders(chunk) {
      if ids.is_empty() {
        continue;
      }
      result.entry(name).or_default().insert(id.clone(), ids);
    }
  }

  /// Feeds the chunk's identity and content into the hash accumulator in a
  /// fixed order: id, comma-joined secondary ids, name, per-module hashes in
  /// module-index order, then per entry module the literal `entry`, the
  /// module hash and the owning group id.
  pub fn update_chunk_hash(
    &self,
    chunk: ChunkIdx,
    hash: &mut impl HashUpdate,
    module_hashes: &FxHashMap<ModuleIdx, ArcStr>,
  ) {
    let chunk_ref = &self.chunks[chunk];
    if let Some(id) = &chunk_ref.id {
      hash.update(id.as_bytes());
    }
    hash.update(b" ");
    hash.update(chunk_ref.secondary_ids.iter().join(",").as_bytes());
    hash.update(b" ");
    if let Some(name) = &chunk_ref.name {
      hash.update(name.as_bytes());
    }
    hash.update(b" ");
    for module in chunk_ref.ordered_modules() {
      if let Some(module_hash) = module_hashes.get(&module) {
        hash.update(module_hash.as_bytes());
      }
    }
    for (module, group) in &chunk_ref.entry_modules {
      hash.update(b"entry");
      if let Some(module_hash) = module_hashes.get(module) {
        hash.update(module_hash.as_bytes());
      }
      hash.update(self.groups[*group].id(&self.chunks).as_bytes());
    }
  }
}
