pub mod group_table;

use std::cmp::Ordering;

use arcstr::ArcStr;
use itertools::Itertools;
use nanopack_utils::indexmap::{FxIndexMap, FxIndexSet};

use crate::{ChunkIdx, ChunkTable, GroupIdx};

/// Named ordering options end with this suffix, e.g. `prefetchOrder`.
pub const ORDER_KEY_SUFFIX: &str = "Order";

#[derive(Debug, Default, Clone)]
pub struct ChunkGroupOptions {
  pub name: Option<ArcStr>,
  /// Named numeric loading priorities, keys suffixed with
  /// [ORDER_KEY_SUFFIX].
  pub orders: FxIndexMap<ArcStr, i32>,
}

#[derive(Debug, Default)]
pub enum ChunkGroupKind {
  #[default]
  Normal,
  /// A group rooted at a build entry, designating a runtime chunk.
  Entrypoint { runtime_chunk: Option<ChunkIdx> },
}

/// An ordered collection of chunks representing one loading unit, with
/// parent/child relations to other groups across asynchronous boundaries.
#[derive(Debug, Default)]
pub struct ChunkGroup {
  pub kind: ChunkGroupKind,
  pub chunks: Vec<ChunkIdx>,
  pub parents: FxIndexSet<GroupIdx>,
  pub children: FxIndexSet<GroupIdx>,
  pub options: ChunkGroupOptions,
}

impl ChunkGroup {
  pub fn new(kind: ChunkGroupKind, options: ChunkGroupOptions) -> Self {
    Self { kind, options, ..Self::default() }
  }

  pub fn name(&self) -> Option<&ArcStr> {
    self.options.name.as_ref()
  }

  pub fn is_initial(&self) -> bool {
    matches!(self.kind, ChunkGroupKind::Entrypoint { .. })
  }

  pub fn runtime_chunk(&self) -> Option<ChunkIdx> {
    match self.kind {
      ChunkGroupKind::Entrypoint { runtime_chunk } => runtime_chunk,
      ChunkGroupKind::Normal => None,
    }
  }

  pub fn set_runtime_chunk(&mut self, chunk: ChunkIdx) {
    if let ChunkGroupKind::Entrypoint { runtime_chunk } = &mut self.kind {
      *runtime_chunk = Some(chunk);
    }
  }

  /// Joined member chunk ids, falling back to debug ids before assignment.
  pub fn id(&self, chunks: &ChunkTable) -> String {
    self
      .chunks
      .iter()
      .map(|idx| match &chunks[*idx].id {
        Some(id) => id.to_string(),
        None => chunks[*idx].debug_id.to_string(),
      })
      .join("+")
  }

  /// Inserts `chunk` directly before `before`, or at the end if `before` is
  /// not a member. Returns false if `chunk` is already a member.
  pub fn insert_chunk(&mut self, chunk: ChunkIdx, before: Option<ChunkIdx>) -> bool {
    if self.chunks.contains(&chunk) {
      return false;
    }
    match before.and_then(|before| self.chunks.iter().position(|member| *member == before)) {
      Some(position) => self.chunks.insert(position, chunk),
      None => self.chunks.push(chunk),
    }
    true
  }

  /// Returns false if the chunk is not a member.
  pub fn remove_chunk(&mut self, chunk: ChunkIdx) -> bool {
    match self.chunks.iter().position(|member| *member == chunk) {
      Some(position) => {
        self.chunks.remove(position);
        true
      }
      None => false,
    }
  }

  /// Total order over groups, independent of set iteration order. Member
  /// chunks are compared pairwise by assigned id, then debug id, then by
  /// member count.
  pub fn compare_to(&self, chunks: &ChunkTable, other: &ChunkGroup) -> Ordering {
    let sort_key = |idx: &ChunkIdx| {
      let chunk = &chunks[*idx];
      (chunk.id.clone(), chunk.debug_id)
    };
    self.chunks.iter().map(sort_key).cmp(other.chunks.iter().map(sort_key))
  }
}

#[cfg(test)]
mod tests {
  use oxc_index::IndexVec;

  use crate::{Chunk, ChunkIdx};

  use super::*;

  fn table(count: u32) -> ChunkTable {
    let mut chunks = IndexVec::new();
    for debug_id in 0..count {
      chunks.push(Chunk::new(debug_id, None));
    }
    ChunkTable { chunks }
  }

  #[test]
  fn insert_and_remove_chunk() {
    let a = ChunkIdx::from_raw(0);
    let b = ChunkIdx::from_raw(1);
    let c = ChunkIdx::from_raw(2);

    let mut group = ChunkGroup::default();
    assert!(group.insert_chunk(a, None));
    assert!(group.insert_chunk(c, None));
    assert!(group.insert_chunk(b, Some(c)));
    assert_eq!(group.chunks, vec![a, b, c]);

    // already a member
    assert!(!group.insert_chunk(b, None));
    assert_eq!(group.chunks, vec![a, b, c]);

    assert!(group.remove_chunk(b));
    assert!(!group.remove_chunk(b));
    assert_eq!(group.chunks, vec![a, c]);
  }

  #[test]
  fn compare_to_is_total_and_deterministic() {
    let chunks = table(3);
    let mut lhs = ChunkGroup::default();
    lhs.chunks = vec![ChunkIdx::from_raw(0), ChunkIdx::from_raw(1)];
    let mut rhs = ChunkGroup::default();
    rhs.chunks = vec![ChunkIdx::from_raw(0), ChunkIdx::from_raw(2)];

    assert_eq!(lhs.compare_to(&chunks, &rhs), Ordering::Less);
    assert_eq!(rhs.compare_to(&chunks, &lhs), Ordering::Greater);
    assert_eq!(lhs.compare_to(&chunks, &lhs), Ordering::Equal);
  }

  #[test]
  fn group_id_joins_member_ids() {
    let mut chunks = table(2);
    chunks[ChunkIdx::from_raw(0)].id = Some(arcstr::literal!("main"));

    let mut group = ChunkGroup::default();
    group.chunks = vec![ChunkIdx::from_raw(0), ChunkIdx::from_raw(1)];
    assert_eq!(group.id(&chunks), "main+1");
  }

  #[test]
  fn entrypoint_runtime_chunk() {
    let runtime = ChunkIdx::from_raw(0);
    let mut entry = ChunkGroup::new(
      ChunkGroupKind::Entrypoint { runtime_chunk: None },
      ChunkGroupOptions { name: Some(arcstr::literal!("main")), orders: FxIndexMap::default() },
    );
    assert!(entry.is_initial());
    assert_eq!(entry.runtime_chunk(), None);
    entry.set_runtime_chunk(runtime);
    assert_eq!(entry.runtime_chunk(), Some(runtime));

    let mut normal = ChunkGroup::default();
    assert!(!normal.is_initial());
    normal.set_runtime_chunk(runtime);
    assert_eq!(normal.runtime_chunk(), None);
  }
}
