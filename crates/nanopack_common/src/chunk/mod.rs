pub mod chunk_table;

use arcstr::ArcStr;
use nanopack_utils::indexmap::{FxIndexMap, FxIndexSet};

use crate::{ChunkGroupTable, ChunkIdx, GroupIdx, ModuleIdx};

bitflags::bitflags! {
  #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
  pub struct ChunkFlags: u8 {
    /// The chunk must not be merged into another chunk.
    const PREVENT_INTEGRATION = 1;
    const EXTRA_ASYNC = 1 << 1;
    /// Set once the chunk has been rendered to an asset.
    const RENDERED = 1 << 2;
  }
}

/// An output unit aggregating a subset of modules for code generation.
///
/// Chunk identity is its index in the owning table. `debug_id` is assigned by
/// the chunk graph at creation and is only used for stable ordering and
/// debug output before `id` is assigned.
#[derive(Debug, Default)]
pub struct Chunk {
  pub id: Option<ArcStr>,
  pub secondary_ids: Vec<ArcStr>,
  pub debug_id: u32,
  pub name: Option<ArcStr>,
  pub groups: FxIndexSet<GroupIdx>,
  pub modules: Vec<ModuleIdx>,
  /// Entry modules of this chunk together with the group owning the entry.
  pub entry_modules: FxIndexMap<ModuleIdx, GroupIdx>,
  pub files: Vec<ArcStr>,
  pub hash: Option<ArcStr>,
  /// Per content-type hash, keyed by tags like `javascript` or `css`.
  pub content_hash: FxIndexMap<ArcStr, ArcStr>,
  pub rendered_hash: Option<ArcStr>,
  pub flags: ChunkFlags,
  pub removed_modules: Vec<ModuleIdx>,
}

impl Chunk {
  pub fn new(debug_id: u32, name: Option<ArcStr>) -> Self {
    Self { debug_id, name, ..Self::default() }
  }

  /// Returns false if the chunk already belongs to the group.
  pub fn add_group(&mut self, group: GroupIdx) -> bool {
    self.groups.insert(group)
  }

  /// Returns false if the chunk does not belong to the group.
  pub fn remove_group(&mut self, group: GroupIdx) -> bool {
    self.groups.shift_remove(&group)
  }

  pub fn is_in_group(&self, group: GroupIdx) -> bool {
    self.groups.contains(&group)
  }

  pub fn number_of_groups(&self) -> usize {
    self.groups.len()
  }

  pub fn can_be_initial(&self, groups: &ChunkGroupTable) -> bool {
    self.groups.iter().any(|group| groups[*group].is_initial())
  }

  pub fn is_only_initial(&self, groups: &ChunkGroupTable) -> bool {
    !self.groups.is_empty() && self.groups.iter().all(|group| groups[*group].is_initial())
  }

  /// Whether any containing group is an initial entrypoint designating this
  /// chunk as its runtime chunk.
  pub fn has_runtime(&self, self_idx: ChunkIdx, groups: &ChunkGroupTable) -> bool {
    self.groups.iter().any(|group| {
      let group = &groups[*group];
      group.is_initial() && group.runtime_chunk() == Some(self_idx)
    })
  }

  /// Assigned modules in deterministic module-index order, for hashing.
  pub fn ordered_modules(&self) -> Vec<ModuleIdx> {
    let mut modules = self.modules.clone();
    modules.sort_unstable();
    modules
  }
}

#[test]
fn chunk_flags_toggle_independently() {
  let mut chunk = Chunk::new(0, None);
  assert!(chunk.flags.is_empty());

  chunk.flags.insert(ChunkFlags::PREVENT_INTEGRATION);
  chunk.flags.insert(ChunkFlags::RENDERED);
  assert!(chunk.flags.contains(ChunkFlags::PREVENT_INTEGRATION));
  assert!(chunk.flags.contains(ChunkFlags::RENDERED));
  assert!(!chunk.flags.contains(ChunkFlags::EXTRA_ASYNC));

  chunk.flags.remove(ChunkFlags::RENDERED);
  assert!(!chunk.flags.contains(ChunkFlags::RENDERED));
  assert!(chunk.flags.contains(ChunkFlags::PREVENT_INTEGRATION));
}
