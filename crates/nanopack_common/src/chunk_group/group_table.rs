use std::ops::{Deref, DerefMut};

use oxc_index::IndexVec;

use crate::GroupIdx;

use super::ChunkGroup;

#[derive(Debug, Default)]
pub struct ChunkGroupTable {
  pub groups: IndexVec<GroupIdx, ChunkGroup>,
}

impl Deref for ChunkGroupTable {
  type Target = IndexVec<GroupIdx, ChunkGroup>;

  fn deref(&self) -> &Self::Target {
    &self.groups
  }
}

impl DerefMut for ChunkGroupTable {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.groups
  }
}
