oxc_index::define_index_type! {
  #[derive(Default)]
  pub struct RawIdx = u32;
}

pub type ModuleIdx = RawIdx;
pub type DependencyIdx = RawIdx;
pub type BlockIdx = RawIdx;
pub type ConnectionIdx = RawIdx;
pub type ChunkIdx = RawIdx;
pub type GroupIdx = RawIdx;
