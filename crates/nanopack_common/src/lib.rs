mod chunk;
mod chunk_group;
mod types;

pub use crate::{
  chunk::{Chunk, ChunkFlags, chunk_table::ChunkTable},
  chunk_group::{
    ChunkGroup, ChunkGroupKind, ChunkGroupOptions, ORDER_KEY_SUFFIX,
    group_table::ChunkGroupTable,
  },
  types::{
    connection::Connection,
    hash::HashUpdate,
    optimization_bailout::{BailoutFormatter, OptimizationBailout},
    raw_idx::{BlockIdx, ChunkIdx, ConnectionIdx, DependencyIdx, GroupIdx, ModuleIdx, RawIdx},
    used_exports::UsedExports,
  },
};
