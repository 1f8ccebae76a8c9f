mod chunk_graph;
mod module_graph;

pub use crate::{
  chunk_graph::{ChunkGraph, ChunkMaps},
  module_graph::{DependencyRecord, Meta, MetaKey, ModuleGraph, ModuleGraphModule},
};
pub use nanopack_common::*;
