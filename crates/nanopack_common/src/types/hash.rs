/// Opaque hash accumulator. The graph only feeds it bytes in a fixed order
/// and never inspects its state.
pub trait HashUpdate {
  fn update(&mut self, data: &[u8]);
}

impl HashUpdate for xxhash_rust::xxh3::Xxh3 {
  fn update(&mut self, data: &[u8]) {
    xxhash_rust::xxh3::Xxh3::update(self, data);
  }
}
