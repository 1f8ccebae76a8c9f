use std::fmt::Write;

use xxhash_rust::xxh3::xxh3_128;

/// Hex digest of the xxh3-128 hash, little-endian byte order.
pub fn xxhash_hex(input: &[u8]) -> String {
  let hash = xxh3_128(input).to_le_bytes();
  let mut out = String::with_capacity(hash.len() * 2);
  for byte in hash {
    write!(out, "{byte:02x}").unwrap();
  }
  out
}

#[test]
fn test_xxhash_hex() {
  assert_eq!(&xxhash_hex(b"hello"), "1838525eaacf79c77f3e1b07adc1e9b5");
  assert_eq!(xxhash_hex(b"").len(), 32);
  assert_ne!(xxhash_hex(b"a"), xxhash_hex(b"b"));
}
