/// FNV-1a 64-bit hash, processing 8 bytes at a time.
///
/// Used for log-site hashing, Bloom mask derivation and `%h` rendering, so
/// it must be stable across processes.
#[inline]
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
  let mut hash = 0xcbf29ce484222325u64; // FNV offset basis

  let chunks = bytes.chunks_exact(8);
  let remainder = chunks.remainder();

  for chunk in chunks {
    // SAFETY: chunk is guaranteed to be exactly 8 bytes by chunks_exact(8)
    let chunk_u64 = unsafe { std::ptr::read_unaligned(chunk.as_ptr() as *const u64) };
    hash ^= chunk_u64;
    hash = hash.wrapping_mul(0x100000001b3); // FNV prime
  }

  for &byte in remainder {
    hash ^= byte as u64;
    hash = hash.wrapping_mul(0x100000001b3);
  }

  hash
}

/// SplitMix64 finalizer. Spreads low-entropy inputs (sequential ids) over
/// the full 64-bit range.
#[inline]
pub fn mix64(value: u64) -> u64 {
  let mut z = value.wrapping_add(0x9e3779b97f4a7c15);
  z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
  z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
  z ^ (z >> 31)
}
