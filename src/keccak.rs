use zeroize::Zeroize;

/// The number of words in our permutation state.
pub const STATE_SIZE_U64: usize = 25;
/// The number of bytes in our permutation state.
pub const STATE_SIZE_U8: usize = STATE_SIZE_U64 * 8;

/// Apply the full 24 round Keccak-f[1600] permutation in place.
///
/// Lanes are indexed as `state[x + 5 * y]`.
fn keccak_f(state: &mut [u64; STATE_SIZE_U64]) {
    ::keccak::f1600(state);
}

/// Keccak-f[1600] as a pure function.
pub fn permute(mut state: [u64; STATE_SIZE_U64]) -> [u64; STATE_SIZE_U64] {
    keccak_f(&mut state);
    state
}

/// The lanes of a Keccak-f[1600] state.
///
/// The sponge wants to operate on bytes, whereas the permutation wants to
/// operate on 64 bit words. Every byte offset `i` maps to byte `i % 8` of
/// lane `i / 8`, read in little endian order, whatever the host's endianness.
#[derive(Clone, Default, Zeroize)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct KeccakState(pub [u64; STATE_SIZE_U64]);

impl KeccakState {
    /// Apply the permutation to this state.
    pub fn permute(&mut self) {
        keccak_f(&mut self.0);
    }

    /// XOR `bytes` into the state, starting at byte offset zero.
    ///
    /// A trailing partial lane is zero padded before being XORed in.
    pub fn xor_bytes(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= STATE_SIZE_U8);
        let mut chunks = bytes.chunks_exact(8);
        for (word, chunk) in self.0.iter_mut().zip(&mut chunks) {
            let mut le = [0u8; 8];
            le.copy_from_slice(chunk);
            *word ^= u64::from_le_bytes(le);
        }
        let rest = chunks.remainder();
        if !rest.is_empty() {
            let mut le = [0u8; 8];
            le[..rest.len()].copy_from_slice(rest);
            self.0[bytes.len() / 8] ^= u64::from_le_bytes(le);
        }
    }

    /// Copy the first `out.len()` bytes of the state into `out`.
    pub fn copy_bytes_into(&self, out: &mut [u8]) {
        debug_assert!(out.len() <= STATE_SIZE_U8);
        for (chunk, word) in out.chunks_mut(8).zip(self.0.iter()) {
            let le = word.to_le_bytes();
            chunk.copy_from_slice(&le[..chunk.len()]);
        }
    }

    /// Overwrite the first `len` bytes of the state with zeros.
    pub fn zero_prefix(&mut self, len: usize) {
        debug_assert!(len <= STATE_SIZE_U8);
        let full = len / 8;
        for word in self.0[..full].iter_mut() {
            *word = 0;
        }
        let partial = len % 8;
        if partial != 0 {
            // Clear the low `partial` bytes of the next lane.
            self.0[full] &= !0u64 << (8 * partial);
        }
    }
}
