// See: https://keccak.team/files/CSF-0.1.pdf for the sponge construction,
// and FIPS 202 for the SHA-3 and SHAKE parameters.
use crate::error::Error;
use crate::keccak::{KeccakState, STATE_SIZE_U8};
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Domain separator for the fixed-output SHA-3 functions.
pub const DS_SHA3: u8 = 0x06;
/// Domain separator for the SHAKE extendable-output functions.
pub const DS_SHAKE: u8 = 0x1f;
/// The byte XORed into the last byte of the rate by multi-rate padding.
const PAD_END: u8 = 0x80;

/// The sponge instances we know how to build.
///
/// The fixed-output kinds have `rate = 200 - 2 * output_len`, and refuse to
/// squeeze more than `output_len` bytes over their lifetime.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpongeKind {
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
    Shake128,
    Shake256,
    /// An extendable-output sponge with an arbitrary rate and domain separator.
    ///
    /// This is *not* a SHAKE function unless the rate is 136 or 168 and
    /// `ds == 0x1f`.
    Custom { rate: usize, ds: u8 },
}

impl SpongeKind {
    /// The output budget of a fixed-output kind, in bytes.
    pub fn output_len(self) -> Option<usize> {
        match self {
            SpongeKind::Sha3_224 => Some(28),
            SpongeKind::Sha3_256 => Some(32),
            SpongeKind::Sha3_384 => Some(48),
            SpongeKind::Sha3_512 => Some(64),
            SpongeKind::Shake128 | SpongeKind::Shake256 | SpongeKind::Custom { .. } => None,
        }
    }

    /// The number of bytes absorbed or squeezed per permutation call.
    pub fn rate(self) -> usize {
        match self {
            SpongeKind::Shake128 => 168,
            SpongeKind::Shake256 => 136,
            SpongeKind::Custom { rate, .. } => rate,
            fixed => fixed
                .output_len()
                .map_or(0, |len| STATE_SIZE_U8 - 2 * len),
        }
    }

    /// The domain separation byte used when squeezing starts.
    pub fn ds(self) -> u8 {
        match self {
            SpongeKind::Sha3_224
            | SpongeKind::Sha3_256
            | SpongeKind::Sha3_384
            | SpongeKind::Sha3_512 => DS_SHA3,
            SpongeKind::Shake128 | SpongeKind::Shake256 => DS_SHAKE,
            SpongeKind::Custom { ds, .. } => ds,
        }
    }
}

/// Which way bytes are flowing through a sponge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Absorbing,
    Squeezing,
}

/// A Keccak-f[1600] sponge.
///
/// While absorbing, `buf` holds the pending partial block; while squeezing,
/// it holds the current rate-sized window of output. In both phases
/// `pos <= rate`, and when absorbing with `pos == 0` the buffer is all zeros.
///
/// Cloning produces a fully independent copy, which is how a keyed state is
/// snapshotted and later restored.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Sponge {
    state: KeccakState,
    buf: [u8; STATE_SIZE_U8],
    pos: usize,
    rate: usize,
    ds: u8,
    #[zeroize(skip)]
    direction: Direction,
    /// Total bytes squeezed since the last reset.
    squeezed: usize,
    #[zeroize(skip)]
    kind: SpongeKind,
}

impl fmt::Debug for Sponge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The state and buffer are keyed material for every MAC built on us.
        f.debug_struct("Sponge")
            .field("kind", &self.kind)
            .field("direction", &self.direction)
            .field("pos", &self.pos)
            .finish_non_exhaustive()
    }
}

impl Sponge {
    /// Create a sponge of the given kind, with a zeroed state.
    pub fn new(kind: SpongeKind) -> Result<Self, Error> {
        let rate = kind.rate();
        if rate == 0 || rate > STATE_SIZE_U8 {
            tracing::debug!(rate, "rejected sponge rate");
            return Err(Error::InvalidRate { rate });
        }
        Ok(Self::with_valid_kind(kind))
    }

    fn with_valid_kind(kind: SpongeKind) -> Self {
        Self {
            state: KeccakState::default(),
            buf: [0u8; STATE_SIZE_U8],
            pos: 0,
            rate: kind.rate(),
            ds: kind.ds(),
            direction: Direction::Absorbing,
            squeezed: 0,
            kind,
        }
    }

    pub fn sha3_224() -> Self {
        Self::with_valid_kind(SpongeKind::Sha3_224)
    }

    pub fn sha3_256() -> Self {
        Self::with_valid_kind(SpongeKind::Sha3_256)
    }

    pub fn sha3_384() -> Self {
        Self::with_valid_kind(SpongeKind::Sha3_384)
    }

    pub fn sha3_512() -> Self {
        Self::with_valid_kind(SpongeKind::Sha3_512)
    }

    /// SHAKE128: 128 bits of generic security with at least 32 bytes of output.
    pub fn shake128() -> Self {
        Self::with_valid_kind(SpongeKind::Shake128)
    }

    /// SHAKE256: 256 bits of generic security with at least 64 bytes of output.
    pub fn shake256() -> Self {
        Self::with_valid_kind(SpongeKind::Shake256)
    }

    pub fn kind(&self) -> SpongeKind {
        self.kind
    }

    pub fn rate(&self) -> usize {
        self.rate
    }

    pub fn capacity(&self) -> usize {
        STATE_SIZE_U8 - self.rate
    }

    /// The generic security strength of this instance, in bits.
    pub fn security_strength(&self) -> usize {
        8 * self.capacity() / 2
    }

    /// The output budget for fixed-output instances.
    pub fn output_len(&self) -> Option<usize> {
        self.kind.output_len()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Absorb some data into this sponge.
    ///
    /// Once squeezing has started, this fails; use [`Sponge::reset`] or
    /// [`Sponge::restore`] to go back to absorbing.
    pub fn absorb(&mut self, data: &[u8]) -> Result<(), Error> {
        self.check_absorbing()?;
        self.absorb_unchecked(data);
        Ok(())
    }

    /// Pad with `ds`, apply the permutation, and keep absorbing.
    ///
    /// This marks a boundary inside the absorbed input.
    pub fn pad_and_permute(&mut self, ds: u8) -> Result<(), Error> {
        self.check_absorbing()?;
        self.pad_and_permute_unchecked(ds);
        Ok(())
    }

    /// Pad with `ds`, apply the permutation, and switch to squeezing.
    pub fn pad_and_switch(&mut self, ds: u8) -> Result<(), Error> {
        self.check_absorbing()?;
        self.pad_and_switch_unchecked(ds);
        Ok(())
    }

    /// Squeeze bytes out of the sponge into `out`, returning how many were written.
    ///
    /// If still absorbing, we first pad with this instance's domain separator.
    /// Fixed-output instances stop at their budget, so the returned count may
    /// be less than `out.len()`; the remaining bytes of `out` are left untouched.
    pub fn squeeze(&mut self, out: &mut [u8]) -> usize {
        if self.direction == Direction::Absorbing {
            self.pad_and_switch_unchecked(self.ds);
        }

        let len = match self.kind.output_len() {
            Some(budget) => out.len().min(budget.saturating_sub(self.squeezed)),
            None => out.len(),
        };

        let mut written = 0;
        while written < len {
            if self.pos == self.rate {
                self.state.permute();
                self.state.copy_bytes_into(&mut self.buf[..self.rate]);
                self.pos = 0;
            }
            let take = (self.rate - self.pos).min(len - written);
            out[written..written + take].copy_from_slice(&self.buf[self.pos..self.pos + take]);
            self.pos += take;
            written += take;
        }
        self.squeezed += len;
        len
    }

    /// Squeeze up to `len` bytes into a fresh vector.
    ///
    /// The vector is shorter than `len` if a fixed-output budget ran out.
    pub fn squeeze_vec(&mut self, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        let written = self.squeeze(&mut out);
        out.truncate(written);
        out
    }

    /// Squeeze whatever is left of a fixed-output instance's budget.
    ///
    /// Extendable-output instances have no budget, and yield nothing here.
    pub fn finalize(&mut self) -> Vec<u8> {
        let len = self.output_len().unwrap_or(0);
        self.squeeze_vec(len)
    }

    /// Make the state one way: previous inputs can no longer be recovered
    /// by inverting the permutation.
    pub fn ratchet(&mut self) -> Result<(), Error> {
        self.check_absorbing()?;
        if self.pos != 0 {
            self.flush_block();
        }
        self.state.zero_prefix(self.rate.min(self.capacity() / 2));
        self.state.permute();
        Ok(())
    }

    /// Zero the state and buffers, and go back to absorbing.
    pub fn reset(&mut self) {
        self.state.zeroize();
        self.buf.zeroize();
        self.pos = 0;
        self.squeezed = 0;
        self.direction = Direction::Absorbing;
    }

    /// Take an independent copy of the current state.
    pub fn snapshot(&self) -> Sponge {
        self.clone()
    }

    /// Overwrite this sponge with a copy of `snapshot`.
    pub fn restore(&mut self, snapshot: &Sponge) {
        self.clone_from(snapshot);
    }

    fn check_absorbing(&self) -> Result<(), Error> {
        match self.direction {
            Direction::Absorbing => Ok(()),
            Direction::Squeezing => {
                tracing::debug!(kind = ?self.kind, "absorb attempted after squeezing");
                Err(Error::AbsorbAfterSqueeze)
            }
        }
    }

    /// XOR the pending block into the state, permute, and clear the buffer.
    fn flush_block(&mut self) {
        self.state.xor_bytes(&self.buf[..self.rate]);
        self.state.permute();
        self.buf[..self.rate].fill(0);
        self.pos = 0;
    }

    fn pad(&mut self, ds: u8) {
        self.buf[self.pos] ^= ds;
        self.buf[self.rate - 1] ^= PAD_END;
    }

    pub(crate) fn absorb_unchecked(&mut self, mut data: &[u8]) {
        debug_assert_eq!(self.direction, Direction::Absorbing);
        while !data.is_empty() {
            let take = (self.rate - self.pos).min(data.len());
            if take == self.rate {
                // Full block with nothing pending: skip the buffer.
                self.state.xor_bytes(&data[..take]);
                self.state.permute();
            } else {
                self.buf[self.pos..self.pos + take].copy_from_slice(&data[..take]);
                self.pos += take;
                if self.pos == self.rate {
                    self.flush_block();
                }
            }
            data = &data[take..];
        }
    }

    pub(crate) fn pad_and_permute_unchecked(&mut self, ds: u8) {
        debug_assert_eq!(self.direction, Direction::Absorbing);
        self.pad(ds);
        self.flush_block();
    }

    fn pad_and_switch_unchecked(&mut self, ds: u8) {
        debug_assert_eq!(self.direction, Direction::Absorbing);
        self.pad(ds);
        self.state.xor_bytes(&self.buf[..self.rate]);
        self.state.permute();
        self.direction = Direction::Squeezing;
        self.state.copy_bytes_into(&mut self.buf[..self.rate]);
        self.pos = 0;
    }
}

/// Hash `data` with a fixed-output kind, into an array of its output size.
fn digest<const N: usize>(mut sponge: Sponge, data: &[u8]) -> [u8; N] {
    debug_assert_eq!(sponge.output_len(), Some(N));
    sponge.absorb_unchecked(data);
    let mut out = [0u8; N];
    sponge.squeeze(&mut out);
    out
}

pub fn sha3_224(data: &[u8]) -> [u8; 28] {
    digest(Sponge::sha3_224(), data)
}

pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    digest(Sponge::sha3_256(), data)
}

pub fn sha3_384(data: &[u8]) -> [u8; 48] {
    digest(Sponge::sha3_384(), data)
}

pub fn sha3_512(data: &[u8]) -> [u8; 64] {
    digest(Sponge::sha3_512(), data)
}

/// Fill `out` with the SHAKE128 digest of `data`.
pub fn shake128(data: &[u8], out: &mut [u8]) {
    let mut sponge = Sponge::shake128();
    sponge.absorb_unchecked(data);
    sponge.squeeze(out);
}

/// Fill `out` with the SHAKE256 digest of `data`.
pub fn shake256(data: &[u8], out: &mut [u8]) {
    let mut sponge = Sponge::shake256();
    sponge.absorb_unchecked(data);
    sponge.squeeze(out);
}
