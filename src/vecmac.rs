//! A MAC over an ordered list of byte strings.
//!
//! Rather than length-prefixing each input, every input is terminated by
//! padding the sponge with its own separator byte: `0xff` for the first,
//! `0xfd` for the second, and so on. Two lists with a different number of
//! parts can therefore never produce the same padded stream.
use crate::error::Error;
use crate::sponge::Sponge;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use zeroize::ZeroizeOnDrop;

/// The most inputs a single MAC computation accepts.
///
/// Separators count down from `0xff` in steps of two; stopping here keeps
/// them clear of the SHA-3 and SHAKE domain separators.
pub const MAX_INPUTS: usize = 95;
/// The padding byte terminating the key, and the first input.
const FIRST_SEPARATOR: u8 = 0xff;

/// The separator byte for input number `i`.
fn separator(i: usize) -> u8 {
    FIRST_SEPARATOR.wrapping_sub((2 * i) as u8)
}

/// A SHAKE256 vector MAC, with the keyed state cached.
#[derive(Clone, ZeroizeOnDrop)]
pub struct VecMac {
    sponge: Sponge,
    /// The state right after the key was absorbed and padded.
    primed: Sponge,
}

impl fmt::Debug for VecMac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VecMac: KEY OMITTED")
    }
}

impl VecMac {
    pub fn new(key: &[u8]) -> Self {
        let mut primed = Sponge::shake256();
        primed.absorb_unchecked(key);
        primed.pad_and_permute_unchecked(FIRST_SEPARATOR);
        Self {
            sponge: primed.snapshot(),
            primed,
        }
    }

    /// Authenticate `inputs`, in order, filling all of `tag`.
    ///
    /// The keyed state is restored afterwards, whether or not this succeeds.
    pub fn compute(&mut self, inputs: &[&[u8]], tag: &mut [u8]) -> Result<(), Error> {
        if inputs.len() > MAX_INPUTS {
            tracing::debug!(count = inputs.len(), "too many vector MAC inputs");
            return Err(Error::TooManyInputs {
                count: inputs.len(),
                max: MAX_INPUTS,
            });
        }

        for (i, input) in inputs.iter().enumerate() {
            self.sponge.absorb_unchecked(input);
            self.sponge.pad_and_permute_unchecked(separator(i));
        }
        // Squeezing pads once more, with SHAKE256's own separator.
        self.sponge.squeeze(tag);
        self.sponge.restore(&self.primed);
        Ok(())
    }

    /// Authenticate `inputs`, returning a `len` byte tag.
    pub fn mac(&mut self, inputs: &[&[u8]], len: usize) -> Result<Vec<u8>, Error> {
        let mut tag = vec![0u8; len];
        self.compute(inputs, &mut tag)?;
        Ok(tag)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_separators() {
        assert_eq!(separator(0), 0xff);
        assert_eq!(separator(1), 0xfd);
        assert_eq!(separator(2), 0xfb);
        assert_eq!(separator(MAX_INPUTS - 1), 0x43);
    }

    #[test]
    fn test_mac_matches_sponge_steps() {
        let mut sponge = Sponge::shake256();
        sponge.absorb(b"key").unwrap();
        sponge.pad_and_permute(0xff).unwrap();
        sponge.absorb(b"a").unwrap();
        sponge.pad_and_permute(0xff).unwrap();
        sponge.absorb(b"b").unwrap();
        sponge.pad_and_permute(0xfd).unwrap();
        let expected = sponge.squeeze_vec(32);

        let mut mac = VecMac::new(b"key");
        assert_eq!(mac.mac(&[b"a", b"b"], 32).unwrap(), expected);
    }

    #[test]
    fn test_empty_list_matches_sponge_steps() {
        let mut sponge = Sponge::shake256();
        sponge.absorb(b"key").unwrap();
        sponge.pad_and_permute(0xff).unwrap();
        let expected = sponge.squeeze_vec(32);

        assert_eq!(VecMac::new(b"key").mac(&[], 32).unwrap(), expected);
    }

    #[test]
    fn test_mac_is_repeatable() {
        let mut mac = VecMac::new(b"key");
        let t0 = mac.mac(&[b"a", b"b"], 32).unwrap();
        let t1 = mac.mac(&[b"a", b"b"], 32).unwrap();
        assert_eq!(t0, t1);

        let mut fresh = VecMac::new(b"key");
        assert_eq!(fresh.mac(&[b"a", b"b"], 32).unwrap(), t0);
    }

    #[test]
    fn test_mac_depends_on_key() {
        let t0 = VecMac::new(b"key A").mac(&[b"message"], 32).unwrap();
        let t1 = VecMac::new(b"key B").mac(&[b"message"], 32).unwrap();
        assert_ne!(t0, t1);
    }

    #[test]
    fn test_order_and_partition_matter() {
        let mut mac = VecMac::new(&[0u8; 32]);
        let ab = mac.mac(&[b"a", b"b"], 32).unwrap();
        let ba = mac.mac(&[b"b", b"a"], 32).unwrap();
        let joined = mac.mac(&[b"ab"], 32).unwrap();
        let split = mac.mac(&[b"a", b"", b"b"], 32).unwrap();
        assert_ne!(ab, ba);
        assert_ne!(ab, joined);
        assert_ne!(ab, split);
    }

    #[test]
    fn test_empty_list() {
        let mut mac = VecMac::new(b"key");
        let none = mac.mac(&[], 32).unwrap();
        let one_empty = mac.mac(&[b""], 32).unwrap();
        assert_ne!(none, one_empty);
    }

    #[test]
    fn test_long_inputs_cross_blocks() {
        let mut mac = VecMac::new(&[1u8; 300]);
        let big = [9u8; 1000];
        let t0 = mac.mac(&[&big[..500], &big[500..]], 64).unwrap();
        let t1 = mac.mac(&[&big[..499], &big[499..]], 64).unwrap();
        assert_ne!(t0, t1);
    }

    #[test]
    fn test_too_many_inputs() {
        let mut mac = VecMac::new(b"key");
        let inputs = [&b"x"[..]; MAX_INPUTS + 1];
        assert_eq!(
            mac.mac(&inputs, 32),
            Err(Error::TooManyInputs {
                count: MAX_INPUTS + 1,
                max: MAX_INPUTS
            })
        );
        assert!(mac.mac(&inputs[..MAX_INPUTS], 32).is_ok());
    }

    #[test]
    fn test_tag_prefix() {
        let mut mac = VecMac::new(b"key");
        let long = mac.mac(&[b"m"], 64).unwrap();
        let short = mac.mac(&[b"m"], 24).unwrap();
        assert_eq!(&long[..24], &short[..]);
    }
}
