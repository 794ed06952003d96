//! A keyed all-or-nothing transform.
//!
//! A random IV is bound to the message with a vector MAC, the message is
//! encrypted under a Salsa20 key stretched from that IV, and the IV is then
//! masked with a vector MAC of the whole ciphertext. Recovering any of the
//! message needs every bit of both the ciphertext and the tag.
//!
//! The packaged layout is `ciphertext || tag`. The tag length is chosen by the
//! caller and is itself authenticated, as the first input to both MACs.
use crate::error::Error;
use crate::sponge::Sponge;
use crate::vecmac::VecMac;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use rand_core::{CryptoRng, OsRng, RngCore};
use salsa20::cipher::{KeyIvInit, StreamCipher};
use salsa20::{Key, Nonce, Salsa20};
use zeroize::{ZeroizeOnDrop, Zeroizing};

/// The length of a package key.
pub const KEY_LEN: usize = 32;
/// The shortest tag that can mask the IV.
pub const MIN_TAG_LEN: usize = 32;
/// The longest tag whose length fits in the single length byte.
pub const MAX_TAG_LEN: usize = 255;
const STREAM_KEY_LEN: usize = 32;
const STREAM_NONCE_LEN: usize = 8;

/// The key for packaging and unpackaging.
///
/// There is no `Default`: the well known all-zero key has to be asked for by
/// name, with [`PackageKey::insecure_public_default`].
#[derive(Clone, ZeroizeOnDrop)]
pub struct PackageKey([u8; KEY_LEN]);

impl fmt::Debug for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackageKey: KEY OMITTED")
    }
}

impl PackageKey {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self(key)
    }

    /// The all-zero key.
    ///
    /// Packages made with it are still all-or-nothing, but anyone holding the
    /// complete package can unpackage it, and it is not indistinguishable
    /// from random.
    pub fn insecure_public_default() -> Self {
        Self([0u8; KEY_LEN])
    }

    fn mac(&self) -> VecMac {
        VecMac::new(&self.0)
    }
}

fn check_tag_len(len: usize) -> Result<(), Error> {
    if !(MIN_TAG_LEN..=MAX_TAG_LEN).contains(&len) {
        tracing::debug!(len, "rejected AONT tag length");
        return Err(Error::InvalidTagLength {
            len,
            min: MIN_TAG_LEN,
            max: MAX_TAG_LEN,
        });
    }
    Ok(())
}

/// XOR the Salsa20 keystream stretched from `iv` into `buf`.
fn apply_keystream(iv: &[u8], buf: &mut [u8]) {
    let mut derived = Zeroizing::new([0u8; STREAM_KEY_LEN + STREAM_NONCE_LEN]);
    let mut sponge = Sponge::shake256();
    sponge.absorb_unchecked(iv);
    sponge.squeeze(&mut derived[..]);

    let (key, nonce) = derived.split_at(STREAM_KEY_LEN);
    let mut cipher = Salsa20::new(Key::from_slice(key), Nonce::from_slice(nonce));
    cipher.apply_keystream(buf);
}

/// Package `message`, returning the ciphertext and a `tag_len` byte tag.
pub fn package_keyed<R: RngCore + CryptoRng>(
    rng: &mut R,
    key: &PackageKey,
    message: &[u8],
    tag_len: usize,
) -> Result<(Vec<u8>, Vec<u8>), Error> {
    check_tag_len(tag_len)?;
    let len_byte = [tag_len as u8];
    let mut mac = key.mac();

    let mut random = Zeroizing::new(vec![0u8; tag_len]);
    rng.try_fill_bytes(&mut random[..])
        .map_err(|_| Error::EntropySource)?;
    // Rebinding to the message keeps the IV at least as hard to guess as the
    // message, even if the RNG is broken.
    let mut iv = Zeroizing::new(vec![0u8; tag_len]);
    mac.compute(&[&len_byte[..], &random[..], message], &mut iv[..])?;

    let mut ciphertext = message.to_vec();
    apply_keystream(&iv, &mut ciphertext);

    let mut tag = vec![0u8; tag_len];
    mac.compute(&[&len_byte[..], &ciphertext[..]], &mut tag)?;
    for (t, v) in tag.iter_mut().zip(iv.iter()) {
        *t ^= v;
    }
    Ok((ciphertext, tag))
}

/// Recover the message from a ciphertext and tag made by [`package_keyed`].
///
/// There is no authentication: a modified package unpackages to garbage.
pub fn unpackage_keyed(
    key: &PackageKey,
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, Error> {
    check_tag_len(tag.len())?;
    let len_byte = [tag.len() as u8];

    let mut iv = Zeroizing::new(vec![0u8; tag.len()]);
    key.mac().compute(&[&len_byte[..], ciphertext], &mut iv[..])?;
    for (v, t) in iv.iter_mut().zip(tag) {
        *v ^= t;
    }

    let mut message = ciphertext.to_vec();
    apply_keystream(&iv, &mut message);
    Ok(message)
}

/// Package `message` into a single `ciphertext || tag` buffer.
pub fn package<R: RngCore + CryptoRng>(
    rng: &mut R,
    key: &PackageKey,
    message: &[u8],
    tag_len: usize,
) -> Result<Vec<u8>, Error> {
    let (mut out, tag) = package_keyed(rng, key, message, tag_len)?;
    out.extend_from_slice(&tag);
    Ok(out)
}

/// [`package`], drawing the random pad from the operating system.
pub fn package_with_os_rng(
    key: &PackageKey,
    message: &[u8],
    tag_len: usize,
) -> Result<Vec<u8>, Error> {
    package(&mut OsRng, key, message, tag_len)
}

/// Unpackage a `ciphertext || tag` buffer made by [`package`].
pub fn unpackage(key: &PackageKey, packaged: &[u8], tag_len: usize) -> Result<Vec<u8>, Error> {
    check_tag_len(tag_len)?;
    if packaged.len() < tag_len {
        return Err(Error::TruncatedInput {
            len: packaged.len(),
            min: tag_len,
        });
    }
    let (ciphertext, tag) = packaged.split_at(packaged.len() - tag_len);
    unpackage_keyed(key, ciphertext, tag)
}
