//! A random-nonce AEAD built from SHAKE256 and XSalsa20.
//!
//! Sealed messages are laid out as `nonce(24) || tag(32) || ciphertext`.
use crate::error::Error;
use crate::sponge::Sponge;
use alloc::vec::Vec;
use core::fmt;
use rand_core::{CryptoRng, OsRng, RngCore};
use salsa20::cipher::{KeyIvInit, StreamCipher};
use salsa20::{Key, XNonce, XSalsa20};
use subtle::ConstantTimeEq;
use zeroize::ZeroizeOnDrop;

/// The length of each derived sub-key.
pub const KEY_LEN: usize = 32;
/// The length of the per-message nonce.
pub const NONCE_LEN: usize = 24;
/// The length of the authentication tag.
pub const TAG_LEN: usize = 32;
/// The length of the XSalsa20 IV.
const IV_LEN: usize = 24;

/// A context holding the hash and cipher keys derived from a key and context nonce.
#[derive(Clone, ZeroizeOnDrop)]
pub struct StreamAead {
    hash_key: [u8; KEY_LEN],
    cipher_key: [u8; KEY_LEN],
}

impl fmt::Debug for StreamAead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamAead: KEYS OMITTED")
    }
}

impl StreamAead {
    /// Derive a context from `key` and a long term `nonce`.
    ///
    /// The nonce here discriminates contexts, it is not a per-message nonce.
    pub fn new(key: &[u8], nonce: &[u8]) -> Self {
        let mut sponge = Sponge::shake256();
        sponge.absorb_unchecked(key);
        sponge.absorb_unchecked(nonce);
        let mut out = Self {
            hash_key: [0u8; KEY_LEN],
            cipher_key: [0u8; KEY_LEN],
        };
        sponge.squeeze(&mut out.hash_key);
        sponge.squeeze(&mut out.cipher_key);
        out
    }

    /// The number of bytes sealing adds to a plaintext.
    pub fn overhead(&self) -> usize {
        NONCE_LEN + TAG_LEN
    }

    /// A sponge with the hash key, nonce and associated data absorbed.
    fn keyed(&self, nonce: &[u8], ad: &[u8]) -> Sponge {
        let mut sponge = Sponge::shake256();
        sponge.absorb_unchecked(&self.hash_key);
        sponge.absorb_unchecked(nonce);
        sponge.absorb_unchecked(ad);
        sponge
    }

    fn apply_keystream(&self, nonce: &[u8], ad: &[u8], buf: &mut [u8]) {
        let mut iv = [0u8; IV_LEN];
        self.keyed(nonce, ad).squeeze(&mut iv);
        let mut cipher =
            XSalsa20::new(Key::from_slice(&self.cipher_key), XNonce::from_slice(&iv));
        cipher.apply_keystream(buf);
    }

    fn tag(&self, nonce: &[u8], ad: &[u8], ciphertext: &[u8]) -> [u8; TAG_LEN] {
        let mut sponge = self.keyed(nonce, ad);
        sponge.absorb_unchecked(ciphertext);
        let mut tag = [0u8; TAG_LEN];
        sponge.squeeze(&mut tag);
        tag
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    pub fn seal<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        plaintext: &[u8],
        ad: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let mut nonce = [0u8; NONCE_LEN];
        rng.try_fill_bytes(&mut nonce)
            .map_err(|_| Error::EntropySource)?;

        let mut out = Vec::with_capacity(self.overhead() + plaintext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&[0u8; TAG_LEN]);
        out.extend_from_slice(plaintext);

        let (header, ciphertext) = out.split_at_mut(NONCE_LEN + TAG_LEN);
        self.apply_keystream(&nonce, ad, ciphertext);
        let tag = self.tag(&nonce, ad, ciphertext);
        header[NONCE_LEN..].copy_from_slice(&tag);
        Ok(out)
    }

    /// [`StreamAead::seal`], drawing the nonce from the operating system.
    pub fn seal_with_os_rng(&self, plaintext: &[u8], ad: &[u8]) -> Result<Vec<u8>, Error> {
        self.seal(&mut OsRng, plaintext, ad)
    }

    /// Verify and decrypt the output of [`StreamAead::seal`].
    ///
    /// Nothing is decrypted unless the tag matches.
    pub fn open(&self, sealed: &[u8], ad: &[u8]) -> Result<Vec<u8>, Error> {
        if sealed.len() < self.overhead() {
            tracing::debug!(len = sealed.len(), "sealed message too short");
            return Err(Error::AuthenticationFailure);
        }
        let (nonce, rest) = sealed.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let expected = self.tag(nonce, ad, ciphertext);
        if !bool::from(expected[..].ct_eq(tag)) {
            tracing::debug!(len = ciphertext.len(), "stream tag mismatch");
            return Err(Error::AuthenticationFailure);
        }

        let mut plaintext = ciphertext.to_vec();
        self.apply_keystream(nonce, ad, &mut plaintext);
        Ok(plaintext)
    }
}
