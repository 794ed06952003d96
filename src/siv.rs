//! A synthetic IV AEAD.
//!
//! The tag is a vector MAC over the nonce, associated data, and message. The
//! AES-256-CTR key and IV are then derived from the key and that tag, never
//! from the nonce directly. Sealing is deterministic: reusing a nonce only
//! reveals whether two messages were equal.
//!
//! `seal` returns the ciphertext and tag separately. The single buffer
//! encodings are `tag || ciphertext` for [`Siv::seal_to_vec`], and
//! `nonce || tag || associated data || ciphertext` for [`Siv::seal_serialized`].
use crate::error::Error;
use crate::sponge::Sponge;
use crate::vecmac::VecMac;
use aes::Aes256;
use alloc::vec::Vec;
use core::fmt;
use ctr::cipher::{Iv, Key, KeyIvInit, StreamCipher};
use rand_core::{CryptoRng, OsRng, RngCore};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// The length of the authentication tag.
pub const TAG_LEN: usize = 24;
/// The length of the nonce drawn by [`Siv::seal_serialized`].
pub const NONCE_LEN: usize = 24;
const CIPHER_KEY_LEN: usize = 32;
const CIPHER_IV_LEN: usize = 16;

// Domain separators between the fields of the tag and the key derivation.
const DS_NONCE: &[u8] = b"n";
const DS_AD: &[u8] = b"a";
const DS_MESSAGE: &[u8] = b"m";
const DS_TAG: &[u8] = b"t";

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// A key, together with the length of associated data it authenticates.
#[derive(Clone, ZeroizeOnDrop)]
pub struct Siv {
    key: Vec<u8>,
    #[zeroize(skip)]
    ad_len: usize,
}

impl fmt::Debug for Siv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Siv")
            .field("ad_len", &self.ad_len)
            .finish_non_exhaustive()
    }
}

impl Siv {
    pub fn new(key: &[u8], ad_len: usize) -> Self {
        Self {
            key: key.to_vec(),
            ad_len,
        }
    }

    pub fn ad_len(&self) -> usize {
        self.ad_len
    }

    fn check_ad(&self, ad: &[u8]) -> Result<(), Error> {
        if ad.len() != self.ad_len {
            tracing::debug!(
                len = ad.len(),
                expected = self.ad_len,
                "rejected associated data length"
            );
            return Err(Error::AssociatedDataLength {
                len: ad.len(),
                expected: self.ad_len,
            });
        }
        Ok(())
    }

    fn tag(&self, nonce: &[u8], ad: &[u8], message: &[u8]) -> Result<[u8; TAG_LEN], Error> {
        let mut tag = [0u8; TAG_LEN];
        VecMac::new(&self.key).compute(
            &[DS_NONCE, nonce, DS_AD, ad, DS_MESSAGE, message],
            &mut tag,
        )?;
        Ok(tag)
    }

    /// XOR the keystream derived from `tag` into `buf`.
    fn apply_keystream(&self, tag: &[u8], buf: &mut [u8]) {
        let mut derived = Zeroizing::new([0u8; CIPHER_KEY_LEN + CIPHER_IV_LEN]);
        let mut sponge = Sponge::shake256();
        sponge.absorb_unchecked(&self.key);
        sponge.absorb_unchecked(DS_TAG);
        sponge.absorb_unchecked(tag);
        sponge.squeeze(&mut derived[..]);

        let (key, iv) = derived.split_at(CIPHER_KEY_LEN);
        let mut cipher = Aes256Ctr::new(
            Key::<Aes256Ctr>::from_slice(key),
            Iv::<Aes256Ctr>::from_slice(iv),
        );
        cipher.apply_keystream(buf);
    }

    /// Encrypt `message`, returning the ciphertext and tag.
    pub fn seal(
        &self,
        nonce: &[u8],
        ad: &[u8],
        message: &[u8],
    ) -> Result<(Vec<u8>, [u8; TAG_LEN]), Error> {
        self.check_ad(ad)?;
        let tag = self.tag(nonce, ad, message)?;
        let mut ciphertext = message.to_vec();
        self.apply_keystream(&tag, &mut ciphertext);
        Ok((ciphertext, tag))
    }

    /// Decrypt and verify, releasing the message only if the tag matches.
    pub fn unseal(
        &self,
        nonce: &[u8],
        ad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<Vec<u8>, Error> {
        self.check_ad(ad)?;
        if tag.len() != TAG_LEN {
            return Err(Error::InvalidTagLength {
                len: tag.len(),
                min: TAG_LEN,
                max: TAG_LEN,
            });
        }

        let mut message = ciphertext.to_vec();
        self.apply_keystream(tag, &mut message);
        let expected = self.tag(nonce, ad, &message)?;
        if bool::from(expected[..].ct_eq(tag)) {
            Ok(message)
        } else {
            message.zeroize();
            tracing::debug!(len = ciphertext.len(), "SIV tag mismatch");
            Err(Error::AuthenticationFailure)
        }
    }

    /// Seal into a single `tag || ciphertext` buffer.
    pub fn seal_to_vec(&self, nonce: &[u8], ad: &[u8], message: &[u8]) -> Result<Vec<u8>, Error> {
        let (ciphertext, tag) = self.seal(nonce, ad, message)?;
        let mut out = Vec::with_capacity(TAG_LEN + ciphertext.len());
        out.extend_from_slice(&tag);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Open a `tag || ciphertext` buffer produced by [`Siv::seal_to_vec`].
    pub fn unseal_from_slice(
        &self,
        nonce: &[u8],
        ad: &[u8],
        sealed: &[u8],
    ) -> Result<Vec<u8>, Error> {
        if sealed.len() < TAG_LEN {
            return Err(Error::TruncatedInput {
                len: sealed.len(),
                min: TAG_LEN,
            });
        }
        let (tag, ciphertext) = sealed.split_at(TAG_LEN);
        self.unseal(nonce, ad, ciphertext, tag)
    }

    /// Seal under a fresh random nonce, carrying the nonce and associated data along.
    ///
    /// The output is `nonce || tag || ad || ciphertext`.
    pub fn seal_serialized<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        ad: &[u8],
        message: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let mut nonce = [0u8; NONCE_LEN];
        rng.try_fill_bytes(&mut nonce)
            .map_err(|_| Error::EntropySource)?;
        let (ciphertext, tag) = self.seal(&nonce, ad, message)?;

        let mut out = Vec::with_capacity(NONCE_LEN + TAG_LEN + ad.len() + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&tag);
        out.extend_from_slice(ad);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// [`Siv::seal_serialized`], drawing the nonce from the operating system.
    pub fn seal_serialized_with_os_rng(
        &self,
        ad: &[u8],
        message: &[u8],
    ) -> Result<Vec<u8>, Error> {
        self.seal_serialized(&mut OsRng, ad, message)
    }

    /// Open the output of [`Siv::seal_serialized`], returning the associated data and message.
    pub fn open_serialized(&self, sealed: &[u8]) -> Result<(Vec<u8>, Vec<u8>), Error> {
        let min = NONCE_LEN + TAG_LEN + self.ad_len;
        if sealed.len() < min {
            return Err(Error::TruncatedInput {
                len: sealed.len(),
                min,
            });
        }
        let (nonce, rest) = sealed.split_at(NONCE_LEN);
        let (tag, rest) = rest.split_at(TAG_LEN);
        let (ad, ciphertext) = rest.split_at(self.ad_len);
        let message = self.unseal(nonce, ad, ciphertext, tag)?;
        Ok((ad.to_vec(), message))
    }
}
