use crate::aont::{self, PackageKey};
use crate::siv::{self, Siv};
use crate::sponge::{Sponge, SpongeKind, DS_SHAKE};
use crate::stream::StreamAead;
use crate::{Error, VecMac};
use proptest::{collection::vec, prelude::*};
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn arb_data() -> impl Strategy<Value = Vec<u8>> {
    vec(any::<u8>(), 0..400)
}

fn arb_kind() -> impl Strategy<Value = SpongeKind> {
    use SpongeKind::*;

    prop_oneof![
        Just(Shake128),
        Just(Shake256),
        Just(Sha3_224),
        Just(Sha3_256),
        Just(Sha3_384),
        Just(Sha3_512),
        (1usize..=200, any::<u8>()).prop_map(|(rate, ds)| Custom { rate, ds }),
    ]
}

prop_compose! {
    /// Some data, and a point to split it at.
    fn arb_split()(data in arb_data())(split in 0..=data.len(), data in Just(data)) -> (Vec<u8>, usize) {
        (data, split)
    }
}

prop_compose! {
    /// A message, with a bit index inside it to flip.
    fn arb_flip(min_len: usize)(data in vec(any::<u8>(), min_len..300))(bit in 0..data.len() * 8, data in Just(data)) -> (Vec<u8>, usize) {
        (data, bit)
    }
}

fn squeeze_all(kind: SpongeKind, data: &[u8], len: usize) -> Vec<u8> {
    let mut sponge = Sponge::new(kind).unwrap();
    sponge.absorb(data).unwrap();
    sponge.squeeze_vec(len)
}

proptest! {
    #[test]
    fn test_squeeze_granularity(kind in arb_kind(), data in arb_data(), len in 0usize..500) {
        let bulk = squeeze_all(kind, &data, len);

        let mut sponge = Sponge::new(kind).unwrap();
        sponge.absorb(&data).unwrap();
        let mut single = Vec::new();
        let mut byte = [0u8; 1];
        for _ in 0..len {
            if sponge.squeeze(&mut byte) == 0 {
                break;
            }
            single.push(byte[0]);
        }

        assert_eq!(bulk, single);
        match kind.output_len() {
            Some(budget) => assert_eq!(bulk.len(), len.min(budget)),
            None => assert_eq!(bulk.len(), len),
        }
    }

    #[test]
    fn test_absorb_granularity(kind in arb_kind(), (data, split) in arb_split()) {
        let whole = squeeze_all(kind, &data, 64);

        let mut sponge = Sponge::new(kind).unwrap();
        sponge.absorb(&data[..split]).unwrap();
        sponge.absorb(&data[split..]).unwrap();
        assert_eq!(sponge.squeeze_vec(64), whole);
    }

    #[test]
    fn test_custom_rate_matches_shake(data in arb_data()) {
        let custom = squeeze_all(SpongeKind::Custom { rate: 168, ds: DS_SHAKE }, &data, 200);
        assert_eq!(custom, squeeze_all(SpongeKind::Shake128, &data, 200));
    }

    #[test]
    fn test_vecmac_order(key in arb_data(), a in arb_data(), b in arb_data()) {
        prop_assume!(a != b);
        let mut mac = VecMac::new(&key);
        let ab = mac.mac(&[&a[..], &b[..]], 32).unwrap();
        let ba = mac.mac(&[&b[..], &a[..]], 32).unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_vecmac_concatenation(key in arb_data(), (data, split) in arb_split()) {
        let mut mac = VecMac::new(&key);
        let parts = mac.mac(&[&data[..split], &data[split..]], 32).unwrap();
        let joined = mac.mac(&[&data[..]], 32).unwrap();
        assert_ne!(parts, joined);
    }

    #[test]
    fn test_siv_round_trip(key in arb_data(), nonce in arb_data(), ad in arb_data(), message in arb_data()) {
        let siv = Siv::new(&key, ad.len());
        let (ciphertext, tag) = siv.seal(&nonce, &ad, &message).unwrap();
        assert_eq!(ciphertext.len(), message.len());
        assert_eq!(siv.seal(&nonce, &ad, &message).unwrap(), (ciphertext.clone(), tag));
        assert_eq!(siv.unseal(&nonce, &ad, &ciphertext, &tag).unwrap(), message);
    }

    #[test]
    fn test_siv_flip(key in arb_data(), (message, bit) in arb_flip(1)) {
        let siv = Siv::new(&key, 0);
        let sealed = siv.seal_to_vec(b"nonce", b"", &message).unwrap();

        // Flip a bit in the tag, or in the ciphertext.
        for i in [bit % (siv::TAG_LEN * 8), siv::TAG_LEN * 8 + bit] {
            let mut corrupted = sealed.clone();
            corrupted[i / 8] ^= 1 << (i % 8);
            assert_eq!(
                siv.unseal_from_slice(b"nonce", b"", &corrupted),
                Err(Error::AuthenticationFailure)
            );
        }
    }

    #[test]
    fn test_stream_round_trip(seed in any::<u64>(), key in arb_data(), plaintext in arb_data(), ad in arb_data()) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let aead = StreamAead::new(&key, b"context");
        let sealed = aead.seal(&mut rng, &plaintext, &ad).unwrap();
        assert_eq!(aead.open(&sealed, &ad).unwrap(), plaintext);

        let mut other_ad = ad.clone();
        other_ad.push(0);
        assert_eq!(aead.open(&sealed, &other_ad), Err(Error::AuthenticationFailure));
    }

    #[test]
    fn test_stream_flip(seed in any::<u64>(), (plaintext, bit) in arb_flip(1)) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let aead = StreamAead::new(b"key", b"context");
        let sealed = aead.seal(&mut rng, &plaintext, b"ad").unwrap();
        let i = aead.overhead() * 8 + bit;
        let mut corrupted = sealed.clone();
        corrupted[i / 8] ^= 1 << (i % 8);
        assert_eq!(aead.open(&corrupted, b"ad"), Err(Error::AuthenticationFailure));
    }

    #[test]
    fn test_aont_round_trip(seed in any::<u64>(), key in any::<[u8; 32]>(), message in arb_data(), tag_len in aont::MIN_TAG_LEN..=aont::MAX_TAG_LEN) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let key = PackageKey::new(key);
        let packaged = aont::package(&mut rng, &key, &message, tag_len).unwrap();
        assert_eq!(packaged.len(), message.len() + tag_len);
        assert_eq!(aont::unpackage(&key, &packaged, tag_len).unwrap(), message);
    }

    #[test]
    fn test_aont_all_or_nothing(seed in any::<u64>(), key in any::<[u8; 32]>(), message in vec(any::<u8>(), 64..300), tag_len in aont::MIN_TAG_LEN..=aont::MAX_TAG_LEN, flip in any::<prop::sample::Index>()) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let key = PackageKey::new(key);
        let mut packaged = aont::package(&mut rng, &key, &message, tag_len).unwrap();
        // The flipped bit lands anywhere in the ciphertext or the tag.
        let i = flip.index(packaged.len() * 8);
        packaged[i / 8] ^= 1 << (i % 8);

        let garbled = aont::unpackage(&key, &packaged, tag_len).unwrap();
        let total = (message.len() * 8) as u32;
        let distance: u32 = garbled
            .iter()
            .zip(&message)
            .map(|(x, y)| (x ^ y).count_ones())
            .sum();
        // At least 512 bits, so a quarter either side of half is very generous.
        assert!(distance > total / 4 && distance < 3 * total / 4);
    }
}
