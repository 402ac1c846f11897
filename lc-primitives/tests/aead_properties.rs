//! Property tests over the three AEAD families.

#![allow(clippy::unwrap_used)]

use lc_primitives::{Aead, AesGcm, HashAead, KmacAead, Sha3_512};
use proptest::prelude::*;

fn roundtrip<A: Aead>(
    aead: &mut A,
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    pt: &[u8],
    taglen: usize,
) {
    let mut ct = vec![0u8; pt.len()];
    let mut tag = vec![0u8; taglen];
    aead.set_key(key, iv).unwrap();
    aead.encrypt(pt, &mut ct, aad, &mut tag).unwrap();

    let mut decrypted = vec![0u8; pt.len()];
    aead.set_key(key, iv).unwrap();
    aead.decrypt(&ct, &mut decrypted, aad, &tag).unwrap();
    assert_eq!(decrypted, pt);

    // Any single-bit flip in ciphertext or tag must be rejected.
    if !ct.is_empty() {
        let mut bad = ct.clone();
        bad[pt.len() / 2] ^= 0x01;
        aead.set_key(key, iv).unwrap();
        let mut sink = vec![0u8; pt.len()];
        assert_eq!(
            aead.decrypt(&bad, &mut sink, aad, &tag),
            Err(lc_core::Error::TagMismatch)
        );
    }
    let mut bad_tag = tag.clone();
    bad_tag[taglen - 1] ^= 0x80;
    aead.set_key(key, iv).unwrap();
    let mut sink = vec![0u8; pt.len()];
    assert_eq!(
        aead.decrypt(&ct, &mut sink, aad, &bad_tag),
        Err(lc_core::Error::TagMismatch)
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn gcm_roundtrip(
        key in prop::array::uniform32(any::<u8>()),
        iv in prop::collection::vec(any::<u8>(), 1..32),
        aad in prop::collection::vec(any::<u8>(), 0..64),
        pt in prop::collection::vec(any::<u8>(), 0..512),
        taglen in 4usize..=16,
    ) {
        let mut gcm = AesGcm::new();
        roundtrip(&mut gcm, &key, &iv, &aad, &pt, taglen);
    }

    #[test]
    fn hash_aead_roundtrip(
        key in prop::collection::vec(any::<u8>(), 1..64),
        iv in prop::collection::vec(any::<u8>(), 0..32),
        aad in prop::collection::vec(any::<u8>(), 0..64),
        pt in prop::collection::vec(any::<u8>(), 0..512),
        taglen in 16usize..=64,
    ) {
        let mut aead = HashAead::<Sha3_512>::new();
        roundtrip(&mut aead, &key, &iv, &aad, &pt, taglen);
    }

    #[test]
    fn kmac_aead_roundtrip(
        key in prop::collection::vec(any::<u8>(), 1..64),
        iv in prop::collection::vec(any::<u8>(), 0..32),
        aad in prop::collection::vec(any::<u8>(), 0..64),
        pt in prop::collection::vec(any::<u8>(), 0..512),
        taglen in 16usize..=64,
    ) {
        let mut aead = KmacAead::new();
        roundtrip(&mut aead, &key, &iv, &aad, &pt, taglen);
    }

    #[test]
    fn gcm_streamed_equals_one_shot(
        pt in prop::collection::vec(any::<u8>(), 1..256),
        split in any::<prop::sample::Index>(),
    ) {
        let key = [0x24u8; 32];
        let iv = [0x42u8; 12];
        let cut = split.index(pt.len());

        let mut gcm = AesGcm::new();
        gcm.set_key(&key, &iv).unwrap();
        let mut ct_oneshot = vec![0u8; pt.len()];
        let mut tag_oneshot = [0u8; 16];
        gcm.encrypt(&pt, &mut ct_oneshot, b"aad", &mut tag_oneshot).unwrap();

        gcm.set_key(&key, &iv).unwrap();
        gcm.enc_init(b"aad").unwrap();
        let mut ct_streamed = vec![0u8; pt.len()];
        gcm.enc_update(&pt[..cut], &mut ct_streamed[..cut]).unwrap();
        gcm.enc_update(&pt[cut..], &mut ct_streamed[cut..]).unwrap();
        let mut tag_streamed = [0u8; 16];
        gcm.enc_final(&mut tag_streamed).unwrap();

        prop_assert_eq!(ct_oneshot, ct_streamed);
        prop_assert_eq!(tag_oneshot, tag_streamed);
    }
}

#[test]
fn aad_only_messages_authenticate() {
    // Empty plaintext still yields a usable, tamper-evident tag.
    let mut gcm = AesGcm::new();
    gcm.set_key(&[0x77; 16], &[0x01; 12]).unwrap();
    let mut tag = [0u8; 16];
    gcm.encrypt(&[], &mut [], b"only aad", &mut tag).unwrap();

    gcm.set_key(&[0x77; 16], &[0x01; 12]).unwrap();
    assert!(gcm.decrypt(&[], &mut [], b"only aad", &tag).is_ok());

    gcm.set_key(&[0x77; 16], &[0x01; 12]).unwrap();
    assert_eq!(
        gcm.decrypt(&[], &mut [], b"only aaD", &tag),
        Err(lc_core::Error::TagMismatch)
    );
}
