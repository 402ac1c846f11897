//! KMAC AEAD: KMAC-DRNG keystream with KMAC-256 authentication.
//!
//! The Encrypt-then-MAC shape of the hash AEAD with both roles handed to
//! Keccak: the keystream comes from the fast-key-erasure KMAC-DRNG, the
//! tag from a KMAC instance keyed by an independent DRNG output. The two
//! roles are domain-separated by customization strings.

use zeroize::{Zeroize, ZeroizeOnDrop};

use lc_core::status::{self, AlgorithmId};
use lc_core::{Error, Result};

use super::{Aead, Direction, Fsm};
use crate::drbg::Drbg;
use crate::drbg::kmac_drng::KmacDrng;
use crate::mac::kmac::Kmac256;

/// Keystream bytes held between generate calls.
pub const KEYSTREAM_BLOCK: usize = 136;

/// Authentication key size in bytes.
pub const AUTH_KEY_SIZE: usize = 64;

/// Largest tag the KMAC XOF finalization hands out here.
pub const MAX_TAG_SIZE: usize = 64;

const AUTH_CUSTOMIZATION: &[u8] = b"KMAC-AEAD auth";

/// KMAC AEAD state.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KmacAead {
    drbg: KmacDrng,
    auth: Option<Kmac256>,
    keystream: [u8; KEYSTREAM_BLOCK],
    ks_ptr: usize,
    #[zeroize(skip)]
    fsm: Fsm,
}

impl KmacAead {
    /// Fresh, unkeyed instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            drbg: KmacDrng::new(),
            auth: None,
            keystream: [0u8; KEYSTREAM_BLOCK],
            ks_ptr: KEYSTREAM_BLOCK,
            fsm: Fsm::Fresh,
        }
    }

    fn set_key_nocheck(&mut self, key: &[u8], iv: &[u8]) -> Result<()> {
        self.fsm = self.fsm.on_set_key()?;
        if key.is_empty() {
            self.fsm = Fsm::Fresh;
            return Err(Error::InvalidArgument("AEAD requires a key"));
        }

        self.drbg.zero();
        self.drbg.seed(key, iv)?;

        let mut auth_key = [0u8; AUTH_KEY_SIZE];
        self.drbg.generate(&[], &mut auth_key)?;
        self.auth = Some(Kmac256::new(&auth_key, AUTH_CUSTOMIZATION)?);
        auth_key.zeroize();

        self.drbg.generate(&[], &mut self.keystream)?;
        self.ks_ptr = 0;
        Ok(())
    }

    fn auth(&mut self) -> Result<&mut Kmac256> {
        self.auth.as_mut().ok_or(Error::InvalidState("cipher is not keyed"))
    }

    fn crypt(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        let mut done = 0;
        while done < input.len() {
            if self.ks_ptr >= KEYSTREAM_BLOCK {
                self.drbg.generate(&[], &mut self.keystream)?;
                self.ks_ptr = 0;
            }
            let todo = (input.len() - done).min(KEYSTREAM_BLOCK - self.ks_ptr);
            for i in 0..todo {
                output[done + i] = input[done + i] ^ self.keystream[self.ks_ptr + i];
            }
            self.ks_ptr += todo;
            done += todo;
        }
        Ok(())
    }

    fn produce_tag(&mut self, tag: &mut [u8]) -> Result<()> {
        if tag.is_empty() || tag.len() > MAX_TAG_SIZE {
            return Err(Error::InvalidArgument("tag length must be 1..=64"));
        }
        self.auth()?.final_xof(tag)
    }
}

impl Default for KmacAead {
    fn default() -> Self {
        Self::new()
    }
}

impl Aead for KmacAead {
    fn set_key(&mut self, key: &[u8], iv: &[u8]) -> Result<()> {
        status::run_once(AlgorithmId::KmacAead, kat_kmac_aead)?;
        self.set_key_nocheck(key, iv)
    }

    fn encrypt(
        &mut self,
        plaintext: &[u8],
        ciphertext: &mut [u8],
        aad: &[u8],
        tag: &mut [u8],
    ) -> Result<()> {
        if !matches!(self.fsm, Fsm::Keyed) {
            return Err(Error::InvalidState("one-shot requires a fresh key"));
        }
        self.enc_init(aad)?;
        self.enc_update(plaintext, ciphertext)?;
        self.enc_final(tag)
    }

    fn decrypt(
        &mut self,
        ciphertext: &[u8],
        plaintext: &mut [u8],
        aad: &[u8],
        tag: &[u8],
    ) -> Result<()> {
        if !matches!(self.fsm, Fsm::Keyed) {
            return Err(Error::InvalidState("one-shot requires a fresh key"));
        }
        self.dec_init(aad)?;
        self.dec_update(ciphertext, plaintext)?;
        self.dec_final(tag).inspect_err(|_| plaintext.zeroize())
    }

    fn enc_init(&mut self, aad: &[u8]) -> Result<()> {
        self.fsm = self.fsm.on_aad(Direction::Encrypt)?;
        self.auth()?.update(aad)
    }

    fn enc_update(&mut self, plaintext: &[u8], ciphertext: &mut [u8]) -> Result<()> {
        if plaintext.len() != ciphertext.len() {
            return Err(Error::InvalidArgument("in/out length mismatch"));
        }
        self.fsm = self.fsm.on_update(Direction::Encrypt)?;
        self.crypt(plaintext, ciphertext)?;
        self.auth()?.update(ciphertext)?;
        lc_core::unpoison(ciphertext);
        Ok(())
    }

    fn enc_final(&mut self, tag: &mut [u8]) -> Result<()> {
        self.fsm = self.fsm.on_final(Direction::Encrypt)?;
        self.produce_tag(tag)?;
        lc_core::unpoison(tag);
        Ok(())
    }

    fn dec_init(&mut self, aad: &[u8]) -> Result<()> {
        self.fsm = self.fsm.on_aad(Direction::Decrypt)?;
        self.auth()?.update(aad)
    }

    fn dec_update(&mut self, ciphertext: &[u8], plaintext: &mut [u8]) -> Result<()> {
        if plaintext.len() != ciphertext.len() {
            return Err(Error::InvalidArgument("in/out length mismatch"));
        }
        self.fsm = self.fsm.on_update(Direction::Decrypt)?;
        self.auth()?.update(ciphertext)?;
        self.crypt(ciphertext, plaintext)
    }

    fn dec_final(&mut self, tag: &[u8]) -> Result<()> {
        if tag.is_empty() || tag.len() > MAX_TAG_SIZE {
            return Err(Error::InvalidArgument("tag length must be 1..=64"));
        }
        self.fsm = self.fsm.on_final(Direction::Decrypt)?;
        let mut expected = [0u8; MAX_TAG_SIZE];
        let len = tag.len();
        self.produce_tag(&mut expected[..len])?;
        let ok = lc_core::ct_eq(&expected[..len], tag);
        expected.zeroize();
        if ok { Ok(()) } else { Err(Error::TagMismatch) }
    }

    fn zero(&mut self) {
        self.drbg.zero();
        if let Some(mut auth) = self.auth.take() {
            auth.zero();
        }
        self.keystream.zeroize();
        self.ks_ptr = KEYSTREAM_BLOCK;
        self.fsm = Fsm::Fresh;
    }
}

/// Glue check mirroring the hash-AEAD latch: keystream XOR, KMAC tag over
/// AAD and ciphertext, round trip and tamper rejection.
fn kat_kmac_aead() -> Result<()> {
    let key = [status::fips140_mod(0x10), 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17];
    let iv = [0x0fu8; 12];
    let pt = [0x55u8; 32];
    let aad = [0xee, 0xdd];

    let mut aead = KmacAead::new();
    aead.set_key_nocheck(&key, &iv)?;
    let mut ct = [0u8; 32];
    let mut tag = [0u8; 64];
    aead.encrypt(&pt, &mut ct, &aad, &mut tag)?;

    // Reference keystream from an identically seeded DRNG.
    let mut drbg = KmacDrng::new();
    drbg.seed(&key, &iv)?;
    let mut auth_key = [0u8; AUTH_KEY_SIZE];
    drbg.generate(&[], &mut auth_key)?;
    let mut keystream = [0u8; KEYSTREAM_BLOCK];
    drbg.generate(&[], &mut keystream)?;
    let mut expected_ct = [0u8; 32];
    for i in 0..32 {
        expected_ct[i] = pt[i] ^ keystream[i];
    }
    status::compare_selftest(AlgorithmId::KmacAead, &ct, &expected_ct)?;

    // Reference tag.
    let mut kmac = Kmac256::new(&auth_key, AUTH_CUSTOMIZATION)?;
    kmac.update(&aad)?;
    kmac.update(&ct)?;
    let mut expected_tag = [0u8; 64];
    kmac.final_xof(&mut expected_tag)?;
    status::compare_selftest(AlgorithmId::KmacAead, &tag, &expected_tag)?;

    // Round trip and single-bit rejection.
    aead.set_key_nocheck(&key, &iv)?;
    let mut decrypted = [0u8; 32];
    aead.decrypt(&ct, &mut decrypted, &aad, &tag)?;
    status::compare_selftest(AlgorithmId::KmacAead, &decrypted, &pt)?;

    aead.set_key_nocheck(&key, &iv)?;
    ct[3] ^= 0x08;
    if aead.decrypt(&ct, &mut decrypted, &aad, &tag) != Err(Error::TagMismatch) {
        return Err(Error::SelftestFailed(AlgorithmId::KmacAead));
    }
    aead.zero();
    auth_key.zeroize();
    keystream.zeroize();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let mut aead = KmacAead::new();
        aead.set_key(b"kmac aead key", b"iv").unwrap();
        let pt = b"keccak keyed both ways";
        let mut ct = vec![0u8; pt.len()];
        let mut tag = [0u8; 64];
        aead.encrypt(pt, &mut ct, b"aad", &mut tag).unwrap();

        aead.set_key(b"kmac aead key", b"iv").unwrap();
        let mut decrypted = vec![0u8; pt.len()];
        aead.decrypt(&ct, &mut decrypted, b"aad", &tag).unwrap();
        assert_eq!(decrypted, pt);
    }

    #[test]
    fn truncated_tag_roundtrips_and_rejects_flips() {
        let mut aead = KmacAead::new();
        aead.set_key(b"key", b"iv").unwrap();
        let pt = [0x77u8; 200];
        let mut ct = [0u8; 200];
        let mut tag = [0u8; 16];
        aead.encrypt(&pt, &mut ct, b"", &mut tag).unwrap();

        aead.set_key(b"key", b"iv").unwrap();
        let mut decrypted = [0u8; 200];
        aead.decrypt(&ct, &mut decrypted, b"", &tag).unwrap();
        assert_eq!(decrypted[..], pt[..]);

        let mut bad = tag;
        bad[8] ^= 0x20;
        aead.set_key(b"key", b"iv").unwrap();
        assert_eq!(
            aead.decrypt(&ct, &mut decrypted, b"", &bad),
            Err(Error::TagMismatch)
        );
    }

    #[test]
    fn streamed_equals_one_shot() {
        let pt: Vec<u8> = (0..255u8).collect();

        let mut aead = KmacAead::new();
        aead.set_key(b"key", b"iv").unwrap();
        let mut ct_oneshot = vec![0u8; pt.len()];
        let mut tag_oneshot = [0u8; 32];
        aead.encrypt(&pt, &mut ct_oneshot, b"aad", &mut tag_oneshot).unwrap();

        aead.set_key(b"key", b"iv").unwrap();
        aead.dec_init(b"aad").unwrap();
        let mut pt_streamed = vec![0u8; pt.len()];
        aead.dec_update(&ct_oneshot[..100], &mut pt_streamed[..100]).unwrap();
        aead.dec_update(&ct_oneshot[100..], &mut pt_streamed[100..]).unwrap();
        aead.dec_final(&tag_oneshot).unwrap();
        assert_eq!(pt_streamed, pt);
    }

    #[test]
    fn differs_from_hash_aead_under_same_key() {
        use super::super::hash_crypt::HashAead;
        use crate::hash::sha3::Sha3_512;

        let mut kmac_ct = [0u8; 16];
        let mut hash_ct = [0u8; 16];
        let mut tag_a = [0u8; 32];
        let mut tag_b = [0u8; 32];

        let mut a = KmacAead::new();
        a.set_key(b"shared key", b"iv").unwrap();
        a.encrypt(&[0u8; 16], &mut kmac_ct, b"", &mut tag_a).unwrap();

        let mut b = HashAead::<Sha3_512>::new();
        b.set_key(b"shared key", b"iv").unwrap();
        b.encrypt(&[0u8; 16], &mut hash_ct, b"", &mut tag_b).unwrap();

        assert_ne!(kmac_ct, hash_ct);
    }

    #[test]
    fn state_machine_enforced() {
        let mut aead = KmacAead::new();
        let mut tag = [0u8; 32];
        assert!(aead.enc_final(&mut tag).is_err());
        aead.set_key(b"key", b"iv").unwrap();
        aead.dec_init(b"aad").unwrap();
        assert!(aead.enc_update(b"wrong way", &mut [0u8; 9]).is_err());
    }
}
