//! AES-GCM (NIST SP 800-38D).
//!
//! The GHASH multiplier is a branchless shift-based GF(2^128) multiply,
//! so no key-dependent table is ever indexed. Streamed AAD and data are
//! buffered to 128-bit boundaries; the 12-byte IV takes the `IV || 1`
//! fast path and longer IVs derive J0 through GHASH as the mode requires.

use zeroize::{Zeroize, ZeroizeOnDrop};

use lc_core::status::{self, AlgorithmId};
use lc_core::{Error, Result};

use super::{Aead, Direction, Fsm};
use crate::sym::BlockCipher;
use crate::sym::aes::AesKey;

/// Largest tag GCM produces.
pub const MAX_TAG_SIZE: usize = 16;

/// Branchless multiply in GF(2^128) with the GCM reduction polynomial.
fn gf128_mul(x: u128, y: u128) -> u128 {
    const R: u128 = 0xe1 << 120;
    let mut z = 0u128;
    let mut v = x;
    for i in 0..128 {
        let bit = (y >> (127 - i)) & 1;
        z ^= bit.wrapping_neg() & v;
        let lsb = v & 1;
        v >>= 1;
        v ^= lsb.wrapping_neg() & R;
    }
    z
}

fn inc32(ctr: &mut [u8; 16]) {
    let mut word = [0u8; 4];
    word.copy_from_slice(&ctr[12..]);
    let next = u32::from_be_bytes(word).wrapping_add(1);
    ctr[12..].copy_from_slice(&next.to_be_bytes());
}

/// AES-GCM state.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AesGcm {
    aes: Option<AesKey>,
    h: u128,
    j0: [u8; 16],
    ctr: [u8; 16],
    ghash: u128,
    ghash_buf: [u8; 16],
    ghash_buflen: usize,
    keystream: [u8; 16],
    ks_used: usize,
    aad_len: u64,
    ct_len: u64,
    #[zeroize(skip)]
    fsm: Fsm,
}

impl AesGcm {
    /// Fresh, unkeyed instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            aes: None,
            h: 0,
            j0: [0u8; 16],
            ctr: [0u8; 16],
            ghash: 0,
            ghash_buf: [0u8; 16],
            ghash_buflen: 0,
            keystream: [0u8; 16],
            ks_used: 16,
            aad_len: 0,
            ct_len: 0,
            fsm: Fsm::Fresh,
        }
    }

    fn set_key_nocheck(&mut self, key: &[u8], iv: &[u8]) -> Result<()> {
        self.fsm = self.fsm.on_set_key()?;
        if iv.is_empty() {
            self.fsm = Fsm::Fresh;
            return Err(Error::InvalidArgument("GCM requires a non-empty IV"));
        }
        let aes = AesKey::new(key).inspect_err(|_| self.fsm = Fsm::Fresh)?;

        let mut block = [0u8; 16];
        aes.encrypt_block(&mut block);
        self.h = u128::from_be_bytes(block);

        if iv.len() == 12 {
            self.j0[..12].copy_from_slice(iv);
            self.j0[12..].copy_from_slice(&[0, 0, 0, 1]);
        } else {
            // J0 = GHASH_H(IV || 0* || len64(IV bits))
            let mut acc = 0u128;
            let mut chunks = iv.chunks_exact(16);
            for chunk in chunks.by_ref() {
                let mut b = [0u8; 16];
                b.copy_from_slice(chunk);
                acc = gf128_mul(acc ^ u128::from_be_bytes(b), self.h);
            }
            let rest = chunks.remainder();
            if !rest.is_empty() {
                let mut b = [0u8; 16];
                b[..rest.len()].copy_from_slice(rest);
                acc = gf128_mul(acc ^ u128::from_be_bytes(b), self.h);
            }
            let len_block = u128::from((iv.len() as u64) * 8);
            acc = gf128_mul(acc ^ len_block, self.h);
            self.j0 = acc.to_be_bytes();
        }

        self.ctr = self.j0;
        self.ghash = 0;
        self.ghash_buf.zeroize();
        self.ghash_buflen = 0;
        self.keystream.zeroize();
        self.ks_used = 16;
        self.aad_len = 0;
        self.ct_len = 0;
        self.aes = Some(aes);
        Ok(())
    }

    fn ghash_update(&mut self, mut data: &[u8]) {
        if self.ghash_buflen != 0 {
            let take = data.len().min(16 - self.ghash_buflen);
            self.ghash_buf[self.ghash_buflen..self.ghash_buflen + take]
                .copy_from_slice(&data[..take]);
            self.ghash_buflen += take;
            data = &data[take..];
            if self.ghash_buflen == 16 {
                self.ghash = gf128_mul(self.ghash ^ u128::from_be_bytes(self.ghash_buf), self.h);
                self.ghash_buflen = 0;
            }
        }
        let mut chunks = data.chunks_exact(16);
        for chunk in chunks.by_ref() {
            let mut b = [0u8; 16];
            b.copy_from_slice(chunk);
            self.ghash = gf128_mul(self.ghash ^ u128::from_be_bytes(b), self.h);
        }
        let rest = chunks.remainder();
        self.ghash_buf[..rest.len()].copy_from_slice(rest);
        self.ghash_buflen = rest.len();
    }

    /// Zero-pad a partial block into the accumulator (phase boundaries).
    fn ghash_flush(&mut self) {
        if self.ghash_buflen != 0 {
            self.ghash_buf[self.ghash_buflen..].fill(0);
            self.ghash = gf128_mul(self.ghash ^ u128::from_be_bytes(self.ghash_buf), self.h);
            self.ghash_buflen = 0;
        }
    }

    fn aes(&self) -> Result<&AesKey> {
        self.aes.as_ref().ok_or(Error::InvalidState("cipher is not keyed"))
    }

    fn next_keystream_byte(&mut self) -> Result<u8> {
        if self.ks_used == 16 {
            inc32(&mut self.ctr);
            let mut block = self.ctr;
            self.aes()?.encrypt_block(&mut block);
            self.keystream = block;
            self.ks_used = 0;
        }
        let b = self.keystream[self.ks_used];
        self.ks_used += 1;
        Ok(b)
    }

    /// Leaving the AAD phase pads the accumulator to the block boundary.
    fn enter_data_phase(&mut self) {
        if matches!(self.fsm, Fsm::Keyed | Fsm::Aad(_)) {
            self.ghash_flush();
        }
    }

    fn compute_tag(&mut self) -> Result<[u8; 16]> {
        self.ghash_flush();
        let lengths =
            (u128::from(self.aad_len * 8) << 64) | u128::from(self.ct_len * 8);
        self.ghash = gf128_mul(self.ghash ^ lengths, self.h);

        let mut tag_block = self.j0;
        self.aes()?.encrypt_block(&mut tag_block);
        let full = u128::from_be_bytes(tag_block) ^ self.ghash;
        Ok(full.to_be_bytes())
    }
}

impl Default for AesGcm {
    fn default() -> Self {
        Self::new()
    }
}

impl Aead for AesGcm {
    fn set_key(&mut self, key: &[u8], iv: &[u8]) -> Result<()> {
        AesKey::ensure_selftest()?;
        status::run_once(AlgorithmId::AesGcm, kat_aes_gcm)?;
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
        self.ghash_update(aad);
        self.aad_len += aad.len() as u64;
        Ok(())
    }

    fn enc_update(&mut self, plaintext: &[u8], ciphertext: &mut [u8]) -> Result<()> {
        if plaintext.len() != ciphertext.len() {
            return Err(Error::InvalidArgument("in/out length mismatch"));
        }
        let next = self.fsm.on_update(Direction::Encrypt)?;
        self.enter_data_phase();
        self.fsm = next;

        for (ct, &pt) in ciphertext.iter_mut().zip(plaintext.iter()) {
            *ct = pt ^ self.next_keystream_byte()?;
        }
        self.ghash_update(ciphertext);
        self.ct_len += plaintext.len() as u64;
        lc_core::unpoison(ciphertext);
        Ok(())
    }

    fn enc_final(&mut self, tag: &mut [u8]) -> Result<()> {
        if tag.is_empty() || tag.len() > MAX_TAG_SIZE {
            return Err(Error::InvalidArgument("tag length must be 1..=16"));
        }
        let next = self.fsm.on_final(Direction::Encrypt)?;
        self.enter_data_phase();
        self.fsm = next;

        let full = self.compute_tag()?;
        tag.copy_from_slice(&full[..tag.len()]);
        lc_core::unpoison(tag);
        Ok(())
    }

    fn dec_init(&mut self, aad: &[u8]) -> Result<()> {
        self.fsm = self.fsm.on_aad(Direction::Decrypt)?;
        self.ghash_update(aad);
        self.aad_len += aad.len() as u64;
        Ok(())
    }

    fn dec_update(&mut self, ciphertext: &[u8], plaintext: &mut [u8]) -> Result<()> {
        if plaintext.len() != ciphertext.len() {
            return Err(Error::InvalidArgument("in/out length mismatch"));
        }
        let next = self.fsm.on_update(Direction::Decrypt)?;
        self.enter_data_phase();
        self.fsm = next;

        self.ghash_update(ciphertext);
        for (pt, &ct) in plaintext.iter_mut().zip(ciphertext.iter()) {
            *pt = ct ^ self.next_keystream_byte()?;
        }
        self.ct_len += ciphertext.len() as u64;
        Ok(())
    }

    fn dec_final(&mut self, tag: &[u8]) -> Result<()> {
        if tag.is_empty() || tag.len() > MAX_TAG_SIZE {
            return Err(Error::InvalidArgument("tag length must be 1..=16"));
        }
        let next = self.fsm.on_final(Direction::Decrypt)?;
        self.enter_data_phase();
        self.fsm = next;

        let mut expected = self.compute_tag()?;
        let ok = lc_core::ct_eq(&expected[..tag.len()], tag);
        expected.zeroize();
        if ok { Ok(()) } else { Err(Error::TagMismatch) }
    }

    fn zero(&mut self) {
        self.zeroize();
        self.aes = None;
        self.ks_used = 16;
        self.fsm = Fsm::Fresh;
    }
}

fn kat_aes_gcm() -> Result<()> {
    let key: [u8; 32] = [
        status::fips140_mod(0x7f),
        0x71,
        0x68,
        0xa4,
        0x06,
        0xe7,
        0xc1,
        0xef,
        0x0f,
        0xd4,
        0x7a,
        0xc9,
        0x22,
        0xc5,
        0xec,
        0x5f,
        0x65,
        0x97,
        0x65,
        0xfb,
        0x6a,
        0xaa,
        0x04,
        0x8f,
        0x70,
        0x56,
        0xf6,
        0xc6,
        0xb5,
        0xd8,
        0x51,
        0x3d,
    ];
    let iv: [u8; 12] =
        [0xb8, 0xb5, 0xe4, 0x07, 0xad, 0xc0, 0xe2, 0x93, 0xe3, 0xe7, 0xe9, 0x91];
    let aad: [u8; 16] = [
        0xff, 0x76, 0x28, 0xf6, 0x42, 0x7f, 0xbc, 0xef, 0x1f, 0x3b, 0x82, 0xb3, 0x74, 0x04, 0xe1,
        0x16,
    ];
    let pt: [u8; 16] = [
        0xb7, 0x06, 0x19, 0x4b, 0xb0, 0xb1, 0x0c, 0x47, 0x4e, 0x1b, 0x2d, 0x7b, 0x22, 0x78, 0x22,
        0x4c,
    ];
    let expected_ct: [u8; 16] = [
        0x8f, 0xad, 0xa0, 0xb8, 0xe7, 0x77, 0xa8, 0x29, 0xca, 0x96, 0x80, 0xd3, 0xbf, 0x4f, 0x35,
        0x74,
    ];
    let expected_tag: [u8; 15] = [
        0xda, 0xca, 0x35, 0x42, 0x77, 0xf6, 0x33, 0x5f, 0xc8, 0xbe, 0xc9, 0x08, 0x86, 0xda, 0x70,
    ];

    let mut gcm = AesGcm::new();
    gcm.set_key_nocheck(&key, &iv)?;
    let mut ct = [0u8; 16];
    let mut tag = [0u8; 15];
    gcm.encrypt(&pt, &mut ct, &aad, &mut tag)?;
    status::compare_selftest(AlgorithmId::AesGcm, &ct, &expected_ct)?;
    status::compare_selftest(AlgorithmId::AesGcm, &tag, &expected_tag)?;

    gcm.set_key_nocheck(&key, &iv)?;
    let mut decrypted = [0u8; 16];
    gcm.decrypt(&ct, &mut decrypted, &aad, &tag)?;
    status::compare_selftest(AlgorithmId::AesGcm, &decrypted, &pt)?;
    gcm.zero();
    Ok(())
}
