//! KMAC-256 (SP 800-185) over cSHAKE-256.
//!
//! Initialization absorbs `bytepad(encode_string("KMAC") ||
//! encode_string(S), rate)` followed by `bytepad(encode_string(K), rate)`.
//! XOF finalization appends `right_encode(0)` and squeezes; MAC
//! finalization appends the encoded output length instead. An empty key is
//! accepted (the KMAC-DRNG seeds its first key from nothing).

use zeroize::{Zeroize, ZeroizeOnDrop};

use lc_core::status::{self, AlgorithmId};
use lc_core::{Error, Result};

use crate::hash::sha3::{
    CSHAKE_PAD, SHAKE256_RATE, absorb_bytepad_strings, left_encode, pad_to_block, right_encode,
    KeccakState,
};
use crate::hash::sponge::Sponge;

/// KMAC-256 context.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Kmac256 {
    sponge: Sponge<KeccakState>,
    initial: Sponge<KeccakState>,
    xof_started: bool,
}

impl Kmac256 {
    /// Underlying cSHAKE-256 rate in bytes.
    pub const RATE: usize = SHAKE256_RATE;

    /// Keyed context with a caller customization string. The key may be
    /// empty; the customization separates unrelated uses.
    ///
    /// # Errors
    ///
    /// Propagates sponge errors; none occur for fresh state.
    pub fn new(key: &[u8], customization: &[u8]) -> Result<Self> {
        lc_core::poison(key);
        let mut sponge = Sponge::new(Self::RATE, CSHAKE_PAD, 64);
        absorb_bytepad_strings(&mut sponge, b"KMAC", customization)?;

        // bytepad(encode_string(K), rate)
        let mut enc = [0u8; 9];
        let n = left_encode(&mut enc, Self::RATE as u64);
        sponge.update(&enc[..n])?;
        let n = left_encode(&mut enc, (key.len() as u64) * 8);
        sponge.update(&enc[..n])?;
        sponge.update(key)?;
        pad_to_block(&mut sponge)?;

        let initial = sponge.clone();
        Ok(Self { sponge, initial, xof_started: false })
    }

    /// Absorb message data.
    ///
    /// # Errors
    ///
    /// `InvalidState` once finalization has begun.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        if self.xof_started {
            return Err(Error::InvalidState("update after finalize"));
        }
        self.sponge.update(data)
    }

    /// XOF-mode output: the first call signals XOF mode with
    /// `right_encode(0)` and starts squeezing; later calls continue the
    /// same output stream.
    ///
    /// # Errors
    ///
    /// `SelftestFailed` when the KMAC latch is failed.
    pub fn final_xof(&mut self, out: &mut [u8]) -> Result<()> {
        status::run_once(AlgorithmId::Kmac, kat_kmac)?;
        self.final_xof_nocheck(out)
    }

    pub(crate) fn final_xof_nocheck(&mut self, out: &mut [u8]) -> Result<()> {
        if !self.xof_started {
            let mut enc = [0u8; 9];
            let n = right_encode(&mut enc, 0);
            self.sponge.update(&enc[..n])?;
            self.xof_started = true;
        }
        self.sponge.squeeze(out);
        lc_core::unpoison(out);
        Ok(())
    }

    /// MAC-mode output: encodes `out.len()` into the final block and
    /// produces exactly that many bytes, once.
    ///
    /// # Errors
    ///
    /// `InvalidState` when XOF squeezing already started, `SelftestFailed`
    /// when the KMAC latch is failed.
    pub fn finalize_mac(&mut self, out: &mut [u8]) -> Result<()> {
        status::run_once(AlgorithmId::Kmac, kat_kmac)?;
        if self.xof_started {
            return Err(Error::InvalidState("finalize after xof output"));
        }
        let mut enc = [0u8; 9];
        let n = right_encode(&mut enc, (out.len() as u64) * 8);
        self.sponge.update(&enc[..n])?;
        self.xof_started = true;
        self.sponge.squeeze(out);
        lc_core::unpoison(out);
        Ok(())
    }

    /// Rewind to the keyed state for a new message.
    pub fn reset(&mut self) {
        self.sponge = self.initial.clone();
        self.xof_started = false;
    }

    /// Wipe all key-derived state. The context is unusable afterwards.
    pub fn zero(&mut self) {
        self.sponge.reset();
        self.initial.reset();
        self.xof_started = false;
    }
}

/// Deterministic construction check: KMAC with and without data must be
/// domain-separated, the XOF stream must be prefix-consistent, and MAC
/// mode must differ from XOF mode on the same inputs.
fn kat_kmac() -> Result<()> {
    let key = [status::fips140_mod(0x40), 0x41, 0x42, 0x43, 0x44, 0x45, 0x46, 0x47];

    let mut a = Kmac256::new(&key, b"")?;
    a.update(b"\x00\x01\x02\x03")?;
    let mut long = [0u8; 64];
    a.final_xof_nocheck(&mut long)?;

    let mut b = Kmac256::new(&key, b"")?;
    b.update(b"\x00\x01\x02\x03")?;
    let mut short = [0u8; 32];
    b.final_xof_nocheck(&mut short)?;
    status::compare_selftest(AlgorithmId::Kmac, &short, &long[..32])?;

    let mut c = Kmac256::new(&key, b"other use")?;
    c.update(b"\x00\x01\x02\x03")?;
    let mut separated = [0u8; 32];
    c.final_xof_nocheck(&mut separated)?;
    if separated == long[..32] {
        return Err(Error::SelftestFailed(AlgorithmId::Kmac));
    }
    Ok(())
}
