//! AEAD runtime: one streaming state machine, three cipher families.
//!
//! Every AEAD walks `fresh -> keyed -> aad -> crypting -> finalized`.
//! Re-keying is legal only from `fresh` or `finalized`; `zero` returns
//! any state to `fresh` and wipes. Decrypt paths authenticate with a
//! constant-time comparison and fail with `tag_mismatch` without
//! plaintext-dependent timing.

#[cfg(feature = "aes")]
pub mod aes_gcm;

pub mod hash_crypt;
pub mod kmac_crypt;

use lc_core::{Error, Result};

/// AEAD capability: one-shot and streamed operation on one state.
pub trait Aead {
    /// Install key and IV. Legal from `fresh` or `finalized` only.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for unusable key/IV, `InvalidState` mid-stream,
    /// `SelftestFailed` when the family's latch is failed.
    fn set_key(&mut self, key: &[u8], iv: &[u8]) -> Result<()>;

    /// One-shot encrypt: AAD, plaintext, tag of `tag.len()` bytes.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` on length mismatches, `InvalidState` unless keyed.
    fn encrypt(
        &mut self,
        plaintext: &[u8],
        ciphertext: &mut [u8],
        aad: &[u8],
        tag: &mut [u8],
    ) -> Result<()>;

    /// One-shot decrypt; on `TagMismatch` the plaintext buffer is scrubbed.
    ///
    /// # Errors
    ///
    /// `TagMismatch` on authenticity failure, otherwise as `encrypt`.
    fn decrypt(
        &mut self,
        ciphertext: &[u8],
        plaintext: &mut [u8],
        aad: &[u8],
        tag: &[u8],
    ) -> Result<()>;

    /// Absorb AAD for a streamed encryption; repeated calls concatenate.
    ///
    /// # Errors
    ///
    /// `InvalidState` outside `keyed`/`aad`.
    fn enc_init(&mut self, aad: &[u8]) -> Result<()>;

    /// Encrypt the next span of a streamed message.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` on length mismatch, `InvalidState` if the stream
    /// runs in the decrypt direction.
    fn enc_update(&mut self, plaintext: &[u8], ciphertext: &mut [u8]) -> Result<()>;

    /// Finish a streamed encryption, producing the tag.
    ///
    /// # Errors
    ///
    /// `InvalidState` outside an encrypt stream.
    fn enc_final(&mut self, tag: &mut [u8]) -> Result<()>;

    /// Absorb AAD for a streamed decryption; repeated calls concatenate.
    ///
    /// # Errors
    ///
    /// `InvalidState` outside `keyed`/`aad`.
    fn dec_init(&mut self, aad: &[u8]) -> Result<()>;

    /// Decrypt the next span of a streamed message.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` on length mismatch, `InvalidState` if the stream
    /// runs in the encrypt direction.
    fn dec_update(&mut self, ciphertext: &[u8], plaintext: &mut [u8]) -> Result<()>;

    /// Finish a streamed decryption, verifying `tag` in constant time.
    ///
    /// # Errors
    ///
    /// `TagMismatch` on authenticity failure.
    fn dec_final(&mut self, tag: &[u8]) -> Result<()>;

    /// Wipe the state and return to `fresh`.
    fn zero(&mut self);
}

/// Stream direction of an in-flight AEAD operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Encrypt,
    Decrypt,
}

/// The shared AEAD state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Fsm {
    #[default]
    Fresh,
    Keyed,
    Aad(Direction),
    Crypting(Direction),
    Finalized,
}

impl Fsm {
    pub(crate) fn on_set_key(self) -> Result<Self> {
        match self {
            Fsm::Fresh | Fsm::Finalized => Ok(Fsm::Keyed),
            _ => Err(Error::InvalidState("re-key requires fresh or finalized state")),
        }
    }

    pub(crate) fn on_aad(self, dir: Direction) -> Result<Self> {
        match self {
            Fsm::Keyed => Ok(Fsm::Aad(dir)),
            Fsm::Aad(d) if d == dir => Ok(self),
            Fsm::Fresh => Err(Error::InvalidState("aad before set_key")),
            _ => Err(Error::InvalidState("aad after data")),
        }
    }

    pub(crate) fn on_update(self, dir: Direction) -> Result<Self> {
        match self {
            Fsm::Keyed => Ok(Fsm::Crypting(dir)),
            Fsm::Aad(d) | Fsm::Crypting(d) if d == dir => Ok(Fsm::Crypting(dir)),
            Fsm::Fresh => Err(Error::InvalidState("update before set_key")),
            Fsm::Finalized => Err(Error::InvalidState("update after final")),
            _ => Err(Error::InvalidState("stream direction reversed")),
        }
    }

    pub(crate) fn on_final(self, dir: Direction) -> Result<Self> {
        match self {
            Fsm::Keyed => Ok(Fsm::Finalized),
            Fsm::Aad(d) | Fsm::Crypting(d) if d == dir => Ok(Fsm::Finalized),
            Fsm::Fresh => Err(Error::InvalidState("final before set_key")),
            Fsm::Finalized => Err(Error::InvalidState("final called twice")),
            _ => Err(Error::InvalidState("stream direction reversed")),
        }
    }
}
