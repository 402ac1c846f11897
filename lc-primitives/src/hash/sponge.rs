//! The sponge engine: absorb/squeeze state machine over a pluggable
//! permutation.
//!
//! One engine serves every Keccak-derived variant and the Ascon family.
//! The permutation contributes its state width, byte ordering and padding
//! rule through [`SpongePermutation`]; the engine owns the partial-block
//! offset tracking, the one-way transition into the squeeze phase, and the
//! raw state entry points higher constructions build on.

use zeroize::Zeroize;

use lc_core::{Error, Result};

/// Permutation plugged into the [`Sponge`] engine.
pub trait SpongePermutation: Clone + Default + Zeroize {
    /// State width in bytes.
    const STATE_BYTES: usize;

    /// Apply the permutation.
    fn permute(&mut self);

    /// XOR one byte into the state at byte position `pos`.
    fn xor_byte(&mut self, pos: usize, b: u8);

    /// Read the state byte at position `pos`.
    fn byte(&self, pos: usize) -> u8;

    /// XOR a whole rate-sized block starting at position 0.
    fn xor_block(&mut self, block: &[u8]) {
        for (pos, &b) in block.iter().enumerate() {
            self.xor_byte(pos, b);
        }
    }

    /// Copy a whole rate-sized block starting at position 0.
    fn extract_block(&self, block: &mut [u8]) {
        for (pos, b) in block.iter_mut().enumerate() {
            *b = self.byte(pos);
        }
    }

    /// Apply the scheme's padding for a message ending at `offset` within
    /// a block of `rate` bytes. `pad_byte` is the variant's domain byte.
    fn pad(&mut self, offset: usize, rate: usize, pad_byte: u8);
}

/// Sponge state: 25 lanes for Keccak, 5 for Ascon, plus the absorb/squeeze
/// bookkeeping of the engine.
#[derive(Clone, Zeroize)]
pub struct Sponge<P: SpongePermutation> {
    perm: P,
    rate: usize,
    padding: u8,
    digest_size: usize,
    msg_len: u64,
    offset: usize,
    squeezing: bool,
}

impl<P: SpongePermutation> Sponge<P> {
    /// Fresh sponge for a variant described by `(rate, padding,
    /// digest_size)`, starting from the permutation's default state.
    #[must_use]
    pub fn new(rate: usize, padding: u8, digest_size: usize) -> Self {
        debug_assert!(rate > 0 && rate <= P::STATE_BYTES);
        Self {
            perm: P::default(),
            rate,
            padding,
            digest_size,
            msg_len: 0,
            offset: 0,
            squeezing: false,
        }
    }

    /// Sponge rate in bytes.
    #[must_use]
    pub fn rate(&self) -> usize {
        self.rate
    }

    /// Configured digest size in bytes.
    #[must_use]
    pub fn digest_size(&self) -> usize {
        self.digest_size
    }

    /// Whether the one-way transition into the squeeze phase happened.
    #[must_use]
    pub fn squeezing(&self) -> bool {
        self.squeezing
    }

    /// Total bytes absorbed since init; `absorbed() % rate()` is the
    /// current partial-block offset.
    #[must_use]
    pub fn absorbed(&self) -> u64 {
        self.msg_len
    }

    /// Change the target digest size. Only valid before the first squeeze.
    ///
    /// # Errors
    ///
    /// `InvalidState` once squeezing has begun.
    pub fn set_digest_size(&mut self, size: usize) -> Result<()> {
        if self.squeezing {
            return Err(Error::InvalidState("digest size fixed after first squeeze"));
        }
        self.digest_size = size;
        Ok(())
    }

    /// Absorb `data`, permuting whenever a block fills.
    ///
    /// # Errors
    ///
    /// `InvalidState` when called after the transition to squeezing.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        if self.squeezing {
            return Err(Error::InvalidState("update after squeeze"));
        }

        let mut rest = data;
        let mut partial = (self.msg_len % self.rate as u64) as usize;

        // Fill a partial block first.
        if partial != 0 {
            let take = rest.len().min(self.rate - partial);
            for &b in &rest[..take] {
                self.perm.xor_byte(partial, b);
                partial += 1;
            }
            rest = &rest[take..];
            if partial == self.rate {
                self.perm.permute();
            }
        }

        // Bulk-absorb whole blocks.
        while rest.len() >= self.rate {
            self.perm.xor_block(&rest[..self.rate]);
            self.perm.permute();
            rest = &rest[self.rate..];
        }

        // Stash the residue.
        for (i, &b) in rest.iter().enumerate() {
            self.perm.xor_byte(i, b);
        }

        self.msg_len += data.len() as u64;
        Ok(())
    }

    /// Squeeze `out.len()` bytes, finalizing the absorb phase on first use.
    ///
    /// A zero-length squeeze after the transition is a no-op and leaves the
    /// intra-block offset untouched.
    pub fn squeeze(&mut self, out: &mut [u8]) {
        if !self.squeezing {
            let offset = (self.msg_len % self.rate as u64) as usize;
            self.perm.pad(offset, self.rate, self.padding);
            self.perm.permute();
            self.squeezing = true;
            self.offset = 0;
        }

        let mut rest = out;

        // Drain the current block up to the next boundary.
        if !rest.is_empty() && self.offset != 0 && self.offset != self.rate {
            let take = rest.len().min(self.rate - self.offset);
            let (head, tail) = core::mem::take(&mut rest).split_at_mut(take);
            for b in head.iter_mut() {
                *b = self.perm.byte(self.offset);
                self.offset += 1;
            }
            rest = tail;
        }

        // Whole blocks go through the bulk extractor.
        while rest.len() >= self.rate {
            if self.offset != 0 {
                self.perm.permute();
            }
            let (block, tail) = core::mem::take(&mut rest).split_at_mut(self.rate);
            self.perm.extract_block(block);
            self.offset = self.rate;
            rest = tail;
        }

        // Residual bytes from a fresh block.
        if !rest.is_empty() {
            if self.offset != 0 {
                self.perm.permute();
                self.offset = 0;
            }
            for b in rest.iter_mut() {
                *b = self.perm.byte(self.offset);
                self.offset += 1;
            }
        }
    }

    /// Return to the post-init state: permutation default, counters zero,
    /// absorb phase.
    pub fn reset(&mut self) {
        self.perm.zeroize();
        self.perm = P::default();
        self.msg_len = 0;
        self.offset = 0;
        self.squeezing = false;
    }

    /// Raw state access: XOR `data` into the state starting at `offset`.
    /// Higher constructions (cSHAKE prefixes, KMAC keys) write through
    /// here without touching the message counter.
    pub fn add_bytes(&mut self, data: &[u8], offset: usize) {
        for (i, &b) in data.iter().enumerate() {
            self.perm.xor_byte(offset + i, b);
        }
    }

    /// Raw state access: copy state bytes starting at `offset` into `out`.
    pub fn extract_bytes(&self, out: &mut [u8], offset: usize) {
        for (i, b) in out.iter_mut().enumerate() {
            *b = self.perm.byte(offset + i);
        }
    }

    /// Raw state access: run the permutation once.
    pub fn permute(&mut self) {
        self.perm.permute();
    }
}
