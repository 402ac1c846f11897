//! Constant-time building blocks.
//!
//! All selection is mask-based via `subtle`; no function here branches on
//! secret data. `wipe` survives dead-store elimination because `zeroize`
//! ends with a compiler fence the optimizer may not look through.

use subtle::{ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

use crate::error::{Error, Result};

pub use subtle::Choice;

/// Overwrite `buf` with zero bytes in a way the compiler may not elide.
#[inline]
pub fn wipe(buf: &mut [u8]) {
    buf.zeroize();
}

/// Overwrite `dst[i] <- src[i]` for all `i` when `cond` is set, leave `dst`
/// untouched otherwise. Runs in time independent of `cond` and of the data.
///
/// # Errors
///
/// `InvalidArgument` if the slices differ in length; `dst` is unchanged.
#[inline]
pub fn cmov(dst: &mut [u8], src: &[u8], cond: Choice) -> Result<()> {
    if dst.len() != src.len() {
        return Err(Error::InvalidArgument("cmov length mismatch"));
    }
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d = u8::conditional_select(d, s, cond);
    }
    Ok(())
}

/// Constant-time equality of two byte slices.
///
/// Length inequality is public information and short-circuits; the content
/// comparison never does.
#[inline]
#[must_use]
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Constant-time select for `u64`.
#[inline]
#[must_use]
pub fn ct_select_u64(cond: Choice, a: u64, b: u64) -> u64 {
    u64::conditional_select(&b, &a, cond)
}

/// Mark `buf` as secret for dynamic side-channel analysis.
///
/// A no-op in ordinary builds. Instrumented runs (timecop-style analysis)
/// replace this with a tracker that flags branches or table indices derived
/// from the marked bytes.
#[inline]
pub fn poison(_buf: &[u8]) {}

/// Declassify `buf` once it has become public output (ciphertext, public
/// key, tag). A no-op in ordinary builds; the counterpart of [`poison`].
#[inline]
pub fn unpoison(_buf: &[u8]) {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn wipe_clears() {
        let mut buf = [0xaau8; 64];
        wipe(&mut buf);
        assert_eq!(buf, [0u8; 64]);
    }

    #[test]
    fn cmov_moves_only_when_set() {
        let src = [1u8, 2, 3, 4];
        let mut dst = [9u8, 9, 9, 9];

        cmov(&mut dst, &src, Choice::from(0)).unwrap();
        assert_eq!(dst, [9, 9, 9, 9]);

        cmov(&mut dst, &src, Choice::from(1)).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn cmov_rejects_length_mismatch() {
        let src = [1u8, 2, 3];
        let mut dst = [0u8; 4];
        assert_eq!(
            cmov(&mut dst, &src, Choice::from(1)),
            Err(Error::InvalidArgument("cmov length mismatch"))
        );
        assert_eq!(dst, [0u8; 4]);
    }

    #[test]
    fn ct_eq_basic() {
        assert!(ct_eq(b"abcd", b"abcd"));
        assert!(!ct_eq(b"abcd", b"abce"));
        assert!(!ct_eq(b"abcd", b"abc"));
        assert!(ct_eq(b"", b""));
    }

    #[test]
    fn select_u64() {
        assert_eq!(ct_select_u64(Choice::from(1), 7, 8), 7);
        assert_eq!(ct_select_u64(Choice::from(0), 7, 8), 8);
    }
}
