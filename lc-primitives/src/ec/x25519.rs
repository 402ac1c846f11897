//! X25519 scalar multiplication (RFC 7748).
//!
//! Field arithmetic over 2^255 - 19 in five 51-bit limbs; the Montgomery
//! ladder runs with masked conditional swaps and no secret-dependent
//! branch or index.

use zeroize::Zeroize;

use lc_core::status::{self, AlgorithmId};
use lc_core::Result;

/// Scalar and point encoding size.
pub const KEY_SIZE: usize = 32;

const MASK51: u64 = (1 << 51) - 1;

/// 2*p in 51-bit limbs, the subtraction bias.
const TWO_P: [u64; 5] = [
    0xfffffffffffda,
    0xffffffffffffe,
    0xffffffffffffe,
    0xffffffffffffe,
    0xffffffffffffe,
];

#[derive(Clone, Copy)]
struct Fe([u64; 5]);

impl Fe {
    const ZERO: Fe = Fe([0, 0, 0, 0, 0]);
    const ONE: Fe = Fe([1, 0, 0, 0, 0]);

    fn from_bytes(bytes: &[u8; 32]) -> Fe {
        let load = |b: &[u8]| -> u64 {
            let mut word = [0u8; 8];
            word.copy_from_slice(b);
            u64::from_le_bytes(word)
        };
        // Overlapping 64-bit loads, 51 bits each; the top bit is masked
        // off per RFC 7748.
        Fe([
            load(&bytes[0..8]) & MASK51,
            (load(&bytes[6..14]) >> 3) & MASK51,
            (load(&bytes[12..20]) >> 6) & MASK51,
            (load(&bytes[19..27]) >> 1) & MASK51,
            (load(&bytes[24..32]) >> 12) & MASK51,
        ])
    }

    fn to_bytes(mut self) -> [u8; 32] {
        self.carry();
        self.carry();

        // Freeze: add 19 and propagate, keeping only values below p.
        let mut q = (self.0[0].wrapping_add(19)) >> 51;
        q = (self.0[1].wrapping_add(q)) >> 51;
        q = (self.0[2].wrapping_add(q)) >> 51;
        q = (self.0[3].wrapping_add(q)) >> 51;
        q = (self.0[4].wrapping_add(q)) >> 51;

        self.0[0] = self.0[0].wrapping_add(19u64.wrapping_mul(q));
        let mut carry = self.0[0] >> 51;
        self.0[0] &= MASK51;
        for i in 1..5 {
            self.0[i] = self.0[i].wrapping_add(carry);
            carry = self.0[i] >> 51;
            self.0[i] &= MASK51;
        }

        let mut out = [0u8; 32];
        let limbs = self.0;
        let words = [
            limbs[0] | (limbs[1] << 51),
            (limbs[1] >> 13) | (limbs[2] << 38),
            (limbs[2] >> 26) | (limbs[3] << 25),
            (limbs[3] >> 39) | (limbs[4] << 12),
        ];
        for (chunk, word) in out.chunks_exact_mut(8).zip(words.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    fn carry(&mut self) {
        let mut c: u64 = 0;
        for i in 0..5 {
            let t = self.0[i].wrapping_add(c);
            self.0[i] = t & MASK51;
            c = t >> 51;
        }
        self.0[0] = self.0[0].wrapping_add(c.wrapping_mul(19));
    }

    fn add(&self, rhs: &Fe) -> Fe {
        let mut r = Fe([0; 5]);
        for i in 0..5 {
            r.0[i] = self.0[i] + rhs.0[i];
        }
        r
    }

    fn sub(&self, rhs: &Fe) -> Fe {
        let mut r = Fe([0; 5]);
        for i in 0..5 {
            r.0[i] = self.0[i] + TWO_P[i] - rhs.0[i];
        }
        r
    }

    fn mul(&self, rhs: &Fe) -> Fe {
        let a = self.0;
        let b = rhs.0;
        let m = |x: u64, y: u64| u128::from(x) * u128::from(y);

        let mut r0 = m(a[0], b[0])
            + 19 * (m(a[1], b[4]) + m(a[2], b[3]) + m(a[3], b[2]) + m(a[4], b[1]));
        let mut r1 =
            m(a[0], b[1]) + m(a[1], b[0]) + 19 * (m(a[2], b[4]) + m(a[3], b[3]) + m(a[4], b[2]));
        let mut r2 = m(a[0], b[2])
            + m(a[1], b[1])
            + m(a[2], b[0])
            + 19 * (m(a[3], b[4]) + m(a[4], b[3]));
        let mut r3 =
            m(a[0], b[3]) + m(a[1], b[2]) + m(a[2], b[1]) + m(a[3], b[0]) + 19 * m(a[4], b[4]);
        let mut r4 = m(a[0], b[4]) + m(a[1], b[3]) + m(a[2], b[2]) + m(a[3], b[1]) + m(a[4], b[0]);

        r1 += (r0 >> 51) as u128;
        r0 &= u128::from(MASK51);
        r2 += r1 >> 51;
        r1 &= u128::from(MASK51);
        r3 += r2 >> 51;
        r2 &= u128::from(MASK51);
        r4 += r3 >> 51;
        r3 &= u128::from(MASK51);
        let carry = (r4 >> 51) as u64;
        r4 &= u128::from(MASK51);

        let mut out = Fe([r0 as u64, r1 as u64, r2 as u64, r3 as u64, r4 as u64]);
        out.0[0] = out.0[0].wrapping_add(19u64.wrapping_mul(carry));
        out.carry();
        out
    }

    fn square(&self) -> Fe {
        self.mul(self)
    }

    fn square_n(&self, n: u32) -> Fe {
        let mut r = *self;
        for _ in 0..n {
            r = r.square();
        }
        r
    }

    fn mul_small(&self, k: u64) -> Fe {
        let mut r = [0u128; 5];
        for i in 0..5 {
            r[i] = u128::from(self.0[i]) * u128::from(k);
        }
        let mut c: u128 = 0;
        let mut out = Fe([0; 5]);
        for i in 0..5 {
            let t = r[i] + c;
            out.0[i] = (t as u64) & MASK51;
            c = t >> 51;
        }
        out.0[0] = out.0[0].wrapping_add(19u64.wrapping_mul(c as u64));
        out.carry();
        out
    }

    /// x^(p-2): the modular inverse, via the standard 2^255-21 chain.
    fn invert(&self) -> Fe {
        let z2 = self.square();
        let z8 = z2.square_n(2);
        let z9 = self.mul(&z8);
        let z11 = z2.mul(&z9);
        let z22 = z11.square();
        let z_5_0 = z9.mul(&z22);
        let z_10_0 = z_5_0.square_n(5).mul(&z_5_0);
        let z_20_0 = z_10_0.square_n(10).mul(&z_10_0);
        let z_40_0 = z_20_0.square_n(20).mul(&z_20_0);
        let z_50_0 = z_40_0.square_n(10).mul(&z_10_0);
        let z_100_0 = z_50_0.square_n(50).mul(&z_50_0);
        let z_200_0 = z_100_0.square_n(100).mul(&z_100_0);
        let z_250_0 = z_200_0.square_n(50).mul(&z_50_0);
        z_250_0.square_n(5).mul(&z11)
    }

    /// Masked conditional swap; `swap` is 0 or 1.
    fn cswap(swap: u64, a: &mut Fe, b: &mut Fe) {
        let mask = swap.wrapping_neg();
        for i in 0..5 {
            let t = mask & (a.0[i] ^ b.0[i]);
            a.0[i] ^= t;
            b.0[i] ^= t;
        }
    }
}

/// Clamp a secret scalar per RFC 7748.
fn clamp(scalar: &[u8; 32]) -> [u8; 32] {
    let mut k = *scalar;
    k[0] &= 248;
    k[31] &= 127;
    k[31] |= 64;
    k
}

fn ladder(scalar: &[u8; 32], u: &Fe) -> Fe {
    let x1 = *u;
    let mut x2 = Fe::ONE;
    let mut z2 = Fe::ZERO;
    let mut x3 = *u;
    let mut z3 = Fe::ONE;
    let mut swap: u64 = 0;

    for t in (0..255).rev() {
        let k_t = u64::from((scalar[t >> 3] >> (t & 7)) & 1);
        swap ^= k_t;
        Fe::cswap(swap, &mut x2, &mut x3);
        Fe::cswap(swap, &mut z2, &mut z3);
        swap = k_t;

        let a = x2.add(&z2);
        let aa = a.square();
        let b = x2.sub(&z2);
        let bb = b.square();
        let e = aa.sub(&bb);
        let c = x3.add(&z3);
        let d = x3.sub(&z3);
        let da = d.mul(&a);
        let cb = c.mul(&b);

        x3 = da.add(&cb).square();
        z3 = x1.mul(&da.sub(&cb).square());
        x2 = aa.mul(&bb);
        z2 = e.mul(&aa.add(&e.mul_small(121_665)));
    }

    Fe::cswap(swap, &mut x2, &mut x3);
    Fe::cswap(swap, &mut z2, &mut z3);

    x2.mul(&z2.invert())
}

/// Scalar multiplication: `scalar * point_u`.
///
/// # Errors
///
/// `SelftestFailed` when the X25519 latch is failed.
pub fn x25519(scalar: &[u8; 32], point_u: &[u8; 32]) -> Result<[u8; 32]> {
    status::run_once(AlgorithmId::X25519, kat_x25519)?;
    Ok(x25519_nocheck(scalar, point_u))
}

fn x25519_nocheck(scalar: &[u8; 32], point_u: &[u8; 32]) -> [u8; 32] {
    lc_core::poison(scalar);
    let mut k = clamp(scalar);
    let u = Fe::from_bytes(point_u);
    let result = ladder(&k, &u).to_bytes();
    k.zeroize();
    lc_core::unpoison(&result);
    result
}

/// Scalar multiplication of the base point u = 9 (public-key derivation).
///
/// # Errors
///
/// `SelftestFailed` when the X25519 latch is failed.
pub fn x25519_base(scalar: &[u8; 32]) -> Result<[u8; 32]> {
    let mut base = [0u8; 32];
    base[0] = 9;
    x25519(scalar, &base)
}

fn kat_x25519() -> Result<()> {
    // Scalar-multiplication vector shared with the Ed25519-to-X25519
    // conversion tests of libsodium.
    let sk: [u8; 32] = [
        status::fips140_mod(0x80),
        0x52,
        0x03,
        0x03,
        0x76,
        0xd4,
        0x71,
        0x12,
        0xbe,
        0x7f,
        0x73,
        0xed,
        0x7a,
        0x01,
        0x92,
        0x93,
        0xdd,
        0x12,
        0xad,
        0x91,
        0x0b,
        0x65,
        0x44,
        0x55,
        0x79,
        0x8b,
        0x46,
        0x67,
        0xd7,
        0x3d,
        0xe1,
        0x66,
    ];
    let expected_pk: [u8; 32] = [
        0xf1, 0x81, 0x4f, 0x0e, 0x8f, 0xf1, 0x04, 0x3d, 0x8a, 0x44, 0xd2, 0x5b, 0xab, 0xff, 0x3c,
        0xed, 0xca, 0xe6, 0xc2, 0x2c, 0x3e, 0xda, 0xa4, 0x8f, 0x85, 0x7a, 0xe7, 0x0d, 0xe2, 0xba,
        0xae, 0x50,
    ];

    let mut base = [0u8; 32];
    base[0] = 9;
    let actual = x25519_nocheck(&sk, &base);
    status::compare_selftest(AlgorithmId::X25519, &actual, &expected_pk)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_point_vector() {
        let sk = [
            0x80, 0x52, 0x03, 0x03, 0x76, 0xd4, 0x71, 0x12, 0xbe, 0x7f, 0x73, 0xed, 0x7a, 0x01,
            0x92, 0x93, 0xdd, 0x12, 0xad, 0x91, 0x0b, 0x65, 0x44, 0x55, 0x79, 0x8b, 0x46, 0x67,
            0xd7, 0x3d, 0xe1, 0x66,
        ];
        let expected = [
            0xf1, 0x81, 0x4f, 0x0e, 0x8f, 0xf1, 0x04, 0x3d, 0x8a, 0x44, 0xd2, 0x5b, 0xab, 0xff,
            0x3c, 0xed, 0xca, 0xe6, 0xc2, 0x2c, 0x3e, 0xda, 0xa4, 0x8f, 0x85, 0x7a, 0xe7, 0x0d,
            0xe2, 0xba, 0xae, 0x50,
        ];
        assert_eq!(x25519_base(&sk).unwrap(), expected);
    }

    #[test]
    fn iterated_base_point_once() {
        // RFC 7748 section 5.2 iteration test, first step: k = u = 9.
        let mut k = [0u8; 32];
        k[0] = 9;
        let u = k;
        let expected = [
            0x42, 0x2c, 0x8e, 0x7a, 0x62, 0x27, 0xd7, 0xbc, 0xa1, 0x35, 0x0b, 0x3e, 0x2b, 0xb7,
            0x27, 0x9f, 0x78, 0x97, 0xb8, 0x7b, 0xb6, 0x85, 0x4b, 0x78, 0x3c, 0x60, 0xe8, 0x03,
            0x11, 0xae, 0x30, 0x79,
        ];
        assert_eq!(x25519(&k, &u).unwrap(), expected);
    }

    #[test]
    fn diffie_hellman_agreement() {
        let alice_sk = [0x11u8; 32];
        let bob_sk = [0x22u8; 32];
        let alice_pk = x25519_base(&alice_sk).unwrap();
        let bob_pk = x25519_base(&bob_sk).unwrap();

        let alice_shared = x25519(&alice_sk, &bob_pk).unwrap();
        let bob_shared = x25519(&bob_sk, &alice_pk).unwrap();
        assert_eq!(alice_shared, bob_shared);
        assert_ne!(alice_shared, [0u8; 32]);
    }

    #[test]
    fn clamping_fixes_bits() {
        let k = clamp(&[0xffu8; 32]);
        assert_eq!(k[0] & 7, 0);
        assert_eq!(k[31] & 128, 0);
        assert_eq!(k[31] & 64, 64);
    }

    #[test]
    fn field_roundtrip_through_bytes() {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(7).wrapping_add(3);
        }
        bytes[31] &= 0x7f;
        let fe = Fe::from_bytes(&bytes);
        assert_eq!(fe.to_bytes(), bytes);
    }

    #[test]
    fn inversion_is_an_inverse() {
        let mut bytes = [0u8; 32];
        bytes[0] = 5;
        let x = Fe::from_bytes(&bytes);
        let one = x.mul(&x.invert());
        assert_eq!(one.to_bytes(), Fe::ONE.to_bytes());
    }
}
