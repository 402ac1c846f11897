//! Keccak-f[1600] permutation back-ends.
//!
//! Two bit-exact implementations are registered with the dispatch cell:
//! the portable reference (a direct transcription of the FIPS 202 step
//! mappings) and a lane-walking variant whose unrolled theta/chi planes
//! auto-vectorize on AVX2 and NEON machines. Selection is cached per
//! process; a candidate must reproduce the reference on two probe states
//! before it is accepted.

use lc_core::CpuFeatures;
use lc_core::dispatch::{Backend, DispatchCell};

/// Lanes of the 1600-bit state.
pub const LANES: usize = 25;

/// Iota round constants for the 24 rounds of Keccak-f[1600].
const ROUND_CONSTANTS: [u64; 24] = [
    0x0000000000000001,
    0x0000000000008082,
    0x800000000000808a,
    0x8000000080008000,
    0x000000000000808b,
    0x0000000080000001,
    0x8000000080008081,
    0x8000000000008009,
    0x000000000000008a,
    0x0000000000000088,
    0x0000000080008009,
    0x000000008000000a,
    0x000000008000808b,
    0x800000000000008b,
    0x8000000000008089,
    0x8000000000008003,
    0x8000000000008002,
    0x8000000000000080,
    0x000000000000800a,
    0x800000008000000a,
    0x8000000080008081,
    0x8000000000008080,
    0x0000000080000001,
    0x8000000080008008,
];

/// Rho rotation offsets, indexed `x + 5*y`.
const RHO_OFFSETS: [u32; LANES] = [
    0, 1, 62, 28, 27, //
    36, 44, 6, 55, 20, //
    3, 10, 43, 25, 39, //
    41, 45, 15, 21, 8, //
    18, 2, 61, 56, 14,
];

/// Portable reference permutation: theta, rho, pi, chi, iota exactly as
/// the step mappings read in FIPS 202.
pub fn permute_portable(a: &mut [u64; LANES]) {
    for &rc in &ROUND_CONSTANTS {
        // theta
        let mut c = [0u64; 5];
        for x in 0..5 {
            c[x] = a[x] ^ a[x + 5] ^ a[x + 10] ^ a[x + 15] ^ a[x + 20];
        }
        let mut d = [0u64; 5];
        for x in 0..5 {
            d[x] = c[(x + 4) % 5] ^ c[(x + 1) % 5].rotate_left(1);
        }
        for y in 0..5 {
            for x in 0..5 {
                a[x + 5 * y] ^= d[x];
            }
        }

        // rho + pi: B[y, 2x+3y] = rot(A[x, y])
        let mut b = [0u64; LANES];
        for y in 0..5 {
            for x in 0..5 {
                let src = x + 5 * y;
                let dst = y + 5 * ((2 * x + 3 * y) % 5);
                b[dst] = a[src].rotate_left(RHO_OFFSETS[src]);
            }
        }

        // chi
        for y in 0..5 {
            for x in 0..5 {
                a[x + 5 * y] =
                    b[x + 5 * y] ^ (!b[(x + 1) % 5 + 5 * y] & b[(x + 2) % 5 + 5 * y]);
            }
        }

        // iota
        a[0] ^= rc;
    }
}

/// In the lane-walk order, the pi destinations and rho rotations collapse
/// to one 24-entry cycle starting at lane 1.
const PI_CYCLE: [usize; 24] = [
    10, 7, 11, 17, 18, 3, 5, 16, 8, 21, 24, 4, 15, 23, 19, 13, 12, 2, 20, 14, 22, 9, 6, 1,
];

const RHO_CYCLE: [u32; 24] = [
    1, 3, 6, 10, 15, 21, 28, 36, 45, 55, 2, 14, 27, 41, 56, 8, 25, 43, 62, 18, 39, 61, 20, 44,
];

/// Lane-walking permutation: rho and pi are applied in one pass along the
/// pi cycle, chi works plane-by-plane on a 5-lane window. Plain u64 code,
/// but the flat plane loops are what the vector units chew through.
pub fn permute_lanewise(a: &mut [u64; LANES]) {
    for &rc in &ROUND_CONSTANTS {
        // theta
        let mut c = [0u64; 5];
        for x in 0..5 {
            c[x] = a[x] ^ a[x + 5] ^ a[x + 10] ^ a[x + 15] ^ a[x + 20];
        }
        for x in 0..5 {
            let d = c[(x + 4) % 5] ^ c[(x + 1) % 5].rotate_left(1);
            a[x] ^= d;
            a[x + 5] ^= d;
            a[x + 10] ^= d;
            a[x + 15] ^= d;
            a[x + 20] ^= d;
        }

        // rho + pi along the cycle
        let mut last = a[1];
        for t in 0..24 {
            let dst = PI_CYCLE[t];
            let held = a[dst];
            a[dst] = last.rotate_left(RHO_CYCLE[t]);
            last = held;
        }

        // chi, one plane at a time
        for y in 0..5 {
            let row = [a[5 * y], a[5 * y + 1], a[5 * y + 2], a[5 * y + 3], a[5 * y + 4]];
            a[5 * y] = row[0] ^ (!row[1] & row[2]);
            a[5 * y + 1] = row[1] ^ (!row[2] & row[3]);
            a[5 * y + 2] = row[2] ^ (!row[3] & row[4]);
            a[5 * y + 3] = row[3] ^ (!row[4] & row[0]);
            a[5 * y + 4] = row[4] ^ (!row[0] & row[1]);
        }

        a[0] ^= rc;
    }
}

/// One selectable permutation implementation.
pub struct KeccakBackend {
    name: &'static str,
    required: CpuFeatures,
    f: fn(&mut [u64; LANES]),
}

impl Backend for KeccakBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn required(&self) -> CpuFeatures {
        self.required
    }

    fn verify(&self) -> bool {
        // Probe with the zero state and a patterned state; the candidate
        // must match the portable reference on both.
        let mut probe = [0u64; LANES];
        let mut reference = [0u64; LANES];
        for i in 0..LANES {
            probe[i] = (i as u64).wrapping_mul(0x9e3779b97f4a7c15) ^ 0xa5a5a5a5a5a5a5a5;
            reference[i] = probe[i];
        }
        let mut ok = true;
        for _ in 0..2 {
            (self.f)(&mut probe);
            permute_portable(&mut reference);
            ok &= probe == reference;
        }
        ok
    }
}

static PORTABLE: KeccakBackend =
    KeccakBackend { name: "keccak-portable", required: CpuFeatures::NONE, f: permute_portable };

static LANEWISE_AVX2: KeccakBackend =
    KeccakBackend { name: "keccak-lanewise-avx2", required: CpuFeatures::AVX2, f: permute_lanewise };

static LANEWISE_NEON: KeccakBackend =
    KeccakBackend { name: "keccak-lanewise-neon", required: CpuFeatures::NEON, f: permute_lanewise };

/// Backend table, highest priority first, portable last.
pub static BACKENDS: [&KeccakBackend; 3] = [&LANEWISE_AVX2, &LANEWISE_NEON, &PORTABLE];

static SELECTED: DispatchCell = DispatchCell::new();

/// Apply Keccak-f[1600] using the process-wide selected backend.
pub fn permute(a: &mut [u64; LANES]) {
    match SELECTED.select(&BACKENDS) {
        Ok(backend) => (backend.f)(a),
        // The table ends in the portable entry, so this arm only serves a
        // table misconfiguration; stay functional on the reference.
        Err(_) => permute_portable(a),
    }
}

/// Name of the backend the dispatcher picked, selecting if needed.
#[must_use]
pub fn selected_backend() -> &'static str {
    SELECTED.select(&BACKENDS).map_or("keccak-portable", |b| b.name())
}

/// Drop the cached selection. Test support for `cpufeatures::force`.
pub fn reset_selection() {
    SELECTED.reset();
}
