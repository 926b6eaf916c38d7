// GHASH batches on PCLMULQDQ, and on VPCLMULQDQ for the Wide path.
//
// A block loaded with _mm_loadu_si128 and byte swapped with BSWAP_MASK holds
// exactly the u128 of FieldElement: the low 64 bits lane is a0, the high
// lane a1. So the portable and the vector code share the table and the
// accumulator without conversions.

use super::field::{FieldElement, BLOCK_SIZE};
use super::table::TABLE_SIZE;
use core::arch::x86_64::*;
use core::mem::transmute;

const BSWAP_MASK: __m128i = unsafe {
    transmute([15u8, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0])
};

// The reduction constant 0xC200000000000000 in the high lane, picked by the
// 0x10 selector of _mm_clmulepi64_si128.
const REDUCTION_CONSTANT: __m128i = unsafe { transmute([0u64, 0xC200000000000000]) };

#[inline(always)]
fn load_reflected(block: &[u8]) -> __m128i {
    debug_assert!(block.len() >= BLOCK_SIZE);
    unsafe { _mm_shuffle_epi8(_mm_loadu_si128(block.as_ptr() as *const __m128i), BSWAP_MASK) }
}

#[inline(always)]
fn from_field(x: FieldElement) -> __m128i {
    unsafe { transmute(x.0) }
}

#[inline(always)]
fn to_field(x: __m128i) -> FieldElement {
    FieldElement(unsafe { transmute::<__m128i, u128>(x) })
}

// Karatsuba partial products (z0, z1, z2).
#[derive(Clone, Copy)]
struct Triple {
    z0: __m128i,
    z1: __m128i,
    z2: __m128i,
}

impl Triple {
    #[inline(always)]
    fn xor(self, rhs: Triple) -> Triple {
        unsafe {
            Triple {
                z0: _mm_xor_si128(self.z0, rhs.z0),
                z1: _mm_xor_si128(self.z1, rhs.z1),
                z2: _mm_xor_si128(self.z2, rhs.z2),
            }
        }
    }
}

#[inline(always)]
fn karatsuba(a: __m128i, b: __m128i) -> Triple {
    unsafe {
        let z0 = _mm_clmulepi64_si128::<0x00>(a, b);
        let z2 = _mm_clmulepi64_si128::<0x11>(a, b);

        let a = _mm_xor_si128(a, _mm_bsrli_si128::<8>(a));
        let b = _mm_xor_si128(b, _mm_bsrli_si128::<8>(b));
        let z1 = _mm_clmulepi64_si128::<0x00>(a, b);
        Triple { z0, z1, z2 }
    }
}

// (hi, lo) of the 256 bits product.
#[inline(always)]
fn combine(t: Triple) -> (__m128i, __m128i) {
    unsafe {
        let m = _mm_xor_si128(t.z1, _mm_xor_si128(t.z0, t.z2));
        let lo = _mm_xor_si128(t.z0, _mm_bslli_si128::<8>(m));
        let hi = _mm_xor_si128(t.z2, _mm_bsrli_si128::<8>(m));
        (hi, lo)
    }
}

#[inline(always)]
fn montgomery_reduce(hi: __m128i, lo: __m128i) -> __m128i {
    unsafe {
        let a = _mm_clmulepi64_si128::<0x10>(lo, REDUCTION_CONSTANT);
        let b = _mm_xor_si128(a, _mm_shuffle_epi32::<0x4E>(lo));
        let c = _mm_clmulepi64_si128::<0x10>(b, REDUCTION_CONSTANT);
        let d = _mm_xor_si128(c, _mm_shuffle_epi32::<0x4E>(b));
        _mm_xor_si128(d, hi)
    }
}

#[inline(always)]
fn reduce(t: Triple) -> __m128i {
    let (hi, lo) = combine(t);
    montgomery_reduce(hi, lo)
}

// Four blocks against h[base+3]..h[base]. The carry goes into the first
// block only.
#[inline(always)]
fn lane4(h: &[__m128i; TABLE_SIZE], base: usize, carry: Option<__m128i>, blocks: &[u8]) -> Triple {
    let mut x0 = load_reflected(&blocks[..16]);
    if let Some(y) = carry {
        x0 = unsafe { _mm_xor_si128(x0, y) };
    }
    let t = karatsuba(x0, h[base + 3]);
    let t = t.xor(karatsuba(load_reflected(&blocks[16..32]), h[base + 2]));
    let t = t.xor(karatsuba(load_reflected(&blocks[32..48]), h[base + 1]));
    t.xor(karatsuba(load_reflected(&blocks[48..64]), h[base]))
}

#[inline(always)]
fn load_powers(powers: &[FieldElement; TABLE_SIZE]) -> [__m128i; TABLE_SIZE] {
    let mut h = unsafe { [_mm_setzero_si128(); TABLE_SIZE] };
    for (hi, p) in h.iter_mut().zip(powers.iter()) {
        *hi = from_field(*p);
    }
    h
}

#[inline(always)]
fn blocks_1(h: &[__m128i; TABLE_SIZE], y: __m128i, blocks: &[u8]) -> __m128i {
    let mut y = y;
    for block in blocks.chunks_exact(BLOCK_SIZE) {
        let x = unsafe { _mm_xor_si128(y, load_reflected(block)) };
        y = reduce(karatsuba(x, h[0]));
    }
    y
}

#[inline(always)]
fn blocks_4(h: &[__m128i; TABLE_SIZE], y: __m128i, blocks: &[u8]) -> __m128i {
    let mut y = y;
    let mut chunks = blocks.chunks_exact(4 * BLOCK_SIZE);
    for chunk in &mut chunks {
        y = reduce(lane4(h, 0, Some(y), chunk));
    }
    blocks_1(h, y, chunks.remainder())
}

/// Four blocks per reduction.
///
/// # Safety
/// The CPU must support PCLMULQDQ, SSE2 and SSSE3.
#[target_feature(enable = "pclmulqdq", enable = "sse2", enable = "ssse3")]
pub(crate) unsafe fn ghash_blocks_medium(
    powers: &[FieldElement; TABLE_SIZE],
    y: FieldElement,
    blocks: &[u8],
) -> FieldElement {
    let h = load_powers(powers);
    to_field(blocks_4(&h, from_field(y), blocks))
}

// Two blocks per 256-bit register: block 2i in the low lane, block 2i+1 in
// the high lane. VPCLMULQDQ multiplies both lanes at once.

const BSWAP_MASK_256: __m256i = unsafe {
    transmute([
        15u8, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, //
        15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0,
    ])
};

#[inline(always)]
fn load_reflected_pair(blocks: &[u8]) -> __m256i {
    debug_assert!(blocks.len() >= 2 * BLOCK_SIZE);
    unsafe {
        _mm256_shuffle_epi8(
            _mm256_loadu_si256(blocks.as_ptr() as *const __m256i),
            BSWAP_MASK_256,
        )
    }
}

#[inline(always)]
fn xor_lanes(x: __m256i) -> __m128i {
    unsafe { _mm_xor_si128(_mm256_castsi256_si128(x), _mm256_extracti128_si256::<1>(x)) }
}

#[derive(Clone, Copy)]
struct WideTriple {
    z0: __m256i,
    z1: __m256i,
    z2: __m256i,
}

impl WideTriple {
    #[inline(always)]
    fn xor(self, rhs: WideTriple) -> WideTriple {
        unsafe {
            WideTriple {
                z0: _mm256_xor_si256(self.z0, rhs.z0),
                z1: _mm256_xor_si256(self.z1, rhs.z1),
                z2: _mm256_xor_si256(self.z2, rhs.z2),
            }
        }
    }

    // Sums the two lanes. The Karatsuba parts are linear, so the result
    // combines and reduces like a single product.
    #[inline(always)]
    fn fold(self) -> Triple {
        Triple {
            z0: xor_lanes(self.z0),
            z1: xor_lanes(self.z1),
            z2: xor_lanes(self.z2),
        }
    }
}

#[inline(always)]
fn karatsuba_pair(a: __m256i, b: __m256i) -> WideTriple {
    unsafe {
        let z0 = _mm256_clmulepi64_epi128::<0x00>(a, b);
        let z2 = _mm256_clmulepi64_epi128::<0x11>(a, b);

        let a = _mm256_xor_si256(a, _mm256_bsrli_epi128::<8>(a));
        let b = _mm256_xor_si256(b, _mm256_bsrli_epi128::<8>(b));
        let z1 = _mm256_clmulepi64_epi128::<0x00>(a, b);
        WideTriple { z0, z1, z2 }
    }
}

// Register i pairs H^(16-2i) (low lane) with H^(15-2i) (high lane), the
// powers of blocks 2i and 2i+1 of a sixteen block chunk.
#[inline(always)]
fn load_power_pairs(h: &[__m128i; TABLE_SIZE]) -> [__m256i; TABLE_SIZE / 2] {
    let mut pairs = unsafe { [_mm256_setzero_si256(); TABLE_SIZE / 2] };
    for (i, pair) in pairs.iter_mut().enumerate() {
        *pair = unsafe { _mm256_set_m128i(h[TABLE_SIZE - 2 - 2 * i], h[TABLE_SIZE - 1 - 2 * i]) };
    }
    pairs
}

// Lane group g: blocks 4g..4g+4 of the chunk in two registers. The carry
// goes into the low lane of the first register only.
#[inline(always)]
fn lane4_wide(
    pairs: &[__m256i; TABLE_SIZE / 2],
    g: usize,
    carry: Option<__m128i>,
    blocks: &[u8],
) -> WideTriple {
    let mut x0 = load_reflected_pair(&blocks[..32]);
    if let Some(y) = carry {
        x0 = unsafe { _mm256_xor_si256(x0, _mm256_set_m128i(_mm_setzero_si128(), y)) };
    }
    let t = karatsuba_pair(x0, pairs[2 * g]);
    t.xor(karatsuba_pair(load_reflected_pair(&blocks[32..64]), pairs[2 * g + 1]))
}

/// Sixteen blocks per reduction on 256-bit VPCLMULQDQ: four lane groups of
/// two registers, summed and folded to 128 bits before one reduction. The
/// tail runs in fours and ones on PCLMULQDQ.
///
/// # Safety
/// The CPU must support PCLMULQDQ, SSE2, SSSE3, AVX2 and VPCLMULQDQ.
#[target_feature(
    enable = "pclmulqdq",
    enable = "sse2",
    enable = "ssse3",
    enable = "avx",
    enable = "avx2",
    enable = "vpclmulqdq"
)]
pub(crate) unsafe fn ghash_blocks_wide(
    powers: &[FieldElement; TABLE_SIZE],
    y: FieldElement,
    blocks: &[u8],
) -> FieldElement {
    let h = load_powers(powers);
    let pairs = load_power_pairs(&h);
    let mut y = from_field(y);
    let mut chunks = blocks.chunks_exact(16 * BLOCK_SIZE);
    for chunk in &mut chunks {
        let mut t = lane4_wide(&pairs, 0, Some(y), &chunk[..64]);
        t = t.xor(lane4_wide(&pairs, 1, None, &chunk[64..128]));
        t = t.xor(lane4_wide(&pairs, 2, None, &chunk[128..192]));
        t = t.xor(lane4_wide(&pairs, 3, None, &chunk[192..]));
        y = reduce(t.fold());
    }
    to_field(blocks_4(&h, y, chunks.remainder()))
}
