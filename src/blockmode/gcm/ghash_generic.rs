// Portable GHASH batches. The same code runs with the software carry-less
// multiply below (the Scalar path) and with PMULL on aarch64.

use super::field::*;
use super::table::TABLE_SIZE;

pub(crate) struct Soft;

impl Clmul for Soft {
    // Constant time: every bit of b costs the same shift, mask and xor.
    #[inline(always)]
    fn clmul64(a: u64, b: u64) -> u128 {
        let a = a as u128;
        let mut r = 0u128;
        for i in 0..64 {
            let mask = 0u128.wrapping_sub(((b >> i) & 1) as u128);
            r ^= (a << i) & mask;
        }
        r
    }
}

// Sum of X_k * H^(base+4-k) for the four blocks of one lane group. carry is
// added into the first block only.
#[inline(always)]
pub(crate) fn lane4<C: Clmul>(
    powers: &[FieldElement; TABLE_SIZE],
    base: usize,
    carry: FieldElement,
    blocks: &[u8],
) -> Product {
    let mut p = Product::default();
    let mut carry = carry;
    for (k, block) in blocks.chunks_exact(BLOCK_SIZE).take(4).enumerate() {
        let x = FieldElement::from_slice(block) + carry;
        carry = FieldElement::ZERO;
        p.accumulate::<C>(x, powers[base + 3 - k]);
    }
    p
}

// y' = (y + X) * H, one block at a time.
#[inline(always)]
pub(crate) fn ghash_blocks_1<C: Clmul>(
    powers: &[FieldElement; TABLE_SIZE],
    y: FieldElement,
    blocks: &[u8],
) -> FieldElement {
    let mut y = y;
    for block in blocks.chunks_exact(BLOCK_SIZE) {
        y = mul::<C>(y + FieldElement::from_slice(block), powers[0]);
    }
    y
}

// Four blocks per reduction, the tail one block at a time.
#[inline(always)]
pub(crate) fn ghash_blocks_4<C: Clmul>(
    powers: &[FieldElement; TABLE_SIZE],
    y: FieldElement,
    blocks: &[u8],
) -> FieldElement {
    let mut y = y;
    let mut chunks = blocks.chunks_exact(4 * BLOCK_SIZE);
    for chunk in &mut chunks {
        let (hi, lo) = lane4::<C>(powers, 0, y, chunk).combine();
        y = reduce::<C>(hi, lo);
    }
    ghash_blocks_1::<C>(powers, y, chunks.remainder())
}

// The Scalar path.
pub(crate) fn ghash_blocks_scalar(
    powers: &[FieldElement; TABLE_SIZE],
    y: FieldElement,
    blocks: &[u8],
) -> FieldElement {
    ghash_blocks_1::<Soft>(powers, y, blocks)
}
