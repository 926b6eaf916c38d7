use super::field::{Clmul, FieldElement};
use super::ghash_generic::ghash_blocks_4;
use super::table::TABLE_SIZE;
use core::arch::aarch64::*;

/// Four blocks per reduction on PMULL.
///
/// # Safety
/// The CPU must support NEON and the crypto extension.
#[target_feature(enable = "neon", enable = "aes")]
pub(crate) unsafe fn ghash_blocks_pmull(
    powers: &[FieldElement; TABLE_SIZE],
    y: FieldElement,
    blocks: &[u8],
) -> FieldElement {
    // vmull_p64 needs the features enabled above. Pmull stays local here.
    struct Pmull;

    impl Clmul for Pmull {
        #[inline(always)]
        fn clmul64(a: u64, b: u64) -> u128 {
            unsafe { vmull_p64(a, b) }
        }
    }

    ghash_blocks_4::<Pmull>(powers, y, blocks)
}
