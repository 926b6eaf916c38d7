use super::field::{mul, FieldElement, BLOCK_SIZE};
use super::ghash_generic::Soft;

// H^1..H^16: enough for four lane groups of four blocks.
pub(crate) const TABLE_SIZE: usize = 16;

/// Powers of the hash subkey. Entry i holds H^(i+1), kept pre-multiplied by
/// x^-1 so that a single reduce() of a carry-less product lands back on the
/// true product.
#[repr(align(64))]
#[derive(Clone)]
pub struct HashSubkeyTable {
    powers: [FieldElement; TABLE_SIZE],
}

impl Default for HashSubkeyTable {
    fn default() -> Self {
        HashSubkeyTable { powers: [FieldElement::ZERO; TABLE_SIZE] }
    }
}

impl HashSubkeyTable {
    // h = E_K(0^128) in GCM byte order.
    pub fn new(h: &[u8; BLOCK_SIZE]) -> Self {
        let h1 = FieldElement::from_block(h).div_x();
        let mut powers = [FieldElement::ZERO; TABLE_SIZE];
        powers[0] = h1;
        for i in 1..TABLE_SIZE {
            powers[i] = mul::<Soft>(powers[i - 1], h1);
        }
        HashSubkeyTable { powers }
    }

    #[inline(always)]
    pub(crate) fn powers(&self) -> &[FieldElement; TABLE_SIZE] {
        &self.powers
    }
}

impl Drop for HashSubkeyTable {
    fn drop(&mut self) {
        self.powers = [FieldElement::ZERO; TABLE_SIZE];
    }
}
