// Arithmetic in GF(2^128) modulo x^128 + x^7 + x^2 + x + 1.
//
// A 16 bytes GCM block [b0, b1, ..., b15] stands for the polynomial whose
// coefficient of x^0 is the MSB of b0 and whose coefficient of x^127 is the
// LSB of b15. Reading the block as a big-endian u128 therefore puts the
// coefficient of x^i at bit 127-i: the reflected form. Elements stay
// reflected from ingestion to the final tag, where to_block undoes it.
//
// In the reflected form the carry-less product of two elements, read as
// coefficient x^i at bit 255-i, is x * a * b. reduce() folds it back
// without any bit reversal, so the hash subkey is stored as H * x^-1
// (see FieldElement::div_x) and mul(a, H * x^-1) = a * H.
// ref: "Intel Carry-Less Multiplication Instruction and its Usage for
// Computing the GCM Mode", and Gueron's "AES-GCM for Efficient
// Authenticated Encryption - Ending the Reign of HMAC-SHA-1?".

use core::ops::{Add, AddAssign};

pub(crate) const BLOCK_SIZE: usize = 16;

// x^128 = x^7 + x^2 + x + 1 written in the reflected form and shifted into
// the top 64 bits.
pub(crate) const REDUCTION_CONSTANT: u64 = 0xC200000000000000;

// H * x^-1 is H << 1 plus this whenever the shifted out bit was set.
const DIV_X_POLY: u128 = 0xC2000000000000000000000000000001;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldElement(pub(crate) u128);

impl FieldElement {
    pub const ZERO: FieldElement = FieldElement(0);

    #[inline(always)]
    pub fn from_block(block: &[u8; BLOCK_SIZE]) -> Self {
        FieldElement(u128::from_be_bytes(*block))
    }

    // At most 16 bytes are read, a short slice is padded with zeros on
    // the right.
    #[inline(always)]
    pub fn from_slice(data: &[u8]) -> Self {
        let mut block = [0u8; BLOCK_SIZE];
        let n = core::cmp::min(BLOCK_SIZE, data.len());
        block[..n].copy_from_slice(&data[..n]);
        Self::from_block(&block)
    }

    #[inline(always)]
    pub fn to_block(self) -> [u8; BLOCK_SIZE] {
        self.0.to_be_bytes()
    }

    // self * x^-1, without branching on the secret bit.
    #[inline]
    pub fn div_x(self) -> Self {
        let carry = self.0 >> 127;
        let mask = 0u128.wrapping_sub(carry);
        FieldElement((self.0 << 1) ^ (DIV_X_POLY & mask))
    }
}

impl Add for FieldElement {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        FieldElement(self.0 ^ rhs.0)
    }
}

impl AddAssign for FieldElement {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

/// Carry-less multiplication of two 64-bit polynomials.
pub(crate) trait Clmul {
    fn clmul64(a: u64, b: u64) -> u128;
}

// Karatsuba partial products of a 128x128 carry-less multiplication:
// z0 = a0*b0, z2 = a1*b1, z1 = (a0+a1)*(b0+b1).
// Products of several blocks are summed here before a single reduction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Product {
    pub z0: u128,
    pub z1: u128,
    pub z2: u128,
}

impl Product {
    #[inline(always)]
    pub fn new<C: Clmul>(a: FieldElement, b: FieldElement) -> Self {
        let (a0, a1) = (a.0 as u64, (a.0 >> 64) as u64);
        let (b0, b1) = (b.0 as u64, (b.0 >> 64) as u64);
        Product {
            z0: C::clmul64(a0, b0),
            z1: C::clmul64(a0 ^ a1, b0 ^ b1),
            z2: C::clmul64(a1, b1),
        }
    }

    #[inline(always)]
    pub fn accumulate<C: Clmul>(&mut self, a: FieldElement, b: FieldElement) {
        *self += Self::new::<C>(a, b);
    }

    // The 256 bits product as (hi, lo).
    #[inline(always)]
    pub fn combine(self) -> (u128, u128) {
        let m = self.z1 ^ self.z0 ^ self.z2;
        (self.z2 ^ (m >> 64), self.z0 ^ (m << 64))
    }
}

impl AddAssign for Product {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        self.z0 ^= rhs.z0;
        self.z1 ^= rhs.z1;
        self.z2 ^= rhs.z2;
    }
}

// Two folding rounds by the reduction constant, then add the high half.
#[inline(always)]
pub(crate) fn reduce<C: Clmul>(hi: u128, lo: u128) -> FieldElement {
    let a = C::clmul64(lo as u64, REDUCTION_CONSTANT);
    let b = a ^ lo.rotate_left(64);
    let c = C::clmul64(b as u64, REDUCTION_CONSTANT);
    let d = c ^ b.rotate_left(64);
    FieldElement(d ^ hi)
}

// a * b * x, i.e. a * H when b holds H * x^-1.
#[inline(always)]
pub(crate) fn mul<C: Clmul>(a: FieldElement, b: FieldElement) -> FieldElement {
    let (hi, lo) = Product::new::<C>(a, b).combine();
    reduce::<C>(hi, lo)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::super::ghash_generic::Soft;
    use super::*;
    use hex_literal::hex;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::vec::Vec;

    // The GCM multiplication straight from SP 800-38D, algorithm 1.
    pub(crate) fn gf_mul_reference(x: FieldElement, y: FieldElement) -> FieldElement {
        const R: u128 = 0xE1 << 120;
        let mut z = 0u128;
        let mut v = y.0;
        for i in 0..128 {
            if (x.0 >> (127 - i)) & 1 == 1 {
                z ^= v;
            }
            v = if v & 1 == 1 { (v >> 1) ^ R } else { v >> 1 };
        }
        FieldElement(z)
    }

    // Bitwise long division of the 256 bits value hi:lo, coefficient x^i at
    // bit 255-i, by the GCM polynomial. The remainder is returned reflected.
    fn long_division(hi: u128, lo: u128) -> FieldElement {
        // natural form: coefficient x^i at bit i of (p_hi:p_lo)
        let mut p_lo = hi.reverse_bits();
        let mut p_hi = lo.reverse_bits();
        for d in (128..256).rev() {
            if (p_hi >> (d - 128)) & 1 == 1 {
                // subtract (x^128 + x^7 + x^2 + x + 1) * x^(d-128)
                let s = d - 128;
                p_hi ^= 1u128 << s;
                let low_part = 0x87u128;
                p_lo ^= low_part << s;
                if s > 120 {
                    p_hi ^= low_part >> (128 - s);
                }
            }
        }
        FieldElement(p_lo.reverse_bits())
    }

    #[test]
    fn test_reduce_matches_long_division() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut inputs = vec![(0u128, 0u128), (u128::MAX, u128::MAX), (1u128 << 127, 0), (0, 1)];
        for _ in 0..500 {
            inputs.push((rng.random(), rng.random()));
        }
        for (hi, lo) in inputs {
            assert_eq!(reduce::<Soft>(hi, lo), long_division(hi, lo), "{:x}:{:x}", hi, lo);
        }
    }

    #[test]
    fn test_mul_matches_reference() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let a = FieldElement(rng.random());
            let h = FieldElement(rng.random());
            assert_eq!(mul::<Soft>(a, h.div_x()), gf_mul_reference(a, h));
        }
        // one is the element with only the x^0 coefficient set
        let one = FieldElement(1 << 127);
        let h = FieldElement::from_block(&hex!("66e94bd4ef8a2c3b884cfa59ca342b2e"));
        assert_eq!(mul::<Soft>(one, h.div_x()), h);
        assert_eq!(mul::<Soft>(FieldElement::ZERO, h.div_x()), FieldElement::ZERO);
    }

    #[test]
    fn test_karatsuba_accumulate() {
        let mut rng = StdRng::seed_from_u64(11);
        let xs: Vec<FieldElement> = (0..4).map(|_| FieldElement(rng.random())).collect();
        let hs: Vec<FieldElement> = (0..4).map(|_| FieldElement(rng.random())).collect();

        let mut p = Product::default();
        let mut expected = FieldElement::ZERO;
        for (x, h) in xs.iter().zip(hs.iter()) {
            p.accumulate::<Soft>(*x, *h);
            expected += mul::<Soft>(*x, *h);
        }
        let (hi, lo) = p.combine();
        assert_eq!(reduce::<Soft>(hi, lo), expected);
    }

    #[test]
    fn test_block_conversion() {
        let b = hex!("0388dace60b6a392f328c2b971b2fe78");
        assert_eq!(FieldElement::from_block(&b).to_block(), b);
        assert_eq!(
            FieldElement::from_slice(&b[..5]).to_block(),
            hex!("0388dace600000000000000000000000")
        );
        assert_eq!(FieldElement::from_slice(&[]), FieldElement::ZERO);
    }
}
