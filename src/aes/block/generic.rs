use super::tables::SBOX;
use crate::aes::BLOCK_SIZE;

#[inline(always)]
fn xtime(x: u8) -> u8 {
    (x << 1) ^ (((x >> 7) & 1) * 0x1b)
}

#[inline(always)]
fn add_round_key(s: &mut [u8; BLOCK_SIZE], rk: &[u8; BLOCK_SIZE]) {
    s.iter_mut().zip(rk).for_each(|(x, k)| *x ^= *k);
}

// SubBytes and ShiftRows in one pass. The state is column major:
// s[r + 4c] is row r of column c, so row r rotates left by r columns.
#[inline(always)]
fn sub_shift(s: &mut [u8; BLOCK_SIZE]) {
    let t = *s;
    for c in 0..4 {
        for r in 0..4 {
            s[r + 4 * c] = SBOX[t[r + 4 * ((c + r) % 4)] as usize];
        }
    }
}

#[inline(always)]
fn mix_columns(s: &mut [u8; BLOCK_SIZE]) {
    for col in s.chunks_exact_mut(4) {
        let (a0, a1, a2, a3) = (col[0], col[1], col[2], col[3]);
        let t = a0 ^ a1 ^ a2 ^ a3;
        col[0] = a0 ^ t ^ xtime(a0 ^ a1);
        col[1] = a1 ^ t ^ xtime(a1 ^ a2);
        col[2] = a2 ^ t ^ xtime(a2 ^ a3);
        col[3] = a3 ^ t ^ xtime(a3 ^ a0);
    }
}

// rk holds rounds + 1 round keys.
#[inline]
pub fn encrypt_block_generic(s: &mut [u8; BLOCK_SIZE], rk: &[[u8; BLOCK_SIZE]]) {
    let rounds = rk.len() - 1;
    add_round_key(s, &rk[0]);
    for k in &rk[1..rounds] {
        sub_shift(s);
        mix_columns(s);
        add_round_key(s, k);
    }
    sub_shift(s);
    add_round_key(s, &rk[rounds]);
}

pub fn block_generic(dst: &mut [u8], src: &[u8], rk: &[[u8; BLOCK_SIZE]]) {
    let mut s: [u8; BLOCK_SIZE] = src[..BLOCK_SIZE].try_into().unwrap();
    encrypt_block_generic(&mut s, rk);
    dst[..BLOCK_SIZE].copy_from_slice(&s);
}

pub fn block_generic_inplace(dst_src: &mut [u8], rk: &[[u8; BLOCK_SIZE]]) {
    let s: &mut [u8; BLOCK_SIZE] = (&mut dst_src[..BLOCK_SIZE]).try_into().unwrap();
    encrypt_block_generic(s, rk);
}

pub fn block4_generic(dst: &mut [u8], src: &[u8], rk: &[[u8; BLOCK_SIZE]]) {
    for (d, s) in dst[..4 * BLOCK_SIZE]
        .chunks_exact_mut(BLOCK_SIZE)
        .zip(src[..4 * BLOCK_SIZE].chunks_exact(BLOCK_SIZE))
    {
        block_generic(d, s, rk);
    }
}

pub fn block4_generic_inplace(dst_src: &mut [u8], rk: &[[u8; BLOCK_SIZE]]) {
    for d in dst_src[..4 * BLOCK_SIZE].chunks_exact_mut(BLOCK_SIZE) {
        block_generic_inplace(d, rk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // FIPS-197 appendix B: state after the first round.
    #[test]
    fn test_first_round() {
        let mut s = hex!("3243f6a8885a308d313198a2e0370734");
        add_round_key(&mut s, &hex!("2b7e151628aed2a6abf7158809cf4f3c"));
        assert_eq!(s, hex!("193de3bea0f4e22b9ac68d2ae9f84808"));
        sub_shift(&mut s);
        assert_eq!(s, hex!("d4bf5d30e0b452aeb84111f11e2798e5"));
        mix_columns(&mut s);
        assert_eq!(s, hex!("046681e5e0cb199a48f8d37a2806264c"));
    }

    #[test]
    fn test_xtime() {
        assert_eq!(xtime(0x57), 0xae);
        assert_eq!(xtime(0xae), 0x47);
        assert_eq!(xtime(0x80), 0x1b);
    }
}
