use core::arch::x86_64::*;

use crate::aes::{BLOCK_SIZE, Blocks};
use crate::internal::cpuid::x86_64::*;

#[inline(always)]
fn aesni_avaliable() -> bool {
    support_aes() && support_sse2()
}

#[inline(always)]
unsafe fn load(src: &[u8]) -> __m128i {
    debug_assert!(src.len() >= BLOCK_SIZE);
    unsafe { _mm_loadu_si128(src.as_ptr() as *const __m128i) }
}

#[inline(always)]
unsafe fn store(dst: &mut [u8], x: __m128i) {
    debug_assert!(dst.len() >= BLOCK_SIZE);
    unsafe { _mm_storeu_si128(dst.as_mut_ptr() as *mut __m128i, x) }
}

#[target_feature(enable = "aes", enable = "sse2")]
unsafe fn encrypt1_aesni(x: __m128i, rk: &[[u8; BLOCK_SIZE]]) -> __m128i {
    unsafe {
        let rounds = rk.len() - 1;
        let mut x = _mm_xor_si128(x, load(&rk[0]));
        for k in &rk[1..rounds] {
            x = _mm_aesenc_si128(x, load(k));
        }
        _mm_aesenclast_si128(x, load(&rk[rounds]))
    }
}

// four independent states interleaved to hide the aesenc latency.
#[target_feature(enable = "aes", enable = "sse2")]
unsafe fn encrypt4_aesni(
    x: [__m128i; 4],
    rk: &[[u8; BLOCK_SIZE]],
) -> [__m128i; 4] {
    unsafe {
        let rounds = rk.len() - 1;
        let k = load(&rk[0]);
        let mut a = _mm_xor_si128(x[0], k);
        let mut b = _mm_xor_si128(x[1], k);
        let mut c = _mm_xor_si128(x[2], k);
        let mut d = _mm_xor_si128(x[3], k);
        for rk in &rk[1..rounds] {
            let k = load(rk);
            a = _mm_aesenc_si128(a, k);
            b = _mm_aesenc_si128(b, k);
            c = _mm_aesenc_si128(c, k);
            d = _mm_aesenc_si128(d, k);
        }
        let k = load(&rk[rounds]);
        [
            _mm_aesenclast_si128(a, k),
            _mm_aesenclast_si128(b, k),
            _mm_aesenclast_si128(c, k),
            _mm_aesenclast_si128(d, k),
        ]
    }
}

fn block_aesni(dst: &mut [u8], src: &[u8], rk: &[[u8; BLOCK_SIZE]]) {
    unsafe {
        let x = encrypt1_aesni(load(src), rk);
        store(dst, x);
    }
}

fn block_aesni_inplace(dst_src: &mut [u8], rk: &[[u8; BLOCK_SIZE]]) {
    unsafe {
        let x = encrypt1_aesni(load(dst_src), rk);
        store(dst_src, x);
    }
}

fn block4_aesni(dst: &mut [u8], src: &[u8], rk: &[[u8; BLOCK_SIZE]]) {
    unsafe {
        let x = encrypt4_aesni(
            [load(&src[..16]), load(&src[16..32]), load(&src[32..48]), load(&src[48..64])],
            rk,
        );
        store(&mut dst[..16], x[0]);
        store(&mut dst[16..32], x[1]);
        store(&mut dst[32..48], x[2]);
        store(&mut dst[48..64], x[3]);
    }
}

fn block4_aesni_inplace(dst_src: &mut [u8], rk: &[[u8; BLOCK_SIZE]]) {
    unsafe {
        let x = encrypt4_aesni(
            [
                load(&dst_src[..16]),
                load(&dst_src[16..32]),
                load(&dst_src[32..48]),
                load(&dst_src[48..64]),
            ],
            rk,
        );
        store(&mut dst_src[..16], x[0]);
        store(&mut dst_src[16..32], x[1]);
        store(&mut dst_src[32..48], x[2]);
        store(&mut dst_src[48..64], x[3]);
    }
}

#[inline(always)]
pub(crate) fn new_blocks_amd64() -> Blocks {
    let mut blocks = Blocks::default();

    // aesni has no table lookup.
    if aesni_avaliable() {
        blocks.block4 = block4_aesni;
        blocks.block4_inplace = block4_aesni_inplace;
        blocks.block = block_aesni;
        blocks.block_inplace = block_aesni_inplace;
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aes::block::generic::*;
    use std::vec::Vec;

    #[test]
    fn test_aesni_matches_generic() {
        if !aesni_avaliable() {
            return;
        }
        for key_len in [16usize, 24, 32] {
            let key: Vec<u8> = (0..key_len as u8).map(|x| x.wrapping_mul(29)).collect();
            let cipher = crate::aes::Cipher::new(&key).unwrap();
            let rk = cipher.round_keys();
            let src: Vec<u8> = (0..64u8).map(|x| x ^ 0x5a).collect();

            let mut want = [0u8; 64];
            block4_generic(&mut want, &src, rk);

            let mut got = [0u8; 64];
            block4_aesni(&mut got, &src, rk);
            assert_eq!(got, want);

            let mut got = [0u8; 16];
            block_aesni(&mut got, &src[16..32], rk);
            assert_eq!(got, want[16..32]);

            let mut in_out = [0u8; 64];
            in_out.copy_from_slice(&src);
            block4_aesni_inplace(&mut in_out, rk);
            assert_eq!(in_out, want);
            block_aesni_inplace(&mut in_out[..16], rk);
            let mut twice = [0u8; 16];
            block_generic(&mut twice, &want[..16], rk);
            assert_eq!(in_out[..16], twice);
        }
    }
}
