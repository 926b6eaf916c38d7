pub mod block;
pub const BLOCK_SIZE: usize = 16;
pub const MAX_ROUNDS: usize = 14;

use block::*;

use crate::blockmode::{Error, Result};

// Expanded encryption key, one 16 bytes round key per row, in the byte order
// the state is kept in.
pub(crate) type RoundKeys = [[u8; BLOCK_SIZE]; MAX_ROUNDS + 1];

#[derive(Clone, Copy)]
pub(crate) struct Blocks {
    block4: fn(dst: &mut [u8], src: &[u8], rk: &[[u8; BLOCK_SIZE]]),
    block: fn(dst: &mut [u8], src: &[u8], rk: &[[u8; BLOCK_SIZE]]),

    block4_inplace: fn(inout: &mut [u8], rk: &[[u8; BLOCK_SIZE]]),
    block_inplace: fn(inout: &mut [u8], rk: &[[u8; BLOCK_SIZE]]),
}

#[cfg(feature = "std")]
#[ctor::ctor]
static GLOBAL_BLOCKS: Blocks = {Blocks::new()};

impl Default for Blocks {
    fn default() -> Self {
        Self {
            block4: block4_generic,
            block: block_generic,

            block4_inplace: block4_generic_inplace,
            block_inplace: block_generic_inplace,
        }
    }
}

impl Blocks {
    #[inline(always)]
    fn new() -> Blocks {
        #[cfg(target_arch = "x86_64")]
        return new_blocks_amd64();

        #[cfg(not(target_arch = "x86_64"))]
        Blocks::default()
    }

    // blocks encrypts as much as possible. returns the bytes that were
    // encrypted. dst must have a length no less than src.
    #[inline(always)]
    pub fn blocks(self, dst: &mut [u8], src: &[u8], rk: &[[u8; BLOCK_SIZE]]) -> usize {
        let n_blocks = core::cmp::min(src.len(), dst.len()) / BLOCK_SIZE;
        let mut n = n_blocks;
        let mut dst = dst;
        let mut src = src;

        while n >= 4 {
            (self.block4)(dst, src, rk);
            dst = &mut dst[BLOCK_SIZE * 4..];
            src = &src[BLOCK_SIZE * 4..];
            n -= 4;
        }

        while n >= 1 {
            (self.block)(dst, src, rk);
            dst = &mut dst[BLOCK_SIZE..];
            src = &src[BLOCK_SIZE..];
            n -= 1;
        }
        n_blocks * BLOCK_SIZE
    }

    #[inline(always)]
    pub fn blocks_inplace(self, dst_src: &mut [u8], rk: &[[u8; BLOCK_SIZE]]) -> usize {
        let n_blocks = dst_src.len() / BLOCK_SIZE;
        let mut n = n_blocks;
        let mut dst_src = dst_src;

        while n >= 4 {
            (self.block4_inplace)(dst_src, rk);
            dst_src = &mut dst_src[BLOCK_SIZE * 4..];
            n -= 4;
        }
        while n >= 1 {
            (self.block_inplace)(dst_src, rk);
            dst_src = &mut dst_src[BLOCK_SIZE..];
            n -= 1;
        }

        n_blocks * BLOCK_SIZE
    }
}

/// AES block cipher with a 128, 192 or 256 bits key. Only the forward
/// direction is provided: GCM and CTR never run the inverse cipher.
pub struct Cipher {
    rk: RoundKeys,
    rounds: usize,

    #[cfg(not(feature = "std"))]
    blocks: Blocks,
}

impl Cipher {
    pub fn new(key: &[u8]) -> Result<Self> {
        let rounds = match key.len() {
            16 => 10,
            24 => 12,
            32 => 14,
            n => return Err(Error::InvalidKeySize(n)),
        };
        Ok(Cipher {
            rk: key_schedule(key, rounds),
            rounds,
            #[cfg(not(feature = "std"))]
            blocks: Blocks::new(),
        })
    }

    // 10, 12 or 14.
    #[inline]
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    #[inline]
    fn round_keys(&self) -> &[[u8; BLOCK_SIZE]] {
        &self.rk[..self.rounds + 1]
    }

    // encrypt blocks into dst. returns the bytes encrypted.
    pub fn encrypt(&self, dst: &mut [u8], src: &[u8]) -> usize {
        #[cfg(not(feature = "std"))]
        let blocks = &self.blocks;
        #[cfg(feature = "std")]
        let blocks = &GLOBAL_BLOCKS;

        blocks.blocks(dst, src, self.round_keys())
    }

    pub fn encrypt_inplace(&self, in_out: &mut [u8]) -> usize {
        #[cfg(not(feature = "std"))]
        let blocks = &self.blocks;
        #[cfg(feature = "std")]
        let blocks = &GLOBAL_BLOCKS;

        blocks.blocks_inplace(in_out, self.round_keys())
    }

    #[inline]
    pub fn encrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) {
        self.encrypt_inplace(block);
    }
}

impl Drop for Cipher {
    fn drop(&mut self) {
        for k in &mut self.rk {
            *k = [0; BLOCK_SIZE];
        }
    }
}

/// Encrypts a single block under key, the round count following from the
/// key length.
pub fn encrypt_block(key: &[u8], block: &[u8; BLOCK_SIZE]) -> Result<[u8; BLOCK_SIZE]> {
    let cipher = Cipher::new(key)?;
    let mut out = *block;
    cipher.encrypt_block(&mut out);
    Ok(out)
}

const RCON: [u32; 10] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36];

#[inline]
fn sub_word(w: u32) -> u32 {
    let b = w.to_be_bytes();
    u32::from_be_bytes([
        SBOX[b[0] as usize],
        SBOX[b[1] as usize],
        SBOX[b[2] as usize],
        SBOX[b[3] as usize],
    ])
}

// FIPS-197 section 5.2.
#[inline]
fn key_schedule(key: &[u8], rounds: usize) -> RoundKeys {
    let nk = key.len() / 4;
    let total = 4 * (rounds + 1);
    let mut w = [0u32; 4 * (MAX_ROUNDS + 1)];

    for i in 0..nk {
        w[i] = u32::from_be_bytes(key[4 * i..4 * i + 4].try_into().unwrap());
    }
    for i in nk..total {
        let mut t = w[i - 1];
        if i % nk == 0 {
            t = sub_word(t.rotate_left(8)) ^ (RCON[i / nk - 1] << 24);
        } else if nk > 6 && i % nk == 4 {
            t = sub_word(t);
        }
        w[i] = w[i - nk] ^ t;
    }

    let mut rk = [[0u8; BLOCK_SIZE]; MAX_ROUNDS + 1];
    for (r, k) in rk.iter_mut().enumerate().take(rounds + 1) {
        for j in 0..4 {
            k[4 * j..4 * j + 4].copy_from_slice(&w[4 * r + j].to_be_bytes());
        }
    }
    for x in &mut w {
        *x = 0;
    }
    rk
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use std::vec::Vec;

    // FIPS-197 appendix C.
    const FIPS_PLAIN: [u8; 16] = hex!("00112233445566778899aabbccddeeff");

    #[test]
    fn test_fips197() {
        let cases: [(&[u8], [u8; 16]); 3] = [
            (&hex!("000102030405060708090a0b0c0d0e0f"), hex!("69c4e0d86a7b0430d8cdb78070b4c55a")),
            (
                &hex!("000102030405060708090a0b0c0d0e0f1011121314151617"),
                hex!("dda97ca4864cdfe06eaf70a0ec0d7191"),
            ),
            (
                &hex!("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f"),
                hex!("8ea2b7ca516745bfeafc49904b496089"),
            ),
        ];
        for (key, want) in cases {
            assert_eq!(encrypt_block(key, &FIPS_PLAIN).unwrap(), want);
        }
    }

    #[test]
    fn test_rounds() {
        assert_eq!(Cipher::new(&[0; 16]).unwrap().rounds(), 10);
        assert_eq!(Cipher::new(&[0; 24]).unwrap().rounds(), 12);
        assert_eq!(Cipher::new(&[0; 32]).unwrap().rounds(), 14);
        assert!(matches!(Cipher::new(&[0; 15]), Err(Error::InvalidKeySize(15))));
        assert!(matches!(Cipher::new(&[]), Err(Error::InvalidKeySize(0))));
    }

    // FIPS-197 appendix A.1 expansion of 2b7e1516 28aed2a6 abf71588 09cf4f3c.
    #[test]
    fn test_key_schedule() {
        let rk = key_schedule(&hex!("2b7e151628aed2a6abf7158809cf4f3c"), 10);
        assert_eq!(rk[1], hex!("a0fafe1788542cb123a339392a6c7605"));
        assert_eq!(rk[10], hex!("d014f9a8c9ee2589e13f0cc8b6630ca6"));
    }

    #[test]
    fn test_blocks() {
        let cipher = Cipher::new(&hex!("000102030405060708090a0b0c0d0e0f")).unwrap();
        let want = hex!("69c4e0d86a7b0430d8cdb78070b4c55a");
        for n in 0..23 {
            let plain: Vec<u8> = FIPS_PLAIN.iter().cycle().take(n * 16 + 5).copied().collect();
            let mut out = vec![0u8; plain.len()];
            assert_eq!(cipher.encrypt(&mut out, &plain), n * 16);
            for chunk in out[..n * 16].chunks_exact(16) {
                assert_eq!(chunk, want);
            }

            let mut in_out = plain.clone();
            assert_eq!(cipher.encrypt_inplace(&mut in_out), n * 16);
            assert_eq!(&in_out[..n * 16], &out[..n * 16]);
            assert_eq!(&in_out[n * 16..], &plain[n * 16..]);
        }
    }

    #[test]
    fn test_generic_matches_dispatched() {
        let cipher = Cipher::new(&hex!("000102030405060708090a0b0c0d0e0f1011121314151617")).unwrap();
        let plain: Vec<u8> = (0..=255u8).collect();
        let mut want = vec![0u8; 256];
        Blocks::default().blocks(&mut want, &plain, cipher.round_keys());
        let mut got = vec![0u8; 256];
        Blocks::new().blocks(&mut got, &plain, cipher.round_keys());
        assert_eq!(got, want);
    }
}
