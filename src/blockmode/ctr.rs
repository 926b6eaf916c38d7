use core::cmp::min;

use super::{Error, Result};
use crate::traits::Block;

const BLOCK_SIZE: usize = 16;

// Counter blocks are encrypted this many at a time.
const BATCH_BLOCKS: usize = 16;

// inc32 increments the right-most 32 bits of the counter block modulo 2^32.
#[inline]
pub(crate) fn inc32(counter: &mut [u8; BLOCK_SIZE]) {
    let ctr = &mut counter[BLOCK_SIZE - 4..];
    let x = u32::from_be_bytes(ctr.try_into().unwrap()).wrapping_add(1);
    ctr.copy_from_slice(&u32::to_be_bytes(x));
}

/// Counter state for CTR keystream generation: the next counter block plus
/// the unused tail of the last keystream block, so a stream may be split at
/// any byte.
#[derive(Clone)]
pub struct Counter {
    block: [u8; BLOCK_SIZE],
    keystream: [u8; BLOCK_SIZE],
    used: usize,
}

impl Default for Counter {
    fn default() -> Self {
        Counter::new([0; BLOCK_SIZE])
    }
}

impl Counter {
    pub fn new(block: [u8; BLOCK_SIZE]) -> Self {
        Counter {
            block,
            keystream: [0; BLOCK_SIZE],
            used: BLOCK_SIZE,
        }
    }

    /// XORs the keystream into in_out and advances the counter.
    pub fn xor_keystream<B: Block>(&mut self, cipher: &B, in_out: &mut [u8]) {
        let mut in_out = in_out;

        if self.used < BLOCK_SIZE {
            let n = min(BLOCK_SIZE - self.used, in_out.len());
            in_out[..n]
                .iter_mut()
                .zip(&self.keystream[self.used..self.used + n])
                .for_each(|(z, k)| *z ^= *k);
            self.used += n;
            in_out = &mut in_out[n..];
        }
        if in_out.is_empty() {
            return;
        }

        let full = in_out.len() / BLOCK_SIZE * BLOCK_SIZE;
        let (blocks, rest) = in_out.split_at_mut(full);

        let mut counter_buf = [0u8; BLOCK_SIZE * BATCH_BLOCKS];
        for chunk in blocks.chunks_mut(BLOCK_SIZE * BATCH_BLOCKS) {
            let stream = &mut counter_buf[..chunk.len()];
            for c in stream.chunks_exact_mut(BLOCK_SIZE) {
                c.copy_from_slice(&self.block);
                inc32(&mut self.block);
            }
            cipher.encrypt_inplace(stream);
            chunk.iter_mut().zip(stream.iter()).for_each(|(z, k)| *z ^= *k);
        }
        counter_buf.fill(0);

        if !rest.is_empty() {
            self.keystream = self.block;
            inc32(&mut self.block);
            cipher.encrypt_inplace(&mut self.keystream);
            rest.iter_mut()
                .zip(&self.keystream)
                .for_each(|(z, k)| *z ^= *k);
            self.used = rest.len();
        }
    }
}

impl Drop for Counter {
    fn drop(&mut self) {
        self.keystream = [0; BLOCK_SIZE];
    }
}

/// Keystream XOR over buf starting from counter, as a free function.
/// Returns the advanced counter state.
pub fn ctr_keystream_xor<B: Block>(cipher: &B, counter: Counter, buf: &mut [u8]) -> Counter {
    let mut counter = counter;
    counter.xor_keystream(cipher, buf);
    counter
}

/// CTR mode with a full 16 bytes initial counter block and a 32-bit
/// big-endian counter in its last four bytes.
pub struct Ctr<B: Block> {
    cipher: B,
    counter: Option<Counter>,
}

impl<B: Block> Ctr<B> {
    pub fn new(cipher: B) -> Self {
        debug_assert_eq!(cipher.block_size(), BLOCK_SIZE);
        Ctr { cipher, counter: None }
    }

    pub fn set_iv(&mut self, iv: &[u8]) -> Result<()> {
        let iv: [u8; BLOCK_SIZE] = iv
            .try_into()
            .map_err(|_| Error::InvalidArgument("ctr iv must be 16 bytes"))?;
        self.counter = Some(Counter::new(iv));
        Ok(())
    }

    pub fn encrypt_update(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        let counter = self.counter.as_mut().ok_or(Error::BadState)?;
        if output.len() < input.len() {
            return Err(Error::InvalidArgument("output shorter than input"));
        }
        let output = &mut output[..input.len()];
        output.copy_from_slice(input);
        counter.xor_keystream(&self.cipher, output);
        Ok(())
    }

    // CTR is its own inverse.
    pub fn decrypt_update(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        self.encrypt_update(input, output)
    }

    pub fn crypt_inplace(&mut self, in_out: &mut [u8]) -> Result<()> {
        let counter = self.counter.as_mut().ok_or(Error::BadState)?;
        counter.xor_keystream(&self.cipher, in_out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aes::Cipher;
    use hex_literal::hex;
    use std::vec::Vec;

    // NIST SP 800-38A F.5.1 CTR-AES128.Encrypt
    const KEY: [u8; 16] = hex!("2b7e151628aed2a6abf7158809cf4f3c");
    const IV: [u8; 16] = hex!("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff");
    const PLAIN: [u8; 64] = hex!(
        "6bc1bee22e409f96e93d7e117393172a"
        "ae2d8a571e03ac9c9eb76fac45af8e51"
        "30c81c46a35ce411e5fbc1191a0a52ef"
        "f69f2445df4f9b17ad2b417be66c3710"
    );
    const CIPHER: [u8; 64] = hex!(
        "874d6191b620e3261bef6864990db6ce"
        "9806f66b7970fdff8617187bb9fffdff"
        "5ae4df3edbd5d35e5b4f09020db03eab"
        "1e031dda2fbe03d1792170a0f3009cee"
    );

    #[test]
    fn test_ctr_sp800_38a() {
        let mut ctr = Ctr::new(Cipher::new(&KEY).unwrap());
        ctr.set_iv(&IV).unwrap();
        let mut out = [0u8; 64];
        ctr.encrypt_update(&PLAIN, &mut out).unwrap();
        assert_eq!(out, CIPHER);

        ctr.set_iv(&IV).unwrap();
        let mut back = [0u8; 64];
        ctr.decrypt_update(&out, &mut back).unwrap();
        assert_eq!(back, PLAIN);
    }

    #[test]
    fn test_ctr_split_anywhere() {
        let cipher = Cipher::new(&KEY).unwrap();
        for split in [0usize, 1, 5, 15, 16, 17, 31, 33, 63, 64] {
            let mut buf: Vec<u8> = PLAIN.to_vec();
            let (a, b) = buf.split_at_mut(split);
            let counter = ctr_keystream_xor(&cipher, Counter::new(IV), a);
            let mut counter = counter;
            for piece in b.chunks_mut(7) {
                counter.xor_keystream(&cipher, piece);
            }
            assert_eq!(buf, CIPHER, "split at {}", split);
        }
    }

    #[test]
    fn test_ctr_state() {
        let mut ctr = Ctr::new(Cipher::new(&KEY).unwrap());
        let mut out = [0u8; 16];
        assert_eq!(ctr.encrypt_update(&PLAIN[..16], &mut out), Err(Error::BadState));
        assert!(matches!(ctr.set_iv(&IV[..12]), Err(Error::InvalidArgument(_))));
        ctr.set_iv(&IV).unwrap();
        assert!(matches!(
            ctr.encrypt_update(&PLAIN[..16], &mut out[..8]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_inc32_wraps() {
        let mut c = hex!("000102030405060708090a0bffffffff");
        inc32(&mut c);
        assert_eq!(c, hex!("000102030405060708090a0b00000000"));
        inc32(&mut c);
        assert_eq!(c, hex!("000102030405060708090a0b00000001"));
    }
}
