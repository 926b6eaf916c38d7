use crate::aes;

// A block cipher seen from the modes: only the forward direction is needed
// by CTR and GCM.
pub trait Block {
    fn block_size(&self) -> usize;

    // Encrypt as many blocks as possible from src to dst.
    // More precisely, encrypt min(dst.len()/BLOCK_SIZE, src.len()/BLOCK_SIZE) blocks.
    // Returns the number of bytes encrypted.
    fn encrypt(&self, dst: &mut [u8], src: &[u8]) -> usize;

    fn encrypt_inplace(&self, in_out: &mut [u8]) -> usize;
}

impl Block for aes::Cipher {
    // encrypt blocks into dst. returns the bytes encrypted.
    fn encrypt(&self, dst: &mut [u8], src: &[u8]) -> usize {
        aes::Cipher::encrypt(self, dst, src)
    }

    fn encrypt_inplace(&self, in_out: &mut [u8]) -> usize {
        aes::Cipher::encrypt_inplace(self, in_out)
    }

    fn block_size(&self) -> usize {
        aes::BLOCK_SIZE
    }
}

impl<B: Block + ?Sized> Block for &B {
    fn block_size(&self) -> usize {
        (**self).block_size()
    }

    fn encrypt(&self, dst: &mut [u8], src: &[u8]) -> usize {
        (**self).encrypt(dst, src)
    }

    fn encrypt_inplace(&self, in_out: &mut [u8]) -> usize {
        (**self).encrypt_inplace(in_out)
    }
}

pub trait AEAD {
    type Error;

    // NonceSize returns the size of the nonce that must be passed to Seal
    // and Open.
    fn nonce_size(&self) -> usize;

    // Overhead returns the maximum difference between the lengths of a
    // plaintext and its ciphertext.
    fn overhead(&self) -> usize;

    fn seal(&self, out: &mut [u8], nonce: &[u8], plaintext: &[u8], add: Option<&[u8]>)-> Result<(), Self::Error>;

    fn open(&self, out: &mut [u8], nonce: &[u8], ciphertext: &[u8], add: Option<&[u8]>)-> Result<usize, Self::Error>;

    fn seal_inplace(&self, in_out: &mut [u8], tag: &mut [u8], nonce: &[u8], add: Option<&[u8]>)-> Result<(), Self::Error>;

    fn open_inplace(&self, in_out: &mut [u8], tag: &[u8], nonce: &[u8], add: Option<&[u8]>)-> Result<(), Self::Error> ;
}
