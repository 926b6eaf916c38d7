mod dispatch;
mod field;
mod ghash;
mod ghash_generic;
mod table;

#[cfg(target_arch = "aarch64")]
mod ghash_aarch64;

#[cfg(target_arch = "x86_64")]
mod ghash_amd64;

#[cfg(test)]
mod proptests;

pub use dispatch::{select, Capabilities, Path};
pub use field::FieldElement;
pub use table::HashSubkeyTable;

use ghash::GHash;

use super::ctr::{inc32, Counter};
use super::{Error, Result};
use crate::aes;
use crate::traits::Block;
use crate::traits::AEAD;
use subtle::ConstantTimeEq;
use tracing::debug;

const BLOCK_SIZE: usize = 16;
const TAG_SIZE: usize = 16;
const MIN_TAG_SIZE: usize = 12;
const STD_NONCE_SIZE: usize = 12;

// SP 800-38D: len(P) <= 2^39 - 256 bits, len(A) <= 2^64 - 1 bits.
const MAX_MESSAGE_BYTES: u64 = (1 << 36) - 32;
const MAX_AAD_BYTES: u64 = (1 << 61) - 1;

/// Where a session is in the init, aad, update, finalize sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fresh,
    IvSet,
    Active,
    Finalized,
}

/// A streaming GCM encryption or decryption of one message at a time.
///
/// ```ignore
/// let mut s = GcmSession::new(aes::Cipher::new(&key)?);
/// s.set_iv(&iv)?;
/// s.set_aad(&aad)?;
/// s.encrypt_update(&plaintext, &mut ciphertext)?;
/// s.get_tag(&mut tag)?;
/// ```
///
/// Calling `set_iv` again starts a new message under the same key.
pub struct GcmSession<B: Block> {
    cipher: B,
    // None: detect the path on every operation.
    path: Option<Path>,
    phase: Phase,
    ghash: GHash,
    j0: [u8; BLOCK_SIZE],
    counter: Counter,
    aad_len: u64,
    msg_len: u64,
    tag: [u8; TAG_SIZE],
}

impl<B: Block> GcmSession<B> {
    pub fn new(cipher: B) -> Self {
        debug_assert_eq!(cipher.block_size(), BLOCK_SIZE);
        GcmSession {
            cipher,
            path: None,
            phase: Phase::Fresh,
            ghash: GHash::default(),
            j0: [0; BLOCK_SIZE],
            counter: Counter::default(),
            aad_len: 0,
            msg_len: 0,
            tag: [0; TAG_SIZE],
        }
    }

    // A session pinned to one GHASH path. Fails with NotSupported if this
    // CPU can not run it.
    pub fn with_path(cipher: B, path: Path) -> Result<Self> {
        if !path.is_available() {
            return Err(Error::NotSupported);
        }
        debug!(?path, "gcm session pinned");
        let mut s = Self::new(cipher);
        s.path = Some(path);
        Ok(s)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    fn path(&self) -> Path {
        self.path.unwrap_or_else(Path::detect)
    }

    /// Starts a new message: derives H, the powers of H and J0, and clears
    /// every length, the accumulator and any previous tag.
    pub fn set_iv(&mut self, iv: &[u8]) -> Result<()> {
        if iv.is_empty() {
            return Err(Error::InvalidArgument("empty iv"));
        }
        let path = self.path();

        // H = CIPH_K(0^128)
        let mut h = [0u8; BLOCK_SIZE];
        self.cipher.encrypt_inplace(&mut h);
        self.ghash = GHash::new(&h);
        h.fill(0);

        // J0 = IV || 0^31 || 1 for 96-bit IVs, else
        // GHASH(IV || 0^(s+64) || [len(IV)]_64).
        if iv.len() == STD_NONCE_SIZE {
            self.j0 = [0; BLOCK_SIZE];
            self.j0[..STD_NONCE_SIZE].copy_from_slice(iv);
            self.j0[BLOCK_SIZE - 1] = 1;
        } else {
            self.ghash.update(path, iv);
            self.ghash.update_lengths(path, 0, (iv.len() as u64) << 3);
            self.j0 = self.ghash.sum();
            self.ghash.reset();
        }

        let mut first = self.j0;
        inc32(&mut first);
        self.counter = Counter::new(first);
        self.aad_len = 0;
        self.msg_len = 0;
        self.tag = [0; TAG_SIZE];
        self.phase = Phase::IvSet;
        debug!(iv_len = iv.len(), ?path, "gcm iv set");
        Ok(())
    }

    /// Feeds additional authenticated data. May be called several times
    /// before the first update, the pieces are hashed as one string.
    pub fn set_aad(&mut self, aad: &[u8]) -> Result<()> {
        if self.phase != Phase::IvSet {
            return Err(Error::BadState);
        }
        let aad_len = self
            .aad_len
            .checked_add(aad.len() as u64)
            .filter(|n| *n <= MAX_AAD_BYTES)
            .ok_or(Error::InvalidArgument("aad too long"))?;

        let path = self.path();
        self.ghash.update(path, aad);
        self.aad_len = aad_len;
        Ok(())
    }

    // Common entry of the update calls. Returns the path for this call.
    fn begin_update(&mut self, len: usize) -> Result<Path> {
        match self.phase {
            Phase::IvSet | Phase::Active => {}
            Phase::Fresh | Phase::Finalized => return Err(Error::BadState),
        }
        let msg_len = self
            .msg_len
            .checked_add(len as u64)
            .filter(|n| *n <= MAX_MESSAGE_BYTES)
            .ok_or(Error::InvalidArgument("message too long"))?;

        let path = self.path();
        if self.phase == Phase::IvSet {
            // the aad ends here, and is padded on its own.
            self.ghash.pad(path);
            self.phase = Phase::Active;
        }
        self.msg_len = msg_len;
        Ok(path)
    }

    /// Encrypts plaintext into the first plaintext.len() bytes of output
    /// and hashes the ciphertext.
    pub fn encrypt_update(&mut self, plaintext: &[u8], output: &mut [u8]) -> Result<()> {
        if output.len() < plaintext.len() {
            return Err(Error::InvalidArgument("output shorter than input"));
        }
        let path = self.begin_update(plaintext.len())?;
        let output = &mut output[..plaintext.len()];
        output.copy_from_slice(plaintext);
        self.counter.xor_keystream(&self.cipher, output);
        self.ghash.update(path, output);
        Ok(())
    }

    /// Hashes the ciphertext, then decrypts it into the first
    /// ciphertext.len() bytes of output.
    pub fn decrypt_update(&mut self, ciphertext: &[u8], output: &mut [u8]) -> Result<()> {
        if output.len() < ciphertext.len() {
            return Err(Error::InvalidArgument("output shorter than input"));
        }
        let path = self.begin_update(ciphertext.len())?;
        self.ghash.update(path, ciphertext);
        let output = &mut output[..ciphertext.len()];
        output.copy_from_slice(ciphertext);
        self.counter.xor_keystream(&self.cipher, output);
        Ok(())
    }

    pub fn encrypt_update_inplace(&mut self, in_out: &mut [u8]) -> Result<()> {
        let path = self.begin_update(in_out.len())?;
        self.counter.xor_keystream(&self.cipher, in_out);
        self.ghash.update(path, in_out);
        Ok(())
    }

    pub fn decrypt_update_inplace(&mut self, in_out: &mut [u8]) -> Result<()> {
        let path = self.begin_update(in_out.len())?;
        self.ghash.update(path, in_out);
        self.counter.xor_keystream(&self.cipher, in_out);
        Ok(())
    }

    // Computes the full tag once, the session is Finalized afterwards.
    fn finalize(&mut self) -> Result<&[u8; TAG_SIZE]> {
        match self.phase {
            Phase::Fresh => return Err(Error::BadState),
            Phase::Finalized => return Ok(&self.tag),
            Phase::IvSet | Phase::Active => {}
        }
        let path = self.path();
        self.ghash
            .update_lengths(path, self.aad_len << 3, self.msg_len << 3);

        let mut tag_mask = self.j0;
        self.cipher.encrypt_inplace(&mut tag_mask);
        self.tag = self.ghash.sum();
        self.tag
            .iter_mut()
            .zip(tag_mask.iter())
            .for_each(|(t, m)| *t ^= *m);

        self.phase = Phase::Finalized;
        debug!(aad_len = self.aad_len, msg_len = self.msg_len, "gcm finalized");
        Ok(&self.tag)
    }

    /// Writes the tag truncated to tag.len() bytes, 1 to 16. Once finalized
    /// the session keeps answering with the same tag until the next set_iv.
    pub fn get_tag(&mut self, tag: &mut [u8]) -> Result<()> {
        if self.phase == Phase::Fresh {
            return Err(Error::BadState);
        }
        if tag.is_empty() || tag.len() > TAG_SIZE {
            return Err(Error::InvalidSize(tag.len()));
        }
        let full = self.finalize()?;
        tag.copy_from_slice(&full[..tag.len()]);
        Ok(())
    }

    /// Finalizes and compares against the received tag in constant time.
    pub fn verify_tag(&mut self, tag: &[u8]) -> Result<()> {
        if self.phase == Phase::Fresh {
            return Err(Error::BadState);
        }
        if tag.is_empty() || tag.len() > TAG_SIZE {
            return Err(Error::InvalidSize(tag.len()));
        }
        let full = self.finalize()?;
        if bool::from(full[..tag.len()].ct_eq(tag)) {
            Ok(())
        } else {
            Err(Error::AuthenticationFailed)
        }
    }
}

impl<B: Block> Drop for GcmSession<B> {
    fn drop(&mut self) {
        self.j0 = [0; BLOCK_SIZE];
        self.tag = [0; TAG_SIZE];
    }
}

// Returns a GCM instance with standard nonce size 12 and tag size 16.
// The key must have length 16, 24 or 32.
pub fn new_aes_gcm_std(key: &[u8]) -> Result<AesGcm<STD_NONCE_SIZE, TAG_SIZE>> {
    Ok(AesGcm::<STD_NONCE_SIZE, TAG_SIZE>::new(aes::Cipher::new(key)?))
}

pub type AesGcm<const N: usize, const T: usize> = GCM<aes::Cipher, N, T>;

/// One-shot GCM with a fixed nonce size N and tag size T, on top of
/// GcmSession.
pub struct GCM<B: Block, const N: usize, const T: usize> {
    pub cipher: B,
}

// gcm represents a Galois Counter Mode with a specific key. See
// https://csrc.nist.gov/publications/detail/sp/800-38d/final
impl<B: Block, const N: usize, const T: usize> GCM<B, N, T> {
    pub fn new(block: B) -> Self {
        debug_assert!(T >= MIN_TAG_SIZE);
        debug_assert!(T <= TAG_SIZE);
        debug_assert!(N > 0);
        debug_assert_eq!(block.block_size(), BLOCK_SIZE);
        GCM { cipher: block }
    }

    fn session(&self, nonce: &[u8], add: Option<&[u8]>) -> Result<GcmSession<&B>> {
        if nonce.len() != N {
            return Err(Error::InvalidNonceSize(N, nonce.len()));
        }
        let mut s = GcmSession::new(&self.cipher);
        s.set_iv(nonce)?;
        if let Some(add) = add {
            s.set_aad(add)?;
        }
        Ok(s)
    }
}

impl<B: Block, const N: usize, const T: usize> AEAD for GCM<B, N, T> {
    type Error = super::Error;

    fn overhead(&self) -> usize {
        T
    }

    fn nonce_size(&self) -> usize {
        N
    }

    fn seal_inplace(
        &self,
        in_out: &mut [u8],
        tag: &mut [u8],
        nonce: &[u8],
        add: Option<&[u8]>,
    ) -> Result<()> {
        if tag.len() < T {
            return Err(Error::OutputTooSmall(T, tag.len()));
        }
        let mut s = self.session(nonce, add)?;
        s.encrypt_update_inplace(in_out)?;
        s.get_tag(&mut tag[..T])
    }

    fn open_inplace(
        &self,
        in_out: &mut [u8],
        tag: &[u8],
        nonce: &[u8],
        add: Option<&[u8]>,
    ) -> Result<()> {
        if tag.len() < T {
            return Err(Error::AuthenticationFailed);
        }
        let mut s = self.session(nonce, add)?;
        s.decrypt_update_inplace(in_out)?;
        if let Err(e) = s.verify_tag(&tag[..T]) {
            in_out.fill(0);
            return Err(e);
        }
        Ok(())
    }

    // out = ciphertext || tag
    fn seal(
        &self,
        out: &mut [u8],
        nonce: &[u8],
        plaintext: &[u8],
        add: Option<&[u8]>,
    ) -> Result<()> {
        let plaintext_length = plaintext.len();
        if out.len() < plaintext_length + T {
            return Err(Error::OutputTooSmall(plaintext_length + T, out.len()));
        }

        let (ciphertext, tag) = out.split_at_mut(plaintext_length);
        let mut s = self.session(nonce, add)?;
        s.encrypt_update(plaintext, ciphertext)?;
        s.get_tag(&mut tag[..T])
    }

    // Returns the plaintext length. Nothing is released unless the tag
    // verifies.
    fn open(
        &self,
        out: &mut [u8],
        nonce: &[u8],
        ciphertext: &[u8],
        add: Option<&[u8]>,
    ) -> Result<usize> {
        if ciphertext.len() < T {
            return Err(Error::GCMCiphertextTooSmall(ciphertext.len(), T));
        }

        let (ciphertext, tag) = ciphertext.split_at(ciphertext.len() - T);
        if out.len() < ciphertext.len() {
            return Err(Error::OutputTooSmall(ciphertext.len(), out.len()));
        }

        let out = &mut out[..ciphertext.len()];
        let mut s = self.session(nonce, add)?;
        s.decrypt_update(ciphertext, out)?;
        if let Err(e) = s.verify_tag(tag) {
            out.fill(0);
            return Err(e);
        }
        Ok(ciphertext.len())
    }
}
