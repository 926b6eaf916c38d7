// Builds a streaming cipher context from a mode and a key.

use super::ctr::Ctr;
use super::gcm::GcmSession;
use super::{Error, Result};
use crate::aes;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Cfb,
    Cbc,
    Ofb,
    Ctr,
    Gcm,
    Ccm,
    Xts,
    Siv,
}

impl Mode {
    pub const ALL: [Mode; 8] = [
        Mode::Cfb,
        Mode::Cbc,
        Mode::Ofb,
        Mode::Ctr,
        Mode::Gcm,
        Mode::Ccm,
        Mode::Xts,
        Mode::Siv,
    ];

    pub fn is_supported(self) -> bool {
        matches!(self, Mode::Ctr | Mode::Gcm)
    }
}

#[derive(Clone, Copy)]
pub struct CipherInfo<'a> {
    pub mode: Mode,
    pub key: &'a [u8],
}

/// A built AES context. Each variant carries only the state of its mode.
pub enum Context {
    Ctr(Ctr<aes::Cipher>),
    Gcm(GcmSession<aes::Cipher>),
}

// Returns NotSupported for modes without an implementation, InvalidKeySize
// for a key that is not 16, 24 or 32 bytes.
pub fn build(info: CipherInfo) -> Result<Context> {
    if !info.mode.is_supported() {
        debug!(mode = ?info.mode, "cipher mode not supported");
        return Err(Error::NotSupported);
    }

    let cipher = aes::Cipher::new(info.key)?;
    debug!(mode = ?info.mode, rounds = cipher.rounds(), "cipher context built");
    Ok(match info.mode {
        Mode::Ctr => Context::Ctr(Ctr::new(cipher)),
        _ => Context::Gcm(GcmSession::new(cipher)),
    })
}

impl Context {
    pub fn mode(&self) -> Mode {
        match self {
            Context::Ctr(_) => Mode::Ctr,
            Context::Gcm(_) => Mode::Gcm,
        }
    }

    pub fn set_iv(&mut self, iv: &[u8]) -> Result<()> {
        match self {
            Context::Ctr(c) => c.set_iv(iv),
            Context::Gcm(g) => g.set_iv(iv),
        }
    }

    pub fn set_aad(&mut self, aad: &[u8]) -> Result<()> {
        match self {
            Context::Ctr(_) => Err(Error::NotSupported),
            Context::Gcm(g) => g.set_aad(aad),
        }
    }

    pub fn encrypt_update(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        match self {
            Context::Ctr(c) => c.encrypt_update(input, output),
            Context::Gcm(g) => g.encrypt_update(input, output),
        }
    }

    pub fn decrypt_update(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        match self {
            Context::Ctr(c) => c.decrypt_update(input, output),
            Context::Gcm(g) => g.decrypt_update(input, output),
        }
    }

    pub fn get_tag(&mut self, tag: &mut [u8]) -> Result<()> {
        match self {
            Context::Ctr(_) => Err(Error::NotSupported),
            Context::Gcm(g) => g.get_tag(tag),
        }
    }
}
