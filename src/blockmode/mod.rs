pub mod builder;
pub mod ctr;
pub mod gcm;
use thiserror;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid argument: {}", .0)]
    InvalidArgument(&'static str),

    #[error("operation called out of sequence")]
    BadState,

    #[error("invalid size {}", .0)]
    InvalidSize(usize),

    #[error("no implementation available for the requested configuration")]
    NotSupported,

    #[error("invalid key size {}, want 16, 24 or 32", .0)]
    InvalidKeySize(usize),

    #[error("invalid nonce size, want {}, got {}", .0, .1)]
    InvalidNonceSize(usize, usize),

    #[error("GCM authentication failed while decrypting")]
    AuthenticationFailed,

    #[error("GCM ciphertext's length ({}) is shorter than tag size({})", .0, .1)]
    GCMCiphertextTooSmall(usize, usize),

    #[error("output too small, want: {}, got: {}", .0, .1)]
    OutputTooSmall(usize, usize),
}
pub type Result<T> = core::result::Result<T, Error>;
