mod tables;
pub(crate) use tables::SBOX;

#[cfg(target_arch = "x86_64")]
mod amd64;

#[cfg(target_arch = "x86_64")]
pub(crate) use amd64::*;

pub mod generic;
pub use generic::*;
