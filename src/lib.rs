#![allow(dead_code)]

#![no_std]
#![warn(clippy::std_instead_of_alloc, clippy::std_instead_of_core)]


pub mod aes;
pub mod blockmode;
pub mod rand;
pub mod traits;

mod internal;

#[allow(unused_imports)]
#[macro_use]
extern crate alloc;

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

pub use blockmode::builder::{build, CipherInfo, Context, Mode};
pub use blockmode::gcm::{new_aes_gcm_std, AesGcm, GcmSession, Path, Phase, GCM};
pub use blockmode::{Error, Result};
