// Nonces for GCM.

#[cfg(test)]
mod const_rng;

use rand::CryptoRng;

pub const IV_SIZE: usize = 12;

/// A fresh 96-bit IV from rng. A given key must never see the same IV twice.
pub fn generate_iv<R: CryptoRng + ?Sized>(rng: &mut R) -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    rng.fill_bytes(&mut iv);
    iv
}

// An IV from the thread local generator, seeded from the OS.
#[cfg(feature = "std")]
pub fn random_iv() -> [u8; IV_SIZE] {
    generate_iv(&mut rand::rng())
}

#[cfg(test)]
mod tests {
    use super::const_rng::ConstRng;
    use super::*;

    #[test]
    fn test_generate_iv() {
        let mut rng = ConstRng::new(0x5a);
        assert_eq!(generate_iv(&mut rng), [0x5a; IV_SIZE]);

        let dyn_rng: &mut dyn rand::CryptoRng = &mut rng;
        assert_eq!(generate_iv(dyn_rng), [0x5a; IV_SIZE]);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_random_iv() {
        // 2^-96 to fail
        assert_ne!(random_iv(), random_iv());
    }
}
