// A generator that repeats one byte, for deterministic tests of the IV
// helpers. It is of course not a cryptographic generator.
pub(crate) struct ConstRng {
    c: u8,
}

impl ConstRng {
    pub(crate) fn new(c: u8) -> Self {
        ConstRng { c }
    }
}

impl rand::RngCore for ConstRng {
    fn next_u32(&mut self) -> u32 {
        u32::from_ne_bytes([self.c; 4])
    }

    fn next_u64(&mut self) -> u64 {
        u64::from_ne_bytes([self.c; 8])
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(self.c);
    }
}

impl rand::CryptoRng for ConstRng {}

#[cfg(test)]
mod tests {
    use super::ConstRng;
    // impl rand::RngCore, then we automatically get rand::Rng.
    use rand::Rng;

    #[test]
    fn test_const_rng() {
        let mut rng = ConstRng::new(1);
        let s: [u8; 10] = rng.random();
        assert_eq!(s, [1; 10]);
    }
}
