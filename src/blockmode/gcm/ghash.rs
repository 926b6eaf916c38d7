use super::dispatch::Path;
use super::field::{FieldElement, BLOCK_SIZE};
use super::ghash_generic::ghash_blocks_scalar;
use super::table::{HashSubkeyTable, TABLE_SIZE};
use core::cmp::min;
use tracing::trace;

#[cfg(target_arch = "aarch64")]
use super::ghash_aarch64::ghash_blocks_pmull;
#[cfg(target_arch = "x86_64")]
use super::ghash_amd64::{ghash_blocks_medium, ghash_blocks_wide};

// Folds whole blocks into y on the given path. A path the CPU lacks runs
// as Scalar instead.
pub(crate) fn ghash_blocks(
    path: Path,
    powers: &[FieldElement; TABLE_SIZE],
    y: FieldElement,
    blocks: &[u8],
) -> FieldElement {
    debug_assert_eq!(blocks.len() % BLOCK_SIZE, 0);
    trace!(?path, blocks = blocks.len() / BLOCK_SIZE, "ghash");
    match path {
        #[cfg(target_arch = "x86_64")]
        Path::Wide if Path::Wide.is_available() => unsafe { ghash_blocks_wide(powers, y, blocks) },

        #[cfg(target_arch = "x86_64")]
        Path::Medium if Path::Medium.is_available() => unsafe {
            ghash_blocks_medium(powers, y, blocks)
        },

        #[cfg(target_arch = "aarch64")]
        Path::Medium | Path::Wide if Path::Medium.is_available() => unsafe {
            ghash_blocks_pmull(powers, y, blocks)
        },

        _ => ghash_blocks_scalar(powers, y, blocks),
    }
}

// The running GHASH of one message: the accumulator, the subkey powers and
// the bytes of a block not yet complete.
#[derive(Clone, Default)]
pub(crate) struct GHash {
    table: HashSubkeyTable,
    y: FieldElement,
    buf: [u8; BLOCK_SIZE],
    buf_len: usize,
}

impl GHash {
    pub fn new(h: &[u8; BLOCK_SIZE]) -> Self {
        GHash {
            table: HashSubkeyTable::new(h),
            y: FieldElement::ZERO,
            buf: [0; BLOCK_SIZE],
            buf_len: 0,
        }
    }

    // Clears the accumulator, keeps the subkey.
    pub fn reset(&mut self) {
        self.y = FieldElement::ZERO;
        self.buf = [0; BLOCK_SIZE];
        self.buf_len = 0;
    }

    // Hashes data as a continuation of everything since the last pad().
    pub fn update(&mut self, path: Path, data: &[u8]) {
        let mut data = data;

        if self.buf_len > 0 {
            let n = min(BLOCK_SIZE - self.buf_len, data.len());
            self.buf[self.buf_len..self.buf_len + n].copy_from_slice(&data[..n]);
            self.buf_len += n;
            data = &data[n..];
            if self.buf_len < BLOCK_SIZE {
                return;
            }
            self.y = ghash_blocks(path, self.table.powers(), self.y, &self.buf);
            self.buf_len = 0;
        }

        let full = data.len() / BLOCK_SIZE * BLOCK_SIZE;
        if full > 0 {
            self.y = ghash_blocks(path, self.table.powers(), self.y, &data[..full]);
        }

        let rest = &data[full..];
        self.buf[..rest.len()].copy_from_slice(rest);
        self.buf_len = rest.len();
    }

    // Zero pads and folds a pending partial block.
    pub fn pad(&mut self, path: Path) {
        if self.buf_len > 0 {
            self.buf[self.buf_len..].fill(0);
            self.y = ghash_blocks(path, self.table.powers(), self.y, &self.buf);
            self.buf_len = 0;
        }
    }

    // Pads, then folds [a]_64 || [b]_64.
    pub fn update_lengths(&mut self, path: Path, a: u64, b: u64) {
        self.pad(path);
        let lengths = (((a as u128) << 64) | b as u128).to_be_bytes();
        self.y = ghash_blocks(path, self.table.powers(), self.y, &lengths);
    }

    pub fn sum(&self) -> [u8; BLOCK_SIZE] {
        self.y.to_block()
    }
}

impl Drop for GHash {
    fn drop(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // H and GHASH(A, C) of test case 4 of the GCM paper.
    const H: [u8; 16] = hex!("b83b533708bf535d0aa6e52980d53b78");
    const A: [u8; 20] = hex!("feedfacedeadbeeffeedfacedeadbeefabaddad2");
    const C: [u8; 60] = hex!(
        "42831ec2217774244b7221b784d0d49c"
        "e3aa212f2c02a4e035c17e2329aca12e"
        "21d514b25466931c7d8f6a5aac84aa05"
        "1ba30b396a0aac973d58e091"
    );
    const GHASH_AC: [u8; 16] = hex!("698e57f70e6ecc7fd9463b7260a9ae5f");

    fn ghash_of(path: Path, splits: &[usize]) -> [u8; 16] {
        let mut g = GHash::new(&H);
        let mut rest: &[u8] = &A;
        for &s in splits {
            let s = min(s, rest.len());
            g.update(path, &rest[..s]);
            rest = &rest[s..];
        }
        g.update(path, rest);
        g.pad(path);
        g.update(path, &C[..7]);
        g.update(path, &C[7..]);
        g.update_lengths(path, A.len() as u64 * 8, C.len() as u64 * 8);
        g.sum()
    }

    #[test]
    fn test_ghash_test_case_4() {
        for path in Path::ALL {
            assert_eq!(ghash_of(path, &[]), GHASH_AC, "{:?}", path);
            assert_eq!(ghash_of(path, &[1, 15, 3]), GHASH_AC, "{:?}", path);
            assert_eq!(ghash_of(path, &[16]), GHASH_AC, "{:?}", path);
        }
    }

    #[test]
    fn test_reset_keeps_subkey() {
        let mut g = GHash::new(&H);
        g.update(Path::Scalar, &[1, 2, 3]);
        g.reset();
        g.update(Path::Scalar, &A);
        g.pad(Path::Scalar);
        g.update(Path::Scalar, &C);
        g.update_lengths(Path::Scalar, A.len() as u64 * 8, C.len() as u64 * 8);
        assert_eq!(g.sum(), GHASH_AC);
    }
}
