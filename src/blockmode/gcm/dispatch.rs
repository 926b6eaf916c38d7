// Selection of the GHASH batch implementation from what the CPU offers.

/// GHASH code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Path {
    /// Portable software carry-less multiply, one block per reduction.
    Scalar,
    /// 128-bit carry-less multiply (PCLMULQDQ or PMULL), four blocks per
    /// reduction.
    Medium,
    /// 256-bit VPCLMULQDQ with AVX2, two blocks per register, sixteen blocks
    /// per reduction in four lane groups.
    Wide,
}

impl Path {
    pub const ALL: [Path; 3] = [Path::Scalar, Path::Medium, Path::Wide];

    // The widest path this CPU runs.
    #[inline]
    pub fn detect() -> Path {
        select(Capabilities::detect())
    }

    // Blocks folded per reduction.
    pub fn batch_width(self) -> usize {
        match self {
            Path::Scalar => 1,
            Path::Medium => 4,
            Path::Wide => 16,
        }
    }

    pub fn is_available(self) -> bool {
        let caps = Capabilities::detect();
        match self {
            Path::Scalar => true,
            Path::Medium => caps.medium_clmul,
            Path::Wide => caps.wide_clmul,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub wide_clmul: bool,
    pub medium_clmul: bool,
}

impl Capabilities {
    #[cfg(target_arch = "x86_64")]
    pub fn detect() -> Self {
        use crate::internal::cpuid::x86_64::*;
        let medium = support_pclmulqdq() && support_sse2() && support_ssse3();
        Capabilities {
            wide_clmul: medium && support_avx2() && support_vpclmulqdq(),
            medium_clmul: medium,
        }
    }

    #[cfg(target_arch = "aarch64")]
    pub fn detect() -> Self {
        use crate::internal::cpuid::aarch64::*;
        Capabilities {
            wide_clmul: false,
            medium_clmul: support_pmull(),
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    pub fn detect() -> Self {
        Capabilities::default()
    }
}

/// Picks the widest path the flags allow. Scalar is always there.
#[inline]
pub fn select(caps: Capabilities) -> Path {
    if caps.wide_clmul {
        Path::Wide
    } else if caps.medium_clmul {
        Path::Medium
    } else {
        Path::Scalar
    }
}
