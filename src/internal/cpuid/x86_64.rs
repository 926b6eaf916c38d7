#[cfg(not(feature = "std"))]
pub use x86_64_no_std::*;

#[cfg(feature = "std")]
pub use x86_64_std::*;

#[cfg(feature = "std")]
mod x86_64_std {
    #[inline]
    pub fn support_pclmulqdq() -> bool {
        is_x86_feature_detected!("pclmulqdq")
    }

    #[inline]
    pub fn support_aes() -> bool {
        is_x86_feature_detected!("aes")
    }

    #[inline]
    pub fn support_sse2() -> bool {
        is_x86_feature_detected!("sse2")
    }

    #[inline]
    pub fn support_ssse3() -> bool {
        is_x86_feature_detected!("ssse3")
    }

    #[inline]
    pub fn support_avx() -> bool {
        is_x86_feature_detected!("avx")
    }

    #[inline]
    pub fn support_avx2() -> bool {
        is_x86_feature_detected!("avx2")
    }

    #[inline]
    pub fn support_vpclmulqdq() -> bool {
        is_x86_feature_detected!("vpclmulqdq")
    }
}

// Raw cpuid probing. Used when std's feature detection is unavailable, and
// by the tests to cross-check it.
#[allow(dead_code)]
mod x86_64_no_std {
    use core::arch::asm;

    #[inline]
    pub fn cpuid(leaf: u32, sub_leaf: u32) -> (u32, u32, u32, u32) {
        let mut a;
        let mut b;
        let mut c;
        let mut d;
        unsafe {
            asm!(
                "push rbx",
                "cpuid",
                "mov {0:e}, ebx",
                "pop rbx",
                out(reg) b,
                out("edx")  d,
                inout("eax") leaf => a,
                inout("ecx") sub_leaf => c,
            );
        }
        (a, b, c, d)
    }

    // The OS must save the ymm state, otherwise avx instructions fault.
    #[inline]
    fn os_saves_ymm() -> bool {
        let (_, _, ecx, _) = cpuid(1, 0);
        if ecx & (1 << 27) == 0 {
            return false;
        }
        let xcr0: u32;
        unsafe {
            asm!(
                "xgetbv",
                in("ecx") 0u32,
                out("eax") xcr0,
                out("edx") _,
            );
        }
        xcr0 & 0b110 == 0b110
    }

    #[inline]
    pub fn support_pclmulqdq() -> bool {
        let (_, _, ecx, _) = cpuid(1, 0);
        (ecx & (1 << 1)) != 0
    }

    #[inline]
    pub fn support_aes() -> bool {
        let (_, _, ecx, _) = cpuid(1, 0);
        (ecx & (1 << 25)) != 0
    }

    #[inline]
    pub fn support_sse2() -> bool {
        let (_, _, _, edx) = cpuid(1, 0);
        (edx & (1 << 26)) != 0
    }

    #[inline]
    pub fn support_ssse3() -> bool {
        let (_, _, ecx, _) = cpuid(1, 0);
        (ecx & (1 << 9)) != 0
    }

    #[inline]
    pub fn support_avx() -> bool {
        let (_, _, ecx, _) = cpuid(1, 0);
        (ecx & (1 << 28)) != 0 && os_saves_ymm()
    }

    #[inline]
    pub fn support_avx2() -> bool {
        let (_, ebx, _, _) = cpuid(7, 0);
        (ebx & (1 << 5)) != 0 && support_avx()
    }

    #[inline]
    pub fn support_vpclmulqdq() -> bool {
        let (_, _, ecx, _) = cpuid(7, 0);
        (ecx & (1 << 10)) != 0 && support_avx()
    }
}
