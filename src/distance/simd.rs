//! SIMD-optimized squared Euclidean distance.
//!
//! Supports two instruction sets with automatic runtime detection:
//! - **AVX2+FMA** (x86_64): two 8-lane accumulators, 16 floats per iteration
//! - **NEON** (aarch64): 4 floats per iteration
//! - **Scalar**: fallback for all other platforms and CPUs
//!
//! A 784-dimensional MNIST embedding is 49 AVX2 iterations with no tail.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

use super::scalar;

/// Compute squared Euclidean distance using AVX2 and FMA intrinsics.
///
/// # Safety
/// - Requires AVX2 and FMA CPU features to be available.
/// - The caller must ensure the CPU supports these features before calling.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2,fma")]
#[inline]
pub unsafe fn euclidean_distance_squared_avx2(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let len = a.len();
    let pa = a.as_ptr();
    let pb = b.as_ptr();
    let mut acc0 = _mm256_setzero_ps();
    let mut acc1 = _mm256_setzero_ps();
    let mut i = 0;

    while i + 16 <= len {
        let d0 = _mm256_sub_ps(_mm256_loadu_ps(pa.add(i)), _mm256_loadu_ps(pb.add(i)));
        let d1 = _mm256_sub_ps(
            _mm256_loadu_ps(pa.add(i + 8)),
            _mm256_loadu_ps(pb.add(i + 8)),
        );
        acc0 = _mm256_fmadd_ps(d0, d0, acc0);
        acc1 = _mm256_fmadd_ps(d1, d1, acc1);
        i += 16;
    }

    if i + 8 <= len {
        let d = _mm256_sub_ps(_mm256_loadu_ps(pa.add(i)), _mm256_loadu_ps(pb.add(i)));
        acc0 = _mm256_fmadd_ps(d, d, acc0);
        i += 8;
    }

    let mut total = hsum_avx2(_mm256_add_ps(acc0, acc1));

    while i < len {
        let diff = a[i] - b[i];
        total += diff * diff;
        i += 1;
    }

    total
}

/// Horizontal sum of the eight lanes of a 256-bit register.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn hsum_avx2(v: __m256) -> f32 {
    let lo = _mm256_castps256_ps128(v);
    let hi = _mm256_extractf128_ps::<1>(v);
    let quad = _mm_add_ps(lo, hi);
    let pair = _mm_add_ps(quad, _mm_movehl_ps(quad, quad));
    let single = _mm_add_ss(pair, _mm_shuffle_ps::<0b01>(pair, pair));
    _mm_cvtss_f32(single)
}

/// Compute squared Euclidean distance using NEON intrinsics.
///
/// NEON is mandatory on aarch64, so this is safe to call unconditionally.
#[cfg(target_arch = "aarch64")]
#[inline]
pub fn euclidean_distance_squared_neon(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let len = a.len();
    let mut i = 0;

    // SAFETY: NEON is always available on aarch64 and every load stays
    // within `len`.
    let mut total = unsafe {
        let mut sum = vdupq_n_f32(0.0);
        while i + 4 <= len {
            let diff = vsubq_f32(vld1q_f32(a.as_ptr().add(i)), vld1q_f32(b.as_ptr().add(i)));
            sum = vfmaq_f32(sum, diff, diff);
            i += 4;
        }
        vaddvq_f32(sum)
    };

    while i < len {
        let diff = a[i] - b[i];
        total += diff * diff;
        i += 1;
    }

    total
}

/// Compute squared Euclidean distance with the fastest available kernel.
///
/// Returns sum((a[i] - b[i])^2).
///
/// # Panics
/// Panics if the slices have different lengths. Callers that cannot
/// guarantee equal lengths should go through
/// [`DistanceMetric::distance`](super::DistanceMetric::distance).
#[inline]
pub fn euclidean_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
            // SAFETY: We just verified that AVX2 and FMA are supported
            return unsafe { euclidean_distance_squared_avx2(a, b) };
        }
        return scalar::euclidean_distance_squared(a, b);
    }

    #[cfg(target_arch = "aarch64")]
    {
        return euclidean_distance_squared_neon(a, b);
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    scalar::euclidean_distance_squared(a, b)
}
