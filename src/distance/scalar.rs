//! Scalar (non-SIMD) distance kernels.
//! These serve as baselines for comparison and fallbacks on CPUs without SIMD.

/// Compute the squared Euclidean distance between two vectors.
///
/// Returns sum((a[i] - b[i])^2)
///
/// Ordering by squared distance equals ordering by Euclidean distance, so
/// nearest-neighbor search never needs the square root.
#[inline]
pub fn euclidean_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

/// Compute the Euclidean (L2) distance between two vectors.
///
/// Returns sqrt(sum((a[i] - b[i])^2))
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    euclidean_distance_squared(a, b).sqrt()
}
