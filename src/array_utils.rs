//! Small dense-array helpers shared by the sifting and ensemble code.
//!
//! All binary helpers require equal lengths; buffers are preallocated by the
//! owning workspace and never resized here.

/// Copy `src` into `dest`.
#[inline]
pub fn copy(src: &[f64], dest: &mut [f64]) {
    dest.copy_from_slice(src);
}

/// Pointwise `dest[i] += src[i]`.
#[inline]
pub fn add(src: &[f64], dest: &mut [f64]) {
    debug_assert_eq!(src.len(), dest.len());
    for (d, &s) in dest.iter_mut().zip(src.iter()) {
        *d += s;
    }
}

/// Pointwise `dest[i] -= src[i]`.
#[inline]
pub fn sub(src: &[f64], dest: &mut [f64]) {
    debug_assert_eq!(src.len(), dest.len());
    for (d, &s) in dest.iter_mut().zip(src.iter()) {
        *d -= s;
    }
}

/// Pointwise `dest[i] += scale * src[i]`.
#[inline]
pub fn add_scaled(src: &[f64], scale: f64, dest: &mut [f64]) {
    debug_assert_eq!(src.len(), dest.len());
    for (d, &s) in dest.iter_mut().zip(src.iter()) {
        *d += scale * s;
    }
}

/// Divide every element of `dest` by `val`.
#[inline]
pub fn div(dest: &mut [f64], val: f64) {
    for d in dest.iter_mut() {
        *d /= val;
    }
}

/// Sample standard deviation (N-1 denominator). Zero for fewer than two samples.
pub fn std_dev(x: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 {
        return 0.0;
    }
    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|&v| (v - mean) * (v - mean)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// For the line through (x0, y0) and (x1, y1), return y at `x`.
#[inline]
pub fn linear_extrapolate(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    debug_assert!(x1 != x0);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_dev_matches_sample_definition() {
        let x = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // population sd is 2.0, sample sd is sqrt(32/7)
        assert!((std_dev(&x) - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_std_dev_degenerate() {
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(std_dev(&[3.0]), 0.0);
        assert_eq!(std_dev(&[1.5; 10]), 0.0);
    }

    #[test]
    fn test_add_sub_div() {
        let mut dest = vec![1.0, 2.0, 3.0];
        add(&[1.0, 1.0, 1.0], &mut dest);
        assert_eq!(dest, vec![2.0, 3.0, 4.0]);
        sub(&[2.0, 2.0, 2.0], &mut dest);
        assert_eq!(dest, vec![0.0, 1.0, 2.0]);
        add_scaled(&[1.0, 1.0, 1.0], 0.5, &mut dest);
        assert_eq!(dest, vec![0.5, 1.5, 2.5]);
        div(&mut dest, 0.5);
        assert_eq!(dest, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_linear_extrapolate() {
        assert_eq!(linear_extrapolate(1.0, 1.0, 2.0, 3.0, 0.0), -1.0);
        assert_eq!(linear_extrapolate(1.0, 1.0, 2.0, 3.0, 4.0), 7.0);
    }
}
