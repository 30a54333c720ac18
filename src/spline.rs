//! Envelope interpolation through extrema.
//!
//! Two or three knots are interpolated exactly with a polynomial. Four or
//! more knots use a cubic spline with not-a-node end conditions (third
//! derivative continuous at the second and second-to-last knot), following
//! the formulation in Engeln-Müllges & Uhlig, "Numerical Algorithms with C",
//! p. 257. The end conditions are folded into the first and last rows of the
//! tridiagonal system, so the system only has one unknown per interior knot.

use crate::error::{EemdError, Result, SplineError};

/// Solve the tridiagonal system `A c = g`.
///
/// `diag` has length n, `supdiag` and `subdiag` length n-1. Elimination is done
/// in place: `diag` and `rhs` are overwritten. No pivoting is performed; a zero
/// pivot is reported as [`SplineError::SingularSystem`].
pub fn solve_tridiagonal(
    diag: &mut [f64],
    supdiag: &[f64],
    subdiag: &[f64],
    rhs: &mut [f64],
    solution: &mut [f64],
) -> std::result::Result<(), SplineError> {
    let n = diag.len();
    if n == 0 {
        return Ok(());
    }
    debug_assert_eq!(supdiag.len() + 1, n);
    debug_assert_eq!(subdiag.len() + 1, n);
    debug_assert_eq!(rhs.len(), n);
    debug_assert_eq!(solution.len(), n);

    if diag[0] == 0.0 {
        return Err(SplineError::SingularSystem { row: 0 });
    }
    for i in 1..n {
        let t = subdiag[i - 1] / diag[i - 1];
        diag[i] -= t * supdiag[i - 1];
        rhs[i] -= t * rhs[i - 1];
        if diag[i] == 0.0 || !diag[i].is_finite() {
            return Err(SplineError::SingularSystem { row: i });
        }
    }

    solution[n - 1] = rhs[n - 1] / diag[n - 1];
    for i in (0..n - 1).rev() {
        solution[i] = (rhs[i] - supdiag[i] * solution[i + 1]) / diag[i];
    }
    Ok(())
}

/// Scratch memory for spline evaluation, sized once for a maximum knot count.
#[derive(Clone, Debug)]
pub struct SplineWorkspace {
    c: Vec<f64>,
    diag: Vec<f64>,
    supdiag: Vec<f64>,
    subdiag: Vec<f64>,
    g: Vec<f64>,
    max_knots: usize,
}

impl SplineWorkspace {
    pub fn new(max_knots: usize) -> Self {
        let sys = max_knots.saturating_sub(2);
        SplineWorkspace {
            c: vec![0.0; max_knots],
            diag: vec![0.0; sys],
            supdiag: vec![0.0; sys.saturating_sub(1)],
            subdiag: vec![0.0; sys.saturating_sub(1)],
            g: vec![0.0; sys],
            max_knots,
        }
    }

    pub fn max_knots(&self) -> usize {
        self.max_knots
    }

    /// Evaluate the interpolant through `(x, y)` at every integer
    /// `0..=x[last]`, writing into `out[..=x[last]]`.
    ///
    /// The knots must start at 0 and be strictly increasing; this is not
    /// re-checked here. On a solver failure `out` is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if there are more knots than the workspace was sized for, or if
    /// `out` is shorter than `x[last] + 1`.
    pub fn evaluate(
        &mut self,
        x: &[f64],
        y: &[f64],
        out: &mut [f64],
    ) -> std::result::Result<(), SplineError> {
        let num = x.len();
        debug_assert_eq!(num, y.len());
        if num == 0 {
            return Ok(());
        }
        assert!(
            num <= self.max_knots,
            "spline workspace sized for {} knots, got {}",
            self.max_knots,
            num
        );
        let max_j = x[num - 1] as usize;
        let out = &mut out[..=max_j];

        if num <= 3 {
            evaluate_polynomial(x, y, out);
            return Ok(());
        }

        let n = num - 1;
        let sys = n - 1;
        let diag = &mut self.diag[..sys];
        let supdiag = &mut self.supdiag[..sys - 1];
        let subdiag = &mut self.subdiag[..sys - 1];
        let g = &mut self.g[..sys];
        let c = &mut self.c[..num];

        let h_0 = x[1] - x[0];
        let h_1 = x[2] - x[1];
        let h_nm1 = x[n] - x[n - 1];
        let h_nm2 = x[n - 1] - x[n - 2];

        // First row carries the left not-a-node condition.
        diag[0] = h_0 + 2.0 * h_1;
        supdiag[0] = h_1 - h_0;
        g[0] = 3.0 / (h_0 + h_1) * ((y[2] - y[1]) - (h_1 / h_0) * (y[1] - y[0]));
        for i in 2..=n - 2 {
            let h_i = x[i + 1] - x[i];
            let h_im1 = x[i] - x[i - 1];
            subdiag[i - 2] = h_im1;
            diag[i - 1] = 2.0 * (h_im1 + h_i);
            supdiag[i - 1] = h_i;
            g[i - 1] = 3.0 * ((y[i + 1] - y[i]) / h_i - (y[i] - y[i - 1]) / h_im1);
        }
        // Last row carries the right not-a-node condition.
        subdiag[n - 3] = h_nm2 - h_nm1;
        diag[n - 2] = 2.0 * h_nm2 + h_nm1;
        g[n - 2] = 3.0 / (h_nm1 + h_nm2)
            * ((h_nm2 / h_nm1) * (y[n] - y[n - 1]) - (y[n - 1] - y[n - 2]));

        solve_tridiagonal(diag, supdiag, subdiag, g, &mut c[1..n])?;

        c[0] = c[1] + (h_0 / h_1) * (c[1] - c[2]);
        c[n] = c[n - 1] + (h_nm1 / h_nm2) * (c[n - 1] - c[n - 2]);

        // Evaluation points only increase, so the containing interval is found
        // by advancing a cursor.
        let mut i = 0;
        for (j, value) in out.iter_mut().enumerate() {
            let xj = j as f64;
            while i < n - 1 && xj > x[i + 1] {
                i += 1;
            }
            let dx = xj - x[i];
            if dx == 0.0 {
                *value = y[i];
                continue;
            }
            if xj == x[i + 1] {
                *value = y[i + 1];
                continue;
            }
            let h_i = x[i + 1] - x[i];
            let a_i = y[i];
            let b_i = (y[i + 1] - y[i]) / h_i - (h_i / 3.0) * (c[i + 1] + 2.0 * c[i]);
            let c_i = c[i];
            let d_i = (c[i + 1] - c[i]) / (3.0 * h_i);
            *value = a_i + dx * (b_i + dx * (c_i + dx * d_i));
        }
        Ok(())
    }
}

/// Newton divided-difference interpolation through at most three points.
fn evaluate_polynomial(x: &[f64], y: &[f64], out: &mut [f64]) {
    let num = x.len();
    let mut dd = [0.0f64; 3];
    dd[..num].copy_from_slice(&y[..num]);
    for level in 1..num {
        for k in (level..num).rev() {
            dd[k] = (dd[k] - dd[k - 1]) / (x[k] - x[k - level]);
        }
    }

    for (j, value) in out.iter_mut().enumerate() {
        let t = j as f64;
        if let Some(k) = x.iter().position(|&xk| xk == t) {
            *value = y[k];
            continue;
        }
        let mut acc = dd[num - 1];
        for k in (0..num - 1).rev() {
            acc = dd[k] + (t - x[k]) * acc;
        }
        *value = acc;
    }
}

/// Validate the knots and evaluate their envelope at `0..=x[last]`.
///
/// This is the standalone entry point; the sifting loop reuses a
/// [`SplineWorkspace`] directly.
pub fn evaluate_spline(x: &[f64], y: &[f64]) -> Result<Vec<f64>> {
    if x.len() != y.len() {
        return Err(EemdError::InvalidKnots(format!(
            "x and y lengths differ ({} vs {})",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(EemdError::InvalidKnots(format!(
            "at least two knots are required, got {}",
            x.len()
        )));
    }
    if x[0] != 0.0 {
        return Err(EemdError::InvalidKnots(format!(
            "first knot must be at 0, got {}",
            x[0]
        )));
    }
    if x.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(EemdError::InvalidKnots(
            "knot positions must be strictly increasing".to_string(),
        ));
    }
    let last = x[x.len() - 1];
    if !last.is_finite() || last.fract() != 0.0 {
        return Err(EemdError::InvalidKnots(format!(
            "last knot must be an integer, got {}",
            last
        )));
    }

    let mut out = vec![0.0; last as usize + 1];
    let mut workspace = SplineWorkspace::new(x.len());
    workspace.evaluate(x, y, &mut out)?;
    Ok(out)
}
