use crate::array_utils::linear_extrapolate;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slope {
    Up,
    Down,
    None,
}

/// Local maxima and minima of a sequence, including the artificial extrema
/// placed at both ends of the data.
///
/// Positions are reals: the extremum of a flat run sits at its midpoint and
/// can land on a half-integer. Both sets are ordered by position and, for a
/// non-empty input, start at 0 and end at N-1.
#[derive(Clone, Debug, Default)]
pub struct Extrema {
    pub max_x: Vec<f64>,
    pub max_y: Vec<f64>,
    pub min_x: Vec<f64>,
    pub min_y: Vec<f64>,
}

impl Extrema {
    /// Buffers sized for the worst case of every sample being an extremum.
    pub fn with_capacity(n: usize) -> Self {
        Extrema {
            max_x: Vec::with_capacity(n),
            max_y: Vec::with_capacity(n),
            min_x: Vec::with_capacity(n),
            min_y: Vec::with_capacity(n),
        }
    }

    pub fn num_max(&self) -> usize {
        self.max_x.len()
    }

    pub fn num_min(&self) -> usize {
        self.min_x.len()
    }

    fn clear(&mut self) {
        self.max_x.clear();
        self.max_y.clear();
        self.min_x.clear();
        self.min_y.clear();
    }

    /// Locate the extrema of `x`, replacing the current contents.
    ///
    /// Returns true when every interior maximum is positive and every interior
    /// minimum is negative. This flag only feeds the S-number stopping rule.
    pub fn find(&mut self, x: &[f64]) -> bool {
        self.clear();
        let n = x.len();
        if n == 0 {
            return true;
        }

        self.push_max(0.0, x[0]);
        self.push_min(0.0, x[0]);
        if n == 1 {
            return true;
        }

        let mut all_good = true;
        let mut previous = Slope::None;
        let mut flat_counter = 0usize;
        for i in 0..n - 1 {
            if x[i + 1] > x[i] {
                if previous == Slope::Down {
                    self.push_min(i as f64 - flat_counter as f64 / 2.0, x[i]);
                    if x[i] >= 0.0 {
                        all_good = false;
                    }
                }
                previous = Slope::Up;
                flat_counter = 0;
            } else if x[i + 1] < x[i] {
                if previous == Slope::Up {
                    self.push_max(i as f64 - flat_counter as f64 / 2.0, x[i]);
                    if x[i] <= 0.0 {
                        all_good = false;
                    }
                }
                previous = Slope::Down;
                flat_counter = 0;
            } else {
                flat_counter += 1;
            }
        }

        let last = (n - 1) as f64;
        self.push_max(last, x[n - 1]);
        self.push_min(last, x[n - 1]);

        // With at least two interior extrema, pull the end values outwards if a
        // straight line through the two nearest interior extrema is more extreme.
        let nmax = self.num_max();
        if nmax >= 4 {
            let left = linear_extrapolate(
                self.max_x[1],
                self.max_y[1],
                self.max_x[2],
                self.max_y[2],
                0.0,
            );
            if left > self.max_y[0] {
                self.max_y[0] = left;
            }
            let right = linear_extrapolate(
                self.max_x[nmax - 3],
                self.max_y[nmax - 3],
                self.max_x[nmax - 2],
                self.max_y[nmax - 2],
                last,
            );
            if right > self.max_y[nmax - 1] {
                self.max_y[nmax - 1] = right;
            }
        }
        let nmin = self.num_min();
        if nmin >= 4 {
            let left = linear_extrapolate(
                self.min_x[1],
                self.min_y[1],
                self.min_x[2],
                self.min_y[2],
                0.0,
            );
            if left < self.min_y[0] {
                self.min_y[0] = left;
            }
            let right = linear_extrapolate(
                self.min_x[nmin - 3],
                self.min_y[nmin - 3],
                self.min_x[nmin - 2],
                self.min_y[nmin - 2],
                last,
            );
            if right < self.min_y[nmin - 1] {
                self.min_y[nmin - 1] = right;
            }
        }

        all_good
    }

    #[inline]
    fn push_max(&mut self, pos: f64, val: f64) {
        self.max_x.push(pos);
        self.max_y.push(val);
    }

    #[inline]
    fn push_min(&mut self, pos: f64, val: f64) {
        self.min_x.push(pos);
        self.min_y.push(val);
    }
}

/// Allocate an [`Extrema`] for `x` and fill it.
///
/// Returns the extrema together with the "all extrema good" flag.
pub fn find_extrema(x: &[f64]) -> (Extrema, bool) {
    let mut extrema = Extrema::with_capacity(x.len());
    let all_good = extrema.find(x);
    (extrema, all_good)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input() {
        let (ext, good) = find_extrema(&[]);
        assert!(good);
        assert_eq!(ext.num_max(), 0);
        assert_eq!(ext.num_min(), 0);
    }

    #[test]
    fn test_single_point() {
        let (ext, good) = find_extrema(&[2.5]);
        assert!(good);
        assert_eq!(ext.max_x, vec![0.0]);
        assert_eq!(ext.max_y, vec![2.5]);
        assert_eq!(ext.min_x, vec![0.0]);
        assert_eq!(ext.min_y, vec![2.5]);
    }

    #[test]
    fn test_monotonic_has_only_endpoints() {
        let x: Vec<f64> = (0..10).map(|i| i as f64 * 0.5 - 1.0).collect();
        let (ext, _) = find_extrema(&x);
        assert_eq!(ext.max_x, vec![0.0, 9.0]);
        assert_eq!(ext.min_x, vec![0.0, 9.0]);
        assert_eq!(ext.max_y, vec![x[0], x[9]]);

        let down: Vec<f64> = x.iter().rev().copied().collect();
        let (ext, _) = find_extrema(&down);
        assert_eq!(ext.num_max(), 2);
        assert_eq!(ext.num_min(), 2);
    }

    #[test]
    fn test_alternating_sequence() {
        let (ext, good) = find_extrema(&[0.0, 1.0, 0.0, 1.0, 0.0]);
        assert_eq!(ext.max_x, vec![0.0, 1.0, 3.0, 4.0]);
        assert_eq!(ext.min_x, vec![0.0, 2.0, 4.0]);
        // Four maxima: both ends are lifted to the line through the interior peaks.
        assert_eq!(ext.max_y, vec![1.0, 1.0, 1.0, 1.0]);
        assert_eq!(ext.min_y, vec![0.0, 0.0, 0.0]);
        // The interior minimum sits at zero, which is not strictly negative.
        assert!(!good);
    }

    #[test]
    fn test_well_formed_imf_is_good() {
        let x = [0.0, 1.0, -1.0, 1.0, -1.0, 0.0];
        let (_, good) = find_extrema(&x);
        assert!(good);
    }

    #[test]
    fn test_flat_peak_uses_midpoint() {
        let (ext, _) = find_extrema(&[0.0, 1.0, 1.0, 1.0, 0.0]);
        assert_eq!(ext.max_x, vec![0.0, 2.0, 4.0]);
        assert_eq!(ext.max_y, vec![0.0, 1.0, 0.0]);

        let (ext, _) = find_extrema(&[0.0, 1.0, 1.0, 0.0]);
        assert_eq!(ext.max_x, vec![0.0, 1.5, 3.0]);
    }

    #[test]
    fn test_leading_flat_run_is_ignored() {
        let (ext, _) = find_extrema(&[1.0, 1.0, 1.0, 0.0, 1.0]);
        assert_eq!(ext.max_x, vec![0.0, 4.0]);
        assert_eq!(ext.min_x, vec![0.0, 3.0, 4.0]);
    }

    #[test]
    fn test_endpoint_extrapolation_only_when_more_extreme() {
        // Peaks rising to the right: left extrapolation is lower than x[0].
        let x = [5.0, 0.0, 1.0, 0.0, 2.0, 0.0, 3.0, 0.0];
        let (ext, _) = find_extrema(&x);
        assert_eq!(ext.max_x, vec![0.0, 2.0, 4.0, 6.0, 7.0]);
        assert_eq!(ext.max_y[0], 5.0);
        // Right end: line through (4,2) and (6,3) gives 3.5 at 7.
        assert_eq!(ext.max_y[4], 3.5);
    }

    #[test]
    fn test_minima_extrapolation_only_when_lower() {
        // Mirror image of the maxima case: the left end keeps x[0].
        let x = [-5.0, 0.0, -1.0, 0.0, -2.0, 0.0, -3.0, 0.0];
        let (ext, _) = find_extrema(&x);
        assert_eq!(ext.min_x, vec![0.0, 2.0, 4.0, 6.0, 7.0]);
        assert_eq!(ext.min_y[0], -5.0);
        assert_eq!(ext.min_y[4], -3.5);

        // Troughs rising to the right: both ends are pulled below the samples.
        let x = [0.0, -3.0, 0.0, -2.0, 0.0, -1.0, 0.0];
        let (ext, _) = find_extrema(&x);
        assert_eq!(ext.min_x, vec![0.0, 1.0, 3.0, 5.0, 6.0]);
        assert_eq!(ext.min_y[0], -3.5);
        assert_eq!(ext.min_y[4], -0.5);
    }

    proptest! {
        #[test]
        fn prop_positions_increase_and_end_at_domain(
            x in proptest::collection::vec(-100.0f64..100.0, 2..200)
        ) {
            let (ext, _) = find_extrema(&x);
            let last = (x.len() - 1) as f64;
            for xs in [&ext.max_x, &ext.min_x] {
                prop_assert!(xs.len() >= 2);
                prop_assert_eq!(xs[0], 0.0);
                prop_assert_eq!(xs[xs.len() - 1], last);
                for w in xs.windows(2) {
                    prop_assert!(w[1] > w[0]);
                }
            }
        }
    }
}
