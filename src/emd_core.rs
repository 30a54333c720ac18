use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::array_utils;
use crate::error::{EemdError, Result};
use crate::extrema::Extrema;
use crate::spline::SplineWorkspace;

/// Configuration parameters for EEMD and CEEMDAN.
#[derive(Clone, Debug)]
pub struct EemdConfig {
    /// Number of noise-perturbed realizations to average. 1 = plain EMD.
    pub ensemble_size: usize,
    /// Noise standard deviation relative to the input's standard deviation.
    pub noise_strength: f64,
    /// Stop sifting once the extrema counts have been stable for more than
    /// this many consecutive iterations. 0 disables the criterion.
    pub s_number: u32,
    /// Hard cap on sifting iterations per IMF. 0 = no cap.
    pub num_siftings: u32,
    /// Base seed; worker `w` draws noise from `rng_seed + w`.
    pub rng_seed: u64,
    /// Number of output rows, including the residual. `None` = `num_imfs(N)`.
    pub num_imfs: Option<usize>,
    /// Worker threads. `None` = available parallelism.
    pub num_threads: Option<usize>,
}

impl Default for EemdConfig {
    fn default() -> Self {
        EemdConfig {
            ensemble_size: 250,
            noise_strength: 0.2,
            s_number: 4,
            num_siftings: 50,
            rng_seed: 0,
            num_imfs: None,
            num_threads: None,
        }
    }
}

impl EemdConfig {
    /// Check the EEMD parameter contract: noise is added if and only if there
    /// is more than one ensemble member.
    pub fn validate(&self) -> Result<()> {
        self.validate_common()?;
        if self.ensemble_size == 1 && self.noise_strength != 0.0 {
            return Err(EemdError::InvalidParameter(
                "noise_strength must be 0 when ensemble_size is 1".to_string(),
            ));
        }
        if self.ensemble_size > 1 && self.noise_strength == 0.0 {
            return Err(EemdError::InvalidParameter(
                "noise_strength must be positive when ensemble_size > 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks shared by every decomposition driver.
    pub fn validate_common(&self) -> Result<()> {
        if self.ensemble_size < 1 {
            return Err(EemdError::InvalidParameter(
                "ensemble_size must be >= 1".to_string(),
            ));
        }
        if !(self.noise_strength >= 0.0) || !self.noise_strength.is_finite() {
            return Err(EemdError::InvalidParameter(format!(
                "noise_strength must be a non-negative finite number, got {}",
                self.noise_strength
            )));
        }
        if self.s_number == 0 && self.num_siftings == 0 {
            return Err(EemdError::InvalidParameter(
                "one of s_number or num_siftings must be positive".to_string(),
            ));
        }
        if self.num_imfs == Some(0) {
            return Err(EemdError::InvalidParameter(
                "num_imfs must be >= 1".to_string(),
            ));
        }
        if self.num_threads == Some(0) {
            return Err(EemdError::InvalidParameter(
                "num_threads must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of output rows for an input of length `n`.
    pub fn output_rows(&self, n: usize) -> Result<usize> {
        if n == 0 {
            return Ok(0);
        }
        let max = num_imfs(n);
        match self.num_imfs {
            Some(m) if m > max => Err(EemdError::InvalidParameter(format!(
                "num_imfs={} exceeds the maximum of {} for N={}",
                m, max, n
            ))),
            Some(m) => Ok(m),
            None => Ok(max),
        }
    }

    /// Size of the worker pool: never more workers than realizations.
    pub fn worker_count(&self) -> usize {
        let threads = self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        threads.min(self.ensemble_size).max(1)
    }
}

/// Number of rows (IMFs plus the final residual) extracted from `n` samples.
pub fn num_imfs(n: usize) -> usize {
    match n {
        0 => 0,
        1..=3 => 1,
        _ => n.ilog2() as usize,
    }
}

/// Output matrix rows, each behind its own lock.
///
/// Workers only ever hold one row lock at a time. Merging worker partials
/// through [`RowAccumulator::reduce_partials`] fixes the summation order, so
/// the result does not depend on thread scheduling.
pub struct RowAccumulator<'a> {
    rows: Vec<Mutex<&'a mut [f64]>>,
}

impl<'a> RowAccumulator<'a> {
    /// Split a row-major buffer into rows of length `n` (`n > 0`).
    pub fn new(output: &'a mut [f64], n: usize) -> Self {
        RowAccumulator {
            rows: output.chunks_mut(n).map(Mutex::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `row[i] += src[i]` under the row's lock.
    pub fn accumulate(&self, row: usize, src: &[f64]) {
        let mut guard = self.rows[row]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        array_utils::add(src, &mut **guard);
    }

    /// Add row `row` of every partial matrix, in slice order.
    pub fn reduce_partials(&self, row: usize, partials: &[Vec<f64>]) {
        self.with_row(row, |dst| {
            let n = dst.len();
            for partial in partials {
                array_utils::add(&partial[row * n..(row + 1) * n], dst);
            }
        });
    }

    /// Run `f` on a row while holding its lock.
    pub fn with_row<R>(&self, row: usize, f: impl FnOnce(&mut [f64]) -> R) -> R {
        let mut guard = self.rows[row]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut **guard)
    }
}

/// Sifting state machine: extracts one IMF from a buffer in place.
pub struct Sifter {
    s_number: u32,
    num_siftings: u32,
    extrema: Extrema,
    spline: SplineWorkspace,
    upper: Vec<f64>,
    lower: Vec<f64>,
}

impl Sifter {
    /// At least one of `s_number` and `num_siftings` must be positive,
    /// otherwise nothing ever stops the sifting loop.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if both are zero.
    pub fn new(n: usize, s_number: u32, num_siftings: u32) -> Self {
        debug_assert!(
            s_number > 0 || num_siftings > 0,
            "sifting needs s_number > 0 or num_siftings > 0"
        );
        Sifter {
            s_number,
            num_siftings,
            extrema: Extrema::with_capacity(n),
            spline: SplineWorkspace::new(n),
            upper: vec![0.0; n],
            lower: vec![0.0; n],
        }
    }

    /// Sift `x` until a stopping criterion fires, leaving the IMF in `x`.
    ///
    /// Returns the number of envelope-mean subtractions performed.
    pub fn sift(&mut self, x: &mut [f64]) -> u32 {
        debug_assert_eq!(x.len(), self.upper.len());
        let mut sift_counter = 0u32;
        let mut subtractions = 0u32;
        let mut s_counter = 0u32;
        let mut num_max = usize::MAX;
        let mut num_min = usize::MAX;

        while self.num_siftings == 0 || sift_counter < self.num_siftings {
            sift_counter += 1;
            let prev_num_max = num_max;
            let prev_num_min = num_min;

            let all_good = self.extrema.find(x);
            num_max = self.extrema.num_max();
            num_min = self.extrema.num_min();

            if self.s_number != 0 {
                if all_good && num_max == prev_num_max && num_min == prev_num_min {
                    s_counter += 1;
                    if s_counter > self.s_number {
                        break;
                    }
                } else {
                    s_counter = 0;
                }
            }

            // A failed solve keeps the previous envelope for this iteration.
            if let Err(e) =
                self.spline
                    .evaluate(&self.extrema.max_x, &self.extrema.max_y, &mut self.upper)
            {
                tracing::error!("Upper envelope evaluation failed: {}", e);
            }
            if let Err(e) =
                self.spline
                    .evaluate(&self.extrema.min_x, &self.extrema.min_y, &mut self.lower)
            {
                tracing::error!("Lower envelope evaluation failed: {}", e);
            }

            for ((xi, &u), &l) in x.iter_mut().zip(self.upper.iter()).zip(self.lower.iter()) {
                *xi -= 0.5 * (u + l);
            }
            subtractions += 1;
        }
        subtractions
    }
}

/// Per-worker scratch memory: allocated once, reused for every realization
/// the worker owns.
///
/// Decompositions are summed into a worker-owned `rows x n` partial matrix.
pub struct Workspace {
    rng: StdRng,
    sifter: Sifter,
    x: Vec<f64>,
    res: Vec<f64>,
    partial: Vec<f64>,
    rows: usize,
}

impl Workspace {
    pub fn new(n: usize, rows: usize, seed: u64, s_number: u32, num_siftings: u32) -> Self {
        Workspace {
            rng: StdRng::seed_from_u64(seed),
            sifter: Sifter::new(n, s_number, num_siftings),
            x: vec![0.0; n],
            res: vec![0.0; n],
            partial: vec![0.0; rows * n],
            rows,
        }
    }

    /// Load the residual buffer with `input`, plus fresh noise if given.
    pub fn load_replicate(&mut self, input: &[f64], noise: Option<&Normal<f64>>) {
        match noise {
            None => array_utils::copy(input, &mut self.res),
            Some(dist) => {
                for (r, &v) in self.res.iter_mut().zip(input.iter()) {
                    *r = v + dist.sample(&mut self.rng);
                }
            }
        }
    }

    /// Current residual buffer.
    pub fn residual(&self) -> &[f64] {
        &self.res
    }

    /// Sum of every decomposition run so far, row-major.
    pub fn partial(&self) -> &[f64] {
        &self.partial
    }

    pub fn into_partial(self) -> Vec<f64> {
        self.partial
    }

    /// Run EMD on the loaded replicate, adding each IMF into its partial row
    /// and the final residual into the last row.
    pub fn decompose_residual(&mut self) {
        let m = self.rows;
        let n = self.res.len();
        if m == 0 || n == 0 {
            return;
        }
        for imf_i in 0..m - 1 {
            array_utils::copy(&self.res, &mut self.x);
            let siftings = self.sifter.sift(&mut self.x);
            array_utils::sub(&self.x, &mut self.res);
            array_utils::add(&self.x, &mut self.partial[imf_i * n..(imf_i + 1) * n]);
            tracing::trace!("IMF {} saved after {} siftings", imf_i + 1, siftings);
        }
        array_utils::add(&self.res, &mut self.partial[(m - 1) * n..]);
    }
}
