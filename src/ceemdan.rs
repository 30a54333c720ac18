//! Complete Ensemble EMD with Adaptive Noise (CEEMDAN).
//!
//! Instead of decomposing each noisy copy independently, every stage averages
//! the local means of `residual + beta * mode_k(noise_i)` over the ensemble and
//! extracts one IMF from the shared residual. See M. E. Torres et al., "A
//! complete ensemble empirical mode decomposition with adaptive noise", ICASSP
//! 2011. Unlike EEMD the rows sum exactly (up to rounding) to the input.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;

use crate::array_utils;
use crate::eemd::{build_pool, split_rows};
use crate::emd_core::{EemdConfig, RowAccumulator, Sifter};
use crate::error::{EemdError, Result};

/// State of one logical worker: the noise realizations it owns, which are
/// peeled one mode per stage.
struct CeemdanWorker {
    noises: Vec<Vec<f64>>,
    realizations: usize,
    sifter: Sifter,
    noisy: Vec<f64>,
    imf: Vec<f64>,
    mode: Vec<f64>,
    mean_sum: Vec<f64>,
}

impl CeemdanWorker {
    fn new(n: usize, seed: u64, realizations: usize, with_noise: bool, config: &EemdConfig) -> Self {
        let noises: Vec<Vec<f64>> = if with_noise {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..realizations)
                .map(|_| (0..n).map(|_| StandardNormal.sample(&mut rng)).collect())
                .collect()
        } else {
            Vec::new()
        };
        CeemdanWorker {
            noises,
            realizations,
            sifter: Sifter::new(n, config.s_number, config.num_siftings),
            noisy: vec![0.0; n],
            imf: vec![0.0; n],
            mode: vec![0.0; n],
            mean_sum: vec![0.0; n],
        }
    }

    /// Sum the local means of this worker's noisy residuals into `mean_sum`.
    fn stage(&mut self, stage: usize, residual: &[f64], noise_sigma: f64) {
        self.mean_sum.fill(0.0);
        for r in 0..self.realizations {
            array_utils::copy(residual, &mut self.noisy);
            if let Some(noise) = self.noises.get_mut(r) {
                // Peel the next mode off the noise; the noise keeps the rest.
                array_utils::copy(noise, &mut self.mode);
                self.sifter.sift(&mut self.mode);
                array_utils::sub(&self.mode, noise);

                let beta = if stage == 0 {
                    let sd = array_utils::std_dev(&self.mode);
                    if sd > 0.0 {
                        noise_sigma / sd
                    } else {
                        0.0
                    }
                } else {
                    noise_sigma
                };
                array_utils::add_scaled(&self.mode, beta, &mut self.noisy);
            }

            array_utils::copy(&self.noisy, &mut self.imf);
            self.sifter.sift(&mut self.imf);
            // noisy - imf is the local mean of this realization
            array_utils::sub(&self.imf, &mut self.noisy);
            array_utils::add(&self.noisy, &mut self.mean_sum);
        }
    }
}

/// CEEMDAN driver. Shares [`EemdConfig`] with [`crate::eemd::Eemd`], except
/// that noise may be added with a single ensemble member.
pub struct Ceemdan {
    config: EemdConfig,
}

impl Ceemdan {
    pub fn new(config: EemdConfig) -> Self {
        Ceemdan { config }
    }

    pub fn config(&self) -> &EemdConfig {
        &self.config
    }

    pub fn decompose(&self, input: &[f64]) -> Result<Vec<Vec<f64>>> {
        self.config.validate_common()?;
        let n = input.len();
        let m = self.config.output_rows(n)?;
        let mut output = vec![0.0; m * n];
        self.decompose_into(input, &mut output)?;
        Ok(split_rows(output, n))
    }

    /// Decompose into a caller-allocated row-major `M x N` buffer; returns `M`.
    pub fn decompose_into(&self, input: &[f64], output: &mut [f64]) -> Result<usize> {
        let config = &self.config;
        config.validate_common()?;
        let n = input.len();
        let m = config.output_rows(n)?;
        if output.len() != m * n {
            return Err(EemdError::BufferSizeMismatch {
                expected: m * n,
                actual: output.len(),
            });
        }
        if n == 0 {
            return Ok(0);
        }

        let noise_sigma = array_utils::std_dev(input) * config.noise_strength;
        if !noise_sigma.is_finite() {
            return Err(EemdError::InvalidParameter(format!(
                "input standard deviation is not finite (noise sigma {})",
                noise_sigma
            )));
        }
        let with_noise = noise_sigma > 0.0;

        output.fill(0.0);
        let ensemble_size = config.ensemble_size;
        let workers = config.worker_count();
        let pool = build_pool(workers)?;
        tracing::debug!(
            "CEEMDAN: N={}, M={}, ensemble_size={}, noise_sigma={}, workers={}",
            n,
            m,
            ensemble_size,
            noise_sigma,
            workers
        );

        let mut states: Vec<CeemdanWorker> = pool.install(|| {
            (0..workers)
                .into_par_iter()
                .map(|worker| {
                    let realizations = (worker..ensemble_size).step_by(workers).count();
                    CeemdanWorker::new(
                        n,
                        config.rng_seed.wrapping_add(worker as u64),
                        realizations,
                        with_noise,
                        config,
                    )
                })
                .collect()
        });

        let rows = RowAccumulator::new(output, n);
        let mut residual = input.to_vec();
        for stage in 0..m - 1 {
            pool.install(|| {
                states
                    .par_iter_mut()
                    .for_each(|state| state.stage(stage, &residual, noise_sigma));
            });
            // Sum the local means in worker order, then turn the row into the
            // IMF and carry the averaged local mean forward as the residual.
            rows.with_row(stage, |row| {
                for state in &states {
                    array_utils::add(&state.mean_sum, row);
                }
                array_utils::div(row, ensemble_size as f64);
                for (r, res) in row.iter_mut().zip(residual.iter_mut()) {
                    let local_mean = *r;
                    *r = *res - local_mean;
                    *res = local_mean;
                }
            });
            tracing::debug!("CEEMDAN: IMF {} extracted", stage + 1);
        }
        rows.accumulate(m - 1, &residual);
        Ok(m)
    }
}

/// CEEMDAN with the given configuration.
pub fn ceemdan(input: &[f64], config: &EemdConfig) -> Result<Vec<Vec<f64>>> {
    Ceemdan::new(config.clone()).decompose(input)
}
