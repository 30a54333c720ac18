use rayon::prelude::*;
use rand_distr::Normal;

use crate::array_utils;
use crate::emd_core::{EemdConfig, RowAccumulator, Workspace};
use crate::error::{EemdError, Result};

/// Ensemble Empirical Mode Decomposition driver.
///
/// Every realization is the input plus white noise of standard deviation
/// `noise_strength * sd(input)`; the per-realization decompositions are summed
/// into a shared output matrix and averaged.
pub struct Eemd {
    config: EemdConfig,
}

impl Eemd {
    pub fn new(config: EemdConfig) -> Self {
        Eemd { config }
    }

    pub fn config(&self) -> &EemdConfig {
        &self.config
    }

    /// Decompose `input` into IMFs. Row `M-1` of the result is the residual.
    pub fn decompose(&self, input: &[f64]) -> Result<Vec<Vec<f64>>> {
        self.config.validate()?;
        let n = input.len();
        let m = self.config.output_rows(n)?;
        let mut output = vec![0.0; m * n];
        self.decompose_into(input, &mut output)?;
        Ok(split_rows(output, n))
    }

    /// Decompose into a caller-allocated row-major `M x N` buffer.
    ///
    /// Returns `M`. Parameters and the buffer size are checked before anything
    /// is written.
    pub fn decompose_into(&self, input: &[f64], output: &mut [f64]) -> Result<usize> {
        let config = &self.config;
        config.validate()?;
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
        let noise = if config.noise_strength > 0.0 {
            Some(Normal::new(0.0, noise_sigma).map_err(|e| {
                EemdError::InvalidParameter(format!(
                    "cannot draw noise with sigma {}: {}",
                    noise_sigma, e
                ))
            })?)
        } else {
            None
        };

        output.fill(0.0);
        let workers = config.worker_count();
        let pool = build_pool(workers)?;
        let ensemble_size = config.ensemble_size;
        tracing::debug!(
            "EEMD: N={}, M={}, ensemble_size={}, noise_sigma={}, workers={}",
            n,
            m,
            ensemble_size,
            noise_sigma,
            workers
        );

        let partials: Vec<Vec<f64>> = pool.install(|| {
            (0..workers)
                .into_par_iter()
                .map(|worker| {
                    let mut ws = Workspace::new(
                        n,
                        m,
                        config.rng_seed.wrapping_add(worker as u64),
                        config.s_number,
                        config.num_siftings,
                    );
                    // Worker w owns realizations w, w + W, w + 2W, ...
                    for en_i in (worker..ensemble_size).step_by(workers) {
                        ws.load_replicate(input, noise.as_ref());
                        ws.decompose_residual();
                        tracing::trace!("Ensemble member {} done on worker {}", en_i, worker);
                    }
                    ws.into_partial()
                })
                .collect()
        });

        {
            let rows = RowAccumulator::new(output, n);
            pool.install(|| {
                (0..m)
                    .into_par_iter()
                    .for_each(|row| rows.reduce_partials(row, &partials));
            });
        }

        if ensemble_size != 1 {
            array_utils::div(output, ensemble_size as f64);
        }
        Ok(m)
    }
}

/// EEMD with the given configuration.
pub fn eemd(input: &[f64], config: &EemdConfig) -> Result<Vec<Vec<f64>>> {
    Eemd::new(config.clone()).decompose(input)
}

/// Plain EMD: a single realization without added noise.
pub fn emd(input: &[f64], s_number: u32, num_siftings: u32) -> Result<Vec<Vec<f64>>> {
    let config = EemdConfig {
        ensemble_size: 1,
        noise_strength: 0.0,
        s_number,
        num_siftings,
        num_threads: Some(1),
        ..Default::default()
    };
    Eemd::new(config).decompose(input)
}

pub(crate) fn build_pool(workers: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| EemdError::ThreadPool(e.to_string()))
}

pub(crate) fn split_rows(output: Vec<f64>, n: usize) -> Vec<Vec<f64>> {
    if n == 0 {
        return Vec::new();
    }
    output.chunks(n).map(|row| row.to_vec()).collect()
}
