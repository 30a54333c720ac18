// This work is dedicated to the public domain under the CC0 1.0 Universal license.
// To the extent possible under law, the author has waived all copyright
// and related or neighboring rights to this work.
// https://creativecommons.org/publicdomain/zero/1.0/

use numpy::{PyArray1, PyArray2, PyArrayMethods, PyReadonlyArray1};
use pyo3::prelude::*;

use crate::ceemdan::Ceemdan;
use crate::eemd::Eemd;
use crate::emd_core::{self, EemdConfig};
use crate::error::EemdError;
use crate::extrema;
use crate::spline;

fn to_py_err(e: EemdError) -> PyErr {
    match e {
        EemdError::ThreadPool(_) => pyo3::exceptions::PyRuntimeError::new_err(e.to_string()),
        _ => pyo3::exceptions::PyValueError::new_err(e.to_string()),
    }
}

/// Reshape a row list into an (M, N) numpy array.
fn rows_to_array<'py>(
    py: Python<'py>,
    rows: Vec<Vec<f64>>,
    n: usize,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let m = rows.len();
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    PyArray1::from_vec(py, flat)
        .reshape([m, n])
        .map_err(|e| pyo3::exceptions::PyRuntimeError::new_err(format!("{}", e)))
}

/// Decompose `inp` with EEMD. Returns an (M, N) array whose last row is the
/// residual.
#[pyfunction]
#[pyo3(signature = (inp, ensemble_size=250, noise_strength=0.2, s_number=4, num_siftings=50, rng_seed=0, num_imfs=None, num_threads=None))]
#[allow(clippy::too_many_arguments)]
fn eemd<'py>(
    py: Python<'py>,
    inp: PyReadonlyArray1<f64>,
    ensemble_size: usize,
    noise_strength: f64,
    s_number: u32,
    num_siftings: u32,
    rng_seed: u64,
    num_imfs: Option<usize>,
    num_threads: Option<usize>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let config = EemdConfig {
        ensemble_size,
        noise_strength,
        s_number,
        num_siftings,
        rng_seed,
        num_imfs,
        num_threads,
    };
    let slice = inp.as_slice()?;
    let n = slice.len();
    let driver = Eemd::new(config);
    let rows = py
        .allow_threads(|| driver.decompose(slice))
        .map_err(to_py_err)?;
    rows_to_array(py, rows, n)
}

/// Plain EMD: EEMD with one member and no added noise.
#[pyfunction]
#[pyo3(signature = (inp, s_number=4, num_siftings=50, num_imfs=None))]
fn emd<'py>(
    py: Python<'py>,
    inp: PyReadonlyArray1<f64>,
    s_number: u32,
    num_siftings: u32,
    num_imfs: Option<usize>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let config = EemdConfig {
        ensemble_size: 1,
        noise_strength: 0.0,
        s_number,
        num_siftings,
        num_imfs,
        num_threads: Some(1),
        ..Default::default()
    };
    let slice = inp.as_slice()?;
    let n = slice.len();
    let driver = Eemd::new(config);
    let rows = py
        .allow_threads(|| driver.decompose(slice))
        .map_err(to_py_err)?;
    rows_to_array(py, rows, n)
}

/// Decompose `inp` with CEEMDAN.
#[pyfunction]
#[pyo3(signature = (inp, ensemble_size=250, noise_strength=0.2, s_number=4, num_siftings=50, rng_seed=0, num_imfs=None, num_threads=None))]
#[allow(clippy::too_many_arguments)]
fn ceemdan<'py>(
    py: Python<'py>,
    inp: PyReadonlyArray1<f64>,
    ensemble_size: usize,
    noise_strength: f64,
    s_number: u32,
    num_siftings: u32,
    rng_seed: u64,
    num_imfs: Option<usize>,
    num_threads: Option<usize>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let config = EemdConfig {
        ensemble_size,
        noise_strength,
        s_number,
        num_siftings,
        rng_seed,
        num_imfs,
        num_threads,
    };
    let slice = inp.as_slice()?;
    let n = slice.len();
    let driver = Ceemdan::new(config);
    let rows = py
        .allow_threads(|| driver.decompose(slice))
        .map_err(to_py_err)?;
    rows_to_array(py, rows, n)
}

/// Returns (all_extrema_good, maxx, maxy, minx, miny), including the
/// artificial extrema at both ends.
#[pyfunction]
#[allow(clippy::type_complexity)]
fn emd_find_extrema<'py>(
    py: Python<'py>,
    x: PyReadonlyArray1<f64>,
) -> PyResult<(
    bool,
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray1<f64>>,
)> {
    let (ext, all_good) = extrema::find_extrema(x.as_slice()?);
    Ok((
        all_good,
        PyArray1::from_vec(py, ext.max_x),
        PyArray1::from_vec(py, ext.max_y),
        PyArray1::from_vec(py, ext.min_x),
        PyArray1::from_vec(py, ext.min_y),
    ))
}

/// Evaluate the envelope through knots `(x, y)` at `0..=x[-1]`.
#[pyfunction]
fn emd_evaluate_spline<'py>(
    py: Python<'py>,
    x: PyReadonlyArray1<f64>,
    y: PyReadonlyArray1<f64>,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let values = spline::evaluate_spline(x.as_slice()?, y.as_slice()?).map_err(to_py_err)?;
    Ok(PyArray1::from_vec(py, values))
}

/// Number of rows (IMFs plus residual) produced for input length `n`.
#[pyfunction]
fn emd_num_imfs(n: usize) -> usize {
    emd_core::num_imfs(n)
}

pub fn register_module(m: &Bound<'_, pyo3::types::PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(eemd, m)?)?;
    m.add_function(wrap_pyfunction!(emd, m)?)?;
    m.add_function(wrap_pyfunction!(ceemdan, m)?)?;
    m.add_function(wrap_pyfunction!(emd_find_extrema, m)?)?;
    m.add_function(wrap_pyfunction!(emd_evaluate_spline, m)?)?;
    m.add_function(wrap_pyfunction!(emd_num_imfs, m)?)?;
    Ok(())
}
