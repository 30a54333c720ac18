// This work is dedicated to the public domain under the CC0 1.0 Universal license.
// To the extent possible under law, the author has waived all copyright
// and related or neighboring rights to this work.
// https://creativecommons.org/publicdomain/zero/1.0/

#[cfg(feature = "python")]
use pyo3::prelude::*;

pub mod array_utils;
pub mod ceemdan;
pub mod eemd;
pub mod emd_core;
pub mod error;
pub mod extrema;
#[cfg(feature = "python")]
pub mod python;
pub mod spline;

pub use ceemdan::{ceemdan, Ceemdan};
pub use eemd::{eemd, emd, Eemd};
pub use emd_core::{num_imfs, EemdConfig};
pub use error::{EemdError, Result, SplineError};
pub use extrema::{find_extrema, Extrema};
pub use spline::{evaluate_spline, SplineWorkspace};

#[cfg(feature = "python")]
#[pymodule(name = "_reemd")]
fn reemd_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register_module(m)?;
    Ok(())
}
