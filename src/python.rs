use pyo3::exceptions::{PyIOError, PyRuntimeError};
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict};

use crate::config::ExtractionConfig;
use crate::session::{ExtractionSession, ExtractionStatus};

/// Extract `[{"name", "headshot", "jpeg"}, ...]` from a roster PDF on disk.
#[pyfunction]
fn extract_roster(py: Python<'_>, path: &str) -> PyResult<Vec<Py<PyDict>>> {
    let bytes = std::fs::read(path).map_err(|e| PyIOError::new_err(e.to_string()))?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
    let mut session = ExtractionSession::new(ExtractionConfig::default());
    if let ExtractionStatus::Failed { reason } = runtime.block_on(session.extract_pdf(bytes)) {
        return Err(PyRuntimeError::new_err(reason));
    }

    let mut output = Vec::with_capacity(session.records().len());
    for record in session.records() {
        let dict = PyDict::new(py);
        dict.set_item("name", &record.name)?;
        dict.set_item("headshot", &record.headshot_id)?;
        if let Some(jpeg) = session.preview(&record.headshot_id) {
            dict.set_item("jpeg", PyBytes::new(py, jpeg))?;
        }
        output.push(dict.into());
    }
    Ok(output)
}

/// Filesystem-safe slug used for headshot file names.
#[pyfunction]
fn slugify(name: &str) -> String {
    crate::assemble::slugify(name)
}

#[pymodule]
fn rostercards(_py: Python, m: &Bound<PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(extract_roster, m)?)?;
    m.add_function(wrap_pyfunction!(slugify, m)?)?;
    Ok(())
}
