//! Re-read a generated initial-data/answer pair and check it.

use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::TOOL_NAME;
use crate::common::io::read_file;
use crate::common::io_error_msg;
use crate::generate::{ELEMENT_MAX, Layout};
use crate::hexfmt::{DecodeError, decode};

/// Above this many values the multiset comparison sorts on the rayon pool.
const PARALLEL_THRESHOLD: usize = 10_000;

/// First property violation found in a dataset pair.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("cannot read '{}': {}", .path.display(), io_error_msg(.source))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {}", .path.display(), .source)]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("{}:{line}: value {value:08x} exceeds 7fffffff", .path.display())]
    OutOfRange {
        path: PathBuf,
        line: usize,
        value: u32,
    },

    #[error("{}: expected {expected} lines, found {actual}", .path.display())]
    LineCount {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("{}:{line}: disorder in run {run}: {value:08x}", .path.display())]
    RunDisorder {
        path: PathBuf,
        run: usize,
        line: usize,
        value: u32,
    },

    #[error("{}:{line}: disorder: {value:08x}", .path.display())]
    Disorder {
        path: PathBuf,
        line: usize,
        value: u32,
    },

    #[error("values differ from the answer at sorted position {index}: {initdata:08x} vs {answer:08x}")]
    Mismatch {
        index: usize,
        initdata: u32,
        answer: u32,
    },
}

/// Summary of a pair that passed every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyReport {
    pub total: usize,
    pub way_count: usize,
}

/// Read, decode, range-check and count-check one file.
fn load(path: &Path, expected: usize) -> Result<Vec<u32>, VerifyError> {
    let data = read_file(path).map_err(|source| VerifyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let values = decode(&data).map_err(|source| VerifyError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(idx) = values.iter().position(|&v| v > ELEMENT_MAX as u32) {
        return Err(VerifyError::OutOfRange {
            path: path.to_path_buf(),
            line: idx + 1,
            value: values[idx],
        });
    }
    if values.len() != expected {
        return Err(VerifyError::LineCount {
            path: path.to_path_buf(),
            expected,
            actual: values.len(),
        });
    }
    Ok(values)
}

/// Index of the first element smaller than its predecessor.
#[inline]
fn first_disorder(values: &[u32]) -> Option<usize> {
    values.windows(2).position(|w| w[0] > w[1]).map(|i| i + 1)
}

/// Check that each run of `initdata` is ascending.
pub fn check_runs(layout: &Layout, initdata: &[u32], path: &Path) -> Result<(), VerifyError> {
    for run in 0..layout.way_count() {
        let range = layout.run_range(run);
        let start = range.start;
        let Some(values) = initdata.get(range) else {
            break;
        };
        if let Some(off) = first_disorder(values) {
            let idx = start + off;
            return Err(VerifyError::RunDisorder {
                path: path.to_path_buf(),
                run,
                line: idx + 1,
                value: initdata[idx],
            });
        }
    }
    Ok(())
}

/// Check that `answer` is ascending end to end.
pub fn check_sorted(answer: &[u32], path: &Path) -> Result<(), VerifyError> {
    match first_disorder(answer) {
        Some(idx) => Err(VerifyError::Disorder {
            path: path.to_path_buf(),
            line: idx + 1,
            value: answer[idx],
        }),
        None => Ok(()),
    }
}

/// Check that `initdata` and a sorted `answer` hold the same multiset.
pub fn check_same_values(initdata: &[u32], answer: &[u32]) -> Result<(), VerifyError> {
    let mut sorted = initdata.to_vec();
    if sorted.len() > PARALLEL_THRESHOLD {
        sorted.par_sort_unstable();
    } else {
        sorted.sort_unstable();
    }
    match sorted.iter().zip(answer).position(|(a, b)| a != b) {
        Some(index) => Err(VerifyError::Mismatch {
            index,
            initdata: sorted[index],
            answer: answer[index],
        }),
        None => Ok(()),
    }
}

/// Verify a generated pair against `layout`, stopping at the first violation.
pub fn verify_files(
    layout: &Layout,
    initdata_path: &Path,
    answer_path: &Path,
    verbose: bool,
) -> Result<VerifyReport, VerifyError> {
    let initdata = load(initdata_path, layout.total())?;
    let answer = load(answer_path, layout.total())?;

    check_runs(layout, &initdata, initdata_path)?;
    check_sorted(&answer, answer_path)?;
    check_same_values(&initdata, &answer)?;

    if verbose {
        eprintln!(
            "{}: '{}' and '{}' OK: {} ways, {} elements",
            TOOL_NAME,
            initdata_path.display(),
            answer_path.display(),
            layout.way_count(),
            layout.total()
        );
    }

    Ok(VerifyReport {
        total: layout.total(),
        way_count: layout.way_count(),
    })
}
