//! Dataset generation: random fill, per-run sort, global sort, hex output.
//!
//! The dataset is one flat `Vec<i32>` of `datanum_per_way << way_log`
//! elements. Runs are the contiguous `datanum_per_way`-sized chunks.

use std::io::{self, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::TOOL_NAME;
use crate::common::io::create_output;
use crate::common::io_error_msg;
use crate::hexfmt::{LINE_LEN, write_elements};

/// One dataset value.
pub type Element = i32;

/// Largest value the generator produces (`0x7fffffff`).
pub const ELEMENT_MAX: Element = i32::MAX;

/// Run-count shifts at or above this are rejected (32-bit shift guard).
pub const MAX_WAY_LOG: u32 = 32;

/// Largest element count whose encoded file and in-memory dataset both
/// stay within `isize::MAX` bytes.
pub const MAX_TOTAL: usize = isize::MAX as usize / LINE_LEN;

/// Slices longer than this are sorted on the rayon pool.
const PARALLEL_THRESHOLD: usize = 10_000;

pub const DEFAULT_INITDATA_NAME: &str = "initdata.hex";
pub const DEFAULT_ANSWER_NAME: &str = "answer.txt";

/// Errors from building a layout or writing the dataset files.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("way log {0} is too large (must be at most 31)")]
    WayLogTooLarge(u32),

    #[error("{per_way} elements per way times {way_count} ways overflows")]
    TooManyElements { per_way: usize, way_count: usize },

    #[error("cannot allocate {total} elements")]
    OutOfMemory { total: usize },

    #[error("cannot write '{}': {}", .path.display(), io_error_msg(.source))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GenError {
    /// True for errors caused by the requested layout rather than I/O.
    pub fn is_layout(&self) -> bool {
        matches!(
            self,
            GenError::WayLogTooLarge(_) | GenError::TooManyElements { .. }
        )
    }
}

/// Validated dataset shape: `way_count = 2^way_log` runs of `per_way` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    per_way: usize,
    way_log: u32,
    way_count: usize,
    total: usize,
}

impl Layout {
    pub fn new(per_way: usize, way_log: u32) -> Result<Self, GenError> {
        if way_log >= MAX_WAY_LOG {
            return Err(GenError::WayLogTooLarge(way_log));
        }
        let way_count = 1usize
            .checked_shl(way_log)
            .ok_or(GenError::WayLogTooLarge(way_log))?;
        let total = per_way
            .checked_mul(way_count)
            .filter(|&total| total <= MAX_TOTAL)
            .ok_or(GenError::TooManyElements { per_way, way_count })?;
        Ok(Layout {
            per_way,
            way_log,
            way_count,
            total,
        })
    }

    #[inline]
    pub fn per_way(&self) -> usize {
        self.per_way
    }

    #[inline]
    pub fn way_log(&self) -> u32 {
        self.way_log
    }

    #[inline]
    pub fn way_count(&self) -> usize {
        self.way_count
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Element index range of run `i`.
    #[inline]
    pub fn run_range(&self, i: usize) -> Range<usize> {
        i * self.per_way..(i + 1) * self.per_way
    }
}

/// Configuration for one generation pass.
#[derive(Debug, Clone)]
pub struct GenConfig {
    pub layout: Layout,
    /// Fixed seed for reproducible output; None draws one from OS entropy.
    pub seed: Option<u64>,
    pub initdata_path: PathBuf,
    pub answer_path: PathBuf,
    pub verbose: bool,
}

impl GenConfig {
    /// Default file names in `dir`, entropy seed, quiet.
    pub fn new(layout: Layout, dir: &Path) -> Self {
        GenConfig {
            layout,
            seed: None,
            initdata_path: dir.join(DEFAULT_INITDATA_NAME),
            answer_path: dir.join(DEFAULT_ANSWER_NAME),
            verbose: false,
        }
    }
}

/// What a generation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenSummary {
    pub seed: u64,
    pub total: usize,
    pub way_count: usize,
}

/// Resolve the seed: the given one, or a fresh one from OS entropy.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}

/// Fill `total` elements uniformly from `[0, ELEMENT_MAX]`.
///
/// Always sequential so that a seed maps to one dataset regardless
/// of how many sorting threads are in use.
pub fn fill_random(rng: &mut StdRng, total: usize) -> Result<Vec<Element>, GenError> {
    let mut data = Vec::new();
    data.try_reserve_exact(total)
        .map_err(|_| GenError::OutOfMemory { total })?;
    let dist = Uniform::new_inclusive(0, ELEMENT_MAX);
    data.extend(dist.sample_iter(rng).take(total));
    Ok(data)
}

/// Sort each `per_way`-sized run ascending, in place. Run order is kept.
pub fn sort_runs(data: &mut [Element], per_way: usize) {
    // chunks_mut(0) panics; zero-width runs are trivially sorted
    if per_way == 0 {
        return;
    }
    if data.len() <= PARALLEL_THRESHOLD {
        for run in data.chunks_mut(per_way) {
            run.sort_unstable();
        }
    } else if per_way >= data.len() {
        data.par_sort_unstable();
    } else {
        data.par_chunks_mut(per_way).for_each(|run| run.sort_unstable());
    }
}

/// Sort the whole dataset ascending, discarding the run partition.
pub fn sort_all(data: &mut [Element]) {
    if data.len() > PARALLEL_THRESHOLD {
        data.par_sort_unstable();
    } else {
        data.sort_unstable();
    }
}

/// Build the two datasets in memory: (per-run sorted, globally sorted).
pub fn generate_in_memory(
    layout: &Layout,
    seed: u64,
) -> Result<(Vec<Element>, Vec<Element>), GenError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = fill_random(&mut rng, layout.total())?;
    sort_runs(&mut data, layout.per_way());
    let runs = data.clone();
    sort_all(&mut data);
    Ok((runs, data))
}

/// Create `path`, write the elements, flush and close it.
fn write_file(path: &Path, data: &[Element]) -> Result<(), GenError> {
    let to_err = |source: io::Error| GenError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut out = create_output(path).map_err(to_err)?;
    write_elements(&mut out, data).map_err(to_err)?;
    out.flush().map_err(to_err)?;
    Ok(())
}

/// Generate the dataset and write the initial-data and answer files.
///
/// The initial-data file is fully written and closed before the global
/// sort starts; the answer file is opened only after that.
pub fn generate(config: &GenConfig) -> Result<GenSummary, GenError> {
    let layout = &config.layout;
    let seed = resolve_seed(config.seed);

    if config.verbose {
        eprintln!(
            "{}: {} ways x {} elements = {} elements (seed {})",
            TOOL_NAME,
            layout.way_count(),
            layout.per_way(),
            layout.total(),
            seed
        );
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = fill_random(&mut rng, layout.total())?;

    sort_runs(&mut data, layout.per_way());
    write_file(&config.initdata_path, &data)?;
    if config.verbose {
        eprintln!(
            "{}: wrote {} sorted runs to '{}'",
            TOOL_NAME,
            layout.way_count(),
            config.initdata_path.display()
        );
    }

    sort_all(&mut data);
    write_file(&config.answer_path, &data)?;
    if config.verbose {
        eprintln!(
            "{}: wrote sorted answer to '{}'",
            TOOL_NAME,
            config.answer_path.display()
        );
    }

    Ok(GenSummary {
        seed,
        total: layout.total(),
        way_count: layout.way_count(),
    })
}
