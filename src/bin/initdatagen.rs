// initdatagen -- generate pre-sorted runs and their merged answer
//
// Usage: initdatagen [OPTION]... DATANUM_PER_WAY WAY_LOG
//        writes initdata.hex (2^WAY_LOG sorted runs) and answer.txt (all sorted)

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use initdatagen::TOOL_NAME;
use initdatagen::generate::{
    DEFAULT_ANSWER_NAME, DEFAULT_INITDATA_NAME, GenConfig, Layout, generate,
};
use initdatagen::verify::verify_files;

#[derive(Parser)]
#[command(
    name = "initdatagen",
    version,
    about = "Generate 2^WAY_LOG sorted runs and their fully sorted answer"
)]
struct Cli {
    /// Elements in each sorted run
    #[arg(value_name = "DATANUM_PER_WAY")]
    datanum_per_way: usize,

    /// Log2 of the number of runs (less than 32)
    #[arg(value_name = "WAY_LOG")]
    way_log: u32,

    /// Write (or check) the files in DIR instead of the current directory
    #[arg(short = 'C', long = "directory", value_name = "DIR", default_value = ".")]
    directory: PathBuf,

    /// Name of the per-run sorted file
    #[arg(long = "initdata", value_name = "FILE", default_value = DEFAULT_INITDATA_NAME)]
    initdata: PathBuf,

    /// Name of the fully sorted answer file
    #[arg(long = "answer", value_name = "FILE", default_value = DEFAULT_ANSWER_NAME)]
    answer: PathBuf,

    /// Seed the generator for reproducible output
    #[arg(long = "seed", value_name = "N")]
    seed: Option<u64>,

    /// Check existing files instead of generating them
    #[arg(short = 'c', long = "check")]
    check: bool,

    /// Change the number of sorts run concurrently to N
    #[arg(long = "parallel", value_name = "N")]
    parallel: Option<usize>,

    /// Print progress to stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn run(cli: &Cli, layout: Layout) -> anyhow::Result<()> {
    let initdata_path = cli.directory.join(&cli.initdata);
    let answer_path = cli.directory.join(&cli.answer);

    if cli.check {
        verify_files(&layout, &initdata_path, &answer_path, cli.verbose)
            .context("verification failed")?;
        return Ok(());
    }

    let config = GenConfig {
        layout,
        seed: cli.seed,
        initdata_path,
        answer_path,
        verbose: cli.verbose,
    };
    generate(&config).context("generation failed")?;
    Ok(())
}

/// Size the global rayon pool used by the run and answer sorts.
fn set_sort_threads(n: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n.max(1))
        .build_global()
}

fn main() {
    initdatagen::common::reset_sigpipe();
    let cli = Cli::parse();

    // Bad layouts are usage errors (exit 2), same as unparsable arguments
    let layout = match Layout::new(cli.datanum_per_way, cli.way_log) {
        Ok(layout) => layout,
        Err(e) => Cli::command()
            .error(ErrorKind::ValueValidation, e)
            .exit(),
    };

    if let Some(n) = cli.parallel {
        if let Err(e) = set_sort_threads(n) {
            // Sorting still runs on the default pool
            if cli.verbose {
                eprintln!("{}: cannot set {} sort threads: {}", TOOL_NAME, n, e);
            }
        }
    }

    if let Err(e) = run(&cli, layout) {
        eprintln!("{}: {:#}", TOOL_NAME, e);
        process::exit(1);
    }
}
