//! Benchmark of a two-level parallel reduction.
//!
//! Every primitive is run once on the host reference and, when a device path exists, on the
//! device. Each run reports five phase durations and two bandwidths as one row of a fixed-width
//! table.

pub mod config;
pub mod error;
pub mod harness;
pub mod oracle;
pub mod report;

use std::io::Write;

use reducebench_reduce::ReduceKernels;
use reducebench_runtime::ExecutionContext;

use crate::{
    config::Settings,
    error::BenchError,
    harness::{measure, MeasureOptions},
    oracle::Oracle,
    report::ReportTable,
};

/// Name of the program holding the benchmarked kernels.
pub const PROGRAM_NAME: &str = "reducebench";

/// Establishes the execution context described by `settings`, with the reduction kernels built.
pub fn create_context(settings: &Settings) -> Result<ExecutionContext, BenchError> {
    let program = ReduceKernels::program(PROGRAM_NAME);
    Ok(ExecutionContext::new(&settings.runtime, program)?)
}

/// Measures every configured primitive in order and writes the report to `out`.
///
/// Stops at the first failure.
pub fn run<O: Oracle, W: Write>(
    settings: &Settings,
    context: &ExecutionContext,
    oracle: &mut O,
    out: W,
) -> Result<(), BenchError> {
    let options = MeasureOptions::from(&settings.bench);
    let mut table = ReportTable::new(out);
    table.write_header()?;

    for primitive in settings.bench.primitives.iter() {
        let measurement = measure(*primitive, settings.bench.size, context, oracle, &options)?;
        table.write_row(&measurement)?;
    }

    Ok(())
}
