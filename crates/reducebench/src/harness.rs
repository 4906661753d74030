use std::time::{Duration, Instant};

use reducebench_reduce::{launch_reduce, ReduceConfig, ReduceKernels};
use reducebench_runtime::ExecutionContext;

use crate::{
    config::{BenchConfig, Primitive, ToleranceConfig},
    error::BenchError,
    oracle::Oracle,
};

const ELEM_SIZE: usize = core::mem::size_of::<f32>();

/// Durations of the device phases. Copy-in, kernel and copy-out add up to the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevicePhases {
    /// From the end of the host phase to the end of the copy-out.
    pub total: Duration,
    /// Buffer allocation and transfer of the input.
    pub copy_in: Duration,
    /// Every dispatch of the primitive.
    pub kernel: Duration,
    /// Transfer of the result back to the host.
    pub copy_out: Duration,
}

/// The timing sample of one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimings {
    /// The host reference computation.
    pub host: Duration,
    /// The device phases, absent for host-only primitives.
    pub device: Option<DevicePhases>,
}

impl PhaseTimings {
    /// Derives the phases from five consecutive timestamps.
    pub fn from_timestamps([t0, t1, t2, t3, t4]: [Instant; 5]) -> Self {
        Self {
            host: t1 - t0,
            device: Some(DevicePhases {
                total: t4 - t1,
                copy_in: t2 - t1,
                kernel: t3 - t2,
                copy_out: t4 - t3,
            }),
        }
    }

    /// Timings of a primitive only measured on the host.
    pub fn host_only(t0: Instant, t1: Instant) -> Self {
        Self {
            host: t1 - t0,
            device: None,
        }
    }
}

/// Effective bandwidths in GB/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bandwidths {
    /// Over the host phase.
    pub host: f64,
    /// Over the kernel phase.
    pub device: Option<f64>,
}

/// Everything the report needs about one measured primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// The measured primitive.
    pub primitive: Primitive,
    /// Number of input elements.
    pub size: usize,
    /// Phase durations.
    pub timings: PhaseTimings,
    /// Bandwidths derived from the durations.
    pub bandwidths: Bandwidths,
}

/// Knobs of a measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureOptions {
    /// Units per cube of the reduction.
    pub cube_dim: u32,
    /// Accepted difference between the device result and the reference.
    pub tolerance: ToleranceConfig,
}

impl From<&BenchConfig> for MeasureOptions {
    fn from(config: &BenchConfig) -> Self {
        Self {
            cube_dim: config.cube_dim,
            tolerance: config.tolerance,
        }
    }
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self::from(&BenchConfig::default())
    }
}

/// Bandwidth in GB/s of an interval moving three `f32` per element, by convention.
///
/// The interval is truncated to whole microseconds, an empty one gives 0.
pub fn bandwidth(n: usize, elapsed: Duration) -> f64 {
    let micros = elapsed.as_micros();
    if micros == 0 {
        return 0.0;
    }

    let bytes = (3 * n * ELEM_SIZE) as f64;
    (bytes * 1e-9) / (micros as f64 * 1e-6)
}

/// Runs one measurement cycle of `primitive` over `size` elements.
pub fn measure<O: Oracle>(
    primitive: Primitive,
    size: usize,
    context: &ExecutionContext,
    oracle: &mut O,
    options: &MeasureOptions,
) -> Result<Measurement, BenchError> {
    match primitive {
        Primitive::Reduce => measure_reduce(size, context, oracle, options),
        Primitive::ScanInclusive => Ok(measure_scan_inclusive(size, oracle)),
    }
}

/// Measures the reduction on the host and on the device, and validates the device result.
pub fn measure_reduce<O: Oracle>(
    size: usize,
    context: &ExecutionContext,
    oracle: &mut O,
    options: &MeasureOptions,
) -> Result<Measurement, BenchError> {
    let client = context.client();
    let config = ReduceConfig::generate(size, options.cube_dim, client.properties())?;
    let kernels = ReduceKernels::from_program(context.program())?;
    let input = oracle.random_vector(size);

    client.flush()?;

    let t0 = Instant::now();
    let expected = oracle.reduce(&input);
    let t1 = Instant::now();

    let d_input = client.create_from_slice(&input)?;
    let d_partials = client.empty(config.partials_size())?;
    client.flush()?;
    let t2 = Instant::now();

    launch_reduce(client, &kernels, &config, &d_input, &d_partials)?;
    client.flush()?;
    let t3 = Instant::now();

    let result = client.read_one::<f32>(&d_partials, 0)?;
    let t4 = Instant::now();

    let tolerance = options.tolerance.bound(&input, options.cube_dim);
    log::debug!("reduce: {result} (expected {expected}, tolerance {tolerance})");

    // NaN results fail the check.
    if !((result - expected).abs() <= tolerance) {
        return Err(BenchError::Validation {
            primitive: Primitive::Reduce,
            result,
            expected,
            tolerance,
        });
    }

    Ok(Measurement {
        primitive: Primitive::Reduce,
        size,
        timings: PhaseTimings::from_timestamps([t0, t1, t2, t3, t4]),
        bandwidths: Bandwidths {
            host: bandwidth(size, t1 - t0),
            device: Some(bandwidth(size, t3 - t2)),
        },
    })
}

/// Measures the host inclusive scan. No device path exists.
pub fn measure_scan_inclusive<O: Oracle>(size: usize, oracle: &mut O) -> Measurement {
    let mut values = oracle.random_vector(size);

    let t0 = Instant::now();
    oracle.scan_inclusive(&mut values);
    let t1 = Instant::now();

    Measurement {
        primitive: Primitive::ScanInclusive,
        size,
        timings: PhaseTimings::host_only(t0, t1),
        bandwidths: Bandwidths {
            host: bandwidth(size, t1 - t0),
            device: None,
        },
    }
}
