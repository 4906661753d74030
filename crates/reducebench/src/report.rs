use std::{io::Write, time::Duration};

use crate::harness::Measurement;

/// Width of the first column.
pub const NAME_WIDTH: usize = 19;
/// Width of every other column.
pub const COLUMN_WIDTH: usize = 20;

const COLUMNS: [&str; 7] = [
    "host",
    "device total",
    "device copy-in",
    "device kernel",
    "device copy-out",
    "host bandwidth",
    "device bandwidth",
];

const MISSING: &str = "-";

/// The column header row.
pub fn format_header() -> String {
    let mut line = format!("{:>NAME_WIDTH$}", "function");
    for column in COLUMNS {
        line.push_str(&format!("{column:>COLUMN_WIDTH$}"));
    }
    line
}

/// One row: five durations in microseconds then two bandwidths in GB/s.
pub fn format_row(measurement: &Measurement) -> String {
    let timings = &measurement.timings;
    let device = timings.device.as_ref();
    let durations = [
        Some(timings.host),
        device.map(|d| d.total),
        device.map(|d| d.copy_in),
        device.map(|d| d.kernel),
        device.map(|d| d.copy_out),
    ];
    let bandwidths = [
        Some(measurement.bandwidths.host),
        measurement.bandwidths.device,
    ];

    let mut line = format!("{:>NAME_WIDTH$}", measurement.primitive.name());
    for duration in durations {
        line.push_str(&format!("{:>COLUMN_WIDTH$}", format_duration(duration)));
    }
    for bandwidth in bandwidths {
        line.push_str(&format!("{:>COLUMN_WIDTH$}", format_bandwidth(bandwidth)));
    }
    line
}

fn format_duration(duration: Option<Duration>) -> String {
    match duration {
        Some(duration) => format!("{}us", duration.as_micros()),
        None => MISSING.to_string(),
    }
}

fn format_bandwidth(bandwidth: Option<f64>) -> String {
    match bandwidth {
        Some(bandwidth) => format!("{bandwidth:.3}GB/s"),
        None => MISSING.to_string(),
    }
}

/// Writes the header once, before the first row.
#[derive(Debug)]
pub struct ReportTable<W: Write> {
    out: W,
    header_written: bool,
}

impl<W: Write> ReportTable<W> {
    /// A table writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            header_written: false,
        }
    }

    /// Writes the header if it wasn't written yet.
    pub fn write_header(&mut self) -> std::io::Result<()> {
        if !self.header_written {
            writeln!(self.out, "{}", format_header())?;
            self.header_written = true;
        }
        Ok(())
    }

    /// Writes one row, preceded by the header for the first one.
    pub fn write_row(&mut self, measurement: &Measurement) -> std::io::Result<()> {
        self.write_header()?;
        writeln!(self.out, "{}", format_row(measurement))?;
        self.out.flush()
    }

    /// Gives the writer back.
    pub fn into_inner(self) -> W {
        self.out
    }
}
