use core::{fmt::Display, time::Duration};
use hashbrown::HashMap;

/// Amount of profiling information emitted by the server.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProfileLevel {
    /// Only the summary table, at every flush.
    Basic,
    /// Every kernel execution, then the summary table at every flush.
    Full,
}

/// Kernel execution times accumulated between two flushes.
#[derive(Debug, Default)]
pub(crate) struct Profiled {
    kernels: HashMap<String, KernelStats>,
}

#[derive(Debug, Default, Clone, Copy)]
struct KernelStats {
    launches: u32,
    total: Duration,
}

impl Profiled {
    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    pub fn update(&mut self, kernel: &str, duration: Duration) {
        let stats = self.kernels.entry_ref(kernel).or_default();
        stats.launches += 1;
        stats.total += duration;
    }

    #[cfg(test)]
    fn launches(&self, kernel: &str) -> u32 {
        self.kernels.get(kernel).map_or(0, |stats| stats.launches)
    }
}

const HEADER: [&str; 4] = ["Kernel", "Duration", "Launches", "Ratio"];

fn ratio(part: Duration, total: Duration) -> String {
    match total.as_nanos() {
        0 => "0 %".to_string(),
        total => format!("{} %", 100 * part.as_nanos() / total),
    }
}

/// Slowest kernels first, followed by a total row.
impl Display for Profiled {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut kernels = self.kernels.iter().collect::<Vec<_>>();
        kernels.sort_by(|(a_name, a), (b_name, b)| {
            b.total.cmp(&a.total).then(a_name.cmp(b_name))
        });

        let total = kernels.iter().map(|(_, stats)| stats.total).sum::<Duration>();
        let launches = kernels.iter().map(|(_, stats)| stats.launches).sum::<u32>();

        let rows = kernels
            .iter()
            .map(|(name, stats)| {
                [
                    name.to_string(),
                    format!("{:?}", stats.total),
                    stats.launches.to_string(),
                    ratio(stats.total, total),
                ]
            })
            .collect::<Vec<_>>();
        let total_row = [
            "Total".to_string(),
            format!("{total:?}"),
            launches.to_string(),
            "100 %".to_string(),
        ];

        let mut widths = HEADER.map(str::len);
        for row in rows.iter().chain(core::iter::once(&total_row)) {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let rule_len = widths.iter().sum::<usize>() + 3 * widths.len() - 1;
        let rule = format!("|{}|", "-".repeat(rule_len));
        let write_row = |f: &mut core::fmt::Formatter<'_>, cells: &[String; 4]| {
            write!(f, "|")?;
            for (cell, width) in cells.iter().zip(widths) {
                write!(f, " {cell:<width$} |")?;
            }
            writeln!(f)
        };

        writeln!(f, "{rule}")?;
        write_row(f, &HEADER.map(String::from))?;
        writeln!(f, "{rule}")?;
        for row in rows.iter() {
            write_row(f, row)?;
        }
        writeln!(f, "{rule}")?;
        write_row(f, &total_row)?;
        writeln!(f, "{rule}")
    }
}
