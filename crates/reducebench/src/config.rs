use core::fmt::Display;

use reducebench_reduce::DEFAULT_CUBE_DIM;
use reducebench_runtime::config::{load_from_current_dir, ConfigError, GlobalConfig};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the input size.
pub const SIZE_ENV: &str = "REDUCEBENCH_SIZE";

/// Input size used when none is configured.
pub const DEFAULT_SIZE: usize = 10 * 1024 * 1024;

/// Everything read from `reducebench.toml`: the runtime sections and the `[bench]` section.
#[derive(Default, Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    /// Runtime configuration.
    #[serde(flatten)]
    pub runtime: GlobalConfig,

    /// Benchmark configuration.
    #[serde(default)]
    pub bench: BenchConfig,
}

impl Settings {
    /// Loads the settings from the current directory or its parents, then applies the environment
    /// overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = load_from_current_dir::<Self>()?;
        settings.runtime = settings.runtime.override_from_env();

        if let Ok(value) = std::env::var(SIZE_ENV) {
            settings.bench.size = parse_size(&value)?;
        }

        Ok(settings)
    }
}

fn parse_size(value: &str) -> Result<usize, ConfigError> {
    let invalid = |reason: String| ConfigError::Env {
        name: SIZE_ENV,
        value: value.to_string(),
        reason,
    };

    match value.trim().parse::<usize>() {
        Ok(0) => Err(invalid("the size must be positive".into())),
        Ok(size) => Ok(size),
        Err(err) => Err(invalid(err.to_string())),
    }
}

/// The `[bench]` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Number of elements of every input vector.
    pub size: usize,
    /// Units per cube of the reduction.
    pub cube_dim: u32,
    /// Seed of the input generator, OS entropy when unset.
    pub seed: Option<u64>,
    /// Primitives measured, in order.
    pub primitives: Vec<Primitive>,
    /// Accepted difference between the device result and the reference.
    pub tolerance: ToleranceConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            cube_dim: DEFAULT_CUBE_DIM,
            seed: None,
            primitives: vec![Primitive::Reduce, Primitive::ScanInclusive],
            tolerance: ToleranceConfig::default(),
        }
    }
}

/// A benchmarked primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    /// Sum of every element, on the host and on the device.
    #[serde(rename = "reduce")]
    Reduce,
    /// Inclusive prefix sum, on the host only.
    #[serde(rename = "scan-inclusive")]
    ScanInclusive,
}

impl Primitive {
    /// Name of the primitive as printed in reports.
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Reduce => "reduce",
            Primitive::ScanInclusive => "scan-inclusive",
        }
    }
}

impl Display for Primitive {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// How far the device result may be from the reference.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ToleranceConfig {
    /// `factor * depth * EPSILON * sum(|x|)`, at least `EPSILON`.
    ///
    /// `depth` counts the roundings a single element goes through: the `log2(G)` steps of the
    /// tree fold, the `N / G` additions of the serial combine and the final rounding of the
    /// reference.
    Relative {
        /// Scale of the first-order error bound.
        factor: f64,
    },
    /// A fixed bound.
    Absolute {
        /// The bound.
        value: f64,
    },
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self::Relative { factor: 1.0 }
    }
}

impl ToleranceConfig {
    /// The bound for a reduction of `input` in cubes of `cube_dim` units.
    pub fn bound(&self, input: &[f32], cube_dim: u32) -> f32 {
        let epsilon = f32::EPSILON as f64;

        match self {
            ToleranceConfig::Relative { factor } => {
                let abs_sum: f64 = input.iter().map(|x| x.abs() as f64).sum();
                let bound = factor * error_depth(input.len(), cube_dim) * epsilon * abs_sum;
                bound.max(epsilon) as f32
            }
            ToleranceConfig::Absolute { value } => *value as f32,
        }
    }
}

/// Number of roundings along the longest accumulation chain of a two-level reduction.
pub fn error_depth(len: usize, cube_dim: u32) -> f64 {
    let cube_dim = cube_dim.max(1) as usize;
    let fold_steps = cube_dim.ilog2() as usize;
    let partials = len.div_ceil(cube_dim);

    (fold_steps + partials + 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{HostOracle, Oracle};
    use pretty_assertions::assert_eq;

    #[test]
    fn bench_section_is_optional() {
        let settings: Settings = toml::from_str(
            r#"
            [device]
            workers = 2
            "#,
        )
        .unwrap();

        assert_eq!(settings.runtime.device.workers, Some(2));
        assert_eq!(settings.bench, BenchConfig::default());
    }

    #[test]
    fn parses_bench_section() {
        let settings: Settings = toml::from_str(
            r#"
            [bench]
            size = 4096
            cube_dim = 64
            seed = 3
            primitives = ["reduce"]

            [bench.tolerance]
            kind = "absolute"
            value = 1000.0
            "#,
        )
        .unwrap();

        assert_eq!(
            settings.bench,
            BenchConfig {
                size: 4096,
                cube_dim: 64,
                seed: Some(3),
                primitives: vec![Primitive::Reduce],
                tolerance: ToleranceConfig::Absolute { value: 1000.0 },
            }
        );
    }

    #[test]
    fn relative_tolerance_follows_the_reduction_depth() {
        let tolerance = ToleranceConfig::default();
        let input = vec![1.0f32; 1024];
        // 7 fold steps, 8 partials and the final rounding.
        let expected = (16.0 * f32::EPSILON as f64 * 1024.0) as f32;

        assert_eq!(error_depth(1024, 128), 16.0);
        assert_eq!(tolerance.bound(&input, 128), expected);
        assert_eq!(tolerance.bound(&[0.0; 4], 128), f32::EPSILON);
    }

    #[test]
    fn default_tolerance_rejects_dropped_cubes_at_default_size() {
        let input = HostOracle::new(Some(1)).random_vector(DEFAULT_SIZE);
        let expected = HostOracle::new(None).reduce(&input);
        let bound = ToleranceConfig::default().bound(&input, DEFAULT_CUBE_DIM);

        assert!(bound < expected / 50.0, "bound {bound} for a sum of {expected}");

        let cube_dim = DEFAULT_CUBE_DIM as usize;
        let num_cubes = DEFAULT_SIZE / cube_dim;
        let without_last_cubes = |dropped: usize| {
            let kept = (num_cubes - dropped) * cube_dim;
            HostOracle::new(None).reduce(&input[..kept])
        };

        let wrong_results = [
            0.0,
            without_last_cubes(num_cubes / 4),
            without_last_cubes(num_cubes / 64),
        ];
        for wrong in wrong_results {
            assert!((wrong - expected).abs() > bound, "{wrong} accepted for {expected}");
        }
    }

    #[test]
    fn size_override_must_be_positive() {
        assert_eq!(parse_size(" 2048 ").unwrap(), 2048);
        assert!(matches!(parse_size("0"), Err(ConfigError::Env { .. })));
        assert!(matches!(parse_size("ten"), Err(ConfigError::Env { .. })));
    }
}
