use rand::{rngs::StdRng, Rng, SeedableRng};

/// Host reference for the benchmarked primitives.
pub trait Oracle {
    /// A fresh vector of `size` random values.
    fn random_vector(&mut self, size: usize) -> Vec<f32>;

    /// The sum of every element.
    fn reduce(&self, input: &[f32]) -> f32;

    /// Replaces every element by the sum of the elements up to and including it.
    fn scan_inclusive(&self, values: &mut [f32]);
}

/// Serial host implementation drawing uniform values in `[0, 1)`.
#[derive(Debug)]
pub struct HostOracle {
    rng: StdRng,
}

impl HostOracle {
    /// An oracle seeded with `seed`, or from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self { rng }
    }
}

impl Oracle for HostOracle {
    fn random_vector(&mut self, size: usize) -> Vec<f32> {
        (0..size).map(|_| self.rng.random::<f32>()).collect()
    }

    fn reduce(&self, input: &[f32]) -> f32 {
        input.iter().map(|x| *x as f64).sum::<f64>() as f32
    }

    fn scan_inclusive(&self, values: &mut [f32]) {
        let mut sum = 0.0;
        for value in values.iter_mut() {
            sum += *value;
            *value = sum;
        }
    }
}
