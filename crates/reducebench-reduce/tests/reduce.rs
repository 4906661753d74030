use pretty_assertions::assert_eq;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use reducebench_reduce::{launch_reduce, reduce, ReduceConfig, ReduceError, ReduceKernels};
use reducebench_runtime::{config::GlobalConfig, ExecutionContext};

fn context() -> (ExecutionContext, ReduceKernels) {
    let mut config = GlobalConfig::default();
    config.device.workers = Some(4);

    let context = ExecutionContext::new(&config, ReduceKernels::program("reduce_test")).unwrap();
    let kernels = ReduceKernels::from_program(context.program()).unwrap();
    (context, kernels)
}

fn random_vector(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random::<f32>()).collect()
}

/// First-order error bound: `log2(G)` fold steps then `N / G` serial additions.
fn tolerance(input: &[f32], cube_dim: u32) -> f32 {
    let abs_sum: f64 = input.iter().map(|x| x.abs() as f64).sum();
    let depth = cube_dim.ilog2() as usize + input.len().div_ceil(cube_dim as usize) + 1;
    let bound = depth as f64 * f32::EPSILON as f64 * abs_sum;
    (bound as f32).max(f32::EPSILON)
}

fn assert_close(actual: f32, input: &[f32], cube_dim: u32) {
    let expected: f64 = input.iter().map(|x| *x as f64).sum();
    let tolerance = tolerance(input, cube_dim);

    assert!(
        (actual as f64 - expected).abs() <= tolerance as f64,
        "{actual} differs from {expected} by more than {tolerance}"
    );
}

#[test_log::test]
fn all_ones_sum_exactly() {
    let (context, kernels) = context();
    let input = vec![1.0f32; 1024];

    let config = ReduceConfig::generate(1024, 128, context.client().properties()).unwrap();
    assert_eq!(config.num_cubes(), 8);

    let result = reduce(context.client(), &kernels, &input, 128).unwrap();
    assert_eq!(result, 1024.0);
}

#[test_log::test]
fn opposite_halves_cancel_out() {
    let (context, kernels) = context();
    let mut input = vec![1.0f32; 128];
    input.extend(vec![-1.0f32; 128]);

    let result = reduce(context.client(), &kernels, &input, 128).unwrap();
    assert!(result.abs() <= f32::EPSILON, "{result} isn't zero");
}

#[test_log::test]
fn uneven_input_is_rejected_before_dispatch() {
    let (context, kernels) = context();
    let input = vec![1.0f32; 1000];

    let err = reduce(context.client(), &kernels, &input, 128).unwrap_err();
    assert_eq!(
        err,
        ReduceError::UnevenCubes {
            len: 1000,
            cube_dim: 128
        }
    );
    assert_eq!(context.client().memory_usage().unwrap().number_allocs, 0);
}

#[test_log::test]
fn random_inputs_match_the_serial_sum() {
    let (context, kernels) = context();

    for (len, cube_dim) in [(128, 128), (384, 128), (4096, 64), (65536, 256), (8, 1)] {
        let input = random_vector(len, len as u64);
        let result = reduce(context.client(), &kernels, &input, cube_dim).unwrap();

        assert_close(result, &input, cube_dim);
    }
}

#[test_log::test]
fn permutation_stays_within_tolerance() {
    let (context, kernels) = context();
    let mut input = random_vector(16384, 7);
    let mut rng = StdRng::seed_from_u64(11);

    let before = reduce(context.client(), &kernels, &input, 128).unwrap();
    input.shuffle(&mut rng);
    let after = reduce(context.client(), &kernels, &input, 128).unwrap();

    assert!((before - after).abs() <= tolerance(&input, 128));
}

#[test_log::test]
fn shared_partials_are_rejected() {
    let (context, kernels) = context();
    let client = context.client();
    let config = ReduceConfig::generate(256, 128, client.properties()).unwrap();
    let input = client.create_from_slice(&[1.0f32; 256]).unwrap();
    let partials = client.empty(config.partials_size()).unwrap();
    let alias = partials.clone();

    assert_eq!(
        launch_reduce(client, &kernels, &config, &input, &partials),
        Err(ReduceError::PartialsInUse)
    );

    drop(alias);
    launch_reduce(client, &kernels, &config, &input, &partials).unwrap();
    assert_eq!(client.read_one::<f32>(&partials, 0).unwrap(), 256.0);
}

#[test_log::test]
fn mismatched_buffers_are_rejected() {
    let (context, kernels) = context();
    let client = context.client();
    let config = ReduceConfig::generate(256, 128, client.properties()).unwrap();
    let input = client.create_from_slice(&[1.0f32; 128]).unwrap();
    let partials = client.empty(config.partials_size()).unwrap();

    assert_eq!(
        launch_reduce(client, &kernels, &config, &input, &partials),
        Err(ReduceError::BufferSize {
            name: "input",
            expected: 1024,
            actual: 512
        })
    );
}
