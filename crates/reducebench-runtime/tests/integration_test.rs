mod dummy;

use std::sync::Arc;

use dummy::*;
use pretty_assertions::assert_eq;
use reducebench_runtime::{
    client::ComputeClient,
    config::{compilation::CompilationLogLevel, GlobalConfig},
    kernel::{CubeCount, CubeDim, KernelHandle},
    platform::{DeviceProperties, Platform},
    program::Program,
    ExecutionContext, RuntimeError, StatusCode,
};

#[test_log::test]
fn created_resource_is_the_same_when_read() {
    let client = test_client();
    let resource = [0.5f32, 1.0, 2.0];
    let handle = client.create_from_slice(&resource).unwrap();

    assert_eq!(client.read_values::<f32>(&handle).unwrap(), resource.to_vec());
    assert_eq!(client.read_one::<f32>(&handle, 2).unwrap(), 2.0);
}

#[test_log::test]
fn empty_allocates_zeroed_memory() {
    let client = test_client();
    let handle = client.empty(16).unwrap();

    assert_eq!(client.read(&handle).unwrap(), vec![0u8; 16]);
}

#[test_log::test]
fn execute_elementwise_addition() {
    let client = test_client();
    let lhs = client.create_from_slice(&[0.0f32, 1.0, 2.0]).unwrap();
    let rhs = client.create_from_slice(&[4.0f32, 4.0, 4.0]).unwrap();
    let out = client.empty(12).unwrap();
    let kernel: KernelHandle = Arc::new(DummyElementwiseAddition);

    client
        .launch(
            &kernel,
            CubeCount::new_1d(2),
            CubeDim::new_1d(2),
            &[&lhs, &rhs, &out],
        )
        .unwrap();

    assert_eq!(client.read_values::<f32>(&out).unwrap(), vec![4.0, 5.0, 6.0]);
}

#[test_log::test]
fn shared_memory_is_synchronized_within_cubes() {
    let client = test_client();
    let input = client
        .create_from_slice(&(0..8).map(|i| i as f32).collect::<Vec<_>>())
        .unwrap();
    let out = client.empty(32).unwrap();
    let kernel: KernelHandle = Arc::new(DummyCubeReverse);

    client
        .launch(&kernel, CubeCount::new_1d(2), CubeDim::new_1d(4), &[&input, &out])
        .unwrap();

    assert_eq!(
        client.read_values::<f32>(&out).unwrap(),
        vec![3.0, 2.0, 1.0, 0.0, 7.0, 6.0, 5.0, 4.0]
    );
}

#[test_log::test]
fn invalid_launches_are_rejected_at_enqueue() {
    let client = test_client();
    let lhs = client.create_from_slice(&[1.0f32; 4]).unwrap();
    let kernel: KernelHandle = Arc::new(DummyElementwiseAddition);

    let err = client
        .launch(&kernel, CubeCount::new_single(), CubeDim::new_1d(4), &[&lhs])
        .unwrap_err();
    assert_eq!(err.operation, "enqueueNDRangeKernel");
    assert_eq!(err.status, StatusCode::InvalidKernelArgs);

    let err = client
        .launch(
            &kernel,
            CubeCount::new_single(),
            CubeDim::new_1d(4096),
            &[&lhs, &lhs, &lhs],
        )
        .unwrap_err();
    assert_eq!(err.status, StatusCode::InvalidWorkGroupSize);

    // Rejected launches never reach the queue.
    client.flush().unwrap();
}

#[test_log::test]
fn kernel_fault_is_deferred_to_flush() {
    let client = test_client();
    let buffer = client.empty(16).unwrap();
    let kernel: KernelHandle = Arc::new(DummyOutOfBounds);

    client
        .launch(&kernel, CubeCount::new_single(), CubeDim::new_1d(2), &[&buffer])
        .unwrap();

    let err = client.flush().unwrap_err();
    assert_eq!(err.status, StatusCode::OutOfResources);
    assert_eq!(err.status.code(), -5);
    client.flush().unwrap();
}

#[test_log::test]
fn allocation_errors_carry_status_codes() {
    let properties = DeviceProperties {
        global_memory_size: 64,
        num_workers: 1,
        ..Default::default()
    };
    let server = reducebench_runtime::server::CpuServer::new(
        &properties,
        reducebench_runtime::logging::ServerLogger::disabled(),
    );
    let client = ComputeClient::new(server, properties).unwrap();

    let err = client.empty(0).unwrap_err();
    assert_eq!(err.operation, "createBuffer");
    assert_eq!(err.status, StatusCode::InvalidBufferSize);

    let err = client.create(&[0u8; 128]).unwrap_err();
    assert_eq!(err.operation, "enqueueWriteBuffer");
    assert_eq!(err.status, StatusCode::MemObjectAllocationFailure);

    let held = client.empty(64).unwrap();
    assert_eq!(client.memory_usage().unwrap().bytes_in_use, 64);
    drop(held);
    assert!(client.empty(64).is_ok());
}

#[test_log::test]
fn dummy_server_records_launches_in_order() {
    let server = DummyServer::default();
    let launched = server.launched();
    let client = ComputeClient::new(server, DeviceProperties::default()).unwrap();
    let buffer = client.empty(4).unwrap();
    let first: KernelHandle = Arc::new(DummyOutOfBounds);
    let second: KernelHandle = Arc::new(DummyCubeReverse);

    client
        .launch(&first, CubeCount::new_single(), CubeDim::new_single(), &[&buffer])
        .unwrap();
    client
        .launch(
            &second,
            CubeCount::new_single(),
            CubeDim::new_single(),
            &[&buffer, &buffer],
        )
        .unwrap();
    client.flush().unwrap();

    assert_eq!(
        *launched.lock().unwrap(),
        vec!["out_of_bounds".to_string(), "cube_reverse".to_string()]
    );
}

#[test_log::test]
fn injected_failures_reach_the_client() {
    let client =
        ComputeClient::new(DummyServer::failing(Failure::Allocation), DeviceProperties::default())
            .unwrap();
    assert_eq!(
        client.empty(4).unwrap_err().status,
        StatusCode::MemObjectAllocationFailure
    );

    let client =
        ComputeClient::new(DummyServer::failing(Failure::Execution), DeviceProperties::default())
            .unwrap();
    let buffer = client.empty(4).unwrap();
    let kernel: KernelHandle = Arc::new(DummyOutOfBounds);
    client
        .launch(&kernel, CubeCount::new_single(), CubeDim::new_single(), &[&buffer])
        .unwrap();
    let err = client.read(&buffer).unwrap_err();
    assert_eq!(err.status, StatusCode::OutOfResources);
}

#[test_log::test]
fn crashed_server_is_not_available() {
    let client =
        ComputeClient::new(DummyServer::failing(Failure::Crash), DeviceProperties::default())
            .unwrap();
    let buffer = client.empty(4).unwrap();
    let kernel: KernelHandle = Arc::new(DummyOutOfBounds);

    // The launch itself may race the crash, the flush can't.
    let _ = client.launch(&kernel, CubeCount::new_single(), CubeDim::new_single(), &[&buffer]);
    let err = client.flush().unwrap_err();

    assert_eq!(err.operation, "flush");
    assert_eq!(err.status, StatusCode::DeviceNotAvailable);
}

#[test_log::test]
fn context_builds_program_for_host_device() {
    let mut config = GlobalConfig::default();
    config.device.workers = Some(2);
    config.compilation.logger.level = CompilationLogLevel::Full;
    let program = Program::new("test").with_kernel(DummyElementwiseAddition);

    let context = ExecutionContext::new(&config, program).unwrap();

    assert_eq!(context.platform().name, "host");
    assert_eq!(context.device().properties.num_workers, 2);
    assert_eq!(context.program().logs().len(), 1);

    let kernel = context.program().kernel("elementwise_addition").unwrap();
    let client = context.client();
    let lhs = client.create_from_slice(&[1.0f32, 2.0]).unwrap();
    let out = client.empty(8).unwrap();
    client
        .launch(&kernel, CubeCount::new_single(), CubeDim::new_1d(2), &[&lhs, &lhs, &out])
        .unwrap();

    assert_eq!(client.read_values::<f32>(&out).unwrap(), vec![2.0, 4.0]);
}

#[test_log::test]
fn context_reports_build_failures() {
    let program = Program::new("broken")
        .with_kernel(DummyOutOfBounds)
        .with_kernel(DummyOutOfBounds);

    match ExecutionContext::new(&GlobalConfig::default(), program) {
        Err(RuntimeError::Compilation(err)) => {
            assert_eq!(err.program, "broken");
            assert!(err.logs[0].log.contains("defined twice"));
        }
        other => panic!("expected a build failure, got {other:?}"),
    }
}

#[test_log::test]
fn context_reports_missing_platform() {
    let mut config = GlobalConfig::default();
    config.device.platform = Some("opencl".into());
    let program = Program::new("test").with_kernel(DummyOutOfBounds);

    assert!(matches!(
        ExecutionContext::new(&config, program),
        Err(RuntimeError::PlatformUnavailable { .. })
    ));
    assert_eq!(Platform::list(&config.device).len(), 1);
}

#[test_log::test]
#[serial_test::serial]
fn debug_log_env_enables_loggers() {
    std::env::set_var("REDUCEBENCH_DEBUG_LOG", "stderr");
    let config = GlobalConfig::load();
    std::env::remove_var("REDUCEBENCH_DEBUG_LOG");

    let config = config.unwrap();
    assert_eq!(config.compilation.logger.level, CompilationLogLevel::Full);
    assert!(config.compilation.logger.stderr);
}
