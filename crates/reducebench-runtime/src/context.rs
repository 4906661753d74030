use crate::{
    client::ComputeClient,
    config::GlobalConfig,
    error::RuntimeError,
    logging::ServerLogger,
    platform::{Device, Platform},
    program::{CompiledProgram, Program},
    server::{ComputeServer, CpuServer},
};

/// Everything needed to run kernels: the selected platform and device, a program built for them,
/// and a client to the device's command queue.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    platform: Platform,
    device: Device,
    program: CompiledProgram,
    client: ComputeClient,
}

impl ExecutionContext {
    /// Selects a platform and its first device, builds `program` for the platform and starts the
    /// command queue.
    pub fn new(config: &GlobalConfig, program: Program) -> Result<Self, RuntimeError> {
        let platform = Platform::select(&config.device)?;
        log::info!("Platform name: {}", platform.name);

        let device = platform
            .default_device()
            .cloned()
            .ok_or_else(|| RuntimeError::PlatformUnavailable {
                requested: config.device.platform.clone(),
                available: vec![platform.name.clone()],
            })?;
        log::info!("Device name: {}", device.name);

        let mut logger = ServerLogger::new(config);
        let program = program.build(&platform.devices)?;
        for log in program.logs() {
            logger.log_compilation(format!("[{}] {}", log.device, log.log));
        }

        let server = CpuServer::new(&device.properties, logger);
        Self::from_parts(platform, device, program, server)
    }

    /// Assembles a context around an already built program and a server.
    pub fn from_parts<Server: ComputeServer>(
        platform: Platform,
        device: Device,
        program: CompiledProgram,
        server: Server,
    ) -> Result<Self, RuntimeError> {
        let client = ComputeClient::new(server, device.properties.clone())?;

        Ok(Self {
            platform,
            device,
            program,
            client,
        })
    }

    /// The selected platform.
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// The selected device.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// The program built for the device.
    pub fn program(&self) -> &CompiledProgram {
        &self.program
    }

    /// The client of the device's command queue.
    pub fn client(&self) -> &ComputeClient {
        &self.client
    }
}
