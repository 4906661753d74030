use core::fmt::Write;

use hashbrown::HashMap;

use crate::{
    error::{BuildLog, CompilationError, OperationError, StatusCode},
    kernel::{CubeKernel, KernelHandle},
    platform::Device,
};

/// A set of kernel entry points, built for a list of devices before use.
#[derive(Debug, Clone)]
pub struct Program {
    name: String,
    kernels: Vec<KernelHandle>,
}

impl Program {
    /// Creates a program without entry points.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kernels: Vec::new(),
        }
    }

    /// Adds an entry point.
    pub fn with_kernel<K: CubeKernel>(mut self, kernel: K) -> Self {
        self.kernels.push(std::sync::Arc::new(kernel));
        self
    }

    /// Name of the program.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds the program for every device, producing one build log per device.
    ///
    /// The build fails if any device rejects it; the error carries every log.
    pub fn build(self, devices: &[Device]) -> Result<CompiledProgram, CompilationError> {
        let mut logs = Vec::with_capacity(devices.len());
        let mut failed = devices.is_empty();

        for device in devices {
            let (log, ok) = self.build_for(device);
            failed |= !ok;
            logs.push(BuildLog::new(device.name.clone(), log));
        }

        if failed {
            return Err(CompilationError {
                program: self.name,
                logs,
            });
        }

        let kernels = self
            .kernels
            .into_iter()
            .map(|kernel| (kernel.name(), kernel))
            .collect();

        Ok(CompiledProgram {
            name: self.name,
            kernels,
            logs,
        })
    }

    fn build_for(&self, device: &Device) -> (String, bool) {
        let mut log = String::new();
        let mut errors = 0;
        let mut seen = HashMap::<&str, usize>::new();

        if self.kernels.is_empty() {
            errors += 1;
            let _ = writeln!(log, "error: program `{}` has no entry points", self.name);
        }

        for (index, kernel) in self.kernels.iter().enumerate() {
            let name = kernel.name();

            if !is_identifier(name) {
                errors += 1;
                let _ = writeln!(log, "error: `{name}` isn't a valid entry-point name");
            }

            if let Some(previous) = seen.insert(name, index) {
                errors += 1;
                let _ = writeln!(
                    log,
                    "error: entry point `{name}` is defined twice (#{previous} and #{index})"
                );
            }

            let bindings = kernel.num_bindings();
            if bindings > device.properties.max_bindings as usize {
                errors += 1;
                let _ = writeln!(
                    log,
                    "error: `{name}` binds {bindings} buffers, the device supports {}",
                    device.properties.max_bindings
                );
            }
        }

        if errors == 0 {
            let _ = write!(
                log,
                "Built {} entry point(s) for {}",
                self.kernels.len(),
                device.name
            );
        } else {
            let _ = write!(log, "{errors} error(s) generated.");
        }

        (log, errors == 0)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// A program built for a set of devices.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    name: String,
    kernels: HashMap<&'static str, KernelHandle>,
    logs: Vec<BuildLog>,
}

impl CompiledProgram {
    /// Retrieves an entry point by name.
    pub fn kernel(&self, name: &str) -> Result<KernelHandle, OperationError> {
        self.kernels.get(name).cloned().ok_or_else(|| {
            OperationError::new(
                "createKernel",
                StatusCode::InvalidKernelName,
                format!("program `{}` has no entry point `{name}`", self.name),
            )
        })
    }

    /// Name of the program.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One build log per device.
    pub fn logs(&self) -> &[BuildLog] {
        &self.logs
    }
}
